//! Key-value storage for the store and the session.
//!
//! Values are JSON text. Each collection lives under its own key and is
//! rewritten in full whenever it changes; the active user lives under a
//! separate key in the session scope.

pub mod database;
pub mod memory;

pub use database::DatabaseStore;
pub use memory::MemoryStore;

use crate::{
    config::settings::StorageConfig,
    core::{Collection, Store},
    errors::Result,
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

/// String-keyed storage of JSON values.
#[allow(async_fn_in_trait)]
pub trait KeyValueStore {
    /// Reads the value under `key`, `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;
    /// Writes `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Removes `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Namespace of a key-value store sharing a table with others
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    /// Durable: survives restarts
    Local,
    /// Session: holds the active user
    Session,
}

impl Scope {
    /// Value of the `scope` column
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Session => "session",
        }
    }
}

/// Either storage backend, chosen at startup
#[derive(Clone, Debug)]
pub enum AnyStore {
    /// In-process storage
    Memory(MemoryStore),
    /// `SQLite`-backed storage
    Database(DatabaseStore),
}

impl KeyValueStore for AnyStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self {
            Self::Memory(store) => store.get(key).await,
            Self::Database(store) => store.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        match self {
            Self::Memory(store) => store.set(key, value).await,
            Self::Database(store) => store.set(key, value).await,
        }
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match self {
            Self::Memory(store) => store.remove(key).await,
            Self::Database(store) => store.remove(key).await,
        }
    }
}

/// Fixed storage keys, e.g. `alloc_users_v2`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageKeys {
    users: String,
    subjects: String,
    allocations: String,
    current_user: String,
}

impl StorageKeys {
    /// Builds the keys `<prefix>_<name>_<version>`.
    #[must_use]
    pub fn new(prefix: &str, version: &str) -> Self {
        let key = |name: &str| format!("{prefix}_{name}_{version}");
        Self {
            users: key(Collection::Users.as_str()),
            subjects: key(Collection::Subjects.as_str()),
            allocations: key(Collection::Allocations.as_str()),
            current_user: key("currentUser"),
        }
    }

    /// Keys configured in the `[storage]` section
    #[must_use]
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.key_prefix, &config.key_version)
    }

    /// Key of a collection
    #[must_use]
    pub fn collection(&self, collection: Collection) -> &str {
        match collection {
            Collection::Users => &self.users,
            Collection::Subjects => &self.subjects,
            Collection::Allocations => &self.allocations,
        }
    }

    /// Key of the active-user record in the session scope
    #[must_use]
    pub fn current_user(&self) -> &str {
        &self.current_user
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::from_config(&StorageConfig::default())
    }
}

/// Reads and decodes the JSON value under `key`.
///
/// # Errors
/// Returns a storage error, or a serialization error if the value is not
/// valid JSON for `T`.
pub async fn get_json<T, S>(store: &S, key: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
    S: KeyValueStore,
{
    match store.get(key).await? {
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
        None => Ok(None),
    }
}

/// Encodes `value` as JSON and writes it under `key`.
///
/// # Errors
/// Returns a storage or serialization error.
pub async fn set_json<T, S>(store: &S, key: &str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    S: KeyValueStore,
{
    let text = serde_json::to_string(value)?;
    store.set(key, &text).await
}

/// Loads the three collections; absent keys load as empty collections.
///
/// # Errors
/// Returns a storage error or a serialization error for a corrupt value.
pub async fn load_store<S: KeyValueStore>(local: &S, keys: &StorageKeys) -> Result<Store> {
    let users = get_json(local, keys.collection(Collection::Users))
        .await?
        .unwrap_or_default();
    let subjects = get_json(local, keys.collection(Collection::Subjects))
        .await?
        .unwrap_or_default();
    let allocations = get_json(local, keys.collection(Collection::Allocations))
        .await?
        .unwrap_or_default();

    let store = Store::from_parts(users, subjects, allocations);
    debug!(
        users = store.users().len(),
        subjects = store.subjects().len(),
        allocations = store.allocations().len(),
        "Loaded store"
    );
    Ok(store)
}

/// Writes one collection of `store` in full.
///
/// # Errors
/// Returns a storage or serialization error.
pub async fn save_collection<S: KeyValueStore>(
    local: &S,
    keys: &StorageKeys,
    store: &Store,
    collection: Collection,
) -> Result<()> {
    let key = keys.collection(collection);
    match collection {
        Collection::Users => set_json(local, key, store.users()).await?,
        Collection::Subjects => set_json(local, key, store.subjects()).await?,
        Collection::Allocations => set_json(local, key, store.allocations()).await?,
    }
    debug!(key, "Saved collection");
    Ok(())
}
