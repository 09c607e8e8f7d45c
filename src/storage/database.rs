//! `SQLite`-backed key-value storage through `SeaORM`.

use crate::{
    entities::{StorageEntry, storage_entry},
    errors::Result,
    storage::{KeyValueStore, Scope},
};
use sea_orm::{Set, prelude::*, sea_query::OnConflict};
use tracing::debug;

/// Storage over the `storage_entries` table, restricted to one scope.
#[derive(Clone, Debug)]
pub struct DatabaseStore {
    db: DatabaseConnection,
    scope: Scope,
}

impl DatabaseStore {
    /// Wraps a connection whose tables have been created.
    #[must_use]
    pub const fn new(db: DatabaseConnection, scope: Scope) -> Self {
        Self { db, scope }
    }
}

impl KeyValueStore for DatabaseStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entry = StorageEntry::find()
            .filter(storage_entry::Column::Scope.eq(self.scope.as_str()))
            .filter(storage_entry::Column::Key.eq(key))
            .one(&self.db)
            .await?;
        Ok(entry.map(|e| e.value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let entry = storage_entry::ActiveModel {
            scope: Set(self.scope.as_str().to_string()),
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            updated_at: Set(chrono::Utc::now()),
        };

        StorageEntry::insert(entry)
            .on_conflict(
                OnConflict::columns([storage_entry::Column::Scope, storage_entry::Column::Key])
                    .update_columns([
                        storage_entry::Column::Value,
                        storage_entry::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        debug!(scope = self.scope.as_str(), key, bytes = value.len(), "Stored entry");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        StorageEntry::delete_many()
            .filter(storage_entry::Column::Scope.eq(self.scope.as_str()))
            .filter(storage_entry::Column::Key.eq(key))
            .exec(&self.db)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    #[tokio::test]
    async fn test_set_get_overwrite_remove() -> Result<()> {
        let db = setup_test_db().await?;
        let store = DatabaseStore::new(db, Scope::Local);

        assert!(store.get("alloc_users_v2").await?.is_none());
        store.set("alloc_users_v2", "[]").await?;
        store.set("alloc_users_v2", "[1]").await?;
        assert_eq!(store.get("alloc_users_v2").await?.as_deref(), Some("[1]"));

        store.remove("alloc_users_v2").await?;
        assert!(store.get("alloc_users_v2").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_scopes_are_isolated() -> Result<()> {
        let db = setup_test_db().await?;
        let local = DatabaseStore::new(db.clone(), Scope::Local);
        let session = DatabaseStore::new(db, Scope::Session);

        local.set("shared_key", "local").await?;
        session.set("shared_key", "session").await?;

        assert_eq!(local.get("shared_key").await?.as_deref(), Some("local"));
        assert_eq!(session.get("shared_key").await?.as_deref(), Some("session"));

        session.remove("shared_key").await?;
        assert_eq!(local.get("shared_key").await?.as_deref(), Some("local"));
        Ok(())
    }
}
