//! Shared test utilities.
//!
//! Helpers for setting up an in-memory database and apps logged in with a
//! given role.

use crate::{
    app::App,
    config::AppConfig,
    core::models::Role,
    errors::{Error, Result},
    storage::MemoryStore,
};
use sea_orm::DatabaseConnection;

/// Password used by every account created through these helpers
pub const TEST_PASSWORD: &str = "pw";

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// An app over fresh in-memory storage, logged out.
pub async fn memory_app() -> Result<App<MemoryStore, MemoryStore>> {
    App::load(MemoryStore::new(), MemoryStore::new(), &AppConfig::default()).await
}

/// An app over `local` logged in as the admin `root@x.com`, registering the
/// account on first use. Each call gets its own session storage.
pub async fn admin_app(local: &MemoryStore) -> Result<App<MemoryStore, MemoryStore>> {
    logged_in_app(local, "Root", "root@x.com", Role::Admin).await
}

/// An app over `local` logged in as the student `email`, registering the
/// account on first use.
pub async fn student_app(
    local: &MemoryStore,
    name: &str,
    email: &str,
) -> Result<App<MemoryStore, MemoryStore>> {
    logged_in_app(local, name, email, Role::Student).await
}

async fn logged_in_app(
    local: &MemoryStore,
    name: &str,
    email: &str,
    role: Role,
) -> Result<App<MemoryStore, MemoryStore>> {
    let mut app = App::load(local.clone(), MemoryStore::new(), &AppConfig::default()).await?;
    match app.login(email, TEST_PASSWORD).await {
        Ok(_) => {}
        Err(Error::InvalidCredentials) => {
            app.register(name, email, TEST_PASSWORD, role).await?;
        }
        Err(e) => return Err(e),
    }
    Ok(app)
}

/// A confirmation that accepts every prompt.
pub fn yes() -> impl FnMut(&str) -> bool {
    |_| true
}
