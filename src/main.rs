use dotenvy::dotenv;
use std::{env, io};
use subject_allocator::{
    app::App,
    config::{
        database::{create_connection, create_tables, get_database_url},
        load_config_or_default,
        settings::DEFAULT_CONFIG_PATH,
    },
    errors::Result,
    shell::Shell,
    storage::{AnyStore, DatabaseStore, MemoryStore, Scope},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible); stdout belongs to the shell
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();

    // 3. Load the application configuration
    let config_path = env::var("ALLOC_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = load_config_or_default(&config_path)
        .inspect_err(|e| error!("Failed to load configuration from {config_path}: {e}"))?;

    // 4. Initialize the database backing both storage scopes
    let database_url = get_database_url();
    let db = create_connection(&database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to {database_url}: {e}"))?;
    create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {e}"))?;

    let local = DatabaseStore::new(db.clone(), Scope::Local);
    let session = if config.storage.persist_session {
        AnyStore::Database(DatabaseStore::new(db, Scope::Session))
    } else {
        AnyStore::Memory(MemoryStore::new())
    };

    // 5. Load the store and run the shell
    let mut app = App::load(local, session, &config).await?;
    let stdin = io::stdin();
    let stdout = io::stdout();
    Shell::new(&mut app, stdin.lock(), stdout.lock()).run().await?;

    info!("Goodbye.");
    Ok(())
}
