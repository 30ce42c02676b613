use tracing_subscriber::EnvFilter;

use crate::database::client::{Database, DbConfig};
use crate::config::AppConfig;
use crate::middleware::error::AppResult;

/// Installs the fmt subscriber, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

pub async fn connect_database(config: &AppConfig) -> AppResult<Database> {
    Database::connect(DbConfig {
        url: &config.db_url,
        database: &config.db_database,
        namespace: &config.db_namespace,
        username: config.db_username.as_deref(),
        password: config.db_password.as_deref(),
    })
    .await
}

pub async fn run_migrations(database: &Database) -> AppResult<()> {
    database.run_migrations().await
}
