use tracing::info;
use watch_exchange::config::AppConfig;
use watch_exchange::init;
use watch_exchange::middleware::error::AppResult;

/// Prepares the store: connects with the configured credentials and applies
/// the schema. The engine itself is embedded by the messaging front end.
#[tokio::main]
async fn main() -> AppResult<()> {
    init::init_tracing();
    let config = AppConfig::from_env();
    let flags = config.feature_flags();
    info!("->> feature flags {flags:?}, operators {:?}", config.operator_ids);

    let db = init::connect_database(&config).await?;
    init::run_migrations(&db).await?;

    info!("->> store ready at {}", config.db_url);
    Ok(())
}
