mod commands;
mod config;
mod db;
mod error;
mod logging;
mod models;
mod web;

use anyhow::Context;

pub use commands::{GroupingPolicy, SetOrdering};
pub use config::{AppConfig, ConfigError};
pub use db::Database;
pub use error::JournalError;
pub use models::{SetSummary, Trade, TradeInput};
pub use web::{build_app, AppState};

pub async fn run() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    logging::init_logging();

    let config = AppConfig::from_env()?;
    log::info!("Database path: {}", config.database_path);
    log::info!(
        "Grouping policy: {:?}, set ordering: {:?}",
        config.grouping,
        config.ordering
    );

    let database = match Database::new(&config.database_path) {
        Ok(db) => db,
        Err(e) => {
            log::error!("Database initialization failed: {}", e);
            log::error!("This might be due to a failed migration or database corruption.");
            log::error!("Backups taken before migrations live in the `backups` folder next to the database.");
            return Err(e).context("database initialization failed");
        }
    };

    let app = build_app(AppState::new(database, &config));

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    log::info!("Trade journal listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server failed")?;
    Ok(())
}
