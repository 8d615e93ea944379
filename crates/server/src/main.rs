mod api;
mod bootstrap;
mod catalog;
mod health;
mod import;
mod quotes;

use anyhow::Result;
use axum::Router;
use cotiza_core::config::{AppConfig, LoadOptions};

use crate::api::AppState;

fn init_logging(config: &AppConfig) {
    use cotiza_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::router(state.pool.clone()))
        .merge(catalog::router(state.clone()))
        .merge(import::router(state.clone()))
        .merge(quotes::router(state))
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;
    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!(
        event_name = "system.server.started",
        bind_address = %address,
        "cotiza-server listening"
    );

    let state = AppState::new(app.db_pool, app.config);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(wait_for_shutdown())
        .await?;

    tracing::info!(event_name = "system.server.stopped", "cotiza-server stopped");
    Ok(())
}

async fn wait_for_shutdown() {
    let _ = tokio::signal::ctrl_c().await;
}
