//! linkvault server: serves the link ingestion API over HTTP.
//!
//! Settings come from `LINKVAULT_CONFIG` (or the platform config dir), with
//! `LINKVAULT_DATA_DIR` and `LINKVAULT_BIND` overriding the file.

use std::sync::Arc;

use tracing::info;

use linkvault::app::App;
use linkvault::http::router;
use linkvault::services::logging;
use linkvault::services::settings_engine::{SettingsEngine, SettingsEngineTrait};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut engine = SettingsEngine::new(None);
    engine.load()?;
    let settings = engine.get_settings().clone();

    logging::init(&settings.logging)?;
    info!(config = %engine.get_config_path().display(), "settings loaded");

    let bind_addr = settings.server.bind_addr.clone();
    let app = Arc::new(App::new(settings)?);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %listener.local_addr()?, version = env!("CARGO_PKG_VERSION"), "linkvault ready");

    axum::serve(listener, router(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("linkvault stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
