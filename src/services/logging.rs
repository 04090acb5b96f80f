//! Logging setup.
//!
//! Installs a `tracing-subscriber` formatter as the global default.
//! `RUST_LOG` takes precedence over the configured level.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::types::settings::LoggingSettings;

/// Initializes the global subscriber. Fails if one is already installed.
pub fn init(settings: &LoggingSettings) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&settings.level))?;

    let console_layer = fmt::layer()
        .with_target(settings.include_targets)
        .with_ansi(true);

    let subscriber = tracing_subscriber::registry().with(filter).with(console_layer);
    tracing::subscriber::set_global_default(subscriber)?;

    tracing::info!("Logging initialized with level: {}", settings.level);
    Ok(())
}
