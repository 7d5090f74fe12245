//! Logging initialization.

use anyhow::{anyhow, Result};
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

use crate::settings::LoggingConfig;

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// configured level.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))?;

    match config.format.as_str() {
        "json" => {
            let subscriber = Registry::default()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr));
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "text" => {
            let subscriber = Registry::default()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr));
            tracing::subscriber::set_global_default(subscriber)?;
        }
        other => return Err(anyhow!("Unsupported logging format: {}", other)),
    }

    tracing::debug!("Logging initialized");
    Ok(())
}
