//! Tracing setup.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::ServiceConfig;
use crate::error::{Result, ServiceError};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level. With a log file set, output
/// is appended there without ANSI colours.
pub fn init_tracing(config: &ServiceConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| ServiceError::Config(format!("log level {:?}: {}", config.log_level, e)))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    let installed = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
        }
        None => builder.try_init(),
    };
    installed.map_err(|e| ServiceError::Config(format!("tracing: {}", e)))
}
