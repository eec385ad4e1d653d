//! Service configuration.
//!
//! Settings come from an optional TOML file, then command-line flags on top.
//! The table path and the API key have no defaults.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};

use ecf_sequence_store::ColumnMap;

use crate::error::{Result, ServiceError};

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8080;

/// Configuration for the sequence service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Path to the sequence table (`FAC_PF_M.DBF`).
    pub table_path: PathBuf,
    /// TCP port to listen on, on all interfaces.
    pub port: u16,
    /// Shared secret clients send in `X-API-Key`.
    pub api_key: String,
    /// Append-only log of allocation events.
    pub event_log: PathBuf,
    /// Diagnostic log destination. Standard error when unset.
    pub log_file: Option<PathBuf>,
    /// Default tracing filter, overridden by `RUST_LOG`.
    pub log_level: String,
    /// Column names of the sequence table.
    pub columns: ColumnMap,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            table_path: PathBuf::new(),
            port: DEFAULT_PORT,
            api_key: String::new(),
            event_log: PathBuf::from("sequence.log"),
            log_file: None,
            log_level: "info".into(),
            columns: ColumnMap::default(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ServiceError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ServiceError::Config(e.to_string()))
    }

    /// Check that the required settings are present.
    pub fn validate(&self) -> Result<()> {
        if self.table_path.as_os_str().is_empty() {
            return Err(ServiceError::Config("table path is required (--dbf)".into()));
        }
        if self.api_key.is_empty() {
            return Err(ServiceError::Config("API key is required (--key)".into()));
        }
        Ok(())
    }

    /// Address to bind: all interfaces on the configured port.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

/// Command-line flags.
#[derive(Debug, Parser)]
#[command(name = "ecf-sequence", version, about = "ECF sequence number service")]
pub struct Cli {
    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Path to the sequence table (FAC_PF_M.DBF)
    #[arg(long)]
    pub dbf: Option<PathBuf>,

    /// Port to listen on
    #[arg(long)]
    pub port: Option<u16>,

    /// API key clients must send in X-API-Key
    #[arg(long)]
    pub key: Option<String>,

    /// Allocation event log
    #[arg(long)]
    pub event_log: Option<PathBuf>,

    /// Write diagnostics to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Shorthand for --log-level debug
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Build the effective configuration: file first, then flags.
    pub fn resolve(&self) -> Result<ServiceConfig> {
        let mut config = match &self.config {
            Some(path) => ServiceConfig::from_file(path)?,
            None => ServiceConfig::default(),
        };

        if let Some(dbf) = &self.dbf {
            config.table_path = dbf.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(key) = &self.key {
            config.api_key = key.clone();
        }
        if let Some(event_log) = &self.event_log {
            config.event_log = event_log.clone();
        }
        if let Some(log_file) = &self.log_file {
            config.log_file = Some(log_file.clone());
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if self.debug {
            config.log_level = "debug".into();
        }

        Ok(config)
    }
}
