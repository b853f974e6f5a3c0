//! # Configuration
//!
//! Optional TOML configuration file.
//!
//! ```toml
//! [storage]
//! data_dir = "data"
//! catalog_file = "products.csv"
//! supplier_file = "suppliers.csv"
//!
//! [monitor]
//! poll_interval_secs = 30
//! threshold = 10
//! shutdown_grace_ms = 2000
//! persist_timeout_ms = 5000
//! ```
//!
//! Every key is optional. A missing default file means built-in defaults;
//! a file named explicitly on the command line must exist.

use crate::monitor::MonitorSettings;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use stockwatch_core::primitives::{
    DEFAULT_CATALOG_FILE, DEFAULT_LOW_STOCK_THRESHOLD, DEFAULT_PERSIST_TIMEOUT_MS,
    DEFAULT_POLL_INTERVAL_SECS, DEFAULT_SHUTDOWN_GRACE_MS, DEFAULT_SUPPLIER_FILE,
};
use thiserror::Error;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "stockwatch.toml";

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid setting: {0}")]
    Invalid(String),
}

// =============================================================================
// SECTIONS
// =============================================================================

/// `[storage]`: where the backing files live.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub catalog_file: String,
    pub supplier_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            catalog_file: DEFAULT_CATALOG_FILE.to_string(),
            supplier_file: DEFAULT_SUPPLIER_FILE.to_string(),
        }
    }
}

/// `[monitor]`: low-stock monitor and shutdown timing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    pub poll_interval_secs: u64,
    pub threshold: i64,
    pub shutdown_grace_ms: u64,
    pub persist_timeout_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            shutdown_grace_ms: DEFAULT_SHUTDOWN_GRACE_MS,
            persist_timeout_ms: DEFAULT_PERSIST_TIMEOUT_MS,
        }
    }
}

// =============================================================================
// CONFIG
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub storage: StorageConfig,
    pub monitor: MonitorConfig,
}

impl Config {
    /// Parse a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load the config file.
    ///
    /// With `path == None` the default file is used if present.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        let config =
            Self::from_toml_str(&text).map_err(|source| ConfigError::Parse { path, source })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the monitor cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.monitor.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "monitor.poll_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.monitor.persist_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "monitor.persist_timeout_ms must be at least 1".to_string(),
            ));
        }
        if self.storage.catalog_file == self.storage.supplier_file {
            return Err(ConfigError::Invalid(
                "catalog and supplier files must differ".to_string(),
            ));
        }
        Ok(())
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.catalog_file)
    }

    pub fn supplier_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.supplier_file)
    }

    /// Upper bound on one shell command, persistence included.
    pub fn persist_timeout(&self) -> Duration {
        Duration::from_millis(self.monitor.persist_timeout_ms)
    }

    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            interval: Duration::from_secs(self.monitor.poll_interval_secs),
            threshold: self.monitor.threshold,
            shutdown_grace: Duration::from_millis(self.monitor.shutdown_grace_ms),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
