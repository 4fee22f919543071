//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all application settings.
//! Configuration is loaded from a TOML file; `POINTBOOK_DATA_DIR` overrides the
//! storage directory.
//!
//! # Example
//!
//! ```no_run
//! use pointbook::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;

use super::bus::{BusBackend, BusConfig};
use super::logging::LoggingConfig;
use super::storage::{StorageBackend, StorageConfig};
use crate::application::ledger::LedgerConfig;
use crate::error::{ConfigError, Result};

/// Environment variable overriding `[storage] path`.
pub const DATA_DIR_ENV: &str = "POINTBOOK_DATA_DIR";

/// Longest accepted faucet cooldown (ten years).
const MAX_FAUCET_COOLDOWN_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Main application configuration.
///
/// Every section is optional; an empty file yields [`Config::default`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where collections are persisted.
    pub storage: StorageConfig,

    /// Cross-session notification backend.
    pub bus: BusConfig,

    /// Faucet and retry tuning.
    pub ledger: LedgerConfig,

    /// Logging and tracing configuration.
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        let config = config.with_data_dir_override(std::env::var_os(DATA_DIR_ENV).map(PathBuf::from));
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Replace the storage path when `dir` is set and non-empty.
    #[must_use]
    pub fn with_data_dir_override(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir.filter(|d| !d.as_os_str().is_empty()) {
            self.storage.path = Some(dir);
        }
        self
    }

    /// Initialize tracing from the `[logging]` section.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for out-of-range values and
    /// [`ConfigError::MissingField`] for empty names.
    pub fn validate(&self) -> Result<()> {
        if self.ledger.faucet_amount <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "faucet_amount",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.ledger.faucet_cooldown_secs > MAX_FAUCET_COOLDOWN_SECS {
            return Err(ConfigError::InvalidValue {
                field: "faucet_cooldown_secs",
                reason: format!("must be at most {MAX_FAUCET_COOLDOWN_SECS}"),
            }
            .into());
        }
        if self.ledger.max_commit_retries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_commit_retries",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.bus.channel.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "channel" }.into());
        }
        if self.bus.key.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "key" }.into());
        }
        if self.bus.capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "capacity",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.bus.backend == BusBackend::Fallback
            && self.storage.backend != StorageBackend::Memory
        {
            return Err(ConfigError::InvalidValue {
                field: "backend",
                reason: "the fallback bus needs a storage backend with a change feed (memory)"
                    .to_string(),
            }
            .into());
        }

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::InvalidValue {
                field: "format",
                reason: "must be \"pretty\" or \"json\"".to_string(),
            }
            .into());
        }

        Ok(())
    }
}
