//! Path utilities for pointbook.
//!
//! All data lives under `~/.pointbook/`:
//! - `~/.pointbook/config.toml` - optional configuration
//! - `~/.pointbook/data/` - persisted collections (file storage)

use std::path::PathBuf;

/// Returns the pointbook home directory (`~/.pointbook/`).
pub fn home_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".pointbook")
}

/// Returns the default config file path (`~/.pointbook/config.toml`).
pub fn default_config() -> PathBuf {
    home_dir().join("config.toml")
}

/// Returns the default data directory (`~/.pointbook/data/`).
pub fn default_data_dir() -> PathBuf {
    home_dir().join("data")
}
