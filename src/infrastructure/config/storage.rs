//! Storage backend configuration.

use std::path::PathBuf;

use serde::Deserialize;

/// Which [`Storage`](crate::port::Storage) adapter to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local, lost on exit.
    Memory,
    /// One JSON file per collection under `path`.
    #[default]
    File,
}

/// `[storage]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Data directory for the file backend. Overridden by `POINTBOOK_DATA_DIR`.
    pub path: Option<PathBuf>,
}
