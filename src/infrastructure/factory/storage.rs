//! Storage factory.

use std::sync::Arc;

use tracing::info;

use crate::adapter::outbound::storage::{FileStorage, MemoryStorage};
use crate::error::{ConfigError, Result};
use crate::infrastructure::config::storage::{StorageBackend, StorageConfig};
use crate::port::outbound::store::Storage;

/// Build the configured storage backend.
///
/// # Errors
///
/// Returns [`ConfigError::MissingField`] when the file backend has no path,
/// or an I/O error if the data directory cannot be created.
pub fn build_storage(config: &StorageConfig) -> Result<Arc<dyn Storage>> {
    match config.backend {
        StorageBackend::Memory => {
            info!(backend = "memory", "Storage ready");
            Ok(Arc::new(MemoryStorage::new()))
        }
        StorageBackend::File => {
            let dir = config
                .path
                .as_ref()
                .ok_or(ConfigError::MissingField { field: "path" })?;
            let storage = FileStorage::open(dir)?;
            info!(backend = "file", path = %dir.display(), "Storage ready");
            Ok(Arc::new(storage))
        }
    }
}
