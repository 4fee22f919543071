//! Realtime bus configuration.

use serde::Deserialize;

use crate::adapter::outbound::bus::broadcast::DEFAULT_CAPACITY;
use crate::adapter::outbound::bus::fallback::DEFAULT_BUS_KEY;

/// Which [`RealtimeBus`](crate::port::RealtimeBus) backend to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusBackend {
    /// Named in-process broadcast channels.
    #[default]
    Broadcast,
    /// Transient writes on the storage change feed.
    Fallback,
}

/// `[bus]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    pub backend: BusBackend,
    /// Broadcast channel name.
    pub channel: String,
    /// Storage key used by the fallback backend.
    pub key: String,
    /// Per-channel buffer of the broadcast backend.
    pub capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            backend: BusBackend::default(),
            channel: "pointbook".to_string(),
            key: DEFAULT_BUS_KEY.to_string(),
            capacity: DEFAULT_CAPACITY,
        }
    }
}
