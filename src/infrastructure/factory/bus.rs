//! Realtime bus factory.

use std::sync::Arc;

use tracing::info;

use crate::adapter::outbound::bus::{BroadcastBus, BroadcastHub, FallbackBus};
use crate::error::Result;
use crate::infrastructure::config::bus::{BusBackend, BusConfig};
use crate::port::outbound::bus::RealtimeBus;
use crate::port::outbound::store::Storage;

/// Build the configured bus backend.
///
/// The broadcast backend joins `config.channel` on `hub`; the fallback
/// backend signals through `config.key` on `storage`.
///
/// # Errors
///
/// Returns [`Error::Storage`](crate::error::Error::Storage) when the fallback
/// backend is paired with a storage that has no change feed.
pub fn build_bus(
    config: &BusConfig,
    storage: Arc<dyn Storage>,
    hub: &BroadcastHub,
) -> Result<Arc<dyn RealtimeBus>> {
    let bus: Arc<dyn RealtimeBus> = match config.backend {
        BusBackend::Broadcast => Arc::new(BroadcastBus::connect(hub, &config.channel)),
        BusBackend::Fallback => Arc::new(FallbackBus::new(storage, config.key.clone())?),
    };
    info!(backend = ?config.backend, "Realtime bus ready");
    Ok(bus)
}
