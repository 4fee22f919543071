//! Ledger factory.

use std::sync::Arc;

use crate::adapter::outbound::bus::BroadcastHub;
use crate::application::ledger::Ledger;
use crate::application::store::StateStore;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::port::outbound::store::Storage;

use super::bus::build_bus;
use super::storage::build_storage;

/// Wire storage, bus and ledger tuning from `config`.
///
/// # Errors
///
/// Propagates storage and bus construction failures.
pub fn build_ledger(config: &Config, hub: &BroadcastHub) -> Result<Ledger<Arc<dyn Storage>>> {
    let storage = build_storage(&config.storage)?;
    let bus = build_bus(&config.bus, storage.clone(), hub)?;
    Ok(Ledger::new(
        StateStore::new(storage),
        bus,
        config.ledger.clone(),
    ))
}
