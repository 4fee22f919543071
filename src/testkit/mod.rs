//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`bus`]: a [`RealtimeBus`](crate::port::RealtimeBus) that records
//!   publishes, and a scripted [`PriceFeed`](crate::port::PriceFeed).
//! - [`domain`]: builders for wallets, markets and trades.
//! - [`config`]: canonical test configurations.

pub mod bus;
pub mod config;
pub mod domain;

use std::sync::Arc;

use crate::adapter::outbound::storage::MemoryStorage;
use crate::application::ledger::Ledger;
use crate::application::store::StateStore;

use self::bus::RecordingBus;

/// A ledger over fresh in-memory storage, plus the bus it publishes to.
pub fn memory_ledger() -> (Ledger<MemoryStorage>, Arc<RecordingBus>) {
    let bus = Arc::new(RecordingBus::default());
    let ledger = Ledger::new(
        StateStore::new(MemoryStorage::new()),
        bus.clone(),
        config::ledger(),
    );
    (ledger, bus)
}
