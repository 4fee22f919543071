use std::sync::Arc;

use pointbook::adapter::outbound::bus::FallbackBus;
use pointbook::adapter::outbound::storage::MemoryStorage;
use pointbook::application::{Ledger, LedgerConfig, StateStore};
use pointbook::port::{BusEvent, RealtimeBus, Subscription};
use tokio::sync::mpsc;

pub type SessionLedger = Ledger<MemoryStorage>;

/// A ledger bound to its own session of shared in-memory storage, signalling
/// over the storage-backed bus.
pub fn fallback_ledger(storage: &MemoryStorage) -> (SessionLedger, Arc<FallbackBus<MemoryStorage>>) {
    let session = storage.session();
    let bus = Arc::new(
        FallbackBus::new(session.clone(), "bus").expect("memory storage has a change feed"),
    );
    let ledger = Ledger::new(StateStore::new(session), bus.clone(), LedgerConfig::default());
    (ledger, bus)
}

/// Forward every event received on `bus` into a channel.
pub fn collect(bus: &dyn RealtimeBus) -> (Subscription, mpsc::UnboundedReceiver<BusEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let subscription = bus.subscribe(Box::new(move |event| {
        let _ = tx.send(event);
    }));
    (subscription, rx)
}
