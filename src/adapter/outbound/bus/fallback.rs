//! Storage-backed bus backend.
//!
//! Emulates the broadcast contract on top of a storage change feed: publish
//! writes the encoded event under a bus key and immediately removes it,
//! producing two change notifications. Peers parse the transient value and
//! ignore the removal. The storage watch already excludes the publishing
//! session.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::port::outbound::bus::{BusEvent, Listener, RealtimeBus, Subscription};
use crate::port::outbound::store::{Storage, Write};

/// Default storage key used for transient bus values.
pub const DEFAULT_BUS_KEY: &str = "pointbook.bus";

/// Bus that signals through a shared storage key.
pub struct FallbackBus<S> {
    storage: S,
    key: String,
    closed: AtomicBool,
    subscriptions: Mutex<Vec<AbortHandle>>,
}

impl<S: Storage> FallbackBus<S> {
    /// Build a bus over `storage`, signalling through `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the storage has no change feed.
    pub fn new(storage: S, key: impl Into<String>) -> Result<Self> {
        if storage.watch().is_none() {
            return Err(Error::Storage(
                "fallback bus requires storage with change notifications".to_string(),
            ));
        }
        Ok(Self {
            storage,
            key: key.into(),
            closed: AtomicBool::new(false),
            subscriptions: Mutex::new(Vec::new()),
        })
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    fn signal(&self, payload: String) -> Result<()> {
        self.storage.commit(&[Write::put(&self.key, payload)])?;
        self.storage.commit(&[Write::remove(&self.key)])
    }
}

impl<S: Storage> RealtimeBus for FallbackBus<S> {
    fn publish(&self, event: &BusEvent) {
        if self.closed.load(Ordering::Acquire) {
            debug!(key = %self.key, kind = event.kind(), "Bus closed, event dropped");
            return;
        }
        let result = event.encode().and_then(|payload| self.signal(payload));
        match result {
            Ok(()) => debug!(key = %self.key, kind = event.kind(), "Event published"),
            Err(e) => warn!(key = %self.key, kind = event.kind(), error = %e, "Failed to publish bus event"),
        }
    }

    fn subscribe(&self, listener: Listener) -> Subscription {
        if self.closed.load(Ordering::Acquire) {
            return Subscription::inactive();
        }
        let Some(mut watch) = self.storage.watch() else {
            return Subscription::inactive();
        };

        let key = self.key.clone();
        let task = tokio::spawn(async move {
            while let Some(change) = watch.next().await {
                if change.key != key {
                    continue;
                }
                // The clearing write carries no value.
                let Some(raw) = change.value else {
                    continue;
                };
                if let Some(event) = BusEvent::decode(&raw) {
                    listener(event);
                }
            }
        });

        let mut subscriptions = self.subscriptions.lock();
        subscriptions.retain(|handle| !handle.is_finished());
        subscriptions.push(task.abort_handle());
        Subscription::new(task)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        for handle in self.subscriptions.lock().drain(..) {
            handle.abort();
        }
        debug!(key = %self.key, "Bus closed");
    }
}
