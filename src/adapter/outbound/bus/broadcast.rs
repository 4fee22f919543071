//! Broadcast-channel bus backend.
//!
//! A [`BroadcastHub`] owns named `tokio::sync::broadcast` channels. Each
//! session connects a [`BroadcastBus`] to a channel by name; events reach
//! every other session on that channel. Delivery happens on a spawned task
//! per subscription, so listeners never run inside `publish`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use crate::port::outbound::bus::{BusEvent, Listener, RealtimeBus, Subscription};
use crate::port::outbound::store::SessionId;

/// Default buffered events per subscriber before it starts lagging.
pub const DEFAULT_CAPACITY: usize = 256;

/// Raw message on a channel. The payload stays a string so that peers can
/// drop what they cannot parse.
#[derive(Debug, Clone)]
struct Envelope {
    origin: SessionId,
    payload: String,
}

/// Registry of named channels shared by every session in the process.
#[derive(Clone)]
pub struct BroadcastHub {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<Envelope>>>>,
    capacity: usize,
}

impl BroadcastHub {
    /// Create a hub whose channels buffer `capacity` events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    fn sender(&self, name: &str) -> broadcast::Sender<Envelope> {
        self.channels
            .lock()
            .entry(name.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    /// Number of named channels opened so far.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.lock().len()
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// One session's connection to a named channel.
pub struct BroadcastBus {
    channel: String,
    sender: broadcast::Sender<Envelope>,
    session: SessionId,
    closed: AtomicBool,
    subscriptions: Mutex<Vec<AbortHandle>>,
}

impl BroadcastBus {
    /// Join `channel` on `hub` as a new session.
    #[must_use]
    pub fn connect(hub: &BroadcastHub, channel: &str) -> Self {
        Self {
            channel: channel.to_string(),
            sender: hub.sender(channel),
            session: SessionId::new(),
            closed: AtomicBool::new(false),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session
    }

    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    fn send_raw(&self, payload: String) {
        // No receivers is fine.
        let _ = self.sender.send(Envelope {
            origin: self.session,
            payload,
        });
    }
}

impl RealtimeBus for BroadcastBus {
    fn publish(&self, event: &BusEvent) {
        if self.closed.load(Ordering::Acquire) {
            debug!(channel = %self.channel, kind = event.kind(), "Bus closed, event dropped");
            return;
        }
        match event.encode() {
            Ok(payload) => {
                self.send_raw(payload);
                debug!(channel = %self.channel, kind = event.kind(), "Event published");
            }
            Err(e) => warn!(kind = event.kind(), error = %e, "Failed to encode bus event"),
        }
    }

    fn subscribe(&self, listener: Listener) -> Subscription {
        if self.closed.load(Ordering::Acquire) {
            return Subscription::inactive();
        }

        let mut rx = self.sender.subscribe();
        let session = self.session;
        let channel = self.channel.clone();
        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(envelope) if envelope.origin == session => {}
                    Ok(envelope) => {
                        if let Some(event) = BusEvent::decode(&envelope.payload) {
                            listener(event);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(channel = %channel, skipped, "Bus subscriber lagged, events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
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
        debug!(channel = %self.channel, "Bus closed");
    }
}
