//! Realtime bus port for cross-session change notifications.
//!
//! Events tell other sessions *that* something changed, never the new state.
//! Receivers re-read the state store after a notification.

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::domain::{MarketId, Price, Side, WalletAddress};
use crate::error::Result;

/// Change notifications carried by the bus.
///
/// Wire format: `{"type": "TRADE", "payload": {"marketId": "..."}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BusEvent {
    /// A trade was committed.
    Trade {
        #[serde(rename = "marketId")]
        market_id: MarketId,
    },
    /// A market was created.
    MarketCreate {
        #[serde(rename = "marketId")]
        market_id: MarketId,
    },
    /// A market was resolved and its claims created.
    Resolve {
        #[serde(rename = "marketId")]
        market_id: MarketId,
        winner: Side,
    },
    /// A wallet received a faucet credit.
    Faucet {
        #[serde(rename = "walletId")]
        wallet_id: WalletAddress,
    },
    /// The first-outcome price of a market moved.
    PriceUpdate {
        #[serde(rename = "marketId")]
        market_id: MarketId,
        price: Price,
    },
}

impl BusEvent {
    /// Serialize to the wire format.
    ///
    /// # Errors
    ///
    /// Returns a JSON error if serialization fails.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse the wire format. Malformed input yields `None`.
    #[must_use]
    pub fn decode(raw: &str) -> Option<Self> {
        match serde_json::from_str(raw) {
            Ok(event) => Some(event),
            Err(e) => {
                debug!(error = %e, "Dropping malformed bus event");
                None
            }
        }
    }

    /// Short name used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Trade { .. } => "TRADE",
            Self::MarketCreate { .. } => "MARKET_CREATE",
            Self::Resolve { .. } => "RESOLVE",
            Self::Faucet { .. } => "FAUCET",
            Self::PriceUpdate { .. } => "PRICE_UPDATE",
        }
    }
}

/// Callback invoked for every event received from another session.
pub type Listener = Box<dyn Fn(BusEvent) + Send + Sync + 'static>;

/// Handle to an active subscription. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(task: JoinHandle<()>) -> Self {
        Self { task: Some(task) }
    }

    /// A subscription that never delivers, returned by closed buses.
    pub fn inactive() -> Self {
        Self { task: None }
    }

    /// Whether events can still be delivered.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop delivering events to this listener.
    pub fn unsubscribe(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Best-effort, at-most-once notification channel between sessions.
///
/// Events are never delivered to the publishing session, and never
/// synchronously inside [`publish`](RealtimeBus::publish).
pub trait RealtimeBus: Send + Sync {
    /// Send an event to every other session. Fire-and-forget.
    fn publish(&self, event: &BusEvent);

    /// Register a listener. Must be called inside a tokio runtime.
    fn subscribe(&self, listener: Listener) -> Subscription;

    /// Stop all subscriptions and ignore further publishes.
    fn close(&self);
}
