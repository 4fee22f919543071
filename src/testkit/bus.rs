//! Test doubles for the outbound ports.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::port::outbound::bus::{BusEvent, Listener, RealtimeBus, Subscription};
use crate::port::outbound::price::{PriceFeed, PriceSnapshot};

/// A bus that records published events and delivers nothing.
#[derive(Default)]
pub struct RecordingBus {
    published: Mutex<Vec<BusEvent>>,
}

impl RecordingBus {
    /// Events published so far, in order.
    pub fn published(&self) -> Vec<BusEvent> {
        self.published.lock().clone()
    }

    /// Wire kinds of the published events, in order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.published.lock().iter().map(BusEvent::kind).collect()
    }
}

impl RealtimeBus for RecordingBus {
    fn publish(&self, event: &BusEvent) {
        self.published.lock().push(event.clone());
    }

    fn subscribe(&self, _listener: Listener) -> Subscription {
        Subscription::inactive()
    }

    fn close(&self) {}
}

/// A price feed answering from a fixed table; unknown sources fail.
#[derive(Default)]
pub struct StaticFeed {
    prices: HashMap<String, PriceSnapshot>,
}

impl StaticFeed {
    pub fn with(mut self, source: &str, snapshot: PriceSnapshot) -> Self {
        self.prices.insert(source.to_string(), snapshot);
        self
    }
}

impl PriceFeed for StaticFeed {
    async fn fetch(&self, source: &str) -> Result<PriceSnapshot> {
        self.prices
            .get(source)
            .cloned()
            .ok_or_else(|| Error::PriceFeed(format!("no price for {source}")))
    }
}
