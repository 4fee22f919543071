//! Price feed port for external reference prices.
//!
//! Upstream price sources (token tickers, coin APIs) live outside the core.
//! The core only reads through [`fetch_or_fallback`], which never fails: a
//! failing feed yields a zeroed snapshot tagged with [`FALLBACK_SOURCE`].

use std::future::Future;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;

/// Source tag of a snapshot produced after a feed failure.
pub const FALLBACK_SOURCE: &str = "fallback";

/// A reference price reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSnapshot {
    pub price_usd: Decimal,
    pub price_change_24h: Decimal,
    pub volume_24h: Decimal,
    pub timestamp: DateTime<Utc>,
    pub source: String,
}

impl PriceSnapshot {
    /// Zeroed snapshot returned when a feed fails.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            price_usd: Decimal::ZERO,
            price_change_24h: Decimal::ZERO,
            volume_24h: Decimal::ZERO,
            timestamp: Utc::now(),
            source: FALLBACK_SOURCE.to_string(),
        }
    }

    /// Whether this snapshot came from a failed read.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.source == FALLBACK_SOURCE
    }
}

/// An upstream price source, keyed by token address or coin identifier.
pub trait PriceFeed: Send + Sync {
    fn fetch(&self, source: &str) -> impl Future<Output = Result<PriceSnapshot>> + Send;
}

/// Read a price, degrading any failure to [`PriceSnapshot::fallback`].
pub async fn fetch_or_fallback<F: PriceFeed>(feed: &F, source: &str) -> PriceSnapshot {
    match feed.fetch(source).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(source, error = %e, "Price feed failed, using fallback");
            PriceSnapshot::fallback()
        }
    }
}
