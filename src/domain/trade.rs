//! Executed trades.
//!
//! A [`Trade`] is an immutable record of points staked on one side of a
//! market at the quoted price. Shares are derived at construction and pay
//! out one point each if the side wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{MarketId, TradeId, WalletAddress};
use super::market::Side;
use super::money::{Points, Price};

/// An executed trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    id: TradeId,
    market_id: MarketId,
    wallet: WalletAddress,
    side: Side,
    amount_pts: Points,
    price: Price,
    shares: Points,
    timestamp: DateTime<Utc>,
}

impl Trade {
    /// Record a trade of `amount_pts` at `price`; `shares = amount_pts / price`.
    ///
    /// The caller guarantees `amount_pts > 0` and `price` inside (0, 1).
    #[must_use]
    pub fn new(
        market_id: MarketId,
        wallet: WalletAddress,
        side: Side,
        amount_pts: Points,
        price: Price,
    ) -> Self {
        Self {
            id: TradeId::new(),
            market_id,
            wallet,
            side,
            amount_pts,
            price,
            shares: amount_pts / price,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> &TradeId {
        &self.id
    }

    #[must_use]
    pub const fn market_id(&self) -> &MarketId {
        &self.market_id
    }

    #[must_use]
    pub const fn wallet(&self) -> &WalletAddress {
        &self.wallet
    }

    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Points debited from the wallet for this trade.
    #[must_use]
    pub const fn amount_pts(&self) -> Points {
        self.amount_pts
    }

    /// Execution price.
    #[must_use]
    pub const fn price(&self) -> Price {
        self.price
    }

    #[must_use]
    pub const fn shares(&self) -> Points {
        self.shares
    }

    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
