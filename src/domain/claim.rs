//! Pending payout entitlements created at settlement.

use serde::{Deserialize, Serialize};

use super::id::{MarketId, TradeId, WalletAddress};
use super::money::Points;

/// A single-use payout entitlement for one winning (or refunded) trade.
///
/// Created unclaimed by settlement; consumed exactly once when the owning
/// wallet claims it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRecord {
    pub market_id: MarketId,
    pub wallet: WalletAddress,
    pub trade_id: TradeId,
    pub shares: Points,
    pub payout: Points,
    pub cost_basis: Points,
    #[serde(default)]
    pub claimed: bool,
}

impl ClaimRecord {
    /// Returns true if this record belongs to `wallet` in `market_id`.
    #[must_use]
    pub fn is_for(&self, wallet: &WalletAddress, market_id: &MarketId) -> bool {
        &self.wallet == wallet && &self.market_id == market_id
    }
}
