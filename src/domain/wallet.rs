//! Wallet balances.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::WalletAddress;
use super::money::Points;

/// Point balance and realized PnL of one wallet.
///
/// Mutated only by trade debits, faucet credits and settlement credits. Every
/// mutation returns a new value; the canonical copy lives in the state store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletState {
    pub address: WalletAddress,
    pub points: Points,
    #[serde(default)]
    pub pnl_realized: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_faucet_claim: Option<DateTime<Utc>>,
}

impl WalletState {
    /// An empty wallet.
    #[must_use]
    pub fn new(address: WalletAddress) -> Self {
        Self {
            address,
            points: Decimal::ZERO,
            pnl_realized: Decimal::ZERO,
            last_faucet_claim: None,
        }
    }

    /// A wallet holding `points`.
    #[must_use]
    pub fn with_points(address: WalletAddress, points: Points) -> Self {
        Self {
            points,
            ..Self::new(address)
        }
    }

    /// Debit a trade amount.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InsufficientPoints`] if the balance would go negative.
    pub fn debit(&self, amount: Points) -> Result<Self, DomainError> {
        if amount > self.points {
            return Err(DomainError::InsufficientPoints {
                address: self.address.clone(),
                available: self.points,
                required: amount,
            });
        }
        Ok(Self {
            points: self.points - amount,
            ..self.clone()
        })
    }

    /// Credit a faucet drip and stamp the claim time.
    #[must_use]
    pub fn credit_faucet(&self, amount: Points, at: DateTime<Utc>) -> Self {
        Self {
            points: self.points + amount,
            last_faucet_claim: Some(at),
            ..self.clone()
        }
    }

    /// Credit a settlement payout and realize `payout - cost_basis`.
    #[must_use]
    pub fn credit_payout(&self, payout: Points, cost_basis: Points) -> Self {
        Self {
            points: self.points + payout,
            pnl_realized: self.pnl_realized + (payout - cost_basis),
            ..self.clone()
        }
    }
}
