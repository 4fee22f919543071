//! Domain validation errors for core domain types.
//!
//! This module defines errors that occur when domain invariants are violated.
//! They are returned by constructors and state transitions that validate inputs.
//!
//! # Examples
//!
//! ```
//! use pointbook::domain::{DomainError, Market, MarketKind, MarketStatus};
//!
//! let mut market = Market::new("Will it rain tomorrow?", MarketKind::YesNo);
//! market.transition(MarketStatus::Closed).unwrap();
//!
//! let result = market.transition(MarketStatus::Open);
//! assert!(matches!(result, Err(DomainError::InvalidTransition { .. })));
//! ```

use thiserror::Error;

use super::id::{MarketId, WalletAddress};
use super::market::{MarketKind, MarketStatus, Side};

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Market status only moves forward.
    #[error("market cannot move from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: MarketStatus,
        /// Requested status.
        to: MarketStatus,
    },

    /// The side is not one of the market's outcome keys.
    #[error("side {side} is not valid for a {kind} market")]
    InvalidSide {
        /// The rejected side.
        side: Side,
        /// The market kind.
        kind: MarketKind,
    },

    /// A market resolution is set exactly once.
    #[error("market {market_id} is already resolved")]
    AlreadyResolved {
        /// The market that already has a winner.
        market_id: MarketId,
    },

    /// A wallet balance can never go negative.
    #[error("wallet {address} has {available} points, needs {required}")]
    InsufficientPoints {
        /// The wallet being debited.
        address: WalletAddress,
        /// Current balance.
        available: rust_decimal::Decimal,
        /// Requested debit.
        required: rust_decimal::Decimal,
    },

    /// Claim records are consumed exactly once.
    #[error("claim for trade {trade_id} has already been processed")]
    ClaimAlreadyProcessed {
        /// Trade the claim was created for.
        trade_id: String,
    },

    /// A claim can only credit the wallet it was issued to.
    #[error("claim belongs to {expected}, not {actual}")]
    ClaimWalletMismatch {
        /// Owner recorded on the claim.
        expected: WalletAddress,
        /// Wallet the claim was applied to.
        actual: WalletAddress,
    },
}
