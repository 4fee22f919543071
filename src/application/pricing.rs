//! Bonding-curve pricing and trade quotes.
//!
//! Prices come from a symmetric two-sided curve with a virtual liquidity
//! offset `ε` added to both sides:
//!
//! ```text
//! price(first)  = (ε + first) / (2ε + first + second)
//! price(second) = 1 - price(first)
//! ```
//!
//! The denominator is at least `2ε`, so every price is defined and strictly
//! inside (0, 1). Both sides always sum to exactly one.
//!
//! These are pure functions. Callers validate amounts and prices before
//! quoting; nothing here checks its inputs.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::domain::{MarketKind, Points, Price, Side, Stakes};

/// Virtual liquidity `ε` added to both sides of the curve.
pub const VIRTUAL_LIQUIDITY: Points = dec!(100);

/// Quote for a single-fill order at a fixed price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeQuote {
    /// `amount / price`.
    pub shares: Points,
    /// Same as the quoted price; there is no slippage model.
    pub avg_price: Price,
    /// `shares * (1 - price)`.
    pub max_profit: Points,
    /// One point per share.
    pub max_payout: Points,
}

/// The current favourite of a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Chance {
    pub side: Side,
    /// Favourite's price as a percentage.
    pub percentage: Decimal,
}

/// Instantaneous price of `side`.
///
/// Uses the stake pair that matches `kind`. A side foreign to `kind` is
/// priced as the second outcome of the pair.
#[must_use]
pub fn compute_price(side: Side, stakes: &Stakes, kind: MarketKind) -> Price {
    let (first, second) = stakes.pair(kind);
    let first_price =
        (VIRTUAL_LIQUIDITY + first) / (VIRTUAL_LIQUIDITY + VIRTUAL_LIQUIDITY + first + second);

    let [first_side, _] = kind.sides();
    if side == first_side {
        first_price
    } else {
        Decimal::ONE - first_price
    }
}

/// Quote an order of `amount` points at `price`.
#[must_use]
pub fn calculate_trade(amount: Points, price: Price) -> TradeQuote {
    let shares = amount / price;
    TradeQuote {
        shares,
        avg_price: price,
        max_profit: shares * (Decimal::ONE - price),
        max_payout: shares,
    }
}

/// The side currently priced above one half.
///
/// The comparison is strict, so an exact 50/50 market reports the second
/// outcome (`NO` or `B`).
#[must_use]
pub fn get_chance(stakes: &Stakes, kind: MarketKind) -> Chance {
    let [first, second] = kind.sides();
    let first_price = compute_price(first, stakes, kind);

    let (side, price) = if first_price > dec!(0.5) {
        (first, first_price)
    } else {
        (second, Decimal::ONE - first_price)
    };

    Chance {
        side,
        percentage: price * Decimal::ONE_HUNDRED,
    }
}
