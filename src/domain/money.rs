//! Monetary types for point balances and prices.

use rust_decimal::Decimal;

/// Price of one share, always inside (0, 1) when produced by the pricing engine.
pub type Price = Decimal;

/// Amount of points. Stakes, balances, payouts and share counts all use it.
pub type Points = Decimal;
