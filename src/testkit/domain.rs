//! Builders for domain primitives used across tests.

use rust_decimal::Decimal;

use crate::domain::{Market, MarketId, MarketKind, Side, Trade, WalletAddress, WalletState};

/// Create a [`WalletAddress`] from a string.
pub fn address(value: &str) -> WalletAddress {
    WalletAddress::new(value)
}

/// Create a [`MarketId`] from a string.
pub fn market_id(id: &str) -> MarketId {
    MarketId::new(id)
}

/// A wallet holding `points` and nothing else.
pub fn funded_wallet(value: &str, points: Decimal) -> WalletState {
    WalletState::with_points(address(value), points)
}

/// An open market with id `id` and the given stakes on its two sides.
pub fn market_with_stakes(id: &str, kind: MarketKind, first: Decimal, second: Decimal) -> Market {
    let mut market = Market::new(format!("{id}?"), kind).with_id(market_id(id));
    let [a, b] = kind.sides();
    if first > Decimal::ZERO {
        let _ = market.record_stake(a, first);
    }
    if second > Decimal::ZERO {
        let _ = market.record_stake(b, second);
    }
    market
}

/// A trade on `market` at a fixed price.
pub fn trade_at(market: &str, wallet: &str, side: Side, amount: Decimal, price: Decimal) -> Trade {
    Trade::new(market_id(market), address(wallet), side, amount, price)
}
