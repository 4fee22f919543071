//! Pointbook - points-based prediction markets.
//!
//! Users stake points on one of two outcomes of a market. Prices follow a
//! bonding curve over the staked totals, and a resolved market pays its
//! winners 80% of the pool pro rata by shares. State lives in a versioned
//! store, and peers learn about changes through a realtime bus.
//!
//! # Architecture
//!
//! - **`domain`** - Markets, trades, wallets, claim records and settings
//! - **`application`** - Pricing and settlement engines, the typed state
//!   store and the [`Ledger`](application::Ledger) service composing them
//! - **`port`** - Storage, realtime bus and price feed traits
//! - **`adapter`** - Memory and file storage, broadcast and storage-backed
//!   buses, and the `pointbook` command line
//! - **`infrastructure`** - Configuration and component factories
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use pointbook::adapter::outbound::bus::{BroadcastBus, BroadcastHub};
//! use pointbook::adapter::outbound::storage::MemoryStorage;
//! use pointbook::application::{Ledger, LedgerConfig, StateStore};
//! use pointbook::domain::{MarketKind, Side, WalletAddress};
//! use rust_decimal_macros::dec;
//!
//! # fn main() -> pointbook::error::Result<()> {
//! let hub = BroadcastHub::default();
//! let ledger = Ledger::new(
//!     StateStore::new(MemoryStorage::new()),
//!     Arc::new(BroadcastBus::connect(&hub, "pointbook")),
//!     LedgerConfig::default(),
//! );
//!
//! let alice = WalletAddress::new("0xa11ce");
//! ledger.faucet(&alice)?;
//! let market = ledger.create_market("Will it rain?", MarketKind::YesNo, None)?;
//! ledger.place_trade(&alice, market.id(), Side::Yes, dec!(100))?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
