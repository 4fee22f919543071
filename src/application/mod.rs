//! Application services (use cases).
//!
//! [`pricing`] and [`settlement`] are pure engines over domain values.
//! [`store`] gives typed, versioned access to the persisted collections, and
//! [`ledger`] composes the three into the operations the calling layer runs.

pub mod ledger;
pub mod pricing;
pub mod settlement;
pub mod store;

pub use ledger::{Ledger, LedgerConfig, TradeReceipt};
pub use pricing::{calculate_trade, compute_price, get_chance, Chance, TradeQuote};
pub use settlement::{distribute_rewards, process_claim, Settlement};
pub use store::{Collection, StateStore, Transaction};
