//! Points-market domain types and their invariants.

pub mod claim;
pub mod error;
pub mod id;
pub mod market;
pub mod money;
pub mod settings;
pub mod trade;
pub mod wallet;

pub use claim::ClaimRecord;
pub use error::DomainError;
pub use id::{MarketId, TradeId, WalletAddress};
pub use market::{Market, MarketKind, MarketStatus, Resolution, Side, Stakes};
pub use money::{Points, Price};
pub use settings::Settings;
pub use trade::Trade;
pub use wallet::WalletState;
