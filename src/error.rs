use thiserror::Error;

use crate::domain::error::DomainError;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// A conditional write lost the race against another writer.
///
/// The caller must re-read the collection and retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("stale write to {collection}: expected version {expected}, found {actual}")]
pub struct StaleWriteError {
    pub collection: String,
    pub expected: u64,
    pub actual: u64,
}

/// Business-rule rejections raised by the ledger before touching the core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("market not found: {0}")]
    MarketNotFound(String),

    #[error("wallet not found: {0}")]
    WalletNotFound(String),

    #[error("market {market_id} is {status}, not open")]
    MarketNotOpen { market_id: String, status: String },

    #[error("amount must be positive, got {amount}")]
    NonPositiveAmount { amount: rust_decimal::Decimal },

    #[error("nothing to claim for {wallet} in market {market_id}")]
    NothingToClaim { wallet: String, market_id: String },

    #[error("faucet cooldown active for {wallet}, next claim at {available_at}")]
    FaucetCooldown {
        wallet: String,
        available_at: chrono::DateTime<chrono::Utc>,
    },

    #[error("{wallet} is not allowed to administer markets")]
    NotAuthorized { wallet: String },

    #[error("gave up after {attempts} conflicting writes")]
    RetriesExhausted { attempts: u32 },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    StaleWrite(#[from] StaleWriteError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("price feed error: {0}")]
    PriceFeed(String),
}

pub type Result<T> = std::result::Result<T, Error>;
