//! Durable state store for markets, trades, wallets, claims and settings.
//!
//! Each collection is one JSON blob under a fixed key of the injected
//! [`Storage`]. Reads are total: a missing or corrupt blob reads as the
//! empty default, and corruption is reported through a structured warning
//! and [`StateStore::corrupt_reads`] instead of an error.
//!
//! Plain `set_*` calls overwrite unconditionally. Read-modify-write callers
//! use the `load_*` variants, which carry the collection version, and commit
//! a [`Transaction`] whose writes only land if no other writer got there
//! first.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{ClaimRecord, Market, Settings, Trade, WalletState};
use crate::error::Result;
use crate::port::outbound::store::{Storage, Versioned, Write};

/// The persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Markets,
    Trades,
    Wallets,
    Settings,
    Claims,
}

impl Collection {
    pub const ALL: [Self; 5] = [
        Self::Markets,
        Self::Trades,
        Self::Wallets,
        Self::Settings,
        Self::Claims,
    ];

    /// Storage key of this collection.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Markets => "markets",
            Self::Trades => "trades",
            Self::Wallets => "wallets",
            Self::Settings => "settings",
            Self::Claims => "claims",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A batch of conditional collection writes, committed atomically.
#[derive(Debug, Default)]
pub struct Transaction {
    writes: Vec<Write>,
}

impl Transaction {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace `collection` with `value` if it is still at `expected_version`.
    ///
    /// # Errors
    ///
    /// Returns a JSON error if `value` cannot be serialized.
    pub fn put<T: Serialize + ?Sized>(
        mut self,
        collection: Collection,
        expected_version: u64,
        value: &T,
    ) -> Result<Self> {
        let body = serde_json::to_string(value)?;
        self.writes
            .push(Write::put_if(collection.key(), expected_version, body));
        Ok(self)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Typed access to the persisted collections.
pub struct StateStore<S> {
    storage: S,
    corrupt_reads: AtomicU64,
}

impl<S: Storage> StateStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            corrupt_reads: AtomicU64::new(0),
        }
    }

    /// Underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Number of reads that found unreadable data and fell back to defaults.
    pub fn corrupt_reads(&self) -> u64 {
        self.corrupt_reads.load(Ordering::Relaxed)
    }

    fn load<T: DeserializeOwned + Default>(&self, collection: Collection) -> Versioned<T> {
        let read = match self.storage.read(collection.key()) {
            Ok(read) => read,
            Err(e) => {
                warn!(collection = %collection, error = %e, "Storage read failed, using default");
                return Versioned::new(0, T::default());
            }
        };

        let version = read.version;
        let Some(body) = read.value else {
            return Versioned::new(version, T::default());
        };

        match serde_json::from_str(&body) {
            Ok(value) => Versioned::new(version, value),
            Err(e) => {
                self.corrupt_reads.fetch_add(1, Ordering::Relaxed);
                warn!(
                    collection = %collection,
                    version,
                    error = %e,
                    "Corrupt collection data, using default"
                );
                Versioned::new(version, T::default())
            }
        }
    }

    fn overwrite<T: Serialize + ?Sized>(&self, collection: Collection, value: &T) -> Result<()> {
        let body = serde_json::to_string(value)?;
        self.storage.commit(&[Write::put(collection.key(), body)])
    }

    pub fn load_markets(&self) -> Versioned<Vec<Market>> {
        self.load(Collection::Markets)
    }

    pub fn load_trades(&self) -> Versioned<Vec<Trade>> {
        self.load(Collection::Trades)
    }

    pub fn load_wallets(&self) -> Versioned<Vec<WalletState>> {
        self.load(Collection::Wallets)
    }

    pub fn load_settings(&self) -> Versioned<Settings> {
        self.load(Collection::Settings)
    }

    pub fn load_claims(&self) -> Versioned<Vec<ClaimRecord>> {
        self.load(Collection::Claims)
    }

    pub fn get_markets(&self) -> Vec<Market> {
        self.load_markets().value
    }

    pub fn get_trades(&self) -> Vec<Trade> {
        self.load_trades().value
    }

    pub fn get_wallets(&self) -> Vec<WalletState> {
        self.load_wallets().value
    }

    pub fn get_settings(&self) -> Settings {
        self.load_settings().value
    }

    pub fn get_claims(&self) -> Vec<ClaimRecord> {
        self.load_claims().value
    }

    /// Overwrite the markets collection.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the storage write fails.
    pub fn set_markets(&self, markets: &[Market]) -> Result<()> {
        self.overwrite(Collection::Markets, markets)
    }

    /// Overwrite the trades collection.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the storage write fails.
    pub fn set_trades(&self, trades: &[Trade]) -> Result<()> {
        self.overwrite(Collection::Trades, trades)
    }

    /// Overwrite the wallets collection.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the storage write fails.
    pub fn set_wallets(&self, wallets: &[WalletState]) -> Result<()> {
        self.overwrite(Collection::Wallets, wallets)
    }

    /// Overwrite the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the storage write fails.
    pub fn set_settings(&self, settings: &Settings) -> Result<()> {
        self.overwrite(Collection::Settings, settings)
    }

    /// Overwrite the claims collection.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the storage write fails.
    pub fn set_claims(&self, claims: &[ClaimRecord]) -> Result<()> {
        self.overwrite(Collection::Claims, claims)
    }

    /// Commit a transaction atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StaleWriteError`](crate::error::StaleWriteError) if any
    /// collection changed since it was loaded; nothing is written then.
    pub fn commit(&self, transaction: Transaction) -> Result<()> {
        if transaction.is_empty() {
            return Ok(());
        }
        self.storage.commit(&transaction.writes)
    }

    /// Clear every collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage write fails.
    pub fn reset(&self) -> Result<()> {
        let writes: Vec<Write> = Collection::ALL
            .iter()
            .map(|c| Write::remove(c.key()))
            .collect();
        self.storage.commit(&writes)?;
        info!("State store reset");
        Ok(())
    }
}
