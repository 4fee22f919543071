//! Persistence port for versioned key-value blobs.
//!
//! The state store keeps each collection as one JSON blob under a fixed key.
//! Every key carries a version that increases on each write (removal
//! included), so writers can make a write conditional on the version they
//! read. [`Storage::commit`] applies a batch of writes atomically: either
//! every condition holds and all writes land, or nothing changes.
//!
//! Backends that can notify other sessions of changes expose a
//! [`StorageWatch`] through [`Storage::watch`].

use std::fmt;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::warn;

use crate::error::Result;

/// A value together with the version it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub version: u64,
    pub value: T,
}

impl<T> Versioned<T> {
    pub fn new(version: u64, value: T) -> Self {
        Self { version, value }
    }

    /// Transform the value, keeping the version.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Versioned<U> {
        Versioned {
            version: self.version,
            value: f(self.value),
        }
    }
}

/// One write in a [`Storage::commit`] batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Write {
    pub key: String,
    /// Version the key must still have. `None` writes unconditionally.
    pub expected: Option<u64>,
    /// New body. `None` removes the key.
    pub body: Option<String>,
}

impl Write {
    /// Unconditional overwrite.
    pub fn put(key: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            expected: None,
            body: Some(body.into()),
        }
    }

    /// Overwrite only if the key is still at `expected`.
    pub fn put_if(key: impl Into<String>, expected: u64, body: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            expected: Some(expected),
            body: Some(body.into()),
        }
    }

    /// Unconditional removal.
    pub fn remove(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            expected: None,
            body: None,
        }
    }
}

/// Identity of one session (one open handle onto shared storage).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(uuid::Uuid);

impl SessionId {
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Notification that a key changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub key: String,
    /// New body, `None` after removal.
    pub value: Option<String>,
    pub origin: SessionId,
}

/// Receiver of changes made by *other* sessions.
pub struct StorageWatch {
    rx: broadcast::Receiver<StorageChange>,
    session: SessionId,
}

impl StorageWatch {
    pub fn new(rx: broadcast::Receiver<StorageChange>, session: SessionId) -> Self {
        Self { rx, session }
    }

    /// Wait for the next change made by another session.
    ///
    /// Returns `None` once the storage is gone. Changes missed because the
    /// receiver lagged are skipped.
    pub async fn next(&mut self) -> Option<StorageChange> {
        loop {
            match self.rx.recv().await {
                Ok(change) if change.origin == self.session => continue,
                Ok(change) => return Some(change),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Storage watch lagged, changes dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Versioned key-value persistence.
pub trait Storage: Send + Sync {
    /// Read a key. Missing keys read as `None` at their last version (0 if
    /// never written).
    ///
    /// # Errors
    ///
    /// Returns an error only for I/O failures; unreadable content is reported
    /// as absent.
    fn read(&self, key: &str) -> Result<Versioned<Option<String>>>;

    /// Apply all writes atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StaleWriteError`](crate::error::StaleWriteError) if any
    /// conditional write no longer matches, leaving storage untouched.
    fn commit(&self, writes: &[Write]) -> Result<()>;

    /// Change feed for other sessions, if the backend has one.
    fn watch(&self) -> Option<StorageWatch> {
        None
    }
}

impl<S: Storage + ?Sized> Storage for Arc<S> {
    fn read(&self, key: &str) -> Result<Versioned<Option<String>>> {
        (**self).read(key)
    }

    fn commit(&self, writes: &[Write]) -> Result<()> {
        (**self).commit(writes)
    }

    fn watch(&self) -> Option<StorageWatch> {
        (**self).watch()
    }
}
