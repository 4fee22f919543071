//! In-memory storage shared between session handles.
//!
//! Every [`MemoryStorage`] handle created through [`MemoryStorage::session`]
//! sees the same data and the same change feed, but has its own
//! [`SessionId`]. Watchers only observe changes made by other handles.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::error::{Result, StaleWriteError};
use crate::port::outbound::store::{
    SessionId, Storage, StorageChange, StorageWatch, Versioned, Write,
};

/// Default number of buffered change notifications per watcher.
const DEFAULT_CHANGE_CAPACITY: usize = 256;

#[derive(Debug, Default)]
struct Slot {
    version: u64,
    body: Option<String>,
}

struct Shared {
    slots: Mutex<HashMap<String, Slot>>,
    changes: broadcast::Sender<StorageChange>,
}

/// Shared in-memory storage handle.
#[derive(Clone)]
pub struct MemoryStorage {
    shared: Arc<Shared>,
    session: SessionId,
}

impl MemoryStorage {
    /// Create empty storage and its first session handle.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANGE_CAPACITY)
    }

    /// Create empty storage buffering up to `capacity` change notifications.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (changes, _) = broadcast::channel(capacity.max(1));
        Self {
            shared: Arc::new(Shared {
                slots: Mutex::new(HashMap::new()),
                changes,
            }),
            session: SessionId::new(),
        }
    }

    /// Open another session onto the same data.
    #[must_use]
    pub fn session(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            session: SessionId::new(),
        }
    }

    /// This handle's session.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Versioned<Option<String>>> {
        let slots = self.shared.slots.lock();
        Ok(slots.get(key).map_or_else(
            || Versioned::new(0, None),
            |slot| Versioned::new(slot.version, slot.body.clone()),
        ))
    }

    fn commit(&self, writes: &[Write]) -> Result<()> {
        let changes = {
            let mut slots = self.shared.slots.lock();

            for write in writes {
                let actual = slots.get(&write.key).map_or(0, |s| s.version);
                if let Some(expected) = write.expected {
                    if expected != actual {
                        return Err(StaleWriteError {
                            collection: write.key.clone(),
                            expected,
                            actual,
                        }
                        .into());
                    }
                }
            }

            writes
                .iter()
                .map(|write| {
                    let slot = slots.entry(write.key.clone()).or_default();
                    slot.version += 1;
                    slot.body.clone_from(&write.body);
                    StorageChange {
                        key: write.key.clone(),
                        value: write.body.clone(),
                        origin: self.session,
                    }
                })
                .collect::<Vec<_>>()
        };

        // Notify after releasing the lock; no watchers is fine.
        for change in changes {
            let _ = self.shared.changes.send(change);
        }
        Ok(())
    }

    fn watch(&self) -> Option<StorageWatch> {
        Some(StorageWatch::new(
            self.shared.changes.subscribe(),
            self.session,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn missing_key_reads_empty_at_version_zero() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.read("markets").unwrap(), Versioned::new(0, None));
    }

    #[test]
    fn every_write_bumps_the_version() {
        let storage = MemoryStorage::new();
        storage.commit(&[Write::put("k", "1")]).unwrap();
        storage.commit(&[Write::put("k", "2")]).unwrap();
        assert_eq!(storage.read("k").unwrap(), Versioned::new(2, Some("2".into())));

        storage.commit(&[Write::remove("k")]).unwrap();
        assert_eq!(storage.read("k").unwrap(), Versioned::new(3, None));
    }

    #[test]
    fn stale_conditional_write_changes_nothing() {
        let storage = MemoryStorage::new();
        storage.commit(&[Write::put("a", "a1"), Write::put("b", "b1")]).unwrap();

        let result = storage.commit(&[Write::put_if("a", 1, "a2"), Write::put_if("b", 0, "b2")]);
        match result {
            Err(Error::StaleWrite(e)) => {
                assert_eq!(e.collection, "b");
                assert_eq!(e.expected, 0);
                assert_eq!(e.actual, 1);
            }
            other => panic!("expected stale write, got {other:?}"),
        }
        assert_eq!(storage.read("a").unwrap().value.as_deref(), Some("a1"));
        assert_eq!(storage.read("b").unwrap().value.as_deref(), Some("b1"));
    }

    #[test]
    fn sessions_share_data() {
        let tab_a = MemoryStorage::new();
        let tab_b = tab_a.session();
        assert_ne!(tab_a.session_id(), tab_b.session_id());

        tab_a.commit(&[Write::put("k", "v")]).unwrap();
        assert_eq!(tab_b.read("k").unwrap().value.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn watchers_only_see_other_sessions() {
        let tab_a = MemoryStorage::new();
        let tab_b = tab_a.session();
        let mut watch_a = tab_a.watch().unwrap();

        tab_a.commit(&[Write::put("k", "own")]).unwrap();
        tab_b.commit(&[Write::put("k", "peer")]).unwrap();

        let change = watch_a.next().await.unwrap();
        assert_eq!(change.value.as_deref(), Some("peer"));
        assert_eq!(change.origin, tab_b.session_id());
    }
}
