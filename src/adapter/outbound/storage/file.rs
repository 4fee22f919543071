//! File-backed storage: every key in one snapshot document.
//!
//! The data directory holds `state.json`:
//!
//! ```json
//! {"entries": {"wallets": {"version": 3, "body": "[...]"}}}
//! ```
//!
//! A commit builds the next snapshot in memory and replaces the file with a
//! single write-to-temp-then-rename, so a batch of writes lands on disk
//! together or not at all. A removed key keeps its entry with `"body": null`
//! so the version keeps counting up. Bodies are stored verbatim; a body that
//! no longer parses is the state store's concern and never costs the key its
//! version.
//!
//! Writers across processes are serialized by an advisory lock on `.lock`.
//! The kernel drops the lock when its holder exits, so a crashed process
//! never leaves the directory locked.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};

use fs4::fs_std::FileExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result, StaleWriteError};
use crate::port::outbound::store::{Storage, Versioned, Write};

const SNAPSHOT_FILE: &str = "state.json";
const SNAPSHOT_TEMP_FILE: &str = "state.json.tmp";
const LOCK_FILE: &str = ".lock";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Entry {
    version: u64,
    #[serde(default)]
    body: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    entries: BTreeMap<String, Entry>,
}

impl Snapshot {
    fn version_of(&self, key: &str) -> u64 {
        self.entries.get(key).map_or(0, |e| e.version)
    }
}

/// Directory holding one versioned snapshot file.
pub struct FileStorage {
    dir: PathBuf,
    /// Serializes commits from handles inside this process.
    local: Mutex<()>,
}

impl FileStorage {
    /// Open (creating if needed) a storage directory.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            local: Mutex::new(()),
        })
    }

    /// Storage directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the snapshot file.
    #[must_use]
    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILE)
    }

    /// An unreadable snapshot is an error rather than an empty one: starting
    /// over would hand out versions that were already used.
    fn read_snapshot(&self) -> Result<Snapshot> {
        let path = self.snapshot_path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Snapshot::default()),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content).map_err(|e| {
            Error::Storage(format!(
                "unreadable storage snapshot {}: {e}",
                path.display()
            ))
        })
    }

    fn write_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        let json = serde_json::to_string(snapshot)?;
        let temp_path = self.dir.join(SNAPSHOT_TEMP_FILE);
        let mut file = File::create(&temp_path)?;

        let cleanup_and_err = |e| {
            let _ = fs::remove_file(&temp_path);
            e
        };

        file.write_all(json.as_bytes()).map_err(cleanup_and_err)?;
        file.sync_all().map_err(cleanup_and_err)?;
        fs::rename(&temp_path, self.snapshot_path()).map_err(cleanup_and_err)?;
        Ok(())
    }
}

/// Exclusive advisory lock on the directory's `.lock` file.
///
/// The file itself is never removed; holding the lock is what counts, and
/// closing the handle (including on process exit) releases it.
struct DirLock {
    _file: File,
}

impl DirLock {
    fn acquire(dir: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(dir.join(LOCK_FILE))?;
        FileExt::lock_exclusive(&file)?;
        Ok(Self { _file: file })
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Versioned<Option<String>>> {
        let snapshot = self.read_snapshot()?;
        Ok(match snapshot.entries.get(key) {
            Some(entry) => Versioned::new(entry.version, entry.body.clone()),
            None => Versioned::new(0, None),
        })
    }

    fn commit(&self, writes: &[Write]) -> Result<()> {
        let _local = self.local.lock();
        let _lock = DirLock::acquire(&self.dir)?;

        let mut snapshot = self.read_snapshot()?;
        for write in writes {
            let actual = snapshot.version_of(&write.key);
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
            snapshot.entries.insert(
                write.key.clone(),
                Entry {
                    version: actual + 1,
                    body: write.body.clone(),
                },
            );
        }

        self.write_snapshot(&snapshot)?;
        debug!(keys = writes.len(), "Storage snapshot written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_bodies_with_versions() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();

        storage.commit(&[Write::put("markets", "[1,2]")]).unwrap();
        let read = storage.read("markets").unwrap();
        assert_eq!(read.version, 1);
        assert_eq!(read.value.as_deref(), Some("[1,2]"));
    }

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        FileStorage::open(dir.path())
            .unwrap()
            .commit(&[Write::put("wallets", "[]")])
            .unwrap();

        let reopened = FileStorage::open(dir.path()).unwrap();
        assert_eq!(reopened.read("wallets").unwrap(), Versioned::new(1, Some("[]".into())));
    }

    #[test]
    fn removal_keeps_counting_versions() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        storage.commit(&[Write::put("k", "{}")]).unwrap();
        storage.commit(&[Write::remove("k")]).unwrap();
        assert_eq!(storage.read("k").unwrap(), Versioned::new(2, None));

        let stale = storage.commit(&[Write::put_if("k", 0, "{}")]);
        assert!(matches!(stale, Err(Error::StaleWrite(_))));
    }

    #[test]
    fn interrupted_commit_leaves_every_key_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        storage
            .commit(&[Write::put("wallets", "[1]"), Write::put("claims", "[1]")])
            .unwrap();
        fs::create_dir(dir.path().join(SNAPSHOT_TEMP_FILE)).unwrap();

        let result = storage.commit(&[Write::put_if("wallets", 1, "[2]"), Write::put_if("claims", 1, "[2]")]);

        assert!(matches!(result, Err(Error::Io(_))));
        assert_eq!(storage.read("wallets").unwrap(), Versioned::new(1, Some("[1]".into())));
        assert_eq!(storage.read("claims").unwrap(), Versioned::new(1, Some("[1]".into())));
    }

    #[test]
    fn unparseable_body_keeps_its_version() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        for _ in 0..3 {
            storage.commit(&[Write::put("trades", "{not json")]).unwrap();
        }

        assert_eq!(storage.read("trades").unwrap(), Versioned::new(3, Some("{not json".into())));
        storage.commit(&[Write::put_if("trades", 3, "[]")]).unwrap();
        assert_eq!(storage.read("trades").unwrap().version, 4);
    }

    #[test]
    fn unreadable_snapshot_refuses_writes() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        fs::write(storage.snapshot_path(), "{ truncated").unwrap();

        assert!(matches!(storage.read("markets"), Err(Error::Storage(_))));
        assert!(matches!(
            storage.commit(&[Write::put("markets", "[]")]),
            Err(Error::Storage(_))
        ));
        assert_eq!(fs::read_to_string(storage.snapshot_path()).unwrap(), "{ truncated");
    }

    #[test]
    fn leftover_lock_file_does_not_block_commits() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(LOCK_FILE), "pid 4242").unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();

        storage.commit(&[Write::put("k", "1")]).unwrap();
        storage.commit(&[Write::put("k", "2")]).unwrap();
        assert_eq!(storage.read("k").unwrap().version, 2);
    }

    #[test]
    fn held_lock_makes_writers_wait() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        let held = DirLock::acquire(dir.path()).unwrap();

        let path = dir.path().to_path_buf();
        let writer = std::thread::spawn(move || {
            FileStorage::open(path)
                .unwrap()
                .commit(&[Write::put("k", "1")])
        });
        std::thread::sleep(std::time::Duration::from_millis(100));
        assert_eq!(storage.read("k").unwrap().version, 0);

        drop(held);
        writer.join().unwrap().unwrap();
        assert_eq!(storage.read("k").unwrap().version, 1);
    }
}
