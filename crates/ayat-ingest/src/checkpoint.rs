//! Durable checkpoint of fetched verses
//!
//! The checkpoint maps every completed verse key to its merged record. It is
//! the only mutable state that survives a run, and it is what makes a run
//! resumable: anything present here is never fetched again.
//!
//! Single writer only. Nothing guards against a second process writing the
//! same file.

use crate::catalog::VerseKey;
use crate::error::Result;
use crate::models::VerseRecord;
use ayat_common::json_file::{read_json, sibling_with_suffix, write_json_atomic};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Full checkpoint contents, ordered like catalog enumeration.
pub type Snapshot = BTreeMap<VerseKey, VerseRecord>;

/// Checkpoint store contract.
///
/// `put` must be durable: once it returns `Ok`, a `load` from any later
/// process observes the key.
pub trait CheckpointStore: Send {
    /// Re-read the backing data and return the full mapping. Missing or
    /// undecodable backing data yields an empty mapping.
    fn load(&mut self) -> Result<&Snapshot>;

    /// Membership against the most recent `load` or `put`.
    fn has(&self, key: &VerseKey) -> bool;

    /// Durably insert or overwrite one verse.
    fn put(&mut self, key: VerseKey, record: VerseRecord) -> Result<()>;
}

/// Checkpoint kept as one pretty-printed JSON object, rewritten in full on
/// every `put`.
pub struct JsonFileStore {
    path: PathBuf,
    snapshot: Snapshot,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            snapshot: Snapshot::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the next undecodable checkpoint is moved before it gets
    /// replaced: `<name>.corrupt`, then `<name>.corrupt.1`, `.corrupt.2`, ...
    /// Earlier quarantined copies are never overwritten.
    pub fn quarantine_path(&self) -> PathBuf {
        let first = sibling_with_suffix(&self.path, ".corrupt");
        if !first.exists() {
            return first;
        }
        (1u32..)
            .map(|n| sibling_with_suffix(&self.path, &format!(".corrupt.{n}")))
            .find(|candidate| !candidate.exists())
            .unwrap_or(first)
    }

    /// Read the backing file without loading it into the store and without
    /// moving anything. A corrupt file is reported as
    /// [`IngestError::StoreCorrupt`](crate::error::IngestError::StoreCorrupt).
    pub fn inspect(&self) -> Result<Snapshot> {
        Ok(read_json::<Snapshot>(&self.path)?.unwrap_or_default())
    }

    fn read_backing(&self) -> Result<Snapshot> {
        match read_json::<Snapshot>(&self.path) {
            Ok(Some(snapshot)) => Ok(snapshot),
            Ok(None) => {
                debug!(path = %self.path.display(), "No checkpoint yet, starting empty");
                Ok(Snapshot::new())
            },
            Err(e) if e.is_parse() => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Checkpoint is corrupt, treating it as empty"
                );
                self.quarantine();
                Ok(Snapshot::new())
            },
            Err(e) => Err(e.into()),
        }
    }

    fn quarantine(&self) {
        let target = self.quarantine_path();
        match std::fs::rename(&self.path, &target) {
            Ok(()) => warn!(moved_to = %target.display(), "Corrupt checkpoint moved aside"),
            Err(e) => warn!(error = %e, "Could not move corrupt checkpoint aside"),
        }
    }
}

impl CheckpointStore for JsonFileStore {
    fn load(&mut self) -> Result<&Snapshot> {
        self.snapshot = self.read_backing()?;
        info!(
            path = %self.path.display(),
            verses = self.snapshot.len(),
            "Loaded checkpoint"
        );
        Ok(&self.snapshot)
    }

    fn has(&self, key: &VerseKey) -> bool {
        self.snapshot.contains_key(key)
    }

    fn put(&mut self, key: VerseKey, record: VerseRecord) -> Result<()> {
        let mut current = self.read_backing()?;
        current.insert(key, record);
        write_json_atomic(&self.path, &current)?;

        debug!(verse = %key, total = current.len(), "Saved verse to checkpoint");
        self.snapshot = current;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::IngestError;
    use crate::models::Verse;
    use serde_json::Map;
    use tempfile::TempDir;

    fn record(key: VerseKey) -> VerseRecord {
        VerseRecord {
            verse: Verse {
                id: u64::from(key.surah * 1000 + key.verse),
                verse_key: key.to_string(),
                ruku_number: None,
                text_imlaei: Some(format!("text {key}")),
                words: vec![],
                extra: Map::new(),
            },
        }
    }

    #[test]
    fn test_load_without_backing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("all_ayahs.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_put_is_visible_to_a_fresh_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("all_ayahs.json");
        let key = VerseKey::new(1, 1);

        let mut store = JsonFileStore::new(&path);
        store.load().unwrap();
        assert!(!store.has(&key));
        store.put(key, record(key)).unwrap();
        assert!(store.has(&key));

        let mut reopened = JsonFileStore::new(&path);
        let snapshot = reopened.load().unwrap();
        assert_eq!(snapshot.get(&key), Some(&record(key)));
    }

    #[test]
    fn test_put_keeps_entries_written_by_earlier_puts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("all_ayahs.json");

        let mut first = JsonFileStore::new(&path);
        first.put(VerseKey::new(1, 1), record(VerseKey::new(1, 1))).unwrap();

        // A second handle that never loaded must still not clobber 1:1.
        let mut second = JsonFileStore::new(&path);
        second.put(VerseKey::new(1, 2), record(VerseKey::new(1, 2))).unwrap();

        let snapshot = JsonFileStore::new(&path).load().unwrap().clone();
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_has_reflects_latest_load_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("all_ayahs.json");
        let key = VerseKey::new(2, 255);

        let mut writer = JsonFileStore::new(&path);
        writer.put(key, record(key)).unwrap();

        let mut reader = JsonFileStore::new(&path);
        assert!(!reader.has(&key));
        reader.load().unwrap();
        assert!(reader.has(&key));
    }

    #[test]
    fn test_corrupt_backing_file_is_treated_as_empty_and_moved_aside() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("all_ayahs.json");
        std::fs::write(&path, "{\"1:1\": {\"verse\":").unwrap();

        let mut store = JsonFileStore::new(&path);
        assert!(store.load().unwrap().is_empty());
        assert!(sibling_with_suffix(&path, ".corrupt").exists());

        let key = VerseKey::new(1, 1);
        store.put(key, record(key)).unwrap();
        assert_eq!(JsonFileStore::new(&path).load().unwrap().len(), 1);
    }

    #[test]
    fn test_repeated_corruption_keeps_every_quarantined_copy() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("all_ayahs.json");
        let key = VerseKey::new(1, 1);

        std::fs::write(&path, "FIRST-CORRUPT {").unwrap();
        let mut store = JsonFileStore::new(&path);
        assert!(store.load().unwrap().is_empty());
        store.put(key, record(key)).unwrap();

        std::fs::write(&path, "SECOND-CORRUPT {").unwrap();
        assert!(store.load().unwrap().is_empty());

        let first = sibling_with_suffix(&path, ".corrupt");
        let second = sibling_with_suffix(&path, ".corrupt.1");
        assert_eq!(std::fs::read_to_string(first).unwrap(), "FIRST-CORRUPT {");
        assert_eq!(std::fs::read_to_string(second).unwrap(), "SECOND-CORRUPT {");
        assert_eq!(store.quarantine_path(), sibling_with_suffix(&path, ".corrupt.2"));
    }

    #[test]
    fn test_inspect_does_not_move_a_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("all_ayahs.json");
        std::fs::write(&path, "{\"1:1\": ").unwrap();

        let store = JsonFileStore::new(&path);
        let err = store.inspect().unwrap_err();
        assert!(matches!(err, IngestError::StoreCorrupt { .. }));
        assert!(path.exists());
        assert!(!sibling_with_suffix(&path, ".corrupt").exists());
    }

    #[test]
    fn test_inspect_reads_without_loading() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("all_ayahs.json");
        let key = VerseKey::new(3, 1);
        JsonFileStore::new(&path).put(key, record(key)).unwrap();

        let store = JsonFileStore::new(&path);
        assert_eq!(store.inspect().unwrap().len(), 1);
        assert!(!store.has(&key));
        assert!(JsonFileStore::new(dir.path().join("none.json")).inspect().unwrap().is_empty());
    }
}
