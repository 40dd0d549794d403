//! Single-blob persistence for the snippet store.
//!
//! Load never fails outward: a missing or corrupt blob falls back to a fresh
//! empty store, which is persisted immediately so the next run starts clean.
//! Saves write to a temp file in the same directory and rename over the
//! target, so a failed save leaves the prior blob intact.

use quest_core::{Error, Result, SnippetRecord, SnippetStore};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const STORE_FILE: &str = "snippets.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedStore {
    schema_version: u32,
    records: Vec<SnippetRecord>,
}

const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone)]
pub struct StoreFile {
    path: PathBuf,
}

impl StoreFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(STORE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted store; any failure yields a fresh empty store
    /// which is written back best-effort.
    pub fn load(&self) -> SnippetStore {
        match self.read_blob() {
            Some(store) => store,
            None => {
                let fresh = SnippetStore::new();
                if let Err(e) = self.save(&fresh) {
                    warn!(path = %self.path.display(), error = %e, "could not seed a fresh snippet store");
                }
                fresh
            }
        }
    }

    fn read_blob(&self) -> Option<SnippetStore> {
        let bytes = fs::read(&self.path).ok()?;
        let persisted: PersistedStore = serde_json::from_slice(&bytes).ok()?;
        Some(SnippetStore::from_records(persisted.records))
    }

    /// Atomic save: temp file in the same directory, then rename.
    pub fn save(&self, store: &SnippetStore) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::Store(e.to_string()))?;
        }
        let persisted = PersistedStore {
            schema_version: SCHEMA_VERSION,
            records: store.records().to_vec(),
        };
        let bytes = serde_json::to_vec(&persisted).map_err(|e| Error::Store(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, bytes).map_err(|e| Error::Store(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| Error::Store(e.to_string()))?;
        Ok(())
    }

    /// Offload the blob write to a detached blocking task. The snapshot is
    /// taken before detaching, so later store mutations cannot leak into the
    /// write; completion is not awaited, so a read straight after may still
    /// see the old blob. Callers needing read-after-write consistency use
    /// [`StoreFile::save`].
    ///
    /// Must be called from within a tokio runtime.
    pub fn save_in_background(&self, store: &SnippetStore) {
        let this = self.clone();
        let snapshot = store.clone();
        tokio::task::spawn_blocking(move || {
            if let Err(e) = this.save(&snapshot) {
                warn!(path = %this.path.display(), error = %e, "background snippet save failed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn record(text: &str, link: &str, query: &str) -> SnippetRecord {
        SnippetRecord {
            text: text.to_string(),
            link: Url::parse(link).unwrap(),
            query: query.to_string(),
        }
    }

    fn sample_store() -> SnippetStore {
        let mut store = SnippetStore::new();
        store.merge(vec![
            record(&"a".repeat(40), "https://example.com/a", "q1"),
            record(&"b".repeat(40), "https://example.com/b", "q2"),
        ]);
        store
    }

    #[test]
    fn save_then_load_round_trips_losslessly() {
        let tmp = tempfile::tempdir().unwrap();
        let file = StoreFile::in_dir(tmp.path());

        let store = sample_store();
        file.save(&store).unwrap();
        assert_eq!(file.load(), store);
    }

    #[test]
    fn missing_blob_yields_a_fresh_store_and_seeds_the_file() {
        let tmp = tempfile::tempdir().unwrap();
        let file = StoreFile::in_dir(tmp.path());

        let store = file.load();
        assert!(store.is_empty());
        assert!(file.path().exists(), "fresh store should be persisted");
    }

    #[test]
    fn corrupt_blob_yields_a_fresh_store_and_rewrites_a_valid_one() {
        let tmp = tempfile::tempdir().unwrap();
        let file = StoreFile::in_dir(tmp.path());
        fs::write(file.path(), b"{not json!").unwrap();

        let store = file.load();
        assert!(store.is_empty());
        // The rewritten blob must parse again.
        assert!(file.load().is_empty());
        let bytes = fs::read(file.path()).unwrap();
        assert!(serde_json::from_slice::<serde_json::Value>(&bytes).is_ok());
    }

    #[test]
    fn failed_save_leaves_the_prior_blob_readable() {
        let tmp = tempfile::tempdir().unwrap();
        let file = StoreFile::in_dir(tmp.path());
        let store = sample_store();
        file.save(&store).unwrap();

        // Point a second handle at a path whose parent is a regular file;
        // its save must fail without touching the original blob.
        let bad = StoreFile::new(file.path().join("child.json"));
        assert!(bad.save(&SnippetStore::new()).is_err());
        assert_eq!(file.load(), store);
    }

    #[tokio::test]
    async fn background_save_eventually_writes_the_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        let file = StoreFile::in_dir(tmp.path());
        let store = sample_store();

        file.save_in_background(&store);
        // No completion signal by design; poll briefly.
        for _ in 0..50 {
            if file.path().exists() && file.load() == store {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        panic!("background save did not land");
    }
}
