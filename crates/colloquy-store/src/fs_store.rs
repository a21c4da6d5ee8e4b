//! Filesystem-backed [`FeedbackStore`].
//!
//! Records live under `<root>/feedback/`, one pretty-printed JSON file per
//! record. File names lead with a fixed-width UTC timestamp so that the
//! lexical order of the directory listing is the recency order, and
//! `most_recent` only opens the newest file that parses.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::StorageError;
use crate::record::{FeedbackId, FeedbackRecord};
use crate::storage_traits::{FeedbackStore, StorageResult};

/// Sortable UTC timestamp, fixed width for four-digit years.
const STAMP_FORMAT: &str = "%Y%m%dT%H%M%S%.9fZ";

/// Filesystem-backed feedback store.
///
/// Layout: `<root>/feedback/<created_at>_<uuid>.json`
#[derive(Debug, Clone)]
pub struct FsFeedbackStore {
    records_dir: PathBuf,
}

impl FsFeedbackStore {
    /// Create a new `FsFeedbackStore` rooted at `root`. Creates `root/feedback/` if needed.
    pub fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let records_dir = root.as_ref().join("feedback");
        fs::create_dir_all(&records_dir)?;
        Ok(Self { records_dir })
    }

    fn file_name(record: &FeedbackRecord) -> String {
        format!("{}_{}.json", record.created_at.format(STAMP_FORMAT), record.id)
    }

    /// Id encoded in a record file name, `None` for foreign files.
    fn parse_file_name(name: &str) -> Option<FeedbackId> {
        let (stamp, id) = name.strip_suffix(".json")?.rsplit_once('_')?;
        if !stamp.ends_with('Z') {
            return None;
        }
        Uuid::parse_str(id).ok().map(FeedbackId)
    }

    /// Record file names in the directory with their ids, in no particular order.
    fn list(records_dir: &Path) -> StorageResult<Vec<(String, FeedbackId)>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(records_dir)? {
            let entry = entry?;
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if let Some(id) = Self::parse_file_name(&name) {
                names.push((name, id));
            }
        }
        Ok(names)
    }

    fn read_record(path: &Path) -> StorageResult<FeedbackRecord> {
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn write_record(records_dir: &Path, record: &FeedbackRecord) -> StorageResult<()> {
        let name = Self::file_name(record);
        let bytes = serde_json::to_vec_pretty(record)?;
        // Atomic write: temp file in the same directory, then rename.
        let mut tmp = NamedTempFile::new_in(records_dir)?;
        tmp.write_all(&bytes)?;
        tmp.persist(records_dir.join(&name)).map_err(|e| e.error)?;

        // A re-saved record with a changed timestamp leaves its old file behind.
        for (stale, id) in Self::list(records_dir)? {
            if id == record.id && stale != name {
                fs::remove_file(records_dir.join(stale))?;
            }
        }
        Ok(())
    }

    fn find(records_dir: &Path, id: FeedbackId) -> StorageResult<FeedbackRecord> {
        let name = Self::list(records_dir)?
            .into_iter()
            .filter(|(_, candidate)| *candidate == id)
            .map(|(name, _)| name)
            .max()
            .ok_or_else(|| StorageError::NotFound { id: id.to_string() })?;
        Self::read_record(&records_dir.join(name))
    }

    fn scan_latest(records_dir: &Path) -> StorageResult<Option<FeedbackRecord>> {
        let mut names = Self::list(records_dir)?;
        names.sort_unstable_by(|a, b| b.0.cmp(&a.0));
        for (name, _) in names {
            let path = records_dir.join(&name);
            match Self::read_record(&path) {
                Ok(record) => return Ok(Some(record)),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable feedback record");
                }
            }
        }
        Ok(None)
    }
}

async fn blocking<T, F>(f: F) -> StorageResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> StorageResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
}

#[async_trait]
impl FeedbackStore for FsFeedbackStore {
    async fn save(&self, record: &FeedbackRecord) -> StorageResult<()> {
        let records_dir = self.records_dir.clone();
        let id = record.id;
        let record = record.clone();
        blocking(move || Self::write_record(&records_dir, &record)).await?;
        debug!(id = %id, "feedback record saved");
        Ok(())
    }

    async fn get(&self, id: &FeedbackId) -> StorageResult<FeedbackRecord> {
        let records_dir = self.records_dir.clone();
        let id = *id;
        blocking(move || Self::find(&records_dir, id)).await
    }

    async fn most_recent(&self) -> StorageResult<Option<FeedbackRecord>> {
        let records_dir = self.records_dir.clone();
        blocking(move || Self::scan_latest(&records_dir)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn make_store() -> (tempfile::TempDir, FsFeedbackStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsFeedbackStore::new(dir.path()).unwrap();
        (dir, store)
    }

    fn record(summary: &str) -> FeedbackRecord {
        FeedbackRecord::new(
            "so, um, I think",
            summary,
            0.72,
            serde_json::json!([{ "category": "FLUENCY", "score": 0.72 }]),
            900,
        )
    }

    #[tokio::test]
    async fn record_roundtrip() {
        let (_dir, store) = make_store();
        let rec = record("fine");
        store.save(&rec).await.unwrap();
        assert_eq!(store.get(&rec.id).await.unwrap(), rec);
    }

    #[tokio::test]
    async fn one_file_per_record() {
        let (dir, store) = make_store();
        store.save(&record("a")).await.unwrap();
        store.save(&record("b")).await.unwrap();
        let entries: Vec<_> = std::fs::read_dir(dir.path().join("feedback"))
            .unwrap()
            .collect();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn get_nonexistent_returns_not_found() {
        let (_dir, store) = make_store();
        match store.get(&FeedbackId::new()).await {
            Err(StorageError::NotFound { .. }) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn most_recent_on_empty_store_is_none() {
        let (_dir, store) = make_store();
        assert!(store.most_recent().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn most_recent_ignores_foreign_and_corrupt_files() {
        let (dir, store) = make_store();
        let mut older = record("older");
        older.created_at -= Duration::minutes(5);
        let newer = record("newer");
        store.save(&older).await.unwrap();
        store.save(&newer).await.unwrap();

        std::fs::write(dir.path().join("feedback").join("notes.txt"), b"x").unwrap();
        std::fs::write(dir.path().join("feedback").join("broken.json"), b"{").unwrap();

        let latest = store.most_recent().await.unwrap().unwrap();
        assert_eq!(latest.id, newer.id);
    }

    #[tokio::test]
    async fn file_names_sort_by_creation_time() {
        let (dir, store) = make_store();
        let mut older = record("older");
        older.created_at -= Duration::days(400);
        let newer = record("newer");
        store.save(&newer).await.unwrap();
        store.save(&older).await.unwrap();

        let mut names: Vec<String> = std::fs::read_dir(dir.path().join("feedback"))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        assert!(names[0].ends_with(&format!("_{}.json", older.id)));
        assert!(names[1].ends_with(&format!("_{}.json", newer.id)));
    }

    #[tokio::test]
    async fn most_recent_opens_only_the_newest_file() {
        let (dir, store) = make_store();
        let feedback = dir.path().join("feedback");
        let mut older = record("older");
        older.created_at -= Duration::minutes(5);
        let newer = record("newer");
        store.save(&older).await.unwrap();
        store.save(&newer).await.unwrap();

        // Replace the older record with a directory: reading it would fail
        // with an io error, so success shows it was never opened.
        let older_name = FsFeedbackStore::file_name(&older);
        std::fs::remove_file(feedback.join(&older_name)).unwrap();
        std::fs::create_dir(feedback.join(&older_name)).unwrap();

        let latest = store.most_recent().await.unwrap().unwrap();
        assert_eq!(latest.id, newer.id);
    }

    #[tokio::test]
    async fn most_recent_falls_back_past_a_corrupt_newest_file() {
        let (dir, store) = make_store();
        let older = record("older");
        let mut newest = record("newest");
        newest.created_at += Duration::minutes(5);
        store.save(&older).await.unwrap();
        std::fs::write(
            dir.path().join("feedback").join(FsFeedbackStore::file_name(&newest)),
            b"{",
        )
        .unwrap();

        let latest = store.most_recent().await.unwrap().unwrap();
        assert_eq!(latest.id, older.id);
    }

    #[tokio::test]
    async fn resaving_with_new_timestamp_replaces_old_file() {
        let (dir, store) = make_store();
        let mut rec = record("first");
        store.save(&rec).await.unwrap();
        rec.created_at += Duration::seconds(30);
        rec.summary = "second".into();
        store.save(&rec).await.unwrap();

        let entries = std::fs::read_dir(dir.path().join("feedback")).unwrap().count();
        assert_eq!(entries, 1);
        assert_eq!(store.get(&rec.id).await.unwrap().summary, "second");
    }
}
