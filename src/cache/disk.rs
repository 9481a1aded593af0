//! File-backed result store
//!
//! Each entry is `result_<SUBJECT>_<DATE>.json` with a sibling `.md` holding
//! just the report. The JSON file is the source of truth: it is written to a
//! private temp file and published with a hard link, which fails if the key
//! already exists.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{CacheEntry, CacheKey, ResultStore};
use crate::core::{Result, TradeHelperError};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

pub struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the serialized entry
    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.file_stem()))
    }

    /// Path of the human-readable report
    pub fn report_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.md", key.file_stem()))
    }

    fn temp_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!(
            ".{}.{}.{}.tmp",
            key.file_stem(),
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ))
    }
}

#[async_trait]
impl ResultStore for DiskStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        let path = self.entry_path(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let entry: CacheEntry = serde_json::from_slice(&bytes)?;
        if entry.key() != *key {
            return Err(TradeHelperError::Other(format!(
                "{} holds the result for {}, expected {}",
                path.display(),
                entry.key(),
                key
            )));
        }
        Ok(Some(entry))
    }

    async fn put(&self, entry: CacheEntry) -> Result<()> {
        let key = entry.key();
        tokio::fs::create_dir_all(&self.dir).await?;

        let body = serde_json::to_vec_pretty(&entry)?;
        let temp = self.temp_path(&key);

        let published = match tokio::fs::write(&temp, body).await {
            Ok(()) => tokio::fs::hard_link(&temp, self.entry_path(&key)).await,
            Err(e) => Err(e),
        };
        if let Err(e) = tokio::fs::remove_file(&temp).await {
            if e.kind() != ErrorKind::NotFound {
                tracing::warn!(path = %temp.display(), error = %e, "failed to remove temp file");
            }
        }

        match published {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Err(key.already_exists()),
            Err(e) => return Err(e.into()),
        }
        tracing::info!(key = %key, path = %self.entry_path(&key).display(), "saved result");

        // The JSON entry is authoritative; the markdown copy is best effort
        let report_path = self.report_path(&key);
        if let Err(e) = tokio::fs::write(&report_path, format!("{}\n", entry.report)).await {
            tracing::warn!(path = %report_path.display(), error = %e, "failed to write report");
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("disk ({})", self.dir.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Conversation;
    use crate::core::Message;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn entry(subject: &str, report: &str) -> CacheEntry {
        CacheEntry {
            subject: subject.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            transcript: Conversation::new(subject, Message::task("Analyze")).into_transcript(),
            report: report.to_string(),
        }
    }

    #[tokio::test]
    async fn test_round_trip_and_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path().join("results"));
        let e = entry("ACME", "### Summary\nUp 2%");

        assert!(store.get(&e.key()).await.unwrap().is_none());
        store.put(e.clone()).await.unwrap();

        assert_eq!(store.get(&e.key()).await.unwrap(), Some(e.clone()));
        let md = std::fs::read_to_string(store.report_path(&e.key())).unwrap();
        assert_eq!(md, "### Summary\nUp 2%\n");
    }

    #[tokio::test]
    async fn test_second_write_rejected_and_first_kept() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path());

        store.put(entry("ACME", "first")).await.unwrap();
        let err = store.put(entry("ACME", "second")).await.unwrap_err();
        assert!(err.is_already_exists());

        let kept = store.get(&entry("ACME", "").key()).await.unwrap().unwrap();
        assert_eq!(kept.report, "first");

        // No temp files left behind
        let leftovers = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_concurrent_writers_single_winner() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(DiskStore::new(dir.path()));

        let mut handles = Vec::new();
        for i in 0..6 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.put(entry("ACME", &format!("writer {}", i))).await
            }));
        }

        let mut ok = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => ok += 1,
                Err(e) => assert!(e.is_already_exists()),
            }
        }
        assert_eq!(ok, 1);
    }

    #[tokio::test]
    async fn test_similar_subjects_do_not_share_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path());
        let spaced = entry("APPLE INC", "spaced");
        let underscored = entry("APPLE_INC", "underscored");

        store.put(spaced.clone()).await.unwrap();
        assert!(store.get(&underscored.key()).await.unwrap().is_none());
        store.put(underscored.clone()).await.unwrap();

        assert_eq!(store.get(&spaced.key()).await.unwrap().unwrap().report, "spaced");
        assert_eq!(
            store.get(&underscored.key()).await.unwrap().unwrap().report,
            "underscored"
        );
    }

    #[tokio::test]
    async fn test_entry_for_another_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path());
        let stored = entry("ACME", "acme report");
        store.put(stored.clone()).await.unwrap();

        // Same file contents under another subject's name
        let other = entry("ACME2", "").key();
        std::fs::copy(store.entry_path(&stored.key()), store.entry_path(&other)).unwrap();

        assert!(store.get(&other).await.is_err());
    }

    #[tokio::test]
    async fn test_report_copy_failure_keeps_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path());
        let e = entry("ACME", "report");
        // A directory where the markdown file should go
        std::fs::create_dir_all(store.report_path(&e.key())).unwrap();

        store.put(e.clone()).await.unwrap();

        assert_eq!(store.get(&e.key()).await.unwrap(), Some(e.clone()));
        assert!(store.put(e).await.unwrap_err().is_already_exists());
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path());
        let key = entry("ACME", "").key();
        std::fs::write(store.entry_path(&key), b"{not json").unwrap();

        assert!(store.get(&key).await.is_err());
    }
}
