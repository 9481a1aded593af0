//! Result cache - write-once reports keyed by (subject, date)
//!
//! A store accepts the first entry for a key and rejects every later one with
//! [`TradeHelperError::AlreadyExists`]. The check and the write are a single
//! atomic step in every implementation.

pub mod disk;
pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::agent::Transcript;
use crate::core::{Result, TradeHelperError};

pub use disk::DiskStore;
pub use memory::MemoryStore;

/// Identity of a cached result
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub subject: String,
    pub date: NaiveDate,
}

impl CacheKey {
    pub fn new(subject: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            subject: subject.into(),
            date,
        }
    }

    /// File name stem, `result_<SUBJECT>_<YYYY-MM-DD>`
    ///
    /// `[A-Za-z0-9.-]` is kept as is; every other byte, `_` included, is
    /// written as `_XX` hex so distinct subjects never share a file.
    pub fn file_stem(&self) -> String {
        let mut subject = String::with_capacity(self.subject.len());
        for byte in self.subject.bytes() {
            if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'-') {
                subject.push(byte as char);
            } else {
                subject.push_str(&format!("_{:02X}", byte));
            }
        }
        format!("result_{}_{}", subject, self.date.format("%Y-%m-%d"))
    }

    /// Error for a rejected second write
    pub fn already_exists(&self) -> TradeHelperError {
        TradeHelperError::AlreadyExists {
            subject: self.subject.clone(),
            date: self.date.to_string(),
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.subject, self.date)
    }
}

/// A completed analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub subject: String,
    pub date: NaiveDate,
    pub transcript: Transcript,
    pub report: String,
}

impl CacheEntry {
    pub fn key(&self) -> CacheKey {
        CacheKey::new(self.subject.clone(), self.date)
    }
}

/// Persistence for completed analyses
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Look up an entry
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>>;

    /// Store an entry unless one already exists for its key
    async fn put(&self, entry: CacheEntry) -> Result<()>;

    /// Short description for logs and status output
    fn describe(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(CacheKey::new("ACME", date).file_stem(), "result_ACME_2024-05-01");
        assert_eq!(
            CacheKey::new("BRK.B", date).file_stem(),
            "result_BRK.B_2024-05-01"
        );
        assert_eq!(
            CacheKey::new("../ETC PASSWD", date).file_stem(),
            "result_.._2FETC_20PASSWD_2024-05-01"
        );
    }

    #[test]
    fn test_file_stem_is_distinct_per_subject() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let stems: std::collections::HashSet<String> =
            ["APPLE INC", "APPLE_INC", "APPLE/INC", "APPLE_20INC", "APPLEÉINC"]
                .iter()
                .map(|s| CacheKey::new(*s, date).file_stem())
                .collect();
        assert_eq!(stems.len(), 5);
    }
}
