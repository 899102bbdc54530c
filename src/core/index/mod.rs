//! # Index Module
//!
//! The persistent, thread-safe dedup index.
//!
//! ## Lookup tiers
//! The index exposes two distinct lookups with independent semantics:
//! - `exists_by_size_date` - cheap pre-filter; a hit means "almost
//!   certainly already processed" and is treated as authoritative for
//!   skip decisions (a false skip for two different files sharing size
//!   and date is an accepted approximation)
//! - `exists_by_fingerprint` - exact content identity
//!
//! ## Concurrency
//! All writes flow through one serialized commit path; every worker gets
//! its own read-only connection, and WAL journaling keeps those reads
//! from blocking behind an in-flight commit.

mod sqlite;

pub use sqlite::{IndexReader, SqliteIndex};

use crate::core::metadata::Category;
use serde::{Deserialize, Serialize};

/// One persisted record per classified file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Content hash; unique across the index
    pub fingerprint: String,
    /// Byte length at classification time
    pub size: u64,
    /// photo / image / video
    pub category: Category,
    /// Normalized creation date, `YYYY-MM-DD`
    pub created_date: String,
}

/// A row read back from the index, for inspection commands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexRow {
    pub fingerprint: String,
    pub size: u64,
    pub category: Category,
    pub created_date: String,
    pub processed_at: String,
}

/// Aggregate counts over the index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexStats {
    pub total: usize,
    pub photos: usize,
    pub images: usize,
    pub videos: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_record_is_serializable() {
        let record = FileRecord {
            fingerprint: "abc123".into(),
            size: 2048,
            category: Category::Photo,
            created_date: "2020-03-15".into(),
        };

        let json = serde_json::to_string(&record).unwrap();
        let back: FileRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
