//! SQLite backend for the persistent dedup index.

use super::{FileRecord, IndexRow, IndexStats};
use crate::core::metadata::Category;
use crate::error::IndexError;
use rusqlite::{params, Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// SQLite-backed dedup index
///
/// Uses WAL (Write-Ahead Logging) mode so readers proceed even while a
/// batch commit is in flight. The single writer connection is guarded by
/// a mutex; all mutation goes through [`SqliteIndex::commit_batch`].
pub struct SqliteIndex {
    writer: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteIndex {
    /// Open or create the index database at the given path.
    ///
    /// Failure here is fatal to a run: classification cannot proceed
    /// without the index.
    pub fn open(path: &Path) -> Result<Self, IndexError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| IndexError::OpenFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        }

        let conn = Connection::open(path).map_err(|e| IndexError::OpenFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| IndexError::QueryFailed(e.to_string()))?;

        // WAL keeps pre-check reads from blocking behind the writer
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;",
        )
        .map_err(|e| IndexError::QueryFailed(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS files (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                fingerprint TEXT NOT NULL UNIQUE,
                size INTEGER NOT NULL,
                category TEXT NOT NULL,
                created_date TEXT NOT NULL,
                processed_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )
        .map_err(|e| IndexError::QueryFailed(e.to_string()))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_fingerprint ON files(fingerprint)",
            [],
        )
        .map_err(|e| IndexError::QueryFailed(e.to_string()))?;

        // Composite index backing the fast (size, date) pre-check
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_size_date ON files(size, created_date)",
            [],
        )
        .map_err(|e| IndexError::QueryFailed(e.to_string()))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_category ON files(category)",
            [],
        )
        .map_err(|e| IndexError::QueryFailed(e.to_string()))?;

        Ok(Self {
            writer: Mutex::new(conn),
            db_path: path.to_path_buf(),
        })
    }

    /// Open a read-only connection for one worker.
    ///
    /// Each worker holds its own handle for its whole lifetime so reads
    /// never queue behind the writer lock.
    pub fn reader(&self) -> Result<IndexReader, IndexError> {
        let conn = Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| IndexError::OpenFailed {
            path: self.db_path.clone(),
            reason: e.to_string(),
        })?;

        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| IndexError::QueryFailed(e.to_string()))?;

        Ok(IndexReader { conn })
    }

    /// Commit a batch of records in a single transaction.
    ///
    /// This is the only write path. A fingerprint conflict within or
    /// across batches skips that record without failing the batch; the
    /// rest still commit. Returns the number of rows actually inserted.
    pub fn commit_batch(&self, records: &[FileRecord]) -> Result<usize, IndexError> {
        let mut conn = self.writer.lock().map_err(|_| IndexError::Corrupted {
            path: self.db_path.clone(),
        })?;

        let tx = conn
            .transaction()
            .map_err(|e| IndexError::QueryFailed(e.to_string()))?;

        let mut inserted = 0usize;
        {
            let mut stmt = tx
                .prepare_cached(
                    "INSERT OR IGNORE INTO files (fingerprint, size, category, created_date)
                     VALUES (?1, ?2, ?3, ?4)",
                )
                .map_err(|e| IndexError::QueryFailed(e.to_string()))?;

            for record in records {
                inserted += stmt
                    .execute(params![
                        record.fingerprint,
                        record.size as i64,
                        record.category.as_str(),
                        record.created_date,
                    ])
                    .map_err(|e| IndexError::QueryFailed(e.to_string()))?;
            }
        }

        tx.commit()
            .map_err(|e| IndexError::QueryFailed(e.to_string()))?;

        debug!(batch = records.len(), inserted, "batch committed");
        Ok(inserted)
    }

    /// Aggregate counts, overall and per category
    pub fn stats(&self) -> Result<IndexStats, IndexError> {
        let conn = self.writer.lock().map_err(|_| IndexError::Corrupted {
            path: self.db_path.clone(),
        })?;

        let count = |sql: &str| -> Result<usize, IndexError> {
            conn.query_row(sql, [], |row| row.get::<_, i64>(0).map(|v| v as usize))
                .map_err(|e| IndexError::QueryFailed(e.to_string()))
        };

        Ok(IndexStats {
            total: count("SELECT COUNT(*) FROM files")?,
            photos: count("SELECT COUNT(*) FROM files WHERE category = 'photo'")?,
            images: count("SELECT COUNT(*) FROM files WHERE category = 'image'")?,
            videos: count("SELECT COUNT(*) FROM files WHERE category = 'video'")?,
        })
    }

    /// Most recently inserted rows, newest first
    pub fn recent(&self, limit: usize) -> Result<Vec<IndexRow>, IndexError> {
        let conn = self.writer.lock().map_err(|_| IndexError::Corrupted {
            path: self.db_path.clone(),
        })?;

        let mut stmt = conn
            .prepare(
                "SELECT fingerprint, size, category, created_date, processed_at
                 FROM files ORDER BY id DESC LIMIT ?1",
            )
            .map_err(|e| IndexError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map([limit as i64], |row| {
                Ok(IndexRow {
                    fingerprint: row.get(0)?,
                    size: row.get::<_, i64>(1)? as u64,
                    category: Category::from_str(&row.get::<_, String>(2)?)
                        .unwrap_or(Category::Image),
                    created_date: row.get(3)?,
                    processed_at: row.get(4)?,
                })
            })
            .map_err(|e| IndexError::QueryFailed(e.to_string()))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(rows)
    }

    /// Remove every record
    pub fn clear(&self) -> Result<(), IndexError> {
        let conn = self.writer.lock().map_err(|_| IndexError::Corrupted {
            path: self.db_path.clone(),
        })?;

        conn.execute("DELETE FROM files", [])
            .map_err(|e| IndexError::QueryFailed(e.to_string()))?;

        Ok(())
    }
}

/// Read-only index handle owned by one worker
pub struct IndexReader {
    conn: Connection,
}

impl IndexReader {
    /// Fast pre-check: does any record share this size and date?
    ///
    /// A transient read error degrades to `false` so the file takes the
    /// exact fingerprint path instead of being wrongly skipped.
    pub fn exists_by_size_date(&self, size: u64, created_date: &str) -> bool {
        self.exists(
            "SELECT 1 FROM files WHERE size = ?1 AND created_date = ?2 LIMIT 1",
            params![size as i64, created_date],
        )
    }

    /// Exact check: is this fingerprint already recorded?
    pub fn exists_by_fingerprint(&self, fingerprint: &str) -> bool {
        self.exists(
            "SELECT 1 FROM files WHERE fingerprint = ?1 LIMIT 1",
            params![fingerprint],
        )
    }

    fn exists(&self, sql: &str, params: impl rusqlite::Params) -> bool {
        match self.conn.query_row(sql, params, |_| Ok(())) {
            Ok(()) => true,
            Err(rusqlite::Error::QueryReturnedNoRows) => false,
            Err(e) => {
                warn!(error = %e, "index read failed, assuming not present");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(fp: &str, size: u64, date: &str) -> FileRecord {
        FileRecord {
            fingerprint: fp.to_string(),
            size,
            category: Category::Photo,
            created_date: date.to_string(),
        }
    }

    #[test]
    fn open_creates_database_file() {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("index.db");

        let index = SqliteIndex::open(&db_path).unwrap();

        assert!(db_path.exists());
        assert_eq!(index.stats().unwrap().total, 0);
    }

    #[test]
    fn commit_batch_inserts_and_reads_back() {
        let temp = TempDir::new().unwrap();
        let index = SqliteIndex::open(&temp.path().join("index.db")).unwrap();

        let inserted = index
            .commit_batch(&[
                record("aaa", 100, "2020-03-15"),
                record("bbb", 200, "2021-07-01"),
            ])
            .unwrap();

        assert_eq!(inserted, 2);

        let reader = index.reader().unwrap();
        assert!(reader.exists_by_fingerprint("aaa"));
        assert!(reader.exists_by_size_date(200, "2021-07-01"));
        assert!(!reader.exists_by_fingerprint("ccc"));
        assert!(!reader.exists_by_size_date(100, "1999-01-01"));
    }

    #[test]
    fn fingerprint_conflict_is_skipped_not_fatal() {
        let temp = TempDir::new().unwrap();
        let index = SqliteIndex::open(&temp.path().join("index.db")).unwrap();

        index.commit_batch(&[record("dup", 100, "2020-01-01")]).unwrap();

        // Same fingerprint again, plus a fresh record: only the fresh one lands
        let inserted = index
            .commit_batch(&[record("dup", 100, "2020-01-01"), record("new", 300, "2020-01-02")])
            .unwrap();

        assert_eq!(inserted, 1);
        assert_eq!(index.stats().unwrap().total, 2);
    }

    #[test]
    fn conflict_within_one_batch_keeps_first() {
        let temp = TempDir::new().unwrap();
        let index = SqliteIndex::open(&temp.path().join("index.db")).unwrap();

        let inserted = index
            .commit_batch(&[record("same", 100, "2020-01-01"), record("same", 100, "2020-01-01")])
            .unwrap();

        assert_eq!(inserted, 1);
    }

    #[test]
    fn stats_count_per_category() {
        let temp = TempDir::new().unwrap();
        let index = SqliteIndex::open(&temp.path().join("index.db")).unwrap();

        index
            .commit_batch(&[
                FileRecord {
                    fingerprint: "p1".into(),
                    size: 10,
                    category: Category::Photo,
                    created_date: "2020-01-01".into(),
                },
                FileRecord {
                    fingerprint: "v1".into(),
                    size: 20,
                    category: Category::Video,
                    created_date: "2020-01-02".into(),
                },
            ])
            .unwrap();

        let stats = index.stats().unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.photos, 1);
        assert_eq!(stats.videos, 1);
        assert_eq!(stats.images, 0);
    }

    #[test]
    fn recent_returns_newest_first() {
        let temp = TempDir::new().unwrap();
        let index = SqliteIndex::open(&temp.path().join("index.db")).unwrap();

        index.commit_batch(&[record("old", 1, "2020-01-01")]).unwrap();
        index.commit_batch(&[record("new", 2, "2020-01-02")]).unwrap();

        let rows = index.recent(10).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].fingerprint, "new");
    }

    #[test]
    fn clear_removes_all_rows() {
        let temp = TempDir::new().unwrap();
        let index = SqliteIndex::open(&temp.path().join("index.db")).unwrap();

        index.commit_batch(&[record("x", 1, "2020-01-01")]).unwrap();
        index.clear().unwrap();

        assert_eq!(index.stats().unwrap().total, 0);
    }

    #[test]
    fn persists_across_reopen() {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("index.db");

        {
            let index = SqliteIndex::open(&db_path).unwrap();
            index.commit_batch(&[record("keep", 5, "2020-06-01")]).unwrap();
        }

        let index = SqliteIndex::open(&db_path).unwrap();
        assert!(index.reader().unwrap().exists_by_fingerprint("keep"));
    }

    #[test]
    fn readers_see_committed_rows_concurrently() {
        let temp = TempDir::new().unwrap();
        let index = std::sync::Arc::new(SqliteIndex::open(&temp.path().join("index.db")).unwrap());

        index.commit_batch(&[record("shared", 9, "2020-02-02")]).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let index = index.clone();
                std::thread::spawn(move || {
                    let reader = index.reader().unwrap();
                    reader.exists_by_fingerprint("shared")
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
