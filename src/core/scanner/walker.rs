//! Directory walking implementation using walkdir.

use super::{CandidateFile, CandidateScanner, MediaFilter, ScanOutcome};
use crate::error::ScanError;
use crate::events::{Event, EventSender, ScanEvent};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Scanner implementation using the walkdir crate
pub struct WalkDirScanner {
    filter: MediaFilter,
}

impl WalkDirScanner {
    pub fn new(filter: MediaFilter) -> Self {
        Self { filter }
    }

    fn collect(
        &self,
        root: &PathBuf,
        events: &EventSender,
    ) -> Result<ScanOutcome, ScanError> {
        if !root.is_dir() {
            return Err(ScanError::DirectoryNotFound { path: root.clone() });
        }

        let mut candidates = Vec::new();
        let mut filtered = 0usize;
        let mut errors = Vec::new();

        let walker = WalkDir::new(root).follow_links(false).into_iter();
        let filter = &self.filter;

        for entry_result in walker.filter_entry(|e| {
            // Deny-listed directory names are not descended into
            !(e.file_type().is_dir()
                && e.file_name()
                    .to_str()
                    .map(|name| filter.is_skipped_dir(name))
                    .unwrap_or(false))
        }) {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    let error = if e.io_error().map(|io| io.kind())
                        == Some(std::io::ErrorKind::PermissionDenied)
                    {
                        ScanError::PermissionDenied { path: path.clone() }
                    } else {
                        ScanError::ReadEntry {
                            path: path.clone(),
                            source: std::io::Error::new(
                                std::io::ErrorKind::Other,
                                e.to_string(),
                            ),
                        }
                    };
                    events.send(Event::Scan(ScanEvent::Error {
                        path,
                        message: error.to_string(),
                    }));
                    errors.push(error);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();

            let Some(kind) = self.filter.kind_of(path) else {
                filtered += 1;
                continue;
            };

            match fs::metadata(path) {
                Ok(metadata) => {
                    let size = metadata.len();
                    if !self.filter.passes_size_floor(size) {
                        debug!(path = %path.display(), size, "below size floor, not a candidate");
                        filtered += 1;
                        continue;
                    }
                    let extension = path
                        .extension()
                        .and_then(|e| e.to_str())
                        .map(|e| format!(".{}", e.to_lowercase()))
                        .unwrap_or_default();

                    events.send(Event::Scan(ScanEvent::CandidateFound {
                        path: path.to_path_buf(),
                    }));
                    candidates.push(CandidateFile {
                        path: path.to_path_buf(),
                        size,
                        kind,
                        extension,
                    });
                }
                Err(e) => {
                    let error = ScanError::ReadEntry {
                        path: path.to_path_buf(),
                        source: e,
                    };
                    events.send(Event::Scan(ScanEvent::Error {
                        path: path.to_path_buf(),
                        message: error.to_string(),
                    }));
                    errors.push(error);
                }
            }
        }

        Ok(ScanOutcome {
            candidates,
            filtered,
            errors,
        })
    }
}

impl CandidateScanner for WalkDirScanner {
    fn scan(&self, root: &PathBuf) -> Result<ScanOutcome, ScanError> {
        self.scan_with_events(root, &crate::events::null_sender())
    }

    fn scan_with_events(
        &self,
        root: &PathBuf,
        events: &EventSender,
    ) -> Result<ScanOutcome, ScanError> {
        events.send(Event::Scan(ScanEvent::Started { root: root.clone() }));

        let outcome = self.collect(root, events)?;

        info!(
            candidates = outcome.candidates.len(),
            errors = outcome.errors.len(),
            "enumeration complete"
        );
        events.send(Event::Scan(ScanEvent::Completed {
            total_candidates: outcome.candidates.len(),
        }));

        Ok(outcome)
    }
}

/// Delete now-empty directories under `root`, bottom-up.
///
/// Deny-listed directory names are left alone, as is the root itself.
/// Returns the number of directories removed.
pub fn prune_empty_dirs(root: &Path, skip_dirs: &HashSet<String>) -> usize {
    let mut removed = 0;

    let walker = WalkDir::new(root)
        .min_depth(1)
        .contents_first(true)
        .into_iter();

    for entry in walker
        .filter_entry(|e| {
            !(e.file_type().is_dir()
                && e.file_name()
                    .to_str()
                    .map(|name| skip_dirs.contains(name))
                    .unwrap_or(false))
        })
        .flatten()
    {
        if !entry.file_type().is_dir() {
            continue;
        }
        let path = entry.path();
        match fs::read_dir(path) {
            Ok(mut entries) => {
                if entries.next().is_none() {
                    match fs::remove_dir(path) {
                        Ok(()) => {
                            debug!(path = %path.display(), "removed empty directory");
                            removed += 1;
                        }
                        Err(e) => warn!(path = %path.display(), error = %e, "could not remove directory"),
                    }
                }
            }
            Err(e) => warn!(path = %path.display(), error = %e, "could not read directory"),
        }
    }

    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn filter() -> MediaFilter {
        MediaFilter::new(
            &["jpg".into(), "png".into()],
            &["mp4".into()],
            &["$RECYCLE.BIN".into()],
            4,
        )
    }

    fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(bytes).unwrap();
        path
    }

    #[test]
    fn scan_empty_directory_returns_no_candidates() {
        let temp = TempDir::new().unwrap();
        let scanner = WalkDirScanner::new(filter());

        let outcome = scanner.scan(&temp.path().to_path_buf()).unwrap();

        assert!(outcome.candidates.is_empty());
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn scan_finds_images_and_videos() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "a.jpg", b"jpegdata");
        write_file(temp.path(), "b.mp4", b"mp4data!");
        write_file(temp.path(), "c.txt", b"not media");

        let scanner = WalkDirScanner::new(filter());
        let outcome = scanner.scan(&temp.path().to_path_buf()).unwrap();

        assert_eq!(outcome.candidates.len(), 2);
        let kinds: Vec<_> = outcome.candidates.iter().map(|c| c.kind).collect();
        assert!(kinds.contains(&crate::core::scanner::MediaKind::Image));
        assert!(kinds.contains(&crate::core::scanner::MediaKind::Video));
        // The text file fails the type filter but is still counted
        assert_eq!(outcome.filtered, 1);
    }

    #[test]
    fn scan_skips_files_below_size_floor() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "tiny.jpg", b"x");
        write_file(temp.path(), "ok.jpg", b"jpegdata");

        let scanner = WalkDirScanner::new(filter());
        let outcome = scanner.scan(&temp.path().to_path_buf()).unwrap();

        assert_eq!(outcome.candidates.len(), 1);
        assert!(outcome.candidates[0].path.ends_with("ok.jpg"));
        assert_eq!(outcome.filtered, 1);
    }

    #[test]
    fn scan_skips_deny_listed_directories() {
        let temp = TempDir::new().unwrap();
        let bin = temp.path().join("$RECYCLE.BIN");
        fs::create_dir(&bin).unwrap();
        write_file(&bin, "deleted.jpg", b"jpegdata");
        write_file(temp.path(), "kept.jpg", b"jpegdata");

        let scanner = WalkDirScanner::new(filter());
        let outcome = scanner.scan(&temp.path().to_path_buf()).unwrap();

        assert_eq!(outcome.candidates.len(), 1);
        assert!(outcome.candidates[0].path.ends_with("kept.jpg"));
    }

    #[test]
    fn scan_records_lowercase_dotted_extension() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "UPPER.JPG", b"jpegdata");

        let scanner = WalkDirScanner::new(filter());
        let outcome = scanner.scan(&temp.path().to_path_buf()).unwrap();

        assert_eq!(outcome.candidates[0].extension, ".jpg");
    }

    #[test]
    fn scan_nonexistent_root_is_an_error() {
        let scanner = WalkDirScanner::new(filter());
        let result = scanner.scan(&PathBuf::from("/nonexistent/path/12345"));
        assert!(result.is_err());
    }

    #[test]
    fn prune_removes_nested_empty_dirs() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("a/b/c")).unwrap();
        write_file(temp.path(), "keep.jpg", b"jpegdata");

        let removed = prune_empty_dirs(temp.path(), &HashSet::new());

        assert_eq!(removed, 3);
        assert!(!temp.path().join("a").exists());
        assert!(temp.path().join("keep.jpg").exists());
    }

    #[test]
    fn prune_keeps_non_empty_and_deny_listed_dirs() {
        let temp = TempDir::new().unwrap();
        let keep = temp.path().join("full");
        fs::create_dir(&keep).unwrap();
        write_file(&keep, "photo.jpg", b"jpegdata");
        fs::create_dir(temp.path().join("$RECYCLE.BIN")).unwrap();

        let skip: HashSet<String> = ["$RECYCLE.BIN".to_string()].into_iter().collect();
        let removed = prune_empty_dirs(temp.path(), &skip);

        assert_eq!(removed, 0);
        assert!(keep.exists());
        assert!(temp.path().join("$RECYCLE.BIN").exists());
    }
}
