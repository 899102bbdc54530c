//! The per-file classification state machine.

use super::{ClassificationOutcome, PlacementEngine, SkipReason};
use crate::core::fingerprint::Fingerprinter;
use crate::core::index::{FileRecord, IndexReader};
use crate::core::metadata::MediaInspector;
use crate::core::scanner::{CandidateFile, MediaFilter};
use crate::error::PlacementError;
use std::fs;
use tracing::{debug, warn};

/// Runs one candidate through the decision pipeline.
///
/// The worker borrows its collaborators; the pipeline constructs one per
/// worker thread alongside that thread's own [`IndexReader`].
pub struct ClassificationWorker<'a> {
    filter: &'a MediaFilter,
    inspector: &'a dyn MediaInspector,
    fingerprinter: &'a dyn Fingerprinter,
    placement: &'a PlacementEngine,
}

impl<'a> ClassificationWorker<'a> {
    pub fn new(
        filter: &'a MediaFilter,
        inspector: &'a dyn MediaInspector,
        fingerprinter: &'a dyn Fingerprinter,
        placement: &'a PlacementEngine,
    ) -> Self {
        Self {
            filter,
            inspector,
            fingerprinter,
            placement,
        }
    }

    /// Classify one candidate. Never panics; every failure becomes a
    /// [`ClassificationOutcome::Failed`] with the source left in place.
    pub fn classify(
        &self,
        candidate: &CandidateFile,
        reader: &IndexReader,
    ) -> ClassificationOutcome {
        let path = &candidate.path;

        // SizeFilter - re-stat; the file may have changed or vanished
        // between enumeration and processing
        let size = match fs::metadata(path) {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                return ClassificationOutcome::Failed {
                    source: path.clone(),
                    message: format!("cannot stat: {e}"),
                }
            }
        };
        if !self.filter.passes_size_floor(size) {
            return ClassificationOutcome::Skipped {
                source: path.clone(),
                reason: SkipReason::TooSmall,
            };
        }

        // TypeFilter
        let Some(kind) = self.filter.kind_of(path) else {
            return ClassificationOutcome::Skipped {
                source: path.clone(),
                reason: SkipReason::Unsupported,
            };
        };

        // FastPrecheck - skip without hashing when (size, date) is known
        let profile = self.inspector.resolve(path, kind);
        let created_date = profile.date.to_string();
        if reader.exists_by_size_date(size, &created_date) {
            debug!(path = %path.display(), size, date = %created_date, "pre-check hit, skipping");
            return ClassificationOutcome::Skipped {
                source: path.clone(),
                reason: SkipReason::AlreadyIndexed,
            };
        }

        // Fingerprinting - the expensive step
        let fingerprint = match self.fingerprinter.fingerprint(path) {
            Ok(fp) => fp,
            Err(e) => {
                return ClassificationOutcome::Failed {
                    source: path.clone(),
                    message: e.to_string(),
                }
            }
        };

        // ExactDedupCheck - on a hit the source is deleted
        if reader.exists_by_fingerprint(&fingerprint) {
            warn!(path = %path.display(), "exact duplicate, deleting source");
            return match fs::remove_file(path) {
                Ok(()) => ClassificationOutcome::Duplicate {
                    source: path.clone(),
                },
                Err(e) => ClassificationOutcome::Failed {
                    source: path.clone(),
                    message: PlacementError::RemoveDuplicate {
                        path: path.clone(),
                        source: e,
                    }
                    .to_string(),
                },
            };
        }

        // Placement - move into the category/date tree
        match self.placement.place(
            path,
            profile.category,
            profile.date,
            &fingerprint,
            &candidate.extension,
        ) {
            Ok(destination) => ClassificationOutcome::Placed {
                record: FileRecord {
                    fingerprint,
                    size,
                    category: profile.category,
                    created_date,
                },
                source: path.clone(),
                destination,
            },
            Err(e) => ClassificationOutcome::Failed {
                source: path.clone(),
                message: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fingerprint::Sha256Fingerprinter;
    use crate::core::index::SqliteIndex;
    use crate::core::metadata::{Category, CreatedDate, DateSource, MediaProfile};
    use crate::core::scanner::MediaKind;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// Inspector returning one fixed profile, for deterministic dates
    struct FixedInspector(MediaProfile);

    impl MediaInspector for FixedInspector {
        fn resolve(&self, _path: &Path, _kind: MediaKind) -> MediaProfile {
            self.0
        }
    }

    fn fixed_photo(date: CreatedDate) -> FixedInspector {
        FixedInspector(MediaProfile {
            category: Category::Photo,
            date,
            date_source: DateSource::CaptureMetadata,
        })
    }

    fn filter() -> MediaFilter {
        MediaFilter::new(&["jpg".into()], &["mp4".into()], &[], 8)
    }

    fn candidate(path: PathBuf, size: u64) -> CandidateFile {
        CandidateFile {
            path,
            size,
            kind: MediaKind::Image,
            extension: ".jpg".into(),
        }
    }

    struct Fixture {
        _temp: TempDir,
        index: SqliteIndex,
        placement: PlacementEngine,
        input: PathBuf,
        photos: PathBuf,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let index = SqliteIndex::open(&temp.path().join("index.db")).unwrap();
        let photos = temp.path().join("photos");
        let placement = PlacementEngine::new(
            photos.clone(),
            temp.path().join("images"),
            temp.path().join("videos"),
        );
        let input = temp.path().join("input");
        std::fs::create_dir(&input).unwrap();
        Fixture {
            _temp: temp,
            index,
            placement,
            input,
            photos,
        }
    }

    #[test]
    fn small_file_is_skipped_in_place() {
        let fx = fixture();
        let path = fx.input.join("tiny.jpg");
        std::fs::write(&path, b"x").unwrap();

        let inspector = fixed_photo(CreatedDate::new(2020, 3, 15));
        let hasher = Sha256Fingerprinter::new();
        let filter = filter();
        let worker = ClassificationWorker::new(&filter, &inspector, &hasher, &fx.placement);

        let outcome = worker.classify(&candidate(path.clone(), 1), &fx.index.reader().unwrap());

        assert!(matches!(
            outcome,
            ClassificationOutcome::Skipped {
                reason: SkipReason::TooSmall,
                ..
            }
        ));
        assert!(path.exists());
    }

    #[test]
    fn unsupported_extension_is_skipped() {
        let fx = fixture();
        let path = fx.input.join("notes.txt");
        std::fs::write(&path, b"plain text file").unwrap();

        let inspector = fixed_photo(CreatedDate::new(2020, 3, 15));
        let hasher = Sha256Fingerprinter::new();
        let filter = filter();
        let worker = ClassificationWorker::new(&filter, &inspector, &hasher, &fx.placement);

        let outcome = worker.classify(
            &CandidateFile {
                path: path.clone(),
                size: 15,
                kind: MediaKind::Image,
                extension: ".txt".into(),
            },
            &fx.index.reader().unwrap(),
        );

        assert!(matches!(
            outcome,
            ClassificationOutcome::Skipped {
                reason: SkipReason::Unsupported,
                ..
            }
        ));
        assert!(path.exists());
    }

    #[test]
    fn fresh_file_is_placed_with_record() {
        let fx = fixture();
        let path = fx.input.join("a.jpg");
        std::fs::write(&path, b"photo bytes!").unwrap();

        let inspector = fixed_photo(CreatedDate::new(2020, 3, 15));
        let hasher = Sha256Fingerprinter::new();
        let filter = filter();
        let worker = ClassificationWorker::new(&filter, &inspector, &hasher, &fx.placement);

        let outcome = worker.classify(&candidate(path.clone(), 12), &fx.index.reader().unwrap());

        match outcome {
            ClassificationOutcome::Placed {
                record,
                destination,
                ..
            } => {
                assert_eq!(record.category, Category::Photo);
                assert_eq!(record.created_date, "2020-03-15");
                assert_eq!(record.size, 12);
                assert!(destination.starts_with(&fx.photos));
                assert!(destination.exists());
            }
            other => panic!("expected Placed, got {other:?}"),
        }
        assert!(!path.exists());
    }

    #[test]
    fn precheck_hit_skips_without_fingerprinting() {
        let fx = fixture();
        let path = fx.input.join("seen.jpg");
        std::fs::write(&path, b"already seen").unwrap();

        // Pre-existing record with the same size and date
        fx.index
            .commit_batch(&[FileRecord {
                fingerprint: "other-content".into(),
                size: 12,
                category: Category::Photo,
                created_date: "2020-03-15".into(),
            }])
            .unwrap();

        let inspector = fixed_photo(CreatedDate::new(2020, 3, 15));
        let hasher = Sha256Fingerprinter::new();
        let filter = filter();
        let worker = ClassificationWorker::new(&filter, &inspector, &hasher, &fx.placement);

        let outcome = worker.classify(&candidate(path.clone(), 12), &fx.index.reader().unwrap());

        assert!(matches!(
            outcome,
            ClassificationOutcome::Skipped {
                reason: SkipReason::AlreadyIndexed,
                ..
            }
        ));
        assert!(path.exists());
    }

    #[test]
    fn exact_duplicate_is_deleted() {
        let fx = fixture();
        let path = fx.input.join("dup.jpg");
        std::fs::write(&path, b"duplicated data").unwrap();

        let fp = Sha256Fingerprinter::new().fingerprint(&path).unwrap();
        // Different size+date so the pre-check misses, but same fingerprint
        fx.index
            .commit_batch(&[FileRecord {
                fingerprint: fp,
                size: 999,
                category: Category::Photo,
                created_date: "1999-01-01".into(),
            }])
            .unwrap();

        let inspector = fixed_photo(CreatedDate::new(2020, 3, 15));
        let hasher = Sha256Fingerprinter::new();
        let filter = filter();
        let worker = ClassificationWorker::new(&filter, &inspector, &hasher, &fx.placement);

        let outcome = worker.classify(&candidate(path.clone(), 15), &fx.index.reader().unwrap());

        assert!(matches!(outcome, ClassificationOutcome::Duplicate { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn vanished_file_fails_without_side_effects() {
        let fx = fixture();

        let inspector = fixed_photo(CreatedDate::new(2020, 3, 15));
        let hasher = Sha256Fingerprinter::new();
        let filter = filter();
        let worker = ClassificationWorker::new(&filter, &inspector, &hasher, &fx.placement);

        let outcome = worker.classify(
            &candidate(fx.input.join("gone.jpg"), 100),
            &fx.index.reader().unwrap(),
        );

        assert!(matches!(outcome, ClassificationOutcome::Failed { .. }));
    }
}
