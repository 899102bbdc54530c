//! Pipeline execution implementation.

use crate::config::RunConfig;
use crate::core::classify::{
    ClassificationOutcome, ClassificationWorker, PlacementEngine, SkipReason,
};
use crate::core::fingerprint::{Fingerprinter, Sha256Fingerprinter};
use crate::core::index::{FileRecord, SqliteIndex};
use crate::core::metadata::{MediaInspector, MetadataOracle};
use crate::core::scanner::{
    prune_empty_dirs, CandidateFile, CandidateScanner, MediaFilter, WalkDirScanner,
};
use crate::error::ClassifierError;
use crate::events::{
    null_sender, ClassifyEvent, ClassifyProgress, CommitEvent, Event, EventSender,
    PipelineEvent, PipelinePhase, RunSummary,
};
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Result of a classification run
#[derive(Debug)]
pub struct PipelineResult {
    /// Aggregated counters for the run
    pub summary: RunSummary,
    /// Non-fatal errors encountered along the way
    pub errors: Vec<String>,
}

/// Builder for the classification pipeline
pub struct PipelineBuilder {
    config: RunConfig,
    index: Option<Arc<SqliteIndex>>,
    inspector: Arc<dyn MediaInspector>,
    fingerprinter: Arc<dyn Fingerprinter>,
}

impl PipelineBuilder {
    /// Create a builder with the default inspector and fingerprinter
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            index: None,
            inspector: Arc::new(MetadataOracle::new()),
            fingerprinter: Arc::new(Sha256Fingerprinter::new()),
        }
    }

    /// Use an already-open index instead of opening `config.database`
    pub fn index(mut self, index: Arc<SqliteIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Override the metadata inspector
    pub fn inspector(mut self, inspector: Arc<dyn MediaInspector>) -> Self {
        self.inspector = inspector;
        self
    }

    /// Override the content fingerprinter
    pub fn fingerprinter(mut self, fingerprinter: Arc<dyn Fingerprinter>) -> Self {
        self.fingerprinter = fingerprinter;
        self
    }

    /// Validate the configuration and open the index.
    ///
    /// Both failures are fatal: no file is touched without a valid
    /// configuration and a working index.
    pub fn build(self) -> crate::Result<Pipeline> {
        self.config.validate()?;

        let index = match self.index {
            Some(index) => index,
            None => Arc::new(SqliteIndex::open(&self.config.database)?),
        };

        Ok(Pipeline {
            config: self.config,
            index,
            inspector: self.inspector,
            fingerprinter: self.fingerprinter,
        })
    }
}

/// The classification pipeline: scan, classify in parallel, commit in
/// batches, prune emptied directories.
pub struct Pipeline {
    config: RunConfig,
    index: Arc<SqliteIndex>,
    inspector: Arc<dyn MediaInspector>,
    fingerprinter: Arc<dyn Fingerprinter>,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder(config: RunConfig) -> PipelineBuilder {
        PipelineBuilder::new(config)
    }

    /// The index this pipeline commits to
    pub fn index(&self) -> &Arc<SqliteIndex> {
        &self.index
    }

    /// Run the pipeline without events
    pub fn run(&self) -> crate::Result<PipelineResult> {
        self.run_with_events(&null_sender())
    }

    /// Run the pipeline with event reporting
    pub fn run_with_events(&self, events: &EventSender) -> crate::Result<PipelineResult> {
        let start_time = Instant::now();
        let mut errors = Vec::new();
        let mut summary = RunSummary::default();

        events.send(Event::Pipeline(PipelineEvent::Started));

        // Phase 1: Scanning. The candidate list is materialized before
        // any worker starts so files placed during this run are never
        // re-enumerated.
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Scanning,
        }));

        let filter = MediaFilter::new(
            &self.config.image_extensions,
            &self.config.video_extensions,
            &self.config.skip_dirs,
            self.config.min_file_size,
        );
        let scanner = WalkDirScanner::new(filter.clone());
        let scan = match scanner.scan_with_events(&self.config.input, events) {
            Ok(scan) => scan,
            Err(e) => {
                events.send(Event::Pipeline(PipelineEvent::Error {
                    message: e.to_string(),
                }));
                return Err(e.into());
            }
        };

        summary.filtered = scan.filtered;
        for e in &scan.errors {
            errors.push(e.to_string());
        }
        summary.errors = scan.errors.len();

        // Phase 2: Classifying
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Classifying,
        }));

        let total = scan.candidates.len();
        events.send(Event::Classify(ClassifyEvent::Started {
            total_candidates: total,
        }));

        if total > 0 {
            self.classify_all(scan.candidates, events, &mut summary, &mut errors)?;
        }

        // Phase 3: Pruning directories the moves emptied out
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Pruning,
        }));
        summary.pruned_dirs = prune_empty_dirs(&self.config.input, filter.skip_dirs());

        summary.duration_ms = start_time.elapsed().as_millis() as u64;

        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Reporting,
        }));
        events.send(Event::Pipeline(PipelineEvent::Completed {
            summary: summary.clone(),
        }));
        info!(
            processed = summary.processed,
            duplicates = summary.duplicates,
            precheck_skips = summary.precheck_skips,
            errors = summary.errors,
            duration_ms = summary.duration_ms,
            "run complete"
        );

        Ok(PipelineResult { summary, errors })
    }

    /// Fan candidates out across the worker pool and drain results on
    /// this thread, committing placed records in batches.
    ///
    /// All commits happen here, in drain order, so batch writes are
    /// strictly serialized no matter how many workers race ahead.
    fn classify_all(
        &self,
        candidates: Vec<CandidateFile>,
        events: &EventSender,
        summary: &mut RunSummary,
        errors: &mut Vec<String>,
    ) -> crate::Result<()> {
        let total = candidates.len();
        let workers = self.config.effective_workers();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| ClassifierError::Config(format!("cannot build worker pool: {e}")))?;
        info!(workers, total, "classification started");

        let (tx, rx) = crossbeam_channel::unbounded::<ClassificationOutcome>();

        let filter = MediaFilter::new(
            &self.config.image_extensions,
            &self.config.video_extensions,
            &self.config.skip_dirs,
            self.config.min_file_size,
        );
        let placement = PlacementEngine::new(
            self.config.photo_dest.clone(),
            self.config.image_dest.clone(),
            self.config.video_dest.clone(),
        );

        let index = Arc::clone(&self.index);
        let inspector = Arc::clone(&self.inspector);
        let fingerprinter = Arc::clone(&self.fingerprinter);

        pool.spawn(move || {
            candidates.par_iter().for_each_init(
                // One read-only index handle per worker thread
                || index.reader(),
                |reader, candidate| {
                    let outcome = match reader {
                        Ok(reader) => {
                            let worker = ClassificationWorker::new(
                                &filter,
                                inspector.as_ref(),
                                fingerprinter.as_ref(),
                                &placement,
                            );
                            worker.classify(candidate, reader)
                        }
                        Err(e) => ClassificationOutcome::Failed {
                            source: candidate.path.clone(),
                            message: format!("cannot open index reader: {e}"),
                        },
                    };
                    // The coordinator may have bailed; nothing to do then
                    let _ = tx.send(outcome);
                },
            );
        });

        // Drain until every worker has finished and dropped its sender
        let mut batch: Vec<FileRecord> = Vec::with_capacity(self.config.batch_size);
        // Fingerprints placed this run. Workers only see committed rows,
        // so two racing workers can both place identical content; the
        // drain loop resolves the loser here and keeps one survivor.
        let mut seen: HashSet<String> = HashSet::new();
        let mut completed = 0usize;

        for outcome in rx.iter() {
            completed += 1;
            let current_path = match &outcome {
                ClassificationOutcome::Placed { source, .. }
                | ClassificationOutcome::Duplicate { source }
                | ClassificationOutcome::Skipped { source, .. }
                | ClassificationOutcome::Failed { source, .. } => source.clone(),
            };

            match outcome {
                ClassificationOutcome::Placed {
                    record,
                    source,
                    destination,
                } => {
                    if seen.insert(record.fingerprint.clone()) {
                        summary.processed += 1;
                        events.send(Event::Classify(ClassifyEvent::Placed {
                            source,
                            destination,
                        }));
                        batch.push(record);
                        if batch.len() >= self.config.batch_size {
                            self.commit(&mut batch, events, summary, errors);
                        }
                    } else {
                        // A racing worker placed the same content first;
                        // remove this redundant copy
                        match std::fs::remove_file(&destination) {
                            Ok(()) => {
                                summary.duplicates += 1;
                                events.send(Event::Classify(ClassifyEvent::DuplicateRemoved {
                                    source,
                                }));
                            }
                            Err(e) => {
                                summary.errors += 1;
                                let message =
                                    format!("cannot delete duplicate {}: {e}", destination.display());
                                errors.push(message.clone());
                                events.send(Event::Classify(ClassifyEvent::Error {
                                    path: destination,
                                    message,
                                }));
                            }
                        }
                    }
                }
                ClassificationOutcome::Duplicate { source } => {
                    summary.duplicates += 1;
                    events.send(Event::Classify(ClassifyEvent::DuplicateRemoved { source }));
                }
                ClassificationOutcome::Skipped { reason, .. } => match reason {
                    SkipReason::AlreadyIndexed => summary.precheck_skips += 1,
                    SkipReason::TooSmall | SkipReason::Unsupported => summary.filtered += 1,
                },
                ClassificationOutcome::Failed { source, message } => {
                    summary.errors += 1;
                    errors.push(format!("{}: {}", source.display(), message));
                    events.send(Event::Classify(ClassifyEvent::Error {
                        path: source,
                        message,
                    }));
                }
            }

            events.send(Event::Classify(ClassifyEvent::Progress(ClassifyProgress {
                completed,
                total,
                processed: summary.processed,
                duplicates: summary.duplicates,
                precheck_skips: summary.precheck_skips,
                current_path,
            })));
        }

        // Final partial batch
        if !batch.is_empty() {
            self.commit(&mut batch, events, summary, errors);
        }

        Ok(())
    }

    /// Commit the pending batch and clear it.
    ///
    /// A failed commit is not fatal: the files are already placed, and
    /// re-running dedups them again from content. The loss is logged.
    fn commit(
        &self,
        batch: &mut Vec<FileRecord>,
        events: &EventSender,
        summary: &mut RunSummary,
        errors: &mut Vec<String>,
    ) {
        match self.index.commit_batch(batch) {
            Ok(inserted) => {
                summary.committed += inserted;
                events.send(Event::Commit(CommitEvent::Committed {
                    batch_size: batch.len(),
                    inserted,
                }));
            }
            Err(e) => {
                error!(batch = batch.len(), error = %e, "batch commit failed");
                summary.errors += 1;
                errors.push(format!("batch commit failed: {e}"));
            }
        }
        batch.clear();
    }
}
