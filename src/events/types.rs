//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the classification pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Candidate enumeration events
    Scan(ScanEvent),
    /// Per-file classification events
    Classify(ClassifyEvent),
    /// Index commit events
    Commit(CommitEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Events during candidate enumeration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Enumeration has started
    Started { root: PathBuf },
    /// A candidate file was found
    CandidateFound { path: PathBuf },
    /// An entry could not be read; enumeration continues
    Error { path: PathBuf, message: String },
    /// Enumeration completed; the candidate list is now stable
    Completed { total_candidates: usize },
}

/// Events during the classification phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClassifyEvent {
    /// Classification has started
    Started { total_candidates: usize },
    /// Progress update as results are drained
    Progress(ClassifyProgress),
    /// A file was placed into the output tree
    Placed { source: PathBuf, destination: PathBuf },
    /// An exact duplicate was deleted at its source
    DuplicateRemoved { source: PathBuf },
    /// A file failed; the run continues
    Error { path: PathBuf, message: String },
}

/// Progress information during classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyProgress {
    /// Number of results drained so far
    pub completed: usize,
    /// Total number of candidates
    pub total: usize,
    /// Files placed so far
    pub processed: usize,
    /// Exact duplicates deleted so far
    pub duplicates: usize,
    /// Files skipped by the (size, date) pre-check so far
    pub precheck_skips: usize,
    /// File currently being reported
    pub current_path: PathBuf,
}

/// Events around batched index commits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CommitEvent {
    /// A batch was committed to the index
    Committed {
        batch_size: usize,
        inserted: usize,
    },
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// Pipeline completed successfully
    Completed { summary: RunSummary },
    /// Pipeline encountered a fatal error
    Error { message: String },
}

/// Phases of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Scanning,
    Classifying,
    Pruning,
    Reporting,
}

/// Summary of a completed run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Files placed into an output tree and recorded
    pub processed: usize,
    /// Exact duplicates deleted at their source
    pub duplicates: usize,
    /// Files skipped by the (size, date) pre-check
    pub precheck_skips: usize,
    /// Files rejected by the size or type filter
    pub filtered: usize,
    /// Per-file failures
    pub errors: usize,
    /// Rows actually inserted into the index
    pub committed: usize,
    /// Empty input directories removed after the run
    pub pruned_dirs: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl RunSummary {
    /// Total candidates that reached a terminal state
    pub fn total_seen(&self) -> usize {
        self.processed + self.duplicates + self.precheck_skips + self.filtered + self.errors
    }

    /// Candidates handled per second
    pub fn throughput(&self) -> f64 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        self.total_seen() as f64 / (self.duration_ms as f64 / 1000.0)
    }
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Scanning => write!(f, "Scanning"),
            PipelinePhase::Classifying => write!(f, "Classifying"),
            PipelinePhase::Pruning => write!(f, "Pruning"),
            PipelinePhase::Reporting => write!(f, "Reporting"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_serializable() {
        let event = Event::Classify(ClassifyEvent::Progress(ClassifyProgress {
            completed: 10,
            total: 50,
            processed: 7,
            duplicates: 2,
            precheck_skips: 1,
            current_path: PathBuf::from("/incoming/a.jpg"),
        }));

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: Event = serde_json::from_str(&json).unwrap();

        match deserialized {
            Event::Classify(ClassifyEvent::Progress(p)) => {
                assert_eq!(p.processed, 7);
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn summary_throughput_handles_zero_duration() {
        let summary = RunSummary::default();
        assert_eq!(summary.throughput(), 0.0);
    }

    #[test]
    fn summary_counts_all_outcomes() {
        let summary = RunSummary {
            processed: 5,
            duplicates: 2,
            precheck_skips: 3,
            filtered: 1,
            errors: 1,
            ..Default::default()
        };
        assert_eq!(summary.total_seen(), 12);
    }
}
