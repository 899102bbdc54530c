//! # Classify Module
//!
//! The per-file decision pipeline and destination placement.
//!
//! ## Per-file state machine
//! SizeFilter → TypeFilter → FastPrecheck → Fingerprinting →
//! ExactDedupCheck → Placement, terminating in one of four outcomes:
//! placed, duplicate (source deleted), skipped, or failed (source left
//! untouched).

mod placement;
mod worker;

pub use placement::PlacementEngine;
pub use worker::ClassificationWorker;

use crate::core::index::FileRecord;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Why a file was skipped without being moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Below the configured minimum size
    TooSmall,
    /// Extension matches neither allow-list
    Unsupported,
    /// (size, created_date) matched an indexed record; treated as
    /// already processed without computing a fingerprint
    AlreadyIndexed,
}

/// Terminal state of one worker invocation.
///
/// Owned exclusively by the worker that produced it until handed to the
/// coordinator; never mutated after construction.
#[derive(Debug, Clone)]
pub enum ClassificationOutcome {
    /// File moved into an output tree; `record` is pending commit
    Placed {
        record: FileRecord,
        source: PathBuf,
        destination: PathBuf,
    },
    /// Exact fingerprint match; the source file was deleted
    Duplicate { source: PathBuf },
    /// File left in place
    Skipped { source: PathBuf, reason: SkipReason },
    /// Per-file failure; never aborts the run
    Failed { source: PathBuf, message: String },
}
