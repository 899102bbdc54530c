//! # Scanner Module
//!
//! Enumerates candidate media files under the input root.
//!
//! The full candidate list is materialized before any classification
//! starts: later batching and progress reporting need a stable total.
//! Entries inside deny-listed directory names (OS reserved folders and
//! the like) are excluded from both enumeration and post-run pruning.

mod filter;
mod walker;

pub use filter::MediaFilter;
pub use walker::{prune_empty_dirs, WalkDirScanner};

use crate::error::ScanError;
use crate::events::EventSender;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Broad media class derived from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Image,
    Video,
}

/// A discovered candidate file
#[derive(Debug, Clone)]
pub struct CandidateFile {
    /// Path to the file
    pub path: PathBuf,
    /// Size in bytes at enumeration time
    pub size: u64,
    /// Image or video, per the extension allow-lists
    pub kind: MediaKind,
    /// Lowercased extension including the leading dot (e.g. ".jpg")
    pub extension: String,
}

/// Result of candidate enumeration
#[derive(Debug)]
pub struct ScanOutcome {
    /// Candidates passing the type and size filters
    pub candidates: Vec<CandidateFile>,
    /// Files rejected by the type or size filter, left in place
    pub filtered: usize,
    /// Non-fatal errors encountered while walking
    pub errors: Vec<ScanError>,
}

/// Trait for candidate scanners
///
/// Implement this to supply candidates from a source other than the
/// filesystem walker (e.g. a fixed list in tests).
pub trait CandidateScanner: Send + Sync {
    /// Enumerate candidates under the root
    fn scan(&self, root: &PathBuf) -> Result<ScanOutcome, ScanError>;

    /// Enumerate with progress reporting via events
    fn scan_with_events(
        &self,
        root: &PathBuf,
        events: &EventSender,
    ) -> Result<ScanOutcome, ScanError>;
}
