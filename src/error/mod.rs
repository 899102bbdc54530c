//! # Error Module
//!
//! Error types for the photo classifier.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Per-file failures stay per-file** - they become result records and
//!   never abort a batch or the run; only index unavailability and invalid
//!   configuration are fatal at startup

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Fingerprinting error: {0}")]
    Fingerprint(#[from] FingerprintError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("Placement error: {0}")]
    Placement(#[from] PlacementError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors that occur while enumerating candidate files
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Input directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory entry {path}: {source}")]
    ReadEntry {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while computing a content fingerprint
#[derive(Error, Debug)]
pub enum FingerprintError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur with the persistent dedup index
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Failed to open index database at {path}: {reason}")]
    OpenFailed { path: PathBuf, reason: String },

    #[error("Database query failed: {0}")]
    QueryFailed(String),

    #[error("Index corruption detected at {path}. Delete this file and try again.")]
    Corrupted { path: PathBuf },
}

/// Errors that occur while moving a file into the output tree
#[derive(Error, Debug)]
pub enum PlacementError {
    #[error("Failed to create destination directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move {from} to {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to delete duplicate {path}: {source}")]
    RemoveDuplicate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, ClassifierError>;
