//! # Photosort
//!
//! Classifies photo/video trees into date-partitioned folders with
//! content-hash deduplication.
//!
//! ## Core Philosophy
//! - **Never lose data** - a file is either fully moved or left untouched
//! - **Hash only when needed** - a cheap (size, date) pre-check skips files
//!   that were almost certainly processed on an earlier run
//! - **One record per fingerprint** - the persistent index is the single
//!   source of truth for what has been classified
//!
//! ## Architecture
//! The library is split into a core engine (UI-agnostic) and presentation
//! layers:
//! - `core` - the classification and dedup engine
//! - `events` - event-driven progress reporting
//! - `error` - error types
//! - `config` - run configuration

pub mod config;
pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{ClassifierError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point.
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
