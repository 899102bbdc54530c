//! # Core Module
//!
//! The UI-agnostic classification and dedup engine.
//!
//! ## Modules
//! - `scanner` - enumerates candidate media files
//! - `metadata` - resolves categories and creation dates
//! - `fingerprint` - content hashing for exact dedup identity
//! - `index` - the persistent, thread-safe dedup index
//! - `classify` - the per-file decision pipeline and placement
//! - `pipeline` - the coordinator that ties everything together

pub mod classify;
pub mod fingerprint;
pub mod index;
pub mod metadata;
pub mod pipeline;
pub mod scanner;
