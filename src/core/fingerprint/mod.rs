//! # Fingerprint Module
//!
//! Content hashing for exact duplicate identity.
//!
//! Files are streamed through SHA-256 in fixed-size chunks so peak memory
//! stays bounded regardless of file size. The hex fingerprint is the sole
//! basis for exact-duplicate decisions.

use crate::error::FingerprintError;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Read chunk size; keeps memory flat for multi-gigabyte videos
const CHUNK_SIZE: usize = 8 * 1024;

/// Trait seam for content fingerprinting
///
/// Tests wrap this with an invocation counter to verify the fast
/// pre-check really avoids hashing.
pub trait Fingerprinter: Send + Sync {
    /// Compute a stable hex fingerprint of the file's bytes
    fn fingerprint(&self, path: &Path) -> Result<String, FingerprintError>;
}

/// SHA-256 fingerprinter
#[derive(Debug, Default)]
pub struct Sha256Fingerprinter;

impl Sha256Fingerprinter {
    pub fn new() -> Self {
        Self
    }
}

impl Fingerprinter for Sha256Fingerprinter {
    fn fingerprint(&self, path: &Path) -> Result<String, FingerprintError> {
        let mut file = File::open(path).map_err(|e| FingerprintError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut hasher = Sha256::new();
        let mut buffer = [0u8; CHUNK_SIZE];

        loop {
            let read = file.read(&mut buffer).map_err(|e| FingerprintError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }

        Ok(format!("{:x}", hasher.finalize()))
    }
}
