//! # Config Module
//!
//! Run configuration: paths, allow-lists, tuning knobs.
//!
//! Configuration can be loaded from a JSON file and individual fields
//! overridden from the command line. Validation happens before the index
//! is opened so a bad configuration never touches any file.

use crate::error::ClassifierError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a classification run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Root directory to classify
    pub input: PathBuf,
    /// Destination root for images with capture metadata
    pub photo_dest: PathBuf,
    /// Destination root for images without capture metadata
    pub image_dest: PathBuf,
    /// Destination root for videos
    pub video_dest: PathBuf,
    /// Path of the SQLite dedup index
    pub database: PathBuf,
    /// Extensions treated as images (lowercase, no dot)
    pub image_extensions: Vec<String>,
    /// Extensions treated as videos (lowercase, no dot)
    pub video_extensions: Vec<String>,
    /// Directory names excluded from enumeration and pruning
    pub skip_dirs: Vec<String>,
    /// Files below this many bytes are skipped (thumbnails, sidecars)
    pub min_file_size: u64,
    /// Worker thread count; 0 means available parallelism
    pub workers: usize,
    /// Placed results per index commit
    pub batch_size: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            photo_dest: PathBuf::new(),
            image_dest: PathBuf::new(),
            video_dest: PathBuf::new(),
            database: default_database_path(),
            image_extensions: [
                "jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "webp", "heic", "heif",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            video_extensions: ["mp4", "mov", "avi", "mkv", "m4v", "3gp", "wmv", "mts"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            skip_dirs: [
                "$RECYCLE.BIN",
                "System Volume Information",
                ".Trash",
                "lost+found",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            min_file_size: 1024,
            workers: 0,
            batch_size: 50,
        }
    }
}

/// Default index location under the user's data directory
fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("photosort")
        .join("photosort.db")
}

impl RunConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ClassifierError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ClassifierError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            ClassifierError::Config(format!("invalid JSON in {}: {}", path.display(), e))
        })
    }

    /// Validate the configuration before any file is touched
    pub fn validate(&self) -> Result<(), ClassifierError> {
        if self.input.as_os_str().is_empty() {
            return Err(ClassifierError::Config("input folder not set".into()));
        }
        if !self.input.is_dir() {
            return Err(ClassifierError::Config(format!(
                "input folder does not exist: {}",
                self.input.display()
            )));
        }
        for (name, dest) in [
            ("photo_dest", &self.photo_dest),
            ("image_dest", &self.image_dest),
            ("video_dest", &self.video_dest),
        ] {
            if dest.as_os_str().is_empty() {
                return Err(ClassifierError::Config(format!("{name} not set")));
            }
        }
        if self.image_extensions.is_empty() && self.video_extensions.is_empty() {
            return Err(ClassifierError::Config(
                "no image or video extensions configured".into(),
            ));
        }
        if self.batch_size == 0 {
            return Err(ClassifierError::Config("batch_size must be at least 1".into()));
        }
        Ok(())
    }

    /// Effective worker count
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_has_sane_extensions() {
        let config = RunConfig::default();
        assert!(config.image_extensions.contains(&"jpg".to_string()));
        assert!(config.video_extensions.contains(&"mp4".to_string()));
        assert_eq!(config.min_file_size, 1024);
        assert_eq!(config.batch_size, 50);
    }

    #[test]
    fn validate_rejects_missing_input() {
        let config = RunConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_batch_size() {
        let temp = TempDir::new().unwrap();
        let config = RunConfig {
            input: temp.path().to_path_buf(),
            photo_dest: temp.path().join("photos"),
            image_dest: temp.path().join("images"),
            video_dest: temp.path().join("videos"),
            batch_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_parses_partial_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(&path, r#"{ "min_file_size": 2048, "workers": 4 }"#).unwrap();

        let config = RunConfig::load(&path).unwrap();
        assert_eq!(config.min_file_size, 2048);
        assert_eq!(config.workers, 4);
        // Unspecified fields fall back to defaults
        assert_eq!(config.batch_size, 50);
    }

    #[test]
    fn load_rejects_invalid_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(RunConfig::load(&path).is_err());
    }

    #[test]
    fn effective_workers_never_zero() {
        let config = RunConfig::default();
        assert!(config.effective_workers() >= 1);
    }
}
