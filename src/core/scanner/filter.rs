//! Candidate filtering: extension allow-lists, size floor, deny-listed
//! directory names.

use super::MediaKind;
use std::collections::HashSet;
use std::path::Path;

/// Decides which files are candidates and which directories are walked
#[derive(Debug, Clone)]
pub struct MediaFilter {
    image_extensions: HashSet<String>,
    video_extensions: HashSet<String>,
    skip_dirs: HashSet<String>,
    min_file_size: u64,
}

impl MediaFilter {
    pub fn new(
        image_extensions: &[String],
        video_extensions: &[String],
        skip_dirs: &[String],
        min_file_size: u64,
    ) -> Self {
        Self {
            image_extensions: image_extensions.iter().map(|e| e.to_lowercase()).collect(),
            video_extensions: video_extensions.iter().map(|e| e.to_lowercase()).collect(),
            skip_dirs: skip_dirs.iter().cloned().collect(),
            min_file_size,
        }
    }

    /// Classify a path as image or video by extension, or neither
    pub fn kind_of(&self, path: &Path) -> Option<MediaKind> {
        let ext = path.extension().and_then(|e| e.to_str())?.to_lowercase();
        if self.image_extensions.contains(&ext) {
            Some(MediaKind::Image)
        } else if self.video_extensions.contains(&ext) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    /// Whether a directory name is on the deny-list
    pub fn is_skipped_dir(&self, name: &str) -> bool {
        self.skip_dirs.contains(name)
    }

    /// Whether a file of this size passes the size floor
    pub fn passes_size_floor(&self, size: u64) -> bool {
        size >= self.min_file_size
    }

    /// The configured size floor in bytes
    pub fn min_file_size(&self) -> u64 {
        self.min_file_size
    }

    /// The deny-listed directory names
    pub fn skip_dirs(&self) -> &HashSet<String> {
        &self.skip_dirs
    }
}
