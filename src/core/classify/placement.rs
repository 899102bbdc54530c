//! Destination path computation and the physical move.

use crate::core::metadata::{Category, CreatedDate};
use crate::error::PlacementError;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Computes destination paths and moves files into the output trees
#[derive(Debug, Clone)]
pub struct PlacementEngine {
    photo_root: PathBuf,
    image_root: PathBuf,
    video_root: PathBuf,
}

impl PlacementEngine {
    pub fn new(photo_root: PathBuf, image_root: PathBuf, video_root: PathBuf) -> Self {
        Self {
            photo_root,
            image_root,
            video_root,
        }
    }

    /// The output root for a category
    pub fn root_for(&self, category: Category) -> &Path {
        match category {
            Category::Photo => &self.photo_root,
            Category::Image => &self.image_root,
            Category::Video => &self.video_root,
        }
    }

    /// Destination directory: `{root}/{year}/{month}/{day}`
    pub fn destination_dir(&self, category: Category, date: CreatedDate) -> PathBuf {
        self.root_for(category)
            .join(format!("{:04}", date.year))
            .join(format!("{:02}", date.month))
            .join(format!("{:02}", date.day))
    }

    /// Move the file to its computed destination and return that path.
    ///
    /// The filename is `{Y-M-D}-{fingerprint}{ext}`; if that name is
    /// taken (racing workers, leftovers from an interrupted run), a
    /// numeric suffix `_1`, `_2`, ... is probed until a free name is
    /// found. Each probe reserves the name with `create_new`, so two
    /// workers racing the same base name can never rename onto the same
    /// target. Any I/O failure leaves the source file where it was.
    pub fn place(
        &self,
        source: &Path,
        category: Category,
        date: CreatedDate,
        fingerprint: &str,
        extension: &str,
    ) -> Result<PathBuf, PlacementError> {
        let dir = self.destination_dir(category, date);
        fs::create_dir_all(&dir).map_err(|e| PlacementError::CreateDir {
            path: dir.clone(),
            source: e,
        })?;

        let base = format!("{date}-{fingerprint}");
        let mut counter = 0u32;
        let target = loop {
            let name = if counter == 0 {
                format!("{base}{extension}")
            } else {
                format!("{base}_{counter}{extension}")
            };
            let candidate = dir.join(name);
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
            {
                Ok(_) => break candidate,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => counter += 1,
                Err(e) => {
                    return Err(PlacementError::Move {
                        from: source.to_path_buf(),
                        to: candidate,
                        source: e,
                    })
                }
            }
        };
        if counter > 0 {
            debug!(target = %target.display(), "destination collision resolved with suffix");
        }

        // The reservation is an empty file we own; rename replaces it
        if let Err(e) = Self::move_file(source, &target) {
            let _ = fs::remove_file(&target);
            return Err(e);
        }
        info!(from = %source.display(), to = %target.display(), "placed");
        Ok(target)
    }

    /// Rename, falling back to copy + verify + delete across filesystems
    fn move_file(from: &Path, to: &Path) -> Result<(), PlacementError> {
        let result = fs::rename(from, to).or_else(|_| {
            let source_size = fs::metadata(from)?.len();
            fs::copy(from, to)?;

            // Verify the copy before deleting the source
            let dest_size = fs::metadata(to)?.len();
            if dest_size != source_size {
                let _ = fs::remove_file(to);
                return Err(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!(
                        "copy verification failed: source {} bytes, dest {} bytes",
                        source_size, dest_size
                    ),
                ));
            }

            fs::remove_file(from)
        });

        result.map_err(|e| PlacementError::Move {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source: e,
        })
    }
}
