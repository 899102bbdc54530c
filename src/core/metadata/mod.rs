//! # Metadata Module
//!
//! Resolves a category and canonical creation date for each candidate.
//!
//! ## Date tiers
//! Date resolution never fails; it degrades through three tiers:
//! 1. Embedded capture timestamp (EXIF `DateTimeOriginal`, then
//!    `DateTimeDigitized`, then `DateTime`) for images with metadata
//! 2. Filesystem modification time
//! 3. Current wall-clock time
//!
//! ## Categories
//! - **Photo** - image extension with at least one recognized EXIF marker
//! - **Image** - image extension without any marker
//! - **Video** - video extension (dates come from tiers 2-3; container
//!   metadata readers are platform collaborators outside this crate)

use crate::core::scanner::MediaKind;
use chrono::{Datelike, Local, NaiveDateTime};
use exif::{In, Tag, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// EXIF tags whose presence marks an image as a photo
const MARKER_TAGS: [Tag; 5] = [
    Tag::DateTimeOriginal,
    Tag::DateTimeDigitized,
    Tag::DateTime,
    Tag::Make,
    Tag::Model,
];

/// EXIF tags consulted for the capture date, in preference order
const DATE_TAGS: [Tag; 3] = [Tag::DateTimeOriginal, Tag::DateTimeDigitized, Tag::DateTime];

/// Classification of a file by extension and capture metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    /// Image with usable embedded capture metadata
    Photo,
    /// Image without capture metadata
    Image,
    /// Video
    Video,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Photo => "photo",
            Category::Image => "image",
            Category::Video => "video",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "photo" => Some(Category::Photo),
            "image" => Some(Category::Image),
            "video" => Some(Category::Video),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized (year, month, day) triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CreatedDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl CreatedDate {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }

    /// Today's date in local time
    pub fn today() -> Self {
        let now = Local::now();
        Self::new(now.year(), now.month(), now.day())
    }
}

impl fmt::Display for CreatedDate {
    /// String encoding used by the index and destination paths
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Which tier produced the date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateSource {
    CaptureMetadata,
    FileModified,
    Clock,
}

/// Resolved category and creation date for one file
#[derive(Debug, Clone, Copy)]
pub struct MediaProfile {
    pub category: Category,
    pub date: CreatedDate,
    pub date_source: DateSource,
}

/// Trait seam for category/date resolution
///
/// The pipeline depends on this rather than on [`MetadataOracle`] directly
/// so tests can inject fixed profiles.
pub trait MediaInspector: Send + Sync {
    fn resolve(&self, path: &Path, kind: MediaKind) -> MediaProfile;
}

/// Default inspector backed by EXIF and the filesystem
#[derive(Debug, Default)]
pub struct MetadataOracle;

impl MetadataOracle {
    pub fn new() -> Self {
        Self
    }

    fn read_exif(path: &Path) -> Option<exif::Exif> {
        let file = File::open(path).ok()?;
        let mut reader = BufReader::new(&file);
        exif::Reader::new().read_from_container(&mut reader).ok()
    }

    fn has_marker(exif: &exif::Exif) -> bool {
        MARKER_TAGS
            .iter()
            .any(|tag| exif.get_field(*tag, In::PRIMARY).is_some())
    }

    fn capture_date(exif: &exif::Exif) -> Option<CreatedDate> {
        for tag in DATE_TAGS {
            let Some(field) = exif.get_field(tag, In::PRIMARY) else {
                continue;
            };
            let Value::Ascii(ref vec) = field.value else {
                continue;
            };
            let Some(bytes) = vec.first() else { continue };
            let Ok(s) = std::str::from_utf8(bytes) else {
                continue;
            };
            // EXIF date format: "YYYY:MM:DD HH:MM:SS"
            if let Ok(naive) = NaiveDateTime::parse_from_str(s.trim(), "%Y:%m:%d %H:%M:%S") {
                return Some(CreatedDate::new(naive.year(), naive.month(), naive.day()));
            }
        }
        None
    }

    fn mtime_date(path: &Path) -> Option<CreatedDate> {
        let modified = std::fs::metadata(path).ok()?.modified().ok()?;
        let local: chrono::DateTime<Local> = modified.into();
        Some(CreatedDate::new(local.year(), local.month(), local.day()))
    }

    /// Filesystem tier with wall-clock fallback
    fn fallback_date(path: &Path) -> (CreatedDate, DateSource) {
        match Self::mtime_date(path) {
            Some(date) => (date, DateSource::FileModified),
            None => {
                debug!(path = %path.display(), "mtime unavailable, using current date");
                (CreatedDate::today(), DateSource::Clock)
            }
        }
    }
}

impl MediaInspector for MetadataOracle {
    fn resolve(&self, path: &Path, kind: MediaKind) -> MediaProfile {
        match kind {
            MediaKind::Video => {
                let (date, date_source) = Self::fallback_date(path);
                MediaProfile {
                    category: Category::Video,
                    date,
                    date_source,
                }
            }
            MediaKind::Image => {
                let exif = Self::read_exif(path);
                let is_photo = exif.as_ref().map(Self::has_marker).unwrap_or(false);

                if is_photo {
                    if let Some(date) = exif.as_ref().and_then(Self::capture_date) {
                        return MediaProfile {
                            category: Category::Photo,
                            date,
                            date_source: DateSource::CaptureMetadata,
                        };
                    }
                }

                let (date, date_source) = Self::fallback_date(path);
                MediaProfile {
                    category: if is_photo {
                        Category::Photo
                    } else {
                        Category::Image
                    },
                    date,
                    date_source,
                }
            }
        }
    }
}
