//! # photosort CLI
//!
//! Command-line interface for the photo classifier.
//!
//! ## Usage
//! ```bash
//! photosort run ~/Incoming --photo-dest ~/Photos --image-dest ~/Images --video-dest ~/Videos
//! photosort run --config photosort.json --workers 8 --batch-size 100
//! photosort stats
//! ```

mod cli;

use photosort::Result;

fn main() -> Result<()> {
    cli::run()
}
