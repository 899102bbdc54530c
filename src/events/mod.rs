//! # Events Module
//!
//! Event-driven progress reporting for the classification pipeline.
//!
//! Workers and the coordinator emit events over a crossbeam channel; the
//! CLI (or any other frontend) consumes them on its own thread. Dropping
//! the receiver silently disables reporting, so the core never blocks on a
//! slow or absent UI.

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::{
    ClassifyEvent, ClassifyProgress, CommitEvent, Event, PipelineEvent, PipelinePhase,
    RunSummary, ScanEvent,
};
