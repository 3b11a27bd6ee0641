//! Customer record generation for clientela.
//!
//! This crate turns loaded reference data into synthetic customer records
//! and streams them as CSV from a cancellable, progress-reporting worker.

pub mod email;
pub mod engine;
pub mod errors;
pub mod model;
pub mod output;
pub mod signal;
pub mod synth;

pub use engine::{GenerationEngine, RunHandle};
pub use errors::{FailureKind, GenerationError};
pub use model::{
    DEFAULT_DOMAINS, DomainPolicy, GenerateOptions, GenerationJob, RunSummary, TargetCount,
    Termination,
};
pub use output::csv::{HEADER, RowWriter, encode};
pub use signal::{CancelHandle, GenerationEvent, ProgressSender, progress_channel};
pub use synth::synthesize;
