use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use clientela_core::ReferenceError;

/// Errors emitted by the generation engine.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("missing or empty source: {0}")]
    MissingOrEmptySource(#[from] ReferenceError),
    #[error("cannot open {path} for writing: {source}")]
    SinkUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("write failure: {0}")]
    WriteFailure(#[source] std::io::Error),
    #[error("generation worker could not be started: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("generation worker panicked")]
    WorkerPanicked,
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GenerationError {
    /// Classification recorded in the run summary of a failed run.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidConfiguration(_) => FailureKind::InvalidConfiguration,
            Self::MissingOrEmptySource(_) => FailureKind::MissingOrEmptySource,
            Self::SinkUnavailable { .. } => FailureKind::SinkUnavailable,
            Self::WriteFailure(_) | Self::Json(_) => FailureKind::WriteFailure,
            Self::Spawn(_) | Self::WorkerPanicked => FailureKind::Worker,
        }
    }
}

impl From<csv::Error> for GenerationError {
    fn from(err: csv::Error) -> Self {
        Self::WriteFailure(err.into())
    }
}

/// Serializable failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidConfiguration,
    MissingOrEmptySource,
    SinkUnavailable,
    WriteFailure,
    Worker,
}
