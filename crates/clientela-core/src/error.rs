use std::path::PathBuf;

use thiserror::Error;

use crate::reference::SourceId;

/// Failure to load one of the four reference inputs.
#[derive(Debug, Error)]
pub enum ReferenceError {
    /// The input could not be opened or decoded.
    #[error("reference source `{source_id}` is unreadable ({path}): {cause}")]
    Unreadable {
        source_id: SourceId,
        path: PathBuf,
        #[source]
        cause: std::io::Error,
    },
    /// The input was read but yielded no usable entries.
    #[error("reference source `{source_id}` has no usable entries")]
    Empty { source_id: SourceId },
}

impl ReferenceError {
    /// Which input caused the failure.
    pub fn source_id(&self) -> SourceId {
        match self {
            Self::Unreadable { source_id, .. } | Self::Empty { source_id } => *source_id,
        }
    }
}

/// Reasons a string is not a structurally valid cédula.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CedulaError {
    #[error("expected 10 digits, found {found} characters")]
    Length { found: usize },
    #[error("unexpected character {found:?}")]
    NonDigit { found: char },
    #[error("province code {code:02} is outside 01-24")]
    Province { code: u8 },
    #[error("third digit {digit} is not a natural-person digit (0-5)")]
    ThirdDigit { digit: u8 },
    #[error("check digit mismatch: expected {expected}, found {found}")]
    Checksum { expected: u8, found: u8 },
}

/// A record field that breaks the output constraints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("age {age} is outside 18-80")]
    Age { age: u8 },
    #[error("{field} is blank")]
    BlankField { field: &'static str },
    #[error("malformed email {email:?}")]
    Email { email: String },
    #[error("location parts must not be blank")]
    BlankLocation,
}
