//! Core contracts for clientela.
//!
//! This crate defines the record model, the Ecuadorian cédula checksum
//! algorithm, and the immutable reference data (names, surnames and
//! locations) that record synthesis samples from.

pub mod cedula;
pub mod error;
pub mod reference;
pub mod types;

pub use cedula::{Cedula, check_digit};
pub use error::{CedulaError, RecordError, ReferenceError};
pub use reference::{Pool, ReferenceData, ReferenceSources, SourceId};
pub use types::{AGE_RANGE, Location, Record, Sex};
