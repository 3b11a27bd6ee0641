use std::fmt;
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::{FailureKind, GenerationError};

/// Providers used when the domain policy is [`DomainPolicy::Random`].
pub const DEFAULT_DOMAINS: [&str; 3] = ["gmail.com", "hotmail.com", "yahoo.com"];

/// How many records a run should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetCount {
    /// Run until cancelled.
    Unbounded,
    Bounded(NonZeroU64),
}

impl TargetCount {
    /// `0` means unbounded.
    pub fn from_count(count: u64) -> Self {
        NonZeroU64::new(count).map_or(Self::Unbounded, Self::Bounded)
    }

    /// Parse user input as a non-negative integer.
    pub fn parse(value: &str) -> Result<Self, GenerationError> {
        let trimmed = value.trim();
        trimmed.parse::<u64>().map(Self::from_count).map_err(|_| {
            GenerationError::InvalidConfiguration(format!(
                "record count must be a non-negative integer (0 = unbounded), got {trimmed:?}"
            ))
        })
    }

    pub fn limit(self) -> Option<u64> {
        match self {
            Self::Unbounded => None,
            Self::Bounded(count) => Some(count.get()),
        }
    }

    pub fn is_reached(self, produced: u64) -> bool {
        self.limit().is_some_and(|limit| produced >= limit)
    }
}

impl FromStr for TargetCount {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TargetCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded => f.write_str("unbounded"),
            Self::Bounded(count) => write!(f, "{count}"),
        }
    }
}

/// Where generated email addresses are hosted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainPolicy {
    /// Uniform draw from [`DEFAULT_DOMAINS`] for every record.
    Random,
    /// Used verbatim.
    Fixed(String),
}

impl DomainPolicy {
    /// `"random"` (any case) selects [`DomainPolicy::Random`]; any other
    /// non-blank value is a fixed domain.
    pub fn parse(value: &str) -> Result<Self, GenerationError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(GenerationError::InvalidConfiguration(
                "email domain must not be blank".to_string(),
            ));
        }
        if trimmed.eq_ignore_ascii_case("random") {
            return Ok(Self::Random);
        }
        Ok(Self::Fixed(trimmed.to_string()))
    }

    pub fn resolve<'a, R: Rng + ?Sized>(&'a self, rng: &mut R) -> &'a str {
        match self {
            Self::Random => DEFAULT_DOMAINS[rng.random_range(0..DEFAULT_DOMAINS.len())],
            Self::Fixed(domain) => domain,
        }
    }
}

impl FromStr for DomainPolicy {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DomainPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Random => f.write_str("random"),
            Self::Fixed(domain) => f.write_str(domain),
        }
    }
}

/// A start request: what to generate and where to write it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationJob {
    pub target: TargetCount,
    pub domain: DomainPolicy,
    pub destination: PathBuf,
}

/// Options for the generation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Emit a progress event every this many records.
    pub progress_every: u64,
    /// Capacity of the worker-to-foreground event channel. `0` makes every
    /// authoritative event a rendezvous.
    pub channel_capacity: usize,
    /// Seed for the record generator; drawn from the OS when absent.
    pub seed: Option<u64>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            progress_every: 1000,
            channel_capacity: 1024,
            seed: None,
        }
    }
}

impl GenerateOptions {
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.progress_every == 0 {
            return Err(GenerationError::InvalidConfiguration(
                "progress interval must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    Completed,
    Cancelled,
    Failed,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Final status of a run, reported exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub final_count: u64,
    pub termination: Termination,
    /// Absent when the destination was never opened.
    pub destination: Option<PathBuf>,
    pub seed: u64,
    pub bytes_written: u64,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunSummary {
    /// One human-readable line describing the outcome.
    pub fn message(&self) -> String {
        match self.termination {
            Termination::Completed => format!(
                "generation completed: {} records written to {}",
                self.final_count,
                display_destination(self.destination.as_deref())
            ),
            Termination::Cancelled => format!(
                "generation cancelled: {} records written to {}",
                self.final_count,
                display_destination(self.destination.as_deref())
            ),
            Termination::Failed => format!(
                "generation failed after {} records: {}",
                self.final_count,
                self.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }

    /// Write the summary as pretty JSON.
    pub fn write_json(&self, path: &Path) -> Result<(), GenerationError> {
        let encoded = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, encoded).map_err(GenerationError::WriteFailure)
    }
}

fn display_destination(path: Option<&Path>) -> String {
    path.map_or_else(|| "<none>".to_string(), |path| path.display().to_string())
}
