//! Reference data: the name, surname and location lists records are drawn
//! from. Everything here is read once and immutable afterwards.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::error::ReferenceError;
use crate::types::{Location, Sex};

/// Identifies one of the four reference inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    MaleNames,
    FemaleNames,
    Surnames,
    Locations,
}

impl SourceId {
    pub const ALL: [Self; 4] = [
        Self::MaleNames,
        Self::FemaleNames,
        Self::Surnames,
        Self::Locations,
    ];

    /// Conventional file name inside a data directory.
    pub const fn default_file_name(self) -> &'static str {
        match self {
            Self::MaleNames => "nombres_hombres.txt",
            Self::FemaleNames => "nombres_mujeres.txt",
            Self::Surnames => "apellidos.txt",
            Self::Locations => "ubicaciones.csv",
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::MaleNames => "male_names",
            Self::FemaleNames => "female_names",
            Self::Surnames => "surnames",
            Self::Locations => "locations",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Paths of the four reference inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSources {
    pub male_names: PathBuf,
    pub female_names: PathBuf,
    pub surnames: PathBuf,
    pub locations: PathBuf,
}

impl ReferenceSources {
    /// Resolve the conventional file names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            male_names: dir.join(SourceId::MaleNames.default_file_name()),
            female_names: dir.join(SourceId::FemaleNames.default_file_name()),
            surnames: dir.join(SourceId::Surnames.default_file_name()),
            locations: dir.join(SourceId::Locations.default_file_name()),
        }
    }

    pub fn path(&self, id: SourceId) -> &Path {
        match id {
            SourceId::MaleNames => &self.male_names,
            SourceId::FemaleNames => &self.female_names,
            SourceId::Surnames => &self.surnames,
            SourceId::Locations => &self.locations,
        }
    }
}

/// Non-empty, immutable, indexed sequence supporting uniform draws with
/// replacement. Clones share the same backing slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pool<T> {
    values: Arc<[T]>,
}

impl<T> Pool<T> {
    /// Returns `None` for an empty input.
    pub fn new(values: Vec<T>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        Some(Self {
            values: values.into(),
        })
    }

    /// Uniform draw; never fails because the pool is non-empty.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> &T {
        let idx = rng.random_range(0..self.values.len());
        &self.values[idx]
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.values
    }
}

impl<T: PartialEq> Pool<T> {
    pub fn contains(&self, value: &T) -> bool {
        self.values.contains(value)
    }
}

/// The loaded reference lists. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    male_names: Pool<String>,
    female_names: Pool<String>,
    surnames: Pool<String>,
    locations: Pool<Location>,
}

impl ReferenceData {
    /// Read all four inputs, failing on the first unreadable or empty one.
    pub fn load(sources: &ReferenceSources) -> Result<Self, ReferenceError> {
        let male_names = read_lines(SourceId::MaleNames, &sources.male_names)?;
        let female_names = read_lines(SourceId::FemaleNames, &sources.female_names)?;
        let surnames = read_lines(SourceId::Surnames, &sources.surnames)?;
        let locations = read_locations(&sources.locations)?;
        Self::from_parts(male_names, female_names, surnames, locations)
    }

    /// Build from in-memory lists with the same emptiness rules as `load`.
    /// Name entries are trimmed and blank ones dropped.
    pub fn from_parts(
        male_names: Vec<String>,
        female_names: Vec<String>,
        surnames: Vec<String>,
        locations: Vec<Location>,
    ) -> Result<Self, ReferenceError> {
        let data = Self {
            male_names: name_pool(SourceId::MaleNames, male_names)?,
            female_names: name_pool(SourceId::FemaleNames, female_names)?,
            surnames: name_pool(SourceId::Surnames, surnames)?,
            locations: Pool::new(locations).ok_or(ReferenceError::Empty {
                source_id: SourceId::Locations,
            })?,
        };

        for id in SourceId::ALL {
            debug!(source = %id, entries = data.entries(id), "reference source loaded");
        }
        Ok(data)
    }

    /// Given-name pool for `sex`.
    pub fn given_names(&self, sex: Sex) -> &Pool<String> {
        match sex {
            Sex::Male => &self.male_names,
            Sex::Female => &self.female_names,
        }
    }

    pub fn surnames(&self) -> &Pool<String> {
        &self.surnames
    }

    pub fn locations(&self) -> &Pool<Location> {
        &self.locations
    }

    /// Number of entries loaded for `id`.
    pub fn entries(&self, id: SourceId) -> usize {
        match id {
            SourceId::MaleNames => self.male_names.len(),
            SourceId::FemaleNames => self.female_names.len(),
            SourceId::Surnames => self.surnames.len(),
            SourceId::Locations => self.locations.len(),
        }
    }
}

fn name_pool(source_id: SourceId, values: Vec<String>) -> Result<Pool<String>, ReferenceError> {
    let values = values
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect();
    Pool::new(values).ok_or(ReferenceError::Empty { source_id })
}

fn read_lines(source_id: SourceId, path: &Path) -> Result<Vec<String>, ReferenceError> {
    let contents = fs::read_to_string(path).map_err(|cause| ReferenceError::Unreadable {
        source_id,
        path: path.to_path_buf(),
        cause,
    })?;

    Ok(contents
        .trim_start_matches('\u{feff}')
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Rows with fewer than three columns, or a blank province, canton or
/// parish, are skipped. Extra columns are ignored.
fn read_locations(path: &Path) -> Result<Vec<Location>, ReferenceError> {
    let unreadable = |err: csv::Error| ReferenceError::Unreadable {
        source_id: SourceId::Locations,
        path: path.to_path_buf(),
        cause: err.into(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(unreadable)?;

    let mut locations = Vec::new();
    let mut skipped = 0_usize;
    for row in reader.records() {
        let row = row.map_err(unreadable)?;
        let location = match (row.get(0), row.get(1), row.get(2)) {
            (Some(province), Some(canton), Some(parish)) => {
                Location::new(province, canton, parish)
            }
            _ => None,
        };
        match location {
            Some(location) => locations.push(location),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!(path = %path.display(), skipped, "skipped incomplete location rows");
    }
    Ok(locations)
}
