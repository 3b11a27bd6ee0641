use std::fmt;
use std::ops::RangeInclusive;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cedula::Cedula;
use crate::error::RecordError;

/// Inclusive age bounds of generated customers.
pub const AGE_RANGE: RangeInclusive<u8> = 18..=80;

/// Sex of a generated person. Selects the given-name pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Uniform draw between the two variants.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.random_bool(0.5) {
            Self::Male
        } else {
            Self::Female
        }
    }

    /// Fixed label written to the `sexo` column.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Male => "Masculino",
            Self::Female => "Femenino",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Province / canton / parish triple. All parts are trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "LocationParts")]
pub struct Location {
    province: String,
    canton: String,
    parish: String,
}

impl Location {
    /// Build a location, returning `None` when any part is blank after
    /// trimming.
    pub fn new(province: &str, canton: &str, parish: &str) -> Option<Self> {
        let (province, canton, parish) = (province.trim(), canton.trim(), parish.trim());
        if province.is_empty() || canton.is_empty() || parish.is_empty() {
            return None;
        }
        Some(Self {
            province: province.to_string(),
            canton: canton.to_string(),
            parish: parish.to_string(),
        })
    }

    pub fn province(&self) -> &str {
        &self.province
    }

    pub fn canton(&self) -> &str {
        &self.canton
    }

    pub fn parish(&self) -> &str {
        &self.parish
    }
}

#[derive(Deserialize)]
struct LocationParts {
    province: String,
    canton: String,
    parish: String,
}

impl TryFrom<LocationParts> for Location {
    type Error = RecordError;

    fn try_from(parts: LocationParts) -> Result<Self, Self::Error> {
        Self::new(&parts.province, &parts.canton, &parts.parish).ok_or(RecordError::BlankLocation)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / {}", self.province, self.canton, self.parish)
    }
}

/// One synthetic customer, the unit written to the output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub cedula: Cedula,
    pub given_name1: String,
    pub given_name2: String,
    pub surname1: String,
    pub surname2: String,
    pub sex: Sex,
    pub location: Location,
    pub age: u8,
    pub email: String,
}

impl Record {
    /// Check the field constraints every emitted record must satisfy.
    pub fn check(&self) -> Result<(), RecordError> {
        if !AGE_RANGE.contains(&self.age) {
            return Err(RecordError::Age { age: self.age });
        }
        let names = [
            ("given_name1", &self.given_name1),
            ("given_name2", &self.given_name2),
            ("surname1", &self.surname1),
            ("surname2", &self.surname2),
        ];
        if let Some((field, _)) = names.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(RecordError::BlankField { field: *field });
        }
        match self.email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
            _ => Err(RecordError::Email {
                email: self.email.clone(),
            }),
        }
    }
}
