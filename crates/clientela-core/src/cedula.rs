use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::CedulaError;

/// Number of digits in a cédula, check digit included.
pub const CEDULA_LEN: usize = 10;

/// Valid two-digit province prefixes.
pub const PROVINCE_CODES: RangeInclusive<u8> = 1..=24;

/// Third digits reserved for natural persons. Entity ranges (6, 9) are never
/// produced.
pub const PERSON_THIRD_DIGITS: RangeInclusive<u8> = 0..=5;

const SEQUENCE_MAX: u32 = 999_999;

/// A structurally valid Ecuadorian national identifier.
///
/// Values only come from [`Cedula::generate`] or [`Cedula::parse`], so every
/// instance carries a correct check digit. Nothing here implies that the
/// number belongs to a real person or is unique within a run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cedula(String);

impl Cedula {
    /// Draw a random cédula: province 01-24, third digit 0-5, six-digit
    /// sequence, then the check digit.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let province: u8 = rng.random_range(PROVINCE_CODES);
        let third: u8 = rng.random_range(PERSON_THIRD_DIGITS);
        let mut sequence: u32 = rng.random_range(0..=SEQUENCE_MAX);

        let mut base = [0_u8; CEDULA_LEN - 1];
        base[0] = province / 10;
        base[1] = province % 10;
        base[2] = third;
        for slot in base[3..].iter_mut().rev() {
            *slot = (sequence % 10) as u8;
            sequence /= 10;
        }

        Self::from_base(&base)
    }

    /// Validate a textual cédula. Surrounding whitespace is ignored.
    pub fn parse(value: &str) -> Result<Self, CedulaError> {
        let value = value.trim();
        let found = value.chars().count();
        if found != CEDULA_LEN {
            return Err(CedulaError::Length { found });
        }

        let mut digits = [0_u8; CEDULA_LEN];
        for (slot, ch) in digits.iter_mut().zip(value.chars()) {
            let digit = ch.to_digit(10).ok_or(CedulaError::NonDigit { found: ch })?;
            *slot = digit as u8;
        }

        let code = digits[0] * 10 + digits[1];
        if !PROVINCE_CODES.contains(&code) {
            return Err(CedulaError::Province { code });
        }
        if !PERSON_THIRD_DIGITS.contains(&digits[2]) {
            return Err(CedulaError::ThirdDigit { digit: digits[2] });
        }

        let mut base = [0_u8; CEDULA_LEN - 1];
        base.copy_from_slice(&digits[..CEDULA_LEN - 1]);
        let expected = check_digit(&base);
        let found = digits[CEDULA_LEN - 1];
        if expected != found {
            return Err(CedulaError::Checksum { expected, found });
        }

        Ok(Self(value.to_string()))
    }

    /// Returns true when `value` parses as a valid cédula.
    pub fn is_valid(value: &str) -> bool {
        Self::parse(value).is_ok()
    }

    /// Two-digit province prefix (1-24).
    pub fn province_code(&self) -> u8 {
        let bytes = self.0.as_bytes();
        (bytes[0] - b'0') * 10 + (bytes[1] - b'0')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_base(base: &[u8; CEDULA_LEN - 1]) -> Self {
        let check = check_digit(base);
        let text = base
            .iter()
            .chain(std::iter::once(&check))
            .map(|digit| char::from(b'0' + digit))
            .collect();
        Self(text)
    }
}

/// Check digit for a nine-digit base.
///
/// Positions are 1-based: odd positions are doubled (minus 9 when the result
/// exceeds 9), even positions count as-is. The digit is the distance from the
/// sum to the next multiple of ten. Every element of `base` must be 0-9.
pub fn check_digit(base: &[u8; CEDULA_LEN - 1]) -> u8 {
    let sum: u32 = base
        .iter()
        .enumerate()
        .map(|(idx, digit)| {
            let value = u32::from(*digit);
            if idx % 2 == 0 {
                let doubled = value * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                value
            }
        })
        .sum();

    let remainder = sum % 10;
    if remainder == 0 {
        0
    } else {
        (10 - remainder) as u8
    }
}

impl fmt::Display for Cedula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Cedula {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Cedula {
    type Err = CedulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Cedula {
    type Error = CedulaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Cedula> for String {
    fn from(value: Cedula) -> Self {
        value.0
    }
}
