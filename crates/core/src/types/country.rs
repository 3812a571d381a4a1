//! Country codes used to pick a commerce region.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`CountryCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CountryCodeError {
    /// The input is empty (after trimming).
    #[error("country code cannot be empty")]
    Empty,
    /// The input is not a two-letter ASCII code.
    #[error("country code must be two ASCII letters, got {0:?}")]
    Malformed(String),
}

/// Lowercase ISO 3166-1 alpha-2 style country code (`"uk"`, `"us"`, `"de"`).
///
/// Input is case-insensitive; the stored form is always lowercase so that
/// `"UK"` and `"uk"` share a cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

impl CountryCode {
    /// Parse a country code.
    ///
    /// # Errors
    ///
    /// Returns [`CountryCodeError::Empty`] for blank input and
    /// [`CountryCodeError::Malformed`] for anything other than two letters.
    pub fn parse(s: &str) -> Result<Self, CountryCodeError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CountryCodeError::Empty);
        }
        if s.len() != 2 || !s.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CountryCodeError::Malformed(s.to_owned()));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// Returns the lowercase code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CountryCode {
    type Err = CountryCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CountryCode {
    type Error = CountryCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CountryCode> for String {
    fn from(code: CountryCode) -> Self {
        code.0
    }
}
