//! Instrument identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced when building an [`InstrumentKey`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstrumentKeyError {
    /// Key was empty or whitespace only
    #[error("instrument key must not be empty")]
    Empty,
}

/// Identifier of the market instrument being watched (e.g. "NIFTY")
///
/// Always non-empty and upper case. The signal service receives it verbatim
/// as the `symbol` query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InstrumentKey(String);

impl InstrumentKey {
    /// Validate and normalize a key
    pub fn new(raw: impl AsRef<str>) -> Result<Self, InstrumentKeyError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(InstrumentKeyError::Empty);
        }
        Ok(Self(trimmed.to_uppercase()))
    }

    /// Borrow the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for InstrumentKey {
    /// The instrument the dashboard opens on
    fn default() -> Self {
        Self("NIFTY".to_string())
    }
}

impl fmt::Display for InstrumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for InstrumentKey {
    type Err = InstrumentKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for InstrumentKey {
    type Error = InstrumentKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<InstrumentKey> for String {
    fn from(key: InstrumentKey) -> Self {
        key.0
    }
}
