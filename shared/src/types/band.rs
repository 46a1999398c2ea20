//! Radio band identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{SharedError, SharedResult};

/// A single selectable radio band, identified by its band number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Band(u16);

impl Band {
    pub const fn new(number: u16) -> Self {
        Self(number)
    }

    pub fn number(&self) -> u16 {
        self.0
    }

    /// Parse a comma separated list such as `"1,3,B20"`, ignoring empty entries
    pub fn parse_list(input: &str) -> SharedResult<Vec<Band>> {
        input
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Band::from_str)
            .collect()
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Band {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('B')
            .or_else(|| trimmed.strip_prefix('b'))
            .unwrap_or(trimmed);

        match digits.parse::<u16>() {
            Ok(number) if number > 0 => Ok(Band(number)),
            _ => Err(SharedError::InvalidBand { input: s.to_string() }),
        }
    }
}

impl TryFrom<String> for Band {
    type Error = SharedError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Band> for String {
    fn from(band: Band) -> Self {
        band.to_string()
    }
}
