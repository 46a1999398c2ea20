//! Band combinations and their canonical identity
//!
//! A combination is a non-empty set of bands. Its identity is the members in
//! ascending numeric order joined with `+`, so `{3,1}` and `{1,3}` are the
//! same combination (`"1+3"`). The `AUTO` sentinel lets the device pick its
//! own bands and is never decomposed into members.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::band::Band;
use crate::errors::SharedError;

/// Identity of the automatic-selection sentinel
pub const AUTO_IDENTITY: &str = "AUTO";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Members {
    Bands(Vec<Band>),
    Auto,
}

/// A canonical, order-independent set of bands evaluated together
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Combination(Members);

impl Combination {
    /// Build a combination from any ordering of bands; duplicates collapse
    pub fn new<I>(bands: I) -> Result<Self, SharedError>
    where
        I: IntoIterator<Item = Band>,
    {
        let mut members: Vec<Band> = bands.into_iter().collect();
        members.sort();
        members.dedup();

        if members.is_empty() {
            return Err(SharedError::InvalidCombination { input: String::new() });
        }

        Ok(Self(Members::Bands(members)))
    }

    pub fn single(band: Band) -> Self {
        Self(Members::Bands(vec![band]))
    }

    pub fn auto() -> Self {
        Self(Members::Auto)
    }

    pub fn is_auto(&self) -> bool {
        matches!(self.0, Members::Auto)
    }

    /// Member bands in canonical order (empty for `AUTO`)
    pub fn bands(&self) -> &[Band] {
        match &self.0 {
            Members::Bands(bands) => bands,
            Members::Auto => &[],
        }
    }

    /// Number of member bands, `None` for `AUTO`
    pub fn group_size(&self) -> Option<usize> {
        match &self.0 {
            Members::Bands(bands) => Some(bands.len()),
            Members::Auto => None,
        }
    }

    /// The only member of a singleton combination
    pub fn sole_band(&self) -> Option<Band> {
        match &self.0 {
            Members::Bands(bands) if bands.len() == 1 => Some(bands[0]),
            _ => None,
        }
    }

    pub fn contains(&self, band: Band) -> bool {
        self.bands().binary_search(&band).is_ok()
    }

    /// Canonical identity string used for all membership checks
    pub fn identity(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Members::Auto => f.write_str(AUTO_IDENTITY),
            Members::Bands(bands) => {
                for (idx, band) in bands.iter().enumerate() {
                    if idx > 0 {
                        f.write_str("+")?;
                    }
                    write!(f, "{band}")?;
                }
                Ok(())
            }
        }
    }
}

impl FromStr for Combination {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case(AUTO_IDENTITY) {
            return Ok(Self::auto());
        }

        let invalid = || SharedError::InvalidCombination { input: s.to_string() };
        let bands = trimmed
            .split('+')
            .map(|part| part.parse::<Band>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(bands).map_err(|_| invalid())
    }
}

impl TryFrom<String> for Combination {
    type Error = SharedError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Combination> for String {
    fn from(combination: Combination) -> Self {
        combination.identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bands(numbers: &[u16]) -> Vec<Band> {
        numbers.iter().copied().map(Band::new).collect()
    }

    #[test]
    fn test_identity_is_order_independent() {
        let a = Combination::new(bands(&[3, 1])).unwrap();
        let b = Combination::new(bands(&[1, 3])).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.identity(), "1+3");
    }

    #[test]
    fn test_identity_uses_numeric_not_lexical_order() {
        let combo = Combination::new(bands(&[20, 3])).unwrap();
        assert_eq!(combo.identity(), "3+20");
    }

    #[test]
    fn test_duplicates_collapse() {
        let combo = Combination::new(bands(&[7, 7])).unwrap();
        assert_eq!(combo.group_size(), Some(1));
        assert_eq!(combo.sole_band(), Some(Band::new(7)));
    }

    #[test]
    fn test_empty_is_rejected() {
        assert!(Combination::new(Vec::new()).is_err());
        assert!("".parse::<Combination>().is_err());
    }

    #[test]
    fn test_parse_round_trips_identity() {
        let combo: Combination = "B20+1+3".parse().unwrap();
        assert_eq!(combo.identity(), "1+3+20");
        assert!(combo.contains(Band::new(20)));
        assert!(!combo.contains(Band::new(7)));
    }

    #[test]
    fn test_auto_sentinel() {
        let auto: Combination = "auto".parse().unwrap();
        assert!(auto.is_auto());
        assert_eq!(auto.identity(), AUTO_IDENTITY);
        assert!(auto.bands().is_empty());
        assert_eq!(auto.group_size(), None);
        assert!(!auto.contains(Band::new(1)));
    }

    #[test]
    fn test_serde_uses_identity_string() {
        let combo = Combination::new(bands(&[3, 1])).unwrap();
        let json = serde_json::to_string(&combo).unwrap();
        assert_eq!(json, "\"1+3\"");
        let back: Combination = serde_json::from_str(&json).unwrap();
        assert_eq!(back, combo);
    }
}
