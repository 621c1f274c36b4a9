//! Type-safe region identifier.
//!
//! [`Region`] is a newtype over `u8` restricted to the closed set
//! `{1, 2, 3, 4}`. Construction is the only place a region is validated, so
//! every [`Region`] value reaching the counter store is already in range.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

/// Identifier of one of the four tracked occupancy zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Region(u8);

impl Region {
    /// Number of tracked regions.
    pub const COUNT: usize = 4;

    /// Lowest valid region id.
    pub const MIN: u8 = 1;

    /// Highest valid region id.
    pub const MAX: u8 = 4;

    /// Creates a region from a numeric id.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::InvalidRegion`] if `id` is outside `1..=4`.
    pub fn new(id: u8) -> Result<Self, TrackerError> {
        if (Self::MIN..=Self::MAX).contains(&id) {
            Ok(Self(id))
        } else {
            Err(TrackerError::InvalidRegion(id.to_string()))
        }
    }

    /// Parses a raw path segment such as `"3"`.
    ///
    /// Surrounding whitespace is not accepted; the segment must be a plain
    /// decimal integer in range.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::InvalidRegion`] for non-numeric input or ids
    /// outside `1..=4`.
    pub fn parse(raw: &str) -> Result<Self, TrackerError> {
        let id: i64 = raw
            .parse()
            .map_err(|_| TrackerError::InvalidRegion(raw.to_string()))?;
        u8::try_from(id)
            .map_err(|_| TrackerError::InvalidRegion(raw.to_string()))
            .and_then(Self::new)
    }

    /// Returns the numeric id (`1..=4`).
    #[must_use]
    pub const fn id(self) -> u8 {
        self.0
    }

    /// Returns the zero-based slot of this region in the counter array.
    #[must_use]
    pub const fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    /// Iterates over all regions in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (Self::MIN..=Self::MAX).map(Self)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Region {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<u8> for Region {
    type Error = TrackerError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl From<Region> for u8 {
    fn from(region: Region) -> Self {
        region.0
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn accepts_every_region_in_range() {
        for id in 1..=4u8 {
            let Ok(region) = Region::new(id) else {
                panic!("region {id} should be valid");
            };
            assert_eq!(region.id(), id);
            assert_eq!(region.index(), usize::from(id - 1));
        }
    }

    #[test]
    fn rejects_out_of_range_ids() {
        assert!(Region::new(0).is_err());
        assert!(Region::new(5).is_err());
        assert!(Region::new(u8::MAX).is_err());
    }

    #[test]
    fn parse_rejects_non_numeric_and_overflow() {
        for raw in ["abc", "", " 1", "1.0", "-1", "0", "5", "300", "99999999999999999999"] {
            assert!(Region::parse(raw).is_err(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn parse_accepts_plain_digits() {
        let Ok(region) = "2".parse::<Region>() else {
            panic!("2 should parse");
        };
        assert_eq!(region.id(), 2);
        assert_eq!(region.to_string(), "2");
    }

    #[test]
    fn invalid_region_error_keeps_raw_input() {
        let Err(TrackerError::InvalidRegion(raw)) = Region::parse("abc") else {
            panic!("expected InvalidRegion");
        };
        assert_eq!(raw, "abc");
    }

    #[test]
    fn all_yields_four_regions() {
        let ids: Vec<u8> = Region::all().map(Region::id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn serde_uses_plain_integer() {
        let Ok(region) = Region::new(3) else {
            panic!("3 should be valid");
        };
        assert_eq!(serde_json::to_string(&region).ok().as_deref(), Some("3"));
        assert!(serde_json::from_str::<Region>("7").is_err());
    }
}
