//! Galaxy coordinates.
//!
//! A coordinate addresses one planet slot as `galaxy:system:position`. The
//! textual form is also the wire and storage form, so coordinates can be
//! used directly as JSON map keys in the global state blob.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors produced when parsing a coordinate string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoordinateError {
    /// The string did not have exactly three `:`-separated parts.
    #[error("coordinates must look like galaxy:system:position, got {0:?}")]
    Malformed(String),

    /// One of the parts was not a positive integer.
    #[error("invalid coordinate component {component:?} in {input:?}")]
    InvalidComponent {
        /// The offending component text.
        component: String,
        /// The full input string.
        input: String,
    },
}

/// A planet slot in the galaxy grid.
///
/// Ordering is lexicographic on `(galaxy, system, position)`, which makes
/// `BTreeMap<Coordinates, _>` iterate in map order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Coordinates {
    /// Galaxy number (1-based).
    pub galaxy: u32,
    /// Solar system number within the galaxy (1-based).
    pub system: u32,
    /// Planet position within the system (1-based).
    pub position: u32,
}

impl Coordinates {
    /// Create a coordinate triple.
    pub const fn new(galaxy: u32, system: u32, position: u32) -> Self {
        Self {
            galaxy,
            system,
            position,
        }
    }

    /// Abstract travel distance between two slots.
    ///
    /// Crossing galaxies dominates, then systems, then positions; a fleet
    /// sent to its own slot still travels a token distance.
    pub const fn distance_to(&self, other: &Self) -> u64 {
        if self.galaxy != other.galaxy {
            let delta = self.galaxy.abs_diff(other.galaxy) as u64;
            return delta.saturating_mul(20_000);
        }
        if self.system != other.system {
            let delta = self.system.abs_diff(other.system) as u64;
            return delta.saturating_mul(95).saturating_add(2_700);
        }
        if self.position != other.position {
            let delta = self.position.abs_diff(other.position) as u64;
            return delta.saturating_mul(5).saturating_add(1_000);
        }
        5
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.galaxy, self.system, self.position)
    }
}

impl FromStr for Coordinates {
    type Err = CoordinateError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut parts = input.trim().split(':');
        let (Some(g), Some(s), Some(p), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(CoordinateError::Malformed(input.to_owned()));
        };

        let parse = |component: &str| -> Result<u32, CoordinateError> {
            component
                .parse::<u32>()
                .ok()
                .filter(|v| *v > 0)
                .ok_or_else(|| CoordinateError::InvalidComponent {
                    component: component.to_owned(),
                    input: input.to_owned(),
                })
        };

        Ok(Self::new(parse(g)?, parse(s)?, parse(p)?))
    }
}

impl TryFrom<String> for Coordinates {
    type Error = CoordinateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Coordinates> for String {
    fn from(value: Coordinates) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn parses_and_displays() {
        let c: Coordinates = "1:42:7".parse().unwrap_or(Coordinates::new(0, 0, 0));
        assert_eq!(c, Coordinates::new(1, 42, 7));
        assert_eq!(c.to_string(), "1:42:7");
    }

    #[test]
    fn rejects_bad_input() {
        assert!("1:2".parse::<Coordinates>().is_err());
        assert!("1:2:3:4".parse::<Coordinates>().is_err());
        assert!("1:x:3".parse::<Coordinates>().is_err());
        assert!("0:1:1".parse::<Coordinates>().is_err());
    }

    #[test]
    fn serializes_as_string_map_key() {
        let mut map = BTreeMap::new();
        map.insert(Coordinates::new(2, 10, 4), 7_u32);
        let json = serde_json::to_string(&map).unwrap_or_default();
        assert_eq!(json, r#"{"2:10:4":7}"#);
        let back: BTreeMap<Coordinates, u32> = serde_json::from_str(&json).unwrap_or_default();
        assert_eq!(back, map);
    }

    #[test]
    fn distance_tiers() {
        let home = Coordinates::new(1, 10, 5);
        assert_eq!(home.distance_to(&home), 5);
        assert_eq!(home.distance_to(&Coordinates::new(1, 10, 8)), 1_015);
        assert_eq!(home.distance_to(&Coordinates::new(1, 12, 5)), 2_890);
        assert_eq!(home.distance_to(&Coordinates::new(3, 10, 5)), 40_000);
    }
}
