//! # Handler Priorities
//!
//! A small, closed ordering scale used as the sort key when handler plans are
//! baked. Lower weights dispatch first, so `Lowest` handlers observe an event
//! before anything else and `Highest` handlers get the final word.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Priority level of a handler operation.
///
/// Each level carries a fixed signed weight:
///
/// | Level     | Weight |
/// |-----------|--------|
/// | `Lowest`  | -64    |
/// | `Low`     | -32    |
/// | `Normal`  | 0      |
/// | `High`    | 32     |
/// | `Highest` | 64     |
///
/// Ordering (`Ord`) is defined by weight, which is also the dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Lowest,
    Low,
    #[default]
    Normal,
    High,
    Highest,
}

impl Priority {
    /// Every level, in dispatch order.
    pub const ALL: [Priority; 5] = [
        Priority::Lowest,
        Priority::Low,
        Priority::Normal,
        Priority::High,
        Priority::Highest,
    ];

    /// Returns the numeric weight of this level.
    #[inline]
    pub const fn weight(self) -> i8 {
        match self {
            Priority::Lowest => -64,
            Priority::Low => -32,
            Priority::Normal => 0,
            Priority::High => 32,
            Priority::Highest => 64,
        }
    }

    #[inline]
    pub fn is_higher_than(self, other: Priority) -> bool {
        self.weight() > other.weight()
    }

    #[inline]
    pub fn is_lower_than(self, other: Priority) -> bool {
        self.weight() < other.weight()
    }

    /// Lowercase level name, matching the serde representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Priority::Lowest => "lowest",
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Highest => "highest",
        }
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight().cmp(&other.weight())
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown priority name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown priority level: '{0}' (expected lowest, low, normal, high or highest)")]
pub struct ParsePriorityError(pub String);

impl FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParsePriorityError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_are_fixed() {
        let weights: Vec<i8> = Priority::ALL.iter().map(|p| p.weight()).collect();
        assert_eq!(weights, vec![-64, -32, 0, 32, 64]);
    }

    #[test]
    fn test_relational_comparisons() {
        assert!(Priority::High.is_higher_than(Priority::Normal));
        assert!(Priority::Lowest.is_lower_than(Priority::Low));
        assert!(!Priority::Normal.is_higher_than(Priority::Normal));
        assert!(!Priority::Normal.is_lower_than(Priority::Normal));
    }

    #[test]
    fn test_ordering_follows_weight() {
        let mut shuffled = vec![
            Priority::High,
            Priority::Lowest,
            Priority::Highest,
            Priority::Normal,
            Priority::Low,
        ];
        shuffled.sort();
        assert_eq!(shuffled, Priority::ALL.to_vec());
    }

    #[test]
    fn test_default_is_normal() {
        assert_eq!(Priority::default(), Priority::Normal);
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("HIGH".parse::<Priority>(), Ok(Priority::High));
        assert_eq!(" lowest ".parse::<Priority>(), Ok(Priority::Lowest));
        assert!("urgent".parse::<Priority>().is_err());
        assert_eq!(Priority::Highest.to_string(), "highest");
    }
}
