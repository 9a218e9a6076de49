//! Scheduling tiers.
//!
//! The pool keeps one FIFO sequence per tier. The order `Low < Normal < High`
//! only decides which tier a worker looks at first; within a tier the
//! submission order is kept.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Priority tier a task is queued under.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// Runs only when neither `High` nor `Normal` work is pending
    Low,
    /// Standard tier; guaranteed a turn after a bounded run of `High` work
    #[default]
    Normal,
    /// Preferred tier
    High,
}

impl Priority {
    /// Every tier, lowest first.
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Normal, Priority::High];

    /// Lower-case name, as accepted by `FromStr`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known tier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown priority: {0}")]
pub struct ParsePriorityError(pub String);

impl FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            _ => Err(ParsePriorityError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        assert!(Priority::Low < Priority::Normal);
        assert!(Priority::Normal < Priority::High);
        assert_eq!(Priority::default(), Priority::Normal);
    }
}
