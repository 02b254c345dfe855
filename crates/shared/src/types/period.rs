//! Accounting period keys.
//!
//! A period is a (month, year) bucket. Keys order chronologically and roll
//! over at year boundaries.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error raised when constructing a period key from invalid parts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodKeyError {
    /// Month outside the 1-12 range.
    #[error("Invalid month: {0} (expected 1-12)")]
    InvalidMonth(u8),
}

/// A (month, year) accounting bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodKey {
    /// Calendar month, 1-12.
    pub month: u8,
    /// Calendar year.
    pub year: i32,
}

impl PeriodKey {
    /// Creates a period key, validating the month range.
    ///
    /// # Errors
    ///
    /// Returns `PeriodKeyError::InvalidMonth` if `month` is not in 1-12.
    pub const fn new(month: u8, year: i32) -> Result<Self, PeriodKeyError> {
        if month >= 1 && month <= 12 {
            Ok(Self { month, year })
        } else {
            Err(PeriodKeyError::InvalidMonth(month))
        }
    }

    /// The period immediately following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        if self.month == 12 {
            Self {
                month: 1,
                year: self.year + 1,
            }
        } else {
            Self {
                month: self.month + 1,
                year: self.year,
            }
        }
    }
}

impl Ord for PeriodKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.year, self.month).cmp(&(other.year, other.month))
    }
}

impl PartialOrd for PeriodKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_valid() {
        let key = PeriodKey::new(3, 2025).unwrap();
        assert_eq!(key.month, 3);
        assert_eq!(key.year, 2025);
    }

    #[test]
    fn test_new_invalid_month() {
        assert_eq!(PeriodKey::new(0, 2025), Err(PeriodKeyError::InvalidMonth(0)));
        assert_eq!(
            PeriodKey::new(13, 2025),
            Err(PeriodKeyError::InvalidMonth(13))
        );
    }

    #[test]
    fn test_next_within_year() {
        let key = PeriodKey::new(3, 2025).unwrap();
        assert_eq!(key.next(), PeriodKey::new(4, 2025).unwrap());
    }

    #[test]
    fn test_next_rolls_over_year() {
        let key = PeriodKey::new(12, 2025).unwrap();
        assert_eq!(key.next(), PeriodKey::new(1, 2026).unwrap());
    }

    #[test]
    fn test_ordering_is_chronological() {
        let dec_2024 = PeriodKey::new(12, 2024).unwrap();
        let jan_2025 = PeriodKey::new(1, 2025).unwrap();
        let mar_2025 = PeriodKey::new(3, 2025).unwrap();
        assert!(dec_2024 < jan_2025);
        assert!(jan_2025 < mar_2025);
    }

    #[test]
    fn test_display() {
        assert_eq!(PeriodKey::new(3, 2025).unwrap().to_string(), "03/2025");
        assert_eq!(PeriodKey::new(11, 2024).unwrap().to_string(), "11/2024");
    }
}
