//! Day intervals indexed by mastery level.

use std::str::FromStr;

use crate::error::{ProgressError, Result};

/// Default review cadence: level 0 waits one day, level 5 waits ninety.
pub const DEFAULT_INTERVAL_DAYS: [u32; 6] = [1, 3, 7, 14, 30, 90];

/// Longest interval a table may hold, roughly a century.
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

/// Ordered day counts, one per mastery level.
///
/// The table length fixes the highest reachable level (`len - 1`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalTable {
    days: Vec<u32>,
}

impl Default for IntervalTable {
    fn default() -> Self {
        Self {
            days: DEFAULT_INTERVAL_DAYS.to_vec(),
        }
    }
}

impl IntervalTable {
    /// Build a table, rejecting empty, zero-day, oversized or decreasing entries.
    pub fn new(days: Vec<u32>) -> Result<Self> {
        if days.is_empty() {
            return Err(ProgressError::EmptyIntervalTable);
        }
        let max = usize::from(u8::MAX) + 1;
        if days.len() > max {
            return Err(ProgressError::IntervalTableTooLong {
                len: days.len(),
                max,
            });
        }
        for (level, &d) in days.iter().enumerate() {
            if d == 0 {
                return Err(ProgressError::NonPositiveInterval { level });
            }
            if d > MAX_INTERVAL_DAYS {
                return Err(ProgressError::IntervalTooLong {
                    level,
                    days: d,
                    max: MAX_INTERVAL_DAYS,
                });
            }
            if level > 0 && d < days[level - 1] {
                return Err(ProgressError::DecreasingInterval { level });
            }
        }
        Ok(Self { days })
    }

    /// Highest mastery level the table can represent.
    pub fn max_level(&self) -> u8 {
        // Length is bounded to 1..=256 in `new`.
        (self.days.len() - 1) as u8
    }

    /// Interval for a level, clamped to the last entry.
    pub fn days_at(&self, level: u8) -> u32 {
        let index = usize::from(level.min(self.max_level()));
        self.days[index]
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.days
    }
}

impl FromStr for IntervalTable {
    type Err = ProgressError;

    /// Parse a comma-separated list such as `1,3,7,14,30,90`.
    fn from_str(s: &str) -> Result<Self> {
        let days = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<u32>()
                    .map_err(|_| ProgressError::InvalidInterval(part.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(days)
    }
}
