//! Mastery-level scheduler.
//!
//! Maps a current mastery level and a difficulty judgment to the next level
//! and the next due date, using a fixed [`IntervalTable`].

pub mod interval;

pub use interval::{IntervalTable, DEFAULT_INTERVAL_DAYS, MAX_INTERVAL_DAYS};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Difficulty, ReviewItem};

/// Result of scheduling an item after one judgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingResult {
    pub new_level: u8,
    pub interval_days: u32,
    pub next_review_at: DateTime<Utc>,
}

/// Lookup-table scheduler.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    table: IntervalTable,
}

impl Scheduler {
    pub fn new(table: IntervalTable) -> Self {
        Self { table }
    }

    pub fn max_level(&self) -> u8 {
        self.table.max_level()
    }

    /// Next level and due date for a judgment made at `now`.
    ///
    /// `hard` drops one level and then reads the interval one level lower
    /// still, so a miss at level 3 comes back after `table[1]` days.
    pub fn compute_next(
        &self,
        current_level: u8,
        difficulty: Difficulty,
        now: DateTime<Utc>,
    ) -> SchedulingResult {
        let max = self.max_level();
        let current = current_level.min(max);

        let (new_level, index) = match difficulty {
            Difficulty::Easy => {
                let new_level = current.saturating_add(1).min(max);
                (new_level, new_level)
            }
            Difficulty::Medium => (current, current),
            Difficulty::Hard => {
                let new_level = current.saturating_sub(1);
                (new_level, new_level.saturating_sub(1))
            }
        };

        let interval_days = self.table.days_at(index);
        SchedulingResult {
            new_level,
            interval_days,
            next_review_at: now + Duration::days(i64::from(interval_days)),
        }
    }

    /// Apply a judgment to an item in place.
    pub fn apply(
        &self,
        item: &mut ReviewItem,
        difficulty: Difficulty,
        now: DateTime<Utc>,
    ) -> SchedulingResult {
        let result = self.compute_next(item.mastery_level, difficulty, now);

        tracing::debug!(
            content = %item.content_ref,
            %difficulty,
            from_level = item.mastery_level,
            to_level = result.new_level,
            interval_days = result.interval_days,
            "scheduled review"
        );

        item.mastery_level = result.new_level;
        item.next_review_at = result.next_review_at;
        item.last_reviewed_at = Some(now);
        item.total_attempts = item.total_attempts.saturating_add(1);
        if difficulty.is_correct() {
            item.correct_answers = item.correct_answers.saturating_add(1);
        }

        result
    }
}
