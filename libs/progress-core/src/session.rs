//! Review session runner.
//!
//! Walks a working set of review items earliest-due first, feeding each
//! judgment through the [`Scheduler`] and keeping per-session counters.
//! Holds only in-memory state; persisting the updated items is up to the
//! caller.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ProgressError, Result};
use crate::scheduler::{Scheduler, SchedulingResult};
use crate::types::{ContentRef, Difficulty, ReviewItem, SessionStats};

/// Working-set selection options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Drop items that are not yet due.
    #[serde(default)]
    pub due_only: bool,
    /// Keep at most this many items, earliest-due first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

/// What happened when a judgment was submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerOutcome {
    /// The item after scheduling.
    pub item: ReviewItem,
    pub result: SchedulingResult,
    pub stats: SessionStats,
    pub is_complete: bool,
}

/// One pass over a learner's working set.
#[derive(Debug, Clone)]
pub struct SessionRunner {
    scheduler: Scheduler,
    items: Vec<ReviewItem>,
    cursor: usize,
    stats: SessionStats,
}

impl SessionRunner {
    /// Start a session over persisted items plus content seen for the first time.
    pub fn new(
        scheduler: Scheduler,
        persisted: Vec<ReviewItem>,
        content: impl IntoIterator<Item = ContentRef>,
        now: DateTime<Utc>,
    ) -> Self {
        Self::with_options(scheduler, persisted, content, now, SessionOptions::default())
    }

    /// Start a session with working-set filtering.
    ///
    /// Persisted items come first in input order, followed by content refs
    /// that have no persisted item. Duplicates keep their first occurrence.
    /// The set is then stably sorted by `next_review_at`.
    pub fn with_options(
        scheduler: Scheduler,
        persisted: Vec<ReviewItem>,
        content: impl IntoIterator<Item = ContentRef>,
        now: DateTime<Utc>,
        options: SessionOptions,
    ) -> Self {
        let max_level = scheduler.max_level();
        let mut seen = HashSet::new();
        let mut items = Vec::with_capacity(persisted.len());

        for item in persisted {
            if seen.insert(item.content_ref) {
                items.push(item.sanitized(max_level));
            } else {
                tracing::warn!(content = %item.content_ref, "duplicate persisted item ignored");
            }
        }
        for content_ref in content {
            if seen.insert(content_ref) {
                items.push(ReviewItem::new(content_ref, now));
            }
        }

        items.sort_by_key(|item| item.next_review_at);
        if options.due_only {
            items.retain(|item| item.is_due(now));
        }
        if let Some(limit) = options.limit {
            items.truncate(limit);
        }

        let stats = SessionStats {
            total: u32::try_from(items.len()).unwrap_or(u32::MAX),
            ..SessionStats::default()
        };

        tracing::debug!(items = items.len(), ?options, "session started");

        Self {
            scheduler,
            items,
            cursor: 0,
            stats,
        }
    }

    /// Item awaiting a judgment, `None` once the session is complete.
    pub fn current_item(&self) -> Option<&ReviewItem> {
        self.items.get(self.cursor)
    }

    pub fn is_complete(&self) -> bool {
        self.cursor >= self.items.len()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Items still waiting for a judgment, including the current one.
    pub fn remaining(&self) -> usize {
        self.items.len().saturating_sub(self.cursor)
    }

    /// The whole working set in review order.
    pub fn items(&self) -> &[ReviewItem] {
        &self.items
    }

    /// Record a judgment for the current item and move on.
    ///
    /// Fails with [`ProgressError::EmptySession`] when the working set was
    /// empty and [`ProgressError::SessionComplete`] once every item has been
    /// answered.
    pub fn submit_answer(
        &mut self,
        difficulty: Difficulty,
        now: DateTime<Utc>,
    ) -> Result<AnswerOutcome> {
        let outcome = self.preview_answer(difficulty, now)?;
        self.commit_answer(&outcome)?;
        Ok(outcome)
    }

    /// Schedule the current item without advancing the session.
    ///
    /// Pair with [`commit_answer`](Self::commit_answer) once the outcome has
    /// been stored elsewhere.
    pub fn preview_answer(
        &self,
        difficulty: Difficulty,
        now: DateTime<Utc>,
    ) -> Result<AnswerOutcome> {
        if self.items.is_empty() {
            return Err(ProgressError::EmptySession);
        }
        let Some(current) = self.items.get(self.cursor) else {
            return Err(ProgressError::SessionComplete {
                reviewed: self.stats.reviewed,
            });
        };

        let mut item = current.clone();
        let result = self.scheduler.apply(&mut item, difficulty, now);

        let mut stats = self.stats;
        stats.reviewed += 1;
        if difficulty.is_correct() {
            stats.correct += 1;
        }

        Ok(AnswerOutcome {
            item,
            result,
            stats,
            is_complete: self.cursor + 1 >= self.items.len(),
        })
    }

    /// Advance past the current item using an outcome from
    /// [`preview_answer`](Self::preview_answer).
    ///
    /// Rejects outcomes computed for a different item or an earlier step.
    pub fn commit_answer(&mut self, outcome: &AnswerOutcome) -> Result<()> {
        let in_step = outcome.stats.reviewed == self.stats.reviewed + 1;
        let slot = self
            .items
            .get_mut(self.cursor)
            .filter(|current| in_step && current.content_ref == outcome.item.content_ref)
            .ok_or(ProgressError::StaleAnswer(outcome.item.content_ref))?;

        *slot = outcome.item.clone();
        self.cursor += 1;
        self.stats = outcome.stats;
        Ok(())
    }
}
