//! Core types for learner progress tracking.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProgressError;

/// Learner's self-reported difficulty for one review attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Wire name of the difficulty.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    /// Whether the attempt counts as correct for accuracy.
    pub fn is_correct(self) -> bool {
        !matches!(self, Self::Hard)
    }
}

impl FromStr for Difficulty {
    type Err = ProgressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(ProgressError::InvalidDifficulty(other.to_string())),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of lesson content a review item points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Vocabulary,
    Letter,
}

impl ContentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vocabulary => "vocabulary",
            Self::Letter => "letter",
        }
    }

    pub fn parse_kind(s: &str) -> Option<Self> {
        match s {
            "vocabulary" => Some(Self::Vocabulary),
            "letter" => Some(Self::Letter),
            _ => None,
        }
    }
}

/// Reference to a vocabulary or letter entry owned by the content catalogue.
///
/// Rendered as `kind:id`, e.g. `vocabulary:42`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentRef {
    pub kind: ContentKind,
    pub id: i64,
}

impl ContentRef {
    pub fn new(kind: ContentKind, id: i64) -> Self {
        Self { kind, id }
    }

    pub fn vocabulary(id: i64) -> Self {
        Self::new(ContentKind::Vocabulary, id)
    }

    pub fn letter(id: i64) -> Self {
        Self::new(ContentKind::Letter, id)
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.id)
    }
}

impl FromStr for ContentRef {
    type Err = ProgressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ProgressError::InvalidContentRef(s.to_string());
        let (kind, id) = s.split_once(':').ok_or_else(invalid)?;
        let kind = ContentKind::parse_kind(kind.trim()).ok_or_else(invalid)?;
        let id = id.trim().parse::<i64>().map_err(|_| invalid())?;
        Ok(Self { kind, id })
    }
}

impl TryFrom<String> for ContentRef {
    type Error = ProgressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ContentRef> for String {
    fn from(value: ContentRef) -> Self {
        value.to_string()
    }
}

/// Scheduling state for one content item a learner has seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewItem {
    pub content_ref: ContentRef,
    pub mastery_level: u8,
    pub next_review_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub correct_answers: u32,
    pub total_attempts: u32,
}

impl ReviewItem {
    /// Fresh item for content entering its first session.
    pub fn new(content_ref: ContentRef, now: DateTime<Utc>) -> Self {
        Self {
            content_ref,
            mastery_level: 0,
            next_review_at: now,
            last_reviewed_at: None,
            correct_answers: 0,
            total_attempts: 0,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.next_review_at
    }

    /// Fraction of attempts judged correct, `None` before the first attempt.
    pub fn accuracy(&self) -> Option<f64> {
        if self.total_attempts == 0 {
            None
        } else {
            Some(f64::from(self.correct_answers) / f64::from(self.total_attempts))
        }
    }

    /// Repair a persisted item so it satisfies the level and counter invariants.
    ///
    /// Every repair is logged; out-of-range rows are never trusted as-is.
    pub fn sanitized(mut self, max_level: u8) -> Self {
        if self.mastery_level > max_level {
            tracing::warn!(
                content = %self.content_ref,
                mastery_level = self.mastery_level,
                max_level,
                "mastery level out of range, clamping"
            );
            self.mastery_level = max_level;
        }
        if self.correct_answers > self.total_attempts {
            tracing::warn!(
                content = %self.content_ref,
                correct_answers = self.correct_answers,
                total_attempts = self.total_attempts,
                "correct answers exceed attempts, clamping"
            );
            self.correct_answers = self.total_attempts;
        }
        self
    }
}

/// Counters for one run of the session runner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Judgments submitted so far.
    pub reviewed: u32,
    /// Judgments other than `hard`.
    pub correct: u32,
    /// Size of the working set.
    pub total: u32,
}

impl SessionStats {
    pub fn accuracy(&self) -> Option<f64> {
        if self.reviewed == 0 {
            None
        } else {
            Some(f64::from(self.correct) / f64::from(self.reviewed))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn difficulty_parses_wire_names() {
        assert_eq!("easy".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert_eq!("medium".parse::<Difficulty>().unwrap(), Difficulty::Medium);
        assert_eq!("hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert_eq!(
            "Easy".parse::<Difficulty>(),
            Err(ProgressError::InvalidDifficulty("Easy".to_string()))
        );
    }

    #[test]
    fn only_hard_is_incorrect() {
        assert!(Difficulty::Easy.is_correct());
        assert!(Difficulty::Medium.is_correct());
        assert!(!Difficulty::Hard.is_correct());
    }

    #[test]
    fn difficulty_serde_uses_lowercase() {
        let json = serde_json::to_string(&Difficulty::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
        assert!(serde_json::from_str::<Difficulty>("\"impossible\"").is_err());
    }

    #[test]
    fn content_ref_display_and_parse() {
        let r = ContentRef::vocabulary(42);
        assert_eq!(r.to_string(), "vocabulary:42");
        assert_eq!("letter:7".parse::<ContentRef>().unwrap(), ContentRef::letter(7));
        assert!("word:1".parse::<ContentRef>().is_err());
        assert!("letter".parse::<ContentRef>().is_err());
        assert!("letter:x".parse::<ContentRef>().is_err());
    }

    #[test]
    fn content_ref_serializes_as_string() {
        let json = serde_json::to_string(&ContentRef::letter(3)).unwrap();
        assert_eq!(json, "\"letter:3\"");
        let back: ContentRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ContentRef::letter(3));
    }

    #[test]
    fn new_item_is_due_immediately() {
        let item = ReviewItem::new(ContentRef::letter(1), now());
        assert_eq!(item.mastery_level, 0);
        assert_eq!(item.total_attempts, 0);
        assert_eq!(item.last_reviewed_at, None);
        assert!(item.is_due(now()));
        assert!(!item.is_due(now() - Duration::seconds(1)));
        assert_eq!(item.accuracy(), None);
    }

    #[test]
    fn sanitized_clamps_out_of_range_rows() {
        let item = ReviewItem {
            mastery_level: 9,
            correct_answers: 7,
            total_attempts: 4,
            ..ReviewItem::new(ContentRef::vocabulary(5), now())
        };
        let fixed = item.sanitized(5);
        assert_eq!(fixed.mastery_level, 5);
        assert_eq!(fixed.correct_answers, 4);
        assert_eq!(fixed.total_attempts, 4);
    }

    #[test]
    fn sanitized_keeps_valid_rows() {
        let item = ReviewItem {
            mastery_level: 3,
            correct_answers: 2,
            total_attempts: 4,
            ..ReviewItem::new(ContentRef::vocabulary(5), now())
        };
        assert_eq!(item.clone().sanitized(5), item);
    }

    #[test]
    fn stats_accuracy() {
        assert_eq!(SessionStats::default().accuracy(), None);
        let stats = SessionStats {
            reviewed: 4,
            correct: 3,
            total: 5,
        };
        assert_eq!(stats.accuracy(), Some(0.75));
    }
}
