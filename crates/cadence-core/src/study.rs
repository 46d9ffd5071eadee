//! Study queue and review statistics
//!
//! Aggregations the study screens run over rows fetched by the caller.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::fsrs::{CardState, Rating};
use crate::wire::{CardScheduling, ReviewLogRecord};

/// Cards fetched per study session
pub const DEFAULT_QUEUE_LIMIT: usize = 50;

/// Cards fetched per custom study session
pub const CUSTOM_QUEUE_LIMIT: usize = 200;

/// Days covered by the review trend unless asked otherwise
pub const DEFAULT_TREND_DAYS: u32 = 30;

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StudyError {
    #[error("Invalid custom study mode: '{0}' (expected all, failed, ahead or tags)")]
    InvalidMode(String),
}

// ============================================================================
// QUEUES
// ============================================================================

/// Cards due at `now`, earliest first, at most `limit`
pub fn due_queue(cards: &[CardScheduling], now: DateTime<Utc>, limit: usize) -> Vec<CardScheduling> {
    let mut due: Vec<CardScheduling> = cards.iter().filter(|c| c.due <= now).cloned().collect();
    due.sort_by_key(|c| c.due);
    due.truncate(limit);
    due
}

/// Which cards a custom study session draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomStudyMode {
    /// Every card, due or not
    #[default]
    All,
    /// Cards that have lapsed at least once
    Failed,
    /// Cards not yet due
    Ahead,
    /// Cards carrying any of the requested tags
    Tags,
}

impl CustomStudyMode {
    pub const ALL: [CustomStudyMode; 4] = [
        CustomStudyMode::All,
        CustomStudyMode::Failed,
        CustomStudyMode::Ahead,
        CustomStudyMode::Tags,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CustomStudyMode::All => "all",
            CustomStudyMode::Failed => "failed",
            CustomStudyMode::Ahead => "ahead",
            CustomStudyMode::Tags => "tags",
        }
    }
}

impl FromStr for CustomStudyMode {
    type Err = StudyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CustomStudyMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| StudyError::InvalidMode(s.to_string()))
    }
}

impl fmt::Display for CustomStudyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cards for a custom study session, oldest card first, at most `limit`.
///
/// In `Tags` mode a card matches when it carries any of `tags`; with no
/// usable tags the mode selects every card.
pub fn custom_queue(
    cards: &[CardScheduling],
    mode: CustomStudyMode,
    tags: &[String],
    now: DateTime<Utc>,
    limit: usize,
) -> Vec<CardScheduling> {
    let wanted: Vec<&str> = tags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();

    let mut selected: Vec<CardScheduling> = cards
        .iter()
        .filter(|card| match mode {
            CustomStudyMode::All => true,
            CustomStudyMode::Failed => card.lapses > 0,
            CustomStudyMode::Ahead => card.due > now,
            CustomStudyMode::Tags => {
                wanted.is_empty() || card.tags.iter().any(|t| wanted.contains(&t.as_str()))
            }
        })
        .cloned()
        .collect();

    // Rows without a creation time go last
    selected.sort_by_key(|c| (c.created_at.is_none(), c.created_at));
    selected.truncate(limit);
    selected
}

// ============================================================================
// STATISTICS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCount {
    pub state: CardState,
    pub count: usize,
}

/// Number of cards per state, in lifecycle order, skipping empty states
pub fn state_distribution<I>(states: I) -> Vec<StateCount>
where
    I: IntoIterator<Item = CardState>,
{
    let mut counts = [0usize; 4];
    for state in states {
        counts[state as usize] += 1;
    }

    CardState::ALL
        .into_iter()
        .zip(counts)
        .filter(|(_, count)| *count > 0)
        .map(|(state, count)| StateCount { state, count })
        .collect()
}

/// Reviews done today
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodaySummary {
    pub total_reviews: usize,
    /// Reviews rated Good or Easy
    pub correct_count: usize,
    /// Whole percent, 0 when nothing was reviewed
    pub accuracy: u32,
}

/// Summarize reviews at or after `day_start`
pub fn today_summary(logs: &[ReviewLogRecord], day_start: DateTime<Utc>) -> TodaySummary {
    let today: Vec<&ReviewLogRecord> = logs.iter().filter(|l| l.reviewed_at >= day_start).collect();
    let total_reviews = today.len();
    let correct_count = today.iter().filter(|l| l.rating >= Rating::Good).count();

    let accuracy = if total_reviews > 0 {
        (correct_count as f64 / total_reviews as f64 * 100.0).round() as u32
    } else {
        0
    };

    TodaySummary {
        total_reviews,
        correct_count,
        accuracy,
    }
}

/// Reviews per calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReviews {
    pub date: NaiveDate,
    pub count: usize,
    /// Reviews rated Good or Easy
    pub correct_count: usize,
}

/// One entry per day for the `days` days ending at `today`, oldest first.
/// Days without reviews are present with zero counts.
pub fn review_trend(logs: &[ReviewLogRecord], today: NaiveDate, days: u32) -> Vec<DailyReviews> {
    let mut trend: Vec<DailyReviews> = (0..days)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(u64::from(back))))
        .map(|date| DailyReviews {
            date,
            count: 0,
            correct_count: 0,
        })
        .collect();

    let Some(first) = trend.first().map(|d| d.date) else {
        return trend;
    };

    for log in logs {
        let offset = (log.reviewed_at.date_naive() - first).num_days();
        let Some(day) = usize::try_from(offset).ok().and_then(|i| trend.get_mut(i)) else {
            continue;
        };
        day.count += 1;
        if log.rating >= Rating::Good {
            day.correct_count += 1;
        }
    }

    trend
}

/// Consecutive days with at least one review.
///
/// Counting starts at `today`, or at yesterday when nothing has been
/// reviewed yet today, so an unfinished day does not break the streak.
/// Every review date passed in is considered; the streak is not bounded by
/// how many history rows the caller reads, so pass the full history (or at
/// least every day back to the first gap).
pub fn review_streak<I>(review_days: I, today: NaiveDate) -> u32
where
    I: IntoIterator<Item = NaiveDate>,
{
    let days: HashSet<NaiveDate> = review_days.into_iter().collect();
    if days.is_empty() {
        return 0;
    }

    let mut cursor = today;
    if !days.contains(&cursor) {
        match cursor.checked_sub_days(Days::new(1)) {
            Some(yesterday) => cursor = yesterday,
            None => return 0,
        }
    }

    let mut streak = 0;
    while days.contains(&cursor) {
        streak += 1;
        match cursor.checked_sub_days(Days::new(1)) {
            Some(previous) => cursor = previous,
            None => break,
        }
    }
    streak
}
