//! Wire Records
//!
//! camelCase JSON records exchanged with the study application and its
//! persistence layer, and their conversion to and from scheduler types.
//! Ratings travel as integers and card states as lowercase strings; both are
//! validated here before anything reaches the scheduler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::fsrs::{Rating, ReviewLogEntry, Scheduler, SchedulerError, SchedulingState};

// ============================================================================
// TIMESTAMPS
// ============================================================================

/// RFC 3339 with millisecond precision and a `Z` suffix, as the application
/// stores timestamps.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        DateTime::<Utc>::deserialize(deserializer)
    }

    pub mod option {
        use chrono::{DateTime, SecondsFormat, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(ts) => serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            Option::<DateTime<Utc>>::deserialize(deserializer)
        }
    }
}

fn counter(name: &str, value: i64) -> Result<u32, SchedulerError> {
    u32::try_from(value).map_err(|_| {
        SchedulerError::InvalidState(format!("{} must be a non-negative integer, got {}", name, value))
    })
}

// ============================================================================
// CARD SCHEDULING ROW
// ============================================================================

/// A card's scheduling row as the application stores and sends it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardScheduling {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(with = "iso_millis")]
    pub due: DateTime<Utc>,
    pub stability: f64,
    pub difficulty: f64,
    pub elapsed_days: i64,
    pub scheduled_days: i64,
    pub reps: i64,
    pub lapses: i64,
    pub state: String,
    #[serde(default, with = "iso_millis::option")]
    pub last_review: Option<DateTime<Utc>>,
    /// Tags of the joined card, when the caller includes them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(
        default,
        with = "iso_millis::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "iso_millis::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CardScheduling {
    /// Row for a freshly created card
    pub fn new_card(card_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        let mut row = Self::from_state(&SchedulingState::new(now));
        row.card_id = Some(card_id.into());
        row.created_at = Some(now);
        row.updated_at = Some(now);
        row
    }

    /// Row carrying only the scheduling fields of `state`
    pub fn from_state(state: &SchedulingState) -> Self {
        Self {
            id: None,
            card_id: None,
            user_id: None,
            due: state.due,
            stability: state.stability,
            difficulty: state.difficulty,
            elapsed_days: i64::from(state.elapsed_days),
            scheduled_days: i64::from(state.scheduled_days),
            reps: i64::from(state.reps),
            lapses: i64::from(state.lapses),
            state: state.state.as_str().to_string(),
            last_review: state.last_review,
            tags: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Validate and convert into the scheduler's state
    pub fn to_state(&self) -> Result<SchedulingState, SchedulerError> {
        let state = SchedulingState {
            due: self.due,
            stability: self.stability,
            difficulty: self.difficulty,
            elapsed_days: counter("elapsedDays", self.elapsed_days)?,
            scheduled_days: counter("scheduledDays", self.scheduled_days)?,
            reps: counter("reps", self.reps)?,
            lapses: counter("lapses", self.lapses)?,
            state: self.state.parse()?,
            last_review: self.last_review,
        };
        state.validate()?;
        Ok(state)
    }

    /// Write an update into this row, replacing the prior scheduling fields
    pub fn apply(&mut self, update: &SchedulingUpdate, now: DateTime<Utc>) {
        self.due = update.due;
        self.stability = update.stability;
        self.difficulty = update.difficulty;
        self.elapsed_days = update.elapsed_days;
        self.scheduled_days = update.scheduled_days;
        self.reps = update.reps;
        self.lapses = update.lapses;
        self.state = update.state.clone();
        self.last_review = update.last_review;
        self.updated_at = Some(now);
    }
}

/// Scheduling fields to write back after a review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingUpdate {
    #[serde(with = "iso_millis")]
    pub due: DateTime<Utc>,
    pub stability: f64,
    pub difficulty: f64,
    pub elapsed_days: i64,
    pub scheduled_days: i64,
    pub reps: i64,
    pub lapses: i64,
    pub state: String,
    #[serde(with = "iso_millis::option")]
    pub last_review: Option<DateTime<Utc>>,
}

impl From<&SchedulingState> for SchedulingUpdate {
    fn from(state: &SchedulingState) -> Self {
        Self {
            due: state.due,
            stability: state.stability,
            difficulty: state.difficulty,
            elapsed_days: i64::from(state.elapsed_days),
            scheduled_days: i64::from(state.scheduled_days),
            reps: i64::from(state.reps),
            lapses: i64::from(state.lapses),
            state: state.state.as_str().to_string(),
            last_review: state.last_review,
        }
    }
}

// ============================================================================
// REVIEW SUBMISSION
// ============================================================================

/// Body of a review submission: `{ scheduling, rating, durationMs }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub scheduling: CardScheduling,
    /// 1 = Again, 2 = Hard, 3 = Good, 4 = Easy
    pub rating: i64,
    /// Time spent on the card
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

/// Review history row appended after each committed review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLogRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub rating: Rating,
    /// State after the review
    pub state: String,
    #[serde(with = "iso_millis")]
    pub due: DateTime<Utc>,
    pub stability: f64,
    pub difficulty: f64,
    pub elapsed_days: i64,
    pub scheduled_days: i64,
    #[serde(default)]
    pub review_duration_ms: Option<u64>,
    #[serde(with = "iso_millis")]
    pub reviewed_at: DateTime<Utc>,
}

impl ReviewLogRecord {
    pub fn from_entry(
        entry: &ReviewLogEntry,
        scheduling: &CardScheduling,
        duration_ms: Option<u64>,
    ) -> Self {
        Self {
            card_id: scheduling.card_id.clone(),
            user_id: scheduling.user_id.clone(),
            rating: entry.rating,
            state: entry.state.as_str().to_string(),
            due: entry.due,
            stability: entry.stability,
            difficulty: entry.difficulty,
            elapsed_days: i64::from(entry.elapsed_days),
            scheduled_days: i64::from(entry.scheduled_days),
            review_duration_ms: duration_ms,
            reviewed_at: entry.reviewed_at,
        }
    }
}

/// Response to a review submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    pub success: bool,
    pub scheduling: SchedulingUpdate,
    pub review_log: ReviewLogRecord,
}

/// Validate a review submission and schedule it.
///
/// Produces the row update and the history row; persisting both is up to
/// the caller.
pub fn submit_review(
    scheduler: &Scheduler,
    request: &ReviewRequest,
    now: DateTime<Utc>,
) -> Result<ReviewOutcome, SchedulerError> {
    let rating = Rating::try_from(request.rating)?;
    let state = request.scheduling.to_state()?;
    let result = scheduler.schedule(&state, rating, now)?;

    info!(
        card_id = request.scheduling.card_id.as_deref().unwrap_or("-"),
        rating = %rating,
        state = %result.state.state,
        due = %result.state.due,
        "Review submitted"
    );

    Ok(ReviewOutcome {
        success: true,
        scheduling: SchedulingUpdate::from(&result.state),
        review_log: ReviewLogRecord::from_entry(&result.log, &request.scheduling, request.duration_ms),
    })
}

// ============================================================================
// PREVIEW
// ============================================================================

/// One rating button: `{ rating, label, interval, scheduling }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingOptionRecord {
    pub rating: Rating,
    pub label: String,
    pub interval: String,
    pub scheduling: SchedulingUpdate,
}

/// Preview all four ratings for a stored row
pub fn preview_options(
    scheduler: &Scheduler,
    scheduling: &CardScheduling,
    now: DateTime<Utc>,
) -> Result<Vec<SchedulingOptionRecord>, SchedulerError> {
    let state = scheduling.to_state()?;
    let options = scheduler.preview(&state, now)?;

    Ok(options
        .into_iter()
        .map(|option| SchedulingOptionRecord {
            rating: option.rating,
            label: option.label.to_string(),
            interval: option.interval,
            scheduling: SchedulingUpdate::from(&option.state),
        })
        .collect())
}

// ============================================================================
// TESTS
// ============================================================================
