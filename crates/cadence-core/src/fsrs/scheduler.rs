//! FSRS-6 Scheduler
//!
//! Turns a card's scheduling state plus a rating into the next scheduling
//! state and a review log entry. Holds parameters only; every call is fully
//! determined by its inputs.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::algorithm::{
    clamp_difficulty, clamp_stability, initial_difficulty, initial_stability, interval_modifier,
    next_difficulty, next_forget_stability, next_interval, next_recall_stability,
    next_short_term_stability, retrievability, round8, DEFAULT_MAXIMUM_INTERVAL,
    DEFAULT_RETENTION, FSRS6_WEIGHTS, MAX_DIFFICULTY, MIN_DIFFICULTY, MIN_STABILITY,
};
use super::steps::{self, StepOutcome};
use crate::interval::{format_delta, format_interval};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Scheduler error type. Both variants are caller errors.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchedulerError {
    /// Rating outside 1..=4
    #[error("Invalid rating: {0} (expected 1-4)")]
    InvalidRating(i64),
    /// Malformed or out-of-domain scheduling state
    #[error("Invalid scheduling state: {0}")]
    InvalidState(String),
}

// ============================================================================
// RATING
// ============================================================================

/// Review grade given by the learner
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub enum Rating {
    /// Forgot the card
    Again = 1,
    /// Recalled with serious difficulty
    Hard = 2,
    /// Recalled after some hesitation
    Good = 3,
    /// Recalled effortlessly
    Easy = 4,
}

impl Rating {
    /// All ratings in ascending order
    pub const ALL: [Rating; 4] = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];

    /// Convert from the numeric wire value
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            1 => Some(Rating::Again),
            2 => Some(Rating::Hard),
            3 => Some(Rating::Good),
            4 => Some(Rating::Easy),
            _ => None,
        }
    }

    /// Numeric wire value (1-4)
    pub fn value(self) -> u8 {
        self as u8
    }

    /// Button label
    pub fn label(self) -> &'static str {
        match self {
            Rating::Again => "Again",
            Rating::Hard => "Hard",
            Rating::Good => "Good",
            Rating::Easy => "Easy",
        }
    }

    pub(crate) fn as_index(self) -> usize {
        self as usize - 1
    }

    pub(crate) fn as_f64(self) -> f64 {
        f64::from(self.value())
    }
}

impl TryFrom<i64> for Rating {
    type Error = SchedulerError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Rating::from_i64(value).ok_or(SchedulerError::InvalidRating(value))
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> u8 {
        rating.value()
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// CARD STATE
// ============================================================================

/// FSRS lifecycle stage of a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardState {
    /// Never reviewed
    #[default]
    New,
    /// Working through the initial learning steps
    Learning,
    /// Long-term review, scheduled in days
    Review,
    /// Lapsed and working through relearning steps
    Relearning,
}

impl CardState {
    pub const ALL: [CardState; 4] = [
        CardState::New,
        CardState::Learning,
        CardState::Review,
        CardState::Relearning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CardState::New => "new",
            CardState::Learning => "learning",
            CardState::Review => "review",
            CardState::Relearning => "relearning",
        }
    }
}

impl FromStr for CardState {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(CardState::New),
            "learning" => Ok(CardState::Learning),
            "review" => Ok(CardState::Review),
            "relearning" => Ok(CardState::Relearning),
            other => Err(SchedulerError::InvalidState(format!(
                "unknown card state '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for CardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// PARAMETERS
// ============================================================================

/// Scheduler parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameters {
    /// FSRS-6 weights w0..w20
    pub weights: [f64; 21],
    /// Target recall probability at the due date
    pub desired_retention: f64,
    /// Longest interval in days
    pub maximum_interval: u32,
    /// Use the same-day stability formula for reviews on the day of the last one
    pub enable_short_term: bool,
    /// Learning steps for new cards, in minutes
    pub learning_steps: Vec<u32>,
    /// Relearning steps after a lapse, in minutes
    pub relearning_steps: Vec<u32>,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            weights: FSRS6_WEIGHTS,
            desired_retention: DEFAULT_RETENTION,
            maximum_interval: DEFAULT_MAXIMUM_INTERVAL,
            enable_short_term: true,
            learning_steps: vec![1, 10],
            relearning_steps: vec![10],
        }
    }
}

// ============================================================================
// SCHEDULING STATE
// ============================================================================

/// Per-card, per-user scheduling record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingState {
    /// When the card next becomes eligible for review
    pub due: DateTime<Utc>,
    /// Days until retrievability decays to 90%
    pub stability: f64,
    /// Intrinsic difficulty, 1.0 (easy) to 10.0 (hard); 0.0 before the first review
    pub difficulty: f64,
    /// Days since the previous review, measured at the last review
    pub elapsed_days: u32,
    /// Interval handed out at the last review (0 for minute steps)
    pub scheduled_days: u32,
    /// Successful reviews
    pub reps: u32,
    /// Again ratings while in review or relearning
    pub lapses: u32,
    pub state: CardState,
    pub last_review: Option<DateTime<Utc>>,
}

impl SchedulingState {
    /// Scheduling record for a freshly created card, due immediately
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            due: now,
            stability: 0.0,
            difficulty: 0.0,
            elapsed_days: 0,
            scheduled_days: 0,
            reps: 0,
            lapses: 0,
            state: CardState::New,
            last_review: None,
        }
    }

    /// True until the first review initializes the memory model
    pub fn has_no_memory(&self) -> bool {
        self.stability == 0.0 && self.difficulty == 0.0
    }

    /// Check the record is inside the scheduler's domain
    pub fn validate(&self) -> Result<(), SchedulerError> {
        for (name, value) in [("stability", self.stability), ("difficulty", self.difficulty)] {
            if !value.is_finite() || value < 0.0 {
                return Err(SchedulerError::InvalidState(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }

        if self.state != CardState::New && !self.has_no_memory() {
            if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&self.difficulty) {
                return Err(SchedulerError::InvalidState(format!(
                    "difficulty {} outside [{}, {}]",
                    self.difficulty, MIN_DIFFICULTY, MAX_DIFFICULTY
                )));
            }
            if self.stability < MIN_STABILITY {
                return Err(SchedulerError::InvalidState(format!(
                    "stability {} below minimum {}",
                    self.stability, MIN_STABILITY
                )));
            }
        }

        Ok(())
    }
}

// ============================================================================
// RESULTS
// ============================================================================

/// Immutable record of one committed review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLogEntry {
    pub rating: Rating,
    /// Lifecycle stage before the review
    pub previous_state: CardState,
    /// Lifecycle stage after the review
    pub state: CardState,
    pub due: DateTime<Utc>,
    pub stability: f64,
    pub difficulty: f64,
    pub elapsed_days: u32,
    pub scheduled_days: u32,
    pub reviewed_at: DateTime<Utc>,
}

/// Outcome of a committed review
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewResult {
    pub state: SchedulingState,
    pub log: ReviewLogEntry,
}

/// One entry of a preview, e.g. "Good / 3d"
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingOption {
    pub rating: Rating,
    pub label: &'static str,
    /// Relative label for `state.due - now`
    pub interval: String,
    pub state: SchedulingState,
}

#[derive(Debug, Clone, Copy)]
struct MemoryState {
    stability: f64,
    difficulty: f64,
}

// ============================================================================
// SCHEDULER
// ============================================================================

/// FSRS-6 scheduler
#[derive(Debug, Clone)]
pub struct Scheduler {
    params: Parameters,
    interval_modifier: f64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(Parameters::default())
    }
}

impl Scheduler {
    pub fn new(params: Parameters) -> Self {
        let interval_modifier = interval_modifier(&params.weights, params.desired_retention);
        Self {
            params,
            interval_modifier,
        }
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    /// Outcomes of all four ratings at `now`, in rating order. Commits nothing.
    pub fn preview(
        &self,
        card: &SchedulingState,
        now: DateTime<Utc>,
    ) -> Result<[SchedulingOption; 4], SchedulerError> {
        card.validate()?;

        let option = |rating: Rating| -> Result<SchedulingOption, SchedulerError> {
            let result = self.next_review(card, rating, now)?;
            Ok(SchedulingOption {
                rating,
                label: rating.label(),
                interval: format_interval(result.state.due, now),
                state: result.state,
            })
        };

        Ok([
            option(Rating::Again)?,
            option(Rating::Hard)?,
            option(Rating::Good)?,
            option(Rating::Easy)?,
        ])
    }

    /// [`Scheduler::preview`] at the current time
    pub fn preview_now(
        &self,
        card: &SchedulingState,
    ) -> Result<[SchedulingOption; 4], SchedulerError> {
        self.preview(card, Utc::now())
    }

    /// Apply one review. The caller persists `state` and appends `log`.
    pub fn schedule(
        &self,
        card: &SchedulingState,
        rating: Rating,
        now: DateTime<Utc>,
    ) -> Result<ReviewResult, SchedulerError> {
        card.validate()?;
        let result = self.next_review(card, rating, now)?;

        debug!(
            rating = %rating,
            from = %card.state,
            to = %result.state.state,
            stability = result.state.stability,
            difficulty = result.state.difficulty,
            scheduled_days = result.state.scheduled_days,
            "Scheduled review"
        );

        Ok(result)
    }

    /// [`Scheduler::schedule`] at the current time
    pub fn schedule_now(
        &self,
        card: &SchedulingState,
        rating: Rating,
    ) -> Result<ReviewResult, SchedulerError> {
        self.schedule(card, rating, Utc::now())
    }

    /// Current probability of recall; 0.0 for cards without a memory yet
    pub fn retrievability(&self, card: &SchedulingState, now: DateTime<Utc>) -> f64 {
        if card.state == CardState::New || card.has_no_memory() {
            return 0.0;
        }
        let elapsed = card
            .last_review
            .map(|last| (now - last).num_seconds() as f64 / 86_400.0)
            .unwrap_or(0.0);
        retrievability(&self.params.weights, elapsed, card.stability)
    }

    fn next_review(
        &self,
        card: &SchedulingState,
        rating: Rating,
        now: DateTime<Utc>,
    ) -> Result<ReviewResult, SchedulerError> {
        let w = &self.params.weights;
        let elapsed_days = elapsed_days(card, now);
        let t = f64::from(elapsed_days);

        let mut next = card.clone();
        next.elapsed_days = elapsed_days;
        next.last_review = Some(now);

        match card.state {
            CardState::New => {
                next.difficulty = clamp_difficulty(initial_difficulty(w, rating));
                next.stability = initial_stability(w, rating);
                let outcome = steps::resolve(&self.params.learning_steps, 0, rating);
                self.place(&mut next, outcome, CardState::Learning, now)?;
            }
            CardState::Learning => {
                self.set_memory(&mut next, self.next_memory(card, t, rating, None));
                let steps = &self.params.learning_steps;
                let cursor = steps::current_step(steps, step_minutes(card));
                let outcome = steps::resolve(steps, cursor, rating);
                self.place(&mut next, outcome, CardState::Learning, now)?;
            }
            CardState::Relearning => {
                self.set_memory(&mut next, self.next_memory(card, t, rating, None));
                let steps = &self.params.relearning_steps;
                let cursor = steps::current_step(steps, step_minutes(card));
                let outcome = steps::resolve(steps, cursor, rating);
                self.place(&mut next, outcome, CardState::Relearning, now)?;
            }
            CardState::Review => {
                let r = retrievability(w, t, card.stability);
                let memories = Rating::ALL.map(|g| self.next_memory(card, t, g, Some(r)));
                self.set_memory(&mut next, memories[rating.as_index()]);

                let [hard, good, easy] = self.review_intervals(&memories);
                match rating {
                    Rating::Again => {
                        let outcome = steps::resolve(&self.params.relearning_steps, 0, rating);
                        self.place(&mut next, outcome, CardState::Relearning, now)?;
                    }
                    Rating::Hard => schedule_days(&mut next, hard, now)?,
                    Rating::Good => schedule_days(&mut next, good, now)?,
                    Rating::Easy => schedule_days(&mut next, easy, now)?,
                }
            }
        }

        if rating != Rating::Again {
            next.reps = card.reps.saturating_add(1);
        }
        if rating == Rating::Again && matches!(card.state, CardState::Review | CardState::Relearning)
        {
            next.lapses = card.lapses.saturating_add(1);
        }

        let log = ReviewLogEntry {
            rating,
            previous_state: card.state,
            state: next.state,
            due: next.due,
            stability: next.stability,
            difficulty: next.difficulty,
            elapsed_days: next.elapsed_days,
            scheduled_days: next.scheduled_days,
            reviewed_at: now,
        };

        Ok(ReviewResult { state: next, log })
    }

    /// Memory-model update for a card that already has (or is getting) a memory
    fn next_memory(
        &self,
        card: &SchedulingState,
        elapsed_days: f64,
        rating: Rating,
        known_retrievability: Option<f64>,
    ) -> MemoryState {
        let w = &self.params.weights;

        if card.has_no_memory() {
            return MemoryState {
                stability: initial_stability(w, rating),
                difficulty: clamp_difficulty(initial_difficulty(w, rating)),
            };
        }

        let (s, d) = (card.stability, card.difficulty);
        let r = known_retrievability.unwrap_or_else(|| retrievability(w, elapsed_days, s));

        let mut stability = match rating {
            Rating::Again => {
                let (w17, w18) = if self.params.enable_short_term {
                    (w[17], w[18])
                } else {
                    (0.0, 0.0)
                };
                let floor = round8(s / (w17 * w18).exp()).max(MIN_STABILITY);
                floor.min(next_forget_stability(w, d, s, r))
            }
            _ => next_recall_stability(w, d, s, r, rating),
        };

        if elapsed_days == 0.0 && self.params.enable_short_term {
            stability = next_short_term_stability(w, s, rating);
        }

        MemoryState {
            stability: clamp_stability(stability),
            difficulty: next_difficulty(w, d, rating),
        }
    }

    /// Day intervals for Hard, Good and Easy, kept strictly ordered
    fn review_intervals(&self, memories: &[MemoryState; 4]) -> [u32; 3] {
        let interval = |m: &MemoryState| {
            next_interval(m.stability, self.interval_modifier, self.params.maximum_interval)
        };

        let maximum = self.params.maximum_interval.max(1);
        let mut hard = interval(&memories[1]);
        let mut good = interval(&memories[2]);
        hard = hard.min(good);
        good = good.max(hard + 1).min(maximum);
        let easy = interval(&memories[3]).max(good + 1).min(maximum);

        [hard, good, easy]
    }

    fn set_memory(&self, next: &mut SchedulingState, memory: MemoryState) {
        next.stability = memory.stability;
        next.difficulty = memory.difficulty;
    }

    /// Apply a step outcome: re-queue in minutes or graduate to review
    fn place(
        &self,
        next: &mut SchedulingState,
        outcome: StepOutcome,
        short_term_state: CardState,
        now: DateTime<Utc>,
    ) -> Result<(), SchedulerError> {
        match outcome {
            StepOutcome::Minutes(minutes) => {
                next.state = short_term_state;
                next.scheduled_days = 0;
                next.due = due_after(now, Duration::minutes(i64::from(minutes)))?;
                Ok(())
            }
            StepOutcome::Graduate => {
                let days = next_interval(
                    next.stability,
                    self.interval_modifier,
                    self.params.maximum_interval,
                );
                schedule_days(next, days, now)
            }
        }
    }
}

fn schedule_days(
    next: &mut SchedulingState,
    days: u32,
    now: DateTime<Utc>,
) -> Result<(), SchedulerError> {
    next.state = CardState::Review;
    next.scheduled_days = days;
    next.due = due_after(now, Duration::days(i64::from(days)))?;
    Ok(())
}

/// `now + delta`, rejecting review times too close to the end of the
/// representable calendar
fn due_after(now: DateTime<Utc>, delta: Duration) -> Result<DateTime<Utc>, SchedulerError> {
    now.checked_add_signed(delta).ok_or_else(|| {
        SchedulerError::InvalidState(format!(
            "due date {} after {} is out of range",
            format_delta(delta),
            now
        ))
    })
}

/// Length in minutes of the short-term interval a card was last given, or
/// `None` when it was scheduled in days or never reviewed
fn step_minutes(card: &SchedulingState) -> Option<i64> {
    if card.scheduled_days != 0 {
        return None;
    }
    let last = card.last_review?;
    let seconds = (card.due - last).num_seconds();
    Some((seconds as f64 / 60.0).round() as i64)
}

/// Whole UTC calendar days between the last review and `now`
fn elapsed_days(card: &SchedulingState, now: DateTime<Utc>) -> u32 {
    if card.state == CardState::New {
        return 0;
    }
    card.last_review
        .map(|last| {
            let days = (now.date_naive() - last.date_naive()).num_days().max(0);
            u32::try_from(days).unwrap_or(u32::MAX)
        })
        .unwrap_or(0)
}

// ============================================================================
// TESTS
// ============================================================================
