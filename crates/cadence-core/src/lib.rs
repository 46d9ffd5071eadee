//! # Cadence Core
//!
//! Spaced-repetition scheduling for vocabulary flashcards:
//!
//! - **FSRS-6**: 21-parameter memory model with learning and relearning steps
//! - **Preview**: all four rating outcomes with button labels ("10m", "3d")
//! - **Wire records**: the study application's camelCase JSON rows
//! - **Study helpers**: due queue, state distribution, accuracy, streaks
//!
//! The scheduler is a pure function of (state, rating, now). It performs no
//! I/O; persisting the updated state and appending the review log is the
//! caller's job.
//!
//! ## Quick Start
//!
//! ```rust
//! use cadence_core::{Rating, Scheduler, SchedulingState, CardState};
//! use chrono::Utc;
//!
//! let scheduler = Scheduler::default();
//! let now = Utc::now();
//! let card = SchedulingState::new(now);
//!
//! // Labels for the rating buttons
//! let options = scheduler.preview(&card, now)?;
//! assert_eq!(options[0].interval, "1m");
//!
//! // Commit a review
//! let result = scheduler.schedule(&card, Rating::Easy, now)?;
//! assert_eq!(result.state.state, CardState::Review);
//! # Ok::<(), cadence_core::SchedulerError>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod config;
pub mod fsrs;
pub mod interval;
pub mod study;
pub mod wire;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// FSRS-6 scheduler
pub use fsrs::{
    retrievability, CardState, Parameters, Rating, ReviewLogEntry, ReviewResult, Scheduler,
    SchedulerError, SchedulingOption, SchedulingState, FSRS6_WEIGHTS,
};

// Interval labels
pub use interval::{format_delta, format_interval};

// Configuration
pub use config::{ConfigError, SchedulerConfig};

// Wire records
pub use wire::{
    preview_options, submit_review, CardScheduling, ReviewLogRecord, ReviewOutcome,
    ReviewRequest, SchedulingOptionRecord, SchedulingUpdate,
};

// Study helpers
pub use study::{
    custom_queue, due_queue, review_streak, review_trend, state_distribution, today_summary,
    CustomStudyMode, DailyReviews, StateCount, StudyError, TodaySummary, CUSTOM_QUEUE_LIMIT,
    DEFAULT_QUEUE_LIMIT, DEFAULT_TREND_DAYS,
};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// FSRS algorithm generation implemented by the scheduler
pub const FSRS_VERSION: u8 = 6;

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        CardScheduling, CardState, Rating, ReviewRequest, Scheduler, SchedulerConfig,
        SchedulerError, SchedulingState,
    };
}
