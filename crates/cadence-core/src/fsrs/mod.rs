//! FSRS-6 (Free Spaced Repetition Scheduler) Module
//!
//! Memory-model based scheduling for flashcards.
//!
//! Reference: https://github.com/open-spaced-repetition/fsrs4anki
//!
//! ## Lifecycle
//! - `new` → `learning` (minute steps) → `review` (day intervals)
//! - `review` → `relearning` on a lapse, back to `review` on recovery
//!
//! ## Core Formulas:
//! - Retrievability: R = (1 + FACTOR * t / S)^(-w20) where FACTOR = 0.9^(-1/w20) - 1
//! - Interval: t = S/FACTOR * (R^(1/w20) - 1)

mod algorithm;
mod scheduler;
mod steps;

pub use algorithm::{
    clamp_difficulty,
    clamp_stability,
    curve_factor,
    decay,
    initial_difficulty,
    initial_stability,
    interval_modifier,
    next_difficulty,
    next_forget_stability,
    next_interval,
    next_recall_stability,
    next_short_term_stability,
    // Core functions
    retrievability,
    DEFAULT_MAXIMUM_INTERVAL,
    DEFAULT_RETENTION,
    // Constants
    FSRS6_WEIGHTS,
    MAX_DIFFICULTY,
    MAX_STABILITY,
    MIN_DIFFICULTY,
    MIN_STABILITY,
};

pub use scheduler::{
    CardState, Parameters, Rating, ReviewLogEntry, ReviewResult, Scheduler, SchedulerError,
    SchedulingOption, SchedulingState,
};
