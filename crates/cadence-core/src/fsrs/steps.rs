//! Short-term learning steps
//!
//! Cards in `learning` or `relearning` are re-queued after minute-scale steps
//! until they graduate into long-term review.

use super::scheduler::Rating;

/// What the step sequence says about a rating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StepOutcome {
    /// Stay in short-term learning, due again after this many minutes
    Minutes(u32),
    /// Leave the step sequence and schedule in whole days
    Graduate,
}

/// Resolve a rating against a step sequence.
///
/// `cursor` is the index of the step the card is currently on. Again always
/// returns to the first step; Hard repeats the current step (the first one
/// with a modest increase); Good moves to the following step when there is
/// one.
pub(crate) fn resolve(steps: &[u32], cursor: usize, rating: Rating) -> StepOutcome {
    let Some(&first) = steps.first() else {
        return StepOutcome::Graduate;
    };

    match rating {
        Rating::Again => StepOutcome::Minutes(first),
        Rating::Hard => match cursor {
            0 => StepOutcome::Minutes(hard_minutes(steps, first)),
            _ => StepOutcome::Minutes(steps.get(cursor).copied().unwrap_or(first)),
        },
        Rating::Good => match steps.get(cursor + 1) {
            Some(&next) => StepOutcome::Minutes(next),
            None => StepOutcome::Graduate,
        },
        Rating::Easy => StepOutcome::Graduate,
    }
}

/// Step a card is sitting on, recovered from the length of the interval it
/// was last given.
///
/// A length that matches no step (or a card placed in whole days) counts as
/// the last step, so Good graduates it.
pub(crate) fn current_step(steps: &[u32], interval_minutes: Option<i64>) -> usize {
    let last = steps.len().saturating_sub(1);
    let Some(minutes) = interval_minutes else {
        return last;
    };

    if let Some(index) = steps.iter().position(|&step| i64::from(step) == minutes) {
        return index;
    }
    match steps.first() {
        Some(&first) if i64::from(hard_minutes(steps, first)) == minutes => 0,
        _ => last,
    }
}

/// Hard sits halfway between the first two steps, or 1.5x a lone step.
fn hard_minutes(steps: &[u32], first: u32) -> u32 {
    let minutes = match steps.get(1) {
        Some(&second) => (f64::from(first) + f64::from(second)) / 2.0,
        None => f64::from(first) * 1.5,
    };
    minutes.round() as u32
}
