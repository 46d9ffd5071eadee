//! FSRS-6 memory model
//!
//! Pure formulas over the 21-weight parameter vector. Everything here is
//! stateless; the scheduler decides which formula applies to which review.

use super::scheduler::Rating;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Default FSRS-6 weights (w0..w20)
pub const FSRS6_WEIGHTS: [f64; 21] = [
    0.212, 1.2931, 2.3065, 8.2956, 6.4133, 0.8334, 3.0194, 0.001, 1.8722, 0.1666, 0.796, 1.4835,
    0.0614, 0.2629, 1.6483, 0.6014, 1.8729, 0.5425, 0.0912, 0.0658, 0.1542,
];

/// Target probability of recall when a review falls due
pub const DEFAULT_RETENTION: f64 = 0.9;

/// Longest interval the scheduler will hand out, in days
pub const DEFAULT_MAXIMUM_INTERVAL: u32 = 36500;

pub const MIN_STABILITY: f64 = 0.001;
pub const MAX_STABILITY: f64 = 36500.0;
pub const MIN_DIFFICULTY: f64 = 1.0;
pub const MAX_DIFFICULTY: f64 = 10.0;

/// Floor for the initial stability of a first review
const MIN_INITIAL_STABILITY: f64 = 0.1;

// ============================================================================
// HELPERS
// ============================================================================

/// Round to 8 decimal places, the precision persisted scheduling data carries.
pub(crate) fn round8(value: f64) -> f64 {
    (value * 1e8).round() / 1e8
}

/// Forgetting curve exponent (negative)
pub fn decay(w: &[f64; 21]) -> f64 {
    -w[20]
}

/// Curve scale chosen so that R(S, S) = 0.9
pub fn curve_factor(w: &[f64; 21]) -> f64 {
    0.9f64.powf(1.0 / decay(w)) - 1.0
}

// ============================================================================
// CORE FORMULAS
// ============================================================================

/// Probability of recall after `elapsed_days` for a memory of `stability`.
///
/// R(t, S) = (1 + FACTOR * t / S)^DECAY
pub fn retrievability(w: &[f64; 21], elapsed_days: f64, stability: f64) -> f64 {
    if stability <= 0.0 {
        return 0.0;
    }
    let elapsed = elapsed_days.max(0.0);
    round8((1.0 + curve_factor(w) * elapsed / stability).powf(decay(w)))
}

/// Ratio between the interval for `desired_retention` and the stability.
///
/// Equal to 1.0 at 90% retention.
pub fn interval_modifier(w: &[f64; 21], desired_retention: f64) -> f64 {
    round8((desired_retention.powf(1.0 / decay(w)) - 1.0) / curve_factor(w))
}

/// S0(G) = w[G-1], floored at 0.1
pub fn initial_stability(w: &[f64; 21], rating: Rating) -> f64 {
    w[rating.as_index()].max(MIN_INITIAL_STABILITY)
}

/// D0(G) = w4 - e^(w5 * (G - 1)) + 1
///
/// Not clamped: the Easy value doubles as the mean-reversion target and can
/// legitimately sit below the difficulty floor.
pub fn initial_difficulty(w: &[f64; 21], rating: Rating) -> f64 {
    let g = rating.as_f64();
    round8(w[4] - (w[5] * (g - 1.0)).exp() + 1.0)
}

pub fn clamp_difficulty(difficulty: f64) -> f64 {
    difficulty.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

pub fn clamp_stability(stability: f64) -> f64 {
    stability.clamp(MIN_STABILITY, MAX_STABILITY)
}

/// Difficulty after a review: linear damping toward 10, then mean reversion
/// toward the initial Easy difficulty.
pub fn next_difficulty(w: &[f64; 21], difficulty: f64, rating: Rating) -> f64 {
    let delta = -w[6] * (rating.as_f64() - 3.0);
    let damped = difficulty + round8(delta * (10.0 - difficulty) / 9.0);
    let reverted = round8(w[7] * initial_difficulty(w, Rating::Easy) + (1.0 - w[7]) * damped);
    clamp_difficulty(reverted)
}

/// Stability after a successful recall (Hard, Good or Easy)
pub fn next_recall_stability(
    w: &[f64; 21],
    difficulty: f64,
    stability: f64,
    retrievability: f64,
    rating: Rating,
) -> f64 {
    let hard_penalty = if rating == Rating::Hard { w[15] } else { 1.0 };
    let easy_bonus = if rating == Rating::Easy { w[16] } else { 1.0 };
    let growth = w[8].exp()
        * (11.0 - difficulty)
        * stability.powf(-w[9])
        * ((w[10] * (1.0 - retrievability)).exp() - 1.0)
        * hard_penalty
        * easy_bonus;
    clamp_stability(round8(stability * (1.0 + growth)))
}

/// Post-lapse stability (before the short-term floor is applied)
pub fn next_forget_stability(
    w: &[f64; 21],
    difficulty: f64,
    stability: f64,
    retrievability: f64,
) -> f64 {
    round8(
        w[11]
            * difficulty.powf(-w[12])
            * ((stability + 1.0).powf(w[13]) - 1.0)
            * (w[14] * (1.0 - retrievability)).exp(),
    )
}

/// Same-day review stability. Successful same-day reviews never shrink
/// stability.
pub fn next_short_term_stability(w: &[f64; 21], stability: f64, rating: Rating) -> f64 {
    let increase = stability.powf(-w[19]) * (w[17] * (rating.as_f64() - 3.0 + w[18])).exp();
    let increase = if rating >= Rating::Good {
        increase.max(1.0)
    } else {
        increase
    };
    clamp_stability(round8(stability * increase))
}

/// Whole-day interval for a stability, at least one day and at most
/// `maximum_interval`.
pub fn next_interval(stability: f64, modifier: f64, maximum_interval: u32) -> u32 {
    let raw = (stability * modifier).round();
    let maximum = f64::from(maximum_interval.max(1));
    raw.clamp(1.0, maximum) as u32
}

// ============================================================================
// TESTS
// ============================================================================
