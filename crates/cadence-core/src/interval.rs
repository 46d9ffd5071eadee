//! Relative interval labels
//!
//! Short labels shown under rating buttons ("10m", "3d", "2mo", "1.4y").

use chrono::{DateTime, Duration, Utc};

const MS_PER_MINUTE: f64 = 60_000.0;
const MS_PER_HOUR: f64 = 3_600_000.0;
const MS_PER_DAY: f64 = 86_400_000.0;

/// Label for the time from `now` until `due`
pub fn format_interval(due: DateTime<Utc>, now: DateTime<Utc>) -> String {
    format_delta(due - now)
}

/// Label for a duration.
///
/// Minutes, hours and days are each rounded half-up from the exact delta
/// before the thresholds are checked.
pub fn format_delta(delta: Duration) -> String {
    let ms = delta.num_milliseconds() as f64;
    let minutes = round_half_up(ms / MS_PER_MINUTE);
    let hours = round_half_up(ms / MS_PER_HOUR);
    let days = round_half_up(ms / MS_PER_DAY);

    if minutes < 1.0 {
        "<1m".to_string()
    } else if minutes < 60.0 {
        format!("{}m", minutes as i64)
    } else if hours < 24.0 {
        format!("{}h", hours as i64)
    } else if days < 30.0 {
        format!("{}d", days as i64)
    } else if days < 365.0 {
        format!("{}mo", round_half_up(days / 30.0) as i64)
    } else {
        let years = round_half_up(days / 365.0 * 10.0) / 10.0;
        format!("{:.1}y", years)
    }
}

fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}
