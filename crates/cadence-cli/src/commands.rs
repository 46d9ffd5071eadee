//! Subcommand implementations
//!
//! Each command takes its JSON input as a string and returns the text to
//! print, so the binary only handles argument parsing and I/O.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context as _, Result};
use cadence_core::{
    custom_queue, due_queue, format_delta, preview_options, review_streak, review_trend,
    state_distribution, submit_review, today_summary, CardScheduling, CardState, CustomStudyMode,
    Rating, ReviewLogRecord, ReviewRequest, Scheduler, SchedulerConfig, CUSTOM_QUEUE_LIMIT,
    DEFAULT_QUEUE_LIMIT,
};
use chrono::{DateTime, Duration, NaiveTime, Utc};
use colored::{ColoredString, Colorize};
use serde_json::json;
use tracing::debug;

/// Shared state for a single invocation
pub struct Context {
    pub config: SchedulerConfig,
    pub scheduler: Scheduler,
    pub now: DateTime<Utc>,
}

impl Context {
    pub fn new(config: SchedulerConfig, now: DateTime<Utc>) -> Result<Self> {
        let params = config
            .to_parameters()
            .context("Invalid scheduler configuration")?;
        Ok(Self {
            scheduler: Scheduler::new(params),
            config,
            now,
        })
    }
}

/// Read command input from a file, or stdin when no path is given
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

/// Show all four rating outcomes for a scheduling row
pub fn preview(ctx: &Context, input: &str, as_json: bool) -> Result<String> {
    let row: CardScheduling =
        serde_json::from_str(input).context("Input is not a valid scheduling record")?;
    let options = preview_options(&ctx.scheduler, &row, ctx.now)?;

    if as_json {
        return Ok(serde_json::to_string_pretty(&options)?);
    }

    let state = row.to_state()?;
    let mut out = String::new();
    out.push_str(&format!("{}\n", "=== Review Preview ===".cyan().bold()));
    out.push_str(&format!(
        "{}: {}   {}: {:.1}%\n\n",
        "State".white().bold(),
        row.state,
        "Retrievability".white().bold(),
        ctx.scheduler.retrievability(&state, ctx.now) * 100.0
    ));

    for option in &options {
        out.push_str(&format!(
            "  {:<8} {:>6}  -> {:<10} due {}\n",
            rating_colored(option.rating),
            option.interval,
            option.scheduling.state,
            option.scheduling.due.format("%Y-%m-%d %H:%M")
        ));
    }

    Ok(out)
}

fn rating_colored(rating: Rating) -> ColoredString {
    let label = rating.label();
    match rating {
        Rating::Again => label.red().bold(),
        Rating::Hard => label.yellow().bold(),
        Rating::Good => label.green().bold(),
        Rating::Easy => label.blue().bold(),
    }
}

/// Commit a review submission and print the outcome JSON
pub fn review(ctx: &Context, input: &str) -> Result<String> {
    let request: ReviewRequest =
        serde_json::from_str(input).context("Input is not a valid review request")?;
    let outcome = submit_review(&ctx.scheduler, &request, ctx.now)?;
    Ok(serde_json::to_string_pretty(&outcome)?)
}

/// Print the due queue for an array of scheduling rows, or a custom study
/// queue when a mode is given
pub fn queue(
    ctx: &Context,
    input: &str,
    mode: Option<CustomStudyMode>,
    tags: &[String],
    limit: Option<usize>,
) -> Result<String> {
    let rows: Vec<CardScheduling> =
        serde_json::from_str(input).context("Input is not an array of scheduling records")?;
    let selected = match mode {
        Some(mode) => {
            let limit = limit.unwrap_or(CUSTOM_QUEUE_LIMIT);
            custom_queue(&rows, mode, tags, ctx.now, limit)
        }
        None => due_queue(&rows, ctx.now, limit.unwrap_or(DEFAULT_QUEUE_LIMIT)),
    };
    debug!(total = rows.len(), selected = selected.len(), mode = ?mode, "Built study queue");
    Ok(serde_json::to_string_pretty(&selected)?)
}

/// Today's accuracy, the review streak, the daily trend over `days` and the
/// state distribution, computed from review history rows
pub fn stats(ctx: &Context, input: &str, days: u32) -> Result<String> {
    let logs: Vec<ReviewLogRecord> =
        serde_json::from_str(input).context("Input is not an array of review log records")?;

    let day_start = ctx.now.date_naive().and_time(NaiveTime::MIN).and_utc();
    let today = today_summary(&logs, day_start);
    let streak = review_streak(
        logs.iter().map(|l| l.reviewed_at.date_naive()),
        ctx.now.date_naive(),
    );

    // Latest logged state per card
    let mut latest: HashMap<&str, &ReviewLogRecord> = HashMap::new();
    for log in &logs {
        let Some(card_id) = log.card_id.as_deref() else {
            continue;
        };
        match latest.get(card_id) {
            Some(seen) if seen.reviewed_at >= log.reviewed_at => {}
            _ => {
                latest.insert(card_id, log);
            }
        }
    }
    let states = latest
        .values()
        .map(|log| log.state.parse::<CardState>())
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(serde_json::to_string_pretty(&json!({
        "today": today,
        "streak": streak,
        "trend": review_trend(&logs, ctx.now.date_naive(), days),
        "distribution": state_distribution(states),
    }))?)
}

/// Interval label for a delta in seconds
pub fn label(seconds: i64) -> Result<String> {
    let delta = Duration::try_seconds(seconds)
        .with_context(|| format!("{} seconds is out of range", seconds))?;
    Ok(format_delta(delta))
}

/// Effective configuration as TOML
pub fn config(ctx: &Context) -> Result<String> {
    Ok(ctx.config.to_toml_string()?)
}
