//! Cadence CLI
//!
//! Command-line front end for the FSRS-6 scheduler. Reads scheduling rows,
//! review requests and review history as JSON (from a file or stdin) and
//! prints the scheduler's answer.

mod commands;

use std::io;
use std::path::PathBuf;

use anyhow::Context as _;
use cadence_core::{CustomStudyMode, SchedulerConfig, DEFAULT_TREND_DAYS};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::{debug, Level};
use tracing_subscriber::EnvFilter;

use crate::commands::{read_input, Context};

/// Cadence - FSRS-6 flashcard scheduling
#[derive(Parser)]
#[command(name = "cadence")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Spaced-repetition scheduling for vocabulary flashcards")]
#[command(long_about = "Cadence schedules flashcard reviews with FSRS-6.\n\nIt previews the four rating outcomes for a card, commits reviews, builds the due queue and summarizes review history.")]
struct Cli {
    /// Scheduler config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Evaluate as of this RFC 3339 timestamp instead of the current time
    #[arg(long, global = true, value_parser = parse_timestamp)]
    now: Option<DateTime<Utc>>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Preview all four rating outcomes for a scheduling row
    Preview {
        /// JSON scheduling row (stdin when omitted)
        input: Option<PathBuf>,
        /// Print the options as JSON
        #[arg(long)]
        json: bool,
    },

    /// Commit a review: `{ scheduling, rating, durationMs }`
    Review {
        /// JSON review request (stdin when omitted)
        input: Option<PathBuf>,
    },

    /// List cards that are due, earliest first, or a custom study queue
    Queue {
        /// JSON array of scheduling rows (stdin when omitted)
        input: Option<PathBuf>,
        /// Custom study mode: all, failed, ahead or tags
        #[arg(long)]
        mode: Option<CustomStudyMode>,
        /// Comma-separated tags for `--mode tags`
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
        /// Maximum number of cards (50 for the due queue, 200 for custom study)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Today's accuracy, review streak, daily trend and state distribution
    Stats {
        /// JSON array of review log records (stdin when omitted)
        input: Option<PathBuf>,
        /// Days covered by the trend
        #[arg(long, default_value_t = DEFAULT_TREND_DAYS)]
        days: u32,
    },

    /// Format an interval label for a delta in seconds
    Label {
        #[arg(allow_negative_numbers = true)]
        seconds: i64,
    },

    /// Print the effective scheduler configuration
    Config,
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {}", e))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::WARN.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(false)
        .init();

    let config = SchedulerConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    let now = cli.now.unwrap_or_else(Utc::now);
    debug!(%now, "Cadence v{} starting", env!("CARGO_PKG_VERSION"));

    let ctx = Context::new(config, now)?;

    let output = match cli.command {
        Commands::Preview { input, json } => {
            commands::preview(&ctx, &read_input(input.as_deref())?, json)?
        }
        Commands::Review { input } => commands::review(&ctx, &read_input(input.as_deref())?)?,
        Commands::Queue {
            input,
            mode,
            tags,
            limit,
        } => commands::queue(&ctx, &read_input(input.as_deref())?, mode, &tags, limit)?,
        Commands::Stats { input, days } => {
            commands::stats(&ctx, &read_input(input.as_deref())?, days)?
        }
        Commands::Label { seconds } => commands::label(seconds)?,
        Commands::Config => commands::config(&ctx)?,
    };

    println!("{}", output.trim_end());
    Ok(())
}
