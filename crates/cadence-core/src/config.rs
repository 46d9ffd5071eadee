//! Scheduler configuration
//!
//! Defaults, then an optional TOML file, then environment overrides:
//! - `CADENCE_DESIRED_RETENTION`
//! - `CADENCE_MAXIMUM_INTERVAL`

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::fsrs::{Parameters, DEFAULT_MAXIMUM_INTERVAL, DEFAULT_RETENTION, FSRS6_WEIGHTS};

/// Environment variable overriding `desired_retention`
pub const ENV_DESIRED_RETENTION: &str = "CADENCE_DESIRED_RETENTION";
/// Environment variable overriding `maximum_interval`
pub const ENV_MAXIMUM_INTERVAL: &str = "CADENCE_MAXIMUM_INTERVAL";

const CONFIG_FILE_NAME: &str = "scheduler.toml";
const MINUTES_PER_DAY: u32 = 24 * 60;

// ============================================================================
// ERROR TYPES
// ============================================================================

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// CONFIG
// ============================================================================

/// On-disk scheduler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Target recall probability at the due date, in (0, 1)
    pub desired_retention: f64,
    /// Longest interval in days
    pub maximum_interval: u32,
    /// Same-day reviews use the short-term stability formula
    pub enable_short_term: bool,
    /// e.g. `["1m", "10m"]`
    pub learning_steps: Vec<String>,
    /// e.g. `["10m"]`
    pub relearning_steps: Vec<String>,
    /// FSRS-6 weights, exactly 21
    pub weights: Vec<f64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            desired_retention: DEFAULT_RETENTION,
            maximum_interval: DEFAULT_MAXIMUM_INTERVAL,
            enable_short_term: true,
            learning_steps: vec!["1m".to_string(), "10m".to_string()],
            relearning_steps: vec!["10m".to_string()],
            weights: FSRS6_WEIGHTS.to_vec(),
        }
    }
}

impl SchedulerConfig {
    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, the platform config file
    /// is read when present and defaults are used otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(default) if default.exists() => Self::from_file(&default)?,
                _ => {
                    debug!("No scheduler config file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "Reading scheduler config");
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// `<config dir>/scheduler.toml` for the current platform
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "cadence", "cadence")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Apply overrides from a variable lookup (the environment in `load`).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_DESIRED_RETENTION) {
            self.desired_retention = raw.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("{} is not a number: '{}'", ENV_DESIRED_RETENTION, raw))
            })?;
        }

        if let Some(raw) = lookup(ENV_MAXIMUM_INTERVAL) {
            match raw.trim().parse() {
                Ok(days) => self.maximum_interval = days,
                Err(_) => warn!(
                    value = %raw,
                    "Ignoring {}: not a whole number of days", ENV_MAXIMUM_INTERVAL
                ),
            }
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.desired_retention > 0.0 && self.desired_retention < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "desired_retention must be in (0, 1), got {}",
                self.desired_retention
            )));
        }
        if self.maximum_interval == 0 {
            return Err(ConfigError::Invalid(
                "maximum_interval must be at least 1 day".to_string(),
            ));
        }
        if self.weights.len() != FSRS6_WEIGHTS.len() {
            return Err(ConfigError::Invalid(format!(
                "expected {} weights, got {}",
                FSRS6_WEIGHTS.len(),
                self.weights.len()
            )));
        }
        if self.weights.iter().any(|w| !w.is_finite()) {
            return Err(ConfigError::Invalid("weights must be finite".to_string()));
        }
        if self.weights[20] <= 0.0 {
            return Err(ConfigError::Invalid(
                "decay weight w20 must be positive".to_string(),
            ));
        }

        for (name, steps) in [
            ("learning_steps", &self.learning_steps),
            ("relearning_steps", &self.relearning_steps),
        ] {
            if steps.is_empty() {
                return Err(ConfigError::Invalid(format!("{} must not be empty", name)));
            }
            parse_steps(steps)?;
        }

        Ok(())
    }

    /// Validated scheduler parameters
    pub fn to_parameters(&self) -> Result<Parameters, ConfigError> {
        self.validate()?;

        let mut weights = [0.0; 21];
        weights.copy_from_slice(&self.weights);

        Ok(Parameters {
            weights,
            desired_retention: self.desired_retention,
            maximum_interval: self.maximum_interval,
            enable_short_term: self.enable_short_term,
            learning_steps: parse_steps(&self.learning_steps)?,
            relearning_steps: parse_steps(&self.relearning_steps)?,
        })
    }
}

// ============================================================================
// STEP PARSING
// ============================================================================

/// Parse a step such as `"10m"` or `"1h"` into minutes.
///
/// Steps must be positive and shorter than a day.
pub fn parse_step(step: &str) -> Result<u32, ConfigError> {
    let step = step.trim();
    let invalid = || ConfigError::Invalid(format!("invalid learning step '{}'", step));

    let split = step.len().checked_sub(1).ok_or_else(invalid)?;
    if !step.is_char_boundary(split) {
        return Err(invalid());
    }
    let (amount, unit) = step.split_at(split);
    let amount: u32 = amount.parse().map_err(|_| invalid())?;
    let multiplier = match unit {
        "m" => 1,
        "h" => 60,
        _ => return Err(invalid()),
    };

    let minutes = amount.checked_mul(multiplier).ok_or_else(invalid)?;
    if minutes == 0 || minutes >= MINUTES_PER_DAY {
        return Err(ConfigError::Invalid(format!(
            "learning step '{}' must be between 1 minute and 1 day",
            step
        )));
    }
    Ok(minutes)
}

fn parse_steps(steps: &[String]) -> Result<Vec<u32>, ConfigError> {
    steps.iter().map(|s| parse_step(s)).collect()
}

// ============================================================================
// TESTS
// ============================================================================
