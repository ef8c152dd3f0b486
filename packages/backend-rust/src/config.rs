use std::str::FromStr;

use chrono::Duration;
use lexicon_algo::{Parameters, Weights};
use thiserror::Error;

use crate::db::config::SqliteConfig;
use crate::logging::LogConfig;

pub const DEFAULT_UNDO_WINDOW_MINUTES: i64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub logging: LogConfig,
    pub sqlite: SqliteConfig,
    pub srs: SrsConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            logging: LogConfig::from_lookup(&lookup)?,
            sqlite: SqliteConfig::from_lookup(&lookup)?,
            srs: SrsConfig::from_lookup(&lookup)?,
        })
    }
}

/// Scheduling and undo settings
#[derive(Debug, Clone, PartialEq)]
pub struct SrsConfig {
    pub desired_retention: f64,
    pub max_interval_days: u32,
    pub enable_fuzz: bool,
    pub learning_steps: Vec<Duration>,
    pub relearning_steps: Vec<Duration>,
    pub undo_window: Duration,
    /// Custom model weights; `None` keeps the FSRS-5 defaults
    pub weights: Option<Weights>,
}

impl Default for SrsConfig {
    fn default() -> Self {
        let params = Parameters::default();
        Self {
            desired_retention: params.desired_retention,
            max_interval_days: params.max_interval_days,
            enable_fuzz: params.enable_fuzz,
            learning_steps: params.learning_steps,
            relearning_steps: params.relearning_steps,
            undo_window: Duration::minutes(DEFAULT_UNDO_WINDOW_MINUTES),
            weights: None,
        }
    }
}

impl SrsConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let desired_retention = env_parse(lookup, "SRS_DEFAULT_RETENTION", defaults.desired_retention)?;
        let max_interval_days = env_parse(lookup, "SRS_MAX_INTERVAL", defaults.max_interval_days)?;
        let enable_fuzz = env_bool(lookup, "SRS_ENABLE_FUZZ", defaults.enable_fuzz)?;

        let learning_steps = match lookup("SRS_LEARNING_STEPS") {
            Some(raw) => parse_steps("SRS_LEARNING_STEPS", &raw)?,
            None => defaults.learning_steps,
        };
        let relearning_steps = match lookup("SRS_RELEARNING_STEPS") {
            Some(raw) => parse_steps("SRS_RELEARNING_STEPS", &raw)?,
            None => defaults.relearning_steps,
        };

        let undo_minutes: i64 = env_parse(lookup, "SRS_UNDO_WINDOW_MINUTES", DEFAULT_UNDO_WINDOW_MINUTES)?;
        if undo_minutes < 0 {
            return Err(ConfigError::invalid(
                "SRS_UNDO_WINDOW_MINUTES",
                undo_minutes.to_string(),
                "must not be negative",
            ));
        }
        let undo_window = Duration::try_minutes(undo_minutes).ok_or_else(|| {
            ConfigError::invalid("SRS_UNDO_WINDOW_MINUTES", undo_minutes.to_string(), "out of range")
        })?;

        let weights = match lookup("SRS_WEIGHTS") {
            Some(raw) if !raw.trim().is_empty() => Some(parse_weights(&raw)?),
            _ => None,
        };

        Ok(Self {
            desired_retention,
            max_interval_days,
            enable_fuzz,
            learning_steps,
            relearning_steps,
            undo_window,
            weights,
        })
    }

    /// Scheduler parameters; validation happens when the scheduler is built
    pub fn parameters(&self) -> Parameters {
        Parameters {
            weights: self.weights.unwrap_or_default(),
            desired_retention: self.desired_retention,
            max_interval_days: self.max_interval_days,
            enable_fuzz: self.enable_fuzz,
            learning_steps: self.learning_steps.clone(),
            relearning_steps: self.relearning_steps.clone(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid {key}={value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key,
            value: value.into(),
            reason: reason.into(),
        }
    }
}

// ==================== Parsing helpers ====================

pub(crate) fn env_parse<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|err| ConfigError::invalid(key, raw.clone(), err.to_string())),
        None => Ok(default),
    }
}

pub(crate) fn env_bool<F>(lookup: &F, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).as_deref().map(str::trim) {
        None => Ok(default),
        Some("true") | Some("1") => Ok(true),
        Some("false") | Some("0") => Ok(false),
        Some(other) => Err(ConfigError::invalid(key, other, "expected true/false/1/0")),
    }
}

/// Comma-separated durations such as `"1m, 10m"`; empty entries are skipped
pub fn parse_steps(key: &'static str, raw: &str) -> Result<Vec<Duration>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| parse_step(part).map_err(|reason| ConfigError::invalid(key, part, reason)))
        .collect()
}

/// A single duration with unit suffix `s`, `m`, `h` or `d`
pub fn parse_step(raw: &str) -> Result<Duration, String> {
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| "missing unit (s, m, h, d)".to_string())?;
    let (amount, unit) = raw.split_at(split);
    let amount: i64 = amount
        .parse()
        .map_err(|_| "expected a whole number before the unit".to_string())?;

    let step = match unit {
        "s" => Duration::try_seconds(amount),
        "m" => Duration::try_minutes(amount),
        "h" => Duration::try_hours(amount),
        "d" => Duration::try_days(amount),
        other => return Err(format!("unknown unit {other:?}")),
    };

    match step {
        Some(step) if step > Duration::zero() => Ok(step),
        Some(_) => Err("must be positive".to_string()),
        None => Err("out of range".to_string()),
    }
}

fn parse_weights(raw: &str) -> Result<Weights, ConfigError> {
    let values = raw
        .split(',')
        .map(str::trim)
        .map(|part| {
            part.parse::<f64>()
                .map_err(|err| ConfigError::invalid("SRS_WEIGHTS", part, err.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Weights::from_slice(&values).map_err(|err| ConfigError::invalid("SRS_WEIGHTS", raw, err.to_string()))
}
