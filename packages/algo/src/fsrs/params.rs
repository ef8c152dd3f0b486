//! Scheduler configuration: model weights, retention target, interval cap,
//! fuzz switch and step sequences.

use std::ops::Index;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sanitize::has_invalid_values;
use crate::types::{
    DEFAULT_MAX_INTERVAL_DAYS, DEFAULT_RETENTION, DEFAULT_WEIGHTS, MAX_INTERVAL_CEILING_DAYS,
    WEIGHT_COUNT,
};

// ==================== Weight Indices ====================

/// Named positions in the weight vector
pub mod w {
    pub const INITIAL_STABILITY_AGAIN: usize = 0;
    pub const INITIAL_STABILITY_EASY: usize = 3;
    pub const INITIAL_DIFFICULTY: usize = 4;
    pub const INITIAL_DIFFICULTY_SLOPE: usize = 5;
    pub const DIFFICULTY_DELTA: usize = 6;
    pub const DIFFICULTY_REVERSION: usize = 7;
    pub const RECALL_SCALE: usize = 8;
    pub const RECALL_STABILITY_DECAY: usize = 9;
    pub const RECALL_RETRIEVABILITY: usize = 10;
    pub const FORGET_SCALE: usize = 11;
    pub const FORGET_DIFFICULTY: usize = 12;
    pub const FORGET_STABILITY: usize = 13;
    pub const FORGET_RETRIEVABILITY: usize = 14;
    pub const HARD_PENALTY: usize = 15;
    pub const EASY_BONUS: usize = 16;
    pub const SHORT_TERM_SCALE: usize = 17;
    pub const SHORT_TERM_OFFSET: usize = 18;
}

/// The 19 FSRS-5 weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights(pub [f64; WEIGHT_COUNT]);

impl Weights {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Build from a slice, which must hold exactly 19 values
    pub fn from_slice(values: &[f64]) -> Result<Self, ParamsError> {
        let arr: [f64; WEIGHT_COUNT] = values.try_into().map_err(|_| ParamsError::WeightCount {
            expected: WEIGHT_COUNT,
            actual: values.len(),
        })?;
        Ok(Self(arr))
    }
}

impl Default for Weights {
    fn default() -> Self {
        Self(DEFAULT_WEIGHTS)
    }
}

impl Index<usize> for Weights {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

/// Reject weights that would poison the model
///
/// Every weight must be finite and w0..w3 (initial stabilities) positive.
pub fn validate_weights(weights: &Weights) -> Result<(), ParamsError> {
    if has_invalid_values(weights.as_slice()) {
        let (index, value) = weights
            .as_slice()
            .iter()
            .copied()
            .enumerate()
            .find(|(_, v)| !v.is_finite())
            .unwrap_or((0, f64::NAN));
        return Err(ParamsError::InvalidWeight { index, value });
    }

    for index in w::INITIAL_STABILITY_AGAIN..=w::INITIAL_STABILITY_EASY {
        let value = weights[index];
        if value <= 0.0 {
            return Err(ParamsError::NonPositiveInitialStability { index, value });
        }
    }

    Ok(())
}

// ==================== Parameters ====================

pub const DEFAULT_LEARNING_STEP_SECS: i64 = 60;
pub const DEFAULT_RELEARNING_STEP_SECS: i64 = 600;

#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub weights: Weights,
    /// Target recall probability, in (0, 1)
    pub desired_retention: f64,
    /// Interval cap in days
    pub max_interval_days: u32,
    pub enable_fuzz: bool,
    pub learning_steps: Vec<Duration>,
    pub relearning_steps: Vec<Duration>,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            desired_retention: DEFAULT_RETENTION,
            max_interval_days: DEFAULT_MAX_INTERVAL_DAYS,
            enable_fuzz: true,
            learning_steps: vec![Duration::minutes(1), Duration::minutes(10)],
            relearning_steps: vec![Duration::minutes(10)],
        }
    }
}

impl Parameters {
    /// Fill empty step sequences with their single-step defaults
    pub fn normalized(mut self) -> Self {
        if self.learning_steps.is_empty() {
            self.learning_steps = vec![Duration::seconds(DEFAULT_LEARNING_STEP_SECS)];
        }
        if self.relearning_steps.is_empty() {
            self.relearning_steps = vec![Duration::seconds(DEFAULT_RELEARNING_STEP_SECS)];
        }
        self
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        validate_weights(&self.weights)?;

        if !(self.desired_retention > 0.0 && self.desired_retention < 1.0) {
            return Err(ParamsError::Retention(self.desired_retention));
        }

        if self.max_interval_days == 0 || self.max_interval_days > MAX_INTERVAL_CEILING_DAYS {
            return Err(ParamsError::MaxInterval(self.max_interval_days));
        }

        validate_steps("learning", &self.learning_steps)?;
        validate_steps("relearning", &self.relearning_steps)?;

        Ok(())
    }
}

/// Steps must be positive and no longer than the interval ceiling
fn validate_steps(kind: &'static str, steps: &[Duration]) -> Result<(), ParamsError> {
    let longest = Duration::days(i64::from(MAX_INTERVAL_CEILING_DAYS));
    for (index, step) in steps.iter().enumerate() {
        if *step <= Duration::zero() {
            return Err(ParamsError::NonPositiveStep { kind, index });
        }
        if *step > longest {
            return Err(ParamsError::StepTooLong { kind, index });
        }
    }
    Ok(())
}

#[derive(Debug, Error, PartialEq)]
pub enum ParamsError {
    #[error("weight w[{index}] is invalid: {value}")]
    InvalidWeight { index: usize, value: f64 },
    #[error("initial stability weight w[{index}] must be positive (got {value})")]
    NonPositiveInitialStability { index: usize, value: f64 },
    #[error("expected {expected} weights, got {actual}")]
    WeightCount { expected: usize, actual: usize },
    #[error("desired retention must be in (0, 1) (got {0})")]
    Retention(f64),
    #[error("max interval must be in 1..=36500 days (got {0})")]
    MaxInterval(u32),
    #[error("{kind} step {index} must be a positive duration")]
    NonPositiveStep { kind: &'static str, index: usize },
    #[error("{kind} step {index} must not exceed 36500 days")]
    StepTooLong { kind: &'static str, index: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parameters_are_valid() {
        assert!(Parameters::default().validate().is_ok());
    }

    #[test]
    fn test_validate_weights_rejects_nan() {
        let mut weights = Weights::default();
        weights.0[9] = f64::NAN;
        let err = validate_weights(&weights).unwrap_err();
        assert!(matches!(err, ParamsError::InvalidWeight { index: 9, .. }));
    }

    #[test]
    fn test_validate_weights_rejects_infinite() {
        let mut weights = Weights::default();
        weights.0[17] = f64::INFINITY;
        assert!(matches!(
            validate_weights(&weights),
            Err(ParamsError::InvalidWeight { index: 17, .. })
        ));
    }

    #[test]
    fn test_validate_weights_rejects_non_positive_initial_stability() {
        for index in 0..4 {
            let mut weights = Weights::default();
            weights.0[index] = 0.0;
            assert_eq!(
                validate_weights(&weights),
                Err(ParamsError::NonPositiveInitialStability { index, value: 0.0 })
            );
        }
    }

    #[test]
    fn test_negative_later_weights_are_allowed() {
        let mut weights = Weights::default();
        weights.0[6] = -0.5;
        assert!(validate_weights(&weights).is_ok());
    }

    #[test]
    fn test_weights_from_slice() {
        assert!(Weights::from_slice(&DEFAULT_WEIGHTS).is_ok());
        assert_eq!(
            Weights::from_slice(&[1.0, 2.0]),
            Err(ParamsError::WeightCount { expected: 19, actual: 2 })
        );
    }

    #[test]
    fn test_validate_retention_bounds() {
        for retention in [0.0, 1.0, -0.1, 1.5, f64::NAN] {
            let params = Parameters {
                desired_retention: retention,
                ..Parameters::default()
            };
            assert!(matches!(params.validate(), Err(ParamsError::Retention(_))));
        }
    }

    #[test]
    fn test_validate_max_interval() {
        let params = Parameters {
            max_interval_days: 0,
            ..Parameters::default()
        };
        assert_eq!(params.validate(), Err(ParamsError::MaxInterval(0)));

        let params = Parameters {
            max_interval_days: 40_000,
            ..Parameters::default()
        };
        assert_eq!(params.validate(), Err(ParamsError::MaxInterval(40_000)));
    }

    #[test]
    fn test_validate_rejects_zero_step() {
        let params = Parameters {
            learning_steps: vec![Duration::minutes(1), Duration::zero()],
            ..Parameters::default()
        };
        assert_eq!(
            params.validate(),
            Err(ParamsError::NonPositiveStep { kind: "learning", index: 1 })
        );
    }

    #[test]
    fn test_validate_rejects_step_beyond_interval_ceiling() {
        let params = Parameters {
            relearning_steps: vec![Duration::days(36_501)],
            ..Parameters::default()
        };
        assert_eq!(
            params.validate(),
            Err(ParamsError::StepTooLong { kind: "relearning", index: 0 })
        );

        let params = Parameters {
            learning_steps: vec![Duration::days(36_500); 2],
            ..Parameters::default()
        };
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_normalized_fills_empty_steps() {
        let params = Parameters {
            learning_steps: Vec::new(),
            relearning_steps: Vec::new(),
            ..Parameters::default()
        }
        .normalized();
        assert_eq!(params.learning_steps, vec![Duration::minutes(1)]);
        assert_eq!(params.relearning_steps, vec![Duration::minutes(10)]);
    }
}
