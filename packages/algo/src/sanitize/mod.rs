//! Data Sanitization
//!
//! Numerical guards applied at every formula boundary.
//!
//! Functions:
//! - Invalid value detection for weight vectors
//! - Stability floor / difficulty clamp
//! - Interval clamping before date arithmetic
//! - Card value diagnostics

use crate::types::{Card, MAX_DIFFICULTY, MIN_DIFFICULTY, MIN_STABILITY};

/// Whether any value is NaN or infinite
pub fn has_invalid_values(arr: &[f64]) -> bool {
    arr.iter().any(|&x| x.is_nan() || x.is_infinite())
}

/// Constrain difficulty to [1, 10]
pub fn clamp_difficulty(d: f64) -> f64 {
    d.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

/// Apply the stability floor
pub fn floor_stability(s: f64) -> f64 {
    s.max(MIN_STABILITY)
}

/// Constrain an interval to [1, max_days]
pub fn clamp_interval(interval: u32, max_days: u32) -> u32 {
    interval.clamp(1, max_days.max(1))
}

/// Result of checking a card's numeric fields
#[derive(Debug, Clone, PartialEq)]
pub struct CardDiagnostic {
    pub stability_finite: bool,
    pub difficulty_finite: bool,
    pub stability_in_range: bool,
    pub difficulty_in_range: bool,
}

impl CardDiagnostic {
    /// Finite values can be clamped; non-finite ones cannot
    pub fn is_recoverable(&self) -> bool {
        self.stability_finite && self.difficulty_finite
    }

    pub fn is_healthy(&self) -> bool {
        self.is_recoverable() && self.stability_in_range && self.difficulty_in_range
    }
}

/// Inspect the memory-state values of a card
pub fn diagnose_card(card: &Card) -> CardDiagnostic {
    let stability_finite = card.stability.is_finite();
    let difficulty_finite = card.difficulty.is_finite();
    CardDiagnostic {
        stability_finite,
        difficulty_finite,
        stability_in_range: stability_finite && card.stability >= MIN_STABILITY,
        difficulty_in_range: difficulty_finite
            && (MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&card.difficulty),
    }
}

/// Pull finite out-of-range memory values back into range
pub fn sanitize_card(card: &mut Card) {
    if card.stability.is_finite() {
        card.stability = floor_stability(card.stability);
    }
    if card.difficulty.is_finite() {
        card.difficulty = clamp_difficulty(card.difficulty);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_has_invalid_values() {
        assert!(!has_invalid_values(&[1.0, 2.0, 3.0]));
        assert!(has_invalid_values(&[1.0, f64::NAN, 3.0]));
        assert!(has_invalid_values(&[f64::INFINITY, 2.0]));
        assert!(has_invalid_values(&[1.0, f64::NEG_INFINITY]));
        assert!(!has_invalid_values(&[]));
    }

    #[test]
    fn test_clamp_difficulty() {
        assert_eq!(clamp_difficulty(0.2), 1.0);
        assert_eq!(clamp_difficulty(5.5), 5.5);
        assert_eq!(clamp_difficulty(42.0), 10.0);
    }

    #[test]
    fn test_floor_stability() {
        assert_eq!(floor_stability(0.0), MIN_STABILITY);
        assert_eq!(floor_stability(-3.0), MIN_STABILITY);
        assert_eq!(floor_stability(12.5), 12.5);
    }

    #[test]
    fn test_clamp_interval() {
        assert_eq!(clamp_interval(0, 365), 1);
        assert_eq!(clamp_interval(30, 365), 30);
        assert_eq!(clamp_interval(u32::MAX, 365), 365);
        assert_eq!(clamp_interval(5, 0), 1);
    }

    #[test]
    fn test_diagnose_card_healthy() {
        let card = Card::new(Utc::now());
        let diag = diagnose_card(&card);
        assert!(diag.is_healthy());
    }

    #[test]
    fn test_diagnose_card_out_of_range_is_recoverable() {
        let mut card = Card::new(Utc::now());
        card.stability = 0.0;
        card.difficulty = 11.0;
        let diag = diagnose_card(&card);
        assert!(!diag.is_healthy());
        assert!(diag.is_recoverable());

        sanitize_card(&mut card);
        assert_eq!(card.stability, MIN_STABILITY);
        assert_eq!(card.difficulty, MAX_DIFFICULTY);
        assert!(diagnose_card(&card).is_healthy());
    }

    #[test]
    fn test_diagnose_card_nan_is_not_recoverable() {
        let mut card = Card::new(Utc::now());
        card.difficulty = f64::NAN;
        let diag = diagnose_card(&card);
        assert!(!diag.is_recoverable());

        sanitize_card(&mut card);
        assert!(card.difficulty.is_nan());
    }
}
