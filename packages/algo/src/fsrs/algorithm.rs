//! FSRS-5 memory model
//!
//! Pure functions over `(weights, scalars) -> scalar`. All arithmetic stays in
//! f64 until an interval is rounded to whole days. Every stability result is
//! floored at [`MIN_STABILITY`] and every difficulty result clamped to [1, 10],
//! so values fed into later formulas are already valid.
//!
//! Formulas:
//! - Retrievability: R(t, S) = (1 + t / (9·S))^(-1)
//! - Interval: I(S, r) = round(9·S·(1/r - 1)), at least 1
//! - Initial difficulty: D0(G) = w4 - e^(w5·(G-1)) + 1
//! - Next difficulty: D' = w7·D0(Easy) + (1-w7)·(D - w6·(G-3))
//! - Recall stability: S' = S·(e^w8·(11-D)·S^(-w9)·(e^(w10·(1-R)) - 1)·h·b + 1)
//! - Forget stability: S' = w11·D^(-w12)·((S+1)^w13 - 1)·e^(w14·(1-R))
//! - Short-term stability: S' = S·e^(w17·(G-3+w18))

use super::params::{w, Weights};
use crate::sanitize::{clamp_difficulty, floor_stability};
use crate::types::{Rating, MIN_STABILITY};

// ==================== Retrievability / Interval ====================

/// Probability of recall after `elapsed_days` at the given stability
pub fn retrievability(elapsed_days: u32, stability: f64) -> f64 {
    if stability <= 0.0 {
        return 0.0;
    }
    (1.0 + f64::from(elapsed_days) / (9.0 * stability)).powi(-1)
}

/// Days until recall probability falls to `desired_retention`
///
/// Returns 1 for a retention outside (0, 1); such a value is a configuration
/// error that [`super::Parameters::validate`] rejects upstream. The float to
/// integer conversion saturates, so callers must clamp to their interval cap
/// before doing date arithmetic.
pub fn next_interval(stability: f64, desired_retention: f64) -> u32 {
    if !(desired_retention > 0.0 && desired_retention < 1.0) {
        return 1;
    }
    let interval = 9.0 * stability * (1.0 / desired_retention - 1.0);
    (interval.round() as u32).max(1)
}

// ==================== Initial State ====================

/// S0(G) = w[G-1], floored
pub fn initial_stability(weights: &Weights, rating: Rating) -> f64 {
    floor_stability(weights[rating.weight_index()])
}

/// D0(G), clamped to [1, 10]
pub fn initial_difficulty(weights: &Weights, rating: Rating) -> f64 {
    let grade = f64::from(rating.ordinal());
    let d = weights[w::INITIAL_DIFFICULTY]
        - (weights[w::INITIAL_DIFFICULTY_SLOPE] * (grade - 1.0)).exp()
        + 1.0;
    clamp_difficulty(d)
}

// ==================== Difficulty ====================

/// Difficulty after a review, mean-reverting toward D0(Easy)
pub fn next_difficulty(weights: &Weights, difficulty: f64, rating: Rating) -> f64 {
    let grade = f64::from(rating.ordinal());
    let reversion = weights[w::DIFFICULTY_REVERSION];
    let target = initial_difficulty(weights, Rating::Easy);
    let shifted = difficulty - weights[w::DIFFICULTY_DELTA] * (grade - 3.0);
    clamp_difficulty(reversion * target + (1.0 - reversion) * shifted)
}

// ==================== Stability ====================

/// Stability after a successful recall (Hard, Good or Easy)
pub fn stability_after_recall(
    weights: &Weights,
    stability: f64,
    difficulty: f64,
    retrievability: f64,
    rating: Rating,
) -> f64 {
    let hard_penalty = if rating == Rating::Hard {
        weights[w::HARD_PENALTY]
    } else {
        1.0
    };
    let easy_bonus = if rating == Rating::Easy {
        weights[w::EASY_BONUS]
    } else {
        1.0
    };

    let growth = weights[w::RECALL_SCALE].exp()
        * (11.0 - difficulty)
        * stability.powf(-weights[w::RECALL_STABILITY_DECAY])
        * ((weights[w::RECALL_RETRIEVABILITY] * (1.0 - retrievability)).exp() - 1.0)
        * hard_penalty
        * easy_bonus;

    floor_stability(stability * (growth + 1.0))
}

/// Stability after a lapse, before the NextSMin cap
pub fn stability_after_forgetting(
    weights: &Weights,
    stability: f64,
    difficulty: f64,
    retrievability: f64,
) -> f64 {
    let s = weights[w::FORGET_SCALE]
        * difficulty.powf(-weights[w::FORGET_DIFFICULTY])
        * ((stability + 1.0).powf(weights[w::FORGET_STABILITY]) - 1.0)
        * (weights[w::FORGET_RETRIEVABILITY] * (1.0 - retrievability)).exp();
    floor_stability(s)
}

/// Largest stability permitted right after a lapse
pub fn next_s_min(weights: &Weights, stability: f64) -> f64 {
    stability / (weights[w::SHORT_TERM_SCALE] * weights[w::SHORT_TERM_OFFSET]).exp()
}

/// Post-lapse stability, capped so a lapse never raises stability
pub fn stability_after_forgetting_capped(
    weights: &Weights,
    stability: f64,
    difficulty: f64,
    retrievability: f64,
) -> f64 {
    let cap = next_s_min(weights, stability);
    let forgot = stability_after_forgetting(weights, stability, difficulty, retrievability);
    cap.min(forgot).max(MIN_STABILITY)
}

/// Stability update used for every rating while in Learning/Relearning
pub fn short_term_stability(weights: &Weights, stability: f64, rating: Rating) -> f64 {
    let grade = f64::from(rating.ordinal());
    let factor =
        (weights[w::SHORT_TERM_SCALE] * (grade - 3.0 + weights[w::SHORT_TERM_OFFSET])).exp();
    floor_stability(stability * factor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MAX_DIFFICULTY, MIN_DIFFICULTY};

    const EPS: f64 = 1e-9;

    fn weights() -> Weights {
        Weights::default()
    }

    #[test]
    fn test_retrievability_decay() {
        let r_0 = retrievability(0, 10.0);
        let r_5 = retrievability(5, 10.0);
        let r_10 = retrievability(10, 10.0);
        assert!((r_0 - 1.0).abs() < EPS);
        assert!(r_0 > r_5);
        assert!(r_5 > r_10);
        // t = 9S gives exactly one half
        assert!((retrievability(90, 10.0) - 0.5).abs() < EPS);
    }

    #[test]
    fn test_retrievability_zero_stability() {
        assert_eq!(retrievability(3, 0.0), 0.0);
        assert_eq!(retrievability(3, -1.0), 0.0);
    }

    #[test]
    fn test_next_interval_at_default_retention() {
        // 9 * S * (1/0.9 - 1) == S
        assert_eq!(next_interval(3.1262, 0.9), 3);
        assert_eq!(next_interval(15.4722, 0.9), 15);
        assert_eq!(next_interval(100.0, 0.9), 100);
    }

    #[test]
    fn test_next_interval_floor_and_bad_retention() {
        assert_eq!(next_interval(0.1, 0.9), 1);
        assert_eq!(next_interval(10.0, 0.0), 1);
        assert_eq!(next_interval(10.0, 1.0), 1);
        assert_eq!(next_interval(10.0, f64::NAN), 1);
    }

    #[test]
    fn test_next_interval_saturates_for_extreme_values() {
        assert_eq!(next_interval(f64::MAX, 0.5), u32::MAX);
        assert_eq!(next_interval(1e12, 1e-9), u32::MAX);
    }

    #[test]
    fn test_initial_stability_uses_rating_weight() {
        let w = weights();
        assert_eq!(initial_stability(&w, Rating::Again), 0.4072);
        assert_eq!(initial_stability(&w, Rating::Hard), 1.1829);
        assert_eq!(initial_stability(&w, Rating::Good), 3.1262);
        assert_eq!(initial_stability(&w, Rating::Easy), 15.4722);
    }

    #[test]
    fn test_initial_stability_floor() {
        let mut w = weights();
        w.0[0] = 0.01;
        assert_eq!(initial_stability(&w, Rating::Again), MIN_STABILITY);
    }

    #[test]
    fn test_initial_difficulty_ordering() {
        let w = weights();
        let again = initial_difficulty(&w, Rating::Again);
        let good = initial_difficulty(&w, Rating::Good);
        let easy = initial_difficulty(&w, Rating::Easy);
        assert!((again - 7.2102).abs() < EPS);
        assert!(again > good);
        assert!(good > easy);
        assert!(easy >= MIN_DIFFICULTY);
    }

    #[test]
    fn test_next_difficulty_direction_and_bounds() {
        let w = weights();
        assert!(next_difficulty(&w, 5.0, Rating::Again) > 5.0);
        assert!(next_difficulty(&w, 5.0, Rating::Easy) < 5.0);
        assert_eq!(next_difficulty(&w, 10.0, Rating::Again), MAX_DIFFICULTY);
        assert_eq!(next_difficulty(&w, 1.0, Rating::Easy), MIN_DIFFICULTY);
    }

    #[test]
    fn test_recall_stability_rating_order() {
        let w = weights();
        let r = retrievability(10, 10.0);
        let hard = stability_after_recall(&w, 10.0, 5.0, r, Rating::Hard);
        let good = stability_after_recall(&w, 10.0, 5.0, r, Rating::Good);
        let easy = stability_after_recall(&w, 10.0, 5.0, r, Rating::Easy);
        assert!(hard > 10.0);
        assert!(hard < good);
        assert!(good < easy);
    }

    #[test]
    fn test_recall_stability_without_forgetting_is_unchanged() {
        let w = weights();
        let s = stability_after_recall(&w, 10.0, 5.0, 1.0, Rating::Good);
        assert!((s - 10.0).abs() < EPS);
    }

    #[test]
    fn test_forget_stability_capped_by_next_s_min() {
        let w = weights();
        let r = retrievability(20, 20.0);
        let capped = stability_after_forgetting_capped(&w, 20.0, 5.0, r);
        let cap = next_s_min(&w, 20.0);
        assert!(capped <= cap);
        assert!(cap <= 20.0);
        assert!(capped >= MIN_STABILITY);
    }

    #[test]
    fn test_forget_stability_floor() {
        let w = weights();
        let s = stability_after_forgetting_capped(&w, MIN_STABILITY, 10.0, 0.0);
        assert_eq!(s, MIN_STABILITY);
    }

    #[test]
    fn test_short_term_stability() {
        let w = weights();
        let again = short_term_stability(&w, 3.0, Rating::Again);
        let good = short_term_stability(&w, 3.0, Rating::Good);
        let easy = short_term_stability(&w, 3.0, Rating::Easy);
        assert!(again < good);
        assert!(good < easy);
        // Good multiplies by e^(w17*w18)
        assert!((good - 3.0 * (0.2223f64 * 0.6744).exp()).abs() < EPS);
        assert_eq!(short_term_stability(&w, 0.0, Rating::Again), MIN_STABILITY);
    }
}
