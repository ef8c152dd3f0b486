//! Interval fuzz
//!
//! Spreads due dates of cards that would otherwise cluster on the same day.
//! The spread widens in three tiers as the interval grows. Randomness is fully
//! determined by a seed derived from the review itself, so the same review
//! always lands on the same day.

use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

// ==================== Constants ====================

/// Intervals below this many days are never fuzzed
pub const FUZZ_THRESHOLD_DAYS: f64 = 2.5;

/// Fuzzed intervals never drop below this
const MIN_FUZZED_DAYS: u32 = 2;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// One tier of the fuzz spread
#[derive(Debug, Clone, Copy)]
pub struct FuzzRange {
    pub start: f64,
    pub end: f64,
    pub factor: f64,
}

pub const FUZZ_RANGES: [FuzzRange; 3] = [
    FuzzRange {
        start: 2.5,
        end: 7.0,
        factor: 0.15,
    },
    FuzzRange {
        start: 7.0,
        end: 20.0,
        factor: 0.10,
    },
    FuzzRange {
        start: 20.0,
        end: f64::MAX,
        factor: 0.05,
    },
];

// ==================== Range / Apply ====================

/// Inclusive bounds a fuzzed interval may take
pub fn fuzz_bounds(interval: f64, elapsed_days: f64, max_interval: u32) -> (u32, u32) {
    if interval < FUZZ_THRESHOLD_DAYS {
        let rounded = interval.round() as u32;
        return (rounded, rounded);
    }

    let delta = FUZZ_RANGES.iter().fold(1.0, |acc, r| {
        acc + r.factor * (interval.min(r.end) - r.start).max(0.0)
    });

    let mut min_ivl = ((interval - delta).round() as u32).max(MIN_FUZZED_DAYS);
    let mut max_ivl = (interval + delta).round() as u32;

    if interval > elapsed_days {
        let elapsed = elapsed_days as u32;
        if min_ivl <= elapsed {
            min_ivl = elapsed.saturating_add(1);
        }
    }

    max_ivl = max_ivl.min(max_interval);
    if min_ivl > max_ivl {
        min_ivl = max_ivl;
    }

    (min_ivl, max_ivl)
}

/// Draw a fuzzed interval; intervals under the threshold pass through
pub fn apply_fuzz(interval: u32, elapsed_days: u32, max_interval: u32, seed: u64) -> u32 {
    let ivl = f64::from(interval);
    if ivl < FUZZ_THRESHOLD_DAYS {
        return interval;
    }

    let (min_ivl, max_ivl) = fuzz_bounds(ivl, f64::from(elapsed_days), max_interval);
    if min_ivl == max_ivl {
        return min_ivl;
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.gen_range(min_ivl..=max_ivl)
}

// ==================== Seed ====================

/// FNV-1a over the little-endian bytes of the review inputs
///
/// Depends only on its arguments; no process-global randomness.
pub fn fuzz_seed(now: DateTime<Utc>, reps: u32, difficulty: f64, stability: f64) -> u64 {
    let words = [
        now.timestamp() as u64,
        u64::from(reps),
        difficulty.to_bits(),
        stability.to_bits(),
    ];

    words
        .iter()
        .flat_map(|word| word.to_le_bytes())
        .fold(FNV_OFFSET_BASIS, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_short_intervals_not_fuzzed() {
        assert_eq!(apply_fuzz(1, 0, 365, 42), 1);
        assert_eq!(apply_fuzz(2, 0, 365, 42), 2);
        assert_eq!(fuzz_bounds(2.0, 0.0, 365), (2, 2));
    }

    #[test]
    fn test_fuzz_bounds_tiers() {
        // 10 days: delta = 1 + 0.15*4.5 + 0.10*3 = 1.975
        assert_eq!(fuzz_bounds(10.0, 0.0, 365), (8, 12));
        // 100 days: delta = 1 + 0.675 + 1.3 + 4.0 = 6.975
        assert_eq!(fuzz_bounds(100.0, 0.0, 365), (93, 107));
    }

    #[test]
    fn test_fuzz_bounds_respect_max_interval() {
        let (min_ivl, max_ivl) = fuzz_bounds(100.0, 0.0, 100);
        assert_eq!(max_ivl, 100);
        assert!(min_ivl <= max_ivl);
        assert_eq!(fuzz_bounds(100.0, 0.0, 50), (50, 50));
    }

    #[test]
    fn test_fuzz_bounds_exceed_elapsed() {
        let (min_ivl, _) = fuzz_bounds(10.0, 9.0, 365);
        assert_eq!(min_ivl, 10);
    }

    #[test]
    fn test_apply_fuzz_within_bounds_and_deterministic() {
        for seed in 0..200u64 {
            let fuzzed = apply_fuzz(30, 5, 365, seed);
            let (lo, hi) = fuzz_bounds(30.0, 5.0, 365);
            assert!(fuzzed >= lo && fuzzed <= hi);
            assert_eq!(fuzzed, apply_fuzz(30, 5, 365, seed));
        }
    }

    #[test]
    fn test_apply_fuzz_spreads_values() {
        let distinct: std::collections::HashSet<u32> =
            (0..100u64).map(|seed| apply_fuzz(60, 0, 365, seed)).collect();
        assert!(distinct.len() > 1);
    }

    #[test]
    fn test_fuzz_seed_depends_on_every_input() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        let base = fuzz_seed(now, 3, 5.0, 12.0);
        assert_eq!(base, fuzz_seed(now, 3, 5.0, 12.0));
        assert_ne!(base, fuzz_seed(now + chrono::Duration::seconds(1), 3, 5.0, 12.0));
        assert_ne!(base, fuzz_seed(now, 4, 5.0, 12.0));
        assert_ne!(base, fuzz_seed(now, 3, 5.1, 12.0));
        assert_ne!(base, fuzz_seed(now, 3, 5.0, 12.5));
    }

    #[test]
    fn test_fuzz_seed_ignores_sub_second_precision() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        let later = now + chrono::Duration::milliseconds(400);
        assert_eq!(fuzz_seed(now, 1, 5.0, 3.0), fuzz_seed(later, 1, 5.0, 3.0));
    }
}
