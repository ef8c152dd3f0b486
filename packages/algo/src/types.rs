//! Common Types and Constants
//!
//! Value types shared by the memory model and the scheduler.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fsrs::ScheduleError;

// ==================== Constants ====================

/// Number of FSRS-5 model weights
pub const WEIGHT_COUNT: usize = 19;

/// Stability floor (days)
pub const MIN_STABILITY: f64 = 0.1;

/// Lower difficulty bound
pub const MIN_DIFFICULTY: f64 = 1.0;

/// Upper difficulty bound
pub const MAX_DIFFICULTY: f64 = 10.0;

/// Default target recall probability
pub const DEFAULT_RETENTION: f64 = 0.9;

/// Default interval cap (days)
pub const DEFAULT_MAX_INTERVAL_DAYS: u32 = 365;

/// Hard ceiling for any configured interval cap (100 years)
pub const MAX_INTERVAL_CEILING_DAYS: u32 = 36_500;

/// Default FSRS-5 weights w0..w18
pub const DEFAULT_WEIGHTS: [f64; WEIGHT_COUNT] = [
    0.4072, 1.1829, 3.1262, 15.4722, // w0-w3: initial stability per rating
    7.2102, 0.5316, // w4-w5: initial difficulty
    1.0651, 0.0046, // w6-w7: difficulty update, mean reversion
    1.5418, 0.1594, 1.01, // w8-w10: recall stability
    2.1791, 0.0292, 0.2788, 0.2229, // w11-w14: forget stability
    0.2604, 3.3928, // w15-w16: hard penalty, easy bonus
    0.2223, 0.6744, // w17-w18: short-term stability
];

// ==================== Rating ====================

/// Recall quality reported for one review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

impl Rating {
    pub const ALL: [Rating; 4] = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];

    /// Ordinal grade, Again=1 .. Easy=4
    pub const fn ordinal(self) -> u8 {
        match self {
            Rating::Again => 1,
            Rating::Hard => 2,
            Rating::Good => 3,
            Rating::Easy => 4,
        }
    }

    /// Index into w0..w3 for initial stability
    pub const fn weight_index(self) -> usize {
        self.ordinal() as usize - 1
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Rating::Again => "again",
            Rating::Hard => "hard",
            Rating::Good => "good",
            Rating::Easy => "easy",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "again" => Some(Rating::Again),
            "hard" => Some(Rating::Hard),
            "good" => Some(Rating::Good),
            "easy" => Some(Rating::Easy),
            _ => None,
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==================== Card State ====================

/// Lifecycle stage of a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardState {
    New,
    Learning,
    Review,
    Relearning,
}

impl CardState {
    pub const fn as_str(self) -> &'static str {
        match self {
            CardState::New => "new",
            CardState::Learning => "learning",
            CardState::Review => "review",
            CardState::Relearning => "relearning",
        }
    }
}

impl fmt::Display for CardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CardState {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(CardState::New),
            "learning" => Ok(CardState::Learning),
            "review" => Ok(CardState::Review),
            "relearning" => Ok(CardState::Relearning),
            other => Err(ScheduleError::UnknownState(other.to_string())),
        }
    }
}

// ==================== Card ====================

/// Memory state of one card
///
/// A review never patches a card in place; the scheduler returns a complete
/// replacement value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    /// Lifecycle stage
    pub state: CardState,
    /// Index into the active step sequence; 0 outside Learning/Relearning
    pub step: u32,
    /// Days until recall probability decays to ~90%
    pub stability: f64,
    /// Intrinsic hardness in [1, 10]
    pub difficulty: f64,
    /// Next scheduled review
    pub due: DateTime<Utc>,
    /// Time of the last completed review
    pub last_review: Option<DateTime<Utc>>,
    /// Completed reviews
    pub reps: u32,
    /// Again ratings given while in Review
    pub lapses: u32,
    /// Interval chosen at the last scheduling (days)
    pub scheduled_days: u32,
    /// Whole days since the previous review, as seen by the current review
    pub elapsed_days: u32,
}

impl Card {
    /// A fresh card, due immediately
    ///
    /// Stability and difficulty hold their floors until the first review
    /// replaces them.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            state: CardState::New,
            step: 0,
            stability: MIN_STABILITY,
            difficulty: MIN_DIFFICULTY,
            due: now,
            last_review: None,
            reps: 0,
            lapses: 0,
            scheduled_days: 0,
            elapsed_days: 0,
        }
    }

    /// Whole days since `last_review`, never negative
    pub fn days_since_last_review(&self, now: DateTime<Utc>) -> u32 {
        match self.last_review {
            Some(last) => {
                let hours = (now - last).num_hours();
                u32::try_from((hours / 24).max(0)).unwrap_or(u32::MAX)
            }
            None => 0,
        }
    }

    /// Copy with `elapsed_days` recomputed for a review at `now`
    pub fn with_elapsed_at(&self, now: DateTime<Utc>) -> Self {
        let mut card = self.clone();
        if card.last_review.is_some() {
            card.elapsed_days = card.days_since_last_review(now);
        }
        card
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due <= now
    }
}
