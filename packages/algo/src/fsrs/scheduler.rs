//! Card scheduler
//!
//! A pure function of `(parameters, card, rating, now) -> card`. Dispatch is a
//! closed match over [`CardState`]:
//!
//! - `New`: initial stability/difficulty from the first rating, then either a
//!   learning step or immediate graduation.
//! - `Learning` / `Relearning`: short-term stability and difficulty update on
//!   every rating, then step progression or graduation.
//! - `Review`: long-term recall/forget stability. Hard, Good and Easy
//!   candidate intervals are all computed and kept in order
//!   `Hard <= Good < Easy`, before and after fuzz.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use super::algorithm::{
    initial_difficulty, initial_stability, next_difficulty, next_interval, retrievability,
    short_term_stability, stability_after_forgetting_capped, stability_after_recall,
};
use super::fuzz::{apply_fuzz, fuzz_seed};
use super::params::{Parameters, ParamsError};
use crate::sanitize::{clamp_interval, diagnose_card, sanitize_card};
use crate::types::{Card, CardState, Rating};

#[derive(Debug, Error, PartialEq)]
pub enum ScheduleError {
    #[error("unknown card state: {0:?}")]
    UnknownState(String),
    #[error("card {field} is not a finite number: {value}")]
    InvalidCard { field: &'static str, value: f64 },
}

// ==================== Interval Candidates ====================

/// Hard/Good/Easy intervals for one Review-state review
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalCandidates {
    pub hard: u32,
    pub good: u32,
    pub easy: u32,
}

impl IntervalCandidates {
    /// Force `hard < good < easy`, then clamp each to [1, max_days]
    ///
    /// Clamping is monotone, so `hard <= good <= easy` always survives it;
    /// the strict steps only collapse where they meet the cap.
    pub fn ordered(mut self, max_days: u32) -> Self {
        self.hard = self.hard.min(self.good);
        if self.good <= self.hard {
            self.good = self.hard.saturating_add(1);
        }
        if self.easy <= self.good {
            self.easy = self.good.saturating_add(1);
        }
        Self {
            hard: clamp_interval(self.hard, max_days),
            good: clamp_interval(self.good, max_days),
            easy: clamp_interval(self.easy, max_days),
        }
    }

    pub fn is_ordered(&self, max_days: u32) -> bool {
        self.hard <= self.good
            && self.good <= self.easy
            && (self.good < self.easy || self.easy == max_days)
    }
}

/// Candidate intervals before and after fuzz
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecallIntervals {
    pub base: IntervalCandidates,
    /// `None` when fuzz is disabled
    pub fuzzed: Option<IntervalCandidates>,
}

impl RecallIntervals {
    pub fn effective(&self) -> IntervalCandidates {
        self.fuzzed.unwrap_or(self.base)
    }
}

struct RecallPlan {
    hard_stability: f64,
    good_stability: f64,
    easy_stability: f64,
    intervals: RecallIntervals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recall {
    Hard,
    Good,
    Easy,
}

impl RecallPlan {
    fn select(&self, recall: Recall) -> (u32, f64) {
        let chosen = self.intervals.effective();
        match recall {
            Recall::Hard => (chosen.hard, self.hard_stability),
            Recall::Good => (chosen.good, self.good_stability),
            Recall::Easy => (chosen.easy, self.easy_stability),
        }
    }
}

// ==================== Preview ====================

/// Outcome of each possible rating, computed without committing any
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulingPreview {
    pub again: Card,
    pub hard: Card,
    pub good: Card,
    pub easy: Card,
}

impl SchedulingPreview {
    pub fn get(&self, rating: Rating) -> &Card {
        match rating {
            Rating::Again => &self.again,
            Rating::Hard => &self.hard,
            Rating::Good => &self.good,
            Rating::Easy => &self.easy,
        }
    }
}

// ==================== Scheduler ====================

#[derive(Debug, Clone)]
pub struct Scheduler {
    params: Parameters,
}

impl Scheduler {
    /// Validate and freeze the parameters
    ///
    /// Empty step sequences are replaced by their defaults first.
    pub fn new(params: Parameters) -> Result<Self, ParamsError> {
        let params = params.normalized();
        params.validate()?;
        Ok(Self { params })
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    /// Next state of `card` after a review with `rating` at `now`
    ///
    /// `card.elapsed_days` must already reflect the time since the last review.
    pub fn review(&self, card: &Card, rating: Rating, now: DateTime<Utc>) -> Result<Card, ScheduleError> {
        let card = self.checked(card)?;
        let next = match card.state {
            CardState::New => self.review_new(card, rating, now),
            CardState::Learning => self.review_learning(card, rating, now, false),
            CardState::Relearning => self.review_learning(card, rating, now, true),
            CardState::Review => self.review_review(card, rating, now),
        };
        Ok(next)
    }

    /// Outcome cards for all four ratings
    pub fn preview(&self, card: &Card, now: DateTime<Utc>) -> Result<SchedulingPreview, ScheduleError> {
        Ok(SchedulingPreview {
            again: self.review(card, Rating::Again, now)?,
            hard: self.review(card, Rating::Hard, now)?,
            good: self.review(card, Rating::Good, now)?,
            easy: self.review(card, Rating::Easy, now)?,
        })
    }

    /// Hard/Good/Easy intervals a recall from the Review state would produce
    pub fn recall_intervals(&self, card: &Card, now: DateTime<Utc>) -> Result<RecallIntervals, ScheduleError> {
        let mut card = self.checked(card)?;
        card.reps = card.reps.saturating_add(1);
        let elapsed = card.elapsed_days.max(1);
        let r = retrievability(elapsed, card.stability);
        Ok(self.plan_recall(&card, elapsed, r, now).intervals)
    }

    fn checked(&self, card: &Card) -> Result<Card, ScheduleError> {
        let diag = diagnose_card(card);
        let mut card = card.clone();
        if diag.is_healthy() {
            return Ok(card);
        }
        if !diag.is_recoverable() {
            let (field, value) = if diag.stability_finite {
                ("difficulty", card.difficulty)
            } else {
                ("stability", card.stability)
            };
            return Err(ScheduleError::InvalidCard { field, value });
        }
        sanitize_card(&mut card);
        Ok(card)
    }

    fn review_new(&self, mut card: Card, rating: Rating, now: DateTime<Utc>) -> Card {
        let w = &self.params.weights;
        card.reps = card.reps.saturating_add(1);
        card.last_review = Some(now);

        let s = initial_stability(w, rating);
        let d = initial_difficulty(w, rating);
        card.stability = s;
        card.difficulty = d;

        let steps = &self.params.learning_steps;

        match rating {
            Rating::Again => {
                card = enter_step(card, CardState::Learning, 0, step_delay(steps, 0), now);
            }
            Rating::Hard => {
                card = enter_step(card, CardState::Learning, 0, first_hard_delay(steps), now);
            }
            Rating::Good => {
                if steps.len() > 1 {
                    card = enter_step(card, CardState::Learning, 1, step_delay(steps, 1), now);
                } else {
                    card = self.graduate(card, s, d, now);
                }
            }
            Rating::Easy => {
                card = self.graduate(card, s, d, now);
                let good_s = initial_stability(w, Rating::Good);
                self.exceed_good_interval(&mut card, good_s, now);
            }
        }

        card
    }

    fn review_learning(&self, mut card: Card, rating: Rating, now: DateTime<Utc>, relearning: bool) -> Card {
        let w = &self.params.weights;
        card.reps = card.reps.saturating_add(1);
        card.last_review = Some(now);

        let steps = if relearning {
            &self.params.relearning_steps
        } else {
            &self.params.learning_steps
        };
        let state = card.state;

        let pre_stability = card.stability;
        card.stability = short_term_stability(w, card.stability, rating);
        card.difficulty = next_difficulty(w, card.difficulty, rating);

        match rating {
            Rating::Again => {
                // Lapses only count Review -> Relearning
                card = enter_step(card, state, 0, step_delay(steps, 0), now);
            }
            Rating::Hard => {
                let step = (card.step as usize).min(steps.len().saturating_sub(1));
                card = enter_step(card, state, step, step_delay(steps, step), now);
            }
            Rating::Good => {
                let next_step = card.step as usize + 1;
                if next_step >= steps.len() {
                    let (s, d) = (card.stability, card.difficulty);
                    card = self.graduate(card, s, d, now);
                } else {
                    card = enter_step(card, state, next_step, step_delay(steps, next_step), now);
                }
            }
            Rating::Easy => {
                let (s, d) = (card.stability, card.difficulty);
                card = self.graduate(card, s, d, now);
                let good_s = short_term_stability(w, pre_stability, Rating::Good);
                self.exceed_good_interval(&mut card, good_s, now);
            }
        }

        card
    }

    fn review_review(&self, mut card: Card, rating: Rating, now: DateTime<Utc>) -> Card {
        let w = &self.params.weights;
        card.reps = card.reps.saturating_add(1);
        card.last_review = Some(now);

        let elapsed = card.elapsed_days.max(1);
        let r = retrievability(elapsed, card.stability);

        // Stability math below uses the pre-update difficulty
        let pre_difficulty = card.difficulty;
        let difficulty = next_difficulty(w, pre_difficulty, rating);

        let recall = match rating {
            Rating::Again => {
                card.lapses = card.lapses.saturating_add(1);
                card.stability = stability_after_forgetting_capped(w, card.stability, pre_difficulty, r);
                card.difficulty = difficulty;
                let delay = step_delay(&self.params.relearning_steps, 0);
                return enter_step(card, CardState::Relearning, 0, delay, now);
            }
            Rating::Hard => Recall::Hard,
            Rating::Good => Recall::Good,
            Rating::Easy => Recall::Easy,
        };

        let plan = self.plan_recall(&card, elapsed, r, now);
        let (interval, stability) = plan.select(recall);
        let interval = clamp_interval(interval, self.params.max_interval_days);

        card.stability = stability;
        card.difficulty = difficulty;
        card.state = CardState::Review;
        card.step = 0;
        card.scheduled_days = interval;
        card.elapsed_days = 0;
        card.due = add_days(now, interval);
        card
    }

    /// `card` carries the incremented reps and pre-update stability/difficulty
    fn plan_recall(&self, card: &Card, elapsed: u32, r: f64, now: DateTime<Utc>) -> RecallPlan {
        let w = &self.params.weights;
        let retention = self.params.desired_retention;
        let max_days = self.params.max_interval_days;

        let hard_stability = stability_after_recall(w, card.stability, card.difficulty, r, Rating::Hard);
        let good_stability = stability_after_recall(w, card.stability, card.difficulty, r, Rating::Good);
        let easy_stability = stability_after_recall(w, card.stability, card.difficulty, r, Rating::Easy);

        let base = IntervalCandidates {
            hard: clamp_interval(next_interval(hard_stability, retention), max_days),
            good: clamp_interval(next_interval(good_stability, retention), max_days),
            easy: clamp_interval(next_interval(easy_stability, retention), max_days),
        }
        .ordered(max_days);

        let fuzzed = self.params.enable_fuzz.then(|| {
            let seed = fuzz_seed(now, card.reps, card.difficulty, card.stability);
            IntervalCandidates {
                hard: apply_fuzz(base.hard, elapsed, max_days, seed),
                good: apply_fuzz(base.good, elapsed, max_days, seed.wrapping_add(1)),
                easy: apply_fuzz(base.easy, elapsed, max_days, seed.wrapping_add(2)),
            }
            .ordered(max_days)
        });

        RecallPlan {
            hard_stability,
            good_stability,
            easy_stability,
            intervals: RecallIntervals { base, fuzzed },
        }
    }

    fn graduate(&self, mut card: Card, stability: f64, difficulty: f64, now: DateTime<Utc>) -> Card {
        let interval = clamp_interval(
            next_interval(stability, self.params.desired_retention),
            self.params.max_interval_days,
        );
        card.state = CardState::Review;
        card.step = 0;
        card.stability = stability;
        card.difficulty = difficulty;
        card.scheduled_days = interval;
        card.elapsed_days = 0;
        card.due = add_days(now, interval);
        card
    }

    /// Push an Easy graduation past what Good would have scheduled
    fn exceed_good_interval(&self, card: &mut Card, good_stability: f64, now: DateTime<Utc>) {
        let max_days = self.params.max_interval_days;
        let good = clamp_interval(next_interval(good_stability, self.params.desired_retention), max_days);
        if card.scheduled_days <= good {
            card.scheduled_days = clamp_interval(good.saturating_add(1), max_days);
            card.due = add_days(now, card.scheduled_days);
        }
    }
}

fn enter_step(mut card: Card, state: CardState, step: usize, delay: Duration, now: DateTime<Utc>) -> Card {
    card.state = state;
    card.step = u32::try_from(step).unwrap_or(0);
    card.scheduled_days = 0;
    card.elapsed_days = 0;
    card.due = now.checked_add_signed(delay).unwrap_or(DateTime::<Utc>::MAX_UTC);
    card
}

fn step_delay(steps: &[Duration], index: usize) -> Duration {
    steps
        .get(index)
        .or_else(|| steps.last())
        .copied()
        .unwrap_or_else(|| Duration::minutes(1))
}

/// Midpoint of the first two learning steps, or the first step alone
fn first_hard_delay(steps: &[Duration]) -> Duration {
    match (steps.first(), steps.get(1)) {
        (Some(first), Some(second)) => first
            .checked_add(second)
            .map_or_else(|| *first.max(second), |sum| sum / 2),
        _ => step_delay(steps, 0),
    }
}

fn add_days(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    now.checked_add_signed(Duration::days(i64::from(days)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
