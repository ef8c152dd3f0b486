//! # lexicon-algo - spaced-repetition core
//!
//! Pure Rust scheduling for vocabulary cards, with no I/O and no global state:
//!
//! - **FSRS-5 memory model** - retrievability, stability and difficulty updates
//! - **Scheduler** - New / Learning / Review / Relearning state machine
//! - **Fuzz** - seeded interval spread so cards do not cluster on one day
//!
//! ## Modules
//!
//! - [`fsrs`] - model formulas, parameters, fuzz and the scheduler
//! - [`sanitize`] - numeric guards (stability floor, difficulty clamp, interval cap)
//! - [`types`] - cards, ratings, states and constants
//!
//! ## Example
//!
//! ```rust
//! use chrono::Utc;
//! use lexicon_algo::{Card, CardState, Parameters, Rating, Scheduler};
//!
//! let scheduler = Scheduler::new(Parameters::default()).unwrap();
//! let now = Utc::now();
//! let card = scheduler.review(&Card::new(now), Rating::Easy, now).unwrap();
//! assert_eq!(card.state, CardState::Review);
//! assert!(card.scheduled_days >= 1);
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod fsrs;
pub mod sanitize;
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

pub use fsrs::{
    IntervalCandidates, Parameters, ParamsError, RecallIntervals, ScheduleError, Scheduler,
    SchedulingPreview, Weights,
};
pub use types::*;
