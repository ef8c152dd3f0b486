//! FSRS-5 Scheduling
//!
//! - [`algorithm`] - memory model formulas (retrievability, stability, difficulty)
//! - [`params`] - weights and scheduler configuration
//! - [`fuzz`] - deterministic interval fuzz
//! - [`scheduler`] - card state machine

pub mod algorithm;
pub mod fuzz;
pub mod params;
pub mod scheduler;

pub use algorithm::{
    initial_difficulty, initial_stability, next_difficulty, next_interval, next_s_min,
    retrievability, short_term_stability, stability_after_forgetting,
    stability_after_forgetting_capped, stability_after_recall,
};
pub use fuzz::{apply_fuzz, fuzz_bounds, fuzz_seed};
pub use params::{validate_weights, Parameters, ParamsError, Weights};
pub use scheduler::{IntervalCandidates, RecallIntervals, ScheduleError, Scheduler, SchedulingPreview};
