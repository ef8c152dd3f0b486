//! # lexicon-backend
//!
//! Review orchestration for the spaced-repetition core: persistence contract,
//! SQLite store, undo-capable review pipeline, configuration and logging.

pub mod config;
pub mod db;
pub mod logging;
pub mod services;

pub use config::{Config, ConfigError, SrsConfig};
pub use db::{SqliteStore, StoreError, StudyStore, StudyTx};
pub use services::{ReviewCardInput, StudyError, StudyService};
