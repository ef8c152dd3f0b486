//! Study store
//!
//! The review pipeline talks to storage through two traits: [`StudyStore`]
//! for reads outside a unit of work, and [`StudyTx`] for everything inside
//! one. A transaction that is dropped without [`StudyTx::commit`] rolls back,
//! so an error return or a cancelled future leaves no partial writes.

pub mod config;
pub mod operations;
pub mod schema;
pub mod sqlite;

use async_trait::async_trait;
use lexicon_algo::ScheduleError;
use thiserror::Error;

pub use operations::{AuditRecord, CardRecord, ReviewLog};
pub use sqlite::{SqliteInitError, SqliteStore, SqliteTx};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sql error: {0}")]
    Sql(#[from] sqlx::Error),
    #[error("snapshot encoding error: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error("invalid card {id}: {source}")]
    InvalidCard {
        id: String,
        #[source]
        source: ScheduleError,
    },
    #[error("corrupt {table} row {id}: {reason}")]
    Corrupt {
        table: &'static str,
        id: String,
        reason: String,
    },
}

#[async_trait]
pub trait StudyStore: Send + Sync {
    type Tx: StudyTx;

    /// Open a unit of work
    async fn begin(&self) -> Result<Self::Tx, StoreError>;

    async fn get_card(&self, card_id: &str) -> Result<Option<CardRecord>, StoreError>;

    async fn insert_card(&self, record: &CardRecord) -> Result<(), StoreError>;

    /// Logs for a card, newest first
    async fn review_logs(&self, card_id: &str, limit: i64, offset: i64) -> Result<Vec<ReviewLog>, StoreError>;

    async fn audit_records(&self, card_id: &str) -> Result<Vec<AuditRecord>, StoreError>;
}

#[async_trait]
pub trait StudyTx: Send {
    /// Read a card, holding the lock until commit or rollback
    async fn get_card_for_update(&mut self, card_id: &str) -> Result<Option<CardRecord>, StoreError>;

    /// Full replacement of the card's memory state
    async fn update_card(&mut self, record: &CardRecord) -> Result<(), StoreError>;

    async fn create_review_log(&mut self, log: &ReviewLog) -> Result<(), StoreError>;

    async fn last_review_log(&mut self, card_id: &str) -> Result<Option<ReviewLog>, StoreError>;

    async fn delete_review_log(&mut self, log_id: &str) -> Result<(), StoreError>;

    async fn log_audit(&mut self, record: &AuditRecord) -> Result<(), StoreError>;

    async fn commit(self) -> Result<(), StoreError>;
}
