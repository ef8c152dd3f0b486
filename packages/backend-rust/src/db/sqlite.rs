use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::db::config::SqliteConfig;
use crate::db::operations::{self, AuditRecord, CardRecord, ReviewLog, ENTITY_CARD};
use crate::db::schema::run_migrations;
use crate::db::{StoreError, StudyStore, StudyTx};

/// SQLite-backed [`StudyStore`]
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) and migrate the database described by `config`
    pub async fn open(config: &SqliteConfig) -> Result<Self, SqliteInitError> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| SqliteInitError::Io(e.to_string()))?;
            }
        }

        let db_url = format!("sqlite:{}?mode=rwc", config.path.display());
        let options = SqliteConnectOptions::from_str(&db_url)
            .map_err(|e| SqliteInitError::Config(e.to_string()))?
            .create_if_missing(true)
            .journal_mode(config.journal_mode.to_sqlx())
            .busy_timeout(config.busy_timeout)
            .foreign_keys(config.foreign_keys);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(SqliteInitError::Sqlx)?;

        run_migrations(&pool).await.map_err(SqliteInitError::Sqlx)?;

        tracing::debug!(path = %config.path.display(), "sqlite study store ready");

        Ok(Self { pool })
    }
}

#[async_trait]
impl StudyStore for SqliteStore {
    type Tx = SqliteTx;

    async fn begin(&self) -> Result<SqliteTx, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(SqliteTx { tx })
    }

    async fn get_card(&self, card_id: &str) -> Result<Option<CardRecord>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        operations::select_card(&mut conn, card_id).await
    }

    async fn insert_card(&self, record: &CardRecord) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        operations::insert_card(&mut conn, record).await
    }

    async fn review_logs(&self, card_id: &str, limit: i64, offset: i64) -> Result<Vec<ReviewLog>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        operations::select_review_logs(&mut conn, card_id, limit, offset).await
    }

    async fn audit_records(&self, card_id: &str) -> Result<Vec<AuditRecord>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        operations::select_audit_records(&mut conn, ENTITY_CARD, card_id).await
    }
}

/// One SQLite transaction; rolls back on drop unless committed
pub struct SqliteTx {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl StudyTx for SqliteTx {
    async fn get_card_for_update(&mut self, card_id: &str) -> Result<Option<CardRecord>, StoreError> {
        operations::select_card_for_update(&mut self.tx, card_id).await
    }

    async fn update_card(&mut self, record: &CardRecord) -> Result<(), StoreError> {
        operations::update_card(&mut self.tx, record).await
    }

    async fn create_review_log(&mut self, log: &ReviewLog) -> Result<(), StoreError> {
        operations::insert_review_log(&mut self.tx, log).await
    }

    async fn last_review_log(&mut self, card_id: &str) -> Result<Option<ReviewLog>, StoreError> {
        operations::select_last_review_log(&mut self.tx, card_id).await
    }

    async fn delete_review_log(&mut self, log_id: &str) -> Result<(), StoreError> {
        operations::delete_review_log(&mut self.tx, log_id).await
    }

    async fn log_audit(&mut self, record: &AuditRecord) -> Result<(), StoreError> {
        operations::insert_audit_record(&mut self.tx, record).await
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SqliteInitError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}
