//! Review pipeline
//!
//! Each review or undo is one unit of work: lock the card, compute, then write
//! card state, review log and audit record together. Undo restores the
//! snapshot kept in the newest review log verbatim and deletes that log.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use lexicon_algo::{CardState, ParamsError, Rating, ScheduleError, Scheduler, SchedulingPreview};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::config::SrsConfig;
use crate::db::{AuditRecord, CardRecord, ReviewLog, StoreError, StudyStore, StudyTx};

/// Longest review duration accepted from a client (10 minutes)
pub const MAX_REVIEW_DURATION_MS: u32 = 600_000;

pub const MAX_HISTORY_LIMIT: i64 = 200;

#[derive(Debug, Error)]
pub enum StudyError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("card not found: {0}")]
    CardNotFound(String),
    #[error("card has no reviews to undo")]
    NothingToUndo,
    #[error("review cannot be undone")]
    NotUndoable,
    #[error("undo window expired")]
    UndoWindowExpired,
    #[error("scheduling error: {0}")]
    Schedule(#[from] ScheduleError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl StudyError {
    /// Whether the message is meant for the end user rather than the logs
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            StudyError::Validation(_)
                | StudyError::CardNotFound(_)
                | StudyError::NothingToUndo
                | StudyError::NotUndoable
                | StudyError::UndoWindowExpired
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCardInput {
    pub card_id: String,
    pub rating: Rating,
    #[serde(default)]
    pub duration_ms: Option<u32>,
}

impl ReviewCardInput {
    pub fn new(card_id: impl Into<String>, rating: Rating) -> Self {
        Self {
            card_id: card_id.into(),
            rating,
            duration_ms: None,
        }
    }

    pub fn with_duration_ms(mut self, duration_ms: u32) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn validate(&self) -> Result<(), StudyError> {
        if self.card_id.trim().is_empty() {
            return Err(StudyError::Validation("card id is required".to_string()));
        }
        if let Some(duration) = self.duration_ms {
            if duration > MAX_REVIEW_DURATION_MS {
                return Err(StudyError::Validation(format!(
                    "duration_ms must be at most {MAX_REVIEW_DURATION_MS} (got {duration})"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct StudyService<S> {
    store: S,
    scheduler: Arc<Scheduler>,
    undo_window: Duration,
}

impl<S: StudyStore> StudyService<S> {
    pub fn new(store: S, scheduler: Scheduler, undo_window: Duration) -> Self {
        Self {
            store,
            scheduler: Arc::new(scheduler),
            undo_window,
        }
    }

    /// Build the scheduler from configuration; invalid weights fail here
    pub fn from_config(store: S, config: &SrsConfig) -> Result<Self, ParamsError> {
        let scheduler = Scheduler::new(config.parameters())?;
        Ok(Self::new(store, scheduler, config.undo_window))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn undo_window(&self) -> Duration {
        self.undo_window
    }

    pub async fn create_card(&self, now: DateTime<Utc>) -> Result<CardRecord, StudyError> {
        let record = CardRecord::new(now);
        self.store.insert_card(&record).await?;
        tracing::debug!(card_id = %record.id, "card created");
        Ok(record)
    }

    pub async fn get_card(&self, card_id: &str) -> Result<CardRecord, StudyError> {
        self.store
            .get_card(card_id)
            .await?
            .ok_or_else(|| StudyError::CardNotFound(card_id.to_string()))
    }

    /// Outcome of each rating if the card were reviewed at `now`
    pub async fn preview(&self, card_id: &str, now: DateTime<Utc>) -> Result<SchedulingPreview, StudyError> {
        let record = self.get_card(card_id).await?;
        let card = record.card.with_elapsed_at(now);
        Ok(self.scheduler.preview(&card, now)?)
    }

    pub async fn review(&self, input: &ReviewCardInput, now: DateTime<Utc>) -> Result<CardRecord, StudyError> {
        input.validate()?;

        let mut tx = self.store.begin().await?;
        let mut record = tx
            .get_card_for_update(&input.card_id)
            .await?
            .ok_or_else(|| StudyError::CardNotFound(input.card_id.clone()))?;

        let snapshot = record.card.clone();
        let was_due = snapshot.is_due(now);
        let next = self
            .scheduler
            .review(&snapshot.with_elapsed_at(now), input.rating, now)?;

        record.card = next;
        record.updated_at = now;
        tx.update_card(&record).await?;

        let log = ReviewLog {
            id: Uuid::new_v4().to_string(),
            card_id: record.id.clone(),
            rating: input.rating,
            prev_state: Some(snapshot.clone()),
            duration_ms: input.duration_ms,
            reviewed_at: now,
        };
        tx.create_review_log(&log).await?;

        let changes = json!({
            "rating": { "new": input.rating.as_str() },
            "state": { "old": snapshot.state.as_str(), "new": record.card.state.as_str() },
            "stability": { "old": snapshot.stability, "new": record.card.stability },
        });
        tx.log_audit(&AuditRecord::card_update(&record.id, changes, now))
            .await?;

        tx.commit().await?;

        tracing::info!(
            card_id = %record.id,
            rating = %input.rating,
            was_due,
            state = %record.card.state,
            scheduled_days = record.card.scheduled_days,
            due = %record.card.due,
            "card reviewed"
        );

        Ok(record)
    }

    /// Revert the newest review of a card
    pub async fn undo(&self, card_id: &str, now: DateTime<Utc>) -> Result<CardRecord, StudyError> {
        let mut tx = self.store.begin().await?;
        let mut record = tx
            .get_card_for_update(card_id)
            .await?
            .ok_or_else(|| StudyError::CardNotFound(card_id.to_string()))?;

        let log = tx
            .last_review_log(card_id)
            .await?
            .ok_or(StudyError::NothingToUndo)?;
        let prev_state = log.prev_state.clone().ok_or(StudyError::NotUndoable)?;
        if now - log.reviewed_at > self.undo_window {
            return Err(StudyError::UndoWindowExpired);
        }

        let old_state: CardState = record.card.state;
        record.card = prev_state;
        record.updated_at = now;
        tx.update_card(&record).await?;
        tx.delete_review_log(&log.id).await?;

        let changes = json!({
            "undo": { "old": log.rating.as_str() },
            "state": { "old": old_state.as_str(), "new": record.card.state.as_str() },
        });
        tx.log_audit(&AuditRecord::card_update(&record.id, changes, now))
            .await?;

        tx.commit().await?;

        tracing::info!(
            card_id = %record.id,
            rating = %log.rating,
            state = %record.card.state,
            "review undone"
        );

        Ok(record)
    }

    /// Review logs, newest first
    pub async fn review_history(&self, card_id: &str, limit: i64, offset: i64) -> Result<Vec<ReviewLog>, StudyError> {
        if limit < 1 || offset < 0 {
            return Err(StudyError::Validation(
                "limit must be positive and offset non-negative".to_string(),
            ));
        }
        self.get_card(card_id).await?;

        let logs = self
            .store
            .review_logs(card_id, limit.min(MAX_HISTORY_LIMIT), offset)
            .await?;
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_input_validation() {
        assert!(ReviewCardInput::new("c1", Rating::Good).validate().is_ok());
        assert!(ReviewCardInput::new("c1", Rating::Good)
            .with_duration_ms(MAX_REVIEW_DURATION_MS)
            .validate()
            .is_ok());

        let err = ReviewCardInput::new("  ", Rating::Good).validate().unwrap_err();
        assert!(matches!(err, StudyError::Validation(_)));

        let err = ReviewCardInput::new("c1", Rating::Easy)
            .with_duration_ms(MAX_REVIEW_DURATION_MS + 1)
            .validate()
            .unwrap_err();
        assert!(matches!(err, StudyError::Validation(_)));
    }

    #[test]
    fn test_review_input_deserialize() {
        let input: ReviewCardInput =
            serde_json::from_str(r#"{"cardId":"abc","rating":"hard","durationMs":1500}"#).unwrap();
        assert_eq!(input, ReviewCardInput::new("abc", Rating::Hard).with_duration_ms(1500));

        let input: ReviewCardInput = serde_json::from_str(r#"{"cardId":"abc","rating":"again"}"#).unwrap();
        assert_eq!(input.duration_ms, None);
    }

    #[test]
    fn test_user_facing_classification() {
        assert!(StudyError::NothingToUndo.is_user_facing());
        assert!(StudyError::NotUndoable.is_user_facing());
        assert!(StudyError::UndoWindowExpired.is_user_facing());
        assert!(StudyError::CardNotFound("x".into()).is_user_facing());
        assert!(!StudyError::Schedule(ScheduleError::UnknownState("bogus".into())).is_user_facing());
        assert!(!StudyError::Store(StoreError::Sql(sqlx::Error::PoolTimedOut)).is_user_facing());
    }

    #[test]
    fn test_undo_error_messages_are_distinct() {
        assert_eq!(StudyError::NothingToUndo.to_string(), "card has no reviews to undo");
        assert_eq!(StudyError::NotUndoable.to_string(), "review cannot be undone");
        assert_eq!(StudyError::UndoWindowExpired.to_string(), "undo window expired");
    }
}
