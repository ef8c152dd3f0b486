use std::str::FromStr;

use chrono::{DateTime, Utc};
use lexicon_algo::{Card, CardState};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

use crate::db::StoreError;

/// A persisted card: identity plus the scheduler's memory state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRecord {
    pub id: String,
    pub card: Card,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CardRecord {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            card: Card::new(now),
            created_at: now,
            updated_at: now,
        }
    }
}

pub async fn insert_card(conn: &mut SqliteConnection, record: &CardRecord) -> Result<(), StoreError> {
    let card = &record.card;
    sqlx::query(
        r#"
        INSERT INTO "cards" (
            "id", "state", "step", "stability", "difficulty", "due", "lastReview",
            "reps", "lapses", "scheduledDays", "elapsedDays", "createdAt", "updatedAt"
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.id)
    .bind(card.state.as_str())
    .bind(i64::from(card.step))
    .bind(card.stability)
    .bind(card.difficulty)
    .bind(card.due)
    .bind(card.last_review)
    .bind(i64::from(card.reps))
    .bind(i64::from(card.lapses))
    .bind(i64::from(card.scheduled_days))
    .bind(i64::from(card.elapsed_days))
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn select_card(conn: &mut SqliteConnection, card_id: &str) -> Result<Option<CardRecord>, StoreError> {
    let row = sqlx::query(r#"SELECT * FROM "cards" WHERE "id" = ? LIMIT 1"#)
        .bind(card_id)
        .fetch_optional(conn)
        .await?;

    row.as_ref().map(map_card_row).transpose()
}

/// Take the database write lock, then read the card
///
/// SQLite has no row locks. A no-op write as the first statement of the
/// transaction acquires the RESERVED lock, so a concurrent reviewer of the
/// same card blocks here (up to busy_timeout) instead of reading stale state.
pub async fn select_card_for_update(
    conn: &mut SqliteConnection,
    card_id: &str,
) -> Result<Option<CardRecord>, StoreError> {
    sqlx::query(r#"UPDATE "cards" SET "id" = "id" WHERE "id" = ?"#)
        .bind(card_id)
        .execute(&mut *conn)
        .await?;

    select_card(conn, card_id).await
}

/// Replace every memory-state column of the card
pub async fn update_card(conn: &mut SqliteConnection, record: &CardRecord) -> Result<(), StoreError> {
    let card = &record.card;
    let result = sqlx::query(
        r#"
        UPDATE "cards" SET
            "state" = ?, "step" = ?, "stability" = ?, "difficulty" = ?, "due" = ?,
            "lastReview" = ?, "reps" = ?, "lapses" = ?, "scheduledDays" = ?,
            "elapsedDays" = ?, "updatedAt" = ?
        WHERE "id" = ?
        "#,
    )
    .bind(card.state.as_str())
    .bind(i64::from(card.step))
    .bind(card.stability)
    .bind(card.difficulty)
    .bind(card.due)
    .bind(card.last_review)
    .bind(i64::from(card.reps))
    .bind(i64::from(card.lapses))
    .bind(i64::from(card.scheduled_days))
    .bind(i64::from(card.elapsed_days))
    .bind(record.updated_at)
    .bind(&record.id)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::Sql(sqlx::Error::RowNotFound));
    }
    Ok(())
}

fn map_card_row(row: &SqliteRow) -> Result<CardRecord, StoreError> {
    let id: String = row.try_get("id")?;
    let state_raw: String = row.try_get("state")?;
    let state = CardState::from_str(&state_raw).map_err(|source| StoreError::InvalidCard {
        id: id.clone(),
        source,
    })?;

    let card = Card {
        state,
        step: get_u32(row, "step", &id)?,
        stability: row.try_get("stability")?,
        difficulty: row.try_get("difficulty")?,
        due: row.try_get("due")?,
        last_review: row.try_get("lastReview")?,
        reps: get_u32(row, "reps", &id)?,
        lapses: get_u32(row, "lapses", &id)?,
        scheduled_days: get_u32(row, "scheduledDays", &id)?,
        elapsed_days: get_u32(row, "elapsedDays", &id)?,
    };

    Ok(CardRecord {
        card,
        created_at: row.try_get("createdAt")?,
        updated_at: row.try_get("updatedAt")?,
        id,
    })
}

pub(crate) fn get_u32(row: &SqliteRow, column: &'static str, id: &str) -> Result<u32, StoreError> {
    let value: i64 = row.try_get(column)?;
    u32::try_from(value).map_err(|_| StoreError::Corrupt {
        table: "cards",
        id: id.to_string(),
        reason: format!("{column} out of range: {value}"),
    })
}
