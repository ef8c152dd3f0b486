use chrono::{DateTime, Utc};
use lexicon_algo::{Card, Rating};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use crate::db::StoreError;

/// One completed review
///
/// `prev_state` is the full card as it was before the review. A log without
/// it (imported history) can never be undone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLog {
    pub id: String,
    pub card_id: String,
    pub rating: Rating,
    pub prev_state: Option<Card>,
    pub duration_ms: Option<u32>,
    pub reviewed_at: DateTime<Utc>,
}

pub async fn insert_review_log(conn: &mut SqliteConnection, log: &ReviewLog) -> Result<(), StoreError> {
    let prev_state = log.prev_state.as_ref().map(serde_json::to_string).transpose()?;

    sqlx::query(
        r#"
        INSERT INTO "review_logs" ("id", "cardId", "rating", "prevState", "durationMs", "reviewedAt")
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&log.id)
    .bind(&log.card_id)
    .bind(log.rating.as_str())
    .bind(prev_state)
    .bind(log.duration_ms.map(i64::from))
    .bind(log.reviewed_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// The most recently inserted log for a card
pub async fn select_last_review_log(
    conn: &mut SqliteConnection,
    card_id: &str,
) -> Result<Option<ReviewLog>, StoreError> {
    let row = sqlx::query(
        r#"SELECT * FROM "review_logs" WHERE "cardId" = ? ORDER BY "seq" DESC LIMIT 1"#,
    )
    .bind(card_id)
    .fetch_optional(conn)
    .await?;

    row.as_ref().map(map_review_log_row).transpose()
}

/// Logs for a card, newest first
pub async fn select_review_logs(
    conn: &mut SqliteConnection,
    card_id: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<ReviewLog>, StoreError> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM "review_logs"
        WHERE "cardId" = ?
        ORDER BY "seq" DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(card_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(conn)
    .await?;

    rows.iter().map(map_review_log_row).collect()
}

pub async fn delete_review_log(conn: &mut SqliteConnection, log_id: &str) -> Result<(), StoreError> {
    let result = sqlx::query(r#"DELETE FROM "review_logs" WHERE "id" = ?"#)
        .bind(log_id)
        .execute(conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::Sql(sqlx::Error::RowNotFound));
    }
    Ok(())
}

fn map_review_log_row(row: &SqliteRow) -> Result<ReviewLog, StoreError> {
    let id: String = row.try_get("id")?;

    let rating_raw: String = row.try_get("rating")?;
    let rating = Rating::parse(&rating_raw).ok_or_else(|| StoreError::Corrupt {
        table: "review_logs",
        id: id.clone(),
        reason: format!("unknown rating {rating_raw:?}"),
    })?;

    let prev_state_raw: Option<String> = row.try_get("prevState")?;
    let prev_state = prev_state_raw
        .as_deref()
        .map(serde_json::from_str::<Card>)
        .transpose()?;

    let duration_ms: Option<i64> = row.try_get("durationMs")?;
    let duration_ms = duration_ms
        .map(|value| {
            u32::try_from(value).map_err(|_| StoreError::Corrupt {
                table: "review_logs",
                id: id.clone(),
                reason: format!("durationMs out of range: {value}"),
            })
        })
        .transpose()?;

    Ok(ReviewLog {
        card_id: row.try_get("cardId")?,
        rating,
        prev_state,
        duration_ms,
        reviewed_at: row.try_get("reviewedAt")?,
        id,
    })
}
