use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

use crate::db::StoreError;

pub const ENTITY_CARD: &str = "card";
pub const ACTION_UPDATE: &str = "update";

/// A before/after summary of one change to an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub action: String,
    pub changes: Value,
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn card_update(card_id: &str, changes: Value, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            entity_type: ENTITY_CARD.to_string(),
            entity_id: card_id.to_string(),
            action: ACTION_UPDATE.to_string(),
            changes,
            created_at: now,
        }
    }
}

pub async fn insert_audit_record(conn: &mut SqliteConnection, record: &AuditRecord) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO "audit_log" ("id", "entityType", "entityId", "action", "changes", "createdAt")
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.id)
    .bind(&record.entity_type)
    .bind(&record.entity_id)
    .bind(&record.action)
    .bind(serde_json::to_string(&record.changes)?)
    .bind(record.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Audit trail of one entity, oldest first
pub async fn select_audit_records(
    conn: &mut SqliteConnection,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<AuditRecord>, StoreError> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM "audit_log"
        WHERE "entityType" = ? AND "entityId" = ?
        ORDER BY rowid ASC
        "#,
    )
    .bind(entity_type)
    .bind(entity_id)
    .fetch_all(conn)
    .await?;

    rows.iter()
        .map(|row| -> Result<AuditRecord, StoreError> {
            let changes: String = row.try_get("changes")?;
            Ok(AuditRecord {
                id: row.try_get("id")?,
                entity_type: row.try_get("entityType")?,
                entity_id: row.try_get("entityId")?,
                action: row.try_get("action")?,
                changes: serde_json::from_str(&changes)?,
                created_at: row.try_get("createdAt")?,
            })
        })
        .collect()
}
