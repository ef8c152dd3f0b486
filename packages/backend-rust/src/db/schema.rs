use sqlx::SqlitePool;

pub const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

pub const SCHEMA_VERSION: &str = "1";

/// Split a script into statements on `;`, ignoring quoted text and `--` comments
pub fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut in_comment = false;
    let mut chars = sql.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_comment {
            if ch == '\n' {
                in_comment = false;
                current.push(ch);
            }
            continue;
        }

        match ch {
            '-' if !in_single_quote && !in_double_quote && chars.peek() == Some(&'-') => {
                in_comment = true;
                continue;
            }
            '\'' if !in_double_quote => {
                in_single_quote = !in_single_quote;
            }
            '"' if !in_single_quote => {
                in_double_quote = !in_double_quote;
            }
            ';' if !in_single_quote && !in_double_quote => {
                let stmt = current.trim();
                if !stmt.is_empty() {
                    statements.push(stmt.to_string());
                }
                current.clear();
                continue;
            }
            _ => {}
        }

        current.push(ch);
    }

    let tail = current.trim();
    if !tail.is_empty() {
        statements.push(tail.to_string());
    }

    statements
}

pub async fn schema_version(pool: &SqlitePool) -> Result<Option<String>, sqlx::Error> {
    let has_metadata: Option<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' AND name = '_db_metadata'")
            .fetch_optional(pool)
            .await?;
    if has_metadata.is_none() {
        return Ok(None);
    }

    sqlx::query_scalar(r#"SELECT "value" FROM "_db_metadata" WHERE "key" = 'schema_version'"#)
        .fetch_optional(pool)
        .await
}

/// Apply the schema once; later starts see the recorded version and skip
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    if schema_version(pool).await?.is_some() {
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    for stmt in split_sql_statements(SCHEMA_SQL) {
        sqlx::query(&stmt).execute(&mut *tx).await?;
    }

    sqlx::query(r#"INSERT OR REPLACE INTO "_db_metadata" ("key", "value") VALUES ('schema_version', ?)"#)
        .bind(SCHEMA_VERSION)
        .execute(&mut *tx)
        .await?;

    tx.commit().await
}
