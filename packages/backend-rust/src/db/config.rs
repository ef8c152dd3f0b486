use std::path::PathBuf;
use std::time::Duration;

use crate::config::{env_bool, env_parse, ConfigError};

#[derive(Debug, Clone)]
pub struct SqliteConfig {
    pub path: PathBuf,
    pub journal_mode: SqliteJournalMode,
    pub busy_timeout: Duration,
    pub max_connections: u32,
    pub foreign_keys: bool,
}

impl SqliteConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = lookup("LEXICON_DB_PATH")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);

        let journal_mode = match lookup("SQLITE_JOURNAL_MODE") {
            Some(raw) => SqliteJournalMode::parse(raw.trim()).ok_or_else(|| ConfigError::Invalid {
                key: "SQLITE_JOURNAL_MODE",
                value: raw.clone(),
                reason: "expected WAL, DELETE, TRUNCATE, PERSIST, MEMORY or OFF".to_string(),
            })?,
            None => SqliteJournalMode::Wal,
        };

        let busy_timeout_ms: u64 = env_parse(lookup, "SQLITE_BUSY_TIMEOUT_MS", 5000)?;
        let max_connections: u32 = env_parse(lookup, "SQLITE_MAX_CONNECTIONS", 5)?;
        let foreign_keys = env_bool(lookup, "SQLITE_FOREIGN_KEYS", true)?;

        Ok(Self {
            path,
            journal_mode,
            busy_timeout: Duration::from_millis(busy_timeout_ms),
            max_connections: max_connections.max(1),
            foreign_keys,
        })
    }

    /// Settings for a database at `path` with the defaults for everything else
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            journal_mode: SqliteJournalMode::Wal,
            busy_timeout: Duration::from_millis(5000),
            max_connections: 5,
            foreign_keys: true,
        }
    }
}

pub fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lexicon")
        .join("study.db")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqliteJournalMode {
    Wal,
    Delete,
    Truncate,
    Persist,
    Memory,
    Off,
}

impl SqliteJournalMode {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "WAL" => Some(Self::Wal),
            "DELETE" => Some(Self::Delete),
            "TRUNCATE" => Some(Self::Truncate),
            "PERSIST" => Some(Self::Persist),
            "MEMORY" => Some(Self::Memory),
            "OFF" => Some(Self::Off),
            _ => None,
        }
    }

    pub fn to_sqlx(self) -> sqlx::sqlite::SqliteJournalMode {
        match self {
            SqliteJournalMode::Wal => sqlx::sqlite::SqliteJournalMode::Wal,
            SqliteJournalMode::Delete => sqlx::sqlite::SqliteJournalMode::Delete,
            SqliteJournalMode::Truncate => sqlx::sqlite::SqliteJournalMode::Truncate,
            SqliteJournalMode::Persist => sqlx::sqlite::SqliteJournalMode::Persist,
            SqliteJournalMode::Memory => sqlx::sqlite::SqliteJournalMode::Memory,
            SqliteJournalMode::Off => sqlx::sqlite::SqliteJournalMode::Off,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_defaults() {
        let config = SqliteConfig::from_lookup(&|_: &str| None).unwrap();
        assert_eq!(config.journal_mode, SqliteJournalMode::Wal);
        assert_eq!(config.busy_timeout, Duration::from_millis(5000));
        assert_eq!(config.max_connections, 5);
        assert!(config.foreign_keys);
        assert!(config.path.ends_with("lexicon/study.db"));
    }

    #[test]
    fn test_sqlite_overrides() {
        let config = SqliteConfig::from_lookup(&|key: &str| match key {
            "SQLITE_JOURNAL_MODE" => Some("delete".to_string()),
            "SQLITE_BUSY_TIMEOUT_MS" => Some("250".to_string()),
            "SQLITE_MAX_CONNECTIONS" => Some("0".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.journal_mode, SqliteJournalMode::Delete);
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert_eq!(config.max_connections, 1);
    }

    #[test]
    fn test_sqlite_bad_journal_mode() {
        let err = SqliteConfig::from_lookup(&|key: &str| {
            (key == "SQLITE_JOURNAL_MODE").then(|| "fast".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "SQLITE_JOURNAL_MODE", .. }));
    }
}
