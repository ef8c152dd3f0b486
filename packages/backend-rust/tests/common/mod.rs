#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::Connection;
use tempfile::TempDir;

use lexicon_algo::Rating;
use lexicon_backend::config::SrsConfig;
use lexicon_backend::db::config::SqliteConfig;
use lexicon_backend::db::{CardRecord, SqliteStore};
use lexicon_backend::services::{ReviewCardInput, StudyService};

pub struct TestEnv {
    // Dropping the directory deletes the database
    pub dir: TempDir,
    pub service: StudyService<SqliteStore>,
}

pub async fn setup() -> TestEnv {
    setup_with(SrsConfig::default()).await
}

pub async fn setup_with(srs: SrsConfig) -> TestEnv {
    let dir = TempDir::new().expect("failed to create temp dir");
    let config = SqliteConfig::at_path(db_path(&dir));
    let store = SqliteStore::open(&config)
        .await
        .expect("failed to open sqlite store");
    let service = StudyService::from_config(store, &srs).expect("default parameters are valid");
    TestEnv { dir, service }
}

fn db_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("study.db")
}

/// A connection that bypasses the store, for seeding rows the store would never write
pub async fn raw_connection(env: &TestEnv) -> SqliteConnection {
    SqliteConnection::connect_with(&SqliteConnectOptions::new().filename(db_path(&env.dir)))
        .await
        .expect("failed to open raw connection")
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap() + Duration::nanoseconds(123_456_789)
}

pub async fn review(env: &TestEnv, card_id: &str, rating: Rating, now: DateTime<Utc>) -> CardRecord {
    env.service
        .review(&ReviewCardInput::new(card_id, rating), now)
        .await
        .expect("review failed")
}
