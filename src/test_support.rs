use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::config::MonitorConfig;
use crate::db;
use crate::services::report_jobs::ReportJobService;
use crate::services::status_store::Status;
use crate::state::AppState;

pub fn test_config() -> MonitorConfig {
    MonitorConfig {
        database_url: "sqlite::memory:".to_string(),
        default_timezone: "America/Chicago".to_string(),
        default_prior_status: Status::Inactive,
        max_concurrent_reports: 2,
    }
}

/// In-memory SQLite with the full schema. A single connection keeps every
/// query in the test on the same memory database.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite pool");
    db::ensure_schema(&pool).await.expect("schema");
    pool
}

pub async fn test_state() -> AppState {
    let config = test_config();
    let pool = test_pool().await;
    let reports = Arc::new(ReportJobService::new(pool.clone(), &config));
    AppState {
        config,
        db: pool,
        reports,
    }
}

pub async fn insert_status_event(db: &SqlitePool, store_id: &str, timestamp_utc: &str, status: &str) {
    sqlx::query("INSERT INTO store_status (store_id, timestamp_utc, status) VALUES (?, ?, ?)")
        .bind(store_id)
        .bind(timestamp_utc)
        .bind(status)
        .execute(db)
        .await
        .expect("insert status event");
}

pub async fn insert_timezone(db: &SqlitePool, store_id: &str, timezone_str: &str) {
    sqlx::query("INSERT INTO timezones (store_id, timezone_str) VALUES (?, ?)")
        .bind(store_id)
        .bind(timezone_str)
        .execute(db)
        .await
        .expect("insert timezone");
}
