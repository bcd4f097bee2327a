use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;

pub fn connect_lazy(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("invalid sqlite database url {database_url}"))?
        .create_if_missing(true);
    Ok(SqlitePoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(8))
        .connect_lazy_with(options))
}

/// Creates the event-store, timezone, and report-archive tables if absent.
/// Timestamps are stored as `YYYY-MM-DD HH:MM:SS` UTC text, so lexical order
/// matches chronological order.
pub async fn ensure_schema(db: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS store_status (
            store_id TEXT NOT NULL,
            timestamp_utc TEXT NOT NULL,
            status TEXT NOT NULL
        )
        "#,
    )
    .execute(db)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_store_status_store_time
        ON store_status (store_id, timestamp_utc)
        "#,
    )
    .execute(db)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS timezones (
            store_id TEXT PRIMARY KEY,
            timezone_str TEXT NOT NULL
        )
        "#,
    )
    .execute(db)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reports (
            report_id TEXT PRIMARY KEY,
            store_id TEXT NOT NULL,
            repdata TEXT NOT NULL,
            generated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(db)
    .await?;

    Ok(())
}
