//! Durable store of completed report artifacts, keyed by job id. Written
//! best-effort on completion and read on polls for jobs that finished before
//! a process restart.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::status_store::format_event_time;

pub async fn put(
    db: &SqlitePool,
    job_id: Uuid,
    store_id: &str,
    artifact_csv: &str,
    generated_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO reports (report_id, store_id, repdata, generated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (report_id)
        DO UPDATE SET repdata = excluded.repdata, generated_at = excluded.generated_at
        "#,
    )
    .bind(job_id.to_string())
    .bind(store_id)
    .bind(artifact_csv)
    .bind(format_event_time(generated_at))
    .execute(db)
    .await?;
    Ok(())
}

pub async fn get(db: &SqlitePool, job_id: Uuid) -> Result<Option<String>, sqlx::Error> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT repdata FROM reports WHERE report_id = ? LIMIT 1")
            .bind(job_id.to_string())
            .fetch_optional(db)
            .await?;
    Ok(row.map(|row| row.0))
}
