//! Report builder: anchors the three trailing windows at the store's
//! reference instant and serializes the resulting metrics as a two-line CSV.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use super::status_store::{self, format_event_time, parse_event_time, Status};
use super::timezone;
use super::uptime;

pub const CSV_HEADER: [&str; 7] = [
    "store_id",
    "uptime_last_hour(min)",
    "uptime_last_day(hrs)",
    "uptime_last_week(hrs)",
    "downtime_last_hour(min)",
    "downtime_last_day(hrs)",
    "downtime_last_week(hrs)",
];

/// Finished report for one store. Hour metrics are minutes, day and week
/// metrics are hours, all rounded to two decimal places.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportArtifact {
    pub store_id: String,
    pub uptime_last_hour_min: f64,
    pub uptime_last_day_hrs: f64,
    pub uptime_last_week_hrs: f64,
    pub downtime_last_hour_min: f64,
    pub downtime_last_day_hrs: f64,
    pub downtime_last_week_hrs: f64,
}

impl ReportArtifact {
    /// Exactly two lines: the fixed header, then one data row. Field order in
    /// the struct matches the header.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer.write_record(&CSV_HEADER).context("write csv header")?;
        writer.serialize(self).context("write csv data row")?;
        writer.flush().context("flush csv buffer")?;
        let bytes = writer
            .into_inner()
            .map_err(|err| anyhow::anyhow!("failed to finish csv buffer: {err}"))?;
        String::from_utf8(bytes).context("report csv was not valid utf-8")
    }
}

/// The anchor for all three windows: the store's most recent event time, or
/// the wall clock when the store has never reported (logged as a data-quality
/// signal rather than silently absorbed).
pub async fn resolve_reference_instant(
    db: &SqlitePool,
    store_id: &str,
) -> Result<DateTime<Utc>, sqlx::Error> {
    match status_store::latest_event_time(db, store_id).await? {
        Some(raw) => match parse_event_time(&raw) {
            Some(at) => Ok(at),
            None => {
                tracing::warn!(
                    store_id = %store_id,
                    timestamp = %raw,
                    "latest event timestamp failed to parse; falling back to wall clock"
                );
                Ok(Utc::now())
            }
        },
        None => {
            tracing::info!(
                store_id = %store_id,
                "store has no status events; using wall clock as reference instant"
            );
            Ok(Utc::now())
        }
    }
}

pub async fn build_report(
    db: &SqlitePool,
    store_id: &str,
    default_prior: Status,
    default_zone: &str,
) -> Result<ReportArtifact> {
    let reference = resolve_reference_instant(db, store_id)
        .await
        .context("failed to resolve reference instant")?;

    // Local projection is display-only; the window math below stays in UTC.
    let zone = timezone::store_timezone(db, store_id, default_zone).await;
    tracing::debug!(
        store_id = %store_id,
        reference = %format_event_time(reference),
        local = %reference.with_timezone(&zone),
        "building uptime report"
    );

    let hour = uptime::window_metrics(
        db,
        store_id,
        reference - Duration::hours(1),
        reference,
        default_prior,
    )
    .await
    .context("hour window query failed")?;
    let day = uptime::window_metrics(
        db,
        store_id,
        reference - Duration::days(1),
        reference,
        default_prior,
    )
    .await
    .context("day window query failed")?;
    let week = uptime::window_metrics(
        db,
        store_id,
        reference - Duration::weeks(1),
        reference,
        default_prior,
    )
    .await
    .context("week window query failed")?;

    Ok(ReportArtifact {
        store_id: store_id.to_string(),
        uptime_last_hour_min: round2(hour.uptime_seconds as f64 / 60.0),
        uptime_last_day_hrs: round2(day.uptime_seconds as f64 / 3600.0),
        uptime_last_week_hrs: round2(week.uptime_seconds as f64 / 3600.0),
        downtime_last_hour_min: round2(hour.downtime_seconds as f64 / 60.0),
        downtime_last_day_hrs: round2(day.downtime_seconds as f64 / 3600.0),
        downtime_last_week_hrs: round2(week.downtime_seconds as f64 / 3600.0),
    })
}

/// Two decimal places, halves rounded away from zero.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
