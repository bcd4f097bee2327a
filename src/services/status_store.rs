//! Read-only adapter over the `store_status` event log.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Wire format for event timestamps. Lexical order of this format matches
/// chronological order, which the range and MAX queries rely on.
pub const EVENT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Active,
    Inactive,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    /// Only "active" counts as uptime; any other value is inactive.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("active") {
            Self::Active
        } else {
            Self::Inactive
        }
    }
}

/// Raw event row. The timestamp stays textual here so a malformed value
/// skips one event during reconstruction instead of failing the whole query.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StatusEventRow {
    pub timestamp_utc: String,
    pub status: String,
}

pub fn format_event_time(instant: DateTime<Utc>) -> String {
    instant.format(EVENT_TIME_FORMAT).to_string()
}

pub fn parse_event_time(raw: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), EVENT_TIME_FORMAT).ok()?;
    Some(Utc.from_utc_datetime(&naive))
}

/// Most recent event strictly before `bound`.
pub async fn latest_before(
    db: &SqlitePool,
    store_id: &str,
    bound: DateTime<Utc>,
) -> Result<Option<StatusEventRow>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT timestamp_utc, status
        FROM store_status
        WHERE store_id = ? AND timestamp_utc < ?
        ORDER BY timestamp_utc DESC
        LIMIT 1
        "#,
    )
    .bind(store_id)
    .bind(format_event_time(bound))
    .fetch_optional(db)
    .await
}

/// Events with `start <= timestamp <= end`, ascending.
pub async fn events_between(
    db: &SqlitePool,
    store_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<StatusEventRow>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT timestamp_utc, status
        FROM store_status
        WHERE store_id = ? AND timestamp_utc BETWEEN ? AND ?
        ORDER BY timestamp_utc ASC
        "#,
    )
    .bind(store_id)
    .bind(format_event_time(start))
    .bind(format_event_time(end))
    .fetch_all(db)
    .await
}

/// Timestamp of the store's most recent event across all time, if any.
pub async fn latest_event_time(
    db: &SqlitePool,
    store_id: &str,
) -> Result<Option<String>, sqlx::Error> {
    let row: (Option<String>,) =
        sqlx::query_as("SELECT MAX(timestamp_utc) FROM store_status WHERE store_id = ?")
            .bind(store_id)
            .fetch_one(db)
            .await?;
    Ok(row.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{insert_status_event, test_pool};

    #[test]
    fn parses_known_statuses_and_defaults_unknown_to_inactive() {
        assert_eq!(Status::parse("active"), Status::Active);
        assert_eq!(Status::parse(" Active "), Status::Active);
        assert_eq!(Status::parse("inactive"), Status::Inactive);
        assert_eq!(Status::parse("offline"), Status::Inactive);
        assert_eq!(Status::parse(""), Status::Inactive);

        for status in [Status::Active, Status::Inactive] {
            assert_eq!(Status::parse(status.as_str()), status);
        }
    }

    #[test]
    fn event_time_round_trips_through_text() {
        let formatted = "2025-01-06 12:30:05";
        let parsed = parse_event_time(formatted).expect("parse");
        assert_eq!(format_event_time(parsed), formatted);

        assert!(parse_event_time("not-a-time").is_none());
        assert!(parse_event_time("2025-01-06T12:30:05").is_none());
    }

    #[tokio::test]
    async fn latest_before_excludes_the_bound_itself() {
        let pool = test_pool().await;
        insert_status_event(&pool, "S1", "2025-01-06 11:00:00", "active").await;
        insert_status_event(&pool, "S1", "2025-01-06 12:00:00", "inactive").await;
        insert_status_event(&pool, "S2", "2025-01-06 11:30:00", "active").await;

        let bound = parse_event_time("2025-01-06 12:00:00").unwrap();
        let row = latest_before(&pool, "S1", bound)
            .await
            .expect("query")
            .expect("row");
        assert_eq!(row.timestamp_utc, "2025-01-06 11:00:00");
        assert_eq!(row.status, "active");

        let none = latest_before(&pool, "S1", parse_event_time("2025-01-06 11:00:00").unwrap())
            .await
            .expect("query");
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn events_between_is_inclusive_and_ascending() {
        let pool = test_pool().await;
        insert_status_event(&pool, "S1", "2025-01-06 10:59:59", "active").await;
        insert_status_event(&pool, "S1", "2025-01-06 11:00:00", "inactive").await;
        insert_status_event(&pool, "S1", "2025-01-06 11:30:00", "active").await;
        insert_status_event(&pool, "S1", "2025-01-06 12:00:00", "inactive").await;
        insert_status_event(&pool, "S1", "2025-01-06 12:00:01", "active").await;

        let start = parse_event_time("2025-01-06 11:00:00").unwrap();
        let end = parse_event_time("2025-01-06 12:00:00").unwrap();
        let rows = events_between(&pool, "S1", start, end).await.expect("query");
        let times: Vec<&str> = rows.iter().map(|row| row.timestamp_utc.as_str()).collect();
        assert_eq!(
            times,
            vec![
                "2025-01-06 11:00:00",
                "2025-01-06 11:30:00",
                "2025-01-06 12:00:00"
            ]
        );
    }

    #[tokio::test]
    async fn latest_event_time_is_none_for_unknown_store() {
        let pool = test_pool().await;
        insert_status_event(&pool, "S1", "2025-01-06 11:00:00", "active").await;

        let latest = latest_event_time(&pool, "S1").await.expect("query");
        assert_eq!(latest.as_deref(), Some("2025-01-06 11:00:00"));

        let missing = latest_event_time(&pool, "S9").await.expect("query");
        assert!(missing.is_none());
    }
}
