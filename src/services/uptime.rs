//! Timeline reconstruction: turns sparse status events into gap-free
//! uptime/downtime durations for a single window.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::status_store::{self, parse_event_time, Status, StatusEventRow};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowMetrics {
    pub uptime_seconds: i64,
    pub downtime_seconds: i64,
}

/// Reconstructs `[start, end)` for one store and sums seconds by state.
///
/// The state at `start` is taken from the latest event strictly before the
/// window, falling back to `default_prior` when the store has no earlier
/// event. Query failures propagate; the report builder treats them as a
/// build failure rather than fabricating a zeroed window.
pub async fn window_metrics(
    db: &SqlitePool,
    store_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    default_prior: Status,
) -> Result<WindowMetrics, sqlx::Error> {
    if start >= end {
        return Ok(WindowMetrics::default());
    }

    let prior = status_store::latest_before(db, store_id, start).await?;
    let initial = prior
        .map(|row| Status::parse(&row.status))
        .unwrap_or(default_prior);
    let events = status_store::events_between(db, store_id, start, end).await?;

    Ok(accumulate(initial, &events, start, end))
}

/// Boundary walk over `(start, initial)`, each in-window event, and a
/// terminal marker at `end` whose state is never read. Each consecutive pair
/// forms one segment attributed to the leading boundary's state.
fn accumulate(
    initial: Status,
    events: &[StatusEventRow],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> WindowMetrics {
    let mut boundaries: Vec<(DateTime<Utc>, Status)> = Vec::with_capacity(events.len() + 2);
    boundaries.push((start, initial));
    for event in events {
        match parse_event_time(&event.timestamp_utc) {
            Some(at) => boundaries.push((at, Status::parse(&event.status))),
            None => {
                tracing::warn!(
                    timestamp = %event.timestamp_utc,
                    "skipping status event with unparseable timestamp"
                );
            }
        }
    }
    boundaries.push((end, initial));

    let mut metrics = WindowMetrics::default();
    for pair in boundaries.windows(2) {
        let (segment_start, state) = pair[0];
        let segment_end = pair[1].0;
        let seconds = (segment_end - segment_start).num_seconds();
        if seconds < 0 {
            // Clock skew or malformed data; drop the segment instead of
            // pushing a negative duration into the totals.
            tracing::warn!(
                %segment_start,
                %segment_end,
                "negative segment duration; excluding from totals"
            );
            continue;
        }
        match state {
            Status::Active => metrics.uptime_seconds += seconds,
            Status::Inactive => metrics.downtime_seconds += seconds,
        }
    }
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{insert_status_event, test_pool};
    use chrono::{Duration, TimeZone};

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 6, h, m, s).unwrap()
    }

    fn event(timestamp: &str, status: &str) -> StatusEventRow {
        StatusEventRow {
            timestamp_utc: timestamp.to_string(),
            status: status.to_string(),
        }
    }

    #[test]
    fn zero_events_attribute_whole_window_to_default_state() {
        let start = at(11, 0, 0);
        let end = at(12, 0, 0);

        let inactive = accumulate(Status::Inactive, &[], start, end);
        assert_eq!(inactive.uptime_seconds, 0);
        assert_eq!(inactive.downtime_seconds, 3600);

        let active = accumulate(Status::Active, &[], start, end);
        assert_eq!(active.uptime_seconds, 3600);
        assert_eq!(active.downtime_seconds, 0);
    }

    #[test]
    fn mid_window_flip_splits_the_hour() {
        let start = at(11, 0, 0);
        let end = at(12, 0, 0);
        let events = [
            event("2025-01-06 11:00:00", "active"),
            event("2025-01-06 11:30:00", "inactive"),
        ];

        let metrics = accumulate(Status::Inactive, &events, start, end);
        assert_eq!(metrics.uptime_seconds, 1800);
        assert_eq!(metrics.downtime_seconds, 1800);
    }

    #[test]
    fn durations_conserve_the_window_length() {
        let start = at(0, 0, 0);
        let end = at(23, 59, 59);
        let events = [
            event("2025-01-06 03:12:41", "inactive"),
            event("2025-01-06 07:00:00", "active"),
            event("2025-01-06 07:00:00", "inactive"),
            event("2025-01-06 19:45:13", "active"),
        ];

        let metrics = accumulate(Status::Active, &events, start, end);
        let window_seconds = (end - start).num_seconds();
        assert_eq!(
            metrics.uptime_seconds + metrics.downtime_seconds,
            window_seconds
        );
    }

    #[test]
    fn unparseable_timestamps_are_skipped_without_aborting() {
        let start = at(11, 0, 0);
        let end = at(12, 0, 0);
        let events = [
            event("garbage", "inactive"),
            event("2025-01-06 11:30:00", "active"),
        ];

        let metrics = accumulate(Status::Inactive, &events, start, end);
        assert_eq!(metrics.downtime_seconds, 1800);
        assert_eq!(metrics.uptime_seconds, 1800);
        assert_eq!(
            metrics.uptime_seconds + metrics.downtime_seconds,
            (end - start).num_seconds()
        );
    }

    #[test]
    fn negative_segments_are_excluded_not_propagated() {
        let start = at(10, 0, 0);
        let end = at(11, 0, 0);
        // An out-of-window timestamp slipped into the row set: the segment
        // running backwards from the window start is dropped.
        let events = [event("2025-01-06 09:30:00", "active")];

        let metrics = accumulate(Status::Inactive, &events, start, end);
        assert_eq!(metrics.downtime_seconds, 0);
        assert_eq!(metrics.uptime_seconds, 5400);
        assert!(metrics.uptime_seconds >= 0 && metrics.downtime_seconds >= 0);
    }

    #[tokio::test]
    async fn empty_window_yields_zero_metrics_without_queries() {
        let pool = test_pool().await;
        let instant = at(12, 0, 0);

        let metrics = window_metrics(&pool, "S1", instant, instant, Status::Inactive)
            .await
            .expect("window");
        assert_eq!(metrics, WindowMetrics::default());
    }

    #[tokio::test]
    async fn prior_event_overrides_the_default_state() {
        let pool = test_pool().await;
        insert_status_event(&pool, "S1", "2025-01-06 09:00:00", "active").await;

        let metrics = window_metrics(&pool, "S1", at(11, 0, 0), at(12, 0, 0), Status::Inactive)
            .await
            .expect("window");
        assert_eq!(metrics.uptime_seconds, 3600);
        assert_eq!(metrics.downtime_seconds, 0);
    }

    #[tokio::test]
    async fn store_with_no_events_uses_default_for_entire_window() {
        let pool = test_pool().await;

        let metrics = window_metrics(&pool, "S1", at(11, 0, 0), at(12, 0, 0), Status::Inactive)
            .await
            .expect("window");
        assert_eq!(metrics.uptime_seconds, 0);
        assert_eq!(metrics.downtime_seconds, 3600);
    }

    #[tokio::test]
    async fn window_metrics_conserves_duration_over_seeded_events() {
        let pool = test_pool().await;
        insert_status_event(&pool, "S1", "2025-01-06 10:15:00", "inactive").await;
        insert_status_event(&pool, "S1", "2025-01-06 11:20:00", "active").await;
        insert_status_event(&pool, "S1", "2025-01-06 11:40:00", "inactive").await;
        insert_status_event(&pool, "S1", "2025-01-06 11:55:00", "active").await;

        let start = at(11, 0, 0);
        let end = at(12, 0, 0);
        let metrics = window_metrics(&pool, "S1", start, end, Status::Active)
            .await
            .expect("window");
        assert_eq!(metrics.uptime_seconds, 20 * 60 + 5 * 60);
        assert_eq!(metrics.downtime_seconds, 20 * 60 + 15 * 60);
        assert_eq!(
            metrics.uptime_seconds + metrics.downtime_seconds,
            Duration::hours(1).num_seconds()
        );
    }
}
