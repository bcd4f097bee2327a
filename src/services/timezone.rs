//! Store timezone lookup. Purely cosmetic: window arithmetic stays in UTC,
//! and a missing or broken zone never fails a report.

use chrono_tz::Tz;
use sqlx::SqlitePool;

pub async fn store_timezone(db: &SqlitePool, store_id: &str, default_zone: &str) -> Tz {
    let fallback = default_zone.parse::<Tz>().unwrap_or(Tz::UTC);

    let row: Option<(String,)> =
        match sqlx::query_as("SELECT timezone_str FROM timezones WHERE store_id = ?")
            .bind(store_id)
            .fetch_optional(db)
            .await
        {
            Ok(row) => row,
            Err(err) => {
                tracing::error!(
                    error = %err,
                    store_id = %store_id,
                    "timezone lookup failed; using default zone"
                );
                return fallback;
            }
        };

    match row {
        Some((zone,)) => match zone.trim().parse::<Tz>() {
            Ok(tz) => tz,
            Err(_) => {
                tracing::warn!(
                    store_id = %store_id,
                    zone = %zone,
                    "unrecognized timezone for store; using default zone"
                );
                fallback
            }
        },
        None => {
            tracing::info!(
                store_id = %store_id,
                default = %default_zone,
                "no timezone recorded for store; using default zone"
            );
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{insert_timezone, test_pool};

    #[tokio::test]
    async fn returns_recorded_zone_for_store() {
        let pool = test_pool().await;
        insert_timezone(&pool, "S1", "Asia/Kolkata").await;

        let tz = store_timezone(&pool, "S1", "America/Chicago").await;
        assert_eq!(tz, chrono_tz::Asia::Kolkata);
    }

    #[tokio::test]
    async fn missing_store_falls_back_to_default_zone() {
        let pool = test_pool().await;

        let tz = store_timezone(&pool, "S1", "America/Chicago").await;
        assert_eq!(tz, chrono_tz::America::Chicago);
    }

    #[tokio::test]
    async fn unrecognized_zone_falls_back_to_default_zone() {
        let pool = test_pool().await;
        insert_timezone(&pool, "S1", "Mars/Olympus_Mons").await;

        let tz = store_timezone(&pool, "S1", "America/Chicago").await;
        assert_eq!(tz, chrono_tz::America::Chicago);
    }
}
