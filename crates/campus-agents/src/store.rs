//! Campus data store - telemetry and attendance records on SQLite
//!
//! The telemetry and attendance collaborators are narrow: most-recent-N
//! telemetry by timestamp, and check-in/query for attendance. Schema beyond
//! those contracts is incidental.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

/// How many telemetry records "latest" fetches
pub const TELEMETRY_FETCH_LIMIT: i64 = 10;

/// One telemetry reading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryRecord {
    /// Record id
    pub id: String,
    /// Reporting device
    pub device_id: String,
    /// Reading kind, e.g. `temperature`, `occupancy`
    pub kind: String,
    /// Reading value
    pub value: f64,
    /// Unit, when the kind has one
    pub unit: Option<String>,
    /// Where the device sits
    pub location: Option<String>,
    /// Reading time
    pub timestamp: DateTime<Utc>,
}

/// SQLite-backed store for telemetry and attendance records
#[derive(Clone)]
pub struct CampusStore {
    pool: SqlitePool,
}

impl CampusStore {
    /// Connect to the store and ensure the schema exists
    ///
    /// # Errors
    /// Returns `Error::Store` when the database is unreachable.
    pub async fn connect(url: &str) -> Result<Self> {
        // An in-memory database exists per connection; the pool must not
        // fan out or the schema vanishes
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS telemetry (
                id TEXT PRIMARY KEY,
                device_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                value REAL NOT NULL,
                unit TEXT,
                location TEXT,
                timestamp TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS attendance (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                event_name TEXT NOT NULL,
                checked_in INTEGER NOT NULL,
                timestamp TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        info!("Campus store ready");
        Ok(Self { pool })
    }

    /// Insert a telemetry reading
    ///
    /// # Errors
    /// Returns `Error::Store` on database failures.
    pub async fn insert_telemetry(&self, record: &TelemetryRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO telemetry (id, device_id, kind, value, unit, location, timestamp)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.device_id)
        .bind(&record.kind)
        .bind(record.value)
        .bind(&record.unit)
        .bind(&record.location)
        .bind(record.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Fetch the most recent readings, newest first
    ///
    /// # Errors
    /// Returns `Error::Store` on database failures.
    pub async fn latest_telemetry(&self, limit: i64) -> Result<Vec<TelemetryRecord>> {
        let rows = sqlx::query(
            "SELECT id, device_id, kind, value, unit, location, timestamp
             FROM telemetry ORDER BY timestamp DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(TelemetryRecord {
                id: row.try_get("id")?,
                device_id: row.try_get("device_id")?,
                kind: row.try_get("kind")?,
                value: row.try_get("value")?,
                unit: row.try_get("unit")?,
                location: row.try_get("location")?,
                timestamp: row.try_get("timestamp")?,
            });
        }
        debug!(count = records.len(), "Fetched telemetry");
        Ok(records)
    }

    /// Record a check-in for a user at an event
    ///
    /// # Errors
    /// Returns `Error::Store` on database failures.
    pub async fn check_in(&self, user_id: &str, event_name: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO attendance (id, user_id, event_name, checked_in, timestamp)
             VALUES (?, ?, ?, 1, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(event_name)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        debug!(user_id = %user_id, event = %event_name, "Check-in stored");
        Ok(())
    }

    /// Names of events a user checked in to, optionally filtered to one
    /// event (case-insensitive match)
    ///
    /// # Errors
    /// Returns `Error::Store` on database failures.
    pub async fn attended_events(
        &self,
        user_id: &str,
        event_name: Option<&str>,
    ) -> Result<Vec<String>> {
        let rows = match event_name {
            Some(event) => {
                sqlx::query(
                    "SELECT event_name FROM attendance
                     WHERE user_id = ? AND LOWER(event_name) = LOWER(?) AND checked_in = 1
                     ORDER BY timestamp",
                )
                .bind(user_id)
                .bind(event)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT event_name FROM attendance
                     WHERE user_id = ? AND checked_in = 1
                     ORDER BY timestamp",
                )
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            events.push(row.try_get("event_name")?);
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    async fn memory_store() -> CampusStore {
        CampusStore::connect("sqlite::memory:").await.unwrap()
    }

    fn reading(id: &str, hour: u32) -> TelemetryRecord {
        TelemetryRecord {
            id: id.to_string(),
            device_id: "room-12-ac".to_string(),
            kind: "temperature".to_string(),
            value: 21.5,
            unit: Some("C".to_string()),
            location: Some("Room 12".to_string()),
            timestamp: Utc.with_ymd_and_hms(2025, 3, 3, hour, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_latest_telemetry_newest_first_with_limit() {
        let store = memory_store().await;
        for (i, hour) in [8u32, 12, 10].iter().enumerate() {
            store
                .insert_telemetry(&reading(&format!("r-{}", i), *hour))
                .await
                .unwrap();
        }

        let latest = store.latest_telemetry(2).await.unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].id, "r-1"); // 12:00
        assert_eq!(latest[1].id, "r-2"); // 10:00
    }

    #[tokio::test]
    async fn test_check_in_and_query_all() {
        let store = memory_store().await;
        store.check_in("s123", "AI Lecture").await.unwrap();
        store.check_in("s123", "Robotics Lab").await.unwrap();
        store.check_in("s999", "AI Lecture").await.unwrap();

        let events = store.attended_events("s123", None).await.unwrap();
        assert_eq!(events, vec!["AI Lecture", "Robotics Lab"]);
    }

    #[tokio::test]
    async fn test_query_specific_event_case_insensitive() {
        let store = memory_store().await;
        store.check_in("s123", "AI Lecture").await.unwrap();

        let hit = store
            .attended_events("s123", Some("ai lecture"))
            .await
            .unwrap();
        assert_eq!(hit.len(), 1);

        let miss = store
            .attended_events("s123", Some("Chemistry"))
            .await
            .unwrap();
        assert!(miss.is_empty());
    }
}
