//! Microsoft Graph calendar client
//!
//! One authenticated calendar identity (`/me`), four operations used by the
//! Calendar provider plus the sync/test endpoints: create event, calendar
//! view, schedule availability, delete event.

use crate::error::{Error, Result};
use campus_llm::util::{mask_api_key, truncate_safe};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};

/// Graph API base URL
pub const GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Default free-slot interval in minutes
pub const DEFAULT_SLOT_MINUTES: i64 = 30;

/// Configuration for the Graph calendar client
#[derive(Clone)]
pub struct GraphCalendarConfig {
    /// OAuth bearer token for the calendar identity
    pub access_token: String,
    /// API base URL (overridable for tests)
    pub base_url: String,
    /// Fixed UTC offset used for displayed times, in minutes
    pub display_offset_minutes: i32,
    /// Label printed next to displayed times
    pub display_label: String,
    /// Request timeout
    pub timeout: Duration,
}

impl fmt::Debug for GraphCalendarConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphCalendarConfig")
            .field("access_token", &mask_api_key(&self.access_token))
            .field("base_url", &self.base_url)
            .field("display_offset_minutes", &self.display_offset_minutes)
            .field("display_label", &self.display_label)
            .finish()
    }
}

impl GraphCalendarConfig {
    /// Create a new configuration
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            base_url: GRAPH_BASE_URL.to_string(),
            display_offset_minutes: 0,
            display_label: "UTC".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Required: `GRAPH_ACCESS_TOKEN`. Optional:
    /// `CAMPUS_DISPLAY_UTC_OFFSET_MINUTES` (default 0),
    /// `CAMPUS_DISPLAY_TZ_LABEL` (default `UTC`).
    ///
    /// # Errors
    /// Returns `Error::Configuration` when the token is absent.
    pub fn from_env() -> Result<Self> {
        let access_token = std::env::var("GRAPH_ACCESS_TOKEN")
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::Configuration("GRAPH_ACCESS_TOKEN is not set".to_string()))?;

        let mut config = Self::new(access_token);
        if let Ok(offset) = std::env::var("CAMPUS_DISPLAY_UTC_OFFSET_MINUTES") {
            config.display_offset_minutes = offset.parse().map_err(|_| {
                Error::Configuration(
                    "CAMPUS_DISPLAY_UTC_OFFSET_MINUTES must be an integer".to_string(),
                )
            })?;
        }
        if let Ok(label) = std::env::var("CAMPUS_DISPLAY_TZ_LABEL") {
            config.display_label = label;
        }
        Ok(config)
    }
}

// ============================================================================
// API Types
// ============================================================================

/// A date-time as Graph represents it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDateTime {
    /// The timestamp text
    pub date_time: String,
    /// Time zone name, `UTC` on everything this client sends
    #[serde(default)]
    pub time_zone: Option<String>,
}

impl GraphDateTime {
    fn utc(value: &str) -> Self {
        Self {
            date_time: value.to_string(),
            time_zone: Some("UTC".to_string()),
        }
    }
}

/// A calendar event as returned by calendarView
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEvent {
    /// Event identifier
    pub id: String,
    /// Event subject
    #[serde(default)]
    pub subject: Option<String>,
    /// Body preview text
    #[serde(default)]
    pub body_preview: Option<String>,
    /// Start time
    pub start: GraphDateTime,
    /// End time
    pub end: GraphDateTime,
}

impl GraphEvent {
    /// The subject, or a placeholder when absent
    #[must_use]
    pub fn subject_or_placeholder(&self) -> &str {
        self.subject.as_deref().unwrap_or("(no subject)")
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateEventBody {
    subject: String,
    start: GraphDateTime,
    end: GraphDateTime,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleBody {
    schedules: Vec<String>,
    start_time: GraphDateTime,
    end_time: GraphDateTime,
    availability_view_interval: i64,
}

#[derive(Debug, Deserialize)]
struct ValueEnvelope<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleInfo {
    #[serde(default)]
    availability_view: Option<String>,
}

// ============================================================================
// Helpers
// ============================================================================

/// Parse a Graph timestamp (RFC 3339, or naive with fractional seconds as
/// calendarView returns) as UTC.
///
/// # Errors
/// Returns `Error::Graph` when no known format matches.
pub fn parse_graph_datetime(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(parsed.and_utc());
    }
    Err(Error::Graph(format!("unparseable timestamp '{}'", value)))
}

/// Decode an availabilityView string into free windows.
///
/// Each character covers one interval starting at `base`; '0' marks free.
#[must_use]
pub fn slots_from_availability(
    view: &str,
    base: DateTime<Utc>,
    interval_minutes: i64,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let interval = chrono::Duration::minutes(interval_minutes);
    view.chars()
        .enumerate()
        .filter(|(_, c)| *c == '0')
        .map(|(i, _)| {
            let start = base + interval * i32::try_from(i).unwrap_or(i32::MAX);
            (start, start + interval)
        })
        .collect()
}

// ============================================================================
// Client
// ============================================================================

/// Microsoft Graph calendar client
pub struct GraphCalendarClient {
    http: Client,
    config: GraphCalendarConfig,
}

impl GraphCalendarClient {
    /// Create a new client
    ///
    /// # Errors
    /// Returns `Error::Initialization` if the HTTP client cannot be built.
    pub fn new(config: GraphCalendarConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Initialization(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// Create a client from environment variables
    ///
    /// # Errors
    /// Returns `Error::Configuration` when `GRAPH_ACCESS_TOKEN` is absent.
    pub fn from_env() -> Result<Self> {
        Self::new(GraphCalendarConfig::from_env()?)
    }

    /// The display timezone label
    #[must_use]
    pub fn display_label(&self) -> &str {
        &self.config.display_label
    }

    /// Format a UTC instant in the configured display timezone
    #[must_use]
    pub fn display_time(&self, instant: DateTime<Utc>) -> String {
        let offset = FixedOffset::east_opt(self.config.display_offset_minutes * 60)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"));
        instant
            .with_timezone(&offset)
            .format("%Y-%m-%d %H:%M")
            .to_string()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::Graph(format!(
            "{}: {}",
            status,
            truncate_safe(&body, 300)
        )))
    }

    /// Create a calendar event
    ///
    /// # Errors
    /// Returns `Error::Graph` on a non-success response.
    #[instrument(skip(self), fields(subject = %subject))]
    pub async fn create_event(&self, subject: &str, start: &str, end: &str) -> Result<()> {
        let body = CreateEventBody {
            subject: subject.to_string(),
            start: GraphDateTime::utc(start),
            end: GraphDateTime::utc(end),
        };

        let response = self
            .http
            .post(self.url("/me/events"))
            .bearer_auth(&self.config.access_token)
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;

        debug!("Event created");
        Ok(())
    }

    /// List events in a range, ordered by start time
    ///
    /// # Errors
    /// Returns `Error::Graph` on a non-success response.
    #[instrument(skip(self))]
    pub async fn calendar_view(&self, start: &str, end: &str) -> Result<Vec<GraphEvent>> {
        let response = self
            .http
            .get(self.url("/me/calendarView"))
            .bearer_auth(&self.config.access_token)
            .query(&[
                ("startDateTime", start),
                ("endDateTime", end),
                ("$orderby", "start/dateTime"),
            ])
            .send()
            .await?;
        let response = Self::check(response).await?;

        let envelope: ValueEnvelope<GraphEvent> = response
            .json()
            .await
            .map_err(|e| Error::Graph(format!("invalid calendarView response: {}", e)))?;
        Ok(envelope.value)
    }

    /// Find free windows in a range via getSchedule
    ///
    /// # Errors
    /// Returns `Error::Graph` on a non-success response or an unparseable
    /// range start.
    #[instrument(skip(self))]
    pub async fn free_slots(
        &self,
        start: &str,
        end: &str,
        duration_minutes: i64,
    ) -> Result<Vec<(DateTime<Utc>, DateTime<Utc>)>> {
        let body = ScheduleBody {
            schedules: vec!["me".to_string()],
            start_time: GraphDateTime::utc(start),
            end_time: GraphDateTime::utc(end),
            availability_view_interval: duration_minutes,
        };

        let response = self
            .http
            .post(self.url("/me/calendar/getSchedule"))
            .bearer_auth(&self.config.access_token)
            .json(&body)
            .send()
            .await?;
        let response = Self::check(response).await?;

        let envelope: ValueEnvelope<ScheduleInfo> = response
            .json()
            .await
            .map_err(|e| Error::Graph(format!("invalid getSchedule response: {}", e)))?;

        let base = parse_graph_datetime(start)?;
        let mut slots = Vec::new();
        for schedule in envelope.value {
            if let Some(view) = schedule.availability_view {
                slots.extend(slots_from_availability(&view, base, duration_minutes));
            }
        }
        Ok(slots)
    }

    /// Delete an event by id
    ///
    /// # Errors
    /// Returns `Error::Graph` on a non-success response.
    #[instrument(skip(self), fields(event_id = %event_id))]
    pub async fn delete_event(&self, event_id: &str) -> Result<()> {
        let response = self
            .http
            .delete(self.url(&format!("/me/events/{}", event_id)))
            .bearer_auth(&self.config.access_token)
            .send()
            .await?;
        Self::check(response).await?;
        debug!("Event deleted");
        Ok(())
    }

    /// Fetch the authenticated user, as a connectivity check
    ///
    /// # Errors
    /// Returns `Error::Graph` on a non-success response.
    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<serde_json::Value> {
        let response = self
            .http
            .get(self.url("/me"))
            .bearer_auth(&self.config.access_token)
            .send()
            .await?;
        let response = Self::check(response).await?;
        response
            .json()
            .await
            .map_err(|e| Error::Graph(format!("invalid /me response: {}", e)))
    }
}
