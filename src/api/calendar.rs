//! Calendar endpoints - event sync for the UI and a connectivity test
//!
//! Both answer 401 when no Graph token was configured at startup.

use super::chat::ErrorResponse;
use super::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use campus_agents::GraphEvent;
use chrono::{Datelike, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Query parameters for `/calendar/sync`
#[derive(Debug, Deserialize)]
pub struct SyncParams {
    /// Range start (ISO 8601); defaults to the first day of this month
    pub start_date: Option<String>,
    /// Range end (ISO 8601); defaults to the last day of this month
    pub end_date: Option<String>,
}

/// An event shaped for the UI calendar component
#[derive(Debug, Serialize)]
pub struct CalendarEvent {
    /// Event id
    pub id: String,
    /// Event title
    pub title: String,
    /// Body preview
    pub description: String,
    /// Start timestamp
    pub start: String,
    /// End timestamp
    pub end: String,
    /// UI category
    pub category: &'static str,
}

/// Sync response body
#[derive(Debug, Serialize)]
pub struct SyncResponse {
    /// Events in range
    pub events: Vec<CalendarEvent>,
}

/// Categorize an event for the UI by subject keywords
pub fn categorize(subject: &str) -> &'static str {
    let subject = subject.to_lowercase();
    if subject.contains("task") || subject.contains("todo") {
        "task"
    } else if subject.contains("reminder") {
        "reminder"
    } else if subject.contains("lunch") || subject.contains("dinner") || subject.contains("social")
    {
        "social"
    } else {
        "meeting"
    }
}

fn current_month_range() -> (String, String) {
    let today = Utc::now().date_naive();
    let first = NaiveDate::from_ymd_opt(today.year(), today.month(), 1)
        .unwrap_or(today);
    let next_month = if today.month() == 12 {
        NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1)
    };
    let last = next_month
        .and_then(|d| d.checked_sub_days(Days::new(1)))
        .unwrap_or(today);
    (
        format!("{}T00:00:00", first),
        format!("{}T00:00:00", last),
    )
}

fn to_ui_event(event: GraphEvent) -> CalendarEvent {
    let title = event.subject_or_placeholder().to_string();
    let category = categorize(&title);
    CalendarEvent {
        id: event.id,
        title,
        description: event.body_preview.unwrap_or_default(),
        start: event.start.date_time,
        end: event.end.date_time,
        category,
    }
}

/// Sync calendar events into the UI shape
pub async fn sync(State(state): State<AppState>, Query(params): Query<SyncParams>) -> Response {
    let Some(calendar) = state.calendar else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Graph access token is not available".to_string(),
            }),
        )
            .into_response();
    };

    let (default_start, default_end) = current_month_range();
    let start = params.start_date.unwrap_or(default_start);
    let end = params.end_date.unwrap_or(default_end);
    debug!(start = %start, end = %end, "Calendar sync requested");

    match calendar.calendar_view(&start, &end).await {
        Ok(events) => Json(SyncResponse {
            events: events.into_iter().map(to_ui_event).collect(),
        })
        .into_response(),
        Err(e) => {
            error!(error = %e, "Calendar sync failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Connectivity-test response body
#[derive(Debug, Serialize)]
pub struct TestResponse {
    /// `ok` or `error`
    pub status: &'static str,
    /// Whether a token was configured
    pub token_available: bool,
    /// Failure detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// The authenticated user, on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<serde_json::Value>,
}

/// Test Graph connectivity via `/me`
pub async fn test(State(state): State<AppState>) -> Response {
    let Some(calendar) = state.calendar else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(TestResponse {
                status: "error",
                token_available: false,
                message: Some("Graph access token is not available".to_string()),
                user: None,
            }),
        )
            .into_response();
    };

    match calendar.me().await {
        Ok(user) => Json(TestResponse {
            status: "ok",
            token_available: true,
            message: None,
            user: Some(user),
        })
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(TestResponse {
                status: "error",
                token_available: true,
                message: Some(e.to_string()),
                user: None,
            }),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_keywords() {
        assert_eq!(categorize("Finish TODO list"), "task");
        assert_eq!(categorize("Submission task due"), "task");
        assert_eq!(categorize("Reminder: pay fees"), "reminder");
        assert_eq!(categorize("Team lunch"), "social");
        assert_eq!(categorize("Dinner with mentors"), "social");
        assert_eq!(categorize("Social hour"), "social");
        assert_eq!(categorize("Sprint planning"), "meeting");
    }

    #[test]
    fn test_current_month_range_shape() {
        let (start, end) = current_month_range();
        assert!(start.ends_with("-01T00:00:00"));
        assert!(end.ends_with("T00:00:00"));
        assert!(start < end);
    }
}
