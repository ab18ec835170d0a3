//! Chat endpoint - one conversation turn per request
//!
//! An empty message is rejected before the orchestrator is ever invoked.
//! The session's history mutex is held for the whole turn: single writer
//! per session.

use super::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use campus_agents::DEFAULT_SESSION;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Chat request body
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The user message
    #[serde(default)]
    pub message: String,
    /// Optional session key; one history per session
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Chat response body
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// The aggregated assistant response
    pub response: String,
}

/// Error body shared by the API endpoints
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
}

/// Handle one chat turn
pub async fn chat(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Response {
    if request.message.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "No message provided".to_string(),
            }),
        )
            .into_response();
    }

    info!(chars = request.message.len(), "Received chat message");

    let session_id = request
        .session_id
        .unwrap_or_else(|| DEFAULT_SESSION.to_string());
    let session = state.sessions.session(&session_id).await;
    let mut history = session.lock().await;

    match state.triage.handle_turn(&mut history, &request.message).await {
        Ok(response) => Json(ChatResponse { response }).into_response(),
        Err(e) => {
            error!(error = %e, "Chat turn failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("I'm having trouble connecting to my AI services: {}", e),
                }),
            )
                .into_response()
        }
    }
}
