//! Speech endpoints - recognize, synthesize, stop
//!
//! All three answer 503 when the speech subsystem failed to initialize on
//! this host.

use super::chat::ErrorResponse;
use super::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Recognition response body
#[derive(Debug, Serialize)]
pub struct RecognizeResponse {
    /// Recognized text
    pub text: String,
}

/// Synthesis request body
#[derive(Debug, Deserialize)]
pub struct SynthesizeRequest {
    /// Text to speak
    #[serde(default)]
    pub text: String,
}

/// Result body for synthesize/stop
#[derive(Debug, Serialize)]
pub struct SpeechResult {
    /// Outcome message
    pub result: String,
}

fn unavailable() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse {
            error: "Speech functionality is not available on this server.".to_string(),
        }),
    )
        .into_response()
}

/// Recognize one utterance from the microphone
pub async fn recognize(State(state): State<AppState>) -> Response {
    let Some(voice) = state.voice else {
        return unavailable();
    };

    match voice.recognize_once().await {
        Ok(text) if text.is_empty() => StatusCode::NO_CONTENT.into_response(),
        Ok(text) => Json(RecognizeResponse { text }).into_response(),
        Err(e) => {
            error!(error = %e, "Speech recognition failed");
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

/// Synthesize text and play it
pub async fn synthesize(
    State(state): State<AppState>,
    Json(request): Json<SynthesizeRequest>,
) -> Response {
    if request.text.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "No text provided".to_string(),
            }),
        )
            .into_response();
    }

    let Some(voice) = state.voice else {
        return unavailable();
    };

    match voice.speak(&request.text).await {
        Ok(outcome) => Json(SpeechResult {
            result: outcome.message().to_string(),
        })
        .into_response(),
        Err(e) => {
            error!(error = %e, "Speech synthesis failed");
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

/// Request that in-flight synthesis stop (best-effort)
pub async fn stop(State(state): State<AppState>) -> Response {
    let Some(voice) = state.voice else {
        return unavailable();
    };

    voice.stop();
    Json(SpeechResult {
        result: "Speech stop requested".to_string(),
    })
    .into_response()
}
