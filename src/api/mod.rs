//! Web API for the Campus assistant
//!
//! Routes: chat, speech recognize/synthesize/stop, calendar sync/test,
//! health. CORS is permissive and requests are traced.

pub mod calendar;
pub mod chat;
pub mod health;
pub mod speech;


use axum::routing::{get, post};
use axum::Router;
use campus_agents::{GraphCalendarClient, SessionStore, TriageAgent};
use campus_audio::VoiceGateway;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared state for the HTTP surface
#[derive(Clone)]
pub struct AppState {
    /// The triage orchestrator
    pub triage: Arc<TriageAgent>,
    /// Per-session conversation histories
    pub sessions: Arc<SessionStore>,
    /// Speech subsystem, absent when not configured on this host
    pub voice: Option<Arc<VoiceGateway>>,
    /// Graph calendar client, absent without a token
    pub calendar: Option<Arc<GraphCalendarClient>>,
}

/// Create the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(chat::chat))
        .route("/speech/recognize", post(speech::recognize))
        .route("/speech/synthesize", post(speech::synthesize))
        .route("/speech/stop", post(speech::stop))
        .route("/calendar/sync", get(calendar::sync))
        .route("/calendar/test", get(calendar::test))
        .route("/health", get(health::health_check))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
