//! Health check endpoint (for load balancers and the UI)

use axum::response::Json;
use serde::Serialize;

/// Simple health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `healthy` when the process answers
    pub status: &'static str,
    /// Crate version
    pub version: &'static str,
}

/// Simple health check
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}
