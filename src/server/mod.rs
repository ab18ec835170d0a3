//! Server wiring: registry construction, state assembly, axum serve

use crate::api::{self, AppState};
use anyhow::{Context, Result};
use campus_agents::{
    build_registry, AttendanceAgent, CalendarAgent, GraphCalendarClient, IoTAgent, ProviderFactory,
    ProviderFailure, SessionStore, SpeechAgent, TriageAgent, TriageConfig,
};
use campus_audio::VoiceGateway;
use campus_llm::AzureChatClient;
use std::sync::Arc;
use tracing::{info, warn};

/// The candidate providers, in registration (and prompt) order
fn candidate_factories() -> Vec<Arc<dyn ProviderFactory>> {
    vec![
        Arc::new(CalendarAgent::new()),
        Arc::new(IoTAgent::new()),
        Arc::new(SpeechAgent::new()),
        Arc::new(AttendanceAgent::new()),
    ]
}

/// Build the triage orchestrator over the provider registry.
///
/// Provider failures are reported, not fatal; a missing triage model
/// configuration is fatal.
pub async fn build_triage() -> Result<(Arc<TriageAgent>, Vec<ProviderFailure>)> {
    let factories = candidate_factories();
    let (registry, failures) = build_registry(&factories).await;

    info!(
        providers = registry.len(),
        excluded = failures.len(),
        "Provider registry built"
    );

    let client = Arc::new(
        AzureChatClient::from_env()
            .context("triage model service: set AZURE_OPENAI_API_ENDPOINT, AZURE_OPENAI_API_KEY and AZURE_OPENAI_CHAT_DEPLOYMENT_NAME")?,
    );

    let triage = Arc::new(TriageAgent::new(
        client,
        Arc::new(registry),
        TriageConfig::default(),
    ));
    Ok((triage, failures))
}

/// Assemble the full HTTP state
pub async fn build_state() -> Result<AppState> {
    let (triage, _failures) = build_triage().await?;

    let voice = match VoiceGateway::from_env() {
        Ok(voice) => Some(Arc::new(voice)),
        Err(e) => {
            warn!(error = %e, "Speech endpoints disabled");
            None
        }
    };

    let calendar = match GraphCalendarClient::from_env() {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            warn!(error = %e, "Calendar endpoints disabled");
            None
        }
    };

    Ok(AppState {
        triage,
        sessions: Arc::new(SessionStore::new()),
        voice,
        calendar,
    })
}

/// Run the HTTP server until shutdown
pub async fn serve(host: &str, port: u16) -> Result<()> {
    let state = build_state().await?;
    let app = api::router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("Campus assistant listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
