//! Registry-build behavior with the real provider factories.
//!
//! One test function: environment variables are process-global, so every
//! scenario that depends on them runs under a single arrangement.

use campus_agents::dispatch::DelegationDispatcher;
use campus_agents::providers::{AttendanceAgent, CalendarAgent, IoTAgent, SpeechAgent};
use campus_agents::registry::build_registry;
use campus_agents::ProviderFactory;
use std::sync::Arc;

#[tokio::test]
async fn speech_misconfiguration_excludes_only_speech() {
    // Model service + calendar + store configured; speech deliberately not.
    std::env::set_var(
        "AZURE_OPENAI_API_ENDPOINT",
        "https://example.openai.azure.com",
    );
    std::env::set_var("AZURE_OPENAI_API_KEY", "test-key");
    std::env::set_var("GRAPH_ACCESS_TOKEN", "test-graph-token");
    std::env::set_var("CAMPUS_DATABASE_URL", "sqlite::memory:");
    std::env::remove_var("SPEECH_KEY");
    std::env::remove_var("SPEECH_REGION");

    let factories: Vec<Arc<dyn ProviderFactory>> = vec![
        Arc::new(CalendarAgent::new()),
        Arc::new(IoTAgent::new()),
        Arc::new(SpeechAgent::new()),
        Arc::new(AttendanceAgent::new()),
    ];

    let (registry, failures) = build_registry(&factories).await;

    // Build never raises; the misconfigured candidate is excluded in place
    assert_eq!(registry.names(), vec!["Calendar", "IoT", "Attendance"]);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].name, "Speech");
    assert!(failures[0].error.contains("SPEECH_KEY"));

    // Delegating to the excluded agent yields a readable listing, not an error
    let dispatcher = DelegationDispatcher::new(Arc::new(registry), false);
    let result = dispatcher.delegate("Speech", "listen").await;
    assert!(result.starts_with("Error: Agent 'Speech' is not recognized"));
    assert!(result.contains("Calendar"));
    assert!(result.contains("IoT"));
    assert!(result.contains("Attendance"));
}
