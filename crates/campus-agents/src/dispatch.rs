//! Delegation dispatcher - the single tool exposed to the triage model
//!
//! Delegation failures are recoverable by design: every failure mode
//! (unknown agent, provider invocation error) is converted to an error
//! string the orchestrating model can read and replan from. Nothing here
//! propagates an error past the dispatcher.

use crate::registry::ProviderRegistry;
use campus_llm::ToolDefinition;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Name of the delegation tool as advertised to the model
pub const DELEGATE_TOOL_NAME: &str = "delegate_to_agent";

/// Arguments of a delegation call
#[derive(Debug, Deserialize)]
pub struct DelegationRequest {
    /// Target provider name
    pub agent_name: String,
    /// The task or question for that provider
    pub query: String,
}

/// Routes delegated queries to registered providers
pub struct DelegationDispatcher {
    registry: Arc<ProviderRegistry>,
    show_thoughts: bool,
}

impl DelegationDispatcher {
    /// Create a new dispatcher
    #[must_use]
    pub fn new(registry: Arc<ProviderRegistry>, show_thoughts: bool) -> Self {
        Self {
            registry,
            show_thoughts,
        }
    }

    /// The tool definition advertised to the orchestrating model
    #[must_use]
    pub fn tool_definition() -> ToolDefinition {
        ToolDefinition::new(
            DELEGATE_TOOL_NAME,
            "Delegates a task to a specified specialized agent.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "agent_name": {
                        "type": "string",
                        "description": "The name of the agent to delegate to (e.g., \"Calendar\", \"IoT\")."
                    },
                    "query": {
                        "type": "string",
                        "description": "The query or task for the specified agent."
                    }
                },
                "required": ["agent_name", "query"]
            }),
        )
    }

    /// Delegate a query to a named provider.
    ///
    /// Always returns text: the provider's result verbatim on success, or an
    /// error string the model can act on.
    #[instrument(skip(self, query), fields(agent = %agent_name))]
    pub async fn delegate(&self, agent_name: &str, query: &str) -> String {
        let Some(provider) = self.registry.lookup(agent_name) else {
            let available = self.registry.names();
            debug!(available = ?available, "Delegation target not found");
            return format!(
                "Error: Agent '{}' is not recognized or available. Available agents are: {:?}",
                agent_name, available
            );
        };

        if self.show_thoughts {
            info!(agent = %agent_name, query = %query, "Delegating to agent");
        } else {
            debug!(agent = %agent_name, "Delegating to agent");
        }

        match provider.invoke(query).await {
            Ok(response) => {
                if self.show_thoughts {
                    info!(agent = %agent_name, response = %response, "Agent responded");
                }
                response
            }
            Err(e) => {
                let error_msg = format!("Error calling {} Agent: {}", agent_name, e);
                if self.show_thoughts {
                    info!(agent = %agent_name, error = %e, "Agent call failed");
                }
                error_msg
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::provider::{AgentProvider, ProviderDescriptor, ProviderFactory, ProviderSettings};
    use crate::registry::build_registry;

    struct TestProvider {
        descriptor: ProviderDescriptor,
        response: Result<String>,
    }

    #[async_trait::async_trait]
    impl AgentProvider for TestProvider {
        fn descriptor(&self) -> &ProviderDescriptor {
            &self.descriptor
        }

        async fn invoke(&self, _query: &str) -> Result<String> {
            match &self.response {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(Error::Invocation(e.to_string())),
            }
        }
    }

    struct TestFactory {
        name: &'static str,
        response: std::result::Result<&'static str, &'static str>,
    }

    #[async_trait::async_trait]
    impl ProviderFactory for TestFactory {
        fn descriptor(&self) -> ProviderDescriptor {
            ProviderDescriptor::new(self.name, "test")
        }

        fn validate_configuration(&self) -> Result<ProviderSettings> {
            Ok(ProviderSettings::new())
        }

        async fn initialize(
            &self,
            _settings: ProviderSettings,
        ) -> Result<Arc<dyn AgentProvider>> {
            Ok(Arc::new(TestProvider {
                descriptor: ProviderDescriptor::new(self.name, "test"),
                response: self
                    .response
                    .map(String::from)
                    .map_err(|e| Error::Invocation(e.to_string())),
            }))
        }
    }

    async fn dispatcher_with(
        factories: Vec<Arc<dyn ProviderFactory>>,
    ) -> DelegationDispatcher {
        let (registry, _) = build_registry(&factories).await;
        DelegationDispatcher::new(Arc::new(registry), false)
    }

    #[tokio::test]
    async fn test_unknown_agent_lists_available_names() {
        let dispatcher = dispatcher_with(vec![
            Arc::new(TestFactory {
                name: "Calendar",
                response: Ok("calendar says hi"),
            }),
            Arc::new(TestFactory {
                name: "IoT",
                response: Ok("iot says hi"),
            }),
        ])
        .await;

        let result = dispatcher.delegate("Speech", "listen").await;
        assert!(result.starts_with("Error: Agent 'Speech' is not recognized"));
        assert!(result.contains("Calendar"));
        assert!(result.contains("IoT"));
    }

    #[tokio::test]
    async fn test_success_returns_provider_text_verbatim() {
        let dispatcher = dispatcher_with(vec![Arc::new(TestFactory {
            name: "Calendar",
            response: Ok("Deleted the following events:\n- \"Standup\" at 2025-03-03 15:00"),
        })])
        .await;

        let result = dispatcher
            .delegate("Calendar", "cancel my 3pm meeting")
            .await;
        assert_eq!(
            result,
            "Deleted the following events:\n- \"Standup\" at 2025-03-03 15:00"
        );
    }

    #[tokio::test]
    async fn test_provider_failure_becomes_error_text() {
        let dispatcher = dispatcher_with(vec![Arc::new(TestFactory {
            name: "IoT",
            response: Err("telemetry store unreachable"),
        })])
        .await;

        let result = dispatcher.delegate("IoT", "temperature?").await;
        assert!(result.starts_with("Error calling IoT Agent:"));
        assert!(result.contains("telemetry store unreachable"));
    }

    #[tokio::test]
    async fn test_empty_registry_error_lists_no_agents() {
        let dispatcher = dispatcher_with(vec![]).await;
        let result = dispatcher.delegate("Calendar", "anything").await;
        assert!(result.contains("Available agents are: []"));
    }

    #[test]
    fn test_tool_definition_schema() {
        let tool = DelegationDispatcher::tool_definition();
        assert_eq!(tool.name, DELEGATE_TOOL_NAME);
        let required = tool.parameters["required"].as_array().unwrap();
        assert_eq!(required.len(), 2);
        assert!(tool.parameters["properties"]["agent_name"].is_object());
        assert!(tool.parameters["properties"]["query"].is_object());
    }
}
