//! Triage orchestrator - the per-request turn state machine
//!
//! Holds the registry, the composed capability prompt and the turn loop.
//! A turn walks `AwaitingModel → (ToolCall → AwaitingModel)* → Done`:
//! the orchestrator suspends on each model response and on each delegation
//! call, appending content fragments to the response accumulator in arrival
//! order. Delegation failures come back as text (the model replans);
//! only a model-service failure is fatal to the turn, and a failed turn
//! leaves history untouched.

use crate::dispatch::{DelegationDispatcher, DelegationRequest, DELEGATE_TOOL_NAME};
use crate::error::{Error, Result};
use crate::history::{ConversationHistory, DEFAULT_HISTORY_CAP};
use crate::prompt;
use crate::registry::ProviderRegistry;
use campus_llm::{ChatCompletion, CompletionRequest, Message, ToolCompletionRequest};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Default bound on model round-trips per turn
pub const DEFAULT_MAX_ITERATIONS: usize = 8;

/// Configuration for the triage orchestrator
#[derive(Debug, Clone)]
pub struct TriageConfig {
    /// Maximum model round-trips per turn
    pub max_iterations: usize,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Raise delegation events to INFO-level logs
    pub show_thoughts: bool,
    /// History cap in entries
    pub history_cap: usize,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            temperature: None,
            show_thoughts: true,
            history_cap: DEFAULT_HISTORY_CAP,
        }
    }
}

/// The triage orchestrator
pub struct TriageAgent {
    client: Arc<dyn ChatCompletion>,
    dispatcher: DelegationDispatcher,
    capability_prompt: String,
    config: TriageConfig,
}

impl TriageAgent {
    /// Create the orchestrator over a built registry
    #[must_use]
    pub fn new(
        client: Arc<dyn ChatCompletion>,
        registry: Arc<ProviderRegistry>,
        config: TriageConfig,
    ) -> Self {
        let capability_prompt = prompt::compose(&registry);
        let dispatcher = DelegationDispatcher::new(registry, config.show_thoughts);
        Self {
            client,
            dispatcher,
            capability_prompt,
            config,
        }
    }

    /// The composed capability block (deterministic for a fixed registry)
    #[must_use]
    pub fn capability_prompt(&self) -> &str {
        &self.capability_prompt
    }

    /// Standing instructions for the orchestrating model
    #[must_use]
    pub fn instructions(&self) -> String {
        format!(
            "You are a sophisticated Triage Agent. Your primary role is to understand complex \
             user requests and orchestrate responses by intelligently delegating tasks to \
             specialized agents.\n\
             \n\
             Current UTC time: {now}\n\
             \n\
             **Available Agents and Their Capabilities:**\n\
             \n\
             {capabilities}\n\
             \n\
             **Your Process:**\n\
             \n\
             1. Analyze the user's query and the preceding conversation history to identify \
             the core intent, then decide which of the available agents is best suited to \
             handle the request or parts of it.\n\
             2. Use the '{tool}' function to pass each task to the chosen agent. You MUST \
             specify the 'agent_name' and the 'query'. For multi-step requests, plan the \
             steps and call '{tool}' once per step, feeding one agent's output into the \
             next query where needed.\n\
             3. After each call, evaluate the response. If an error occurred (agent not \
             found, or an internal agent error) or the response is insufficient, adjust \
             your plan, retry with a modified query, choose a different agent, or tell the \
             user what could not be done. Do not call an agent that previously failed to \
             initialize.\n\
             4. If the query is ambiguous, ask a clarifying question instead of guessing.\n\
             5. Synthesize a user-friendly answer from the agent responses. Do not return \
             raw data unless it is the direct answer; explain the outcome of the actions \
             taken.\n\
             \n\
             Strictly use the '{tool}' function for all interactions with specialized \
             agents.",
            now = Utc::now().to_rfc3339(),
            capabilities = self.capability_prompt,
            tool = DELEGATE_TOOL_NAME,
        )
    }

    /// Run one conversation turn.
    ///
    /// On success the user message and the aggregated response are appended
    /// to `history` (then truncated to the cap). On failure nothing is
    /// appended and the error is returned to the caller.
    ///
    /// # Errors
    /// Returns `Error::Orchestration` when the model service fails.
    #[instrument(skip_all, fields(history_len = history.len()))]
    pub async fn handle_turn(
        &self,
        history: &mut ConversationHistory,
        user_message: &str,
    ) -> Result<String> {
        let mut messages = vec![Message::system(self.instructions())];
        messages.extend(history.to_messages());
        messages.push(Message::user(user_message));

        let mut fragments: Vec<String> = Vec::new();
        let mut iteration = 0usize;

        loop {
            iteration += 1;
            if iteration > self.config.max_iterations {
                warn!(
                    max_iterations = self.config.max_iterations,
                    "Turn hit iteration bound"
                );
                break;
            }

            let mut request = CompletionRequest::new().with_messages(messages.clone());
            request.temperature = self.config.temperature;

            let response = self
                .client
                .complete_with_tools(ToolCompletionRequest::new(
                    request,
                    vec![DelegationDispatcher::tool_definition()],
                ))
                .await
                .map_err(|e| Error::Orchestration(e.to_string()))?;

            if let Some(content) = &response.content {
                if !content.is_empty() {
                    fragments.push(content.clone());
                }
            }

            if response.tool_calls.is_empty() {
                break;
            }

            debug!(
                iteration,
                calls = response.tool_calls.len(),
                "Executing delegation calls"
            );

            messages.push(Message::assistant_with_tool_calls(
                response.content.clone().unwrap_or_default(),
                response.tool_calls.clone(),
            ));

            // Sequential by design: the model is suspended until each
            // delegation returns
            for call in &response.tool_calls {
                let result = self.execute_delegation(&call.name, &call.arguments).await;
                messages.push(Message::tool_response_named(&call.id, &call.name, result));
            }
        }

        let response_text = fragments.concat();
        history.record_turn(user_message, &response_text);
        Ok(response_text)
    }

    async fn execute_delegation(&self, tool_name: &str, arguments: &str) -> String {
        if tool_name != DELEGATE_TOOL_NAME {
            return format!(
                "Error: unknown tool '{}'. Only '{}' is available.",
                tool_name, DELEGATE_TOOL_NAME
            );
        }

        let request: DelegationRequest = match serde_json::from_str(arguments) {
            Ok(request) => request,
            Err(e) => {
                return format!(
                    "Error: could not parse delegation arguments ({}). \
                     Provide 'agent_name' and 'query'.",
                    e
                );
            }
        };

        self.dispatcher
            .delegate(&request.agent_name, &request.query)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{AgentProvider, ProviderDescriptor, ProviderFactory, ProviderSettings};
    use crate::registry::build_registry;
    use campus_llm::{CompletionResponse, ToolCall, ToolCompletionResponse};
    use std::sync::Mutex;

    struct ScriptedClient {
        responses: Mutex<Vec<campus_llm::Result<ToolCompletionResponse>>>,
    }

    impl ScriptedClient {
        fn new(mut responses: Vec<campus_llm::Result<ToolCompletionResponse>>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
            }
        }
    }

    #[async_trait::async_trait]
    impl ChatCompletion for ScriptedClient {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> campus_llm::Result<CompletionResponse> {
            unimplemented!("not used")
        }

        async fn complete_with_tools(
            &self,
            _request: ToolCompletionRequest,
        ) -> campus_llm::Result<ToolCompletionResponse> {
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(campus_llm::Error::Api("script exhausted".to_string())))
        }
    }

    fn text(content: &str) -> campus_llm::Result<ToolCompletionResponse> {
        Ok(ToolCompletionResponse {
            content: Some(content.to_string()),
            tool_calls: vec![],
            usage: None,
            finish_reason: Some("stop".to_string()),
        })
    }

    fn delegate_call(agent: &str, query: &str) -> campus_llm::Result<ToolCompletionResponse> {
        Ok(ToolCompletionResponse {
            content: None,
            tool_calls: vec![ToolCall {
                id: "call_1".to_string(),
                name: DELEGATE_TOOL_NAME.to_string(),
                arguments: format!(r#"{{"agent_name":"{}","query":"{}"}}"#, agent, query),
            }],
            usage: None,
            finish_reason: Some("tool_calls".to_string()),
        })
    }

    struct EchoFactory {
        name: &'static str,
    }

    struct EchoProvider {
        descriptor: ProviderDescriptor,
    }

    #[async_trait::async_trait]
    impl AgentProvider for EchoProvider {
        fn descriptor(&self) -> &ProviderDescriptor {
            &self.descriptor
        }

        async fn invoke(&self, query: &str) -> crate::error::Result<String> {
            Ok(format!("{} handled: {}", self.descriptor.name, query))
        }
    }

    #[async_trait::async_trait]
    impl ProviderFactory for EchoFactory {
        fn descriptor(&self) -> ProviderDescriptor {
            ProviderDescriptor::new(self.name, "echo")
        }

        fn validate_configuration(&self) -> crate::error::Result<ProviderSettings> {
            Ok(ProviderSettings::new())
        }

        async fn initialize(
            &self,
            _settings: ProviderSettings,
        ) -> crate::error::Result<Arc<dyn AgentProvider>> {
            Ok(Arc::new(EchoProvider {
                descriptor: ProviderDescriptor::new(self.name, "echo"),
            }))
        }
    }

    async fn triage_with(
        responses: Vec<campus_llm::Result<ToolCompletionResponse>>,
    ) -> TriageAgent {
        let factories: Vec<Arc<dyn ProviderFactory>> =
            vec![Arc::new(EchoFactory { name: "Calendar" })];
        let (registry, _) = build_registry(&factories).await;
        TriageAgent::new(
            Arc::new(ScriptedClient::new(responses)),
            Arc::new(registry),
            TriageConfig {
                show_thoughts: false,
                ..TriageConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn test_simple_turn_appends_history() {
        let triage = triage_with(vec![text("Good morning!")]).await;
        let mut history = ConversationHistory::new();

        let response = triage.handle_turn(&mut history, "hello").await.unwrap();
        assert_eq!(response, "Good morning!");
        assert_eq!(history.len(), 2);
        assert_eq!(history.entries()[0].content, "hello");
        assert_eq!(history.entries()[1].content, "Good morning!");
    }

    #[tokio::test]
    async fn test_turn_with_delegation_aggregates_fragments() {
        let triage = triage_with(vec![
            delegate_call("Calendar", "list today"),
            text("Your calendar is clear."),
        ])
        .await;
        let mut history = ConversationHistory::new();

        let response = triage
            .handle_turn(&mut history, "what's on today?")
            .await
            .unwrap();
        assert_eq!(response, "Your calendar is clear.");
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_turn_leaves_history_unmodified() {
        let triage = triage_with(vec![Err(campus_llm::Error::Api(
            "service unreachable".to_string(),
        ))])
        .await;
        let mut history = ConversationHistory::new();
        history.record_turn("earlier", "turn");
        let before = history.len();

        let err = triage.handle_turn(&mut history, "hello").await.unwrap_err();
        assert!(matches!(err, Error::Orchestration(_)));
        assert_eq!(history.len(), before);
    }

    #[tokio::test]
    async fn test_mid_turn_failure_leaves_history_unmodified() {
        // First response delegates, second model call fails
        let triage = triage_with(vec![
            delegate_call("Calendar", "list today"),
            Err(campus_llm::Error::Api("stream dropped".to_string())),
        ])
        .await;
        let mut history = ConversationHistory::new();

        let err = triage.handle_turn(&mut history, "hello").await.unwrap_err();
        assert!(matches!(err, Error::Orchestration(_)));
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_tool_fed_back_as_text() {
        let triage = triage_with(vec![
            Ok(ToolCompletionResponse {
                content: None,
                tool_calls: vec![ToolCall {
                    id: "call_9".to_string(),
                    name: "fetch_weather".to_string(),
                    arguments: "{}".to_string(),
                }],
                usage: None,
                finish_reason: Some("tool_calls".to_string()),
            }),
            text("I cannot do that."),
        ])
        .await;
        let mut history = ConversationHistory::new();

        let response = triage.handle_turn(&mut history, "weather?").await.unwrap();
        assert_eq!(response, "I cannot do that.");
    }

    #[tokio::test]
    async fn test_instructions_embed_capability_prompt() {
        let triage = triage_with(vec![]).await;
        let instructions = triage.instructions();
        assert!(instructions.contains("The Calendar agent:"));
        assert!(instructions.contains(DELEGATE_TOOL_NAME));
        assert!(instructions.contains("Current UTC time:"));
    }
}
