//! Inner chat agent - the per-provider tool-calling loop
//!
//! Every provider owns one `ChatAgent`: its own instruction block, its own
//! skill set, and a chat client. `invoke` runs the model against the skills
//! until the model stops requesting calls, aggregating content fragments in
//! arrival order. This loop is opaque to the delegation dispatcher, which
//! only sees the joined text.

use crate::error::{Error, Result};
use crate::skill::SkillSet;
use campus_llm::{ChatCompletion, CompletionRequest, Message, ToolCompletionRequest};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Default bound on model round-trips per invocation
pub const DEFAULT_MAX_ITERATIONS: usize = 6;

/// Configuration for a chat agent
#[derive(Debug, Clone)]
pub struct ChatAgentConfig {
    /// Agent display name (used in logs)
    pub name: String,
    /// Standing instructions for the agent's model
    pub instructions: String,
    /// Maximum model round-trips per invocation
    pub max_iterations: usize,
    /// Sampling temperature
    pub temperature: Option<f32>,
}

impl ChatAgentConfig {
    /// Create a new configuration
    #[must_use]
    pub fn new(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            temperature: None,
        }
    }
}

/// A chat agent: one model connection plus a skill set
pub struct ChatAgent {
    client: Arc<dyn ChatCompletion>,
    config: ChatAgentConfig,
    skills: SkillSet,
}

impl ChatAgent {
    /// Create a new chat agent
    #[must_use]
    pub fn new(client: Arc<dyn ChatCompletion>, config: ChatAgentConfig, skills: SkillSet) -> Self {
        Self {
            client,
            config,
            skills,
        }
    }

    /// The agent's name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Run the query through the model/skill loop and return the aggregated
    /// text response.
    ///
    /// # Errors
    /// Returns `Error::Invocation` when the model service fails.
    #[instrument(skip(self, query), fields(agent = %self.config.name))]
    pub async fn invoke(&self, query: &str) -> Result<String> {
        let mut messages = vec![
            Message::system(&self.config.instructions),
            Message::user(query),
        ];
        let mut fragments: Vec<String> = Vec::new();

        for iteration in 1..=self.config.max_iterations {
            let mut request = CompletionRequest::new().with_messages(messages.clone());
            request.temperature = self.config.temperature;

            let response = self
                .client
                .complete_with_tools(ToolCompletionRequest::new(
                    request,
                    self.skills.to_tool_definitions(),
                ))
                .await
                .map_err(|e| Error::Invocation(e.to_string()))?;

            if let Some(content) = &response.content {
                if !content.is_empty() {
                    fragments.push(content.clone());
                }
            }

            if response.tool_calls.is_empty() {
                return Ok(fragments.concat());
            }

            debug!(
                iteration,
                calls = response.tool_calls.len(),
                "Executing skill calls"
            );

            messages.push(Message::assistant_with_tool_calls(
                response.content.clone().unwrap_or_default(),
                response.tool_calls.clone(),
            ));

            for call in &response.tool_calls {
                let result = self.execute_skill(&call.name, &call.arguments).await;
                messages.push(Message::tool_response_named(&call.id, &call.name, result));
            }
        }

        warn!(
            agent = %self.config.name,
            max_iterations = self.config.max_iterations,
            "Skill loop hit iteration bound"
        );
        Ok(fragments.concat())
    }

    /// Execute one skill call; all failures become text the model can read.
    async fn execute_skill(&self, name: &str, arguments: &str) -> String {
        let Some(skill) = self.skills.get(name) else {
            return format!(
                "Error: unknown function '{}'. Available functions: {:?}",
                name,
                self.skills.names()
            );
        };

        let input: serde_json::Value = serde_json::from_str(arguments).unwrap_or_else(|e| {
            warn!(
                skill = %name,
                error = %e,
                "Failed to parse skill arguments, using empty object"
            );
            serde_json::json!({})
        });

        if let Err(e) = skill.validate_input(&input) {
            return format!("Error: {}", e);
        }

        match skill.execute(input).await {
            Ok(text) => text,
            Err(e) => format!("Error: {}", e),
        }
    }
}
