//! Azure OpenAI - chat completions against a deployment endpoint
//!
//! This module implements the `ChatCompletion` trait over the Azure OpenAI
//! REST surface (endpoint + deployment + `api-version` query parameter,
//! `api-key` header) using reqwest.

use crate::completion::{
    ChatCompletion, CompletionRequest, CompletionResponse, TokenUsage, ToolCompletionRequest,
    ToolCompletionResponse,
};
use crate::error::{Error, Result};
use crate::message::Message;
use crate::tools::{ToolCall, ToolChoice, ToolDefinition};
use crate::util::{mask_api_key, truncate_safe};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};

/// Default chat deployment name
pub const DEFAULT_DEPLOYMENT: &str = "gpt-4o-mini";

/// Default Azure OpenAI API version
pub const DEFAULT_API_VERSION: &str = "2024-12-01-preview";

/// Sanitize Azure OpenAI error messages to prevent leaking sensitive information
fn sanitize_api_error(error: &str) -> String {
    let lower = error.to_lowercase();

    if lower.contains("api key")
        || lower.contains("api-key")
        || lower.contains("apikey")
        || lower.contains("unauthorized")
        || lower.contains("authentication")
        || lower.contains("access denied")
    {
        return "API authentication error. Please check your API key configuration.".to_string();
    }

    if lower.contains("rate limit") || lower.contains("quota") || lower.contains("429") {
        return "API rate limit exceeded. Please try again later.".to_string();
    }

    if lower.contains("internal") || lower.contains("server error") {
        return "API server error. Please try again later.".to_string();
    }

    if error.len() > 300 {
        format!("{}...(truncated)", truncate_safe(error, 300))
    } else {
        error.to_string()
    }
}

/// Configuration for the Azure OpenAI client
#[derive(Clone)]
pub struct AzureOpenAiConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`
    pub endpoint: String,
    /// API key for authentication
    pub api_key: String,
    /// Chat deployment name
    pub deployment: String,
    /// API version query parameter
    pub api_version: String,
    /// Request timeout duration
    pub timeout: Duration,
}

impl fmt::Debug for AzureOpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureOpenAiConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &mask_api_key(&self.api_key))
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl AzureOpenAiConfig {
    /// Creates a new configuration
    #[must_use]
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            deployment: DEFAULT_DEPLOYMENT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Creates configuration from environment variables.
    ///
    /// Required: `AZURE_OPENAI_API_ENDPOINT`, `AZURE_OPENAI_API_KEY`.
    /// Optional: `AZURE_OPENAI_CHAT_DEPLOYMENT_NAME` (default `gpt-4o-mini`),
    /// `AZURE_OPENAI_API_VERSION` (default `2024-12-01-preview`).
    ///
    /// # Errors
    /// Returns `Error::NotConfigured` if a required variable is absent.
    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var("AZURE_OPENAI_API_ENDPOINT")
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::NotConfigured("AZURE_OPENAI_API_ENDPOINT not set".to_string()))?;
        let api_key = std::env::var("AZURE_OPENAI_API_KEY")
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::NotConfigured("AZURE_OPENAI_API_KEY not set".to_string()))?;
        let deployment = std::env::var("AZURE_OPENAI_CHAT_DEPLOYMENT_NAME")
            .unwrap_or_else(|_| DEFAULT_DEPLOYMENT.to_string());
        let api_version = std::env::var("AZURE_OPENAI_API_VERSION")
            .unwrap_or_else(|_| DEFAULT_API_VERSION.to_string());

        Ok(Self {
            endpoint,
            api_key,
            deployment,
            api_version,
            timeout: Duration::from_secs(60),
        })
    }

    /// Sets the deployment name
    #[must_use]
    pub fn with_deployment(mut self, deployment: impl Into<String>) -> Self {
        self.deployment = deployment.into();
        self
    }

    /// Sets the API version
    #[must_use]
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Sets the request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The chat-completions URL for this deployment
    #[must_use]
    pub fn chat_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version
        )
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    function: WireFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunction,
}

#[derive(Debug, Serialize)]
struct WireFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

// ============================================================================
// Client
// ============================================================================

/// Azure OpenAI chat-completion client
#[derive(Debug)]
pub struct AzureChatClient {
    http: Client,
    config: AzureOpenAiConfig,
}

impl AzureChatClient {
    /// Creates a new client with the given configuration
    ///
    /// # Errors
    /// Returns `Error::Network` if the HTTP client cannot be constructed.
    pub fn new(config: AzureOpenAiConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// Creates a client from environment variables
    ///
    /// # Errors
    /// Returns error if a required variable is not set.
    pub fn from_env() -> Result<Self> {
        Self::new(AzureOpenAiConfig::from_env()?)
    }

    /// The configured deployment name
    #[must_use]
    pub fn deployment(&self) -> &str {
        &self.config.deployment
    }

    fn convert_message(msg: &Message) -> WireMessage {
        let tool_calls = if msg.tool_calls.is_empty() {
            None
        } else {
            Some(msg.tool_calls.iter().map(Self::convert_tool_call).collect())
        };
        // Azure rejects a bare empty string next to tool_calls; send null instead
        let content = if msg.content.is_empty() && tool_calls.is_some() {
            None
        } else {
            Some(msg.content.clone())
        };
        WireMessage {
            role: msg.role.as_str(),
            content,
            tool_calls,
            tool_call_id: msg.tool_call_id.clone(),
            name: msg.name.clone(),
        }
    }

    fn convert_tool_call(call: &ToolCall) -> WireToolCall {
        WireToolCall {
            id: call.id.clone(),
            kind: "function".to_string(),
            function: WireFunctionCall {
                name: call.name.clone(),
                arguments: call.arguments.clone(),
            },
        }
    }

    fn convert_tool(tool: &ToolDefinition) -> WireTool {
        WireTool {
            kind: "function",
            function: WireFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.parameters.clone(),
            },
        }
    }

    fn convert_tool_choice(choice: &ToolChoice) -> serde_json::Value {
        match choice {
            ToolChoice::Auto => serde_json::Value::String("auto".to_string()),
            ToolChoice::None => serde_json::Value::String("none".to_string()),
            ToolChoice::Required => serde_json::Value::String("required".to_string()),
        }
    }

    async fn send(&self, body: &ChatRequest) -> Result<ChatResponse> {
        let response = self
            .http
            .post(self.config.chat_url())
            .header("api-key", &self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!(
                "{}: {}",
                status,
                sanitize_api_error(&text)
            )));
        }

        response
            .json::<ChatResponse>()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))
    }
}

#[async_trait::async_trait]
impl ChatCompletion for AzureChatClient {
    fn name(&self) -> &str {
        "azure-openai"
    }

    #[instrument(skip(self, request), fields(deployment = %self.config.deployment))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let body = ChatRequest {
            messages: request.messages.iter().map(Self::convert_message).collect(),
            tools: None,
            tool_choice: None,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        debug!("Sending chat request to Azure OpenAI");
        let response = self.send(&body).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidResponse("No choices in response".to_string()))?;

        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            usage: response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.finish_reason,
        })
    }

    #[instrument(
        skip(self, request),
        fields(deployment = %self.config.deployment, tools = request.tools.len())
    )]
    async fn complete_with_tools(
        &self,
        request: ToolCompletionRequest,
    ) -> Result<ToolCompletionResponse> {
        let tools = if request.tools.is_empty() {
            None
        } else {
            Some(request.tools.iter().map(Self::convert_tool).collect())
        };
        let tool_choice = tools
            .as_ref()
            .map(|_| Self::convert_tool_choice(&request.tool_choice));

        let body = ChatRequest {
            messages: request
                .request
                .messages
                .iter()
                .map(Self::convert_message)
                .collect(),
            tools,
            tool_choice,
            temperature: request.request.temperature,
            max_tokens: request.request.max_tokens,
        };

        debug!("Sending tool request to Azure OpenAI");
        let response = self.send(&body).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidResponse("No choices in response".to_string()))?;

        let tool_calls: Vec<ToolCall> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments: tc.function.arguments,
            })
            .collect();

        Ok(ToolCompletionResponse {
            content: choice.message.content,
            tool_calls,
            usage: response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.finish_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageRole;

    fn test_config() -> AzureOpenAiConfig {
        AzureOpenAiConfig::new("https://example.openai.azure.com/", "test-key")
    }

    #[test]
    fn test_chat_url() {
        let config = test_config()
            .with_deployment("gpt-4o-mini")
            .with_api_version("2024-12-01-preview");
        assert_eq!(
            config.chat_url(),
            "https://example.openai.azure.com/openai/deployments/gpt-4o-mini/chat/completions?api-version=2024-12-01-preview"
        );
    }

    #[test]
    fn test_config_debug_masks_key() {
        let config = AzureOpenAiConfig::new("https://e.openai.azure.com", "sk-1234567890abcdef");
        let debug_str = format!("{:?}", config);
        assert!(!debug_str.contains("1234567890ab"));
        assert!(debug_str.contains("sk-1...cdef"));
    }

    #[test]
    fn test_convert_message_roles() {
        let wire = AzureChatClient::convert_message(&Message::user("hi"));
        assert_eq!(wire.role, "user");
        assert_eq!(wire.content.as_deref(), Some("hi"));

        let tool = Message::tool_response_named("call_1", "delegate_to_agent", "ok");
        let wire = AzureChatClient::convert_message(&tool);
        assert_eq!(wire.role, "tool");
        assert_eq!(wire.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(wire.name.as_deref(), Some("delegate_to_agent"));
    }

    #[test]
    fn test_convert_assistant_with_tool_calls_omits_empty_content() {
        let msg = Message::assistant_with_tool_calls(
            "",
            vec![ToolCall {
                id: "call_1".to_string(),
                name: "f".to_string(),
                arguments: "{}".to_string(),
            }],
        );
        assert_eq!(msg.role, MessageRole::Assistant);
        let wire = AzureChatClient::convert_message(&msg);
        assert!(wire.content.is_none());
        assert_eq!(wire.tool_calls.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_request_serialization_shape() {
        let body = ChatRequest {
            messages: vec![AzureChatClient::convert_message(&Message::user("hello"))],
            tools: Some(vec![AzureChatClient::convert_tool(&ToolDefinition::new(
                "delegate_to_agent",
                "Delegates a task",
                serde_json::json!({"type": "object"}),
            ))]),
            tool_choice: Some(AzureChatClient::convert_tool_choice(&ToolChoice::Auto)),
            temperature: None,
            max_tokens: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["tools"][0]["type"], "function");
        assert_eq!(json["tools"][0]["function"]["name"], "delegate_to_agent");
        assert_eq!(json["tool_choice"], "auto");
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_response_deserialization() {
        let raw = serde_json::json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {"name": "delegate_to_agent", "arguments": "{\"agent_name\":\"IoT\",\"query\":\"temp?\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        });
        let parsed: ChatResponse = serde_json::from_value(raw).unwrap();
        let choice = &parsed.choices[0];
        let calls = choice.message.tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.name, "delegate_to_agent");
        assert_eq!(parsed.usage.as_ref().unwrap().total_tokens, 15);
    }

    #[test]
    fn test_sanitize_api_error() {
        let sanitized = sanitize_api_error("Invalid api key: sk-1234567890");
        assert!(!sanitized.contains("sk-"));
        assert!(sanitized.contains("authentication"));

        let sanitized = sanitize_api_error("Rate limit exceeded: 100 requests per minute");
        assert!(!sanitized.contains("100"));
        assert!(sanitized.contains("rate limit"));

        let sanitized = sanitize_api_error("Deployment not found");
        assert_eq!(sanitized, "Deployment not found");
    }
}
