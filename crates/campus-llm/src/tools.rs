//! Tool types for LLM function calling

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Tool definition for function calling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name
    pub name: String,
    /// Tool description
    pub description: String,
    /// JSON schema for parameters
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Create a new tool definition
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A tool call requested by the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique ID for this tool call
    pub id: String,
    /// Tool name
    pub name: String,
    /// Arguments as JSON string
    pub arguments: String,
}

impl ToolCall {
    /// Parse arguments as a typed value
    pub fn parse_arguments<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.arguments).map_err(|e| Error::InvalidResponse(e.to_string()))
    }
}

/// Tool choice strategy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// Let the model decide
    #[default]
    Auto,
    /// Don't use tools
    None,
    /// Force a tool call
    Required,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_definition() {
        let tool = ToolDefinition::new(
            "delegate_to_agent",
            "Delegates a task to a specified specialized agent",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "agent_name": {"type": "string"},
                    "query": {"type": "string"}
                },
                "required": ["agent_name", "query"]
            }),
        );

        assert_eq!(tool.name, "delegate_to_agent");
        assert!(tool.parameters["required"].is_array());
    }

    #[test]
    fn test_tool_call_parse_arguments() {
        let tool_call = ToolCall {
            id: "call_123".to_string(),
            name: "check_in_event".to_string(),
            arguments: r#"{"user_id": "s123", "event_name": "AI Lecture"}"#.to_string(),
        };

        #[derive(Deserialize)]
        struct Args {
            user_id: String,
            event_name: String,
        }

        let args: Args = tool_call.parse_arguments().unwrap();
        assert_eq!(args.user_id, "s123");
        assert_eq!(args.event_name, "AI Lecture");
    }

    #[test]
    fn test_tool_choice_default() {
        let choice = ToolChoice::default();
        assert!(matches!(choice, ToolChoice::Auto));
    }
}
