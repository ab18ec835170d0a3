//! Campus LLM - chat-completion client abstraction
//!
//! This crate provides the language-model integration for Campus:
//! - Message, tool and completion types shared by every agent
//! - The `ChatCompletion` trait implemented by concrete backends
//! - Azure OpenAI: chat completions against a deployment endpoint

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod azure;
pub mod completion;
pub mod error;
pub mod message;
pub mod tools;
pub mod util;

pub use azure::{AzureChatClient, AzureOpenAiConfig};
pub use completion::{
    ChatCompletion, CompletionRequest, CompletionResponse, TokenUsage, ToolCompletionRequest,
    ToolCompletionResponse,
};
pub use error::{Error, Result};
pub use message::{Message, MessageRole};
pub use tools::{ToolCall, ToolChoice, ToolDefinition};
