//! Error types for campus-agents

use thiserror::Error;

/// Agent error type
#[derive(Debug, Error)]
pub enum Error {
    /// Required configuration is missing or invalid; excludes the provider
    /// from the registry
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Collaborator or model-service construction failed; excludes the
    /// provider from the registry
    #[error("initialization error: {0}")]
    Initialization(String),

    /// A provider's invoke failed; converted to text by the dispatcher
    #[error("invocation error: {0}")]
    Invocation(String),

    /// The orchestration turn itself failed; fatal to the turn only
    #[error("orchestration error: {0}")]
    Orchestration(String),

    /// Microsoft Graph API error
    #[error("graph api error: {0}")]
    Graph(String),

    /// Store error
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),

    /// Model-service error
    #[error(transparent)]
    Llm(#[from] campus_llm::Error),

    /// Speech collaborator error
    #[error(transparent)]
    Audio(#[from] campus_audio::Error),

    /// HTTP transport error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
