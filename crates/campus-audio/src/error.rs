//! Error types for campus-audio

use thiserror::Error;

/// Audio/speech error type
#[derive(Debug, Error)]
pub enum Error {
    /// Speech service not configured
    #[error("speech not configured: {0}")]
    NotConfigured(String),

    /// Audio device error
    #[error("audio device error: {0}")]
    AudioDevice(String),

    /// Audio stream error
    #[error("audio stream error: {0}")]
    AudioStream(String),

    /// Speech service API error
    #[error("speech api error: {0}")]
    Api(String),

    /// Network error
    #[error("network error: {0}")]
    Network(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
