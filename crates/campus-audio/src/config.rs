//! Speech service configuration

use crate::error::{Error, Result};
use std::fmt;
use std::time::Duration;

/// Default recognition language
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Default synthesis voice
pub const DEFAULT_VOICE: &str = "en-US-JennyNeural";

/// Capture sample rate expected by the recognition endpoint
pub const CAPTURE_SAMPLE_RATE: u32 = 16_000;

/// Configuration for the speech collaborator
#[derive(Clone)]
pub struct SpeechConfig {
    /// Speech service subscription key
    pub key: String,
    /// Speech service region, e.g. `uksouth`
    pub region: String,
    /// Recognition language
    pub language: String,
    /// Synthesis voice name
    pub voice: String,
    /// Maximum one-shot recording duration
    pub max_record_secs: u64,
    /// RMS level below which audio counts as silence
    pub silence_threshold: f32,
    /// Trailing silence that ends a recording
    pub silence_duration_ms: u64,
    /// HTTP request timeout
    pub timeout: Duration,
}

impl fmt::Debug for SpeechConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechConfig")
            .field("key", &"[REDACTED]")
            .field("region", &self.region)
            .field("language", &self.language)
            .field("voice", &self.voice)
            .field("max_record_secs", &self.max_record_secs)
            .finish()
    }
}

impl SpeechConfig {
    /// Creates a new configuration
    #[must_use]
    pub fn new(key: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            region: region.into(),
            language: DEFAULT_LANGUAGE.to_string(),
            voice: DEFAULT_VOICE.to_string(),
            max_record_secs: 15,
            silence_threshold: 0.01,
            silence_duration_ms: 1200,
            timeout: Duration::from_secs(30),
        }
    }

    /// Creates configuration from environment variables.
    ///
    /// Required: `SPEECH_KEY`, `SPEECH_REGION`.
    /// Optional: `SPEECH_LANGUAGE`, `SPEECH_VOICE`.
    ///
    /// # Errors
    /// Returns `Error::NotConfigured` if a required variable is absent.
    pub fn from_env() -> Result<Self> {
        let key = std::env::var("SPEECH_KEY")
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::NotConfigured("SPEECH_KEY not set".to_string()))?;
        let region = std::env::var("SPEECH_REGION")
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::NotConfigured("SPEECH_REGION not set".to_string()))?;

        let mut config = Self::new(key, region);
        if let Ok(language) = std::env::var("SPEECH_LANGUAGE") {
            config.language = language;
        }
        if let Ok(voice) = std::env::var("SPEECH_VOICE") {
            config.voice = voice;
        }
        Ok(config)
    }

    /// Sets the recognition language
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Sets the synthesis voice
    #[must_use]
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    /// The short-audio recognition endpoint for this region
    #[must_use]
    pub fn stt_url(&self) -> String {
        format!(
            "https://{}.stt.speech.microsoft.com/speech/recognition/conversation/cognitiveservices/v1?language={}&format=simple",
            self.region, self.language
        )
    }

    /// The synthesis endpoint for this region
    #[must_use]
    pub fn tts_url(&self) -> String {
        format!(
            "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
            self.region
        )
    }
}
