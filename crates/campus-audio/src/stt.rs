//! Speech-to-text via the Azure Speech REST endpoint

use crate::config::{SpeechConfig, CAPTURE_SAMPLE_RATE};
use crate::error::{Error, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RecognitionResponse {
    recognition_status: String,
    #[serde(default)]
    display_text: Option<String>,
}

/// Short-audio speech recognizer
pub struct SpeechRecognizer {
    http: Client,
    config: SpeechConfig,
}

impl SpeechRecognizer {
    /// Creates a new recognizer
    ///
    /// # Errors
    /// Returns `Error::Network` if the HTTP client cannot be constructed.
    pub fn new(config: SpeechConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// Transcribe a single WAV utterance.
    ///
    /// Returns an empty string when the service recognized no speech.
    ///
    /// # Errors
    /// Returns an error on transport failures or non-success status codes.
    #[instrument(skip(self, wav_data), fields(bytes = wav_data.len()))]
    pub async fn transcribe_wav(&self, wav_data: Vec<u8>) -> Result<String> {
        let content_type = format!(
            "audio/wav; codecs=audio/pcm; samplerate={}",
            CAPTURE_SAMPLE_RATE
        );

        let response = self
            .http
            .post(self.config.stt_url())
            .header("Ocp-Apim-Subscription-Key", &self.config.key)
            .header("Content-Type", content_type)
            .header("Accept", "application/json")
            .body(wav_data)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api(format!("recognition failed with {}", status)));
        }

        let parsed: RecognitionResponse = response
            .json()
            .await
            .map_err(|e| Error::Api(format!("invalid recognition response: {}", e)))?;

        match parsed.recognition_status.as_str() {
            "Success" => {
                let text = parsed.display_text.unwrap_or_default().trim().to_string();
                debug!(recognized = %text, "Speech recognized");
                Ok(text)
            }
            status => {
                warn!(status = %status, "No speech recognized");
                Ok(String::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognition_response_parsing() {
        let raw = r#"{"RecognitionStatus":"Success","DisplayText":"Turn on the lights.","Offset":100,"Duration":5000}"#;
        let parsed: RecognitionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.recognition_status, "Success");
        assert_eq!(parsed.display_text.as_deref(), Some("Turn on the lights."));
    }

    #[test]
    fn test_no_match_response_parsing() {
        let raw = r#"{"RecognitionStatus":"NoMatch"}"#;
        let parsed: RecognitionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.recognition_status, "NoMatch");
        assert!(parsed.display_text.is_none());
    }
}
