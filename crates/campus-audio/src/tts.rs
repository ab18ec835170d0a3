//! Text-to-speech via the Azure Speech REST endpoint

use crate::config::SpeechConfig;
use crate::error::{Error, Result};
use reqwest::Client;
use tracing::{debug, instrument};

/// Output format requested from the synthesis endpoint (decodable by rodio)
const OUTPUT_FORMAT: &str = "riff-16khz-16bit-mono-pcm";

/// Escape text for embedding in SSML
#[must_use]
pub fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Speech synthesizer returning WAV audio
pub struct SpeechSynthesizer {
    http: Client,
    config: SpeechConfig,
}

impl SpeechSynthesizer {
    /// Creates a new synthesizer
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

    fn ssml(&self, text: &str) -> String {
        format!(
            "<speak version='1.0' xml:lang='{lang}'><voice name='{voice}'>{text}</voice></speak>",
            lang = self.config.language,
            voice = self.config.voice,
            text = xml_escape(text),
        )
    }

    /// Synthesize text to WAV bytes.
    ///
    /// # Errors
    /// Returns an error on transport failures or non-success status codes.
    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .post(self.config.tts_url())
            .header("Ocp-Apim-Subscription-Key", &self.config.key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", OUTPUT_FORMAT)
            .header("User-Agent", "campus")
            .body(self.ssml(text))
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api(format!("synthesis failed with {}", status)));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        debug!(bytes = audio.len(), "Speech synthesized");
        Ok(audio.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xml_escape() {
        assert_eq!(
            xml_escape("Fish & chips <today>"),
            "Fish &amp; chips &lt;today&gt;"
        );
        assert_eq!(xml_escape("plain"), "plain");
        assert_eq!(xml_escape("it's \"fine\""), "it&apos;s &quot;fine&quot;");
    }

    #[test]
    fn test_ssml_embeds_voice_and_text() {
        let synth = SpeechSynthesizer::new(SpeechConfig::new("k", "uksouth")).unwrap();
        let ssml = synth.ssml("Hello & welcome");
        assert!(ssml.contains("en-US-JennyNeural"));
        assert!(ssml.contains("Hello &amp; welcome"));
        assert!(ssml.starts_with("<speak"));
    }
}
