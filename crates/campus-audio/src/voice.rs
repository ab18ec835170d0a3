//! Voice gateway: the narrow interface over capture, playback, STT and TTS

use crate::capture;
use crate::config::{SpeechConfig, CAPTURE_SAMPLE_RATE};
use crate::error::{Error, Result};
use crate::playback::{self, PlayOutcome};
use crate::stt::SpeechRecognizer;
use crate::tts::SpeechSynthesizer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// How a speak request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakOutcome {
    /// Synthesis and playback ran to completion
    Completed,
    /// Cancelled before playback started
    CancelledBeforePlayback,
    /// Interrupted by the stop signal during playback
    Stopped,
}

impl SpeakOutcome {
    /// Human-readable status message
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::Completed => "Speech synthesis completed successfully",
            Self::CancelledBeforePlayback => "Speech cancelled before starting",
            Self::Stopped => "Speech cancelled during synthesis",
        }
    }
}

/// Gateway to the speech collaborator.
///
/// Holds no audio-device handles between calls; microphone and speaker are
/// opened per request on blocking threads. The stop signal is cooperative
/// and best-effort, observed at the playback polling interval.
pub struct VoiceGateway {
    recognizer: SpeechRecognizer,
    synthesizer: SpeechSynthesizer,
    config: SpeechConfig,
    speaking: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
}

impl VoiceGateway {
    /// Creates a gateway from the given configuration
    ///
    /// # Errors
    /// Returns an error if the HTTP clients cannot be constructed.
    pub fn new(config: SpeechConfig) -> Result<Self> {
        Ok(Self {
            recognizer: SpeechRecognizer::new(config.clone())?,
            synthesizer: SpeechSynthesizer::new(config.clone())?,
            config,
            speaking: Arc::new(AtomicBool::new(false)),
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Creates a gateway from environment variables
    ///
    /// # Errors
    /// Returns `Error::NotConfigured` when `SPEECH_KEY` or `SPEECH_REGION`
    /// is absent.
    pub fn from_env() -> Result<Self> {
        Self::new(SpeechConfig::from_env()?)
    }

    /// Whether a speak request is currently playing
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }

    /// Request that in-flight synthesis stop. Best-effort, cooperative.
    pub fn stop(&self) {
        info!("Speech stop requested");
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Capture one utterance from the microphone and transcribe it.
    ///
    /// Returns an empty string when nothing was recognized.
    ///
    /// # Errors
    /// Returns an error when no input device is usable or the recognition
    /// request fails.
    #[instrument(skip(self))]
    pub async fn recognize_once(&self) -> Result<String> {
        info!("Listening for speech...");
        let config = self.config.clone();
        let samples = tokio::task::spawn_blocking(move || capture::record_once(&config))
            .await
            .map_err(|e| Error::AudioStream(format!("capture task failed: {}", e)))??;

        if samples.is_empty() {
            warn!("No speech captured");
            return Ok(String::new());
        }

        let wav = capture::samples_to_wav(&samples, CAPTURE_SAMPLE_RATE)?;
        self.recognizer.transcribe_wav(wav).await
    }

    /// Synthesize text and play it on the default output device.
    ///
    /// # Errors
    /// Returns an error when synthesis or playback fails; a stop request is
    /// not an error.
    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub async fn speak(&self, text: &str) -> Result<SpeakOutcome> {
        self.stop.store(false, Ordering::SeqCst);

        let audio = self.synthesizer.synthesize(text).await?;

        if self.stop.load(Ordering::SeqCst) {
            return Ok(SpeakOutcome::CancelledBeforePlayback);
        }

        self.speaking.store(true, Ordering::SeqCst);
        let stop = Arc::clone(&self.stop);
        let played = tokio::task::spawn_blocking(move || playback::play_wav(&audio, &stop))
            .await
            .map_err(|e| Error::AudioStream(format!("playback task failed: {}", e)));
        self.speaking.store(false, Ordering::SeqCst);

        match played?? {
            PlayOutcome::Completed => Ok(SpeakOutcome::Completed),
            PlayOutcome::Stopped => Ok(SpeakOutcome::Stopped),
        }
    }
}
