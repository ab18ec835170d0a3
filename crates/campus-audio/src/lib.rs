//! Campus Audio - the speech collaborator
//!
//! This crate wraps the speech service and local audio hardware behind a
//! narrow interface:
//! - Capture: one-shot microphone recording with silence detection
//! - Playback: speaker output with a cooperative stop signal
//! - STT/TTS: Azure Speech REST endpoints
//! - `VoiceGateway`: recognize-once / speak / stop / is-speaking

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod capture;
pub mod config;
pub mod error;
pub mod playback;
pub mod stt;
pub mod tts;
pub mod voice;

pub use config::SpeechConfig;
pub use error::{Error, Result};
pub use playback::PlayOutcome;
pub use stt::SpeechRecognizer;
pub use tts::SpeechSynthesizer;
pub use voice::{SpeakOutcome, VoiceGateway};
