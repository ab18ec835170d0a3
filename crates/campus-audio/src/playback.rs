//! Speaker playback with a cooperative stop signal

use crate::error::{Error, Result};
use rodio::{Decoder, OutputStream, Sink};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// How a playback run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// Playback ran to completion
    Completed,
    /// Playback was interrupted by the stop signal
    Stopped,
}

/// Play WAV audio on the default output device, polling the stop flag.
///
/// The stop signal is cooperative: it is observed at the polling interval,
/// not instantaneously. This is a blocking call; run it on a blocking thread
/// from async contexts.
///
/// # Errors
/// Returns an error when no output device is available or the audio cannot
/// be decoded.
pub fn play_wav(audio_data: &[u8], stop: &Arc<AtomicBool>) -> Result<PlayOutcome> {
    let (_stream, handle) = OutputStream::try_default()
        .map_err(|e| Error::AudioDevice(format!("Failed to get output device: {}", e)))?;

    let source = Decoder::new(Cursor::new(audio_data.to_vec()))
        .map_err(|e| Error::AudioStream(format!("Failed to decode audio: {}", e)))?;

    let sink = Sink::try_new(&handle)
        .map_err(|e| Error::AudioStream(format!("Failed to create sink: {}", e)))?;

    sink.append(source);
    debug!("Audio playback started");

    loop {
        if stop.load(Ordering::SeqCst) {
            sink.stop();
            debug!("Audio playback stopped by request");
            return Ok(PlayOutcome::Stopped);
        }
        if sink.empty() {
            debug!("Audio playback completed");
            return Ok(PlayOutcome::Completed);
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}
