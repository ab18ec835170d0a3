//! One-shot microphone capture

use crate::config::{SpeechConfig, CAPTURE_SAMPLE_RATE};
use crate::error::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Audio sample type
pub type Sample = f32;

fn input_stream_config(sample_rate: u32) -> Result<(cpal::Device, StreamConfig)> {
    let host = cpal::default_host();

    let device = host
        .default_input_device()
        .ok_or_else(|| Error::AudioDevice("No input device found".to_string()))?;

    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
    info!("Using input device: {}", device_name);

    let supported_configs = device
        .supported_input_configs()
        .map_err(|e| Error::AudioDevice(format!("Failed to get configs: {}", e)))?;

    let mut selected = None;
    for config in supported_configs {
        if config.min_sample_rate().0 <= sample_rate
            && config.max_sample_rate().0 >= sample_rate
            && config.sample_format() == SampleFormat::F32
        {
            selected = Some(config.with_sample_rate(cpal::SampleRate(sample_rate)));
            break;
        }
    }

    let supported = selected
        .ok_or_else(|| Error::AudioDevice(format!("No config supports {}Hz F32", sample_rate)))?;

    Ok((device, supported.into()))
}

/// Record a single utterance from the default microphone.
///
/// Recording stops when trailing silence exceeds the configured duration or
/// the maximum recording time elapses. Returns mono samples at the capture
/// sample rate; an empty vector means nothing above the silence threshold was
/// heard.
///
/// This is a blocking call; run it on a blocking thread from async contexts.
///
/// # Errors
/// Returns an error when no usable input device is available.
pub fn record_once(config: &SpeechConfig) -> Result<Vec<Sample>> {
    let (device, stream_config) = input_stream_config(CAPTURE_SAMPLE_RATE)?;
    let channels = stream_config.channels as usize;

    let (tx, rx) = mpsc::channel::<Vec<Sample>>();

    let stream = device
        .build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                // Downmix to mono before shipping to the collector
                let samples: Vec<f32> = if channels > 1 {
                    data.chunks(channels)
                        .map(|chunk| chunk.iter().sum::<f32>() / channels as f32)
                        .collect()
                } else {
                    data.to_vec()
                };
                let _ = tx.send(samples);
            },
            move |err| {
                error!("Audio input error: {}", err);
            },
            None,
        )
        .map_err(|e| Error::AudioStream(format!("Failed to build stream: {}", e)))?;

    stream
        .play()
        .map_err(|e| Error::AudioStream(format!("Failed to start stream: {}", e)))?;

    let sample_rate = f64::from(CAPTURE_SAMPLE_RATE);
    let silence_samples_threshold =
        (config.silence_duration_ms as f64 * sample_rate / 1000.0) as u64;
    let max_samples = (config.max_record_secs as f64 * sample_rate) as u64;
    let deadline = Instant::now() + Duration::from_secs(config.max_record_secs + 1);

    let mut buffer: Vec<Sample> = Vec::new();
    let mut heard_speech = false;
    let mut silence_samples = 0u64;

    loop {
        if Instant::now() >= deadline {
            debug!("Max recording duration reached");
            break;
        }

        let samples = match rx.recv_timeout(Duration::from_millis(200)) {
            Ok(samples) => samples,
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        };

        let rms = (samples.iter().map(|s| s * s).sum::<f32>() / samples.len().max(1) as f32).sqrt();

        if rms < config.silence_threshold {
            silence_samples += samples.len() as u64;
            if heard_speech && silence_samples > silence_samples_threshold {
                debug!("Trailing silence detected, stopping recording");
                break;
            }
        } else {
            heard_speech = true;
            silence_samples = 0;
        }

        buffer.extend(samples);

        if buffer.len() as u64 > max_samples {
            debug!("Max samples reached");
            break;
        }
    }

    drop(stream);

    if !heard_speech {
        return Ok(Vec::new());
    }

    // Trim trailing silence
    let trim = (silence_samples_threshold / 2) as usize;
    if buffer.len() > trim {
        buffer.truncate(buffer.len() - trim);
    }

    Ok(buffer)
}

/// Convert audio samples to 16-bit mono WAV bytes
pub fn samples_to_wav(samples: &[Sample], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| Error::AudioStream(format!("Failed to create WAV writer: {}", e)))?;

        for &sample in samples {
            let amplitude = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
            writer
                .write_sample(amplitude)
                .map_err(|e| Error::AudioStream(format!("Failed to write sample: {}", e)))?;
        }

        writer
            .finalize()
            .map_err(|e| Error::AudioStream(format!("Failed to finalize WAV: {}", e)))?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_to_wav() {
        let samples = vec![0.0f32; 1600]; // 0.1 second at 16kHz
        let wav = samples_to_wav(&samples, 16000).unwrap();

        // WAV header is 44 bytes
        assert!(wav.len() > 44);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
    }

    #[test]
    fn test_samples_to_wav_clamps_overdrive() {
        let samples = vec![2.0f32, -2.0f32];
        let wav = samples_to_wav(&samples, 16000).unwrap();
        assert!(wav.len() > 44);
    }

    #[test]
    #[ignore = "Requires audio hardware"]
    fn test_record_once() {
        let config = SpeechConfig::new("key", "region");
        let result = record_once(&config);
        assert!(result.is_ok());
    }
}
