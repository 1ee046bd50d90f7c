//! Audio capture and playback
//!
//! Capture uses cpal, which works with PipeWire, PulseAudio, and ALSA
//! backends; feedback cues play through rodio. Everything downstream of
//! capture works on mono f32 samples at the configured rate (16 kHz by
//! default), produced here.

pub mod capture;
pub mod feedback;

use crate::config::AudioConfig;
use crate::error::AudioError;
use std::path::Path;

/// Trait for audio capture implementations
#[async_trait::async_trait]
pub trait AudioCapture: Send + Sync {
    /// Open the input stream and begin buffering frames.
    /// Returns once the stream is actually running.
    async fn start(&mut self) -> Result<(), AudioError>;

    /// Close the stream and return everything recorded
    /// (f32 samples, mono, at the configured rate).
    async fn stop(&mut self) -> Result<Vec<f32>, AudioError>;
}

/// Factory function to create audio capture
pub fn create_capture(config: &AudioConfig) -> Result<Box<dyn AudioCapture>, AudioError> {
    Ok(Box::new(capture::CpalCapture::new(config)?))
}

/// Load a WAV file as mono f32 samples at the target rate.
///
/// Accepts 16-bit int and 32-bit float WAVs at any rate/channel count;
/// multi-channel audio is mixed down, other rates are resampled.
pub fn load_wav_mono(path: &Path, target_rate: u32) -> Result<Vec<f32>, AudioError> {
    let mut reader = hound::WavReader::open(path)
        .map_err(|e| AudioError::Decode(format!("Failed to open {:?}: {}", path, e)))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / 32768.0))
            .collect::<Result<_, _>>()
            .map_err(|e| AudioError::Decode(e.to_string()))?,
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| AudioError::Decode(e.to_string()))?,
    };

    let mono: Vec<f32> = if spec.channels > 1 {
        samples
            .chunks(spec.channels as usize)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    } else {
        samples
    };

    Ok(capture::resample(&mono, spec.sample_rate, target_rate))
}
