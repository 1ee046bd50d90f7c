//! Feedback cues
//!
//! Short tones confirming state transitions: rising for recording
//! start, falling for stop, a low buzz for errors. Playback is
//! fire-and-forget through a detached rodio sink and never blocks or
//! fails the caller; the tones are generated at startup so no audio
//! assets ship with the binary.

use crate::config::FeedbackConfig;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::io::Cursor;

/// Cue types tied to state transitions
#[derive(Debug, Clone, Copy)]
pub enum Cue {
    /// Recording started
    Start,
    /// Recording stopped
    Stop,
    /// A cycle failed
    Error,
}

/// Plays feedback cues through the default output device
pub struct CuePlayer {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    volume: f32,
    cues: CueSet,
}

/// Pre-rendered WAV data for each cue
struct CueSet {
    start: Vec<u8>,
    stop: Vec<u8>,
    error: Vec<u8>,
}

impl CuePlayer {
    /// Open the output device and render the cue set.
    /// Fails when feedback is disabled or no output device exists;
    /// callers treat that as "run without cues".
    pub fn new(config: &FeedbackConfig) -> Result<Self, String> {
        if !config.enabled {
            return Err("Audio feedback is disabled".to_string());
        }

        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| format!("Failed to open audio output: {}", e))?;

        Ok(Self {
            _stream: stream,
            stream_handle,
            volume: config.volume,
            cues: CueSet::render(),
        })
    }

    /// Play a cue without blocking; failures are logged and swallowed.
    pub fn play(&self, cue: Cue) {
        let data = match cue {
            Cue::Start => &self.cues.start,
            Cue::Stop => &self.cues.stop,
            Cue::Error => &self.cues.error,
        };

        if let Err(e) = self.play_wav(data) {
            tracing::warn!("Failed to play feedback cue: {}", e);
        }
    }

    fn play_wav(&self, data: &[u8]) -> Result<(), String> {
        let cursor = Cursor::new(data.to_vec());
        let source = Decoder::new(cursor).map_err(|e| format!("Failed to decode cue: {}", e))?;
        let source = source.amplify(self.volume);

        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| format!("Failed to create audio sink: {}", e))?;

        sink.append(source);
        sink.detach(); // Let it play in the background

        Ok(())
    }
}

impl CueSet {
    fn render() -> Self {
        Self {
            // Rising two-tone: recording is live
            start: generate_two_tone_wav(440.0, 880.0, 150, 20),
            // Falling two-tone: recording ended
            stop: generate_two_tone_wav(880.0, 440.0, 150, 20),
            // Low warning tone
            error: generate_two_tone_wav(300.0, 200.0, 200, 30),
        }
    }
}

/// Generate a two-tone sine sweep as a WAV byte buffer
fn generate_two_tone_wav(freq1: f32, freq2: f32, duration_ms: u32, fade_ms: u32) -> Vec<u8> {
    let sample_rate = 44100u32;
    let num_samples = (sample_rate * duration_ms / 1000) as usize;
    let fade_samples = (sample_rate * fade_ms / 1000) as usize;
    let half_samples = num_samples / 2;

    let mut samples: Vec<i16> = Vec::with_capacity(num_samples);

    for i in 0..num_samples {
        let t = i as f32 / sample_rate as f32;
        let freq = if i < half_samples { freq1 } else { freq2 };
        let mut amplitude = (2.0 * std::f32::consts::PI * freq * t).sin();

        // Fade in/out envelope to avoid clicks at the edges
        if i < fade_samples {
            amplitude *= i as f32 / fade_samples as f32;
        } else if i >= num_samples - fade_samples {
            amplitude *= (num_samples - i) as f32 / fade_samples as f32;
        }

        samples.push((amplitude * 16000.0) as i16);
    }

    encode_wav(&samples, sample_rate)
}

/// Encode mono i16 samples as a WAV byte buffer
fn encode_wav(samples: &[i16], sample_rate: u32) -> Vec<u8> {
    let mut wav = Vec::new();

    // RIFF header
    wav.extend_from_slice(b"RIFF");
    let file_size = (36 + samples.len() * 2) as u32;
    wav.extend_from_slice(&file_size.to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    // fmt chunk
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    wav.extend_from_slice(&1u16.to_le_bytes()); // mono
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&(sample_rate * 2).to_le_bytes()); // byte rate
    wav.extend_from_slice(&2u16.to_le_bytes()); // block align
    wav.extend_from_slice(&16u16.to_le_bytes()); // bits per sample

    // data chunk
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&((samples.len() * 2) as u32).to_le_bytes());
    for sample in samples {
        wav.extend_from_slice(&sample.to_le_bytes());
    }

    wav
}
