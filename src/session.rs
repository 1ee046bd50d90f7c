//! Recording session state machine
//!
//! One [`Session`] exists per process. It owns the only mutable shared
//! state in the daemon, the Idle → Recording → Transcribing → Idle
//! cycle, and every transition goes through a guarded
//! compare-and-transition method. Out-of-turn calls (a Stop while Idle,
//! a Start while Transcribing) leave the state untouched and report
//! `false`; callers log and move on.
//!
//! [`AudioArtifact`] is the finalized product of a recording: a temp WAV
//! file that is deleted when the artifact drops, so no recording survives
//! its own transcription attempt on any exit path.

use crate::error::AudioError;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Where the dictation cycle currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the start gesture
    Idle,
    /// Capture stream open, frames accumulating
    Recording {
        /// When recording started
        started_at: Instant,
    },
    /// Artifact handed to the transcription backend
    Transcribing,
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, SessionState::Recording { .. })
    }

    pub fn is_transcribing(&self) -> bool {
        matches!(self, SessionState::Transcribing)
    }

    /// Elapsed recording time, if currently recording
    pub fn recording_duration(&self) -> Option<Duration> {
        match self {
            SessionState::Recording { started_at } => Some(started_at.elapsed()),
            _ => None,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::Idle
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Recording { started_at } => {
                write!(f, "recording ({:.1}s)", started_at.elapsed().as_secs_f32())
            }
            SessionState::Transcribing => write!(f, "transcribing"),
        }
    }
}

/// The process-wide recording session
pub struct Session {
    state: Mutex<SessionState>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SessionState::Idle),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        // A poisoned lock only means a panic elsewhere; the state value
        // itself is always coherent, so keep going with it.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current state snapshot
    pub fn current(&self) -> SessionState {
        *self.lock()
    }

    /// Idle → Recording. Returns false (and changes nothing) otherwise.
    pub fn begin_recording(&self) -> bool {
        let mut state = self.lock();
        match *state {
            SessionState::Idle => {
                *state = SessionState::Recording {
                    started_at: Instant::now(),
                };
                true
            }
            other => {
                tracing::debug!("Ignoring start while {}", other);
                false
            }
        }
    }

    /// Recording → Transcribing. Returns false otherwise.
    pub fn begin_transcribing(&self) -> bool {
        let mut state = self.lock();
        match *state {
            SessionState::Recording { .. } => {
                *state = SessionState::Transcribing;
                true
            }
            other => {
                tracing::debug!("Ignoring stop while {}", other);
                false
            }
        }
    }

    /// Recording → Idle, for discarded recordings. Returns false otherwise.
    pub fn cancel_recording(&self) -> bool {
        let mut state = self.lock();
        match *state {
            SessionState::Recording { .. } => {
                *state = SessionState::Idle;
                true
            }
            other => {
                tracing::debug!("No recording to cancel while {}", other);
                false
            }
        }
    }

    /// Transcribing → Idle, once the dispatch completes either way.
    pub fn finish_transcribing(&self) -> bool {
        let mut state = self.lock();
        match *state {
            SessionState::Transcribing => {
                *state = SessionState::Idle;
                true
            }
            other => {
                tracing::debug!("No transcription to finish while {}", other);
                false
            }
        }
    }

    /// Elapsed recording time, if currently recording
    pub fn recording_duration(&self) -> Option<Duration> {
        self.lock().recording_duration()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// A finalized recording awaiting transcription.
///
/// Owns its temp WAV file; the file is removed when the artifact drops,
/// whether the transcription succeeded, failed, or never ran.
pub struct AudioArtifact {
    file: tempfile::NamedTempFile,
    duration: Duration,
    sample_rate: u32,
    channels: u16,
}

impl AudioArtifact {
    /// Write mono f32 samples into a fresh temp WAV (16-bit PCM).
    pub fn from_samples(samples: &[f32], sample_rate: u32) -> Result<Self, AudioError> {
        if samples.is_empty() {
            return Err(AudioError::EmptyRecording);
        }

        let file = tempfile::Builder::new()
            .prefix("dictap_")
            .suffix(".wav")
            .tempfile()
            .map_err(|e| AudioError::Encode(format!("Failed to create temp file: {}", e)))?;

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = hound::WavWriter::create(file.path(), spec)?;
        for &sample in samples {
            // Convert f32 [-1.0, 1.0] to i16
            let clamped = sample.clamp(-1.0, 1.0);
            writer.write_sample((clamped * 32767.0) as i16)?;
        }
        writer.finalize()?;

        let duration = Duration::from_secs_f64(samples.len() as f64 / sample_rate as f64);
        tracing::debug!(
            "Finalized {:.2}s recording at {:?}",
            duration.as_secs_f64(),
            file.path()
        );

        Ok(Self {
            file,
            duration,
            sample_rate,
            channels: 1,
        })
    }

    /// Path to the backing WAV file
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}

impl std::fmt::Debug for AudioArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioArtifact")
            .field("path", &self.file.path())
            .field("duration", &self.duration)
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .finish()
    }
}

/// Whether a buffer is long enough to be worth transcribing
pub fn meets_min_duration(samples: &[f32], sample_rate: u32, min: Duration) -> bool {
    if sample_rate == 0 {
        return false;
    }
    let duration = Duration::from_secs_f64(samples.len() as f64 / sample_rate as f64);
    duration >= min
}

/// Whether a live recording has run past the length cap.
///
/// `elapsed` is `None` when nothing is recording; a recording at
/// exactly the cap is still within bounds.
pub fn exceeds_max_duration(elapsed: Option<Duration>, cap: Duration) -> bool {
    matches!(elapsed, Some(d) if d > cap)
}
