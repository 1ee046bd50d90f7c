//! Speech-to-text transcription module
//!
//! Provides transcription via:
//! - Groq-hosted Whisper API
//! - ElevenLabs speech-to-text API
//! - Local whisper.cpp inference (whisper-rs crate)

pub mod elevenlabs;
pub mod groq;
pub mod whisper;

use crate::config::{Backend, TranscriptionConfig};
use crate::error::TranscribeError;
use crate::session::AudioArtifact;

/// Trait for speech-to-text implementations
pub trait Transcriber: Send + Sync {
    /// Transcribe the recorded audio to text
    ///
    /// Called at most once per recording. The artifact stays alive
    /// (and its WAV file on disk) for the duration of the call.
    fn transcribe(&self, artifact: &AudioArtifact) -> Result<String, TranscribeError>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Outcome of a successful transcription request
#[derive(Debug, Clone)]
pub struct TranscriptionResult {
    /// Transcript with surrounding whitespace removed, never empty
    pub text: String,
    /// Name of the backend that produced it
    pub backend: &'static str,
}

/// Create a transcriber based on configuration
pub fn create_transcriber(
    config: &TranscriptionConfig,
) -> Result<Box<dyn Transcriber>, TranscribeError> {
    match config.backend {
        Backend::Groq => {
            tracing::info!("Using Groq transcription backend");
            Ok(Box::new(groq::GroqTranscriber::new(config)?))
        }
        Backend::Elevenlabs => {
            tracing::info!("Using ElevenLabs transcription backend");
            Ok(Box::new(elevenlabs::ElevenLabsTranscriber::new(config)?))
        }
        Backend::Whisper => {
            tracing::info!("Using local whisper transcription backend");
            Ok(Box::new(whisper::LocalWhisper::new(config)?))
        }
    }
}

/// Run one transcription request and normalize the outcome
///
/// Issues exactly one call to the backend. Whitespace-only transcripts
/// come back as `EmptyTranscript` so callers can treat silence as a
/// non-event rather than a delivery.
pub fn dispatch(
    transcriber: &dyn Transcriber,
    artifact: &AudioArtifact,
) -> Result<TranscriptionResult, TranscribeError> {
    let started = std::time::Instant::now();
    tracing::debug!(
        "Dispatching {:.2}s of audio to {}",
        artifact.duration().as_secs_f32(),
        transcriber.name()
    );

    let raw = transcriber.transcribe(artifact)?;
    let text = raw.trim().to_string();

    if text.is_empty() {
        tracing::debug!("{} returned no text", transcriber.name());
        return Err(TranscribeError::EmptyTranscript);
    }

    tracing::info!(
        "{} transcribed {:.2}s of audio in {:.2}s ({} chars)",
        transcriber.name(),
        artifact.duration().as_secs_f32(),
        started.elapsed().as_secs_f32(),
        text.chars().count()
    );

    Ok(TranscriptionResult {
        text,
        backend: transcriber.name(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedTranscriber {
        reply: &'static str,
        calls: AtomicUsize,
    }

    impl FixedTranscriber {
        fn new(reply: &'static str) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Transcriber for FixedTranscriber {
        fn transcribe(&self, _artifact: &AudioArtifact) -> Result<String, TranscribeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.to_string())
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    struct FailingTranscriber {
        calls: AtomicUsize,
    }

    impl Transcriber for FailingTranscriber {
        fn transcribe(&self, _artifact: &AudioArtifact) -> Result<String, TranscribeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(TranscribeError::Auth("key rejected".into()))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    fn test_artifact() -> AudioArtifact {
        let samples = vec![0.1f32; 16000];
        AudioArtifact::from_samples(&samples, 16000).unwrap()
    }

    #[test]
    fn test_dispatch_trims_whitespace() {
        let artifact = test_artifact();
        let backend = FixedTranscriber::new("  hello world \n");

        let result = dispatch(&backend, &artifact).unwrap();
        assert_eq!(result.text, "hello world");
        assert_eq!(result.backend, "fixed");
    }

    #[test]
    fn test_dispatch_maps_blank_to_empty_transcript() {
        let artifact = test_artifact();
        let backend = FixedTranscriber::new("   \n\t ");

        let err = dispatch(&backend, &artifact).unwrap_err();
        assert!(matches!(err, TranscribeError::EmptyTranscript));
    }

    #[test]
    fn test_dispatch_calls_backend_exactly_once() {
        let artifact = test_artifact();
        let backend = FixedTranscriber::new("once");

        dispatch(&backend, &artifact).unwrap();
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dispatch_failure_is_not_retried() {
        let artifact = test_artifact();
        let backend = FailingTranscriber {
            calls: AtomicUsize::new(0),
        };

        let err = dispatch(&backend, &artifact).unwrap_err();
        assert!(matches!(err, TranscribeError::Auth(_)));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }
}
