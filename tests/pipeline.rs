//! End-to-end pipeline tests with stub backends
//!
//! These tests drive the recording pipeline the way the daemon does,
//! with the transcriber and delivery sink replaced by stubs, so CI can
//! verify the plumbing without a microphone or network access.

use dictap::error::{DeliverError, TranscribeError};
use dictap::output::TextSink;
use dictap::session::{
    exceeds_max_duration, meets_min_duration, AudioArtifact, Session, SessionState,
};
use dictap::transcribe::{dispatch, Transcriber};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// One second of quiet audio at 16kHz
fn one_second_of_audio() -> Vec<f32> {
    (0..16000)
        .map(|i| (i as f32 * 220.0 * 2.0 * std::f32::consts::PI / 16000.0).sin() * 0.1)
        .collect()
}

/// Transcriber stub that echoes a fixed reply and counts calls
struct EchoTranscriber {
    reply: String,
    calls: AtomicUsize,
}

impl EchoTranscriber {
    fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
        }
    }
}

impl Transcriber for EchoTranscriber {
    fn transcribe(&self, _artifact: &AudioArtifact) -> Result<String, TranscribeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }

    fn name(&self) -> &'static str {
        "echo"
    }
}

/// Transcriber stub that always fails with an auth error
struct RejectingTranscriber {
    calls: AtomicUsize,
}

impl Transcriber for RejectingTranscriber {
    fn transcribe(&self, _artifact: &AudioArtifact) -> Result<String, TranscribeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(TranscribeError::Auth("invalid key".into()))
    }

    fn name(&self) -> &'static str {
        "rejecting"
    }
}

/// Sink stub that records everything delivered to it
#[derive(Default)]
struct RecordingSink {
    delivered: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl TextSink for RecordingSink {
    async fn deliver(&self, text: &str) -> Result<(), DeliverError> {
        self.delivered.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

// ============================================================================
// Transcript round trip
// ============================================================================

#[tokio::test]
async fn transcript_reaches_sink_verbatim() {
    let samples = one_second_of_audio();
    let artifact = AudioArtifact::from_samples(&samples, 16000).unwrap();

    let transcriber = EchoTranscriber::new("the quick brown fox");
    let sink = RecordingSink::default();

    let result = dispatch(&transcriber, &artifact).unwrap();
    sink.deliver(&result.text).await.unwrap();

    let delivered = sink.delivered.lock().unwrap();
    assert_eq!(delivered.as_slice(), ["the quick brown fox"]);
}

#[tokio::test]
async fn backend_output_is_trimmed_before_delivery() {
    let samples = one_second_of_audio();
    let artifact = AudioArtifact::from_samples(&samples, 16000).unwrap();

    let transcriber = EchoTranscriber::new("  padded text \n");
    let sink = RecordingSink::default();

    let result = dispatch(&transcriber, &artifact).unwrap();
    sink.deliver(&result.text).await.unwrap();

    let delivered = sink.delivered.lock().unwrap();
    assert_eq!(delivered.as_slice(), ["padded text"]);
}

// ============================================================================
// Artifact lifecycle
// ============================================================================

#[tokio::test]
async fn artifact_file_removed_after_transcription_task() {
    let samples = one_second_of_audio();
    let artifact = AudioArtifact::from_samples(&samples, 16000).unwrap();
    let wav_path: PathBuf = artifact.path().to_path_buf();
    assert!(wav_path.exists());

    // Mirror the daemon: the artifact moves into the blocking task and
    // is dropped there, whatever the outcome
    let outcome = tokio::task::spawn_blocking(move || {
        let transcriber = EchoTranscriber::new("done");
        dispatch(&transcriber, &artifact)
    })
    .await
    .unwrap();

    assert!(outcome.is_ok());
    assert!(
        !wav_path.exists(),
        "Staged WAV should be deleted once transcription finishes"
    );
}

#[tokio::test]
async fn artifact_file_removed_when_transcription_fails() {
    let samples = one_second_of_audio();
    let artifact = AudioArtifact::from_samples(&samples, 16000).unwrap();
    let wav_path: PathBuf = artifact.path().to_path_buf();

    let outcome = tokio::task::spawn_blocking(move || {
        let transcriber = RejectingTranscriber {
            calls: AtomicUsize::new(0),
        };
        dispatch(&transcriber, &artifact)
    })
    .await
    .unwrap();

    assert!(outcome.is_err());
    assert!(
        !wav_path.exists(),
        "Staged WAV should be deleted even when the backend fails"
    );
}

// ============================================================================
// Failure handling
// ============================================================================

#[test]
fn failed_transcription_calls_backend_exactly_once() {
    let samples = one_second_of_audio();
    let artifact = AudioArtifact::from_samples(&samples, 16000).unwrap();

    let transcriber = RejectingTranscriber {
        calls: AtomicUsize::new(0),
    };

    let err = dispatch(&transcriber, &artifact).unwrap_err();
    assert!(matches!(err, TranscribeError::Auth(_)));
    assert_eq!(
        transcriber.calls.load(Ordering::SeqCst),
        1,
        "A failed request must not be retried"
    );
}

#[test]
fn silent_transcript_is_reported_as_empty() {
    let samples = one_second_of_audio();
    let artifact = AudioArtifact::from_samples(&samples, 16000).unwrap();

    let transcriber = EchoTranscriber::new("   ");
    let err = dispatch(&transcriber, &artifact).unwrap_err();
    assert!(matches!(err, TranscribeError::EmptyTranscript));
}

// ============================================================================
// Session state machine
// ============================================================================

#[test]
fn session_walks_full_recording_cycle() {
    let session = Session::new();
    assert_eq!(session.current(), SessionState::Idle);

    assert!(session.begin_recording());
    assert!(session.current().is_recording());

    assert!(session.begin_transcribing());
    assert_eq!(session.current(), SessionState::Transcribing);

    assert!(session.finish_transcribing());
    assert_eq!(session.current(), SessionState::Idle);
}

#[test]
fn start_during_transcription_is_rejected() {
    let session = Session::new();
    assert!(session.begin_recording());
    assert!(session.begin_transcribing());

    // A new double tap while a request is in flight must be dropped,
    // not queued
    assert!(!session.begin_recording());
    assert_eq!(session.current(), SessionState::Transcribing);

    assert!(session.finish_transcribing());
    assert!(session.begin_recording());
}

#[test]
fn short_recordings_are_gated_before_staging() {
    // 100ms at 16kHz sits under the default 300ms floor
    let short = vec![0.1f32; 1600];
    assert!(!meets_min_duration(&short, 16000, Duration::from_millis(300)));

    let long_enough = vec![0.1f32; 8000];
    assert!(meets_min_duration(&long_enough, 16000, Duration::from_millis(300)));
}

#[test]
fn overlong_recordings_are_discarded_not_dispatched() {
    let session = Session::new();
    let cap = Duration::from_secs(120);

    assert!(session.begin_recording());

    // The watchdog leaves an in-bounds recording alone
    assert!(!exceeds_max_duration(Some(Duration::from_secs(30)), cap));
    assert!(session.current().is_recording());

    // Once the measured duration passes the cap the recording is torn
    // down without ever reaching the dispatcher
    assert!(exceeds_max_duration(Some(cap + Duration::from_millis(1)), cap));
    assert!(session.cancel_recording());
    assert_eq!(session.current(), SessionState::Idle);

    // The next gesture starts a fresh cycle
    assert!(session.begin_recording());
}
