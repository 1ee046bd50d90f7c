//! Daemon module - main event loop orchestration
//!
//! Coordinates the gesture listener, audio capture, transcription,
//! and text delivery components.
//!
//! Transcription runs on a blocking task and reports back through a
//! channel, so the loop keeps consuming gesture signals while a
//! request is in flight. A double tap during transcription is ignored
//! rather than queued; the session state machine enforces that.

use crate::audio::feedback::{Cue, CuePlayer};
use crate::audio::{self, AudioCapture};
use crate::config::Config;
use crate::error::{DeliverError, DictapError, Result, TranscribeError};
use crate::gesture::GestureSignal;
use crate::hotkey::GestureListener;
use crate::output::{self, TextSink};
use crate::session::{self, AudioArtifact, Session};
use crate::transcribe::{self, TranscriptionResult, Transcriber};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;

type TranscribeOutcome = std::result::Result<TranscriptionResult, TranscribeError>;

/// Main daemon that orchestrates all components
pub struct Daemon {
    config: Config,
    session: Arc<Session>,
    cues: Option<CuePlayer>,
}

impl Daemon {
    /// Create a new daemon with the given configuration
    pub fn new(config: Config) -> Self {
        let cues = if config.audio.feedback.enabled {
            match CuePlayer::new(&config.audio.feedback) {
                Ok(player) => {
                    tracing::info!(
                        "Audio cues enabled (volume: {:.0}%)",
                        config.audio.feedback.volume * 100.0
                    );
                    Some(player)
                }
                Err(e) => {
                    tracing::warn!("Failed to initialize audio cues: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Self {
            config,
            session: Arc::new(Session::new()),
            cues,
        }
    }

    /// Play an audio cue if enabled
    fn play_cue(&self, cue: Cue) {
        if let Some(ref cues) = self.cues {
            cues.play(cue);
        }
    }

    /// Handle a start signal: begin a recording if we are idle
    async fn handle_start(&self, capture_slot: &mut Option<Box<dyn AudioCapture>>) {
        if !self.session.begin_recording() {
            tracing::debug!("Ignoring start signal ({})", self.session.current());
            return;
        }

        tracing::debug!(
            "Creating audio capture with device: {}",
            self.config.audio.device
        );
        match audio::create_capture(&self.config.audio) {
            Ok(mut capture) => match capture.start().await {
                Ok(()) => {
                    *capture_slot = Some(capture);
                    self.play_cue(Cue::Start);
                    tracing::info!("Recording started");
                }
                Err(e) => {
                    tracing::error!("Failed to start audio: {}", e);
                    self.session.cancel_recording();
                    self.play_cue(Cue::Error);
                }
            },
            Err(e) => {
                tracing::error!("Failed to create audio capture: {}", e);
                self.session.cancel_recording();
                self.play_cue(Cue::Error);
            }
        }
    }

    /// Handle a stop signal: end the recording and hand the audio to a
    /// transcription task
    async fn handle_stop(
        &self,
        capture_slot: &mut Option<Box<dyn AudioCapture>>,
        transcriber: &Arc<dyn Transcriber>,
        done_tx: &mpsc::Sender<TranscribeOutcome>,
    ) {
        if !self.session.current().is_recording() {
            tracing::debug!("Ignoring stop signal ({})", self.session.current());
            return;
        }

        // Acknowledge the tap immediately, before any gating, so the
        // user knows the recording ended
        self.play_cue(Cue::Stop);

        let duration = self.session.recording_duration().unwrap_or_default();
        tracing::info!("Recording stopped ({:.1}s)", duration.as_secs_f32());

        let Some(mut capture) = capture_slot.take() else {
            tracing::warn!("No active capture for recording session");
            self.session.cancel_recording();
            return;
        };

        let samples = match capture.stop().await {
            Ok(samples) => samples,
            Err(e) => {
                tracing::warn!("Recording error: {}", e);
                self.session.cancel_recording();
                return;
            }
        };

        let sample_rate = self.config.audio.sample_rate;
        let min_duration = Duration::from_millis(self.config.audio.min_duration_ms);
        if !session::meets_min_duration(&samples, sample_rate, min_duration) {
            tracing::debug!(
                "Recording too short ({} samples), ignoring",
                samples.len()
            );
            self.session.cancel_recording();
            return;
        }

        let artifact = match AudioArtifact::from_samples(&samples, sample_rate) {
            Ok(artifact) => artifact,
            Err(e) => {
                tracing::error!("Failed to stage recording: {}", e);
                self.session.cancel_recording();
                self.play_cue(Cue::Error);
                return;
            }
        };

        if !self.session.begin_transcribing() {
            tracing::warn!("Session left recording state mid-stop");
            return;
        }

        tracing::info!(
            "Transcribing {:.1}s of audio...",
            artifact.duration().as_secs_f32()
        );

        // The artifact moves into the task and is deleted when the
        // task finishes, success or not
        let transcriber = Arc::clone(transcriber);
        let tx = done_tx.clone();
        tokio::task::spawn_blocking(move || {
            let outcome = transcribe::dispatch(transcriber.as_ref(), &artifact);
            if tx.blocking_send(outcome).is_err() {
                tracing::warn!("Daemon shut down before transcription finished");
            }
        });
    }

    /// Handle a finished transcription: deliver the text or report why
    /// there is none
    async fn handle_completion(&self, outcome: TranscribeOutcome, sink: &dyn TextSink) {
        if !self.session.finish_transcribing() {
            tracing::warn!("Transcription finished but session was {}", self.session.current());
        }

        match outcome {
            Ok(result) => {
                tracing::debug!("Transcribed via {}: {:?}", result.backend, result.text);
                // Delivery trouble never fails the cycle; the transcription
                // itself succeeded
                if let Err(e) = sink.deliver(&result.text).await {
                    match e {
                        DeliverError::Paste(_)
                        | DeliverError::YdotoolNotFound
                        | DeliverError::YdotoolDaemonDown => {
                            tracing::warn!("{}. Text remains on the clipboard", e);
                        }
                        other => tracing::warn!("Delivery failed: {}", other),
                    }
                }
            }
            Err(TranscribeError::EmptyTranscript) => {
                tracing::debug!("No speech detected, nothing to deliver");
            }
            Err(e) => {
                tracing::error!("Transcription failed: {}", e);
                self.play_cue(Cue::Error);
            }
        }
    }

    /// Run the daemon main loop
    pub async fn run(&mut self) -> Result<()> {
        tracing::info!("Starting dictap daemon");

        let mut sigterm = signal(SignalKind::terminate())?;

        Config::ensure_directories()
            .map_err(|e| DictapError::Config(format!("Failed to create directories: {}", e)))?;

        output::preflight(&self.config.output);

        // Backend construction fails fast: a missing API key or model
        // file surfaces here, not at the first recording
        let transcriber: Arc<dyn Transcriber> =
            Arc::from(transcribe::create_transcriber(&self.config.transcription)?);

        let sink = output::create_sink(&self.config.output);
        tracing::debug!("Delivery sink: {}", sink.name());

        let mut listener = GestureListener::new(&self.config.hotkey)?;
        let mut gesture_rx = listener.start()?;
        tracing::info!(
            "Listening for hotkey: {} (double tap to record, tap to stop)",
            self.config.hotkey.key
        );

        let (done_tx, mut done_rx) = mpsc::channel::<TranscribeOutcome>(4);

        // Audio capture, created fresh for each recording
        let mut capture_slot: Option<Box<dyn AudioCapture>> = None;

        let max_duration = Duration::from_secs(self.config.audio.max_duration_secs as u64);

        loop {
            tokio::select! {
                gesture = gesture_rx.recv() => {
                    match gesture {
                        Some(GestureSignal::Start) => {
                            self.handle_start(&mut capture_slot).await;
                        }
                        Some(GestureSignal::Stop) => {
                            self.handle_stop(&mut capture_slot, &transcriber, &done_tx).await;
                        }
                        None => {
                            tracing::error!("Gesture listener stopped unexpectedly");
                            break;
                        }
                    }
                }

                Some(outcome) = done_rx.recv() => {
                    self.handle_completion(outcome, sink.as_ref()).await;
                }

                // Enforce the recording length cap
                _ = tokio::time::sleep(Duration::from_millis(100)), if self.session.current().is_recording() => {
                    if session::exceeds_max_duration(self.session.recording_duration(), max_duration) {
                        tracing::warn!(
                            "Recording hit the {:.0}s limit, discarding",
                            max_duration.as_secs_f32()
                        );
                        if let Some(mut capture) = capture_slot.take() {
                            let _ = capture.stop().await;
                        }
                        self.session.cancel_recording();
                    }
                }

                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received SIGINT, shutting down...");
                    break;
                }

                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, shutting down...");
                    break;
                }
            }
        }

        // Cleanup: stop any live stream, then give an in-flight
        // transcription a moment to finish so its result still lands
        if let Some(mut capture) = capture_slot.take() {
            let _ = capture.stop().await;
            self.session.cancel_recording();
        }

        if self.session.current().is_transcribing() {
            tracing::info!("Waiting for in-flight transcription...");
            match tokio::time::timeout(Duration::from_secs(10), done_rx.recv()).await {
                Ok(Some(outcome)) => self.handle_completion(outcome, sink.as_ref()).await,
                _ => tracing::warn!("Transcription did not finish before shutdown"),
            }
        }

        tracing::info!("Daemon stopped");

        Ok(())
    }
}
