//! Local whisper.cpp transcription
//!
//! Uses whisper.cpp via the whisper-rs crate. No network, no API key;
//! the model file lives on disk and is loaded once at startup.

use super::Transcriber;
use crate::config::{Config, TranscriptionConfig};
use crate::error::TranscribeError;
use crate::session::AudioArtifact;
use std::path::PathBuf;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

const DEFAULT_MODEL: &str = "base.en";

/// Sample rate whisper.cpp expects
const WHISPER_SAMPLE_RATE: u32 = 16000;

/// Transcriber running whisper.cpp in-process
pub struct LocalWhisper {
    /// Whisper context (holds the model)
    ctx: WhisperContext,
    /// Language for transcription, "auto" enables detection
    language: String,
    /// Number of threads to use
    threads: usize,
}

impl LocalWhisper {
    /// Create a new local transcriber, loading the model eagerly
    ///
    /// Model loading is the slow part of startup (seconds for the
    /// larger models), so it happens here rather than on first use.
    pub fn new(config: &TranscriptionConfig) -> Result<Self, TranscribeError> {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        let model_path = resolve_model_path(model)?;

        tracing::info!("Loading whisper model from {:?}", model_path);
        let start = std::time::Instant::now();

        let ctx = WhisperContext::new_with_params(
            model_path
                .to_str()
                .ok_or_else(|| TranscribeError::ModelNotFound("Invalid path".to_string()))?,
            WhisperContextParameters::default(),
        )
        .map_err(|e| TranscribeError::InitFailed(e.to_string()))?;

        tracing::info!("Model loaded in {:.2}s", start.elapsed().as_secs_f32());

        let threads = config.threads.unwrap_or_else(|| num_cpus::get().min(4));

        Ok(Self {
            ctx,
            language: config.language.clone(),
            threads,
        })
    }
}

impl Transcriber for LocalWhisper {
    fn transcribe(&self, artifact: &AudioArtifact) -> Result<String, TranscribeError> {
        let samples = crate::audio::load_wav_mono(artifact.path(), WHISPER_SAMPLE_RATE)
            .map_err(|e| TranscribeError::UnsupportedAudio(e.to_string()))?;
        if samples.is_empty() {
            return Err(TranscribeError::UnsupportedAudio(
                "empty audio buffer".to_string(),
            ));
        }

        let duration_secs = samples.len() as f32 / WHISPER_SAMPLE_RATE as f32;
        tracing::debug!(
            "Transcribing {:.2}s of audio ({} samples)",
            duration_secs,
            samples.len()
        );

        // Each transcription gets its own state; the context itself is
        // immutable after loading
        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| TranscribeError::InferenceFailed(e.to_string()))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });

        if self.language == "auto" {
            params.set_language(None);
        } else {
            params.set_language(Some(&self.language));
        }

        params.set_translate(false);
        params.set_n_threads(self.threads as i32);

        // Disable output we don't need
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        // Improve transcription quality
        params.set_suppress_blank(true);
        params.set_suppress_nst(true);

        // Dictation clips are short; single segment mode avoids
        // spurious splits
        if duration_secs < 30.0 {
            params.set_single_segment(true);
        }

        // Shrink the encoder context for short clips
        if let Some(audio_ctx) = calculate_audio_ctx(duration_secs) {
            params.set_audio_ctx(audio_ctx);
            tracing::debug!(
                "Using audio_ctx={} for {:.2}s clip",
                audio_ctx,
                duration_secs
            );
        }

        state
            .full(params, &samples)
            .map_err(|e| TranscribeError::InferenceFailed(e.to_string()))?;

        let mut text = String::new();
        for segment in state.as_iter() {
            text.push_str(
                segment
                    .to_str()
                    .map_err(|e| TranscribeError::InferenceFailed(e.to_string()))?,
            );
        }

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "whisper"
    }
}

/// Resolve model name to file path
fn resolve_model_path(model: &str) -> Result<PathBuf, TranscribeError> {
    // If it's already an absolute path, use it directly
    let path = PathBuf::from(model);
    if path.is_absolute() && path.exists() {
        return Ok(path);
    }

    // Map model names to file names
    let model_filename = match model {
        "tiny" => "ggml-tiny.bin",
        "tiny.en" => "ggml-tiny.en.bin",
        "base" => "ggml-base.bin",
        "base.en" => "ggml-base.en.bin",
        "small" => "ggml-small.bin",
        "small.en" => "ggml-small.en.bin",
        "medium" => "ggml-medium.bin",
        "medium.en" => "ggml-medium.en.bin",
        "large" | "large-v3" => "ggml-large-v3.bin",
        "large-v3-turbo" => "ggml-large-v3-turbo.bin",
        // If it looks like a filename, use it as-is
        other if other.ends_with(".bin") => other,
        other => {
            return Err(TranscribeError::ModelNotFound(format!(
                "Unknown model: '{}'. Valid models: tiny, base, small, medium, large-v3, large-v3-turbo",
                other
            )));
        }
    };

    // Look in the data directory
    let models_dir = Config::models_dir();
    let model_path = models_dir.join(model_filename);

    if model_path.exists() {
        return Ok(model_path);
    }

    // Also check ./models/
    let local_models_path = PathBuf::from("models").join(model_filename);
    if local_models_path.exists() {
        return Ok(local_models_path);
    }

    Err(TranscribeError::ModelNotFound(format!(
        "Model '{}' not found. Looked in:\n  - {}\n  - {}\n\nDownload from: https://huggingface.co/ggerganov/whisper.cpp/tree/main",
        model,
        model_path.display(),
        local_models_path.display()
    )))
}

/// Calculate audio_ctx parameter for short clips (<=22.5s).
/// Formula: duration_seconds * 50 + 64
fn calculate_audio_ctx(duration_secs: f32) -> Option<i32> {
    if duration_secs <= 22.5 {
        Some((duration_secs * 50.0) as i32 + 64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_model_rejected() {
        let err = resolve_model_path("enormous").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("enormous"));
        assert!(msg.contains("Valid models"));
    }

    #[test]
    fn test_missing_model_lists_search_paths() {
        let err = resolve_model_path("tiny.en").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("ggml-tiny.en.bin"));
        assert!(msg.contains("huggingface.co"));
    }

    #[test]
    fn test_absolute_path_used_directly() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();

        let resolved = resolve_model_path(path.to_str().unwrap()).unwrap();
        assert_eq!(resolved, path);
    }

    #[test]
    fn test_audio_ctx_for_short_clips() {
        assert_eq!(calculate_audio_ctx(2.0), Some(164));
        assert_eq!(calculate_audio_ctx(22.5), Some(1189));
        assert_eq!(calculate_audio_ctx(30.0), None);
    }
}
