//! Groq-hosted Whisper transcription
//!
//! Sends recorded audio to Groq's OpenAI-compatible transcription
//! endpoint. Fast enough that round trips usually beat local inference
//! on laptop hardware.

use super::Transcriber;
use crate::config::TranscriptionConfig;
use crate::error::TranscribeError;
use crate::session::AudioArtifact;
use std::time::Duration;

const GROQ_ENDPOINT: &str = "https://api.groq.com/openai/v1/audio/transcriptions";
const DEFAULT_MODEL: &str = "whisper-large-v3";

/// Transcriber backed by the Groq speech-to-text API
pub struct GroqTranscriber {
    /// Model name sent with each request
    model: String,
    /// Bearer token, from config or GROQ_API_KEY
    api_key: String,
    /// Request timeout
    timeout: Duration,
}

impl GroqTranscriber {
    /// Create a new Groq transcriber from config
    ///
    /// Fails immediately when no API key is available, so a
    /// misconfigured daemon dies at startup rather than on the first
    /// recording.
    pub fn new(config: &TranscriptionConfig) -> Result<Self, TranscribeError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("GROQ_API_KEY").ok())
            .ok_or_else(|| {
                TranscribeError::Auth(
                    "No API key. Set GROQ_API_KEY or transcription.api_key in the config file"
                        .into(),
                )
            })?;

        let model = config
            .model
            .clone()
            .or_else(|| std::env::var("GROQ_MODEL").ok())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let timeout = Duration::from_secs(config.timeout_secs);

        tracing::info!(
            "Configured Groq transcriber: model={}, timeout={}s",
            model,
            timeout.as_secs()
        );

        Ok(Self {
            model,
            api_key,
            timeout,
        })
    }

    /// Build the multipart form body for the API request
    fn build_multipart_body(&self, wav_data: &[u8]) -> (String, Vec<u8>) {
        let boundary = format!(
            "----DictapBoundary{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        );

        let mut body = Vec::new();

        // Add file field
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            b"Content-Disposition: form-data; name=\"file\"; filename=\"audio.wav\"\r\n",
        );
        body.extend_from_slice(b"Content-Type: audio/wav\r\n\r\n");
        body.extend_from_slice(wav_data);
        body.extend_from_slice(b"\r\n");

        // Add model field
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(b"Content-Disposition: form-data; name=\"model\"\r\n\r\n");
        body.extend_from_slice(self.model.as_bytes());
        body.extend_from_slice(b"\r\n");

        // Add response_format field
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(b"Content-Disposition: form-data; name=\"response_format\"\r\n\r\n");
        body.extend_from_slice(b"json\r\n");

        // End boundary
        body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

        (boundary, body)
    }
}

impl Transcriber for GroqTranscriber {
    fn transcribe(&self, artifact: &AudioArtifact) -> Result<String, TranscribeError> {
        let wav_data = std::fs::read(artifact.path())
            .map_err(|e| TranscribeError::Vendor(format!("Failed to read recording: {}", e)))?;
        tracing::debug!(
            "Sending {:.2}s of audio to Groq ({} bytes)",
            artifact.duration().as_secs_f32(),
            wav_data.len()
        );

        let (boundary, body) = self.build_multipart_body(&wav_data);

        let response = ureq::post(GROQ_ENDPOINT)
            .timeout(self.timeout)
            .set(
                "Content-Type",
                &format!("multipart/form-data; boundary={}", boundary),
            )
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .send_bytes(&body)
            .map_err(|e| map_http_error("Groq", e))?;

        let json: serde_json::Value = response
            .into_json()
            .map_err(|e| TranscribeError::Vendor(format!("Failed to parse response: {}", e)))?;

        let text = json
            .get("text")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                TranscribeError::Vendor(format!("Response missing 'text' field: {}", json))
            })?
            .to_string();

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "groq"
    }
}

/// Map a ureq failure onto the transcription error taxonomy
///
/// Shared with the ElevenLabs backend, which speaks the same HTTP
/// dialect even though the endpoint differs.
pub(super) fn map_http_error(vendor: &str, err: ureq::Error) -> TranscribeError {
    match err {
        ureq::Error::Status(code, resp) => {
            let body = resp.into_string().unwrap_or_default();
            match code {
                401 | 403 => TranscribeError::Auth(format!(
                    "{} rejected the API key ({}): {}",
                    vendor, code, body
                )),
                400 | 415 | 422 => TranscribeError::UnsupportedAudio(format!(
                    "{} rejected the audio ({}): {}",
                    vendor, code, body
                )),
                _ => TranscribeError::Vendor(format!("{} returned {}: {}", vendor, code, body)),
            }
        }
        ureq::Error::Transport(t) => {
            TranscribeError::Network(format!("{} request failed: {}", vendor, t))
        }
    }
}
