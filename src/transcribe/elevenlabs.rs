//! ElevenLabs speech-to-text transcription
//!
//! Sends recorded audio to the ElevenLabs Scribe API. Same multipart
//! shape as the Groq backend, but the key travels in an `xi-api-key`
//! header and the model field is named `model_id`.

use super::groq::map_http_error;
use super::Transcriber;
use crate::config::TranscriptionConfig;
use crate::error::TranscribeError;
use crate::session::AudioArtifact;
use std::time::Duration;

const ELEVENLABS_ENDPOINT: &str = "https://api.elevenlabs.io/v1/speech-to-text";
const DEFAULT_MODEL: &str = "scribe_v1";

/// Transcriber backed by the ElevenLabs speech-to-text API
pub struct ElevenLabsTranscriber {
    /// Model id sent with each request
    model: String,
    /// API key, from config or ELEVENLABS_API_KEY
    api_key: String,
    /// Request timeout
    timeout: Duration,
}

impl ElevenLabsTranscriber {
    /// Create a new ElevenLabs transcriber from config
    pub fn new(config: &TranscriptionConfig) -> Result<Self, TranscribeError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("ELEVENLABS_API_KEY").ok())
            .ok_or_else(|| {
                TranscribeError::Auth(
                    "No API key. Set ELEVENLABS_API_KEY or transcription.api_key in the config file"
                        .into(),
                )
            })?;

        let model = config
            .model
            .clone()
            .or_else(|| std::env::var("ELEVENLABS_MODEL").ok())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let timeout = Duration::from_secs(config.timeout_secs);

        tracing::info!(
            "Configured ElevenLabs transcriber: model={}, timeout={}s",
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

        // Add model_id field
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(b"Content-Disposition: form-data; name=\"model_id\"\r\n\r\n");
        body.extend_from_slice(self.model.as_bytes());
        body.extend_from_slice(b"\r\n");

        // End boundary
        body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

        (boundary, body)
    }
}

impl Transcriber for ElevenLabsTranscriber {
    fn transcribe(&self, artifact: &AudioArtifact) -> Result<String, TranscribeError> {
        let wav_data = std::fs::read(artifact.path())
            .map_err(|e| TranscribeError::Vendor(format!("Failed to read recording: {}", e)))?;
        tracing::debug!(
            "Sending {:.2}s of audio to ElevenLabs ({} bytes)",
            artifact.duration().as_secs_f32(),
            wav_data.len()
        );

        let (boundary, body) = self.build_multipart_body(&wav_data);

        let response = ureq::post(ELEVENLABS_ENDPOINT)
            .timeout(self.timeout)
            .set(
                "Content-Type",
                &format!("multipart/form-data; boundary={}", boundary),
            )
            .set("xi-api-key", &self.api_key)
            .send_bytes(&body)
            .map_err(|e| map_http_error("ElevenLabs", e))?;

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
        "elevenlabs"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serializes the tests that mutate process-global env vars
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn config_with_key() -> TranscriptionConfig {
        TranscriptionConfig {
            api_key: Some("xi-test-key-456".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_api_key_from_config() {
        let transcriber = ElevenLabsTranscriber::new(&config_with_key()).unwrap();
        assert_eq!(transcriber.api_key, "xi-test-key-456");
    }

    #[test]
    fn test_missing_key_fails_at_construction() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::remove_var("ELEVENLABS_API_KEY");
        let config = TranscriptionConfig::default();

        let result = ElevenLabsTranscriber::new(&config);
        assert!(matches!(result, Err(TranscribeError::Auth(_))));
    }

    #[test]
    fn test_default_model() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::remove_var("ELEVENLABS_MODEL");
        let transcriber = ElevenLabsTranscriber::new(&config_with_key()).unwrap();
        assert_eq!(transcriber.model, "scribe_v1");
    }

    #[test]
    fn test_multipart_body_uses_model_id_field() {
        let config = TranscriptionConfig {
            model: Some("scribe_v1_experimental".to_string()),
            ..config_with_key()
        };

        let transcriber = ElevenLabsTranscriber::new(&config).unwrap();
        let (boundary, body) = transcriber.build_multipart_body(&[0u8; 64]);
        let body_str = String::from_utf8_lossy(&body);

        assert!(body_str.contains(&boundary));
        assert!(body_str.contains("name=\"file\""));
        assert!(body_str.contains("name=\"model_id\""));
        assert!(body_str.contains("scribe_v1_experimental"));
        assert!(body_str.ends_with(&format!("--{}--\r\n", boundary)));
    }
}
