//! Error types for dictap
//!
//! Uses thiserror for ergonomic error definitions with clear messages
//! that guide users toward fixing common issues.

use thiserror::Error;

/// Top-level error type for the dictap application
#[derive(Error, Debug)]
pub enum DictapError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Hotkey error: {0}")]
    Hotkey(#[from] HotkeyError),

    #[error("Audio capture error: {0}")]
    Audio(#[from] AudioError),

    #[error("Transcription error: {0}")]
    Transcribe(#[from] TranscribeError),

    #[error("Delivery error: {0}")]
    Deliver(#[from] DeliverError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the global key listener
#[derive(Error, Debug)]
pub enum HotkeyError {
    #[error("Unknown key name: '{0}'. Run 'dictap config --default' to see accepted names.")]
    UnknownKey(String),

    #[error("Global key listener failed: {0}")]
    ListenFailed(String),

    #[error("Gesture channel closed unexpectedly")]
    ChannelClosed,
}

/// Errors related to audio capture
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("No usable audio input device found. Check your microphone with: pactl list sources short")]
    NoInputDevice,

    #[error("Audio stream error: {0}")]
    Stream(String),

    #[error("No audio was captured. Check your microphone.")]
    EmptyRecording,

    #[error("WAV encoding failed: {0}")]
    Encode(String),

    #[error("WAV decoding failed: {0}")]
    Decode(String),
}

/// Errors surfaced by transcription backends
#[derive(Error, Debug)]
pub enum TranscribeError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Audio rejected by backend: {0}")]
    UnsupportedAudio(String),

    #[error("Backend returned no text")]
    EmptyTranscript,

    #[error("Vendor error: {0}")]
    Vendor(String),

    #[error("Model not found: {0}\n  Place a GGML model in the models directory or configure an absolute path.")]
    ModelNotFound(String),

    #[error("Whisper initialization failed: {0}")]
    InitFailed(String),

    #[error("Transcription failed: {0}")]
    InferenceFailed(String),
}

/// Errors related to text delivery
#[derive(Error, Debug)]
pub enum DeliverError {
    #[error("wl-copy not found in PATH. Install wl-clipboard via your package manager.")]
    WlCopyNotFound,

    #[error("ydotool not found in PATH. Install it via your package manager.")]
    YdotoolNotFound,

    #[error("ydotool daemon not running. Start it with: systemctl --user start ydotool")]
    YdotoolDaemonDown,

    #[error("Clipboard write failed: {0}")]
    Clipboard(String),

    #[error("Paste injection failed: {0}")]
    Paste(String),
}

/// Result type alias using DictapError
pub type Result<T> = std::result::Result<T, DictapError>;

impl From<hound::Error> for AudioError {
    fn from(e: hound::Error) -> Self {
        AudioError::Encode(e.to_string())
    }
}
