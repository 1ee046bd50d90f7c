//! Configuration loading and types for dictap
//!
//! Configuration is loaded in layers:
//! 1. Built-in defaults
//! 2. Config file (~/.config/dictap/config.toml)
//! 3. Environment variables (DICTAP_*, plus vendor credential variables)
//! 4. CLI arguments (highest priority)

use crate::error::DictapError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file content
pub const DEFAULT_CONFIG: &str = r#"# Dictap Configuration
#
# Location: ~/.config/dictap/config.toml
# All settings can be overridden via CLI flags

[hotkey]
# Trigger key for the dictation gesture: double-tap to start recording,
# single tap to stop. Common choices: RIGHTALT, SCROLLLOCK, PAUSE, F1-F12
key = "RIGHTALT"

# Two presses closer together than this count as a double-tap
double_tap_window_ms = 300

[audio]
# Audio input device ("default" uses system default)
# List devices with: pactl list sources short
device = "default"

# Sample rate in Hz (transcription backends expect 16000)
sample_rate = 16000

# Recordings shorter than this are discarded without transcription
min_duration_ms = 300

# Maximum recording duration in seconds (safety limit for a missed stop tap)
max_duration_secs = 120

[audio.feedback]
# Audible cues when recording starts/stops and on errors
enabled = true

# Volume level (0.0 to 1.0)
volume = 0.7

[transcription]
# Backend: "groq", "elevenlabs", or "whisper" (local inference)
backend = "groq"

# Model identifier for the selected backend. Leave unset for the
# backend default: whisper-large-v3 (groq), scribe_v1 (elevenlabs),
# base.en (whisper). For the whisper backend this may also be an
# absolute path to a GGML .bin file.
# model = "whisper-large-v3"

# API key for remote backends. Falls back to GROQ_API_KEY or
# ELEVENLABS_API_KEY from the environment.
# api_key = ""

# Request timeout for remote backends, in seconds
timeout_secs = 30

# Spoken language for the whisper backend ("auto" detects)
language = "auto"

# CPU threads for local inference (omit for auto-detection)
# threads = 4

[output]
# Simulate Ctrl+V at the cursor after copying (requires ydotool);
# when false the text is only placed on the clipboard
auto_paste = true

# Pause between the clipboard write and the paste keystroke, so the
# clipboard content lands before Ctrl+V fires
paste_delay_ms = 500
"#;

/// Transcription backend selection
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Groq-hosted Whisper API
    #[default]
    Groq,
    /// ElevenLabs speech-to-text API
    Elevenlabs,
    /// Local whisper.cpp inference
    Whisper,
}

impl std::str::FromStr for Backend {
    type Err = DictapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "groq" => Ok(Backend::Groq),
            "elevenlabs" => Ok(Backend::Elevenlabs),
            "whisper" => Ok(Backend::Whisper),
            other => Err(DictapError::Config(format!(
                "Unknown backend '{}'. Valid backends: groq, elevenlabs, whisper",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Groq => write!(f, "groq"),
            Backend::Elevenlabs => write!(f, "elevenlabs"),
            Backend::Whisper => write!(f, "whisper"),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub hotkey: HotkeyConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub transcription: TranscriptionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Gesture trigger configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HotkeyConfig {
    /// Trigger key name (examples: "RIGHTALT", "SCROLLLOCK", "F12")
    #[serde(default = "default_hotkey_key")]
    pub key: String,

    /// Maximum gap between two presses for them to count as a double-tap
    #[serde(default = "default_double_tap_window_ms")]
    pub double_tap_window_ms: u64,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            key: default_hotkey_key(),
            double_tap_window_ms: default_double_tap_window_ms(),
        }
    }
}

/// Audio capture configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AudioConfig {
    /// PipeWire/PulseAudio device name, or "default"
    #[serde(default = "default_device")]
    pub device: String,

    /// Sample rate in Hz (backends expect 16000)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Recordings shorter than this never reach a backend
    #[serde(default = "default_min_duration_ms")]
    pub min_duration_ms: u64,

    /// Maximum recording duration in seconds (safety limit)
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: u32,

    /// Audio feedback settings
    #[serde(default)]
    pub feedback: FeedbackConfig,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            sample_rate: default_sample_rate(),
            min_duration_ms: default_min_duration_ms(),
            max_duration_secs: default_max_duration_secs(),
            feedback: FeedbackConfig::default(),
        }
    }
}

/// Audio feedback configuration for sound cues
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedbackConfig {
    /// Enable audio feedback cues
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Volume level (0.0 to 1.0)
    #[serde(default = "default_volume")]
    pub volume: f32,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: default_volume(),
        }
    }
}

/// Transcription backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranscriptionConfig {
    /// Which backend to use; fixed for the lifetime of the process
    #[serde(default)]
    pub backend: Backend,

    /// Model identifier; None uses the backend's default
    #[serde(default)]
    pub model: Option<String>,

    /// API key for remote backends; falls back to the vendor's
    /// environment variable (GROQ_API_KEY, ELEVENLABS_API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout for remote backends, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Language code for the whisper backend (en, de, auto, ...)
    #[serde(default = "default_language")]
    pub language: String,

    /// Threads for local inference (None = auto-detect)
    #[serde(default)]
    pub threads: Option<usize>,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            model: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
            language: default_language(),
            threads: None,
        }
    }
}

/// Text delivery configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Simulate the paste chord after copying
    #[serde(default = "default_true")]
    pub auto_paste: bool,

    /// Settle delay between clipboard write and paste keystroke (ms)
    #[serde(default = "default_paste_delay_ms")]
    pub paste_delay_ms: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            auto_paste: true,
            paste_delay_ms: default_paste_delay_ms(),
        }
    }
}

fn default_hotkey_key() -> String {
    "RIGHTALT".to_string()
}

fn default_double_tap_window_ms() -> u64 {
    300
}

fn default_device() -> String {
    "default".to_string()
}

fn default_sample_rate() -> u32 {
    16000
}

fn default_min_duration_ms() -> u64 {
    300
}

fn default_max_duration_secs() -> u32 {
    120
}

fn default_volume() -> f32 {
    0.7
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_language() -> String {
    "auto".to_string()
}

fn default_paste_delay_ms() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "dictap")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get the config directory path
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "dictap")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the data directory path (for models)
    pub fn data_dir() -> PathBuf {
        directories::ProjectDirs::from("", "", "dictap")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get the models directory path
    pub fn models_dir() -> PathBuf {
        Self::data_dir().join("models")
    }

    /// Ensure config and model directories exist, writing the commented
    /// default config on first run
    pub fn ensure_directories() -> std::io::Result<()> {
        if let Some(config_dir) = Self::config_dir() {
            std::fs::create_dir_all(&config_dir)?;
            tracing::debug!("Ensured config directory exists: {:?}", config_dir);

            let config_file = config_dir.join("config.toml");
            if !config_file.exists() {
                std::fs::write(&config_file, DEFAULT_CONFIG)?;
                tracing::info!("Wrote default config to {:?}", config_file);
            }
        }

        let models_dir = Self::models_dir();
        std::fs::create_dir_all(&models_dir)?;
        tracing::debug!("Ensured models directory exists: {:?}", models_dir);

        Ok(())
    }
}

/// Load configuration from file, with defaults for missing values
pub fn load_config(path: Option<&Path>) -> Result<Config, DictapError> {
    // Start with defaults
    let mut config = Config::default();

    // Determine config file path
    let config_path = path.map(PathBuf::from).or_else(Config::default_path);

    // Load from file if it exists
    if let Some(ref path) = config_path {
        if path.exists() {
            tracing::debug!("Loading config from {:?}", path);
            let contents = std::fs::read_to_string(path)
                .map_err(|e| DictapError::Config(format!("Failed to read config: {}", e)))?;

            config = toml::from_str(&contents)
                .map_err(|e| DictapError::Config(format!("Invalid config: {}", e)))?;
        } else {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
        }
    }

    // Override from environment variables
    if let Ok(key) = std::env::var("DICTAP_HOTKEY") {
        config.hotkey.key = key;
    }
    if let Ok(backend) = std::env::var("DICTAP_BACKEND") {
        config.transcription.backend = backend.parse()?;
    }

    Ok(config)
}
