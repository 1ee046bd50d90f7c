//! Text delivery module
//!
//! Gets the transcript into the focused application. Two modes:
//! clipboard only (wl-copy), or clipboard followed by a simulated
//! Ctrl+V (ydotool) so the text lands without a manual paste.
//!
//! Paste injection is best-effort. When it fails the text is still on
//! the clipboard, so callers should treat paste errors as warnings.

pub mod clipboard;
pub mod paste;

use crate::config::OutputConfig;
use crate::error::DeliverError;
use std::time::Duration;

/// Trait for text delivery implementations
#[async_trait::async_trait]
pub trait TextSink: Send + Sync {
    /// Deliver text to the user's focused application
    async fn deliver(&self, text: &str) -> Result<(), DeliverError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Create the delivery sink for the configured output mode
pub fn create_sink(config: &OutputConfig) -> Box<dyn TextSink> {
    if config.auto_paste {
        Box::new(paste::PasteSink::new(Duration::from_millis(
            config.paste_delay_ms,
        )))
    } else {
        Box::new(clipboard::ClipboardSink::new())
    }
}

/// Log startup warnings for missing delivery tools
///
/// Delivery happens seconds to hours after startup, so a missing
/// binary is reported here where the user is still watching the log.
pub fn preflight(config: &OutputConfig) {
    if which::which("wl-copy").is_err() {
        tracing::warn!(
            "wl-copy not found in PATH. Transcripts cannot be delivered; install wl-clipboard"
        );
    }
    if config.auto_paste && which::which("ydotool").is_err() {
        tracing::warn!(
            "ydotool not found in PATH. Auto-paste will fail; install ydotool or set output.auto_paste = false"
        );
    }
}
