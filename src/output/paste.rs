//! Paste delivery via wl-copy + ydotool
//!
//! Copies the transcript to the clipboard, waits for focus to settle,
//! then simulates Ctrl+V. Avoids direct typing, which breaks on
//! non-US keyboard layouts.
//!
//! Requires:
//! - wl-copy installed (for clipboard access)
//! - ydotool installed (for Ctrl+V simulation)
//! - ydotoold daemon running (systemctl --user start ydotool)

use super::{clipboard, TextSink};
use crate::error::DeliverError;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Clipboard + simulated Ctrl+V delivery
pub struct PasteSink {
    /// Wait between clipboard write and the paste chord
    paste_delay: Duration,
}

impl PasteSink {
    /// Create a new paste sink
    pub fn new(paste_delay: Duration) -> Self {
        Self { paste_delay }
    }

    /// Simulate Ctrl+V using ydotool
    ///
    /// 29 = KEY_LEFTCTRL, 47 = KEY_V. Format: code:1 press, code:0
    /// release.
    async fn press_ctrl_v(&self) -> Result<(), DeliverError> {
        let output = Command::new("ydotool")
            .args(["key", "29:1", "47:1", "47:0", "29:0"])
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    DeliverError::YdotoolNotFound
                } else {
                    DeliverError::Paste(e.to_string())
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);

            if stderr.contains("socket") || stderr.contains("connect") || stderr.contains("daemon")
            {
                return Err(DeliverError::YdotoolDaemonDown);
            }

            return Err(DeliverError::Paste(stderr.to_string()));
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl TextSink for PasteSink {
    async fn deliver(&self, text: &str) -> Result<(), DeliverError> {
        if text.is_empty() {
            return Ok(());
        }

        clipboard::copy(text).await?;

        // Give the compositor time to move focus back to the target
        // window and register the clipboard contents
        tokio::time::sleep(self.paste_delay).await;

        self.press_ctrl_v().await?;

        tracing::info!(
            "Text pasted via clipboard + Ctrl+V ({} chars)",
            text.chars().count()
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "paste (clipboard + Ctrl+V)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paste_delay_stored() {
        let sink = PasteSink::new(Duration::from_millis(500));
        assert_eq!(sink.paste_delay, Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_empty_text_is_a_no_op() {
        // Must not touch wl-copy or ydotool; succeeds even when
        // neither tool is installed
        let sink = PasteSink::new(Duration::from_millis(1));
        assert!(sink.deliver("").await.is_ok());
    }
}
