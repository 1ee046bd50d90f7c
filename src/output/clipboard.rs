//! Clipboard delivery via wl-copy
//!
//! Works on all Wayland compositors. Requires the wl-clipboard
//! package.

use super::TextSink;
use crate::error::DeliverError;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Copy text to the Wayland clipboard using wl-copy
pub(crate) async fn copy(text: &str) -> Result<(), DeliverError> {
    let mut child = Command::new("wl-copy")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DeliverError::WlCopyNotFound
            } else {
                DeliverError::Clipboard(e.to_string())
            }
        })?;

    // Write text to stdin, then close it to signal EOF
    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(text.as_bytes())
            .await
            .map_err(|e| DeliverError::Clipboard(e.to_string()))?;
        drop(stdin);
    }

    let status = child
        .wait()
        .await
        .map_err(|e| DeliverError::Clipboard(e.to_string()))?;

    if !status.success() {
        return Err(DeliverError::Clipboard(
            "wl-copy exited with error".to_string(),
        ));
    }

    Ok(())
}

/// Clipboard-only delivery
pub struct ClipboardSink;

impl ClipboardSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ClipboardSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl TextSink for ClipboardSink {
    async fn deliver(&self, text: &str) -> Result<(), DeliverError> {
        if text.is_empty() {
            return Ok(());
        }

        copy(text).await?;

        tracing::info!("Text copied to clipboard ({} chars)", text.chars().count());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "clipboard (wl-copy)"
    }
}
