//! Global key listener
//!
//! Captures system-wide key events with rdev on a dedicated thread and
//! drives the [`GestureDetector`] synchronously from the event callback.
//! Only recognized Start/Stop signals cross the channel to the daemon;
//! everything else dies in the callback, which does no blocking work
//! beyond the channel send.
//!
//! rdev's listen loop has no clean cross-thread shutdown; the listener
//! thread ends with the process. The daemon side simply drops the
//! receiver on shutdown, after which sends are discarded.

use crate::config::HotkeyConfig;
use crate::error::{HotkeyError, Result};
use crate::gesture::{GestureDetector, GestureSignal, KeyAction, KeyEvent};
use rdev::{listen, Event, EventType, Key};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Owns the listener thread for the dictation gesture
pub struct GestureListener {
    trigger: Key,
    window: Duration,
    _listener_thread: Option<std::thread::JoinHandle<()>>,
}

impl GestureListener {
    pub fn new(config: &HotkeyConfig) -> Result<Self> {
        let trigger = parse_key_name(&config.key)
            .ok_or_else(|| HotkeyError::UnknownKey(config.key.clone()))?;

        Ok(Self {
            trigger,
            window: Duration::from_millis(config.double_tap_window_ms),
            _listener_thread: None,
        })
    }

    /// Spawn the listener thread; gesture signals arrive on the returned
    /// channel for the lifetime of the process.
    pub fn start(&mut self) -> Result<mpsc::Receiver<GestureSignal>> {
        let (tx, rx) = mpsc::channel(16);
        let mut detector = GestureDetector::new(self.trigger, self.window);

        tracing::info!(
            "Listening for double-tap of {:?} (window {}ms)",
            self.trigger,
            self.window.as_millis()
        );

        let handle = std::thread::Builder::new()
            .name("gesture-listener".to_string())
            .spawn(move || {
                let callback = move |event: Event| {
                    let key_event = match event.event_type {
                        EventType::KeyPress(key) => KeyEvent {
                            key,
                            action: KeyAction::Press,
                            at: Instant::now(),
                        },
                        EventType::KeyRelease(key) => KeyEvent {
                            key,
                            action: KeyAction::Release,
                            at: Instant::now(),
                        },
                        _ => return,
                    };

                    if let Some(signal) = detector.on_key_event(key_event) {
                        tracing::debug!("Gesture recognized: {:?}", signal);
                        // Send failure means the daemon dropped the receiver
                        // during shutdown; nothing left to do with the signal.
                        let _ = tx.blocking_send(signal);
                    }
                };

                // Blocks for the lifetime of the process
                if let Err(e) = listen(callback) {
                    tracing::error!("Global key listener failed: {:?}", e);
                }
            })
            .map_err(|e| HotkeyError::ListenFailed(e.to_string()))?;

        self._listener_thread = Some(handle);
        Ok(rx)
    }
}

/// Parse a key name string to an rdev Key
fn parse_key_name(name: &str) -> Option<Key> {
    match name.to_uppercase().as_str() {
        // Function keys
        "F1" => Some(Key::F1),
        "F2" => Some(Key::F2),
        "F3" => Some(Key::F3),
        "F4" => Some(Key::F4),
        "F5" => Some(Key::F5),
        "F6" => Some(Key::F6),
        "F7" => Some(Key::F7),
        "F8" => Some(Key::F8),
        "F9" => Some(Key::F9),
        "F10" => Some(Key::F10),
        "F11" => Some(Key::F11),
        "F12" => Some(Key::F12),

        // Modifier keys
        "LEFTALT" | "ALT" => Some(Key::Alt),
        "RIGHTALT" | "ALTGR" => Some(Key::AltGr),
        "LEFTCTRL" | "LEFTCONTROL" | "CTRL" | "CONTROL" => Some(Key::ControlLeft),
        "RIGHTCTRL" | "RIGHTCONTROL" => Some(Key::ControlRight),
        "LEFTSHIFT" | "SHIFT" => Some(Key::ShiftLeft),
        "RIGHTSHIFT" => Some(Key::ShiftRight),
        "LEFTMETA" | "META" | "SUPER" => Some(Key::MetaLeft),
        "RIGHTMETA" => Some(Key::MetaRight),

        // Special keys
        "ESCAPE" | "ESC" => Some(Key::Escape),
        "SPACE" => Some(Key::Space),
        "TAB" => Some(Key::Tab),
        "CAPSLOCK" => Some(Key::CapsLock),
        "BACKSPACE" => Some(Key::Backspace),
        "ENTER" | "RETURN" => Some(Key::Return),

        // Navigation
        "UP" | "UPARROW" => Some(Key::UpArrow),
        "DOWN" | "DOWNARROW" => Some(Key::DownArrow),
        "LEFT" | "LEFTARROW" => Some(Key::LeftArrow),
        "RIGHT" | "RIGHTARROW" => Some(Key::RightArrow),
        "HOME" => Some(Key::Home),
        "END" => Some(Key::End),
        "PAGEUP" => Some(Key::PageUp),
        "PAGEDOWN" => Some(Key::PageDown),

        // Other
        "DELETE" => Some(Key::Delete),
        "INSERT" => Some(Key::Insert),
        "PAUSE" => Some(Key::Pause),
        "SCROLLLOCK" => Some(Key::ScrollLock),
        "PRINTSCREEN" => Some(Key::PrintScreen),

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HotkeyConfig;

    #[test]
    fn test_parse_key_name() {
        assert_eq!(parse_key_name("F1"), Some(Key::F1));
        assert_eq!(parse_key_name("f1"), Some(Key::F1));
        assert_eq!(parse_key_name("RIGHTALT"), Some(Key::AltGr));
        assert_eq!(parse_key_name("altgr"), Some(Key::AltGr));
        assert_eq!(parse_key_name("SCROLLLOCK"), Some(Key::ScrollLock));
        assert_eq!(parse_key_name("pause"), Some(Key::Pause));
        assert_eq!(parse_key_name("UNKNOWN"), None);
    }

    #[test]
    fn test_listener_rejects_unknown_key() {
        let config = HotkeyConfig {
            key: "NOTAKEY".to_string(),
            double_tap_window_ms: 300,
        };
        assert!(GestureListener::new(&config).is_err());
    }

    #[test]
    fn test_listener_accepts_default_config() {
        let config = HotkeyConfig::default();
        assert!(GestureListener::new(&config).is_ok());
    }
}
