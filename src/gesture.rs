//! Double-tap gesture detection
//!
//! A pure state machine over timestamped key events. Two presses of the
//! trigger key closer together than the configured window emit
//! [`GestureSignal::Start`] and arm the detector; while armed, the next
//! single press of the trigger key emits [`GestureSignal::Stop`] and
//! disarms. Starting takes a deliberate double-tap, stopping takes one
//! tap: stray taps while idle never start anything, and a recording can
//! be ended without re-timing the gesture.
//!
//! The detector performs no I/O and never fails: events it cannot use
//! degrade to "no signal". Timing decisions depend only on the deltas
//! between event timestamps, so tests drive it with synthetic events.

use rdev::Key;
use std::time::{Duration, Instant};

/// Key transition reported by the OS input layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Press,
    Release,
}

/// A single timestamped key transition
#[derive(Debug, Clone, Copy)]
pub struct KeyEvent {
    pub key: Key,
    pub action: KeyAction,
    /// Listener-side arrival time; only deltas between events matter
    pub at: Instant,
}

/// Discrete signal recognized from the key-event stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureSignal {
    /// Double-tap recognized: begin recording
    Start,
    /// Single tap while armed: end recording
    Stop,
}

/// Recognizes the start/stop gestures on one trigger key
#[derive(Debug)]
pub struct GestureDetector {
    trigger: Key,
    window: Duration,
    /// Timestamp of the press that may become the first half of a double-tap
    last_press_at: Option<Instant>,
    /// Physical key state, used to drop auto-repeat presses
    trigger_down: bool,
    /// Set between a recognized Start and the following Stop
    armed: bool,
}

impl GestureDetector {
    pub fn new(trigger: Key, window: Duration) -> Self {
        Self {
            trigger,
            window,
            last_press_at: None,
            trigger_down: false,
            armed: false,
        }
    }

    /// Feed one key event; returns a signal when a gesture completes.
    ///
    /// Events on other keys are ignored entirely; they neither emit
    /// signals nor disqualify a pending double-tap. Press events while
    /// the trigger is already down are auto-repeat and count as the
    /// original press.
    pub fn on_key_event(&mut self, event: KeyEvent) -> Option<GestureSignal> {
        if event.key != self.trigger {
            return None;
        }

        match event.action {
            KeyAction::Release => {
                self.trigger_down = false;
                None
            }
            KeyAction::Press if self.trigger_down => {
                // Auto-repeat while held
                None
            }
            KeyAction::Press => {
                self.trigger_down = true;

                if self.armed {
                    self.armed = false;
                    self.last_press_at = None;
                    return Some(GestureSignal::Stop);
                }

                match self.last_press_at {
                    Some(prev) if event.at.duration_since(prev) < self.window => {
                        // Second tap in time: recognized. Clear the timer so
                        // a third rapid tap cannot pair with this one.
                        self.last_press_at = None;
                        self.armed = true;
                        Some(GestureSignal::Start)
                    }
                    _ => {
                        // First tap, or the previous tap expired
                        self.last_press_at = Some(event.at);
                        None
                    }
                }
            }
        }
    }

    /// True between a recognized Start and the following Stop
    pub fn is_armed(&self) -> bool {
        self.armed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(key: Key, base: Instant, offset_ms: u64) -> KeyEvent {
        KeyEvent {
            key,
            action: KeyAction::Press,
            at: base + Duration::from_millis(offset_ms),
        }
    }

    fn release(key: Key, base: Instant, offset_ms: u64) -> KeyEvent {
        KeyEvent {
            key,
            action: KeyAction::Release,
            at: base + Duration::from_millis(offset_ms),
        }
    }

    fn detector() -> GestureDetector {
        GestureDetector::new(Key::AltGr, Duration::from_millis(300))
    }

    #[test]
    fn test_double_tap_within_window_starts() {
        let mut d = detector();
        let base = Instant::now();

        assert_eq!(d.on_key_event(press(Key::AltGr, base, 0)), None);
        assert_eq!(d.on_key_event(release(Key::AltGr, base, 50)), None);
        assert_eq!(
            d.on_key_event(press(Key::AltGr, base, 150)),
            Some(GestureSignal::Start)
        );
        assert!(d.is_armed());
    }

    #[test]
    fn test_slow_taps_do_not_start() {
        let mut d = detector();
        let base = Instant::now();

        assert_eq!(d.on_key_event(press(Key::AltGr, base, 0)), None);
        assert_eq!(d.on_key_event(release(Key::AltGr, base, 50)), None);
        // 400ms later: outside the 300ms window
        assert_eq!(d.on_key_event(press(Key::AltGr, base, 400)), None);
        assert!(!d.is_armed());

        // The late press becomes a fresh first tap
        assert_eq!(d.on_key_event(release(Key::AltGr, base, 450)), None);
        assert_eq!(
            d.on_key_event(press(Key::AltGr, base, 500)),
            Some(GestureSignal::Start)
        );
    }

    #[test]
    fn test_single_press_stops_when_armed() {
        let mut d = detector();
        let base = Instant::now();

        d.on_key_event(press(Key::AltGr, base, 0));
        d.on_key_event(release(Key::AltGr, base, 50));
        assert_eq!(
            d.on_key_event(press(Key::AltGr, base, 100)),
            Some(GestureSignal::Start)
        );
        d.on_key_event(release(Key::AltGr, base, 150));

        // Stop timing is unconstrained: ten seconds later still stops
        assert_eq!(
            d.on_key_event(press(Key::AltGr, base, 10_150)),
            Some(GestureSignal::Stop)
        );
        assert!(!d.is_armed());
    }

    #[test]
    fn test_rapid_stop_press_after_start() {
        // A third rapid tap right after the double-tap is a Stop, not
        // another Start: the timer resets on recognition.
        let mut d = detector();
        let base = Instant::now();

        d.on_key_event(press(Key::AltGr, base, 0));
        d.on_key_event(release(Key::AltGr, base, 40));
        assert_eq!(
            d.on_key_event(press(Key::AltGr, base, 80)),
            Some(GestureSignal::Start)
        );
        d.on_key_event(release(Key::AltGr, base, 120));
        assert_eq!(
            d.on_key_event(press(Key::AltGr, base, 160)),
            Some(GestureSignal::Stop)
        );
    }

    #[test]
    fn test_auto_repeat_filtered() {
        let mut d = detector();
        let base = Instant::now();

        assert_eq!(d.on_key_event(press(Key::AltGr, base, 0)), None);
        // Held key: repeats arrive well within the window but must not
        // count as a second press
        assert_eq!(d.on_key_event(press(Key::AltGr, base, 50)), None);
        assert_eq!(d.on_key_event(press(Key::AltGr, base, 100)), None);
        assert!(!d.is_armed());

        // After release, the original press is long expired; the next
        // press is a fresh first tap, not a second one
        assert_eq!(d.on_key_event(release(Key::AltGr, base, 400)), None);
        assert_eq!(d.on_key_event(press(Key::AltGr, base, 450)), None);
    }

    #[test]
    fn test_auto_repeat_does_not_stop_twice() {
        let mut d = detector();
        let base = Instant::now();

        d.on_key_event(press(Key::AltGr, base, 0));
        d.on_key_event(release(Key::AltGr, base, 40));
        d.on_key_event(press(Key::AltGr, base, 80));
        d.on_key_event(release(Key::AltGr, base, 120));

        assert_eq!(
            d.on_key_event(press(Key::AltGr, base, 500)),
            Some(GestureSignal::Stop)
        );
        // Held stop key repeating must not emit anything further
        assert_eq!(d.on_key_event(press(Key::AltGr, base, 550)), None);
        assert_eq!(d.on_key_event(press(Key::AltGr, base, 600)), None);
    }

    #[test]
    fn test_unrelated_keys_ignored() {
        let mut d = detector();
        let base = Instant::now();

        assert_eq!(d.on_key_event(press(Key::AltGr, base, 0)), None);
        assert_eq!(d.on_key_event(release(Key::AltGr, base, 30)), None);
        // Typing on other keys between the taps does not disqualify
        assert_eq!(d.on_key_event(press(Key::KeyA, base, 60)), None);
        assert_eq!(d.on_key_event(release(Key::KeyA, base, 90)), None);
        assert_eq!(
            d.on_key_event(press(Key::AltGr, base, 150)),
            Some(GestureSignal::Start)
        );
    }

    #[test]
    fn test_unrelated_keys_never_signal() {
        let mut d = detector();
        let base = Instant::now();

        for offset in (0..500).step_by(20) {
            assert_eq!(d.on_key_event(press(Key::KeyQ, base, offset)), None);
            assert_eq!(d.on_key_event(release(Key::KeyQ, base, offset + 10)), None);
        }
        assert!(!d.is_armed());
    }

    #[test]
    fn test_only_deltas_matter() {
        // Same event pattern, wildly different absolute base times
        for base_offset_secs in [0u64, 3600, 86_400] {
            let mut d = detector();
            let base = Instant::now() + Duration::from_secs(base_offset_secs);

            d.on_key_event(press(Key::AltGr, base, 0));
            d.on_key_event(release(Key::AltGr, base, 60));
            assert_eq!(
                d.on_key_event(press(Key::AltGr, base, 200)),
                Some(GestureSignal::Start)
            );
        }
    }

    #[test]
    fn test_full_cycle_signal_sequence() {
        // press,release,press,release within 200ms -> one Start;
        // later press-release -> one Stop
        let mut d = detector();
        let base = Instant::now();
        let mut signals = Vec::new();

        let events = [
            press(Key::AltGr, base, 0),
            release(Key::AltGr, base, 60),
            press(Key::AltGr, base, 140),
            release(Key::AltGr, base, 200),
            press(Key::AltGr, base, 2_000),
            release(Key::AltGr, base, 2_060),
        ];
        for event in events {
            signals.extend(d.on_key_event(event));
        }

        assert_eq!(signals, vec![GestureSignal::Start, GestureSignal::Stop]);
    }

    #[test]
    fn test_window_boundary_excluded() {
        let mut d = detector();
        let base = Instant::now();

        d.on_key_event(press(Key::AltGr, base, 0));
        d.on_key_event(release(Key::AltGr, base, 50));
        // Exactly at the window edge: too late
        assert_eq!(d.on_key_event(press(Key::AltGr, base, 300)), None);
    }

    #[test]
    fn test_different_trigger_key() {
        let mut d = GestureDetector::new(Key::ScrollLock, Duration::from_millis(300));
        let base = Instant::now();

        d.on_key_event(press(Key::ScrollLock, base, 0));
        d.on_key_event(release(Key::ScrollLock, base, 40));
        assert_eq!(
            d.on_key_event(press(Key::ScrollLock, base, 120)),
            Some(GestureSignal::Start)
        );
        // AltGr is an unrelated key for this detector
        assert_eq!(d.on_key_event(press(Key::AltGr, base, 160)), None);
    }
}
