//! Dictap: double-tap dictation for the Linux desktop
//!
//! This library provides the core functionality for:
//! - Detecting the double-tap/single-tap gesture on a global hotkey (rdev)
//! - Capturing audio via cpal (supports PipeWire, PulseAudio, ALSA)
//! - Transcribing speech via Groq, ElevenLabs, or local whisper.cpp
//! - Delivering text through the clipboard with optional paste injection
//!
//! # Architecture
//!
//! ```text
//!   ┌──────────────┐  key events   ┌──────────────┐  Start/Stop   ┌────────────┐
//!   │ rdev listener ├──────────────▶│   Gesture    ├──────────────▶│   Daemon   │
//!   │   (thread)    │               │   Detector   │   (channel)   │  (select!) │
//!   └──────────────┘               └──────────────┘               └─────┬──────┘
//!                                                                       │
//!                            ┌──────────────────┬───────────────────────┤
//!                            ▼                  ▼                       ▼
//!                     ┌────────────┐     ┌────────────┐          ┌────────────┐
//!                     │   Audio    │     │  Session   │          │   Cues     │
//!                     │   (cpal)   │     │  (Idle/    │          │  (rodio)   │
//!                     │            │     │  Rec/Trans)│          └────────────┘
//!                     └─────┬──────┘     └────────────┘
//!                           │ samples -> WAV artifact
//!                           ▼
//!                     ┌────────────┐  transcript   ┌────────────┐
//!                     │ Transcribe │──────────────▶│  Delivery  │
//!                     │ groq/11labs│  (channel)    │ wl-copy +  │
//!                     │ /whisper   │               │  Ctrl+V    │
//!                     └────────────┘               └────────────┘
//! ```
//!
//! The recording flow: double-tap starts a capture, a single tap stops
//! it, the staged WAV goes to the configured backend on a blocking
//! task, and the resulting text is pasted at the cursor.

pub mod audio;
pub mod cli;
pub mod config;
pub mod daemon;
pub mod error;
pub mod gesture;
pub mod hotkey;
pub mod output;
pub mod session;
pub mod transcribe;

pub use cli::{Cli, Commands};
pub use config::{Backend, Config};
pub use daemon::Daemon;
pub use error::{DictapError, Result};
pub use gesture::{GestureDetector, GestureSignal};
pub use session::{Session, SessionState};
