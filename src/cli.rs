// Command-line interface definitions for dictap
//
// This module is separate so it can be used by both the binary (main.rs)
// and build.rs for generating man pages.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dictap")]
#[command(author, version, about = "Double-tap dictation for the Linux desktop")]
#[command(long_about = "
Dictap is a double-tap dictation tool for the Linux desktop.
Double-tap the trigger key to start recording, tap once to stop.
The recording is transcribed and the text is copied to the clipboard,
then pasted at the cursor position.

SETUP:
  1. Install wl-clipboard and ydotool for clipboard/paste support
  2. Export GROQ_API_KEY (or ELEVENLABS_API_KEY), or place a GGML
     model in ~/.local/share/dictap/models for local transcription
  3. Run: dictap (to start the daemon)

USAGE:
  Double-tap Right Alt (default) and speak. Tap Right Alt once to
  stop; the transcribed text lands at your cursor.
")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<std::path::PathBuf>,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Override transcription backend (groq, elevenlabs, whisper)
    #[arg(long, value_name = "BACKEND")]
    pub backend: Option<String>,

    /// API key for the selected remote backend
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Override model for the selected backend
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Override trigger key (e.g., RIGHTALT, SCROLLLOCK, F12)
    #[arg(long, value_name = "KEY")]
    pub hotkey: Option<String>,

    /// Copy to clipboard only, never simulate the paste keystroke
    #[arg(long)]
    pub no_auto_paste: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as daemon (default if no command specified)
    Daemon,

    /// Transcribe an audio file (WAV) through the configured backend
    Transcribe {
        /// Path to audio file
        file: std::path::PathBuf,
    },

    /// Show current configuration
    Config {
        /// Print the commented default config instead
        #[arg(long)]
        default: bool,
    },
}
