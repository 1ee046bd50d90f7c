//! Dictap - double-tap dictation for the Linux desktop
//!
//! Run with `dictap` or `dictap daemon` to start the daemon.
//! Use `dictap transcribe <file>` to run one file through the
//! configured backend.

use clap::Parser;
use dictap::cli::{Cli, Commands};
use dictap::config::{self, Config};
use dictap::daemon::Daemon;
use dictap::session::AudioArtifact;
use dictap::{audio, transcribe};
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("dictap={},warn", log_level))),
        )
        .with_target(false)
        .init();

    // Load configuration
    let mut config = config::load_config(cli.config.as_deref())?;

    // Apply CLI overrides
    if let Some(backend) = cli.backend {
        config.transcription.backend = backend.parse()?;
    }
    if let Some(api_key) = cli.api_key {
        config.transcription.api_key = Some(api_key);
    }
    if let Some(model) = cli.model {
        config.transcription.model = Some(model);
    }
    if let Some(hotkey) = cli.hotkey {
        config.hotkey.key = hotkey;
    }
    if cli.no_auto_paste {
        config.output.auto_paste = false;
    }

    // Run the appropriate command
    match cli.command.unwrap_or(Commands::Daemon) {
        Commands::Daemon => {
            let mut daemon = Daemon::new(config);
            daemon.run().await?;
        }

        Commands::Transcribe { file } => {
            transcribe_file(&config, &file)?;
        }

        Commands::Config { default } => {
            show_config(&config, default)?;
        }
    }

    Ok(())
}

/// Transcribe an audio file through the configured backend
fn transcribe_file(config: &Config, path: &Path) -> anyhow::Result<()> {
    let samples = audio::load_wav_mono(path, 16000)?;
    println!(
        "Loaded {:?}: {:.2}s of audio",
        path,
        samples.len() as f32 / 16000.0
    );

    // Stage as a normalized WAV so remote backends get the same bytes
    // the daemon would send
    let artifact = AudioArtifact::from_samples(&samples, 16000)?;

    let transcriber = transcribe::create_transcriber(&config.transcription)?;
    let result = transcribe::dispatch(transcriber.as_ref(), &artifact)?;

    println!("\n{}", result.text);
    Ok(())
}

/// Print the effective or default configuration as TOML
fn show_config(config: &Config, default: bool) -> anyhow::Result<()> {
    if default {
        print!("{}", config::DEFAULT_CONFIG);
        return Ok(());
    }

    print!("{}", toml::to_string_pretty(config)?);
    println!();
    println!(
        "# Config file: {:?}",
        Config::default_path().unwrap_or_else(|| "(not found)".into())
    );
    println!("# Models dir: {:?}", Config::models_dir());
    Ok(())
}
