//! Command-line interface for sotto
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Live speech transcription for the terminal
#[derive(Parser, Debug)]
#[command(name = "sotto", version, about = "Live speech transcription for the terminal")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to an audio file (WAV) to transcribe
    #[arg(long, value_name = "PATH")]
    pub audio_file: Option<PathBuf>,

    /// Remote audio URL to download and transcribe
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Keep the downloaded audio on disk for reuse
    #[arg(long)]
    pub save_audio: bool,

    /// Transcription engine to use
    #[arg(long, value_enum, default_value_t = EngineArg::Cloud)]
    pub engine: EngineArg,

    /// Override the streaming HTTP engine endpoint
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Write transcriptions to this file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub output_file: Option<PathBuf>,

    /// Segment speech continuously and transcribe segments as they end
    #[arg(long)]
    pub real_time: bool,

    /// Audio input device name (see `sotto devices`)
    #[arg(long, value_name = "DEVICE")]
    pub device: Option<String>,

    /// End the session after this much unbroken silence (e.g. "2s")
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub max_silence: Option<Duration>,

    /// Per-segment engine call timeout (e.g. "30s")
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub engine_timeout: Option<Duration>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress status output (quiet mode)
    #[arg(short, long)]
    pub quiet: bool,

    /// Verbose output (segment indices and timings)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Parse a human-friendly duration string.
///
/// Accepts bare numbers (seconds) and any format `humantime` understands
/// (`30s`, `1500ms`, `1m30s`).
fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

/// Available transcription engines
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineArg {
    /// Streaming HTTP transcription server
    Http,
    /// Cloud ASR API (credential from the environment)
    Cloud,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available audio input devices
    Devices,
}
