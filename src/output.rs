//! Colored terminal rendering and transcript file output.

use crate::error::Result;
use crate::pipeline::frame::SegmentTranscription;
use owo_colors::OwoColorize;
use std::io::Write;
use std::path::Path;

/// Progress and state changes, on stderr.
pub fn status(message: &str) {
    eprintln!("{}", message.yellow());
}

/// Completed actions, on stderr.
pub fn success(message: &str) {
    eprintln!("{}", message.green());
}

/// Failures, on stderr.
pub fn error(message: &str) {
    eprintln!("{}", message.red());
}

/// Render one released transcription on stdout.
///
/// Failed segments appear as an explicit marker in sequence position, so
/// the surrounding segments still read in order.
pub fn render_result(result: &SegmentTranscription, verbose: bool) {
    match &result.error {
        None => {
            if verbose {
                println!("{} {}", format!("[{}]", result.index).dimmed(), result.text.cyan());
            } else {
                println!("{}", result.text.cyan());
            }
        }
        Some(message) => {
            println!(
                "{}",
                format!("[segment {} failed: {}]", result.index, message).red()
            );
        }
    }
}

/// Appends released transcriptions to a file, one segment per line.
pub struct TranscriptWriter {
    file: std::fs::File,
}

impl TranscriptWriter {
    /// Create (or truncate) the transcript file.
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self {
            file: std::fs::File::create(path)?,
        })
    }

    /// Append one released result.
    pub fn append(&mut self, result: &SegmentTranscription) -> Result<()> {
        match &result.error {
            None => writeln!(self.file, "{}", result.text)?,
            Some(message) => writeln!(self.file, "[segment {} failed: {}]", result.index, message)?,
        }
        Ok(())
    }
}
