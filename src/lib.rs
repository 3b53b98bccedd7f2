//! sotto - Live speech transcription for the terminal
//!
//! Segments a continuous audio stream on voice activity, transcribes each
//! segment concurrently against a remote backend, and delivers results
//! strictly in utterance order regardless of completion order.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

pub mod app;
pub mod audio;
pub mod cli;
pub mod config;
pub mod defaults;
pub mod engine;
pub mod error;
pub mod media;
pub mod output;
pub mod pipeline;
pub mod recording;

// Core traits (source → segment → transcribe → ordered sink)
pub use audio::source::{FrameSource, ScriptedFrameSource};
pub use engine::{AudioClip, MockEngine, TranscriptionEngine};

// Pipeline
pub use pipeline::controller::{Pipeline, PipelineConfig, PipelineHandle};
pub use pipeline::frame::{Frame, Segment, SegmentTranscription};
pub use pipeline::reorder::ReorderBuffer;
pub use pipeline::segmenter::{Segmenter, SegmenterConfig, SegmenterState};

// Error handling
pub use error::{Result, SottoError};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
