//! Error types for sotto.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SottoError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Missing credential: environment variable {var} is not set")]
    MissingCredential { var: String },

    // Audio capture errors
    #[error("Audio device not found: {device}")]
    AudioDeviceNotFound { device: String },

    #[error("Audio capture failed: {message}")]
    AudioCapture { message: String },

    /// Transient input overrun; the frame is dropped and capture continues.
    #[error("Input overflowed, frame dropped")]
    FrameOverflow,

    #[error("Audio encoding failed: {message}")]
    AudioEncode { message: String },

    // Transcription engine errors, contained at the segment level
    #[error("Transcription engine failure: {message}")]
    Engine { message: String },

    #[error("Transcription call exceeded {seconds}s")]
    EngineTimeout { seconds: u64 },

    // Media fetching
    #[error("Media fetch failed: {message}")]
    MediaFetch { message: String },

    // Defensive: duplicate or missing segment index. Should never happen.
    #[error("Ordering violation: {message}")]
    OrderingViolation { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

impl SottoError {
    /// True for errors the ingestion loop recovers from by dropping a frame.
    pub fn is_transient(&self) -> bool {
        matches!(self, SottoError::FrameOverflow)
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, SottoError>;
