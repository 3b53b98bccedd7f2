//! Default configuration constants for sotto.
//!
//! Shared across configuration types so the CLI, the config file, and the
//! pipeline agree on one set of tuning values.

/// Default audio sample rate in Hz.
///
/// 16kHz is the standard for speech recognition and keeps segment uploads
/// small without hurting accuracy.
pub const SAMPLE_RATE: u32 = 16000;

/// Channel count. Everything downstream assumes mono.
pub const CHANNELS: u16 = 1;

/// Samples per capture frame (64ms at 16kHz).
pub const FRAME_SIZE: usize = 1024;

/// Minimum peak amplitude for a frame to count as speech.
///
/// Linear i16 scale. Frames below this never start or extend an utterance.
/// Distinct from [`SILENCE_FLOOR_DB`]: this is the per-frame quiet floor,
/// the dB value is the windowed silence judgment over the whole buffer.
pub const MIN_SPEECH_AMPLITUDE: i16 = 500;

/// Minimum run of quiet audio (ms) for the windowed detector to call it
/// silence rather than a dip inside ongoing speech.
pub const SILENCE_WINDOW_MS: u32 = 700;

/// Amplitude (dBFS) below which an analysis window counts as silent.
pub const SILENCE_FLOOR_DB: f32 = -40.0;

/// Debounce (ms) after the last speech frame before an utterance is
/// finalized and handed to a transcription worker.
pub const DEBOUNCE_MS: u32 = 1000;

/// Unbroken silence (ms) that ends the whole capture session.
///
/// Independent of [`DEBOUNCE_MS`]: the short timer delimits utterances so
/// transcription can start early, this long one stops the recording.
pub const MAX_SILENCE_MS: u32 = 2000;

/// Peak amplitude floor for the single-shot recorder's stop condition.
pub const RECORD_STOP_AMPLITUDE: i16 = 1000;

/// Consecutive quiet time (ms) that stops a single-shot recording.
pub const RECORD_STOP_SILENCE_MS: u32 = 2000;

/// Hop size (ms) for the windowed silence analysis.
pub const ANALYSIS_HOP_MS: u32 = 10;

/// Per-segment engine call timeout in seconds.
pub const ENGINE_TIMEOUT_SECS: u64 = 30;

/// Maximum time (seconds) the ordered drain waits on one pending index
/// before releasing an error placeholder in its place.
pub const RESULT_WAIT_SECS: u64 = 45;

/// Grace period (seconds) granted to in-flight workers after a stop request.
pub const STOP_GRACE_SECS: u64 = 5;

/// Capture queue depth in callback blocks; a full queue drops the block and
/// surfaces as a recoverable overflow on the next read.
pub const CAPTURE_QUEUE_BLOCKS: usize = 64;

/// Default endpoint for the streaming HTTP transcription server.
pub const HTTP_ENDPOINT: &str = "http://localhost:8000/transcribe_stream";

/// Default endpoint for the cloud ASR API (OpenAI-compatible).
pub const CLOUD_ENDPOINT: &str = "https://api.groq.com/openai/v1/audio/transcriptions";

/// Default cloud ASR model.
pub const CLOUD_MODEL: &str = "whisper-large-v3";

/// Environment variable holding the cloud API credential.
pub const API_KEY_ENV: &str = "GROQ_API_KEY";
