//! Audio capture sources and signal analysis.

#[cfg(feature = "mic")]
pub mod capture;
pub mod source;
pub mod vad;
pub mod wav;
