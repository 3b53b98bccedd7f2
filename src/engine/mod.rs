//! Transcription engine backends.
//!
//! One capability, two interchangeable remote implementations: a streaming
//! HTTP transcription server and a cloud ASR API.

pub mod cloud;
pub mod http;

use crate::error::{Result, SottoError};
use async_trait::async_trait;
use std::time::Duration;

/// A transport-ready encoded audio clip (self-contained WAV container).
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// Complete WAV file bytes: header plus 16-bit mono PCM data.
    pub wav_bytes: Vec<u8>,
    /// Clip duration in milliseconds.
    pub duration_ms: u32,
}

/// Trait for speech-to-text backends.
///
/// This trait allows swapping implementations (HTTP server, cloud API, mock).
#[async_trait]
pub trait TranscriptionEngine: Send + Sync {
    /// Transcribe an encoded audio clip to text.
    async fn transcribe(&self, clip: AudioClip) -> Result<String>;

    /// Short name of this backend, for logs.
    fn name(&self) -> &str;
}

/// Mock engine for testing.
#[derive(Debug, Clone)]
pub struct MockEngine {
    name: String,
    response: String,
    should_fail: bool,
    delay: Option<Duration>,
}

impl MockEngine {
    /// Create a new mock engine with default settings.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            response: "mock transcription".to_string(),
            should_fail: false,
            delay: None,
        }
    }

    /// Configure the mock to return a specific response.
    pub fn with_response(mut self, response: &str) -> Self {
        self.response = response.to_string();
        self
    }

    /// Configure the mock to fail on transcribe.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Configure the mock to sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl TranscriptionEngine for MockEngine {
    async fn transcribe(&self, _clip: AudioClip) -> Result<String> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.should_fail {
            Err(SottoError::Engine {
                message: "mock engine failure".to_string(),
            })
        } else {
            Ok(self.response.clone())
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_clip() -> AudioClip {
        AudioClip {
            wav_bytes: vec![0u8; 64],
            duration_ms: 100,
        }
    }

    #[tokio::test]
    async fn test_mock_engine_returns_response() {
        let engine = MockEngine::new("mock").with_response("hello there");
        let text = engine.transcribe(make_clip()).await.unwrap();
        assert_eq!(text, "hello there");
    }

    #[tokio::test]
    async fn test_mock_engine_fails_when_configured() {
        let engine = MockEngine::new("mock").with_failure();
        let result = engine.transcribe(make_clip()).await;
        match result {
            Err(SottoError::Engine { message }) => {
                assert_eq!(message, "mock engine failure");
            }
            _ => panic!("expected Engine error"),
        }
    }

    #[tokio::test]
    async fn test_mock_engine_delay() {
        let engine = MockEngine::new("mock").with_delay(Duration::from_millis(20));
        let start = std::time::Instant::now();
        engine.transcribe(make_clip()).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_engine_trait_is_object_safe() {
        let engine: Box<dyn TranscriptionEngine> = Box::new(MockEngine::new("boxed"));
        assert_eq!(engine.name(), "boxed");
    }
}
