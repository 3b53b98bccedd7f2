//! Streaming HTTP transcription backend.
//!
//! Posts the audio clip as a multipart form to a transcription server and
//! reads back a plain-text response streamed line by line.

use crate::defaults;
use crate::engine::{AudioClip, TranscriptionEngine};
use crate::error::{Result, SottoError};
use async_trait::async_trait;
use futures_util::StreamExt;
use std::time::Duration;

/// Configuration for the HTTP engine.
#[derive(Debug, Clone)]
pub struct HttpEngineConfig {
    /// Transcription server endpoint.
    pub endpoint: String,
    /// Prompt sent alongside the audio to bias the transcription.
    pub initial_prompt: String,
    /// Connection timeout; the overall call deadline is enforced by the
    /// worker, not the client.
    pub connect_timeout: Duration,
}

impl Default for HttpEngineConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::HTTP_ENDPOINT.to_string(),
            initial_prompt: String::new(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Engine that talks to a streaming transcription server over HTTP.
pub struct HttpEngine {
    client: reqwest::Client,
    config: HttpEngineConfig,
}

impl HttpEngine {
    /// Creates the engine, validating the endpoint up front.
    pub fn new(config: HttpEngineConfig) -> Result<Self> {
        if config.endpoint.trim().is_empty() {
            return Err(SottoError::ConfigInvalidValue {
                key: "engine.http_endpoint".to_string(),
                message: "endpoint must not be empty".to_string(),
            });
        }
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| SottoError::Engine {
                message: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl TranscriptionEngine for HttpEngine {
    async fn transcribe(&self, clip: AudioClip) -> Result<String> {
        let audio = reqwest::multipart::Part::bytes(clip.wav_bytes)
            .file_name("segment.wav")
            .mime_str("audio/wav")
            .map_err(|e| SottoError::Engine {
                message: format!("failed to build upload part: {}", e),
            })?;
        let form = reqwest::multipart::Form::new()
            .part("audio", audio)
            .text("initial_prompt", self.config.initial_prompt.clone());

        let response = self
            .client
            .post(&self.config.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| SottoError::Engine {
                message: format!("request to {} failed: {}", self.config.endpoint, e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SottoError::Engine {
                message: format!("server returned {}", status),
            });
        }

        // The server streams plain text; collect it line by line as it
        // arrives rather than buffering the whole body.
        let mut stream = response.bytes_stream();
        let mut text = String::new();
        let mut partial: Vec<u8> = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| SottoError::Engine {
                message: format!("streamed response aborted: {}", e),
            })?;
            partial.extend_from_slice(&chunk);
            while let Some(newline) = partial.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = partial.drain(..=newline).collect();
                append_line(&mut text, &line[..line.len() - 1]);
            }
        }
        append_line(&mut text, &partial);

        Ok(text.trim_end().to_string())
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Append one response line, skipping blanks and stray carriage returns.
fn append_line(text: &mut String, raw: &[u8]) {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim_end_matches('\r');
    if !line.is_empty() {
        text.push_str(line);
        text.push('\n');
    }
}
