//! Cloud ASR backend (OpenAI-compatible audio transcription API).

use crate::defaults;
use crate::engine::{AudioClip, TranscriptionEngine};
use crate::error::{Result, SottoError};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Configuration for the cloud engine.
#[derive(Debug, Clone)]
pub struct CloudEngineConfig {
    /// Transcription API endpoint.
    pub endpoint: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Environment variable holding the API credential.
    pub api_key_env: String,
    /// Connection timeout; the overall call deadline is enforced by the
    /// worker, not the client.
    pub connect_timeout: Duration,
}

impl Default for CloudEngineConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::CLOUD_ENDPOINT.to_string(),
            model: defaults::CLOUD_MODEL.to_string(),
            api_key_env: defaults::API_KEY_ENV.to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Engine that submits clips to a cloud ASR API.
pub struct CloudEngine {
    client: reqwest::Client,
    api_key: String,
    config: CloudEngineConfig,
}

impl CloudEngine {
    /// Creates the engine, reading the credential from the environment.
    ///
    /// A missing or empty credential fails here, before any segment is
    /// submitted; no call path can succeed without it.
    pub fn new(config: CloudEngineConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).unwrap_or_default();
        if api_key.is_empty() {
            return Err(SottoError::MissingCredential {
                var: config.api_key_env.clone(),
            });
        }
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| SottoError::Engine {
                message: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            api_key,
            config,
        })
    }
}

#[async_trait]
impl TranscriptionEngine for CloudEngine {
    async fn transcribe(&self, clip: AudioClip) -> Result<String> {
        // Stage the clip in a scoped temp file for the named upload; the
        // file is removed on drop whether the call succeeds or not.
        let staged = tempfile::Builder::new()
            .prefix("sotto-segment-")
            .suffix(".wav")
            .tempfile()?;
        tokio::fs::write(staged.path(), &clip.wav_bytes).await?;

        let file_name = staged
            .path()
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("segment.wav")
            .to_string();
        let bytes = tokio::fs::read(staged.path()).await?;

        let file = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/wav")
            .map_err(|e| SottoError::Engine {
                message: format!("failed to build upload part: {}", e),
            })?;
        let form = reqwest::multipart::Form::new()
            .part("file", file)
            .text("model", self.config.model.clone());

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| SottoError::Engine {
                message: format!("request to {} failed: {}", self.config.endpoint, e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SottoError::Engine {
                message: format!("API returned {}", status),
            });
        }

        let parsed: TranscriptionResponse =
            response.json().await.map_err(|e| SottoError::Engine {
                message: format!("malformed response: {}", e),
            })?;

        Ok(parsed.text.trim().to_string())
    }

    fn name(&self) -> &str {
        "cloud"
    }
}
