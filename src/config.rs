//! Configuration file handling.

use crate::defaults;
use crate::engine::cloud::CloudEngineConfig;
use crate::engine::http::HttpEngineConfig;
use crate::error::{Result, SottoError};
use crate::pipeline::controller::PipelineConfig;
use crate::pipeline::segmenter::SegmenterConfig;
use crate::recording::RecordConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioSection,
    pub segmenter: SegmenterSection,
    pub engine: EngineSection,
}

/// Audio capture configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioSection {
    pub device: Option<String>,
    pub sample_rate: u32,
    pub frame_size: usize,
}

impl Default for AudioSection {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: defaults::SAMPLE_RATE,
            frame_size: defaults::FRAME_SIZE,
        }
    }
}

/// Segmentation tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SegmenterSection {
    pub speech_amplitude: i16,
    pub silence_window_ms: u32,
    pub silence_floor_db: f32,
    pub debounce_ms: u32,
    pub max_silence_ms: u32,
    pub record_stop_amplitude: i16,
    pub record_stop_silence_ms: u32,
}

impl Default for SegmenterSection {
    fn default() -> Self {
        Self {
            speech_amplitude: defaults::MIN_SPEECH_AMPLITUDE,
            silence_window_ms: defaults::SILENCE_WINDOW_MS,
            silence_floor_db: defaults::SILENCE_FLOOR_DB,
            debounce_ms: defaults::DEBOUNCE_MS,
            max_silence_ms: defaults::MAX_SILENCE_MS,
            record_stop_amplitude: defaults::RECORD_STOP_AMPLITUDE,
            record_stop_silence_ms: defaults::RECORD_STOP_SILENCE_MS,
        }
    }
}

/// Transcription engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineSection {
    pub http_endpoint: String,
    pub cloud_endpoint: String,
    pub model: String,
    pub api_key_env: String,
    pub initial_prompt: String,
    pub timeout_secs: u64,
    pub result_wait_secs: u64,
    pub stop_grace_secs: u64,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            http_endpoint: defaults::HTTP_ENDPOINT.to_string(),
            cloud_endpoint: defaults::CLOUD_ENDPOINT.to_string(),
            model: defaults::CLOUD_MODEL.to_string(),
            api_key_env: defaults::API_KEY_ENV.to_string(),
            initial_prompt: String::new(),
            timeout_secs: defaults::ENGINE_TIMEOUT_SECS,
            result_wait_secs: defaults::RESULT_WAIT_SECS,
            stop_grace_secs: defaults::STOP_GRACE_SECS,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing fields use default values; invalid TOML is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SottoError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                SottoError::Io(e)
            }
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Load configuration, or defaults if the file doesn't exist
    ///
    /// Only a missing file falls back to defaults; invalid TOML still errors.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(SottoError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - SOTTO_AUDIO_DEVICE → audio.device
    /// - SOTTO_HTTP_ENDPOINT → engine.http_endpoint
    /// - SOTTO_MODEL → engine.model
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(device) = std::env::var("SOTTO_AUDIO_DEVICE")
            && !device.is_empty()
        {
            self.audio.device = Some(device);
        }

        if let Ok(endpoint) = std::env::var("SOTTO_HTTP_ENDPOINT")
            && !endpoint.is_empty()
        {
            self.engine.http_endpoint = endpoint;
        }

        if let Ok(model) = std::env::var("SOTTO_MODEL")
            && !model.is_empty()
        {
            self.engine.model = model;
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/sotto/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("sotto")
            .join("config.toml")
    }

    /// Segmenter configuration derived from this config.
    pub fn segmenter_config(&self) -> SegmenterConfig {
        SegmenterConfig {
            sample_rate: self.audio.sample_rate,
            speech_amplitude: self.segmenter.speech_amplitude,
            silence_window_ms: self.segmenter.silence_window_ms,
            silence_floor_db: self.segmenter.silence_floor_db,
            debounce_ms: self.segmenter.debounce_ms,
            max_silence_ms: self.segmenter.max_silence_ms,
        }
    }

    /// Pipeline configuration derived from this config.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            segmenter: self.segmenter_config(),
            engine_timeout: Duration::from_secs(self.engine.timeout_secs),
            result_wait: Duration::from_secs(self.engine.result_wait_secs),
            stop_grace: Duration::from_secs(self.engine.stop_grace_secs),
            ..PipelineConfig::default()
        }
    }

    /// Single-shot recorder configuration derived from this config.
    pub fn record_config(&self) -> RecordConfig {
        RecordConfig {
            stop_amplitude: self.segmenter.record_stop_amplitude,
            stop_silence_ms: self.segmenter.record_stop_silence_ms,
            sample_rate: self.audio.sample_rate,
        }
    }

    /// HTTP engine configuration derived from this config.
    pub fn http_engine_config(&self) -> HttpEngineConfig {
        HttpEngineConfig {
            endpoint: self.engine.http_endpoint.clone(),
            initial_prompt: self.engine.initial_prompt.clone(),
            ..HttpEngineConfig::default()
        }
    }

    /// Cloud engine configuration derived from this config.
    pub fn cloud_engine_config(&self) -> CloudEngineConfig {
        CloudEngineConfig {
            endpoint: self.engine.cloud_endpoint.clone(),
            model: self.engine.model.clone(),
            api_key_env: self.engine.api_key_env.clone(),
            ..CloudEngineConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_values() {
        let config = Config::default();
        assert_eq!(config.audio.sample_rate, 16000);
        assert_eq!(config.audio.frame_size, 1024);
        assert_eq!(config.segmenter.speech_amplitude, 500);
        assert_eq!(config.segmenter.max_silence_ms, 2000);
        assert_eq!(config.engine.model, "whisper-large-v3");
        assert_eq!(config.engine.api_key_env, "GROQ_API_KEY");
    }

    #[test]
    fn test_partial_toml_uses_defaults_for_the_rest() {
        let toml_str = r#"
            [segmenter]
            silence_window_ms = 500

            [engine]
            model = "whisper-small"
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.segmenter.silence_window_ms, 500);
        assert_eq!(config.engine.model, "whisper-small");
        // Untouched fields keep defaults
        assert_eq!(config.segmenter.debounce_ms, defaults::DEBOUNCE_MS);
        assert_eq!(config.audio.sample_rate, defaults::SAMPLE_RATE);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[audio]\nsample_rate = 8000").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.audio.sample_rate, 8000);
    }

    #[test]
    fn test_load_missing_file_is_specific_error() {
        let result = Config::load(Path::new("/nonexistent/sotto/config.toml"));
        assert!(matches!(result, Err(SottoError::ConfigFileNotFound { .. })));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default(Path::new("/nonexistent/sotto/config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_or_default_invalid_toml_still_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "this is not [valid toml").unwrap();

        assert!(Config::load_or_default(file.path()).is_err());
    }

    #[test]
    fn test_env_overrides() {
        // SAFETY: test-local variables, no other thread reads them
        unsafe {
            std::env::set_var("SOTTO_AUDIO_DEVICE", "hw:1");
            std::env::set_var("SOTTO_MODEL", "whisper-tiny");
        }
        let config = Config::default().with_env_overrides();
        assert_eq!(config.audio.device.as_deref(), Some("hw:1"));
        assert_eq!(config.engine.model, "whisper-tiny");
        // SAFETY: same as above
        unsafe {
            std::env::remove_var("SOTTO_AUDIO_DEVICE");
            std::env::remove_var("SOTTO_MODEL");
        }
    }

    #[test]
    fn test_derived_configs_carry_tuning() {
        let mut config = Config::default();
        config.segmenter.silence_window_ms = 350;
        config.engine.timeout_secs = 7;

        assert_eq!(config.segmenter_config().silence_window_ms, 350);
        assert_eq!(
            config.pipeline_config().engine_timeout,
            Duration::from_secs(7)
        );
        assert_eq!(config.record_config().stop_amplitude, 1000);
    }

    #[test]
    fn test_round_trip_serialization() {
        let config = Config::default();
        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config, deserialized);
    }
}
