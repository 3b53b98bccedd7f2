//! Composition root: wires sources, engines, and the pipeline per CLI mode.

use crate::audio::source::FrameSource;
use crate::audio::wav::{self, WavFileSource};
use crate::cli::{Cli, EngineArg};
use crate::config::Config;
use crate::engine::TranscriptionEngine;
use crate::engine::cloud::CloudEngine;
use crate::engine::http::HttpEngine;
use crate::error::{Result, SottoError};
use crate::media;
use crate::output::{self, TranscriptWriter};
use crate::pipeline::controller::{Pipeline, PipelineConfig};
use std::sync::Arc;
use std::time::Duration;

/// Run the mode selected on the command line.
pub async fn run(cli: Cli, config: Config) -> Result<()> {
    let engine = build_engine(&cli, &config)?;

    if let Some(path) = cli.audio_file.clone() {
        let bytes = std::fs::read(&path).map_err(|e| SottoError::Other(format!(
            "File not found or unreadable: {}: {}",
            path.display(),
            e
        )))?;
        return transcribe_audio_bytes(bytes, engine, &cli, &config).await;
    }

    if let Some(url) = cli.url.clone() {
        let save_as = cli.save_audio.then(|| {
            let name = url.rsplit('/').next().unwrap_or("media.wav");
            std::path::PathBuf::from(name)
        });
        let bytes = media::fetch_audio(&url, save_as.as_deref(), cli.quiet).await?;
        return transcribe_audio_bytes(bytes, engine, &cli, &config).await;
    }

    microphone_mode(engine, &cli, &config).await
}

/// Build the selected transcription engine.
fn build_engine(cli: &Cli, config: &Config) -> Result<Arc<dyn TranscriptionEngine>> {
    match cli.engine {
        EngineArg::Http => {
            let mut engine_config = config.http_engine_config();
            if let Some(endpoint) = &cli.endpoint {
                engine_config.endpoint = endpoint.clone();
            }
            Ok(Arc::new(HttpEngine::new(engine_config)?))
        }
        EngineArg::Cloud => Ok(Arc::new(CloudEngine::new(config.cloud_engine_config())?)),
    }
}

/// Pipeline config with CLI overrides folded in.
fn pipeline_config(cli: &Cli, config: &Config) -> PipelineConfig {
    let mut pipeline = config.pipeline_config();
    if let Some(max_silence) = cli.max_silence {
        pipeline.segmenter.max_silence_ms = max_silence.as_millis() as u32;
    }
    if let Some(timeout) = cli.engine_timeout {
        pipeline.engine_timeout = timeout;
    }
    pipeline
}

/// Transcribe in-memory audio: one clip, or the pipeline when --real-time.
async fn transcribe_audio_bytes(
    bytes: Vec<u8>,
    engine: Arc<dyn TranscriptionEngine>,
    cli: &Cli,
    config: &Config,
) -> Result<()> {
    let source = WavFileSource::from_bytes(bytes, config.audio.frame_size)?;

    if cli.real_time {
        return run_pipeline(Box::new(source), engine, cli, config).await;
    }

    let samples = source.into_samples();
    if !cli.quiet {
        let duration_secs = samples.len() as u64 / config.audio.sample_rate.max(1) as u64;
        output::status(&format!(
            "processing transcription... audio duration: {}s",
            duration_secs
        ));
    }
    let text = transcribe_once(&samples, engine, cli, config).await?;
    emit_single(&text, cli)?;
    Ok(())
}

/// Microphone input: real-time pipeline or prompt-and-record loop.
async fn microphone_mode(
    engine: Arc<dyn TranscriptionEngine>,
    cli: &Cli,
    config: &Config,
) -> Result<()> {
    #[cfg(feature = "mic")]
    {
        use std::io::BufRead;

        if cli.real_time {
            if !cli.quiet {
                output::success("starting real-time recording and transcription...");
            }
            let source = crate::audio::capture::MicSource::new(
                cli.device.as_deref().or(config.audio.device.as_deref()),
                config.audio.sample_rate,
                config.audio.frame_size,
            )?;
            return run_pipeline(Box::new(source), engine, cli, config).await;
        }

        // Prompt-and-record loop: one take per Enter, 'q' quits.
        let stdin = std::io::stdin();
        loop {
            output::success("Press Enter to start recording or 'q' to quit...");
            let mut line = String::new();
            stdin.lock().read_line(&mut line)?;
            if line.trim().eq_ignore_ascii_case("q") {
                output::error("Quitting...");
                return Ok(());
            }

            output::status("Recording started...");
            let mut source = crate::audio::capture::MicSource::new(
                cli.device.as_deref().or(config.audio.device.as_deref()),
                config.audio.sample_rate,
                config.audio.frame_size,
            )?;
            let record_config = config.record_config();
            let samples = tokio::task::block_in_place(|| {
                crate::recording::record_until_silence(&mut source, &record_config)
            })?;
            output::success("Silence detected, stopping recording...");

            let text = transcribe_once(&samples, Arc::clone(&engine), cli, config).await?;
            emit_single(&text, cli)?;
        }
    }
    #[cfg(not(feature = "mic"))]
    {
        let _ = (engine, cli, config);
        Err(SottoError::Other(
            "built without microphone support; pass --audio-file or --url".to_string(),
        ))
    }
}

/// Run the full pipeline and emit ordered results as they are released.
async fn run_pipeline(
    source: Box<dyn FrameSource>,
    engine: Arc<dyn TranscriptionEngine>,
    cli: &Cli,
    config: &Config,
) -> Result<()> {
    let pipeline = Pipeline::with_config(pipeline_config(cli, config));
    let (handle, mut results) = pipeline.run(source, engine);

    // Ctrl-C stops frame intake; whatever is already ordered still drains.
    let stop_handle = handle.clone();
    let quiet = cli.quiet;
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            if !quiet {
                output::status("stopping...");
            }
            stop_handle.stop();
        }
    });

    let mut writer = match &cli.output_file {
        Some(path) => Some(TranscriptWriter::create(path)?),
        None => None,
    };

    while let Some(result) = results.recv().await {
        match writer.as_mut() {
            Some(writer) => writer.append(&result)?,
            None => output::render_result(&result, cli.verbose > 0),
        }
    }

    if !cli.quiet {
        output::success("Recording stopped.");
    }
    Ok(())
}

/// One-shot transcription of a complete take.
async fn transcribe_once(
    samples: &[i16],
    engine: Arc<dyn TranscriptionEngine>,
    cli: &Cli,
    config: &Config,
) -> Result<String> {
    let clip = wav::encode_clip(samples, config.audio.sample_rate)?;
    let timeout = cli
        .engine_timeout
        .unwrap_or(Duration::from_secs(config.engine.timeout_secs));
    match tokio::time::timeout(timeout, engine.transcribe(clip)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(SottoError::EngineTimeout {
            seconds: timeout.as_secs(),
        }),
    }
}

/// Print or persist a single-take transcription.
fn emit_single(text: &str, cli: &Cli) -> Result<()> {
    match &cli.output_file {
        Some(path) => {
            std::fs::write(path, format!("{}\n", text))?;
            output::success(&format!(
                "Transcription done, result stored in {}",
                path.display()
            ));
        }
        None => {
            output::success("Transcription result:");
            println!("{}", text);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MockEngine;
    use clap::Parser;

    fn cli_from(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_pipeline_config_cli_overrides() {
        let cli = cli_from(&["sotto", "--max-silence", "4s", "--engine-timeout", "9s"]);
        let config = Config::default();
        let pipeline = pipeline_config(&cli, &config);
        assert_eq!(pipeline.segmenter.max_silence_ms, 4000);
        assert_eq!(pipeline.engine_timeout, Duration::from_secs(9));
    }

    #[test]
    fn test_build_engine_http_with_endpoint_override() {
        let cli = cli_from(&[
            "sotto",
            "--engine",
            "http",
            "--endpoint",
            "http://localhost:9999/transcribe",
        ]);
        let engine = build_engine(&cli, &Config::default()).unwrap();
        assert_eq!(engine.name(), "http");
    }

    #[test]
    fn test_build_engine_cloud_without_credential_fails() {
        let cli = cli_from(&["sotto", "--engine", "cloud"]);
        let mut config = Config::default();
        config.engine.api_key_env = "SOTTO_APP_TEST_MISSING_KEY".to_string();
        assert!(matches!(
            build_engine(&cli, &config),
            Err(SottoError::MissingCredential { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_transcribe_once_respects_timeout() {
        let cli = cli_from(&["sotto", "--engine-timeout", "50ms"]);
        let config = Config::default();
        let engine = Arc::new(MockEngine::new("slow").with_delay(Duration::from_secs(30)));

        let result = transcribe_once(&[0i16; 1600], engine, &cli, &config).await;
        assert!(matches!(result, Err(SottoError::EngineTimeout { .. })));
    }
}
