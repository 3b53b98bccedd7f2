//! Remote media fetching.
//!
//! Downloads audio from a direct URL with streamed progress, optionally
//! keeping the file on disk for reuse across runs.

use crate::error::{Result, SottoError};
use crate::output;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// Fetch remote audio into memory.
///
/// When `save_as` names an existing file, the previous download is reused
/// instead of fetching again; when it names a new path, the fetched bytes
/// are also written there.
pub async fn fetch_audio(url: &str, save_as: Option<&Path>, quiet: bool) -> Result<Vec<u8>> {
    if let Some(path) = save_as
        && path.exists()
    {
        if !quiet {
            output::status(&format!("reusing downloaded audio: {}", path.display()));
        }
        return Ok(std::fs::read(path)?);
    }

    let client = reqwest::Client::new();
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| SottoError::MediaFetch {
            message: format!("failed to start download: {}", e),
        })?;

    if !response.status().is_success() {
        return Err(SottoError::MediaFetch {
            message: format!("download failed with status: {}", response.status()),
        });
    }

    let total_size = response.content_length().unwrap_or(0);
    let progress = if quiet {
        None
    } else {
        let bar = ProgressBar::new(total_size);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        Some(bar)
    };

    let mut stream = response.bytes_stream();
    let mut bytes = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| SottoError::MediaFetch {
            message: format!("failed to read download chunk: {}", e),
        })?;
        bytes.extend_from_slice(&chunk);
        if let Some(ref bar) = progress {
            bar.inc(chunk.len() as u64);
        }
    }
    if let Some(bar) = progress {
        bar.finish_and_clear();
    }

    if let Some(path) = save_as {
        std::fs::write(path, &bytes)?;
        if !quiet {
            output::success(&format!("audio saved as {}", path.display()));
        }
    }

    Ok(bytes)
}
