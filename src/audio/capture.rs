//! Microphone capture using CPAL.
//!
//! The stream callback pushes sample blocks into a bounded channel; the
//! reader side reassembles them into fixed-size frames. A full channel
//! drops the block and surfaces as a recoverable overflow on the next read.

use crate::audio::source::FrameSource;
use crate::audio::wav;
use crate::defaults;
use crate::error::{Result, SottoError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Wrapper for cpal::Stream to make it Send.
///
/// SAFETY: the stream is only touched from the thread driving the frame
/// source; it never crosses threads while in use.
struct SendableStream(cpal::Stream);

unsafe impl Send for SendableStream {}

/// List available audio input device names.
pub fn list_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();
    let devices = host.input_devices().map_err(|e| SottoError::AudioCapture {
        message: format!("Failed to enumerate input devices: {}", e),
    })?;

    Ok(devices.filter_map(|device| device.name().ok()).collect())
}

/// Find the requested device, or the system default input.
fn find_device(device_name: Option<&str>) -> Result<cpal::Device> {
    let host = cpal::default_host();

    match device_name {
        Some(name) => {
            let devices = host.input_devices().map_err(|e| SottoError::AudioCapture {
                message: format!("Failed to enumerate input devices: {}", e),
            })?;
            for device in devices {
                if let Ok(device_name) = device.name()
                    && device_name == name
                {
                    return Ok(device);
                }
            }
            Err(SottoError::AudioDeviceNotFound {
                device: name.to_string(),
            })
        }
        None => host
            .default_input_device()
            .ok_or_else(|| SottoError::AudioDeviceNotFound {
                device: "default".to_string(),
            }),
    }
}

/// Microphone frame source.
///
/// Captures 16-bit PCM at 16kHz mono. Tries the preferred i16 config first,
/// then f32 with conversion, then the device's native format with software
/// downmix and resampling.
pub struct MicSource {
    device: cpal::Device,
    stream: Option<SendableStream>,
    blocks: Receiver<Vec<i16>>,
    blocks_tx: Sender<Vec<i16>>,
    overflowed: Arc<AtomicBool>,
    pending: Vec<i16>,
    frame_size: usize,
    sample_rate: u32,
}

impl MicSource {
    /// Create a microphone source.
    ///
    /// # Arguments
    /// * `device_name` - Optional device name; default input when None.
    /// * `sample_rate` - Target sample rate in Hz.
    /// * `frame_size` - Samples per frame served by `read_frame`.
    pub fn new(device_name: Option<&str>, sample_rate: u32, frame_size: usize) -> Result<Self> {
        let device = find_device(device_name)?;
        let (blocks_tx, blocks) = crossbeam_channel::bounded(defaults::CAPTURE_QUEUE_BLOCKS);

        Ok(Self {
            device,
            stream: None,
            blocks,
            blocks_tx,
            overflowed: Arc::new(AtomicBool::new(false)),
            pending: Vec::new(),
            frame_size,
            sample_rate,
        })
    }

    /// A callback that forwards i16 blocks, dropping on a full queue.
    fn block_sink(&self) -> impl FnMut(Vec<i16>) + Send + 'static {
        let tx = self.blocks_tx.clone();
        let overflowed = Arc::clone(&self.overflowed);
        move |block: Vec<i16>| {
            if let Err(TrySendError::Full(_)) = tx.try_send(block) {
                overflowed.store(true, Ordering::SeqCst);
            }
        }
    }

    fn build_stream(&self) -> Result<cpal::Stream> {
        let preferred = cpal::StreamConfig {
            channels: 1,
            sample_rate: self.sample_rate,
            buffer_size: cpal::BufferSize::Default,
        };

        let err_callback = |err| {
            eprintln!("sotto: audio stream error: {}", err);
        };

        // i16 at the target rate; PipeWire/PulseAudio convert transparently
        let mut sink = self.block_sink();
        if let Ok(stream) = self.device.build_input_stream(
            &preferred,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                sink(data.to_vec());
            },
            err_callback,
            None,
        ) {
            return Ok(stream);
        }

        // f32 at the target rate, converted in the callback
        let mut sink = self.block_sink();
        if let Ok(stream) = self.device.build_input_stream(
            &preferred,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                sink(data
                    .iter()
                    .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                    .collect());
            },
            err_callback,
            None,
        ) {
            return Ok(stream);
        }

        self.build_stream_native()
    }

    /// Capture at the device's native config, downmixing and resampling in
    /// software. Some PipeWire-ALSA setups accept non-native configs but
    /// never deliver data.
    fn build_stream_native(&self) -> Result<cpal::Stream> {
        use cpal::SampleFormat;

        let default_config =
            self.device
                .default_input_config()
                .map_err(|e| SottoError::AudioCapture {
                    message: format!("Failed to query default input config: {}", e),
                })?;

        let native_rate = default_config.sample_rate();
        let native_channels = default_config.channels() as usize;
        let target_rate = self.sample_rate;
        let stream_config: cpal::StreamConfig = default_config.clone().into();

        eprintln!(
            "sotto: using native audio format ({}ch/{}Hz/{:?}), converting in software",
            native_channels,
            native_rate,
            default_config.sample_format(),
        );

        let err_callback = |err| {
            eprintln!("sotto: audio stream error: {}", err);
        };

        match default_config.sample_format() {
            SampleFormat::I16 => {
                let mut sink = self.block_sink();
                self.device
                    .build_input_stream(
                        &stream_config,
                        move |data: &[i16], _: &cpal::InputCallbackInfo| {
                            sink(downmix_and_resample(
                                data,
                                native_channels,
                                native_rate,
                                target_rate,
                            ));
                        },
                        err_callback,
                        None,
                    )
                    .map_err(|e| SottoError::AudioCapture {
                        message: format!("Failed to build native i16 stream: {}", e),
                    })
            }
            SampleFormat::F32 => {
                let mut sink = self.block_sink();
                self.device
                    .build_input_stream(
                        &stream_config,
                        move |data: &[f32], _: &cpal::InputCallbackInfo| {
                            let converted: Vec<i16> = data
                                .iter()
                                .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                                .collect();
                            sink(downmix_and_resample(
                                &converted,
                                native_channels,
                                native_rate,
                                target_rate,
                            ));
                        },
                        err_callback,
                        None,
                    )
                    .map_err(|e| SottoError::AudioCapture {
                        message: format!("Failed to build native f32 stream: {}", e),
                    })
            }
            format => Err(SottoError::AudioCapture {
                message: format!(
                    "Unsupported native sample format: {:?}. Try --device.",
                    format
                ),
            }),
        }
    }
}

/// Mix multi-channel audio down to mono and resample to the target rate.
fn downmix_and_resample(
    samples: &[i16],
    channels: usize,
    source_rate: u32,
    target_rate: u32,
) -> Vec<i16> {
    let mono: Vec<i16> = if channels <= 1 {
        samples.to_vec()
    } else {
        samples
            .chunks_exact(channels)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / channels as i32) as i16
            })
            .collect()
    };

    if source_rate == target_rate {
        mono
    } else {
        wav::resample(&mono, source_rate, target_rate)
    }
}

impl FrameSource for MicSource {
    fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }
        let stream = self.build_stream()?;
        stream.play().map_err(|e| SottoError::AudioCapture {
            message: format!("Failed to start audio stream: {}", e),
        })?;
        self.stream = Some(SendableStream(stream));
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            stream.0.pause().map_err(|e| SottoError::AudioCapture {
                message: format!("Failed to stop audio stream: {}", e),
            })?;
        }
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<Vec<i16>>> {
        if self.overflowed.swap(false, Ordering::SeqCst) {
            return Err(SottoError::FrameOverflow);
        }

        while self.pending.len() < self.frame_size {
            match self.blocks.recv_timeout(Duration::from_millis(500)) {
                Ok(block) => self.pending.extend(block),
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                    if self.stream.is_none() {
                        return Ok(None);
                    }
                    if self.overflowed.swap(false, Ordering::SeqCst) {
                        return Err(SottoError::FrameOverflow);
                    }
                    // A live microphone delivers silence as zeros; a quiet
                    // channel just means the stream is warming up.
                }
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => return Ok(None),
            }
        }

        let frame: Vec<i16> = self.pending.drain(..self.frame_size).collect();
        Ok(Some(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downmix_stereo_averages_pairs() {
        let stereo = [100i16, 200, 300, 400];
        let mono = downmix_and_resample(&stereo, 2, 16000, 16000);
        assert_eq!(mono, vec![150, 350]);
    }

    #[test]
    fn test_downmix_mono_passthrough() {
        let samples = [1i16, 2, 3];
        assert_eq!(downmix_and_resample(&samples, 1, 16000, 16000), samples);
    }

    #[test]
    fn test_downmix_resamples_when_rates_differ() {
        let samples = vec![1000i16; 3200];
        let out = downmix_and_resample(&samples, 1, 16000, 8000);
        assert_eq!(out.len(), 1600);
    }

    #[test]
    fn test_unknown_device_name_is_an_error() {
        match MicSource::new(Some("NonExistentDevice12345"), 16000, 1024) {
            Err(SottoError::AudioDeviceNotFound { device }) => {
                assert_eq!(device, "NonExistentDevice12345");
            }
            Err(SottoError::AudioCapture { .. }) => {
                // No audio backend at all in this environment; acceptable
            }
            _ => panic!("expected a device error"),
        }
    }

    #[test]
    #[ignore] // Requires audio hardware
    fn test_create_with_default_device() {
        assert!(MicSource::new(None, 16000, 1024).is_ok());
    }

    #[test]
    #[ignore] // Requires audio hardware
    fn test_capture_round_trip() {
        let mut source = MicSource::new(None, 16000, 1024).expect("create mic source");
        source.start().expect("start");
        let frame = source.read_frame().expect("read");
        assert!(frame.is_some());
        source.stop().expect("stop");
    }
}
