//! WAV encoding for engine uploads and WAV file frame sources.

use crate::audio::source::FrameSource;
use crate::defaults;
use crate::engine::AudioClip;
use crate::error::{Result, SottoError};
use std::io::{Cursor, Read};
use std::path::Path;

/// Encode segment samples into a self-contained WAV clip for upload.
pub fn encode_clip(samples: &[i16], sample_rate: u32) -> Result<AudioClip> {
    let spec = hound::WavSpec {
        channels: defaults::CHANNELS,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer =
        hound::WavWriter::new(&mut cursor, spec).map_err(|e| SottoError::AudioEncode {
            message: format!("failed to start WAV clip: {}", e),
        })?;
    for &sample in samples {
        writer
            .write_sample(sample)
            .map_err(|e| SottoError::AudioEncode {
                message: format!("failed to write WAV sample: {}", e),
            })?;
    }
    writer.finalize().map_err(|e| SottoError::AudioEncode {
        message: format!("failed to finalize WAV clip: {}", e),
    })?;

    let duration_ms = if sample_rate == 0 {
        0
    } else {
        (samples.len() as u64 * 1000 / sample_rate as u64) as u32
    };

    Ok(AudioClip {
        wav_bytes: cursor.into_inner(),
        duration_ms,
    })
}

/// Frame source that reads from WAV data.
///
/// Supports arbitrary sample rates and channels, downmixing and resampling
/// to 16kHz mono, and serves fixed-size frames.
pub struct WavFileSource {
    samples: Vec<i16>,
    position: usize,
    frame_size: usize,
}

impl WavFileSource {
    /// Create from any reader.
    pub fn from_reader(reader: Box<dyn Read + Send>, frame_size: usize) -> Result<Self> {
        let mut wav_reader =
            hound::WavReader::new(reader).map_err(|e| SottoError::AudioCapture {
                message: format!("Failed to parse WAV data: {}", e),
            })?;

        let spec = wav_reader.spec();
        let raw_samples: Vec<i16> = wav_reader
            .samples::<i16>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| SottoError::AudioCapture {
                message: format!("Failed to read WAV samples: {}", e),
            })?;

        // Downmix to mono if needed
        let mono_samples = if spec.channels > 1 {
            let channels = spec.channels as usize;
            raw_samples
                .chunks_exact(channels)
                .map(|frame| {
                    let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                    (sum / channels as i32) as i16
                })
                .collect()
        } else {
            raw_samples
        };

        let samples = if spec.sample_rate != defaults::SAMPLE_RATE {
            resample(&mono_samples, spec.sample_rate, defaults::SAMPLE_RATE)
        } else {
            mono_samples
        };

        Ok(Self {
            samples,
            position: 0,
            frame_size,
        })
    }

    /// Create from in-memory WAV bytes.
    pub fn from_bytes(bytes: Vec<u8>, frame_size: usize) -> Result<Self> {
        Self::from_reader(Box::new(Cursor::new(bytes)), frame_size)
    }

    /// Create from a file on disk.
    pub fn from_path(path: &Path, frame_size: usize) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(Box::new(file), frame_size)
    }

    /// Consume the source and return all samples as a single buffer.
    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }
}

impl FrameSource for WavFileSource {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<Vec<i16>>> {
        if self.position >= self.samples.len() {
            return Ok(None);
        }

        let end = std::cmp::min(self.position + self.frame_size, self.samples.len());
        let frame = self.samples[self.position..end].to_vec();
        self.position = end;

        Ok(Some(frame))
    }
}

/// Simple linear interpolation resampling.
pub fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = source_pos.floor() as usize;
            let fraction = source_pos - source_idx as f64;

            if source_idx + 1 >= samples.len() {
                samples[source_idx]
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as i16
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_wav_data(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        cursor.into_inner()
    }

    #[test]
    fn encode_clip_round_trips_through_hound() {
        let samples = vec![100i16, -200, 300, -400, 500];
        let clip = encode_clip(&samples, 16000).unwrap();

        let mut reader = hound::WavReader::new(Cursor::new(clip.wav_bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16000);
        assert_eq!(spec.bits_per_sample, 16);

        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn encode_clip_reports_duration() {
        let clip = encode_clip(&vec![0i16; 16000], 16000).unwrap();
        assert_eq!(clip.duration_ms, 1000);

        let clip = encode_clip(&vec![0i16; 8000], 16000).unwrap();
        assert_eq!(clip.duration_ms, 500);
    }

    #[test]
    fn encode_clip_empty_segment() {
        let clip = encode_clip(&[], 16000).unwrap();
        assert_eq!(clip.duration_ms, 0);
        // Still a valid, parseable container
        let reader = hound::WavReader::new(Cursor::new(clip.wav_bytes)).unwrap();
        assert_eq!(reader.len(), 0);
    }

    #[test]
    fn from_bytes_16khz_mono_matches_exactly() {
        let input_samples = vec![100i16, 200, 300, 400, 500];
        let wav_data = make_wav_data(16000, 1, &input_samples);

        let source = WavFileSource::from_bytes(wav_data, 1024).unwrap();
        assert_eq!(source.samples, input_samples);
    }

    #[test]
    fn from_bytes_stereo_downmixes_to_mono() {
        // Stereo pairs: (100, 200), (300, 400), (500, 600)
        let stereo_samples = vec![100i16, 200, 300, 400, 500, 600];
        let wav_data = make_wav_data(16000, 2, &stereo_samples);

        let source = WavFileSource::from_bytes(wav_data, 1024).unwrap();
        assert_eq!(source.samples, vec![150i16, 350, 550]);
    }

    #[test]
    fn from_bytes_48khz_resamples_to_16khz() {
        let input_samples = vec![1000i16; 48000]; // 1 second at 48kHz
        let wav_data = make_wav_data(48000, 1, &input_samples);

        let source = WavFileSource::from_bytes(wav_data, 1024).unwrap();
        assert!(source.samples.len() >= 15900 && source.samples.len() <= 16100);
        assert!(source.samples.iter().all(|&s| (900..=1100).contains(&s)));
    }

    #[test]
    fn read_frame_returns_fixed_size_frames() {
        let wav_data = make_wav_data(16000, 1, &vec![1i16; 2500]);
        let mut source = WavFileSource::from_bytes(wav_data, 1024).unwrap();

        assert_eq!(source.read_frame().unwrap().unwrap().len(), 1024);
        assert_eq!(source.read_frame().unwrap().unwrap().len(), 1024);
        // Remainder
        assert_eq!(source.read_frame().unwrap().unwrap().len(), 452);
        assert_eq!(source.read_frame().unwrap(), None);
    }

    #[test]
    fn read_frame_ends_cleanly_at_eof() {
        let wav_data = make_wav_data(16000, 1, &vec![1i16; 10]);
        let mut source = WavFileSource::from_bytes(wav_data, 1024).unwrap();

        assert!(source.read_frame().unwrap().is_some());
        assert_eq!(source.read_frame().unwrap(), None);
        assert_eq!(source.read_frame().unwrap(), None);
    }

    #[test]
    fn invalid_wav_data_returns_error() {
        let result = WavFileSource::from_bytes(vec![0u8, 1, 2, 3, 4, 5], 1024);
        match result {
            Err(SottoError::AudioCapture { message }) => {
                assert!(message.contains("Failed to parse WAV"));
            }
            _ => panic!("Expected AudioCapture error"),
        }
    }

    #[test]
    fn empty_wav_data_returns_error() {
        assert!(WavFileSource::from_bytes(Vec::new(), 1024).is_err());
    }

    #[test]
    fn resample_identity_same_rate() {
        let samples = vec![100i16, 200, 300];
        assert_eq!(resample(&samples, 16000, 16000), samples);
    }

    #[test]
    fn resample_upsample_interpolates() {
        let resampled = resample(&[0i16, 1000, 2000], 8000, 16000);
        assert_eq!(resampled.len(), 6);
        assert_eq!(resampled[0], 0);
        assert!(resampled[1] > 0 && resampled[1] < 1000);
        assert_eq!(resampled[2], 1000);
    }

    #[test]
    fn resample_downsample_halves_length() {
        let resampled = resample(&vec![0i16; 3200], 16000, 8000);
        assert_eq!(resampled.len(), 1600);
    }

    #[test]
    fn resample_handles_edge_cases() {
        assert!(resample(&[], 16000, 8000).is_empty());
        assert_eq!(resample(&[100i16], 16000, 8000), vec![100]);
    }

    #[test]
    fn into_samples_returns_whole_buffer() {
        let input_samples = vec![5i16; 100];
        let wav_data = make_wav_data(16000, 1, &input_samples);
        let source = WavFileSource::from_bytes(wav_data, 16).unwrap();
        assert_eq!(source.into_samples(), input_samples);
    }
}
