//! Single-shot recording session.
//!
//! Records from a frame source until a sustained quiet run ends the take.
//! Uses its own stop threshold, deliberately separate from the real-time
//! segmenter's tuning: a push-to-talk take tolerates longer pauses.

use crate::audio::source::FrameSource;
use crate::audio::vad;
use crate::defaults;
use crate::error::{Result, SottoError};

/// Configuration for a single-shot recording.
#[derive(Debug, Clone, Copy)]
pub struct RecordConfig {
    /// Peak amplitude below which a frame counts toward the stop run.
    pub stop_amplitude: i16,
    /// Consecutive quiet time (ms) that ends the recording.
    pub stop_silence_ms: u32,
    /// Sample rate of the incoming frames.
    pub sample_rate: u32,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            stop_amplitude: defaults::RECORD_STOP_AMPLITUDE,
            stop_silence_ms: defaults::RECORD_STOP_SILENCE_MS,
            sample_rate: defaults::SAMPLE_RATE,
        }
    }
}

/// Record until the quiet run exceeds the stop duration or input ends.
///
/// Every frame is kept, including the trailing quiet run; overflow reads
/// are dropped and recording continues.
pub fn record_until_silence(
    source: &mut dyn FrameSource,
    config: &RecordConfig,
) -> Result<Vec<i16>> {
    source.start()?;

    let mut samples = Vec::new();
    let mut silent_ms: u64 = 0;

    loop {
        match source.read_frame() {
            Ok(Some(frame)) => {
                let frame_ms = if config.sample_rate == 0 {
                    0
                } else {
                    (frame.len() as u64 * 1000) / config.sample_rate as u64
                };
                if vad::peak_amplitude(&frame) < config.stop_amplitude {
                    silent_ms += frame_ms;
                } else {
                    silent_ms = 0;
                }
                samples.extend_from_slice(&frame);
                if silent_ms > config.stop_silence_ms as u64 {
                    break;
                }
            }
            Ok(None) => break,
            Err(SottoError::FrameOverflow) => {
                eprintln!("sotto: input overflowed, frame dropped");
            }
            Err(e) => {
                source.stop().ok();
                return Err(e);
            }
        }
    }

    source.stop()?;
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::source::ScriptedFrameSource;

    const FRAME_LEN: usize = 1024; // 64ms at 16kHz

    fn test_config() -> RecordConfig {
        RecordConfig {
            stop_amplitude: 1000,
            stop_silence_ms: 320,
            sample_rate: 16000,
        }
    }

    #[test]
    fn test_recording_stops_after_quiet_run() {
        let mut source = ScriptedFrameSource::new()
            .frames(vec![3000i16; FRAME_LEN], 10)
            .frames(vec![0i16; FRAME_LEN], 20);

        let samples = record_until_silence(&mut source, &test_config()).unwrap();

        // 10 loud frames plus the quiet run up to the stop boundary
        // (320ms = 5 frames, stop fires on the 6th)
        assert!(samples.len() >= 10 * FRAME_LEN);
        assert!(samples.len() < 30 * FRAME_LEN);
    }

    #[test]
    fn test_speech_resets_the_quiet_run() {
        let mut source = ScriptedFrameSource::new()
            .frames(vec![3000i16; FRAME_LEN], 4)
            .frames(vec![0i16; FRAME_LEN], 3)
            .frames(vec![3000i16; FRAME_LEN], 4)
            .frames(vec![0i16; FRAME_LEN], 10);

        let samples = record_until_silence(&mut source, &test_config()).unwrap();
        // Both speech runs and the dip between them are kept
        assert!(samples.len() >= 11 * FRAME_LEN);
    }

    #[test]
    fn test_recording_ends_with_input() {
        let mut source = ScriptedFrameSource::new().frames(vec![3000i16; FRAME_LEN], 3);
        let samples = record_until_silence(&mut source, &test_config()).unwrap();
        assert_eq!(samples.len(), 3 * FRAME_LEN);
    }

    #[test]
    fn test_overflow_does_not_end_recording() {
        let mut source = ScriptedFrameSource::new()
            .frames(vec![3000i16; FRAME_LEN], 2)
            .overflow()
            .frames(vec![3000i16; FRAME_LEN], 2)
            .frames(vec![0i16; FRAME_LEN], 10);

        let samples = record_until_silence(&mut source, &test_config()).unwrap();
        assert!(samples.len() >= 4 * FRAME_LEN);
    }
}
