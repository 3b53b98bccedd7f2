//! Voice activity analysis.
//!
//! Two independent judgments, tuned separately:
//! - a per-frame loudness test against a linear peak-amplitude floor, used to
//!   decide whether a frame starts or extends an utterance;
//! - a windowed dBFS silence scan over the whole accumulated buffer, used to
//!   decide whether an utterance has actually ended rather than paused.

use crate::defaults;

/// Lower bound reported for digital silence, in dBFS.
const DBFS_FLOOR: f32 = -120.0;

/// Configuration for voice activity analysis.
#[derive(Debug, Clone, Copy)]
pub struct ClassifierConfig {
    /// Minimum peak amplitude (linear i16) for a frame to count as speech.
    pub speech_amplitude: i16,
    /// Minimum quiet run (ms) for the windowed scan to call silence.
    pub silence_window_ms: u32,
    /// Windows quieter than this (dBFS) count as silent.
    pub silence_floor_db: f32,
    /// Sample rate for time conversions.
    pub sample_rate: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            speech_amplitude: defaults::MIN_SPEECH_AMPLITUDE,
            silence_window_ms: defaults::SILENCE_WINDOW_MS,
            silence_floor_db: defaults::SILENCE_FLOOR_DB,
            sample_rate: defaults::SAMPLE_RATE,
        }
    }
}

/// Stateless voice activity classifier.
#[derive(Debug, Clone, Copy)]
pub struct ActivityClassifier {
    config: ClassifierConfig,
}

impl ActivityClassifier {
    /// Creates a classifier with the given configuration.
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// True if the frame's peak magnitude exceeds the speech amplitude floor.
    pub fn is_loud(&self, samples: &[i16]) -> bool {
        peak_amplitude(samples) > self.config.speech_amplitude
    }

    /// Samples per analysis hop.
    fn hop_samples(&self) -> usize {
        (self.config.sample_rate as usize * defaults::ANALYSIS_HOP_MS as usize) / 1000
    }

    /// Ranges of non-silent audio in the buffer, as (start_ms, end_ms) pairs.
    ///
    /// A quiet stretch only splits ranges once it lasts at least the
    /// configured silence window; shorter dips are folded into speech.
    /// Recomputed over the whole buffer on each call; buffers are one
    /// utterance long, so this stays cheap.
    pub fn nonsilent_ranges(&self, samples: &[i16]) -> Vec<(u32, u32)> {
        let hop = self.hop_samples();
        if samples.is_empty() || hop == 0 {
            return Vec::new();
        }

        let silent: Vec<bool> = samples
            .chunks(hop)
            .map(|window| dbfs(window) < self.config.silence_floor_db)
            .collect();
        let min_silence_hops =
            (self.config.silence_window_ms / defaults::ANALYSIS_HOP_MS).max(1) as usize;

        // Silent runs long enough to count, as hop-index ranges.
        let mut silent_runs = Vec::new();
        let mut i = 0;
        while i < silent.len() {
            if silent[i] {
                let start = i;
                while i < silent.len() && silent[i] {
                    i += 1;
                }
                if i - start >= min_silence_hops {
                    silent_runs.push((start, i));
                }
            } else {
                i += 1;
            }
        }

        // Non-silent ranges are the complement.
        let mut ranges = Vec::new();
        let mut cursor = 0;
        for (start, end) in silent_runs {
            if start > cursor {
                ranges.push((cursor, start));
            }
            cursor = end;
        }
        if cursor < silent.len() {
            ranges.push((cursor, silent.len()));
        }

        ranges
            .into_iter()
            .map(|(start, end)| {
                (
                    start as u32 * defaults::ANALYSIS_HOP_MS,
                    end as u32 * defaults::ANALYSIS_HOP_MS,
                )
            })
            .collect()
    }

    /// True when the whole buffer reads as silence.
    pub fn is_silent_window(&self, samples: &[i16]) -> bool {
        self.nonsilent_ranges(samples).is_empty()
    }

    /// Length (ms) of the silent stretch at the end of the buffer.
    pub fn trailing_silence_ms(&self, samples: &[i16]) -> u32 {
        let hop = self.hop_samples();
        if hop == 0 {
            return 0;
        }
        let quiet_hops = samples
            .chunks(hop)
            .rev()
            .take_while(|window| dbfs(window) < self.config.silence_floor_db)
            .count();
        quiet_hops as u32 * defaults::ANALYSIS_HOP_MS
    }
}

impl Default for ActivityClassifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

/// Largest sample magnitude in the buffer.
pub fn peak_amplitude(samples: &[i16]) -> i16 {
    samples
        .iter()
        .map(|&sample| sample.saturating_abs())
        .max()
        .unwrap_or(0)
}

/// Root Mean Square of the samples, normalized to 0.0..=1.0.
pub fn calculate_rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = samples
        .iter()
        .map(|&sample| {
            let normalized = sample as f64 / i16::MAX as f64;
            normalized * normalized
        })
        .sum();

    let mean_square = sum_squares / samples.len() as f64;
    mean_square.sqrt() as f32
}

/// Signal level in dBFS, clamped to [`DBFS_FLOOR`] for digital silence.
pub fn dbfs(samples: &[i16]) -> f32 {
    let rms = calculate_rms(samples);
    if rms <= 0.0 {
        DBFS_FLOOR
    } else {
        (20.0 * rms.log10()).max(DBFS_FLOOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_silence(count: usize) -> Vec<i16> {
        vec![0i16; count]
    }

    fn make_speech(count: usize, amplitude: i16) -> Vec<i16> {
        vec![amplitude; count]
    }

    // 100ms of audio at 16kHz
    const HOP_100MS: usize = 1600;

    #[test]
    fn test_peak_amplitude_basic() {
        assert_eq!(peak_amplitude(&[]), 0);
        assert_eq!(peak_amplitude(&[100, -300, 200]), 300);
    }

    #[test]
    fn test_peak_amplitude_handles_i16_min() {
        // i16::MIN has no positive counterpart; saturate instead of overflowing
        assert_eq!(peak_amplitude(&[i16::MIN]), i16::MAX);
    }

    #[test]
    fn test_rms_silence_is_zero() {
        assert_eq!(calculate_rms(&make_silence(1000)), 0.0);
    }

    #[test]
    fn test_rms_max_amplitude() {
        let rms = calculate_rms(&make_speech(1000, i16::MAX));
        assert!((rms - 1.0).abs() < 0.001, "RMS should be ~1.0, got {}", rms);
    }

    #[test]
    fn test_dbfs_of_silence_is_floor() {
        assert_eq!(dbfs(&make_silence(100)), -120.0);
    }

    #[test]
    fn test_dbfs_of_full_scale_is_zero() {
        let db = dbfs(&make_speech(100, i16::MAX));
        assert!(db.abs() < 0.01, "full scale should be ~0 dBFS, got {}", db);
    }

    #[test]
    fn test_dbfs_ordering() {
        assert!(dbfs(&make_speech(100, 3000)) > dbfs(&make_speech(100, 300)));
    }

    #[test]
    fn test_is_loud_uses_peak_threshold() {
        let classifier = ActivityClassifier::default();
        assert!(classifier.is_loud(&make_speech(100, 3000)));
        assert!(!classifier.is_loud(&make_speech(100, 400)));
        assert!(!classifier.is_loud(&make_silence(100)));
    }

    #[test]
    fn test_nonsilent_ranges_empty_buffer() {
        let classifier = ActivityClassifier::default();
        assert!(classifier.nonsilent_ranges(&[]).is_empty());
    }

    #[test]
    fn test_nonsilent_ranges_all_silence() {
        let classifier = ActivityClassifier::default();
        assert!(classifier.nonsilent_ranges(&make_silence(HOP_100MS * 10)).is_empty());
        assert!(classifier.is_silent_window(&make_silence(HOP_100MS * 10)));
    }

    #[test]
    fn test_nonsilent_ranges_all_speech() {
        let classifier = ActivityClassifier::default();
        let ranges = classifier.nonsilent_ranges(&make_speech(HOP_100MS * 10, 3000));
        assert_eq!(ranges, vec![(0, 1000)]);
    }

    #[test]
    fn test_short_dip_does_not_split_ranges() {
        let classifier = ActivityClassifier::default();
        // 300ms speech, 200ms dip (under the 700ms window), 300ms speech
        let mut samples = make_speech(HOP_100MS * 3, 3000);
        samples.extend(make_silence(HOP_100MS * 2));
        samples.extend(make_speech(HOP_100MS * 3, 3000));

        let ranges = classifier.nonsilent_ranges(&samples);
        assert_eq!(ranges.len(), 1, "short dip should not split: {:?}", ranges);
    }

    #[test]
    fn test_long_silence_splits_ranges() {
        let classifier = ActivityClassifier::default();
        // 300ms speech, 800ms silence (over the 700ms window), 300ms speech
        let mut samples = make_speech(HOP_100MS * 3, 3000);
        samples.extend(make_silence(HOP_100MS * 8));
        samples.extend(make_speech(HOP_100MS * 3, 3000));

        let ranges = classifier.nonsilent_ranges(&samples);
        assert_eq!(ranges.len(), 2, "long silence should split: {:?}", ranges);
        assert_eq!(ranges[0].0, 0);
        assert_eq!(ranges[1].1, 1400);
    }

    #[test]
    fn test_trailing_silence_on_silent_tail() {
        let classifier = ActivityClassifier::default();
        let mut samples = make_speech(HOP_100MS * 3, 3000);
        samples.extend(make_silence(HOP_100MS * 5));

        let trailing = classifier.trailing_silence_ms(&samples);
        assert!(
            (450..=500).contains(&trailing),
            "expected ~500ms of trailing silence, got {}",
            trailing
        );
    }

    #[test]
    fn test_trailing_silence_zero_when_speech_at_end() {
        let classifier = ActivityClassifier::default();
        let mut samples = make_silence(HOP_100MS * 5);
        samples.extend(make_speech(HOP_100MS * 3, 3000));
        assert_eq!(classifier.trailing_silence_ms(&samples), 0);
    }

    #[test]
    fn test_two_thresholds_are_independent() {
        // A frame can sit above the dBFS silence floor while staying below the
        // peak speech floor; the two judgments must not be collapsed.
        let config = ClassifierConfig {
            speech_amplitude: 2000,
            ..ClassifierConfig::default()
        };
        let classifier = ActivityClassifier::new(config);
        let samples = make_speech(HOP_100MS, 1000);

        assert!(!classifier.is_loud(&samples));
        assert!(!classifier.is_silent_window(&samples));
    }
}
