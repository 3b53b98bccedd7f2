//! Utterance segmentation state machine.
//!
//! Consumes frames and their activity judgments, accumulates an utterance
//! buffer, and finalizes a segment once trailing silence outlasts the
//! silence window and the debounce. A separate watchdog ends the whole
//! session after prolonged absolute silence.
//!
//! Runs on stream time derived from consumed sample counts, so the same
//! frame sequence always segments the same way, live or from a file.

use crate::audio::vad::{ActivityClassifier, ClassifierConfig};
use crate::defaults;
use crate::pipeline::frame::{Frame, Segment};

/// Configuration for the segmenter.
#[derive(Debug, Clone, Copy)]
pub struct SegmenterConfig {
    /// Sample rate of the incoming frames.
    pub sample_rate: u32,
    /// Minimum peak amplitude for a frame to count as speech.
    pub speech_amplitude: i16,
    /// Trailing silence (ms) needed before an utterance can finalize.
    pub silence_window_ms: u32,
    /// Windows quieter than this (dBFS) count as silent.
    pub silence_floor_db: f32,
    /// Time (ms) after the last speech frame before finalizing.
    pub debounce_ms: u32,
    /// Unbroken silence (ms) that ends the whole session.
    pub max_silence_ms: u32,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            speech_amplitude: defaults::MIN_SPEECH_AMPLITUDE,
            silence_window_ms: defaults::SILENCE_WINDOW_MS,
            silence_floor_db: defaults::SILENCE_FLOOR_DB,
            debounce_ms: defaults::DEBOUNCE_MS,
            max_silence_ms: defaults::MAX_SILENCE_MS,
        }
    }
}

impl SegmenterConfig {
    fn classifier(&self) -> ClassifierConfig {
        ClassifierConfig {
            speech_amplitude: self.speech_amplitude,
            silence_window_ms: self.silence_window_ms,
            silence_floor_db: self.silence_floor_db,
            sample_rate: self.sample_rate,
        }
    }
}

/// Current state of the segmenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmenterState {
    /// Nothing buffered, waiting for speech.
    Idle,
    /// Buffering an utterance.
    Accumulating,
    /// Utterance buffered, trailing silence running toward finalization.
    TrailingSilence,
    /// Session over; no further frames accepted.
    StreamEnded,
}

/// Utterance segmentation state machine.
pub struct Segmenter {
    config: SegmenterConfig,
    classifier: ActivityClassifier,
    state: SegmenterState,
    buffer: Vec<i16>,
    /// Stream time consumed so far, in milliseconds.
    stream_ms: u64,
    /// Stream time of the most recent speech frame (or session activity).
    last_speech_ms: u64,
    /// Next segment index to assign; indices are gap-free in creation order.
    next_index: u64,
}

impl Segmenter {
    /// Creates a new segmenter with the given configuration.
    pub fn new(config: SegmenterConfig) -> Self {
        Self {
            config,
            classifier: ActivityClassifier::new(config.classifier()),
            state: SegmenterState::Idle,
            buffer: Vec::new(),
            stream_ms: 0,
            last_speech_ms: 0,
            next_index: 0,
        }
    }

    /// Offer one frame. Returns a finalized segment when this frame
    /// completes an utterance.
    ///
    /// After [`SegmenterState::StreamEnded`] every frame is ignored.
    pub fn offer(&mut self, frame: &Frame) -> Option<Segment> {
        if self.state == SegmenterState::StreamEnded {
            return None;
        }

        self.stream_ms += frame.duration_ms(self.config.sample_rate) as u64;
        let loud = self.classifier.is_loud(&frame.samples);

        match self.state {
            SegmenterState::Idle => {
                if loud {
                    self.buffer.extend_from_slice(&frame.samples);
                    self.last_speech_ms = self.stream_ms;
                    self.state = SegmenterState::Accumulating;
                } else if self.silence_elapsed_ms() > self.config.max_silence_ms as u64 {
                    // Watchdog: nothing worth keeping for too long.
                    self.state = SegmenterState::StreamEnded;
                }
                None
            }
            SegmenterState::Accumulating | SegmenterState::TrailingSilence => {
                self.buffer.extend_from_slice(&frame.samples);
                if loud {
                    self.last_speech_ms = self.stream_ms;
                    self.state = SegmenterState::Accumulating;
                    return None;
                }

                let trailing = self.classifier.trailing_silence_ms(&self.buffer);
                if trailing >= self.config.silence_window_ms {
                    self.state = SegmenterState::TrailingSilence;
                    if self.silence_elapsed_ms() >= self.config.debounce_ms as u64 {
                        let segment = self.take_segment();
                        self.state = SegmenterState::Idle;
                        // The watchdog counts from the utterance that just ended.
                        self.last_speech_ms = self.stream_ms;
                        return Some(segment);
                    }
                }
                None
            }
            SegmenterState::StreamEnded => None,
        }
    }

    /// End of input: finalize a trailing partial utterance if it contains
    /// any speech, then refuse further frames.
    pub fn finish(&mut self) -> Option<Segment> {
        if self.state == SegmenterState::StreamEnded {
            return None;
        }
        let segment = if self.classifier.is_loud(&self.buffer) {
            Some(self.take_segment())
        } else {
            self.buffer.clear();
            None
        };
        self.state = SegmenterState::StreamEnded;
        segment
    }

    /// Current state.
    pub fn state(&self) -> SegmenterState {
        self.state
    }

    /// Number of segments finalized so far.
    pub fn segments_finalized(&self) -> u64 {
        self.next_index
    }

    fn silence_elapsed_ms(&self) -> u64 {
        self.stream_ms.saturating_sub(self.last_speech_ms)
    }

    fn take_segment(&mut self) -> Segment {
        let index = self.next_index;
        self.next_index += 1;
        Segment {
            index,
            samples: std::mem::take(&mut self.buffer),
            sample_rate: self.config.sample_rate,
        }
    }
}
