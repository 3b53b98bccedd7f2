//! Data types that flow through the pipeline.

/// One fixed-size block of 16-bit PCM samples from the frame source.
///
/// Immutable once produced; owned by the segmenter while buffering.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Sequence number in stream order.
    pub sequence: u64,
    /// Audio samples as 16-bit PCM.
    pub samples: Vec<i16>,
}

impl Frame {
    /// Creates a new frame.
    pub fn new(sequence: u64, samples: Vec<i16>) -> Self {
        Self { sequence, samples }
    }

    /// Duration of this frame in milliseconds.
    pub fn duration_ms(&self, sample_rate: u32) -> u32 {
        if sample_rate == 0 {
            return 0;
        }
        (self.samples.len() as u64 * 1000 / sample_rate as u64) as u32
    }
}

/// One finalized utterance, ready for transcription.
///
/// Indices are assigned at finalization, strictly increasing with no gaps.
/// Ownership moves from the segmenter to exactly one worker task.
#[derive(Debug, Clone)]
pub struct Segment {
    /// Position of this utterance in creation order.
    pub index: u64,
    /// Contiguous samples of the utterance.
    pub samples: Vec<i16>,
    /// Sample rate the utterance was captured at.
    pub sample_rate: u32,
}

impl Segment {
    /// Duration of this segment in milliseconds.
    pub fn duration_ms(&self) -> u32 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.samples.len() as u64 * 1000 / self.sample_rate as u64) as u32
    }
}

/// Transcription outcome for one segment.
///
/// Produced exactly once per segment: either the engine's text or an error
/// marker, never silently dropped. A missing index would stall the ordered
/// release forever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentTranscription {
    /// Index of the segment this result belongs to.
    pub index: u64,
    /// Transcribed text; empty when `error` is set.
    pub text: String,
    /// Error marker when the engine call failed.
    pub error: Option<String>,
}

impl SegmentTranscription {
    /// A successful transcription.
    pub fn ok(index: u64, text: String) -> Self {
        Self {
            index,
            text,
            error: None,
        }
    }

    /// An error placeholder holding the segment's place in the sequence.
    pub fn failed(index: u64, message: String) -> Self {
        Self {
            index,
            text: String::new(),
            error: Some(message),
        }
    }

    /// True if this result carries an error marker instead of text.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
