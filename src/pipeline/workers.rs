//! Per-segment transcription workers.
//!
//! Every finalized segment gets its own task: encode the samples as a WAV
//! clip, call the engine under a bounded timeout, and push the outcome into
//! the ordered buffer. A worker always produces a result for its index;
//! failures become error placeholders, never gaps.

use crate::audio::wav;
use crate::engine::TranscriptionEngine;
use crate::error::{Result, SottoError};
use crate::pipeline::frame::{Segment, SegmentTranscription};
use crate::pipeline::reorder::ReorderBuffer;
use std::sync::Arc;
use std::time::Duration;

/// Dispatches one concurrent transcription task per segment.
///
/// Fan-out is deliberately unbounded, matching the recording loop's
/// fire-and-forget submission; nothing backpressures the segmenter.
pub struct WorkerPool {
    engine: Arc<dyn TranscriptionEngine>,
    results: Arc<ReorderBuffer>,
    call_timeout: Duration,
}

impl WorkerPool {
    /// Creates a pool submitting to the given engine and result buffer.
    pub fn new(
        engine: Arc<dyn TranscriptionEngine>,
        results: Arc<ReorderBuffer>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            engine,
            results,
            call_timeout,
        }
    }

    /// Submit a segment for transcription. Fire-and-forget: the result
    /// lands in the ordered buffer under the segment's index.
    pub fn submit(&self, segment: Segment) {
        self.results.reserve(segment.index);

        let engine = Arc::clone(&self.engine);
        let results = Arc::clone(&self.results);
        let call_timeout = self.call_timeout;

        tokio::spawn(async move {
            let index = segment.index;
            let result = match transcribe_segment(engine.as_ref(), segment, call_timeout).await {
                Ok(text) => SegmentTranscription::ok(index, text),
                Err(e) => {
                    eprintln!("sotto: segment {} transcription failed: {}", index, e);
                    SegmentTranscription::failed(index, e.to_string())
                }
            };
            results.push(result);
        });
    }
}

/// Encode and transcribe one segment with a hard deadline on the engine call.
async fn transcribe_segment(
    engine: &dyn TranscriptionEngine,
    segment: Segment,
    call_timeout: Duration,
) -> Result<String> {
    let clip = wav::encode_clip(&segment.samples, segment.sample_rate)?;
    match tokio::time::timeout(call_timeout, engine.transcribe(clip)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(SottoError::EngineTimeout {
            seconds: call_timeout.as_secs(),
        }),
    }
}
