//! Pipeline controller: wires source, segmenter, workers, and the ordered
//! buffer into one run, and owns the stop signal.
//!
//! Each run gets its own controller with an injected frame source and
//! engine; there is no process-wide pipeline state.

use crate::audio::source::FrameSource;
use crate::engine::TranscriptionEngine;
use crate::error::SottoError;
use crate::pipeline::frame::{Frame, Segment, SegmentTranscription};
use crate::pipeline::reorder::ReorderBuffer;
use crate::pipeline::segmenter::{Segmenter, SegmenterConfig, SegmenterState};
use crate::pipeline::workers::WorkerPool;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

/// Configuration for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Segmenter tuning.
    pub segmenter: SegmenterConfig,
    /// Hard deadline per engine call.
    pub engine_timeout: Duration,
    /// Maximum drain wait per pending index before releasing a placeholder.
    pub result_wait: Duration,
    /// Time granted to in-flight workers after a stop request.
    pub stop_grace: Duration,
    /// Output channel capacity.
    pub channel_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            segmenter: SegmenterConfig::default(),
            engine_timeout: Duration::from_secs(crate::defaults::ENGINE_TIMEOUT_SECS),
            result_wait: Duration::from_secs(crate::defaults::RESULT_WAIT_SECS),
            stop_grace: Duration::from_secs(crate::defaults::STOP_GRACE_SECS),
            channel_capacity: 64,
        }
    }
}

/// Handle to a running pipeline.
#[derive(Clone)]
pub struct PipelineHandle {
    stop: Arc<AtomicBool>,
    results: Arc<ReorderBuffer>,
    grace: Duration,
}

impl PipelineHandle {
    /// Request a stop: frame intake ends, in-flight workers get the grace
    /// period to land their results, everything already ordered still
    /// drains. Idempotent.
    ///
    /// Must be called within a tokio runtime.
    pub fn stop(&self) {
        if self.stop.swap(true, Ordering::SeqCst) {
            return;
        }
        let results = Arc::clone(&self.results);
        let grace = self.grace;
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            results.cancel();
        });
    }

    /// True once a stop has been requested.
    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

/// Live transcription pipeline.
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Creates a pipeline with default configuration.
    pub fn new() -> Self {
        Self::with_config(PipelineConfig::default())
    }

    /// Creates a pipeline with custom configuration.
    pub fn with_config(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Start the pipeline against the given source and engine.
    ///
    /// Returns a stop handle and the ordered result stream. The receiver
    /// yields transcriptions strictly in segment order and closes when the
    /// session ends (watchdog silence, source exhausted, or stop).
    ///
    /// Must be called within a tokio runtime.
    pub fn run(
        &self,
        source: Box<dyn FrameSource>,
        engine: Arc<dyn TranscriptionEngine>,
    ) -> (PipelineHandle, mpsc::Receiver<SegmentTranscription>) {
        let results = Arc::new(ReorderBuffer::new());
        let stop = Arc::new(AtomicBool::new(false));
        let (segment_tx, mut segment_rx) = mpsc::unbounded_channel::<Segment>();
        let (out_tx, out_rx) = mpsc::channel(self.config.channel_capacity);

        // Ingestion: one synchronous loop on the blocking pool, never
        // preempted by transcription work.
        let segmenter = Segmenter::new(self.config.segmenter);
        {
            let stop = Arc::clone(&stop);
            tokio::task::spawn_blocking(move || ingest_loop(source, segmenter, segment_tx, stop));
        }

        // Dispatch: one worker per finalized segment, then report the final
        // count so the drain knows where the sequence ends.
        let pool = WorkerPool::new(engine, Arc::clone(&results), self.config.engine_timeout);
        {
            let results = Arc::clone(&results);
            tokio::spawn(async move {
                let mut submitted = 0u64;
                while let Some(segment) = segment_rx.recv().await {
                    submitted += 1;
                    pool.submit(segment);
                }
                results.close(submitted);
            });
        }

        // Drain: release results in index order to the consumer.
        {
            let results = Arc::clone(&results);
            let result_wait = self.config.result_wait;
            tokio::spawn(async move {
                while let Some(result) = results.next(result_wait).await {
                    if out_tx.send(result).await.is_err() {
                        break;
                    }
                }
            });
        }

        let handle = PipelineHandle {
            stop,
            results,
            grace: self.config.stop_grace,
        };
        (handle, out_rx)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Synchronous frame intake: read, classify, segment. Blocks only on the
/// source; overflow reads are dropped and logged.
fn ingest_loop(
    mut source: Box<dyn FrameSource>,
    mut segmenter: Segmenter,
    segments: mpsc::UnboundedSender<Segment>,
    stop: Arc<AtomicBool>,
) {
    if let Err(e) = source.start() {
        eprintln!("sotto: audio source failed to start: {}", e);
        return;
    }

    let mut sequence = 0u64;
    while !stop.load(Ordering::SeqCst) {
        match source.read_frame() {
            Ok(Some(samples)) => {
                let frame = Frame::new(sequence, samples);
                sequence += 1;
                if let Some(segment) = segmenter.offer(&frame)
                    && segments.send(segment).is_err()
                {
                    break;
                }
                if segmenter.state() == SegmenterState::StreamEnded {
                    break;
                }
            }
            Ok(None) => break,
            Err(SottoError::FrameOverflow) => {
                eprintln!("sotto: input overflowed, frame dropped");
            }
            Err(e) => {
                eprintln!("sotto: frame read failed: {}", e);
                break;
            }
        }
    }

    // A trailing partial utterance still gets transcribed.
    if let Some(segment) = segmenter.finish() {
        segments.send(segment).ok();
    }
    if let Err(e) = source.stop() {
        eprintln!("sotto: audio source failed to stop: {}", e);
    }
}
