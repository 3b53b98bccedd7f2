//! Ordered release of out-of-order transcription results.
//!
//! Workers push results in completion order; the single drain consumer
//! receives them strictly in segment-index order. The buffer is the only
//! synchronized shared structure in the pipeline.

use crate::pipeline::frame::SegmentTranscription;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct ReorderState {
    /// Results that arrived ahead of their release turn, keyed by index.
    pending: BTreeMap<u64, SegmentTranscription>,
    /// Next index to release; only ever increases.
    next_index: u64,
    /// Indices below this are owned by a worker (submitted, result owed).
    submitted: u64,
    /// Total segment count, known once the segmenter has ended.
    expected_total: Option<u64>,
    /// Stop requested; release what is ready, then end.
    cancelled: bool,
}

/// Buffer that re-orders concurrently completing results by segment index.
#[derive(Debug, Default)]
pub struct ReorderBuffer {
    state: Mutex<ReorderState>,
    notify: Notify,
}

impl ReorderBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A panicking worker cannot corrupt the map (entries are inserted
    /// whole), so a poisoned lock is safe to recover.
    fn lock(&self) -> MutexGuard<'_, ReorderState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record that the segment with this index has been handed to a worker.
    ///
    /// The drain only substitutes a timeout placeholder for indices it knows
    /// a worker owes a result for.
    pub fn reserve(&self, index: u64) {
        let mut state = self.lock();
        state.submitted = state.submitted.max(index + 1);
    }

    /// Insert a result in arrival order.
    ///
    /// A duplicate push, whether for an index already released or already
    /// pending, is logged and discarded; the release sequence never changes.
    pub fn push(&self, result: SegmentTranscription) {
        let index = result.index;
        {
            let mut state = self.lock();
            if index < state.next_index {
                eprintln!("sotto: late result for released segment {}, discarding", index);
                return;
            }
            if let Some(first) = state.pending.insert(index, result) {
                eprintln!("sotto: duplicate result for pending segment {}, keeping first", index);
                state.pending.insert(index, first);
                return;
            }
        }
        self.notify.notify_waiters();
    }

    /// All segments have been submitted; `total` is the final count.
    pub fn close(&self, total: u64) {
        {
            let mut state = self.lock();
            state.expected_total = Some(total);
            state.submitted = state.submitted.max(total);
        }
        self.notify.notify_waiters();
    }

    /// Request an early end: remaining ready results still drain in order,
    /// but nothing new is waited for.
    pub fn cancel(&self) {
        self.lock().cancelled = true;
        self.notify.notify_waiters();
    }

    /// Number of results parked out of order.
    pub fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }

    /// Next index the drain will release.
    pub fn next_expected(&self) -> u64 {
        self.lock().next_index
    }

    /// Release the next in-order result, waiting for it if necessary.
    ///
    /// Returns `None` when the sequence is complete or cancelled. If the
    /// result owed for the next index does not arrive within `max_wait`,
    /// an error placeholder is released in its place so one unresponsive
    /// worker can never stall the sequence.
    pub async fn next(&self, max_wait: Duration) -> Option<SegmentTranscription> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                let index = state.next_index;
                if let Some(result) = state.pending.remove(&index) {
                    state.next_index += 1;
                    return Some(result);
                }
                if let Some(total) = state.expected_total
                    && index >= total
                {
                    return None;
                }
                if state.cancelled {
                    return None;
                }
            }

            if tokio::time::timeout(max_wait, notified).await.is_err() {
                let mut state = self.lock();
                let index = state.next_index;
                if state.pending.contains_key(&index) {
                    continue; // arrived while re-acquiring the lock
                }
                if index < state.submitted {
                    eprintln!("sotto: segment {} produced no result in time", index);
                    state.next_index += 1;
                    return Some(SegmentTranscription::failed(
                        index,
                        format!("no result within {:?}", max_wait),
                    ));
                }
                // Nothing owed for this index yet; keep waiting.
            }
        }
    }
}
