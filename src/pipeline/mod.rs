//! Real-time segmentation and ordered concurrent transcription.
//!
//! One synchronous ingestion loop segments the incoming frame stream on
//! voice activity; each finalized segment is transcribed on its own task;
//! results are released to the consumer strictly in utterance order no
//! matter which transcription finishes first.

pub mod controller;
pub mod frame;
pub mod reorder;
pub mod segmenter;
pub mod workers;
