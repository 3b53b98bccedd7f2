use crate::error::{Result, SottoError};
use std::collections::VecDeque;

/// Trait for fixed-size PCM frame producers.
///
/// This trait allows swapping implementations (microphone, WAV file, mock).
/// Frames are 16-bit PCM, mono, at the rate the source was opened with.
pub trait FrameSource: Send {
    /// Start producing frames.
    fn start(&mut self) -> Result<()>;

    /// Stop producing frames.
    fn stop(&mut self) -> Result<()>;

    /// Blocking read of the next frame.
    ///
    /// # Returns
    /// * `Ok(Some(samples))` - one frame of up to the configured size
    /// * `Ok(None)` - end of stream, no more frames will arrive
    /// * `Err(SottoError::FrameOverflow)` - a frame was lost at the source;
    ///   recoverable, the caller drops it and reads again
    fn read_frame(&mut self) -> Result<Option<Vec<i16>>>;
}

/// One scripted read served by [`ScriptedFrameSource`].
#[derive(Debug, Clone)]
pub enum ScriptedRead {
    /// A frame of samples.
    Frame(Vec<i16>),
    /// A simulated input overrun.
    Overflow,
}

/// Frame source for tests: serves a fixed sequence of reads, then ends.
#[derive(Debug, Clone, Default)]
pub struct ScriptedFrameSource {
    reads: VecDeque<ScriptedRead>,
    started: bool,
}

impl ScriptedFrameSource {
    /// Create an empty scripted source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source that serves the given frames in order.
    pub fn with_frames(frames: Vec<Vec<i16>>) -> Self {
        Self {
            reads: frames.into_iter().map(ScriptedRead::Frame).collect(),
            started: false,
        }
    }

    /// Append a frame to the script.
    pub fn frame(mut self, samples: Vec<i16>) -> Self {
        self.reads.push_back(ScriptedRead::Frame(samples));
        self
    }

    /// Append `count` copies of the same frame to the script.
    pub fn frames(mut self, samples: Vec<i16>, count: usize) -> Self {
        for _ in 0..count {
            self.reads.push_back(ScriptedRead::Frame(samples.clone()));
        }
        self
    }

    /// Append a simulated overflow to the script.
    pub fn overflow(mut self) -> Self {
        self.reads.push_back(ScriptedRead::Overflow);
        self
    }

    /// True once `start` has been called.
    pub fn is_started(&self) -> bool {
        self.started
    }
}

impl FrameSource for ScriptedFrameSource {
    fn start(&mut self) -> Result<()> {
        self.started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.started = false;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<Vec<i16>>> {
        match self.reads.pop_front() {
            Some(ScriptedRead::Frame(samples)) => Ok(Some(samples)),
            Some(ScriptedRead::Overflow) => Err(SottoError::FrameOverflow),
            None => Ok(None),
        }
    }
}
