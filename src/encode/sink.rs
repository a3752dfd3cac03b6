use std::path::PathBuf;

use crate::foundation::core::{Fps, FrameIndex, FrameRGBA};
use crate::foundation::error::QuillResult;

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
    /// Optional external raw PCM audio to mux alongside the frames.
    pub audio: Option<AudioInputConfig>,
}

/// Raw PCM audio input for sinks that encode audio.
#[derive(Debug, Clone)]
pub struct AudioInputConfig {
    /// Path to interleaved `f32le` PCM data.
    pub path: PathBuf,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Consumer of rendered frames in timeline order.
///
/// `push_frame` is called with strictly increasing indices. A session ends with exactly one of
/// `end` (output complete) or `abort` (output discarded).
pub trait FrameSink: Send {
    fn begin(&mut self, cfg: SinkConfig) -> QuillResult<()>;
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> QuillResult<()>;
    fn end(&mut self) -> QuillResult<()>;
    /// Stop encoding and discard partial output.
    fn abort(&mut self) -> QuillResult<()>;
}

/// In-memory sink for tests and previews.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameRGBA)>,
    ended: bool,
    aborted: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> QuillResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        self.aborted = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> QuillResult<()> {
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> QuillResult<()> {
        self.ended = true;
        Ok(())
    }

    fn abort(&mut self) -> QuillResult<()> {
        self.frames.clear();
        self.aborted = true;
        Ok(())
    }
}
