use crate::audio::mix::frame_to_sample;
use crate::foundation::core::Fps;
use crate::foundation::error::{QuillError, QuillResult};

/// Playback position of the narration track, the single time source of an export.
pub trait AudioClock {
    /// Current audio position in seconds.
    fn position_secs(&self) -> f64;
    /// Advance to the next output frame tick.
    fn tick(&mut self);
    /// Stop the audio source; the position no longer advances.
    fn stop(&mut self);
}

/// Offline clock over the muxed audio track.
///
/// Positions are whole sample counts of the track at each frame tick, so the frame times match
/// the audio the encoder receives and cannot drift from it.
#[derive(Clone, Debug)]
pub struct SampleClock {
    fps: Fps,
    sample_rate: u32,
    frame: u64,
    stopped: bool,
}

impl SampleClock {
    pub fn new(fps: Fps, sample_rate: u32) -> QuillResult<Self> {
        if fps.num == 0 || fps.den == 0 {
            return Err(QuillError::validation("clock fps must be non-zero"));
        }
        if sample_rate == 0 {
            return Err(QuillError::validation("clock sample_rate must be non-zero"));
        }
        Ok(Self {
            fps,
            sample_rate,
            frame: 0,
            stopped: false,
        })
    }

    /// Audio sample position of the current tick.
    pub fn sample_position(&self) -> u64 {
        frame_to_sample(self.frame, self.fps, self.sample_rate)
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl AudioClock for SampleClock {
    fn position_secs(&self) -> f64 {
        self.sample_position() as f64 / f64::from(self.sample_rate)
    }

    fn tick(&mut self) {
        if !self.stopped {
            self.frame += 1;
        }
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/clock.rs"]
mod tests;
