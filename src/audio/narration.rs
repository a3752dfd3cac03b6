use std::path::Path;
use std::sync::Arc;

use crate::foundation::error::{QuillError, QuillResult};

/// Sample rate narration is decoded to and mixed at.
pub const NARRATION_SAMPLE_RATE: u32 = 24_000;

/// A decoded mono narration clip.
#[derive(Clone, Debug)]
pub struct NarrationClip {
    sample_rate: u32,
    samples: Arc<Vec<f32>>,
}

impl NarrationClip {
    pub fn from_samples(sample_rate: u32, samples: Vec<f32>) -> QuillResult<Self> {
        if sample_rate == 0 {
            return Err(QuillError::validation("narration sample_rate must be > 0"));
        }
        Ok(Self {
            sample_rate,
            samples: Arc::new(samples),
        })
    }

    /// A silent clip lasting `secs` (rounded to whole samples).
    pub fn silence(sample_rate: u32, secs: f64) -> QuillResult<Self> {
        if !secs.is_finite() || secs < 0.0 {
            return Err(QuillError::validation("silence duration must be finite and >= 0"));
        }
        let n = (secs * f64::from(sample_rate)).round() as usize;
        Self::from_samples(sample_rate, vec![0.0; n])
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }
}

/// Decode any audio file ffmpeg understands into a mono clip at `sample_rate`.
pub fn decode_narration(path: &Path, sample_rate: u32) -> QuillResult<NarrationClip> {
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "1",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| {
            QuillError::asset_load(format!("failed to run ffmpeg for narration decode: {e}"))
        })?;

    if !out.status.success() {
        return Err(QuillError::asset_load(format!(
            "ffmpeg narration decode failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    NarrationClip::from_samples(sample_rate, f32le_to_samples(&out.stdout)?)
}

pub(crate) fn f32le_to_samples(bytes: &[u8]) -> QuillResult<Vec<f32>> {
    if !bytes.len().is_multiple_of(4) {
        return Err(QuillError::asset_load(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

#[cfg(test)]
#[path = "../../tests/unit/audio/narration.rs"]
mod tests;
