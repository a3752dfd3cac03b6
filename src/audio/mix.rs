use std::path::Path;

use crate::audio::narration::NarrationClip;
use crate::foundation::core::{Fps, SceneId};
use crate::foundation::error::{QuillError, QuillResult};
use crate::timeline::Timeline;

/// Mix every scene's narration into one mono track covering the whole timeline.
///
/// Each clip starts at `floor(start_time * sample_rate)`; clips at another rate are resampled
/// linearly. Scenes without a clip stay silent.
pub fn mix_narration<'a>(
    timeline: &Timeline,
    clip_for: impl Fn(SceneId) -> Option<&'a NarrationClip>,
    sample_rate: u32,
) -> Vec<f32> {
    let total = (timeline.total_duration() * f64::from(sample_rate)).ceil().max(0.0) as usize;
    let mut out = vec![0.0f32; total];

    for entry in timeline.iter() {
        let Some(clip) = clip_for(entry.id) else {
            continue;
        };
        let start = (entry.start_time * f64::from(sample_rate)).floor() as usize;
        mix_clip(&mut out, start, clip, sample_rate);
    }

    for s in &mut out {
        *s = s.clamp(-1.0, 1.0);
    }
    out
}

fn mix_clip(out: &mut [f32], start: usize, clip: &NarrationClip, sample_rate: u32) {
    let src = clip.samples();
    if src.is_empty() || start >= out.len() {
        return;
    }

    if clip.sample_rate() == sample_rate {
        for (d, s) in out[start..].iter_mut().zip(src) {
            *d += *s;
        }
        return;
    }

    let ratio = f64::from(clip.sample_rate()) / f64::from(sample_rate);
    for (rel, d) in out[start..].iter_mut().enumerate() {
        let pos = rel as f64 * ratio;
        let i0 = pos.floor() as usize;
        if i0 >= src.len() {
            break;
        }
        let i1 = (i0 + 1).min(src.len() - 1);
        let frac = (pos - i0 as f64) as f32;
        *d += src[i0] + (src[i1] - src[i0]) * frac;
    }
}

/// Write mono `f32` PCM samples to a raw little-endian `.f32le` file.
pub fn write_mix_to_f32le_file(samples: &[f32], out_path: &Path) -> QuillResult<()> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            QuillError::encode(format!(
                "failed to create audio mix output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }

    let mut bytes = Vec::<u8>::with_capacity(samples.len() * 4);
    for &sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes).map_err(|e| {
        QuillError::encode(format!(
            "failed to write mixed audio file '{}': {e}",
            out_path.display()
        ))
    })
}

/// Sample position of `frame` at `sample_rate`, rounded to the nearest sample.
pub fn frame_to_sample(frame: u64, fps: Fps, sample_rate: u32) -> u64 {
    let num = u128::from(frame) * u128::from(sample_rate) * u128::from(fps.den);
    let den = u128::from(fps.num);
    ((num + (den / 2)) / den) as u64
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mix.rs"]
mod tests;
