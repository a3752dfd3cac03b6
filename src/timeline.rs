//! Scene scheduling from narration durations.

use crate::foundation::core::SceneId;
use crate::foundation::error::{QuillError, QuillResult};

/// How visual durations are derived from narration durations.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TimelinePolicy {
    /// Each scene lasts its narration plus a fixed hold.
    Natural {
        #[serde(default = "default_padding_secs")]
        padding_secs: f64,
    },
    /// Narration durations are stretched so the whole video lasts `target_secs`.
    ///
    /// The stretch factor never drops below 1, so a scene is never shorter than its narration.
    ScaledToTarget { target_secs: f64 },
}

fn default_padding_secs() -> f64 {
    1.5
}

impl Default for TimelinePolicy {
    fn default() -> Self {
        Self::Natural {
            padding_secs: default_padding_secs(),
        }
    }
}

impl TimelinePolicy {
    pub fn validate(&self) -> QuillResult<()> {
        match *self {
            Self::Natural { padding_secs } => {
                if !padding_secs.is_finite() || padding_secs < 0.0 {
                    return Err(QuillError::validation(
                        "timeline padding_secs must be finite and >= 0",
                    ));
                }
            }
            Self::ScaledToTarget { target_secs } => {
                if !target_secs.is_finite() || target_secs <= 0.0 {
                    return Err(QuillError::validation(
                        "timeline target_secs must be finite and > 0",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// One scheduled scene.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct TimelineEntry {
    pub id: SceneId,
    pub narration_duration: f64,
    pub start_time: f64,
    pub visual_duration: f64,
}

impl TimelineEntry {
    pub fn end_time(&self) -> f64 {
        self.start_time + self.visual_duration
    }
}

/// Contiguous, immutable schedule of scenes.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
    total_duration: f64,
}

impl Timeline {
    /// Schedule scenes in the given order.
    ///
    /// Every narration duration must be known up front.
    pub fn build(narrations: &[(SceneId, f64)], policy: TimelinePolicy) -> QuillResult<Self> {
        policy.validate()?;
        if narrations.is_empty() {
            return Err(QuillError::validation("timeline needs at least one scene"));
        }
        for (id, d) in narrations {
            if !d.is_finite() || *d < 0.0 {
                return Err(QuillError::validation(format!(
                    "narration duration of {id} must be finite and >= 0, got {d}"
                )));
            }
        }
        let mut ids: Vec<SceneId> = narrations.iter().map(|(id, _)| *id).collect();
        ids.sort_unstable();
        if ids.windows(2).any(|w| w[0] == w[1]) {
            return Err(QuillError::validation("timeline scene ids must be unique"));
        }

        let (factor, padding) = match policy {
            TimelinePolicy::Natural { padding_secs } => (1.0, padding_secs),
            TimelinePolicy::ScaledToTarget { target_secs } => {
                let sum: f64 = narrations.iter().map(|(_, d)| d).sum();
                if sum <= 0.0 {
                    return Err(QuillError::validation(
                        "scaled_to_target needs a positive total narration duration",
                    ));
                }
                let factor = target_secs / sum;
                if factor < 1.0 {
                    tracing::warn!(
                        target_secs,
                        narration_secs = sum,
                        "target shorter than the narration, keeping natural scene lengths"
                    );
                }
                (factor.max(1.0), 0.0)
            }
        };

        let mut entries = Vec::with_capacity(narrations.len());
        let mut start = 0.0;
        for &(id, narration_duration) in narrations {
            let visual_duration = narration_duration * factor + padding;
            entries.push(TimelineEntry {
                id,
                narration_duration,
                start_time: start,
                visual_duration,
            });
            start += visual_duration;
        }

        Ok(Self {
            entries,
            total_duration: start,
        })
    }

    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimelineEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, id: SceneId) -> Option<&TimelineEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// The entry whose `[start, start + visual)` contains `t`.
    pub fn scene_at(&self, t: f64) -> Option<&TimelineEntry> {
        if !t.is_finite() || t < 0.0 || t >= self.total_duration {
            return None;
        }
        let idx = self.entries.partition_point(|e| e.start_time <= t);
        let e = self.entries.get(idx.checked_sub(1)?)?;
        (t < e.end_time()).then_some(e)
    }
}

#[cfg(test)]
#[path = "../tests/unit/timeline.rs"]
mod tests;
