//! Progressive reveal: which strokes are drawn at a given instant of a scene.
//!
//! Everything here is a pure function of the stroke list and the scene-relative time, so two
//! independent passes over the same samples always agree.

use std::path::PathBuf;

use crate::animation::ease::Ease;
use crate::foundation::core::Point;
use crate::foundation::error::{QuillError, QuillResult};
use crate::foundation::math::unit_clamp;
use crate::ink::stroke::Stroke;

/// Timing and pen styling of the drawing animation.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RevealConfig {
    /// Share of each scene spent drawing; the rest holds the finished picture.
    pub draw_fraction: f64,
    /// Lower bound for the drawing phase, capped by the scene length.
    pub min_draw_secs: f64,
    pub ease: Ease,
    /// On-screen width of the active stroke, independent of the fit scale.
    pub pen_width_px: f64,
    /// Draw a pen cursor while drawing.
    pub show_pen: bool,
    /// Optional sprite drawn at the pen position instead of a marker dot.
    pub pen_sprite: Option<PathBuf>,
    /// Sprite edge length as a fraction of the frame height.
    pub pen_sprite_scale: f64,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            draw_fraction: 0.9,
            min_draw_secs: 0.5,
            ease: Ease::InOutQuad,
            pen_width_px: 14.0,
            show_pen: true,
            pen_sprite: None,
            pen_sprite_scale: 0.22,
        }
    }
}

impl RevealConfig {
    pub fn validate(&self) -> QuillResult<()> {
        if !(0.5..=1.0).contains(&self.draw_fraction) {
            return Err(QuillError::validation(
                "reveal.draw_fraction must be in 0.5..=1.0",
            ));
        }
        if !self.min_draw_secs.is_finite() || self.min_draw_secs < 0.0 {
            return Err(QuillError::validation(
                "reveal.min_draw_secs must be finite and >= 0",
            ));
        }
        if !self.pen_width_px.is_finite() || self.pen_width_px <= 0.0 {
            return Err(QuillError::validation("reveal.pen_width_px must be > 0"));
        }
        if !(self.pen_sprite_scale > 0.0 && self.pen_sprite_scale <= 1.0) {
            return Err(QuillError::validation(
                "reveal.pen_sprite_scale must be in (0, 1]",
            ));
        }
        Ok(())
    }

    /// Length of the drawing phase of a scene lasting `visual_duration` seconds.
    pub fn draw_duration(&self, visual_duration: f64) -> f64 {
        let visual = visual_duration.max(0.0);
        (visual * self.draw_fraction).max(self.min_draw_secs.min(visual))
    }
}

/// The stroke currently being drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveStroke {
    pub index: usize,
    /// Drawn outline length, in `(0, arc_length)`.
    pub drawn: f64,
}

/// Reveal progress of one scene at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RevealState {
    /// Un-eased drawing progress in `[0, 1]`.
    pub linear: f64,
    /// Eased drawing progress in `[0, 1]`; exactly 1 once drawing is over.
    pub eased: f64,
    pub target_length: f64,
    /// Strokes `0..fully_drawn` are complete.
    pub fully_drawn: usize,
    pub active: Option<ActiveStroke>,
    /// Pen position in source space; `None` once drawing is over.
    pub pen: Option<Point>,
}

impl RevealState {
    /// Whether every stroke is complete.
    pub fn is_complete(&self, stroke_count: usize) -> bool {
        self.fully_drawn == stroke_count && self.active.is_none()
    }
}

/// Reveal `strokes` after `elapsed` seconds of a drawing phase lasting `draw_duration`.
///
/// A stroke is fully drawn when the length accumulated through it is within the target
/// (`acc + len <= target`), so boundaries land on complete strokes.
pub fn reveal_at(strokes: &[Stroke], elapsed: f64, draw_duration: f64, ease: Ease) -> RevealState {
    let linear = if draw_duration <= 0.0 || elapsed >= draw_duration {
        1.0
    } else {
        unit_clamp(elapsed / draw_duration)
    };
    let eased = if linear >= 1.0 { 1.0 } else { unit_clamp(ease.apply(linear)) };

    let total: f64 = strokes.iter().map(Stroke::arc_length).sum();
    let target_length = total * eased;

    let (fully_drawn, active) = if eased >= 1.0 {
        (strokes.len(), None)
    } else {
        walk(strokes, target_length)
    };

    let pen = if linear >= 1.0 || strokes.is_empty() {
        None
    } else {
        Some(match active {
            Some(a) => strokes[a.index].pen_at(a.drawn),
            None if fully_drawn > 0 => strokes[fully_drawn - 1].end_point(),
            None => strokes[0].pen_at(0.0),
        })
    };

    RevealState {
        linear,
        eased,
        target_length,
        fully_drawn,
        active,
        pen,
    }
}

fn walk(strokes: &[Stroke], target: f64) -> (usize, Option<ActiveStroke>) {
    let mut acc = 0.0;
    for (index, stroke) in strokes.iter().enumerate() {
        let len = stroke.arc_length();
        if acc + len <= target {
            acc += len;
            continue;
        }
        if acc < target {
            return (
                index,
                Some(ActiveStroke {
                    index,
                    drawn: target - acc,
                }),
            );
        }
        return (index, None);
    }
    (strokes.len(), None)
}

#[cfg(test)]
#[path = "../../tests/unit/render/reveal.rs"]
mod tests;
