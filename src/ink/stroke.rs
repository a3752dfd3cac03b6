//! Measured ink outlines.
//!
//! A [`Stroke`] caches its arc length and evenly spaced pen samples, so per-frame reveal never
//! walks the geometry again.

use kurbo::{ParamCurve, ParamCurveArclen, PathSeg, Shape};

use crate::foundation::core::{BezPath, Point, Rect, Rgb8};
use crate::foundation::math::{lerp_point, unit_clamp};

/// Accuracy (in source pixels) used for arc-length queries.
pub(crate) const ARCLEN_ACCURACY: f64 = 1e-3;

/// One traced outline, treated as a unit of ink.
#[derive(Clone, Debug)]
pub struct Stroke {
    geometry: BezPath,
    arc_length: f64,
    color: Rgb8,
    bounds: Rect,
    sample_points: Vec<Point>,
}

impl Stroke {
    /// Measure `geometry` and precompute `sample_count` pen positions (at least 2).
    pub fn new(geometry: BezPath, color: Rgb8, sample_count: usize) -> Self {
        let arc_length = path_arc_length(&geometry);
        let bounds = geometry.bounding_box();
        let sample_points = sample_evenly(&geometry, arc_length, sample_count.max(2));
        Self {
            geometry,
            arc_length,
            color,
            bounds,
            sample_points,
        }
    }

    pub fn geometry(&self) -> &BezPath {
        &self.geometry
    }

    pub fn arc_length(&self) -> f64 {
        self.arc_length
    }

    pub fn color(&self) -> Rgb8 {
        self.color
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn sample_points(&self) -> &[Point] {
        &self.sample_points
    }

    /// Pen position after `drawn` units of this stroke, interpolated between the two nearest
    /// precomputed samples (no geometry walk).
    pub fn pen_at(&self, drawn: f64) -> Point {
        let n = self.sample_points.len();
        if n == 0 {
            return self.bounds.center();
        }
        let ratio = if self.arc_length > 0.0 {
            unit_clamp(drawn / self.arc_length)
        } else {
            0.0
        };
        let pos = ratio * ((n - 1) as f64);
        let i0 = (pos.floor() as usize).min(n - 1);
        let i1 = (i0 + 1).min(n - 1);
        lerp_point(self.sample_points[i0], self.sample_points[i1], pos - i0 as f64)
    }

    /// Final pen position of this stroke.
    pub fn end_point(&self) -> Point {
        self.pen_at(self.arc_length)
    }

    /// The first `length` units of the outline, i.e. what a dash pattern of
    /// `[length, arc_length]` at offset 0 would stroke.
    pub fn outline_prefix(&self, length: f64) -> BezPath {
        path_prefix(&self.geometry, length)
    }
}

/// Total outline length, including implicit closing segments.
pub fn path_arc_length(path: &BezPath) -> f64 {
    path.segments().map(|seg| seg.arclen(ARCLEN_ACCURACY)).sum()
}

/// Point at arc length `distance` along `path`, clamped to its ends.
pub fn point_at_length(path: &BezPath, distance: f64) -> Option<Point> {
    let mut remaining = distance.max(0.0);
    let mut last = None;
    for seg in path.segments() {
        let len = seg.arclen(ARCLEN_ACCURACY);
        if remaining <= len {
            let t = seg.inv_arclen(remaining, ARCLEN_ACCURACY);
            return Some(seg.eval(t));
        }
        remaining -= len;
        last = Some(seg.end());
    }
    last.or_else(|| first_point(path))
}

/// Prefix of `path` with arc length `length`; the whole path when `length` exceeds it.
pub fn path_prefix(path: &BezPath, length: f64) -> BezPath {
    if length <= 0.0 {
        return BezPath::new();
    }

    let mut remaining = length;
    let mut segs: Vec<PathSeg> = Vec::new();
    for seg in path.segments() {
        let len = seg.arclen(ARCLEN_ACCURACY);
        if remaining >= len {
            segs.push(seg);
            remaining -= len;
            continue;
        }
        if remaining > 0.0 {
            let t = seg.inv_arclen(remaining, ARCLEN_ACCURACY);
            segs.push(seg.subsegment(0.0..t));
        }
        break;
    }
    BezPath::from_path_segments(segs.into_iter())
}

fn sample_evenly(path: &BezPath, arc_length: f64, count: usize) -> Vec<Point> {
    let Some(start) = first_point(path) else {
        return Vec::new();
    };
    (0..count)
        .map(|i| {
            let d = arc_length * (i as f64) / ((count - 1) as f64);
            point_at_length(path, d).unwrap_or(start)
        })
        .collect()
}

fn first_point(path: &BezPath) -> Option<Point> {
    path.elements().iter().find_map(|el| match *el {
        kurbo::PathEl::MoveTo(p) => Some(p),
        _ => None,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/ink/stroke.rs"]
mod tests;
