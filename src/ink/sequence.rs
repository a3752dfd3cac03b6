//! Filtering and reading-order sequencing of traced outlines.

use crate::foundation::core::{Canvas, Rect, Rgb8};
use crate::foundation::error::{QuillError, QuillResult};
use crate::ink::palette::{PaletteConfig, normalize_color};
use crate::ink::stroke::{Stroke, path_arc_length};
use crate::trace::TracedPath;

/// Thresholds for stroke filtering and ordering.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SequencerConfig {
    /// Outlines shorter than this (source px) are dropped as specks.
    pub min_arc_length: f64,
    /// Pen samples precomputed per stroke.
    pub sample_points: usize,
    /// Fraction of canvas width or height a black edge artifact must span.
    pub artifact_coverage: f64,
    /// Distance (source px) within which a stroke counts as touching a canvas edge.
    pub artifact_edge_margin: f64,
    /// Vertical band (source px) within which strokes are treated as one line of drawing.
    pub line_tolerance: f64,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            min_arc_length: 2.0,
            sample_points: 16,
            artifact_coverage: 0.9,
            artifact_edge_margin: 4.0,
            line_tolerance: 48.0,
        }
    }
}

impl SequencerConfig {
    pub fn validate(&self) -> QuillResult<()> {
        if !self.min_arc_length.is_finite() || self.min_arc_length < 0.0 {
            return Err(QuillError::validation(
                "sequencer.min_arc_length must be finite and >= 0",
            ));
        }
        if !(2..=64).contains(&self.sample_points) {
            return Err(QuillError::validation(
                "sequencer.sample_points must be in 2..=64",
            ));
        }
        if !(self.artifact_coverage > 0.0 && self.artifact_coverage <= 1.0) {
            return Err(QuillError::validation(
                "sequencer.artifact_coverage must be in (0, 1]",
            ));
        }
        if !self.artifact_edge_margin.is_finite() || self.artifact_edge_margin < 0.0 {
            return Err(QuillError::validation(
                "sequencer.artifact_edge_margin must be finite and >= 0",
            ));
        }
        if !self.line_tolerance.is_finite() || self.line_tolerance < 0.0 {
            return Err(QuillError::validation(
                "sequencer.line_tolerance must be finite and >= 0",
            ));
        }
        Ok(())
    }
}

/// Counts of traced outlines dropped per reason.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct SequenceStats {
    pub traced: usize,
    pub background: usize,
    pub degenerate: usize,
    pub artifacts: usize,
    pub kept: usize,
}

/// Ordered strokes ready to be wrapped into a scene asset.
#[derive(Clone, Debug, Default)]
pub struct SequencedStrokes {
    pub strokes: Vec<Stroke>,
    pub total_arc_length: f64,
    pub stats: SequenceStats,
}

/// Normalize, filter and order tracer output into a drawing sequence.
///
/// Output depends only on the inputs: identical paths in identical order always produce the
/// same stroke sequence.
pub fn sequence_strokes(
    paths: Vec<TracedPath>,
    canvas: Canvas,
    palette: &PaletteConfig,
    cfg: &SequencerConfig,
) -> SequencedStrokes {
    let mut stats = SequenceStats {
        traced: paths.len(),
        ..SequenceStats::default()
    };

    let mut kept: Vec<(usize, Stroke)> = Vec::with_capacity(paths.len());
    for (index, path) in paths.into_iter().enumerate() {
        let Some(color) = normalize_color(&path.fill, palette) else {
            stats.background += 1;
            continue;
        };

        let len = path_arc_length(&path.geometry);
        if !len.is_finite() || len < cfg.min_arc_length {
            stats.degenerate += 1;
            continue;
        }

        let stroke = Stroke::new(path.geometry, color, cfg.sample_points);
        if !is_finite_rect(stroke.bounds()) {
            stats.degenerate += 1;
            continue;
        }
        if is_edge_artifact(&stroke, canvas, cfg) {
            stats.artifacts += 1;
            continue;
        }
        kept.push((index, stroke));
    }

    let strokes = reading_order(kept, cfg.line_tolerance);
    let total_arc_length = strokes.iter().map(Stroke::arc_length).sum();
    stats.kept = strokes.len();

    tracing::debug!(
        traced = stats.traced,
        background = stats.background,
        degenerate = stats.degenerate,
        artifacts = stats.artifacts,
        kept = stats.kept,
        total_arc_length,
        "sequenced strokes"
    );

    SequencedStrokes {
        strokes,
        total_arc_length,
        stats,
    }
}

/// Black outlines hugging a canvas edge across most of its span are tracer letterboxing.
pub fn is_edge_artifact(stroke: &Stroke, canvas: Canvas, cfg: &SequencerConfig) -> bool {
    if stroke.color() != Rgb8::BLACK || canvas.is_empty() {
        return false;
    }
    let b = stroke.bounds();
    let cw = f64::from(canvas.width);
    let ch = f64::from(canvas.height);

    let spans = b.width() >= cw * cfg.artifact_coverage || b.height() >= ch * cfg.artifact_coverage;
    if !spans {
        return false;
    }
    let m = cfg.artifact_edge_margin;
    b.x0 <= m || b.y0 <= m || b.x1 >= cw - m || b.y1 >= ch - m
}

fn reading_order(mut strokes: Vec<(usize, Stroke)>, line_tolerance: f64) -> Vec<Stroke> {
    strokes.sort_by(|(ia, a), (ib, b)| a.bounds().y0.total_cmp(&b.bounds().y0).then(ia.cmp(ib)));

    let mut keyed: Vec<(usize, usize, Stroke)> = Vec::with_capacity(strokes.len());
    let mut band = 0usize;
    let mut band_top: Option<f64> = None;
    for (index, stroke) in strokes {
        let top = stroke.bounds().y0;
        match band_top {
            Some(t) if top - t < line_tolerance => {}
            Some(_) => {
                band += 1;
                band_top = Some(top);
            }
            None => band_top = Some(top),
        }
        keyed.push((band, index, stroke));
    }

    keyed.sort_by(|(band_a, ia, a), (band_b, ib, b)| {
        band_a
            .cmp(band_b)
            .then(a.bounds().x0.total_cmp(&b.bounds().x0))
            .then(a.bounds().y0.total_cmp(&b.bounds().y0))
            .then(ia.cmp(ib))
    });
    keyed.into_iter().map(|(_, _, s)| s).collect()
}

fn is_finite_rect(r: Rect) -> bool {
    r.x0.is_finite() && r.y0.is_finite() && r.x1.is_finite() && r.y1.is_finite()
}

#[cfg(test)]
#[path = "../../tests/unit/ink/sequence.rs"]
mod tests;
