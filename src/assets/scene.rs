use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::assets::decode::SourceBitmap;
use crate::foundation::core::{Canvas, Rect, SceneId};
use crate::foundation::error::QuillResult;
use crate::ink::palette::PaletteConfig;
use crate::ink::sequence::{SequenceStats, SequencedStrokes, SequencerConfig, sequence_strokes};
use crate::ink::stroke::Stroke;
use crate::trace::{TraceOptions, Tracer, trace_with_timeout};

/// How a scene will be drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// Ordered strokes revealed progressively.
    Vector,
    /// Tracing failed; the bitmap is shown as-is.
    RasterOnly,
    /// Nothing to draw; frames show the background only.
    Blank,
}

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// Immutable per-scene drawing data.
#[derive(Clone, Debug)]
pub struct SceneAsset {
    id: SceneId,
    generation: u64,
    kind: AssetKind,
    canvas: Canvas,
    strokes: Vec<Stroke>,
    total_arc_length: f64,
    content_bounds: Rect,
    raster: Option<Arc<SourceBitmap>>,
    stats: SequenceStats,
}

impl SceneAsset {
    /// Wrap sequenced strokes drawn in source space `canvas`.
    pub fn from_strokes(id: SceneId, canvas: Canvas, seq: SequencedStrokes) -> Self {
        let content_bounds = seq
            .strokes
            .iter()
            .map(Stroke::bounds)
            .reduce(|a, b| a.union(b))
            .filter(|r| r.area() > 0.0)
            .unwrap_or_else(|| canvas.rect());
        Self {
            id,
            generation: next_generation(),
            kind: AssetKind::Vector,
            canvas,
            strokes: seq.strokes,
            total_arc_length: seq.total_arc_length,
            content_bounds,
            raster: None,
            stats: seq.stats,
        }
    }

    /// Fallback asset that shows the untraced bitmap.
    pub fn raster_only(id: SceneId, bitmap: Arc<SourceBitmap>) -> Self {
        let canvas = bitmap.canvas();
        Self {
            id,
            generation: next_generation(),
            kind: AssetKind::RasterOnly,
            canvas,
            strokes: Vec::new(),
            total_arc_length: 0.0,
            content_bounds: canvas.rect(),
            raster: Some(bitmap),
            stats: SequenceStats::default(),
        }
    }

    /// Fallback asset with nothing to draw.
    pub fn blank(id: SceneId, canvas: Canvas) -> Self {
        Self {
            id,
            generation: next_generation(),
            kind: AssetKind::Blank,
            canvas,
            strokes: Vec::new(),
            total_arc_length: 0.0,
            content_bounds: canvas.rect(),
            raster: None,
            stats: SequenceStats::default(),
        }
    }

    pub fn id(&self) -> SceneId {
        self.id
    }

    /// Process-unique build stamp; two assets built separately never share one, even under
    /// the same scene id. Clones keep it.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Strokes in draw order.
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    /// Sum of stroke lengths in draw order.
    pub fn total_arc_length(&self) -> f64 {
        self.total_arc_length
    }

    /// Union of stroke bounds, or the whole canvas when there are no strokes.
    pub fn content_bounds(&self) -> Rect {
        self.content_bounds
    }

    pub fn raster(&self) -> Option<&Arc<SourceBitmap>> {
        self.raster.as_ref()
    }

    pub fn stats(&self) -> SequenceStats {
        self.stats
    }
}

/// Settings shared by every scene build of one project.
#[derive(Clone, Debug, Default)]
pub struct SceneBuildConfig {
    pub palette: PaletteConfig,
    pub sequencer: SequencerConfig,
    pub trace: TraceOptions,
}

/// Trace `bitmap` and turn the result into a vector asset.
///
/// Fails with `VectorizationFailed` when the tracer errors or misses its deadline; an empty
/// trace is a valid (empty) vector asset.
#[tracing::instrument(level = "debug", skip(bitmap, tracer, cfg), fields(width = bitmap.width, height = bitmap.height))]
pub fn build_scene_asset(
    id: SceneId,
    bitmap: Arc<SourceBitmap>,
    tracer: Arc<dyn Tracer>,
    cfg: &SceneBuildConfig,
) -> QuillResult<SceneAsset> {
    let canvas = bitmap.canvas();
    let paths = trace_with_timeout(tracer, bitmap, &cfg.trace)?;
    let seq = sequence_strokes(paths, canvas, &cfg.palette, &cfg.sequencer);
    Ok(SceneAsset::from_strokes(id, canvas, seq))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/scene.rs"]
mod tests;
