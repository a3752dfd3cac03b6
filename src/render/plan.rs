use std::sync::Arc;

use crate::assets::decode::SourceBitmap;
use crate::assets::scene::{AssetKind, SceneAsset};
use crate::foundation::core::{BezPath, Canvas, Point, Rgb8, SceneId};
use crate::layout::fit::{FitTransform, fit_content};
use crate::render::reveal::{RevealConfig, RevealState, reveal_at};

/// Frame-level settings shared by every frame of an export.
#[derive(Clone, Debug)]
pub struct RenderSettings {
    pub frame: Canvas,
    pub background: Rgb8,
    pub fit_fraction: f64,
    pub reveal: RevealConfig,
}

/// The partially drawn stroke, ready to be stroked in frame space.
#[derive(Clone, Debug)]
pub struct ActiveInk {
    pub stroke_index: usize,
    pub color: Rgb8,
    /// Drawn prefix of the outline, already mapped into frame space.
    pub outline: BezPath,
    pub width_px: f64,
}

/// What a frame shows besides background and overlays.
#[derive(Clone, Debug)]
pub enum PlanContent {
    /// Background only.
    Blank,
    /// Untraced bitmap fitted into the frame.
    Raster(Arc<SourceBitmap>),
    /// Strokes `0..fully_drawn` filled, plus the active stroke.
    Strokes {
        fully_drawn: usize,
        active: Option<ActiveInk>,
    },
}

/// Drawing instructions for one output frame.
#[derive(Clone, Debug)]
pub struct FramePlan {
    pub scene: Option<SceneId>,
    /// [`SceneAsset::generation`] of the asset the plan was made from.
    pub asset: Option<u64>,
    pub background: Rgb8,
    pub fit: FitTransform,
    pub content: PlanContent,
    /// Pen position in frame space.
    pub pen: Option<Point>,
    pub reveal: Option<RevealState>,
}

impl FramePlan {
    /// A frame showing only the background (gap, missing asset, or failed scene).
    pub fn background_only(settings: &RenderSettings, scene: Option<SceneId>) -> Self {
        Self {
            scene,
            asset: None,
            background: settings.background,
            fit: FitTransform::IDENTITY,
            content: PlanContent::Blank,
            pen: None,
            reveal: None,
        }
    }
}

/// Plan the frame of `asset` at `elapsed` seconds into a scene lasting `visual_duration`.
pub fn plan_frame(
    asset: &SceneAsset,
    elapsed: f64,
    visual_duration: f64,
    settings: &RenderSettings,
) -> FramePlan {
    let fit = fit_content(
        asset.content_bounds(),
        asset.canvas(),
        settings.frame,
        settings.fit_fraction,
    );

    match asset.kind() {
        AssetKind::Blank => FramePlan {
            asset: Some(asset.generation()),
            fit,
            ..FramePlan::background_only(settings, Some(asset.id()))
        },
        AssetKind::RasterOnly => match asset.raster() {
            Some(bitmap) => FramePlan {
                scene: Some(asset.id()),
                asset: Some(asset.generation()),
                background: settings.background,
                fit,
                content: PlanContent::Raster(Arc::clone(bitmap)),
                pen: None,
                reveal: None,
            },
            None => FramePlan::background_only(settings, Some(asset.id())),
        },
        AssetKind::Vector => {
            let draw = settings.reveal.draw_duration(visual_duration);
            let state = reveal_at(asset.strokes(), elapsed, draw, settings.reveal.ease);
            let to_frame = fit.to_affine();

            let active = state.active.map(|a| {
                let stroke = &asset.strokes()[a.index];
                let mut outline = stroke.outline_prefix(a.drawn);
                outline.apply_affine(to_frame);
                ActiveInk {
                    stroke_index: a.index,
                    color: stroke.color(),
                    outline,
                    width_px: settings.reveal.pen_width_px,
                }
            });
            let pen = if settings.reveal.show_pen {
                state.pen.map(|p| fit.apply(p))
            } else {
                None
            };

            FramePlan {
                scene: Some(asset.id()),
                asset: Some(asset.generation()),
                background: settings.background,
                fit,
                content: PlanContent::Strokes {
                    fully_drawn: state.fully_drawn,
                    active,
                },
                pen,
                reveal: Some(state),
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/plan.rs"]
mod tests;
