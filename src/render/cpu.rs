use std::sync::Arc;

use kurbo::Shape;

use crate::assets::decode::{PreparedImage, SourceBitmap};
use crate::assets::scene::SceneAsset;
use crate::foundation::core::{Affine, BezPath, FrameRGBA, Point, Rgb8};
use crate::foundation::error::{QuillError, QuillResult};
use crate::ink::stroke::Stroke;
use crate::layout::fit::FitTransform;
use crate::render::composite::over_in_place;
use crate::render::cursor::RenderCursor;
use crate::render::plan::{ActiveInk, FramePlan, PlanContent, RenderSettings};

/// Sprite pixels between its top-left corner and the pen tip.
const PEN_SPRITE_TIP: f64 = 10.0;

/// A logo composited into the bottom-right corner of every frame.
#[derive(Clone, Debug)]
pub struct Watermark {
    pub image: PreparedImage,
    /// Logo width as a fraction of the frame width.
    pub width_fraction: f64,
    pub margin_px: f64,
    pub opacity: f32,
}

/// Decoded images drawn on top of the scene.
#[derive(Clone, Debug, Default)]
pub struct Overlays {
    pub pen_sprite: Option<PreparedImage>,
    pub watermark: Option<Watermark>,
}

#[derive(Clone)]
struct ImagePaint {
    paint: vello_cpu::Image,
    w: u32,
    h: u32,
}

/// CPU rasterizer for [`FramePlan`]s.
///
/// Owns its [`RenderCursor`]; two renderers never share one.
pub struct FrameRenderer {
    settings: RenderSettings,
    ctx: vello_cpu::RenderContext,
    layer: vello_cpu::Pixmap,
    cursor: RenderCursor,
    pen_sprite: Option<ImagePaint>,
    watermark: Option<(ImagePaint, Watermark)>,
}

impl FrameRenderer {
    pub fn new(settings: RenderSettings, overlays: Overlays) -> QuillResult<Self> {
        let w = frame_dim(settings.frame.width, "width")?;
        let h = frame_dim(settings.frame.height, "height")?;

        let pen_sprite = overlays.pen_sprite.as_ref().map(image_paint).transpose()?;
        let watermark = match overlays.watermark {
            Some(wm) => Some((image_paint(&wm.image)?, wm)),
            None => None,
        };

        Ok(Self {
            settings,
            ctx: vello_cpu::RenderContext::new(w, h),
            layer: vello_cpu::Pixmap::new(w, h),
            cursor: RenderCursor::new(),
            pen_sprite,
            watermark,
        })
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn cursor(&self) -> &RenderCursor {
        &self.cursor
    }

    /// Rasterize `plan`. `asset` must be the scene asset the plan was made from.
    pub fn render(&mut self, plan: &FramePlan, asset: Option<&SceneAsset>) -> QuillResult<FrameRGBA> {
        self.sync_cache(plan, asset)?;

        let mut data = self.cursor.cache().to_vec();
        let active = match &plan.content {
            PlanContent::Strokes { active, .. } => active.as_ref(),
            _ => None,
        };
        if active.is_some() || plan.pen.is_some() || self.watermark.is_some() {
            let frame_h = f64::from(self.settings.frame.height);
            let frame_w = f64::from(self.settings.frame.width);
            let sprite_size = frame_h * self.settings.reveal.pen_sprite_scale;
            let dot_radius = self.settings.reveal.pen_width_px * 0.6;
            let pen_sprite = self.pen_sprite.as_ref();
            let watermark = self.watermark.as_ref();

            render_layer(&mut self.ctx, &mut self.layer, |ctx| {
                if let Some(ink) = active {
                    draw_active(ctx, ink);
                }
                if let Some(pen) = plan.pen {
                    match pen_sprite {
                        Some(sprite) => draw_sprite(ctx, sprite, pen, sprite_size),
                        None => {
                            let color = active.map(|a| a.color).unwrap_or(Rgb8::BLACK);
                            draw_dot(ctx, pen, dot_radius, color);
                        }
                    }
                }
                if let Some((paint, wm)) = watermark {
                    draw_watermark(ctx, paint, wm, frame_w, frame_h);
                }
            });
            over_in_place(&mut data, self.layer.data_as_u8_slice(), 1.0)?;
        }

        Ok(FrameRGBA {
            width: self.settings.frame.width,
            height: self.settings.frame.height,
            data,
            premultiplied: true,
        })
    }

    fn sync_cache(&mut self, plan: &FramePlan, asset: Option<&SceneAsset>) -> QuillResult<()> {
        let fully_drawn = match &plan.content {
            PlanContent::Strokes { fully_drawn, .. } => *fully_drawn,
            _ => 0,
        };

        if self.cursor.is_stale(plan.scene, plan.asset, fully_drawn) {
            let bytes = (self.settings.frame.width as usize) * (self.settings.frame.height as usize) * 4;
            self.cursor
                .reset(plan.scene, plan.asset, bytes, plan.background.to_rgba());
            if let PlanContent::Raster(bitmap) = &plan.content {
                self.bake_raster(bitmap, plan.fit)?;
            }
        }

        let baked = self.cursor.baked();
        if fully_drawn > baked {
            let strokes = asset
                .filter(|a| Some(a.id()) == plan.scene && Some(a.generation()) == plan.asset)
                .and_then(|a| a.strokes().get(baked..fully_drawn))
                .ok_or_else(|| {
                    QuillError::render("frame plan refers to strokes its scene asset lacks")
                })?;
            self.bake_strokes(strokes, plan.fit)?;
            self.cursor.mark_baked(fully_drawn);
        }
        Ok(())
    }

    fn bake_strokes(&mut self, strokes: &[Stroke], fit: FitTransform) -> QuillResult<()> {
        let transform = affine_to_cpu(fit.to_affine());
        render_layer(&mut self.ctx, &mut self.layer, |ctx| {
            ctx.set_transform(transform);
            for stroke in strokes {
                ctx.set_paint(cpu_color(stroke.color()));
                ctx.fill_path(&bezpath_to_cpu(stroke.geometry()));
            }
        });
        over_in_place(self.cursor.cache_mut(), self.layer.data_as_u8_slice(), 1.0)
    }

    fn bake_raster(&mut self, bitmap: &SourceBitmap, fit: FitTransform) -> QuillResult<()> {
        let paint = image_paint_from_premul(&bitmap.rgba8, bitmap.width, bitmap.height)?;
        let transform = affine_to_cpu(fit.to_affine());
        render_layer(&mut self.ctx, &mut self.layer, |ctx| {
            ctx.set_transform(transform);
            ctx.set_paint(paint.paint.clone());
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(paint.w),
                f64::from(paint.h),
            ));
        });
        over_in_place(self.cursor.cache_mut(), self.layer.data_as_u8_slice(), 1.0)
    }
}

fn render_layer(
    ctx: &mut vello_cpu::RenderContext,
    layer: &mut vello_cpu::Pixmap,
    draw: impl FnOnce(&mut vello_cpu::RenderContext),
) {
    ctx.reset();
    draw(ctx);
    ctx.flush();
    layer.data_as_u8_slice_mut().fill(0);
    ctx.render_to_pixmap(layer);
}

fn draw_active(ctx: &mut vello_cpu::RenderContext, ink: &ActiveInk) {
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(cpu_color(ink.color));
    ctx.set_stroke(
        vello_cpu::kurbo::Stroke::new(ink.width_px)
            .with_caps(vello_cpu::kurbo::Cap::Round)
            .with_join(vello_cpu::kurbo::Join::Round),
    );
    ctx.stroke_path(&bezpath_to_cpu(&ink.outline));
}

fn draw_dot(ctx: &mut vello_cpu::RenderContext, at: Point, radius: f64, color: Rgb8) {
    let dot = kurbo::Circle::new(at, radius).to_path(0.1);
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(cpu_color(color));
    ctx.fill_path(&bezpath_to_cpu(&dot));
}

fn draw_sprite(ctx: &mut vello_cpu::RenderContext, sprite: &ImagePaint, tip: Point, size: f64) {
    let tr = Affine::translate((tip.x - PEN_SPRITE_TIP, tip.y - PEN_SPRITE_TIP))
        * Affine::scale_non_uniform(size / f64::from(sprite.w), size / f64::from(sprite.h));
    ctx.set_transform(affine_to_cpu(tr));
    ctx.set_paint(sprite.paint.clone());
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        0.0,
        0.0,
        f64::from(sprite.w),
        f64::from(sprite.h),
    ));
}

fn draw_watermark(
    ctx: &mut vello_cpu::RenderContext,
    paint: &ImagePaint,
    wm: &Watermark,
    frame_w: f64,
    frame_h: f64,
) {
    let scale = frame_w * wm.width_fraction / f64::from(paint.w);
    let w = f64::from(paint.w) * scale;
    let h = f64::from(paint.h) * scale;
    let tr = Affine::translate((frame_w - wm.margin_px - w, frame_h - wm.margin_px - h))
        * Affine::scale(scale);

    ctx.set_transform(affine_to_cpu(tr));
    ctx.set_paint(paint.paint.clone());
    let faded = wm.opacity < 1.0;
    if faded {
        ctx.push_opacity_layer(wm.opacity.max(0.0));
    }
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        0.0,
        0.0,
        f64::from(paint.w),
        f64::from(paint.h),
    ));
    if faded {
        ctx.pop_layer();
    }
}

fn frame_dim(v: u32, what: &str) -> QuillResult<u16> {
    match u16::try_from(v) {
        Ok(0) | Err(_) => Err(QuillError::validation(format!(
            "frame {what} must be in 1..=65535, got {v}"
        ))),
        Ok(d) => Ok(d),
    }
}

fn cpu_color(c: Rgb8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, 255)
}

fn image_paint(img: &PreparedImage) -> QuillResult<ImagePaint> {
    image_paint_from_premul(&img.rgba8_premul, img.width, img.height)
}

fn image_paint_from_premul(bytes: &[u8], width: u32, height: u32) -> QuillResult<ImagePaint> {
    let pixmap = pixmap_from_premul_bytes(bytes, width, height)?;
    Ok(ImagePaint {
        paint: vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        },
        w: width,
        h: height,
    })
}

fn pixmap_from_premul_bytes(bytes: &[u8], width: u32, height: u32) -> QuillResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| QuillError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| QuillError::render("image height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(QuillError::render("image has zero size"));
    }
    if bytes.len() != (width as usize) * (height as usize) * 4 {
        return Err(QuillError::render("image byte length mismatch"));
    }
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect::<Vec<_>>();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true))
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let pt = |p: Point| vello_cpu::kurbo::Point::new(p.x, p.y);
    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(pt(p)),
            PathEl::LineTo(p) => out.line_to(pt(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(pt(p1), pt(p2)),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(pt(p1), pt(p2), pt(p3)),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
