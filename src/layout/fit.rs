use crate::foundation::core::{Affine, Canvas, Point, Rect};

/// Uniform scale plus translation mapping source content into an output frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitTransform {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl FitTransform {
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        translate_x: 0.0,
        translate_y: 0.0,
    };

    /// `translate * scale`: scale about the origin, then move.
    pub fn to_affine(self) -> Affine {
        Affine::translate((self.translate_x, self.translate_y)) * Affine::scale(self.scale)
    }

    pub fn apply(self, p: Point) -> Point {
        Point::new(
            p.x * self.scale + self.translate_x,
            p.y * self.scale + self.translate_y,
        )
    }
}

/// Fit `content` (in `canvas` space) into `frame`, centered, filling `fill_fraction` of the
/// tighter frame axis.
///
/// Zero-area or non-finite content falls back to the whole canvas so that an illustration
/// without strokes is still framed consistently. `fill_fraction` is clamped into `(0, 1]`.
pub fn fit_content(content: Rect, canvas: Canvas, frame: Canvas, fill_fraction: f64) -> FitTransform {
    let content = if is_usable(content) {
        content
    } else {
        canvas.rect()
    };
    if !is_usable(content) || frame.is_empty() {
        return FitTransform::IDENTITY;
    }

    let f = if fill_fraction.is_finite() && fill_fraction > 0.0 {
        fill_fraction.min(1.0)
    } else {
        1.0
    };
    let fw = f64::from(frame.width);
    let fh = f64::from(frame.height);
    let scale = ((fw * f) / content.width()).min((fh * f) / content.height());

    let c = content.center();
    FitTransform {
        scale,
        translate_x: fw / 2.0 - c.x * scale,
        translate_y: fh / 2.0 - c.y * scale,
    }
}

fn is_usable(r: Rect) -> bool {
    let finite = r.x0.is_finite() && r.y0.is_finite() && r.x1.is_finite() && r.y1.is_finite();
    finite && r.width() > 0.0 && r.height() > 0.0
}

#[cfg(test)]
#[path = "../../tests/unit/layout/fit.rs"]
mod tests;
