use anyhow::Context;
use usvg::tiny_skia_path::PathSegment;

use crate::foundation::core::{Affine, BezPath, Point};
use crate::foundation::error::{QuillError, QuillResult};
use crate::trace::TracedPath;

/// Parse tracer SVG output into filled outlines in source pixel space.
///
/// Every visible filled `<path>` (or shape usvg converts to one) yields one [`TracedPath`] in
/// document order, with group transforms already applied. Unfilled and fully transparent
/// paths are skipped.
pub fn parse_traced_svg(bytes: &[u8]) -> QuillResult<Vec<TracedPath>> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts)
        .context("parse traced svg")
        .map_err(|e| QuillError::vectorization(format!("{e:#}")))?;

    let mut out = Vec::new();
    collect_group(tree.root(), &mut out);
    Ok(out)
}

fn collect_group(group: &usvg::Group, out: &mut Vec<TracedPath>) {
    for node in group.children() {
        match node {
            usvg::Node::Group(g) => collect_group(g, out),
            usvg::Node::Path(p) => {
                if let Some(traced) = traced_path(p) {
                    out.push(traced);
                }
            }
            _ => {}
        }
    }
}

fn traced_path(p: &usvg::Path) -> Option<TracedPath> {
    if !p.is_visible() {
        return None;
    }
    let fill = p.fill()?;
    if fill.opacity().get() <= 0.0 {
        return None;
    }
    let fill = paint_hex(fill.paint())?;

    let mut geometry = BezPath::new();
    for seg in p.data().segments() {
        match seg {
            PathSegment::MoveTo(a) => geometry.move_to(pt(a)),
            PathSegment::LineTo(a) => geometry.line_to(pt(a)),
            PathSegment::QuadTo(a, b) => geometry.quad_to(pt(a), pt(b)),
            PathSegment::CubicTo(a, b, c) => geometry.curve_to(pt(a), pt(b), pt(c)),
            PathSegment::Close => geometry.close_path(),
        }
    }
    if geometry.elements().is_empty() {
        return None;
    }
    geometry.apply_affine(affine_from_usvg(p.abs_transform()));

    Some(TracedPath { geometry, fill })
}

fn paint_hex(paint: &usvg::Paint) -> Option<String> {
    let c = match paint {
        usvg::Paint::Color(c) => *c,
        usvg::Paint::LinearGradient(g) => g.stops().first()?.color(),
        usvg::Paint::RadialGradient(g) => g.stops().first()?.color(),
        usvg::Paint::Pattern(_) => return None,
    };
    Some(format!("#{:02x}{:02x}{:02x}", c.red, c.green, c.blue))
}

fn pt(p: usvg::tiny_skia_path::Point) -> Point {
    Point::new(f64::from(p.x), f64::from(p.y))
}

fn affine_from_usvg(t: usvg::Transform) -> Affine {
    Affine::new([
        f64::from(t.sx),
        f64::from(t.ky),
        f64::from(t.kx),
        f64::from(t.sy),
        f64::from(t.tx),
        f64::from(t.ty),
    ])
}

#[cfg(test)]
#[path = "../../tests/unit/trace/svg.rs"]
mod tests;
