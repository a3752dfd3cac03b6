//! Snapping of traced fill colors onto a small marker palette.
//!
//! Generated illustrations carry noisy anti-aliased colors. Everything the tracer reports is
//! mapped either to "paper" (discarded) or to one of a handful of opaque marker inks, so the
//! animation reads as clean strokes instead of muddy gradients.

use crate::foundation::core::Rgb8;

/// Tunable thresholds and the marker palette.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaletteConfig {
    /// A color whose every channel is at or above this value is background.
    pub background_threshold: u8,
    /// HSV saturation below which a non-background color becomes black ink.
    pub saturation_floor: f64,
    /// When `false`, every ink stroke is drawn black.
    pub use_color: bool,
    /// Candidate marker colors; black is always an implicit candidate.
    pub colors: Vec<Rgb8>,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            background_threshold: 210,
            saturation_floor: 0.10,
            use_color: true,
            colors: default_marker_colors(),
        }
    }
}

/// Blue, red, green, orange, purple and black.
pub fn default_marker_colors() -> Vec<Rgb8> {
    vec![
        Rgb8::new(0x1d, 0x4e, 0xd8),
        Rgb8::new(0xb9, 0x1c, 0x1c),
        Rgb8::new(0x15, 0x80, 0x3d),
        Rgb8::new(0xc2, 0x41, 0x0c),
        Rgb8::new(0x7e, 0x22, 0xce),
        Rgb8::BLACK,
    ]
}

/// Normalize a raw tracer color string.
///
/// Returns `None` for background (paper) colors. Never fails: unparseable input is black ink.
pub fn normalize_color(raw: &str, cfg: &PaletteConfig) -> Option<Rgb8> {
    normalize_rgb(parse_color(raw).unwrap_or(Rgb8::BLACK), cfg)
}

/// Normalize an already-parsed color. See [`normalize_color`].
pub fn normalize_rgb(c: Rgb8, cfg: &PaletteConfig) -> Option<Rgb8> {
    let t = cfg.background_threshold;
    if c.r >= t && c.g >= t && c.b >= t {
        return None;
    }
    if !cfg.use_color || saturation(c) < cfg.saturation_floor {
        return Some(Rgb8::BLACK);
    }

    let mut best = Rgb8::BLACK;
    let mut best_d = c.distance_sq(Rgb8::BLACK);
    for &p in &cfg.colors {
        let d = c.distance_sq(p);
        if d < best_d {
            best = p;
            best_d = d;
        }
    }
    Some(best)
}

/// HSV saturation in `[0, 1]`; black has saturation 0.
pub fn saturation(c: Rgb8) -> f64 {
    let max = c.r.max(c.g).max(c.b);
    let min = c.r.min(c.g).min(c.b);
    if max == 0 {
        return 0.0;
    }
    f64::from(max - min) / f64::from(max)
}

/// Parse the color syntaxes tracers emit: hex forms and `rgb()`/`rgba()` functions.
pub fn parse_color(raw: &str) -> Option<Rgb8> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if s.starts_with('#') {
        return Rgb8::from_hex(s);
    }

    let lower = s.to_ascii_lowercase();
    let args = lower
        .strip_prefix("rgba")
        .or_else(|| lower.strip_prefix("rgb"))?
        .trim()
        .strip_prefix('(')?
        .strip_suffix(')')?;

    let mut channels = args
        .split(|ch: char| ch == ',' || ch.is_whitespace())
        .filter(|part| !part.is_empty() && *part != "/");
    let mut next = || -> Option<u8> {
        let part = channels.next()?;
        let v = match part.strip_suffix('%') {
            Some(pct) => pct.parse::<f64>().ok()? * 2.55,
            None => part.parse::<f64>().ok()?,
        };
        v.is_finite().then(|| v.round().clamp(0.0, 255.0) as u8)
    };
    Some(Rgb8::new(next()?, next()?, next()?))
}

#[cfg(test)]
#[path = "../../tests/unit/ink/palette.rs"]
mod tests;
