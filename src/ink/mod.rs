//! Ink model: palette normalization, strokes, and stroke ordering.

pub mod palette;
pub mod sequence;
pub mod stroke;
