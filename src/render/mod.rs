//! Progressive-reveal frame rendering.
//!
//! `reveal` and `plan` are pure: they turn a scene asset and an elapsed time into drawing
//! instructions. `cpu` rasterizes those instructions with a per-scene background cache.

pub(crate) mod composite;
/// CPU rasterizer and overlays.
pub mod cpu;
/// Per-scene background cache state.
pub mod cursor;
/// Drawing instructions for one frame.
pub mod plan;
/// Reveal progress and pen position.
pub mod reveal;
