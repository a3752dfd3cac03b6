//! Scene illustrations: bitmap decoding, per-scene asset build, and the parallel build pool.

/// Bitmap and overlay image decoding.
pub mod decode;
/// Bounded parallel scene builds and the asset library.
pub mod pool;
/// Immutable per-scene drawing assets.
pub mod scene;
