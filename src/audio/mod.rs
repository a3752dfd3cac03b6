//! Narration decoding and the mixed narration track.

/// Timeline-aligned narration mix.
pub mod mix;
/// Narration clip decoding.
pub mod narration;
