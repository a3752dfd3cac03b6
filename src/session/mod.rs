//! Export sessions driven by the audio clock.

/// Audio clock abstraction and the offline sample clock.
pub mod clock;
/// Export loop, progress, and cancellation.
pub mod export;
