//! Placement of scene content in the output frame.

pub mod fit;
