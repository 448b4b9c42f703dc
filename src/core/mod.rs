//! Core types - pure abstractions shared across the codebase.

mod color;
mod geometry;

pub use color::KeyColor;
pub use geometry::{Extent, MAX_ORIGIN, Origin, PixelSize, ZoomRange};
