//! Vector rasterization capability.
//!
//! The tiler only sees two traits:
//!
//! ```text
//!   Rasterizer (one per run)
//!       │ open(source bytes)
//!       ▼
//!   RenderContext (one per layer)
//!       │ render(extent, size)  ×  zoom levels
//!       ▼
//!   RgbaImage (straight alpha, exactly `size` pixels)
//! ```
//!
//! # Modules
//!
//! - [`svg`]: `usvg` + `resvg` backend

pub mod svg;

use anyhow::Result;
use image::RgbaImage;

use crate::core::{Extent, PixelSize};

pub use svg::SvgRasterizer;

/// A shared rasterizer session.
///
/// Must accept concurrent `open` calls from many layers.
pub trait Rasterizer: Send + Sync {
    /// Parse a vector document into a reusable render context.
    fn open(&self, source: &[u8]) -> Result<Box<dyn RenderContext>>;
}

/// A parsed vector document, rendered once per zoom level.
pub trait RenderContext: Send + Sync {
    /// The document's own bounding box in source units.
    fn natural_extent(&self) -> Extent;

    /// Render `extent` scaled to exactly `size` pixels on a transparent background.
    fn render(&self, extent: Extent, size: PixelSize) -> Result<RgbaImage>;
}
