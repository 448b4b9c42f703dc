//! Pyramid geometry derived from the map size.

use crate::core::{PixelSize, ZoomRange};

/// Default tile edge in pixels.
pub const DEFAULT_TILE_SIZE: PixelSize = PixelSize::square(256);

/// Zoom layout of a map's tile pyramid.
///
/// `full_zoom` is the finest level, where one map pixel is one tile pixel.
/// Each level below it halves the raster in both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PyramidGeometry {
    pub tile_size: PixelSize,
    /// Tiles needed per axis at full zoom.
    pub tile_dims: (u32, u32),
    /// `tile_dims × tile_size`, the padded canvas.
    pub tiled_size: PixelSize,
    pub full_zoom: u8,
}

impl PyramidGeometry {
    pub fn new(map_size: PixelSize, tile_size: PixelSize) -> Self {
        let tile_dims = (
            map_size.width.div_ceil(tile_size.width),
            map_size.height.div_ceil(tile_size.height),
        );
        let tiled_size = PixelSize::new(
            tile_dims.0 * tile_size.width,
            tile_dims.1 * tile_size.height,
        );

        Self {
            tile_size,
            tile_dims,
            tiled_size,
            full_zoom: ceil_log2(tile_dims.0.max(tile_dims.1)),
        }
    }

    /// `[0, full_zoom]`, used when a layer does not configure its own range.
    pub const fn default_zoom(&self) -> ZoomRange {
        ZoomRange::new(0, self.full_zoom)
    }

    /// Downscale factor of `zoom` relative to full resolution.
    ///
    /// Levels beyond `full_zoom` yield factors below 1 (over-zoom).
    pub fn zoom_scale(&self, zoom: u8) -> f64 {
        2f64.powi(i32::from(self.full_zoom) - i32::from(zoom))
    }
}

/// Smallest `z` with `2^z >= n` (0 for `n <= 1`).
#[allow(clippy::cast_possible_truncation)]
fn ceil_log2(n: u32) -> u8 {
    if n <= 1 {
        0
    } else {
        (u32::BITS - (n - 1).leading_zeros()) as u8
    }
}
