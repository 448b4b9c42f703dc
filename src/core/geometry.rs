//! Pixel and source-space geometry shared by config, renderer and tiler.
//!
//! All types deserialize from the compact array forms used in the manifest:
//!
//! ```toml
//! size = [4096, 3072]          # PixelSize
//! extent = [0, 0, 1024, 768]   # Extent
//! origin = [128, -64]          # Origin
//! zoom = [0, 4]                # ZoomRange
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// PixelSize
// ============================================================================

/// Width and height in whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Square size, used for the default 256×256 tile.
    pub const fn square(side: u32) -> Self {
        Self::new(side, side)
    }

    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Shrink by a zoom scale factor, rounding up so edge pixels survive.
    ///
    /// Never returns a zero dimension for a non-empty size.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn scaled_down(&self, scale: f64) -> Self {
        let shrink = |v: u32| ((f64::from(v) / scale).ceil() as u32).max(1);
        Self::new(shrink(self.width), shrink(self.height))
    }
}

impl From<[u32; 2]> for PixelSize {
    fn from([width, height]: [u32; 2]) -> Self {
        Self::new(width, height)
    }
}

impl From<PixelSize> for [u32; 2] {
    fn from(size: PixelSize) -> Self {
        [size.width, size.height]
    }
}

impl fmt::Display for PixelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}×{}", self.width, self.height)
    }
}

// ============================================================================
// Extent
// ============================================================================

/// Rectangle in the vector source's own coordinate units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Extent {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Extent {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_valid(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width > 0.0
            && self.height > 0.0
    }

    /// Pixel size of this extent rendered at `resolution` pixels per unit.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn pixel_size(&self, resolution: f64) -> PixelSize {
        let px = |v: f64| ((v * resolution).round() as u32).max(1);
        PixelSize::new(px(self.width), px(self.height))
    }
}

impl From<[f64; 4]> for Extent {
    fn from([x, y, width, height]: [f64; 4]) -> Self {
        Self::new(x, y, width, height)
    }
}

impl From<Extent> for [f64; 4] {
    fn from(extent: Extent) -> Self {
        [extent.x, extent.y, extent.width, extent.height]
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.x, self.y, self.width, self.height
        )
    }
}

// ============================================================================
// Origin
// ============================================================================

/// Largest origin offset on either axis, at any zoom level.
///
/// Keeps tile-grid arithmetic on raster heights within `i64`.
pub const MAX_ORIGIN: i64 = 1 << 32;

/// Pixel offset of a layer's content relative to tile-grid alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i64; 2]", into = "[i64; 2]")]
pub struct Origin {
    pub x: i64,
    pub y: i64,
}

impl Origin {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Divide by a zoom scale factor, rounding to the nearest pixel.
    ///
    /// Over-zoomed results are clamped to [`MAX_ORIGIN`].
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn scaled_down(&self, scale: f64) -> Self {
        let shrink = |v: i64| ((v as f64 / scale).round() as i64).clamp(-MAX_ORIGIN, MAX_ORIGIN);
        Self::new(shrink(self.x), shrink(self.y))
    }

    pub fn is_bounded(&self) -> bool {
        self.x.abs() <= MAX_ORIGIN && self.y.abs() <= MAX_ORIGIN
    }
}

impl From<[i64; 2]> for Origin {
    fn from([x, y]: [i64; 2]) -> Self {
        Self::new(x, y)
    }
}

impl From<Origin> for [i64; 2] {
    fn from(origin: Origin) -> Self {
        [origin.x, origin.y]
    }
}

// ============================================================================
// ZoomRange
// ============================================================================

/// Inclusive `[min, max]` zoom-level range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 2]", into = "[u8; 2]")]
pub struct ZoomRange {
    pub min: u8,
    pub max: u8,
}

impl ZoomRange {
    pub const fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    pub const fn is_valid(&self) -> bool {
        self.min <= self.max
    }

    pub fn levels(&self) -> std::ops::RangeInclusive<u8> {
        self.min..=self.max
    }

    pub fn len(&self) -> usize {
        if self.is_valid() {
            usize::from(self.max - self.min) + 1
        } else {
            0
        }
    }
}

impl From<[u8; 2]> for ZoomRange {
    fn from([min, max]: [u8; 2]) -> Self {
        Self::new(min, max)
    }
}

impl From<ZoomRange> for [u8; 2] {
    fn from(range: ZoomRange) -> Self {
        [range.min, range.max]
    }
}

impl fmt::Display for ZoomRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.min, self.max)
    }
}
