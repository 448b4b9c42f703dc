//! Tile grid calculation over a rendered layer raster.
//!
//! Raster rows run top-down while tile rows run bottom-up: tile row `y`
//! starts at the image's bottom edge and grows upward. Columns run left to
//! right in both spaces. The grid is aligned to the layer origin, so the
//! first column and last row may start outside the image and are padded.
//!
//! ```text
//!   raster (0,0) ┌────────┬────────┐
//!                │ (0,1)  │ (1,1)  │
//!                ├────────┼────────┤
//!                │ (0,0)  │ (1,0)  │
//!                └────────┴────────┘ (W,H)
//! ```

use crate::core::{Origin, PixelSize};

/// A rectangle in raster pixel space; may extend past the raster bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub const fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn right(&self) -> i64 {
        self.x + self.width as i64
    }

    pub const fn bottom(&self) -> i64 {
        self.y + self.height as i64
    }

    /// Intersection with a `bounds`-sized raster at (0,0), if non-empty.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn clip(&self, bounds: PixelSize) -> Option<Self> {
        let left = self.x.max(0);
        let top = self.y.max(0);
        let right = self.right().min(i64::from(bounds.width));
        let bottom = self.bottom().min(i64::from(bounds.height));

        (left < right && top < bottom)
            .then(|| Self::new(left, top, (right - left) as u32, (bottom - top) as u32))
    }
}

/// One tile's position in tile space and its footprint in the raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileSlice {
    pub x: i64,
    pub y: i64,
    pub crop: PixelRect,
}

/// Lazy column-major iterator over every tile overlapping an image.
///
/// Built by [`compute_tile_slices`].
#[derive(Debug, Clone)]
pub struct TileSlices {
    image: PixelSize,
    tile: PixelSize,
    y_tile_start: i64,
    y_start: i64,
    tile_x: i64,
    x_offset: i64,
    tile_y: i64,
    y_offset: i64,
}

/// Compute the tile slices covering a `image`-sized raster whose content is
/// offset by `origin` (already scaled to the current zoom level).
pub fn compute_tile_slices(image: PixelSize, origin: Origin, tile: PixelSize) -> TileSlices {
    let tile_w = i64::from(tile.width);
    let tile_h = i64::from(tile.height);

    let x_tile_start = origin.x.div_euclid(tile_w);
    let x_start = x_tile_start * tile_w - origin.x;

    let y_tile_start = origin.y.div_euclid(tile_h);
    let y_start = i64::from(image.height) + origin.y - y_tile_start * tile_h - tile_h;

    TileSlices {
        image,
        tile,
        y_tile_start,
        y_start,
        tile_x: x_tile_start,
        x_offset: x_start,
        tile_y: y_tile_start,
        y_offset: y_start,
    }
}

impl TileSlices {
    fn column_done(&self) -> bool {
        self.y_offset <= -i64::from(self.tile.height)
    }

    fn exhausted(&self) -> bool {
        self.image.is_empty() || self.x_offset >= i64::from(self.image.width)
    }
}

impl Iterator for TileSlices {
    type Item = TileSlice;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted() {
            return None;
        }

        if self.column_done() {
            self.tile_x += 1;
            self.x_offset += i64::from(self.tile.width);
            self.tile_y = self.y_tile_start;
            self.y_offset = self.y_start;
            if self.exhausted() {
                return None;
            }
        }

        let slice = TileSlice {
            x: self.tile_x,
            y: self.tile_y,
            crop: PixelRect::new(
                self.x_offset,
                self.y_offset,
                self.tile.width,
                self.tile.height,
            ),
        };

        self.tile_y += 1;
        self.y_offset -= i64::from(self.tile.height);
        Some(slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MAX_ORIGIN;

    const TILE: PixelSize = PixelSize::square(256);

    fn slices(w: u32, h: u32, ox: i64, oy: i64) -> Vec<TileSlice> {
        compute_tile_slices(PixelSize::new(w, h), Origin::new(ox, oy), TILE).collect()
    }

    /// Every raster pixel must be covered by exactly one clipped crop.
    fn assert_exact_cover(w: u32, h: u32, ox: i64, oy: i64) {
        let image = PixelSize::new(w, h);
        let mut hits = vec![0u8; (w * h) as usize];

        for slice in slices(w, h, ox, oy) {
            // Footprints are tile-aligned relative to the origin
            assert_eq!((slice.crop.x + ox).rem_euclid(256), 0);
            assert_eq!((i64::from(h) + oy - slice.crop.bottom()).rem_euclid(256), 0);

            let clipped = slice.crop.clip(image).expect("slice overlaps image");
            for y in clipped.y..clipped.bottom() {
                for x in clipped.x..clipped.right() {
                    hits[(y * i64::from(w) + x) as usize] += 1;
                }
            }
        }

        assert!(hits.iter().all(|&n| n == 1), "gap or overlap for {w}×{h} @ ({ox},{oy})");
    }

    #[test]
    fn test_exact_cover_various_sizes_and_origins() {
        for (w, h) in [(1, 1), (256, 256), (300, 200), (512, 512), (700, 513), (255, 1025)] {
            for (ox, oy) in [(0, 0), (10, 0), (0, 37), (300, 600), (-20, -300), (-256, 256)] {
                assert_exact_cover(w, h, ox, oy);
            }
        }
    }

    #[test]
    fn test_row_zero_anchored_at_bottom() {
        let tiles = slices(512, 512, 0, 0);
        let row0: Vec<_> = tiles.iter().filter(|s| s.y == 0).collect();
        assert_eq!(row0.len(), 2);
        for slice in row0 {
            assert_eq!(slice.crop.y, 512 - 256);
            assert_eq!(slice.crop.bottom(), 512);
        }
    }

    #[test]
    fn test_partial_height_rows() {
        // H = 300: row 0 starts at 300 - 256 = 44, top row pads 212 pixels
        let tiles = slices(256, 300, 0, 0);
        assert_eq!(tiles.len(), 2);
        assert_eq!(tiles[0], TileSlice { x: 0, y: 0, crop: PixelRect::new(0, 44, 256, 256) });
        assert_eq!(tiles[1], TileSlice { x: 0, y: 1, crop: PixelRect::new(0, -212, 256, 256) });
        assert_eq!(tiles[1].crop.y, (300 % 256) - 256);
    }

    #[test]
    fn test_two_by_two_grid() {
        let coords: Vec<_> = slices(512, 512, 0, 0).iter().map(|s| (s.x, s.y)).collect();
        assert_eq!(coords, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn test_single_tile_for_small_image() {
        let tiles = slices(256, 256, 0, 0);
        assert_eq!(tiles, vec![TileSlice { x: 0, y: 0, crop: PixelRect::new(0, 0, 256, 256) }]);
    }

    #[test]
    fn test_origin_shifts_tile_indices() {
        // Content at (300, 0) belongs to tile column 1 with a 44px left inset
        let tiles = slices(100, 100, 300, 0);
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].x, 1);
        assert_eq!(tiles[0].crop.x, -44);
    }

    #[test]
    fn test_negative_origin() {
        // Content straddles the column boundary at x = 10
        let tiles = slices(100, 100, -10, 0);
        assert_eq!(tiles.len(), 2);
        assert_eq!((tiles[0].x, tiles[0].crop.x), (-1, -246));
        assert_eq!((tiles[1].x, tiles[1].crop.x), (0, 10));
    }

    #[test]
    fn test_extreme_origin_does_not_overflow() {
        let image = PixelSize::new(256, u32::MAX);
        let first = compute_tile_slices(image, Origin::new(MAX_ORIGIN, MAX_ORIGIN), TILE)
            .next()
            .unwrap();
        assert_eq!((first.x, first.y), (MAX_ORIGIN / 256, MAX_ORIGIN / 256));
        assert_eq!(first.crop.bottom(), i64::from(u32::MAX));

        let tiles = slices(256, 256, -MAX_ORIGIN, -MAX_ORIGIN);
        assert_eq!(tiles, vec![TileSlice {
            x: -MAX_ORIGIN / 256,
            y: -MAX_ORIGIN / 256,
            crop: PixelRect::new(0, 0, 256, 256),
        }]);
    }

    #[test]
    fn test_empty_image_yields_nothing() {
        assert!(slices(0, 100, 0, 0).is_empty());
        assert!(slices(100, 0, 0, 5).is_empty());
    }

    #[test]
    fn test_clip() {
        let bounds = PixelSize::new(300, 200);
        assert_eq!(
            PixelRect::new(256, -56, 256, 256).clip(bounds),
            Some(PixelRect::new(256, 0, 44, 200))
        );
        assert_eq!(PixelRect::new(300, 0, 256, 256).clip(bounds), None);
    }
}
