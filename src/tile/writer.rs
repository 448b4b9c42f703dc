//! Tile cropping, color-keying and PNG persistence.

use std::fs;
use std::io::Cursor;
use std::path::PathBuf;

use image::{ImageFormat, RgbaImage, imageops};

use super::grid::{PixelRect, TileSlice};
use super::TileError;
use crate::core::{KeyColor, PixelSize};

/// Outcome of writing one tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileWrite {
    Written(PathBuf),
    /// Fully transparent; nothing was written.
    Omitted,
}

impl TileWrite {
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written(_))
    }
}

/// Writes the visible tiles of one layer under `<layer_dir>/<z>/<x>/<y>.png`.
#[derive(Debug, Clone)]
pub struct TileWriter {
    layer_dir: PathBuf,
    transparent: Option<KeyColor>,
}

impl TileWriter {
    pub fn new(layer_dir: impl Into<PathBuf>, transparent: Option<KeyColor>) -> Self {
        Self {
            layer_dir: layer_dir.into(),
            transparent,
        }
    }

    pub fn tile_path(&self, zoom: u8, x: i64, y: i64) -> PathBuf {
        self.layer_dir
            .join(zoom.to_string())
            .join(x.to_string())
            .join(format!("{y}.png"))
    }

    /// Crop `slice` out of `raster` and persist it unless it ends up empty.
    pub fn write_tile_if_visible(
        &self,
        raster: &RgbaImage,
        zoom: u8,
        slice: &TileSlice,
    ) -> Result<TileWrite, TileError> {
        let (width, height) = raster.dimensions();
        if slice.crop.clip(PixelSize::new(width, height)).is_none() {
            return Ok(TileWrite::Omitted);
        }

        let mut tile = crop_tile(raster, slice.crop);
        if let Some(key) = self.transparent {
            apply_color_key(&mut tile, key);
        }
        if is_fully_transparent(&tile) {
            return Ok(TileWrite::Omitted);
        }

        let path = self.tile_path(zoom, slice.x, slice.y);
        if let Some(parent) = path.parent() {
            // create_dir_all tolerates siblings racing on the same directory
            fs::create_dir_all(parent).map_err(|e| TileError::io(parent, e))?;
        }
        let mut png = Vec::new();
        tile.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|source| TileError::Encode {
                path: path.clone(),
                source,
            })?;
        fs::write(&path, png).map_err(|e| TileError::io(&path, e))?;

        Ok(TileWrite::Written(path))
    }
}

/// Copy `crop` out of `raster`; parts outside the raster stay transparent.
pub fn crop_tile(raster: &RgbaImage, crop: PixelRect) -> RgbaImage {
    let mut tile = RgbaImage::new(crop.width, crop.height);
    imageops::replace(&mut tile, raster, -crop.x, -crop.y);
    tile
}

/// Force every pixel exactly equal to `key` to alpha 0.
pub fn apply_color_key(tile: &mut RgbaImage, key: KeyColor) {
    let key = key.rgba();
    for pixel in tile.pixels_mut() {
        if pixel.0 == key {
            pixel.0[3] = 0;
        }
    }
}

/// A tile is empty iff every pixel has alpha 0.
pub fn is_fully_transparent(tile: &RgbaImage) -> bool {
    tile.pixels().all(|p| p.0[3] == 0)
}
