//! One (layer, zoom) unit: a single render, then a parallel sweep over tiles.

use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::grid::compute_tile_slices;
use super::writer::TileWriter;
use super::{PyramidGeometry, TileError};
use crate::core::{Extent, Origin, PixelSize};
use crate::render::RenderContext;

/// Everything a zoom level needs to know about its layer.
#[derive(Clone, Copy)]
pub struct LevelJob<'a> {
    pub layer: &'a str,
    pub context: &'a dyn RenderContext,
    pub writer: &'a TileWriter,
    pub geometry: &'a PyramidGeometry,
    /// Source rectangle rendered at every level.
    pub extent: Extent,
    /// Full-zoom pixel size of the layer.
    pub image_size: PixelSize,
    pub origin: Origin,
}

/// Tiles produced by one zoom level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelStats {
    pub written: usize,
    pub omitted: usize,
}

impl LevelStats {
    pub fn merge(self, other: Self) -> Self {
        Self {
            written: self.written + other.written,
            omitted: self.omitted + other.omitted,
        }
    }
}

/// Render `zoom` once and write every visible tile of it.
///
/// Tiles are written in parallel; the first write error fails the level,
/// although tiles already in flight may still land on disk.
pub fn tile_zoom_level(job: &LevelJob<'_>, zoom: u8) -> Result<LevelStats, TileError> {
    let scale = job.geometry.zoom_scale(zoom);
    let size = job.image_size.scaled_down(scale);
    let origin = job.origin.scaled_down(scale);

    let raster = job
        .context
        .render(job.extent, size)
        .map_err(|e| TileError::render(job.layer, Some(zoom), format!("{e:#}")))?;

    if raster.dimensions() != (size.width, size.height) {
        let (width, height) = raster.dimensions();
        return Err(TileError::render(
            job.layer,
            Some(zoom),
            format!("rasterizer returned {width}×{height}, expected {size}"),
        ));
    }

    let written = AtomicUsize::new(0);
    let omitted = AtomicUsize::new(0);

    compute_tile_slices(size, origin, job.geometry.tile_size)
        .par_bridge()
        .try_for_each(|slice| {
            let outcome = job.writer.write_tile_if_visible(&raster, zoom, &slice)?;
            let counter = if outcome.is_written() { &written } else { &omitted };
            counter.fetch_add(1, Ordering::Relaxed);
            Ok::<_, TileError>(())
        })?;

    Ok(LevelStats {
        written: written.into_inner(),
        omitted: omitted.into_inner(),
    })
}
