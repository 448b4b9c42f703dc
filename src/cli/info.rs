//! `info` command: pyramid geometry and per-layer cache state.

use anyhow::Result;
use owo_colors::OwoColorize;
use std::fmt;
use std::fs;

use crate::{
    config::{LayerConfig, MapConfig},
    core::{PixelSize, ZoomRange},
    freshness::{CacheState, FingerprintInputs, compute_fingerprint, probe},
    log,
    render::{Rasterizer, SvgRasterizer},
    tile::PyramidGeometry,
    utils::path::display_relative,
};

/// Print the map's pyramid layout and one line per layer.
pub fn show_info(config: &MapConfig) -> Result<()> {
    let geometry = config.geometry();
    log!("info"; "map `{}` {}", config.map.id, config.map.size);
    log!(
        "info";
        "{}×{} tiles of {}, padded to {}, full zoom {}",
        geometry.tile_dims.0,
        geometry.tile_dims.1,
        geometry.tile_size,
        geometry.tiled_size,
        geometry.full_zoom
    );
    log!(
        "info";
        "output {}",
        display_relative(&config.build.output, config.get_root())
    );

    let rasterizer = SvgRasterizer::new().with_resources_dir(config.get_root());
    for layer in &config.layers {
        let info = LayerInfo::probe(config, &geometry, layer, &rasterizer);
        log!("layer"; "{}", info);
    }

    Ok(())
}

/// What `info` knows about one layer without building it.
#[derive(Debug)]
struct LayerInfo {
    id: String,
    zoom: ZoomRange,
    image_size: Option<PixelSize>,
    state: Result<CacheState, String>,
}

impl LayerInfo {
    fn probe(
        config: &MapConfig,
        geometry: &PyramidGeometry,
        layer: &LayerConfig,
        rasterizer: &dyn Rasterizer,
    ) -> Self {
        let zoom = layer.zoom_range(geometry);
        let mut info = Self {
            id: layer.id.clone(),
            zoom,
            image_size: layer.declared_image_size(config.map.size),
            state: Err(String::new()),
        };

        let source = match fs::read(&layer.source) {
            Ok(source) => source,
            Err(e) => {
                info.state = Err(format!("source unreadable: {e}"));
                return info;
            }
        };

        // Resolution over the artwork canvas needs the parsed document
        if info.image_size.is_none()
            && let Ok(context) = rasterizer.open(&source)
        {
            let extent = layer.effective_extent(context.natural_extent());
            info.image_size = Some(layer.image_size(config.map.size, extent));
        }

        let fingerprint = compute_fingerprint(&FingerprintInputs {
            layer,
            source: &source,
            map_size: config.map.size,
            tile_size: geometry.tile_size,
            zoom,
        });
        info.state = probe(&config.layer_dir(&layer.id), fingerprint).map_err(|e| e.to_string());
        info
    }
}

impl fmt::Display for LayerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size = self
            .image_size
            .map_or_else(|| "unknown size".to_string(), |s| s.to_string());
        write!(f, "{} {} zoom {} ", self.id.bold(), size, self.zoom)?;
        match &self.state {
            Ok(CacheState::Fresh) => write!(f, "{}", CacheState::Fresh.label().green()),
            Ok(CacheState::Stale) => write!(f, "{}", CacheState::Stale.label().yellow()),
            Ok(state) => write!(f, "{}", state.label().dimmed()),
            Err(reason) => write!(f, "{}", reason.red()),
        }
    }
}
