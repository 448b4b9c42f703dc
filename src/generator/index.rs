//! Tile index generation.
//!
//! # Index Format
//!
//! ```json
//! {
//!   "map": "body",
//!   "size": [4096, 3072],
//!   "tile_size": [256, 256],
//!   "full_zoom": 4,
//!   "layers": [
//!     {
//!       "id": "base",
//!       "zoom": [0, 4],
//!       "image_size": [4096, 3072],
//!       "url": "base/{z}/{x}/{y}.png"
//!     }
//!   ]
//! }
//! ```

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

use crate::config::MapConfig;
use crate::core::{PixelSize, ZoomRange};
use crate::freshness::fingerprint_path;
use crate::tile::BuildReport;
use crate::{debug, log};

/// File name of the index inside the output root.
pub const INDEX_FILE: &str = "index.json";

/// Write `index.json` for every layer with complete tiles on disk.
///
/// A layer is listed when it did not fail in `report` and its layer
/// directory holds a fingerprint, so layers outside a `--layer` filter
/// stay listed as long as an earlier build completed them.
pub fn build_index(config: &MapConfig, report: &BuildReport) -> Result<PathBuf> {
    let index = TileIndex::build(config, report);
    index.write(config)
}

#[derive(Debug, Serialize)]
struct TileIndex<'a> {
    map: &'a str,
    size: PixelSize,
    tile_size: PixelSize,
    full_zoom: u8,
    layers: Vec<IndexLayer<'a>>,
}

#[derive(Debug, Serialize)]
struct IndexLayer<'a> {
    id: &'a str,
    zoom: ZoomRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_size: Option<PixelSize>,
    url: String,
}

impl<'a> TileIndex<'a> {
    fn build(config: &'a MapConfig, report: &BuildReport) -> Self {
        let geometry = config.geometry();
        let failed: Vec<&str> = report.failed().map(|r| r.layer.as_str()).collect();

        let layers = config
            .layers
            .iter()
            .filter(|layer| {
                if failed.contains(&layer.id.as_str()) {
                    return false;
                }
                let complete = fingerprint_path(&config.layer_dir(&layer.id)).is_file();
                if !complete {
                    debug!("index"; "`{}` has no complete build, not listed", layer.id);
                }
                complete
            })
            .map(|layer| IndexLayer {
                id: &layer.id,
                zoom: layer.zoom_range(&geometry),
                image_size: layer.declared_image_size(config.map.size),
                url: tile_url_template(&layer.id),
            })
            .collect();

        Self {
            map: &config.map.id,
            size: config.map.size,
            tile_size: geometry.tile_size,
            full_zoom: geometry.full_zoom,
            layers,
        }
    }

    fn write(self, config: &MapConfig) -> Result<PathBuf> {
        let index_path = config.build.output.join(INDEX_FILE);
        let json = serde_json::to_string_pretty(&self).context("Failed to serialize tile index")?;

        fs::write(&index_path, json)
            .with_context(|| format!("Failed to write tile index to {}", index_path.display()))?;

        log!("index"; "{} ({} layers)", INDEX_FILE, self.layers.len());
        Ok(index_path)
    }
}

/// Tile URL template relative to the output root.
fn tile_url_template(layer: &str) -> String {
    format!("{layer}/{{z}}/{{x}}/{{y}}.png")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;
    use crate::tile::{LayerOutcome, LayerReport, TileError};
    use serde_json::Value;
    use tempfile::TempDir;

    const LAYERS: &str = r#"
[[layers]]
id = "base"
source = "base.svg"

[[layers]]
id = "nerves"
source = "nerves.svg"
zoom = [1, 1]
resolution = 2.0

[[layers]]
id = "bones"
source = "bones.svg"
"#;

    fn complete(config: &MapConfig, id: &str) {
        let dir = config.layer_dir(id);
        fs::create_dir_all(&dir).unwrap();
        fs::write(fingerprint_path(&dir), "00").unwrap();
    }

    fn read_index(path: &std::path::Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_tile_url_template() {
        assert_eq!(tile_url_template("base"), "base/{z}/{x}/{y}.png");
    }

    #[test]
    fn test_index_lists_complete_layers() {
        let dir = TempDir::new().unwrap();
        let mut config = test_parse_config(LAYERS);
        config.build.output = dir.path().to_path_buf();
        complete(&config, "base");
        complete(&config, "nerves");

        let path = build_index(&config, &BuildReport::default()).unwrap();
        let index = read_index(&path);

        assert_eq!(index["map"], "test");
        assert_eq!(index["size"], serde_json::json!([512, 512]));
        assert_eq!(index["tile_size"], serde_json::json!([256, 256]));
        assert_eq!(index["full_zoom"], 1);

        let layers = index["layers"].as_array().unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0]["id"], "base");
        assert_eq!(layers[0]["zoom"], serde_json::json!([0, 1]));
        assert_eq!(layers[0]["image_size"], serde_json::json!([512, 512]));
        assert_eq!(layers[0]["url"], "base/{z}/{x}/{y}.png");

        // Resolution without extent: size depends on the artwork canvas
        assert_eq!(layers[1]["id"], "nerves");
        assert!(layers[1].get("image_size").is_none());
    }

    #[test]
    fn test_index_omits_failed_layers() {
        let dir = TempDir::new().unwrap();
        let mut config = test_parse_config(LAYERS);
        config.build.output = dir.path().to_path_buf();
        complete(&config, "base");
        complete(&config, "bones");

        let report = BuildReport {
            layers: vec![LayerReport {
                layer: "bones".to_string(),
                zoom: ZoomRange::new(0, 1),
                outcome: LayerOutcome::Failed(vec![TileError::Conflict {
                    layer: "bones".to_string(),
                }]),
            }],
        };

        let index = read_index(&build_index(&config, &report).unwrap());
        let ids: Vec<_> = index["layers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|l| l["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["base"]);
    }
}
