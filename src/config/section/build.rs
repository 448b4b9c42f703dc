//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! output = "tiles"            # Output root (relative to manifest directory)
//! tile_size = [256, 256]      # Tile pixel size
//! force = false               # Overwrite layers whose inputs changed
//! clean = false               # Remove the whole output root before building
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::ConfigDiagnostics;
use crate::core::PixelSize;
use crate::tile::DEFAULT_TILE_SIZE;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSectionConfig {
    /// Tile output root.
    pub output: PathBuf,

    /// Tile pixel size.
    pub tile_size: PixelSize,

    /// Regenerate layers whose cached fingerprint no longer matches.
    pub force: bool,

    /// Remove the output root before building.
    pub clean: bool,
}

impl Default for BuildSectionConfig {
    fn default() -> Self {
        Self {
            output: "tiles".into(),
            tile_size: DEFAULT_TILE_SIZE,
            force: false,
            clean: false,
        }
    }
}

impl BuildSectionConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.tile_size.is_empty() {
            diag.error("build.tile_size", "tile width and height must be positive");
        }
        if self.output.as_os_str().is_empty() {
            diag.error("build.output", "output directory must not be empty");
        }
    }
}
