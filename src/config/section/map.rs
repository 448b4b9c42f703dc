//! `[map]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [map]
//! id = "body"
//! size = [4096, 3072]   # Full-resolution pixel size
//! ```

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;
use crate::core::PixelSize;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSectionConfig {
    pub id: String,
    pub size: PixelSize,
}

impl MapSectionConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.id.trim().is_empty() {
            diag.error("map.id", "map id must not be empty");
        }
        if self.size.is_empty() {
            diag.error("map.size", "map width and height must be positive");
        }
    }
}
