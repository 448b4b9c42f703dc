//! `[[layers]]` table configuration.
//!
//! # Example
//!
//! ```toml
//! [[layers]]
//! id = "base"                  # Unique id, also the output directory name
//! source = "art/base.svg"      # Vector artwork (relative to manifest directory)
//! extent = [0, 0, 1024, 768]   # Source rectangle (default: artwork canvas)
//! resolution = 4.0             # Pixels per source unit (default: use map size)
//! origin = [0, 0]              # Pixel offset against the tile grid
//! zoom = [0, 4]                # Zoom levels to build (default: [0, full zoom])
//! transparent = "#ffffff"      # Color forced to full transparency
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::ConfigDiagnostics;
use crate::core::{Extent, KeyColor, MAX_ORIGIN, Origin, PixelSize, ZoomRange};
use crate::tile::PyramidGeometry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub id: String,

    /// Vector artwork path.
    pub source: PathBuf,

    /// Source rectangle to render, in source units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extent: Option<Extent>,

    /// Pixels per source unit; without it the layer renders at map size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<f64>,

    #[serde(default)]
    pub origin: Origin,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<ZoomRange>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparent: Option<KeyColor>,
}

impl LayerConfig {
    #[cfg(test)]
    pub fn new(id: &str, source: impl Into<PathBuf>) -> Self {
        Self {
            id: id.to_string(),
            source: source.into(),
            extent: None,
            resolution: None,
            origin: Origin::default(),
            zoom: None,
            transparent: None,
        }
    }

    /// Zoom levels to build, defaulting to the whole pyramid.
    pub fn zoom_range(&self, geometry: &PyramidGeometry) -> ZoomRange {
        self.zoom.unwrap_or_else(|| geometry.default_zoom())
    }

    /// Source rectangle to render, given the artwork's natural extent.
    pub fn effective_extent(&self, natural: Extent) -> Extent {
        self.extent.unwrap_or(natural)
    }

    /// Full-zoom pixel size of the rendered layer.
    pub fn image_size(&self, map_size: PixelSize, extent: Extent) -> PixelSize {
        match self.resolution {
            Some(resolution) => extent.pixel_size(resolution),
            None => map_size,
        }
    }

    /// Full-zoom pixel size when it is known without opening the artwork.
    ///
    /// `None` only for a `resolution` applied to the artwork's own canvas.
    pub fn declared_image_size(&self, map_size: PixelSize) -> Option<PixelSize> {
        match (self.resolution, self.extent) {
            (None, _) => Some(map_size),
            (Some(resolution), Some(extent)) => Some(extent.pixel_size(resolution)),
            (Some(_), None) => None,
        }
    }

    /// Validate this layer; `index` locates it in diagnostics.
    pub fn validate(&self, index: usize, diag: &mut ConfigDiagnostics) {
        let field = |name: &str| format!("layers[{index}].{name}");

        if let Some(problem) = id_problem(&self.id) {
            diag.error_with_hint(
                field("id"),
                problem,
                "layer ids name output directories: use letters, digits, `-` or `_`",
            );
        }

        if self.source.as_os_str().is_empty() {
            diag.error(field("source"), "source path must not be empty");
        }

        if let Some(extent) = self.extent
            && !extent.is_valid()
        {
            diag.error(
                field("extent"),
                format!("extent {extent} must be finite with positive width and height"),
            );
        }

        if let Some(resolution) = self.resolution
            && !(resolution.is_finite() && resolution > 0.0)
        {
            diag.error(field("resolution"), "resolution must be a positive number");
        }

        if !self.origin.is_bounded() {
            diag.error(
                field("origin"),
                format!("origin offsets must be within ±{MAX_ORIGIN} pixels"),
            );
        }

        if let Some(zoom) = self.zoom
            && !zoom.is_valid()
        {
            diag.error(
                field("zoom"),
                format!("zoom range [{}, {}] has min above max", zoom.min, zoom.max),
            );
        }
    }
}

/// Why `id` cannot be used as a single output path component.
fn id_problem(id: &str) -> Option<&'static str> {
    if id.trim().is_empty() {
        Some("layer id must not be empty")
    } else if id == "." || id == ".." {
        Some("layer id must not be `.` or `..`")
    } else if id.contains(['/', '\\']) {
        Some("layer id must not contain path separators")
    } else {
        None
    }
}
