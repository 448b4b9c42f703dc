//! Tile build error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building one layer's tiles.
///
/// Every variant names the layer or path it concerns so the aggregated
/// build report can attribute failures without extra context.
#[derive(Debug, Error)]
pub enum TileError {
    /// Cached tiles exist with a different fingerprint and `--force` was not given.
    #[error("layer `{layer}` has cached tiles from different inputs (use --force to overwrite)")]
    Conflict { layer: String },

    /// The rasterizer failed or returned malformed pixels.
    #[error("failed to render layer `{layer}`{}: {reason}", zoom_suffix(.zoom))]
    Render {
        layer: String,
        zoom: Option<u8>,
        reason: String,
    },

    /// Vector source could not be read, so no fingerprint can be computed.
    #[error("cannot read source of layer `{layer}` at `{}`: {source}", .path.display())]
    Source {
        layer: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error at `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode tile `{}`: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl TileError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn render(layer: &str, zoom: Option<u8>, reason: impl ToString) -> Self {
        Self::Render {
            layer: layer.to_string(),
            zoom,
            reason: reason.to_string(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

fn zoom_suffix(zoom: &Option<u8>) -> String {
    zoom.map(|z| format!(" at zoom {z}")).unwrap_or_default()
}
