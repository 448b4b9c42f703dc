//! Layer fingerprints using blake3.
//!
//! A fingerprint covers every input that shapes a layer's tiles. Each field
//! is written with a fixed-width or length-prefixed encoding and optional
//! fields carry a presence tag, so no two distinct input sets can produce
//! the same byte stream.

use crate::config::LayerConfig;
use crate::core::{PixelSize, ZoomRange};

/// A 256-bit layer fingerprint (blake3 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    #[inline]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Full hex form, as persisted in `layer.fingerprint`.
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Display first 16 chars of hex for brevity
        write!(f, "{}", &self.to_hex()[..16])
    }
}

/// Inputs hashed into a layer's fingerprint.
#[derive(Debug, Clone, Copy)]
pub struct FingerprintInputs<'a> {
    pub layer: &'a LayerConfig,
    pub source: &'a [u8],
    pub map_size: PixelSize,
    pub tile_size: PixelSize,
    /// Effective zoom range (configured or pyramid default).
    pub zoom: ZoomRange,
}

/// Compute a layer's fingerprint.
pub fn compute_fingerprint(inputs: &FingerprintInputs<'_>) -> Fingerprint {
    let layer = inputs.layer;
    let mut hasher = blake3::Hasher::new();

    update_bytes(&mut hasher, layer.id.as_bytes());
    hasher.update(blake3::hash(inputs.source).as_bytes());

    update_size(&mut hasher, inputs.map_size);
    update_size(&mut hasher, inputs.tile_size);

    match layer.extent {
        Some(extent) => {
            hasher.update(&[1]);
            for v in [extent.x, extent.y, extent.width, extent.height] {
                hasher.update(&v.to_bits().to_le_bytes());
            }
        }
        None => {
            hasher.update(&[0]);
        }
    }

    match layer.resolution {
        Some(resolution) => {
            hasher.update(&[1]);
            hasher.update(&resolution.to_bits().to_le_bytes());
        }
        None => {
            hasher.update(&[0]);
        }
    }

    hasher.update(&layer.origin.x.to_le_bytes());
    hasher.update(&layer.origin.y.to_le_bytes());

    match layer.transparent {
        Some(color) => {
            hasher.update(&[1]);
            hasher.update(&color.rgba());
        }
        None => {
            hasher.update(&[0]);
        }
    }

    hasher.update(&[inputs.zoom.min, inputs.zoom.max]);

    Fingerprint::new(*hasher.finalize().as_bytes())
}

fn update_bytes(hasher: &mut blake3::Hasher, bytes: &[u8]) {
    hasher.update(&(bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

fn update_size(hasher: &mut blake3::Hasher, size: PixelSize) {
    hasher.update(&size.width.to_le_bytes());
    hasher.update(&size.height.to_le_bytes());
}
