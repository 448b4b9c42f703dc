//! Persisted layer fingerprints and the regenerate/skip decision.
//!
//! The fingerprint file lives inside the layer directory and is written
//! only after every tile of a regeneration has been written, so its
//! presence means "this directory is a complete build of these inputs".

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::Fingerprint;
use crate::tile::TileError;

/// Fingerprint file name inside each layer directory.
pub const FINGERPRINT_FILE: &str = "layer.fingerprint";

/// State of a layer's cached tiles relative to a computed fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// No fingerprint on disk.
    Missing,
    /// Stored fingerprint matches.
    Fresh,
    /// Stored fingerprint differs.
    Stale,
}

impl CacheState {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Fresh => "fresh",
            Self::Stale => "stale",
        }
    }
}

/// What the orchestrator should do with a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheDecision {
    Skip,
    Regenerate,
}

pub fn fingerprint_path(layer_dir: &Path) -> PathBuf {
    layer_dir.join(FINGERPRINT_FILE)
}

/// Read the stored fingerprint as an opaque string, if any.
pub fn read_fingerprint(layer_dir: &Path) -> Result<Option<String>, TileError> {
    let path = fingerprint_path(layer_dir);
    match fs::read_to_string(&path) {
        Ok(content) => Ok(Some(content.trim().to_string())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(TileError::io(path, e)),
    }
}

/// Persist `fingerprint` for a completed layer.
pub fn write_fingerprint(layer_dir: &Path, fingerprint: Fingerprint) -> Result<(), TileError> {
    let path = fingerprint_path(layer_dir);
    fs::write(&path, fingerprint.to_hex()).map_err(|e| TileError::io(path, e))
}

/// Compare the stored fingerprint with `computed`.
pub fn probe(layer_dir: &Path, computed: Fingerprint) -> Result<CacheState, TileError> {
    Ok(match read_fingerprint(layer_dir)? {
        None => CacheState::Missing,
        Some(stored) if stored == computed.to_hex() => CacheState::Fresh,
        Some(_) => CacheState::Stale,
    })
}

/// Decide whether a layer must be regenerated.
///
/// A stale layer is only overwritten with `force`; otherwise the caller
/// gets [`TileError::Conflict`].
pub fn should_regenerate(
    layer: &str,
    layer_dir: &Path,
    computed: Fingerprint,
    force: bool,
) -> Result<CacheDecision, TileError> {
    match probe(layer_dir, computed)? {
        CacheState::Missing => Ok(CacheDecision::Regenerate),
        CacheState::Fresh => Ok(CacheDecision::Skip),
        CacheState::Stale if force => Ok(CacheDecision::Regenerate),
        CacheState::Stale => Err(TileError::Conflict {
            layer: layer.to_string(),
        }),
    }
}

/// Remove everything in `layer_dir` and recreate it empty.
pub fn clear_layer_dir(layer_dir: &Path) -> Result<(), TileError> {
    match fs::remove_dir_all(layer_dir) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(TileError::io(layer_dir, e)),
    }
    fs::create_dir_all(layer_dir).map_err(|e| TileError::io(layer_dir, e))
}
