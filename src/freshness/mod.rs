//! Freshness detection: blake3 layer fingerprints and the fingerprint cache.

mod hash;
mod store;

pub use hash::{Fingerprint, FingerprintInputs, compute_fingerprint};
pub use store::{
    CacheDecision, CacheState, clear_layer_dir, fingerprint_path, probe, should_regenerate,
    write_fingerprint,
};
