//! Auxiliary output generated after a build.
//!
//! - **Index**: `index.json` describing the map and its tile layers, for
//!   web-map clients
//!
//! The index is derived from the manifest and the build report, never from
//! a scan of the output directory.

pub mod index;
