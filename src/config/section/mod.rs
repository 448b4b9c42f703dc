//! Configuration section definitions.
//!
//! Each module corresponds to a section in `tilesmith.toml`:
//!
//! | Module   | TOML Section   | Purpose                                 |
//! |----------|----------------|-----------------------------------------|
//! | `map`    | `[map]`        | Map id and full-resolution size         |
//! | `build`  | `[build]`      | Output root, tile size, force/clean     |
//! | `layer`  | `[[layers]]`   | Per-layer source, extent, zoom, keying  |

mod build;
mod layer;
mod map;

pub use build::BuildSectionConfig;
pub use layer::LayerConfig;
pub use map::MapSectionConfig;
