//! Tile pyramid construction.
//!
//! # Modules
//!
//! | Module     | Purpose                                               |
//! |------------|-------------------------------------------------------|
//! | `geometry` | Tile dims, full zoom and zoom scale of a map          |
//! | `grid`     | Tile coordinates and crop rectangles over a raster    |
//! | `writer`   | Crop, color-key, omit-if-empty, PNG persistence       |
//! | `level`    | One render per (layer, zoom), tiles written in parallel |
//! | `pyramid`  | Layers × zoom levels fan-out with cache short-circuit |
//! | `error`    | `TileError`                                           |

mod error;
mod geometry;
mod grid;
mod level;
mod pyramid;
mod writer;

pub use error::TileError;
pub use geometry::{DEFAULT_TILE_SIZE, PyramidGeometry};
pub use level::LevelStats;
pub use pyramid::{
    BuildOptions, BuildReport, LayerOutcome, LayerReport, count_levels, make_tiles,
};
