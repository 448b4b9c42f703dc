//! Path utilities.
//!
//! Pure functions for path manipulation, see [`fs`].

pub mod fs;

pub use fs::{display_relative, normalize_path, resolve_against};
