//! Command-line interface module.

mod args;
pub mod build;
pub mod info;

pub use args::{BuildArgs, Cli, Commands};
