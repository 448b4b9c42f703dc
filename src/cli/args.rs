//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Tilesmith: zoomable raster tile pyramids from vector map layers
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Tile output directory (overrides `build.output`)
    #[arg(short, long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Manifest file path (default: tilesmith.toml)
    #[arg(short = 'C', long, global = true, default_value = "tilesmith.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build the tile pyramids of all (or one) layers
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Show pyramid geometry and per-layer cache state
    #[command(visible_alias = "i")]
    Info,
}

/// Build command arguments
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Build only the layer with this id
    #[arg(short, long, value_name = "ID")]
    pub layer: Option<String>,

    /// Regenerate layers whose inputs changed since the cached build
    #[arg(short, long)]
    pub force: bool,

    /// Remove the whole output directory before building
    #[arg(short, long)]
    pub clean: bool,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

impl Cli {
    /// The `--layer` filter of a build, if any.
    pub fn layer_filter(&self) -> Option<&str> {
        match &self.command {
            Commands::Build { build_args } => build_args.layer.as_deref(),
            Commands::Info => None,
        }
    }
}
