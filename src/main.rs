//! Tilesmith - zoomable raster tile pyramids from vector map layers.

mod cli;
mod config;
mod core;
mod freshness;
mod generator;
mod logger;
mod render;
mod tile;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands, build::build_tiles, info::show_info};
use config::MapConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = match MapConfig::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            // Diagnostics render their own colored, multi-line report
            log!("error"; "{:#}", e);
            std::process::exit(2);
        }
    };

    match &cli.command {
        Commands::Build { .. } => {
            let report = build_tiles(&config, cli.layer_filter())?;
            if report.has_failures() {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Info => show_info(&config),
    }
}
