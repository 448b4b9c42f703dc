//! Tile building orchestration.
//!
//! Build phases:
//! - **Init** - Clean (with `--clean`) and create the output root
//! - **Tile** - Parallel pyramid build of every selected layer
//! - **Index** - Write `index.json` for complete layers
//! - **Finalize** - Summary logging

use anyhow::{Context, Result};
use std::{fs, io};

use crate::{
    config::MapConfig,
    debug,
    generator::index::build_index,
    log,
    logger::ProgressLine,
    render::SvgRasterizer,
    tile::{
        BuildOptions, BuildReport, LayerOutcome, LayerReport, LevelStats, TileError, count_levels,
        make_tiles,
    },
    utils::{path::display_relative, plural::plural_count},
};

/// Build the tile pyramids of all layers, or only `layer`.
///
/// Layer failures do not make this return `Err`; they are in the report.
pub fn build_tiles(config: &MapConfig, layer: Option<&str>) -> Result<BuildReport> {
    init_output(config)?;

    let options = BuildOptions {
        layer,
        force: config.build.force,
    };
    let layers = config.selected_layers(layer).count();
    log!(
        "build";
        "{} into {}",
        plural_count(layers, "layer"),
        display_relative(&config.build.output, config.get_root())
    );

    let rasterizer = SvgRasterizer::new().with_resources_dir(config.get_root());
    let progress = ProgressLine::new(&[
        ("layers", layers),
        ("levels", count_levels(config, &options)),
    ]);
    let report = make_tiles(config, &rasterizer, &options, Some(&progress));
    progress.finish();

    build_index(config, &report)?;
    log_summary(&report);

    Ok(report)
}

/// Clean (if requested) and create the output root.
fn init_output(config: &MapConfig) -> Result<()> {
    let output = &config.build.output;

    if config.build.clean {
        match fs::remove_dir_all(output) {
            Ok(()) => log!("clean"; "removed {}", display_relative(output, config.get_root())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to clean output {}", output.display()));
            }
        }
    }

    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output {}", output.display()))
}

fn log_summary(report: &BuildReport) {
    for layer in &report.layers {
        debug!("build"; "{}", layer_line(layer));
    }

    let built = report.succeeded().count() - report.count_cached();
    log!(
        "build";
        "{} built ({}), {} cached",
        plural_count(built, "layer"),
        tile_counts(&report.tiles()),
        report.count_cached()
    );

    if report.has_failures() {
        let failed: Vec<String> = report.failed().map(failure_label).collect();
        log!(
            "error";
            "{} failed: {}",
            plural_count(failed.len(), "layer"),
            failed.join(", ")
        );
    }

    let conflicts = report.failed().any(|r| match &r.outcome {
        LayerOutcome::Failed(errors) => errors.iter().any(TileError::is_conflict),
        _ => false,
    });
    if conflicts {
        log!("hint"; "inputs changed since the cached build, rerun with --force to overwrite");
    }
}

/// `base zoom 0..=3: 21 tiles, 4 empty`
fn layer_line(report: &LayerReport) -> String {
    let state = match &report.outcome {
        LayerOutcome::Built(stats) => tile_counts(stats),
        LayerOutcome::Cached => "cached".to_string(),
        LayerOutcome::Failed(errors) => format!("failed ({})", plural_count(errors.len(), "error")),
    };
    format!("{} zoom {}: {}", report.layer, report.zoom, state)
}

/// `21 tiles, 4 empty`
fn tile_counts(stats: &LevelStats) -> String {
    format!("{}, {} empty", plural_count(stats.written, "tile"), stats.omitted)
}

/// `nerves (2 errors)`
fn failure_label(report: &LayerReport) -> String {
    match &report.outcome {
        LayerOutcome::Failed(errors) => {
            format!("{} ({})", report.layer, plural_count(errors.len(), "error"))
        }
        _ => report.layer.clone(),
    }
}
