//! Whole-map orchestration: layers fan out in parallel, each layer's zoom
//! levels fan out again, and each level fans out over its tiles.
//!
//! # Layer lifecycle
//!
//! ```text
//! read source ─► fingerprint ─► cache decision
//!                                  │
//!                  Skip ◄──────────┼──────────► Conflict (error)
//!                                  ▼
//!                 open context ─► clear dir ─► zoom levels (parallel)
//!                                                   │
//!                                   all ok ─► write fingerprint
//! ```
//!
//! A layer's fingerprint is written only after every zoom level finished
//! without error, so a partial build is never mistaken for a cached one.

use rayon::prelude::*;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::level::{LevelJob, LevelStats, tile_zoom_level};
use super::writer::TileWriter;
use super::{PyramidGeometry, TileError};
use crate::config::{LayerConfig, MapConfig};
use crate::core::ZoomRange;
use crate::freshness::{
    CacheDecision, FingerprintInputs, clear_layer_dir, compute_fingerprint, should_regenerate,
    write_fingerprint,
};
use crate::logger::ProgressLine;
use crate::render::Rasterizer;
use crate::{debug, log};

/// Build options resolved from manifest and command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions<'a> {
    /// Build only the layer with this id.
    pub layer: Option<&'a str>,
    /// Overwrite layers whose inputs changed.
    pub force: bool,
}

/// What happened to one layer.
#[derive(Debug)]
pub enum LayerOutcome {
    Built(LevelStats),
    /// Fingerprint matched; nothing was touched.
    Cached,
    Failed(Vec<TileError>),
}

#[derive(Debug)]
pub struct LayerReport {
    pub layer: String,
    pub zoom: ZoomRange,
    pub outcome: LayerOutcome,
}

impl LayerReport {
    pub fn is_ok(&self) -> bool {
        !matches!(self.outcome, LayerOutcome::Failed(_))
    }
}

/// Per-layer outcomes of a build, in manifest order.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub layers: Vec<LayerReport>,
}

impl BuildReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &LayerReport> {
        self.layers.iter().filter(|r| r.is_ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &LayerReport> {
        self.layers.iter().filter(|r| !r.is_ok())
    }

    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
    }

    pub fn count_cached(&self) -> usize {
        self.layers
            .iter()
            .filter(|r| matches!(r.outcome, LayerOutcome::Cached))
            .count()
    }

    /// Sum of tile stats over rebuilt layers.
    pub fn tiles(&self) -> LevelStats {
        self.layers
            .iter()
            .filter_map(|r| match r.outcome {
                LayerOutcome::Built(stats) => Some(stats),
                _ => None,
            })
            .fold(LevelStats::default(), LevelStats::merge)
    }
}

/// Total zoom levels a build will visit, for progress display.
pub fn count_levels(config: &MapConfig, options: &BuildOptions<'_>) -> usize {
    let geometry = config.geometry();
    config
        .selected_layers(options.layer)
        .map(|layer| layer.zoom_range(&geometry).len())
        .sum()
}

/// Build the tile pyramid of every selected layer.
///
/// Never fails as a whole: each layer's errors are collected into its
/// [`LayerReport`] and the other layers keep going.
pub fn make_tiles(
    config: &MapConfig,
    rasterizer: &dyn Rasterizer,
    options: &BuildOptions<'_>,
    progress: Option<&ProgressLine>,
) -> BuildReport {
    let run = PyramidRun {
        config,
        geometry: config.geometry(),
        rasterizer,
        force: options.force,
        progress,
    };

    debug!(
        "build";
        "pyramid: {} tiles of {} at full zoom {}",
        format!("{}×{}", run.geometry.tile_dims.0, run.geometry.tile_dims.1),
        run.geometry.tile_size,
        run.geometry.full_zoom
    );

    let selected: Vec<&LayerConfig> = config.selected_layers(options.layer).collect();
    let layers = selected
        .par_iter()
        .map(|layer| run.build_layer(layer))
        .collect();

    BuildReport { layers }
}

/// Shared, read-only state of one `make_tiles` call.
struct PyramidRun<'a> {
    config: &'a MapConfig,
    geometry: PyramidGeometry,
    rasterizer: &'a dyn Rasterizer,
    force: bool,
    progress: Option<&'a ProgressLine>,
}

impl PyramidRun<'_> {
    fn build_layer(&self, layer: &LayerConfig) -> LayerReport {
        let zoom = layer.zoom_range(&self.geometry);
        let levels_done = AtomicUsize::new(0);

        let outcome = match self.regenerate(layer, zoom, &levels_done) {
            Ok(outcome) => outcome,
            Err(errors) => {
                for error in &errors {
                    log!("error"; "{}", error);
                }
                LayerOutcome::Failed(errors)
            }
        };

        if let Some(progress) = self.progress {
            // Cached and early-failed layers never ran their levels
            progress.inc_by("levels", zoom.len() - levels_done.into_inner());
            progress.inc("layers");
        }

        LayerReport {
            layer: layer.id.clone(),
            zoom,
            outcome,
        }
    }

    fn regenerate(
        &self,
        layer: &LayerConfig,
        zoom: ZoomRange,
        levels_done: &AtomicUsize,
    ) -> Result<LayerOutcome, Vec<TileError>> {
        let source = fs::read(&layer.source).map_err(|source| {
            vec![TileError::Source {
                layer: layer.id.clone(),
                path: layer.source.clone(),
                source,
            }]
        })?;

        let fingerprint = compute_fingerprint(&FingerprintInputs {
            layer,
            source: &source,
            map_size: self.config.map.size,
            tile_size: self.geometry.tile_size,
            zoom,
        });

        let layer_dir = self.config.layer_dir(&layer.id);
        match should_regenerate(&layer.id, &layer_dir, fingerprint, self.force) {
            Ok(CacheDecision::Skip) => {
                log!("cached"; "`{}` unchanged ({})", layer.id, fingerprint);
                return Ok(LayerOutcome::Cached);
            }
            Ok(CacheDecision::Regenerate) => {}
            Err(e) => return Err(vec![e]),
        }

        // Open before clearing, so unreadable artwork keeps the old tiles
        let context = self
            .rasterizer
            .open(&source)
            .map_err(|e| vec![TileError::render(&layer.id, None, format!("{e:#}"))])?;

        let extent = layer.effective_extent(context.natural_extent());
        if !extent.is_valid() {
            return Err(vec![TileError::render(
                &layer.id,
                None,
                format!("artwork extent {extent} is empty"),
            )]);
        }
        let image_size = layer.image_size(self.config.map.size, extent);

        clear_layer_dir(&layer_dir).map_err(|e| vec![e])?;
        debug!(
            "build";
            "`{}`: {} at {}, zoom {}",
            layer.id, extent, image_size, zoom
        );

        let writer = TileWriter::new(&layer_dir, layer.transparent);
        let job = LevelJob {
            layer: &layer.id,
            context: context.as_ref(),
            writer: &writer,
            geometry: &self.geometry,
            extent,
            image_size,
            origin: layer.origin,
        };

        let results: Vec<Result<LevelStats, TileError>> = zoom
            .levels()
            .into_par_iter()
            .map(|level| {
                let result = tile_zoom_level(&job, level);
                levels_done.fetch_add(1, Ordering::Relaxed);
                if let Some(progress) = self.progress {
                    progress.inc("levels");
                }
                result
            })
            .collect();

        let mut stats = LevelStats::default();
        let mut errors = Vec::new();
        for result in results {
            match result {
                Ok(level) => stats = stats.merge(level),
                Err(e) => errors.push(e),
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        write_fingerprint(&layer_dir, fingerprint).map_err(|e| vec![e])?;
        log!(
            "build";
            "`{}` done: {} tiles written, {} empty",
            layer.id, stats.written, stats.omitted
        );

        Ok(LayerOutcome::Built(stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;
    use crate::core::{Extent, PixelSize};
    use crate::render::RenderContext;
    use anyhow::{Result, bail};
    use image::{Rgba, RgbaImage};
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// In-memory rasterizer driven by the source bytes:
    /// - `solid`: opaque everywhere
    /// - `empty`: fully transparent
    /// - `fail-<w>`: fails renders of width `<w>`
    /// - anything else: fails to open
    #[derive(Default)]
    struct FakeRasterizer {
        renders: Arc<AtomicUsize>,
    }

    impl FakeRasterizer {
        fn renders(&self) -> usize {
            self.renders.load(Ordering::SeqCst)
        }
    }

    struct FakeContext {
        kind: String,
        renders: Arc<AtomicUsize>,
    }

    impl Rasterizer for FakeRasterizer {
        fn open(&self, source: &[u8]) -> Result<Box<dyn RenderContext>> {
            let kind = String::from_utf8_lossy(source).trim().to_string();
            if kind != "solid" && kind != "empty" && !kind.starts_with("fail-") {
                bail!("unsupported document `{kind}`");
            }
            Ok(Box::new(FakeContext {
                kind,
                renders: Arc::clone(&self.renders),
            }))
        }
    }

    impl RenderContext for FakeContext {
        fn natural_extent(&self) -> Extent {
            Extent::new(0.0, 0.0, 512.0, 512.0)
        }

        fn render(&self, _extent: Extent, size: PixelSize) -> Result<RgbaImage> {
            self.renders.fetch_add(1, Ordering::SeqCst);
            if self.kind == format!("fail-{}", size.width) {
                bail!("renderer crashed at {size}");
            }
            let alpha = if self.kind == "empty" { 0 } else { 255 };
            Ok(RgbaImage::from_pixel(
                size.width,
                size.height,
                Rgba([10, 20, 30, alpha]),
            ))
        }
    }

    /// Write one source file per `(id, content)` and a manifest using them.
    fn fixture(dir: &Path, layers: &[(&str, &str)], extra: &str) -> MapConfig {
        let mut manifest = String::new();
        for (id, content) in layers {
            let source = dir.join(format!("{id}.svg"));
            fs::write(&source, content).unwrap();
            manifest.push_str(&format!(
                "[[layers]]\nid = \"{id}\"\nsource = '{}'\nextent = [0, 0, 512, 512]\nzoom = [0, 1]\n{extra}\n",
                source.display()
            ));
        }
        let mut config = test_parse_config(&manifest);
        config.build.output = dir.join("tiles");
        config
    }

    fn build(config: &MapConfig, rasterizer: &FakeRasterizer, force: bool) -> BuildReport {
        let options = BuildOptions {
            layer: None,
            force,
        };
        make_tiles(config, rasterizer, &options, None)
    }

    fn tile_files(dir: &Path) -> Vec<String> {
        let mut files = Vec::new();
        collect_pngs(dir, dir, &mut files);
        files.sort();
        files
    }

    fn collect_pngs(root: &Path, dir: &Path, out: &mut Vec<String>) {
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                collect_pngs(root, &path, out);
            } else if path.extension().is_some_and(|e| e == "png") {
                let rel = path.strip_prefix(root).unwrap();
                out.push(rel.to_string_lossy().replace('\\', "/"));
            }
        }
    }

    #[test]
    fn test_end_to_end_pyramid() {
        let dir = TempDir::new().unwrap();
        let config = fixture(dir.path(), &[("base", "solid")], "");
        let rasterizer = FakeRasterizer::default();

        let report = build(&config, &rasterizer, false);

        assert!(!report.has_failures());
        assert_eq!(rasterizer.renders(), 2);
        assert_eq!(
            tile_files(&config.layer_dir("base")),
            vec!["0/0/0.png", "1/0/0.png", "1/0/1.png", "1/1/0.png", "1/1/1.png"]
        );
        assert_eq!(report.tiles(), LevelStats { written: 5, omitted: 0 });
        assert!(config.layer_dir("base").join("layer.fingerprint").exists());

        let zoom0 = image::open(config.layer_dir("base").join("0/0/0.png")).unwrap();
        assert_eq!((zoom0.width(), zoom0.height()), (256, 256));
    }

    #[test]
    fn test_transparent_layer_writes_no_tiles() {
        let dir = TempDir::new().unwrap();
        let config = fixture(dir.path(), &[("ghost", "empty")], "");
        let rasterizer = FakeRasterizer::default();

        let report = build(&config, &rasterizer, false);

        assert!(!report.has_failures());
        assert!(tile_files(&config.layer_dir("ghost")).is_empty());
        assert_eq!(report.tiles().omitted, 5);
    }

    #[test]
    fn test_color_key_omits_matching_tiles() {
        let dir = TempDir::new().unwrap();
        let config = fixture(dir.path(), &[("keyed", "solid")], "transparent = \"#0a141e\"");
        let rasterizer = FakeRasterizer::default();

        build(&config, &rasterizer, false);

        assert!(tile_files(&config.layer_dir("keyed")).is_empty());
    }

    #[test]
    fn test_unchanged_rebuild_is_cached() {
        let dir = TempDir::new().unwrap();
        let config = fixture(dir.path(), &[("base", "solid")], "");
        let first = FakeRasterizer::default();
        build(&config, &first, false);

        let tile = config.layer_dir("base").join("1/0/0.png");
        let written_at = fs::metadata(&tile).unwrap().modified().unwrap();

        let second = FakeRasterizer::default();
        let report = build(&config, &second, false);

        assert_eq!(second.renders(), 0);
        assert_eq!(report.count_cached(), 1);
        assert_eq!(fs::metadata(&tile).unwrap().modified().unwrap(), written_at);
    }

    #[test]
    fn test_changed_inputs_conflict_without_force() {
        let dir = TempDir::new().unwrap();
        let config = fixture(dir.path(), &[("base", "solid")], "");
        build(&config, &FakeRasterizer::default(), false);

        fs::write(dir.path().join("base.svg"), "empty").unwrap();
        let rasterizer = FakeRasterizer::default();
        let report = build(&config, &rasterizer, false);

        assert_eq!(rasterizer.renders(), 0);
        let LayerOutcome::Failed(errors) = &report.layers[0].outcome else {
            panic!("expected conflict, got {:?}", report.layers[0].outcome);
        };
        assert!(errors[0].is_conflict());
        // Old tiles are untouched
        assert_eq!(tile_files(&config.layer_dir("base")).len(), 5);
    }

    #[test]
    fn test_force_clears_and_regenerates() {
        let dir = TempDir::new().unwrap();
        let config = fixture(dir.path(), &[("base", "solid")], "");
        build(&config, &FakeRasterizer::default(), false);
        fs::write(config.layer_dir("base").join("stray.txt"), "x").unwrap();

        fs::write(dir.path().join("base.svg"), "empty").unwrap();
        let rasterizer = FakeRasterizer::default();
        let report = build(&config, &rasterizer, true);

        assert!(!report.has_failures());
        assert_eq!(rasterizer.renders(), 2);
        assert!(tile_files(&config.layer_dir("base")).is_empty());
        assert!(!config.layer_dir("base").join("stray.txt").exists());

        // The new fingerprint makes the next run a cache hit
        let again = FakeRasterizer::default();
        assert_eq!(build(&config, &again, false).count_cached(), 1);
    }

    #[test]
    fn test_failing_layer_does_not_block_others() {
        let dir = TempDir::new().unwrap();
        let config = fixture(dir.path(), &[("base", "solid"), ("nerves", "fail-512")], "");
        let rasterizer = FakeRasterizer::default();

        let report = build(&config, &rasterizer, false);

        let names: Vec<_> = report.layers.iter().map(|r| r.layer.as_str()).collect();
        assert_eq!(names, vec!["base", "nerves"]);
        assert!(report.layers[0].is_ok());

        let LayerOutcome::Failed(errors) = &report.layers[1].outcome else {
            panic!("expected failure");
        };
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], TileError::Render { zoom: Some(1), .. }));

        // Zoom 0 still ran, but the layer is not marked complete
        assert!(config.layer_dir("nerves").join("0/0/0.png").exists());
        assert!(!config.layer_dir("nerves").join("layer.fingerprint").exists());
        assert!(config.layer_dir("base").join("layer.fingerprint").exists());
    }

    #[test]
    fn test_failed_layer_retries_on_next_run() {
        let dir = TempDir::new().unwrap();
        let config = fixture(dir.path(), &[("nerves", "fail-512")], "");
        build(&config, &FakeRasterizer::default(), false);

        // No fingerprint was written, so this is not a conflict
        let rasterizer = FakeRasterizer::default();
        let report = build(&config, &rasterizer, false);
        assert_eq!(rasterizer.renders(), 2);
        let LayerOutcome::Failed(errors) = &report.layers[0].outcome else {
            panic!("expected failure");
        };
        assert!(!errors[0].is_conflict());
    }

    #[test]
    fn test_unopenable_source_keeps_old_tiles() {
        let dir = TempDir::new().unwrap();
        let config = fixture(dir.path(), &[("base", "solid")], "");
        build(&config, &FakeRasterizer::default(), false);

        fs::write(dir.path().join("base.svg"), "<garbage").unwrap();
        let report = build(&config, &FakeRasterizer::default(), true);

        assert!(report.has_failures());
        assert_eq!(tile_files(&config.layer_dir("base")).len(), 5);
    }

    #[test]
    fn test_missing_source_is_source_error() {
        let dir = TempDir::new().unwrap();
        let config = fixture(dir.path(), &[("base", "solid")], "");
        fs::remove_file(dir.path().join("base.svg")).unwrap();

        let report = build(&config, &FakeRasterizer::default(), false);

        let LayerOutcome::Failed(errors) = &report.layers[0].outcome else {
            panic!("expected failure");
        };
        assert!(matches!(errors[0], TileError::Source { .. }));
    }

    #[test]
    fn test_unwritable_layer_dir_fails_only_that_layer() {
        let dir = TempDir::new().unwrap();
        let config = fixture(dir.path(), &[("base", "solid"), ("nerves", "solid")], "");
        // A regular file where the layer directory should be
        fs::create_dir_all(&config.build.output).unwrap();
        fs::write(config.layer_dir("base"), "not a directory").unwrap();

        let report = build(&config, &FakeRasterizer::default(), false);

        let LayerOutcome::Failed(errors) = &report.layers[0].outcome else {
            panic!("expected failure");
        };
        assert!(matches!(errors[0], TileError::Io { .. }));
        assert!(!config.layer_dir("base").join("layer.fingerprint").exists());

        assert!(report.layers[1].is_ok());
        assert!(config.layer_dir("nerves").join("layer.fingerprint").exists());
        assert_eq!(tile_files(&config.layer_dir("nerves")).len(), 5);
    }

    #[test]
    fn test_layer_filter() {
        let dir = TempDir::new().unwrap();
        let config = fixture(dir.path(), &[("base", "solid"), ("nerves", "solid")], "");
        let rasterizer = FakeRasterizer::default();
        let options = BuildOptions {
            layer: Some("nerves"),
            force: false,
        };

        let report = make_tiles(&config, &rasterizer, &options, None);

        assert_eq!(report.layers.len(), 1);
        assert_eq!(report.layers[0].layer, "nerves");
        assert!(!config.layer_dir("base").exists());
        assert_eq!(count_levels(&config, &options), 2);
    }

    #[test]
    fn test_progress_counts_cached_levels() {
        let dir = TempDir::new().unwrap();
        let config = fixture(dir.path(), &[("base", "solid")], "");
        build(&config, &FakeRasterizer::default(), false);

        let options = BuildOptions::default();
        let levels = count_levels(&config, &options);
        let progress = ProgressLine::new(&[("layers", 1), ("levels", levels)]);
        make_tiles(&config, &FakeRasterizer::default(), &options, Some(&progress));

        assert_eq!(progress.line(), "layers(1/1) levels(2/2)");
        progress.finish();
    }
}
