//! Map manifest management for `tilesmith.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Manifest section definitions
//! │   ├── build      # [build]
//! │   ├── layer      # [[layers]]
//! │   └── map        # [map]
//! ├── types/         # Utility types
//! │   └── error      # ConfigError, ConfigDiagnostics
//! ├── util.rs        # Manifest discovery
//! └── mod.rs         # MapConfig (this file)
//! ```
//!
//! # Example
//!
//! ```toml
//! [map]
//! id = "body"
//! size = [4096, 3072]
//!
//! [build]
//! output = "tiles"
//!
//! [[layers]]
//! id = "base"
//! source = "art/base.svg"
//! ```

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{BuildSectionConfig, LayerConfig, MapSectionConfig};
pub use types::{ConfigDiagnostics, ConfigError};

use crate::{
    cli::{BuildArgs, Cli, Commands},
    log,
    tile::PyramidGeometry,
    utils::path::{normalize_path, resolve_against},
};
use anyhow::Result;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing tilesmith.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Absolute path to the manifest (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of the manifest (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Map identity and size
    pub map: MapSectionConfig,

    /// Build settings
    #[serde(default)]
    pub build: BuildSectionConfig,

    /// Layers, in manifest order
    #[serde(default)]
    pub layers: Vec<LayerConfig>,
}

impl MapConfig {
    /// Load the manifest named on the command line.
    ///
    /// Searches upward from cwd; the project root is the manifest's directory.
    pub fn load(cli: &Cli) -> Result<Self> {
        let Some(config_path) = find_config_file(&cli.config) else {
            return Err(ConfigError::Validation(format!(
                "manifest `{}` not found in this or any parent directory",
                cli.config.display()
            ))
            .into());
        };

        let mut config = Self::from_path(&config_path)?;
        config.config_path = normalize_path(&config_path);
        config.finalize(cli);
        config.validate(cli.layer_filter())?;

        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {} are ignored:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Finalize configuration after loading.
    fn finalize(&mut self, cli: &Cli) {
        let root = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        self.root = normalize_path(&root);
        self.apply_command_options(cli);
        self.normalize_paths();
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Pyramid layout for this map.
    pub fn geometry(&self) -> PyramidGeometry {
        PyramidGeometry::new(self.map.size, self.build.tile_size)
    }

    /// Output directory of one layer.
    pub fn layer_dir(&self, id: &str) -> PathBuf {
        self.build.output.join(id)
    }

    pub fn layer(&self, id: &str) -> Option<&LayerConfig> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    /// Layers selected by an optional single-layer filter, in manifest order.
    pub fn selected_layers<'a>(
        &'a self,
        filter: Option<&'a str>,
    ) -> impl Iterator<Item = &'a LayerConfig> + 'a {
        self.layers
            .iter()
            .filter(move |layer| filter.is_none_or(|id| layer.id == id))
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        Self::update_option(&mut self.build.output, cli.output.as_ref());

        match &cli.command {
            Commands::Build { build_args } => self.apply_build_args(build_args),
            Commands::Info => {}
        }
    }

    /// Apply build arguments from CLI.
    fn apply_build_args(&mut self, args: &BuildArgs) {
        // Set verbose mode globally
        crate::logger::set_verbose(args.verbose);

        self.build.force |= args.force;
        self.build.clean |= args.clean;
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // path normalization
    // ========================================================================

    /// Resolve output and layer sources against the manifest directory.
    fn normalize_paths(&mut self) {
        let root = self.root.clone();
        self.build.output = resolve_against(&self.build.output, &root);
        for layer in &mut self.layers {
            layer.source = resolve_against(&layer.source, &root);
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate the manifest, collecting all errors and returning them at once.
    ///
    /// `layer_filter` is the `--layer` argument, which must name a layer.
    pub fn validate(&self, layer_filter: Option<&str>) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.map.validate(&mut diag);
        self.build.validate(&mut diag);

        if self.layers.is_empty() {
            diag.error_with_hint(
                "layers",
                "manifest defines no layers",
                "add at least one [[layers]] table",
            );
        }

        let mut seen = FxHashSet::default();
        for (index, layer) in self.layers.iter().enumerate() {
            layer.validate(index, &mut diag);
            if !seen.insert(layer.id.as_str()) {
                diag.error(
                    format!("layers[{index}].id"),
                    format!("duplicate layer id `{}`", layer.id),
                );
            }
        }

        if let Some(id) = layer_filter
            && self.layer(id).is_none()
        {
            diag.error_with_hint(
                "--layer",
                format!("no layer named `{id}`"),
                format!("known layers: {}", self.layer_ids().join(", ")),
            );
        }

        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }

    fn layer_ids(&self) -> Vec<&str> {
        self.layers.iter().map(|layer| layer.id.as_str()).collect()
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse a manifest with a minimal 512×512 `[map]` section prepended.
/// Panics if there are unknown fields (to catch manifest typos in tests).
#[cfg(test)]
pub fn test_parse_config(extra: &str) -> MapConfig {
    let config = format!("[map]\nid = \"test\"\nsize = [512, 512]\n{extra}");
    let (parsed, ignored) = MapConfig::parse_with_ignored(&config).unwrap();
    assert!(
        ignored.is_empty(),
        "test manifest has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
