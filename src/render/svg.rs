//! SVG rasterization using `usvg` (parsing) and `resvg` (rendering).

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use image::RgbaImage;
use resvg::tiny_skia::{Pixmap, Transform};

use super::{RenderContext, Rasterizer};
use crate::core::{Extent, PixelSize};

/// Rasterizer session backed by `resvg`.
///
/// Holds the parse options (font database, resource directory) shared by
/// every layer document opened on it.
pub struct SvgRasterizer {
    options: usvg::Options<'static>,
}

impl SvgRasterizer {
    /// Create a session with the system font database loaded.
    pub fn new() -> Self {
        let mut options = usvg::Options::default();
        options.fontdb_mut().load_system_fonts();
        Self { options }
    }

    /// Resolve relative `<image href>` paths against `dir`.
    pub fn with_resources_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options.resources_dir = Some(dir.into());
        self
    }
}

impl Default for SvgRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer for SvgRasterizer {
    fn open(&self, source: &[u8]) -> Result<Box<dyn RenderContext>> {
        let tree = usvg::Tree::from_data(source, &self.options).context("Failed to parse SVG")?;
        Ok(Box::new(SvgDocument { tree }))
    }
}

/// One parsed SVG document.
struct SvgDocument {
    tree: usvg::Tree,
}

impl RenderContext for SvgDocument {
    fn natural_extent(&self) -> Extent {
        let size = self.tree.size();
        Extent::new(
            0.0,
            0.0,
            f64::from(size.width()),
            f64::from(size.height()),
        )
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn render(&self, extent: Extent, size: PixelSize) -> Result<RgbaImage> {
        if !extent.is_valid() {
            bail!("Invalid source extent {extent}");
        }
        let mut pixmap = Pixmap::new(size.width, size.height)
            .with_context(|| format!("Cannot allocate {size} pixmap"))?;

        // Map `extent` onto the full pixmap
        let scale_x = size.width as f32 / extent.width as f32;
        let scale_y = size.height as f32 / extent.height as f32;
        let transform = Transform::from_row(
            scale_x,
            0.0,
            0.0,
            scale_y,
            -(extent.x as f32) * scale_x,
            -(extent.y as f32) * scale_y,
        );
        resvg::render(&self.tree, transform, &mut pixmap.as_mut());

        pixmap_to_image(&pixmap)
    }
}

/// Convert a premultiplied tiny-skia pixmap to a straight-alpha image.
fn pixmap_to_image(pixmap: &Pixmap) -> Result<RgbaImage> {
    let mut data = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let color = pixel.demultiply();
        data.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
    }

    RgbaImage::from_raw(pixmap.width(), pixmap.height(), data)
        .context("Pixmap buffer does not match its dimensions")
}
