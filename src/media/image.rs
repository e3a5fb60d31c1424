use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::error::{CaptioncastError, CaptioncastResult};
use crate::foundation::math::premultiply_rgba8_in_place;

/// Raster image in premultiplied RGBA8 form.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major premultiplied RGBA8 pixels.
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Load a watermark image from disk.
///
/// SVG files are rasterized at `svg_size` (the on-screen size in output pixels) so they stay
/// sharp. Other formats are decoded at their native size.
pub fn load_image(path: &Path, svg_size: (u32, u32)) -> CaptioncastResult<PreparedImage> {
    let bytes = std::fs::read(path).map_err(|e| {
        CaptioncastError::source_load(format!("failed to read image '{}': {e}", path.display()))
    })?;
    let is_svg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));
    if is_svg {
        rasterize_svg(&bytes, svg_size.0.max(1), svg_size.1.max(1))
    } else {
        decode_image(&bytes)
    }
}

/// Decode raster bytes (PNG, JPEG, ...) into premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> CaptioncastResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// Parse and rasterize SVG bytes to exactly `width` x `height`.
pub fn rasterize_svg(bytes: &[u8], width: u32, height: u32) -> CaptioncastResult<PreparedImage> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| CaptioncastError::source_load("failed to allocate svg pixmap"))?;
    let sx = (width as f32) / tree.size().width();
    let sy = (height as f32) / tree.size().height();
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(sx, sy),
        &mut pixmap.as_mut(),
    );

    // tiny-skia pixmaps are already premultiplied.
    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(pixmap.data().to_vec()),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/media/image.rs"]
mod tests;
