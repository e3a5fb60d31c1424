use crate::foundation::core::{Rect, Resolution};
use crate::foundation::error::{CaptioncastError, CaptioncastResult};
use crate::media::image::{PreparedImage, load_image};
use crate::model::settings::WatermarkConfig;
use crate::render::raster::premul_image;

/// Watermark image with its placement in output pixels.
#[derive(Clone)]
pub struct Watermark {
    /// Paint ready for vello_cpu.
    pub image: vello_cpu::Image,
    /// Image width in pixels.
    pub image_width: u32,
    /// Image height in pixels.
    pub image_height: u32,
    /// Destination rectangle in output pixels.
    pub rect: Rect,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
}

impl std::fmt::Debug for Watermark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watermark")
            .field("image_width", &self.image_width)
            .field("image_height", &self.image_height)
            .field("rect", &self.rect)
            .field("opacity", &self.opacity)
            .finish()
    }
}

/// Map a rectangle given in source-video pixels to output pixels, scaling each axis by
/// `output / source`. A zero-sized source axis maps one to one.
pub fn source_to_output_rect(
    config: &WatermarkConfig,
    source_size: (u32, u32),
    output: Resolution,
) -> Rect {
    let sx = if source_size.0 > 0 {
        f64::from(output.width) / f64::from(source_size.0)
    } else {
        1.0
    };
    let sy = if source_size.1 > 0 {
        f64::from(output.height) / f64::from(source_size.1)
    } else {
        1.0
    };
    Rect::new(
        config.x * sx,
        config.y * sy,
        (config.x + config.width) * sx,
        (config.y + config.height) * sy,
    )
}

impl Watermark {
    /// Place an already decoded image.
    pub fn new(
        image: &PreparedImage,
        config: &WatermarkConfig,
        source_size: (u32, u32),
        output: Resolution,
    ) -> CaptioncastResult<Self> {
        if image.width == 0 || image.height == 0 {
            return Err(CaptioncastError::source_load("watermark image is empty"));
        }
        Ok(Self {
            image: premul_image(&image.rgba8_premul, image.width, image.height)?,
            image_width: image.width,
            image_height: image.height,
            rect: source_to_output_rect(config, source_size, output),
            opacity: config.opacity.clamp(0.0, 1.0) as f32,
        })
    }

    /// Load the configured image. SVGs are rasterized at their on-screen size.
    pub fn load(
        config: &WatermarkConfig,
        source_size: (u32, u32),
        output: Resolution,
    ) -> CaptioncastResult<Self> {
        let rect = source_to_output_rect(config, source_size, output);
        let svg_size = (
            rect.width().round().max(1.0) as u32,
            rect.height().round().max(1.0) as u32,
        );
        let image = load_image(&config.image, svg_size)?;
        Self::new(&image, config, source_size, output)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/watermark.rs"]
mod tests;
