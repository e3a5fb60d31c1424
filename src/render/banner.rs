use kurbo::Shape as _;

use crate::foundation::core::Resolution;
use crate::foundation::error::{CaptioncastError, CaptioncastResult};
use crate::model::color::Color;
use crate::model::settings::Metadata;
use crate::render::raster::RgbaLayer;
use crate::render::text::{FontRole, TextShaper};

/// Glyph drawn at the left of the banner, shaped with the primary font.
pub const BANNER_GLYPH: &str = "\u{FDFD}";

const TOP: f64 = 12.0;
const PADDING_X: f64 = 20.0;
const GAP: f64 = 10.0;
const ICON_SIZE: f64 = 18.0;
const TITLE_SIZE: f64 = 13.0;
const SUBTITLE_SIZE: f64 = 10.0;
const HEIGHT: f64 = 44.0;
const CORNER_RADIUS: f64 = 24.0;

/// Placement of the banner pill and its contents in output pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BannerGeometry {
    /// Left edge of the pill.
    pub x: f64,
    /// Top edge of the pill.
    pub y: f64,
    /// Pill width.
    pub width: f64,
    /// Pill height.
    pub height: f64,
    /// Corner radius, at most half the height.
    pub radius: f64,
    /// Left edge of the glyph.
    pub icon_x: f64,
    /// Left edge of the title and subtitle column.
    pub text_x: f64,
    /// Vertical center of the pill.
    pub center_y: f64,
}

/// Font sizes of the banner parts at an output scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BannerSizes {
    /// Glyph size.
    pub icon: f64,
    /// Title size.
    pub title: f64,
    /// Subtitle size.
    pub subtitle: f64,
}

impl BannerSizes {
    /// Sizes for `scale = output_height / 1080`.
    pub fn at_scale(scale: f64) -> Self {
        Self {
            icon: ICON_SIZE * scale,
            title: TITLE_SIZE * scale,
            subtitle: SUBTITLE_SIZE * scale,
        }
    }
}

/// Lay out the pill from measured widths. The pill is horizontally centered.
pub fn banner_geometry(
    resolution: Resolution,
    icon_width: f64,
    title_width: f64,
    subtitle_width: f64,
) -> BannerGeometry {
    let s = resolution.overlay_scale();
    let text_col = title_width.max(subtitle_width);
    let width = PADDING_X * s * 2.0 + icon_width + GAP * s + text_col;
    let height = HEIGHT * s;
    let x = (f64::from(resolution.width) - width) / 2.0;
    let y = TOP * s;
    BannerGeometry {
        x,
        y,
        width,
        height,
        radius: (CORNER_RADIUS * s).min(height / 2.0),
        icon_x: x + PADDING_X * s,
        text_x: x + PADDING_X * s + icon_width + GAP * s,
        center_y: y + height / 2.0,
    }
}

/// Banner pre-rendered once per render.
#[derive(Clone)]
pub struct Banner {
    /// Left edge of `layer` in output pixels.
    pub x: i32,
    /// Top edge of `layer` in output pixels.
    pub y: i32,
    /// Geometry the layer was drawn from.
    pub geometry: BannerGeometry,
    /// Premultiplied raster of the pill and its text.
    pub layer: RgbaLayer,
    /// Paint ready for vello_cpu.
    pub image: vello_cpu::Image,
}

impl std::fmt::Debug for Banner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Banner")
            .field("x", &self.x)
            .field("y", &self.y)
            .field("geometry", &self.geometry)
            .finish()
    }
}

/// Render the banner for `metadata`, or `None` when there is no title.
#[tracing::instrument(level = "debug", skip_all)]
pub fn render_banner(
    shaper: &mut dyn TextShaper,
    metadata: &Metadata,
    resolution: Resolution,
) -> CaptioncastResult<Option<Banner>> {
    let Some(title) = metadata.banner_title() else {
        return Ok(None);
    };
    let subtitle = metadata.banner_subtitle();
    let s = resolution.overlay_scale();
    let sizes = BannerSizes::at_scale(s);

    let icon_w = shaper.measure(FontRole::Primary, sizes.icon as f32, BANNER_GLYPH)?;
    let title_w = shaper.measure(FontRole::Banner, sizes.title as f32, title)?;
    let subtitle_w = match subtitle {
        Some(text) => shaper.measure(FontRole::Banner, sizes.subtitle as f32, text)?,
        None => 0.0,
    };
    let g = banner_geometry(resolution, icon_w, title_w, subtitle_w);

    let ox = g.x.floor();
    let oy = g.y.floor();
    let layer_w = ((g.x + g.width).ceil() - ox).max(1.0) as u32;
    let layer_h = ((g.y + g.height).ceil() - oy).max(1.0) as u32;
    let mut layer = fill_pill(&g, ox, oy, layer_w, layer_h)?;

    let icon = shaper.rasterize(FontRole::Primary, sizes.icon as f32, BANNER_GLYPH)?;
    layer.paint_mask(
        &icon,
        (g.icon_x - ox).round() as i32,
        (g.center_y - f64::from(icon.height) / 2.0 - oy).round() as i32,
        Color::from_rgb8_alpha(255, 215, 0, 0.9).to_rgba8_premul(),
    );

    let title_bottom = g.center_y + if subtitle.is_some() { -s } else { 6.0 * s };
    let title_mask = shaper.rasterize(FontRole::Banner, sizes.title as f32, title)?;
    layer.paint_mask(
        &title_mask,
        (g.text_x - ox).round() as i32,
        (title_bottom - f64::from(title_mask.height) - oy).round() as i32,
        Color::WHITE.to_rgba8_premul(),
    );

    if let Some(text) = subtitle {
        let mask = shaper.rasterize(FontRole::Banner, sizes.subtitle as f32, text)?;
        layer.paint_mask(
            &mask,
            (g.text_x - ox).round() as i32,
            (g.center_y + s - oy).round() as i32,
            Color::rgba(1.0, 1.0, 1.0, 0.6).to_rgba8_premul(),
        );
    }

    let image = layer.to_image()?;
    Ok(Some(Banner {
        x: ox as i32,
        y: oy as i32,
        geometry: g,
        layer,
        image,
    }))
}

fn fill_pill(
    g: &BannerGeometry,
    ox: f64,
    oy: f64,
    width: u32,
    height: u32,
) -> CaptioncastResult<RgbaLayer> {
    let w16: u16 = width
        .try_into()
        .map_err(|_| CaptioncastError::validation("banner wider than 65535 px"))?;
    let h16: u16 = height
        .try_into()
        .map_err(|_| CaptioncastError::validation("banner taller than 65535 px"))?;

    let rr = kurbo::RoundedRect::new(
        g.x - ox,
        g.y - oy,
        g.x - ox + g.width,
        g.y - oy + g.height,
        g.radius,
    );
    let mut path = vello_cpu::kurbo::BezPath::new();
    for el in rr.path_elements(0.1) {
        path.push(el);
    }

    let mut ctx = vello_cpu::RenderContext::new(w16, h16);
    let [r, gr, b, a] = Color::rgba(0.0, 0.0, 0.0, 0.55).to_rgba8_straight();
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, gr, b, a));
    ctx.fill_path(&path);
    ctx.flush();
    let mut pixmap = vello_cpu::Pixmap::new(w16, h16);
    ctx.render_to_pixmap(&mut pixmap);

    Ok(RgbaLayer {
        width,
        height,
        data: pixmap.data_as_u8_slice().to_vec(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/banner.rs"]
mod tests;
