use crate::animation::caption::resolve;
use crate::foundation::core::{Affine, Resolution};
use crate::foundation::error::{CaptioncastError, CaptioncastResult};
use crate::model::settings::ColorFilter;
use crate::render::banner::Banner;
use crate::render::captions::{CaptionArena, StyledLine, render_styled_line};
use crate::render::filter::apply_filter;
use crate::render::raster::premul_image;
use crate::render::text::TextShaper;
use crate::render::watermark::Watermark;
use crate::source::looping::center_crop_rect;
use crate::source::manager::BackgroundLayer;

/// Everything drawn on top of the background, prepared before the frame loop.
pub struct Overlays {
    /// Prepared captions.
    pub captions: CaptionArena,
    /// Optional watermark.
    pub watermark: Option<Watermark>,
    /// Optional pre-rendered banner.
    pub banner: Option<Banner>,
    /// Shaper used to re-rasterize lines whose size is animated.
    pub shaper: Box<dyn TextShaper>,
}

/// Draws output frames: black, background layers, watermark, banner, then captions.
pub struct Compositor {
    resolution: Resolution,
    filter: ColorFilter,
    overlays: Overlays,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
}

impl Compositor {
    /// Compositor for `resolution` frames.
    pub fn new(
        resolution: Resolution,
        filter: ColorFilter,
        overlays: Overlays,
    ) -> CaptioncastResult<Self> {
        let w: u16 = resolution
            .width
            .try_into()
            .map_err(|_| CaptioncastError::validation("output width exceeds u16"))?;
        let h: u16 = resolution
            .height
            .try_into()
            .map_err(|_| CaptioncastError::validation("output height exceeds u16"))?;
        if w == 0 || h == 0 {
            return Err(CaptioncastError::validation("output size must be non-zero"));
        }
        Ok(Self {
            resolution,
            filter,
            overlays,
            ctx: vello_cpu::RenderContext::new(w, h),
            pixmap: vello_cpu::Pixmap::new(w, h),
        })
    }

    /// Output size.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Prepared overlays.
    pub fn overlays(&self) -> &Overlays {
        &self.overlays
    }

    /// Composite one frame at output time `t` seconds and return its RGBA8 pixels.
    ///
    /// Frames are opaque, so the bytes are valid as straight and premultiplied alpha.
    pub fn compose(&mut self, background: &[BackgroundLayer], t: f64) -> CaptioncastResult<&[u8]> {
        let (tw, th) = (
            f64::from(self.resolution.width),
            f64::from(self.resolution.height),
        );
        let ctx = &mut self.ctx;
        ctx.reset();
        ctx.set_blend_mode(vello_cpu::peniko::BlendMode::default());
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(0, 0, 0, 255));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, tw, th));

        for layer in background {
            let frame = apply_filter(&layer.frame, self.filter);
            if frame.width == 0 || frame.height == 0 {
                continue;
            }
            let (sw, sh) = (f64::from(frame.width), f64::from(frame.height));
            let (cx, cy, cw, ch) = center_crop_rect(sw, sh, self.resolution.aspect());
            let tr = Affine::scale_non_uniform(tw / cw, th / ch) * Affine::translate((-cx, -cy));

            ctx.set_transform(affine_to_cpu(tr));
            ctx.set_paint(premul_image(&frame.data, frame.width, frame.height)?);
            with_opacity(ctx, layer.alpha as f32, |ctx| {
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(cx, cy, cx + cw, cy + ch));
            });
        }

        if let Some(wm) = &self.overlays.watermark {
            let r = wm.rect;
            let tr = Affine::translate((r.x0, r.y0))
                * Affine::scale_non_uniform(
                    r.width() / f64::from(wm.image_width),
                    r.height() / f64::from(wm.image_height),
                );
            ctx.set_transform(affine_to_cpu(tr));
            ctx.set_paint(wm.image.clone());
            with_opacity(ctx, wm.opacity, |ctx| {
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                    0.0,
                    0.0,
                    f64::from(wm.image_width),
                    f64::from(wm.image_height),
                ));
            });
        }

        if let Some(banner) = &self.overlays.banner {
            ctx.set_transform(affine_to_cpu(Affine::translate((
                f64::from(banner.x),
                f64::from(banner.y),
            ))));
            ctx.set_paint(banner.image.clone());
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(banner.layer.width),
                f64::from(banner.layer.height),
            ));
        }

        let Overlays {
            captions, shaper, ..
        } = &mut self.overlays;
        let style = captions.style();
        for caption in captions.active_at(t) {
            let anim = resolve(style.animation, t - caption.start, style.scale);
            if anim.alpha <= 0.0 {
                continue;
            }
            let mut rescaled: Vec<(StyledLine, f64, f64)> = Vec::new();
            let mut cached: Vec<(&StyledLine, f64, f64)> = Vec::new();
            for p in caption.placements(style, &anim) {
                let Some(line) = caption.line(p.role, p.index) else {
                    continue;
                };
                if p.size_px == style.size_of(p.role) {
                    cached.push((&line.styled, p.center_x, p.top_y));
                } else {
                    let styled = render_styled_line(
                        shaper.as_mut(),
                        p.role,
                        p.size_px as f32,
                        &line.text,
                        style.paint_of(p.role),
                    )?;
                    rescaled.push((styled, p.center_x, p.top_y));
                }
            }

            with_opacity(ctx, anim.alpha as f32, |ctx| {
                let lines = cached
                    .iter()
                    .map(|(l, x, y)| (*l, *x, *y))
                    .chain(rescaled.iter().map(|(l, x, y)| (l, *x, *y)));
                for (line, center_x, top_y) in lines {
                    draw_line(ctx, line, center_x, top_y);
                }
            });
        }

        ctx.flush();
        ctx.render_to_pixmap(&mut self.pixmap);
        Ok(self.pixmap.data_as_u8_slice())
    }
}

fn draw_line(ctx: &mut vello_cpu::RenderContext, line: &StyledLine, center_x: f64, top_y: f64) {
    let left = (center_x - f64::from(line.text_width) / 2.0 - f64::from(line.pad)).round();
    let top = (top_y - f64::from(line.pad)).round();
    ctx.set_transform(affine_to_cpu(Affine::translate((left, top))));
    ctx.set_paint(line.image.clone());
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        0.0,
        0.0,
        f64::from(line.layer.width),
        f64::from(line.layer.height),
    ));
}

fn with_opacity(
    ctx: &mut vello_cpu::RenderContext,
    opacity: f32,
    draw: impl FnOnce(&mut vello_cpu::RenderContext),
) {
    if opacity < 1.0 {
        ctx.push_opacity_layer(opacity.max(0.0));
        draw(ctx);
        ctx.pop_layer();
    } else {
        draw(ctx);
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
