use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;

use crate::foundation::error::{CaptioncastError, CaptioncastResult};
use crate::layout::wrap::wrap;
use crate::render::raster::CoverageMask;

/// Font slot a piece of text is shaped with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FontRole {
    /// Right-to-left caption script.
    Primary,
    /// Left-to-right caption script.
    Secondary,
    /// Banner title and subtitle.
    Banner,
}

/// Shapes and rasterizes single lines of text.
///
/// Implementations must be deterministic: the same role, size and text always produce the same
/// width and the same coverage.
pub trait TextShaper: Send {
    /// Advance width of `text` in px.
    fn measure(&mut self, role: FontRole, size_px: f32, text: &str) -> CaptioncastResult<f64>;

    /// Coverage of `text`. The mask's top-left is the top of the line box at the start of the
    /// first glyph; its width is the advance width rounded up.
    fn rasterize(
        &mut self,
        role: FontRole,
        size_px: f32,
        text: &str,
    ) -> CaptioncastResult<CoverageMask>;
}

/// Brush carried through parley layouts. Coverage is always rendered opaque white.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct CoverageBrush;

struct LoadedFont {
    family: String,
    data: vello_cpu::peniko::FontData,
}

/// [`TextShaper`] backed by parley shaping and vello_cpu glyph rendering.
///
/// Bidi runs are resolved by parley from the text content, so Arabic lines lay out right to
/// left without extra configuration.
pub struct ParleyShaper {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<CoverageBrush>,
    fonts: HashMap<FontRole, LoadedFont>,
}

impl Default for ParleyShaper {
    fn default() -> Self {
        Self::new()
    }
}

impl ParleyShaper {
    /// Shaper without fonts.
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            fonts: HashMap::new(),
        }
    }

    /// Register `bytes` as the font for `role`, replacing any previous font.
    pub fn register(&mut self, role: FontRole, bytes: Vec<u8>) -> CaptioncastResult<()> {
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes.clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            CaptioncastError::source_load(format!("no font families found for {role:?} font"))
        })?;
        let family = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| CaptioncastError::source_load("registered font family has no name"))?
            .to_string();

        let data = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes), 0);
        self.fonts.insert(role, LoadedFont { family, data });
        Ok(())
    }

    /// Read a font file and register it for `role`.
    pub fn register_file(&mut self, role: FontRole, path: &Path) -> CaptioncastResult<()> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read font {}", path.display()))
            .map_err(|e| CaptioncastError::source_load(format!("{e:#}")))?;
        self.register(role, bytes)
    }

    /// Whether a font is registered for `role`.
    pub fn has_font(&self, role: FontRole) -> bool {
        self.fonts.contains_key(&role)
    }

    fn layout(
        &mut self,
        role: FontRole,
        size_px: f32,
        text: &str,
    ) -> CaptioncastResult<(parley::Layout<CoverageBrush>, vello_cpu::peniko::FontData)> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(CaptioncastError::validation(
                "text size must be finite and > 0",
            ));
        }
        let font = self.fonts.get(&role).ok_or_else(|| {
            CaptioncastError::validation(format!("no font registered for {role:?} text"))
        })?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(font.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(CoverageBrush));

        let mut layout: parley::Layout<CoverageBrush> = builder.build(text);
        layout.break_all_lines(None);
        Ok((layout, font.data.clone()))
    }
}

impl TextShaper for ParleyShaper {
    fn measure(&mut self, role: FontRole, size_px: f32, text: &str) -> CaptioncastResult<f64> {
        let (layout, _) = self.layout(role, size_px, text)?;
        Ok(f64::from(layout.width()))
    }

    fn rasterize(
        &mut self,
        role: FontRole,
        size_px: f32,
        text: &str,
    ) -> CaptioncastResult<CoverageMask> {
        let (layout, font) = self.layout(role, size_px, text)?;
        let w = layout.width().ceil().max(1.0) as u32;
        let h = layout.height().ceil().max(1.0) as u32;
        let w16: u16 = w
            .try_into()
            .map_err(|_| CaptioncastError::validation("text line wider than 65535 px"))?;
        let h16: u16 = h
            .try_into()
            .map_err(|_| CaptioncastError::validation("text line taller than 65535 px"))?;

        let mut ctx = vello_cpu::RenderContext::new(w16, h16);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 255));
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(w16, h16);
        ctx.render_to_pixmap(&mut pixmap);

        let alpha = pixmap
            .data_as_u8_slice()
            .chunks_exact(4)
            .map(|px| px[3])
            .collect();
        Ok(CoverageMask {
            width: w,
            height: h,
            alpha,
        })
    }
}

/// Wrap each author line of one script to `max_width` px at `size_px`.
///
/// Blank author lines are dropped. Long words that cannot be broken stay on their own line.
pub fn prepare_caption_lines(
    shaper: &mut dyn TextShaper,
    role: FontRole,
    size_px: f32,
    lines: &[String],
    max_width: f64,
) -> CaptioncastResult<Vec<String>> {
    let mut out = Vec::new();
    let mut failure = None;
    for line in lines {
        let wrapped = wrap(
            |candidate| match shaper.measure(role, size_px, candidate) {
                Ok(w) => w,
                Err(e) => {
                    failure.get_or_insert(e);
                    0.0
                }
            },
            line,
            max_width,
        );
        if let Some(e) = failure.take() {
            return Err(e);
        }
        out.extend(wrapped);
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
