use std::collections::HashMap;

use smallvec::SmallVec;

use crate::animation::caption::AnimationState;
use crate::foundation::core::{Resolution, Rgba8Premul};
use crate::foundation::error::CaptioncastResult;
use crate::layout::caption::{CaptionLayout, LINE_LEADING, compute_layout};
use crate::model::caption::{AnimationKind, CaptionSegment, CaptionStyle};
use crate::model::timing::sanitize_captions;
use crate::render::raster::RgbaLayer;
use crate::render::text::{FontRole, TextShaper, prepare_caption_lines};

/// Smallest caption font size after scaling, in px.
pub const MIN_FONT_SIZE: f64 = 8.0;

/// Share of the output width caption lines may occupy.
pub const MAX_TEXT_WIDTH_FRACTION: f64 = 0.95;

/// Font size in output px for a reference `size` at `scale`.
pub fn scaled_font_size(size: f64, scale: f64) -> f64 {
    (size * scale).round().max(MIN_FONT_SIZE)
}

/// Fill, outline and shadow of one script's lines.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinePaint {
    /// Glyph fill.
    pub fill: Rgba8Premul,
    /// Outline color and width in px.
    pub stroke: Option<(Rgba8Premul, f32)>,
    /// Shadow color and blur in px.
    pub shadow: Option<(Rgba8Premul, f32)>,
}

/// [`CaptionStyle`] resolved to output pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct ScaledCaptionStyle {
    /// `output_height / 1080`.
    pub scale: f64,
    /// Output width in px.
    pub output_width: f64,
    /// Output height in px.
    pub output_height: f64,
    /// Primary font size in px.
    pub primary_size: f64,
    /// Secondary font size in px.
    pub secondary_size: f64,
    /// Gap between script blocks in px.
    pub gap: f64,
    /// Widest a wrapped line may be, in px.
    pub max_width: f64,
    /// Vertical position as a percentage of output height.
    pub position_y: f64,
    /// Entrance animation.
    pub animation: AnimationKind,
    /// Primary line paint.
    pub primary_paint: LinePaint,
    /// Secondary line paint.
    pub secondary_paint: LinePaint,
}

impl ScaledCaptionStyle {
    /// Scale `style` for an output of size `resolution`.
    pub fn new(style: &CaptionStyle, resolution: Resolution) -> Self {
        let scale = resolution.overlay_scale();
        let stroke_w = style.stroke_width * scale;
        let blur = style.shadow_blur * scale;
        let stroke = (stroke_w > 0.0 && style.stroke_color.a > 0.0)
            .then(|| (style.stroke_color.to_rgba8_premul(), stroke_w as f32));
        let shadow = (blur > 0.0 && style.shadow_color.a > 0.0)
            .then(|| (style.shadow_color.to_rgba8_premul(), blur as f32));
        Self {
            scale,
            output_width: f64::from(resolution.width),
            output_height: f64::from(resolution.height),
            primary_size: scaled_font_size(style.primary.size, scale),
            secondary_size: scaled_font_size(style.secondary.size, scale),
            gap: style.gap.max(0.0) * scale,
            max_width: f64::from(resolution.width) * MAX_TEXT_WIDTH_FRACTION,
            position_y: style.position_y,
            animation: style.animation,
            primary_paint: LinePaint {
                fill: style.primary.color.to_rgba8_premul(),
                stroke,
                shadow,
            },
            secondary_paint: LinePaint {
                fill: style.secondary.color.to_rgba8_premul(),
                stroke,
                shadow,
            },
        }
    }

    /// Base font size of `role`.
    pub fn size_of(&self, role: FontRole) -> f64 {
        match role {
            FontRole::Primary => self.primary_size,
            FontRole::Secondary | FontRole::Banner => self.secondary_size,
        }
    }

    /// Paint of `role`.
    pub fn paint_of(&self, role: FontRole) -> &LinePaint {
        match role {
            FontRole::Primary => &self.primary_paint,
            FontRole::Secondary | FontRole::Banner => &self.secondary_paint,
        }
    }
}

/// One text line rendered with outline, shadow and fill.
#[derive(Clone)]
pub struct StyledLine {
    /// Premultiplied raster, text plus `pad` px on every side.
    pub layer: RgbaLayer,
    /// Paint ready for vello_cpu.
    pub image: vello_cpu::Image,
    /// Margin reserved around the text for outline and shadow.
    pub pad: u32,
    /// Width of the text box without padding.
    pub text_width: u32,
}

impl std::fmt::Debug for StyledLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyledLine")
            .field("width", &self.layer.width)
            .field("height", &self.layer.height)
            .field("pad", &self.pad)
            .finish()
    }
}

/// Rasterize `text` and paint outline, then shadow, then fill.
///
/// The shadow has no offset and is painted over the outline; the outline itself casts no
/// shadow.
pub fn render_styled_line(
    shaper: &mut dyn TextShaper,
    role: FontRole,
    size_px: f32,
    text: &str,
    paint: &LinePaint,
) -> CaptioncastResult<StyledLine> {
    let mask = shaper.rasterize(role, size_px, text)?;
    let stroke_radius = paint.stroke.map_or(0.0, |(_, w)| w / 2.0);
    let sigma = paint.shadow.map_or(0.0, |(_, blur)| blur / 2.0);
    let pad = (stroke_radius + 3.0 * sigma).ceil() as u32 + 1;

    let padded = mask.padded(pad);
    let mut layer = RgbaLayer::transparent(padded.width, padded.height);
    if let Some((color, _)) = paint.stroke {
        layer.paint_mask(&padded.dilate(stroke_radius), 0, 0, color);
    }
    if let Some((color, _)) = paint.shadow {
        layer.paint_mask(&padded.blur(sigma)?, 0, 0, color);
    }
    layer.paint_mask(&padded, 0, 0, paint.fill);

    let image = layer.to_image()?;
    Ok(StyledLine {
        layer,
        image,
        pad,
        text_width: mask.width,
    })
}

/// A wrapped caption line with its base-size raster.
#[derive(Clone, Debug)]
pub struct PreparedLine {
    /// Line text after wrapping.
    pub text: String,
    /// Script the line belongs to.
    pub role: FontRole,
    /// Raster at the unanimated font size.
    pub styled: StyledLine,
}

/// Frame-invariant data for one caption.
#[derive(Clone, Debug)]
pub struct PreparedCaption {
    /// Caption id.
    pub id: u32,
    /// Start time in seconds (inclusive).
    pub start: f64,
    /// End time in seconds (inclusive).
    pub end: f64,
    /// Wrapped primary lines.
    pub primary: Vec<PreparedLine>,
    /// Wrapped secondary lines.
    pub secondary: Vec<PreparedLine>,
    /// Vertical placement of both blocks.
    pub layout: CaptionLayout,
}

/// Where one line is drawn in a given frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinePlacement {
    /// Script block the line belongs to.
    pub role: FontRole,
    /// Index within its block.
    pub index: usize,
    /// Font size in px for this frame.
    pub size_px: f64,
    /// Horizontal center of the text box.
    pub center_x: f64,
    /// Top of the text box.
    pub top_y: f64,
}

impl PreparedCaption {
    /// Whether the caption is visible at `t`.
    pub fn is_active_at(&self, t: f64) -> bool {
        t >= self.start && t <= self.end
    }

    /// Line at `index` of the `role` block.
    pub fn line(&self, role: FontRole, index: usize) -> Option<&PreparedLine> {
        match role {
            FontRole::Primary => self.primary.get(index),
            FontRole::Secondary => self.secondary.get(index),
            FontRole::Banner => None,
        }
    }

    /// Placement of every line under animation state `anim`.
    ///
    /// Line `i` of a block sits at `block_y + y_offset + i * (round(size * multiplier) + 12)`.
    pub fn placements(
        &self,
        style: &ScaledCaptionStyle,
        anim: &AnimationState,
    ) -> SmallVec<[LinePlacement; 8]> {
        let center_x = style.output_width / 2.0 + anim.x_offset;
        let mut out = SmallVec::new();
        for (role, count, block_y) in [
            (FontRole::Primary, self.primary.len(), self.layout.primary_y),
            (
                FontRole::Secondary,
                self.secondary.len(),
                self.layout.secondary_y,
            ),
        ] {
            let size = (style.size_of(role) * anim.size_multiplier).round().max(1.0);
            for index in 0..count {
                out.push(LinePlacement {
                    role,
                    index,
                    size_px: size,
                    center_x,
                    top_y: block_y + anim.y_offset + index as f64 * (size + LINE_LEADING),
                });
            }
        }
        out
    }
}

/// Prepared captions for a whole render, indexed by caption id.
#[derive(Debug)]
pub struct CaptionArena {
    style: ScaledCaptionStyle,
    captions: Vec<PreparedCaption>,
    by_id: HashMap<u32, usize>,
}

impl CaptionArena {
    /// Sanitize timing, wrap, lay out and rasterize every caption.
    #[tracing::instrument(level = "debug", skip_all, fields(captions = captions.len()))]
    pub fn build(
        captions: &[CaptionSegment],
        style: &CaptionStyle,
        resolution: Resolution,
        shaper: &mut dyn TextShaper,
    ) -> CaptioncastResult<Self> {
        let scaled = ScaledCaptionStyle::new(style, resolution);
        let mut prepared = Vec::with_capacity(captions.len());
        let mut by_id = HashMap::new();

        for seg in sanitize_captions(captions) {
            let primary = prepare_block(
                shaper,
                &scaled,
                FontRole::Primary,
                &seg.primary_lines,
            )?;
            let secondary = prepare_block(
                shaper,
                &scaled,
                FontRole::Secondary,
                &seg.secondary_lines,
            )?;
            let layout = compute_layout(
                scaled.output_height,
                scaled.position_y,
                scaled.primary_size,
                primary.len(),
                scaled.secondary_size,
                secondary.len(),
                scaled.gap,
            );
            if by_id.insert(seg.id, prepared.len()).is_some() {
                tracing::warn!(id = seg.id, "duplicate caption id; later caption wins lookups");
            }
            prepared.push(PreparedCaption {
                id: seg.id,
                start: seg.start,
                end: seg.end,
                primary,
                secondary,
                layout,
            });
        }

        Ok(Self {
            style: scaled,
            captions: prepared,
            by_id,
        })
    }

    /// Scaled style the arena was built with.
    pub fn style(&self) -> &ScaledCaptionStyle {
        &self.style
    }

    /// Caption by id.
    pub fn get(&self, id: u32) -> Option<&PreparedCaption> {
        self.by_id.get(&id).map(|&i| &self.captions[i])
    }

    /// Captions visible at `t`, in start order.
    pub fn active_at(&self, t: f64) -> impl Iterator<Item = &PreparedCaption> {
        self.captions.iter().filter(move |c| c.is_active_at(t))
    }

    /// Number of prepared captions.
    pub fn len(&self) -> usize {
        self.captions.len()
    }

    /// Whether no caption survived preparation.
    pub fn is_empty(&self) -> bool {
        self.captions.is_empty()
    }
}

fn prepare_block(
    shaper: &mut dyn TextShaper,
    style: &ScaledCaptionStyle,
    role: FontRole,
    lines: &[String],
) -> CaptioncastResult<Vec<PreparedLine>> {
    let size = style.size_of(role) as f32;
    let wrapped = prepare_caption_lines(shaper, role, size, lines, style.max_width)?;
    wrapped
        .into_iter()
        .map(|text| {
            let styled = render_styled_line(shaper, role, size, &text, style.paint_of(role))?;
            Ok(PreparedLine { text, role, styled })
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/render/captions.rs"]
mod tests;
