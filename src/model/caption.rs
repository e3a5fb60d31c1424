use std::path::PathBuf;

use crate::model::color::Color;

/// One time-coded bilingual caption.
///
/// `start`/`end` are seconds on the output timeline. Each entry of `primary_lines` and
/// `secondary_lines` is one author-provided line; long lines are wrapped to the output width when
/// the caption is prepared for rendering.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CaptionSegment {
    /// Stable identifier used to index prepared caption data.
    pub id: u32,
    /// Start time in seconds (inclusive).
    pub start: f64,
    /// End time in seconds (inclusive).
    pub end: f64,
    /// Right-to-left script lines (e.g. Arabic).
    #[serde(default)]
    pub primary_lines: Vec<String>,
    /// Left-to-right script lines (e.g. Bengali, English).
    #[serde(default)]
    pub secondary_lines: Vec<String>,
}

impl CaptionSegment {
    /// Whether the caption is visible at `t` (inclusive on both ends).
    pub fn is_active_at(&self, t: f64) -> bool {
        t >= self.start && t <= self.end
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Font, size and color of one script.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptStyle {
    /// Font file used to shape this script. Required whenever text in this script is drawn.
    #[serde(default)]
    pub font: Option<PathBuf>,
    /// Font size in px at a 1080 px tall reference frame.
    pub size: f64,
    /// Fill color.
    pub color: Color,
}

/// Procedural entrance animation applied to every caption.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnimationKind {
    /// No animation; fully visible immediately.
    #[default]
    None,
    /// Opacity only.
    FadeIn,
    /// Rises from below.
    SlideUp,
    /// Drops from above.
    SlideDown,
    /// Enters from the right, moving left.
    SlideLeft,
    /// Enters from the left, moving right.
    SlideRight,
    /// Damped vertical bounce from below.
    BounceUp,
    /// Damped vertical bounce from above.
    BounceDown,
    /// Damped horizontal oscillation from the right.
    ElasticLeft,
    /// Damped horizontal oscillation from the left.
    ElasticRight,
    /// Grows from 40% size.
    ZoomIn,
    /// Shrinks from 160% size.
    ZoomOut,
    /// Slow opacity ramp.
    Cinematic,
    /// Quick opacity ramp.
    Typewriter,
    /// Quick grow with a small rise.
    PopIn,
}

impl AnimationKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 15] = [
        Self::None,
        Self::FadeIn,
        Self::SlideUp,
        Self::SlideDown,
        Self::SlideLeft,
        Self::SlideRight,
        Self::BounceUp,
        Self::BounceDown,
        Self::ElasticLeft,
        Self::ElasticRight,
        Self::ZoomIn,
        Self::ZoomOut,
        Self::Cinematic,
        Self::Typewriter,
        Self::PopIn,
    ];

    /// Seconds until the animation settles.
    pub fn base_duration(self) -> f64 {
        match self {
            Self::Cinematic => 1.8,
            Self::Typewriter | Self::PopIn => 0.3,
            _ => 0.7,
        }
    }
}

/// Styling shared by every caption of a render.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptionStyle {
    /// Right-to-left script style.
    pub primary: ScriptStyle,
    /// Left-to-right script style.
    pub secondary: ScriptStyle,
    /// Outline color.
    pub stroke_color: Color,
    /// Outline width in px at the reference height. `0` disables the outline.
    pub stroke_width: f64,
    /// Drop shadow color.
    pub shadow_color: Color,
    /// Drop shadow blur in px at the reference height. `0` disables the shadow.
    pub shadow_blur: f64,
    /// Vertical position of the caption block as a percentage of output height.
    pub position_y: f64,
    /// Gap between the two script blocks in px at the reference height.
    pub gap: f64,
    /// Entrance animation.
    pub animation: AnimationKind,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            primary: ScriptStyle {
                font: None,
                size: 48.0,
                color: Color::WHITE,
            },
            secondary: ScriptStyle {
                font: None,
                size: 36.0,
                color: Color::from_rgb8_alpha(0xf0, 0xe6, 0x8c, 1.0),
            },
            stroke_color: Color::BLACK,
            stroke_width: 2.0,
            shadow_color: Color::rgba(0.0, 0.0, 0.0, 0.8),
            shadow_blur: 8.0,
            position_y: 75.0,
            gap: 16.0,
            animation: AnimationKind::None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/caption.rs"]
mod tests;
