use crate::animation::ease::Ease;
use crate::model::caption::AnimationKind;

/// Per-frame visual state of an animated caption.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationState {
    /// Opacity in `[0, 1]`.
    pub alpha: f64,
    /// Horizontal offset in output px.
    pub x_offset: f64,
    /// Vertical offset in output px.
    pub y_offset: f64,
    /// Font size multiplier.
    pub size_multiplier: f64,
}

impl AnimationState {
    /// Fully settled: opaque, no offset, natural size.
    pub const SETTLED: Self = Self {
        alpha: 1.0,
        x_offset: 0.0,
        y_offset: 0.0,
        size_multiplier: 1.0,
    };
}

/// Resolve `kind` at `elapsed_secs` since the caption became active.
///
/// `scale` is the overlay scale (`output_height / 1080`) applied to offsets. Negative elapsed
/// time is treated as zero. Once `elapsed_secs >= kind.base_duration()` the state is exactly
/// [`AnimationState::SETTLED`].
pub fn resolve(kind: AnimationKind, elapsed_secs: f64, scale: f64) -> AnimationState {
    if kind == AnimationKind::None {
        return AnimationState::SETTLED;
    }
    let elapsed = if elapsed_secs.is_finite() {
        elapsed_secs.max(0.0)
    } else {
        0.0
    };
    let base = kind.base_duration().max(0.001);
    if elapsed >= base {
        return AnimationState::SETTLED;
    }

    let t_raw = (elapsed / base).min(1.0);
    let t = Ease::OutCubic.apply(t_raw);
    let rest = 1.0 - t;

    let mut s = AnimationState {
        alpha: Ease::Linear.apply(t_raw),
        x_offset: 0.0,
        y_offset: 0.0,
        size_multiplier: 1.0,
    };
    match kind {
        AnimationKind::None
        | AnimationKind::FadeIn
        | AnimationKind::Cinematic
        | AnimationKind::Typewriter => {}
        AnimationKind::SlideUp => s.y_offset = rest * 60.0 * scale,
        AnimationKind::SlideDown => s.y_offset = -rest * 60.0 * scale,
        AnimationKind::SlideLeft => s.x_offset = rest * 120.0 * scale,
        AnimationKind::SlideRight => s.x_offset = -rest * 120.0 * scale,
        AnimationKind::PopIn => {
            s.size_multiplier = 0.3 + 0.7 * t;
            s.y_offset = rest * 15.0 * scale;
        }
        AnimationKind::BounceUp => {
            s.y_offset = rest * 50.0 * scale * (elapsed * 10.0).cos().abs();
        }
        AnimationKind::BounceDown => {
            s.y_offset = -rest * 50.0 * scale * (elapsed * 10.0).cos().abs();
        }
        AnimationKind::ElasticLeft => s.x_offset = rest * 80.0 * scale * (elapsed * 14.0).cos(),
        AnimationKind::ElasticRight => s.x_offset = -rest * 80.0 * scale * (elapsed * 14.0).cos(),
        AnimationKind::ZoomIn => s.size_multiplier = 0.4 + 0.6 * t,
        AnimationKind::ZoomOut => s.size_multiplier = 1.6 - 0.6 * t,
    }
    s
}

#[cfg(test)]
#[path = "../../tests/unit/animation/caption.rs"]
mod tests;
