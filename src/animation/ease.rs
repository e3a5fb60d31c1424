/// Easing curves used by caption entrance animations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ease {
    /// Linear interpolation.
    Linear,
    /// Cubic ease-out: fast start, gentle settle.
    OutCubic,
}

impl Ease {
    /// Apply this easing function to normalized progress `t` in `[0, 1]`.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
