use crate::foundation::error::{CaptioncastError, CaptioncastResult};

pub use kurbo::{Affine, Rect};

/// Microseconds per second, the unit of every encoded timestamp.
pub const MICROS_PER_SEC: u64 = 1_000_000;

/// Absolute 0-based output frame index.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Presentation timestamp in whole microseconds.
///
/// All looping arithmetic happens in this integer domain so that times one source period apart
/// map to bit-identical source positions.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Zero timestamp.
    pub const ZERO: Self = Self(0);

    /// Convert from seconds, rounding to the nearest microsecond. Negative and NaN clamp to 0.
    pub fn from_secs_f64(secs: f64) -> Self {
        if !secs.is_finite() || secs <= 0.0 {
            return Self::ZERO;
        }
        Self((secs * MICROS_PER_SEC as f64).round() as u64)
    }

    /// Timestamp as seconds.
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / MICROS_PER_SEC as f64
    }

    /// Raw microsecond count.
    pub fn as_micros(self) -> u64 {
        self.0
    }
}

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// The fixed output rate of every render.
    pub const OUTPUT: Self = Self { num: 30, den: 1 };

    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> CaptioncastResult<Self> {
        if den == 0 {
            return Err(CaptioncastError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(CaptioncastError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Convert frame count to seconds.
    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * self.frame_duration_secs()
    }

    /// Presentation timestamp of `frame`, floored to whole microseconds.
    pub fn frame_timestamp(self, frame: FrameIndex) -> Timestamp {
        let num = u128::from(self.num);
        let den = u128::from(self.den);
        let us = u128::from(frame.0) * u128::from(MICROS_PER_SEC) * den / num;
        Timestamp(us.min(u128::from(u64::MAX)) as u64)
    }

    /// Number of frames needed to cover `secs`, rounding up.
    pub fn secs_to_frames_ceil(self, secs: f64) -> u64 {
        (secs * self.as_f64()).ceil().max(0.0) as u64
    }
}

/// Output frame dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Resolution {
    /// Create a resolution.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height.
    pub fn aspect(self) -> f64 {
        f64::from(self.width) / f64::from(self.height.max(1))
    }

    /// Overlay scale factor relative to a 1080 px tall reference frame.
    pub fn overlay_scale(self) -> f64 {
        f64::from(self.height) / 1080.0
    }

    /// Byte length of a tightly packed RGBA8 frame at this size.
    pub fn rgba_len(self) -> usize {
        (self.width as usize) * (self.height as usize) * 4
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    /// Red channel premultiplied by alpha.
    pub r: u8,
    /// Green channel premultiplied by alpha.
    pub g: u8,
    /// Blue channel premultiplied by alpha.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8Premul {
    /// Fully transparent black.
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    /// Convert straight-alpha RGBA8 into premultiplied RGBA8.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }

    /// Channels as a `[r, g, b, a]` array.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Format seconds as `MM:SS.cc` for diagnostics.
pub fn format_timestamp(secs: f64) -> String {
    let secs = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
    let centis = (secs * 100.0).round() as u64;
    let minutes = centis / 6000;
    let rem = centis % 6000;
    format!("{:02}:{:02}.{:02}", minutes, rem / 100, rem % 100)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
