use crate::foundation::core::Rgba8Premul;
use serde::{Deserialize, Serialize};

/// Straight-alpha color with normalized `0..=1` channels.
///
/// Deserializes from CSS-like strings (`#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(..)`, `rgba(..)`),
/// `{r, g, b, a?}` objects and `[r, g, b, a?]` arrays with normalized channels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Color {
    /// Red channel.
    pub r: f64,
    /// Green channel.
    pub g: f64,
    /// Blue channel.
    pub b: f64,
    /// Alpha channel.
    pub a: f64,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);

    /// Build a color from normalized channels.
    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Build a color from 8-bit channels and a normalized alpha.
    pub fn from_rgb8_alpha(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self::rgba(
            f64::from(r) / 255.0,
            f64::from(g) / 255.0,
            f64::from(b) / 255.0,
            a,
        )
    }

    /// Parse a CSS-like color string.
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }
        let lower = s.to_ascii_lowercase();
        if let Some(body) = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))
        {
            let body = body
                .strip_suffix(')')
                .ok_or_else(|| format!("unterminated color function \"{s}\""))?;
            return parse_rgb_fn(body);
        }
        parse_hex(s)
    }

    /// Convert to premultiplied RGBA8.
    pub fn to_rgba8_premul(self) -> Rgba8Premul {
        let [r, g, b, a] = self.to_rgba8_straight();
        Rgba8Premul::from_straight_rgba(r, g, b, a)
    }

    /// Convert to straight-alpha RGBA8.
    pub fn to_rgba8_straight(self) -> [u8; 4] {
        fn to_u8(x: f64) -> u8 {
            (x.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        [to_u8(self.r), to_u8(self.g), to_u8(self.b), to_u8(self.a)]
    }

    /// Same color with alpha multiplied by `k`.
    pub fn with_alpha_mul(self, k: f64) -> Self {
        Self {
            a: (self.a * k).clamp(0.0, 1.0),
            ..self
        }
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Css(String),
            RgbaObj {
                r: f64,
                g: f64,
                b: f64,
                #[serde(default = "one")]
                a: f64,
            },
            Arr(Vec<f64>),
        }

        fn one() -> f64 {
            1.0
        }

        match Repr::deserialize(deserializer)? {
            Repr::Css(s) => Self::parse(&s).map_err(serde::de::Error::custom),
            Repr::RgbaObj { r, g, b, a } => Ok(Self::rgba(r, g, b, a)),
            Repr::Arr(v) => match v.as_slice() {
                [r, g, b] => Ok(Self::rgba(*r, *g, *b, 1.0)),
                [r, g, b, a] => Ok(Self::rgba(*r, *g, *b, *a)),
                _ => Err(serde::de::Error::custom(
                    "rgba array must have len 3 ([r,g,b]) or 4 ([r,g,b,a])",
                )),
            },
        }
    }
}

fn parse_hex(s: &str) -> Result<Color, String> {
    fn nibble(c: u8) -> Result<u8, String> {
        (c as char)
            .to_digit(16)
            .map(|d| d as u8)
            .ok_or_else(|| format!("invalid hex digit '{}'", c as char))
    }
    fn byte(pair: &[u8]) -> Result<u8, String> {
        Ok(nibble(pair[0])? * 16 + nibble(pair[1])?)
    }

    let b = s.as_bytes();
    let (r, g, bl, a) = match b.len() {
        3 => {
            let r = nibble(b[0])? * 17;
            let g = nibble(b[1])? * 17;
            let bl = nibble(b[2])? * 17;
            (r, g, bl, 255)
        }
        6 => (byte(&b[0..2])?, byte(&b[2..4])?, byte(&b[4..6])?, 255),
        8 => (
            byte(&b[0..2])?,
            byte(&b[2..4])?,
            byte(&b[4..6])?,
            byte(&b[6..8])?,
        ),
        _ => {
            return Err(format!(
                "hex color must be #RGB, #RRGGBB or #RRGGBBAA, got \"#{s}\""
            ));
        }
    };
    Ok(Color::from_rgb8_alpha(r, g, bl, f64::from(a) / 255.0))
}

fn parse_rgb_fn(body: &str) -> Result<Color, String> {
    let parts: Vec<&str> = body.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return Err(format!("rgb()/rgba() expects 3 or 4 components, got \"{body}\""));
    }
    let channel = |p: &str| -> Result<f64, String> {
        p.parse::<f64>()
            .map(|v| v.clamp(0.0, 255.0) / 255.0)
            .map_err(|_| format!("invalid color channel \"{p}\""))
    };
    let a = match parts.get(3) {
        Some(p) => p
            .parse::<f64>()
            .map_err(|_| format!("invalid alpha \"{p}\""))?
            .clamp(0.0, 1.0),
        None => 1.0,
    };
    Ok(Color::rgba(
        channel(parts[0])?,
        channel(parts[1])?,
        channel(parts[2])?,
        a,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/model/color.rs"]
mod tests;
