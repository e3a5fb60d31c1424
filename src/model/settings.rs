use std::path::PathBuf;

use crate::foundation::core::{Fps, Resolution};

/// Output aspect ratio preset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AspectRatio {
    /// 1920x1080 landscape.
    #[serde(rename = "16:9")]
    Landscape16x9,
    /// 1080x1920 portrait.
    #[default]
    #[serde(rename = "9:16")]
    Portrait9x16,
    /// 1080x1080 square.
    #[serde(rename = "1:1")]
    Square1x1,
}

impl AspectRatio {
    /// Concrete output resolution for this preset.
    pub fn resolution(self) -> Resolution {
        match self {
            Self::Landscape16x9 => Resolution::new(1920, 1080),
            Self::Portrait9x16 => Resolution::new(1080, 1920),
            Self::Square1x1 => Resolution::new(1080, 1080),
        }
    }
}

/// Video/audio codec pair targeted by one render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CodecPair {
    /// H.264 video with AAC audio.
    #[default]
    H264Aac,
    /// HEVC video with AAC audio.
    HevcAac,
}

impl CodecPair {
    /// Software encoder name understood by `ffmpeg`.
    pub fn software_video_encoder(self) -> &'static str {
        match self {
            Self::H264Aac => "libx264",
            Self::HevcAac => "libx265",
        }
    }

    /// Hardware encoder names understood by `ffmpeg`, most preferred first.
    pub fn hardware_video_encoders(self) -> &'static [&'static str] {
        match self {
            Self::H264Aac => &[
                "h264_videotoolbox",
                "h264_nvenc",
                "h264_qsv",
                "h264_amf",
                "h264_vaapi",
            ],
            Self::HevcAac => &[
                "hevc_videotoolbox",
                "hevc_nvenc",
                "hevc_qsv",
                "hevc_amf",
                "hevc_vaapi",
            ],
        }
    }

    /// Raw elementary stream format name used by `ffmpeg` (`-f`).
    pub fn elementary_format(self) -> &'static str {
        match self {
            Self::H264Aac => "h264",
            Self::HevcAac => "hevc",
        }
    }
}

/// Target video bitrate in bits per second.
///
/// Deserializes from plain numbers or strings such as `"8M"`, `"2.5m"`, `"800k"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Bitrate(pub u64);

impl Bitrate {
    /// Fallback used when a bitrate string cannot be parsed.
    pub const DEFAULT: Self = Self(8_000_000);

    /// Parse a human bitrate string, falling back to [`Bitrate::DEFAULT`].
    pub fn parse(s: &str) -> Self {
        Self::try_parse(s).unwrap_or(Self::DEFAULT)
    }

    fn try_parse(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();
        let (num, mul) = if let Some(n) = s.strip_suffix('m') {
            (n, 1_000_000.0)
        } else if let Some(n) = s.strip_suffix('k') {
            (n, 1_000.0)
        } else {
            (s.as_str(), 1.0)
        };
        let v = num.trim().parse::<f64>().ok()?;
        if !v.is_finite() || v <= 0.0 {
            return None;
        }
        Some(Self((v * mul).round() as u64))
    }

    /// Bits per second.
    pub fn bits_per_sec(self) -> u64 {
        self.0
    }
}

impl Default for Bitrate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl<'de> serde::Deserialize<'de> for Bitrate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Num(f64),
            Str(String),
        }
        Ok(match Repr::deserialize(deserializer)? {
            Repr::Num(v) if v.is_finite() && v > 0.0 => Self(v.round() as u64),
            Repr::Num(_) => Self::DEFAULT,
            Repr::Str(s) => Self::parse(&s),
        })
    }
}

/// Color grading look applied to every background frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorFilter {
    /// Untouched.
    #[default]
    None,
    /// Higher contrast, muted saturation.
    Cinematic,
    /// Grayscale with a slight contrast lift.
    #[serde(alias = "bw")]
    BlackWhite,
    /// Slight sepia and warm hue shift.
    Warm,
    /// Cool hue shift, slightly darker.
    Cool,
}

/// Watermark image placed in source-video pixel coordinates.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WatermarkConfig {
    /// Raster (PNG/JPEG/...) or SVG image.
    pub image: PathBuf,
    /// Left edge in source pixels.
    pub x: f64,
    /// Top edge in source pixels.
    pub y: f64,
    /// Width in source pixels.
    pub width: f64,
    /// Height in source pixels.
    pub height: f64,
    /// Opacity in `[0, 1]`.
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

fn default_opacity() -> f64 {
    1.0
}

/// Optional metadata banner content.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Metadata {
    /// Banner title. No banner is drawn without it.
    pub title: Option<String>,
    /// Smaller second line.
    pub subtitle: Option<String>,
}

impl Metadata {
    /// Title when present and not blank.
    pub fn banner_title(&self) -> Option<&str> {
        self.title.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// Subtitle when present and not blank.
    pub fn banner_subtitle(&self) -> Option<&str> {
        self.subtitle
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Output settings of one render.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSettings {
    /// Output aspect ratio preset.
    pub aspect_ratio: AspectRatio,
    /// Codec pair.
    pub codec: CodecPair,
    /// Target video bitrate.
    pub bitrate: Bitrate,
    /// Crossfade the loop seam of the background video.
    pub crossfade: bool,
    /// Background color grading.
    pub color_filter: ColorFilter,
}

impl RenderSettings {
    /// Output resolution.
    pub fn resolution(&self) -> Resolution {
        self.aspect_ratio.resolution()
    }

    /// Output frame rate. Always 30 fps.
    pub fn fps(&self) -> Fps {
        Fps::OUTPUT
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/settings.rs"]
mod tests;
