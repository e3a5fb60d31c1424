use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::foundation::error::{CaptioncastError, CaptioncastResult};
use crate::model::caption::{CaptionSegment, CaptionStyle};
use crate::model::settings::{Metadata, RenderSettings, WatermarkConfig};

/// Everything needed for one render call.
///
/// This is the JSON-facing configuration object. Relative paths are resolved against the
/// directory of the job file when loaded with [`RenderJob::from_path`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderJob {
    /// Looping background video.
    pub video: PathBuf,
    /// Independent audio track. When present it defines the output duration.
    #[serde(default)]
    pub audio: Option<PathBuf>,
    /// Time-coded captions.
    #[serde(default)]
    pub captions: Vec<CaptionSegment>,
    /// Caption styling.
    #[serde(default)]
    pub style: CaptionStyle,
    /// Optional watermark image.
    #[serde(default)]
    pub watermark: Option<WatermarkConfig>,
    /// Optional banner content.
    #[serde(default)]
    pub metadata: Metadata,
    /// Output settings.
    #[serde(default)]
    pub settings: RenderSettings,
    /// Font used for the banner title and subtitle. Falls back to the secondary script font.
    #[serde(default)]
    pub banner_font: Option<PathBuf>,
}

impl RenderJob {
    /// Parse a job from a JSON reader. Paths are left as written.
    pub fn from_reader<R: std::io::Read>(r: R) -> CaptioncastResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| CaptioncastError::validation(format!("parse render job JSON: {e}")))
    }

    /// Parse and validate a job file, resolving relative paths against its directory.
    pub fn from_path(path: impl AsRef<Path>) -> CaptioncastResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            CaptioncastError::validation(format!("open render job '{}': {e}", path.display()))
        })?;
        let mut job = Self::from_reader(BufReader::new(f))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        job.resolve_paths(base);
        job.validate()?;
        Ok(job)
    }

    /// Make every relative path absolute with respect to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        fn fix(base: &Path, p: &mut PathBuf) {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        }
        fix(base, &mut self.video);
        if let Some(a) = self.audio.as_mut() {
            fix(base, a);
        }
        if let Some(w) = self.watermark.as_mut() {
            fix(base, &mut w.image);
        }
        for font in [
            self.style.primary.font.as_mut(),
            self.style.secondary.font.as_mut(),
            self.banner_font.as_mut(),
        ]
        .into_iter()
        .flatten()
        {
            fix(base, font);
        }
    }

    /// Check invariants that do not require touching the filesystem.
    pub fn validate(&self) -> CaptioncastResult<()> {
        let style = &self.style;
        for (name, v) in [
            ("style.primary.size", style.primary.size),
            ("style.secondary.size", style.secondary.size),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(CaptioncastError::validation(format!(
                    "{name} must be finite and > 0"
                )));
            }
        }
        for (name, v) in [
            ("style.stroke_width", style.stroke_width),
            ("style.shadow_blur", style.shadow_blur),
            ("style.gap", style.gap),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(CaptioncastError::validation(format!(
                    "{name} must be finite and >= 0"
                )));
            }
        }
        if !style.position_y.is_finite() {
            return Err(CaptioncastError::validation(
                "style.position_y must be finite",
            ));
        }
        if let Some(w) = &self.watermark {
            if !(w.width > 0.0 && w.height > 0.0) {
                return Err(CaptioncastError::validation(
                    "watermark width/height must be > 0",
                ));
            }
            if !(0.0..=1.0).contains(&w.opacity) {
                return Err(CaptioncastError::validation(
                    "watermark opacity must be in [0, 1]",
                ));
            }
        }

        let has_primary = self.captions.iter().any(|c| !c.primary_lines.is_empty());
        let has_secondary = self.captions.iter().any(|c| !c.secondary_lines.is_empty());
        if has_primary && style.primary.font.is_none() {
            return Err(CaptioncastError::validation(
                "captions contain primary lines but style.primary.font is not set",
            ));
        }
        if has_secondary && style.secondary.font.is_none() {
            return Err(CaptioncastError::validation(
                "captions contain secondary lines but style.secondary.font is not set",
            ));
        }
        if self.metadata.banner_title().is_some() {
            if style.primary.font.is_none() {
                return Err(CaptioncastError::validation(
                    "banner needs style.primary.font for its glyph",
                ));
            }
            if self.banner_font.is_none() && style.secondary.font.is_none() {
                return Err(CaptioncastError::validation(
                    "banner needs banner_font or style.secondary.font",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/job.rs"]
mod tests;
