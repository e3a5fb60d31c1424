use std::path::Path;

use crate::foundation::error::{CaptioncastError, CaptioncastResult};

/// Basic metadata of a media file as reported by `ffprobe`.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaInfo {
    /// Container duration in seconds, when known.
    pub duration_secs: Option<f64>,
    /// First video stream, if any.
    pub video: Option<VideoStreamInfo>,
    /// First audio stream, if any.
    pub audio: Option<AudioStreamInfo>,
}

/// Video stream properties.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoStreamInfo {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Nominal frame rate, when reported.
    pub frame_rate: Option<f64>,
    /// Stream duration in seconds, when reported separately from the container.
    pub duration_secs: Option<f64>,
}

/// Audio stream properties.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AudioStreamInfo {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Stream duration in seconds, when reported separately from the container.
    pub duration_secs: Option<f64>,
}

impl MediaInfo {
    /// Best known duration of the video stream.
    pub fn video_duration(&self) -> Option<f64> {
        self.video
            .and_then(|v| v.duration_secs)
            .or(self.duration_secs)
    }

    /// Best known duration of the audio stream.
    pub fn audio_duration(&self) -> Option<f64> {
        self.audio
            .and_then(|a| a.duration_secs)
            .or(self.duration_secs)
    }
}

#[derive(serde::Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    sample_rate: Option<String>,
    channels: Option<u16>,
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeOut {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

/// Probe `path` with `ffprobe`.
#[tracing::instrument(level = "debug")]
pub fn probe_media(path: &Path) -> CaptioncastResult<MediaInfo> {
    let out = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(path)
        .output()
        .map_err(|e| CaptioncastError::source_load(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(CaptioncastError::source_load(format!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    parse_probe_json(&out.stdout)
}

pub(crate) fn parse_probe_json(bytes: &[u8]) -> CaptioncastResult<MediaInfo> {
    let parsed: ProbeOut = serde_json::from_slice(bytes)
        .map_err(|e| CaptioncastError::source_load(format!("ffprobe json parse failed: {e}")))?;

    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .map(|s| -> CaptioncastResult<VideoStreamInfo> {
            Ok(VideoStreamInfo {
                width: s.width.ok_or_else(|| {
                    CaptioncastError::source_load("missing video width from ffprobe")
                })?,
                height: s.height.ok_or_else(|| {
                    CaptioncastError::source_load("missing video height from ffprobe")
                })?,
                frame_rate: s.r_frame_rate.as_deref().and_then(parse_rational),
                duration_secs: s.duration.as_deref().and_then(parse_secs),
            })
        })
        .transpose()?;

    let audio = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"))
        .map(|s| -> CaptioncastResult<AudioStreamInfo> {
            let sample_rate = s
                .sample_rate
                .as_deref()
                .and_then(|v| v.parse::<u32>().ok())
                .filter(|v| *v > 0)
                .ok_or_else(|| CaptioncastError::source_load("missing audio sample rate"))?;
            Ok(AudioStreamInfo {
                sample_rate,
                channels: s.channels.unwrap_or(2).max(1),
                duration_secs: s.duration.as_deref().and_then(parse_secs),
            })
        })
        .transpose()?;

    Ok(MediaInfo {
        duration_secs: parsed
            .format
            .and_then(|f| f.duration)
            .as_deref()
            .and_then(parse_secs),
        video,
        audio,
    })
}

fn parse_secs(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_rational(s: &str) -> Option<f64> {
    let (n, d) = s.split_once('/').unwrap_or((s, "1"));
    let n = n.trim().parse::<f64>().ok()?;
    let d = d.trim().parse::<f64>().ok()?;
    if d == 0.0 {
        return None;
    }
    Some(n / d).filter(|v| v.is_finite() && *v > 0.0)
}

/// Return `true` when `ffmpeg` and `ffprobe` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    ["ffmpeg", "ffprobe"].iter().all(|bin| {
        std::process::Command::new(bin)
            .arg("-version")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    })
}

#[cfg(test)]
#[path = "../../tests/unit/media/probe.rs"]
mod tests;
