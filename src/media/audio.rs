use std::path::Path;

use crate::audio::segment::AudioBuffer;
use crate::foundation::error::{CaptioncastError, CaptioncastResult};
use crate::media::probe::probe_media;

/// Maximum channel count carried through the pipeline.
pub const MAX_AUDIO_CHANNELS: u16 = 2;

/// Decode the first audio stream of `path` into planar `f32` PCM at its native sample rate.
///
/// Channel count is capped at [`MAX_AUDIO_CHANNELS`] by letting ffmpeg downmix.
#[tracing::instrument(level = "debug")]
pub fn decode_audio(path: &Path) -> CaptioncastResult<AudioBuffer> {
    let media = probe_media(path)?;
    let stream = media.audio.ok_or_else(|| {
        CaptioncastError::source_load(format!("no audio stream in '{}'", path.display()))
    })?;
    let channels = stream.channels.min(MAX_AUDIO_CHANNELS);

    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            &channels.to_string(),
            "-ar",
            &stream.sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| {
            CaptioncastError::source_load(format!("failed to run ffmpeg for audio decode: {e}"))
        })?;

    if !out.status.success() {
        return Err(CaptioncastError::source_load(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    if !out.stdout.len().is_multiple_of(4) {
        return Err(CaptioncastError::source_load(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }

    let pcm: Vec<f32> = out
        .stdout
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    let buf = AudioBuffer::from_interleaved(stream.sample_rate, channels, &pcm, MAX_AUDIO_CHANNELS);
    tracing::debug!(
        sample_rate = buf.sample_rate,
        channels = buf.channel_count(),
        duration_secs = buf.duration_secs(),
        "decoded audio"
    );
    Ok(buf)
}
