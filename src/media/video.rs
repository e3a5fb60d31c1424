use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::Arc;

use crate::foundation::error::{CaptioncastError, CaptioncastResult};
use crate::media::probe::probe_media;

/// Seeks landing within this distance of the current frame are served without decoding.
pub const SEEK_EPSILON_SECS: f64 = 0.001;

/// Forward distance a running decode stream will read through instead of restarting.
const MAX_FORWARD_READ_SECS: f64 = 1.0;

/// Rate at which the ffmpeg decoder resamples the source.
const DECODE_FPS: f64 = 30.0;

/// Properties of a decodable source video.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoInfo {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Duration in seconds.
    pub duration_secs: f64,
}

/// One decoded video frame, tightly packed RGBA8.
///
/// Source video is opaque, so the bytes are valid as both straight and premultiplied alpha.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoFrame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGBA8 pixels.
    pub data: Arc<Vec<u8>>,
}

impl VideoFrame {
    /// Solid-color frame, mostly useful as a placeholder and in tests.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut data = Vec::with_capacity((width as usize) * (height as usize) * 4);
        for _ in 0..(width as usize) * (height as usize) {
            data.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            data: Arc::new(data),
        }
    }
}

/// A seekable source of video frames.
///
/// `frame_at` is blocking. Callers that need a time bound run decoders on a worker thread
/// (see [`crate::source::worker::DecoderWorker`]).
pub trait FrameDecoder: Send {
    /// Static properties of the source.
    fn info(&self) -> &VideoInfo;

    /// Decode the frame displayed at `time_secs`. The time is already clamped into the source.
    fn frame_at(&mut self, time_secs: f64) -> CaptioncastResult<VideoFrame>;
}

/// Decoder backed by a long-lived `ffmpeg` process streaming raw RGBA frames.
///
/// Sequential requests read forward through the running stream. Backward seeks, or forward
/// jumps of more than one second, restart the process at the requested position.
pub struct FfmpegDecoder {
    path: PathBuf,
    info: VideoInfo,
    stream: Option<DecodeStream>,
    last: Option<(f64, VideoFrame)>,
    restarts: u64,
}

impl FfmpegDecoder {
    /// Probe `path` and prepare a decoder. No process is started until the first request.
    pub fn open(path: &Path) -> CaptioncastResult<Self> {
        let media = probe_media(path)?;
        let video = media.video.ok_or_else(|| {
            CaptioncastError::source_load(format!("no video stream in '{}'", path.display()))
        })?;
        let duration_secs = media.video_duration().ok_or_else(|| {
            CaptioncastError::source_load(format!(
                "could not determine duration of '{}'",
                path.display()
            ))
        })?;
        if video.width == 0 || video.height == 0 {
            return Err(CaptioncastError::source_load(
                "source video has zero width or height",
            ));
        }
        Ok(Self {
            path: path.to_path_buf(),
            info: VideoInfo {
                width: video.width,
                height: video.height,
                duration_secs,
            },
            stream: None,
            last: None,
            restarts: 0,
        })
    }

    /// Number of times the decode process was (re)started.
    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    fn needs_restart(&self, t: f64) -> bool {
        let Some(stream) = self.stream.as_ref() else {
            return true;
        };
        if stream.exhausted {
            return t < stream.next_time() - 1.0 / DECODE_FPS - SEEK_EPSILON_SECS;
        }
        let next = stream.next_time();
        let current = next - 1.0 / DECODE_FPS;
        t < current - SEEK_EPSILON_SECS || t - next > MAX_FORWARD_READ_SECS
    }
}

impl FrameDecoder for FfmpegDecoder {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn frame_at(&mut self, time_secs: f64) -> CaptioncastResult<VideoFrame> {
        if let Some((t, frame)) = self.last.as_ref()
            && (t - time_secs).abs() <= SEEK_EPSILON_SECS
        {
            return Ok(frame.clone());
        }

        if self.needs_restart(time_secs) {
            tracing::debug!(path = %self.path.display(), time_secs, "restarting decode stream");
            self.stream = Some(DecodeStream::spawn(&self.path, &self.info, time_secs)?);
            self.restarts += 1;
        }
        let Some(stream) = self.stream.as_mut() else {
            return Err(CaptioncastError::source_load("decode stream missing"));
        };

        while !stream.exhausted && stream.next_time() <= time_secs + SEEK_EPSILON_SECS {
            let t = stream.next_time();
            if let Some(frame) = stream.read_frame()? {
                self.last = Some((t, frame));
            }
        }

        self.last
            .as_ref()
            .map(|(_, f)| f.clone())
            .ok_or_else(|| {
                CaptioncastError::source_load(format!(
                    "ffmpeg produced no frames for '{}' at {time_secs:.3}s",
                    self.path.display()
                ))
            })
    }
}

struct DecodeStream {
    child: Child,
    stdout: ChildStdout,
    start: f64,
    next_index: u64,
    frame_len: usize,
    width: u32,
    height: u32,
    exhausted: bool,
}

impl DecodeStream {
    fn spawn(path: &Path, info: &VideoInfo, start: f64) -> CaptioncastResult<Self> {
        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-ss", &format!("{start:.6}")])
            .arg("-i")
            .arg(path)
            .args([
                "-an",
                "-vf",
                &format!("fps={DECODE_FPS}"),
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "pipe:1",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                CaptioncastError::source_load(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CaptioncastError::source_load("failed to open ffmpeg stdout"))?;
        Ok(Self {
            child,
            stdout,
            start,
            next_index: 0,
            frame_len: (info.width as usize) * (info.height as usize) * 4,
            width: info.width,
            height: info.height,
            exhausted: false,
        })
    }

    fn next_time(&self) -> f64 {
        self.start + self.next_index as f64 / DECODE_FPS
    }

    fn read_frame(&mut self) -> CaptioncastResult<Option<VideoFrame>> {
        let mut buf = vec![0u8; self.frame_len];
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.stdout.read(&mut buf[filled..]).map_err(|e| {
                CaptioncastError::source_load(format!("failed to read decoded frame: {e}"))
            })?;
            if n == 0 {
                self.exhausted = true;
                return Ok(None);
            }
            filled += n;
        }
        self.next_index += 1;
        Ok(Some(VideoFrame {
            width: self.width,
            height: self.height,
            data: Arc::new(buf),
        }))
    }
}

impl Drop for DecodeStream {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
