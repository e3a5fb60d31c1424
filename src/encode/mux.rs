use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::encode::encoder::{EncodedChunk, Track};
use crate::foundation::core::Fps;
use crate::foundation::error::{CaptioncastError, CaptioncastResult};
use crate::model::settings::CodecPair;

/// Collects encoded chunks and produces the final container bytes.
pub trait Muxer: Send {
    /// Append one chunk. Chunks of each track arrive in decode order.
    fn add_chunk(&mut self, chunk: EncodedChunk) -> CaptioncastResult<()>;

    /// Write the container and return its bytes.
    fn finalize(&mut self) -> CaptioncastResult<Vec<u8>>;
}

/// Muxer that keeps chunks in memory and returns their concatenation.
#[derive(Debug, Default)]
pub struct InMemoryMuxer {
    chunks: Vec<EncodedChunk>,
    finalized: u32,
}

impl InMemoryMuxer {
    /// Empty muxer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every chunk received so far.
    pub fn chunks(&self) -> &[EncodedChunk] {
        &self.chunks
    }

    /// Number of `finalize` calls.
    pub fn finalize_count(&self) -> u32 {
        self.finalized
    }
}

impl Muxer for InMemoryMuxer {
    fn add_chunk(&mut self, chunk: EncodedChunk) -> CaptioncastResult<()> {
        self.chunks.push(chunk);
        Ok(())
    }

    fn finalize(&mut self) -> CaptioncastResult<Vec<u8>> {
        self.finalized += 1;
        Ok(self
            .chunks
            .iter()
            .flat_map(|c| c.data.iter().copied())
            .collect())
    }
}

struct TempDirGuard(Option<PathBuf>);

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_dir_all(path);
        }
    }
}

/// MP4 muxer that spools elementary streams to a scratch directory and remuxes them with
/// `ffmpeg -c copy -movflags +faststart`.
pub struct FfmpegMuxer {
    codec: CodecPair,
    fps: Fps,
    dir: TempDirGuard,
    video: Option<BufWriter<File>>,
    audio: Option<BufWriter<File>>,
    finalized: bool,
}

impl FfmpegMuxer {
    /// Muxer writing its scratch files under the system temp directory.
    pub fn new(codec: CodecPair, fps: Fps) -> CaptioncastResult<Self> {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let dir = std::env::temp_dir().join(format!(
            "captioncast_mux_{}_{}",
            std::process::id(),
            nanos
        ));
        std::fs::create_dir_all(&dir).map_err(|e| {
            CaptioncastError::mux_finalize(format!(
                "failed to create scratch directory '{}': {e}",
                dir.display()
            ))
        })?;
        Ok(Self {
            codec,
            fps,
            dir: TempDirGuard(Some(dir)),
            video: None,
            audio: None,
            finalized: false,
        })
    }

    fn dir(&self) -> CaptioncastResult<&Path> {
        self.dir
            .0
            .as_deref()
            .ok_or_else(|| CaptioncastError::mux_finalize("scratch directory already removed"))
    }

    fn video_path(&self) -> CaptioncastResult<PathBuf> {
        Ok(self
            .dir()?
            .join(format!("video.{}", self.codec.elementary_format())))
    }

    fn audio_path(&self) -> CaptioncastResult<PathBuf> {
        Ok(self.dir()?.join("audio.aac"))
    }

    fn output_path(&self) -> CaptioncastResult<PathBuf> {
        Ok(self.dir()?.join("output.mp4"))
    }

    fn writer(&mut self, track: Track) -> CaptioncastResult<&mut BufWriter<File>> {
        let path = match track {
            Track::Video => self.video_path()?,
            Track::Audio => self.audio_path()?,
        };
        let slot = match track {
            Track::Video => &mut self.video,
            Track::Audio => &mut self.audio,
        };
        if slot.is_none() {
            let file = File::create(&path).map_err(|e| {
                CaptioncastError::encode(format!(
                    "failed to create stream file '{}': {e}",
                    path.display()
                ))
            })?;
            *slot = Some(BufWriter::new(file));
        }
        slot.as_mut()
            .ok_or_else(|| CaptioncastError::encode("stream writer missing (unexpected)"))
    }

    fn mux_args(&self, has_audio: bool) -> CaptioncastResult<Vec<String>> {
        let mut args: Vec<String> = [
            "-hide_banner",
            "-loglevel",
            "error",
            "-y",
            "-fflags",
            "+genpts",
            "-r",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        args.push(format!("{}/{}", self.fps.num, self.fps.den));
        args.extend(["-f".to_string(), self.codec.elementary_format().to_string()]);
        args.extend(["-i".to_string(), path_arg(&self.video_path()?)]);
        if has_audio {
            args.extend(["-f", "aac", "-i"].map(str::to_string));
            args.push(path_arg(&self.audio_path()?));
            args.extend(["-map", "0:v:0", "-map", "1:a:0"].map(str::to_string));
        }
        args.extend(["-c", "copy", "-movflags", "+faststart", "-f", "mp4"].map(str::to_string));
        args.push(path_arg(&self.output_path()?));
        Ok(args)
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn close(writer: Option<BufWriter<File>>) -> CaptioncastResult<bool> {
    match writer {
        Some(mut w) => {
            w.flush()
                .map_err(|e| CaptioncastError::mux_finalize(format!("stream flush failed: {e}")))?;
            Ok(true)
        }
        None => Ok(false),
    }
}

impl Muxer for FfmpegMuxer {
    fn add_chunk(&mut self, chunk: EncodedChunk) -> CaptioncastResult<()> {
        if self.finalized {
            return Err(CaptioncastError::pipeline("muxer is already finalized"));
        }
        self.writer(chunk.track)?
            .write_all(&chunk.data)
            .map_err(|e| CaptioncastError::encode(format!("stream write failed: {e}")))
    }

    #[tracing::instrument(level = "debug", skip(self))]
    fn finalize(&mut self) -> CaptioncastResult<Vec<u8>> {
        if self.finalized {
            return Err(CaptioncastError::pipeline("muxer is already finalized"));
        }
        self.finalized = true;

        let has_video = close(self.video.take())?;
        let has_audio = close(self.audio.take())?;
        if !has_video {
            return Err(CaptioncastError::mux_finalize("no video data was produced"));
        }

        let out = Command::new("ffmpeg")
            .args(self.mux_args(has_audio)?)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| CaptioncastError::mux_finalize(format!("failed to spawn ffmpeg: {e}")))?;
        if !out.status.success() {
            return Err(CaptioncastError::mux_finalize(format!(
                "ffmpeg exited with status {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }

        let path = self.output_path()?;
        let mut bytes = Vec::new();
        File::open(&path)
            .and_then(|mut f| f.read_to_end(&mut bytes))
            .map_err(|e| {
                CaptioncastError::mux_finalize(format!(
                    "failed to read muxed output '{}': {e}",
                    path.display()
                ))
            })?;
        tracing::debug!(bytes = bytes.len(), has_audio, "container written");
        Ok(bytes)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/mux.rs"]
mod tests;
