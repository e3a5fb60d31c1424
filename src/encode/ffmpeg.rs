use std::io::{Read, Write};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread::JoinHandle;

use crate::audio::segment::AudioSlice;
use crate::encode::encoder::{
    Acceleration, AudioEncoder, AudioEncoderConfig, EncodedChunk, EncoderFactory,
    KEYFRAME_INTERVAL, Track, VideoEncoder, VideoEncoderConfig,
};
use crate::foundation::core::Timestamp;
use crate::foundation::error::{CaptioncastError, CaptioncastResult};
use crate::model::settings::CodecPair;

const READ_CHUNK_BYTES: usize = 64 * 1024;

/// A running `ffmpeg` process fed through stdin by a writer thread and drained from stdout by a
/// reader thread, so neither side can block the caller.
struct ProcessStream {
    label: String,
    child: Option<Child>,
    input: Option<mpsc::Sender<Vec<u8>>>,
    writer: Option<JoinHandle<std::io::Result<()>>>,
    pending: Arc<AtomicUsize>,
    output: mpsc::Receiver<Vec<u8>>,
    reader: Option<JoinHandle<std::io::Result<()>>>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
}

impl ProcessStream {
    fn spawn(label: impl Into<String>, mut cmd: Command) -> CaptioncastResult<Self> {
        let label = label.into();
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let mut child = cmd.spawn().map_err(|e| {
            CaptioncastError::encoder_configuration(format!(
                "failed to spawn ffmpeg for {label} (is it installed and on PATH?): {e}"
            ))
        })?;

        let mut stdin = child.stdin.take().ok_or_else(|| {
            CaptioncastError::encoder_configuration("failed to open ffmpeg stdin (unexpected)")
        })?;
        let mut stdout = child.stdout.take().ok_or_else(|| {
            CaptioncastError::encoder_configuration("failed to open ffmpeg stdout (unexpected)")
        })?;
        let mut stderr = child.stderr.take().ok_or_else(|| {
            CaptioncastError::encoder_configuration("failed to open ffmpeg stderr (unexpected)")
        })?;

        let pending = Arc::new(AtomicUsize::new(0));
        let (input_tx, input_rx) = mpsc::channel::<Vec<u8>>();
        let writer_pending = pending.clone();
        let writer = std::thread::spawn(move || -> std::io::Result<()> {
            for buf in input_rx {
                stdin.write_all(&buf)?;
                writer_pending.fetch_sub(1, Ordering::AcqRel);
            }
            stdin.flush()
        });

        let (output_tx, output_rx) = mpsc::channel::<Vec<u8>>();
        let reader = std::thread::spawn(move || -> std::io::Result<()> {
            let mut buf = vec![0u8; READ_CHUNK_BYTES];
            loop {
                let n = stdout.read(&mut buf)?;
                if n == 0 {
                    return Ok(());
                }
                if output_tx.send(buf[..n].to_vec()).is_err() {
                    return Ok(());
                }
            }
        });

        let stderr_drain = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok(bytes)
        });

        Ok(Self {
            label,
            child: Some(child),
            input: Some(input_tx),
            writer: Some(writer),
            pending,
            output: output_rx,
            reader: Some(reader),
            stderr_drain: Some(stderr_drain),
        })
    }

    fn write(&mut self, bytes: Vec<u8>) -> CaptioncastResult<()> {
        self.check_writer()?;
        let input = self.input.as_ref().ok_or_else(|| {
            CaptioncastError::encode(format!("{} encoder is already flushed", self.label))
        })?;
        self.pending.fetch_add(1, Ordering::AcqRel);
        if input.send(bytes).is_err() {
            self.pending.fetch_sub(1, Ordering::AcqRel);
            return Err(CaptioncastError::encode(format!(
                "{} encoder stopped accepting input",
                self.label
            )));
        }
        Ok(())
    }

    fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    fn try_output(&mut self) -> CaptioncastResult<Vec<Vec<u8>>> {
        self.check_writer()?;
        Ok(self.output.try_iter().collect())
    }

    /// Surface a failed writer instead of letting callers wait on a queue that never drains.
    fn check_writer(&mut self) -> CaptioncastResult<()> {
        if !self.writer.as_ref().is_some_and(JoinHandle::is_finished) {
            return Ok(());
        }
        let Some(handle) = self.writer.take() else {
            return Ok(());
        };
        match handle.join() {
            Ok(Ok(())) if self.input.is_none() => Ok(()),
            Ok(Ok(())) => Err(self.failure("closed its input early")),
            Ok(Err(e)) => Err(self.failure(&format!("input write failed: {e}"))),
            Err(_) => Err(CaptioncastError::encode(format!(
                "{} writer thread panicked",
                self.label
            ))),
        }
    }

    fn failure(&mut self, what: &str) -> CaptioncastError {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        let stderr = self.join_stderr().unwrap_or_default();
        CaptioncastError::encode(format!(
            "{} encoder {what}: {}",
            self.label,
            String::from_utf8_lossy(&stderr).trim()
        ))
    }

    fn join_stderr(&mut self) -> CaptioncastResult<Vec<u8>> {
        match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| CaptioncastError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| CaptioncastError::encode(format!("ffmpeg stderr read failed: {e}"))),
            None => Ok(Vec::new()),
        }
    }

    fn finish(&mut self) -> CaptioncastResult<Vec<Vec<u8>>> {
        drop(self.input.take());
        if let Some(handle) = self.writer.take() {
            let res = handle.join().map_err(|_| {
                CaptioncastError::encode(format!("{} writer thread panicked", self.label))
            })?;
            if let Err(e) = res {
                return Err(self.failure(&format!("input write failed: {e}")));
            }
        }
        if let Some(handle) = self.reader.take() {
            handle
                .join()
                .map_err(|_| {
                    CaptioncastError::encode(format!("{} reader thread panicked", self.label))
                })?
                .map_err(|e| {
                    CaptioncastError::encode(format!("{} output read failed: {e}", self.label))
                })?;
        }
        let chunks: Vec<Vec<u8>> = self.output.try_iter().collect();

        let mut child = self.child.take().ok_or_else(|| {
            CaptioncastError::encode(format!("{} encoder is already flushed", self.label))
        })?;
        let status = child.wait().map_err(|e| {
            CaptioncastError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr = self.join_stderr()?;
        if !status.success() {
            return Err(CaptioncastError::encode(format!(
                "{} ffmpeg exited with status {}: {}",
                self.label,
                status,
                String::from_utf8_lossy(&stderr).trim()
            )));
        }
        Ok(chunks)
    }
}

impl Drop for ProcessStream {
    fn drop(&mut self) {
        drop(self.input.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Video encoder running an `ffmpeg` process that turns raw RGBA into an H.264/HEVC
/// elementary stream.
pub struct FfmpegVideoEncoder {
    name: String,
    frame_len: usize,
    stream: ProcessStream,
    last_timestamp: Timestamp,
    next_is_first: bool,
}

impl FfmpegVideoEncoder {
    /// Spawn `ffmpeg` with the video encoder `encoder` (e.g. `libx264`, `h264_nvenc`).
    pub fn spawn(config: &VideoEncoderConfig, encoder: &str) -> CaptioncastResult<Self> {
        if config.width == 0 || config.height == 0 {
            return Err(CaptioncastError::validation(
                "video encoder width/height must be non-zero",
            ));
        }
        if config.width % 2 != 0 || config.height % 2 != 0 {
            return Err(CaptioncastError::validation(
                "video encoder width/height must be even (required for yuv420p)",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.args([
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", config.width, config.height),
            "-framerate",
            &format!("{}/{}", config.fps.num, config.fps.den),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            encoder,
            "-b:v",
            &config.bitrate.bits_per_sec().to_string(),
            "-g",
            &KEYFRAME_INTERVAL.to_string(),
            "-force_key_frames",
            &format!("expr:eq(mod(n,{KEYFRAME_INTERVAL}),0)"),
            "-pix_fmt",
            "yuv420p",
            "-f",
            config.codec.elementary_format(),
            "pipe:1",
        ]);

        Ok(Self {
            name: encoder.to_string(),
            frame_len: (config.width as usize) * (config.height as usize) * 4,
            stream: ProcessStream::spawn(format!("video ({encoder})"), cmd)?,
            last_timestamp: Timestamp::ZERO,
            next_is_first: true,
        })
    }

    fn chunks(&mut self, raw: Vec<Vec<u8>>) -> Vec<EncodedChunk> {
        raw.into_iter()
            .map(|data| {
                let key_frame = std::mem::take(&mut self.next_is_first);
                EncodedChunk {
                    track: Track::Video,
                    timestamp: self.last_timestamp,
                    key_frame,
                    data,
                }
            })
            .collect()
    }
}

impl VideoEncoder for FfmpegVideoEncoder {
    fn name(&self) -> &str {
        &self.name
    }

    fn encode(
        &mut self,
        rgba: &[u8],
        timestamp: Timestamp,
        _key_frame: bool,
    ) -> CaptioncastResult<()> {
        if rgba.len() != self.frame_len {
            return Err(CaptioncastError::validation(format!(
                "frame byte length {} does not match encoder size ({} bytes)",
                rgba.len(),
                self.frame_len
            )));
        }
        self.last_timestamp = timestamp;
        self.stream.write(rgba.to_vec())
    }

    fn pending(&self) -> usize {
        self.stream.pending()
    }

    fn take_output(&mut self) -> CaptioncastResult<Vec<EncodedChunk>> {
        let raw = self.stream.try_output()?;
        Ok(self.chunks(raw))
    }

    fn flush(&mut self) -> CaptioncastResult<Vec<EncodedChunk>> {
        let raw = self.stream.finish()?;
        Ok(self.chunks(raw))
    }
}

/// AAC encoder running an `ffmpeg` process that turns interleaved `f32le` PCM into ADTS.
pub struct FfmpegAudioEncoder {
    channels: u16,
    stream: ProcessStream,
    last_timestamp: Timestamp,
}

impl FfmpegAudioEncoder {
    /// Spawn `ffmpeg` with the native AAC encoder.
    pub fn spawn(config: &AudioEncoderConfig) -> CaptioncastResult<Self> {
        if config.sample_rate == 0 || config.channels == 0 {
            return Err(CaptioncastError::validation(
                "audio sample_rate and channels must be non-zero",
            ));
        }
        let mut cmd = Command::new("ffmpeg");
        cmd.args([
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "f32le",
            "-ar",
            &config.sample_rate.to_string(),
            "-ac",
            &config.channels.to_string(),
            "-i",
            "pipe:0",
            "-vn",
            "-c:a",
            "aac",
            "-b:a",
            &config.bitrate_bps.to_string(),
            "-f",
            "adts",
            "pipe:1",
        ]);
        Ok(Self {
            channels: config.channels,
            stream: ProcessStream::spawn("audio (aac)", cmd)?,
            last_timestamp: Timestamp::ZERO,
        })
    }

    fn chunks(&self, raw: Vec<Vec<u8>>) -> Vec<EncodedChunk> {
        raw.into_iter()
            .map(|data| EncodedChunk {
                track: Track::Audio,
                timestamp: self.last_timestamp,
                key_frame: true,
                data,
            })
            .collect()
    }
}

impl AudioEncoder for FfmpegAudioEncoder {
    fn encode(&mut self, slice: &AudioSlice, timestamp: Timestamp) -> CaptioncastResult<()> {
        if slice.channels.len() != usize::from(self.channels) {
            return Err(CaptioncastError::validation(format!(
                "audio slice has {} channels, encoder expects {}",
                slice.channels.len(),
                self.channels
            )));
        }
        if slice.frames() == 0 {
            return Ok(());
        }
        let bytes = slice
            .interleaved()
            .into_iter()
            .flat_map(f32::to_le_bytes)
            .collect();
        self.last_timestamp = timestamp;
        self.stream.write(bytes)
    }

    fn take_output(&mut self) -> CaptioncastResult<Vec<EncodedChunk>> {
        let raw = self.stream.try_output()?;
        Ok(self.chunks(raw))
    }

    fn flush(&mut self) -> CaptioncastResult<Vec<EncodedChunk>> {
        let raw = self.stream.finish()?;
        Ok(self.chunks(raw))
    }
}

/// Creates `ffmpeg`-backed encoders, detecting a usable hardware video encoder once.
#[derive(Debug, Default)]
pub struct FfmpegEncoderFactory {
    hardware: Option<Option<String>>,
}

impl FfmpegEncoderFactory {
    /// Factory with hardware detection deferred to the first hardware request.
    pub fn new() -> Self {
        Self::default()
    }

    fn hardware_encoder(&mut self, codec: CodecPair) -> Option<String> {
        if let Some(found) = &self.hardware {
            return found.clone();
        }
        let found = detect_hardware_encoder(codec);
        self.hardware = Some(found.clone());
        found
    }
}

impl EncoderFactory for FfmpegEncoderFactory {
    fn video(
        &mut self,
        config: &VideoEncoderConfig,
        acceleration: Acceleration,
    ) -> CaptioncastResult<Box<dyn VideoEncoder>> {
        let name = match acceleration {
            Acceleration::PreferHardware => {
                self.hardware_encoder(config.codec).ok_or_else(|| {
                    CaptioncastError::encoder_configuration(format!(
                        "no usable hardware encoder for {}",
                        config.codec.elementary_format()
                    ))
                })?
            }
            Acceleration::Software => config.codec.software_video_encoder().to_string(),
        };
        Ok(Box::new(FfmpegVideoEncoder::spawn(config, &name)?))
    }

    fn audio(&mut self, config: &AudioEncoderConfig) -> CaptioncastResult<Box<dyn AudioEncoder>> {
        Ok(Box::new(FfmpegAudioEncoder::spawn(config)?))
    }
}

/// Names listed by `ffmpeg -encoders`.
pub fn list_encoders() -> CaptioncastResult<Vec<String>> {
    let out = Command::new("ffmpeg")
        .args(["-hide_banner", "-encoders"])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map_err(|e| {
            CaptioncastError::encoder_configuration(format!("failed to run ffmpeg -encoders: {e}"))
        })?;
    if !out.status.success() {
        return Err(CaptioncastError::encoder_configuration(format!(
            "ffmpeg -encoders exited with status {}",
            out.status
        )));
    }
    Ok(parse_encoder_list(&String::from_utf8_lossy(&out.stdout)))
}

/// Parse the table printed by `ffmpeg -encoders`: a legend, a `------` separator, then one
/// `<flags> <name> <description>` row per encoder.
pub(crate) fn parse_encoder_list(text: &str) -> Vec<String> {
    text.lines()
        .skip_while(|l| !l.trim_start().starts_with("---"))
        .skip(1)
        .filter_map(|l| {
            let mut parts = l.split_whitespace();
            let _flags = parts.next()?;
            parts.next().map(str::to_string)
        })
        .collect()
}

/// One-frame test encode, since listed hardware encoders often lack a device or driver.
fn probe_encoder(name: &str) -> bool {
    Command::new("ffmpeg")
        .args([
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "lavfi",
            "-i",
            "color=c=black:s=256x256:d=0.1",
            "-frames:v",
            "1",
            "-c:v",
            name,
            "-f",
            "null",
            "-",
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// First hardware encoder for `codec` that is listed by ffmpeg and passes a test encode.
#[tracing::instrument(level = "debug")]
pub fn detect_hardware_encoder(codec: CodecPair) -> Option<String> {
    let listed = match list_encoders() {
        Ok(listed) => listed,
        Err(e) => {
            tracing::debug!(error = %e, "encoder listing failed");
            return None;
        }
    };
    codec
        .hardware_video_encoders()
        .iter()
        .filter(|name| listed.iter().any(|l| l.as_str() == **name))
        .find(|name| {
            let ok = probe_encoder(name);
            tracing::debug!(encoder = **name, ok, "hardware encoder probe");
            ok
        })
        .map(|name| name.to_string())
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> CaptioncastResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent).with_context(|| {
            format!("failed to create output directory '{}'", parent.display())
        })?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
