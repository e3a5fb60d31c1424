use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::audio::segment::AudioBuffer;
use crate::encode::encoder::{AUDIO_BITRATE_BPS, AudioEncoderConfig, VideoEncoderConfig};
use crate::encode::ffmpeg::FfmpegEncoderFactory;
use crate::encode::mux::FfmpegMuxer;
use crate::encode::pipeline::{Backpressure, EncodingPipeline, PipelineConfig};
use crate::foundation::core::{Fps, FrameIndex, Resolution, Timestamp, format_timestamp};
use crate::foundation::diagnostics::{
    DiagnosticFn, Diagnostics, ProgressFn, ProgressReporter, RateLimiter,
};
use crate::foundation::error::{CaptioncastError, CaptioncastResult};
use crate::media::audio::decode_audio;
use crate::media::video::{FfmpegDecoder, FrameDecoder};
use crate::model::job::RenderJob;
use crate::model::settings::{Bitrate, CodecPair};
use crate::render::banner::render_banner;
use crate::render::captions::CaptionArena;
use crate::render::compositor::{Compositor, Overlays};
use crate::render::text::{FontRole, ParleyShaper};
use crate::render::watermark::Watermark;
use crate::source::manager::{FrameSourceManager, seek_timeout_from_env};

/// Progress callback cadence in frames.
pub const PROGRESS_EVERY_FRAMES: u64 = 10;

/// Throughput diagnostic cadence in frames.
pub const FPS_REPORT_EVERY_FRAMES: u64 = 30;

/// Caller hooks for one render. All optional and advisory, except `cancel`.
#[derive(Default)]
pub struct RenderHooks<'a> {
    /// Receives a non-decreasing fraction in `[0, 1]`, ending with exactly `1.0`.
    pub progress: Option<ProgressFn<'a>>,
    /// Receives human-readable diagnostic lines.
    pub diagnostics: Option<DiagnosticFn<'a>>,
    /// Checked once per frame; setting it aborts the render with `Cancelled`.
    pub cancel: Option<Arc<AtomicBool>>,
}

/// Counters reported by a finished render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Frames the output duration requires.
    pub frames_total: u64,
    /// Frames submitted to the encoder.
    pub frames_encoded: u64,
    /// Decoder seeks that timed out and reused a previous frame.
    pub seek_stalls: u64,
    /// Times submission waited on a full encoder queue.
    pub backpressure_waits: u64,
    /// Deepest encoder queue observed.
    pub max_queue_depth: usize,
    /// Size of the produced container.
    pub output_bytes: u64,
}

/// Result of a successful render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderOutput {
    /// MP4 bytes.
    pub bytes: Vec<u8>,
    /// Counters.
    pub stats: RenderStats,
}

/// Everything the frame loop reads from, prepared up front.
pub struct RenderParts {
    /// Background decoders.
    pub sources: FrameSourceManager,
    /// Frame compositor with its overlays.
    pub compositor: Compositor,
    /// Decoded audio track; defines the output duration when present.
    pub audio: Option<AudioBuffer>,
    /// Codec pair.
    pub codec: CodecPair,
    /// Target video bitrate.
    pub bitrate: Bitrate,
}

impl RenderParts {
    /// Output duration: the audio track when present, else the source video.
    pub fn master_duration(&self) -> CaptioncastResult<f64> {
        let (what, secs) = match &self.audio {
            Some(a) => ("audio", a.duration_secs()),
            None => ("video", self.sources.info().duration_secs),
        };
        if !secs.is_finite() || secs <= 0.0 {
            return Err(CaptioncastError::invalid_duration(format!(
                "{what} duration must be > 0, got {secs}"
            )));
        }
        Ok(secs)
    }

    fn pipeline_config(&self, fps: Fps) -> PipelineConfig {
        let res = self.compositor.resolution();
        PipelineConfig {
            video: VideoEncoderConfig {
                width: res.width,
                height: res.height,
                fps,
                bitrate: self.bitrate,
                codec: self.codec,
            },
            audio: self
                .audio
                .as_ref()
                .filter(|a| a.channel_count() > 0)
                .map(|a| AudioEncoderConfig {
                    sample_rate: a.sample_rate,
                    channels: a.channel_count(),
                    bitrate_bps: AUDIO_BITRATE_BPS,
                }),
        }
    }
}

/// Render every output frame through `pipeline` and return the finished container.
///
/// Frames are composited strictly in order. A cancelled or failed render drops the pipeline
/// without finalizing it, so no partial container is ever returned.
#[tracing::instrument(skip_all)]
pub fn render(
    mut parts: RenderParts,
    mut pipeline: EncodingPipeline,
    hooks: RenderHooks<'_>,
) -> CaptioncastResult<RenderOutput> {
    let RenderHooks {
        progress,
        diagnostics,
        cancel,
    } = hooks;
    let mut diag = diagnostics.map_or_else(Diagnostics::silent, Diagnostics::with_sink);
    let mut progress =
        ProgressReporter::new(progress, RateLimiter::every_frames(PROGRESS_EVERY_FRAMES));
    let fps_report = RateLimiter::every_frames(FPS_REPORT_EVERY_FRAMES);

    let fps = Fps::OUTPUT;
    let master = parts.master_duration()?;
    let total = fps.secs_to_frames_ceil(master);
    if total == 0 {
        return Err(CaptioncastError::invalid_duration(format!(
            "duration {master}s yields no frames"
        )));
    }

    pipeline.configure(parts.pipeline_config(fps), &mut diag)?;
    let res = parts.compositor.resolution();
    diag.info(&format!(
        "rendering {total} frames ({}) at {}x{}",
        format_timestamp(master),
        res.width,
        res.height
    ));

    let started = Instant::now();
    for i in 0..total {
        if cancel.as_ref().is_some_and(|c| c.load(Ordering::Relaxed)) {
            diag.warn(&format!("render cancelled at frame {i}"));
            return Err(CaptioncastError::Cancelled);
        }
        let frame = FrameIndex(i);
        let elapsed = fps.frame_timestamp(frame);

        let layers = parts.sources.frames_at(elapsed, &mut diag)?;
        let rgba = parts.compositor.compose(&layers, elapsed.as_secs_f64())?;
        let slice = parts
            .audio
            .as_ref()
            .and_then(|a| a.slice_for_frame(frame, fps));
        pipeline.submit(frame, rgba, slice.as_ref())?;

        progress.frame(i, total);
        if i > 0 && fps_report.should_fire(i) {
            let secs = started.elapsed().as_secs_f64().max(f64::EPSILON);
            diag.info(&format!(
                "{:.0}% - {:.1} fps",
                i as f64 / total as f64 * 100.0,
                i as f64 / secs
            ));
        }
    }

    progress.complete();
    diag.info("finalizing container");
    let bytes = pipeline.finish()?;

    let ps = pipeline.stats();
    let stats = RenderStats {
        frames_total: total,
        frames_encoded: ps.frames_submitted,
        seek_stalls: parts.sources.stalls(),
        backpressure_waits: ps.backpressure_waits,
        max_queue_depth: ps.max_queue_depth,
        output_bytes: bytes.len() as u64,
    };
    tracing::info!(?stats, "render finished");
    diag.info(&format!(
        "done: {} frames, {} bytes",
        stats.frames_encoded, stats.output_bytes
    ));
    Ok(RenderOutput { bytes, stats })
}

/// Composite the single frame shown at `time_secs` and return its RGBA8 pixels.
pub fn render_still(
    sources: &mut FrameSourceManager,
    compositor: &mut Compositor,
    time_secs: f64,
    diag: &mut Diagnostics<'_>,
) -> CaptioncastResult<Vec<u8>> {
    if !time_secs.is_finite() || time_secs < 0.0 {
        return Err(CaptioncastError::validation(
            "still time must be finite and >= 0",
        ));
    }
    let elapsed = Timestamp::from_secs_f64(time_secs);
    let layers = sources.frames_at(elapsed, diag)?;
    Ok(compositor.compose(&layers, elapsed.as_secs_f64())?.to_vec())
}

/// Load fonts, overlays, decoders and audio for `job`.
#[tracing::instrument(skip_all, fields(video = %job.video.display()))]
pub fn prepare_job(job: &RenderJob, diag: &mut Diagnostics<'_>) -> CaptioncastResult<RenderParts> {
    job.validate()?;
    let resolution = job.settings.resolution();

    diag.info("loading fonts");
    let mut shaper = ParleyShaper::new();
    if let Some(p) = &job.style.primary.font {
        shaper.register_file(FontRole::Primary, p)?;
    }
    if let Some(p) = &job.style.secondary.font {
        shaper.register_file(FontRole::Secondary, p)?;
    }
    if let Some(p) = job.banner_font.as_ref().or(job.style.secondary.font.as_ref()) {
        shaper.register_file(FontRole::Banner, p)?;
    }

    diag.info("opening source video");
    let primary = FfmpegDecoder::open(&job.video)?;
    let source_size = (primary.info().width, primary.info().height);
    let video_path = job.video.clone();
    let sources = FrameSourceManager::new(
        Box::new(primary),
        move || Ok(Box::new(FfmpegDecoder::open(&video_path)?) as Box<dyn FrameDecoder>),
        job.settings.crossfade,
        seek_timeout_from_env(),
    )?;

    let audio = match &job.audio {
        Some(path) => {
            diag.info("decoding audio");
            Some(decode_audio(path)?)
        }
        None => None,
    };

    diag.info("preparing overlays");
    let captions = CaptionArena::build(&job.captions, &job.style, resolution, &mut shaper)?;
    let watermark = job
        .watermark
        .as_ref()
        .map(|cfg| Watermark::load(cfg, source_size, resolution))
        .transpose()?;
    let banner = render_banner(&mut shaper, &job.metadata, resolution)?;
    let compositor = Compositor::new(
        resolution,
        job.settings.color_filter,
        Overlays {
            captions,
            watermark,
            banner,
            shaper: Box::new(shaper),
        },
    )?;

    Ok(RenderParts {
        sources,
        compositor,
        audio,
        codec: job.settings.codec,
        bitrate: job.settings.bitrate,
    })
}

/// Render `job` to MP4 bytes with the `ffmpeg` encoders and muxer.
#[tracing::instrument(skip_all)]
pub fn render_job(job: &RenderJob, hooks: RenderHooks<'_>) -> CaptioncastResult<RenderOutput> {
    let RenderHooks {
        progress,
        diagnostics,
        cancel,
    } = hooks;
    let mut diag = diagnostics.map_or_else(Diagnostics::silent, Diagnostics::with_sink);
    let parts = prepare_job(job, &mut diag)?;
    let pipeline = EncodingPipeline::new(
        Box::new(FfmpegEncoderFactory::new()),
        Box::new(FfmpegMuxer::new(job.settings.codec, job.settings.fps())?),
    )
    .with_backpressure(Backpressure::default());

    let emitted = diag.emitted();
    let diagnostics = diag.into_sink();
    tracing::debug!(emitted, "job prepared");
    render(
        parts,
        pipeline,
        RenderHooks {
            progress,
            diagnostics,
            cancel,
        },
    )
}

/// Composite the frame of `job` shown at `time_secs`.
pub fn render_job_still(
    job: &RenderJob,
    time_secs: f64,
) -> CaptioncastResult<(Resolution, Vec<u8>)> {
    let mut diag = Diagnostics::silent();
    let mut parts = prepare_job(job, &mut diag)?;
    let rgba = render_still(&mut parts.sources, &mut parts.compositor, time_secs, &mut diag)?;
    Ok((parts.compositor.resolution(), rgba))
}

#[cfg(test)]
#[path = "../../tests/unit/session/render.rs"]
mod tests;
