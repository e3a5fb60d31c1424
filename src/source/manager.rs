use std::time::Duration;

use smallvec::SmallVec;

use crate::foundation::core::{Timestamp, format_timestamp};
use crate::foundation::diagnostics::Diagnostics;
use crate::foundation::error::{CaptioncastError, CaptioncastResult};
use crate::media::video::{FrameDecoder, VideoFrame, VideoInfo};
use crate::source::looping::{DecoderSlot, LoopTiming};
use crate::source::worker::{DecoderWorker, SeekOutcome};

/// Default bound on a single decoder seek.
pub const DEFAULT_SEEK_TIMEOUT: Duration = Duration::from_secs(2);

/// Environment variable overriding the seek bound, in milliseconds.
pub const SEEK_TIMEOUT_ENV: &str = "CAPTIONCAST_SEEK_TIMEOUT_MS";

/// One decoded background layer and the opacity to draw it at.
#[derive(Clone, Debug, PartialEq)]
pub struct BackgroundLayer {
    /// Decoded source pixels.
    pub frame: VideoFrame,
    /// Opacity in `[0, 1]`.
    pub alpha: f64,
}

/// Background layers for one output frame, back to front.
pub type BackgroundFrame = SmallVec<[BackgroundLayer; 2]>;

/// Seek timeout from [`SEEK_TIMEOUT_ENV`], falling back to [`DEFAULT_SEEK_TIMEOUT`].
pub fn seek_timeout_from_env() -> Duration {
    std::env::var(SEEK_TIMEOUT_ENV)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_SEEK_TIMEOUT)
}

/// Owns the background decoders and turns output timestamps into looped, optionally
/// crossfaded, background layers.
pub struct FrameSourceManager {
    timing: LoopTiming,
    primary: DecoderWorker,
    secondary: Option<DecoderWorker>,
    seek_timeout: Duration,
    stalls: u64,
}

impl FrameSourceManager {
    /// Build from a primary decoder and, for crossfading, a factory for the second instance.
    ///
    /// The second decoder is only created when the loop actually crossfades.
    pub fn new(
        primary: Box<dyn FrameDecoder>,
        make_secondary: impl FnOnce() -> CaptioncastResult<Box<dyn FrameDecoder>>,
        crossfade: bool,
        seek_timeout: Duration,
    ) -> CaptioncastResult<Self> {
        let info = primary.info().clone();
        if !info.duration_secs.is_finite() || info.duration_secs <= 0.0 {
            return Err(CaptioncastError::invalid_duration(format!(
                "source video duration must be > 0, got {}",
                info.duration_secs
            )));
        }
        let timing = LoopTiming::new(info.duration_secs, crossfade);
        let primary = DecoderWorker::spawn("primary", primary)?;
        let secondary = if timing.crossfades() {
            Some(DecoderWorker::spawn("secondary", make_secondary()?)?)
        } else {
            None
        };
        Ok(Self {
            timing,
            primary,
            secondary,
            seek_timeout,
            stalls: 0,
        })
    }

    /// Source properties.
    pub fn info(&self) -> &VideoInfo {
        self.primary.info()
    }

    /// Loop geometry in use.
    pub fn timing(&self) -> &LoopTiming {
        &self.timing
    }

    /// Number of seeks that hit the timeout so far.
    pub fn stalls(&self) -> u64 {
        self.stalls
    }

    /// Background layers for output timestamp `elapsed`.
    ///
    /// A seek that times out reuses the decoder's previous frame (black if it never produced one)
    /// and emits a diagnostic instead of failing.
    pub fn frames_at(
        &mut self,
        elapsed: Timestamp,
        diag: &mut Diagnostics<'_>,
    ) -> CaptioncastResult<BackgroundFrame> {
        let plan = self.timing.plan(elapsed);
        let mut out = BackgroundFrame::new();
        for req in plan {
            let worker = match req.slot {
                DecoderSlot::Primary => &mut self.primary,
                DecoderSlot::Secondary => match self.secondary.as_mut() {
                    Some(w) => w,
                    None => continue,
                },
            };
            let frame = match worker.seek(req.source_time, self.seek_timeout)? {
                SeekOutcome::Ready(frame) => frame,
                SeekOutcome::Stalled(previous) => {
                    self.stalls += 1;
                    diag.warn(&format!(
                        "decoder seek to {} stalled for {:?} at output {}; reusing previous frame",
                        format_timestamp(req.source_time),
                        self.seek_timeout,
                        format_timestamp(elapsed.as_secs_f64()),
                    ));
                    let info = worker.info();
                    previous.unwrap_or_else(|| {
                        VideoFrame::solid(info.width, info.height, [0, 0, 0, 255])
                    })
                }
            };
            out.push(BackgroundLayer {
                frame,
                alpha: req.alpha,
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/manager.rs"]
mod tests;
