use smallvec::SmallVec;

use crate::foundation::core::{MICROS_PER_SEC, Timestamp};

/// Length of the loop-seam crossfade.
pub const CROSSFADE_SECS: f64 = 1.0;

/// Sources this short or shorter never crossfade.
pub const MIN_CROSSFADE_SOURCE_SECS: f64 = 2.0;

/// Seek targets stay at least this far before the end of the source.
pub const SEEK_END_MARGIN_SECS: f64 = 0.01;

/// Which decoder a background layer is read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecoderSlot {
    /// Main decoder, always present.
    Primary,
    /// Second decoder, present only when crossfading.
    Secondary,
}

/// One source read for the current output frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerRequest {
    /// Decoder to read from.
    pub slot: DecoderSlot,
    /// Source position in seconds, already clamped for seeking.
    pub source_time: f64,
    /// Layer opacity in `[0, 1]`.
    pub alpha: f64,
}

/// Background layers for one output frame, back to front.
pub type LoopPlan = SmallVec<[LayerRequest; 2]>;

/// Loop geometry of one source video.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoopTiming {
    duration_us: u64,
    crossfade: bool,
}

impl LoopTiming {
    /// Build for a source of `duration_secs`. Crossfade is honored only for sources longer than
    /// [`MIN_CROSSFADE_SOURCE_SECS`].
    pub fn new(duration_secs: f64, crossfade: bool) -> Self {
        let duration_us = Timestamp::from_secs_f64(duration_secs).as_micros().max(1);
        Self {
            duration_us,
            crossfade: crossfade && duration_secs > MIN_CROSSFADE_SOURCE_SECS,
        }
    }

    /// Whether the seam is crossfaded.
    pub fn crossfades(&self) -> bool {
        self.crossfade
    }

    /// Source duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        Timestamp(self.duration_us).as_secs_f64()
    }

    /// Position inside the source for an output timestamp.
    pub fn time_in_source(&self, elapsed: Timestamp) -> Timestamp {
        Timestamp(elapsed.as_micros() % self.duration_us)
    }

    /// Clamp a seek target to `[0, duration - margin]`.
    pub fn clamp_seek(&self, secs: f64) -> f64 {
        let max = (self.duration_secs() - SEEK_END_MARGIN_SECS).max(0.0);
        if !secs.is_finite() {
            return 0.0;
        }
        secs.clamp(0.0, max)
    }

    /// Background layers for output timestamp `elapsed`.
    ///
    /// Inside the last [`CROSSFADE_SECS`] of the source (crossfade enabled) the primary fades
    /// out while the secondary, reading from the start of the source, fades in.
    pub fn plan(&self, elapsed: Timestamp) -> LoopPlan {
        let t = self.time_in_source(elapsed).as_micros();
        let fade_us = (CROSSFADE_SECS * MICROS_PER_SEC as f64) as u64;
        let fade_start = self.duration_us.saturating_sub(fade_us);

        let mut plan = LoopPlan::new();
        if self.crossfade && t > fade_start {
            let into_fade = t - fade_start;
            let fade = (into_fade as f64 / fade_us as f64).clamp(0.0, 1.0);
            plan.push(LayerRequest {
                slot: DecoderSlot::Primary,
                source_time: self.clamp_seek(Timestamp(t).as_secs_f64()),
                alpha: 1.0 - fade,
            });
            plan.push(LayerRequest {
                slot: DecoderSlot::Secondary,
                source_time: self.clamp_seek(Timestamp(into_fade).as_secs_f64()),
                alpha: fade,
            });
        } else {
            plan.push(LayerRequest {
                slot: DecoderSlot::Primary,
                source_time: self.clamp_seek(Timestamp(t).as_secs_f64()),
                alpha: 1.0,
            });
        }
        plan
    }
}

/// Source rectangle `(x, y, w, h)` that center-crops a `src_w` x `src_h` frame to `target_aspect`.
pub fn center_crop_rect(src_w: f64, src_h: f64, target_aspect: f64) -> (f64, f64, f64, f64) {
    if src_w <= 0.0 || src_h <= 0.0 || !target_aspect.is_finite() || target_aspect <= 0.0 {
        return (0.0, 0.0, src_w.max(0.0), src_h.max(0.0));
    }
    let src_aspect = src_w / src_h;
    if src_aspect > target_aspect {
        let w = src_h * target_aspect;
        ((src_w - w) / 2.0, 0.0, w, src_h)
    } else {
        let h = src_w / target_aspect;
        (0.0, (src_h - h) / 2.0, src_w, h)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/looping.rs"]
mod tests;
