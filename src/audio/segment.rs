use std::ops::Range;

use crate::foundation::core::{Fps, FrameIndex};

/// Decoded planar PCM audio.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioBuffer {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// One sample vector per channel, all of equal length.
    pub channels: Vec<Vec<f32>>,
}

/// A contiguous run of planar samples cut from an [`AudioBuffer`].
#[derive(Clone, Debug, PartialEq)]
pub struct AudioSlice {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Index of the first sample within the source buffer.
    pub start_sample: u64,
    /// Planar samples, one vector per channel.
    pub channels: Vec<Vec<f32>>,
}

impl AudioSlice {
    /// Samples per channel.
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Interleave channels into one `f32` vector.
    pub fn interleaved(&self) -> Vec<f32> {
        let n = self.frames();
        let ch = self.channels.len();
        let mut out = Vec::with_capacity(n * ch);
        for i in 0..n {
            for c in &self.channels {
                out.push(c[i]);
            }
        }
        out
    }
}

impl AudioBuffer {
    /// Build from interleaved samples, keeping at most `max_channels` channels.
    pub fn from_interleaved(
        sample_rate: u32,
        channels: u16,
        interleaved: &[f32],
        max_channels: u16,
    ) -> Self {
        let src_ch = usize::from(channels.max(1));
        let keep = src_ch.min(usize::from(max_channels.max(1)));
        let frames = interleaved.len() / src_ch;
        let mut planar = vec![Vec::with_capacity(frames); keep];
        for frame in interleaved.chunks_exact(src_ch) {
            for (c, plane) in planar.iter_mut().enumerate() {
                plane.push(frame[c]);
            }
        }
        Self {
            sample_rate,
            channels: planar,
        }
    }

    /// Number of channels.
    pub fn channel_count(&self) -> u16 {
        self.channels.len() as u16
    }

    /// Samples per channel.
    pub fn len_samples(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len_samples() as f64 / f64::from(self.sample_rate)
    }

    /// `[floor(start * sr), floor((start + interval) * sr))`, clamped to the buffer.
    pub fn sample_range(&self, start_secs: f64, interval_secs: f64) -> Range<usize> {
        let sr = f64::from(self.sample_rate);
        let len = self.len_samples();
        let to_index = |secs: f64| -> usize {
            if !secs.is_finite() || secs <= 0.0 {
                return 0;
            }
            ((secs * sr).floor() as usize).min(len)
        };
        let start = to_index(start_secs);
        let end = to_index(start_secs + interval_secs.max(0.0)).max(start);
        start..end
    }

    /// Sample range covered by output `frame` at `fps`, computed in integer arithmetic so
    /// consecutive frames tile the buffer with no gaps or overlaps.
    pub fn frame_sample_range(&self, frame: FrameIndex, fps: Fps) -> Range<usize> {
        let len = self.len_samples() as u128;
        let at = |f: u64| -> usize {
            let s = u128::from(f) * u128::from(self.sample_rate) * u128::from(fps.den)
                / u128::from(fps.num);
            s.min(len) as usize
        };
        at(frame.0)..at(frame.0.saturating_add(1))
    }

    /// Copy the samples in `range`. Returns `None` for an empty range.
    pub fn slice(&self, range: Range<usize>) -> Option<AudioSlice> {
        if range.is_empty() || range.start >= self.len_samples() {
            return None;
        }
        let end = range.end.min(self.len_samples());
        Some(AudioSlice {
            sample_rate: self.sample_rate,
            start_sample: range.start as u64,
            channels: self
                .channels
                .iter()
                .map(|c| c[range.start..end].to_vec())
                .collect(),
        })
    }

    /// Samples for `[start, start + interval)` seconds, or `None` past the end.
    pub fn slice_secs(&self, start_secs: f64, interval_secs: f64) -> Option<AudioSlice> {
        self.slice(self.sample_range(start_secs, interval_secs))
    }

    /// Samples for output `frame`, or `None` past the end.
    pub fn slice_for_frame(&self, frame: FrameIndex, fps: Fps) -> Option<AudioSlice> {
        self.slice(self.frame_sample_range(frame, fps))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/segment.rs"]
mod tests;
