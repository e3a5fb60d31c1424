//! Caption timing normalization.
//!
//! [`sanitize_captions`] is the defensive pass the renderer always applies. [`resolve_timing`] is
//! the stronger overlap-then-gap policy for callers whose caption source does not already
//! guarantee ordered, non-overlapping segments.

use crate::model::caption::CaptionSegment;

/// Gaps shorter than this are closed by [`resolve_timing`].
pub const GAP_FILL_THRESHOLD_SECS: f64 = 15.0;

/// Make a caption list safe to render without reordering its content.
///
/// Segments with non-finite times are dropped, negative starts clamp to 0, `end < start` clamps
/// to `start`, and the list is stably sorted by start. Each `end` is then clamped to the next
/// segment's `start`.
pub fn sanitize_captions(captions: &[CaptionSegment]) -> Vec<CaptionSegment> {
    let mut out: Vec<CaptionSegment> = captions
        .iter()
        .filter(|c| c.start.is_finite() && c.end.is_finite())
        .cloned()
        .map(|mut c| {
            c.start = c.start.max(0.0);
            c.end = c.end.max(c.start);
            c
        })
        .collect();
    out.sort_by(|a, b| a.start.total_cmp(&b.start));

    for i in 1..out.len() {
        let next_start = out[i].start;
        let prev = &mut out[i - 1];
        if prev.end > next_start {
            prev.end = next_start.max(prev.start);
        }
    }
    out
}

/// Overlap-clamp then gap-fill.
///
/// After [`sanitize_captions`], zero-length segments are dropped and any gap shorter than
/// [`GAP_FILL_THRESHOLD_SECS`] is closed by extending the earlier segment's `end` to the next
/// `start`. Longer gaps stay silent.
pub fn resolve_timing(captions: &[CaptionSegment]) -> Vec<CaptionSegment> {
    let mut out: Vec<CaptionSegment> = sanitize_captions(captions)
        .into_iter()
        .filter(|c| c.end > c.start)
        .collect();

    for i in 1..out.len() {
        let next_start = out[i].start;
        let prev = &mut out[i - 1];
        let gap = next_start - prev.end;
        if gap > 0.0 && gap < GAP_FILL_THRESHOLD_SECS {
            prev.end = next_start;
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/model/timing.rs"]
mod tests;
