//! Caller-facing configuration: captions, styling, overlays and output settings.

/// Caption segments, styles and animation kinds.
pub mod caption;
/// CSS-like color values.
pub mod color;
/// JSON render job.
pub mod job;
/// Output settings, watermark and banner metadata.
pub mod settings;
/// Caption timing normalization.
pub mod timing;
