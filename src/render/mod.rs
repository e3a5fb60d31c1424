//! Frame composition: background layers, color looks, watermark, banner and captions.

/// Metadata banner pill.
pub mod banner;
/// Prepared caption arena and styled line rasters.
pub mod captions;
/// Per-frame compositor.
pub mod compositor;
/// Color grading looks.
pub mod filter;
/// Coverage masks and premultiplied layers.
pub mod raster;
/// Text shaping and measurement.
pub mod text;
/// Watermark placement.
pub mod watermark;
