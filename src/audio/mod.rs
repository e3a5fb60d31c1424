/// Planar PCM buffers and per-frame slicing.
pub mod segment;
