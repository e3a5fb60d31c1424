//! Media I/O through the system `ffmpeg`/`ffprobe` binaries and the `image`/`resvg` crates.

/// Audio decoding.
pub mod audio;
/// Watermark image loading.
pub mod image;
/// `ffprobe` metadata.
pub mod probe;
/// Seekable video decoding.
pub mod video;
