//! Encoding: encoder traits, the `ffmpeg` backends, muxing and the backpressured pipeline.

/// Encoder traits and parameters.
pub mod encoder;
/// `ffmpeg`-backed encoders and hardware detection.
pub mod ffmpeg;
/// Container muxers.
pub mod mux;
/// Encoder lifecycle and backpressure.
pub mod pipeline;
