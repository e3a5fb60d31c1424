//! captioncast composes captioned videos.
//!
//! A render takes a looping background video, an optional audio track, time-coded bilingual
//! captions and optional watermark/banner overlays, and produces one MP4 at a fixed 30 fps:
//!
//! - Describe the render as a [`RenderJob`] (usually loaded from JSON)
//! - Call [`render_job`] to get the MP4 bytes, or [`render_job_still`] for a single frame
//! - Or assemble [`RenderParts`] and an [`EncodingPipeline`] yourself and call [`render`]
//!
//! Decoding, encoding and muxing go through the system `ffmpeg`/`ffprobe` binaries. Every
//! seam that touches them is a trait, so the pipeline can be driven with in-process fakes.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Caption entrance animations.
pub mod animation;
/// PCM audio buffers.
pub mod audio;
/// Encoders, muxers and the encoding pipeline.
pub mod encode;
/// Caption text layout.
pub mod layout;
/// Media decoding.
pub mod media;
/// Render job model.
pub mod model;
/// Frame composition.
pub mod render;
/// Render driver.
pub mod session;
/// Looping background sources.
pub mod source;

pub use crate::foundation::core::{
    Affine, Fps, FrameIndex, MICROS_PER_SEC, Rect, Resolution, Rgba8Premul, Timestamp,
    format_timestamp,
};
pub use crate::foundation::diagnostics::{
    DiagnosticFn, Diagnostics, ProgressFn, ProgressReporter, RateLimiter,
};
pub use crate::foundation::error::{CaptioncastError, CaptioncastResult};

pub use crate::encode::pipeline::{Backpressure, EncodingPipeline, PipelineConfig, PipelineState};
pub use crate::model::caption::{AnimationKind, CaptionSegment, CaptionStyle};
pub use crate::model::job::RenderJob;
pub use crate::model::settings::{AspectRatio, Bitrate, CodecPair, ColorFilter, RenderSettings};
pub use crate::render::compositor::{Compositor, Overlays};
pub use crate::session::render::{
    RenderHooks, RenderOutput, RenderParts, RenderStats, render, render_job, render_job_still,
    render_still,
};
