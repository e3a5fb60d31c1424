use crate::audio::segment::AudioSlice;
use crate::foundation::core::{Fps, Timestamp};
use crate::foundation::error::CaptioncastResult;
use crate::model::settings::{Bitrate, CodecPair};

/// AAC bitrate used for every render.
pub const AUDIO_BITRATE_BPS: u64 = 192_000;

/// A key frame is forced every this many video frames.
pub const KEYFRAME_INTERVAL: u64 = 150;

/// Elementary stream a chunk belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Track {
    /// Video elementary stream.
    Video,
    /// Audio elementary stream.
    Audio,
}

/// Encoded bytes handed from an encoder to the muxer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedChunk {
    /// Stream the bytes belong to.
    pub track: Track,
    /// Presentation time of the earliest unit the chunk covers.
    pub timestamp: Timestamp,
    /// Whether the chunk starts with a key frame.
    pub key_frame: bool,
    /// Encoded payload.
    pub data: Vec<u8>,
}

/// Encoder implementation preference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Acceleration {
    /// Try a hardware encoder first.
    #[default]
    PreferHardware,
    /// Software encoder only.
    Software,
}

/// Video encoder parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoEncoderConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frame rate.
    pub fps: Fps,
    /// Target bitrate.
    pub bitrate: Bitrate,
    /// Codec pair; the video half is used here.
    pub codec: CodecPair,
}

/// Audio encoder parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioEncoderConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Target bitrate in bits per second.
    pub bitrate_bps: u64,
}

/// Streaming video encoder fed with RGBA8 frames.
pub trait VideoEncoder: Send {
    /// Name of the underlying implementation, for diagnostics.
    fn name(&self) -> &str;

    /// Queue one RGBA8 frame. Must not block on encoding.
    fn encode(
        &mut self,
        rgba: &[u8],
        timestamp: Timestamp,
        key_frame: bool,
    ) -> CaptioncastResult<()>;

    /// Frames queued but not yet consumed by the encoder.
    fn pending(&self) -> usize;

    /// Encoded output produced so far, without waiting.
    fn take_output(&mut self) -> CaptioncastResult<Vec<EncodedChunk>>;

    /// Finish the stream and return all remaining output.
    fn flush(&mut self) -> CaptioncastResult<Vec<EncodedChunk>>;
}

/// Streaming audio encoder fed with planar PCM slices.
pub trait AudioEncoder: Send {
    /// Queue one slice.
    fn encode(&mut self, slice: &AudioSlice, timestamp: Timestamp) -> CaptioncastResult<()>;

    /// Encoded output produced so far, without waiting.
    fn take_output(&mut self) -> CaptioncastResult<Vec<EncodedChunk>>;

    /// Finish the stream and return all remaining output.
    fn flush(&mut self) -> CaptioncastResult<Vec<EncodedChunk>>;
}

/// Creates encoders for a pipeline.
pub trait EncoderFactory: Send {
    /// Create a video encoder. `Acceleration::PreferHardware` fails when no hardware encoder
    /// is usable; the caller decides whether to retry in software.
    fn video(
        &mut self,
        config: &VideoEncoderConfig,
        acceleration: Acceleration,
    ) -> CaptioncastResult<Box<dyn VideoEncoder>>;

    /// Create an audio encoder.
    fn audio(&mut self, config: &AudioEncoderConfig) -> CaptioncastResult<Box<dyn AudioEncoder>>;
}
