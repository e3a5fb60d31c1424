use std::time::Duration;

use crate::audio::segment::AudioSlice;
use crate::encode::encoder::{
    Acceleration, AudioEncoder, AudioEncoderConfig, EncodedChunk, EncoderFactory,
    KEYFRAME_INTERVAL, VideoEncoder, VideoEncoderConfig,
};
use crate::encode::mux::Muxer;
use crate::foundation::core::{FrameIndex, MICROS_PER_SEC, Timestamp};
use crate::foundation::diagnostics::Diagnostics;
use crate::foundation::error::{CaptioncastError, CaptioncastResult};

/// Lifecycle of an [`EncodingPipeline`]. `Finalized` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    /// Created, no encoders yet.
    Idle,
    /// Encoders configured, no frame submitted.
    Configured,
    /// At least one frame submitted.
    Encoding,
    /// Draining encoders.
    Flushing,
    /// Container produced.
    Finalized,
}

/// Encoder queue limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Backpressure {
    /// Submission suspends when the video queue is deeper than this.
    pub high_water: usize,
    /// Submission resumes once the queue is at most this deep.
    pub low_water: usize,
    /// Sleep between queue polls while suspended.
    pub poll: Duration,
}

impl Default for Backpressure {
    fn default() -> Self {
        Self {
            high_water: 5,
            low_water: 2,
            poll: Duration::from_millis(1),
        }
    }
}

/// Encoder parameters for one render.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    /// Video track parameters.
    pub video: VideoEncoderConfig,
    /// Audio track parameters; `None` renders a silent file.
    pub audio: Option<AudioEncoderConfig>,
}

/// Counters kept by the pipeline.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Name of the video encoder that was configured.
    pub video_encoder: String,
    /// Whether the video encoder is the hardware one.
    pub hardware: bool,
    /// Frames accepted by `submit`.
    pub frames_submitted: u64,
    /// Times submission suspended on a deep queue.
    pub backpressure_waits: u64,
    /// Deepest video queue observed.
    pub max_queue_depth: usize,
    /// Chunks handed to the muxer.
    pub chunks_muxed: u64,
}

/// Drives the video and audio encoders and hands their output to a [`Muxer`].
pub struct EncodingPipeline {
    factory: Box<dyn EncoderFactory>,
    muxer: Box<dyn Muxer>,
    backpressure: Backpressure,
    state: PipelineState,
    video: Option<Box<dyn VideoEncoder>>,
    audio: Option<Box<dyn AudioEncoder>>,
    config: Option<PipelineConfig>,
    last_timestamp: Option<Timestamp>,
    stats: PipelineStats,
}

impl EncodingPipeline {
    /// Pipeline with the default queue limits.
    pub fn new(factory: Box<dyn EncoderFactory>, muxer: Box<dyn Muxer>) -> Self {
        Self {
            factory,
            muxer,
            backpressure: Backpressure::default(),
            state: PipelineState::Idle,
            video: None,
            audio: None,
            config: None,
            last_timestamp: None,
            stats: PipelineStats::default(),
        }
    }

    /// Replace the queue limits.
    pub fn with_backpressure(mut self, backpressure: Backpressure) -> Self {
        self.backpressure = backpressure;
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Counters so far.
    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    fn expect_state(&self, op: &str, allowed: &[PipelineState]) -> CaptioncastResult<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(CaptioncastError::pipeline(format!(
                "{op} is not allowed in state {:?}",
                self.state
            )))
        }
    }

    /// Create the encoders: hardware video first, then software once.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn configure(
        &mut self,
        config: PipelineConfig,
        diag: &mut Diagnostics<'_>,
    ) -> CaptioncastResult<()> {
        self.expect_state("configure", &[PipelineState::Idle])?;

        let (video, hardware) = match self
            .factory
            .video(&config.video, Acceleration::PreferHardware)
        {
            Ok(enc) => (enc, true),
            Err(hw_err) => {
                diag.warn(&format!(
                    "hardware video encoder unavailable ({hw_err}), falling back to software"
                ));
                let enc = self
                    .factory
                    .video(&config.video, Acceleration::Software)
                    .map_err(|e| match e {
                        CaptioncastError::EncoderConfiguration(_) => e,
                        other => CaptioncastError::encoder_configuration(other.to_string()),
                    })?;
                (enc, false)
            }
        };
        diag.info(&format!(
            "video encoder: {} ({}x{}, {} b/s)",
            video.name(),
            config.video.width,
            config.video.height,
            config.video.bitrate.bits_per_sec()
        ));

        let audio = match &config.audio {
            Some(cfg) => Some(self.factory.audio(cfg).map_err(|e| match e {
                CaptioncastError::EncoderConfiguration(_) => e,
                other => CaptioncastError::encoder_configuration(other.to_string()),
            })?),
            None => None,
        };

        self.stats.video_encoder = video.name().to_string();
        self.stats.hardware = hardware;
        self.video = Some(video);
        self.audio = audio;
        self.config = Some(config);
        self.state = PipelineState::Configured;
        Ok(())
    }

    /// Encode output frame `frame` and its audio slice.
    ///
    /// Blocks while the video queue is above the high-water mark, forwarding encoded output to
    /// the muxer until it drains to the low-water mark.
    pub fn submit(
        &mut self,
        frame: FrameIndex,
        rgba: &[u8],
        audio: Option<&AudioSlice>,
    ) -> CaptioncastResult<()> {
        self.expect_state(
            "submit",
            &[PipelineState::Configured, PipelineState::Encoding],
        )?;
        let fps = self
            .config
            .as_ref()
            .map(|c| c.video.fps)
            .ok_or_else(|| CaptioncastError::pipeline("pipeline has no configuration"))?;

        let timestamp = fps.frame_timestamp(frame);
        if self.last_timestamp.is_some_and(|last| timestamp <= last) {
            return Err(CaptioncastError::pipeline(format!(
                "frame {} timestamp {}us is not after the previous frame",
                frame.0,
                timestamp.as_micros()
            )));
        }
        let key_frame = frame.0 % KEYFRAME_INTERVAL == 0;
        self.state = PipelineState::Encoding;

        let video = self
            .video
            .as_mut()
            .ok_or_else(|| CaptioncastError::pipeline("video encoder missing"))?;
        video.encode(rgba, timestamp, key_frame)?;
        self.last_timestamp = Some(timestamp);
        self.stats.frames_submitted += 1;

        if let (Some(slice), Some(enc)) = (audio, self.audio.as_mut()) {
            enc.encode(slice, audio_timestamp(slice))?;
        }

        self.forward_output()?;
        self.wait_for_queue()
    }

    fn queue_depth(&self) -> usize {
        self.video.as_ref().map_or(0, |v| v.pending())
    }

    fn wait_for_queue(&mut self) -> CaptioncastResult<()> {
        let depth = self.queue_depth();
        self.stats.max_queue_depth = self.stats.max_queue_depth.max(depth);
        if depth <= self.backpressure.high_water {
            return Ok(());
        }

        self.stats.backpressure_waits += 1;
        tracing::debug!(depth, "encoder queue full, waiting");
        loop {
            self.forward_output()?;
            let depth = self.queue_depth();
            self.stats.max_queue_depth = self.stats.max_queue_depth.max(depth);
            if depth <= self.backpressure.low_water {
                return Ok(());
            }
            std::thread::sleep(self.backpressure.poll);
        }
    }

    fn forward_output(&mut self) -> CaptioncastResult<()> {
        let mut chunks = Vec::new();
        if let Some(v) = self.video.as_mut() {
            chunks.extend(v.take_output()?);
        }
        if let Some(a) = self.audio.as_mut() {
            chunks.extend(a.take_output()?);
        }
        self.mux(chunks)
    }

    fn mux(&mut self, chunks: Vec<EncodedChunk>) -> CaptioncastResult<()> {
        for chunk in chunks {
            self.muxer.add_chunk(chunk)?;
            self.stats.chunks_muxed += 1;
        }
        Ok(())
    }

    /// Flush both encoders, finalize the container and return its bytes.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn finish(&mut self) -> CaptioncastResult<Vec<u8>> {
        self.expect_state(
            "finish",
            &[PipelineState::Configured, PipelineState::Encoding],
        )?;
        self.state = PipelineState::Flushing;

        if let Some(mut v) = self.video.take() {
            let rest = v.flush()?;
            self.mux(rest)?;
        }
        if let Some(mut a) = self.audio.take() {
            let rest = a.flush()?;
            self.mux(rest)?;
        }

        let bytes = self.muxer.finalize()?;
        self.state = PipelineState::Finalized;
        Ok(bytes)
    }
}

/// Presentation time of an audio slice, from its first sample index.
pub fn audio_timestamp(slice: &AudioSlice) -> Timestamp {
    if slice.sample_rate == 0 {
        return Timestamp::ZERO;
    }
    let us =
        u128::from(slice.start_sample) * u128::from(MICROS_PER_SEC) / u128::from(slice.sample_rate);
    Timestamp(us.min(u128::from(u64::MAX)) as u64)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/pipeline.rs"]
mod tests;
