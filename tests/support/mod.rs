#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use captioncast::audio::segment::{AudioBuffer, AudioSlice};
use captioncast::encode::encoder::{
    Acceleration, AudioEncoder, AudioEncoderConfig, EncodedChunk, EncoderFactory, Track,
    VideoEncoder, VideoEncoderConfig,
};
use captioncast::encode::mux::Muxer;
use captioncast::media::video::{FrameDecoder, VideoFrame, VideoInfo};
use captioncast::render::captions::CaptionArena;
use captioncast::render::raster::CoverageMask;
use captioncast::render::text::{FontRole, TextShaper};
use captioncast::render::watermark::Watermark;
use captioncast::source::manager::FrameSourceManager;
use captioncast::{
    Bitrate, CaptionSegment, CaptionStyle, CaptioncastResult, CodecPair, ColorFilter, Compositor,
    EncodingPipeline, Overlays, RenderParts, Resolution, Timestamp,
};

/// Solid box per line, `size / 2` px per char.
pub struct BoxShaper;

impl TextShaper for BoxShaper {
    fn measure(&mut self, _role: FontRole, size_px: f32, text: &str) -> CaptioncastResult<f64> {
        Ok(text.chars().count() as f64 * f64::from(size_px) / 2.0)
    }

    fn rasterize(
        &mut self,
        role: FontRole,
        size_px: f32,
        text: &str,
    ) -> CaptioncastResult<CoverageMask> {
        let w = self.measure(role, size_px, text)?.ceil().max(1.0) as u32;
        let mut m = CoverageMask::new(w, size_px.ceil() as u32);
        m.alpha.fill(255);
        Ok(m)
    }
}

/// Source video whose color depends only on the source time: red before `split`, blue after.
#[derive(Clone)]
pub struct SplitColorDecoder {
    pub info: VideoInfo,
    pub split: f64,
}

impl SplitColorDecoder {
    pub fn new(duration_secs: f64, split: f64) -> Self {
        Self {
            info: VideoInfo {
                width: 8,
                height: 8,
                duration_secs,
            },
            split,
        }
    }
}

impl FrameDecoder for SplitColorDecoder {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn frame_at(&mut self, time_secs: f64) -> CaptioncastResult<VideoFrame> {
        let rgba = if time_secs < self.split {
            [255, 0, 0, 255]
        } else {
            [0, 0, 255, 255]
        };
        Ok(VideoFrame::solid(self.info.width, self.info.height, rgba))
    }
}

pub fn sources(decoder: SplitColorDecoder, crossfade: bool) -> FrameSourceManager {
    let second = decoder.clone();
    FrameSourceManager::new(
        Box::new(decoder),
        move || Ok(Box::new(second) as Box<dyn FrameDecoder>),
        crossfade,
        Duration::from_secs(2),
    )
    .unwrap()
}

pub fn plain_style() -> CaptionStyle {
    CaptionStyle {
        stroke_width: 0.0,
        shadow_blur: 0.0,
        ..CaptionStyle::default()
    }
}

pub fn compositor(
    resolution: Resolution,
    captions: &[CaptionSegment],
    watermark: Option<Watermark>,
) -> Compositor {
    let arena = CaptionArena::build(captions, &plain_style(), resolution, &mut BoxShaper).unwrap();
    Compositor::new(
        resolution,
        ColorFilter::None,
        Overlays {
            captions: arena,
            watermark,
            banner: None,
            shaper: Box::new(BoxShaper),
        },
    )
    .unwrap()
}

pub fn parts(
    sources: FrameSourceManager,
    compositor: Compositor,
    audio: Option<AudioBuffer>,
) -> RenderParts {
    RenderParts {
        sources,
        compositor,
        audio,
        codec: CodecPair::H264Aac,
        bitrate: Bitrate::DEFAULT,
    }
}

/// Everything the fake encoders and muxer saw.
#[derive(Clone, Default)]
pub struct Capture {
    /// Copy of every submitted frame.
    pub frames: Arc<Mutex<Vec<(Timestamp, Vec<u8>)>>>,
    /// Chunks delivered to the muxer.
    pub muxed: Arc<Mutex<Vec<EncodedChunk>>>,
    /// Audio samples per channel received.
    pub audio_samples: Arc<Mutex<usize>>,
}

struct CaptureVideo(Capture);

impl VideoEncoder for CaptureVideo {
    fn name(&self) -> &str {
        "capture"
    }

    fn encode(&mut self, rgba: &[u8], ts: Timestamp, _key: bool) -> CaptioncastResult<()> {
        self.0.frames.lock().unwrap().push((ts, rgba.to_vec()));
        Ok(())
    }

    fn pending(&self) -> usize {
        0
    }

    fn take_output(&mut self) -> CaptioncastResult<Vec<EncodedChunk>> {
        Ok(Vec::new())
    }

    fn flush(&mut self) -> CaptioncastResult<Vec<EncodedChunk>> {
        Ok(Vec::new())
    }
}

struct CaptureAudio(Capture);

impl AudioEncoder for CaptureAudio {
    fn encode(&mut self, slice: &AudioSlice, _ts: Timestamp) -> CaptioncastResult<()> {
        *self.0.audio_samples.lock().unwrap() += slice.frames();
        Ok(())
    }

    fn take_output(&mut self) -> CaptioncastResult<Vec<EncodedChunk>> {
        Ok(Vec::new())
    }

    fn flush(&mut self) -> CaptioncastResult<Vec<EncodedChunk>> {
        Ok(Vec::new())
    }
}

/// Encoder queue drained by a background thread that starts only after `stall`.
struct StallingVideo {
    queue: Arc<Mutex<VecDeque<Timestamp>>>,
    done: Arc<Mutex<Vec<EncodedChunk>>>,
    stop: Arc<AtomicBool>,
    drainer: Option<std::thread::JoinHandle<()>>,
}

impl StallingVideo {
    fn new(stall: Duration) -> Self {
        let queue = Arc::new(Mutex::new(VecDeque::<Timestamp>::new()));
        let done = Arc::new(Mutex::new(Vec::new()));
        let stop = Arc::new(AtomicBool::new(false));
        let (q, d, s) = (queue.clone(), done.clone(), stop.clone());
        let drainer = std::thread::spawn(move || {
            std::thread::sleep(stall);
            loop {
                let next = q.lock().unwrap().pop_front();
                match next {
                    Some(ts) => d.lock().unwrap().push(EncodedChunk {
                        track: Track::Video,
                        timestamp: ts,
                        key_frame: false,
                        data: ts.as_micros().to_le_bytes().to_vec(),
                    }),
                    None if s.load(Ordering::Acquire) => return,
                    None => {}
                }
                std::thread::sleep(Duration::from_micros(200));
            }
        });
        Self {
            queue,
            done,
            stop,
            drainer: Some(drainer),
        }
    }
}

impl VideoEncoder for StallingVideo {
    fn name(&self) -> &str {
        "stalling"
    }

    fn encode(&mut self, _rgba: &[u8], ts: Timestamp, _key: bool) -> CaptioncastResult<()> {
        self.queue.lock().unwrap().push_back(ts);
        Ok(())
    }

    fn pending(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    fn take_output(&mut self) -> CaptioncastResult<Vec<EncodedChunk>> {
        Ok(std::mem::take(&mut *self.done.lock().unwrap()))
    }

    fn flush(&mut self) -> CaptioncastResult<Vec<EncodedChunk>> {
        self.stop.store(true, Ordering::Release);
        if let Some(h) = self.drainer.take() {
            h.join().unwrap();
        }
        self.take_output()
    }
}

/// Factory for in-process encoders.
#[derive(Clone)]
pub struct FakeFactory {
    pub capture: Capture,
    /// When set, video goes through a [`StallingVideo`] with this initial stall.
    pub stall: Option<Duration>,
    pub hardware_ok: bool,
}

impl FakeFactory {
    pub fn new(capture: Capture) -> Self {
        Self {
            capture,
            stall: None,
            hardware_ok: true,
        }
    }
}

impl EncoderFactory for FakeFactory {
    fn video(
        &mut self,
        _config: &VideoEncoderConfig,
        acceleration: Acceleration,
    ) -> CaptioncastResult<Box<dyn VideoEncoder>> {
        if acceleration == Acceleration::PreferHardware && !self.hardware_ok {
            return Err(captioncast::CaptioncastError::encoder_configuration(
                "no hardware here",
            ));
        }
        match self.stall {
            Some(stall) => Ok(Box::new(StallingVideo::new(stall))),
            None => Ok(Box::new(CaptureVideo(self.capture.clone()))),
        }
    }

    fn audio(&mut self, _config: &AudioEncoderConfig) -> CaptioncastResult<Box<dyn AudioEncoder>> {
        Ok(Box::new(CaptureAudio(self.capture.clone())))
    }
}

/// Muxer recording chunks into a [`Capture`].
pub struct CaptureMuxer(pub Capture);

impl Muxer for CaptureMuxer {
    fn add_chunk(&mut self, chunk: EncodedChunk) -> CaptioncastResult<()> {
        self.0.muxed.lock().unwrap().push(chunk);
        Ok(())
    }

    fn finalize(&mut self) -> CaptioncastResult<Vec<u8>> {
        Ok(b"container".to_vec())
    }
}

pub fn pipeline(factory: FakeFactory) -> EncodingPipeline {
    let capture = factory.capture.clone();
    EncodingPipeline::new(Box::new(factory), Box::new(CaptureMuxer(capture)))
}

pub fn pixel(frame: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * width + x) * 4) as usize;
    [frame[i], frame[i + 1], frame[i + 2], frame[i + 3]]
}

pub fn silence(secs: f64, sample_rate: u32) -> AudioBuffer {
    let n = (secs * f64::from(sample_rate)).round() as usize;
    AudioBuffer {
        sample_rate,
        channels: vec![vec![0.0; n]; 2],
    }
}
