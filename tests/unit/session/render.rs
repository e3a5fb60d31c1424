use std::sync::Mutex;
use std::time::Duration;

use super::*;
use crate::audio::segment::AudioSlice;
use crate::encode::encoder::{
    Acceleration, AudioEncoder, EncodedChunk, EncoderFactory, Track, VideoEncoder,
};
use crate::encode::mux::InMemoryMuxer;
use crate::media::video::{VideoFrame, VideoInfo};
use crate::model::caption::CaptionStyle;
use crate::model::settings::ColorFilter;
use crate::render::raster::CoverageMask;
use crate::render::text::TextShaper;

struct GrayDecoder(VideoInfo);

impl FrameDecoder for GrayDecoder {
    fn info(&self) -> &VideoInfo {
        &self.0
    }

    fn frame_at(&mut self, _time_secs: f64) -> CaptioncastResult<VideoFrame> {
        Ok(VideoFrame::solid(self.0.width, self.0.height, [90, 90, 90, 255]))
    }
}

struct NoText;

impl TextShaper for NoText {
    fn measure(&mut self, _: FontRole, _: f32, _: &str) -> CaptioncastResult<f64> {
        Ok(0.0)
    }

    fn rasterize(&mut self, _: FontRole, _: f32, _: &str) -> CaptioncastResult<CoverageMask> {
        Ok(CoverageMask::new(1, 1))
    }
}

struct CountingVideo(Arc<Mutex<Vec<Timestamp>>>);

impl VideoEncoder for CountingVideo {
    fn name(&self) -> &str {
        "counting"
    }

    fn encode(&mut self, _: &[u8], ts: Timestamp, _: bool) -> CaptioncastResult<()> {
        self.0.lock().unwrap().push(ts);
        Ok(())
    }

    fn pending(&self) -> usize {
        0
    }

    fn take_output(&mut self) -> CaptioncastResult<Vec<EncodedChunk>> {
        Ok(Vec::new())
    }

    fn flush(&mut self) -> CaptioncastResult<Vec<EncodedChunk>> {
        Ok(vec![EncodedChunk {
            track: Track::Video,
            timestamp: Timestamp::ZERO,
            key_frame: true,
            data: b"mp4".to_vec(),
        }])
    }
}

struct CountingAudio(Arc<Mutex<usize>>);

impl AudioEncoder for CountingAudio {
    fn encode(&mut self, slice: &AudioSlice, _: Timestamp) -> CaptioncastResult<()> {
        *self.0.lock().unwrap() += slice.frames();
        Ok(())
    }

    fn take_output(&mut self) -> CaptioncastResult<Vec<EncodedChunk>> {
        Ok(Vec::new())
    }

    fn flush(&mut self) -> CaptioncastResult<Vec<EncodedChunk>> {
        Ok(Vec::new())
    }
}

#[derive(Default, Clone)]
struct Recorder {
    frames: Arc<Mutex<Vec<Timestamp>>>,
    samples: Arc<Mutex<usize>>,
}

impl EncoderFactory for Recorder {
    fn video(
        &mut self,
        _: &VideoEncoderConfig,
        _: Acceleration,
    ) -> CaptioncastResult<Box<dyn VideoEncoder>> {
        Ok(Box::new(CountingVideo(self.frames.clone())))
    }

    fn audio(&mut self, _: &AudioEncoderConfig) -> CaptioncastResult<Box<dyn AudioEncoder>> {
        Ok(Box::new(CountingAudio(self.samples.clone())))
    }
}

fn parts(video_secs: f64, audio: Option<AudioBuffer>) -> RenderParts {
    let info = VideoInfo {
        width: 8,
        height: 8,
        duration_secs: video_secs,
    };
    let second = info.clone();
    let resolution = Resolution::new(16, 16);
    let captions =
        CaptionArena::build(&[], &CaptionStyle::default(), resolution, &mut NoText).unwrap();
    RenderParts {
        sources: FrameSourceManager::new(
            Box::new(GrayDecoder(info)),
            move || Ok(Box::new(GrayDecoder(second)) as Box<dyn FrameDecoder>),
            false,
            Duration::from_secs(2),
        )
        .unwrap(),
        compositor: Compositor::new(
            resolution,
            ColorFilter::None,
            Overlays {
                captions,
                watermark: None,
                banner: None,
                shaper: Box::new(NoText),
            },
        )
        .unwrap(),
        audio,
        codec: CodecPair::H264Aac,
        bitrate: Bitrate::DEFAULT,
    }
}

fn pipeline(rec: &Recorder) -> EncodingPipeline {
    EncodingPipeline::new(Box::new(rec.clone()), Box::new(InMemoryMuxer::new()))
}

#[test]
fn audio_duration_drives_frame_count() {
    let rec = Recorder::default();
    let audio = AudioBuffer {
        sample_rate: 1_000,
        channels: vec![vec![0.0; 2_500]; 2],
    };
    let out = render(parts(1.0, Some(audio)), pipeline(&rec), RenderHooks::default()).unwrap();
    assert_eq!(out.stats.frames_total, 75);
    assert_eq!(out.stats.frames_encoded, 75);
    assert_eq!(out.bytes, b"mp4");
    assert_eq!(*rec.samples.lock().unwrap(), 2_500);
    let frames = rec.frames.lock().unwrap();
    assert!(frames.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn progress_reaches_one_exactly_once() {
    let rec = Recorder::default();
    let seen = Arc::new(Mutex::new(Vec::<f64>::new()));
    let sink = seen.clone();
    let hooks = RenderHooks {
        progress: Some(Box::new(move |f: f64| sink.lock().unwrap().push(f))),
        ..RenderHooks::default()
    };
    render(parts(1.0, None), pipeline(&rec), hooks).unwrap();
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 4);
    assert_eq!(seen.iter().filter(|f| **f == 1.0).count(), 1);
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn empty_audio_is_an_invalid_duration() {
    let rec = Recorder::default();
    let audio = AudioBuffer {
        sample_rate: 48_000,
        channels: vec![Vec::new()],
    };
    let err = render(parts(5.0, Some(audio)), pipeline(&rec), RenderHooks::default())
        .unwrap_err();
    assert!(matches!(err, CaptioncastError::InvalidDuration(_)), "{err}");
    assert!(rec.frames.lock().unwrap().is_empty());
}

#[test]
fn cancelled_render_never_finalizes() {
    let rec = Recorder::default();
    let cancel = Arc::new(AtomicBool::new(true));
    let hooks = RenderHooks {
        cancel: Some(cancel),
        ..RenderHooks::default()
    };
    let err = render(parts(1.0, None), pipeline(&rec), hooks).unwrap_err();
    assert!(err.is_cancelled());
    assert!(rec.frames.lock().unwrap().is_empty());
}

#[test]
fn still_frame_is_full_size() {
    let mut p = parts(3.0, None);
    let rgba = render_still(
        &mut p.sources,
        &mut p.compositor,
        1.5,
        &mut Diagnostics::silent(),
    )
    .unwrap();
    assert_eq!(rgba.len(), 16 * 16 * 4);
    assert_eq!(&rgba[..4], &[90, 90, 90, 255]);
    assert!(
        render_still(&mut p.sources, &mut p.compositor, f64::NAN, &mut Diagnostics::silent())
            .is_err()
    );
}
