use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::foundation::error::{CaptioncastError, CaptioncastResult};
use crate::media::video::{FrameDecoder, SEEK_EPSILON_SECS, VideoFrame, VideoInfo};

struct SeekRequest {
    generation: u64,
    time_secs: f64,
}

struct SeekReply {
    generation: u64,
    result: CaptioncastResult<VideoFrame>,
}

/// Result of a bounded seek.
#[derive(Clone, Debug, PartialEq)]
pub enum SeekOutcome {
    /// The decoder produced the requested frame in time.
    Ready(VideoFrame),
    /// The timeout elapsed. Carries the most recent frame, if any was ever decoded.
    Stalled(Option<VideoFrame>),
}

/// Runs one [`FrameDecoder`] on its own thread so seeks can be bounded by a timeout.
///
/// Requests carry a generation counter. Replies to requests that already timed out are
/// discarded when they eventually arrive.
pub struct DecoderWorker {
    info: VideoInfo,
    requests: Option<mpsc::Sender<SeekRequest>>,
    replies: mpsc::Receiver<SeekReply>,
    handle: Option<JoinHandle<()>>,
    generation: u64,
    last: Option<(f64, VideoFrame)>,
}

impl DecoderWorker {
    /// Move `decoder` onto a new worker thread named `name`.
    pub fn spawn(name: &str, mut decoder: Box<dyn FrameDecoder>) -> CaptioncastResult<Self> {
        let info = decoder.info().clone();
        let (req_tx, req_rx) = mpsc::channel::<SeekRequest>();
        let (rep_tx, rep_rx) = mpsc::channel::<SeekReply>();

        let handle = std::thread::Builder::new()
            .name(format!("captioncast-decode-{name}"))
            .spawn(move || {
                while let Ok(mut req) = req_rx.recv() {
                    // Only the newest queued request matters.
                    while let Ok(newer) = req_rx.try_recv() {
                        req = newer;
                    }
                    let result = decoder.frame_at(req.time_secs);
                    if rep_tx
                        .send(SeekReply {
                            generation: req.generation,
                            result,
                        })
                        .is_err()
                    {
                        break;
                    }
                }
            })
            .map_err(|e| {
                CaptioncastError::source_load(format!("failed to spawn decoder thread: {e}"))
            })?;

        Ok(Self {
            info,
            requests: Some(req_tx),
            replies: rep_rx,
            handle: Some(handle),
            generation: 0,
            last: None,
        })
    }

    /// Properties of the wrapped decoder.
    pub fn info(&self) -> &VideoInfo {
        &self.info
    }

    /// Most recently delivered frame.
    pub fn last_frame(&self) -> Option<&VideoFrame> {
        self.last.as_ref().map(|(_, f)| f)
    }

    /// Seek to `time_secs` and wait at most `timeout` for the frame.
    ///
    /// A target within 1 ms of the last delivered frame completes immediately. Decoder errors are
    /// returned as-is.
    pub fn seek(&mut self, time_secs: f64, timeout: Duration) -> CaptioncastResult<SeekOutcome> {
        if let Some((t, frame)) = self.last.as_ref()
            && (t - time_secs).abs() <= SEEK_EPSILON_SECS
        {
            return Ok(SeekOutcome::Ready(frame.clone()));
        }

        self.generation += 1;
        let generation = self.generation;
        let requests = self
            .requests
            .as_ref()
            .ok_or_else(|| CaptioncastError::source_load("decoder worker already shut down"))?;
        requests
            .send(SeekRequest {
                generation,
                time_secs,
            })
            .map_err(|_| CaptioncastError::source_load("decoder worker exited unexpectedly"))?;

        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.replies.recv_timeout(remaining) {
                Ok(reply) if reply.generation < generation => continue,
                Ok(reply) => {
                    let frame = reply.result?;
                    self.last = Some((time_secs, frame.clone()));
                    return Ok(SeekOutcome::Ready(frame));
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    return Ok(SeekOutcome::Stalled(self.last_frame().cloned()));
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    return Err(CaptioncastError::source_load(
                        "decoder worker exited unexpectedly",
                    ));
                }
            }
        }
    }
}

impl Drop for DecoderWorker {
    fn drop(&mut self) {
        drop(self.requests.take());
        // A thread still inside `frame_at` is detached; it exits once the decoder returns
        // and finds the request channel closed.
        if let Some(handle) = self.handle.take()
            && handle.is_finished()
        {
            let _ = handle.join();
        }
    }
}
