/// Caller-supplied sink for human-readable diagnostic lines.
pub type DiagnosticFn<'a> = Box<dyn FnMut(&str) + Send + 'a>;

/// Caller-supplied progress callback receiving a fraction in `[0, 1]`.
pub type ProgressFn<'a> = Box<dyn FnMut(f64) + Send + 'a>;

/// Fans diagnostic lines out to `tracing` and an optional caller callback.
///
/// Diagnostics are advisory: nothing in the pipeline depends on whether a line was delivered.
pub struct Diagnostics<'a> {
    sink: Option<DiagnosticFn<'a>>,
    emitted: u64,
}

impl<'a> Diagnostics<'a> {
    /// Diagnostics that only go to `tracing`.
    pub fn silent() -> Self {
        Self {
            sink: None,
            emitted: 0,
        }
    }

    /// Diagnostics forwarded to `sink` in addition to `tracing`.
    pub fn with_sink(sink: DiagnosticFn<'a>) -> Self {
        Self {
            sink: Some(sink),
            emitted: 0,
        }
    }

    /// Emit one informational line.
    pub fn info(&mut self, msg: &str) {
        tracing::info!(target: "captioncast", "{msg}");
        self.forward(msg);
    }

    /// Emit one warning line.
    pub fn warn(&mut self, msg: &str) {
        tracing::warn!(target: "captioncast", "{msg}");
        self.forward(msg);
    }

    /// Give back the caller sink, e.g. to hand it to a later stage.
    pub fn into_sink(self) -> Option<DiagnosticFn<'a>> {
        self.sink
    }

    /// Number of lines emitted so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    fn forward(&mut self, msg: &str) {
        self.emitted += 1;
        if let Some(sink) = self.sink.as_mut() {
            sink(msg);
        }
    }
}

impl Default for Diagnostics<'_> {
    fn default() -> Self {
        Self::silent()
    }
}

/// Frame-count based throttle for periodic reports.
#[derive(Clone, Copy, Debug)]
pub struct RateLimiter {
    every: u64,
}

impl RateLimiter {
    /// Fire on every `every`-th frame (frame 0 included). `every == 0` is treated as 1.
    pub fn every_frames(every: u64) -> Self {
        Self {
            every: every.max(1),
        }
    }

    /// Whether a report is due at `frame`.
    pub fn should_fire(self, frame: u64) -> bool {
        frame.is_multiple_of(self.every)
    }

    /// The configured period.
    pub fn period(self) -> u64 {
        self.every
    }
}

/// Progress reporter guaranteeing a non-decreasing sequence that ends at exactly `1.0` once.
pub struct ProgressReporter<'a> {
    callback: Option<ProgressFn<'a>>,
    limiter: RateLimiter,
    last: f64,
    completed: bool,
}

impl<'a> ProgressReporter<'a> {
    /// Report through `callback` at most once per `limiter` period.
    pub fn new(callback: Option<ProgressFn<'a>>, limiter: RateLimiter) -> Self {
        Self {
            callback,
            limiter,
            last: 0.0,
            completed: false,
        }
    }

    /// Report progress for `frame` out of `total` if the period elapsed.
    pub fn frame(&mut self, frame: u64, total: u64) {
        if self.completed || total == 0 || !self.limiter.should_fire(frame) {
            return;
        }
        let fraction = (frame as f64 / total as f64).clamp(0.0, 1.0);
        // Completion is reserved for `complete`.
        if fraction >= 1.0 {
            return;
        }
        self.emit(fraction);
    }

    /// Report exactly `1.0`. Subsequent calls are ignored.
    pub fn complete(&mut self) {
        if self.completed {
            return;
        }
        self.completed = true;
        self.emit(1.0);
    }

    fn emit(&mut self, fraction: f64) {
        let fraction = fraction.max(self.last);
        self.last = fraction;
        if let Some(cb) = self.callback.as_mut() {
            cb(fraction);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/diagnostics.rs"]
mod tests;
