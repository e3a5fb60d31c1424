/// Convenience result type used across captioncast.
pub type CaptioncastResult<T> = Result<T, CaptioncastError>;

/// Top-level error taxonomy surfaced by the render pipeline.
///
/// Only a subset of these ever aborts a render. Decoder stalls and hardware encoder failures are
/// recovered locally and only reported through diagnostics.
#[derive(thiserror::Error, Debug)]
pub enum CaptioncastError {
    /// Invalid caller-provided configuration or caption data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A source video, audio track, watermark or font could not be loaded.
    #[error("failed to load source: {0}")]
    SourceLoad(String),

    /// Master duration is zero, negative or NaN.
    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    /// Neither hardware nor software encoder configuration succeeded.
    #[error("encoder configuration failed: {0}")]
    EncoderConfiguration(String),

    /// Encoder process or I/O failure after configuration.
    #[error("encode error: {0}")]
    Encode(String),

    /// Container finalization failed.
    #[error("mux finalize failed: {0}")]
    MuxFinalize(String),

    /// Operation issued in a pipeline state that does not accept it.
    #[error("pipeline error: {0}")]
    Pipeline(String),

    /// The caller aborted the render.
    #[error("render cancelled")]
    Cancelled,

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CaptioncastError {
    /// Build a [`CaptioncastError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`CaptioncastError::SourceLoad`] value.
    pub fn source_load(msg: impl Into<String>) -> Self {
        Self::SourceLoad(msg.into())
    }

    /// Build a [`CaptioncastError::InvalidDuration`] value.
    pub fn invalid_duration(msg: impl Into<String>) -> Self {
        Self::InvalidDuration(msg.into())
    }

    /// Build a [`CaptioncastError::EncoderConfiguration`] value.
    pub fn encoder_configuration(msg: impl Into<String>) -> Self {
        Self::EncoderConfiguration(msg.into())
    }

    /// Build a [`CaptioncastError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`CaptioncastError::MuxFinalize`] value.
    pub fn mux_finalize(msg: impl Into<String>) -> Self {
        Self::MuxFinalize(msg.into())
    }

    /// Build a [`CaptioncastError::Pipeline`] value.
    pub fn pipeline(msg: impl Into<String>) -> Self {
        Self::Pipeline(msg.into())
    }

    /// Return `true` for errors caused by the caller aborting the render.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
