/// Result type alias used throughout Quill.
pub type QuillResult<T> = Result<T, QuillError>;

/// Top-level error type for Quill APIs.
///
/// Only `EncoderUnsupported` and I/O failures of the output sink are fatal to an export.
/// Per-scene failures (`VectorizationFailed`, `AssetLoadFailed`) are recovered by degrading the
/// scene and are reported through the export report instead of being propagated.
#[derive(thiserror::Error, Debug)]
pub enum QuillError {
    /// Invalid user input or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// The external tracer failed, timed out, or produced unreadable output.
    #[error("vectorization failed: {0}")]
    VectorizationFailed(String),

    /// A scene bitmap or narration clip could not be loaded or decoded.
    #[error("asset load failed: {0}")]
    AssetLoadFailed(String),

    /// No compatible encoder is available in this environment.
    #[error("encoder unsupported: {0}")]
    EncoderUnsupported(String),

    /// Rasterization failure.
    #[error("render error: {0}")]
    Render(String),

    /// The output sink failed while encoding.
    #[error("encode error: {0}")]
    Encode(String),

    /// Wrapped lower-level error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl QuillError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn vectorization(msg: impl Into<String>) -> Self {
        Self::VectorizationFailed(msg.into())
    }

    pub fn asset_load(msg: impl Into<String>) -> Self {
        Self::AssetLoadFailed(msg.into())
    }

    pub fn encoder_unsupported(msg: impl Into<String>) -> Self {
        Self::EncoderUnsupported(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Whether this error must end an export session.
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, Self::EncoderUnsupported(_) | Self::Encode(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
