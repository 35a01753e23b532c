pub type KissResult<T> = Result<T, KissError>;

/// Error taxonomy shared by every stage of a morph/kiss job.
#[derive(thiserror::Error, Debug)]
pub enum KissError {
    /// Missing or malformed images, URLs or request fields.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Image bytes that cannot be decoded or have unusable dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Model cache path missing or model files incomplete.
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    /// The inference pipeline call failed.
    #[error("generation failure: {0}")]
    GenerationFailure(String),

    /// `encode` was handed no frames.
    #[error("empty frame sequence")]
    EmptyFrameSequence,

    /// The video writer could not be opened or did not finish cleanly.
    #[error("encoding error: {0}")]
    EncodingError(String),

    /// The hosting sink was unreachable or answered with a non-success payload.
    #[error("upload failure: {0}")]
    UploadFailure(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KissError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn invalid_image(msg: impl Into<String>) -> Self {
        Self::InvalidImage(msg.into())
    }

    pub fn model_unavailable(msg: impl Into<String>) -> Self {
        Self::ModelUnavailable(msg.into())
    }

    pub fn generation(msg: impl Into<String>) -> Self {
        Self::GenerationFailure(msg.into())
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::EncodingError(msg.into())
    }

    pub fn upload(msg: impl Into<String>) -> Self {
        Self::UploadFailure(msg.into())
    }

    /// Errors that route a request onto the deterministic morphing path instead of failing it.
    pub fn is_fallback_trigger(&self) -> bool {
        matches!(self, Self::ModelUnavailable(_) | Self::GenerationFailure(_))
    }

    /// Errors caused by the caller's payload. These are reported without any fallback attempt.
    pub fn is_terminal_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::InvalidImage(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
