use cbir_fast_types::ImageError;
use thiserror::Error;

pub type DescriptorResult<T> = Result<T, DescriptorError>;

/// Recoverable failure inside one extractor. The aggregator replaces the
/// descriptor with its default and keeps going.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("empty {plane} plane")]
    EmptyPlane { plane: &'static str },

    #[error("degenerate input: {reason}")]
    Degenerate { reason: String },

    #[error("need at least {required} distinct colors, found {found}")]
    InsufficientColors { required: usize, found: usize },

    #[error("invalid configuration: {reason}")]
    Configuration { reason: String },

    #[error(transparent)]
    Image(#[from] ImageError),
}

impl DescriptorError {
    pub fn degenerate(reason: impl Into<String>) -> Self {
        Self::Degenerate {
            reason: reason.into(),
        }
    }

    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }
}

/// Request-level failure: the input could not become an image at all.
#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("invalid image: {0}")]
    Image(#[from] ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
