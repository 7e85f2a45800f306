use std::path::PathBuf;

use cbir_fast_descriptors::{DescriptorError, FingerprintError};
use cbir_fast_feedback::FeedbackError;
use thiserror::Error;

use crate::output::OutputError;
use crate::settings::ConfigError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid descriptor configuration: {0}")]
    Descriptor(#[from] DescriptorError),

    #[error(transparent)]
    Fingerprint(#[from] FingerprintError),

    #[error("relevance feedback rejected: {0}")]
    Feedback(#[from] FeedbackError),

    #[error("failed to write output: {0}")]
    Output(#[from] OutputError),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed request {}: {source}", path.display())]
    Request {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
