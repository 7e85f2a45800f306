//! Command line front end for the descriptor pipeline: settings
//! resolution, batch fingerprinting, relevance feedback and output.

pub mod cli;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod runner;
pub mod settings;

pub use error::AppError;
pub use runner::{RunSummary, fingerprint_images, refine_request, run};
