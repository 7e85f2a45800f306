mod artifact;
mod error;
mod json;
mod types;

pub use artifact::ArtifactStore;
pub use error::OutputError;
pub use json::write_json;
pub use types::{ArtifactRecord, FingerprintRecord, RefineRecord};
