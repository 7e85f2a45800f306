//! Descriptor extraction: pixel pipeline, extractors, and the aggregator
//! that turns one image into a retrieval fingerprint.

pub mod aggregator;
pub mod codec;
pub mod config;
pub mod error;
pub mod extractors;
pub mod pipeline;

pub use aggregator::{Artifact, ArtifactKind, DescriptorAggregator, FingerprintReport};
pub use codec::{decode_image, encode_png};
pub use config::{
    DEFAULT_DOMINANT_COLORS, DEFAULT_FIXED_THRESHOLD, DEFAULT_KMEANS_SEED, DescriptorConfig,
    DominantColorOptions, EdgeMode, EdgeOptions, ExecutionMode, GaborBank, GlcmOptions,
    OptionParseError, ShapeOptions, ShapeSource, TextureOptions, ThresholdStrategy,
};
pub use error::{DescriptorError, DescriptorResult, FingerprintError};
pub use extractors::{
    ColorHistogramExtractor, DescriptorExtractor, DominantColorExtractor, EdgeExtractor,
    EdgeOutput, GlcmExtractor, ShapeExtractor, ShapeOutput, TextureExtractor, TextureOutput,
};

#[cfg(test)]
mod tests;
