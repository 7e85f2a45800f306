//! Shared domain models for the cbir-fast workspace.
//!
//! This crate centralizes the image buffers and descriptor records passed
//! between the extraction pipeline, the relevance-feedback engine, and the
//! CLI. Keep it free of codec and runtime dependencies so every crate can
//! depend on it cheaply.

mod feedback;
mod fingerprint;
mod image;

pub use feedback::{DEFAULT_ALPHA, DEFAULT_BETA, RelevanceFeedbackRequest};
pub use fingerprint::{
    ColorHistogram, EDGE_HISTOGRAM_BINS, FINGERPRINT_SCHEMA_VERSION, Fingerprint, GLCM_ANGLES,
    GLCM_PROPERTIES, GlcmFeatures, HISTOGRAM_BINS, HU_MOMENT_COUNT, RgbColor, ShapeDescriptor,
};
pub use image::{BgrImage, Channel, GrayPlane, ImageError, ImageResult};
