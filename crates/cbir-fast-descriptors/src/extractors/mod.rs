pub mod color_histogram;
pub mod dominant_colors;
pub mod edge;
pub mod glcm;
pub mod shape;
pub mod texture;

pub use color_histogram::ColorHistogramExtractor;
pub use dominant_colors::DominantColorExtractor;
pub use edge::{EdgeExtractor, EdgeOutput};
pub use glcm::GlcmExtractor;
pub use shape::{ShapeExtractor, ShapeOutput};
pub use texture::{TextureExtractor, TextureOutput};

use cbir_fast_types::BgrImage;

use crate::error::DescriptorResult;

/// Trait implemented by every descriptor extractor.
///
/// Extractors only read the image; anything they draw goes onto a private
/// copy returned in their output.
pub trait DescriptorExtractor: Send + Sync {
    type Output: Send;

    /// Stable descriptor name used for logging and degradation reports.
    fn name(&self) -> &'static str;

    fn extract(&self, image: &BgrImage) -> DescriptorResult<Self::Output>;
}
