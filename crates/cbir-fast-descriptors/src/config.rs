use std::fmt;
use std::str::FromStr;

use crate::error::{DescriptorError, DescriptorResult};

pub const DEFAULT_DOMINANT_COLORS: usize = 5;
pub const DEFAULT_KMEANS_SEED: u64 = 42;
pub const DEFAULT_FIXED_THRESHOLD: u8 = 128;
pub const DEFAULT_CANNY_LOW: f32 = 100.0;
pub const DEFAULT_CANNY_HIGH: f32 = 200.0;

#[derive(Clone, Debug, Default)]
pub struct DescriptorConfig {
    pub dominant_colors: DominantColorOptions,
    pub texture: TextureOptions,
    pub glcm: GlcmOptions,
    pub shape: ShapeOptions,
    pub edge: EdgeOptions,
    pub execution: ExecutionMode,
}

impl DescriptorConfig {
    pub fn validate(&self) -> DescriptorResult<()> {
        if self.dominant_colors.k == 0 {
            return Err(DescriptorError::configuration("dominant color k must be > 0"));
        }
        if self.dominant_colors.max_iterations == 0 {
            return Err(DescriptorError::configuration(
                "k-means max_iterations must be > 0",
            ));
        }
        self.texture.bank.validate()?;
        if self.glcm.distance == 0 {
            return Err(DescriptorError::configuration("GLCM distance must be >= 1"));
        }
        if self.edge.bins == 0 {
            return Err(DescriptorError::configuration("edge histogram needs >= 1 bin"));
        }
        if self.edge.canny_low > self.edge.canny_high {
            return Err(DescriptorError::configuration(format!(
                "canny low threshold {} exceeds high threshold {}",
                self.edge.canny_low, self.edge.canny_high
            )));
        }
        Ok(())
    }
}

/// Whether the extractors of one request run on the rayon pool or inline.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ExecutionMode {
    #[default]
    Parallel,
    Sequential,
}

#[derive(Clone, Debug)]
pub struct DominantColorOptions {
    pub k: usize,
    pub seed: u64,
    pub max_iterations: usize,
    /// Stop once no centroid moves further than this (in RGB units).
    pub tolerance: f64,
}

impl Default for DominantColorOptions {
    fn default() -> Self {
        Self {
            k: DEFAULT_DOMINANT_COLORS,
            seed: DEFAULT_KMEANS_SEED,
            max_iterations: 300,
            tolerance: 1e-4,
        }
    }
}

/// Gabor filter bank parameters. Descriptor order is orientation-major.
#[derive(Clone, Debug)]
pub struct GaborBank {
    pub kernel_size: usize,
    pub sigma: f64,
    pub gamma: f64,
    pub psi: f64,
    pub orientations_deg: Vec<f64>,
    pub wavelengths: Vec<f64>,
}

impl Default for GaborBank {
    fn default() -> Self {
        Self {
            kernel_size: 21,
            sigma: 5.0,
            gamma: 0.5,
            psi: 0.0,
            orientations_deg: vec![0.0, 45.0, 90.0, 135.0],
            wavelengths: vec![5.0, 10.0, 15.0],
        }
    }
}

impl GaborBank {
    pub fn len(&self) -> usize {
        self.orientations_deg.len() * self.wavelengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn validate(&self) -> DescriptorResult<()> {
        if self.kernel_size == 0 || self.kernel_size % 2 == 0 {
            return Err(DescriptorError::configuration(format!(
                "gabor kernel size must be odd, got {}",
                self.kernel_size
            )));
        }
        if self.is_empty() {
            return Err(DescriptorError::configuration("gabor bank is empty"));
        }
        if self.sigma <= 0.0 || self.gamma <= 0.0 {
            return Err(DescriptorError::configuration(
                "gabor sigma and gamma must be positive",
            ));
        }
        if self.wavelengths.iter().any(|&w| w <= 0.0 || !w.is_finite()) {
            return Err(DescriptorError::configuration(
                "gabor wavelengths must be positive",
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct TextureOptions {
    pub bank: GaborBank,
    /// Produce the contour overlay of every filter response.
    pub overlay: bool,
    /// Cut-off applied to the min-max normalized response.
    pub overlay_threshold: u8,
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self {
            bank: GaborBank::default(),
            overlay: true,
            overlay_threshold: 127,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GlcmOptions {
    pub enabled: bool,
    pub distance: usize,
}

impl Default for GlcmOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            distance: 1,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ThresholdStrategy {
    #[default]
    Otsu,
    Fixed(u8),
}

#[derive(Debug)]
pub struct OptionParseError {
    pub option: &'static str,
    pub value: String,
}

impl fmt::Display for OptionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.option, self.value)
    }
}

impl std::error::Error for OptionParseError {}

impl FromStr for ThresholdStrategy {
    type Err = OptionParseError;

    /// Accepts `otsu`, `fixed` (128), or `fixed:<0-255>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let parsed = match lower.as_str() {
            "otsu" => Some(ThresholdStrategy::Otsu),
            "fixed" => Some(ThresholdStrategy::Fixed(DEFAULT_FIXED_THRESHOLD)),
            other => other
                .strip_prefix("fixed:")
                .and_then(|value| value.parse::<u8>().ok())
                .map(ThresholdStrategy::Fixed),
        };
        parsed.ok_or(OptionParseError {
            option: "threshold strategy",
            value: lower,
        })
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ShapeSource {
    /// Hu moments of the largest external contour.
    #[default]
    LargestContour,
    /// Hu moments of the raw grayscale intensities.
    WholeImage,
}

impl FromStr for ShapeSource {
    type Err = OptionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "contour" | "largest-contour" => Ok(ShapeSource::LargestContour),
            "image" | "whole-image" => Ok(ShapeSource::WholeImage),
            _ => Err(OptionParseError {
                option: "shape source",
                value: lower,
            }),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ShapeOptions {
    pub threshold: ThresholdStrategy,
    pub source: ShapeSource,
    pub overlay: bool,
}

impl Default for ShapeOptions {
    fn default() -> Self {
        Self {
            threshold: ThresholdStrategy::Otsu,
            source: ShapeSource::LargestContour,
            overlay: true,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum EdgeMode {
    /// Quantized Sobel magnitude histogram.
    #[default]
    Histogram,
    /// Fraction of Canny edge pixels.
    Density,
}

impl EdgeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeMode::Histogram => "histogram",
            EdgeMode::Density => "density",
        }
    }
}

impl FromStr for EdgeMode {
    type Err = OptionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "histogram" => Ok(EdgeMode::Histogram),
            "density" => Ok(EdgeMode::Density),
            _ => Err(OptionParseError {
                option: "edge mode",
                value: lower,
            }),
        }
    }
}

#[derive(Clone, Debug)]
pub struct EdgeOptions {
    pub mode: EdgeMode,
    pub bins: usize,
    pub canny_low: f32,
    pub canny_high: f32,
}

impl Default for EdgeOptions {
    fn default() -> Self {
        Self {
            mode: EdgeMode::Histogram,
            bins: cbir_fast_types::EDGE_HISTOGRAM_BINS,
            canny_low: DEFAULT_CANNY_LOW,
            canny_high: DEFAULT_CANNY_HIGH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = DescriptorConfig::default();
        config.validate().unwrap();
        assert_eq!(config.texture.bank.len(), 12);
        assert_eq!(config.dominant_colors.k, 5);
        assert_eq!(config.dominant_colors.seed, 42);
    }

    #[test]
    fn even_kernel_is_rejected() {
        let mut config = DescriptorConfig::default();
        config.texture.bank.kernel_size = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn threshold_strategy_parses() {
        assert_eq!("otsu".parse::<ThresholdStrategy>().unwrap(), ThresholdStrategy::Otsu);
        assert_eq!(
            "Fixed".parse::<ThresholdStrategy>().unwrap(),
            ThresholdStrategy::Fixed(128)
        );
        assert_eq!(
            "fixed:90".parse::<ThresholdStrategy>().unwrap(),
            ThresholdStrategy::Fixed(90)
        );
        assert!("fixed:300".parse::<ThresholdStrategy>().is_err());
        assert_eq!("density".parse::<EdgeMode>().unwrap(), EdgeMode::Density);
        assert_eq!(
            "whole-image".parse::<ShapeSource>().unwrap(),
            ShapeSource::WholeImage
        );
        assert!("blob".parse::<ShapeSource>().is_err());
    }
}
