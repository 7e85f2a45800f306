use std::time::Instant;

use cbir_fast_types::{BgrImage, ColorHistogram, Fingerprint, GlcmFeatures, HU_MOMENT_COUNT, RgbColor};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::codec::decode_image;
use crate::config::{DescriptorConfig, EdgeMode, ExecutionMode};
use crate::error::{DescriptorResult, FingerprintError};
use crate::extractors::{
    ColorHistogramExtractor, DescriptorExtractor, DominantColorExtractor, EdgeExtractor,
    EdgeOutput, GlcmExtractor, ShapeExtractor, ShapeOutput, TextureExtractor, TextureOutput,
};

type Extractor<T> = Box<dyn DescriptorExtractor<Output = T>>;

/// Which extractor produced a visualization.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArtifactKind {
    TextureContours,
    ShapeContour,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::TextureContours => "textureContours",
            ArtifactKind::ShapeContour => "shapeContour",
        }
    }
}

/// Overlay image drawn on a private copy of the input.
#[derive(Clone, Debug)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub image: BgrImage,
}

#[derive(Clone, Debug)]
pub struct FingerprintReport {
    pub fingerprint: Fingerprint,
    pub artifacts: Vec<Artifact>,
    /// Names of descriptors that failed and were replaced by defaults.
    pub degraded: Vec<&'static str>,
}

impl FingerprintReport {
    pub fn artifact(&self, kind: ArtifactKind) -> Option<&BgrImage> {
        self.artifacts
            .iter()
            .find(|artifact| artifact.kind == kind)
            .map(|artifact| &artifact.image)
    }
}

/// Runs every descriptor extractor over one image and merges the results.
///
/// A failing extractor never affects its siblings: its field receives the
/// documented default and its name is listed in the report.
pub struct DescriptorAggregator {
    histogram: Extractor<ColorHistogram>,
    dominant_colors: Extractor<Vec<RgbColor>>,
    texture: Extractor<TextureOutput>,
    glcm: Option<Extractor<GlcmFeatures>>,
    shape: Extractor<ShapeOutput>,
    edge: Extractor<EdgeOutput>,
    edge_mode: EdgeMode,
    edge_bins: usize,
    execution: ExecutionMode,
}

impl DescriptorAggregator {
    pub fn new(config: DescriptorConfig) -> DescriptorResult<Self> {
        config.validate()?;
        let DescriptorConfig {
            dominant_colors,
            texture,
            glcm,
            shape,
            edge,
            execution,
        } = config;
        let edge_mode = edge.mode;
        let edge_bins = edge.bins;
        let glcm: Option<Extractor<GlcmFeatures>> = if glcm.enabled {
            Some(Box::new(GlcmExtractor::new(glcm)))
        } else {
            None
        };
        Ok(Self {
            histogram: Box::new(ColorHistogramExtractor::new()),
            dominant_colors: Box::new(DominantColorExtractor::new(dominant_colors)),
            texture: Box::new(TextureExtractor::new(texture)),
            glcm,
            shape: Box::new(ShapeExtractor::new(shape)),
            edge: Box::new(EdgeExtractor::new(edge)),
            edge_mode,
            edge_bins,
            execution,
        })
    }

    pub fn with_histogram_extractor(
        mut self,
        extractor: impl DescriptorExtractor<Output = ColorHistogram> + 'static,
    ) -> Self {
        self.histogram = Box::new(extractor);
        self
    }

    pub fn with_dominant_color_extractor(
        mut self,
        extractor: impl DescriptorExtractor<Output = Vec<RgbColor>> + 'static,
    ) -> Self {
        self.dominant_colors = Box::new(extractor);
        self
    }

    pub fn with_texture_extractor(
        mut self,
        extractor: impl DescriptorExtractor<Output = TextureOutput> + 'static,
    ) -> Self {
        self.texture = Box::new(extractor);
        self
    }

    pub fn with_glcm_extractor(
        mut self,
        extractor: impl DescriptorExtractor<Output = GlcmFeatures> + 'static,
    ) -> Self {
        self.glcm = Some(Box::new(extractor));
        self
    }

    pub fn with_shape_extractor(
        mut self,
        extractor: impl DescriptorExtractor<Output = ShapeOutput> + 'static,
    ) -> Self {
        self.shape = Box::new(extractor);
        self
    }

    /// Replaces the edge extractor. `mode` names the field its output fills
    /// and `bins` sizes the zeroed histogram used when it fails.
    pub fn with_edge_extractor(
        mut self,
        extractor: impl DescriptorExtractor<Output = EdgeOutput> + 'static,
        mode: EdgeMode,
        bins: usize,
    ) -> Self {
        self.edge = Box::new(extractor);
        self.edge_mode = mode;
        self.edge_bins = bins;
        self
    }

    /// Decodes `bytes` and computes the fingerprint. Decoding is the only
    /// failure that aborts the request.
    pub fn compute_encoded(&self, bytes: &[u8]) -> Result<FingerprintReport, FingerprintError> {
        let image = decode_image(bytes)?;
        Ok(self.compute(&image))
    }

    pub fn compute(&self, image: &BgrImage) -> FingerprintReport {
        let started = Instant::now();
        let results = match self.execution {
            ExecutionMode::Parallel => self.run_parallel(image),
            ExecutionMode::Sequential => self.run_sequential(image),
        };
        let report = self.merge(results);
        debug!(
            width = image.width(),
            height = image.height(),
            degraded = report.degraded.len(),
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "fingerprint computed"
        );
        report
    }

    fn run_sequential(&self, image: &BgrImage) -> RawResults {
        RawResults {
            histogram: run(self.histogram.as_ref(), image),
            dominant_colors: run(self.dominant_colors.as_ref(), image),
            texture: run(self.texture.as_ref(), image),
            glcm: self.glcm.as_ref().map(|glcm| run(glcm.as_ref(), image)),
            shape: run(self.shape.as_ref(), image),
            edge: run(self.edge.as_ref(), image),
        }
    }

    fn run_parallel(&self, image: &BgrImage) -> RawResults {
        let ((histogram, dominant_colors), ((texture, glcm), (shape, edge))) = rayon::join(
            || {
                rayon::join(
                    || run(self.histogram.as_ref(), image),
                    || run(self.dominant_colors.as_ref(), image),
                )
            },
            || {
                rayon::join(
                    || {
                        rayon::join(
                            || run(self.texture.as_ref(), image),
                            || self.glcm.as_ref().map(|glcm| run(glcm.as_ref(), image)),
                        )
                    },
                    || {
                        rayon::join(
                            || run(self.shape.as_ref(), image),
                            || run(self.edge.as_ref(), image),
                        )
                    },
                )
            },
        );
        RawResults {
            histogram,
            dominant_colors,
            texture,
            glcm,
            shape,
            edge,
        }
    }

    fn merge(&self, results: RawResults) -> FingerprintReport {
        let mut degraded = Vec::new();
        let mut artifacts = Vec::new();
        let mut fingerprint = Fingerprint::default();

        fingerprint.histogram = settle(self.histogram.name(), results.histogram, &mut degraded)
            .unwrap_or_else(ColorHistogram::zeroed);

        fingerprint.dominant_colors = settle(
            self.dominant_colors.name(),
            results.dominant_colors,
            &mut degraded,
        )
        .unwrap_or_default();

        if let Some(texture) = settle(self.texture.name(), results.texture, &mut degraded) {
            fingerprint.texture_descriptor = texture.descriptor;
            if let Some(image) = texture.overlay {
                artifacts.push(Artifact {
                    kind: ArtifactKind::TextureContours,
                    image,
                });
            }
        }

        if let (Some(extractor), Some(result)) = (self.glcm.as_ref(), results.glcm) {
            fingerprint.glcm_features = settle(extractor.name(), result, &mut degraded);
        }

        match settle(self.shape.name(), results.shape, &mut degraded) {
            Some(shape) => {
                if !shape.contour_found {
                    debug!(descriptor = self.shape.name(), "no usable contour, zero Hu vector");
                }
                fingerprint.shape_descriptor = shape.descriptor;
                if let Some(image) = shape.overlay {
                    artifacts.push(Artifact {
                        kind: ArtifactKind::ShapeContour,
                        image,
                    });
                }
            }
            None => fingerprint.shape_descriptor = [0.0; HU_MOMENT_COUNT],
        }

        match settle(self.edge.name(), results.edge, &mut degraded) {
            Some(EdgeOutput::Histogram(counts)) => fingerprint.edge_histogram = Some(counts),
            Some(EdgeOutput::Density(density)) => fingerprint.edge_density = Some(density),
            None => match self.edge_mode {
                EdgeMode::Histogram => fingerprint.edge_histogram = Some(vec![0; self.edge_bins]),
                EdgeMode::Density => fingerprint.edge_density = Some(0.0),
            },
        }

        FingerprintReport {
            fingerprint,
            artifacts,
            degraded,
        }
    }
}

struct RawResults {
    histogram: DescriptorResult<ColorHistogram>,
    dominant_colors: DescriptorResult<Vec<RgbColor>>,
    texture: DescriptorResult<TextureOutput>,
    glcm: Option<DescriptorResult<GlcmFeatures>>,
    shape: DescriptorResult<ShapeOutput>,
    edge: DescriptorResult<EdgeOutput>,
}

fn run<T: Send>(
    extractor: &dyn DescriptorExtractor<Output = T>,
    image: &BgrImage,
) -> DescriptorResult<T> {
    let started = Instant::now();
    let result = extractor.extract(image);
    debug!(
        descriptor = extractor.name(),
        ok = result.is_ok(),
        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
        "extractor finished"
    );
    result
}

fn settle<T>(
    name: &'static str,
    result: DescriptorResult<T>,
    degraded: &mut Vec<&'static str>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(descriptor = name, error = %err, "descriptor replaced by its default");
            degraded.push(name);
            None
        }
    }
}
