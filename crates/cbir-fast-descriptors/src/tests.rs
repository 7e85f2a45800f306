use std::marker::PhantomData;

use cbir_fast_types::{
    BgrImage, Channel, ColorHistogram, EDGE_HISTOGRAM_BINS, GlcmFeatures, HU_MOMENT_COUNT,
    RgbColor,
};

use crate::{
    ArtifactKind, DescriptorAggregator, DescriptorConfig, DescriptorError, DescriptorExtractor,
    DescriptorResult, EdgeMode, EdgeOutput, ExecutionMode, FingerprintError, ShapeOutput,
    TextureOutput, encode_png,
};

fn sample_image(width: u32, height: u32) -> BgrImage {
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            let inside_x = x >= width / 4 && x < 3 * width / 4;
            let inside_y = y >= height / 4 && y < 3 * height / 4;
            let b = (x * 255 / (width - 1)) as u8;
            let g = (y * 255 / (height - 1)) as u8;
            let r = if inside_x && inside_y { 230 } else { 20 };
            data.extend_from_slice(&[b, g, r]);
        }
    }
    BgrImage::from_owned(width, height, data).unwrap()
}

fn aggregator() -> DescriptorAggregator {
    DescriptorAggregator::new(DescriptorConfig::default()).unwrap()
}

/// Extractor that always fails under the given name.
struct Failing<T> {
    name: &'static str,
    _output: PhantomData<fn() -> T>,
}

impl<T> Failing<T> {
    fn named(name: &'static str) -> Self {
        Self {
            name,
            _output: PhantomData,
        }
    }
}

impl<T: Send> DescriptorExtractor for Failing<T> {
    type Output = T;

    fn name(&self) -> &'static str {
        self.name
    }

    fn extract(&self, _image: &BgrImage) -> DescriptorResult<T> {
        Err(DescriptorError::EmptyPlane { plane: "gray" })
    }
}

#[test]
fn histogram_channels_sum_to_pixel_count() {
    let image = sample_image(37, 23);
    let report = aggregator().compute(&image);
    for channel in Channel::ALL {
        let sum: u64 = report.fingerprint.histogram.channel(channel).iter().sum();
        assert_eq!(sum, 37 * 23);
    }
}

#[test]
fn default_fingerprint_has_canonical_lengths() {
    let image = sample_image(40, 30);
    let report = aggregator().compute(&image);
    let fingerprint = &report.fingerprint;

    assert!(report.degraded.is_empty(), "{:?}", report.degraded);
    assert_eq!(fingerprint.dominant_colors.len(), 5);
    assert_eq!(fingerprint.texture_descriptor.len(), 12);
    assert_eq!(fingerprint.shape_descriptor.len(), HU_MOMENT_COUNT);
    assert!(fingerprint.shape_descriptor[0] > 0.0);
    let glcm = fingerprint.glcm_features.as_ref().unwrap();
    assert_eq!(glcm.contrast.len(), 4);

    let edges = fingerprint.edge_histogram.as_ref().unwrap();
    assert_eq!(edges.len(), EDGE_HISTOGRAM_BINS);
    assert_eq!(edges.iter().sum::<u64>(), 40 * 30);
    assert!(fingerprint.edge_density.is_none());

    assert!(report.artifact(ArtifactKind::TextureContours).is_some());
    assert!(report.artifact(ArtifactKind::ShapeContour).is_some());
}

#[test]
fn repeated_runs_are_identical() {
    let image = sample_image(48, 32);
    let first = aggregator().compute(&image);
    let second = aggregator().compute(&image);
    assert_eq!(first.fingerprint, second.fingerprint);

    let sequential = DescriptorAggregator::new(DescriptorConfig {
        execution: ExecutionMode::Sequential,
        ..DescriptorConfig::default()
    })
    .unwrap()
    .compute(&image);
    assert_eq!(first.fingerprint, sequential.fingerprint);
}

#[test]
fn solid_image_degrades_shape_without_aborting() {
    let image = BgrImage::filled(24, 16, [10, 120, 240]).unwrap();
    let report = aggregator().compute(&image);
    let fingerprint = &report.fingerprint;

    assert_eq!(fingerprint.shape_descriptor, [0.0; HU_MOMENT_COUNT]);
    assert_eq!(report.artifact(ArtifactKind::ShapeContour), Some(&image));
    // One distinct color cannot feed five clusters.
    assert!(fingerprint.dominant_colors.is_empty());
    assert_eq!(report.degraded, vec!["dominant_colors"]);
    assert_eq!(fingerprint.histogram.red[240], 24 * 16);
    assert_eq!(fingerprint.texture_descriptor.len(), 12);
}

#[test]
fn failing_extractor_leaves_siblings_untouched() {
    let image = sample_image(32, 32);
    let baseline = aggregator().compute(&image);
    let report = aggregator()
        .with_texture_extractor(Failing::<TextureOutput>::named("texture"))
        .compute(&image);

    assert_eq!(report.degraded, vec!["texture"]);
    assert!(report.fingerprint.texture_descriptor.is_empty());
    assert!(report.artifact(ArtifactKind::TextureContours).is_none());

    let (mut expected, mut actual) = (baseline.fingerprint, report.fingerprint);
    expected.texture_descriptor.clear();
    actual.texture_descriptor.clear();
    assert_eq!(expected, actual);
}

#[test]
fn density_mode_fills_only_density() {
    let mut config = DescriptorConfig::default();
    config.edge.mode = EdgeMode::Density;
    config.glcm.enabled = false;
    let report = DescriptorAggregator::new(config)
        .unwrap()
        .compute(&sample_image(30, 30));
    let fingerprint = &report.fingerprint;
    assert!(fingerprint.edge_histogram.is_none());
    let density = fingerprint.edge_density.unwrap();
    assert!((0.0..=1.0).contains(&density));
    assert!(fingerprint.glcm_features.is_none());
    assert!(report.degraded.is_empty());
}

#[test]
fn encoded_input_matches_decoded_input() {
    let image = sample_image(20, 12);
    let bytes = encode_png(&image).unwrap();
    let from_bytes = aggregator().compute_encoded(&bytes).unwrap();
    let direct = aggregator().compute(&image);
    assert_eq!(from_bytes.fingerprint, direct.fingerprint);
}

#[test]
fn undecodable_input_is_the_only_fatal_error() {
    let err = aggregator().compute_encoded(&[0u8; 16]).unwrap_err();
    assert!(matches!(err, FingerprintError::Decode(_)));
}

#[test]
fn invalid_configuration_is_rejected() {
    let mut config = DescriptorConfig::default();
    config.dominant_colors.k = 0;
    assert!(matches!(
        DescriptorAggregator::new(config),
        Err(DescriptorError::Configuration { .. })
    ));
}

#[test]
fn failing_edge_extractor_falls_back_to_requested_bins() {
    let image = sample_image(24, 24);
    let histogram = aggregator()
        .with_edge_extractor(Failing::<EdgeOutput>::named("edge"), EdgeMode::Histogram, 4)
        .compute(&image);
    assert_eq!(histogram.degraded, vec!["edge"]);
    assert_eq!(histogram.fingerprint.edge_histogram, Some(vec![0; 4]));
    assert!(histogram.fingerprint.edge_density.is_none());

    let density = aggregator()
        .with_edge_extractor(Failing::<EdgeOutput>::named("edge"), EdgeMode::Density, 4)
        .compute(&image);
    assert!(density.fingerprint.edge_histogram.is_none());
    assert_eq!(density.fingerprint.edge_density, Some(0.0));
}

#[test]
fn every_failing_extractor_gets_its_default() {
    let image = sample_image(32, 32);
    let report = aggregator()
        .with_histogram_extractor(Failing::<ColorHistogram>::named("color_histogram"))
        .with_dominant_color_extractor(Failing::<Vec<RgbColor>>::named("dominant_colors"))
        .with_glcm_extractor(Failing::<GlcmFeatures>::named("glcm"))
        .with_shape_extractor(Failing::<ShapeOutput>::named("shape"))
        .compute(&image);
    let fingerprint = &report.fingerprint;

    assert_eq!(
        report.degraded,
        vec!["color_histogram", "dominant_colors", "glcm", "shape"]
    );
    assert_eq!(fingerprint.histogram, ColorHistogram::zeroed());
    assert!(fingerprint.dominant_colors.is_empty());
    assert!(fingerprint.glcm_features.is_none());
    assert_eq!(fingerprint.shape_descriptor, [0.0; HU_MOMENT_COUNT]);
    assert!(report.artifact(ArtifactKind::ShapeContour).is_none());

    assert_eq!(fingerprint.texture_descriptor.len(), 12);
    assert!(report.artifact(ArtifactKind::TextureContours).is_some());
}
