use cbir_fast_types::{BgrImage, HU_MOMENT_COUNT, ShapeDescriptor};
use tracing::debug;

use crate::config::{ShapeOptions, ShapeSource, ThresholdStrategy};
use crate::error::DescriptorResult;
use crate::extractors::DescriptorExtractor;
use crate::pipeline::draw::{CONTOUR_RED, CONTOUR_THICKNESS};
use crate::pipeline::ops::{is_uniform, otsu_threshold, threshold_binary};
use crate::pipeline::{Contour, OverlayCanvas, SpatialMoments, find_external_contours};

const TAG: &str = "shape";

#[derive(Clone, Debug)]
pub struct ShapeOutput {
    pub descriptor: ShapeDescriptor,
    /// Copy of the input with the selected contour drawn, or the unmodified
    /// input when no usable contour exists.
    pub overlay: Option<BgrImage>,
    /// Whether a contour with non-zero area was found.
    pub contour_found: bool,
}

/// Hu moment invariants of the dominant foreground shape.
pub struct ShapeExtractor {
    options: ShapeOptions,
}

impl ShapeExtractor {
    pub fn new(options: ShapeOptions) -> Self {
        Self { options }
    }

    fn threshold_for(&self, gray: &[u8]) -> u8 {
        match self.options.threshold {
            ThresholdStrategy::Otsu => otsu_threshold(gray),
            ThresholdStrategy::Fixed(level) => level,
        }
    }

    fn largest_contour(&self, image: &BgrImage) -> Option<Contour> {
        let gray = image.to_gray();
        // A flat image has no boundary under any threshold.
        if is_uniform(gray.data()) {
            return None;
        }
        let threshold = self.threshold_for(gray.data());
        let mask = threshold_binary(gray.data(), threshold);
        let contours = find_external_contours(&mask, gray.width(), gray.height());
        debug!(
            descriptor = TAG,
            threshold,
            contours = contours.len(),
            "binarized for contour search"
        );
        let mut best: Option<(f64, Contour)> = None;
        for contour in contours {
            let area = contour.area();
            if best.as_ref().is_none_or(|(best_area, _)| area > *best_area) {
                best = Some((area, contour));
            }
        }
        best.map(|(_, contour)| contour)
    }

    fn contour_descriptor(&self, image: &BgrImage) -> DescriptorResult<ShapeOutput> {
        let contour = self.largest_contour(image);
        let hu = contour
            .as_ref()
            .and_then(|c| SpatialMoments::from_polygon(&c.points).hu());

        let Some((contour, hu)) = contour.zip(hu) else {
            return Ok(ShapeOutput {
                descriptor: [0.0; HU_MOMENT_COUNT],
                overlay: self.options.overlay.then(|| image.clone()),
                contour_found: false,
            });
        };

        let overlay = if self.options.overlay {
            let mut canvas = OverlayCanvas::from_image(image);
            canvas.draw_contour(&contour, CONTOUR_RED, CONTOUR_THICKNESS);
            Some(canvas.into_image()?)
        } else {
            None
        };
        Ok(ShapeOutput {
            descriptor: hu,
            overlay,
            contour_found: true,
        })
    }

    fn raster_descriptor(&self, image: &BgrImage) -> ShapeOutput {
        let moments = SpatialMoments::from_raster(&image.to_gray());
        let hu = moments.hu();
        ShapeOutput {
            descriptor: hu.unwrap_or([0.0; HU_MOMENT_COUNT]),
            overlay: None,
            contour_found: hu.is_some(),
        }
    }
}

impl DescriptorExtractor for ShapeExtractor {
    type Output = ShapeOutput;

    fn name(&self) -> &'static str {
        TAG
    }

    fn extract(&self, image: &BgrImage) -> DescriptorResult<ShapeOutput> {
        match self.options.source {
            ShapeSource::LargestContour => self.contour_descriptor(image),
            ShapeSource::WholeImage => Ok(self.raster_descriptor(image)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_on_black(size: u32, x0: u32, y0: u32, side: u32) -> BgrImage {
        let mut data = vec![0u8; (size * size * 3) as usize];
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                let idx = ((y * size + x) * 3) as usize;
                data[idx..idx + 3].copy_from_slice(&[255, 255, 255]);
            }
        }
        BgrImage::from_owned(size, size, data).unwrap()
    }

    #[test]
    fn square_yields_hu_moments_and_overlay() {
        let image = square_on_black(20, 5, 5, 8);
        let output = ShapeExtractor::new(ShapeOptions::default())
            .extract(&image)
            .unwrap();
        assert!(output.contour_found);
        assert_eq!(output.descriptor.len(), HU_MOMENT_COUNT);
        assert!((output.descriptor[0] - 1.0 / 6.0).abs() < 1e-9);
        let overlay = output.overlay.unwrap();
        assert_eq!(overlay.pixel(5, 5), CONTOUR_RED);
        assert_eq!(image.pixel(5, 5), [255, 255, 255]);
    }

    #[test]
    fn descriptor_ignores_translation() {
        let extractor = ShapeExtractor::new(ShapeOptions::default());
        let a = extractor.extract(&square_on_black(30, 2, 3, 10)).unwrap();
        let b = extractor.extract(&square_on_black(30, 15, 12, 10)).unwrap();
        for (x, y) in a.descriptor.iter().zip(b.descriptor.iter()) {
            assert!((x - y).abs() < 1e-10);
        }
    }

    #[test]
    fn uniform_image_falls_back_to_zeros() {
        let image = BgrImage::filled(12, 9, [200, 100, 50]).unwrap();
        for threshold in [ThresholdStrategy::Otsu, ThresholdStrategy::Fixed(128)] {
            let options = ShapeOptions {
                threshold,
                ..ShapeOptions::default()
            };
            let output = ShapeExtractor::new(options).extract(&image).unwrap();
            assert!(!output.contour_found);
            assert_eq!(output.descriptor, [0.0; HU_MOMENT_COUNT]);
            assert_eq!(output.overlay.unwrap(), image);
        }
    }

    #[test]
    fn single_pixel_blob_has_zero_area() {
        let image = square_on_black(9, 4, 4, 1);
        let output = ShapeExtractor::new(ShapeOptions::default())
            .extract(&image)
            .unwrap();
        assert!(!output.contour_found);
        assert_eq!(output.descriptor, [0.0; HU_MOMENT_COUNT]);
    }

    #[test]
    fn whole_image_mode_skips_overlay() {
        let options = ShapeOptions {
            source: ShapeSource::WholeImage,
            ..ShapeOptions::default()
        };
        let output = ShapeExtractor::new(options)
            .extract(&square_on_black(16, 4, 4, 6))
            .unwrap();
        assert!(output.contour_found);
        assert!(output.overlay.is_none());
        assert!(output.descriptor[0] > 0.0);
    }
}
