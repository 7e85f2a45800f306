use std::f64::consts::PI;

use cbir_fast_types::{BgrImage, GrayPlane};
use rayon::prelude::*;
use tracing::debug;

use crate::config::{GaborBank, TextureOptions};
use crate::error::{DescriptorError, DescriptorResult};
use crate::extractors::DescriptorExtractor;
use crate::pipeline::draw::{CONTOUR_GREEN, CONTOUR_THICKNESS};
use crate::pipeline::ops::{filter2d, normalize_minmax, saturate_u8, threshold_binary};
use crate::pipeline::{Contour, OverlayCanvas, find_external_contours};

const TAG: &str = "texture";

#[derive(Clone, Debug)]
pub struct TextureOutput {
    /// Mean 8-bit response per filter, orientation-major.
    pub descriptor: Vec<f64>,
    /// Outlines of every filter response drawn on one copy of the input.
    pub overlay: Option<BgrImage>,
}

/// Gabor filter bank energy.
pub struct TextureExtractor {
    options: TextureOptions,
    kernels: Vec<GaborKernel>,
}

impl TextureExtractor {
    pub fn new(options: TextureOptions) -> Self {
        let kernels = build_bank(&options.bank);
        Self { options, kernels }
    }
}

struct GaborKernel {
    size: usize,
    taps: Vec<f32>,
}

struct FilterResponse {
    mean: f64,
    plane: Vec<u8>,
}

impl DescriptorExtractor for TextureExtractor {
    type Output = TextureOutput;

    fn name(&self) -> &'static str {
        TAG
    }

    fn extract(&self, image: &BgrImage) -> DescriptorResult<TextureOutput> {
        if self.kernels.is_empty() {
            return Err(DescriptorError::configuration("gabor bank is empty"));
        }
        let gray = image.to_gray();
        if gray.is_empty() {
            return Err(DescriptorError::EmptyPlane { plane: "gray" });
        }

        let responses: Vec<FilterResponse> = self
            .kernels
            .par_iter()
            .map(|kernel| respond(&gray, kernel))
            .collect();
        let descriptor: Vec<f64> = responses.iter().map(|r| r.mean).collect();

        let overlay = if self.options.overlay {
            Some(self.draw_responses(image, &gray, &responses)?)
        } else {
            None
        };

        debug!(descriptor = TAG, filters = descriptor.len(), "gabor bank applied");
        Ok(TextureOutput {
            descriptor,
            overlay,
        })
    }
}

impl TextureExtractor {
    fn draw_responses(
        &self,
        image: &BgrImage,
        gray: &GrayPlane,
        responses: &[FilterResponse],
    ) -> DescriptorResult<BgrImage> {
        let per_filter: Vec<Vec<Contour>> = responses
            .par_iter()
            .map(|response| self.response_contours(gray, response))
            .collect();

        let mut canvas = OverlayCanvas::from_image(image);
        for contours in &per_filter {
            canvas.draw_contours(contours, CONTOUR_GREEN, CONTOUR_THICKNESS);
        }
        let drawn: usize = per_filter.iter().map(Vec::len).sum();
        debug!(descriptor = TAG, contours = drawn, "texture overlay drawn");
        Ok(canvas.into_image()?)
    }

    fn response_contours(&self, gray: &GrayPlane, response: &FilterResponse) -> Vec<Contour> {
        let as_float: Vec<f32> = response.plane.iter().map(|&v| v as f32).collect();
        let normalized = normalize_minmax(&as_float);
        let mask = threshold_binary(&normalized, self.options.overlay_threshold);
        find_external_contours(&mask, gray.width(), gray.height())
    }
}

fn respond(gray: &GrayPlane, kernel: &GaborKernel) -> FilterResponse {
    let filtered = filter2d(
        gray.data(),
        gray.width(),
        gray.height(),
        &kernel.taps,
        kernel.size,
    );
    let plane: Vec<u8> = filtered.into_iter().map(saturate_u8).collect();
    let sum: u64 = plane.iter().map(|&v| v as u64).sum();
    FilterResponse {
        mean: sum as f64 / plane.len() as f64,
        plane,
    }
}

fn build_bank(bank: &GaborBank) -> Vec<GaborKernel> {
    let mut kernels = Vec::with_capacity(bank.len());
    for &orientation in &bank.orientations_deg {
        for &wavelength in &bank.wavelengths {
            kernels.push(gabor_kernel(
                bank.kernel_size,
                bank.sigma,
                orientation.to_radians(),
                wavelength,
                bank.gamma,
                bank.psi,
            ));
        }
    }
    kernels
}

/// Real Gabor kernel laid out for correlation, rotated by `theta` radians.
fn gabor_kernel(
    size: usize,
    sigma: f64,
    theta: f64,
    wavelength: f64,
    gamma: f64,
    psi: f64,
) -> GaborKernel {
    let half = (size / 2) as i64;
    let sigma_y = sigma / gamma;
    let ex = -0.5 / (sigma * sigma);
    let ey = -0.5 / (sigma_y * sigma_y);
    let scale = 2.0 * PI / wavelength;
    let (s, c) = theta.sin_cos();

    let mut taps = vec![0.0f32; size * size];
    for y in -half..=half {
        for x in -half..=half {
            let (xf, yf) = (x as f64, y as f64);
            let xr = xf * c + yf * s;
            let yr = -xf * s + yf * c;
            let v = (ex * xr * xr + ey * yr * yr).exp() * (scale * xr + psi).cos();
            let row = (half - y) as usize;
            let col = (half - x) as usize;
            taps[row * size + col] = v as f32;
        }
    }
    GaborKernel { size, taps }
}
