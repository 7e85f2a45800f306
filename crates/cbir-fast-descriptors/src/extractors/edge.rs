use cbir_fast_types::{BgrImage, GrayPlane};

use crate::config::{EdgeMode, EdgeOptions};
use crate::error::{DescriptorError, DescriptorResult};
use crate::extractors::DescriptorExtractor;
use crate::pipeline::ops::{sobel_gradients, sobel_magnitude};

const TAG: &str = "edge";
const MAGNITUDE_RANGE: f32 = 255.0;
const TAN_22_5: f32 = 0.414_213_57;

#[derive(Clone, Debug, PartialEq)]
pub enum EdgeOutput {
    /// Counts of Sobel magnitudes over `[0, 255]`, one per bin.
    Histogram(Vec<u64>),
    /// Fraction of pixels marked as Canny edges.
    Density(f64),
}

/// Edge statistics in one of two mutually exclusive modes.
pub struct EdgeExtractor {
    options: EdgeOptions,
}

impl EdgeExtractor {
    pub fn new(options: EdgeOptions) -> Self {
        Self { options }
    }
}

impl DescriptorExtractor for EdgeExtractor {
    type Output = EdgeOutput;

    fn name(&self) -> &'static str {
        TAG
    }

    fn extract(&self, image: &BgrImage) -> DescriptorResult<EdgeOutput> {
        let gray = image.to_gray();
        if gray.is_empty() {
            return Err(DescriptorError::EmptyPlane { plane: "gray" });
        }
        match self.options.mode {
            EdgeMode::Histogram => {
                magnitude_histogram(&gray, self.options.bins).map(EdgeOutput::Histogram)
            }
            EdgeMode::Density => {
                let edges = canny(&gray, self.options.canny_low, self.options.canny_high);
                let count = edges.iter().filter(|&&edge| edge).count();
                Ok(EdgeOutput::Density(count as f64 / edges.len() as f64))
            }
        }
    }
}

/// Equal-width bins over `[0, 255]`; magnitudes above the range land in the
/// last bin, so the counts always sum to the pixel count.
fn magnitude_histogram(gray: &GrayPlane, bins: usize) -> DescriptorResult<Vec<u64>> {
    if bins == 0 {
        return Err(DescriptorError::configuration("edge histogram needs >= 1 bin"));
    }
    let magnitude = sobel_magnitude(gray.data(), gray.width(), gray.height());
    let bin_width = MAGNITUDE_RANGE / bins as f32;
    let mut counts = vec![0u64; bins];
    for value in magnitude {
        let clamped = value.clamp(0.0, MAGNITUDE_RANGE);
        let bin = ((clamped / bin_width) as usize).min(bins - 1);
        counts[bin] += 1;
    }
    Ok(counts)
}

/// Canny edge map: L1 gradient magnitude, non-maximum suppression across
/// the gradient direction, then hysteresis from strong pixels.
fn canny(gray: &GrayPlane, low: f32, high: f32) -> Vec<bool> {
    let (width, height) = (gray.width(), gray.height());
    let (gx, gy) = sobel_gradients(gray.data(), width, height);
    let magnitude: Vec<f32> = gx.iter().zip(&gy).map(|(x, y)| x.abs() + y.abs()).collect();
    let at = |x: isize, y: isize| -> f32 {
        if x < 0 || y < 0 || x as usize >= width || y as usize >= height {
            0.0
        } else {
            magnitude[y as usize * width + x as usize]
        }
    };

    let mut strong = Vec::new();
    let mut weak = vec![false; magnitude.len()];
    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            let m = magnitude[idx];
            if m <= low {
                continue;
            }
            let (xi, yi) = (x as isize, y as isize);
            let ax = gx[idx].abs();
            let ay = gy[idx].abs();
            let tg22 = ax * TAN_22_5;
            let is_peak = if ay < tg22 {
                m > at(xi - 1, yi) && m >= at(xi + 1, yi)
            } else if ay > tg22 + 2.0 * ax {
                m > at(xi, yi - 1) && m >= at(xi, yi + 1)
            } else {
                let s = if (gx[idx] < 0.0) != (gy[idx] < 0.0) { -1 } else { 1 };
                m > at(xi - s, yi - 1) && m > at(xi + s, yi + 1)
            };
            if !is_peak {
                continue;
            }
            if m > high {
                strong.push(idx);
            } else {
                weak[idx] = true;
            }
        }
    }

    let mut edges = vec![false; magnitude.len()];
    for &idx in &strong {
        edges[idx] = true;
    }
    while let Some(idx) = strong.pop() {
        let (x, y) = ((idx % width) as isize, (idx / width) as isize);
        for dy in -1..=1 {
            for dx in -1..=1 {
                let (nx, ny) = (x + dx, y + dy);
                if nx < 0 || ny < 0 || nx as usize >= width || ny as usize >= height {
                    continue;
                }
                let nidx = ny as usize * width + nx as usize;
                if weak[nidx] && !edges[nidx] {
                    edges[nidx] = true;
                    strong.push(nidx);
                }
            }
        }
    }
    edges
}
