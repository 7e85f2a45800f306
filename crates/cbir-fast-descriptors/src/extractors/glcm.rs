use cbir_fast_types::{BgrImage, GLCM_ANGLES, GlcmFeatures, GrayPlane};

use crate::config::GlcmOptions;
use crate::error::{DescriptorError, DescriptorResult};
use crate::extractors::DescriptorExtractor;

const TAG: &str = "glcm";
const LEVELS: usize = 256;

/// Gray-level co-occurrence statistics over four directions.
///
/// The matrix is symmetric and normalized, with one pixel pair counted per
/// in-bounds offset. Each property holds one value per angle, in the order
/// 0, 45, 90, 135 degrees.
pub struct GlcmExtractor {
    options: GlcmOptions,
}

impl GlcmExtractor {
    pub fn new(options: GlcmOptions) -> Self {
        Self { options }
    }
}

impl DescriptorExtractor for GlcmExtractor {
    type Output = GlcmFeatures;

    fn name(&self) -> &'static str {
        TAG
    }

    fn extract(&self, image: &BgrImage) -> DescriptorResult<GlcmFeatures> {
        if self.options.distance == 0 {
            return Err(DescriptorError::configuration("GLCM distance must be >= 1"));
        }
        let gray = image.to_gray();
        let mut features = GlcmFeatures::default();
        for angle in GLCM_ANGLES {
            let (d_row, d_col) = offset(angle, self.options.distance);
            let matrix = co_occurrence(&gray, d_row, d_col)?;
            features.push_angle(properties(&matrix));
        }
        Ok(features)
    }
}

/// Row/column displacement for an angle measured counter-clockwise from
/// the x axis, rounded to whole pixels.
fn offset(angle: f64, distance: usize) -> (isize, isize) {
    let d = distance as f64;
    ((angle.sin() * d).round() as isize, (angle.cos() * d).round() as isize)
}

/// Normalized symmetric co-occurrence matrix, row-major `LEVELS x LEVELS`.
fn co_occurrence(gray: &GrayPlane, d_row: isize, d_col: isize) -> DescriptorResult<Vec<f64>> {
    let (width, height) = (gray.width() as isize, gray.height() as isize);
    let mut counts = vec![0u64; LEVELS * LEVELS];
    let mut pairs = 0u64;
    for row in 0..height {
        let row2 = row + d_row;
        if row2 < 0 || row2 >= height {
            continue;
        }
        for col in 0..width {
            let col2 = col + d_col;
            if col2 < 0 || col2 >= width {
                continue;
            }
            let i = gray.get(col as usize, row as usize) as usize;
            let j = gray.get(col2 as usize, row2 as usize) as usize;
            counts[i * LEVELS + j] += 1;
            counts[j * LEVELS + i] += 1;
            pairs += 2;
        }
    }
    if pairs == 0 {
        return Err(DescriptorError::degenerate(format!(
            "no pixel pairs at offset ({d_row}, {d_col}) in a {width}x{height} image"
        )));
    }
    let total = pairs as f64;
    Ok(counts.into_iter().map(|c| c as f64 / total).collect())
}

/// `[contrast, dissimilarity, homogeneity, energy, correlation]`.
fn properties(p: &[f64]) -> [f64; 5] {
    let mut contrast = 0.0;
    let mut dissimilarity = 0.0;
    let mut homogeneity = 0.0;
    let mut asm = 0.0;
    let mut mean_i = 0.0;
    let mut mean_j = 0.0;
    for i in 0..LEVELS {
        for j in 0..LEVELS {
            let v = p[i * LEVELS + j];
            if v == 0.0 {
                continue;
            }
            let diff = i as f64 - j as f64;
            contrast += v * diff * diff;
            dissimilarity += v * diff.abs();
            homogeneity += v / (1.0 + diff * diff);
            asm += v * v;
            mean_i += v * i as f64;
            mean_j += v * j as f64;
        }
    }

    let mut var_i = 0.0;
    let mut var_j = 0.0;
    let mut cov = 0.0;
    for i in 0..LEVELS {
        for j in 0..LEVELS {
            let v = p[i * LEVELS + j];
            if v == 0.0 {
                continue;
            }
            let di = i as f64 - mean_i;
            let dj = j as f64 - mean_j;
            var_i += v * di * di;
            var_j += v * dj * dj;
            cov += v * di * dj;
        }
    }
    let (std_i, std_j) = (var_i.sqrt(), var_j.sqrt());
    // A constant matrix is perfectly correlated by convention.
    let correlation = if std_i < 1e-15 || std_j < 1e-15 {
        1.0
    } else {
        cov / (std_i * std_j)
    };

    [
        contrast,
        dissimilarity,
        homogeneity,
        asm.sqrt(),
        correlation,
    ]
}
