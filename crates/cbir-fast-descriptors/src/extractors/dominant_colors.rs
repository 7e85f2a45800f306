use std::collections::BTreeMap;

use cbir_fast_types::{BgrImage, RgbColor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::debug;

use crate::config::DominantColorOptions;
use crate::error::{DescriptorError, DescriptorResult};
use crate::extractors::DescriptorExtractor;

const TAG: &str = "dominant_colors";
const PARALLEL_MIN_COLORS: usize = 4096;

/// k-means color clustering in RGB space.
///
/// Pixels are grouped by exact color first and clustered with their counts
/// as weights, which gives the same partition as clustering every pixel.
/// Centroids come back in cluster index order; the order is reproducible
/// for a given image and seed but carries no visual meaning.
pub struct DominantColorExtractor {
    options: DominantColorOptions,
}

impl DominantColorExtractor {
    pub fn new(options: DominantColorOptions) -> Self {
        Self { options }
    }
}

impl DescriptorExtractor for DominantColorExtractor {
    type Output = Vec<RgbColor>;

    fn name(&self) -> &'static str {
        TAG
    }

    fn extract(&self, image: &BgrImage) -> DescriptorResult<Vec<RgbColor>> {
        let k = self.options.k;
        if k == 0 {
            return Err(DescriptorError::configuration("k must be > 0"));
        }
        let palette = weighted_palette(&image.rgb_samples());
        if palette.len() < k {
            return Err(DescriptorError::InsufficientColors {
                required: k,
                found: palette.len(),
            });
        }

        let mut rng = StdRng::seed_from_u64(self.options.seed);
        let mut centroids = kmeans_plus_plus_init(&palette, k, &mut rng)?;
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.options.max_iterations {
            iterations += 1;
            let assignments = assign(&palette, &centroids);
            let updated = recompute_centroids(&palette, &assignments, &centroids);
            let movement = centroids
                .iter()
                .zip(updated.iter())
                .map(|(old, new)| squared_distance(old, new).sqrt())
                .fold(0.0f64, f64::max);
            centroids = updated;
            if movement <= self.options.tolerance {
                converged = true;
                break;
            }
        }

        debug!(
            descriptor = TAG,
            k,
            distinct = palette.len(),
            iterations,
            converged,
            "k-means finished"
        );
        Ok(centroids.iter().map(to_rgb).collect())
    }
}

#[derive(Clone, Copy, Debug)]
struct PaletteEntry {
    color: [u8; 3],
    weight: u64,
}

/// Distinct colors with their pixel counts, ordered by color value.
fn weighted_palette(samples: &[[u8; 3]]) -> Vec<PaletteEntry> {
    let mut counts: BTreeMap<[u8; 3], u64> = BTreeMap::new();
    for sample in samples {
        *counts.entry(*sample).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(color, weight)| PaletteEntry { color, weight })
        .collect()
}

fn color_distance_u64(a: [u8; 3], b: [u8; 3]) -> u64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = x.abs_diff(y) as u64;
            d * d
        })
        .sum()
}

fn squared_distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// k-means++ seeding: each new center is drawn with probability
/// proportional to pixel count times squared distance to the nearest
/// chosen center. Distances between palette colors are integers, so the
/// draw is exact.
fn kmeans_plus_plus_init(
    palette: &[PaletteEntry],
    k: usize,
    rng: &mut StdRng,
) -> DescriptorResult<Vec<[f64; 3]>> {
    let total_pixels: u64 = palette.iter().map(|entry| entry.weight).sum();
    if total_pixels == 0 {
        return Err(DescriptorError::degenerate("no pixels to cluster"));
    }
    let first = pick_weighted(
        palette.iter().map(|entry| entry.weight),
        rng.gen_range(0..total_pixels),
    );
    let mut chosen = vec![palette[first].color];
    let mut nearest: Vec<u64> = palette
        .iter()
        .map(|entry| color_distance_u64(entry.color, palette[first].color))
        .collect();

    while chosen.len() < k {
        let total: u64 = palette
            .iter()
            .zip(&nearest)
            .map(|(entry, d)| entry.weight * d)
            .sum();
        if total == 0 {
            return Err(DescriptorError::degenerate(
                "k-means++ ran out of distinct colors",
            ));
        }
        let target = rng.gen_range(0..total);
        let idx = pick_weighted(
            palette.iter().zip(&nearest).map(|(entry, d)| entry.weight * d),
            target,
        );
        let center = palette[idx].color;
        chosen.push(center);
        for (d, entry) in nearest.iter_mut().zip(palette) {
            *d = (*d).min(color_distance_u64(entry.color, center));
        }
    }

    Ok(chosen
        .into_iter()
        .map(|c| [c[0] as f64, c[1] as f64, c[2] as f64])
        .collect())
}

/// Index of the entry whose cumulative weight first exceeds `target`.
fn pick_weighted(weights: impl Iterator<Item = u64>, target: u64) -> usize {
    let mut cumulative = 0u64;
    let mut last_positive = 0;
    for (idx, weight) in weights.enumerate() {
        if weight == 0 {
            continue;
        }
        cumulative += weight;
        last_positive = idx;
        if target < cumulative {
            return idx;
        }
    }
    last_positive
}

fn nearest_centroid(color: [u8; 3], centroids: &[[f64; 3]]) -> usize {
    let point = [color[0] as f64, color[1] as f64, color[2] as f64];
    let mut best = 0;
    let mut best_dist = f64::MAX;
    for (idx, centroid) in centroids.iter().enumerate() {
        let dist = squared_distance(&point, centroid);
        if dist < best_dist {
            best_dist = dist;
            best = idx;
        }
    }
    best
}

fn assign(palette: &[PaletteEntry], centroids: &[[f64; 3]]) -> Vec<usize> {
    if palette.len() >= PARALLEL_MIN_COLORS {
        palette
            .par_iter()
            .map(|entry| nearest_centroid(entry.color, centroids))
            .collect()
    } else {
        palette
            .iter()
            .map(|entry| nearest_centroid(entry.color, centroids))
            .collect()
    }
}

/// Weighted means from integer sums; an empty cluster keeps its center.
fn recompute_centroids(
    palette: &[PaletteEntry],
    assignments: &[usize],
    previous: &[[f64; 3]],
) -> Vec<[f64; 3]> {
    let mut sums = vec![[0u64; 3]; previous.len()];
    let mut counts = vec![0u64; previous.len()];
    for (entry, &cluster) in palette.iter().zip(assignments) {
        counts[cluster] += entry.weight;
        for (sum, &channel) in sums[cluster].iter_mut().zip(entry.color.iter()) {
            *sum += channel as u64 * entry.weight;
        }
    }
    sums.iter()
        .zip(counts.iter())
        .zip(previous.iter())
        .map(|((sum, &count), prev)| {
            if count == 0 {
                *prev
            } else {
                let n = count as f64;
                [sum[0] as f64 / n, sum[1] as f64 / n, sum[2] as f64 / n]
            }
        })
        .collect()
}

fn to_rgb(centroid: &[f64; 3]) -> RgbColor {
    let channel = |v: f64| v.round().clamp(0.0, 255.0) as u8;
    RgbColor::new(channel(centroid[0]), channel(centroid[1]), channel(centroid[2]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn striped(colors: &[[u8; 3]], repeat: usize) -> BgrImage {
        let mut rgb = Vec::new();
        for color in colors {
            for _ in 0..repeat {
                rgb.extend_from_slice(color);
            }
        }
        let width = (colors.len() * repeat) as u32;
        BgrImage::from_rgb(width, 1, &rgb).unwrap()
    }

    fn options(k: usize) -> DominantColorOptions {
        DominantColorOptions {
            k,
            ..DominantColorOptions::default()
        }
    }

    #[test]
    fn exact_colors_are_recovered() {
        let image = striped(&[[200, 10, 10], [10, 200, 10], [10, 10, 200]], 4);
        let mut colors = DominantColorExtractor::new(options(3))
            .extract(&image)
            .unwrap();
        colors.sort_by_key(|c| c.0);
        assert_eq!(
            colors,
            vec![
                RgbColor::new(10, 10, 200),
                RgbColor::new(10, 200, 10),
                RgbColor::new(200, 10, 10),
            ]
        );
    }

    #[test]
    fn clustering_is_reproducible() {
        let colors: Vec<[u8; 3]> = (0..40u8)
            .map(|i| [i.wrapping_mul(37), i.wrapping_mul(11), 255 - i * 3])
            .collect();
        let image = striped(&colors, 3);
        let extractor = DominantColorExtractor::new(options(5));
        let first = extractor.extract(&image).unwrap();
        let second = extractor.extract(&image).unwrap();
        assert_eq!(first.len(), 5);
        assert_eq!(first, second);
    }

    #[test]
    fn too_few_distinct_colors_is_an_error() {
        let image = striped(&[[1, 2, 3], [4, 5, 6]], 10);
        let err = DominantColorExtractor::new(options(5))
            .extract(&image)
            .unwrap_err();
        assert!(matches!(
            err,
            DescriptorError::InsufficientColors {
                required: 5,
                found: 2
            }
        ));
    }

    #[test]
    fn weighted_pick_skips_zero_weights() {
        let weights = [0u64, 3, 0, 2];
        assert_eq!(pick_weighted(weights.iter().copied(), 0), 1);
        assert_eq!(pick_weighted(weights.iter().copied(), 2), 1);
        assert_eq!(pick_weighted(weights.iter().copied(), 3), 3);
    }

    #[test]
    fn empty_cluster_keeps_previous_center() {
        let palette = vec![PaletteEntry {
            color: [10, 10, 10],
            weight: 2,
        }];
        let previous = [[10.0, 10.0, 10.0], [99.0, 99.0, 99.0]];
        let updated = recompute_centroids(&palette, &[0], &previous);
        assert_eq!(updated[1], [99.0, 99.0, 99.0]);
    }
}
