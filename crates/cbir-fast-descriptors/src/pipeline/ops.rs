use rayon::prelude::*;

// Rows per rayon task when filtering; small images stay on one thread.
const PARALLEL_MIN_ROWS: usize = 64;

/// Border index with `BORDER_REFLECT_101` semantics (`gfedcb|abcdefgh|gfedcba`).
#[inline]
pub fn reflect_101(mut index: isize, len: usize) -> usize {
    let len = len as isize;
    if len <= 1 {
        return 0;
    }
    loop {
        if index < 0 {
            index = -index;
        } else if index >= len {
            index = 2 * len - 2 - index;
        } else {
            return index as usize;
        }
    }
}

/// Copies `pixels` into a buffer padded by `radius` on every side, filling
/// the border by reflection.
pub fn pad_reflect_101(pixels: &[u8], width: usize, height: usize, radius: usize) -> Vec<f32> {
    debug_assert_eq!(pixels.len(), width * height);
    let padded_w = width + 2 * radius;
    let padded_h = height + 2 * radius;
    let mut padded = vec![0.0f32; padded_w * padded_h];
    for py in 0..padded_h {
        let sy = reflect_101(py as isize - radius as isize, height);
        let row = &pixels[sy * width..(sy + 1) * width];
        let dst = &mut padded[py * padded_w..(py + 1) * padded_w];
        for (px, value) in dst.iter_mut().enumerate() {
            let sx = reflect_101(px as isize - radius as isize, width);
            *value = row[sx] as f32;
        }
    }
    padded
}

/// Correlates an 8-bit plane with a square kernel (no kernel flip).
pub fn filter2d(pixels: &[u8], width: usize, height: usize, kernel: &[f32], ksize: usize) -> Vec<f32> {
    debug_assert_eq!(kernel.len(), ksize * ksize);
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let radius = ksize / 2;
    let padded = pad_reflect_101(pixels, width, height, radius);
    let padded_w = width + 2 * radius;
    let mut output = vec![0.0f32; width * height];

    let filter_row = |y: usize, out_row: &mut [f32]| {
        for (x, out) in out_row.iter_mut().enumerate() {
            let mut sum = 0.0f32;
            for ky in 0..ksize {
                let src = &padded[(y + ky) * padded_w + x..(y + ky) * padded_w + x + ksize];
                let taps = &kernel[ky * ksize..(ky + 1) * ksize];
                for (a, b) in src.iter().zip(taps) {
                    sum += a * b;
                }
            }
            *out = sum;
        }
    };

    if height >= PARALLEL_MIN_ROWS {
        output
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| filter_row(y, row));
    } else {
        for (y, row) in output.chunks_mut(width).enumerate() {
            filter_row(y, row);
        }
    }
    output
}

/// Rounds and clamps to the 8-bit range.
#[inline]
pub fn saturate_u8(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 255.0) as u8
}

/// Horizontal and vertical 3x3 Sobel derivatives with reflected borders.
pub fn sobel_gradients(pixels: &[u8], width: usize, height: usize) -> (Vec<f32>, Vec<f32>) {
    debug_assert_eq!(pixels.len(), width * height);
    if width == 0 || height == 0 {
        return (Vec::new(), Vec::new());
    }
    let padded = pad_reflect_101(pixels, width, height, 1);
    let pw = width + 2;
    let at = |x: usize, y: usize| padded[y * pw + x];
    let mut gx = vec![0.0f32; pixels.len()];
    let mut gy = vec![0.0f32; pixels.len()];
    for y in 0..height {
        for x in 0..width {
            // (x + 1, y + 1) is the centre pixel inside the padded buffer.
            let (cx, cy) = (x + 1, y + 1);
            let idx = y * width + x;
            gx[idx] = at(cx + 1, cy - 1) + 2.0 * at(cx + 1, cy) + at(cx + 1, cy + 1)
                - at(cx - 1, cy - 1)
                - 2.0 * at(cx - 1, cy)
                - at(cx - 1, cy + 1);
            gy[idx] = at(cx - 1, cy + 1) + 2.0 * at(cx, cy + 1) + at(cx + 1, cy + 1)
                - at(cx - 1, cy - 1)
                - 2.0 * at(cx, cy - 1)
                - at(cx + 1, cy - 1);
        }
    }
    (gx, gy)
}

/// Euclidean gradient magnitude.
pub fn sobel_magnitude(pixels: &[u8], width: usize, height: usize) -> Vec<f32> {
    let (gx, gy) = sobel_gradients(pixels, width, height);
    gx.iter()
        .zip(gy.iter())
        .map(|(dx, dy)| (dx * dx + dy * dy).sqrt())
        .collect()
}

/// Min-max normalization onto `[0, 255]`. A flat input maps to zeros.
pub fn normalize_minmax(values: &[f32]) -> Vec<u8> {
    if values.is_empty() {
        return Vec::new();
    }
    let mut min_value = values[0];
    let mut max_value = values[0];
    for &v in values.iter().skip(1) {
        min_value = min_value.min(v);
        max_value = max_value.max(v);
    }
    let range = max_value - min_value;
    if range <= f32::EPSILON {
        return vec![0; values.len()];
    }
    let scale = 255.0 / range;
    values
        .iter()
        .map(|&v| saturate_u8((v - min_value) * scale))
        .collect()
}

/// Binary mask: 1 where the value is strictly above `threshold`.
pub fn threshold_binary(values: &[u8], threshold: u8) -> Vec<u8> {
    values.iter().map(|&v| u8::from(v > threshold)).collect()
}

pub fn histogram_256(values: &[u8]) -> [u64; 256] {
    let mut hist = [0u64; 256];
    for &v in values {
        hist[v as usize] += 1;
    }
    hist
}

/// Otsu's threshold: the level maximizing between-class variance.
///
/// Returns 0 when no split exists (e.g. a single populated level).
pub fn otsu_threshold(values: &[u8]) -> u8 {
    if values.is_empty() {
        return 0;
    }
    let hist = histogram_256(values);
    let scale = 1.0 / values.len() as f64;
    let mu: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &count)| i as f64 * count as f64)
        .sum::<f64>()
        * scale;

    let mut q1 = 0.0f64;
    let mut mu1 = 0.0f64;
    let mut max_sigma = 0.0f64;
    let mut best = 0u8;
    for (i, &count) in hist.iter().enumerate() {
        let p_i = count as f64 * scale;
        mu1 *= q1;
        q1 += p_i;
        let q2 = 1.0 - q1;
        if q1.min(q2) < f32::EPSILON as f64 || q1.max(q2) > 1.0 - f32::EPSILON as f64 {
            continue;
        }
        mu1 = (mu1 + i as f64 * p_i) / q1;
        let mu2 = (mu - q1 * mu1) / q2;
        let sigma = q1 * q2 * (mu1 - mu2) * (mu1 - mu2);
        if sigma > max_sigma {
            max_sigma = sigma;
            best = i as u8;
        }
    }
    best
}

pub fn is_uniform(values: &[u8]) -> bool {
    match values.first() {
        Some(&first) => values.iter().all(|&v| v == first),
        None => true,
    }
}
