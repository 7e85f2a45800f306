use cbir_fast_types::{GrayPlane, HU_MOMENT_COUNT};

use super::contours::Point;

/// Raw spatial moments up to third order.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpatialMoments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
    pub m20: f64,
    pub m11: f64,
    pub m02: f64,
    pub m30: f64,
    pub m21: f64,
    pub m12: f64,
    pub m03: f64,
}

impl SpatialMoments {
    /// Moments of the region enclosed by a closed polygon (Green's theorem).
    /// Orientation does not matter; the area term is always non-negative.
    pub fn from_polygon(points: &[Point]) -> Self {
        let Some(last) = points.last() else {
            return Self::default();
        };
        let (mut a00, mut a10, mut a01, mut a20, mut a11, mut a02) = (0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let (mut a30, mut a21, mut a12, mut a03) = (0.0, 0.0, 0.0, 0.0);

        let mut xp = last.x as f64;
        let mut yp = last.y as f64;
        let mut xp2 = xp * xp;
        let mut yp2 = yp * yp;

        for point in points {
            let x = point.x as f64;
            let y = point.y as f64;
            let x2 = x * x;
            let y2 = y * y;
            let dxy = xp * y - x * yp;
            let xs = xp + x;
            let ys = yp + y;

            a00 += dxy;
            a10 += dxy * xs;
            a01 += dxy * ys;
            a20 += dxy * (xp * xs + x2);
            a11 += dxy * (xp * (ys + yp) + x * (ys + y));
            a02 += dxy * (yp * ys + y2);
            a30 += dxy * xs * (xp2 + x2);
            a03 += dxy * ys * (yp2 + y2);
            a21 += dxy * (xp2 * (3.0 * yp + y) + 2.0 * x * xp * ys + x2 * (yp + 3.0 * y));
            a12 += dxy * (yp2 * (3.0 * xp + x) + 2.0 * y * yp * xs + y2 * (xp + 3.0 * x));

            xp = x;
            yp = y;
            xp2 = x2;
            yp2 = y2;
        }

        if a00.abs() <= f32::EPSILON as f64 {
            return Self::default();
        }
        let sign = a00.signum();
        Self {
            m00: sign * a00 / 2.0,
            m10: sign * a10 / 6.0,
            m01: sign * a01 / 6.0,
            m20: sign * a20 / 12.0,
            m11: sign * a11 / 24.0,
            m02: sign * a02 / 12.0,
            m30: sign * a30 / 20.0,
            m21: sign * a21 / 60.0,
            m12: sign * a12 / 60.0,
            m03: sign * a03 / 20.0,
        }
    }

    /// Intensity-weighted moments of a grayscale plane.
    pub fn from_raster(plane: &GrayPlane) -> Self {
        let mut moments = Self::default();
        let width = plane.width();
        if width == 0 {
            return moments;
        }
        for (y, row) in plane.data().chunks_exact(width).enumerate() {
            let y = y as f64;
            let (mut r0, mut r1, mut r2, mut r3) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
            for (x, &value) in row.iter().enumerate() {
                let v = value as f64;
                let x = x as f64;
                r0 += v;
                r1 += v * x;
                r2 += v * x * x;
                r3 += v * x * x * x;
            }
            moments.m00 += r0;
            moments.m10 += r1;
            moments.m01 += r0 * y;
            moments.m20 += r2;
            moments.m11 += r1 * y;
            moments.m02 += r0 * y * y;
            moments.m30 += r3;
            moments.m21 += r2 * y;
            moments.m12 += r1 * y * y;
            moments.m03 += r0 * y * y * y;
        }
        moments
    }

    /// Scale-normalized central moments `(nu20, nu11, nu02, nu30, nu21, nu12, nu03)`.
    fn normalized_central(&self) -> [f64; 7] {
        let m = self;
        let (cx, cy) = (m.m10 / m.m00, m.m01 / m.m00);
        let mu20 = m.m20 - m.m10 * cx;
        let mu11 = m.m11 - m.m10 * cy;
        let mu02 = m.m02 - m.m01 * cy;
        let mu30 = m.m30 - cx * (3.0 * mu20 + cx * m.m10);
        let mu21 = m.m21 - cx * (2.0 * mu11 + cx * m.m01) - cy * mu20;
        let mu12 = m.m12 - cy * (2.0 * mu11 + cy * m.m10) - cx * mu02;
        let mu03 = m.m03 - cy * (3.0 * mu02 + cy * m.m01);

        let inv_m00 = 1.0 / m.m00;
        let s2 = inv_m00 * inv_m00;
        let s3 = s2 * inv_m00.abs().sqrt();
        [
            mu20 * s2,
            mu11 * s2,
            mu02 * s2,
            mu30 * s3,
            mu21 * s3,
            mu12 * s3,
            mu03 * s3,
        ]
    }

    /// The seven Hu invariants, or `None` when the region has no mass.
    pub fn hu(&self) -> Option<[f64; HU_MOMENT_COUNT]> {
        if self.m00.abs() <= f64::EPSILON || !self.m00.is_finite() {
            return None;
        }
        let [nu20, nu11, nu02, nu30, nu21, nu12, nu03] = self.normalized_central();

        let mut t0 = nu30 + nu12;
        let mut t1 = nu21 + nu03;
        let q0 = t0 * t0;
        let q1 = t1 * t1;
        let n4 = 4.0 * nu11;
        let s = nu20 + nu02;
        let d = nu20 - nu02;

        let h0 = s;
        let h1 = d * d + n4 * nu11;
        let h3 = q0 + q1;
        let h5 = d * (q0 - q1) + n4 * t0 * t1;

        t0 *= q0 - 3.0 * q1;
        t1 *= 3.0 * q0 - q1;
        let p0 = nu30 - 3.0 * nu12;
        let p1 = 3.0 * nu21 - nu03;

        let h2 = p0 * p0 + p1 * p1;
        let h4 = p0 * t0 + p1 * t1;
        let h6 = p1 * t0 - p0 * t1;
        Some([h0, h1, h2, h3, h4, h5, h6])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<Point> {
        vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ]
    }

    #[test]
    fn polygon_area_and_centroid() {
        let m = SpatialMoments::from_polygon(&rect(2, 4, 6, 6));
        assert!((m.m00 - 8.0).abs() < 1e-12);
        assert!((m.m10 / m.m00 - 4.0).abs() < 1e-12);
        assert!((m.m01 / m.m00 - 5.0).abs() < 1e-12);
    }

    #[test]
    fn orientation_does_not_change_moments() {
        let clockwise = rect(0, 0, 5, 3);
        let mut counter = clockwise.clone();
        counter.reverse();
        assert_eq!(
            SpatialMoments::from_polygon(&clockwise),
            SpatialMoments::from_polygon(&counter)
        );
    }

    #[test]
    fn hu_is_translation_and_scale_invariant() {
        let a = SpatialMoments::from_polygon(&rect(0, 0, 4, 2)).hu().unwrap();
        let b = SpatialMoments::from_polygon(&rect(10, 20, 18, 24)).hu().unwrap();
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-9, "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn square_first_invariant_is_one_sixth() {
        let hu = SpatialMoments::from_polygon(&rect(0, 0, 10, 10)).hu().unwrap();
        assert!((hu[0] - 1.0 / 6.0).abs() < 1e-12);
        assert!(hu[1].abs() < 1e-12);
    }

    #[test]
    fn degenerate_polygon_has_no_invariants() {
        let line = vec![Point::new(0, 0), Point::new(5, 0)];
        assert_eq!(SpatialMoments::from_polygon(&line).hu(), None);
        assert_eq!(SpatialMoments::from_polygon(&[]).hu(), None);
    }

    #[test]
    fn raster_moments_weight_by_intensity() {
        let plane = GrayPlane::new(2, 1, vec![0, 10]).unwrap();
        let m = SpatialMoments::from_raster(&plane);
        assert_eq!(m.m00, 10.0);
        assert_eq!(m.m10, 10.0);
        assert_eq!(m.m01, 0.0);
    }
}
