use cbir_fast_types::{BgrImage, ImageResult};

use super::contours::Contour;

pub const CONTOUR_GREEN: [u8; 3] = [0, 255, 0];
pub const CONTOUR_RED: [u8; 3] = [0, 0, 255];
pub const CONTOUR_THICKNESS: usize = 2;

/// Private BGR copy of an image that outlines are painted onto.
pub struct OverlayCanvas {
    width: usize,
    height: usize,
    buffer: Vec<u8>,
}

impl OverlayCanvas {
    pub fn from_image(image: &BgrImage) -> Self {
        Self {
            width: image.width() as usize,
            height: image.height() as usize,
            buffer: image.data().to_vec(),
        }
    }

    pub fn draw_contours(&mut self, contours: &[Contour], color: [u8; 3], thickness: usize) {
        for contour in contours {
            self.draw_contour(contour, color, thickness);
        }
    }

    /// Stamps every boundary point. Consecutive points of a traced contour
    /// are 8-adjacent, so the outline stays connected.
    pub fn draw_contour(&mut self, contour: &Contour, color: [u8; 3], thickness: usize) {
        let thickness = stamp_size(thickness, self.width, self.height);
        let lo = (thickness as i32 - 1) / 2;
        let hi = thickness as i32 / 2;
        for point in &contour.points {
            for dy in -lo..=hi {
                for dx in -lo..=hi {
                    self.tint_pixel(point.x + dx, point.y + dy, color);
                }
            }
        }
    }

    fn tint_pixel(&mut self, x: i32, y: i32, color: [u8; 3]) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let idx = (y as usize * self.width + x as usize) * 3;
        self.buffer[idx..idx + 3].copy_from_slice(&color);
    }

    pub fn into_image(self) -> ImageResult<BgrImage> {
        BgrImage::from_owned(self.width as u32, self.height as u32, self.buffer)
    }
}

fn stamp_size(requested: usize, width: usize, height: usize) -> usize {
    requested.max(1).min(width.max(height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::contours::Point;

    #[test]
    fn drawing_leaves_source_untouched() {
        let image = BgrImage::filled(4, 4, [10, 10, 10]).unwrap();
        let mut canvas = OverlayCanvas::from_image(&image);
        let contour = Contour {
            points: vec![Point::new(1, 1), Point::new(2, 1)],
        };
        canvas.draw_contour(&contour, CONTOUR_GREEN, 1);
        let overlay = canvas.into_image().unwrap();
        assert_eq!(overlay.pixel(1, 1), CONTOUR_GREEN);
        assert_eq!(overlay.pixel(2, 1), CONTOUR_GREEN);
        assert_eq!(overlay.pixel(0, 0), [10, 10, 10]);
        assert_eq!(image.pixel(1, 1), [10, 10, 10]);
    }

    #[test]
    fn thick_stamps_are_clipped_at_the_border() {
        let image = BgrImage::filled(3, 3, [0, 0, 0]).unwrap();
        let mut canvas = OverlayCanvas::from_image(&image);
        let contour = Contour {
            points: vec![Point::new(2, 2)],
        };
        canvas.draw_contour(&contour, CONTOUR_RED, CONTOUR_THICKNESS);
        let overlay = canvas.into_image().unwrap();
        assert_eq!(overlay.pixel(2, 2), CONTOUR_RED);
        assert_eq!(overlay.pixel(1, 1), [0, 0, 0]);
    }
}
