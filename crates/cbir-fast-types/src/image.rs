use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type ImageResult<T> = Result<T, ImageError>;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image has zero area ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("insufficient pixel bytes: got {len} expected {required}")]
    InsufficientData { len: usize, required: usize },

    #[error("calculated buffer length overflowed for {width}x{height}")]
    Overflow { width: u32, height: u32 },
}

/// Color plane of a [`BgrImage`], in stored order.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Blue,
    Green,
    Red,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Blue, Channel::Green, Channel::Red];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Blue => "blue",
            Channel::Green => "green",
            Channel::Red => "red",
        }
    }

    /// Byte offset of the channel inside one packed pixel.
    pub fn offset(&self) -> usize {
        match self {
            Channel::Blue => 0,
            Channel::Green => 1,
            Channel::Red => 2,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable, packed 8-bit BGR image. Clones share the pixel buffer.
#[derive(Clone)]
pub struct BgrImage {
    width: u32,
    height: u32,
    data: Arc<[u8]>,
}

impl fmt::Debug for BgrImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BgrImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl PartialEq for BgrImage {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height && self.data == other.data
    }
}

impl BgrImage {
    /// Wraps packed BGR bytes (`width * height * 3`, no row padding).
    pub fn from_owned(width: u32, height: u32, data: Vec<u8>) -> ImageResult<Self> {
        if width == 0 || height == 0 {
            return Err(ImageError::EmptyImage { width, height });
        }
        let required = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(3))
            .ok_or(ImageError::Overflow { width, height })?;
        if data.len() < required {
            return Err(ImageError::InsufficientData {
                len: data.len(),
                required,
            });
        }
        let mut data = data;
        data.truncate(required);
        Ok(Self {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
        })
    }

    /// Builds an image from packed RGB bytes, swapping into stored BGR order.
    pub fn from_rgb(width: u32, height: u32, rgb: &[u8]) -> ImageResult<Self> {
        let mut data = rgb.to_vec();
        for pixel in data.chunks_exact_mut(3) {
            pixel.swap(0, 2);
        }
        Self::from_owned(width, height, data)
    }

    /// Image where every pixel has the same BGR value.
    pub fn filled(width: u32, height: u32, bgr: [u8; 3]) -> ImageResult<Self> {
        let pixels = (width as usize).saturating_mul(height as usize);
        let mut data = Vec::with_capacity(pixels.saturating_mul(3));
        for _ in 0..pixels {
            data.extend_from_slice(&bgr);
        }
        Self::from_owned(width, height, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    pub fn channel_plane(&self, channel: Channel) -> Vec<u8> {
        self.data
            .chunks_exact(3)
            .map(|pixel| pixel[channel.offset()])
            .collect()
    }

    /// Pixels as `[r, g, b]` triples, row-major.
    pub fn rgb_samples(&self) -> Vec<[u8; 3]> {
        self.data
            .chunks_exact(3)
            .map(|pixel| [pixel[2], pixel[1], pixel[0]])
            .collect()
    }

    /// Packed RGB copy, row-major, for encoders.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        let mut rgb = self.data.to_vec();
        for pixel in rgb.chunks_exact_mut(3) {
            pixel.swap(0, 2);
        }
        rgb
    }

    pub fn to_gray(&self) -> GrayPlane {
        GrayPlane::from_bgr(self)
    }
}

/// Single-channel 8-bit plane derived from an image. May be empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayPlane {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl GrayPlane {
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> ImageResult<Self> {
        let required = width
            .checked_mul(height)
            .ok_or(ImageError::Overflow {
                width: width as u32,
                height: height as u32,
            })?;
        if data.len() != required {
            return Err(ImageError::InsufficientData {
                len: data.len(),
                required,
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Luma with the 8-bit fixed-point weights R 0.299, G 0.587, B 0.114.
    pub fn from_bgr(image: &BgrImage) -> Self {
        const SHIFT: u32 = 14;
        const B_W: u32 = 1868;
        const G_W: u32 = 9617;
        const R_W: u32 = 4899;
        let data = image
            .data()
            .chunks_exact(3)
            .map(|px| {
                let sum = px[0] as u32 * B_W + px[1] as u32 * G_W + px[2] as u32 * R_W;
                ((sum + (1 << (SHIFT - 1))) >> SHIFT) as u8
            })
            .collect();
        Self {
            width: image.width() as usize,
            height: image.height() as usize,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }
}
