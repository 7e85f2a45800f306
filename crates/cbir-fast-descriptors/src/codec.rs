use cbir_fast_types::BgrImage;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};

use crate::error::FingerprintError;

/// Decodes any format the `image` crate was built with into a BGR image.
pub fn decode_image(bytes: &[u8]) -> Result<BgrImage, FingerprintError> {
    let decoded = image::load_from_memory(bytes)?.to_rgb8();
    let (width, height) = decoded.dimensions();
    Ok(BgrImage::from_rgb(width, height, decoded.as_raw())?)
}

/// Lossless PNG bytes for an overlay artifact.
pub fn encode_png(image: &BgrImage) -> Result<Vec<u8>, FingerprintError> {
    let rgb = image.to_rgb_bytes();
    let mut encoded = Vec::new();
    let encoder = PngEncoder::new(&mut encoded);
    encoder.write_image(&rgb, image.width(), image.height(), ColorType::Rgb8)?;
    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_round_trip_keeps_channel_order() {
        let image = BgrImage::from_owned(2, 1, vec![255, 0, 0, 0, 0, 255]).unwrap();
        let bytes = encode_png(&image).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        let decoded = decode_image(&bytes).unwrap();
        assert_eq!(decoded, image);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(matches!(
            decode_image(b"not an image"),
            Err(FingerprintError::Decode(_))
        ));
    }
}
