//! Byte-level helpers for callers that move images over a wire: decode an
//! upload into the pipeline's RGB form and re-encode the result.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ImageEncoder, ImageFormat, RgbImage};

use crate::error::AnonymizeError;

/// JPEG re-encode quality. The pipeline's output has already been through
/// two low-pass stages, so high quality costs little.
const JPEG_QUALITY: u8 = 90;

/// Encodable output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Lossless PNG.
    #[default]
    Png,
    /// Lossy JPEG.
    Jpeg,
}

impl OutputFormat {
    /// Pick the output format matching the input bytes, so a caller can
    /// re-encode to whatever format the image arrived in.
    pub fn from_input(input: &[u8]) -> Result<Self, AnonymizeError> {
        match detect_format(input)? {
            ImageFormat::Png => Ok(OutputFormat::Png),
            ImageFormat::Jpeg => Ok(OutputFormat::Jpeg),
            _ => Err(AnonymizeError::UnsupportedFormat),
        }
    }
}

/// Detect the image format from raw bytes.
pub fn detect_format(input: &[u8]) -> Result<ImageFormat, AnonymizeError> {
    image::guess_format(input).map_err(|e| AnonymizeError::Decode(e.to_string()))
}

/// Decode raw bytes into an 8-bit RGB buffer.
pub fn decode_rgb(input: &[u8]) -> Result<RgbImage, AnonymizeError> {
    let decoded =
        image::load_from_memory(input).map_err(|e| AnonymizeError::Decode(e.to_string()))?;

    if decoded.width() == 0 || decoded.height() == 0 {
        return Err(AnonymizeError::Decode("image dimensions are zero".into()));
    }

    Ok(decoded.to_rgb8())
}

/// Encode an RGB buffer to the given format.
pub fn encode(image: &RgbImage, format: OutputFormat) -> Result<Vec<u8>, AnonymizeError> {
    let mut buffer = Vec::new();

    match format {
        OutputFormat::Png => {
            let encoder = PngEncoder::new(&mut buffer);
            encoder
                .write_image(
                    image.as_raw(),
                    image.width(),
                    image.height(),
                    image::ExtendedColorType::Rgb8,
                )
                .map_err(|e| AnonymizeError::Encode(e.to_string()))?;
        }
        OutputFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY);
            encoder
                .write_image(
                    image.as_raw(),
                    image.width(),
                    image.height(),
                    image::ExtendedColorType::Rgb8,
                )
                .map_err(|e| AnonymizeError::Encode(e.to_string()))?;
        }
    }

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_rgb(width: u32, height: u32) -> RgbImage {
        let mut img = RgbImage::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = image::Rgb([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                128,
            ]);
        }
        img
    }

    #[test]
    fn encode_png_produces_valid_output() {
        let img = make_test_rgb(32, 24);
        let data = encode(&img, OutputFormat::Png).unwrap();
        assert_eq!(&data[1..4], b"PNG");
    }

    #[test]
    fn encode_jpeg_produces_valid_output() {
        let img = make_test_rgb(32, 24);
        let data = encode(&img, OutputFormat::Jpeg).unwrap();
        assert_eq!(data[0], 0xFF);
        assert_eq!(data[1], 0xD8);
    }

    #[test]
    fn png_round_trip_is_lossless() {
        let img = make_test_rgb(32, 24);
        let data = encode(&img, OutputFormat::Png).unwrap();
        let decoded = decode_rgb(&data).unwrap();
        assert_eq!(decoded.as_raw(), img.as_raw());
    }

    #[test]
    fn decode_rejects_garbage() {
        let result = decode_rgb(b"not an image");
        assert!(matches!(result, Err(AnonymizeError::Decode(_))));
    }

    #[test]
    fn output_format_follows_input_format() {
        let img = make_test_rgb(8, 8);
        let png = encode(&img, OutputFormat::Png).unwrap();
        let jpeg = encode(&img, OutputFormat::Jpeg).unwrap();
        assert_eq!(OutputFormat::from_input(&png).unwrap(), OutputFormat::Png);
        assert_eq!(OutputFormat::from_input(&jpeg).unwrap(), OutputFormat::Jpeg);
    }

    #[test]
    fn output_format_rejects_unsupported_input() {
        // A valid GIF header that the anonymization glue never re-encodes to
        let gif = b"GIF89a\x01\x00\x01\x00\x00\x00\x00";
        assert!(matches!(
            OutputFormat::from_input(gif),
            Err(AnonymizeError::UnsupportedFormat)
        ));
    }
}
