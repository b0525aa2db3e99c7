//! Fast image decoding with format-specific optimizations.
//!
//! Uses zune-jpeg for JPEG buffers (1.5-2x faster than image crate),
//! falls back to image crate for other formats.

use crate::error::PreprocessError;
use image::{DynamicImage, ImageBuffer, Luma, Rgb, Rgba};
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// Fast image decoder over in-memory encoded bytes
pub struct FastDecoder;

impl FastDecoder {
    /// Decode an encoded image buffer using the fastest available decoder.
    ///
    /// - JPEG: Uses zune-jpeg (1.5-2x faster)
    /// - Other formats: Falls back to image crate
    pub fn decode(bytes: &[u8]) -> Result<DynamicImage, PreprocessError> {
        if Self::is_jpeg(bytes) {
            Self::decode_jpeg(bytes).or_else(|_| Self::decode_fallback(bytes))
        } else {
            Self::decode_fallback(bytes)
        }
    }

    /// Sniff the container format from the buffer contents. The caller has
    /// bytes, not a file path, so extension-based detection is out.
    fn is_jpeg(bytes: &[u8]) -> bool {
        matches!(image::guess_format(bytes), Ok(image::ImageFormat::Jpeg))
    }

    /// Fast JPEG decoding using zune-jpeg
    fn decode_jpeg(bytes: &[u8]) -> Result<DynamicImage, PreprocessError> {
        // Configure decoder to output RGB
        let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::RGB);
        let mut decoder = JpegDecoder::new_with_options(bytes, options);

        let pixels = decoder.decode().map_err(|e| PreprocessError::Decode {
            reason: format!("zune-jpeg decode failed: {:?}", e),
        })?;

        let info = decoder.info().ok_or_else(|| PreprocessError::Decode {
            reason: "Failed to get image info".to_string(),
        })?;

        let width = info.width as u32;
        let height = info.height as u32;

        // Get actual output colorspace after decoding
        let out_colorspace = decoder.get_output_colorspace().unwrap_or(ColorSpace::RGB);

        let image = match out_colorspace {
            ColorSpace::RGB => {
                let buffer: ImageBuffer<Rgb<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels).ok_or_else(|| {
                        PreprocessError::Decode {
                            reason: "Failed to create RGB buffer".to_string(),
                        }
                    })?;
                DynamicImage::ImageRgb8(buffer)
            }
            ColorSpace::RGBA => {
                let buffer: ImageBuffer<Rgba<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels).ok_or_else(|| {
                        PreprocessError::Decode {
                            reason: "Failed to create RGBA buffer".to_string(),
                        }
                    })?;
                DynamicImage::ImageRgba8(buffer)
            }
            ColorSpace::Luma => {
                let buffer: ImageBuffer<Luma<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels).ok_or_else(|| {
                        PreprocessError::Decode {
                            reason: "Failed to create Luma buffer".to_string(),
                        }
                    })?;
                DynamicImage::ImageLuma8(buffer)
            }
            _ => {
                // Unsupported colorspace, fall back to image crate
                return Self::decode_fallback(bytes);
            }
        };

        Ok(image)
    }

    /// Fallback to image crate for non-JPEG formats
    fn decode_fallback(bytes: &[u8]) -> Result<DynamicImage, PreprocessError> {
        image::load_from_memory(bytes).map_err(|e| PreprocessError::Decode {
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::jpeg::JpegEncoder;
    use std::io::Cursor;

    fn checkerboard(width: u32, height: u32) -> DynamicImage {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([255u8, 255, 255])
            } else {
                Rgb([0u8, 0, 0])
            }
        });
        DynamicImage::ImageRgb8(img)
    }

    fn encode_png(image: &DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn encode_jpeg(image: &DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut bytes, 90);
        image.write_with_encoder(encoder).unwrap();
        bytes
    }

    #[test]
    fn decodes_png_from_memory() {
        let original = checkerboard(6, 4);
        let decoded = FastDecoder::decode(&encode_png(&original)).unwrap();

        assert_eq!(decoded.width(), 6);
        assert_eq!(decoded.height(), 4);
    }

    #[test]
    fn decodes_jpeg_via_fast_path() {
        let original = checkerboard(16, 16);
        let bytes = encode_jpeg(&original);

        assert!(FastDecoder::is_jpeg(&bytes));

        let decoded = FastDecoder::decode(&bytes).unwrap();
        assert_eq!(decoded.width(), 16);
        assert_eq!(decoded.height(), 16);
    }

    #[test]
    fn png_is_not_sniffed_as_jpeg() {
        let bytes = encode_png(&checkerboard(4, 4));
        assert!(!FastDecoder::is_jpeg(&bytes));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let result = FastDecoder::decode(&[0x00, 0x01, 0x02, 0x03]);
        assert!(matches!(result, Err(PreprocessError::Decode { .. })));
    }

    #[test]
    fn empty_buffer_fails_to_decode() {
        assert!(FastDecoder::decode(&[]).is_err());
    }
}
