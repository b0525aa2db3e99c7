//! # Preprocess Module
//!
//! Turns encoded image bytes into the tensor a classification engine eats.
//!
//! ## How It Works
//! 1. Decode the buffer (any format the decoders understand)
//! 2. Convert to the channel layout the target shape asks for (RGB or luma)
//! 3. Resize to the target height and width with bilinear filtering
//! 4. Scale each byte into `[0, 1]` as `f32`
//!
//! The result is laid out exactly as the engine's `[1, H, W, C]` input
//! expects: row-major, channels interleaved per pixel.
//!
//! ## Performance Optimizations
//! - Uses `zune-jpeg` for 1.5-2x faster JPEG decoding
//! - Uses `fast_image_resize` for 5-14x faster SIMD-accelerated resizing

mod decode;

pub use decode::FastDecoder;

use crate::core::engine::{NumericTensor, TensorShape};
use crate::error::PreprocessError;
use fast_image_resize::{images::Image, PixelType, ResizeOptions, Resizer};
use image::DynamicImage;

/// Target dimensions unpacked from an engine input shape
struct TargetLayout {
    height: u32,
    width: u32,
    channels: u32,
}

/// Converts encoded image bytes into normalized float tensors.
///
/// Holds a reusable resizer; construct once and feed it every image.
pub struct Preprocessor {
    resizer: Resizer,
}

impl Preprocessor {
    pub fn new() -> Self {
        Self {
            resizer: Resizer::new(),
        }
    }

    /// Decode `image` and produce a float tensor matching `target`.
    ///
    /// `target` must be a `[1, H, W, C]` shape with `C` of 1 or 3 and no
    /// zero dimension. Every element of the result is in `[0, 1]`.
    pub fn preprocess(
        &mut self,
        image: &[u8],
        target: &TensorShape,
    ) -> Result<NumericTensor, PreprocessError> {
        let layout = unpack_target(target)?;
        let decoded = FastDecoder::decode(image)?;

        let data = self.resample(&decoded, &layout)?;
        let scaled: Vec<f32> = data.into_iter().map(|b| f32::from(b) / 255.0).collect();

        Ok(NumericTensor::from_f32(target.clone(), scaled))
    }

    /// Resize the decoded image to the target layout, returning interleaved
    /// bytes in row-major order.
    fn resample(
        &mut self,
        decoded: &DynamicImage,
        layout: &TargetLayout,
    ) -> Result<Vec<u8>, PreprocessError> {
        let (raw, src_width, src_height, pixel_type) = match layout.channels {
            1 => {
                let gray = decoded.to_luma8();
                let (w, h) = (gray.width(), gray.height());
                (gray.into_raw(), w, h, PixelType::U8)
            }
            _ => {
                let rgb = decoded.to_rgb8();
                let (w, h) = (rgb.width(), rgb.height());
                (rgb.into_raw(), w, h, PixelType::U8x3)
            }
        };

        if src_width == 0 || src_height == 0 {
            return Err(PreprocessError::Decode {
                reason: "decoded image has zero dimensions".to_string(),
            });
        }

        // Same-size input needs no resample
        if src_width == layout.width && src_height == layout.height {
            return Ok(raw);
        }

        let src_image = Image::from_vec_u8(src_width, src_height, raw, pixel_type).map_err(
            |e| PreprocessError::Resize {
                width: layout.width,
                height: layout.height,
                reason: format!("Failed to create source image: {}", e),
            },
        )?;

        let mut dst_image = Image::new(layout.width, layout.height, pixel_type);

        // Bilinear filter (good balance of speed and quality)
        let options = ResizeOptions::new().resize_alg(fast_image_resize::ResizeAlg::Convolution(
            fast_image_resize::FilterType::Bilinear,
        ));

        self.resizer
            .resize(&src_image, &mut dst_image, &options)
            .map_err(|e| PreprocessError::Resize {
                width: layout.width,
                height: layout.height,
                reason: e.to_string(),
            })?;

        Ok(dst_image.into_vec())
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate an engine input shape and unpack it into image dimensions.
fn unpack_target(shape: &TensorShape) -> Result<TargetLayout, PreprocessError> {
    let dims = shape.dims();

    if dims.len() != 4 {
        return Err(PreprocessError::UnsupportedShape {
            shape: shape.clone(),
            reason: format!("expected rank 4 [1, H, W, C], got rank {}", dims.len()),
        });
    }
    if dims[0] != 1 {
        return Err(PreprocessError::UnsupportedShape {
            shape: shape.clone(),
            reason: format!("batch dimension must be 1, got {}", dims[0]),
        });
    }
    if dims.iter().any(|&d| d == 0) {
        return Err(PreprocessError::UnsupportedShape {
            shape: shape.clone(),
            reason: "all dimensions must be non-zero".to_string(),
        });
    }

    let channels = dims[3];
    if channels != 1 && channels != 3 {
        return Err(PreprocessError::UnsupportedShape {
            shape: shape.clone(),
            reason: format!("channel count must be 1 or 3, got {}", channels),
        });
    }

    let as_u32 = |d: usize| {
        u32::try_from(d).map_err(|_| PreprocessError::UnsupportedShape {
            shape: shape.clone(),
            reason: format!("dimension {} exceeds u32 range", d),
        })
    };

    Ok(TargetLayout {
        height: as_u32(dims[1])?,
        width: as_u32(dims[2])?,
        channels: as_u32(channels)?,
    })
}
