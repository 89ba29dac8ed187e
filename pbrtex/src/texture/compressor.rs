//! Per-image encoders.
//!
//! The [`BlockCompressor`] trait is the seam to the compression SDK: it turns
//! one [`Surface`] into the bytes of one image in the plan's format. The
//! default implementation uses `intel_tex_2` (ISPC texture compressor) for
//! the block formats and packs raw formats itself.

use half::f16;
use intel_tex_2::{bc3, bc4, bc6h, bc7, RSurface, RgbaSurface};

use super::format::{CompressionPlan, Effort, TextureFormat};
use super::TextureError;
use crate::surface::{Surface, WrapMode};

/// Encodes a single image.
///
/// Implementations must be thread-safe; the dispatcher holds them as
/// `Box<dyn BlockCompressor>`.
pub trait BlockCompressor: Send + Sync {
    /// Encode `surface` according to `plan`.
    ///
    /// The returned buffer is exactly `plan.format.image_size(w, h)` bytes.
    fn compress(&self, surface: &Surface, plan: &CompressionPlan) -> Result<Vec<u8>, TextureError>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

/// [`BlockCompressor`] backed by `intel_tex_2`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntelTexCompressor;

impl IntelTexCompressor {
    pub fn new() -> Self {
        Self
    }
}

impl BlockCompressor for IntelTexCompressor {
    fn compress(&self, surface: &Surface, plan: &CompressionPlan) -> Result<Vec<u8>, TextureError> {
        if surface.width() == 0 || surface.height() == 0 {
            return Err(TextureError::InvalidDimensions {
                width: surface.width(),
                height: surface.height(),
                reason: "empty image".to_string(),
            });
        }

        let encoded = match plan.format {
            TextureFormat::Rgba8 => surface.to_rgba8(),
            TextureFormat::R8 => surface.to_r8(),
            TextureFormat::Rgba16Float => f16_bytes(&surface.to_rgba_f16()),
            TextureFormat::Bc3 => {
                let padded = pad_to_blocks(surface);
                let data = padded.to_rgba8();
                bc3::compress_blocks(&rgba_surface(&padded, &data, 4))
            }
            TextureFormat::Bc7 => {
                let padded = pad_to_blocks(surface);
                let data = padded.to_rgba8();
                let settings = match plan.effort {
                    Effort::Thorough => bc7::alpha_basic_settings(),
                    Effort::Fast => bc7::alpha_ultra_fast_settings(),
                };
                bc7::compress_blocks(&settings, &rgba_surface(&padded, &data, 4))
            }
            TextureFormat::Bc6h => {
                let padded = pad_to_blocks(surface);
                let data = f16_bytes(&padded.to_rgba_f16());
                let settings = match plan.effort {
                    Effort::Thorough => bc6h::basic_settings(),
                    Effort::Fast => bc6h::very_fast_settings(),
                };
                bc6h::compress_blocks(&settings, &rgba_surface(&padded, &data, 8))
            }
            TextureFormat::Bc4 => {
                let padded = pad_to_blocks(surface);
                let data = padded.to_r8();
                bc4::compress_blocks(&RSurface {
                    data: &data,
                    width: padded.width(),
                    height: padded.height(),
                    stride: padded.width(),
                })
            }
        };

        let expected = plan.format.image_size(surface.width(), surface.height());
        if encoded.len() != expected {
            return Err(TextureError::EncodingFailed(format!(
                "{} encoder produced {} bytes for {}×{}, expected {}",
                plan.format,
                encoded.len(),
                surface.width(),
                surface.height(),
                expected
            )));
        }

        Ok(encoded)
    }

    fn name(&self) -> &str {
        "intel_tex_2"
    }
}

fn rgba_surface<'a>(surface: &Surface, data: &'a [u8], bytes_per_pixel: u32) -> RgbaSurface<'a> {
    RgbaSurface {
        data,
        width: surface.width(),
        height: surface.height(),
        stride: surface.width() * bytes_per_pixel,
    }
}

fn f16_bytes(values: &[f16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Pad a surface to multiples of 4 by replicating its edge texels.
///
/// Surfaces that are already aligned are returned unchanged.
pub fn pad_to_blocks(surface: &Surface) -> Surface {
    let width = surface.width().div_ceil(4) * 4;
    let height = surface.height().div_ceil(4) * 4;
    if width == surface.width() && height == surface.height() {
        return surface.clone();
    }

    let max_x = surface.width() - 1;
    let max_y = surface.height() - 1;

    let mut padded = Surface::new(width, height)
        .with_wrap_mode(WrapMode::Clamp)
        .with_alpha_mode(surface.alpha_mode())
        .with_normal_map(surface.is_normal_map());
    for (i, texel) in padded.pixels_mut().iter_mut().enumerate() {
        let x = (i as u32 % width).min(max_x);
        let y = (i as u32 / width).min(max_y);
        *texel = surface.pixel(x, y);
    }
    padded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{QualityMode, TextureRole};
    use glam::Vec4;

    fn checker(size: u32) -> Surface {
        let pixels = (0..size * size)
            .map(|i| {
                if (i % size + i / size) % 2 == 0 {
                    Vec4::new(1.0, 0.5, 0.25, 1.0)
                } else {
                    Vec4::new(0.0, 0.25, 0.5, 0.5)
                }
            })
            .collect();
        Surface::from_pixels(size, size, pixels).unwrap()
    }

    #[test]
    fn test_pad_to_blocks_replicates_edges() {
        let surface = Surface::from_pixels(
            2,
            1,
            vec![Vec4::splat(0.1), Vec4::splat(0.9)],
        )
        .unwrap();
        let padded = pad_to_blocks(&surface);
        assert_eq!((padded.width(), padded.height()), (4, 4));
        assert_eq!(padded.pixel(0, 3), Vec4::splat(0.1));
        assert_eq!(padded.pixel(3, 0), Vec4::splat(0.9));
        assert_eq!(padded.pixel(3, 3), Vec4::splat(0.9));
    }

    #[test]
    fn test_pad_to_blocks_keeps_aligned_surface() {
        let surface = checker(8);
        assert_eq!(pad_to_blocks(&surface), surface);
    }

    #[test]
    fn test_raw_rgba8() {
        let plan = CompressionPlan::resolve(TextureRole::AlbedoRoughness, QualityMode::NoCompression);
        let surface = Surface::from_pixels(1, 1, vec![Vec4::new(1.0, 0.0, 0.5, 1.0)]).unwrap();
        let bytes = IntelTexCompressor::new().compress(&surface, &plan).unwrap();
        assert_eq!(bytes, vec![255, 0, 128, 255]);
    }

    #[test]
    fn test_raw_rgba16f() {
        let plan = CompressionPlan::resolve(TextureRole::Irradiance, QualityMode::Production);
        let surface = Surface::from_pixels(1, 1, vec![Vec4::new(2.0, 0.0, 0.5, 1.0)]).unwrap();
        let bytes = IntelTexCompressor::new().compress(&surface, &plan).unwrap();
        assert_eq!(bytes.len(), 8);
        assert_eq!(&bytes[0..2], &f16::from_f32(2.0).to_le_bytes());
        assert_eq!(&bytes[6..8], &f16::from_f32(1.0).to_le_bytes());
    }

    #[test]
    fn test_block_formats_produce_expected_sizes() {
        let compressor = IntelTexCompressor::new();
        let cases = [
            (TextureRole::AlbedoRoughness, QualityMode::Production),
            (TextureRole::AlbedoRoughness, QualityMode::Development),
            (TextureRole::Parallax, QualityMode::Production),
            (TextureRole::Environment, QualityMode::Production),
            (TextureRole::Prefilter, QualityMode::Development),
        ];
        for (role, quality) in cases {
            let plan = CompressionPlan::resolve(role, quality);
            for size in [8, 2, 1] {
                let bytes = compressor.compress(&checker(size), &plan).unwrap();
                assert_eq!(
                    bytes.len(),
                    plan.format.image_size(size, size),
                    "{} at {}",
                    plan.format,
                    size
                );
            }
        }
    }

    #[test]
    fn test_empty_surface_is_rejected() {
        let plan = CompressionPlan::resolve(TextureRole::Parallax, QualityMode::NoCompression);
        let err = IntelTexCompressor::new()
            .compress(&Surface::new(0, 0), &plan)
            .unwrap_err();
        assert!(matches!(err, TextureError::InvalidDimensions { .. }));
    }
}
