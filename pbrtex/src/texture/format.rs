//! Output formats and the (role, quality) → plan table.

use std::fmt;

use ddsfile::DxgiFormat;

use crate::material::{QualityMode, TextureRole};

/// Pixel format of a compiled texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Bc3,
    Bc4,
    Bc6h,
    Bc7,
    Rgba8,
    R8,
    Rgba16Float,
}

impl TextureFormat {
    /// DXGI format written to the container header.
    pub fn dxgi_format(self) -> DxgiFormat {
        match self {
            TextureFormat::Bc3 => DxgiFormat::BC3_UNorm,
            TextureFormat::Bc4 => DxgiFormat::BC4_UNorm,
            TextureFormat::Bc6h => DxgiFormat::BC6H_UF16,
            TextureFormat::Bc7 => DxgiFormat::BC7_UNorm,
            TextureFormat::Rgba8 => DxgiFormat::R8G8B8A8_UNorm,
            TextureFormat::R8 => DxgiFormat::R8_UNorm,
            TextureFormat::Rgba16Float => DxgiFormat::R16G16B16A16_Float,
        }
    }

    /// True for the 4×4 block-compressed formats.
    pub fn is_block_compressed(self) -> bool {
        self.block_bytes().is_some()
    }

    /// Bytes per 4×4 block, `None` for raw formats.
    pub fn block_bytes(self) -> Option<usize> {
        match self {
            TextureFormat::Bc4 => Some(8),
            TextureFormat::Bc3 | TextureFormat::Bc6h | TextureFormat::Bc7 => Some(16),
            _ => None,
        }
    }

    /// Bytes per pixel for raw formats, `None` for block formats.
    pub fn pixel_bytes(self) -> Option<usize> {
        match self {
            TextureFormat::R8 => Some(1),
            TextureFormat::Rgba8 => Some(4),
            TextureFormat::Rgba16Float => Some(8),
            _ => None,
        }
    }

    /// Encoded size of one image of the given dimensions.
    ///
    /// Block formats round each side up to a multiple of 4.
    pub fn image_size(self, width: u32, height: u32) -> usize {
        match (self.block_bytes(), self.pixel_bytes()) {
            (Some(block), _) => {
                width.div_ceil(4) as usize * height.div_ceil(4) as usize * block
            }
            (None, Some(pixel)) => width as usize * height as usize * pixel,
            (None, None) => 0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TextureFormat::Bc3 => "BC3",
            TextureFormat::Bc4 => "BC4",
            TextureFormat::Bc6h => "BC6H",
            TextureFormat::Bc7 => "BC7",
            TextureFormat::Rgba8 => "R8G8B8A8",
            TextureFormat::R8 => "R8",
            TextureFormat::Rgba16Float => "R16G16B16A16F",
        }
    }
}

impl fmt::Display for TextureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Channels carried by the encoded data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    Rgba,
    R,
}

/// Interpretation of channel values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelType {
    UnsignedNorm,
    Float,
}

/// How hard the block encoder searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effort {
    /// Slow, high quality.
    Thorough,
    /// Fast, low quality.
    Fast,
}

/// Everything the encoder needs to know about one output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionPlan {
    pub format: TextureFormat,
    pub bits_per_channel: u32,
    pub channel_layout: ChannelLayout,
    pub pixel_type: PixelType,
    pub effort: Effort,
}

impl CompressionPlan {
    /// Resolve the plan for an output role at a quality mode.
    pub fn resolve(role: TextureRole, quality: QualityMode) -> Self {
        use QualityMode::*;
        use TextureFormat::*;

        let format = match (role, quality) {
            (TextureRole::AlbedoRoughness | TextureRole::NormalMetalnessAo, Production) => Bc7,
            (TextureRole::AlbedoRoughness | TextureRole::NormalMetalnessAo, Development) => Bc3,
            (TextureRole::AlbedoRoughness | TextureRole::NormalMetalnessAo, NoCompression) => {
                Rgba8
            }
            (TextureRole::Parallax, Production | Development) => Bc4,
            (TextureRole::Parallax, NoCompression) => R8,
            (TextureRole::Environment, Production) => Bc6h,
            (TextureRole::Environment, Development) => Bc3,
            (TextureRole::Environment, NoCompression) => Rgba16Float,
            (TextureRole::Irradiance, _) => Rgba16Float,
            (TextureRole::Prefilter, Production | Development) => Bc6h,
            (TextureRole::Prefilter, NoCompression) => Rgba16Float,
        };

        let (bits_per_channel, pixel_type) = match format {
            Bc6h | Rgba16Float => (16, PixelType::Float),
            _ => (8, PixelType::UnsignedNorm),
        };

        let channel_layout = match format {
            Bc4 | R8 => ChannelLayout::R,
            _ => ChannelLayout::Rgba,
        };

        let effort = match quality {
            Development => Effort::Fast,
            Production | NoCompression => Effort::Thorough,
        };

        Self {
            format,
            bits_per_channel,
            channel_layout,
            pixel_type,
            effort,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(role: TextureRole, quality: QualityMode) -> TextureFormat {
        CompressionPlan::resolve(role, quality).format
    }

    #[test]
    fn test_format_table() {
        use QualityMode::*;
        use TextureFormat::*;
        use TextureRole as R;

        let expected = [
            (R::AlbedoRoughness, [Bc7, Bc3, Rgba8]),
            (R::NormalMetalnessAo, [Bc7, Bc3, Rgba8]),
            (R::Parallax, [Bc4, Bc4, R8]),
            (R::Environment, [Bc6h, Bc3, Rgba16Float]),
            (R::Irradiance, [Rgba16Float, Rgba16Float, Rgba16Float]),
            (R::Prefilter, [Bc6h, Bc6h, Rgba16Float]),
        ];

        for (role, formats) in expected {
            for (quality, want) in [Production, Development, NoCompression].into_iter().zip(formats) {
                assert_eq!(format(role, quality), want, "{} / {}", role, quality);
            }
        }
        assert_eq!(expected.len(), TextureRole::ALL.len());
    }

    #[test]
    fn test_plan_attributes() {
        let plan = CompressionPlan::resolve(TextureRole::Parallax, QualityMode::NoCompression);
        assert_eq!(plan.channel_layout, ChannelLayout::R);
        assert_eq!(plan.bits_per_channel, 8);
        assert_eq!(plan.pixel_type, PixelType::UnsignedNorm);

        let plan = CompressionPlan::resolve(TextureRole::Prefilter, QualityMode::Development);
        assert_eq!(plan.pixel_type, PixelType::Float);
        assert_eq!(plan.bits_per_channel, 16);
        assert_eq!(plan.effort, Effort::Fast);
    }

    #[test]
    fn test_image_size() {
        assert_eq!(TextureFormat::Rgba8.image_size(256, 256), 256 * 256 * 4);
        assert_eq!(TextureFormat::Rgba16Float.image_size(2, 2), 32);
        assert_eq!(TextureFormat::Bc7.image_size(1, 1), 16);
        assert_eq!(TextureFormat::Bc4.image_size(8, 6), 2 * 2 * 8);
    }

    #[test]
    fn test_dxgi_mapping() {
        assert_eq!(TextureFormat::Bc6h.dxgi_format(), DxgiFormat::BC6H_UF16);
        assert_eq!(
            TextureFormat::Rgba16Float.dxgi_format(),
            DxgiFormat::R16G16B16A16_Float
        );
        assert!(TextureFormat::Bc3.is_block_compressed());
        assert!(!TextureFormat::R8.is_block_compressed());
    }
}
