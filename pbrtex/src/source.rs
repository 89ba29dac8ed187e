//! Image ingestion and validation.
//!
//! Flat materials load as 8-bit RGBA and must be power-of-two sized. Cube-map
//! panoramas load as float RGBA, are flipped vertically to match the
//! projection's texture-coordinate convention, and are only size-bounded.

use std::path::Path;

use crate::error::CompileError;
use crate::material::MaterialKind;

/// Largest accepted width or height.
pub const MAX_DIMENSION: u32 = 65535;

/// Decoded pixel samples, always four channels per pixel.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelData {
    /// 8 bits per channel, RGBA order.
    Ldr(Vec<u8>),
    /// 32-bit float per channel, RGBA order.
    Hdr(Vec<f32>),
}

/// A validated source image.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    width: u32,
    height: u32,
    data: PixelData,
}

impl SourceImage {
    /// Number of channels per pixel.
    pub const CHANNELS: usize = 4;

    /// Load and validate the source image for a material kind.
    ///
    /// # Errors
    ///
    /// - [`CompileError::Load`] if the file is missing or cannot be decoded
    /// - [`CompileError::Size`] if the dimensions violate the preconditions
    pub fn load(path: &Path, kind: MaterialKind) -> Result<Self, CompileError> {
        let decoded = image::open(path).map_err(|e| CompileError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let (width, height) = (decoded.width(), decoded.height());
        validate_dimensions(width, height, kind.is_flat())?;

        let data = match kind {
            MaterialKind::CubeMap => PixelData::Hdr(decoded.flipv().into_rgba32f().into_raw()),
            _ => PixelData::Ldr(decoded.into_rgba8().into_raw()),
        };

        tracing::debug!(
            path = %path.display(),
            width,
            height,
            kind = %kind,
            "Loaded source image"
        );

        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Wrap already-decoded 8-bit RGBA pixels.
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, CompileError> {
        check_len(width, height, pixels.len())?;
        Ok(Self {
            width,
            height,
            data: PixelData::Ldr(pixels),
        })
    }

    /// Wrap already-decoded float RGBA pixels.
    pub fn from_rgba_f32(width: u32, height: u32, pixels: Vec<f32>) -> Result<Self, CompileError> {
        check_len(width, height, pixels.len())?;
        Ok(Self {
            width,
            height,
            data: PixelData::Hdr(pixels),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &PixelData {
        &self.data
    }

    pub fn is_hdr(&self) -> bool {
        matches!(self.data, PixelData::Hdr(_))
    }

    /// Consume the image, returning its 8-bit samples if it is LDR.
    pub fn into_rgba8(self) -> Option<Vec<u8>> {
        match self.data {
            PixelData::Ldr(pixels) => Some(pixels),
            PixelData::Hdr(_) => None,
        }
    }

    /// Consume the image, returning its float samples if it is HDR.
    pub fn into_rgba_f32(self) -> Option<Vec<f32>> {
        match self.data {
            PixelData::Hdr(pixels) => Some(pixels),
            PixelData::Ldr(_) => None,
        }
    }
}

fn check_len(width: u32, height: u32, len: usize) -> Result<(), CompileError> {
    let expected = width as usize * height as usize * SourceImage::CHANNELS;
    if len != expected {
        return Err(CompileError::size(
            width,
            height,
            format!("expected {} samples, got {}", expected, len),
        ));
    }
    Ok(())
}

/// Check the dimension preconditions shared by all inputs.
///
/// Both sides must be in `1..=65535`; flat materials additionally require
/// powers of two.
pub fn validate_dimensions(
    width: u32,
    height: u32,
    require_power_of_two: bool,
) -> Result<(), CompileError> {
    if width == 0 || height == 0 {
        return Err(CompileError::size(width, height, "image is empty"));
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(CompileError::size(
            width,
            height,
            format!("image is larger than {}", MAX_DIMENSION),
        ));
    }
    if require_power_of_two && (!width.is_power_of_two() || !height.is_power_of_two()) {
        return Err(CompileError::size(width, height, "image size is not power of two"));
    }
    Ok(())
}
