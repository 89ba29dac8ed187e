//! Per-material channel reconstruction.
//!
//! Flat sources arrive as RGBA bytes from the image decoder. The compression
//! backend reads BGRA, so channels 0 and 2 are swapped exactly once here
//! before the bytes become a [`Surface`].
//!
//! Normal/metalness/AO sources are split into two surfaces that are
//! mip-mapped independently and recombined per level:
//!
//! ```text
//!  source RGBA ──┬─► normal   (R, G, reconstructed Z, 1)   normal map
//!                └─► metal/AO (-, -, metalness, AO)        plain
//! ```

use glam::Vec4;
use rayon::prelude::*;

use crate::error::CompileError;
use crate::source::SourceImage;
use crate::surface::{AlphaMode, Surface, WrapMode};

/// Z value written for pixels whose X/Y already reach unit length.
pub const BROKEN_NORMAL_Z: f32 = 0.5;

/// Swap channels 0 and 2 of every 4-byte pixel (RGBA ↔ BGRA).
pub fn swap_red_blue(pixels: &mut [u8]) {
    for pixel in pixels.chunks_exact_mut(4) {
        pixel.swap(0, 2);
    }
}

/// Reconstruct the packed Z of a tangent-space normal from its packed X/Y.
///
/// Inputs and output are in `[0, 1]` (`value = (axis + 1) / 2`). When
/// `x² + y² >= 1` the pixel is broken and Z is exactly [`BROKEN_NORMAL_Z`].
pub fn reconstruct_normal_z(red: f32, green: f32) -> f32 {
    let dot = packed_xy_length_squared(red, green);
    if dot < 1.0 {
        (1.0 - dot).sqrt() * 0.5 + 0.5
    } else {
        BROKEN_NORMAL_Z
    }
}

fn packed_xy_length_squared(red: f32, green: f32) -> f32 {
    let x = red * 2.0 - 1.0;
    let y = green * 2.0 - 1.0;
    x * x + y * y
}

/// Turn a flat (albedo/roughness or parallax) source into a surface.
pub fn prepare_flat(source: SourceImage) -> Result<Surface, CompileError> {
    let (width, height) = (source.width(), source.height());
    let mut bytes = source
        .into_rgba8()
        .ok_or_else(|| CompileError::Reconstruction("flat material source is not 8-bit".into()))?;

    swap_red_blue(&mut bytes);

    Ok(Surface::from_bgra8(width, height, &bytes)?
        .with_wrap_mode(WrapMode::Repeat)
        .with_alpha_mode(AlphaMode::Transparency)
        .with_normal_map(false))
}

/// The two independently mip-mapped halves of a normal/metalness/AO source.
#[derive(Debug, Clone)]
pub struct NormalMetalnessAo {
    /// `(R, G, reconstructed Z, 1)`, tagged as a normal map.
    pub normal: Surface,
    /// Metalness in B, AO in A; R and G are unused.
    pub metalness_ao: Surface,
    /// Pixels that took the broken-normal fallback.
    pub broken_pixels: usize,
}

/// Split a normal/metalness/AO source and reconstruct the normal's Z channel.
pub fn prepare_normal_metalness_ao(source: SourceImage) -> Result<NormalMetalnessAo, CompileError> {
    let (width, height) = (source.width(), source.height());
    let mut bytes = source.into_rgba8().ok_or_else(|| {
        CompileError::Reconstruction("normal/metalness/AO source is not 8-bit".into())
    })?;

    swap_red_blue(&mut bytes);
    let packed = Surface::from_bgra8(width, height, &bytes)?;

    let (normal, metalness_ao): (Vec<Vec4>, Vec<Vec4>) = packed
        .pixels()
        .par_iter()
        .map(|p| {
            (
                Vec4::new(p.x, p.y, reconstruct_normal_z(p.x, p.y), 1.0),
                Vec4::new(0.0, 0.0, p.z, p.w),
            )
        })
        .unzip();
    let broken_pixels = packed
        .pixels()
        .par_iter()
        .filter(|p| packed_xy_length_squared(p.x, p.y) >= 1.0)
        .count();

    if broken_pixels > 0 {
        tracing::warn!(
            broken_pixels,
            "Normal map contains denormalized pixels, using a flat Z for them"
        );
    }

    let normal = Surface::from_pixels(width, height, normal)?
        .with_wrap_mode(WrapMode::Repeat)
        .with_alpha_mode(AlphaMode::Opaque)
        .with_normal_map(true);
    let metalness_ao = Surface::from_pixels(width, height, metalness_ao)?
        .with_wrap_mode(WrapMode::Repeat)
        .with_alpha_mode(AlphaMode::Transparency)
        .with_normal_map(false);

    Ok(NormalMetalnessAo {
        normal,
        metalness_ao,
        broken_pixels,
    })
}

/// Recombine one mip level: `(normal.R, normal.G, metalness_ao.B, metalness_ao.A)`.
pub fn combine_normal_metalness_ao(
    normal: &Surface,
    metalness_ao: &Surface,
) -> Result<Surface, CompileError> {
    if normal.width() != metalness_ao.width() || normal.height() != metalness_ao.height() {
        return Err(CompileError::Reconstruction(format!(
            "normal level {}×{} does not match metalness/AO level {}×{}",
            normal.width(),
            normal.height(),
            metalness_ao.width(),
            metalness_ao.height()
        )));
    }

    let pixels = normal
        .pixels()
        .par_iter()
        .zip(metalness_ao.pixels())
        .map(|(n, m)| Vec4::new(n.x, n.y, m.z, m.w))
        .collect();

    Ok(Surface::from_pixels(normal.width(), normal.height(), pixels)?
        .with_wrap_mode(WrapMode::Repeat)
        .with_alpha_mode(AlphaMode::Transparency))
}
