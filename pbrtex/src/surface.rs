//! In-memory float surfaces.
//!
//! A [`Surface`] is the working representation of every image in the pipeline:
//! decoded sources, mip levels, cube faces read back from the render backend.
//! Pixels are RGBA `f32`; 8-bit data is stored normalized to `[0, 1]`.

use glam::Vec4;
use half::f16;

use crate::error::CompileError;

/// How texel fetches outside `[0, 1]` are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    /// Tile the image.
    #[default]
    Repeat,
    /// Clamp to the edge texel.
    Clamp,
}

/// How the alpha channel is interpreted by consumers of the compiled texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlphaMode {
    /// Alpha is ignored and forced to 1.
    Opaque,
    /// Alpha carries straight (non-premultiplied) data.
    #[default]
    Transparency,
}

/// RGBA float image with sampling metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<Vec4>,
    wrap_mode: WrapMode,
    alpha_mode: AlphaMode,
    normal_map: bool,
}

impl Surface {
    /// Create a surface filled with transparent black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Vec4::ZERO; width as usize * height as usize],
            wrap_mode: WrapMode::default(),
            alpha_mode: AlphaMode::default(),
            normal_map: false,
        }
    }

    /// Create a surface from row-major pixels.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Vec4>) -> Result<Self, CompileError> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(CompileError::size(
                width,
                height,
                format!("expected {} pixels, got {}", expected, pixels.len()),
            ));
        }
        Ok(Self {
            width,
            height,
            pixels,
            wrap_mode: WrapMode::default(),
            alpha_mode: AlphaMode::default(),
            normal_map: false,
        })
    }

    /// Create a surface from 8-bit pixels in the compression backend's BGRA order.
    pub fn from_bgra8(width: u32, height: u32, bytes: &[u8]) -> Result<Self, CompileError> {
        if bytes.len() != width as usize * height as usize * 4 {
            return Err(CompileError::size(width, height, "BGRA buffer length mismatch"));
        }
        let pixels = bytes
            .chunks_exact(4)
            .map(|p| {
                Vec4::new(
                    unorm8_to_f32(p[2]),
                    unorm8_to_f32(p[1]),
                    unorm8_to_f32(p[0]),
                    unorm8_to_f32(p[3]),
                )
            })
            .collect();
        Self::from_pixels(width, height, pixels)
    }

    /// Create a surface from interleaved RGBA `f32` samples.
    pub fn from_rgba_f32(width: u32, height: u32, data: &[f32]) -> Result<Self, CompileError> {
        if data.len() != width as usize * height as usize * 4 {
            return Err(CompileError::size(width, height, "RGBA32F buffer length mismatch"));
        }
        let pixels = data.chunks_exact(4).map(Vec4::from_slice).collect();
        Self::from_pixels(width, height, pixels)
    }

    /// Create a surface from interleaved RGBA half-float samples, as read back
    /// from an RGBA16F render target.
    pub fn from_rgba_f16(width: u32, height: u32, data: &[f16]) -> Result<Self, CompileError> {
        if data.len() != width as usize * height as usize * 4 {
            return Err(CompileError::size(width, height, "RGBA16F buffer length mismatch"));
        }
        let pixels = data
            .chunks_exact(4)
            .map(|p| Vec4::new(p[0].to_f32(), p[1].to_f32(), p[2].to_f32(), p[3].to_f32()))
            .collect();
        Self::from_pixels(width, height, pixels)
    }

    /// Set the wrap mode.
    pub fn with_wrap_mode(mut self, wrap_mode: WrapMode) -> Self {
        self.wrap_mode = wrap_mode;
        self
    }

    /// Set the alpha interpretation.
    pub fn with_alpha_mode(mut self, alpha_mode: AlphaMode) -> Self {
        self.alpha_mode = alpha_mode;
        self
    }

    /// Tag the surface as a packed normal map.
    ///
    /// Normal maps are renormalized after every mip downsample.
    pub fn with_normal_map(mut self, normal_map: bool) -> Self {
        self.normal_map = normal_map;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn wrap_mode(&self) -> WrapMode {
        self.wrap_mode
    }

    pub fn alpha_mode(&self) -> AlphaMode {
        self.alpha_mode
    }

    pub fn is_normal_map(&self) -> bool {
        self.normal_map
    }

    pub fn pixels(&self) -> &[Vec4] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Vec4] {
        &mut self.pixels
    }

    /// Texel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Vec4 {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Produce the next mip level with a 2×2 area filter.
    ///
    /// The result is `max(1, width / 2) × max(1, height / 2)`. Odd dimensions
    /// are handled by weighting source texels by their overlap with the
    /// destination footprint. Metadata is carried over; renormalization is the
    /// caller's decision (see [`crate::mipmap`]).
    pub fn downsample(&self) -> Surface {
        let dst_w = (self.width / 2).max(1);
        let dst_h = (self.height / 2).max(1);

        let columns: Vec<Vec<(u32, f32)>> = (0..dst_w)
            .map(|x| footprint(self.width, dst_w, x))
            .collect();
        let rows: Vec<Vec<(u32, f32)>> = (0..dst_h)
            .map(|y| footprint(self.height, dst_h, y))
            .collect();

        // Horizontal pass: dst_w × src_h.
        let mut horizontal = Vec::with_capacity(dst_w as usize * self.height as usize);
        for y in 0..self.height {
            let row = &self.pixels[(y * self.width) as usize..((y + 1) * self.width) as usize];
            for taps in &columns {
                let sum = taps
                    .iter()
                    .fold(Vec4::ZERO, |acc, &(i, w)| acc + row[i as usize] * w);
                horizontal.push(sum);
            }
        }

        // Vertical pass: dst_w × dst_h.
        let mut pixels = Vec::with_capacity(dst_w as usize * dst_h as usize);
        for taps in &rows {
            for x in 0..dst_w {
                let sum = taps.iter().fold(Vec4::ZERO, |acc, &(j, w)| {
                    acc + horizontal[(j * dst_w + x) as usize] * w
                });
                pixels.push(sum);
            }
        }

        Surface {
            width: dst_w,
            height: dst_h,
            pixels,
            wrap_mode: self.wrap_mode,
            alpha_mode: self.alpha_mode,
            normal_map: self.normal_map,
        }
    }

    /// Expand packed normals to `[-1, 1]`, normalize and repack to `[0, 1]`.
    ///
    /// Zero-length vectors become the flat normal `(0, 0, 1)`. Alpha is kept.
    pub fn renormalize(&mut self) {
        for pixel in &mut self.pixels {
            let expanded = pixel.truncate() * 2.0 - 1.0;
            let normal = expanded.try_normalize().unwrap_or(glam::Vec3::Z);
            *pixel = (normal * 0.5 + 0.5).extend(pixel.w);
        }
    }

    /// Bilinear sample at normalized coordinates, honoring the wrap mode.
    ///
    /// `(0, 0)` is the top-left corner of the first texel.
    pub fn sample_bilinear(&self, u: f32, v: f32) -> Vec4 {
        let x = u * self.width as f32 - 0.5;
        let y = v * self.height as f32 - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let x0 = x0 as i64;
        let y0 = y0 as i64;

        let t00 = self.fetch(x0, y0);
        let t10 = self.fetch(x0 + 1, y0);
        let t01 = self.fetch(x0, y0 + 1);
        let t11 = self.fetch(x0 + 1, y0 + 1);

        let top = t00.lerp(t10, fx);
        let bottom = t01.lerp(t11, fx);
        top.lerp(bottom, fy)
    }

    fn fetch(&self, x: i64, y: i64) -> Vec4 {
        let (w, h) = (self.width as i64, self.height as i64);
        let (x, y) = match self.wrap_mode {
            WrapMode::Repeat => (x.rem_euclid(w), y.rem_euclid(h)),
            WrapMode::Clamp => (x.clamp(0, w - 1), y.clamp(0, h - 1)),
        };
        self.pixels[(y * w + x) as usize]
    }

    /// Interleaved RGBA bytes, clamped to `[0, 1]` and rounded.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|p| p.to_array().map(f32_to_unorm8))
            .collect()
    }

    /// Red channel bytes, clamped to `[0, 1]` and rounded.
    pub fn to_r8(&self) -> Vec<u8> {
        self.pixels.iter().map(|p| f32_to_unorm8(p.x)).collect()
    }

    /// Interleaved RGBA half floats.
    pub fn to_rgba_f16(&self) -> Vec<f16> {
        self.pixels
            .iter()
            .flat_map(|p| p.to_array().map(f16::from_f32))
            .collect()
    }
}

/// Source taps and weights covering destination index `i` when `src` texels
/// are reduced to `dst`.
fn footprint(src: u32, dst: u32, i: u32) -> Vec<(u32, f32)> {
    let ratio = src as f32 / dst as f32;
    let start = i as f32 * ratio;
    let end = start + ratio;

    let first = start.floor() as u32;
    let last = (end.ceil() as u32).min(src);

    (first..last)
        .filter_map(|j| {
            let overlap = end.min(j as f32 + 1.0) - start.max(j as f32);
            (overlap > 0.0).then_some((j, overlap / ratio))
        })
        .collect()
}

pub(crate) fn unorm8_to_f32(value: u8) -> f32 {
    value as f32 / 255.0
}

pub(crate) fn f32_to_unorm8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}
