//! Environment lookups used by the software kernels.

use std::f32::consts::PI;

use glam::{Vec2, Vec3, Vec4};

use super::face::{direction_to_face, CubeFace};
use crate::error::CompileError;
use crate::mipmap::mip_dimension;
use crate::surface::{Surface, WrapMode};

/// Equirectangular texture coordinates of a unit direction.
///
/// `u = atan2(−d.z, d.x) / 2π + 0.5`, `v = asin(d.y) / π + 0.5`, so +X maps
/// to the center of the panorama. `v` grows towards +Y, matching panoramas
/// that were flipped vertically on load.
pub fn equirect_uv(direction: Vec3) -> Vec2 {
    let u = (-direction.z).atan2(direction.x) / (2.0 * PI) + 0.5;
    let v = direction.y.clamp(-1.0, 1.0).asin() / PI + 0.5;
    Vec2::new(u, v)
}

/// Bilinear panorama lookup: wraps horizontally, clamps at the poles.
pub fn sample_equirect(panorama: &Surface, direction: Vec3) -> Vec4 {
    let uv = equirect_uv(direction);
    let w = panorama.width() as i64;
    let h = panorama.height() as i64;

    let x = uv.x * w as f32 - 0.5;
    let y = uv.y * h as f32 - 0.5;
    let x0 = x.floor();
    let y0 = y.floor();
    let (fx, fy) = (x - x0, y - y0);
    let (x0, y0) = (x0 as i64, y0 as i64);

    let fetch = |x: i64, y: i64| {
        panorama.pixel(x.rem_euclid(w) as u32, y.clamp(0, h - 1) as u32)
    };

    let top = fetch(x0, y0).lerp(fetch(x0 + 1, y0), fx);
    let bottom = fetch(x0, y0 + 1).lerp(fetch(x0 + 1, y0 + 1), fx);
    top.lerp(bottom, fy)
}

/// Something that returns radiance for a direction at a level of detail.
pub trait RadianceSource: Sync {
    /// Radiance arriving from `direction`, filtered at mip `lod`.
    fn radiance(&self, direction: Vec3, lod: f32) -> Vec3;

    /// Face resolution of level 0.
    fn resolution(&self) -> u32;
}

/// Six mip chains in DDS face order.
#[derive(Debug, Clone)]
pub struct CubeMap {
    size: u32,
    faces: [Vec<Surface>; 6],
}

impl CubeMap {
    /// A black cube map with `mip_count` levels.
    pub fn new(size: u32, mip_count: u32) -> Self {
        let chain = || {
            (0..mip_count.max(1))
                .map(|m| {
                    let s = mip_dimension(size, m);
                    Surface::new(s, s).with_wrap_mode(WrapMode::Clamp)
                })
                .collect::<Vec<_>>()
        };
        Self {
            size,
            faces: std::array::from_fn(|_| chain()),
        }
    }

    /// Build from per-face mip chains.
    pub fn from_faces(faces: [Vec<Surface>; 6]) -> Result<Self, CompileError> {
        let size = faces[0].first().map(Surface::width).unwrap_or(0);
        let levels = faces[0].len();
        for chain in &faces {
            if chain.len() != levels || chain.is_empty() {
                return Err(CompileError::GpuResource(
                    "cube faces have different mip counts".into(),
                ));
            }
            for (m, level) in chain.iter().enumerate() {
                let s = mip_dimension(size, m as u32);
                if level.width() != s || level.height() != s {
                    return Err(CompileError::size(
                        level.width(),
                        level.height(),
                        format!("cube mip {} must be {}×{}", m, s, s),
                    ));
                }
            }
        }
        Ok(Self { size, faces })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn mip_count(&self) -> u32 {
        self.faces[0].len() as u32
    }

    pub fn level(&self, face: CubeFace, mip: u32) -> Option<&Surface> {
        self.faces[face.index()].get(mip as usize)
    }

    /// Replace one (face, mip) image.
    pub fn set_level(&mut self, face: CubeFace, mip: u32, surface: Surface) -> Result<(), CompileError> {
        let expected = mip_dimension(self.size, mip);
        let slot = self.faces[face.index()]
            .get_mut(mip as usize)
            .ok_or_else(|| CompileError::GpuResource(format!("cube map has no mip {}", mip)))?;
        if surface.width() != expected || surface.height() != expected {
            return Err(CompileError::size(
                surface.width(),
                surface.height(),
                format!("cube mip {} must be {}×{}", mip, expected, expected),
            ));
        }
        *slot = surface.with_wrap_mode(WrapMode::Clamp);
        Ok(())
    }

    /// Bilinear lookup within one mip level.
    pub fn sample_level(&self, direction: Vec3, mip: u32) -> Vec4 {
        let (face, u, v) = direction_to_face(direction);
        let chain = &self.faces[face.index()];
        let level = &chain[(mip as usize).min(chain.len() - 1)];
        level.sample_bilinear(u, v)
    }

    /// Trilinear lookup at a fractional level of detail.
    pub fn sample_lod(&self, direction: Vec3, lod: f32) -> Vec4 {
        let max = (self.mip_count() - 1) as f32;
        let lod = lod.clamp(0.0, max);
        let lower = lod.floor();
        let t = lod - lower;
        let a = self.sample_level(direction, lower as u32);
        if t <= f32::EPSILON {
            return a;
        }
        a.lerp(self.sample_level(direction, lower as u32 + 1), t)
    }

    pub fn into_faces(self) -> [Vec<Surface>; 6] {
        self.faces
    }
}

impl RadianceSource for CubeMap {
    fn radiance(&self, direction: Vec3, lod: f32) -> Vec3 {
        self.sample_lod(direction, lod).truncate()
    }

    fn resolution(&self) -> u32 {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equirect_uv_of_positive_x_is_center() {
        let uv = equirect_uv(Vec3::X);
        assert!((uv - Vec2::new(0.5, 0.5)).length() < 1e-6);
    }

    #[test]
    fn test_equirect_uv_poles_and_quadrants() {
        assert!((equirect_uv(Vec3::Y).y - 1.0).abs() < 1e-6);
        assert!(equirect_uv(Vec3::NEG_Y).y.abs() < 1e-6);
        assert!((equirect_uv(Vec3::NEG_Z).x - 0.75).abs() < 1e-6);
        assert!((equirect_uv(Vec3::Z).x - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_sample_equirect_constant() {
        let panorama = Surface::from_pixels(4, 2, vec![Vec4::splat(3.0); 8]).unwrap();
        for dir in [Vec3::X, Vec3::Y, Vec3::new(-1.0, -1.0, 0.3).normalize()] {
            assert_eq!(sample_equirect(&panorama, dir), Vec4::splat(3.0));
        }
    }

    #[test]
    fn test_cube_map_sample_picks_face() {
        let mut cube = CubeMap::new(2, 2);
        for face in CubeFace::ALL {
            let value = Vec4::splat(face.index() as f32);
            cube.set_level(face, 0, Surface::from_pixels(2, 2, vec![value; 4]).unwrap())
                .unwrap();
        }
        assert_eq!(cube.sample_level(Vec3::NEG_Y, 0).x, 3.0);
        assert_eq!(cube.sample_level(Vec3::new(0.1, 0.2, 0.9), 0).x, 4.0);
    }

    #[test]
    fn test_cube_map_trilinear_blends_levels() {
        let mut cube = CubeMap::new(2, 2);
        for face in CubeFace::ALL {
            cube.set_level(face, 0, Surface::from_pixels(2, 2, vec![Vec4::ZERO; 4]).unwrap())
                .unwrap();
            cube.set_level(face, 1, Surface::from_pixels(1, 1, vec![Vec4::ONE]).unwrap())
                .unwrap();
        }
        assert!((cube.sample_lod(Vec3::X, 0.25).x - 0.25).abs() < 1e-6);
        assert_eq!(cube.sample_lod(Vec3::X, 7.0).x, 1.0);
    }

    #[test]
    fn test_set_level_rejects_wrong_size() {
        let mut cube = CubeMap::new(4, 3);
        assert!(cube
            .set_level(CubeFace::PositiveX, 1, Surface::new(4, 4))
            .is_err());
        assert!(cube
            .set_level(CubeFace::PositiveX, 5, Surface::new(1, 1))
            .is_err());
    }
}
