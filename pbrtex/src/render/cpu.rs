//! CPU render backend.
//!
//! Every pass is rasterized immediately on the rayon pool: one kernel call per
//! texel with the direction through the texel center. Results are rounded
//! through half floats so that targets hold exactly what an RGBA16F GPU target
//! would. Readbacks become available two frames after they are requested.

use std::collections::HashMap;

use glam::{Vec3, Vec4};
use half::f16;
use rayon::prelude::*;

use super::{FacePass, FrameId, PassTarget, RenderBackend, ShaderProgram, TargetHandle, TextureHandle};
use crate::error::CompileError;
use crate::ibl::face::FaceRaster;
use crate::ibl::irradiance;
use crate::ibl::prefilter;
use crate::ibl::sampling::{sample_equirect, CubeMap};
use crate::surface::{Surface, WrapMode};

/// Frames between a readback request and its availability.
const READBACK_LATENCY: u64 = 2;

enum Texture {
    Panorama(Surface),
    Cube(CubeMap),
}

struct PendingReadback {
    available: FrameId,
    surface: Surface,
}

/// Software implementation of [`RenderBackend`].
pub struct SoftwareBackend {
    textures: HashMap<u32, Texture>,
    targets: HashMap<u32, Surface>,
    readbacks: HashMap<u32, PendingReadback>,
    next_handle: u32,
    frame: FrameId,
}

impl SoftwareBackend {
    pub fn new() -> Self {
        Self {
            textures: HashMap::new(),
            targets: HashMap::new(),
            readbacks: HashMap::new(),
            next_handle: 1,
            frame: FrameId::default(),
        }
    }

    /// Last completed frame.
    pub fn current_frame(&self) -> FrameId {
        self.frame
    }

    /// Borrow a cube texture, e.g. to inspect rendered levels.
    pub fn cube(&self, handle: TextureHandle) -> Option<&CubeMap> {
        match self.textures.get(&handle.0) {
            Some(Texture::Cube(cube)) => Some(cube),
            _ => None,
        }
    }

    fn allocate(&mut self) -> u32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn source_cube(&self, handle: TextureHandle) -> Result<&CubeMap, CompileError> {
        self.cube(handle).ok_or_else(|| {
            CompileError::GpuResource(format!("texture {} is not a cube map", handle.0))
        })
    }

    fn render(&self, pass: &FacePass) -> Result<Surface, CompileError> {
        let raster = pass.face.descriptor().raster(pass.size);

        let pixels = match pass.program {
            ShaderProgram::Equirect => {
                let panorama = match self.textures.get(&pass.source.0) {
                    Some(Texture::Panorama(panorama)) => panorama,
                    _ => {
                        return Err(CompileError::GpuResource(format!(
                            "texture {} is not a panorama",
                            pass.source.0
                        )))
                    }
                };
                rasterize(&raster, |dir| sample_equirect(panorama, dir))
            }
            ShaderProgram::CubeDownsample { mip } => {
                if mip == 0 {
                    return Err(CompileError::GpuResource(
                        "cube downsample needs a level above mip 0".to_string(),
                    ));
                }
                let cube = self.source_cube(pass.source)?;
                rasterize(&raster, |dir| cube.sample_level(dir, mip - 1))
            }
            ShaderProgram::Irradiance => {
                let cube = self.source_cube(pass.source)?;
                rasterize(&raster, |dir| irradiance::convolve(cube, dir).extend(1.0))
            }
            ShaderProgram::Prefilter { roughness } => {
                let cube = self.source_cube(pass.source)?;
                rasterize(&raster, |dir| {
                    prefilter::prefilter(cube, dir, roughness).extend(1.0)
                })
            }
        };

        Ok(Surface::from_pixels(pass.size, pass.size, pixels)?.with_wrap_mode(WrapMode::Clamp))
    }
}

impl Default for SoftwareBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `kernel` for every texel of a face, rounding through half floats.
fn rasterize<F>(raster: &FaceRaster, kernel: F) -> Vec<Vec4>
where
    F: Fn(Vec3) -> Vec4 + Sync,
{
    let size = raster.size();
    (0..size * size)
        .into_par_iter()
        .map(|i| {
            let value = kernel(raster.direction(i % size, i / size));
            Vec4::from_array(value.to_array().map(|c| f16::from_f32(c).to_f32()))
        })
        .collect()
}

impl RenderBackend for SoftwareBackend {
    fn name(&self) -> &str {
        "software"
    }

    fn upload_panorama(
        &mut self,
        width: u32,
        height: u32,
        pixels: &[f32],
    ) -> Result<TextureHandle, CompileError> {
        let surface = Surface::from_rgba_f32(width, height, pixels)?.with_wrap_mode(WrapMode::Clamp);
        let handle = self.allocate();
        self.textures.insert(handle, Texture::Panorama(surface));
        Ok(TextureHandle(handle))
    }

    fn create_cube_texture(
        &mut self,
        size: u32,
        mip_count: u32,
    ) -> Result<TextureHandle, CompileError> {
        if size == 0 || mip_count == 0 {
            return Err(CompileError::GpuResource(format!(
                "cannot create a {}² cube map with {} mips",
                size, mip_count
            )));
        }
        let handle = self.allocate();
        self.textures
            .insert(handle, Texture::Cube(CubeMap::new(size, mip_count)));
        Ok(TextureHandle(handle))
    }

    fn create_render_target(&mut self, size: u32) -> Result<TargetHandle, CompileError> {
        if size == 0 {
            return Err(CompileError::GpuResource(
                "cannot create an empty render target".to_string(),
            ));
        }
        let handle = self.allocate();
        self.targets.insert(handle, Surface::new(size, size));
        Ok(TargetHandle(handle))
    }

    fn release_render_target(&mut self, target: TargetHandle) {
        self.targets.remove(&target.0);
        self.readbacks.remove(&target.0);
    }

    fn submit(&mut self, pass: &FacePass) -> Result<(), CompileError> {
        tracing::trace!(
            program = pass.program.name(),
            face = %pass.face,
            size = pass.size,
            "Software pass"
        );

        let surface = self.render(pass)?;

        match pass.target {
            PassTarget::Target(target) => {
                let slot = self.targets.get_mut(&target.0).ok_or_else(|| {
                    CompileError::GpuResource(format!("unknown render target {}", target.0))
                })?;
                if slot.width() != pass.size {
                    return Err(CompileError::GpuResource(format!(
                        "viewport {} does not match render target size {}",
                        pass.size,
                        slot.width()
                    )));
                }
                *slot = surface;
            }
            PassTarget::CubeLevel { cube, mip } => match self.textures.get_mut(&cube.0) {
                Some(Texture::Cube(map)) => map.set_level(pass.face, mip, surface)?,
                _ => {
                    return Err(CompileError::GpuResource(format!(
                        "texture {} is not a cube map",
                        cube.0
                    )))
                }
            },
        }
        Ok(())
    }

    fn request_readback(&mut self, target: TargetHandle) -> Result<FrameId, CompileError> {
        let surface = self
            .targets
            .get(&target.0)
            .cloned()
            .ok_or_else(|| CompileError::GpuResource(format!("unknown render target {}", target.0)))?;
        let available = FrameId(self.frame.0 + READBACK_LATENCY);
        self.readbacks
            .insert(target.0, PendingReadback { available, surface });
        Ok(available)
    }

    fn frame(&mut self) -> Result<FrameId, CompileError> {
        self.frame = self.frame.next();
        Ok(self.frame)
    }

    fn take_readback(&mut self, target: TargetHandle) -> Result<Surface, CompileError> {
        match self.readbacks.get(&target.0) {
            Some(pending) if pending.available <= self.frame => {}
            Some(pending) => {
                return Err(CompileError::GpuResource(format!(
                    "readback of target {} is not ready until frame {}",
                    target.0, pending.available.0
                )))
            }
            None => {
                return Err(CompileError::GpuResource(format!(
                    "no readback requested for target {}",
                    target.0
                )))
            }
        }
        self.readbacks
            .remove(&target.0)
            .map(|pending| pending.surface)
            .ok_or_else(|| CompileError::GpuResource(format!("readback of target {} vanished", target.0)))
    }
}
