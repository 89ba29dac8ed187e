//! Face passes of the environment pipeline.
//!
//! [`CubeProjector`] owns no device state; it drives a [`RenderBackend`]
//! through the passes that turn a panorama into the base cube faces, the
//! sampled cube map with its mip chain, and the irradiance and prefilter
//! faces. Every rendered face is read back through the two-phase readback
//! protocol before the next one is rendered.

use super::face::CubeFace;
use super::prefilter::roughness_for_level;
use crate::error::CompileError;
use crate::mipmap::{mip_count, mip_dimension};
use crate::render::{
    wait_for_readback, FacePass, PassTarget, RenderBackend, ShaderProgram, TextureHandle,
};
use crate::source::SourceImage;
use crate::surface::Surface;

/// Drives face passes on a render backend.
pub struct CubeProjector<'a> {
    backend: &'a mut dyn RenderBackend,
}

impl<'a> CubeProjector<'a> {
    pub fn new(backend: &'a mut dyn RenderBackend) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Upload a float panorama.
    pub fn upload(&mut self, source: SourceImage) -> Result<TextureHandle, CompileError> {
        let (width, height) = (source.width(), source.height());
        let pixels = source.into_rgba_f32().ok_or_else(|| {
            CompileError::Reconstruction("cube map source is not floating point".to_string())
        })?;
        self.backend.upload_panorama(width, height, &pixels)
    }

    /// Render one face of `program` into a fresh target and read it back.
    pub fn render_face(
        &mut self,
        program: ShaderProgram,
        source: TextureHandle,
        face: CubeFace,
        size: u32,
    ) -> Result<Surface, CompileError> {
        let target = self.backend.create_render_target(size)?;
        let result = self
            .backend
            .submit(&FacePass {
                program,
                source,
                target: PassTarget::Target(target),
                face,
                size,
            })
            .and_then(|()| wait_for_readback(&mut *self.backend, target));
        self.backend.release_render_target(target);

        tracing::debug!(program = program.name(), face = %face, size, "Rendered face");
        result
    }

    /// Render all six faces of `program`, in DDS face order.
    pub fn render_faces(
        &mut self,
        program: ShaderProgram,
        source: TextureHandle,
        size: u32,
    ) -> Result<Vec<Surface>, CompileError> {
        CubeFace::ALL
            .iter()
            .map(|&face| self.render_face(program, source, face, size))
            .collect()
    }

    /// Project the panorama onto six `size`² faces.
    pub fn project_faces(
        &mut self,
        panorama: TextureHandle,
        size: u32,
    ) -> Result<Vec<Surface>, CompileError> {
        self.render_faces(ShaderProgram::Equirect, panorama, size)
    }

    /// Build the sampled cube map with a full mip chain.
    ///
    /// Level 0 is projected from the panorama; every further level resamples
    /// the level above it.
    pub fn build_cube_map(
        &mut self,
        panorama: TextureHandle,
        size: u32,
    ) -> Result<TextureHandle, CompileError> {
        let levels = mip_count(size, size);
        let cube = self.backend.create_cube_texture(size, levels)?;

        for face in CubeFace::ALL {
            for mip in 0..levels {
                let (program, source) = if mip == 0 {
                    (ShaderProgram::Equirect, panorama)
                } else {
                    (ShaderProgram::CubeDownsample { mip }, cube)
                };
                self.backend.submit(&FacePass {
                    program,
                    source,
                    target: PassTarget::CubeLevel { cube, mip },
                    face,
                    size: mip_dimension(size, mip),
                })?;
            }
        }

        tracing::debug!(size, levels, "Built sampled cube map");
        Ok(cube)
    }

    /// Render the six irradiance faces.
    pub fn render_irradiance(
        &mut self,
        cube: TextureHandle,
        size: u32,
    ) -> Result<Vec<Surface>, CompileError> {
        self.render_faces(ShaderProgram::Irradiance, cube, size)
    }

    /// Render the prefiltered faces, one mip chain per face.
    ///
    /// Mip `m` is `size >> m` texels wide and uses roughness `min(m, 4) / 4`.
    pub fn render_prefilter(
        &mut self,
        cube: TextureHandle,
        size: u32,
        mut on_image: impl FnMut(CubeFace, u32),
    ) -> Result<Vec<Vec<Surface>>, CompileError> {
        let levels = mip_count(size, size);
        let mut faces = Vec::with_capacity(CubeFace::ALL.len());

        for face in CubeFace::ALL {
            let mut chain = Vec::with_capacity(levels as usize);
            for mip in 0..levels {
                let program = ShaderProgram::Prefilter {
                    roughness: roughness_for_level(mip),
                };
                chain.push(self.render_face(program, cube, face, mip_dimension(size, mip))?);
                on_image(face, mip);
            }
            faces.push(chain);
        }

        Ok(faces)
    }
}
