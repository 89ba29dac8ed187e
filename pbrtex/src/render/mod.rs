//! Render backends for the environment pipeline.
//!
//! The environment pipeline never touches a device directly. It drives a
//! [`RenderBackend`] with face passes and reads results back through an
//! explicit two-phase protocol:
//!
//! ```text
//!  submit(pass) ──► request_readback(target) ─► FrameId (requested)
//!                          │
//!                          ▼
//!                  frame() until completed ≥ requested
//!                          │
//!                          ▼
//!                  take_readback(target) ─► Surface
//! ```
//!
//! Two backends exist:
//!
//! - [`SoftwareBackend`] runs every program as a Rust kernel on the CPU,
//!   parallelized with rayon. Always available.
//! - `WgpuBackend` runs WGSL programs on a headless adapter. Requires the
//!   `gpu` feature.

mod cpu;
#[cfg(feature = "gpu")]
mod gpu;

use std::fmt;
use std::str::FromStr;

use crate::error::CompileError;
use crate::ibl::CubeFace;
use crate::surface::Surface;

pub use cpu::SoftwareBackend;
#[cfg(feature = "gpu")]
pub use gpu::WgpuBackend;

/// Handle to a sampled texture (panorama or cube map).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub(crate) u32);

/// Handle to a 2D RGBA16F render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetHandle(pub(crate) u32);

/// Monotonic frame counter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FrameId(pub u64);

impl FrameId {
    pub fn next(self) -> Self {
        FrameId(self.0 + 1)
    }
}

/// Program run by a face pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShaderProgram {
    /// Project the equirectangular source onto the face.
    Equirect,
    /// Resample the level above `mip` of the source cube map.
    CubeDownsample { mip: u32 },
    /// Diffuse irradiance of the source cube map.
    Irradiance,
    /// GGX prefilter of the source cube map; the texel solid angle comes
    /// from the bound cube's level 0.
    Prefilter { roughness: f32 },
}

impl ShaderProgram {
    pub fn name(&self) -> &'static str {
        match self {
            ShaderProgram::Equirect => "equirect",
            ShaderProgram::CubeDownsample { .. } => "cube_downsample",
            ShaderProgram::Irradiance => "irradiance",
            ShaderProgram::Prefilter { .. } => "prefilter",
        }
    }
}

/// Where a face pass writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassTarget {
    /// A standalone render target.
    Target(TargetHandle),
    /// One (face, mip) of a cube texture; the face comes from the pass.
    CubeLevel { cube: TextureHandle, mip: u32 },
}

/// One draw of a fullscreen face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FacePass {
    pub program: ShaderProgram,
    pub source: TextureHandle,
    pub target: PassTarget,
    pub face: CubeFace,
    /// Viewport size in texels.
    pub size: u32,
}

/// A device able to run the environment programs.
///
/// All resources are owned by the backend and released when it is dropped.
pub trait RenderBackend {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Upload an RGBA32F equirectangular panorama.
    fn upload_panorama(
        &mut self,
        width: u32,
        height: u32,
        pixels: &[f32],
    ) -> Result<TextureHandle, CompileError>;

    /// Create a cube texture of `size`² faces with `mip_count` levels.
    fn create_cube_texture(
        &mut self,
        size: u32,
        mip_count: u32,
    ) -> Result<TextureHandle, CompileError>;

    /// Create a square RGBA16F render target.
    fn create_render_target(&mut self, size: u32) -> Result<TargetHandle, CompileError>;

    /// Release a render target early. Targets are also released on drop.
    fn release_render_target(&mut self, target: TargetHandle);

    /// Record and submit one face pass.
    fn submit(&mut self, pass: &FacePass) -> Result<(), CompileError>;

    /// Copy a render target into CPU-readable staging memory.
    ///
    /// Returns the frame at which the data becomes available.
    fn request_readback(&mut self, target: TargetHandle) -> Result<FrameId, CompileError>;

    /// Advance the frame counter, returning the last completed frame.
    fn frame(&mut self) -> Result<FrameId, CompileError>;

    /// Take the data of a completed readback.
    fn take_readback(&mut self, target: TargetHandle) -> Result<Surface, CompileError>;
}

/// Request a readback and advance frames until it completes.
///
/// There is no timeout; the backend is expected to make progress on every
/// call to [`RenderBackend::frame`].
pub fn wait_for_readback(
    backend: &mut dyn RenderBackend,
    target: TargetHandle,
) -> Result<Surface, CompileError> {
    let requested = backend.request_readback(target)?;
    loop {
        let completed = backend.frame()?;
        if completed >= requested {
            break;
        }
    }
    backend.take_readback(target)
}

/// Which backend runs the environment pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// CPU kernels.
    #[default]
    Software,
    /// wgpu on a headless adapter.
    Gpu,
}

impl BackendKind {
    pub fn name(self) -> &'static str {
        match self {
            BackendKind::Software => "software",
            BackendKind::Gpu => "gpu",
        }
    }

    /// Create the backend.
    ///
    /// # Errors
    ///
    /// [`CompileError::Device`] if the backend cannot be initialized or was
    /// not compiled in.
    pub fn create(self) -> Result<Box<dyn RenderBackend>, CompileError> {
        match self {
            BackendKind::Software => Ok(Box::new(SoftwareBackend::new())),
            #[cfg(feature = "gpu")]
            BackendKind::Gpu => Ok(Box::new(WgpuBackend::new()?)),
            #[cfg(not(feature = "gpu"))]
            BackendKind::Gpu => Err(CompileError::Device(
                "the gpu backend requires building with the `gpu` feature".to_string(),
            )),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "software" | "cpu" => Ok(BackendKind::Software),
            "gpu" | "wgpu" => Ok(BackendKind::Gpu),
            other => Err(format!(
                "unknown render backend '{}', expected 'software' or 'gpu'",
                other
            )),
        }
    }
}
