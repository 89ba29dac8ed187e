//! pbrtex - Offline texture compiler for PBR materials
//!
//! Converts authoring-time images into GPU-ready DDS assets:
//!
//! - albedo/roughness, normal/metalness/AO and parallax maps with full mip
//!   chains and per-material channel packing;
//! - an HDR equirectangular panorama into an environment cube map plus the
//!   diffuse irradiance and GGX-prefiltered specular cube maps used for
//!   image-based lighting.
//!
//! # Example
//!
//! ```no_run
//! use pbrtex::{CompileRequest, Compiler, CompilerSettings, MaterialKind, QualityMode};
//!
//! let compiler = Compiler::new(CompilerSettings::new());
//! let request = CompileRequest::new(
//!     MaterialKind::AlbedoRoughness,
//!     QualityMode::Production,
//!     "bricks_albedo.png",
//!     "bricks_albedo.dds",
//! );
//! let report = compiler.compile(&request)?;
//! for stage in &report.stages {
//!     println!("{}", stage);
//! }
//! # Ok::<(), pbrtex::CompileError>(())
//! ```

pub mod compiler;
pub mod config;
pub mod error;
pub mod ibl;
pub mod logging;
pub mod material;
pub mod mipmap;
pub mod progress;
pub mod reconstruct;
pub mod render;
pub mod source;
pub mod surface;
pub mod texture;

pub use compiler::{
    CompileReport, CompileRequest, Compiler, CompilerSettings, EnvironmentOutputs, StageReport,
};
pub use error::CompileError;
pub use material::{MaterialKind, QualityMode, TextureRole};
pub use progress::{Progress, ProgressCallback};
pub use render::BackendKind;

/// Version of the pbrtex library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
