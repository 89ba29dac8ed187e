//! Image-based lighting precomputation.
//!
//! An equirectangular HDR panorama is turned into three cube maps:
//!
//! - the **environment** cube map, projected face by face ([`projector`]);
//! - the diffuse **irradiance** cube map ([`irradiance`]);
//! - the specular **prefilter** cube map, one roughness per mip ([`prefilter`]).
//!
//! The math lives in plain functions over a [`RadianceSource`]; the software
//! render backend calls them per texel and the wgpu backend runs WGSL ports of
//! the same functions.

pub mod face;
pub mod irradiance;
pub mod prefilter;
pub mod projector;
pub mod sampling;

pub use face::{direction_to_face, CubeFace, FaceDescriptor, FACES};
pub use projector::CubeProjector;
pub use sampling::{equirect_uv, CubeMap, RadianceSource};
