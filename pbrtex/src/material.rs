//! Material kinds, quality modes and the output roles they produce.

use std::fmt;

/// The kind of material a source image holds.
///
/// Exactly one is selected per compilation run. It decides how channels are
/// interpreted, how they are reconstructed and which formats are used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialKind {
    /// RGB albedo with roughness in alpha.
    AlbedoRoughness,
    /// Packed normal X/Y in RG, metalness in B, ambient occlusion in A.
    NormalMetalnessAo,
    /// Single-channel parallax (height) map.
    Parallax,
    /// Equirectangular HDR panorama, compiled into environment, irradiance and
    /// prefilter cube maps.
    CubeMap,
}

impl MaterialKind {
    /// True for the kinds compiled without the render backend.
    pub fn is_flat(self) -> bool {
        !matches!(self, MaterialKind::CubeMap)
    }

    /// Human-readable name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            MaterialKind::AlbedoRoughness => "albedo/roughness",
            MaterialKind::NormalMetalnessAo => "normal/metalness/ambient occlusion",
            MaterialKind::Parallax => "parallax",
            MaterialKind::CubeMap => "cube map",
        }
    }
}

impl fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compression quality trade-off for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QualityMode {
    /// Good but slow compression.
    Production,
    /// Poor but fast compression.
    Development,
    /// Raw, uncompressed pixels.
    NoCompression,
}

impl fmt::Display for QualityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityMode::Production => f.write_str("production"),
            QualityMode::Development => f.write_str("development"),
            QualityMode::NoCompression => f.write_str("no compression"),
        }
    }
}

/// A compressed output produced by a run.
///
/// Flat materials produce one role; a cube map produces three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureRole {
    AlbedoRoughness,
    NormalMetalnessAo,
    Parallax,
    /// The base environment cube map.
    Environment,
    /// Diffuse irradiance cube map.
    Irradiance,
    /// Specular prefiltered cube map, one roughness step per mip.
    Prefilter,
}

impl TextureRole {
    /// Every role, in table order.
    pub const ALL: [TextureRole; 6] = [
        TextureRole::AlbedoRoughness,
        TextureRole::NormalMetalnessAo,
        TextureRole::Parallax,
        TextureRole::Environment,
        TextureRole::Irradiance,
        TextureRole::Prefilter,
    ];

    /// Human-readable name used in logs and progress output.
    pub fn name(self) -> &'static str {
        match self {
            TextureRole::AlbedoRoughness => "albedo roughness",
            TextureRole::NormalMetalnessAo => "normal metalness ambient occlusion",
            TextureRole::Parallax => "parallax",
            TextureRole::Environment => "cube map",
            TextureRole::Irradiance => "irradiance map",
            TextureRole::Prefilter => "prefilter map",
        }
    }

    /// True for roles written as cube maps.
    pub fn is_cube(self) -> bool {
        matches!(
            self,
            TextureRole::Environment | TextureRole::Irradiance | TextureRole::Prefilter
        )
    }
}

impl From<MaterialKind> for TextureRole {
    /// The primary output role of a material.
    fn from(kind: MaterialKind) -> Self {
        match kind {
            MaterialKind::AlbedoRoughness => TextureRole::AlbedoRoughness,
            MaterialKind::NormalMetalnessAo => TextureRole::NormalMetalnessAo,
            MaterialKind::Parallax => TextureRole::Parallax,
            MaterialKind::CubeMap => TextureRole::Environment,
        }
    }
}

impl fmt::Display for TextureRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
