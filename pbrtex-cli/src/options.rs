//! Command-line arguments and their resolution against the config file.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use pbrtex::config::ConfigFile;
use pbrtex::source::MAX_DIMENSION;
use pbrtex::{BackendKind, CompileRequest, EnvironmentOutputs, MaterialKind, QualityMode};

use crate::error::CliError;

/// Render backend selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum BackendArg {
    /// CPU kernels, always available
    Software,
    /// wgpu on a headless adapter (requires the `gpu` feature)
    Gpu,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Software => BackendKind::Software,
            BackendArg::Gpu => BackendKind::Gpu,
        }
    }
}

/// Compile PBR material textures and IBL environment maps into DDS assets.
#[derive(Debug, Parser)]
#[command(name = "pbrtex", version, about)]
pub struct Args {
    /// Input contains albedo map and roughness map
    #[arg(long)]
    pub albedo_roughness: bool,

    /// Input contains normal, metalness and ambient occlusion maps
    #[arg(long)]
    pub normal_metalness_ambient_occlusion: bool,

    /// Input contains parallax map
    #[arg(long)]
    pub parallax: bool,

    /// Input contains an equirectangular HDR cube map
    #[arg(long)]
    pub cube_map: bool,

    /// Input texture path
    #[arg(long, value_name = "example.png")]
    pub input: Option<PathBuf>,

    /// Output texture path
    #[arg(long, value_name = "example.dds")]
    pub output: Option<PathBuf>,

    /// Output cube map face size (cube map only)
    #[arg(long, value_name = "1024")]
    pub output_size: Option<u64>,

    /// Output irradiance texture path (cube map only)
    #[arg(long, value_name = "irradiance.dds")]
    pub irradiance: Option<PathBuf>,

    /// Output irradiance texture size (cube map only)
    #[arg(long, value_name = "32")]
    pub irradiance_size: Option<u64>,

    /// Output prefilter texture path (cube map only)
    #[arg(long, value_name = "prefilter.dds")]
    pub prefilter: Option<PathBuf>,

    /// Output prefilter texture size (cube map only)
    #[arg(long, value_name = "128")]
    pub prefilter_size: Option<u64>,

    /// Good but slow texture compression
    #[arg(long)]
    pub production: bool,

    /// Poor but quick texture compression
    #[arg(long)]
    pub development: bool,

    /// No texture compression
    #[arg(long)]
    pub no_compression: bool,

    /// Render backend for cube maps (overrides config)
    #[arg(long, value_enum)]
    pub backend: Option<BackendArg>,

    /// Configuration file (default: <config dir>/pbrtex/config.ini)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log level or filter, e.g. debug or pbrtex=trace (overrides config)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Also write logs to this file (overrides config)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Hide progress bars
    #[arg(long, short)]
    pub quiet: bool,
}

impl Args {
    /// The single material flag that is set.
    pub fn material(&self) -> Result<MaterialKind, CliError> {
        let flags = [
            (self.albedo_roughness, MaterialKind::AlbedoRoughness),
            (self.normal_metalness_ambient_occlusion, MaterialKind::NormalMetalnessAo),
            (self.parallax, MaterialKind::Parallax),
            (self.cube_map, MaterialKind::CubeMap),
        ];
        exactly_one(&flags).ok_or(CliError::MaterialFlags)
    }

    /// The single quality flag that is set.
    pub fn quality(&self) -> Result<QualityMode, CliError> {
        let flags = [
            (self.production, QualityMode::Production),
            (self.development, QualityMode::Development),
            (self.no_compression, QualityMode::NoCompression),
        ];
        exactly_one(&flags).ok_or(CliError::QualityFlags)
    }

    fn has_cube_map_arguments(&self) -> bool {
        self.output_size.is_some()
            || self.irradiance.is_some()
            || self.irradiance_size.is_some()
            || self.prefilter.is_some()
            || self.prefilter_size.is_some()
    }

    /// Validate the arguments and build the request.
    ///
    /// Cube-map sizes missing on the command line fall back to the
    /// `[environment]` section of the config file.
    pub fn to_request(&self, config: &ConfigFile) -> Result<CompileRequest, CliError> {
        let input = non_empty(&self.input).ok_or(CliError::MissingInput)?;
        let output = non_empty(&self.output).ok_or(CliError::MissingOutput)?;
        let kind = self.material()?;
        let quality = self.quality()?;

        let request = CompileRequest::new(kind, quality, input, output);
        if kind != MaterialKind::CubeMap {
            if self.has_cube_map_arguments() {
                return Err(CliError::CubeMapOnlyArguments);
            }
            return Ok(request);
        }

        let defaults = &config.environment;
        let output_size = self.output_size.or(defaults.output_size.map(u64::from));
        let irradiance_size = self.irradiance_size.or(defaults.irradiance_size.map(u64::from));
        let prefilter_size = self.prefilter_size.or(defaults.prefilter_size.map(u64::from));

        let (
            Some(output_size),
            Some(irradiance_path),
            Some(irradiance_size),
            Some(prefilter_path),
            Some(prefilter_size),
        ) = (
            output_size.filter(|&s| s != 0),
            non_empty(&self.irradiance),
            irradiance_size.filter(|&s| s != 0),
            non_empty(&self.prefilter),
            prefilter_size.filter(|&s| s != 0),
        )
        else {
            return Err(CliError::CubeMapArguments);
        };

        Ok(request.with_environment(EnvironmentOutputs {
            output_size: checked_size(output_size)?,
            irradiance_path,
            irradiance_size: checked_size(irradiance_size)?,
            prefilter_path,
            prefilter_size: checked_size(prefilter_size)?,
        }))
    }
}

fn exactly_one<T: Copy>(flags: &[(bool, T)]) -> Option<T> {
    let mut set = flags.iter().filter(|(on, _)| *on).map(|(_, value)| *value);
    match (set.next(), set.next()) {
        (Some(value), None) => Some(value),
        _ => None,
    }
}

fn non_empty(path: &Option<PathBuf>) -> Option<PathBuf> {
    path.clone().filter(|p| !p.as_os_str().is_empty())
}

fn checked_size(size: u64) -> Result<u32, CliError> {
    u32::try_from(size)
        .ok()
        .filter(|&s| s <= MAX_DIMENSION)
        .ok_or(CliError::InvalidOutputSize)
}
