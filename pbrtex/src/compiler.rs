//! One compilation run, end to end.
//!
//! ```text
//!  input ─► load ─┬─ flat ─► reconstruct ─► MipChain ──────────────► output DDS
//!                 │
//!                 └─ cube ─► CubeProjector ─┬─ faces ─► MipChain ────► environment DDS
//!                                           └─ cube mips ─┬─ irradiance ─► irradiance DDS
//!                                                         └─ prefilter ──► prefilter DDS
//! ```
//!
//! Every output goes through the [`CompressionDispatcher`]. Any error aborts the
//! run; outputs already published by earlier stages stay on disk.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::error::CompileError;
use crate::ibl::CubeProjector;
use crate::material::{MaterialKind, QualityMode, TextureRole};
use crate::mipmap::MipChain;
use crate::progress::{Progress, ProgressCallback};
use crate::reconstruct::{combine_normal_metalness_ao, prepare_flat, prepare_normal_metalness_ao};
use crate::render::BackendKind;
use crate::source::{SourceImage, MAX_DIMENSION};
use crate::surface::{Surface, WrapMode};
use crate::texture::{BlockCompressor, CompressionDispatcher, CompressionPlan, TextureFormat};

/// Extra outputs and sizes of a cube-map run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentOutputs {
    /// Face size of the environment cube map.
    pub output_size: u32,
    pub irradiance_path: PathBuf,
    /// Face size of the irradiance cube map.
    pub irradiance_size: u32,
    pub prefilter_path: PathBuf,
    /// Face size of the prefilter cube map's level 0.
    pub prefilter_size: u32,
}

/// What to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    pub kind: MaterialKind,
    pub quality: QualityMode,
    pub input: PathBuf,
    /// Main output; the environment cube map for cube-map runs.
    pub output: PathBuf,
    /// Required for cube maps, forbidden otherwise.
    pub environment: Option<EnvironmentOutputs>,
}

impl CompileRequest {
    pub fn new(
        kind: MaterialKind,
        quality: QualityMode,
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            kind,
            quality,
            input: input.into(),
            output: output.into(),
            environment: None,
        }
    }

    pub fn with_environment(mut self, environment: EnvironmentOutputs) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Check the request before touching the input.
    ///
    /// # Errors
    ///
    /// [`CompileError::InvalidRequest`] when cube-map outputs are missing for a
    /// cube map, present for a flat material, or a size is outside `1..=65535`.
    pub fn validate(&self) -> Result<(), CompileError> {
        if self.input.as_os_str().is_empty() {
            return Err(CompileError::InvalidRequest("input file is not specified".into()));
        }
        if self.output.as_os_str().is_empty() {
            return Err(CompileError::InvalidRequest("output file is not specified".into()));
        }

        match (&self.environment, self.kind) {
            (None, MaterialKind::CubeMap) => Err(CompileError::InvalidRequest(
                "cube maps require output, irradiance and prefilter sizes and paths".into(),
            )),
            (Some(_), kind) if kind.is_flat() => Err(CompileError::InvalidRequest(format!(
                "{} textures do not take cube map outputs",
                kind
            ))),
            (Some(env), _) => env.validate(),
            (None, _) => Ok(()),
        }
    }
}

impl EnvironmentOutputs {
    fn validate(&self) -> Result<(), CompileError> {
        for (name, size) in [
            ("output", self.output_size),
            ("irradiance", self.irradiance_size),
            ("prefilter", self.prefilter_size),
        ] {
            if size == 0 || size > MAX_DIMENSION {
                return Err(CompileError::InvalidRequest(format!(
                    "invalid {} size {}, expected 1..={}",
                    name, size, MAX_DIMENSION
                )));
            }
        }
        if self.irradiance_path.as_os_str().is_empty() || self.prefilter_path.as_os_str().is_empty() {
            return Err(CompileError::InvalidRequest(
                "cube maps require irradiance and prefilter output paths".into(),
            ));
        }
        Ok(())
    }
}

/// Library-side settings of a [`Compiler`].
pub struct CompilerSettings {
    backend: BackendKind,
    progress: Option<ProgressCallback>,
    compressor: Option<Box<dyn BlockCompressor>>,
}

impl CompilerSettings {
    pub fn new() -> Self {
        Self {
            backend: BackendKind::default(),
            progress: None,
            compressor: None,
        }
    }

    /// Render backend of the environment pipeline.
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Callback invoked after every encoded image.
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Replace the default block compressor.
    pub fn with_compressor(mut self, compressor: Box<dyn BlockCompressor>) -> Self {
        self.compressor = Some(compressor);
        self
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// One published output.
#[derive(Debug, Clone, PartialEq)]
pub struct StageReport {
    pub role: TextureRole,
    pub path: PathBuf,
    pub format: TextureFormat,
    /// Encoded (face, mip) images.
    pub images: usize,
    /// Rendering plus compression time of the stage.
    pub elapsed: Duration,
}

impl fmt::Display for StageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} compression took {:.2} seconds.",
            stage_title(self.role),
            self.elapsed.as_secs_f64()
        )
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompileReport {
    pub stages: Vec<StageReport>,
    pub elapsed: Duration,
}

impl CompileReport {
    pub fn outputs(&self) -> impl Iterator<Item = &Path> {
        self.stages.iter().map(|s| s.path.as_path())
    }
}

fn stage_title(role: TextureRole) -> &'static str {
    match role {
        TextureRole::Environment => "Cube map",
        TextureRole::Irradiance => "Irradiance map",
        TextureRole::Prefilter => "Prefilter map",
        _ => "Texture",
    }
}

/// Runs compilation requests.
pub struct Compiler {
    backend: BackendKind,
    progress: Option<ProgressCallback>,
    dispatcher: CompressionDispatcher,
}

impl Compiler {
    pub fn new(settings: CompilerSettings) -> Self {
        let dispatcher = match settings.compressor {
            Some(compressor) => CompressionDispatcher::with_compressor(compressor),
            None => CompressionDispatcher::new(),
        };
        Self {
            backend: settings.backend,
            progress: settings.progress,
            dispatcher,
        }
    }

    /// Compile one request.
    ///
    /// The request and the source dimensions are validated before any
    /// rendering or compression starts.
    pub fn compile(&self, request: &CompileRequest) -> Result<CompileReport, CompileError> {
        let started = Instant::now();
        info!(
            kind = %request.kind,
            quality = %request.quality,
            input = %request.input.display(),
            "Compiling texture"
        );

        match self.run(request) {
            Ok(stages) => {
                let report = CompileReport {
                    stages,
                    elapsed: started.elapsed(),
                };
                info!(
                    outputs = report.stages.len(),
                    elapsed_secs = report.elapsed.as_secs_f64(),
                    "Compilation finished"
                );
                Ok(report)
            }
            Err(e) => {
                error!(error = %e, input = %request.input.display(), "Compilation failed");
                Err(e)
            }
        }
    }

    fn run(&self, request: &CompileRequest) -> Result<Vec<StageReport>, CompileError> {
        request.validate()?;
        let source = SourceImage::load(&request.input, request.kind)?;

        match request.kind {
            MaterialKind::AlbedoRoughness | MaterialKind::Parallax => {
                let started = Instant::now();
                let chain = MipChain::build(prepare_flat(source)?);
                let stage = self.write_stage(
                    &request.output,
                    TextureRole::from(request.kind),
                    request.quality,
                    &[chain.into_levels()],
                    started,
                )?;
                Ok(vec![stage])
            }
            MaterialKind::NormalMetalnessAo => {
                let started = Instant::now();
                let parts = prepare_normal_metalness_ao(source)?;
                let normal = MipChain::build(parts.normal);
                let metalness_ao = MipChain::build(parts.metalness_ao);
                let levels = normal
                    .levels()
                    .iter()
                    .zip(metalness_ao.levels())
                    .map(|(n, m)| combine_normal_metalness_ao(n, m))
                    .collect::<Result<Vec<_>, _>>()?;
                let stage = self.write_stage(
                    &request.output,
                    TextureRole::NormalMetalnessAo,
                    request.quality,
                    &[levels],
                    started,
                )?;
                Ok(vec![stage])
            }
            MaterialKind::CubeMap => {
                let environment = request.environment.as_ref().ok_or_else(|| {
                    CompileError::InvalidRequest("cube map outputs are missing".into())
                })?;
                self.compile_environment(source, request, environment)
            }
        }
    }

    fn compile_environment(
        &self,
        source: SourceImage,
        request: &CompileRequest,
        environment: &EnvironmentOutputs,
    ) -> Result<Vec<StageReport>, CompileError> {
        let mut backend = self.backend.create()?;
        let mut projector = CubeProjector::new(backend.as_mut());
        info!(backend = projector.backend_name(), "Rendering environment maps");

        let panorama = projector.upload(source)?;
        let mut stages = Vec::with_capacity(3);

        let started = Instant::now();
        let faces: Vec<Vec<Surface>> = projector
            .project_faces(panorama, environment.output_size)?
            .into_iter()
            .map(|face| MipChain::build(face.with_wrap_mode(WrapMode::Clamp)).into_levels())
            .collect();
        stages.push(self.write_stage(
            &request.output,
            TextureRole::Environment,
            request.quality,
            &faces,
            started,
        )?);

        let cube = projector.build_cube_map(panorama, environment.output_size)?;

        let started = Instant::now();
        let faces: Vec<Vec<Surface>> = projector
            .render_irradiance(cube, environment.irradiance_size)?
            .into_iter()
            .map(|face| vec![face])
            .collect();
        stages.push(self.write_stage(
            &environment.irradiance_path,
            TextureRole::Irradiance,
            request.quality,
            &faces,
            started,
        )?);

        let started = Instant::now();
        let faces = projector.render_prefilter(
            cube,
            environment.prefilter_size,
            |face, mip| debug!(face = %face, mip, "Prefiltered level"),
        )?;
        stages.push(self.write_stage(
            &environment.prefilter_path,
            TextureRole::Prefilter,
            request.quality,
            &faces,
            started,
        )?);

        Ok(stages)
    }

    fn write_stage(
        &self,
        path: &Path,
        role: TextureRole,
        quality: QualityMode,
        faces: &[Vec<Surface>],
        started: Instant,
    ) -> Result<StageReport, CompileError> {
        let plan = CompressionPlan::resolve(role, quality);
        let report_progress = |progress: &Progress| {
            if let Some(callback) = &self.progress {
                callback(progress);
            }
        };

        let path = self
            .dispatcher
            .write(path, role, quality, faces, &report_progress)?;

        let stage = StageReport {
            role,
            path,
            format: plan.format,
            images: faces.iter().map(Vec::len).sum(),
            elapsed: started.elapsed(),
        };
        info!(
            role = %role,
            format = %stage.format,
            path = %stage.path.display(),
            elapsed_secs = stage.elapsed.as_secs_f64(),
            "{}",
            stage
        );
        Ok(stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube_outputs() -> EnvironmentOutputs {
        EnvironmentOutputs {
            output_size: 64,
            irradiance_path: PathBuf::from("irradiance.dds"),
            irradiance_size: 8,
            prefilter_path: PathBuf::from("prefilter.dds"),
            prefilter_size: 32,
        }
    }

    #[test]
    fn test_flat_request_is_valid() {
        let request = CompileRequest::new(
            MaterialKind::AlbedoRoughness,
            QualityMode::Production,
            "in.png",
            "out.dds",
        );
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_cube_map_requires_outputs() {
        let request = CompileRequest::new(
            MaterialKind::CubeMap,
            QualityMode::Production,
            "sky.exr",
            "sky.dds",
        );
        assert!(matches!(request.validate(), Err(CompileError::InvalidRequest(_))));
        assert!(request.with_environment(cube_outputs()).validate().is_ok());
    }

    #[test]
    fn test_flat_material_rejects_cube_outputs() {
        let request = CompileRequest::new(
            MaterialKind::Parallax,
            QualityMode::Development,
            "height.png",
            "height.dds",
        )
        .with_environment(cube_outputs());
        assert!(matches!(request.validate(), Err(CompileError::InvalidRequest(_))));
    }

    #[test]
    fn test_cube_sizes_must_be_in_range() {
        for (output, irradiance, prefilter) in [(0, 8, 8), (64, 65536, 8), (64, 8, 0)] {
            let request = CompileRequest::new(
                MaterialKind::CubeMap,
                QualityMode::NoCompression,
                "sky.exr",
                "sky.dds",
            )
            .with_environment(EnvironmentOutputs {
                output_size: output,
                irradiance_size: irradiance,
                prefilter_size: prefilter,
                ..cube_outputs()
            });
            assert!(request.validate().is_err(), "{} {} {}", output, irradiance, prefilter);
        }
    }

    #[test]
    fn test_empty_paths_are_rejected() {
        let request =
            CompileRequest::new(MaterialKind::Parallax, QualityMode::Production, "", "out.dds");
        assert!(request.validate().is_err());

        let request = CompileRequest::new(
            MaterialKind::CubeMap,
            QualityMode::Production,
            "sky.exr",
            "sky.dds",
        )
        .with_environment(EnvironmentOutputs {
            prefilter_path: PathBuf::new(),
            ..cube_outputs()
        });
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_stage_report_message() {
        let stage = StageReport {
            role: TextureRole::Irradiance,
            path: PathBuf::from("irradiance.dds"),
            format: TextureFormat::Rgba16Float,
            images: 6,
            elapsed: Duration::from_millis(1500),
        };
        assert_eq!(stage.to_string(), "Irradiance map compression took 1.50 seconds.");
    }

    #[test]
    fn test_missing_input_fails_with_load_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let compiler = Compiler::new(CompilerSettings::new());
        let request = CompileRequest::new(
            MaterialKind::AlbedoRoughness,
            QualityMode::NoCompression,
            dir.path().join("missing.png"),
            dir.path().join("out.dds"),
        );
        assert!(matches!(compiler.compile(&request), Err(CompileError::Load { .. })));
        assert!(!dir.path().join("out.dds").exists());
    }
}
