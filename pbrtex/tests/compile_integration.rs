//! Integration tests for complete compilation runs.
//!
//! These tests write real PNG/EXR inputs into a temporary directory, run the
//! compiler end to end and read the produced DDS files back:
//! - flat materials: mip chains, formats, channel packing
//! - size validation before any output is produced
//! - cube maps on the software backend: environment, irradiance and prefilter
//!
//! Run with: `cargo test --test compile_integration`

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ddsfile::{Dds, DxgiFormat};
use half::f16;
use image::{DynamicImage, ImageBuffer, Rgba};
use tempfile::TempDir;

use pbrtex::{
    BackendKind, CompileError, CompileRequest, Compiler, CompilerSettings, EnvironmentOutputs,
    MaterialKind, Progress, QualityMode, TextureRole,
};

// ============================================================================
// Helper Functions
// ============================================================================

/// Write a constant RGBA8 PNG.
fn write_png(dir: &TempDir, name: &str, width: u32, height: u32, pixel: [u8; 4]) -> PathBuf {
    let path = dir.path().join(name);
    let buffer = ImageBuffer::from_pixel(width, height, Rgba(pixel));
    DynamicImage::ImageRgba8(buffer).save(&path).unwrap();
    path
}

/// Write a constant RGBA32F OpenEXR panorama.
fn write_exr(dir: &TempDir, name: &str, width: u32, height: u32, value: f32) -> PathBuf {
    let path = dir.path().join(name);
    let buffer = ImageBuffer::from_pixel(width, height, Rgba([value, value, value, 1.0]));
    DynamicImage::ImageRgba32F(buffer).save(&path).unwrap();
    path
}

fn read_dds(path: &Path) -> Dds {
    let mut file = File::open(path).unwrap();
    Dds::read(&mut file).unwrap()
}

fn half_floats(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|b| f16::from_le_bytes([b[0], b[1]]).to_f32())
        .collect()
}

fn compile(request: &CompileRequest) -> Result<pbrtex::CompileReport, CompileError> {
    Compiler::new(CompilerSettings::new().with_backend(BackendKind::Software)).compile(request)
}

// ============================================================================
// Flat materials
// ============================================================================

/// A 256×256 albedo map without compression has 9 levels, each a quarter of
/// the previous one.
#[test]
fn test_albedo_uncompressed_mip_chain() {
    let dir = TempDir::new().unwrap();
    let input = write_png(&dir, "albedo.png", 256, 256, [10, 20, 30, 255]);
    let output = dir.path().join("albedo.dds");

    let request = CompileRequest::new(
        MaterialKind::AlbedoRoughness,
        QualityMode::NoCompression,
        &input,
        &output,
    );
    let report = compile(&request).unwrap();
    assert_eq!(report.stages.len(), 1);
    assert_eq!(report.stages[0].images, 9);

    let dds = read_dds(&output);
    assert_eq!(dds.get_num_mipmap_levels(), 9);
    assert_eq!(dds.get_dxgi_format(), Some(DxgiFormat::R8G8B8A8_UNorm));

    let level_sizes: Vec<usize> = (0..9).map(|m| (256usize >> m).pow(2) * 4).collect();
    for pair in level_sizes.windows(2).take(7) {
        assert_eq!(pair[0], pair[1] * 4);
    }
    assert_eq!(dds.data.len(), level_sizes.iter().sum::<usize>());

    // Channel order survives the BGRA round trip.
    assert_eq!(&dds.data[..4], &[10, 20, 30, 255]);
    let last = dds.data.len() - 4;
    assert_eq!(&dds.data[last..], &[10, 20, 30, 255]);
}

/// Non-power-of-two flat inputs fail before anything is written.
#[test]
fn test_non_power_of_two_flat_input_is_rejected() {
    let dir = TempDir::new().unwrap();
    let input = write_png(&dir, "odd.png", 300, 256, [0, 0, 0, 255]);
    let output = dir.path().join("odd.dds");

    let request = CompileRequest::new(
        MaterialKind::AlbedoRoughness,
        QualityMode::Production,
        &input,
        &output,
    );
    let err = compile(&request).unwrap_err();
    assert!(err.is_size_error(), "unexpected error: {}", err);
    assert!(!output.exists());
}

/// Normal/metalness/AO levels pack `(normal.R, normal.G, metalness, AO)`.
#[test]
fn test_normal_metalness_ao_packing() {
    let dir = TempDir::new().unwrap();
    let input = write_png(&dir, "normal.png", 8, 8, [128, 128, 200, 50]);
    let output = dir.path().join("normal.dds");

    let request = CompileRequest::new(
        MaterialKind::NormalMetalnessAo,
        QualityMode::NoCompression,
        &input,
        &output,
    );
    compile(&request).unwrap();

    let dds = read_dds(&output);
    assert_eq!(dds.get_num_mipmap_levels(), 4);
    assert_eq!(&dds.data[..4], &[128, 128, 200, 50]);
}

/// Parallax maps keep a single channel.
#[test]
fn test_parallax_is_single_channel() {
    let dir = TempDir::new().unwrap();
    let input = write_png(&dir, "height.png", 16, 8, [77, 0, 0, 255]);
    let output = dir.path().join("height.dds");

    let request = CompileRequest::new(
        MaterialKind::Parallax,
        QualityMode::NoCompression,
        &input,
        &output,
    );
    compile(&request).unwrap();

    let dds = read_dds(&output);
    assert_eq!(dds.get_dxgi_format(), Some(DxgiFormat::R8_UNorm));
    assert_eq!(dds.get_num_mipmap_levels(), 5);
    // 16×8, 8×4, 4×2, 2×1, 1×1
    assert_eq!(dds.data.len(), 128 + 32 + 8 + 2 + 1);
    assert!(dds.data.iter().all(|&v| v == 77));
}

/// Development albedo maps use BC3 with padded small mips.
#[test]
fn test_development_albedo_is_bc3() {
    let dir = TempDir::new().unwrap();
    let input = write_png(&dir, "albedo.png", 16, 16, [200, 100, 50, 255]);
    let output = dir.path().join("albedo.dds");

    let request = CompileRequest::new(
        MaterialKind::AlbedoRoughness,
        QualityMode::Development,
        &input,
        &output,
    );
    compile(&request).unwrap();

    let dds = read_dds(&output);
    assert_eq!(dds.get_dxgi_format(), Some(DxgiFormat::BC3_UNorm));
    // 16 blocks, 4, 1, 1 (2×2 padded), 1 (1×1 padded) at 16 bytes each.
    assert_eq!(dds.data.len(), (16 + 4 + 1 + 1 + 1) * 16);
}

/// The progress callback sees every encoded image.
#[test]
fn test_progress_reports_every_image() {
    let dir = TempDir::new().unwrap();
    let input = write_png(&dir, "albedo.png", 32, 32, [1, 2, 3, 4]);
    let output = dir.path().join("albedo.dds");

    let calls = Arc::new(AtomicUsize::new(0));
    let last_percent = Arc::new(AtomicUsize::new(0));
    let settings = {
        let calls = Arc::clone(&calls);
        let last_percent = Arc::clone(&last_percent);
        CompilerSettings::new().with_progress(Box::new(move |progress: &Progress| {
            assert_eq!(progress.stage, TextureRole::AlbedoRoughness);
            calls.fetch_add(1, Ordering::SeqCst);
            last_percent.store(progress.percent() as usize, Ordering::SeqCst);
        }))
    };

    let request = CompileRequest::new(
        MaterialKind::AlbedoRoughness,
        QualityMode::NoCompression,
        &input,
        &output,
    );
    Compiler::new(settings).compile(&request).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 6);
    assert_eq!(last_percent.load(Ordering::SeqCst), 100);
}

// ============================================================================
// Cube maps
// ============================================================================

fn cube_request(dir: &TempDir, input: PathBuf) -> CompileRequest {
    CompileRequest::new(
        MaterialKind::CubeMap,
        QualityMode::NoCompression,
        input,
        dir.path().join("sky.dds"),
    )
    .with_environment(EnvironmentOutputs {
        output_size: 4,
        irradiance_path: dir.path().join("sky_irradiance.dds"),
        irradiance_size: 2,
        prefilter_path: dir.path().join("sky_prefilter.dds"),
        prefilter_size: 2,
    })
}

/// A constant panorama produces constant environment, irradiance and
/// prefilter cube maps.
#[test]
fn test_cube_map_outputs_on_software_backend() {
    let dir = TempDir::new().unwrap();
    let input = write_exr(&dir, "sky.exr", 16, 8, 0.5);
    let request = cube_request(&dir, input);

    let report = compile(&request).unwrap();
    let roles: Vec<_> = report.stages.iter().map(|s| s.role).collect();
    assert_eq!(
        roles,
        vec![
            TextureRole::Environment,
            TextureRole::Irradiance,
            TextureRole::Prefilter
        ]
    );

    // Environment: 4, 2, 1 per face.
    let environment = read_dds(&request.output);
    assert_eq!(environment.get_dxgi_format(), Some(DxgiFormat::R16G16B16A16_Float));
    assert_eq!(environment.get_num_mipmap_levels(), 3);
    assert_eq!(environment.data.len(), 6 * (16 + 4 + 1) * 8);
    for texel in half_floats(&environment.data).chunks_exact(4) {
        assert!((texel[0] - 0.5).abs() < 1e-3, "{:?}", texel);
    }

    let outputs = request.environment.as_ref().unwrap();

    // Irradiance: one 2×2 level per face.
    let irradiance = read_dds(&outputs.irradiance_path);
    assert_eq!(irradiance.get_num_mipmap_levels(), 1);
    assert_eq!(irradiance.data.len(), 6 * 4 * 8);
    for texel in half_floats(&irradiance.data).chunks_exact(4) {
        assert!((texel[0] - 0.5).abs() < 0.02, "{:?}", texel);
        assert_eq!(texel[3], 1.0);
    }

    // Prefilter: 2, 1 per face.
    let prefilter = read_dds(&outputs.prefilter_path);
    assert_eq!(prefilter.get_num_mipmap_levels(), 2);
    assert_eq!(prefilter.data.len(), 6 * (4 + 1) * 8);
    for texel in half_floats(&prefilter.data).chunks_exact(4) {
        assert!((texel[0] - 0.5).abs() < 1e-2, "{:?}", texel);
    }
}

/// Cube map runs need their extra outputs.
#[test]
fn test_cube_map_without_outputs_is_invalid() {
    let dir = TempDir::new().unwrap();
    let input = write_exr(&dir, "sky.exr", 8, 4, 1.0);
    let output = dir.path().join("sky.dds");

    let request = CompileRequest::new(
        MaterialKind::CubeMap,
        QualityMode::Production,
        &input,
        &output,
    );
    assert!(matches!(
        compile(&request),
        Err(CompileError::InvalidRequest(_))
    ));
    assert!(!output.exists());
}

/// Cube map panoramas do not need power-of-two dimensions.
#[test]
fn test_cube_map_accepts_non_power_of_two_panorama() {
    let dir = TempDir::new().unwrap();
    let input = write_exr(&dir, "sky.exr", 12, 6, 0.25);
    let request = cube_request(&dir, input);
    assert!(compile(&request).is_ok());
}
