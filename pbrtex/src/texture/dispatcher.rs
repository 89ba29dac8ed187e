//! Per-output encode loop.

use std::path::{Path, PathBuf};

use super::compressor::{BlockCompressor, IntelTexCompressor};
use super::dds::{ContainerLayout, DdsContainer};
use super::format::CompressionPlan;
use super::TextureError;
use crate::material::{QualityMode, TextureRole};
use crate::progress::Progress;
use crate::surface::Surface;

/// Resolves the plan for an output and encodes every (face, mip) image into
/// one container.
pub struct CompressionDispatcher {
    compressor: Box<dyn BlockCompressor>,
}

impl CompressionDispatcher {
    /// Dispatcher using [`IntelTexCompressor`].
    pub fn new() -> Self {
        Self::with_compressor(Box::new(IntelTexCompressor::new()))
    }

    /// Dispatcher using a custom compressor.
    pub fn with_compressor(compressor: Box<dyn BlockCompressor>) -> Self {
        Self { compressor }
    }

    pub fn compressor_name(&self) -> &str {
        self.compressor.name()
    }

    /// Encode and publish one output.
    ///
    /// `faces` holds one mip chain per face (1 for flat textures, 6 for cube
    /// maps), level 0 first. `progress` is called after every image.
    ///
    /// # Arguments
    ///
    /// * `path` - Destination file
    /// * `role` - Output being produced
    /// * `quality` - Quality mode of the run
    /// * `faces` - Mip chains in DDS face order
    /// * `progress` - Per-image progress callback
    pub fn write(
        &self,
        path: &Path,
        role: TextureRole,
        quality: QualityMode,
        faces: &[Vec<Surface>],
        progress: &dyn Fn(&Progress),
    ) -> Result<PathBuf, TextureError> {
        let plan = CompressionPlan::resolve(role, quality);

        let base = faces
            .first()
            .and_then(|levels| levels.first())
            .ok_or_else(|| TextureError::InvalidLayout(format!("{} has no images", role)))?;
        let mip_count = faces[0].len() as u32;
        if faces.iter().any(|levels| levels.len() as u32 != mip_count) {
            return Err(TextureError::InvalidLayout(format!(
                "{} faces have different mip counts",
                role
            )));
        }

        let layout = match faces.len() {
            6 => ContainerLayout::cube(base.width(), mip_count, plan.format),
            _ => ContainerLayout::flat(base.width(), base.height(), mip_count, plan.format),
        }
        .with_alpha_mode(base.alpha_mode());
        if layout.faces as usize != faces.len() {
            return Err(TextureError::InvalidLayout(format!(
                "{} has {} faces",
                role,
                faces.len()
            )));
        }

        tracing::debug!(
            role = %role,
            format = %plan.format,
            width = layout.width,
            height = layout.height,
            mips = mip_count,
            faces = layout.faces,
            compressor = self.compressor.name(),
            "Compressing texture"
        );

        let mut container = DdsContainer::create(path, layout)?;
        let total = layout.image_count();
        let mut completed = 0;

        for (face, levels) in faces.iter().enumerate() {
            for (mip, surface) in levels.iter().enumerate() {
                let expected = layout.level_dimensions(mip as u32);
                if (surface.width(), surface.height()) != expected {
                    return Err(TextureError::InvalidDimensions {
                        width: surface.width(),
                        height: surface.height(),
                        reason: format!(
                            "face {} mip {} should be {}×{}",
                            face, mip, expected.0, expected.1
                        ),
                    });
                }

                let encoded = self.compressor.compress(surface, &plan)?;
                container.append(&encoded)?;

                completed += 1;
                progress(&Progress::new(role, completed, total));
            }
        }

        container.finish()
    }
}

impl Default for CompressionDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mipmap::MipChain;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct FailingCompressor;

    impl BlockCompressor for FailingCompressor {
        fn compress(&self, _: &Surface, _: &CompressionPlan) -> Result<Vec<u8>, TextureError> {
            Err(TextureError::EncodingFailed("codec unavailable".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_write_flat_reports_progress() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("albedo.dds");
        let chain = MipChain::build(Surface::new(16, 16)).into_levels();

        let calls = AtomicUsize::new(0);
        let written = CompressionDispatcher::new()
            .write(
                &path,
                TextureRole::AlbedoRoughness,
                QualityMode::NoCompression,
                &[chain],
                &|p| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    assert_eq!(p.total, 5);
                },
            )
            .unwrap();

        assert_eq!(written, path);
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        let expected: u64 = [1024, 256, 64, 16, 4].iter().sum::<u64>();
        assert!(std::fs::metadata(&path).unwrap().len() > expected);
    }

    #[test]
    fn test_write_rejects_mismatched_faces() {
        let dir = TempDir::new().unwrap();
        let faces: Vec<_> = (0..6)
            .map(|i| MipChain::build(Surface::new(4 >> (i % 2), 4 >> (i % 2))).into_levels())
            .collect();
        let err = CompressionDispatcher::new()
            .write(
                &dir.path().join("cube.dds"),
                TextureRole::Environment,
                QualityMode::NoCompression,
                &faces,
                &|_| {},
            )
            .unwrap_err();
        assert!(matches!(err, TextureError::InvalidLayout(_)));
    }

    #[test]
    fn test_compression_failure_leaves_no_output() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("parallax.dds");
        let chain = MipChain::build(Surface::new(4, 4)).into_levels();

        let err = CompressionDispatcher::with_compressor(Box::new(FailingCompressor))
            .write(
                &path,
                TextureRole::Parallax,
                QualityMode::Production,
                &[chain],
                &|_| {},
            )
            .unwrap_err();

        assert!(matches!(err, TextureError::EncodingFailed(_)));
        assert!(!path.exists());
    }
}
