//! Error types for a compilation run.
//!
//! Every error is fatal to the run that raised it and there are no retries.
//! An output file is either published whole or not at all. The CLI turns
//! these into a message and exit code 1.

use std::path::PathBuf;

use thiserror::Error;

use crate::texture::TextureError;

/// Errors that can occur while compiling a texture asset.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The source image could not be read or decoded.
    #[error("Failed to load a texture from {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    /// The source image or a requested output size violates a size precondition.
    #[error("Invalid texture size {width}×{height}: {reason}")]
    Size {
        width: u32,
        height: u32,
        reason: String,
    },

    /// The render backend could not be initialized.
    #[error("Failed to initialize a renderer: {0}")]
    Device(String),

    /// A texture, buffer, shader, program or frame buffer could not be created.
    #[error("Failed to create a GPU resource: {0}")]
    GpuResource(String),

    /// Header or per-mip compression failed.
    #[error("Texture compression failed: {0}")]
    Compression(#[from] TextureError),

    /// Channel reconstruction failed.
    ///
    /// Never raised by the normal-Z math itself; degenerate pixels are clamped.
    #[error("Channel reconstruction failed: {0}")]
    Reconstruction(String),

    /// The compilation request is inconsistent.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Filesystem error while publishing an output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    /// Convenience constructor for [`CompileError::Size`].
    pub fn size(width: u32, height: u32, reason: impl Into<String>) -> Self {
        CompileError::Size {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Returns true for [`CompileError::Size`].
    pub fn is_size_error(&self) -> bool {
        matches!(self, CompileError::Size { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_error_display() {
        let err = CompileError::size(100, 200, "must be a power of two");
        assert_eq!(
            err.to_string(),
            "Invalid texture size 100×200: must be a power of two"
        );
        assert!(err.is_size_error());
    }

    #[test]
    fn test_load_error_display() {
        let err = CompileError::Load {
            path: PathBuf::from("missing.png"),
            reason: "No such file".to_string(),
        };
        assert!(err.to_string().contains("missing.png"));
        assert!(!err.is_size_error());
    }

    #[test]
    fn test_from_texture_error() {
        let err: CompileError = TextureError::EncodingFailed("bad block".to_string()).into();
        assert!(matches!(err, CompileError::Compression(_)));
        assert!(err.to_string().contains("bad block"));
    }
}
