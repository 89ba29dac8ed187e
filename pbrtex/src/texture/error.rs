//! Error types for texture compression and container writing.

use std::fmt;

/// Errors that can occur while compressing images or writing a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureError {
    /// Image dimensions are invalid for the requested format.
    InvalidDimensions {
        width: u32,
        height: u32,
        reason: String,
    },
    /// Block or raw encoding of one image failed.
    EncodingFailed(String),
    /// The container header could not be built or written.
    ContainerFailed(String),
    /// The images appended do not match the container layout.
    InvalidLayout(String),
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureError::InvalidDimensions {
                width,
                height,
                reason,
            } => {
                write!(f, "Cannot encode a {}×{} surface: {}", width, height, reason)
            }
            TextureError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
            TextureError::ContainerFailed(msg) => write!(f, "Container failed: {}", msg),
            TextureError::InvalidLayout(msg) => write!(f, "Invalid image layout: {}", msg),
        }
    }
}

impl std::error::Error for TextureError {}

impl From<ddsfile::Error> for TextureError {
    fn from(err: ddsfile::Error) -> Self {
        TextureError::ContainerFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_dimensions_message() {
        let err = TextureError::InvalidDimensions {
            width: 0,
            height: 4,
            reason: "empty image".to_string(),
        };
        assert_eq!(err.to_string(), "Cannot encode a 0×4 surface: empty image");
    }

    #[test]
    fn test_texture_error_display_encoding_failed() {
        let err = TextureError::EncodingFailed("compression error".to_string());
        assert_eq!(err.to_string(), "Encoding failed: compression error");
    }

    #[test]
    fn test_texture_error_display_container_failed() {
        let err = TextureError::ContainerFailed("bad header".to_string());
        assert_eq!(err.to_string(), "Container failed: bad header");
    }

    #[test]
    fn test_texture_error_display_invalid_layout() {
        let err = TextureError::InvalidLayout("expected 9 images, got 8".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid image layout: expected 9 images, got 8"
        );
    }
}
