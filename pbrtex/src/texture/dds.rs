//! DDS (DX10 header) container writer.
//!
//! A [`DdsContainer`] is created from the output layout, receives one encoded
//! image per (face, mip) in face-major order and is published with
//! [`DdsContainer::finish`]. Nothing touches the destination path until the
//! layout is complete; the file is written to a temporary sibling and renamed
//! into place.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use ddsfile::{AlphaMode as DdsAlphaMode, D3D10ResourceDimension, Dds, NewDxgiParams};

use super::format::TextureFormat;
use super::TextureError;
use crate::mipmap::mip_dimension;
use crate::surface::AlphaMode;

/// Shape of a compiled texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerLayout {
    pub width: u32,
    pub height: u32,
    pub mip_count: u32,
    /// 1 for flat textures, 6 for cube maps.
    pub faces: u32,
    pub format: TextureFormat,
    pub alpha_mode: AlphaMode,
}

impl ContainerLayout {
    /// Layout of a 2D texture.
    pub fn flat(width: u32, height: u32, mip_count: u32, format: TextureFormat) -> Self {
        Self {
            width,
            height,
            mip_count,
            faces: 1,
            format,
            alpha_mode: AlphaMode::Transparency,
        }
    }

    /// Layout of a square cube map.
    pub fn cube(size: u32, mip_count: u32, format: TextureFormat) -> Self {
        Self {
            width: size,
            height: size,
            mip_count,
            faces: 6,
            format,
            alpha_mode: AlphaMode::Transparency,
        }
    }

    pub fn with_alpha_mode(mut self, alpha_mode: AlphaMode) -> Self {
        self.alpha_mode = alpha_mode;
        self
    }

    pub fn is_cubemap(&self) -> bool {
        self.faces == 6
    }

    /// Total number of images the container holds.
    pub fn image_count(&self) -> usize {
        (self.faces * self.mip_count) as usize
    }

    /// Dimensions of mip `level`.
    pub fn level_dimensions(&self, level: u32) -> (u32, u32) {
        (
            mip_dimension(self.width, level),
            mip_dimension(self.height, level),
        )
    }

    /// Encoded size of one image at mip `level`.
    pub fn image_size(&self, level: u32) -> usize {
        let (w, h) = self.level_dimensions(level);
        self.format.image_size(w, h)
    }

    /// Total size of the pixel data, excluding headers.
    pub fn data_size(&self) -> usize {
        let per_face: usize = (0..self.mip_count).map(|m| self.image_size(m)).sum();
        per_face * self.faces as usize
    }
}

/// Accumulates encoded images and writes them as one DDS file.
pub struct DdsContainer {
    path: PathBuf,
    layout: ContainerLayout,
    dds: Dds,
    appended: usize,
}

impl DdsContainer {
    /// Build the header for `layout`.
    ///
    /// # Arguments
    ///
    /// * `path` - Destination of the published file
    /// * `layout` - Dimensions, mip and face counts, format
    pub fn create(path: impl Into<PathBuf>, layout: ContainerLayout) -> Result<Self, TextureError> {
        if layout.width == 0 || layout.height == 0 || layout.mip_count == 0 {
            return Err(TextureError::InvalidDimensions {
                width: layout.width,
                height: layout.height,
                reason: format!("{} mip levels", layout.mip_count),
            });
        }
        if layout.faces != 1 && layout.faces != 6 {
            return Err(TextureError::InvalidLayout(format!(
                "{} faces, expected 1 or 6",
                layout.faces
            )));
        }

        let alpha_mode = match layout.alpha_mode {
            AlphaMode::Opaque => DdsAlphaMode::Opaque,
            AlphaMode::Transparency => DdsAlphaMode::Straight,
        };

        let mut dds = Dds::new_dxgi(NewDxgiParams {
            height: layout.height,
            width: layout.width,
            depth: None,
            format: layout.format.dxgi_format(),
            mipmap_levels: Some(layout.mip_count),
            array_layers: None,
            caps2: None,
            is_cubemap: layout.is_cubemap(),
            resource_dimension: D3D10ResourceDimension::Texture2D,
            alpha_mode,
        })?;
        dds.data = Vec::with_capacity(layout.data_size());

        Ok(Self {
            path: path.into(),
            layout,
            dds,
            appended: 0,
        })
    }

    pub fn layout(&self) -> &ContainerLayout {
        &self.layout
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// (face, mip) of the next image to append.
    pub fn next_slot(&self) -> Option<(u32, u32)> {
        (self.appended < self.layout.image_count()).then(|| {
            let index = self.appended as u32;
            (index / self.layout.mip_count, index % self.layout.mip_count)
        })
    }

    /// Append the next encoded image.
    pub fn append(&mut self, image: &[u8]) -> Result<(), TextureError> {
        let Some((face, mip)) = self.next_slot() else {
            return Err(TextureError::InvalidLayout(format!(
                "container already holds {} images",
                self.layout.image_count()
            )));
        };

        let expected = self.layout.image_size(mip);
        if image.len() != expected {
            return Err(TextureError::InvalidLayout(format!(
                "face {} mip {} is {} bytes, expected {}",
                face,
                mip,
                image.len(),
                expected
            )));
        }

        self.dds.data.extend_from_slice(image);
        self.appended += 1;
        Ok(())
    }

    /// Write the container atomically.
    ///
    /// Fails without touching `path` if images are missing.
    pub fn finish(self) -> Result<PathBuf, TextureError> {
        if self.appended != self.layout.image_count() {
            return Err(TextureError::InvalidLayout(format!(
                "expected {} images, got {}",
                self.layout.image_count(),
                self.appended
            )));
        }

        let temp_path = temp_sibling(&self.path);
        let written = write_dds(&self.dds, &temp_path).and_then(|()| {
            fs::rename(&temp_path, &self.path)
                .map_err(|e| TextureError::ContainerFailed(format!("rename failed: {}", e)))
        });
        if written.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        written?;

        tracing::debug!(
            path = %self.path.display(),
            format = %self.layout.format,
            bytes = self.layout.data_size(),
            "Wrote DDS container"
        );
        Ok(self.path)
    }
}

fn write_dds(dds: &Dds, path: &Path) -> Result<(), TextureError> {
    let file = File::create(path)
        .map_err(|e| TextureError::ContainerFailed(format!("{}: {}", path.display(), e)))?;
    let mut writer = BufWriter::new(file);
    dds.write(&mut writer)?;
    writer
        .flush()
        .map_err(|e| TextureError::ContainerFailed(format!("{}: {}", path.display(), e)))
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
