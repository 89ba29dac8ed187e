//! Texture compression and container output.
//!
//! Every compiled output goes through the same path: the (role, quality)
//! pair resolves to a [`CompressionPlan`], each (face, mip) image is encoded
//! by a [`BlockCompressor`], and the images are collected into a
//! [`DdsContainer`] that is published atomically.
//!
//! ```text
//! ┌────────────────────────┐
//! │ CompressionDispatcher  │  (role, quality) → CompressionPlan
//! └───────────┬────────────┘
//!             │ per (face, mip)
//!             ▼
//! ┌────────────────────────┐
//! │ BlockCompressor        │ (trait)
//! │  └ IntelTexCompressor  │  BC3/BC4/BC6H/BC7, raw
//! └───────────┬────────────┘
//!             ▼
//! ┌────────────────────────┐
//! │ DdsContainer           │  DX10 header, temp file + rename
//! └────────────────────────┘
//! ```

mod compressor;
mod dds;
mod dispatcher;
mod error;
mod format;

pub use compressor::{pad_to_blocks, BlockCompressor, IntelTexCompressor};
pub use dds::{ContainerLayout, DdsContainer};
pub use dispatcher::CompressionDispatcher;
pub use error::TextureError;
pub use format::{ChannelLayout, CompressionPlan, Effort, PixelType, TextureFormat};
