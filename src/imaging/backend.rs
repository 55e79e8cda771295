//! Image I/O backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations the rest of the
//! crate needs from the filesystem: identify, load and save.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! and `png` crates. The mosaic core never touches a backend; only the
//! session loader, the save workflows and the CLI do.

use super::buffer::{ImageBuffer, ImageBufferError};
use super::params::SaveParams;
use crate::metadata::{MetadataStatus, MosaicMetadata};
use image::ImageFormat;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {message}")]
    Decode { path: String, message: String },
    #[error("Failed to encode {path}: {message}")]
    Encode { path: String, message: String },
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("{0:?} cannot carry embedded metadata")]
    UnsupportedMetadataFormat(ImageFormat),
    #[error(transparent)]
    Buffer(#[from] ImageBufferError),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// A decoded image plus whatever mosaic metadata it carried.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    pub buffer: ImageBuffer,
    pub format: ImageFormat,
    pub metadata: Option<MosaicMetadata>,
}

/// Trait for image I/O backends.
pub trait ImageBackend: Sync {
    /// Get image dimensions without a full decode where possible.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode an image into an 8-bit buffer and read its mosaic metadata.
    fn load(&self, path: &Path) -> Result<LoadedImage, BackendError>;

    /// Encode and write an image.
    ///
    /// Formats without text chunks are still written; the metadata is
    /// dropped and [`MetadataStatus::Unsupported`] is returned.
    fn save(&self, params: &SaveParams<'_>) -> Result<MetadataStatus, BackendError>;
}
