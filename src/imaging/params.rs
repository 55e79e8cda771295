//! Parameter types for mosaic and save operations.
//!
//! These types describe *what* to do, not *how*. They sit between the
//! session/CLI layer (which decides sizes and targets) and the engine or
//! [`backend`](super::backend) (which does the pixel and file work).
//!
//! ## Types
//!
//! - [`SizePolicy`]: FANZA-proportional or fixed cell size.
//! - [`Multiplier`]: integer scale 1–4 applied on top of the policy. Clamped on construction.
//! - [`Averaging`]: how a cell's colour is chosen (uniform mean, or variance-gated).
//! - [`Quality`]: JPEG quality (1–100, default 95). Clamped on construction.
//! - [`SaveParams`]: everything needed to write a buffer to disk.

use super::buffer::ImageBuffer;
use super::calculations::fanza_block_size;
use crate::metadata::MosaicMetadata;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Smallest and largest custom cell size the UI layer accepts.
pub const CUSTOM_SIZE_RANGE: (u32, u32) = (1, 100);

/// How the edge length of one mosaic cell is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizePolicy {
    /// FANZA mode: derived from the image's longer edge.
    Proportional,
    /// Custom mode: a user-chosen edge length.
    Fixed(u32),
}

impl SizePolicy {
    /// Custom policy with the size clamped into [`CUSTOM_SIZE_RANGE`].
    pub fn custom(size: u32) -> Self {
        Self::Fixed(size.clamp(CUSTOM_SIZE_RANGE.0, CUSTOM_SIZE_RANGE.1))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Proportional => "FANZA",
            Self::Fixed(_) => "custom",
        }
    }
}

/// Cell size for an image of the given shape.
///
/// `Fixed(0)` passes through unchanged; the engine rejects it.
pub fn compute_block_size(policy: SizePolicy, height: u32, width: u32) -> u32 {
    match policy {
        SizePolicy::Proportional => fanza_block_size(height, width),
        SizePolicy::Fixed(n) => n,
    }
}

/// Integer scale applied to the policy size (1–4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Multiplier(u32);

impl Multiplier {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 4))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    pub fn apply(self, block_size: u32) -> u32 {
        block_size.saturating_mul(self.0)
    }
}

impl Default for Multiplier {
    fn default() -> Self {
        Self(1)
    }
}

/// Colour selection for each mosaic cell.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Averaging {
    /// Every cell becomes its mean colour.
    #[default]
    Uniform,
    /// Cells whose mean per-channel standard deviation is below `threshold`
    /// are treated as already flat and left untouched.
    VarianceGated { threshold: f32 },
}

impl Averaging {
    pub const DEFAULT_VARIANCE_THRESHOLD: f32 = 5.0;
}

/// Quality setting for lossy encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(95)
    }
}

/// Parameters for writing a buffer to disk.
///
/// The output format follows the extension of `output`. `metadata` is only
/// embedded where the format supports text chunks.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveParams<'a> {
    pub image: &'a ImageBuffer,
    pub output: PathBuf,
    pub quality: Quality,
    pub metadata: Option<MosaicMetadata>,
}
