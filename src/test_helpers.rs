//! Shared test utilities for the mosaic-brush test suite.
//!
//! Provides deterministic synthetic buffers and region assertions that work
//! with [`ImageBuffer`] and [`Rect`].
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let mut buf = gradient_rgb(80, 60);
//! let before = buf.clone();
//! // ... pixelate something inside `mask` ...
//! assert_outside_unchanged(&before, &buf, &mask);
//! ```

use crate::imaging::{ImageBuffer, Point, Rect};
use std::path::Path;

// =========================================================================
// Synthetic buffers
// =========================================================================

/// A buffer where every pixel is `color`. The channel count is `color.len()`.
pub fn solid(width: u32, height: u32, color: &[u8]) -> ImageBuffer {
    ImageBuffer::filled(width, height, color).unwrap()
}

/// RGB buffer with pixel `(x, y)` = `(x % 256, y % 256, (x + y) % 256)`.
///
/// Every pixel differs from its neighbours, so any write shows up.
pub fn gradient_rgb(width: u32, height: u32) -> ImageBuffer {
    let mut buf = ImageBuffer::new(width, height, 3).unwrap();
    for y in 0..height {
        for x in 0..width {
            buf.set_pixel(x, y, &[(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8]);
        }
    }
    buf
}

/// Single-channel buffer with pixel `(x, y)` = `10x + y` (wrapping at 256).
///
/// Handy for checking exact means on small grids by hand.
pub fn coordinate_gray(width: u32, height: u32) -> ImageBuffer {
    let mut buf = ImageBuffer::new(width, height, 1).unwrap();
    for y in 0..height {
        for x in 0..width {
            buf.set_pixel(x, y, &[((10 * x + y) % 256) as u8]);
        }
    }
    buf
}

// =========================================================================
// Assertions
// =========================================================================

/// Assert that every pixel outside `region` is identical in both buffers.
pub fn assert_outside_unchanged(before: &ImageBuffer, after: &ImageBuffer, region: &Rect) {
    assert_eq!(
        (before.width(), before.height(), before.channels()),
        (after.width(), after.height(), after.channels()),
        "buffer shape changed"
    );
    for y in 0..before.height() {
        for x in 0..before.width() {
            if region.contains(Point::new(x as i32, y as i32)) {
                continue;
            }
            assert_eq!(
                before.pixel(x, y),
                after.pixel(x, y),
                "pixel ({x},{y}) outside {region:?} changed"
            );
        }
    }
}

// =========================================================================
// Filesystem fixtures
// =========================================================================

/// Write `names` as empty files under `dir`.
pub fn touch_all(dir: &Path, names: &[&str]) {
    for name in names {
        std::fs::write(dir.join(name), b"").unwrap();
    }
}

/// Write a real PNG of `buffer` to `path` using the production backend.
pub fn write_png(path: &Path, buffer: &ImageBuffer) {
    use crate::imaging::{ImageBackend, Quality, RustBackend, SaveParams};
    RustBackend::new()
        .save(&SaveParams {
            image: buffer,
            output: path.to_path_buf(),
            quality: Quality::default(),
            metadata: None,
        })
        .unwrap();
}
