//! Block pixelation of a rectangle, in place.
//!
//! A region is cut into `block_size × block_size` cells anchored at its
//! top-left corner and every cell is replaced by its mean colour. This is
//! the same picture you get by area-downsampling the aligned part of the
//! region and blowing it back up with nearest-neighbour sampling.
//!
//! ## Remainder strips
//!
//! When the region is not a whole number of cells wide or tall, the leftover
//! strips are not given a second, partial grid. Instead:
//!
//! ```text
//!   ┌───────┬───────┬──┐
//!   │ cell  │ cell  │r │  r: right strip, one colour per row
//!   ├───────┼───────┤r │     (over the aligned rows only)
//!   │ cell  │ cell  │r │
//!   ├───────┴───────┴──┤
//!   │ b b b b b b b b b│  b: bottom strip, one colour per column
//!   └──────────────────┘     (across the full width)
//! ```
//!
//! Every pixel is written exactly once and the visible grid stays aligned to
//! the region's corner regardless of its size. The last partial row/column
//! reads as a smeared seam rather than a square cell; existing outputs rely
//! on this.
//!
//! Regions not larger than one cell in either dimension collapse to a
//! single colour.

use super::buffer::{ImageBuffer, MAX_CHANNELS, Point, Rect, unsigned_corners};
use super::calculations::{interaction_area, snap_to_grid};
use super::params::Averaging;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MosaicError {
    #[error("block size must be at least 1 pixel")]
    InvalidBlockSize,
    #[error("malformed rectangle ({x1},{y1})-({x2},{y2}): need x1 < x2 and y1 < y2")]
    MalformedRect { x1: i32, y1: i32, x2: i32, y2: i32 },
}

pub(crate) fn check_block_size(block_size: u32) -> Result<(), MosaicError> {
    if block_size == 0 {
        Err(MosaicError::InvalidBlockSize)
    } else {
        Ok(())
    }
}

/// Pixelation engine. Its only state is the [`Averaging`] strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MosaicEngine {
    averaging: Averaging,
}

impl MosaicEngine {
    pub fn new(averaging: Averaging) -> Self {
        Self { averaging }
    }

    pub fn averaging(&self) -> Averaging {
        self.averaging
    }

    /// Pixelate `rect` of `buffer` in place.
    ///
    /// Returns the clipped rectangle that was processed, or `None` when
    /// nothing of `rect` lies inside the buffer (the buffer is untouched).
    ///
    /// # Errors
    /// [`MosaicError::InvalidBlockSize`] for a zero block size and
    /// [`MosaicError::MalformedRect`] when `rect` has no area as given.
    pub fn pixelate_region(
        &self,
        buffer: &mut ImageBuffer,
        rect: Rect,
        block_size: u32,
    ) -> Result<Option<Rect>, MosaicError> {
        check_block_size(block_size)?;
        if rect.is_empty() {
            return Err(MosaicError::MalformedRect {
                x1: rect.x1,
                y1: rect.y1,
                x2: rect.x2,
                y2: rect.y2,
            });
        }
        let Some(area) = rect.clip(buffer.width(), buffer.height()) else {
            return Ok(None);
        };
        self.pixelate_clipped(buffer, &area, block_size);
        Ok(Some(area))
    }

    /// Pixelate the `4 × block_size` square around a click, in place.
    ///
    /// The click is first snapped down to the block grid, so every click
    /// inside the same cell hits the same rectangle. Returns that rectangle
    /// after clipping, or `None` when it falls outside the buffer.
    pub fn pixelate_at_point(
        &self,
        buffer: &mut ImageBuffer,
        point: Point,
        block_size: u32,
    ) -> Result<Option<Rect>, MosaicError> {
        check_block_size(block_size)?;
        let anchor = snap_to_grid(point, block_size);
        let Some(area) =
            interaction_area(anchor, block_size).clip(buffer.width(), buffer.height())
        else {
            return Ok(None);
        };
        self.pixelate_clipped(buffer, &area, block_size);
        Ok(Some(area))
    }

    fn pixelate_clipped(&self, buffer: &mut ImageBuffer, area: &Rect, block_size: u32) {
        let (x1, y1, x2, y2) = unsigned_corners(area);
        let (w, h) = (x2 - x1, y2 - y1);
        log::trace!("pixelate {w}x{h} at ({x1},{y1}) with {block_size}px cells");

        if w <= block_size || h <= block_size {
            self.flatten(buffer, x1, y1, x2, y2);
            return;
        }

        let aligned_w = w / block_size * block_size;
        let aligned_h = h / block_size * block_size;
        let step = block_size as usize;

        for by in (y1..y1 + aligned_h).step_by(step) {
            for bx in (x1..x1 + aligned_w).step_by(step) {
                self.flatten(buffer, bx, by, bx + block_size, by + block_size);
            }
        }

        if aligned_w < w {
            for row in y1..y1 + aligned_h {
                self.flatten(buffer, x1 + aligned_w, row, x2, row + 1);
            }
        }

        if aligned_h < h {
            for col in x1..x2 {
                self.flatten(buffer, col, y1 + aligned_h, col + 1, y2);
            }
        }
    }

    /// Replace `[x1,x2) × [y1,y2)` with its mean colour, unless gated.
    fn flatten(&self, buffer: &mut ImageBuffer, x1: u32, y1: u32, x2: u32, y2: u32) {
        let gated = matches!(self.averaging, Averaging::VarianceGated { .. });
        let stats = CellStats::measure(buffer, x1, y1, x2, y2, gated);
        if let Averaging::VarianceGated { threshold } = self.averaging {
            if stats.mean_std_dev() < threshold {
                return;
            }
        }
        let color = stats.mean();
        let c = buffer.channels() as usize;
        for y in y1..y2 {
            for px in buffer.row_span_mut(y, x1, x2).chunks_exact_mut(c) {
                px.copy_from_slice(&color[..c]);
            }
        }
    }
}

/// Per-channel sums over one cell.
struct CellStats {
    channels: usize,
    count: u64,
    sum: [u64; MAX_CHANNELS],
    sum_sq: [u64; MAX_CHANNELS],
}

impl CellStats {
    fn measure(
        buffer: &ImageBuffer,
        x1: u32,
        y1: u32,
        x2: u32,
        y2: u32,
        with_squares: bool,
    ) -> Self {
        let channels = buffer.channels() as usize;
        let mut stats = CellStats {
            channels,
            count: 0,
            sum: [0; MAX_CHANNELS],
            sum_sq: [0; MAX_CHANNELS],
        };
        for y in y1..y2 {
            for px in buffer.row_span(y, x1, x2).chunks_exact(channels) {
                for (ch, &v) in px.iter().enumerate() {
                    stats.sum[ch] += v as u64;
                    if with_squares {
                        stats.sum_sq[ch] += (v as u64) * (v as u64);
                    }
                }
                stats.count += 1;
            }
        }
        stats
    }

    /// Mean colour, rounded half up.
    fn mean(&self) -> [u8; MAX_CHANNELS] {
        let mut out = [0u8; MAX_CHANNELS];
        if self.count == 0 {
            return out;
        }
        for ch in 0..self.channels {
            out[ch] = ((self.sum[ch] + self.count / 2) / self.count) as u8;
        }
        out
    }

    /// Population standard deviation averaged over channels.
    fn mean_std_dev(&self) -> f32 {
        if self.count == 0 {
            return 0.0;
        }
        let n = self.count as f64;
        let total: f64 = (0..self.channels)
            .map(|ch| {
                let mean = self.sum[ch] as f64 / n;
                let var = (self.sum_sq[ch] as f64 / n - mean * mean).max(0.0);
                var.sqrt()
            })
            .sum();
        (total / self.channels as f64) as f32
    }
}
