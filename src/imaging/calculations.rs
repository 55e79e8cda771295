//! Pure calculation functions for mosaic geometry.
//!
//! All functions here are pure and testable without any pixels or I/O.

use super::buffer::{Point, Rect};

/// Longer edge below which the FANZA rule stops scaling.
pub const FANZA_SCALE_FROM: u32 = 400;

/// Smallest cell the FANZA rule ever yields.
pub const FANZA_MIN_BLOCK: u32 = 4;

/// Block size under the FANZA rule: ~1% of the longer edge, at least 4px.
///
/// # Examples
/// ```
/// # use mosaic_brush::imaging::fanza_block_size;
/// // 500x300 → longer edge 500 → 5px cells
/// assert_eq!(fanza_block_size(300, 500), 5);
///
/// // Anything under 400px on the longer edge gets the 4px floor
/// assert_eq!(fanza_block_size(390, 200), 4);
/// ```
pub fn fanza_block_size(height: u32, width: u32) -> u32 {
    let max_dim = height.max(width);
    if max_dim >= FANZA_SCALE_FROM {
        (max_dim / 100).max(FANZA_MIN_BLOCK)
    } else {
        FANZA_MIN_BLOCK
    }
}

/// Snap a point down onto the `block_size` grid (floor, also for negatives).
///
/// `block_size` must be non-zero; callers validate it first.
pub fn snap_to_grid(p: Point, block_size: u32) -> Point {
    let b = block_size.min(i32::MAX as u32) as i32;
    Point {
        x: p.x.div_euclid(b) * b,
        y: p.y.div_euclid(b) * b,
    }
}

/// Square of half-extent `2 × block_size` around an anchor, unclipped.
pub fn interaction_area(anchor: Point, block_size: u32) -> Rect {
    let reach = i32::try_from(block_size.saturating_mul(2)).unwrap_or(i32::MAX);
    Rect {
        x1: anchor.x.saturating_sub(reach),
        y1: anchor.y.saturating_sub(reach),
        x2: anchor.x.saturating_add(reach),
        y2: anchor.y.saturating_add(reach),
    }
}

/// Distance between successive interaction points of a drag.
pub fn drag_stride(block_size: u32) -> u32 {
    block_size.saturating_mul(2)
}

/// Row-major grid of interaction points laid out from `area`'s corner.
///
/// `y` ascends in the outer loop and `x` in the inner loop, both stepping by
/// `stride` from `area`'s top-left corner with exclusive upper bounds. Only
/// points inside `within` are yielded; the grid keeps its phase, so a corner
/// outside `within` still decides where the points fall. A zero stride yields
/// no points.
pub fn interaction_points(
    area: &Rect,
    stride: u32,
    within: &Rect,
) -> impl Iterator<Item = Point> + use<> {
    let xs = grid_axis(area.x1, area.x2, within.x1, within.x2, stride);
    let ys = grid_axis(area.y1, area.y2, within.y1, within.y2, stride);
    ys.flat_map(move |y| xs.clone().map(move |x| Point { x, y }))
}

/// Values `start + k * stride` in `[max(start, lo), min(end, hi))`.
fn grid_axis(
    start: i32,
    end: i32,
    lo: i32,
    hi: i32,
    stride: u32,
) -> impl Iterator<Item = i32> + Clone {
    let stop = i64::from(end.min(hi));
    let step = i64::from(stride);
    let first = match step {
        0 => stop,
        _ if lo <= start => i64::from(start),
        _ => {
            let behind = i64::from(lo) - i64::from(start);
            i64::from(start) + (behind + step - 1) / step * step
        }
    };
    (first..stop)
        .step_by(step.max(1) as usize)
        .map(|v| v as i32)
}
