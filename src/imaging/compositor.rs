//! Maps a drag gesture onto engine calls.
//!
//! A drag rectangle is sampled as a grid of virtual clicks spaced
//! `2 × block_size` apart. Each click pixelates the `4 × block_size` square
//! around its snapped anchor, so neighbouring clicks overlap by half and the
//! whole rectangle is covered without running the engine once per cell.
//!
//! With an active mask the work happens on a copy of the mask rectangle, in
//! mask-local coordinates, and the copy is pasted back afterwards. The block
//! grid is therefore anchored at the mask's top-left corner and moving the
//! mask moves the grid with it. Nothing outside the mask is ever written.

use super::buffer::{ImageBuffer, Rect};
use super::calculations::{drag_stride, interaction_points};
use super::engine::{MosaicEngine, MosaicError, check_block_size};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RegionCompositor {
    engine: MosaicEngine,
}

impl RegionCompositor {
    pub fn new(engine: MosaicEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &MosaicEngine {
        &self.engine
    }

    /// Apply a released drag to `buffer`, in place.
    ///
    /// Returns how many interaction points ran. Zero means the drag (or its
    /// overlap with `mask`) missed the image entirely and nothing changed.
    ///
    /// # Errors
    /// [`MosaicError::InvalidBlockSize`] for a zero block size and
    /// [`MosaicError::MalformedRect`] for a drag with no area as given.
    pub fn apply_drag(
        &self,
        buffer: &mut ImageBuffer,
        drag: Rect,
        block_size: u32,
        mask: Option<Rect>,
    ) -> Result<usize, MosaicError> {
        check_block_size(block_size)?;
        if drag.is_empty() {
            return Err(MosaicError::MalformedRect {
                x1: drag.x1,
                y1: drag.y1,
                x2: drag.x2,
                y2: drag.y2,
            });
        }

        let Some(area) = drag.clip(buffer.width(), buffer.height()) else {
            return Ok(0);
        };

        // Without a mask the grid runs from the drag's own corner, even when
        // that corner lies off the image.
        let Some(mask) = mask else {
            return self.sweep(buffer, &drag, block_size);
        };

        let Some(mask) = mask.clip(buffer.width(), buffer.height()) else {
            return Ok(0);
        };
        let Some(overlap) = area.intersect(&mask) else {
            log::debug!("drag {drag:?} misses mask {mask:?}");
            return Ok(0);
        };

        let mut local = buffer.crop(&mask);
        let applied = self.sweep(&mut local, &overlap.translate_into(mask.x1, mask.y1), block_size)?;
        buffer.paste(&local, mask.x1, mask.y1);
        Ok(applied)
    }

    /// Run the interaction grid laid out from `area`'s corner, skipping the
    /// points that fall outside `buffer`.
    fn sweep(
        &self,
        buffer: &mut ImageBuffer,
        area: &Rect,
        block_size: u32,
    ) -> Result<usize, MosaicError> {
        let bounds = buffer.bounds();
        let mut applied = 0;
        for point in interaction_points(area, drag_stride(block_size), &bounds) {
            self.engine.pixelate_at_point(buffer, point, block_size)?;
            applied += 1;
        }
        log::debug!("drag over {area:?}: {applied} points at {block_size}px");
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::buffer::Point;
    use crate::test_helpers::{assert_outside_unchanged, gradient_rgb};

    fn compositor() -> RegionCompositor {
        RegionCompositor::default()
    }

    #[test]
    fn drag_matches_sequence_of_clicks() {
        let mut by_drag = gradient_rgb(60, 40);
        let mut by_clicks = by_drag.clone();

        let n = compositor()
            .apply_drag(&mut by_drag, Rect::new(5, 5, 30, 25), 4, None)
            .unwrap();

        let engine = MosaicEngine::default();
        let mut count = 0;
        for y in (5..25).step_by(8) {
            for x in (5..30).step_by(8) {
                engine
                    .pixelate_at_point(&mut by_clicks, Point::new(x, y), 4)
                    .unwrap();
                count += 1;
            }
        }
        assert_eq!(n, count);
        assert_eq!(by_drag, by_clicks);
    }

    #[test]
    fn overshooting_drag_keeps_its_grid() {
        let mut buf = gradient_rgb(20, 20);
        let n = compositor()
            .apply_drag(&mut buf, Rect::new(-50, -50, 5, 5), 2, None)
            .unwrap();
        // stride 4 from -50 reaches 2 inside the image, then 6 is past the drag
        assert_eq!(n, 1);
    }

    #[test]
    fn overshooting_drag_matches_clicks_from_raw_corner() {
        let mut by_drag = gradient_rgb(40, 40);
        let mut by_clicks = by_drag.clone();

        let n = compositor()
            .apply_drag(&mut by_drag, Rect::new(-2, -2, 20, 20), 3, None)
            .unwrap();

        let engine = MosaicEngine::default();
        let mut count = 0;
        for y in (-2..20).step_by(6) {
            for x in (-2..20).step_by(6) {
                if x < 0 || y < 0 {
                    continue;
                }
                engine
                    .pixelate_at_point(&mut by_clicks, Point::new(x, y), 3)
                    .unwrap();
                count += 1;
            }
        }
        assert_eq!(count, 9);
        assert_eq!(n, count);
        assert_eq!(by_drag, by_clicks);
    }

    #[test]
    fn drag_outside_image_is_noop() {
        let mut buf = gradient_rgb(20, 20);
        let before = buf.clone();
        let n = compositor()
            .apply_drag(&mut buf, Rect::new(30, 30, 60, 60), 2, None)
            .unwrap();
        assert_eq!(n, 0);
        assert_eq!(buf, before);
    }

    #[test]
    fn zero_block_size_is_error() {
        let mut buf = gradient_rgb(20, 20);
        assert_eq!(
            compositor().apply_drag(&mut buf, Rect::new(0, 0, 10, 10), 0, None),
            Err(MosaicError::InvalidBlockSize)
        );
    }

    #[test]
    fn mask_contains_all_writes() {
        let mut buf = gradient_rgb(80, 60);
        let before = buf.clone();
        let mask = Rect::new(20, 10, 50, 40);
        compositor()
            .apply_drag(&mut buf, Rect::new(0, 0, 80, 60), 5, Some(mask))
            .unwrap();
        assert_outside_unchanged(&before, &buf, &mask);
        assert_ne!(before, buf);
    }

    #[test]
    fn drag_missing_mask_is_noop() {
        let mut buf = gradient_rgb(80, 60);
        let before = buf.clone();
        let n = compositor()
            .apply_drag(
                &mut buf,
                Rect::new(0, 0, 10, 10),
                3,
                Some(Rect::new(40, 40, 70, 55)),
            )
            .unwrap();
        assert_eq!(n, 0);
        assert_eq!(buf, before);
    }

    #[test]
    fn mask_grid_is_local_to_mask() {
        // Same content under two mask positions gives the same local result.
        let patch = gradient_rgb(24, 24);
        let mut a = gradient_rgb(100, 100);
        let mut b = gradient_rgb(100, 100);
        a.paste(&patch, 10, 10);
        b.paste(&patch, 33, 47);

        let mask_a = Rect::new(10, 10, 34, 34);
        let mask_b = Rect::new(33, 47, 57, 71);
        compositor()
            .apply_drag(&mut a, mask_a, 3, Some(mask_a))
            .unwrap();
        compositor()
            .apply_drag(&mut b, mask_b, 3, Some(mask_b))
            .unwrap();

        assert_eq!(a.crop(&mask_a), b.crop(&mask_b));
    }
}
