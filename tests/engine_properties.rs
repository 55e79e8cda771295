//! Property checks for the mosaic engine and compositor through the public API.

use mosaic_brush::imaging::{
    ImageBuffer, MosaicEngine, MosaicError, Point, Rect, RegionCompositor, SizePolicy,
    compute_block_size,
};

fn noise(width: u32, height: u32, channels: u8) -> ImageBuffer {
    // Deterministic xorshift so every pixel differs from its neighbours.
    let mut state: u32 = 0x9E37_79B9;
    let len = (width * height * channels as u32) as usize;
    let data = (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect();
    ImageBuffer::from_raw(width, height, channels, data).unwrap()
}

fn assert_uniform(buf: &ImageBuffer, x1: u32, y1: u32, x2: u32, y2: u32) {
    let first = buf.pixel(x1, y1).to_vec();
    for y in y1..y2 {
        for x in x1..x2 {
            assert_eq!(buf.pixel(x, y), &first[..], "cell at ({x1},{y1}) not uniform at ({x},{y})");
        }
    }
}

fn assert_outside_unchanged(before: &ImageBuffer, after: &ImageBuffer, region: &Rect) {
    for y in 0..before.height() {
        for x in 0..before.width() {
            if !region.contains(Point::new(x as i32, y as i32)) {
                assert_eq!(before.pixel(x, y), after.pixel(x, y), "({x},{y}) changed");
            }
        }
    }
}

// =========================================================================
// Sizing scenarios
// =========================================================================

#[test]
fn proportional_sizes() {
    assert_eq!(compute_block_size(SizePolicy::Proportional, 300, 500), 5);
    assert_eq!(compute_block_size(SizePolicy::Proportional, 399, 100), 4);
    assert_eq!(compute_block_size(SizePolicy::Proportional, 4000, 6000), 60);
    assert_eq!(compute_block_size(SizePolicy::Fixed(17), 4000, 6000), 17);
}

// =========================================================================
// Engine properties
// =========================================================================

#[test]
fn aligned_region_cells_are_uniform() {
    for channels in [1, 3, 4] {
        let mut buf = noise(64, 48, channels);
        MosaicEngine::default()
            .pixelate_region(&mut buf, Rect::new(8, 8, 56, 40), 8)
            .unwrap();
        for by in (8..40).step_by(8) {
            for bx in (8..56).step_by(8) {
                assert_uniform(&buf, bx, by, bx + 8, by + 8);
            }
        }
    }
}

#[test]
fn remainder_strips_collapse_per_row_and_column() {
    let mut buf = noise(30, 30, 3);
    // 23x17 with b=5: aligned 20x15, right strip 3 wide, bottom strip 2 tall.
    MosaicEngine::default()
        .pixelate_region(&mut buf, Rect::new(2, 3, 25, 20), 5)
        .unwrap();
    for row in 3..18 {
        assert_uniform(&buf, 22, row, 25, row + 1);
    }
    for col in 2..25 {
        assert_uniform(&buf, col, 18, col + 1, 20);
    }
}

#[test]
fn pixelation_is_idempotent() {
    let engine = MosaicEngine::default();
    for rect in [Rect::new(0, 0, 40, 40), Rect::new(3, 7, 38, 29), Rect::new(5, 5, 8, 30)] {
        let mut once = noise(40, 40, 3);
        engine.pixelate_region(&mut once, rect, 6).unwrap();
        let mut twice = once.clone();
        engine.pixelate_region(&mut twice, rect, 6).unwrap();
        assert_eq!(once, twice, "{rect:?}");
    }
}

#[test]
fn shape_is_preserved_and_outside_untouched() {
    let before = noise(50, 30, 4);
    let mut after = before.clone();
    let region = Rect::new(7, 4, 41, 27);
    MosaicEngine::default()
        .pixelate_region(&mut after, region, 4)
        .unwrap();
    assert_eq!(
        (after.width(), after.height(), after.channels()),
        (50, 30, 4)
    );
    assert_outside_unchanged(&before, &after, &region);
}

#[test]
fn clicks_in_the_same_cell_are_equivalent() {
    let engine = MosaicEngine::default();
    let mut a = noise(120, 120, 3);
    let mut b = a.clone();
    let ra = engine.pixelate_at_point(&mut a, Point::new(50, 50), 5).unwrap();
    let rb = engine.pixelate_at_point(&mut b, Point::new(54, 53), 5).unwrap();
    assert_eq!(ra, Some(Rect::new(40, 40, 60, 60)));
    assert_eq!(ra, rb);
    assert_eq!(a, b);
}

#[test]
fn click_scenario_from_the_fanza_rule() {
    let mut buf = noise(500, 300, 3);
    let b = compute_block_size(SizePolicy::Proportional, 300, 500);
    let area = MosaicEngine::default()
        .pixelate_at_point(&mut buf, Point::new(52, 52), b)
        .unwrap();
    assert_eq!(area, Some(Rect::new(40, 40, 60, 60)));
}

#[test]
fn uniform_image_is_a_fixed_point() {
    let mut buf = ImageBuffer::filled(10, 10, &[255, 0, 0]).unwrap();
    let before = buf.clone();
    MosaicEngine::default()
        .pixelate_region(&mut buf, Rect::new(0, 0, 10, 10), 3)
        .unwrap();
    assert_eq!(buf, before);
}

#[test]
fn out_of_bounds_is_a_noop() {
    let engine = MosaicEngine::default();
    let mut buf = noise(20, 20, 3);
    let before = buf.clone();
    assert_eq!(
        engine.pixelate_region(&mut buf, Rect::new(20, 0, 40, 10), 4),
        Ok(None)
    );
    assert_eq!(
        engine.pixelate_at_point(&mut buf, Point::new(100, 100), 4),
        Ok(None)
    );
    assert_eq!(buf, before);
}

#[test]
fn invalid_parameters_are_rejected_before_any_write() {
    let engine = MosaicEngine::default();
    let mut buf = noise(20, 20, 3);
    let before = buf.clone();
    assert_eq!(
        engine.pixelate_region(&mut buf, Rect::new(0, 0, 10, 10), 0),
        Err(MosaicError::InvalidBlockSize)
    );
    assert!(matches!(
        engine.pixelate_region(&mut buf, Rect::new(10, 0, 5, 10), 4),
        Err(MosaicError::MalformedRect { .. })
    ));
    assert_eq!(buf, before);
}

// =========================================================================
// Compositor properties
// =========================================================================

#[test]
fn masked_drag_never_writes_outside_mask() {
    let compositor = RegionCompositor::default();
    for (mask, drag) in [
        (Rect::new(10, 10, 40, 40), Rect::new(0, 0, 100, 100)),
        (Rect::new(55, 5, 95, 35), Rect::new(50, 0, 70, 60)),
        (Rect::new(-10, -10, 17, 23), Rect::new(0, 0, 30, 30)),
    ] {
        let before = noise(100, 60, 3);
        let mut after = before.clone();
        compositor.apply_drag(&mut after, drag, 4, Some(mask)).unwrap();
        assert_outside_unchanged(&before, &after, &mask);
    }
}

#[test]
fn drag_point_count_follows_stride() {
    let mut buf = noise(100, 100, 1);
    let n = RegionCompositor::default()
        .apply_drag(&mut buf, Rect::new(0, 0, 41, 20), 5, None)
        .unwrap();
    // stride 10: x ∈ {0,10,20,30,40}, y ∈ {0,10}
    assert_eq!(n, 10);
}
