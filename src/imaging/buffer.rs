//! Pixel storage and rectangle geometry.
//!
//! [`ImageBuffer`] is the only pixel container the engine works on: a
//! row-major `height × width × channels` array of 8-bit samples with the
//! origin at the top-left. Coordinates are `(x = column, y = row)`.
//!
//! [`Rect`] is a half-open `[x1, x2) × [y1, y2)` region with signed corners,
//! so drag gestures that overshoot the image edge can be represented before
//! clipping.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ImageBufferError {
    #[error("unsupported channel count {0} (expected 1, 3 or 4)")]
    UnsupportedChannels(u8),
    #[error("buffer holds {actual} bytes, {width}x{height}x{channels} needs {expected}")]
    ShapeMismatch {
        width: u32,
        height: u32,
        channels: u8,
        expected: usize,
        actual: usize,
    },
}

/// Most channels any supported layout carries (RGBA).
pub const MAX_CHANNELS: usize = 4;

/// A single pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Half-open rectangle `[x1, x2) × [y1, y2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Rect {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Rectangle spanned by two arbitrary corners, e.g. a drag start and end.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x1: a.x.min(b.x),
            y1: a.y.min(b.y),
            x2: a.x.max(b.x),
            y2: a.y.max(b.y),
        }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    /// True when the rectangle covers no pixel.
    pub fn is_empty(&self) -> bool {
        self.x2 <= self.x1 || self.y2 <= self.y1
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x1 && p.x < self.x2 && p.y >= self.y1 && p.y < self.y2
    }

    /// Overlap of two rectangles, `None` when they do not share a pixel.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let r = Rect {
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
            x2: self.x2.min(other.x2),
            y2: self.y2.min(other.y2),
        };
        (!r.is_empty()).then_some(r)
    }

    /// Clip to `[0, width) × [0, height)`.
    pub fn clip(&self, width: u32, height: u32) -> Option<Rect> {
        self.intersect(&Rect::new(0, 0, to_coord(width), to_coord(height)))
    }

    /// Shift by `(-dx, -dy)`, i.e. express in a frame whose origin is `(dx, dy)`.
    pub fn translate_into(&self, dx: i32, dy: i32) -> Rect {
        Rect {
            x1: self.x1 - dx,
            y1: self.y1 - dy,
            x2: self.x2 - dx,
            y2: self.y2 - dy,
        }
    }
}

fn to_coord(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

/// Owned 8-bit image with 1 (gray), 3 (RGB) or 4 (RGBA) interleaved channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl ImageBuffer {
    /// Zero-filled buffer.
    pub fn new(width: u32, height: u32, channels: u8) -> Result<Self, ImageBufferError> {
        check_channels(channels)?;
        let len = width as usize * height as usize * channels as usize;
        Ok(Self {
            width,
            height,
            channels,
            data: vec![0; len],
        })
    }

    /// Wrap existing samples; the length must match the shape exactly.
    pub fn from_raw(
        width: u32,
        height: u32,
        channels: u8,
        data: Vec<u8>,
    ) -> Result<Self, ImageBufferError> {
        check_channels(channels)?;
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(ImageBufferError::ShapeMismatch {
                width,
                height,
                channels,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Buffer filled with one colour. `color` must hold `channels` samples.
    pub fn filled(width: u32, height: u32, color: &[u8]) -> Result<Self, ImageBufferError> {
        let channels = u8::try_from(color.len()).unwrap_or(u8::MAX);
        check_channels(channels)?;
        let data = color
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * color.len())
            .collect();
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Full-image rectangle.
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, to_coord(self.width), to_coord(self.height))
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * self.channels as usize
    }

    /// Samples of one pixel. Panics when out of bounds, like slice indexing.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let o = self.offset(x, y);
        &self.data[o..o + self.channels as usize]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: &[u8]) {
        let o = self.offset(x, y);
        let c = self.channels as usize;
        self.data[o..o + c].copy_from_slice(&color[..c]);
    }

    /// Contiguous samples of row `y`, columns `[x1, x2)`.
    pub fn row_span(&self, y: u32, x1: u32, x2: u32) -> &[u8] {
        &self.data[self.offset(x1, y)..self.offset(x2, y)]
    }

    pub fn row_span_mut(&mut self, y: u32, x1: u32, x2: u32) -> &mut [u8] {
        let (a, b) = (self.offset(x1, y), self.offset(x2, y));
        &mut self.data[a..b]
    }

    /// Independent copy of `rect`, which must already lie inside the buffer.
    pub fn crop(&self, rect: &Rect) -> ImageBuffer {
        let (x1, y1, x2, y2) = unsigned_corners(rect);
        let c = self.channels as usize;
        let mut data = Vec::with_capacity((x2 - x1) as usize * (y2 - y1) as usize * c);
        for y in y1..y2 {
            data.extend_from_slice(self.row_span(y, x1, x2));
        }
        ImageBuffer {
            width: x2 - x1,
            height: y2 - y1,
            channels: self.channels,
            data,
        }
    }

    /// Copy `src` into this buffer with its top-left corner at `(x, y)`.
    ///
    /// The part of `src` falling outside this buffer is dropped. Channel
    /// counts must match; a mismatched source is ignored.
    pub fn paste(&mut self, src: &ImageBuffer, x: i32, y: i32) {
        if src.channels != self.channels {
            return;
        }
        let target = Rect::new(
            x,
            y,
            x.saturating_add(to_coord(src.width)),
            y.saturating_add(to_coord(src.height)),
        );
        let Some(visible) = target.clip(self.width, self.height) else {
            return;
        };
        let local = visible.translate_into(x, y);
        let (dx1, dy1, dx2, _) = unsigned_corners(&visible);
        let (sx1, sy1, sx2, sy2) = unsigned_corners(&local);
        for (row, sy) in (sy1..sy2).enumerate() {
            let line = src.row_span(sy, sx1, sx2);
            self.row_span_mut(dy1 + row as u32, dx1, dx2)
                .copy_from_slice(line);
        }
    }
}

fn check_channels(channels: u8) -> Result<(), ImageBufferError> {
    match channels {
        1 | 3 | 4 => Ok(()),
        other => Err(ImageBufferError::UnsupportedChannels(other)),
    }
}

/// Corners of a rectangle known to be clipped to a buffer (non-negative).
pub(crate) fn unsigned_corners(rect: &Rect) -> (u32, u32, u32, u32) {
    (
        rect.x1.max(0) as u32,
        rect.y1.max(0) as u32,
        rect.x2.max(0) as u32,
        rect.y2.max(0) as u32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_rejects_wrong_length() {
        let err = ImageBuffer::from_raw(2, 2, 3, vec![0; 11]).unwrap_err();
        assert!(matches!(
            err,
            ImageBufferError::ShapeMismatch {
                expected: 12,
                actual: 11,
                ..
            }
        ));
    }

    #[test]
    fn two_channel_layout_is_rejected() {
        assert_eq!(
            ImageBuffer::new(1, 1, 2).unwrap_err(),
            ImageBufferError::UnsupportedChannels(2)
        );
    }

    #[test]
    fn rect_from_corners_normalizes_order() {
        let r = Rect::from_corners(Point::new(30, 5), Point::new(10, 25));
        assert_eq!(r, Rect::new(10, 5, 30, 25));
    }

    #[test]
    fn clip_drops_overshoot() {
        let r = Rect::new(-10, -3, 120, 40).clip(100, 50).unwrap();
        assert_eq!(r, Rect::new(0, 0, 100, 40));
    }

    #[test]
    fn clip_outside_is_none() {
        assert_eq!(Rect::new(200, 0, 220, 10).clip(100, 50), None);
        assert_eq!(Rect::new(-20, -20, 0, 0).clip(100, 50), None);
    }

    #[test]
    fn intersect_touching_edges_is_none() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(10, 0, 20, 10);
        assert_eq!(a.intersect(&b), None);
    }

    #[test]
    fn crop_then_paste_restores_region() {
        let mut buf = ImageBuffer::new(4, 3, 1).unwrap();
        for y in 0..3 {
            for x in 0..4 {
                buf.set_pixel(x, y, &[(y * 4 + x) as u8]);
            }
        }
        let sub = buf.crop(&Rect::new(1, 1, 3, 3));
        assert_eq!(sub.width(), 2);
        assert_eq!(sub.as_raw(), &[5, 6, 9, 10]);

        let mut blank = ImageBuffer::new(4, 3, 1).unwrap();
        blank.paste(&sub, 1, 1);
        assert_eq!(blank.pixel(2, 2), &[10]);
        assert_eq!(blank.pixel(0, 0), &[0]);
    }

    #[test]
    fn paste_clips_at_edges() {
        let mut buf = ImageBuffer::new(3, 3, 1).unwrap();
        let patch = ImageBuffer::filled(2, 2, &[9]).unwrap();
        buf.paste(&patch, 2, -1);
        assert_eq!(buf.pixel(2, 0), &[9]);
        assert_eq!(buf.pixel(2, 1), &[0]);
        assert_eq!(buf.pixel(1, 0), &[0]);
    }

    #[test]
    fn filled_repeats_color() {
        let buf = ImageBuffer::filled(2, 1, &[1, 2, 3]).unwrap();
        assert_eq!(buf.as_raw(), &[1, 2, 3, 1, 2, 3]);
    }
}
