//! Bounded undo/redo over buffer snapshots.
//!
//! The history is a list of full snapshots plus a cursor. The cursor entry
//! is the current image; entries after it form the redo tail and are
//! discarded by the next [`History::push`]. When the list outgrows
//! `max_depth` the oldest snapshot is dropped, so the very first state can
//! become unreachable by undo (use [`History::reset`] with the original to
//! get back to it).

use crate::imaging::ImageBuffer;
use std::collections::VecDeque;

pub const DEFAULT_MAX_DEPTH: usize = 200;

#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<ImageBuffer>,
    cursor: usize,
    max_depth: usize,
}

impl History {
    /// Start a history whose only entry is `initial`. A `max_depth` of zero
    /// is treated as one.
    pub fn new(initial: ImageBuffer, max_depth: usize) -> Self {
        Self {
            entries: VecDeque::from([initial]),
            cursor: 0,
            max_depth: max_depth.max(1),
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The snapshot at the cursor.
    pub fn current(&self) -> &ImageBuffer {
        &self.entries[self.cursor]
    }

    /// Record a new state after the cursor, discarding any redo tail.
    pub fn push(&mut self, snapshot: ImageBuffer) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push_back(snapshot);
        while self.entries.len() > self.max_depth {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len() - 1;
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Step back one state and return a copy of it.
    pub fn undo(&mut self) -> Option<ImageBuffer> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        Some(self.current().clone())
    }

    /// Step forward one state and return a copy of it.
    pub fn redo(&mut self) -> Option<ImageBuffer> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        Some(self.current().clone())
    }

    /// Drop everything and start over from `initial`.
    pub fn reset(&mut self, initial: ImageBuffer) {
        self.entries.clear();
        self.entries.push_back(initial);
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::solid;

    fn frame(v: u8) -> ImageBuffer {
        solid(2, 2, &[v])
    }

    fn value(buf: &ImageBuffer) -> u8 {
        buf.pixel(0, 0)[0]
    }

    #[test]
    fn fresh_history_has_nothing_to_undo() {
        let h = History::new(frame(0), 10);
        assert!(!h.can_undo());
        assert!(!h.can_redo());
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn undo_redo_walk_the_stack() {
        let mut h = History::new(frame(0), 10);
        h.push(frame(1));
        h.push(frame(2));

        assert_eq!(h.undo().map(|b| value(&b)), Some(1));
        assert_eq!(h.undo().map(|b| value(&b)), Some(0));
        assert_eq!(h.undo(), None);
        assert_eq!(h.redo().map(|b| value(&b)), Some(1));
        assert_eq!(h.redo().map(|b| value(&b)), Some(2));
        assert_eq!(h.redo(), None);
    }

    #[test]
    fn push_truncates_redo_tail() {
        let mut h = History::new(frame(0), 10);
        h.push(frame(1));
        h.push(frame(2));
        h.undo();
        h.undo();
        h.push(frame(9));

        assert!(!h.can_redo());
        assert_eq!(h.len(), 2);
        assert_eq!(value(h.current()), 9);
    }

    #[test]
    fn oldest_entries_are_dropped_past_max_depth() {
        let mut h = History::new(frame(0), 3);
        for v in 1..=5 {
            h.push(frame(v));
        }
        assert_eq!(h.len(), 3);
        assert_eq!(value(h.current()), 5);
        h.undo();
        assert_eq!(h.undo().map(|b| value(&b)), Some(3));
        assert!(!h.can_undo());
    }

    #[test]
    fn zero_depth_keeps_current_state() {
        let mut h = History::new(frame(0), 0);
        h.push(frame(1));
        assert_eq!(h.max_depth(), 1);
        assert_eq!(value(h.current()), 1);
        assert!(!h.can_undo());
    }

    #[test]
    fn reset_clears_everything() {
        let mut h = History::new(frame(0), 10);
        h.push(frame(1));
        h.reset(frame(7));
        assert_eq!(h.len(), 1);
        assert!(!h.can_undo());
        assert_eq!(value(h.current()), 7);
    }
}
