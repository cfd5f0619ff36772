// Copyright (C) 2024-2025 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use zinnia_common::chars::Uch;

/// The raw character ring behind a window history.
///
/// `front` is the offset the next character will be written to and `back`
/// the offset of the oldest retained character. While `wraps == 0` the live
/// span is the contiguous `[back..front)`; once the front has rolled past
/// the end, the live span is `[back..cap) ∪ [0..front)` and `front == back`
/// means the ring is completely full. `wraps` doubles as a cheap epoch for
/// cursor validity checks, so it only ever moves forward on writes.
///
/// All positions are offsets into `cells`, never pointers, which keeps them
/// stable across growth.
pub(crate) struct Ring {
    pub(crate) cells: Vec<Uch>,
    /// Hard upper bound on the allocation, in code units.
    pub(crate) max: usize,
    /// Growth increment, in code units.
    pub(crate) grow: usize,
    pub(crate) front: usize,
    pub(crate) back: usize,
    pub(crate) wraps: u32,
}

impl Ring {
    pub(crate) const fn new(max: usize, grow: usize) -> Self {
        Self {
            cells: Vec::new(),
            max,
            grow,
            front: 0,
            back: 0,
            wraps: 0,
        }
    }

    #[must_use]
    pub(crate) const fn capacity(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub(crate) const fn is_empty(&self) -> bool {
        self.capacity() == 0 || (self.wraps == 0 && self.front == self.back)
    }

    #[must_use]
    pub(crate) const fn step_forward(&self, pos: usize) -> usize {
        if pos + 1 == self.capacity() {
            0
        } else {
            pos + 1
        }
    }

    /// Steps one cell toward the back.
    ///
    /// `wraps` is the walker's remaining count of start-boundary crossings
    /// between its position and `back`; it is decremented when the step
    /// rolls from offset `0` to the end. Returns `None` once the oldest
    /// retained cell would be left behind.
    #[must_use]
    pub(crate) fn step_backward(&self, pos: usize, wraps: &mut u32) -> Option<usize> {
        if pos == self.back && *wraps == 0 {
            trace!("history walk already at buffer back");
            return None;
        }

        if pos == 0 {
            *wraps = wraps.saturating_sub(1);
            Some(self.capacity() - 1)
        } else {
            Some(pos - 1)
        }
    }

    /// Position of the last live cell plus the crossing budget a backward
    /// walker starting there needs, or `None` when nothing is retained.
    ///
    /// This exists because `front == back` is ambiguous on a full ring; a
    /// walker seeded here is one full lap behind the front.
    #[must_use]
    pub(crate) fn front_walk_start(&self) -> Option<(usize, u32)> {
        if self.is_empty() {
            return None;
        }

        if self.wraps == 0 {
            Some((self.front - 1, 0))
        } else if self.front == 0 {
            Some((self.capacity() - 1, 0))
        } else {
            Some((self.front - 1, 1))
        }
    }

    #[must_use]
    pub(crate) const fn space_used(&self) -> usize {
        if self.capacity() == 0 {
            0
        } else if self.wraps == 0 {
            self.front - self.back
        } else {
            self.capacity() - (self.back - self.front)
        }
    }

    #[must_use]
    pub(crate) const fn space_available(&self) -> usize {
        if self.capacity() == 0 {
            0
        } else if self.wraps == 0 {
            self.capacity() - self.front
        } else {
            self.back - self.front
        }
    }

    /// Grows the allocation toward `desired`, capped at `max`.
    ///
    /// Resizing a wrapped ring would tear the live span apart, with one
    /// exception: a completely full ring anchored at offset `0` (a write
    /// that filled the allocation exactly) is already in oldest-first
    /// order, so growing it just appends free space and the ring becomes
    /// contiguous again. Every other wrapped layout refuses to grow, which
    /// is fine: those only arise once the ring has been driven to `max`.
    pub(crate) fn try_grow(&mut self, desired: usize) {
        let desired = desired.min(self.max);

        if desired <= self.capacity() {
            return;
        }

        if self.wraps > 0 {
            if self.front != 0 || self.back != 0 {
                return;
            }

            let filled = self.capacity();
            trace!(
                "enlarging exactly-full history ring from {filled} to {desired} code units"
            );
            self.cells.resize(desired, 0);
            self.front = filled;
            self.wraps = 0;
            return;
        }

        trace!(
            "enlarging history ring from {} to {} code units",
            self.capacity(),
            desired
        );
        self.cells.resize(desired, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(cap: usize) -> Ring {
        let mut ring = Ring::new(cap, cap);
        ring.try_grow(cap);
        ring
    }

    #[test]
    fn empty_ring_has_no_walk_start() {
        let ring = filled(8);
        assert!(ring.is_empty());
        assert_eq!(ring.front_walk_start(), None);
        assert_eq!(ring.space_used(), 0);
        assert_eq!(ring.space_available(), 8);
    }

    #[test]
    fn forward_steps_wrap_at_capacity() {
        let ring = filled(4);
        assert_eq!(ring.step_forward(0), 1);
        assert_eq!(ring.step_forward(3), 0);
    }

    #[test]
    fn backward_walk_stops_at_back() {
        let mut ring = filled(8);
        ring.front = 3;

        let (mut pos, mut wraps) = ring.front_walk_start().unwrap();
        assert_eq!((pos, wraps), (2, 0));

        pos = ring.step_backward(pos, &mut wraps).unwrap();
        assert_eq!(pos, 1);
        pos = ring.step_backward(pos, &mut wraps).unwrap();
        assert_eq!(pos, 0);
        assert_eq!(ring.step_backward(pos, &mut wraps), None);
    }

    #[test]
    fn backward_walk_crosses_the_seam_once_on_a_full_ring() {
        let mut ring = filled(4);
        ring.front = 2;
        ring.back = 2;
        ring.wraps = 1;

        let (mut pos, mut wraps) = ring.front_walk_start().unwrap();
        assert_eq!((pos, wraps), (1, 1));

        let mut visited = vec![pos];
        while let Some(p) = ring.step_backward(pos, &mut wraps) {
            pos = p;
            visited.push(pos);
        }

        // The walk covers exactly one lap: 1, 0, 3, 2.
        assert_eq!(visited, vec![1, 0, 3, 2]);
        assert_eq!(wraps, 0);
    }

    #[test]
    fn space_accounting_in_both_epochs() {
        let mut ring = filled(8);
        ring.front = 5;
        assert_eq!(ring.space_used(), 5);
        assert_eq!(ring.space_available(), 3);

        ring.front = 3;
        ring.back = 3;
        ring.wraps = 1;
        assert_eq!(ring.space_used(), 8);
        assert_eq!(ring.space_available(), 0);
    }

    #[test]
    fn growth_is_capped_and_refused_after_wrap() {
        let mut ring = Ring::new(16, 4);
        ring.try_grow(64);
        assert_eq!(ring.capacity(), 16);

        // A mid-ring seam cannot be preserved across a resize.
        ring.cells.truncate(8);
        ring.front = 4;
        ring.back = 4;
        ring.wraps = 1;
        ring.try_grow(16);
        assert_eq!(ring.capacity(), 8);
    }

    #[test]
    fn an_exactly_full_ring_anchored_at_zero_grows_contiguously() {
        let mut ring = Ring::new(16, 8);
        ring.try_grow(8);
        ring.cells.copy_from_slice(&[11, 12, 13, 14, 15, 16, 17, 18]);
        ring.front = 0;
        ring.back = 0;
        ring.wraps = 1;

        ring.try_grow(16);

        assert_eq!(ring.capacity(), 16);
        assert_eq!(ring.front, 8);
        assert_eq!(ring.back, 0);
        assert_eq!(ring.wraps, 0);
        assert_eq!(ring.cells[..8], [11, 12, 13, 14, 15, 16, 17, 18]);
        assert_eq!(ring.space_available(), 8);
    }
}
