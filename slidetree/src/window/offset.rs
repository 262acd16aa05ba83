// Copyright 2024 Logan Magee
//
// SPDX-License-Identifier: LicenseRef-Proprietary

use std::ops::{Add, Sub};

/// An index into a circular buffer.
///
/// All arithmetic wraps at the buffer length. The checked variants refuse to move by a whole lap
/// or more, which is never meaningful for a window offset.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct CircularOffset {
    index: usize,
    len: usize,
}

impl CircularOffset {
    /// Creates an offset into a buffer of `len` slots.
    ///
    /// # Panics
    ///
    /// Panics if `len` is 0.
    pub fn new(index: usize, len: usize) -> Self {
        assert!(len > 0, "circular buffers have at least one slot");

        Self {
            index: index % len,
            len,
        }
    }

    /// Returns the slot that holds the 1-based stream position `position`.
    pub fn of_position(position: u64, len: usize) -> Self {
        debug_assert!(position > 0, "stream positions are 1-based");

        Self::new(((position - 1) % len as u64) as usize, len)
    }

    /// Returns the index into the buffer.
    #[inline]
    pub fn index(self) -> usize {
        self.index
    }

    /// Returns the buffer length.
    #[inline]
    pub fn modulus(self) -> usize {
        self.len
    }

    /// Moves forward by `n` slots, or returns `None` if that is a whole lap or more.
    pub fn checked_add(self, n: usize) -> Option<Self> {
        (n < self.len).then(|| self + n)
    }

    /// Moves backward by `n` slots, or returns `None` if that is a whole lap or more.
    pub fn checked_sub(self, n: usize) -> Option<Self> {
        (n < self.len).then(|| self - n)
    }

    /// Returns how many slots lie between `self` and `later`, moving forward.
    pub fn distance_to(self, later: Self) -> usize {
        debug_assert_eq!(self.len, later.len, "offsets into different buffers");

        if later.index >= self.index {
            later.index - self.index
        } else {
            self.len - self.index + later.index
        }
    }
}

impl Add<usize> for CircularOffset {
    type Output = Self;

    fn add(self, n: usize) -> Self {
        Self::new(self.index + n % self.len, self.len)
    }
}

impl Sub<usize> for CircularOffset {
    type Output = Self;

    fn sub(self, n: usize) -> Self {
        Self::new(self.index + self.len - n % self.len, self.len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_wraps() {
        let offset = CircularOffset::new(6, 8);

        assert_eq!((offset + 3).index(), 1);
        assert_eq!((offset - 7).index(), 7);
        assert_eq!((offset + 16).index(), 6);
    }

    #[test]
    fn checked_arithmetic_refuses_whole_laps() {
        let offset = CircularOffset::new(2, 8);

        assert_eq!(offset.checked_add(7).map(CircularOffset::index), Some(1));
        assert_eq!(offset.checked_add(8), None);
        assert_eq!(offset.checked_sub(3).map(CircularOffset::index), Some(7));
        assert_eq!(offset.checked_sub(9), None);
    }

    #[test]
    fn distance_is_measured_forward() {
        let a = CircularOffset::new(6, 8);
        let b = CircularOffset::new(1, 8);

        assert_eq!(a.distance_to(b), 3);
        assert_eq!(b.distance_to(a), 5);
        assert_eq!(a.distance_to(a), 0);
    }

    #[test]
    fn positions_map_to_slots() {
        assert_eq!(CircularOffset::of_position(1, 4).index(), 0);
        assert_eq!(CircularOffset::of_position(4, 4).index(), 3);
        assert_eq!(CircularOffset::of_position(5, 4).index(), 0);
    }
}
