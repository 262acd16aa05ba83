// Copyright 2024 Logan Magee
//
// SPDX-License-Identifier: LicenseRef-Proprietary

use std::ops::{Index, IndexMut};

use crate::error::{Error, Result, Violation};

/// The smallest number of records a table grows by once its doubling phase is over
pub const MIN_GROWTH_INCREMENT: usize = 128;

/// A typed, index-addressed table of records.
///
/// Records are never moved to a different index: growth only appends capacity and freed slots
/// are recycled in place. This is what makes it safe to hold plain integer indices into the arena
/// across calls.
///
/// The first overflow at least doubles the capacity. Every later growth step adds an increment
/// that halves each time, but never drops below [`MIN_GROWTH_INCREMENT`]. Capacity is clamped to a
/// maximum derived from the problem size, and requesting more is an allocation error.
///
/// # Examples
///
/// ```
/// use suftree::Arena;
///
/// # fn main() -> suftree::Result<()> {
/// let mut arena = Arena::<u32>::with_reserved("example", 1, 1024);
/// let a = arena.allocate(10)?;
/// let b = arena.allocate(20)?;
/// arena.deallocate(a);
///
/// // The freed slot is handed out again before the arena grows
/// assert_eq!(arena.allocate(30)?, a);
/// assert_eq!(arena[b], 20);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Arena<T> {
    name: &'static str,
    records: Vec<T>,
    vacant: Vec<u32>,
    increment: Option<usize>,
    max_capacity: usize,
    reserved: usize,
}

impl<T: Default> Arena<T> {
    /// Creates an arena whose first `reserved` indices are filled with placeholder records and are
    /// never handed out.
    pub fn with_reserved(name: &'static str, reserved: usize, max_capacity: usize) -> Self {
        let mut records = Vec::new();
        records.resize_with(reserved, T::default);

        Self {
            name,
            records,
            vacant: Vec::new(),
            increment: None,
            max_capacity: max_capacity.max(reserved),
            reserved,
        }
    }

    /// Drops every record and recycled index, keeping the reserved placeholders.
    pub fn clear(&mut self) {
        self.records.truncate(self.reserved);
        self.records
            .iter_mut()
            .for_each(|record| *record = T::default());
        self.vacant.clear();
    }
}

impl<T> Arena<T> {
    /// Makes sure at least `min_capacity` records fit without another allocation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`] if `min_capacity` exceeds the maximum capacity of the arena
    /// or if the allocator refuses the request.
    pub fn reserve(&mut self, min_capacity: usize) -> Result<()> {
        if min_capacity > self.max_capacity {
            return Err(Error::Allocation {
                table: self.name,
                requested: min_capacity,
            });
        }
        if min_capacity <= self.records.capacity() {
            return Ok(());
        }

        let capacity = self.records.capacity();
        let step = match self.increment {
            None => capacity.max(MIN_GROWTH_INCREMENT),
            Some(increment) => increment,
        };
        let target = (capacity + step).min(self.max_capacity).max(min_capacity);

        self.records
            .try_reserve_exact(target - self.records.len())
            .map_err(|_| Error::Allocation {
                table: self.name,
                requested: target,
            })?;
        self.increment = Some(((target - capacity) / 2).max(MIN_GROWTH_INCREMENT));

        Ok(())
    }

    /// Appends a record and returns its index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`] if the arena cannot grow.
    pub fn push(&mut self, record: T) -> Result<u32> {
        let len = self.records.len();
        if len == self.records.capacity() || len >= self.max_capacity {
            self.reserve(len + 1)?;
        }
        let index = len as u32;
        self.records.push(record);

        Ok(index)
    }

    /// Stores a record, reusing the most recently freed slot if there is one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`] if no slot is free and the arena cannot grow.
    pub fn allocate(&mut self, record: T) -> Result<u32> {
        match self.vacant.pop() {
            Some(index) => {
                self.records[index as usize] = record;
                Ok(index)
            }
            None => self.push(record),
        }
    }

    /// Marks the slot at `index` for reuse. The record stays readable until reallocated.
    pub fn deallocate(&mut self, index: u32) {
        debug_assert!(
            index as usize >= self.reserved && (index as usize) < self.records.len(),
            "deallocated index {index} was never handed out"
        );
        self.vacant.push(index);
    }

    /// Releases unused capacity.
    ///
    /// # Errors
    ///
    /// Returns [`Violation::ShrinkWithVacantSlots`] while freed indices are waiting to be reused:
    /// shrinking is only allowed when no recorded index could be invalidated.
    pub fn shrink_to_fit(&mut self) -> Result<()> {
        if !self.vacant.is_empty() {
            return Err(Violation::ShrinkWithVacantSlots.into());
        }
        self.records.shrink_to_fit();
        self.increment = None;

        Ok(())
    }

    /// Returns the record at `index`, if that slot has ever been handed out.
    #[inline]
    pub fn get(&self, index: u32) -> Option<&T> {
        self.records.get(index as usize)
    }

    /// Returns the record at `index` mutably, if that slot has ever been handed out.
    #[inline]
    pub fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        self.records.get_mut(index as usize)
    }

    /// Returns the number of slots in use, including recycled and reserved ones.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing beyond the reserved placeholders was ever stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.len() == self.reserved
    }

    /// Returns the number of live records.
    #[inline]
    pub fn live(&self) -> usize {
        self.records.len() - self.reserved - self.vacant.len()
    }

    /// Returns the number of freed slots waiting for reuse.
    #[inline]
    pub fn vacant(&self) -> usize {
        self.vacant.len()
    }

    /// Returns the allocated capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.records.capacity()
    }
}

impl<T> Index<u32> for Arena<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: u32) -> &T {
        &self.records[index as usize]
    }
}

impl<T> IndexMut<u32> for Arena<T> {
    #[inline]
    fn index_mut(&mut self, index: u32) -> &mut T {
        &mut self.records[index as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_increments_halve_down_to_the_floor() {
        let mut arena = Arena::<u8>::with_reserved("test", 0, 1 << 20);
        arena.reserve(1000).unwrap();
        assert!(arena.capacity() >= 1000);

        // One more record than fits adds half of the previous step
        arena.reserve(1001).unwrap();
        assert!(arena.capacity() >= 1500);

        arena.reserve(1501).unwrap();
        assert!(arena.capacity() >= 1750);

        // From here on the increment is clamped to its floor
        arena.reserve(1751).unwrap();
        assert!(arena.capacity() >= 1750 + MIN_GROWTH_INCREMENT);
    }

    #[test]
    fn growth_is_clamped_to_the_maximum() {
        let mut arena = Arena::<u8>::with_reserved("test", 0, 300);
        arena.reserve(200).unwrap();
        arena.reserve(201).unwrap();

        assert!(arena.capacity() >= 201);
        assert!(arena.reserve(301).is_err());
    }

    #[test]
    fn spare_capacity_does_not_lift_the_maximum() {
        let mut arena = Arena::<u64>::with_reserved("test", 2, 3);
        assert_eq!(arena.push(7).unwrap(), 2);

        assert!(matches!(
            arena.push(8),
            Err(Error::Allocation { requested: 4, .. })
        ));
    }

    #[test]
    fn indices_survive_growth() {
        let mut arena = Arena::<usize>::with_reserved("test", 2, 1 << 16);
        let indices: Vec<u32> = (0..1000).map(|i| arena.push(i).unwrap()).collect();

        assert_eq!(indices[0], 2);
        for (value, &index) in indices.iter().enumerate() {
            assert_eq!(arena[index], value);
        }
        assert_eq!(arena.live(), 1000);
    }

    #[test]
    fn growth_beyond_maximum_fails() {
        let mut arena = Arena::<u8>::with_reserved("tiny", 0, 4);
        for _ in 0..4 {
            arena.push(0).unwrap();
        }

        assert!(matches!(
            arena.push(0),
            Err(Error::Allocation {
                table: "tiny",
                requested: 5
            })
        ));
    }

    #[test]
    fn shrink_refused_while_slots_are_vacant() {
        let mut arena = Arena::<u8>::with_reserved("test", 1, 64);
        let index = arena.allocate(1).unwrap();
        arena.deallocate(index);

        assert!(matches!(
            arena.shrink_to_fit(),
            Err(Error::Protocol(Violation::ShrinkWithVacantSlots))
        ));

        assert_eq!(arena.allocate(2).unwrap(), index);
        arena.shrink_to_fit().unwrap();
    }

    #[test]
    fn clear_keeps_reserved_placeholders() {
        let mut arena = Arena::<u8>::with_reserved("test", 2, 64);
        arena.push(9).unwrap();
        arena.clear();

        assert!(arena.is_empty());
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.push(3).unwrap(), 2);
    }
}
