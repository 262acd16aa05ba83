// Copyright 2024 Logan Magee
//
// SPDX-License-Identifier: LicenseRef-Proprietary

//! An open-addressing hash table from `(source node, first letter)` to the target node of an edge.
//!
//! The first letter of an edge is never stored. Every slot only holds the source and the target,
//! and the letter is derived from the target on demand through a caller-supplied function. This
//! saves one word per edge at the price of a text lookup per comparison.

mod hasher;

use log::debug;
use suftree::{Error, HashFailure, NodeRef, Result, Violation};

use crate::CollisionResolution;

pub use hasher::{EdgeHasher, MixHasher};

/// The longest relocation chain a cuckoo insertion may start before giving up
pub const MAX_KICKS: usize = 1024;

/// The number of times a failed insertion may rebuild the table before giving up
pub const MAX_REHASH_ATTEMPTS: usize = 1024;

/// The smallest table size
const MIN_CAPACITY: usize = 8;

/// A rebuilt table never grows beyond this many slots per entry
const MAX_SLOTS_PER_ENTRY: usize = 16;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Slot {
    Empty,
    /// A deleted entry that probe sequences must skip rather than stop at
    Vacant,
    Occupied { source: u32, target: NodeRef },
}

/// Where the members of a hash family put a key in a table of a given size.
#[derive(Clone, Copy)]
struct Probe<'h, H> {
    hasher: &'h H,
    resolution: CollisionResolution,
    functions: u32,
    seed: u64,
    mask: usize,
}

impl<H: EdgeHasher> Probe<'_, H> {
    /// Returns the `i`-th candidate slot for a key.
    #[inline]
    fn slot(&self, source: u32, letter: u32, i: u32) -> usize {
        match self.resolution {
            CollisionResolution::Cuckoo => {
                self.hasher.hash(source, letter, i, self.seed) as usize & self.mask
            }
            CollisionResolution::DoubleHashing => {
                let primary = self.hasher.hash(source, letter, 0, self.seed);
                // An odd step visits every slot of a power-of-two table
                let step = self.hasher.hash(source, letter, 1, self.seed) | 1;
                primary.wrapping_add(u64::from(i).wrapping_mul(step)) as usize & self.mask
            }
        }
    }

    fn candidates(&self) -> u32 {
        match self.resolution {
            CollisionResolution::Cuckoo => self.functions,
            CollisionResolution::DoubleHashing => (self.mask + 1) as u32,
        }
    }

    /// Places an entry, relocating others cuckoo-style if needed, and returns the length of the
    /// relocation chain. Every overwritten slot is recorded in `log`.
    fn place<L>(
        &self,
        slots: &mut [Slot],
        entry: (u32, NodeRef),
        letter_of: &L,
        log: &mut Vec<(usize, Slot)>,
    ) -> Option<usize>
    where
        L: Fn(u32, NodeRef) -> u32,
    {
        let (mut source, mut target) = entry;
        let mut previous = usize::MAX;

        for kicks in 0..=MAX_KICKS {
            let letter = letter_of(source, target);
            for i in 0..self.candidates() {
                let index = self.slot(source, letter, i);
                match slots[index] {
                    Slot::Empty | Slot::Vacant => {
                        log.push((index, slots[index]));
                        slots[index] = Slot::Occupied { source, target };
                        return Some(kicks);
                    }
                    Slot::Occupied { .. } => {}
                }
            }
            if self.resolution == CollisionResolution::DoubleHashing || kicks == MAX_KICKS {
                break;
            }

            let mut index = self.slot(source, letter, kicks as u32 % self.functions);
            if index == previous {
                index = self.slot(source, letter, (kicks as u32 + 1) % self.functions);
            }
            let Slot::Occupied {
                source: victim_source,
                target: victim_target,
            } = slots[index]
            else {
                unreachable!("every candidate slot was checked to be occupied");
            };
            log.push((index, slots[index]));
            slots[index] = Slot::Occupied { source, target };
            (source, target) = (victim_source, victim_target);
            previous = index;
        }

        None
    }
}

/// Counters of an [`EdgeMap`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct EdgeMapStats {
    /// The number of successful table rebuilds
    pub rehashes: u64,
    /// The longest cuckoo relocation chain seen
    pub max_kick_depth: usize,
}

/// An open-addressing edge table.
///
/// # Examples
///
/// ```
/// use slidetree::{CollisionResolution, EdgeMap, MixHasher};
/// use suftree::NodeRef;
///
/// # fn main() -> suftree::Result<()> {
/// // Targets are leaves numbered by their letter in this example
/// let letter_of = |_source: u32, target: NodeRef| target.leaf().unwrap_or(0);
/// let mut map = EdgeMap::new(16, CollisionResolution::Cuckoo, 4, true, MixHasher);
///
/// map.insert(1, 7, NodeRef::Leaf(7), &letter_of)?;
/// assert_eq!(map.find(1, 7, &letter_of), NodeRef::Leaf(7));
/// assert_eq!(map.find(2, 7, &letter_of), NodeRef::None);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct EdgeMap<H = MixHasher> {
    slots: Vec<Slot>,
    len: usize,
    vacant: usize,
    resolution: CollisionResolution,
    functions: u32,
    seed: u64,
    allow_rehash: bool,
    hasher: H,
    stats: EdgeMapStats,
}

impl<H: EdgeHasher> EdgeMap<H> {
    /// Creates a table of at least `capacity` slots.
    ///
    /// `functions` is the number of cuckoo hash functions and is ignored for double hashing.
    pub fn new(
        capacity: usize,
        resolution: CollisionResolution,
        functions: usize,
        allow_rehash: bool,
        hasher: H,
    ) -> Self {
        let capacity = capacity.max(MIN_CAPACITY).next_power_of_two();

        Self {
            slots: vec![Slot::Empty; capacity],
            len: 0,
            vacant: 0,
            resolution,
            functions: functions.max(2) as u32,
            seed: 0,
            allow_rehash,
            hasher,
            stats: EdgeMapStats::default(),
        }
    }

    /// Returns the number of edges.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the table holds no edges.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the rehash and relocation counters.
    pub fn stats(&self) -> EdgeMapStats {
        self.stats
    }

    fn probe(&self) -> Probe<'_, H> {
        Probe {
            hasher: &self.hasher,
            resolution: self.resolution,
            functions: self.functions,
            seed: self.seed,
            mask: self.slots.len() - 1,
        }
    }

    fn slot_of<L>(&self, source: u32, letter: u32, letter_of: &L) -> Option<usize>
    where
        L: Fn(u32, NodeRef) -> u32,
    {
        let probe = self.probe();
        for i in 0..probe.candidates() {
            let index = probe.slot(source, letter, i);
            match self.slots[index] {
                Slot::Occupied {
                    source: found,
                    target,
                } if found == source && letter_of(found, target) == letter => return Some(index),
                Slot::Empty if self.resolution == CollisionResolution::DoubleHashing => {
                    return None;
                }
                _ => {}
            }
        }

        None
    }

    /// Returns the target of the edge leaving `source` with `letter`, or [`NodeRef::None`].
    pub fn find<L>(&self, source: u32, letter: u32, letter_of: &L) -> NodeRef
    where
        L: Fn(u32, NodeRef) -> u32,
    {
        match self.slot_of(source, letter, letter_of).map(|i| self.slots[i]) {
            Some(Slot::Occupied { target, .. }) => target,
            _ => NodeRef::None,
        }
    }

    /// Adds an edge. The table must not already hold an edge for the same key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HashExhausted`] if the edge cannot be placed, with
    /// [`HashFailure::RehashDisallowed`] if the table may not be rebuilt and
    /// [`HashFailure::AttemptsExhausted`] if every rebuild failed. The table is unchanged on
    /// error.
    pub fn insert<L>(&mut self, source: u32, letter: u32, target: NodeRef, letter_of: &L) -> Result<()>
    where
        L: Fn(u32, NodeRef) -> u32,
    {
        debug_assert_eq!(letter_of(source, target), letter, "letter does not match target");

        let occupied = self.len + 1 + self.vacant;
        let overloaded = match self.resolution {
            CollisionResolution::Cuckoo => occupied * 8 > self.slots.len() * 7,
            CollisionResolution::DoubleHashing => occupied * 4 > self.slots.len() * 3,
        };
        if overloaded && self.allow_rehash {
            return self.rehash(Some((source, target)), letter_of);
        }

        let mut log = Vec::new();
        let probe = Probe {
            hasher: &self.hasher,
            resolution: self.resolution,
            functions: self.functions,
            seed: self.seed,
            mask: self.slots.len() - 1,
        };
        match probe.place(&mut self.slots, (source, target), letter_of, &mut log) {
            Some(kicks) => {
                if matches!(log.first(), Some((_, Slot::Vacant))) {
                    self.vacant -= 1;
                }
                self.len += 1;
                self.stats.max_kick_depth = self.stats.max_kick_depth.max(kicks);
                Ok(())
            }
            None => {
                for (index, slot) in log.into_iter().rev() {
                    self.slots[index] = slot;
                }
                self.rehash(Some((source, target)), letter_of)
            }
        }
    }

    /// Points the edge leaving `source` with `letter` at a new target with the same first letter.
    ///
    /// # Errors
    ///
    /// Returns [`Violation::UnknownNode`] if there is no such edge.
    pub fn replace<L>(&mut self, source: u32, letter: u32, target: NodeRef, letter_of: &L) -> Result<()>
    where
        L: Fn(u32, NodeRef) -> u32,
    {
        let index = self
            .slot_of(source, letter, letter_of)
            .ok_or(Violation::UnknownNode(NodeRef::Branch(source)))?;
        self.slots[index] = Slot::Occupied { source, target };

        Ok(())
    }

    /// Removes the edge leaving `source` with `letter` and returns its target.
    ///
    /// # Errors
    ///
    /// Returns [`Violation::UnknownNode`] if there is no such edge.
    pub fn remove<L>(&mut self, source: u32, letter: u32, letter_of: &L) -> Result<NodeRef>
    where
        L: Fn(u32, NodeRef) -> u32,
    {
        let index = self
            .slot_of(source, letter, letter_of)
            .ok_or(Violation::UnknownNode(NodeRef::Branch(source)))?;
        let Slot::Occupied { target, .. } = self.slots[index] else {
            return Err(Violation::UnknownNode(NodeRef::Branch(source)).into());
        };

        self.slots[index] = match self.resolution {
            // No probe sequence runs through a cuckoo slot
            CollisionResolution::Cuckoo => Slot::Empty,
            CollisionResolution::DoubleHashing => {
                self.vacant += 1;
                Slot::Vacant
            }
        };
        self.len -= 1;

        Ok(target)
    }

    /// Returns the first target leaving `source` found at or after slot `start`, with its slot.
    pub(crate) fn scan(&self, source: u32, start: usize) -> Option<(usize, NodeRef)> {
        self.slots
            .iter()
            .enumerate()
            .skip(start)
            .find_map(|(index, slot)| match *slot {
                Slot::Occupied { source: s, target } if s == source => Some((index, target)),
                _ => None,
            })
    }

    /// Returns the target following `child` among the edges leaving `source`, in table order.
    pub(crate) fn next_after<L>(&self, source: u32, child: NodeRef, letter_of: &L) -> NodeRef
    where
        L: Fn(u32, NodeRef) -> u32,
    {
        self.slot_of(source, letter_of(source, child), letter_of)
            .and_then(|index| self.scan(source, index + 1))
            .map_or(NodeRef::None, |(_, target)| target)
    }

    /// Rebuilds the table with a new seed, growing it as needed, and adds `extra`.
    ///
    /// The rebuilt table only replaces the live one once every entry has been placed.
    fn rehash<L>(&mut self, extra: Option<(u32, NodeRef)>, letter_of: &L) -> Result<()>
    where
        L: Fn(u32, NodeRef) -> u32,
    {
        if !self.allow_rehash {
            return Err(Error::HashExhausted(HashFailure::RehashDisallowed));
        }

        let entries: Vec<(u32, NodeRef)> = self
            .slots
            .iter()
            .filter_map(|slot| match *slot {
                Slot::Occupied { source, target } => Some((source, target)),
                _ => None,
            })
            .chain(extra)
            .collect();

        let limit = (entries.len().next_power_of_two() * MAX_SLOTS_PER_ENTRY).max(self.slots.len());
        let mut capacity = self.slots.len();
        if entries.len() * 2 > capacity {
            capacity = (capacity * 2).min(limit);
        }

        let mut log = Vec::new();
        for attempt in 0..MAX_REHASH_ATTEMPTS {
            if attempt > 0 && attempt % 4 == 0 {
                capacity = (capacity * 2).min(limit);
            }

            let mut slots = Vec::new();
            slots
                .try_reserve_exact(capacity)
                .map_err(|_| Error::Allocation {
                    table: "edge map",
                    requested: capacity,
                })?;
            slots.resize(capacity, Slot::Empty);

            let probe = Probe {
                hasher: &self.hasher,
                resolution: self.resolution,
                functions: self.functions,
                seed: self.seed.wrapping_add(attempt as u64 + 1),
                mask: capacity - 1,
            };
            let mut max_kicks = 0;
            let placed = entries.iter().all(|&entry| {
                log.clear();
                probe
                    .place(&mut slots, entry, letter_of, &mut log)
                    .map(|kicks| max_kicks = max_kicks.max(kicks))
                    .is_some()
            });

            if placed {
                debug!(
                    "rebuilt edge map with {} entries into {capacity} slots after {} attempts",
                    entries.len(),
                    attempt + 1
                );
                self.seed = probe.seed;
                self.slots = slots;
                self.len = entries.len();
                self.vacant = 0;
                self.stats.rehashes += 1;
                self.stats.max_kick_depth = self.stats.max_kick_depth.max(max_kicks);
                return Ok(());
            }
        }

        Err(Error::HashExhausted(HashFailure::AttemptsExhausted))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    /// Targets are leaves numbered by their letter.
    fn letter_of(_source: u32, target: NodeRef) -> u32 {
        target.leaf().unwrap_or(u32::MAX)
    }

    /// Puts keys exactly where a lookup table says.
    struct TableHasher(HashMap<(u32, u32), u64>);

    impl EdgeHasher for TableHasher {
        fn hash(&self, _source: u32, letter: u32, function: u32, _seed: u64) -> u64 {
            self.0.get(&(letter, function)).copied().unwrap_or(15)
        }
    }

    struct ConstantHasher;

    impl EdgeHasher for ConstantHasher {
        fn hash(&self, _: u32, _: u32, _: u32, _: u64) -> u64 {
            0
        }
    }

    #[test]
    fn cuckoo_relocates_through_a_chain() {
        let mut table = HashMap::new();
        // Letters 0 to 7 each own the slot of their first function
        for letter in 0..8 {
            for function in 0..4 {
                table.insert((letter, function), u64::from(letter + 8 * (function > 0) as u32));
            }
        }
        // Letter 0 can only move on to the slots of letters 4, 5 and 6
        table.insert((0, 1), 4);
        table.insert((0, 2), 5);
        table.insert((0, 3), 6);
        // Letter 4 has a free alternative
        table.insert((4, 1), 8);
        // Letter 8 collides with letters 0 to 3
        for function in 0..4 {
            table.insert((8, function), u64::from(function));
        }

        let mut map = EdgeMap::new(16, CollisionResolution::Cuckoo, 4, true, TableHasher(table));
        for letter in 0..8 {
            map.insert(1, letter, NodeRef::Leaf(letter), &letter_of).unwrap();
        }
        assert_eq!(map.stats().rehashes, 0);
        assert_eq!(map.stats().max_kick_depth, 0);

        map.insert(1, 8, NodeRef::Leaf(8), &letter_of).unwrap();
        assert_eq!(map.stats().rehashes, 0);
        assert!(map.stats().max_kick_depth >= 2);
        for letter in 0..9 {
            assert_eq!(map.find(1, letter, &letter_of), NodeRef::Leaf(letter));
        }
        assert_eq!(map.len(), 9);
    }

    #[test]
    fn failed_placement_rehashes_or_reports() {
        let mut strict = EdgeMap::new(8, CollisionResolution::Cuckoo, 2, false, ConstantHasher);
        strict.insert(1, 0, NodeRef::Leaf(0), &letter_of).unwrap();
        assert!(matches!(
            strict.insert(1, 1, NodeRef::Leaf(1), &letter_of),
            Err(Error::HashExhausted(HashFailure::RehashDisallowed))
        ));
        // The failed insertion left the table as it was
        assert_eq!(strict.find(1, 0, &letter_of), NodeRef::Leaf(0));
        assert_eq!(strict.len(), 1);

        let mut hopeless = EdgeMap::new(8, CollisionResolution::Cuckoo, 2, true, ConstantHasher);
        hopeless.insert(1, 0, NodeRef::Leaf(0), &letter_of).unwrap();
        assert!(matches!(
            hopeless.insert(1, 1, NodeRef::Leaf(1), &letter_of),
            Err(Error::HashExhausted(HashFailure::AttemptsExhausted))
        ));
        assert_eq!(hopeless.find(1, 0, &letter_of), NodeRef::Leaf(0));
    }

    #[test]
    fn growth_keeps_every_edge() {
        for resolution in [CollisionResolution::Cuckoo, CollisionResolution::DoubleHashing] {
            let mut map = EdgeMap::new(8, resolution, 3, true, MixHasher);
            for source in 1..50 {
                for letter in 0..20 {
                    map.insert(source, letter, NodeRef::Leaf(letter), &letter_of)
                        .unwrap();
                }
            }

            assert!(map.stats().rehashes > 0);
            assert_eq!(map.len(), 49 * 20);
            for source in 1..50 {
                for letter in 0..20 {
                    assert_eq!(map.find(source, letter, &letter_of), NodeRef::Leaf(letter));
                }
            }
        }
    }

    #[test]
    fn double_hashing_probes_past_deleted_entries() {
        let mut map = EdgeMap::new(64, CollisionResolution::DoubleHashing, 0, true, ConstantHasher);
        // Every key shares one probe sequence
        for letter in 0..5 {
            map.insert(1, letter, NodeRef::Leaf(letter), &letter_of).unwrap();
        }

        assert_eq!(map.remove(1, 1, &letter_of).unwrap(), NodeRef::Leaf(1));
        assert_eq!(map.find(1, 1, &letter_of), NodeRef::None);
        assert_eq!(map.find(1, 4, &letter_of), NodeRef::Leaf(4));

        // The tombstone is reused
        map.insert(1, 9, NodeRef::Leaf(9), &letter_of).unwrap();
        assert_eq!(map.capacity(), 64);
        assert_eq!(map.find(1, 9, &letter_of), NodeRef::Leaf(9));
        assert_eq!(map.find(1, 4, &letter_of), NodeRef::Leaf(4));
    }

    #[test]
    fn children_are_scanned_in_table_order() {
        let mut map = EdgeMap::new(32, CollisionResolution::Cuckoo, 4, true, MixHasher);
        for letter in 0..5 {
            map.insert(3, letter, NodeRef::Leaf(letter), &letter_of).unwrap();
        }
        map.insert(4, 0, NodeRef::Leaf(0), &letter_of).unwrap();

        let mut seen = Vec::new();
        let mut child = map.scan(3, 0).map_or(NodeRef::None, |(_, target)| target);
        while child.is_some() {
            seen.push(child.leaf().unwrap());
            child = map.next_after(3, child, &letter_of);
        }
        seen.sort_unstable();

        assert_eq!(seen, [0, 1, 2, 3, 4]);
    }
}
