// Copyright 2024 Logan Magee
//
// SPDX-License-Identifier: LicenseRef-Proprietary

use core::ops::Range;

use crate::{Symbol, error::Result, error::Violation};

/// Texts up to this many symbols are built as one single partition
const UNPARTITIONED_LIMIT: usize = 1 << 20;

/// Every factor of this size beyond the unpartitioned limit adds one prefix symbol
const PREFIX_STEP_BITS: u32 = 5;

/// The number of counting-sort buckets: one per byte value plus one for "past the end"
const BUCKETS: usize = 257;

/// A text with 1-based positions whose position `len + 1` is the terminator.
#[derive(Clone, Copy)]
pub(crate) struct Text<'a, C> {
    symbols: &'a [C],
}

impl<'a, C: Symbol> Text<'a, C> {
    pub(crate) fn new(symbols: &'a [C]) -> Self {
        Self { symbols }
    }

    /// Returns the number of symbols, not counting the terminator.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns the symbol `offset` places into the suffix starting at `start`, or `None` once the
    /// suffix has run into the terminator.
    #[inline]
    pub(crate) fn at(&self, start: u32, offset: usize) -> Option<C> {
        self.symbols.get(start as usize + offset - 1).copied()
    }

    /// Returns the length of the suffix starting at `start`, counting the terminator.
    #[inline]
    pub(crate) fn suffix_len(&self, start: u32) -> usize {
        self.symbols.len() + 2 - start as usize
    }
}

/// A run of the suffix table whose suffixes share their first `prefix_length` symbols.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Partition {
    /// The range of the suffix table occupied by the partition
    pub(crate) range: Range<usize>,
    /// The length of the prefix shared by every suffix of the partition
    pub(crate) lcp: usize,
    /// The start of the longest suffix of the partition
    pub(crate) text_offset: u32,
}

/// Derives the prefix length used for partitioning from the text length.
///
/// Small texts are not partitioned at all. Beyond that one prefix symbol is used, plus one more
/// for every factor of 32 the text grows past 32 Mi symbols.
pub fn auto_prefix_length(len: usize) -> usize {
    if len <= UNPARTITIONED_LIMIT {
        return 0;
    }

    let mut prefix_length = 1;
    let mut rest = len >> 25;
    while rest > 0 {
        prefix_length += 1;
        rest >>= PREFIX_STEP_BITS;
    }

    prefix_length
}

/// Sorts `suffixes` by their first `prefix_length` symbols.
///
/// This is a byte-wise radix sort: every prefix position from the last to the first, and every
/// byte of a symbol from least to most significant, gets one stable counting sort pass. Suffixes
/// that end before a position sort before every symbol at that position. Suffixes with equal
/// prefixes keep their relative order, so a table initialized in text order yields the longest
/// suffix first within each partition.
pub(crate) fn order_suffixes<C: Symbol>(
    text: Text<'_, C>,
    suffixes: &mut [u32],
    scratch: &mut Vec<u32>,
    prefix_length: usize,
) {
    scratch.clear();
    scratch.resize(suffixes.len(), 0);

    for offset in (0..prefix_length).rev() {
        for byte in 0..C::WIDTH {
            let key = |start: u32| match text.at(start, offset) {
                Some(symbol) => 1 + symbol.byte(byte) as usize,
                None => 0,
            };

            let mut counts = [0usize; BUCKETS];
            for &start in suffixes.iter() {
                counts[key(start)] += 1;
            }

            let mut sum = 0;
            for count in counts.iter_mut() {
                let bucket_len = *count;
                *count = sum;
                sum += bucket_len;
            }

            for &start in suffixes.iter() {
                let bucket = &mut counts[key(start)];
                scratch[*bucket] = start;
                *bucket += 1;
            }

            suffixes.copy_from_slice(scratch);
        }
    }
}

/// Returns the length of the prefix shared by all suffixes in `group`, knowing they already
/// share their first `known` symbols.
///
/// # Errors
///
/// Returns [`Violation::DuplicateSuffixLength`] if two suffixes end at the same depth.
pub(crate) fn group_lcp<C: Symbol>(text: Text<'_, C>, group: &[u32], known: usize) -> Result<usize> {
    let mut depth = known;
    loop {
        let first = text.at(group[0], depth);
        let agree = first.is_some() && group[1..].iter().all(|&s| text.at(s, depth) == first);
        if !agree {
            let ended = group.iter().filter(|&&s| text.at(s, depth).is_none()).count();
            if ended > 1 {
                return Err(Violation::DuplicateSuffixLength.into());
            }

            return Ok(depth);
        }
        depth += 1;
    }
}

/// Returns the length of the common prefix of two suffixes, starting the comparison at `from`.
pub(crate) fn pair_lcp<C: Symbol>(text: Text<'_, C>, a: u32, b: u32, from: usize) -> usize {
    let mut depth = from;
    while let Some(symbol) = text.at(a, depth) {
        if text.at(b, depth) != Some(symbol) {
            break;
        }
        depth += 1;
    }

    depth
}

/// Cuts a suffix table sorted by [`order_suffixes`] into maximal runs sharing a
/// `prefix_length`-symbol prefix.
///
/// # Errors
///
/// Returns [`Violation::DuplicateSuffixLength`] if two suffixes of one run end at the same depth.
pub(crate) fn partition<C: Symbol>(
    text: Text<'_, C>,
    suffixes: &[u32],
    prefix_length: usize,
) -> Result<Vec<Partition>> {
    let same_prefix = |a: u32, b: u32| (0..prefix_length).all(|k| text.at(a, k) == text.at(b, k));

    let mut partitions = Vec::new();
    let mut begin = 0;
    while begin < suffixes.len() {
        let leader = suffixes[begin];
        let mut end = begin + 1;
        while end < suffixes.len() && same_prefix(leader, suffixes[end]) {
            end += 1;
        }

        let lcp = if end - begin == 1 {
            text.suffix_len(leader)
        } else {
            // A run whose leader is too short for the full prefix cannot hold a second suffix
            let known = prefix_length.min(text.suffix_len(leader) - 1);
            group_lcp(text, &suffixes[begin..end], known)?
        };

        partitions.push(Partition {
            range: begin..end,
            lcp,
            text_offset: leader,
        });
        begin = end;
    }

    Ok(partitions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(text: &[u8], prefix_length: usize) -> Vec<u32> {
        let mut suffixes: Vec<u32> = (1..=text.len() as u32 + 1).collect();
        order_suffixes(Text::new(text), &mut suffixes, &mut Vec::new(), prefix_length);
        suffixes
    }

    #[test]
    fn prefix_length_grows_with_text() {
        assert_eq!(auto_prefix_length(0), 0);
        assert_eq!(auto_prefix_length(1 << 20), 0);
        assert_eq!(auto_prefix_length((1 << 20) + 1), 1);
        assert_eq!(auto_prefix_length(1 << 25), 2);
        assert_eq!(auto_prefix_length(1 << 30), 3);
    }

    #[test]
    fn one_symbol_prefix_groups_by_first_symbol() {
        // Terminator first, then a, b, n; text order within each group
        assert_eq!(sorted(b"banana", 1), [7, 2, 4, 6, 1, 3, 5]);
    }

    #[test]
    fn two_symbol_prefix_refines_groups() {
        // $ | a$ | ana ana | ban | na na
        assert_eq!(sorted(b"banana", 2), [7, 6, 2, 4, 1, 3, 5]);
    }

    #[test]
    fn wide_symbols_sort_by_every_byte() {
        let text: [u16; 4] = [0x0201, 0x0102, 0x0201, 0x0101];
        let mut suffixes: Vec<u32> = (1..=5).collect();
        order_suffixes(Text::new(&text), &mut suffixes, &mut Vec::new(), 1);

        assert_eq!(suffixes, [5, 4, 2, 1, 3]);
    }

    #[test]
    fn partitions_record_lcp_and_longest_suffix() {
        let text = Text::new(b"banana".as_slice());
        let suffixes = sorted(b"banana", 2);
        let partitions = partition(text, &suffixes, 2).unwrap();

        assert_eq!(partitions.len(), 5);
        assert_eq!(
            partitions[2],
            Partition {
                range: 2..4,
                lcp: 3,
                text_offset: 2,
            }
        );
        assert_eq!(partitions[4].lcp, 2);
        assert_eq!(partitions[4].text_offset, 3);
        assert_eq!(partitions[0].lcp, 1);
    }

    #[test]
    fn group_lcp_stops_at_first_difference() {
        let text = Text::new(b"abcabd".as_slice());

        assert_eq!(group_lcp(text, &[1, 4], 0).unwrap(), 2);
        assert_eq!(pair_lcp(text, 1, 4, 1), 2);
        assert_eq!(pair_lcp(text, 3, 6, 0), 0);
    }
}
