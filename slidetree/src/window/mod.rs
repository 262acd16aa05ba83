// Copyright 2024 Logan Magee
//
// SPDX-License-Identifier: LicenseRef-Proprietary

//! The circular text window and the blocks it is filled with.

mod offset;
mod reader;
mod source;

use std::ops::Range;

use bytemuck::Zeroable;
use log::trace;
use suftree::{Error, Result, Symbol, Violation};

use crate::{ElmMethod, SlidingConfig};
use reader::BlockReader;

pub use offset::CircularOffset;
pub use reader::BlockStatus;
pub(crate) use reader::BoxedSource;
pub use source::{ByteSource, Endianness, SliceSource, SymbolSource};

/// Whether a read satisfied its request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReadStatus {
    /// Every requested block was filled completely
    Full,
    /// The stream ended before the request was satisfied
    EndOfStream,
}

/// What a call to [`Window::read_blocks`] delivered.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ReadOutcome {
    /// The number of blocks that received at least one symbol
    pub blocks_filled: usize,
    /// The number of symbols read
    pub chars_filled: usize,
    /// The number of input bytes those symbols were decoded from
    pub bytes_consumed: usize,
    /// Whether the stream is exhausted
    pub status: ReadStatus,
}

/// A circular buffer over a stream of symbols.
///
/// Stream positions are 1-based and never wrap; the buffer slot of a position is derived from it.
/// The window distinguishes three ranges of positions:
///
/// * the *active part* `[begin, end)`, which the suffix tree indexes exactly,
/// * the read-ahead `[end, read_end)`, already read but not yet indexed,
/// * the history before `begin`, kept readable for stale edge labels until its block is released.
pub struct Window<C> {
    blocks: Vec<Vec<C>>,
    statuses: Vec<BlockStatus>,
    block_size: usize,
    active_size: usize,
    size: usize,
    method: ElmMethod,
    pub(crate) begin: u64,
    pub(crate) end: u64,
    read_end: u64,
    last_batch_begin: u64,
    /// Blocks `[0, released)` have been handed back to the reader
    released: u64,
    /// Blocks `[0, acquired)` have been read
    acquired: u64,
    eof: bool,
    reader: BlockReader<C>,
}

impl<C: Symbol> Window<C> {
    pub(crate) fn new(config: &SlidingConfig, source: BoxedSource<C>) -> Result<Self> {
        let slots = config.effective_sw_scale_factor();
        let reader = BlockReader::new(source, config.reader_thread, slots, config.block_size)?;

        let mut blocks = Vec::with_capacity(slots);
        for _ in 0..slots {
            let mut block = Vec::new();
            if !reader.is_threaded() {
                block
                    .try_reserve_exact(config.block_size)
                    .map_err(|_| Error::Allocation {
                        table: "window",
                        requested: config.window_size(),
                    })?;
                block.resize(config.block_size, C::zeroed());
            }
            blocks.push(block);
        }

        Ok(Self {
            blocks,
            statuses: vec![BlockStatus::Unknown; slots],
            block_size: config.block_size,
            active_size: config.active_size(),
            size: config.window_size(),
            method: config.elm_method,
            begin: 1,
            end: 1,
            read_end: 1,
            last_batch_begin: 1,
            released: 0,
            acquired: 0,
            eof: false,
            reader,
        })
    }

    /// Reads up to `n` more blocks into the window.
    ///
    /// # Errors
    ///
    /// Returns [`Violation::WindowTooSmall`] if the slot of the next block still holds data that
    /// may be referenced, and [`Error::Io`] if the source fails.
    pub fn read_blocks(&mut self, n: usize) -> Result<ReadOutcome> {
        let mut outcome = ReadOutcome {
            blocks_filled: 0,
            chars_filled: 0,
            bytes_consumed: 0,
            status: if self.eof {
                ReadStatus::EndOfStream
            } else {
                ReadStatus::Full
            },
        };

        for _ in 0..n {
            if self.eof {
                break;
            }

            let number = self.acquired;
            let slot = self.slot_of_block(number);
            if number >= self.released + self.blocks.len() as u64 {
                return Err(Violation::WindowTooSmall.into());
            }

            let filled =
                self.reader
                    .acquire(number, slot, &mut self.blocks[slot], self.block_size)?;
            trace!("block {number} filled with {} symbols", filled.symbols);
            self.acquired += 1;
            self.statuses[slot] = BlockStatus::InUse;
            self.read_end += filled.symbols as u64;

            if filled.symbols > 0 {
                outcome.blocks_filled += 1;
            }
            outcome.chars_filled += filled.symbols;
            outcome.bytes_consumed += filled.bytes;
            if filled.symbols < self.block_size {
                self.eof = true;
                outcome.status = ReadStatus::EndOfStream;
            }
        }

        Ok(outcome)
    }

    /// Returns `true` if `position` may be referenced by an edge label under the configured
    /// edge-label maintenance method.
    ///
    /// Batch updates tolerate labels up to one active part behind the window, credits require
    /// labels inside the active part.
    pub fn validate_offset(&self, position: u64) -> bool {
        let oldest = match self.method {
            ElmMethod::Batch => self.begin.saturating_sub(self.active_size as u64).max(1),
            _ => self.begin,
        };

        (oldest..self.end).contains(&position)
    }

    /// Returns how far `position` lies behind the end of the active part. Older suffixes rank
    /// higher.
    pub fn leaf_depth_order(&self, position: u64) -> u64 {
        self.end - position
    }

    /// Returns `true` if the symbol at `position` is still held by the window.
    pub fn is_resident(&self, position: u64) -> bool {
        position > self.released * self.block_size as u64 && position < self.read_end
    }

    /// Returns the symbol at `position`.
    #[inline]
    pub fn symbol(&self, position: u64) -> C {
        debug_assert!(
            self.is_resident(position),
            "position {position} is not resident"
        );

        let index = (position - 1) as usize;
        self.blocks[(index / self.block_size) % self.blocks.len()][index % self.block_size]
    }

    /// Returns the active part.
    pub fn active_range(&self) -> Range<u64> {
        self.begin..self.end
    }

    /// Returns a copy of the active part.
    pub fn active_text(&self) -> Vec<C> {
        self.active_range().map(|p| self.symbol(p)).collect()
    }

    /// Returns the maximum length of the active part.
    pub fn active_size(&self) -> usize {
        self.active_size
    }

    /// Returns the number of symbols the window holds.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the status of the slot holding `position`.
    pub fn block_status(&self, position: u64) -> BlockStatus {
        self.statuses[self.slot_of_block((position - 1) / self.block_size as u64)]
    }

    /// Returns the position one past the last symbol read.
    pub fn read_end(&self) -> u64 {
        self.read_end
    }

    /// Returns `true` once the source is exhausted.
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Returns the leaf slot of a stream position.
    #[inline]
    pub(crate) fn slot_of(&self, position: u64) -> u32 {
        CircularOffset::of_position(position, self.size).index() as u32
    }

    /// Returns the position of the active suffix whose leaf occupies `slot`.
    #[inline]
    pub(crate) fn position_of_slot(&self, slot: u32) -> u64 {
        let begin = CircularOffset::of_position(self.begin, self.size);
        self.begin + begin.distance_to(CircularOffset::new(slot as usize, self.size)) as u64
    }

    /// Returns `true` if the next block must be read before the active part can grow.
    pub(crate) fn needs_read(&self) -> bool {
        self.end == self.read_end && !self.eof
    }

    /// Returns `true` if refilling the next block would overwrite data older than the last batch
    /// update allows.
    pub(crate) fn refill_blocked(&self) -> bool {
        self.acquired >= self.released + self.blocks.len() as u64
    }

    pub(crate) fn last_batch_begin(&self) -> u64 {
        self.last_batch_begin
    }

    pub(crate) fn record_batch_update(&mut self) {
        self.last_batch_begin = self.begin;
    }

    /// Marks fully passed blocks and hands back every block older than `oldest_referenced`.
    pub(crate) fn retire(&mut self, oldest_referenced: u64) {
        let block_size = self.block_size as u64;

        for number in self.released..self.acquired {
            let slot = self.slot_of_block(number);
            if (number + 1) * block_size < self.begin && self.statuses[slot] == BlockStatus::InUse {
                self.statuses[slot] = BlockStatus::StillInUse;
            }
        }

        while self.released < self.acquired
            && (self.released + 1) * block_size < oldest_referenced
        {
            let slot = self.slot_of_block(self.released);
            self.statuses[slot] = BlockStatus::Unknown;
            self.reader.release(slot, &mut self.blocks[slot]);
            self.released += 1;
        }
    }

    /// Stops the reader after a fatal error. Later reads fail.
    pub(crate) fn cancel_reader(&mut self) {
        self.reader.cancel();
    }

    #[cfg(test)]
    pub(crate) fn reader_running(&self) -> bool {
        self.reader.is_running()
    }

    fn slot_of_block(&self, number: u64) -> usize {
        (number % self.blocks.len() as u64) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(text: &[u8], block_size: usize, method: ElmMethod) -> Window<u8> {
        let mut config = SlidingConfig::new();
        config.block_size(block_size).elm_method(method);
        let config = config.validated().unwrap();

        Window::new(&config, Box::new(SliceSource::new(text.to_vec()))).unwrap()
    }

    #[test]
    fn reads_report_end_of_stream() {
        let mut window = window(b"abcdefghij", 4, ElmMethod::Batch);

        let outcome = window.read_blocks(2).unwrap();
        assert_eq!(outcome.blocks_filled, 2);
        assert_eq!(outcome.chars_filled, 8);
        assert_eq!(outcome.status, ReadStatus::Full);

        // The window holds two blocks, neither of which has been passed yet
        assert!(matches!(
            window.read_blocks(1),
            Err(Error::Protocol(Violation::WindowTooSmall))
        ));

        window.begin = 6;
        window.end = 9;
        window.retire(6);
        let outcome = window.read_blocks(1).unwrap();
        assert_eq!(outcome.chars_filled, 2);
        assert_eq!(outcome.status, ReadStatus::EndOfStream);
        assert!(window.is_eof());
        assert_eq!(window.symbol(10), b'j');
        assert_eq!(window.symbol(6), b'f');
    }

    #[test]
    fn batch_validity_reaches_behind_the_active_part() {
        let mut batch = window(b"abcdefghij", 4, ElmMethod::Batch);
        batch.begin = 6;
        batch.end = 9;
        let mut credit = window(b"abcdefghij", 4, ElmMethod::Credit);
        credit.begin = 6;
        credit.end = 9;

        assert!(batch.validate_offset(2));
        assert!(!batch.validate_offset(1));
        assert!(!credit.validate_offset(5));
        assert!(credit.validate_offset(6));
        assert!(!credit.validate_offset(9));
        assert_eq!(credit.leaf_depth_order(6), 3);
    }

    #[test]
    fn passed_blocks_wait_for_the_batch_update() {
        let mut window = window(b"abcdefgh", 2, ElmMethod::Batch);
        window.read_blocks(2).unwrap();
        window.begin = 4;
        window.end = 5;

        window.retire(window.last_batch_begin());
        assert_eq!(window.block_status(1), BlockStatus::StillInUse);
        assert!(window.refill_blocked());

        window.record_batch_update();
        window.retire(window.last_batch_begin());
        assert_eq!(window.block_status(3), BlockStatus::InUse);
        assert!(!window.refill_blocked());
    }

    #[test]
    fn leaf_slots_round_trip_through_positions() {
        let mut window = window(b"abcdefghijklmnop", 4, ElmMethod::Batch);
        window.begin = 7;
        window.end = 11;

        for position in 7..11 {
            assert_eq!(window.position_of_slot(window.slot_of(position)), position);
        }
    }
}
