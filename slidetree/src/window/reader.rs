// Copyright 2024 Logan Magee
//
// SPDX-License-Identifier: LicenseRef-Proprietary

use bytemuck::Zeroable;
use suftree::{Result, Symbol};

use super::source::SymbolSource;

/// The life cycle of one block of the window.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BlockStatus {
    /// Free to be (re)filled by the reader
    Unknown,
    /// Filled by the reader and not yet taken over by the tree
    ReadUnprocessed,
    /// Part of the active part or of its read-ahead
    InUse,
    /// Behind the active part, but stale edge labels may still point into it
    StillInUse,
}

/// The result of filling one block.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Filled {
    pub(crate) symbols: usize,
    pub(crate) bytes: usize,
}

pub(crate) type BoxedSource<C> = Box<dyn SymbolSource<C> + Send>;

/// Fills window blocks from a [`SymbolSource`], either on the calling thread or ahead of time on
/// a dedicated one.
pub(crate) enum BlockReader<C> {
    Inline(BoxedSource<C>),
    #[cfg(feature = "threads")]
    Threaded(threaded::ReaderThread<C>),
}

impl<C: Symbol> BlockReader<C> {
    #[cfg_attr(not(feature = "threads"), allow(unused_variables))]
    pub(crate) fn new(
        source: BoxedSource<C>,
        threaded: bool,
        slots: usize,
        block_size: usize,
    ) -> Result<Self> {
        #[cfg(feature = "threads")]
        if threaded {
            return Ok(Self::Threaded(threaded::ReaderThread::spawn(
                source, slots, block_size,
            )?));
        }

        Ok(Self::Inline(source))
    }

    /// Returns `true` if block buffers are handed to and from another thread.
    pub(crate) fn is_threaded(&self) -> bool {
        !matches!(self, Self::Inline(_))
    }

    /// Hands the buffer of a block that is no longer referenced back for refilling.
    pub(crate) fn release(&mut self, slot: usize, block: &mut Vec<C>) {
        match self {
            Self::Inline(_) => {}
            #[cfg(feature = "threads")]
            Self::Threaded(reader) => reader.release(slot, std::mem::take(block)),
        }
    }

    /// Stops reading ahead. Blocks not yet taken can no longer be acquired.
    pub(crate) fn cancel(&mut self) {
        match self {
            Self::Inline(_) => {}
            #[cfg(feature = "threads")]
            Self::Threaded(reader) => reader.cancel(),
        }
    }

    /// Returns `true` while a reader thread is alive and not yet joined.
    #[cfg(test)]
    pub(crate) fn is_running(&self) -> bool {
        match self {
            Self::Inline(_) => false,
            #[cfg(feature = "threads")]
            Self::Threaded(reader) => reader.is_running(),
        }
    }

    /// Fills `block` with block `number` of the stream.
    #[cfg_attr(not(feature = "threads"), allow(unused_variables))]
    pub(crate) fn acquire(
        &mut self,
        number: u64,
        slot: usize,
        block: &mut Vec<C>,
        block_size: usize,
    ) -> Result<Filled> {
        match self {
            Self::Inline(source) => {
                if block.len() != block_size {
                    block.resize(block_size, C::zeroed());
                }
                let symbols = source.read_symbols(block)?;

                Ok(Filled {
                    symbols,
                    bytes: symbols * C::WIDTH,
                })
            }
            #[cfg(feature = "threads")]
            Self::Threaded(reader) => {
                let (buffer, symbols) = reader.acquire(number, slot)?;
                *block = buffer;

                Ok(Filled {
                    symbols,
                    bytes: symbols * C::WIDTH,
                })
            }
        }
    }
}

#[cfg(feature = "threads")]
mod threaded {
    use std::{
        io, mem,
        sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
        thread::{self, JoinHandle},
    };

    use bytemuck::Zeroable;
    use log::{debug, trace, warn};
    use suftree::{Error, Result, Symbol};

    use super::{BlockStatus, BoxedSource};

    struct Slot<C> {
        status: BlockStatus,
        number: u64,
        buffer: Vec<C>,
        symbols: usize,
    }

    struct State<C> {
        slots: Vec<Slot<C>>,
        /// The next block number the reader fills
        next: u64,
        /// Set once the stream is exhausted or failed
        finished: bool,
        cancelled: bool,
        error: Option<io::Error>,
    }

    type Shared<C> = Arc<(Mutex<State<C>>, Condvar)>;

    fn lock<C>(mutex: &Mutex<State<C>>) -> MutexGuard<'_, State<C>> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A thread that reads window blocks ahead of the tree.
    ///
    /// Block buffers change hands between the threads: the reader only ever touches buffers whose
    /// slot is [`BlockStatus::Unknown`], and fills slots strictly in stream order.
    pub(crate) struct ReaderThread<C> {
        shared: Shared<C>,
        handle: Option<JoinHandle<()>>,
    }

    impl<C: Symbol> ReaderThread<C> {
        pub(crate) fn spawn(source: BoxedSource<C>, slots: usize, block_size: usize) -> Result<Self> {
            let state = State {
                slots: (0..slots)
                    .map(|_| Slot {
                        status: BlockStatus::Unknown,
                        number: 0,
                        buffer: Vec::new(),
                        symbols: 0,
                    })
                    .collect(),
                next: 0,
                finished: false,
                cancelled: false,
                error: None,
            };
            let shared: Shared<C> = Arc::new((Mutex::new(state), Condvar::new()));

            let handle = thread::Builder::new()
                .name("slidetree-reader".into())
                .spawn({
                    let shared = Arc::clone(&shared);
                    move || read_ahead(&shared, source, block_size)
                })?;
            debug!("started reader thread with {slots} blocks of {block_size} symbols");

            Ok(Self {
                shared,
                handle: Some(handle),
            })
        }

        pub(crate) fn release(&mut self, slot: usize, buffer: Vec<C>) {
            let (mutex, ready) = &*self.shared;
            let mut state = lock(mutex);
            let slot = &mut state.slots[slot];
            slot.buffer = buffer;
            slot.status = BlockStatus::Unknown;
            ready.notify_all();
        }

        /// Waits for block `number` and takes its buffer, which is empty past the end of the
        /// stream.
        pub(crate) fn acquire(&mut self, number: u64, slot: usize) -> Result<(Vec<C>, usize)> {
            let (mutex, ready) = &*self.shared;
            let mut state = lock(mutex);
            loop {
                let staged = &mut state.slots[slot];
                if staged.status == BlockStatus::ReadUnprocessed && staged.number == number {
                    staged.status = BlockStatus::InUse;
                    return Ok((mem::take(&mut staged.buffer), staged.symbols));
                }
                if let Some(error) = state.error.take() {
                    return Err(Error::Io(error));
                }
                if state.cancelled {
                    return Err(Error::Io(io::Error::new(
                        io::ErrorKind::BrokenPipe,
                        "reader thread was stopped",
                    )));
                }
                if state.finished && state.next <= number {
                    return Ok((Vec::new(), 0));
                }

                state = ready.wait(state).unwrap_or_else(PoisonError::into_inner);
            }
        }
    }

    impl<C> ReaderThread<C> {
        /// Wakes the reader, tells it to stop and joins it.
        pub(crate) fn cancel(&mut self) {
            {
                let (mutex, ready) = &*self.shared;
                lock(mutex).cancelled = true;
                ready.notify_all();
            }

            if let Some(handle) = self.handle.take() {
                if handle.join().is_err() {
                    warn!("reader thread panicked");
                }
                debug!("reader thread stopped");
            }
        }

        #[cfg(test)]
        pub(crate) fn is_running(&self) -> bool {
            self.handle.is_some()
        }
    }

    impl<C> Drop for ReaderThread<C> {
        fn drop(&mut self) {
            self.cancel();
        }
    }

    fn read_ahead<C: Symbol>(shared: &Shared<C>, mut source: BoxedSource<C>, block_size: usize) {
        let (mutex, ready) = &**shared;

        loop {
            let (number, mut buffer) = {
                let mut state = lock(mutex);
                loop {
                    if state.cancelled || state.finished {
                        return;
                    }
                    let slot = (state.next % state.slots.len() as u64) as usize;
                    if state.slots[slot].status == BlockStatus::Unknown {
                        break;
                    }
                    state = ready.wait(state).unwrap_or_else(PoisonError::into_inner);
                }

                let number = state.next;
                let slot = (number % state.slots.len() as u64) as usize;
                (number, mem::take(&mut state.slots[slot].buffer))
            };

            buffer.resize(block_size, C::zeroed());
            let result = source.read_symbols(&mut buffer);

            let mut state = lock(mutex);
            let slot = (number % state.slots.len() as u64) as usize;
            match result {
                Ok(symbols) => {
                    trace!("read block {number} with {symbols} symbols");
                    state.slots[slot] = Slot {
                        status: BlockStatus::ReadUnprocessed,
                        number,
                        buffer,
                        symbols,
                    };
                    state.next += 1;
                    if symbols < block_size {
                        state.finished = true;
                    }
                }
                Err(error) => {
                    state.slots[slot].buffer = buffer;
                    state.error = Some(error);
                    state.finished = true;
                }
            }
            ready.notify_all();
        }
    }
}
