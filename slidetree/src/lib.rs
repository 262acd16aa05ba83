// Copyright 2024 Logan Magee
//
// SPDX-License-Identifier: LicenseRef-Proprietary

//! Suffix trees maintained over a sliding window of a text stream.
//!
//! The stream is read in fixed-size blocks into a circular window. A suffix of what has been
//! read, the *active part*, is indexed by a suffix tree that Ukkonen's algorithm extends by one
//! symbol at a time while the oldest suffix is deleted at the other end, so the tree always
//! indexes exactly the last [`SlidingConfig::active_size`] symbols.
//!
//! Two node representations are available: children kept in singly linked sibling lists, which
//! is compact, or in one open-addressing hash table keyed by parent and first letter, which
//! branches in constant time. Edge labels are kept readable while the window moves either by
//! periodic batch updates or by credits sent up the tree, see [`ElmMethod`].
//!
//! # Examples
//!
//! ```
//! use slidetree::{ElmMethod, Representation, SliceSource, SlidingConfig};
//! use suftree::{TreeView, traversal};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = SlidingConfig::new();
//! config
//!     .block_size(8)
//!     .ap_scale_factor(2)
//!     .representation(Representation::Slli)
//!     .elm_method(ElmMethod::Credit);
//!
//! let text = b"she sells sea shells by the sea shore".to_vec();
//! let mut tree = slidetree::build_sliding_window_ukkonen(&config, SliceSource::new(text))?;
//!
//! while tree.step()? {
//!     traversal::validate(&tree)?;
//! }
//! assert!(tree.stats().removed_unary_nodes > 0);
//! # Ok(())
//! # }
//! ```

mod config;
mod edgemap;
mod engine;
mod sliding;
mod tree;
mod window;

pub use config::{CollisionResolution, ElmMethod, Representation, SlidingConfig, Variation};
pub use edgemap::{EdgeHasher, EdgeMap, EdgeMapStats, MAX_KICKS, MAX_REHASH_ATTEMPTS, MixHasher};
pub use engine::{Phase, Stats};
pub use sliding::{SlidingSuffixTree, build_sliding_window_ukkonen};
pub use suftree::{Error, Result};
pub use window::{
    BlockStatus, ByteSource, CircularOffset, Endianness, ReadOutcome, ReadStatus, SliceSource,
    SymbolSource, Window,
};
