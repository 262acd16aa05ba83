// Copyright 2023 Logan Magee
//
// SPDX-License-Identifier: LicenseRef-Proprietary

//! Array-based suffix trees.
//!
//! This crate holds the data model shared by every suffix tree in the workspace: typed node
//! references, growable index-stable arenas, and the [`TreeView`] trait through which trees are
//! traversed and checked. It also builds static suffix trees over a complete text with a
//! cache-friendly top-down algorithm, see [`build_pwotd`].
//!
//! # Examples
//!
//! ```
//! use suftree::{TreeView, build_pwotd, traversal};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let tree = build_pwotd(None, b"mississippi")?;
//!
//! // Every suffix, including the empty one, ends in its own leaf
//! let leaves = traversal::Preorder::new(&tree)
//!     .filter(|node| node.is_leaf())
//!     .count();
//! assert_eq!(leaves, 12);
//!
//! traversal::validate(&tree)?;
//! # Ok(())
//! # }
//! ```

mod arena;
mod error;
mod node;
mod pwotd;
mod symbol;
pub mod traversal;
mod view;

pub use arena::{Arena, MIN_GROWTH_INCREMENT};
pub use error::{Error, HashFailure, Result, Violation};
pub use node::{BranchIndex, NodeRef, ROOT_INDEX};
pub use pwotd::{StaticSuffixTree, build_pwotd, default_prefix_length};
pub use symbol::Symbol;
pub use view::TreeView;
