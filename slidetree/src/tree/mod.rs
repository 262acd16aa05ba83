// Copyright 2024 Logan Magee
//
// SPDX-License-Identifier: LicenseRef-Proprietary

//! Node storage shared by both child representations.

mod shti;
mod slli;

use suftree::{Arena, BranchIndex, Error, NodeRef, ROOT_INDEX, Result, Symbol};

use crate::{SlidingConfig, edgemap::EdgeMapStats, window::Window};

pub(crate) use shti::Shti;
pub(crate) use slli::Slli;

/// A branching node of a sliding-window suffix tree.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Branch {
    pub(crate) parent: BranchIndex,
    pub(crate) depth: u32,
    /// A position at which the path label of this node occurs in the window
    pub(crate) head: u64,
    /// 0 until the link is known
    pub(crate) suffix_link: BranchIndex,
    pub(crate) credit: bool,
}

/// Branch records and leaf parents.
///
/// Leaves have no record of their own. A leaf is named by the window slot of the position its
/// suffix starts at, and only its parent is stored, in a table indexed by that slot.
pub(crate) struct Nodes {
    pub(crate) branches: Arena<Branch>,
    pub(crate) leaf_parents: Vec<BranchIndex>,
}

/// Returns the number of branch indices an active part of `active_size` symbols can use, the
/// reserved ones included.
pub(crate) fn branch_capacity(active_size: usize) -> usize {
    ROOT_INDEX as usize + active_size + 1
}

/// Allocates a table of `len` copies of `value`, reporting failure instead of aborting.
pub(crate) fn table<T: Clone>(name: &'static str, len: usize, value: T) -> Result<Vec<T>> {
    let mut table = Vec::new();
    table.try_reserve_exact(len).map_err(|_| Error::Allocation {
        table: name,
        requested: len,
    })?;
    table.resize(len, value);

    Ok(table)
}

impl Nodes {
    pub(crate) fn new(window_size: usize, active_size: usize) -> Result<Self> {
        let mut branches: Arena<Branch> = Arena::with_reserved(
            "branch",
            ROOT_INDEX as usize + 1,
            branch_capacity(active_size),
        );
        // The root label is empty, so any position will do as its head
        branches[ROOT_INDEX].head = 1;

        Ok(Self {
            branches,
            leaf_parents: table("leaf parent", window_size, 0)?,
        })
    }

    #[inline]
    pub(crate) fn parent(&self, node: NodeRef) -> BranchIndex {
        match node {
            NodeRef::Branch(index) => self.branches[index].parent,
            NodeRef::Leaf(slot) => self.leaf_parents[slot as usize],
            NodeRef::None => 0,
        }
    }

    #[inline]
    pub(crate) fn set_parent(&mut self, node: NodeRef, parent: BranchIndex) {
        match node {
            NodeRef::Branch(index) => self.branches[index].parent = parent,
            NodeRef::Leaf(slot) => self.leaf_parents[slot as usize] = parent,
            NodeRef::None => {}
        }
    }
}

/// Resolves heads, depths and first letters of nodes against the window.
#[derive(Clone, Copy)]
pub(crate) struct Labels<'a, C> {
    pub(crate) nodes: &'a Nodes,
    pub(crate) window: &'a Window<C>,
}

impl<C: Symbol> Labels<'_, C> {
    /// Returns a position at which the path label of `node` starts.
    #[inline]
    pub(crate) fn head(&self, node: NodeRef) -> u64 {
        match node {
            NodeRef::Branch(index) => self.nodes.branches[index].head,
            NodeRef::Leaf(slot) => self.window.position_of_slot(slot),
            NodeRef::None => 0,
        }
    }

    /// Returns the string depth of `node`. Leaves reach the end of the active part.
    #[inline]
    pub(crate) fn depth(&self, node: NodeRef) -> u64 {
        match node {
            NodeRef::Branch(index) => u64::from(self.nodes.branches[index].depth),
            NodeRef::Leaf(slot) => self.window.end - self.window.position_of_slot(slot),
            NodeRef::None => 0,
        }
    }

    /// Returns the first letter of the edge from `source` to `target`.
    #[inline]
    pub(crate) fn letter(&self, source: BranchIndex, target: NodeRef) -> C {
        let depth = u64::from(self.nodes.branches[source].depth);
        self.window.symbol(self.head(target) + depth)
    }

    #[inline]
    pub(crate) fn letter_code(&self, source: BranchIndex, target: NodeRef) -> u32 {
        self.letter(source, target).code()
    }
}

/// The children of every branching node, keyed by first letter.
pub(crate) trait Children<C: Symbol>: Sized {
    fn new(config: &SlidingConfig) -> Result<Self>;

    /// Returns the child of `node` whose edge starts with `letter`, or [`NodeRef::None`].
    fn find(&self, labels: Labels<'_, C>, node: BranchIndex, letter: C) -> NodeRef;

    fn insert(&mut self, labels: Labels<'_, C>, node: BranchIndex, letter: C, child: NodeRef)
    -> Result<()>;

    /// Swaps `old` for `new`, which must start with the same letter.
    fn replace(
        &mut self,
        labels: Labels<'_, C>,
        node: BranchIndex,
        letter: C,
        old: NodeRef,
        new: NodeRef,
    ) -> Result<()>;

    fn remove(&mut self, labels: Labels<'_, C>, node: BranchIndex, letter: C, child: NodeRef)
    -> Result<()>;

    fn has_single_child(&self, node: BranchIndex) -> bool;

    /// Returns the one remaining child of `node`.
    fn only_child(&self, labels: Labels<'_, C>, node: BranchIndex) -> NodeRef;

    fn first_child(&self, labels: Labels<'_, C>, node: BranchIndex) -> NodeRef;

    fn next_sibling(&self, labels: Labels<'_, C>, parent: BranchIndex, child: NodeRef) -> NodeRef;

    /// Drops whatever is kept for a branching node that was freed.
    fn forget(&mut self, node: BranchIndex);

    fn edge_stats(&self) -> EdgeMapStats {
        EdgeMapStats::default()
    }
}
