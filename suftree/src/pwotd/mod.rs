// Copyright 2024 Logan Magee
//
// SPDX-License-Identifier: LicenseRef-Proprietary

//! Static suffix tree construction by partitioning and writing only top-down.
//!
//! All suffixes of the text are first grouped by a short common prefix with a byte-wise radix
//! sort. Every group is then refined top-down: a group of one suffix becomes a leaf, a larger
//! group becomes a branching node whose children are the subgroups sharing the next symbol. Nodes
//! are appended to the arena in the order they are discovered and are never rewritten, except to
//! patch in the first child of a node once that child exists.

mod partition;
mod wotd;

use log::{debug, warn};

use crate::{
    Arena, BranchIndex, NodeRef, ROOT_INDEX, Symbol, TreeView,
    error::{Error, Result, Violation},
};
use partition::Text;

pub use partition::auto_prefix_length as default_prefix_length;

/// A branching node of a static suffix tree.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct StaticBranch {
    pub(crate) parent: BranchIndex,
    pub(crate) depth: u32,
    /// Start of the longest suffix below this node
    pub(crate) head: u32,
    pub(crate) first_child: NodeRef,
    pub(crate) next_sibling: NodeRef,
}

/// The parent and sibling links of a leaf. Leaves are indexed by suffix start.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct StaticLeaf {
    pub(crate) parent: BranchIndex,
    pub(crate) next_sibling: NodeRef,
}

/// A suffix tree over a complete, fixed text.
///
/// Text positions are 1-based and position `len + 1` holds an implicit terminator, so a text of
/// length `n` has exactly `n + 1` leaves. Leaves are [`NodeRef::Leaf`] values carrying the text
/// position at which their suffix starts. Children are ordered by their first symbol, with the
/// terminator first.
///
/// # Examples
///
/// ```
/// use suftree::{NodeRef, TreeView, build_pwotd, traversal};
///
/// # fn main() -> suftree::Result<()> {
/// let tree = build_pwotd(None, b"banana")?;
///
/// assert_eq!(tree.leaf_count(), 7);
/// let root_children: Vec<_> = traversal::children(&tree, NodeRef::ROOT).collect();
/// // $, a, banana$, na
/// assert_eq!(root_children.len(), 4);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct StaticSuffixTree<'a, C> {
    text: &'a [C],
    branches: Arena<StaticBranch>,
    leaves: Vec<StaticLeaf>,
    prefix_length: usize,
    partitions: usize,
}

/// Builds the suffix tree of `text` with the partition-and-write-only-top-down algorithm.
///
/// `prefix_length` pins the length of the prefix used to partition the suffixes. `None` derives
/// it from the text length; small texts form one single partition. A prefix longer than the text
/// is clamped to the text length.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] if `prefix_length` is `Some(0)` or the text does not fit
/// 32-bit positions, and [`Error::Allocation`] if the node arena cannot grow.
pub fn build_pwotd<C: Symbol>(
    prefix_length: Option<usize>,
    text: &[C],
) -> Result<StaticSuffixTree<'_, C>> {
    if text.len() >= (u32::MAX - 2) as usize {
        return Err(Error::InvalidParameter(format!(
            "text of {} symbols does not fit 32-bit positions",
            text.len()
        )));
    }

    let prefix_length = match prefix_length {
        Some(0) => {
            return Err(Error::InvalidParameter(
                "prefix length must be at least 1".into(),
            ));
        }
        Some(length) if length > text.len() => {
            warn!(
                "prefix length {length} exceeds the longest suffix, clamping to {}",
                text.len()
            );
            text.len()
        }
        Some(length) => length,
        None => partition::auto_prefix_length(text.len()),
    };

    let mut tree = StaticSuffixTree {
        text,
        // One branch per suffix is a safe upper bound, plus the unused index and the root
        branches: Arena::with_reserved("static branch", ROOT_INDEX as usize, text.len() + 3),
        leaves: vec![StaticLeaf::default(); text.len() + 2],
        prefix_length,
        partitions: 0,
    };
    tree.branches.push(StaticBranch {
        head: 1,
        ..StaticBranch::default()
    })?;

    let text = Text::new(text);
    let mut suffixes: Vec<u32> = (1..=text.len() as u32 + 1).collect();
    let mut scratch = Vec::new();
    partition::order_suffixes(text, &mut suffixes, &mut scratch, prefix_length);
    let partitions = if prefix_length == 0 {
        Vec::new()
    } else {
        partition::partition(text, &suffixes, prefix_length)?
    };
    tree.partitions = partitions.len().max(1);
    debug!(
        "partitioned {} suffixes into {} groups with prefix length {prefix_length}",
        suffixes.len(),
        tree.partitions,
    );

    wotd::Emitter::new(&mut tree, text, &mut suffixes, &partitions).run()?;

    Ok(tree)
}

impl<'a, C: Symbol> StaticSuffixTree<'a, C> {
    /// Returns the indexed text, without its terminator.
    pub fn text(&self) -> &'a [C] {
        self.text
    }

    /// Returns the number of leaves, one per suffix including the empty one.
    pub fn leaf_count(&self) -> usize {
        self.text.len() + 1
    }

    /// Returns the number of branching nodes, the root included.
    pub fn branch_count(&self) -> usize {
        self.branches.live()
    }

    /// Returns the prefix length the suffixes were partitioned by.
    pub fn prefix_length(&self) -> usize {
        self.prefix_length
    }

    /// Returns the number of partitions construction started from.
    pub fn partition_count(&self) -> usize {
        self.partitions
    }

    fn symbol(&self, position: usize) -> Option<C> {
        position
            .checked_sub(1)
            .and_then(|index| self.text.get(index))
            .copied()
    }

    /// Returns the text position at which the label of the edge into `node` starts, measured from
    /// its parent's depth.
    fn head(&self, node: NodeRef) -> usize {
        match node {
            NodeRef::Branch(index) => self.branches[index].head as usize,
            NodeRef::Leaf(start) => start as usize,
            NodeRef::None => 0,
        }
    }

    fn child_starting_with(&self, node: NodeRef, symbol: Option<C>) -> NodeRef {
        let depth = self.depth(node);
        let mut child = self.first_child(node);
        while child.is_some() && self.symbol(self.head(child) + depth) != symbol {
            child = self.next_sibling(child);
        }

        child
    }

    /// Finds the branching node spelling out `len` symbols of the text starting at `start`.
    fn locate(&self, start: usize, len: usize) -> Result<NodeRef> {
        let mut node = NodeRef::ROOT;
        let mut depth = 0;
        while depth < len {
            let child = self.child_starting_with(node, self.symbol(start + depth));
            if child.is_leaf() || child.is_none() || self.depth(child) > len {
                return Err(Violation::NotABranch(child).into());
            }
            node = child;
            depth = self.depth(child);
        }

        Ok(node)
    }
}

impl<C: Symbol> TreeView for StaticSuffixTree<'_, C> {
    fn first_child(&self, node: NodeRef) -> NodeRef {
        match node {
            NodeRef::Branch(index) => self.branches[index].first_child,
            _ => NodeRef::None,
        }
    }

    fn next_sibling(&self, node: NodeRef) -> NodeRef {
        match node {
            NodeRef::Branch(index) => self.branches[index].next_sibling,
            NodeRef::Leaf(start) => self.leaves[start as usize].next_sibling,
            NodeRef::None => NodeRef::None,
        }
    }

    fn parent(&self, node: NodeRef) -> NodeRef {
        let parent = match node {
            NodeRef::Branch(index) => self.branches[index].parent,
            NodeRef::Leaf(start) => self.leaves[start as usize].parent,
            NodeRef::None => 0,
        };
        if parent == 0 {
            NodeRef::None
        } else {
            NodeRef::Branch(parent)
        }
    }

    fn depth(&self, node: NodeRef) -> usize {
        match node {
            NodeRef::Branch(index) => self.branches[index].depth as usize,
            NodeRef::Leaf(start) => self.text.len() + 2 - start as usize,
            NodeRef::None => 0,
        }
    }

    /// Suffix links are not stored; they are found by descending from the root, skipping over
    /// whole edges.
    fn suffix_link(&self, node: NodeRef) -> NodeRef {
        match node {
            NodeRef::Branch(index) if index != ROOT_INDEX => {
                let branch = &self.branches[index];
                self.locate(branch.head as usize + 1, branch.depth as usize - 1)
                    .unwrap_or(NodeRef::None)
            }
            _ => NodeRef::None,
        }
    }

    fn edge_label_bounds(&self, parent: NodeRef, child: NodeRef) -> (usize, usize) {
        let parent_depth = self.depth(parent);

        (
            self.head(child) + parent_depth,
            self.depth(child) - parent_depth,
        )
    }

    fn leaf_to_suffix_start(&self, leaf: NodeRef) -> usize {
        leaf.leaf().unwrap_or(0) as usize
    }

    fn label_symbol(&self, offset: usize, index: usize) -> Option<u32> {
        self.symbol(offset + index).map(Symbol::code)
    }
}
