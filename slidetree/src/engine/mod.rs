// Copyright 2024 Logan Magee
//
// SPDX-License-Identifier: LicenseRef-Proprietary

//! Ukkonen's online construction over a sliding window.
//!
//! Positions are absolute stream positions starting at 1. The tree indexes the active part
//! `[begin, end)` of the window without a terminator, so suffixes that also occur earlier in the
//! active part end inside an edge instead of at a leaf. Those suffixes are `[front, end)` and
//! shorter: the active point is the locus of `[front, end)`, kept canonical as a branching node
//! plus the length of the remaining path below it.

mod labels;

use log::debug;
use suftree::{BranchIndex, NodeRef, ROOT_INDEX, Result, Symbol, TreeView, Violation};

use crate::{
    ElmMethod, SlidingConfig, Variation,
    tree::{Branch, Children, Labels, Nodes, branch_capacity, table},
    window::{BoxedSource, Window},
};

/// The phase a sliding-window construction is in.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Phase {
    /// The active part is still growing toward its maximum size
    #[default]
    Filling,
    /// Every step deletes the oldest suffix and then appends one symbol
    Steady,
    /// The input is exhausted and suffixes are deleted until none are left
    Draining,
    /// The active part is empty and nothing is left to read
    Finished,
}

/// Counters kept during a sliding-window construction.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Stats {
    /// Symbols appended to the active part
    pub prolong_steps: u64,
    /// Suffixes deleted from the active part
    pub delete_steps: u64,
    /// Deletions that shortened the oldest leaf edge instead of removing it
    pub shortened_edges: u64,
    /// Branching nodes removed after being left with a single child
    pub removed_unary_nodes: u64,
    /// Batch updates of edge labels
    pub batch_passes: u64,
    /// Credits sent to branching nodes
    pub credits_sent: u64,
    /// Rebuilds of the edge map
    pub rehashes: u64,
    /// The largest number of branching nodes alive at once, the root excluded
    pub peak_branches: usize,
}

macro_rules! labels_of {
    ($engine:expr) => {
        Labels {
            nodes: &$engine.nodes,
            window: &$engine.window,
        }
    };
}

pub(crate) struct Engine<C, K> {
    config: SlidingConfig,
    pub(crate) window: Window<C>,
    pub(crate) nodes: Nodes,
    pub(crate) children: K,
    /// The branching node the active point hangs below
    active_node: BranchIndex,
    /// Start of the longest suffix without a leaf of its own
    front: u64,
    /// A branching node waiting for its suffix link, or 0
    pending: BranchIndex,
    phase: Phase,
    stats: Stats,
    visited: Vec<bool>,
}

impl<C: Symbol, K: Children<C>> Engine<C, K> {
    pub(crate) fn new(config: SlidingConfig, source: BoxedSource<C>) -> Result<Self> {
        let window = Window::new(&config, source)?;
        let nodes = Nodes::new(config.window_size(), config.active_size())?;
        let children = K::new(&config)?;
        let visited = table("visited", branch_capacity(config.active_size()), false)?;

        Ok(Self {
            config,
            window,
            nodes,
            children,
            active_node: ROOT_INDEX,
            front: 1,
            pending: 0,
            phase: Phase::Filling,
            stats: Stats::default(),
            visited,
        })
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn stats(&self) -> Stats {
        Stats {
            rehashes: self.children.edge_stats().rehashes,
            ..self.stats
        }
    }

    /// Performs one step of the current phase. Returns `false` once the window is empty and the
    /// input exhausted.
    ///
    /// A failed step stops the reader before the error is returned.
    pub(crate) fn step(&mut self) -> Result<bool> {
        let result = self.try_step();
        if result.is_err() {
            self.window.cancel_reader();
        }

        result
    }

    fn try_step(&mut self) -> Result<bool> {
        if self.window.needs_read() {
            if self.window.refill_blocked() && self.config.elm_method == ElmMethod::Batch {
                self.batch_update();
            }
            self.window.retire(self.oldest_referenced());
            self.window.read_blocks(1)?;
        }

        let len = self.window.end - self.window.begin;
        if self.window.end < self.window.read_end() {
            if len as usize == self.config.active_size() {
                self.delete_longest()?;
            }
            self.prolong()?;
        } else if len > 0 {
            self.delete_longest()?;
        } else {
            self.enter(Phase::Finished);
            return Ok(false);
        }

        if self.config.elm_method == ElmMethod::Batch
            && self.window.begin - self.window.last_batch_begin() >= self.config.active_size() as u64
        {
            self.batch_update();
        }

        let len = self.window.end - self.window.begin;
        let phase = if self.window.is_eof() && self.window.end == self.window.read_end() {
            Phase::Draining
        } else if len as usize == self.config.active_size() {
            Phase::Steady
        } else {
            Phase::Filling
        };
        self.enter(phase);

        Ok(true)
    }

    fn enter(&mut self, phase: Phase) {
        if phase != self.phase {
            debug!(
                "{:?} -> {phase:?} with active part {:?}",
                self.phase,
                self.window.active_range(),
            );
            self.phase = phase;
        }
    }

    /// Returns the oldest position an edge label may still refer to.
    fn oldest_referenced(&self) -> u64 {
        match self.config.elm_method {
            ElmMethod::Batch => self.window.last_batch_begin(),
            _ => self
                .window
                .begin
                .saturating_sub(self.config.block_size as u64)
                .max(1),
        }
    }

    #[inline]
    fn depth_of(&self, node: BranchIndex) -> u64 {
        u64::from(self.nodes.branches[node].depth)
    }

    /// Appends the symbol at `end` to every suffix of the active part.
    fn prolong(&mut self) -> Result<()> {
        let end = self.window.end;
        let symbol = self.window.symbol(end);

        loop {
            let active = self.active_node;
            let depth = self.depth_of(active);
            let remaining = end - self.front - depth;

            if remaining == 0 {
                if self.pending != 0 {
                    self.nodes.branches[self.pending].suffix_link = active;
                    self.pending = 0;
                }
                if self
                    .children
                    .find(labels_of!(self), active, symbol)
                    .is_some()
                {
                    break;
                }

                let leaf = NodeRef::Leaf(self.window.slot_of(self.front));
                self.nodes.set_parent(leaf, active);
                self.children.insert(labels_of!(self), active, symbol, leaf)?;
                self.send_credit(active, self.front);

                if self.front == end {
                    self.front += 1;
                    break;
                }
                self.advance_front(NodeRef::None)?;
            } else {
                let letter = self.window.symbol(self.front + depth);
                let edge = self.children.find(labels_of!(self), active, letter);
                if edge.is_none() {
                    return Err(Violation::UnknownNode(NodeRef::Branch(active)).into());
                }

                let split_at = labels_of!(self).head(edge) + depth + remaining;
                let next = self.window.symbol(split_at);
                if next == symbol {
                    if self.pending != 0 {
                        return Err(Violation::PendingSuffixLink.into());
                    }
                    break;
                }

                let inner = self.nodes.branches.allocate(Branch {
                    parent: active,
                    depth: (depth + remaining) as u32,
                    head: self.front,
                    suffix_link: 0,
                    credit: false,
                })?;
                self.stats.peak_branches = self.stats.peak_branches.max(self.nodes.branches.live());

                self.children
                    .replace(labels_of!(self), active, letter, edge, NodeRef::Branch(inner))?;
                self.nodes.set_parent(edge, inner);
                self.children.insert(labels_of!(self), inner, next, edge)?;

                let leaf = NodeRef::Leaf(self.window.slot_of(self.front));
                self.nodes.set_parent(leaf, inner);
                self.children.insert(labels_of!(self), inner, symbol, leaf)?;

                if self.pending != 0 {
                    self.nodes.branches[self.pending].suffix_link = inner;
                }
                self.pending = inner;
                self.send_credit(inner, self.front);
                self.advance_front(edge)?;
            }
        }

        self.window.end += 1;
        self.canonize();
        self.stats.prolong_steps += 1;

        Ok(())
    }

    /// Moves the active point from `[front, end)` to `[front + 1, end)`.
    ///
    /// `below` is a node under the old active point. The bottom-up variation climbs from the
    /// suffix of `below` instead of following the suffix link of the active node and descending.
    fn advance_front(&mut self, below: NodeRef) -> Result<()> {
        self.front += 1;

        if self.active_node != ROOT_INDEX {
            let target = self.window.end - self.front;
            let start = match (self.config.variation, below) {
                (Variation::BottomUp, NodeRef::Branch(node)) => {
                    self.nodes.branches[node].suffix_link
                }
                // The suffix of a leaf is the leaf of the next position, if it has one
                (Variation::BottomUp, NodeRef::Leaf(slot)) => {
                    let position = self.window.position_of_slot(slot) + 1;
                    if position < self.front {
                        self.nodes.leaf_parents[self.window.slot_of(position) as usize]
                    } else {
                        0
                    }
                }
                _ => 0,
            };

            if start == 0 {
                let link = self.nodes.branches[self.active_node].suffix_link;
                if link == 0 {
                    return Err(Violation::NotABranch(NodeRef::None).into());
                }
                self.active_node = link;
            } else {
                let mut node = start;
                while self.depth_of(node) > target {
                    node = self.nodes.branches[node].parent;
                }
                self.active_node = node;
            }
        }

        self.canonize();

        Ok(())
    }

    /// Descends from the active node while the active point lies at or below a child branch.
    fn canonize(&mut self) {
        loop {
            let depth = self.depth_of(self.active_node);
            let remaining = self.window.end - self.front - depth;
            if remaining == 0 {
                return;
            }

            let letter = self.window.symbol(self.front + depth);
            match self.children.find(labels_of!(self), self.active_node, letter) {
                NodeRef::Branch(child) if self.depth_of(child) - depth <= remaining => {
                    self.active_node = child;
                }
                _ => return,
            }
        }
    }

    /// Removes the suffix starting at `begin` from the tree.
    fn delete_longest(&mut self) -> Result<()> {
        let begin = self.window.begin;
        let slot = self.window.slot_of(begin);
        let leaf = NodeRef::Leaf(slot);

        let parent = self.nodes.leaf_parents[slot as usize];
        if parent == 0 {
            return Err(Violation::MissingDeepestLeaf(begin).into());
        }
        let depth = self.depth_of(parent);
        let letter = self.window.symbol(begin + depth);
        if self.children.find(labels_of!(self), parent, letter) != leaf {
            return Err(Violation::MissingDeepestLeaf(begin).into());
        }

        let remaining = self.window.end - self.front - self.depth_of(self.active_node);
        if self.active_node == parent
            && remaining > 0
            && self.window.symbol(self.front + depth) == letter
        {
            // The active point lies on the edge to the oldest leaf, which would take the active
            // suffix with it. The leaf becomes the leaf of the active suffix instead.
            let shortened = NodeRef::Leaf(self.window.slot_of(self.front));
            self.children
                .replace(labels_of!(self), parent, letter, leaf, shortened)?;
            self.nodes.leaf_parents[slot as usize] = 0;
            self.nodes.set_parent(shortened, parent);
            self.send_credit(parent, self.front);
            self.stats.shortened_edges += 1;
            self.advance_front(shortened)?;
        } else {
            self.children.remove(labels_of!(self), parent, letter, leaf)?;
            self.nodes.leaf_parents[slot as usize] = 0;
            if parent != ROOT_INDEX && self.children.has_single_child(parent) {
                self.remove_unary(parent, begin)?;
            }
        }

        self.window.begin += 1;
        self.stats.delete_steps += 1;

        Ok(())
    }

    /// Splices out `node`, which has a single child left, attaching that child to the parent of
    /// `node`. `position` is an occurrence of the path label of `node`.
    fn remove_unary(&mut self, node: BranchIndex, position: u64) -> Result<()> {
        let child = self.children.only_child(labels_of!(self), node);
        if child.is_none() {
            return Err(Violation::UnknownNode(NodeRef::Branch(node)).into());
        }
        let child_letter = labels_of!(self).letter(node, child);
        self.children
            .remove(labels_of!(self), node, child_letter, child)?;

        let Branch {
            parent,
            head,
            credit,
            ..
        } = self.nodes.branches[node];
        let letter = self.window.symbol(position + self.depth_of(parent));
        self.children
            .replace(labels_of!(self), parent, letter, NodeRef::Branch(node), child)?;
        self.nodes.set_parent(child, parent);

        if credit {
            let newest = head.max(labels_of!(self).head(child));
            self.send_credit(parent, newest);
        }
        if self.active_node == node {
            self.active_node = parent;
        }

        self.children.forget(node);
        self.nodes.branches[node] = Branch::default();
        self.nodes.branches.deallocate(node);
        self.stats.removed_unary_nodes += 1;

        Ok(())
    }
}

impl<C: Symbol, K: Children<C>> TreeView for Engine<C, K> {
    fn first_child(&self, node: NodeRef) -> NodeRef {
        match node {
            NodeRef::Branch(index) => self.children.first_child(labels_of!(self), index),
            _ => NodeRef::None,
        }
    }

    fn next_sibling(&self, node: NodeRef) -> NodeRef {
        match self.nodes.parent(node) {
            0 => NodeRef::None,
            parent => self.children.next_sibling(labels_of!(self), parent, node),
        }
    }

    fn parent(&self, node: NodeRef) -> NodeRef {
        match self.nodes.parent(node) {
            0 => NodeRef::None,
            parent => NodeRef::Branch(parent),
        }
    }

    fn depth(&self, node: NodeRef) -> usize {
        labels_of!(self).depth(node) as usize
    }

    fn suffix_link(&self, node: NodeRef) -> NodeRef {
        match node {
            NodeRef::Branch(index) if index != ROOT_INDEX => {
                match self.nodes.branches[index].suffix_link {
                    0 => NodeRef::None,
                    link => NodeRef::Branch(link),
                }
            }
            _ => NodeRef::None,
        }
    }

    fn edge_label_bounds(&self, parent: NodeRef, child: NodeRef) -> (usize, usize) {
        let labels = labels_of!(self);
        let parent_depth = labels.depth(parent);

        (
            (labels.head(child) + parent_depth) as usize,
            (labels.depth(child) - parent_depth) as usize,
        )
    }

    fn leaf_to_suffix_start(&self, leaf: NodeRef) -> usize {
        labels_of!(self).head(leaf) as usize
    }

    fn label_symbol(&self, offset: usize, index: usize) -> Option<u32> {
        let position = (offset + index) as u64;
        (position < self.window.end).then(|| self.window.symbol(position).code())
    }
}
