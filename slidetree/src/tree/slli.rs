// Copyright 2024 Logan Magee
//
// SPDX-License-Identifier: LicenseRef-Proprietary

use suftree::{BranchIndex, NodeRef, Result, Symbol, Violation};

use super::{Children, Labels, branch_capacity, table};
use crate::SlidingConfig;

/// Children as unordered, intrusive singly linked lists of siblings.
pub(crate) struct Slli {
    first: Vec<NodeRef>,
    branch_next: Vec<NodeRef>,
    leaf_next: Vec<NodeRef>,
}

impl Slli {
    #[inline]
    fn next(&self, node: NodeRef) -> NodeRef {
        match node {
            NodeRef::Branch(index) => self.branch_next[index as usize],
            NodeRef::Leaf(slot) => self.leaf_next[slot as usize],
            NodeRef::None => NodeRef::None,
        }
    }

    #[inline]
    fn set_next(&mut self, node: NodeRef, next: NodeRef) {
        match node {
            NodeRef::Branch(index) => self.branch_next[index as usize] = next,
            NodeRef::Leaf(slot) => self.leaf_next[slot as usize] = next,
            NodeRef::None => {}
        }
    }

    #[inline]
    fn head(&self, node: BranchIndex) -> NodeRef {
        self.first[node as usize]
    }

    fn set_head(&mut self, node: BranchIndex, child: NodeRef) {
        self.first[node as usize] = child;
    }

    /// Points whatever precedes `old` in the list of `node` at `new`.
    fn relink(&mut self, node: BranchIndex, old: NodeRef, new: NodeRef) -> Result<()> {
        if self.head(node) == old {
            self.set_head(node, new);
            return Ok(());
        }

        let mut previous = self.head(node);
        while previous.is_some() {
            let next = self.next(previous);
            if next == old {
                self.set_next(previous, new);
                return Ok(());
            }
            previous = next;
        }

        Err(Violation::UnknownNode(old).into())
    }
}

impl<C: Symbol> Children<C> for Slli {
    fn new(config: &SlidingConfig) -> Result<Self> {
        let branches = branch_capacity(config.active_size());

        Ok(Self {
            first: table("first child", branches, NodeRef::None)?,
            branch_next: table("branch sibling", branches, NodeRef::None)?,
            leaf_next: table("leaf sibling", config.window_size(), NodeRef::None)?,
        })
    }

    fn find(&self, labels: Labels<'_, C>, node: BranchIndex, letter: C) -> NodeRef {
        let mut child = self.head(node);
        while child.is_some() && labels.letter(node, child) != letter {
            child = self.next(child);
        }

        child
    }

    fn insert(
        &mut self,
        _labels: Labels<'_, C>,
        node: BranchIndex,
        _letter: C,
        child: NodeRef,
    ) -> Result<()> {
        let head = self.head(node);
        self.set_next(child, head);
        self.set_head(node, child);

        Ok(())
    }

    fn replace(
        &mut self,
        _labels: Labels<'_, C>,
        node: BranchIndex,
        _letter: C,
        old: NodeRef,
        new: NodeRef,
    ) -> Result<()> {
        self.relink(node, old, new)?;
        let next = self.next(old);
        self.set_next(new, next);
        self.set_next(old, NodeRef::None);

        Ok(())
    }

    fn remove(
        &mut self,
        _labels: Labels<'_, C>,
        node: BranchIndex,
        _letter: C,
        child: NodeRef,
    ) -> Result<()> {
        let next = self.next(child);
        self.relink(node, child, next)?;
        self.set_next(child, NodeRef::None);

        Ok(())
    }

    fn has_single_child(&self, node: BranchIndex) -> bool {
        let first = self.head(node);
        first.is_some() && self.next(first).is_none()
    }

    fn only_child(&self, _labels: Labels<'_, C>, node: BranchIndex) -> NodeRef {
        self.head(node)
    }

    fn first_child(&self, _labels: Labels<'_, C>, node: BranchIndex) -> NodeRef {
        self.head(node)
    }

    fn next_sibling(&self, _labels: Labels<'_, C>, _parent: BranchIndex, child: NodeRef) -> NodeRef {
        self.next(child)
    }

    fn forget(&mut self, node: BranchIndex) {
        self.set_head(node, NodeRef::None);
        self.set_next(NodeRef::Branch(node), NodeRef::None);
    }
}
