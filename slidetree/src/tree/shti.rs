// Copyright 2024 Logan Magee
//
// SPDX-License-Identifier: LicenseRef-Proprietary

use suftree::{BranchIndex, NodeRef, Result, Symbol};

use super::{Children, Labels, branch_capacity, table};
use crate::{
    SlidingConfig,
    edgemap::{EdgeMap, EdgeMapStats},
};

/// Children as entries of one hash table keyed by parent and first letter.
///
/// Each branching node also keeps its child count and the XOR of the first letters of its
/// children, which is the letter of the last child once only one is left. The table has no notion
/// of sibling order, so nodes with two or more children enumerate them in table order by scanning
/// it. That is only done for traversal, never during construction.
pub(crate) struct Shti {
    map: EdgeMap,
    counts: Vec<u32>,
    letters: Vec<u32>,
}

impl Shti {
    fn add(&mut self, node: BranchIndex, letter: u32) {
        self.counts[node as usize] += 1;
        self.letters[node as usize] ^= letter;
    }

    fn subtract(&mut self, node: BranchIndex, letter: u32) {
        self.counts[node as usize] -= 1;
        self.letters[node as usize] ^= letter;
    }

    fn count(&self, node: BranchIndex) -> u32 {
        self.counts[node as usize]
    }
}

impl<C: Symbol> Children<C> for Shti {
    fn new(config: &SlidingConfig) -> Result<Self> {
        let branches = branch_capacity(config.active_size());

        Ok(Self {
            map: EdgeMap::new(
                config.initial_hash_capacity,
                config.collision_resolution,
                config.cuckoo_hash_functions,
                config.allow_rehash,
                Default::default(),
            ),
            counts: table("child count", branches, 0)?,
            letters: table("child letters", branches, 0)?,
        })
    }

    fn find(&self, labels: Labels<'_, C>, node: BranchIndex, letter: C) -> NodeRef {
        self.map
            .find(node, letter.code(), &|s, t| labels.letter_code(s, t))
    }

    fn insert(
        &mut self,
        labels: Labels<'_, C>,
        node: BranchIndex,
        letter: C,
        child: NodeRef,
    ) -> Result<()> {
        self.map
            .insert(node, letter.code(), child, &|s, t| labels.letter_code(s, t))?;
        self.add(node, letter.code());

        Ok(())
    }

    fn replace(
        &mut self,
        labels: Labels<'_, C>,
        node: BranchIndex,
        letter: C,
        _old: NodeRef,
        new: NodeRef,
    ) -> Result<()> {
        self.map
            .replace(node, letter.code(), new, &|s, t| labels.letter_code(s, t))
    }

    fn remove(
        &mut self,
        labels: Labels<'_, C>,
        node: BranchIndex,
        letter: C,
        _child: NodeRef,
    ) -> Result<()> {
        self.map
            .remove(node, letter.code(), &|s, t| labels.letter_code(s, t))?;
        self.subtract(node, letter.code());

        Ok(())
    }

    fn has_single_child(&self, node: BranchIndex) -> bool {
        self.count(node) == 1
    }

    fn only_child(&self, labels: Labels<'_, C>, node: BranchIndex) -> NodeRef {
        if self.count(node) != 1 {
            return NodeRef::None;
        }

        self.map.find(node, self.letters[node as usize], &|s, t| {
            labels.letter_code(s, t)
        })
    }

    fn first_child(&self, labels: Labels<'_, C>, node: BranchIndex) -> NodeRef {
        match self.count(node) {
            0 => NodeRef::None,
            1 => Children::<C>::only_child(self, labels, node),
            _ => self
                .map
                .scan(node, 0)
                .map_or(NodeRef::None, |(_, target)| target),
        }
    }

    fn next_sibling(&self, labels: Labels<'_, C>, parent: BranchIndex, child: NodeRef) -> NodeRef {
        if self.count(parent) <= 1 {
            return NodeRef::None;
        }

        self.map
            .next_after(parent, child, &|s, t| labels.letter_code(s, t))
    }

    fn forget(&mut self, node: BranchIndex) {
        self.counts[node as usize] = 0;
        self.letters[node as usize] = 0;
    }

    fn edge_stats(&self) -> EdgeMapStats {
        self.map.stats()
    }
}
