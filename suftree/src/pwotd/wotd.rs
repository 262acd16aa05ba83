// Copyright 2024 Logan Magee
//
// SPDX-License-Identifier: LicenseRef-Proprietary

use core::ops::Range;

use super::{
    StaticBranch, StaticLeaf, StaticSuffixTree,
    partition::{self, Partition, Text},
};
use crate::{
    BranchIndex, NodeRef, ROOT_INDEX, Symbol,
    error::{Result, Violation},
};

/// A node whose children are still to be written.
enum Work {
    /// The node spans whole partitions, which are grouped by the symbol at `depth`.
    Partitions {
        node: BranchIndex,
        range: Range<usize>,
        depth: usize,
    },
    /// The node spans a run of the suffix table, which is sorted by the symbol at `depth`.
    Suffixes {
        node: BranchIndex,
        range: Range<usize>,
        depth: usize,
    },
}

/// Writes the nodes of a static suffix tree top-down, one node's children at a time.
pub(super) struct Emitter<'t, 'a, C> {
    tree: &'t mut StaticSuffixTree<'a, C>,
    text: Text<'a, C>,
    suffixes: &'t mut [u32],
    partitions: &'t [Partition],
    stack: Vec<Work>,
}

impl<'t, 'a, C: Symbol> Emitter<'t, 'a, C> {
    pub(super) fn new(
        tree: &'t mut StaticSuffixTree<'a, C>,
        text: Text<'a, C>,
        suffixes: &'t mut [u32],
        partitions: &'t [Partition],
    ) -> Self {
        let root = if partitions.is_empty() {
            Work::Suffixes {
                node: ROOT_INDEX,
                range: 0..suffixes.len(),
                depth: 0,
            }
        } else {
            Work::Partitions {
                node: ROOT_INDEX,
                range: 0..partitions.len(),
                depth: 0,
            }
        };

        Self {
            tree,
            text,
            suffixes,
            partitions,
            stack: vec![root],
        }
    }

    pub(super) fn run(mut self) -> Result<()> {
        while let Some(work) = self.stack.pop() {
            match work {
                Work::Partitions { node, range, depth } => {
                    self.expand_partitions(node, range, depth)?
                }
                Work::Suffixes { node, range, depth } => self.expand_suffixes(node, range, depth)?,
            }
        }

        Ok(())
    }

    fn expand_partitions(
        &mut self,
        node: BranchIndex,
        range: Range<usize>,
        depth: usize,
    ) -> Result<()> {
        let partitions = self.partitions;
        let text = self.text;

        let mut previous = NodeRef::None;
        let mut begin = range.start;
        while begin < range.end {
            let symbol = text.at(partitions[begin].text_offset, depth);
            let mut end = begin + 1;
            while end < range.end && text.at(partitions[end].text_offset, depth) == symbol {
                end += 1;
            }

            let child = if end - begin == 1 {
                let single = &partitions[begin];
                if single.range.len() == 1 {
                    self.leaf(node, single.text_offset)
                } else {
                    let child = self.branch(node, single.lcp, single.text_offset)?;
                    self.stack.push(Work::Suffixes {
                        node: child,
                        range: single.range.clone(),
                        depth: single.lcp,
                    });
                    NodeRef::Branch(child)
                }
            } else {
                // Sorted partitions share exactly the prefix their outermost members share
                let group = &partitions[begin..end];
                let child_depth = partition::pair_lcp(
                    text,
                    group[0].text_offset,
                    group[group.len() - 1].text_offset,
                    depth + 1,
                );
                let head = group
                    .iter()
                    .map(|p| p.text_offset)
                    .min()
                    .unwrap_or(group[0].text_offset);
                let child = self.branch(node, child_depth, head)?;
                self.stack.push(Work::Partitions {
                    node: child,
                    range: begin..end,
                    depth: child_depth,
                });
                NodeRef::Branch(child)
            };

            self.link(node, previous, child);
            previous = child;
            begin = end;
        }

        Ok(())
    }

    fn expand_suffixes(&mut self, node: BranchIndex, range: Range<usize>, depth: usize) -> Result<()> {
        let text = self.text;
        self.suffixes[range.clone()].sort_by_key(|&start| text.at(start, depth));

        let mut previous = NodeRef::None;
        let mut begin = range.start;
        while begin < range.end {
            let first = self.suffixes[begin];
            let symbol = text.at(first, depth);
            let mut end = begin + 1;
            while end < range.end && text.at(self.suffixes[end], depth) == symbol {
                end += 1;
            }

            let child = if end - begin == 1 {
                self.leaf(node, first)
            } else {
                if symbol.is_none() {
                    return Err(Violation::DuplicateSuffixLength.into());
                }
                let child_depth = partition::group_lcp(text, &self.suffixes[begin..end], depth + 1)?;
                let child = self.branch(node, child_depth, first)?;
                self.stack.push(Work::Suffixes {
                    node: child,
                    range: begin..end,
                    depth: child_depth,
                });
                NodeRef::Branch(child)
            };

            self.link(node, previous, child);
            previous = child;
            begin = end;
        }

        Ok(())
    }

    fn branch(&mut self, parent: BranchIndex, depth: usize, head: u32) -> Result<BranchIndex> {
        self.tree.branches.push(StaticBranch {
            parent,
            depth: depth as u32,
            head,
            first_child: NodeRef::None,
            next_sibling: NodeRef::None,
        })
    }

    fn leaf(&mut self, parent: BranchIndex, start: u32) -> NodeRef {
        self.tree.leaves[start as usize] = StaticLeaf {
            parent,
            next_sibling: NodeRef::None,
        };

        NodeRef::Leaf(start)
    }

    /// Appends `child` to the children of `parent`, after `previous`.
    fn link(&mut self, parent: BranchIndex, previous: NodeRef, child: NodeRef) {
        match previous {
            NodeRef::None => self.tree.branches[parent].first_child = child,
            NodeRef::Branch(index) => self.tree.branches[index].next_sibling = child,
            NodeRef::Leaf(start) => self.tree.leaves[start as usize].next_sibling = child,
        }
    }
}
