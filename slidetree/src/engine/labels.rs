// Copyright 2024 Logan Magee
//
// SPDX-License-Identifier: LicenseRef-Proprietary

//! Edge-label maintenance.
//!
//! Edge labels are read through the head positions of branching nodes, which go stale as the
//! window moves. Heads only ever move forward, to the start of a newer occurrence of the same path
//! label, so the blocks behind the oldest head can be handed back to the reader.

use log::debug;
use suftree::{BranchIndex, ROOT_INDEX, Symbol};

use super::Engine;
use crate::{ElmMethod, tree::Children};

impl<C: Symbol, K: Children<C>> Engine<C, K> {
    /// Sends a credit for an occurrence at `position` to `node`.
    ///
    /// A node without credit keeps it. A node that already has one passes its newest head on to its
    /// parent, so every node hears from at least every second new occurrence beneath it.
    pub(super) fn send_credit(&mut self, mut node: BranchIndex, mut position: u64) {
        if self.config.elm_method != ElmMethod::Credit {
            return;
        }

        self.stats.credits_sent += 1;
        while node != ROOT_INDEX {
            let branch = &mut self.nodes.branches[node];
            branch.head = branch.head.max(position);
            if !branch.credit {
                branch.credit = true;
                return;
            }

            branch.credit = false;
            position = branch.head;
            node = branch.parent;
        }
    }

    /// Moves the head of every branching node to the newest leaf beneath it.
    ///
    /// Leaves are visited newest first and each walk toward the root stops at the first node an
    /// earlier walk already reached, which has the newest head possible.
    pub(crate) fn batch_update(&mut self) {
        self.visited.fill(false);

        let mut updated = 0usize;
        for position in (self.window.begin..self.front).rev() {
            let mut node = self.nodes.leaf_parents[self.window.slot_of(position) as usize];
            while node != 0 && node != ROOT_INDEX && !self.visited[node as usize] {
                self.visited[node as usize] = true;
                let branch = &mut self.nodes.branches[node];
                branch.head = branch.head.max(position);
                node = branch.parent;
                updated += 1;
            }
        }

        self.window.record_batch_update();
        self.stats.batch_passes += 1;
        debug!(
            "batch update at {} visited {updated} branching nodes",
            self.window.begin
        );
    }
}

#[cfg(test)]
mod tests {
    use suftree::traversal;

    use super::*;
    use crate::{
        SlidingConfig,
        tree::{Shti, Slli},
        window::SliceSource,
    };

    fn heads<C: Symbol, K: Children<C>>(engine: &Engine<C, K>) -> Vec<u64> {
        (0..engine.nodes.branches.len() as u32)
            .map(|index| engine.nodes.branches[index].head)
            .collect()
    }

    fn run<K: Children<u8>>(text: &[u8], method: ElmMethod) -> Engine<u8, K> {
        let mut config = SlidingConfig::new();
        config.block_size(4).ap_scale_factor(2).elm_method(method);
        let config = config.validated().unwrap();
        let mut engine =
            Engine::<u8, K>::new(config, Box::new(SliceSource::new(text.to_vec()))).unwrap();

        for _ in 0..text.len() {
            engine.step().unwrap();
            traversal::validate(&engine).unwrap();
        }

        engine
    }

    #[test]
    fn batch_update_is_idempotent() {
        let text = b"abracadabra abracadabra cadabra";
        let mut engine = run::<Slli>(text, ElmMethod::Batch);

        engine.batch_update();
        let once = heads(&engine);
        engine.batch_update();

        assert_eq!(heads(&engine), once);
        assert_eq!(engine.window.last_batch_begin(), engine.window.begin);
    }

    #[test]
    fn batch_update_reaches_the_newest_leaf() {
        let mut engine = run::<Shti>(b"xyzxyzxyzxyzxyz", ElmMethod::Batch);
        engine.batch_update();

        for index in 0..engine.nodes.branches.len() as u32 {
            let branch = engine.nodes.branches[index];
            if index == ROOT_INDEX || branch.depth == 0 {
                continue;
            }
            assert!(
                engine.window.validate_offset(branch.head),
                "head {} of branch {index} is stale",
                branch.head,
            );
        }
    }

    #[test]
    fn credits_are_passed_upward_in_pairs() {
        let mut engine = run::<Slli>(b"aaaaaaaa", ElmMethod::Credit);
        let inner = engine
            .nodes
            .branches
            .allocate(Default::default())
            .unwrap();
        engine.nodes.branches[inner].parent = ROOT_INDEX;
        let leaf_parent = engine
            .nodes
            .branches
            .allocate(Default::default())
            .unwrap();
        engine.nodes.branches[leaf_parent].parent = inner;

        engine.send_credit(leaf_parent, 10);
        assert!(engine.nodes.branches[leaf_parent].credit);
        assert!(!engine.nodes.branches[inner].credit);
        assert_eq!(engine.nodes.branches[leaf_parent].head, 10);

        engine.send_credit(leaf_parent, 12);
        assert!(!engine.nodes.branches[leaf_parent].credit);
        assert!(engine.nodes.branches[inner].credit);
        assert_eq!(engine.nodes.branches[leaf_parent].head, 12);
        assert_eq!(engine.nodes.branches[inner].head, 12);

        engine.send_credit(leaf_parent, 11);
        assert_eq!(engine.nodes.branches[leaf_parent].head, 12);
    }
}
