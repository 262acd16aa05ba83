// Copyright 2024 Logan Magee
//
// SPDX-License-Identifier: LicenseRef-Proprietary

use crate::NodeRef;

/// Read-only access to the shape of a suffix tree.
///
/// Edge labels are never materialized. A label is addressed by an offset into the underlying
/// text (a text position for static trees, a window offset for sliding-window trees) and a
/// length, and its symbols are read back through [`TreeView::label_symbol`].
pub trait TreeView {
    /// Returns the root.
    fn root(&self) -> NodeRef {
        NodeRef::ROOT
    }

    /// Returns the first child of `node`, or [`NodeRef::None`] for leaves.
    fn first_child(&self, node: NodeRef) -> NodeRef;

    /// Returns the next sibling of `node`, or [`NodeRef::None`] after the last child.
    fn next_sibling(&self, node: NodeRef) -> NodeRef;

    /// Returns the parent of `node`, or [`NodeRef::None`] for the root.
    fn parent(&self, node: NodeRef) -> NodeRef;

    /// Returns the string depth of `node`.
    fn depth(&self, node: NodeRef) -> usize;

    /// Returns the suffix link of a non-root branching node, or [`NodeRef::None`].
    fn suffix_link(&self, node: NodeRef) -> NodeRef;

    /// Returns the offset and length of the label on the edge from `parent` to `child`.
    fn edge_label_bounds(&self, parent: NodeRef, child: NodeRef) -> (usize, usize);

    /// Returns the offset at which the suffix of `leaf` starts.
    fn leaf_to_suffix_start(&self, leaf: NodeRef) -> usize;

    /// Returns the symbol `index` places after `offset`, or `None` for the terminator.
    fn label_symbol(&self, offset: usize, index: usize) -> Option<u32>;
}
