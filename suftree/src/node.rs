// Copyright 2024 Logan Magee
//
// SPDX-License-Identifier: LicenseRef-Proprietary

/// Arena index of a branching node. Index 0 is never handed out.
pub type BranchIndex = u32;

/// A reference to a node of an array-based suffix tree.
///
/// Branching nodes are addressed by their arena index, the root always being index
/// [`ROOT_INDEX`]. Leaves carry no record of their own beyond a parent pointer, so they are
/// addressed by the offset at which their suffix starts (a text position for static trees, a
/// window offset for sliding-window trees).
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Ord, PartialOrd)]
pub enum NodeRef {
    /// No node
    #[default]
    None,
    /// A branching node
    Branch(BranchIndex),
    /// A leaf, identified by the start of its suffix
    Leaf(u32),
}

/// The arena index of the root.
pub const ROOT_INDEX: BranchIndex = 1;

impl NodeRef {
    /// The root of every tree.
    pub const ROOT: NodeRef = NodeRef::Branch(ROOT_INDEX);

    /// Returns `true` if this is the root.
    #[inline]
    pub const fn is_root(self) -> bool {
        matches!(self, NodeRef::Branch(ROOT_INDEX))
    }

    /// Returns `true` if this refers to no node.
    #[inline]
    pub const fn is_none(self) -> bool {
        matches!(self, NodeRef::None)
    }

    /// Returns `true` if this refers to a node.
    #[inline]
    pub const fn is_some(self) -> bool {
        !self.is_none()
    }

    /// Returns `true` if this refers to a leaf.
    #[inline]
    pub const fn is_leaf(self) -> bool {
        matches!(self, NodeRef::Leaf(_))
    }

    /// Returns the branch index, if this refers to a branching node.
    #[inline]
    pub const fn branch(self) -> Option<BranchIndex> {
        match self {
            NodeRef::Branch(index) => Some(index),
            _ => None,
        }
    }

    /// Returns the suffix start, if this refers to a leaf.
    #[inline]
    pub const fn leaf(self) -> Option<u32> {
        match self {
            NodeRef::Leaf(start) => Some(start),
            _ => None,
        }
    }

    /// Packs this reference into the signed single-integer form: positive for branches, `-(start
    /// + 1)` for leaves and zero for no node.
    ///
    /// Leaf starts are shifted by one so that a leaf at offset 0 remains distinguishable from no
    /// node.
    #[inline]
    pub const fn to_raw(self) -> i64 {
        match self {
            NodeRef::None => 0,
            NodeRef::Branch(index) => index as i64,
            NodeRef::Leaf(start) => -(start as i64) - 1,
        }
    }

    /// Unpacks a reference produced by [`NodeRef::to_raw`].
    #[inline]
    pub const fn from_raw(raw: i64) -> Self {
        if raw == 0 {
            NodeRef::None
        } else if raw > 0 {
            NodeRef::Branch(raw as BranchIndex)
        } else {
            NodeRef::Leaf((-raw - 1) as u32)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_encoding_keeps_kinds_apart() {
        for node in [
            NodeRef::None,
            NodeRef::ROOT,
            NodeRef::Branch(77),
            NodeRef::Leaf(0),
            NodeRef::Leaf(u32::MAX),
        ] {
            assert_eq!(NodeRef::from_raw(node.to_raw()), node);
        }
        assert!(NodeRef::Leaf(0).to_raw() < 0);
        assert!(NodeRef::ROOT.to_raw() > 0);
    }

    #[test]
    fn root_is_a_branch() {
        assert!(NodeRef::ROOT.is_root());
        assert_eq!(NodeRef::ROOT.branch(), Some(ROOT_INDEX));
        assert!(!NodeRef::Branch(2).is_root());
        assert!(!NodeRef::Leaf(ROOT_INDEX).is_root());
    }
}
