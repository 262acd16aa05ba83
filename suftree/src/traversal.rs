// Copyright 2024 Logan Magee
//
// SPDX-License-Identifier: LicenseRef-Proprietary

//! Traversal over any [`TreeView`].

use std::{
    collections::{BTreeSet, HashMap},
    fmt::{self, Display, Formatter},
};

use crate::{NodeRef, TreeView};

/// An iterator over the children of a node.
pub struct Children<'a, V: ?Sized> {
    view: &'a V,
    next: NodeRef,
}

impl<V: TreeView + ?Sized> Iterator for Children<'_, V> {
    type Item = NodeRef;

    fn next(&mut self) -> Option<NodeRef> {
        let current = self.next;
        if current.is_none() {
            return None;
        }
        self.next = self.view.next_sibling(current);

        Some(current)
    }
}

/// Returns an iterator over the children of `node`.
pub fn children<V: TreeView + ?Sized>(view: &V, node: NodeRef) -> Children<'_, V> {
    Children {
        view,
        next: view.first_child(node),
    }
}

/// A depth-first, parent-before-children iterator over every node of a tree.
///
/// The iterator keeps an explicit stack, so arbitrarily deep trees are fine.
pub struct Preorder<'a, V: ?Sized> {
    view: &'a V,
    stack: Vec<NodeRef>,
}

impl<'a, V: TreeView + ?Sized> Preorder<'a, V> {
    /// Starts a traversal at the root of `view`.
    pub fn new(view: &'a V) -> Self {
        Self {
            view,
            stack: vec![view.root()],
        }
    }
}

impl<V: TreeView + ?Sized> Iterator for Preorder<'_, V> {
    type Item = NodeRef;

    fn next(&mut self) -> Option<NodeRef> {
        let node = self.stack.pop()?;
        self.stack.extend(children(self.view, node));

        Some(node)
    }
}

/// Returns the symbols on the edge from `parent` to `child`.
pub fn edge_label<V: TreeView + ?Sized>(
    view: &V,
    parent: NodeRef,
    child: NodeRef,
) -> Vec<Option<u32>> {
    let (offset, len) = view.edge_label_bounds(parent, child);

    (0..len).map(|i| view.label_symbol(offset, i)).collect()
}

/// Returns the symbols spelled out on the path from the root to `node`.
pub fn path_label<V: TreeView + ?Sized>(view: &V, node: NodeRef) -> Vec<Option<u32>> {
    let mut edges = Vec::new();
    let mut current = node;
    while !current.is_root() {
        let parent = view.parent(current);
        if parent.is_none() {
            break;
        }
        edges.push(edge_label(view, parent, current));
        current = parent;
    }

    edges.into_iter().rev().flatten().collect()
}

/// The shape of a suffix tree, independent of node numbering and of how labels are stored.
///
/// The shape is the *implicit* suffix tree of the indexed text: the set of path labels of
/// branching nodes with at least two outgoing edges on real symbols, and the set of path labels of
/// leaves that do not merely end in the terminator. A static tree built with a terminator and a
/// sliding-window tree built without one over the same text have the same shape.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Shape {
    /// Path labels of branching nodes, the root included
    pub branches: BTreeSet<Vec<u32>>,
    /// Path labels of leaves
    pub leaves: BTreeSet<Vec<u32>>,
}

impl Shape {
    /// Computes the shape of `view`.
    pub fn of<V: TreeView + ?Sized>(view: &V) -> Self {
        let mut shape = Self::default();
        let mut stack = vec![(view.root(), Vec::new())];

        while let Some((node, path)) = stack.pop() {
            let mut real_children = 0;
            for child in children(view, node) {
                let label = edge_label(view, node, child);
                if label.first().is_some_and(Option::is_some) {
                    real_children += 1;
                }

                let mut child_path = path.clone();
                child_path.extend(label.iter().flatten());
                if child.is_leaf() {
                    if label.iter().any(Option::is_some) {
                        shape.leaves.insert(child_path);
                    }
                } else {
                    stack.push((child, child_path));
                }
            }
            if node.is_root() || real_children >= 2 {
                shape.branches.insert(path);
            }
        }

        shape
    }
}

/// A structural defect found by [`validate`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Inconsistency {
    /// The node at which the defect was found
    pub node: NodeRef,
    /// What is wrong
    pub reason: String,
}

impl Display for Inconsistency {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.node, self.reason)
    }
}

impl std::error::Error for Inconsistency {}

/// Checks the structural invariants every suffix tree must satisfy.
///
/// * every non-root branching node has at least two children
/// * sibling edges start with pairwise distinct symbols
/// * depths strictly increase along edges, by exactly the label length
/// * parent pointers agree with the child lists
/// * every leaf spells out the text from its suffix start
/// * the suffix link of every non-root branching node spells out its label minus the first symbol
///
/// # Errors
///
/// Returns the first defect found.
pub fn validate<V: TreeView + ?Sized>(view: &V) -> Result<(), Inconsistency> {
    let fail = |node, reason: String| Err(Inconsistency { node, reason });

    let mut labels: HashMap<NodeRef, Vec<Option<u32>>> = HashMap::new();
    let mut stack = vec![(view.root(), Vec::new())];
    let mut links = Vec::new();

    while let Some((node, path)) = stack.pop() {
        let mut first_symbols = BTreeSet::new();
        let mut count = 0;
        for child in children(view, node) {
            count += 1;
            if view.parent(child) != node {
                return fail(child, format!("parent is {:?}, not {node:?}", view.parent(child)));
            }

            let (_, len) = view.edge_label_bounds(node, child);
            if len == 0 {
                return fail(child, "empty edge label".into());
            }
            if view.depth(child) != view.depth(node) + len {
                return fail(
                    child,
                    format!(
                        "depth {} does not equal parent depth {} plus label length {len}",
                        view.depth(child),
                        view.depth(node),
                    ),
                );
            }

            let label = edge_label(view, node, child);
            if !first_symbols.insert(label[0]) {
                return fail(child, format!("duplicate first symbol {:?}", label[0]));
            }

            let mut child_path = path.clone();
            child_path.extend(label);
            if child.is_leaf() {
                let start = view.leaf_to_suffix_start(child);
                let spelled: Vec<_> = (0..child_path.len())
                    .map(|i| view.label_symbol(start, i))
                    .collect();
                if spelled != child_path {
                    return fail(child, "path label differs from the suffix text".into());
                }
            } else {
                stack.push((child, child_path));
            }
        }

        if !node.is_root() {
            if count < 2 {
                return fail(node, format!("branching node has {count} children"));
            }
            links.push(node);
        }
        labels.insert(node, path);
    }

    for node in links {
        let link = view.suffix_link(node);
        let Some(target) = labels.get(&link) else {
            return fail(node, format!("suffix link {link:?} is not a branching node"));
        };
        if labels[&node][1..] != target[..] {
            return fail(node, format!("suffix link {link:?} has the wrong path label"));
        }
    }

    Ok(())
}
