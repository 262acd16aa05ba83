// Copyright 2023 Logan Magee
//
// SPDX-License-Identifier: LicenseRef-Proprietary

use std::collections::BTreeSet;

use suftree::{
    NodeRef, TreeView, build_pwotd,
    traversal::{self, Preorder},
};

/// Returns the path labels of all leaves.
fn leaves<V: TreeView>(tree: &V) -> BTreeSet<Vec<Option<u32>>> {
    Preorder::new(tree)
        .filter(|node| node.is_leaf())
        .map(|leaf| traversal::path_label(tree, leaf))
        .collect()
}

#[test]
fn every_suffix_ends_in_its_own_leaf() {
    for text in [
        &b"banana"[..],
        b"mississippi",
        b"abcabxabcd",
        b"aaaaaaaaaa",
        b"the theme then thee",
    ] {
        let tree = build_pwotd(None, text).unwrap();
        traversal::validate(&tree).unwrap();

        let leaves = leaves(&tree);
        assert_eq!(leaves.len(), text.len() + 1, "leaf count for {text:?}");
        for start in 0..=text.len() {
            let mut label: Vec<_> = text[start..]
                .iter()
                .map(|&b| Some(u32::from(b)))
                .collect();
            label.push(None);

            assert!(leaves.contains(&label), "no leaf for suffix {start} of {text:?}");
        }
    }
}

#[test]
fn banana_has_the_reference_shape() {
    let tree = build_pwotd(None, b"banana").unwrap();

    let a = traversal::children(&tree, NodeRef::ROOT)
        .find(|&child| traversal::edge_label(&tree, NodeRef::ROOT, child) == [Some(u32::from(b'a'))])
        .unwrap();
    assert_eq!(tree.depth(a), 1);

    let mut labels: Vec<_> = traversal::children(&tree, a)
        .map(|child| traversal::edge_label(&tree, a, child))
        .collect();
    labels.sort();
    assert_eq!(
        labels,
        [
            vec![None],
            vec![Some(u32::from(b'n')), Some(u32::from(b'a'))],
        ]
    );

    // "ana" links to "na", "a" links to the root
    let ana = traversal::children(&tree, a)
        .find(|&child| !child.is_leaf())
        .unwrap();
    assert_eq!(tree.depth(ana), 3);
    assert_eq!(tree.suffix_link(a), NodeRef::ROOT);
    assert_eq!(
        traversal::path_label(&tree, tree.suffix_link(ana)),
        [Some(u32::from(b'n')), Some(u32::from(b'a'))]
    );
}

#[test]
fn wide_text_matches_narrow_text() {
    let narrow = b"abracadabra";
    let wide: Vec<u32> = narrow.iter().map(|&b| u32::from(b) + 0x1_0000).collect();

    let narrow_tree = build_pwotd(Some(2), narrow).unwrap();
    let wide_tree = build_pwotd(Some(2), &wide).unwrap();

    let shift = |label: &Vec<Option<u32>>| -> Vec<Option<u32>> {
        label.iter().map(|s| s.map(|c| c + 0x1_0000)).collect()
    };
    let expected: Vec<_> = leaves(&narrow_tree).iter().map(shift).collect();
    let actual: Vec<_> = leaves(&wide_tree).into_iter().collect();
    assert_eq!(actual, expected);
}
