// Copyright 2024 Logan Magee
//
// SPDX-License-Identifier: LicenseRef-Proprietary

use std::{
    io::Cursor,
    time::{Duration, Instant},
};

use slidetree::{
    ByteSource, CollisionResolution, ElmMethod, Endianness, Error, Phase, Representation,
    SliceSource, SlidingConfig, SlidingSuffixTree, Variation, build_sliding_window_ukkonen,
};
use suftree::{
    Symbol, build_pwotd,
    traversal::{self, Shape},
};

fn build<C: Symbol>(config: &SlidingConfig, text: &[C]) -> SlidingSuffixTree<C> {
    build_sliding_window_ukkonen(config, SliceSource::new(text.to_vec())).unwrap()
}

/// Returns `true` if the sliding tree has the shape of a static tree over its active part.
fn matches_static<C: Symbol>(tree: &SlidingSuffixTree<C>) -> bool {
    let text = tree.active_text();
    let expected = build_pwotd(None, &text).unwrap();

    traversal::validate(tree).is_ok() && Shape::of(tree) == Shape::of(&expected)
}

#[test]
fn small_window_over_a_periodic_stream() {
    let mut config = SlidingConfig::new();
    config.block_size(4).ap_scale_factor(1).sw_scale_factor(Some(3));
    let mut tree = build(&config, b"abcabcabc");

    let mut windows = Vec::new();
    while tree.step().unwrap() {
        traversal::validate(&tree).unwrap();
        assert!(matches_static(&tree), "mismatch over {:?}", tree.active_range());
        windows.push(tree.active_text());
    }

    let windows: Vec<&[u8]> = windows.iter().map(Vec::as_slice).collect();
    assert_eq!(
        windows,
        [
            &b"a"[..],
            b"ab",
            b"abc",
            b"abca",
            b"bcab",
            b"cabc",
            b"abca",
            b"bcab",
            b"cabc",
            b"abc",
            b"bc",
            b"c",
            b"",
        ]
    );
    assert_eq!(tree.phase(), Phase::Finished);
}

#[test]
fn every_configuration_matches_static_construction() {
    fn prop(text: Vec<u8>, selector: u8) -> bool {
        let text: Vec<u8> = text.into_iter().map(|b| b'a' + b % 3).collect();

        let mut config = SlidingConfig::new();
        config
            .block_size(1 + usize::from(selector % 5))
            .ap_scale_factor(1 + usize::from(selector >> 7))
            .representation(if selector & 0x08 == 0 {
                Representation::Shti
            } else {
                Representation::Slli
            })
            .elm_method(if selector & 0x10 == 0 {
                ElmMethod::Batch
            } else {
                ElmMethod::Credit
            })
            .variation(if selector & 0x20 == 0 {
                Variation::TopDown
            } else {
                Variation::BottomUp
            })
            .collision_resolution(if selector & 0x40 == 0 {
                CollisionResolution::Cuckoo
            } else {
                CollisionResolution::DoubleHashing
            })
            .initial_hash_capacity(8);

        let mut tree = build(&config, &text);
        loop {
            match tree.step() {
                Ok(true) => {
                    if !matches_static(&tree) {
                        return false;
                    }
                }
                Ok(false) => return tree.stats().prolong_steps == text.len() as u64,
                Err(_) => return false,
            }
        }
    }

    quickcheck::quickcheck(prop as fn(Vec<u8>, u8) -> bool);
}

#[test]
fn active_size_follows_steps() {
    let text: Vec<u8> = (0..200u32).map(|i| b"acgt"[(i * i % 7 % 4) as usize]).collect();
    let mut config = SlidingConfig::new();
    config.block_size(16).ap_scale_factor(2);
    let mut tree = build(&config, &text);

    let mut previous = Phase::Filling;
    while tree.step().unwrap() {
        let stats = tree.stats();
        let len = tree.active_range().end - tree.active_range().start;

        assert_eq!(len, stats.prolong_steps - stats.delete_steps);
        assert!(len as usize <= config.active_size());

        let phase = tree.phase();
        match (previous, phase) {
            (Phase::Filling, Phase::Filling | Phase::Steady)
            | (Phase::Steady, Phase::Steady | Phase::Draining)
            | (Phase::Draining, Phase::Draining) => {}
            transition => panic!("unexpected transition {transition:?}"),
        }
        previous = phase;
    }

    let stats = tree.stats();
    assert_eq!(stats.prolong_steps, 200);
    assert_eq!(stats.delete_steps, 200);
    assert!(stats.batch_passes > 0);
    assert!(stats.peak_branches < config.active_size());
}

#[test]
fn credits_keep_labels_inside_the_window() {
    let text = b"to be or not to be that is the question whether tis nobler in the mind";
    let mut config = SlidingConfig::new();
    config
        .block_size(6)
        .ap_scale_factor(3)
        .elm_method(ElmMethod::Credit)
        .representation(Representation::Slli);
    let mut tree = build(&config, text);

    while tree.step().unwrap() {
        assert!(matches_static(&tree), "mismatch over {:?}", tree.active_range());
    }

    let stats = tree.stats();
    assert!(stats.credits_sent > 0);
    assert_eq!(stats.batch_passes, 0);
}

#[test]
fn wide_symbols_from_a_byte_stream() {
    let symbols: Vec<u16> = [300u16, 1, 300, 2, 300, 1, 300, 2, 7].repeat(3);
    let bytes: Vec<u8> = symbols.iter().flat_map(|s| s.to_be_bytes()).collect();

    let mut config = SlidingConfig::new();
    config.block_size(5).ap_scale_factor(2);
    let source = ByteSource::new(Cursor::new(bytes), Endianness::Big);
    let mut tree = build_sliding_window_ukkonen::<u16, _>(&config, source).unwrap();

    let mut seen: Vec<u16> = Vec::new();
    let mut prolonged = 0;
    while tree.step().unwrap() {
        assert!(matches_static(&tree), "mismatch over {:?}", tree.active_range());
        if tree.stats().prolong_steps > prolonged {
            prolonged = tree.stats().prolong_steps;
            seen.extend(tree.active_text().last());
        }
    }

    assert_eq!(seen, symbols);
}

/// Generates a reproducible text over a four-letter alphabet.
fn dna(len: usize) -> Vec<u8> {
    let mut state = 0x9e37_79b9_7f4a_7c15u64;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            b"acgt"[(state >> 62) as usize]
        })
        .collect()
}

/// Returns how long sliding over `text` takes with the given child representation.
fn time_run(text: &[u8], block_size: usize, representation: Representation) -> Duration {
    let mut config = SlidingConfig::new();
    config.block_size(block_size).representation(representation);
    let mut tree = build(&config, text);

    let started = Instant::now();
    tree.run().unwrap();
    started.elapsed()
}

#[test]
fn hashed_children_scale_like_listed_children() {
    let block_size = 1 << 14;
    let text = dna(4 * block_size);

    let listed = time_run(&text, block_size, Representation::Slli);
    let hashed = time_run(&text, block_size, Representation::Shti);

    assert!(
        hashed < listed * 20 + Duration::from_millis(500),
        "hashed children took {hashed:?}, listed children {listed:?}"
    );
}

#[test]
fn larsson_is_rejected() {
    let mut config = SlidingConfig::new();
    config.elm_method(ElmMethod::Larsson);

    let result = build_sliding_window_ukkonen::<u8, _>(&config, SliceSource::new(Vec::new()));
    assert!(matches!(result, Err(Error::InvalidParameter(_))));
}

#[test]
fn empty_stream_finishes_immediately() {
    let mut config = SlidingConfig::new();
    config.block_size(16);
    let mut tree = build::<u8>(&config, &[]);

    assert!(!tree.step().unwrap());
    assert_eq!(tree.phase(), Phase::Finished);
    assert_eq!(tree.stats().prolong_steps, 0);
}

#[cfg(feature = "threads")]
#[test]
fn reader_thread_feeds_the_same_tree() {
    let text: Vec<u8> = b"the quick brown fox jumps over the lazy dog ".repeat(12);

    let mut inline = SlidingConfig::new();
    inline.block_size(7).ap_scale_factor(3);
    let mut threaded = inline;
    threaded.reader_thread(true);

    let mut inline = build(&inline, &text);
    let mut threaded = build(&threaded, &text);

    loop {
        let more = inline.step().unwrap();
        assert_eq!(threaded.step().unwrap(), more);
        if !more {
            break;
        }

        assert_eq!(threaded.active_text(), inline.active_text());
        assert_eq!(Shape::of(&threaded), Shape::of(&inline));
    }
}

#[cfg(feature = "threads")]
#[test]
fn dropping_a_tree_stops_its_reader() {
    let text = vec![b'x'; 1 << 16];
    let mut config = SlidingConfig::new();
    config.block_size(64).reader_thread(true);

    let mut tree = build(&config, &text);
    for _ in 0..100 {
        tree.step().unwrap();
    }
    drop(tree);
}
