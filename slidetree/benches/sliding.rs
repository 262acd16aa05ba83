// Copyright 2023-2024 Logan Magee
//
// SPDX-License-Identifier: LicenseRef-Proprietary

#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use slidetree::{
    ElmMethod, Representation, SliceSource, SlidingConfig, Variation,
    build_sliding_window_ukkonen,
};

const STREAM_LEN: usize = 1 << 18;
const BLOCK_SIZE: usize = 1 << 12;

/// Generates a reproducible text over a four-letter alphabet.
fn dna(len: usize) -> Vec<u8> {
    let mut state = 0x2545_f491_4f6c_dd1du64;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            b"acgt"[(state >> 62) as usize]
        })
        .collect()
}

fn slide(c: &mut Criterion) {
    let mut group = c.benchmark_group("slide");
    let text = dna(STREAM_LEN);

    for representation in [Representation::Slli, Representation::Shti] {
        for method in [ElmMethod::Batch, ElmMethod::Credit] {
            for variation in [Variation::TopDown, Variation::BottomUp] {
                let mut config = SlidingConfig::new();
                config
                    .block_size(BLOCK_SIZE)
                    .ap_scale_factor(4)
                    .representation(representation)
                    .elm_method(method)
                    .variation(variation);

                let id = format!("{representation:?}/{method:?}/{variation:?}");
                group
                    .throughput(Throughput::Bytes(STREAM_LEN as u64))
                    .bench_with_input(BenchmarkId::from_parameter(id), &text, |b, text| {
                        b.iter(|| {
                            let source = SliceSource::new(text.clone());
                            let mut tree = build_sliding_window_ukkonen(&config, source).unwrap();
                            tree.run().unwrap();
                            tree.stats()
                        });
                    });
            }
        }
    }

    group.finish();
}

criterion_group!(benches, slide);
criterion_main!(benches);
