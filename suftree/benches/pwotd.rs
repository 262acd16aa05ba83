// Copyright 2023-2024 Logan Magee
//
// SPDX-License-Identifier: LicenseRef-Proprietary

#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use suftree::build_pwotd;

const SIZES: [usize; 4] = [1 << 12, 1 << 14, 1 << 16, 1 << 18];

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

fn construct(c: &mut Criterion) {
    let mut group = c.benchmark_group("construct");

    for size in SIZES {
        let text = dna(size);
        for prefix_length in [None, Some(2), Some(4)] {
            let id = format!("{size}/{}", prefix_length.map_or(0, |p| p));
            group
                .throughput(Throughput::Bytes(size as u64))
                .bench_with_input(BenchmarkId::from_parameter(id), &text, |b, text| {
                    b.iter(|| build_pwotd(prefix_length, text).unwrap());
                });
        }
    }

    group.finish();
}

criterion_group!(benches, construct);
criterion_main!(benches);
