// Copyright 2024 Logan Magee
//
// SPDX-License-Identifier: LicenseRef-Proprietary

/// A family of hash functions over edge keys.
///
/// An edge key is the arena index of the source node and the code of the first letter of the
/// edge. `function` selects a member of the family and `seed` changes with every rehash, so the
/// same key must hash differently for different seeds for rehashing to make progress.
pub trait EdgeHasher {
    /// Hashes an edge key with hash function number `function`.
    fn hash(&self, source: u32, letter: u32, function: u32, seed: u64) -> u64;
}

/// The default hash family, built on the SplitMix64 finalizer.
#[derive(Clone, Copy, Debug, Default)]
pub struct MixHasher;

#[inline]
fn mix(mut x: u64) -> u64 {
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

impl EdgeHasher for MixHasher {
    #[inline]
    fn hash(&self, source: u32, letter: u32, function: u32, seed: u64) -> u64 {
        let key = (u64::from(source) << 32) | u64::from(letter);
        let salt = seed
            .wrapping_mul(0x9e37_79b9_7f4a_7c15)
            .wrapping_add(u64::from(function).wrapping_mul(0xd1b5_4a32_d192_ed03));

        mix(key ^ mix(salt))
    }
}

impl<H: EdgeHasher + ?Sized> EdgeHasher for &H {
    fn hash(&self, source: u32, letter: u32, function: u32, seed: u64) -> u64 {
        (**self).hash(source, letter, function, seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn functions_and_seeds_differ() {
        let hasher = MixHasher;
        let base = hasher.hash(3, 97, 0, 0);

        assert_ne!(base, hasher.hash(3, 97, 1, 0));
        assert_ne!(base, hasher.hash(3, 97, 0, 1));
        assert_ne!(base, hasher.hash(97, 3, 0, 0));
        assert_eq!(base, hasher.hash(3, 97, 0, 0));
    }
}
