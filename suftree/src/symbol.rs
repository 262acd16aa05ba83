// Copyright 2024 Logan Magee
//
// SPDX-License-Identifier: LicenseRef-Proprietary

use core::{fmt::Debug, hash::Hash};

use bytemuck::Pod;

/// A fixed-width character code.
///
/// Narrow (`u8`) and wide (`u16`, `u32`) symbols are supported. The terminator that ends a static
/// text is not a symbol value: it is represented out of band as `None` wherever a symbol may be
/// missing, and it sorts before every symbol.
pub trait Symbol: Pod + Ord + Hash + Debug + Send + Sync + 'static {
    /// The width of the symbol in bytes
    const WIDTH: usize;

    /// Returns the symbol as an integer code.
    fn code(self) -> u32;

    /// Creates a symbol from an integer code, truncating codes that do not fit.
    fn from_code(code: u32) -> Self;

    /// Returns byte `index` of the symbol, least significant first.
    #[inline]
    fn byte(self, index: usize) -> u8 {
        debug_assert!(index < Self::WIDTH, "byte index out of range");
        (self.code() >> (8 * index)) as u8
    }
}

macro_rules! impl_symbol {
    ($($ty:ty),*) => {
        $(
            impl Symbol for $ty {
                const WIDTH: usize = core::mem::size_of::<$ty>();

                #[inline]
                fn code(self) -> u32 {
                    self as u32
                }

                #[inline]
                fn from_code(code: u32) -> Self {
                    code as $ty
                }
            }
        )*
    };
}

impl_symbol!(u8, u16, u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_are_little_endian_in_significance() {
        let symbol: u32 = 0x0403_0201;

        assert_eq!(symbol.byte(0), 1);
        assert_eq!(symbol.byte(3), 4);
        assert_eq!(0xbeefu16.byte(1), 0xbe);
    }

    #[test]
    fn codes_truncate() {
        assert_eq!(u8::from_code(0x1ff), 0xff);
        assert_eq!(u16::from_code(0x1_0002), 2);
        assert_eq!(u32::WIDTH, 4);
    }
}
