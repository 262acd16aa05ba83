// Copyright 2024 Logan Magee
//
// SPDX-License-Identifier: LicenseRef-Proprietary

use std::io::{self, ErrorKind, Read};

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use suftree::Symbol;

/// A supplier of already-decoded, fixed-width symbols.
pub trait SymbolSource<C> {
    /// Fills `buf` with the next symbols of the stream and returns how many were written.
    ///
    /// Fewer symbols than `buf.len()` are only returned once the stream is exhausted.
    ///
    /// # Errors
    ///
    /// Returns any error raised by the underlying reader.
    fn read_symbols(&mut self, buf: &mut [C]) -> io::Result<usize>;
}

/// Streams symbols from an in-memory text.
///
/// # Examples
///
/// ```
/// use slidetree::{SliceSource, SymbolSource};
///
/// let mut source = SliceSource::new(b"abcde".to_vec());
/// let mut buf = [0u8; 3];
///
/// assert_eq!(source.read_symbols(&mut buf).unwrap(), 3);
/// assert_eq!(source.read_symbols(&mut buf).unwrap(), 2);
/// assert_eq!(&buf[..2], b"de");
/// ```
#[derive(Clone, Debug)]
pub struct SliceSource<C> {
    text: Vec<C>,
    position: usize,
}

impl<C> SliceSource<C> {
    /// Creates a source that yields the symbols of `text` in order.
    pub fn new(text: Vec<C>) -> Self {
        Self { text, position: 0 }
    }
}

impl<C: Copy> SymbolSource<C> for SliceSource<C> {
    fn read_symbols(&mut self, buf: &mut [C]) -> io::Result<usize> {
        let rest = &self.text[self.position..];
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.position += n;

        Ok(n)
    }
}

/// The byte order of multi-byte symbols in a byte stream.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Endianness {
    /// Least significant byte first
    Little,
    /// Most significant byte first
    Big,
    /// The byte order of the running machine, read without conversion
    #[default]
    Native,
}

/// Decodes fixed-width symbols from a byte stream.
#[derive(Debug)]
pub struct ByteSource<R> {
    reader: R,
    endianness: Endianness,
    bytes: Vec<u8>,
}

impl<R: Read> ByteSource<R> {
    /// Creates a source decoding `reader` with the given byte order.
    pub fn new(reader: R, endianness: Endianness) -> Self {
        Self {
            reader,
            endianness,
            bytes: Vec::new(),
        }
    }
}

/// Reads until `buf` is full or the reader is exhausted, returning the number of bytes read.
fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }

    Ok(filled)
}

fn truncated_symbol() -> io::Error {
    io::Error::new(
        ErrorKind::UnexpectedEof,
        "stream ends in the middle of a symbol",
    )
}

impl<C: Symbol, R: Read> SymbolSource<C> for ByteSource<R> {
    fn read_symbols(&mut self, buf: &mut [C]) -> io::Result<usize> {
        if self.endianness == Endianness::Native || C::WIDTH == 1 {
            let bytes: &mut [u8] = bytemuck::cast_slice_mut(buf);
            let filled = read_fully(&mut self.reader, bytes)?;
            if filled % C::WIDTH != 0 {
                return Err(truncated_symbol());
            }

            return Ok(filled / C::WIDTH);
        }

        self.bytes.resize(buf.len() * C::WIDTH, 0);
        let filled = read_fully(&mut self.reader, &mut self.bytes)?;
        if filled % C::WIDTH != 0 {
            return Err(truncated_symbol());
        }

        let symbols = filled / C::WIDTH;
        for (symbol, chunk) in buf.iter_mut().zip(self.bytes[..filled].chunks_exact(C::WIDTH)) {
            let code = match (self.endianness, C::WIDTH) {
                (Endianness::Big, 2) => BigEndian::read_u16(chunk).into(),
                (Endianness::Big, _) => BigEndian::read_u32(chunk),
                (_, 2) => LittleEndian::read_u16(chunk).into(),
                (_, _) => LittleEndian::read_u32(chunk),
            };
            *symbol = C::from_code(code);
        }

        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn decodes_both_byte_orders() {
        let bytes = [0x01, 0x02, 0x03, 0x04];
        let mut buf = [0u16; 4];

        let mut little = ByteSource::new(Cursor::new(bytes), Endianness::Little);
        assert_eq!(little.read_symbols(&mut buf).unwrap(), 2);
        assert_eq!(buf[..2], [0x0201, 0x0403]);

        let mut big = ByteSource::new(Cursor::new(bytes), Endianness::Big);
        assert_eq!(big.read_symbols(&mut buf).unwrap(), 2);
        assert_eq!(buf[..2], [0x0102, 0x0304]);
    }

    #[test]
    fn native_order_reads_in_place() {
        let symbols: [u32; 3] = [7, 70_000, 9];
        let bytes: Vec<u8> = bytemuck::cast_slice(&symbols).to_vec();
        let mut source = ByteSource::new(Cursor::new(bytes), Endianness::Native);

        let mut buf = [0u32; 8];
        assert_eq!(source.read_symbols(&mut buf).unwrap(), 3);
        assert_eq!(buf[..3], symbols);
        assert_eq!(source.read_symbols(&mut buf).unwrap(), 0);
    }

    #[test]
    fn truncated_symbol_is_an_error() {
        let mut source = ByteSource::new(Cursor::new([1u8, 2, 3]), Endianness::Big);
        let mut buf = [0u16; 4];

        let error = source.read_symbols(&mut buf).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::UnexpectedEof);
    }
}
