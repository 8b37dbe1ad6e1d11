//! DEFLATE block decoding (RFC 1951).
//!
//! [`inflate_blocks`] drives the block loop: it pulls bits through a
//! [`BitReader`], resolves symbols through [`huffman`] tables, and expands
//! literals and back-references into an [`OutputSink`].

mod bits;
mod huffman;
mod out_buf;

pub(crate) use self::bits::BitReader;
pub(crate) use self::out_buf::{AdaptiveBuf, OutputSink, WindowedBuf};

use self::huffman::{HuffmanTable, FIXED_DIST, FIXED_LITLEN};
use self::out_buf::GrowthHint;
use crate::errors::DecodeError;

// Block types, two bits after BFINAL.
const STORED: u32 = 0b00;
const FIXED_HUFFMAN: u32 = 0b01;
const DYNAMIC_HUFFMAN: u32 = 0b10;

const END_OF_BLOCK: u16 = 256;

/// Base match lengths for symbols 257..=287 and their extra-bit counts.
///
/// Symbols 286 and 287 are reserved by RFC 1951 and never emitted by a
/// conforming encoder; a stream that defines codes for them anyway decodes
/// them to the maximum match length, like symbol 285.
const LENGTH_BASE: [u16; 31] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
    163, 195, 227, 258, 258, 258,
];
const LENGTH_EXTRA: [u8; 31] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0, 0, 0,
];

/// Base distances for symbols 0..=29 and their extra-bit counts.
const DIST_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];
const DIST_EXTRA: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13,
];

/// Order in which code-length code lengths appear in a dynamic block
/// header (RFC 1951 3.2.7).
const CL_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// Decode DEFLATE blocks until the final one, writing into `out`.
pub(crate) fn inflate_blocks<S: OutputSink>(
    bits: &mut BitReader<'_>,
    out: &mut S,
) -> Result<(), DecodeError> {
    loop {
        let b_final = bits.read_bits(1)? == 1;
        match bits.read_bits(2)? {
            STORED => stored_block(bits, out)?,
            FIXED_HUFFMAN => expand(bits, out, &FIXED_LITLEN, &FIXED_DIST)?,
            DYNAMIC_HUFFMAN => {
                let (litlen, dist) = dynamic_tables(bits)?;
                expand(bits, out, &litlen, &dist)?;
            }
            _ => return Err(DecodeError::InvalidBlockType),
        }
        if b_final {
            return Ok(());
        }
    }
}

/// BTYPE=00: uncompressed bytes behind a LEN/NLEN ones-complement pair.
fn stored_block<S: OutputSink>(bits: &mut BitReader<'_>, out: &mut S) -> Result<(), DecodeError> {
    bits.align_to_byte();
    let len = bits.read_bits(16)? as u16;
    let nlen = bits.read_bits(16)? as u16;
    if len != !nlen {
        return Err(DecodeError::InvalidStoredLength { len, nlen });
    }
    let bytes = bits.take_bytes(len as usize)?;
    out.put_slice(bytes, &growth_hint(bits, None));
    Ok(())
}

/// BTYPE=10: read the two huffman tables that describe the block.
fn dynamic_tables(bits: &mut BitReader<'_>) -> Result<(HuffmanTable, HuffmanTable), DecodeError> {
    let hlit = bits.read_bits(5)? as usize + 257;
    let hdist = bits.read_bits(5)? as usize + 1;
    let hclen = bits.read_bits(4)? as usize + 4;

    let mut cl_lengths = [0u8; 19];
    for &i in &CL_ORDER[..hclen] {
        cl_lengths[i] = bits.read_bits(3)? as u8;
    }
    let cl_table = HuffmanTable::from_lengths(&cl_lengths);

    // The literal/length and distance code lengths are run-length encoded
    // as a single combined vector.
    let mut lengths = Vec::with_capacity(hlit + hdist);
    let mut prev = None;
    while lengths.len() < hlit + hdist {
        match cl_table.decode(bits)? {
            len @ 0..=15 => {
                lengths.push(len as u8);
                prev = Some(len as u8);
            }
            16 => {
                let repeat = 3 + bits.read_bits(2)? as usize;
                let prev = prev.ok_or(DecodeError::InvalidHuffmanCode)?;
                lengths.extend(std::iter::repeat(prev).take(repeat));
            }
            17 => {
                let repeat = 3 + bits.read_bits(3)? as usize;
                lengths.extend(std::iter::repeat(0).take(repeat));
                prev = Some(0);
            }
            _ => {
                let repeat = 11 + bits.read_bits(7)? as usize;
                lengths.extend(std::iter::repeat(0).take(repeat));
                prev = Some(0);
            }
        }
    }
    if lengths.len() > hlit + hdist {
        return Err(DecodeError::InvalidHuffmanCode);
    }

    let litlen = HuffmanTable::from_lengths(&lengths[..hlit]);
    let dist = HuffmanTable::from_lengths(&lengths[hlit..]);
    Ok((litlen, dist))
}

/// Decode literal/length and distance symbols until end-of-block.
fn expand<S: OutputSink>(
    bits: &mut BitReader<'_>,
    out: &mut S,
    litlen: &HuffmanTable,
    dist: &HuffmanTable,
) -> Result<(), DecodeError> {
    loop {
        let sym = litlen.decode(bits)?;
        if sym == END_OF_BLOCK {
            return Ok(());
        }
        if sym < 256 {
            out.reserve(1, &growth_hint(bits, Some(litlen)));
            out.put_byte(sym as u8);
            continue;
        }

        let li = (sym - 257) as usize;
        let length = LENGTH_BASE[li] as usize + bits.read_bits(LENGTH_EXTRA[li] as u32)? as usize;

        let dsym = dist.decode(bits)? as usize;
        if dsym >= DIST_BASE.len() {
            // Distance symbols 30 and 31 are reserved.
            return Err(DecodeError::InvalidDistance);
        }
        let distance = DIST_BASE[dsym] as usize + bits.read_bits(DIST_EXTRA[dsym] as u32)? as usize;

        out.reserve(length, &growth_hint(bits, Some(litlen)));
        out.put_backref(distance, length)?;
    }
}

fn growth_hint(bits: &BitReader<'_>, litlen: Option<&HuffmanTable>) -> GrowthHint {
    GrowthHint {
        remaining_input: bits.input_len() - bits.position(),
        consumed_input: bits.position(),
        // During stored blocks a "symbol" is a plain byte.
        min_code_len: litlen.map_or(8, HuffmanTable::min_code_len),
    }
}
