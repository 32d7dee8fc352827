// Self-describing variable-length integers.
//
// A value is split into `blocks` fixed-width blocks, where
//
//     blocks = (highest_bit(value) + block_size) / block_size
//
// (at least one, also for zero). The encoding is two independent writes:
//
//     1. unary prefix, `blocks` bits wide: (blocks - 1) zero bits then a one
//        bit, i.e. the value `1 << (blocks - 1)` written with width `blocks`
//     2. payload, `blocks * block_size` bits wide: the whole value
//
// The reader counts zero bits up to the first one bit to learn `blocks`,
// then reads exactly `blocks * block_size` payload bits.
//
// Block sizes must be nonzero; `delta::config::BlockSizes` validates them.

use super::scan::{highest_bit_u32, highest_bit_u64};
use super::{BitBuffer, BitError, BitReader, WORD_BITS};

// ---------------------------------------------------------------------------
// Zigzag
// ---------------------------------------------------------------------------

/// Map a signed value to unsigned so small magnitudes of either sign stay
/// small: 0 -> 0, -1 -> 1, 1 -> 2, -2 -> 3, ...
#[inline]
pub fn zigzag(d: i64) -> u64 {
    ((d >> 63) ^ (d << 1)) as u64
}

/// Inverse of [`zigzag`].
#[inline]
pub fn unzigzag(z: u64) -> i64 {
    ((z >> 1) as i64) ^ -((z & 1) as i64)
}

// ---------------------------------------------------------------------------
// Sizing
// ---------------------------------------------------------------------------

/// Number of blocks used to encode a 32-bit `value`.
#[inline]
pub fn block_count_u32(value: u32, block_size: u32) -> u32 {
    debug_assert!(block_size > 0);
    (highest_bit_u32(value) + block_size) / block_size
}

/// Number of blocks used to encode a 64-bit `value`.
#[inline]
pub fn block_count_u64(value: u64, block_size: u32) -> u32 {
    debug_assert!(block_size > 0);
    (highest_bit_u64(value) + block_size) / block_size
}

/// Encoded size in bits of a 32-bit `value` (prefix plus payload).
#[inline]
pub fn var_bits_u32(value: u32, block_size: u32) -> u32 {
    block_count_u32(value, block_size) * (block_size + 1)
}

/// Encoded size in bits of a 64-bit `value` (prefix plus payload).
#[inline]
pub fn var_bits_u64(value: u64, block_size: u32) -> u32 {
    block_count_u64(value, block_size) * (block_size + 1)
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Append a 32-bit variable-length integer.
#[inline]
pub fn write_var_u32(buf: &mut BitBuffer, value: u32, block_size: u32) {
    let blocks = block_count_u32(value, block_size);
    buf.write(1u64 << (blocks - 1), blocks);
    buf.write(u64::from(value), blocks * block_size);
}

/// Append a 64-bit variable-length integer.
///
/// With small block sizes the payload can exceed 64 bits; the excess is
/// written as zero padding.
#[inline]
pub fn write_var_u64(buf: &mut BitBuffer, value: u64, block_size: u32) {
    let blocks = block_count_u64(value, block_size);
    buf.write(1u64 << (blocks - 1), blocks);
    buf.write(value, blocks * block_size);
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Read a 32-bit variable-length integer.
pub fn read_var_u32(r: &mut BitReader<'_>, block_size: u32) -> Result<u32, BitError> {
    read_var(r, block_size, 32).map(|v| v as u32)
}

/// Read a 64-bit variable-length integer.
pub fn read_var_u64(r: &mut BitReader<'_>, block_size: u32) -> Result<u64, BitError> {
    read_var(r, block_size, 64)
}

fn read_var(r: &mut BitReader<'_>, block_size: u32, width: u32) -> Result<u64, BitError> {
    debug_assert!(block_size > 0);
    let start = r.position();
    let max_blocks = (width - 1 + block_size) / block_size;

    let mut blocks = 1u32;
    while !r.read_bit()? {
        blocks += 1;
        if blocks > max_blocks {
            return Err(BitError::MalformedPrefix {
                position: start,
                max_blocks,
            });
        }
    }

    let payload_bits = blocks * block_size;
    let value = r.read(payload_bits.min(WORD_BITS))?;

    let overflow = BitError::PayloadOverflow {
        position: start,
        width,
    };
    let mut rest = payload_bits.saturating_sub(WORD_BITS);
    while rest > 0 {
        let n = rest.min(WORD_BITS);
        if r.read(n)? != 0 {
            return Err(overflow);
        }
        rest -= n;
    }
    if width < WORD_BITS && value >> width != 0 {
        return Err(overflow);
    }

    Ok(value)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
