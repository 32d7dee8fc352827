// Highest-set-bit lookup via de Bruijn multiply-and-table.
//
// Both widths OR-fill every bit below the top set bit, multiply by a fixed
// constant, and use the top bits of the product as a perfect-hash index.
// The constants and tables are part of the wire contract: block counts in
// the variable-length scheme are derived from them on both ends.
//
// A zero input fills to zero and lands on table slot 0, so both variants
// return 0 for 0. That is a defined result, not a "no bits set" sentinel.

/// De Bruijn multiplier for 32-bit inputs.
const DEBRUIJN_32: u32 = 0x07C4_ACDD;

/// Maps `(fill(v) * DEBRUIJN_32) >> 27` to the index of the top set bit.
const DEBRUIJN_TABLE_32: [u8; 32] = [
    0, 9, 1, 10, 13, 21, 2, 29, 11, 14, 16, 18, 22, 25, 3, 30, //
    8, 12, 20, 28, 15, 17, 24, 7, 19, 27, 23, 6, 26, 5, 4, 31,
];

/// De Bruijn multiplier for 64-bit inputs.
const DEBRUIJN_64: u64 = 0x6C04_F118_E996_6F6B;

/// Maps `(fill(v) * DEBRUIJN_64) >> 57` to the bit *length* of `v` (0..=64).
///
/// Only 65 of the 128 slots are reachable; the rest hold `-1`.
const DEBRUIJN_TABLE_64: [i8; 128] = [
    0, //
    48, -1, -1, 31, -1, 15, 51, -1, 63, 5, -1, -1, -1, 19, -1, //
    23, 28, -1, -1, -1, 40, 36, 46, -1, 13, -1, -1, -1, 34, -1, 58, //
    -1, 60, 2, 43, 55, -1, -1, -1, 50, 62, 4, -1, 18, 27, -1, 39, //
    45, -1, -1, 33, 57, -1, 1, 54, -1, 49, -1, 17, -1, -1, 32, -1, //
    53, -1, 16, -1, -1, 52, -1, -1, -1, 64, 6, 7, 8, -1, 9, -1, //
    -1, -1, 20, 10, -1, -1, 24, -1, 29, -1, -1, 21, -1, 11, -1, -1, //
    41, -1, 25, 37, -1, 47, -1, 30, 14, -1, -1, -1, -1, 22, -1, -1, //
    35, 12, -1, -1, -1, 59, 42, -1, -1, 61, 3, 26, 38, 44, -1, 56,
];

/// Index (0..=31) of the most significant set bit of `v`. Returns 0 for 0.
#[inline]
pub fn highest_bit_u32(mut v: u32) -> u32 {
    v |= v >> 1;
    v |= v >> 2;
    v |= v >> 4;
    v |= v >> 8;
    v |= v >> 16;
    u32::from(DEBRUIJN_TABLE_32[(v.wrapping_mul(DEBRUIJN_32) >> 27) as usize])
}

/// Bit length (0..=64) of `v`: one past the index of its top set bit.
#[inline]
pub fn bit_length_u64(mut v: u64) -> u32 {
    v |= v >> 1;
    v |= v >> 2;
    v |= v >> 4;
    v |= v >> 8;
    v |= v >> 16;
    v |= v >> 32;
    let slot = DEBRUIJN_TABLE_64[(v.wrapping_mul(DEBRUIJN_64) >> 57) as usize];
    debug_assert!(slot >= 0, "unreachable de Bruijn slot for {v:#x}");
    slot as u32
}

/// Index (0..=63) of the most significant set bit of `v`. Returns 0 for 0.
#[inline]
pub fn highest_bit_u64(v: u64) -> u32 {
    bit_length_u64(v).saturating_sub(1)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
