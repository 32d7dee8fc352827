// Bit-level primitives for the snapshot delta wire format.
//
// Values are packed least-significant-bit first into 64-bit words.
//
// # Modules
//
// - `buffer`: growable bit-addressable output buffer
// - `reader`: bounded bit reader over packed words
// - `scan`  : highest-set-bit lookup (de Bruijn multiply-and-table)
// - `varlen`: unary-prefixed block integers and zigzag mapping

pub mod buffer;
pub mod reader;
pub mod scan;
pub mod varlen;

pub use buffer::BitBuffer;
pub use reader::BitReader;
pub use scan::{bit_length_u64, highest_bit_u32, highest_bit_u64};
pub use varlen::{read_var_u32, read_var_u64, unzigzag, write_var_u32, write_var_u64, zigzag};

/// Width of one backing word in bits.
pub const WORD_BITS: u32 = 64;

/// `cursor & USED_MASK` is the bit offset inside the current word.
pub(crate) const USED_MASK: u64 = (WORD_BITS as u64) - 1;

/// `cursor >> INDEX_SHIFT` is the index of the current word.
pub(crate) const INDEX_SHIFT: u32 = 6;

/// Mask selecting the low `bits` bits (`bits` in 0..=64).
#[inline]
pub(crate) const fn low_mask(bits: u32) -> u64 {
    if bits >= WORD_BITS {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// Errors raised while reading a packed bit stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BitError {
    /// The declared bit count does not fit in the supplied words.
    #[error("bit count {bits} exceeds the {available} bits of backing storage")]
    CountExceedsStorage { bits: u64, available: u64 },
    /// A read would pass the end of the stream.
    #[error("read of {requested} bits at bit {position} passes end of stream ({limit} bits)")]
    Truncated {
        position: u64,
        requested: u32,
        limit: u64,
    },
    /// A unary length prefix ran longer than any value of the width needs.
    #[error("length prefix at bit {position} exceeds {max_blocks} blocks")]
    MalformedPrefix { position: u64, max_blocks: u32 },
    /// A payload carried significant bits above the target width.
    #[error("payload at bit {position} does not fit in {width} bits")]
    PayloadOverflow { position: u64, width: u32 },
}
