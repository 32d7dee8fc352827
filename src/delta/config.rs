// Block-size configuration for the sparse delta stream.
//
// Both peers must agree on these values out of band; they are not carried
// in the raw stream (the `frame` container records them).

use crate::bits::varlen::{var_bits_u32, var_bits_u64};

/// Block size for the gap (index offset) integers.
pub const DEFAULT_OFFSET_BLOCK_SIZE: u32 = 4;

/// Block size for the zigzag value-difference integers.
pub const DEFAULT_VALUE_BLOCK_SIZE: u32 = 8;

/// Largest usable offset block size (gaps are 32-bit).
pub const MAX_OFFSET_BLOCK_SIZE: u32 = 32;

/// Largest usable value block size (zigzag deltas are 64-bit).
pub const MAX_VALUE_BLOCK_SIZE: u32 = 64;

/// Largest zigzag value two 32-bit words can produce: |d| <= 2^32 - 1.
const MAX_ZIGZAG_DELTA: u64 = (1 << 33) - 1;

/// Rejected block-size configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BlockSizeError {
    #[error("offset block size {0} outside 1..={MAX_OFFSET_BLOCK_SIZE}")]
    Offset(u32),
    #[error("value block size {0} outside 1..={MAX_VALUE_BLOCK_SIZE}")]
    Value(u32),
}

/// Validated pair of block sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockSizes {
    offset: u32,
    value: u32,
}

impl BlockSizes {
    pub const DEFAULT: Self = Self {
        offset: DEFAULT_OFFSET_BLOCK_SIZE,
        value: DEFAULT_VALUE_BLOCK_SIZE,
    };

    pub const fn new(offset: u32, value: u32) -> Result<Self, BlockSizeError> {
        if offset == 0 || offset > MAX_OFFSET_BLOCK_SIZE {
            return Err(BlockSizeError::Offset(offset));
        }
        if value == 0 || value > MAX_VALUE_BLOCK_SIZE {
            return Err(BlockSizeError::Value(value));
        }
        Ok(Self { offset, value })
    }

    /// Block size for gap integers.
    #[inline]
    pub const fn offset(self) -> u32 {
        self.offset
    }

    /// Block size for zigzag value integers.
    #[inline]
    pub const fn value(self) -> u32 {
        self.value
    }
}

impl Default for BlockSizes {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ---------------------------------------------------------------------------
// Named profiles
// ---------------------------------------------------------------------------

/// Named block-size presets.
#[derive(Debug, Clone, Copy)]
pub struct Profile {
    pub name: &'static str,
    pub sizes: BlockSizes,
}

/// Dense field layouts with mostly tiny deltas (counters, flags).
pub const COMPACT: Profile = Profile {
    name: "compact",
    sizes: BlockSizes {
        offset: 2,
        value: 4,
    },
};

pub const DEFAULT: Profile = Profile {
    name: "default",
    sizes: BlockSizes::DEFAULT,
};

/// Sparse layouts with large jumps (positions, hashed ids).
pub const WIDE: Profile = Profile {
    name: "wide",
    sizes: BlockSizes {
        offset: 8,
        value: 16,
    },
};

pub const PROFILES: [Profile; 3] = [COMPACT, DEFAULT, WIDE];

/// Look up a profile by name.
pub fn profile(name: &str) -> Option<Profile> {
    PROFILES.iter().copied().find(|p| p.name == name)
}

// ---------------------------------------------------------------------------
// Worst-case sizing
// ---------------------------------------------------------------------------

/// Upper bound on the bits `pack` emits for `word_count` words.
///
/// Use it to pre-size a `BitBuffer` so the encode pass never reallocates.
pub fn max_packed_bits(word_count: usize, sizes: BlockSizes) -> u64 {
    if word_count == 0 {
        return 0;
    }
    let max_gap = u32::try_from(word_count - 1).unwrap_or(u32::MAX);
    let per_pair = u64::from(var_bits_u32(max_gap, sizes.offset()))
        + u64::from(var_bits_u64(MAX_ZIGZAG_DELTA, sizes.value()));
    per_pair.saturating_mul(word_count as u64)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
