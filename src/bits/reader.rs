// Bounded bit reader, the decode-side mirror of `BitBuffer`.
//
// Every read is checked against the declared bit count, so a truncated or
// hostile stream surfaces as `BitError::Truncated` instead of a panic.

use super::{BitError, INDEX_SHIFT, USED_MASK, WORD_BITS, low_mask};

/// Reads LSB-first bit fields from packed 64-bit words.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    words: &'a [u64],
    limit: u64,
    pos: u64,
}

impl<'a> BitReader<'a> {
    /// Create a reader over the first `bit_count` bits of `words`.
    pub fn new(words: &'a [u64], bit_count: u64) -> Result<Self, BitError> {
        let available = words.len() as u64 * u64::from(WORD_BITS);
        if bit_count > available {
            return Err(BitError::CountExceedsStorage {
                bits: bit_count,
                available,
            });
        }
        Ok(Self {
            words,
            limit: bit_count,
            pos: 0,
        })
    }

    /// Current bit position.
    #[inline]
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Bits left before the declared end of stream.
    #[inline]
    pub fn remaining(&self) -> u64 {
        self.limit - self.pos
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.limit
    }

    /// Read `bits` bits (0..=64) as an unsigned value.
    #[inline]
    pub fn read(&mut self, bits: u32) -> Result<u64, BitError> {
        debug_assert!(bits <= WORD_BITS);
        if bits == 0 {
            return Ok(0);
        }
        self.check(bits)?;

        let used = (self.pos & USED_MASK) as u32;
        let avail = WORD_BITS - used;
        let index = (self.pos >> INDEX_SHIFT) as usize;

        let mut value = self.words[index] >> used;
        if avail < bits {
            value |= self.words[index + 1] << avail;
        }

        self.pos += u64::from(bits);
        Ok(value & low_mask(bits))
    }

    /// Read a single bit.
    #[inline]
    pub fn read_bit(&mut self) -> Result<bool, BitError> {
        Ok(self.read(1)? != 0)
    }

    /// Advance past `bits` bits without decoding them.
    pub fn skip(&mut self, bits: u64) -> Result<(), BitError> {
        if bits > self.remaining() {
            return Err(BitError::Truncated {
                position: self.pos,
                requested: bits.min(u64::from(u32::MAX)) as u32,
                limit: self.limit,
            });
        }
        self.pos += bits;
        Ok(())
    }

    #[inline]
    fn check(&self, bits: u32) -> Result<(), BitError> {
        if u64::from(bits) > self.remaining() {
            return Err(BitError::Truncated {
                position: self.pos,
                requested: bits,
                limit: self.limit,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
