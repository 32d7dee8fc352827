// Growable bit-addressable output buffer.
//
// Backing store is a `Vec<u64>` plus a bit cursor that only moves forward.
// Each write merges the new bits into the current word, clearing anything
// at or above the cursor, and spills the high-order remainder into the next
// word when the write straddles a word boundary. Storage grows on demand, so
// an undersized buffer costs a reallocation instead of corrupting memory;
// callers that want a single allocation pre-size with `with_capacity_bits`.

use super::{INDEX_SHIFT, USED_MASK, WORD_BITS, low_mask};

/// Bit-addressable output stream packed LSB-first into 64-bit words.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitBuffer {
    words: Vec<u64>,
    cursor: u64,
}

impl BitBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer with room for `bits` bits before reallocating.
    pub fn with_capacity_bits(bits: u64) -> Self {
        Self {
            words: Vec::with_capacity(words_for(bits)),
            cursor: 0,
        }
    }

    /// Wrap already-packed words. The cursor is set to `bit_len`.
    ///
    /// Words beyond `bit_len` are dropped; bits above `bit_len` in the last
    /// word are kept as-is and are overwritten by subsequent writes.
    pub fn from_words(mut words: Vec<u64>, bit_len: u64) -> Self {
        let needed = words_for(bit_len);
        words.resize(needed, 0);
        Self {
            words,
            cursor: bit_len,
        }
    }

    /// Rebuild a buffer from the little-endian byte form of `to_le_bytes`.
    pub fn from_le_bytes(bytes: &[u8], bit_len: u64) -> Self {
        let words = bytes
            .chunks(8)
            .map(|chunk| {
                let mut word = [0u8; 8];
                word[..chunk.len()].copy_from_slice(chunk);
                u64::from_le_bytes(word)
            })
            .collect();
        Self::from_words(words, bit_len)
    }

    /// Number of bits written so far (the cursor position).
    #[inline]
    pub fn bit_len(&self) -> u64 {
        self.cursor
    }

    /// Number of whole bytes needed to hold `bit_len()` bits.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.cursor.div_ceil(8) as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// Packed words. The last word may be partially used.
    #[inline]
    pub fn as_words(&self) -> &[u64] {
        &self.words
    }

    /// Consume the buffer, returning the packed words.
    pub fn into_words(self) -> Vec<u64> {
        self.words
    }

    /// Reset the cursor to zero, keeping the allocation.
    pub fn clear(&mut self) {
        self.words.clear();
        self.cursor = 0;
    }

    /// Make room for at least `bits` more bits without reallocating.
    pub fn reserve_bits(&mut self, bits: u64) {
        let needed = words_for(self.cursor + bits);
        self.words.reserve(needed.saturating_sub(self.words.len()));
    }

    /// Little-endian bytes of the written bits, truncated to `byte_len()`.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut out: Vec<u8> = self.words.iter().flat_map(|w| w.to_le_bytes()).collect();
        out.truncate(self.byte_len());
        if let Some(last) = out.last_mut() {
            let tail = (self.cursor % 8) as u32;
            if tail != 0 {
                *last &= low_mask(tail) as u8;
            }
        }
        out
    }

    /// Append the low `bits` bits of `value`.
    ///
    /// `bits == 0` is a no-op. Widths above 64 write `value` in the first 64
    /// bits followed by zero bits.
    #[inline]
    pub fn write(&mut self, value: u64, bits: u32) {
        if bits == 0 {
            return;
        }
        if bits > WORD_BITS {
            self.write_wide(value, bits);
            return;
        }

        let value = value & low_mask(bits);
        let used = (self.cursor & USED_MASK) as u32;
        let free = WORD_BITS - used;
        let index = (self.cursor >> INDEX_SHIFT) as usize;

        let needed = words_for(self.cursor + u64::from(bits));
        if self.words.len() < needed {
            self.words.resize(needed, 0);
        }

        let word = &mut self.words[index];
        *word = (*word & low_mask(used)) | (value << used);

        if free < bits {
            self.words[index + 1] = value >> free;
        }

        self.cursor += u64::from(bits);
    }

    fn write_wide(&mut self, value: u64, bits: u32) {
        self.write(value, WORD_BITS);
        let mut rest = bits - WORD_BITS;
        while rest > 0 {
            let n = rest.min(WORD_BITS);
            self.write(0, n);
            rest -= n;
        }
    }
}

/// Words needed to hold `bits` bits.
#[inline]
pub(crate) fn words_for(bits: u64) -> usize {
    bits.div_ceil(u64::from(WORD_BITS)) as usize
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
