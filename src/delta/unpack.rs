// Sparse delta decoder.
//
// Reads (gap, value) pairs in stream order until the caller-supplied bit
// count is used up. Gaps accumulate onto the previous changed index; the
// zigzag value is inverted to the signed difference and added to the
// baseline word. Indices never visited keep their baseline value.
//
// The stream is not self-terminating, so the bit count must be exactly the
// one the encoder produced (`PackStats::bits` or `BitBuffer::bit_len`).

use log::{debug, trace};

use crate::bits::varlen::{read_var_u32, read_var_u64, unzigzag};
use crate::bits::{BitError, BitReader};

use super::Word;
use super::config::BlockSizes;

/// One decoded change: the word at `index` moved by `delta`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeltaPair {
    pub index: usize,
    pub delta: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UnpackError {
    #[error("target has {target} words but baseline has {baseline}")]
    LengthMismatch { target: usize, baseline: usize },
    #[error(transparent)]
    Bits(#[from] BitError),
    #[error("changed index {index} out of range for {len} words")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("zero gap after index {index} (indices must strictly increase)")]
    DuplicateIndex { index: usize },
    #[error("word {index} decodes to {value}, outside the 32-bit range")]
    WordOverflow { index: usize, value: i64 },
}

// ---------------------------------------------------------------------------
// Pair iterator
// ---------------------------------------------------------------------------

/// Iterate over the (index, delta) pairs of a packed stream.
///
/// Yields an error at most once, then stops.
pub struct DeltaPairs<'a> {
    reader: BitReader<'a>,
    sizes: BlockSizes,
    last: Option<usize>,
    failed: bool,
}

impl<'a> DeltaPairs<'a> {
    pub fn new(words: &'a [u64], bit_count: u64, sizes: BlockSizes) -> Result<Self, UnpackError> {
        Ok(Self {
            reader: BitReader::new(words, bit_count)?,
            sizes,
            last: None,
            failed: false,
        })
    }

    /// Bit position of the next pair.
    pub fn position(&self) -> u64 {
        self.reader.position()
    }

    fn next_pair(&mut self) -> Result<DeltaPair, UnpackError> {
        let gap = read_var_u32(&mut self.reader, self.sizes.offset())? as usize;
        let index = match self.last {
            None => gap,
            Some(prev) if gap == 0 => return Err(UnpackError::DuplicateIndex { index: prev }),
            Some(prev) => prev.saturating_add(gap),
        };
        let delta = unzigzag(read_var_u64(&mut self.reader, self.sizes.value())?);
        self.last = Some(index);
        Ok(DeltaPair { index, delta })
    }
}

impl Iterator for DeltaPairs<'_> {
    type Item = Result<DeltaPair, UnpackError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.reader.is_exhausted() {
            return None;
        }
        let item = self.next_pair();
        self.failed = item.is_err();
        Some(item)
    }
}

// ---------------------------------------------------------------------------
// Decoding into word arrays
// ---------------------------------------------------------------------------

/// Reconstruct `target` from `baseline` plus the packed delta.
///
/// Returns the number of changed words applied. On error the contents of
/// `target` are unspecified.
pub fn unpack(
    target: &mut [Word],
    baseline: &[Word],
    bit_count: u64,
    input: &[u64],
    sizes: BlockSizes,
) -> Result<usize, UnpackError> {
    if target.len() != baseline.len() {
        return Err(UnpackError::LengthMismatch {
            target: target.len(),
            baseline: baseline.len(),
        });
    }
    target.copy_from_slice(baseline);
    unpack_in_place(target, bit_count, input, sizes)
}

/// Apply a packed delta to `words`, which must hold the baseline on entry.
pub fn unpack_in_place(
    words: &mut [Word],
    bit_count: u64,
    input: &[u64],
    sizes: BlockSizes,
) -> Result<usize, UnpackError> {
    let len = words.len();
    let mut applied = 0usize;

    for pair in DeltaPairs::new(input, bit_count, sizes)? {
        let DeltaPair { index, delta } = pair?;
        let slot = words
            .get_mut(index)
            .ok_or(UnpackError::IndexOutOfRange { index, len })?;
        let value = i64::from(*slot) + delta;
        *slot = Word::try_from(value).map_err(|_| UnpackError::WordOverflow { index, value })?;
        trace!("unpack: index {index} delta {delta}");
        applied += 1;
    }

    debug!("unpack: {applied} of {len} words changed, {bit_count} bits");
    Ok(applied)
}

/// Collect all pairs of a packed stream.
pub fn pairs(
    input: &[u64],
    bit_count: u64,
    sizes: BlockSizes,
) -> Result<Vec<DeltaPair>, UnpackError> {
    DeltaPairs::new(input, bit_count, sizes)?.collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::BitBuffer;
    use crate::bits::varlen::{write_var_u32, write_var_u64, zigzag};
    use crate::delta::pack::pack;

    fn packed(current: &[Word], baseline: &[Word]) -> BitBuffer {
        let mut out = BitBuffer::new();
        pack(current, baseline, BlockSizes::DEFAULT, &mut out).unwrap();
        out
    }

    #[test]
    fn reconstructs_changed_word() {
        let current = [10, 20, 30];
        let baseline = [10, 25, 30];
        let buf = packed(&current, &baseline);
        let mut target = [0; 3];
        let n = unpack(
            &mut target,
            &baseline,
            buf.bit_len(),
            buf.as_words(),
            BlockSizes::DEFAULT,
        )
        .unwrap();
        assert_eq!(n, 1);
        assert_eq!(target, current);
    }

    #[test]
    fn empty_stream_leaves_baseline() {
        let baseline = [4, 5, 6];
        let mut target = [0; 3];
        let n = unpack(&mut target, &baseline, 0, &[], BlockSizes::DEFAULT).unwrap();
        assert_eq!(n, 0);
        assert_eq!(target, baseline);
    }

    #[test]
    fn pairs_report_indices_and_deltas() {
        let baseline = [0, 0, 0, 0, 0, 0];
        let current = [-3, 0, 0, 100, 0, i32::MIN];
        let buf = packed(&current, &baseline);
        let got = pairs(buf.as_words(), buf.bit_len(), BlockSizes::DEFAULT).unwrap();
        assert_eq!(
            got,
            vec![
                DeltaPair { index: 0, delta: -3 },
                DeltaPair { index: 3, delta: 100 },
                DeltaPair {
                    index: 5,
                    delta: i64::from(i32::MIN)
                },
            ]
        );
    }

    #[test]
    fn index_past_end_is_rejected() {
        let mut buf = BitBuffer::new();
        write_var_u32(&mut buf, 7, 4);
        write_var_u64(&mut buf, zigzag(1), 8);
        let mut words = [0; 4];
        assert_eq!(
            unpack_in_place(&mut words, buf.bit_len(), buf.as_words(), BlockSizes::DEFAULT),
            Err(UnpackError::IndexOutOfRange { index: 7, len: 4 })
        );
    }

    #[test]
    fn zero_gap_after_first_pair_is_rejected() {
        let mut buf = BitBuffer::new();
        write_var_u32(&mut buf, 1, 4);
        write_var_u64(&mut buf, zigzag(1), 8);
        write_var_u32(&mut buf, 0, 4);
        write_var_u64(&mut buf, zigzag(1), 8);
        let mut words = [0; 4];
        assert_eq!(
            unpack_in_place(&mut words, buf.bit_len(), buf.as_words(), BlockSizes::DEFAULT),
            Err(UnpackError::DuplicateIndex { index: 1 })
        );
    }

    #[test]
    fn out_of_range_word_is_rejected() {
        let mut buf = BitBuffer::new();
        write_var_u32(&mut buf, 0, 4);
        write_var_u64(&mut buf, zigzag(1), 8);
        let mut words = [i32::MAX];
        assert_eq!(
            unpack_in_place(&mut words, buf.bit_len(), buf.as_words(), BlockSizes::DEFAULT),
            Err(UnpackError::WordOverflow {
                index: 0,
                value: i64::from(i32::MAX) + 1
            })
        );
    }

    #[test]
    fn short_bit_count_is_truncated() {
        let buf = packed(&[1, 2, 3], &[0, 0, 0]);
        let mut target = [0; 3];
        let err = unpack(
            &mut target,
            &[0, 0, 0],
            buf.bit_len() - 1,
            buf.as_words(),
            BlockSizes::DEFAULT,
        )
        .unwrap_err();
        assert!(matches!(err, UnpackError::Bits(BitError::Truncated { .. })));
    }

    #[test]
    fn iterator_stops_after_error() {
        let words = [0u64];
        let mut it = DeltaPairs::new(&words, 64, BlockSizes::DEFAULT).unwrap();
        assert!(matches!(it.next(), Some(Err(_))));
        assert!(it.next().is_none());
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let mut target = [0; 2];
        assert_eq!(
            unpack(&mut target, &[0; 3], 0, &[], BlockSizes::DEFAULT),
            Err(UnpackError::LengthMismatch {
                target: 2,
                baseline: 3
            })
        );
    }
}
