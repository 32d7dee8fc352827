// Sparse delta encoder.
//
// Walks `current` and `baseline` in lockstep and, for every index whose
// words differ, appends one (gap, value) pair:
//
//   gap   = index - previous changed index (0 for the first pair at index 0),
//           as a 32-bit var-length integer with the offset block size
//   value = zigzag(current[i] - baseline[i]) widened to i64, as a 64-bit
//           var-length integer with the value block size
//
// Unchanged words cost nothing. There is no terminator: the decoder stops
// at the bit count recorded by the caller.

use log::{debug, trace};

use crate::bits::BitBuffer;
use crate::bits::varlen::{write_var_u32, write_var_u64, zigzag};

use super::Word;
use super::config::{BlockSizes, max_packed_bits};

/// Summary of one `pack` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackStats {
    /// Words compared.
    pub words: usize,
    /// Words that differed from the baseline (pairs emitted).
    pub changed: usize,
    /// Bits appended to the output buffer.
    pub bits: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PackError {
    #[error("current has {current} words but baseline has {baseline}")]
    LengthMismatch { current: usize, baseline: usize },
    #[error("{0} words exceed the 32-bit index range")]
    TooManyWords(usize),
}

/// Append the sparse delta of `current` against `baseline` to `out`.
///
/// Both slices must have the same length and describe the same fields at
/// every index. `out` is appended to; its existing contents are untouched.
pub fn pack(
    current: &[Word],
    baseline: &[Word],
    sizes: BlockSizes,
    out: &mut BitBuffer,
) -> Result<PackStats, PackError> {
    if current.len() != baseline.len() {
        return Err(PackError::LengthMismatch {
            current: current.len(),
            baseline: baseline.len(),
        });
    }
    if u32::try_from(current.len()).is_err() {
        return Err(PackError::TooManyWords(current.len()));
    }

    let start = out.bit_len();
    let mut last = 0usize;
    let mut changed = 0usize;

    for (i, (&cur, &base)) in current.iter().zip(baseline).enumerate() {
        if cur == base {
            continue;
        }
        let d = i64::from(cur) - i64::from(base);
        let gap = (i - last) as u32;

        write_var_u32(out, gap, sizes.offset());
        write_var_u64(out, zigzag(d), sizes.value());
        trace!("pack: index {i} gap {gap} delta {d}");

        last = i;
        changed += 1;
    }

    let stats = PackStats {
        words: current.len(),
        changed,
        bits: out.bit_len() - start,
    };
    debug!(
        "pack: {} of {} words changed, {} bits",
        stats.changed, stats.words, stats.bits
    );
    Ok(stats)
}

/// Pack into a fresh buffer pre-sized for the worst case.
pub fn pack_to_buffer(
    current: &[Word],
    baseline: &[Word],
    sizes: BlockSizes,
) -> Result<(BitBuffer, PackStats), PackError> {
    let mut out = BitBuffer::with_capacity_bits(max_packed_bits(current.len(), sizes));
    let stats = pack(current, baseline, sizes, &mut out)?;
    Ok((out, stats))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
