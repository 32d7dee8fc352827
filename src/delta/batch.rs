// Per-client batch packing.
//
// A server usually holds a different acknowledged baseline for each client
// but one current snapshot. Every (current, baseline) pair is independent,
// so the batch is packed with rayon, one output buffer per baseline.

use rayon::prelude::*;

use crate::bits::BitBuffer;

use super::Word;
use super::config::BlockSizes;
use super::pack::{PackError, PackStats, pack_to_buffer};

/// Pack `current` against each of `baselines`, preserving order.
///
/// Fails with the first error in baseline order if any pair is invalid.
pub fn pack_batch(
    current: &[Word],
    baselines: &[&[Word]],
    sizes: BlockSizes,
) -> Result<Vec<(BitBuffer, PackStats)>, PackError> {
    baselines
        .par_iter()
        .map(|baseline| pack_to_buffer(current, baseline, sizes))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::unpack::unpack;

    #[test]
    fn each_client_decodes_its_own_delta() {
        let current: Vec<Word> = (0..256).map(|i| i * 3).collect();
        let stale: Vec<Word> = (0..256).map(|i| if i % 7 == 0 { 0 } else { i * 3 }).collect();
        let fresh = current.clone();
        let zeros = vec![0; 256];
        let baselines: Vec<&[Word]> = vec![&stale, &fresh, &zeros];

        let packed = pack_batch(&current, &baselines, BlockSizes::DEFAULT).unwrap();
        assert_eq!(packed.len(), 3);
        assert_eq!(packed[1].1.changed, 0);

        for ((buf, _), baseline) in packed.iter().zip(&baselines) {
            let mut target = vec![0; 256];
            unpack(
                &mut target,
                baseline,
                buf.bit_len(),
                buf.as_words(),
                BlockSizes::DEFAULT,
            )
            .unwrap();
            assert_eq!(target, current);
        }
    }

    #[test]
    fn bad_baseline_fails_batch() {
        let current = [1, 2, 3];
        let short = [1, 2];
        let baselines: Vec<&[Word]> = vec![&current, &short];
        assert!(matches!(
            pack_batch(&current, &baselines, BlockSizes::DEFAULT),
            Err(PackError::LengthMismatch { .. })
        ));
    }
}
