// One-sided codec override.
//
// Replacing a codec often only concerns one direction, e.g. a faster packer
// while peers keep decoding with the stock decoder. `OverrideCodec` holds
// the codec it replaces and forwards the side it does not override.

use std::sync::Arc;

use super::{CodecError, DeltaCodec};
use crate::bits::BitBuffer;
use crate::delta::{PackStats, Word};

/// Which side of the wrapped codec is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Pack,
    Unpack,
}

/// Decorator: `replacement` handles `side`, `inner` handles the other one.
pub struct OverrideCodec {
    replacement: Arc<dyn DeltaCodec>,
    inner: Arc<dyn DeltaCodec>,
    side: Side,
    name: String,
}

impl OverrideCodec {
    pub fn new(side: Side, replacement: Arc<dyn DeltaCodec>, inner: Arc<dyn DeltaCodec>) -> Self {
        let name = match side {
            Side::Pack => format!("{}(pack)+{}(unpack)", replacement.name(), inner.name()),
            Side::Unpack => format!("{}(pack)+{}(unpack)", inner.name(), replacement.name()),
        };
        Self {
            replacement,
            inner,
            side,
            name,
        }
    }

    /// Pack with `replacement`, unpack with `inner`.
    pub fn pack_with(replacement: Arc<dyn DeltaCodec>, inner: Arc<dyn DeltaCodec>) -> Self {
        Self::new(Side::Pack, replacement, inner)
    }

    /// Unpack with `replacement`, pack with `inner`.
    pub fn unpack_with(replacement: Arc<dyn DeltaCodec>, inner: Arc<dyn DeltaCodec>) -> Self {
        Self::new(Side::Unpack, replacement, inner)
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// The codec that was active before this override.
    pub fn inner(&self) -> &Arc<dyn DeltaCodec> {
        &self.inner
    }

    fn packer(&self) -> &dyn DeltaCodec {
        match self.side {
            Side::Pack => self.replacement.as_ref(),
            Side::Unpack => self.inner.as_ref(),
        }
    }

    fn unpacker(&self) -> &dyn DeltaCodec {
        match self.side {
            Side::Pack => self.inner.as_ref(),
            Side::Unpack => self.replacement.as_ref(),
        }
    }
}

impl DeltaCodec for OverrideCodec {
    fn name(&self) -> &str {
        &self.name
    }

    fn pack(
        &self,
        current: &[Word],
        baseline: &[Word],
        out: &mut BitBuffer,
    ) -> Result<PackStats, CodecError> {
        self.packer().pack(current, baseline, out)
    }

    fn unpack(
        &self,
        target: &mut [Word],
        baseline: &[Word],
        bit_count: u64,
        input: &[u64],
    ) -> Result<usize, CodecError> {
        self.unpacker().unpack(target, baseline, bit_count, input)
    }
}

impl std::fmt::Debug for OverrideCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverrideCodec")
            .field("name", &self.name)
            .field("side", &self.side)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::SparseCodec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls, then delegates to a sparse codec.
    #[derive(Default)]
    struct Counting {
        packs: AtomicUsize,
        unpacks: AtomicUsize,
        base: SparseCodec,
    }

    impl DeltaCodec for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        fn pack(
            &self,
            current: &[Word],
            baseline: &[Word],
            out: &mut BitBuffer,
        ) -> Result<PackStats, CodecError> {
            self.packs.fetch_add(1, Ordering::Relaxed);
            self.base.pack(current, baseline, out)
        }

        fn unpack(
            &self,
            target: &mut [Word],
            baseline: &[Word],
            bit_count: u64,
            input: &[u64],
        ) -> Result<usize, CodecError> {
            self.unpacks.fetch_add(1, Ordering::Relaxed);
            self.base.unpack(target, baseline, bit_count, input)
        }
    }

    #[test]
    fn pack_override_delegates_unpack() {
        let replacement = Arc::new(Counting::default());
        let inner = Arc::new(Counting::default());
        let codec = OverrideCodec::pack_with(replacement.clone(), inner.clone());

        let baseline = [0, 0, 0];
        let current = [0, 9, 0];
        let mut buf = BitBuffer::new();
        codec.pack(&current, &baseline, &mut buf).unwrap();
        let mut target = [0; 3];
        codec
            .unpack(&mut target, &baseline, buf.bit_len(), buf.as_words())
            .unwrap();

        assert_eq!(target, current);
        assert_eq!(replacement.packs.load(Ordering::Relaxed), 1);
        assert_eq!(replacement.unpacks.load(Ordering::Relaxed), 0);
        assert_eq!(inner.packs.load(Ordering::Relaxed), 0);
        assert_eq!(inner.unpacks.load(Ordering::Relaxed), 1);
        assert_eq!(codec.name(), "counting(pack)+counting(unpack)");
    }

    #[test]
    fn unpack_override_delegates_pack() {
        let replacement = Arc::new(Counting::default());
        let inner = Arc::new(Counting::default());
        let codec = OverrideCodec::unpack_with(replacement.clone(), inner.clone());

        let mut buf = BitBuffer::new();
        codec.pack(&[1], &[0], &mut buf).unwrap();
        let mut target = [0; 1];
        codec
            .unpack(&mut target, &[0], buf.bit_len(), buf.as_words())
            .unwrap();

        assert_eq!(inner.packs.load(Ordering::Relaxed), 1);
        assert_eq!(replacement.unpacks.load(Ordering::Relaxed), 1);
        assert_eq!(codec.side(), Side::Unpack);
    }
}
