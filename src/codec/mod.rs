// Codec registration seam.
//
// A transport layer talks to the delta codec through the `DeltaCodec` trait
// so the implementation can be swapped at startup:
//
// - `SparseCodec`  : the built-in (gap, zigzag delta) codec
// - `OverrideCodec`: replaces one side (pack or unpack) of an existing codec
//                     and forwards the other side to it
// - `CodecSlot`    : holds the active codec; pass one around explicitly, or
//                     use the process-wide slot from `global()`

pub mod layered;
pub mod slot;

pub use layered::{OverrideCodec, Side};
pub use slot::{CodecSlot, global};

use crate::bits::BitBuffer;
use crate::delta::config::BlockSizes;
use crate::delta::{self, PackError, PackStats, UnpackError, Word};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error(transparent)]
    Pack(#[from] PackError),
    #[error(transparent)]
    Unpack(#[from] UnpackError),
    /// No codec has been installed in the slot.
    #[error("no delta codec installed")]
    NotInstalled,
    /// The slot already holds a codec; wrap it with an override instead.
    #[error("delta codec '{0}' is already installed")]
    AlreadyInstalled(String),
    /// A custom codec refused its input.
    #[error("{codec}: {message}")]
    Rejected { codec: String, message: String },
}

// ---------------------------------------------------------------------------
// DeltaCodec trait
// ---------------------------------------------------------------------------

/// A pack/unpack pair for sparse snapshot deltas.
///
/// # Implementing a custom codec
///
/// ```no_run
/// use snapdelta::bits::BitBuffer;
/// use snapdelta::codec::{CodecError, DeltaCodec};
/// use snapdelta::delta::{PackStats, Word};
///
/// struct Verbatim;
///
/// impl DeltaCodec for Verbatim {
///     fn name(&self) -> &str { "verbatim" }
///     fn pack(&self, current: &[Word], _baseline: &[Word], out: &mut BitBuffer)
///         -> Result<PackStats, CodecError>
///     {
///         let start = out.bit_len();
///         for &w in current {
///             out.write(w as u32 as u64, 32);
///         }
///         Ok(PackStats { words: current.len(), changed: current.len(), bits: out.bit_len() - start })
///     }
///     fn unpack(&self, _target: &mut [Word], _baseline: &[Word], _bit_count: u64, _input: &[u64])
///         -> Result<usize, CodecError>
///     {
///         Err(CodecError::Rejected { codec: "verbatim".into(), message: "pack only".into() })
///     }
/// }
/// ```
pub trait DeltaCodec: Send + Sync {
    /// Short name for logs and diagnostics.
    fn name(&self) -> &str;

    /// Append the delta of `current` against `baseline` to `out`.
    fn pack(
        &self,
        current: &[Word],
        baseline: &[Word],
        out: &mut BitBuffer,
    ) -> Result<PackStats, CodecError>;

    /// Rebuild `target` from `baseline` and the first `bit_count` bits of
    /// `input`. Returns the number of changed words.
    fn unpack(
        &self,
        target: &mut [Word],
        baseline: &[Word],
        bit_count: u64,
        input: &[u64],
    ) -> Result<usize, CodecError>;
}

// ---------------------------------------------------------------------------
// Built-in codec
// ---------------------------------------------------------------------------

/// The built-in sparse codec with fixed block sizes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SparseCodec {
    sizes: BlockSizes,
}

impl SparseCodec {
    pub fn new(sizes: BlockSizes) -> Self {
        Self { sizes }
    }

    pub fn sizes(&self) -> BlockSizes {
        self.sizes
    }
}

impl DeltaCodec for SparseCodec {
    fn name(&self) -> &str {
        "sparse"
    }

    fn pack(
        &self,
        current: &[Word],
        baseline: &[Word],
        out: &mut BitBuffer,
    ) -> Result<PackStats, CodecError> {
        Ok(delta::pack(current, baseline, self.sizes, out)?)
    }

    fn unpack(
        &self,
        target: &mut [Word],
        baseline: &[Word],
        bit_count: u64,
        input: &[u64],
    ) -> Result<usize, CodecError> {
        Ok(delta::unpack(target, baseline, bit_count, input, self.sizes)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_codec_roundtrip_through_trait_object() {
        let codec: Box<dyn DeltaCodec> = Box::new(SparseCodec::default());
        let baseline = [1, 2, 3, 4];
        let current = [1, -2, 3, 40];
        let mut buf = BitBuffer::new();
        let stats = codec.pack(&current, &baseline, &mut buf).unwrap();
        assert_eq!(stats.changed, 2);

        let mut target = [0; 4];
        let n = codec
            .unpack(&mut target, &baseline, buf.bit_len(), buf.as_words())
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(target, current);
    }

    #[test]
    fn errors_surface_through_codec() {
        let codec = SparseCodec::default();
        let mut buf = BitBuffer::new();
        let err = codec.pack(&[1], &[1, 2], &mut buf).unwrap_err();
        assert!(matches!(err, CodecError::Pack(PackError::LengthMismatch { .. })));
    }
}
