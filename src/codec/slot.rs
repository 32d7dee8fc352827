// Active-codec slot.
//
// Lifecycle: `install` once at startup, optionally `override_pack` /
// `override_unpack` to layer a one-sided replacement over what is active,
// then read with `active` (or the `pack`/`unpack` shortcuts) on every tick.
// `teardown` empties the slot.
//
// Single writer: installation and overrides must finish before any tick
// thread starts reading. Reads take a shared lock and clone an `Arc`.

use std::sync::Arc;

use log::{info, warn};
use parking_lot::RwLock;

use super::{CodecError, DeltaCodec, OverrideCodec, Side, SparseCodec};
use crate::bits::BitBuffer;
use crate::delta::{PackStats, Word};

static GLOBAL: CodecSlot = CodecSlot::new();

/// The process-wide slot.
///
/// Prefer handing an explicit `CodecSlot` (or an `Arc<dyn DeltaCodec>`) to
/// the components that need it; the global exists for hosts that cannot
/// thread a handle through.
pub fn global() -> &'static CodecSlot {
    &GLOBAL
}

/// Holds at most one active codec.
pub struct CodecSlot {
    active: RwLock<Option<Arc<dyn DeltaCodec>>>,
}

impl CodecSlot {
    pub const fn new() -> Self {
        Self {
            active: parking_lot::const_rwlock(None),
        }
    }

    /// Install `codec`. Fails if a codec is already installed.
    pub fn install(&self, codec: Arc<dyn DeltaCodec>) -> Result<(), CodecError> {
        let mut active = self.active.write();
        if let Some(existing) = active.as_ref() {
            return Err(CodecError::AlreadyInstalled(existing.name().to_string()));
        }
        info!("delta codec installed: {}", codec.name());
        *active = Some(codec);
        Ok(())
    }

    /// Install the built-in sparse codec with default block sizes.
    pub fn install_default(&self) -> Result<(), CodecError> {
        self.install(Arc::new(SparseCodec::default()))
    }

    /// Replace the pack side of the active codec; unpack keeps going to it.
    pub fn override_pack(&self, replacement: Arc<dyn DeltaCodec>) -> Result<(), CodecError> {
        self.layer(Side::Pack, replacement)
    }

    /// Replace the unpack side of the active codec; pack keeps going to it.
    pub fn override_unpack(&self, replacement: Arc<dyn DeltaCodec>) -> Result<(), CodecError> {
        self.layer(Side::Unpack, replacement)
    }

    fn layer(&self, side: Side, replacement: Arc<dyn DeltaCodec>) -> Result<(), CodecError> {
        let mut active = self.active.write();
        let inner = active.take().ok_or(CodecError::NotInstalled)?;
        let layered = OverrideCodec::new(side, replacement, inner);
        info!("delta codec overridden: {}", layered.name());
        *active = Some(Arc::new(layered));
        Ok(())
    }

    /// The active codec.
    pub fn active(&self) -> Result<Arc<dyn DeltaCodec>, CodecError> {
        self.active.read().clone().ok_or(CodecError::NotInstalled)
    }

    pub fn is_installed(&self) -> bool {
        self.active.read().is_some()
    }

    /// Empty the slot, returning what was installed.
    pub fn teardown(&self) -> Option<Arc<dyn DeltaCodec>> {
        let previous = self.active.write().take();
        if let Some(codec) = &previous {
            warn!("delta codec removed: {}", codec.name());
        }
        previous
    }

    /// Pack through the active codec.
    pub fn pack(
        &self,
        current: &[Word],
        baseline: &[Word],
        out: &mut BitBuffer,
    ) -> Result<PackStats, CodecError> {
        self.active()?.pack(current, baseline, out)
    }

    /// Unpack through the active codec.
    pub fn unpack(
        &self,
        target: &mut [Word],
        baseline: &[Word],
        bit_count: u64,
        input: &[u64],
    ) -> Result<usize, CodecError> {
        self.active()?.unpack(target, baseline, bit_count, input)
    }
}

impl Default for CodecSlot {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::BlockSizes;

    /// Packs like the sparse codec but refuses to unpack.
    struct Marker;

    impl DeltaCodec for Marker {
        fn name(&self) -> &str {
            "marker"
        }

        fn pack(
            &self,
            current: &[Word],
            baseline: &[Word],
            out: &mut BitBuffer,
        ) -> Result<PackStats, CodecError> {
            SparseCodec::default().pack(current, baseline, out)
        }

        fn unpack(
            &self,
            _target: &mut [Word],
            _baseline: &[Word],
            _bit_count: u64,
            _input: &[u64],
        ) -> Result<usize, CodecError> {
            Err(CodecError::Rejected {
                codec: "marker".into(),
                message: "pack only".into(),
            })
        }
    }

    #[test]
    fn empty_slot_reports_not_installed() {
        let slot = CodecSlot::new();
        assert!(!slot.is_installed());
        assert!(matches!(slot.active(), Err(CodecError::NotInstalled)));
        let mut buf = BitBuffer::new();
        assert!(matches!(
            slot.pack(&[1], &[0], &mut buf),
            Err(CodecError::NotInstalled)
        ));
        assert!(matches!(
            slot.override_pack(Arc::new(Marker)),
            Err(CodecError::NotInstalled)
        ));
    }

    #[test]
    fn install_is_exactly_once() {
        let slot = CodecSlot::new();
        slot.install_default().unwrap();
        let err = slot
            .install(Arc::new(SparseCodec::new(BlockSizes::new(2, 4).unwrap())))
            .unwrap_err();
        assert!(matches!(err, CodecError::AlreadyInstalled(name) if name == "sparse"));
    }

    #[test]
    fn pack_override_keeps_previous_unpack() {
        let slot = CodecSlot::new();
        slot.install_default().unwrap();
        slot.override_pack(Arc::new(Marker)).unwrap();
        assert_eq!(slot.active().unwrap().name(), "marker(pack)+sparse(unpack)");

        let baseline = [5, 5, 5];
        let current = [5, 6, 5];
        let mut buf = BitBuffer::new();
        slot.pack(&current, &baseline, &mut buf).unwrap();
        let mut target = [0; 3];
        slot.unpack(&mut target, &baseline, buf.bit_len(), buf.as_words()).unwrap();
        assert_eq!(target, current);
    }

    #[test]
    fn unpack_override_replaces_decoder() {
        let slot = CodecSlot::new();
        slot.install_default().unwrap();
        slot.override_unpack(Arc::new(Marker)).unwrap();
        let mut target = [0; 1];
        assert!(matches!(
            slot.unpack(&mut target, &[0], 0, &[]),
            Err(CodecError::Rejected { .. })
        ));
    }

    #[test]
    fn teardown_allows_reinstall() {
        let slot = CodecSlot::new();
        slot.install_default().unwrap();
        let removed = slot.teardown().unwrap();
        assert_eq!(removed.name(), "sparse");
        assert!(slot.teardown().is_none());
        slot.install(Arc::new(Marker)).unwrap();
        assert_eq!(slot.active().unwrap().name(), "marker");
    }
}
