//! Snapdelta: sparse bit-packed deltas between fixed-size word snapshots.
//!
//! The crate provides:
//! - Bit-level primitives: a little-endian bit buffer, a reader, a
//!   highest-set-bit finder and block-wise variable-length integers (`bits`)
//! - Delta pack/unpack between a snapshot and its baseline (`delta`)
//! - A replaceable codec slot with one-sided overrides (`codec`)
//! - A self-describing container for persisted deltas (`frame`)
//! - File-oriented helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```
//! use snapdelta::bits::BitBuffer;
//! use snapdelta::delta::{self, BlockSizes};
//!
//! let baseline = [10, 20, 30, 40];
//! let current = [10, 25, 30, 39];
//!
//! let mut buf = BitBuffer::new();
//! let stats = delta::pack(&current, &baseline, BlockSizes::DEFAULT, &mut buf).unwrap();
//! assert_eq!(stats.changed, 2);
//!
//! let mut target = [0; 4];
//! delta::unpack(&mut target, &baseline, buf.bit_len(), buf.as_words(), BlockSizes::DEFAULT)
//!     .unwrap();
//! assert_eq!(target, current);
//! ```

pub mod bits;
pub mod codec;
pub mod delta;
pub mod frame;
pub mod io;

#[cfg(feature = "cli")]
pub mod cli;

pub use bits::BitBuffer;
pub use codec::{CodecError, CodecSlot, DeltaCodec, SparseCodec};
pub use delta::{BlockSizes, Word};
pub use frame::Frame;
