// Sparse snapshot delta codec.
//
// Encodes only the words of a snapshot that differ from a shared baseline,
// as a stream of (gap, zigzag delta) pairs built on `bits::varlen`.
//
// # Modules
//
// - `config`: block sizes, named profiles, worst-case sizing
// - `pack`  : encoder: current + baseline -> bit stream
// - `unpack`: decoder: baseline + bit stream -> current, pair iterator
// - `batch` : one snapshot against many per-client baselines (`parallel`)

#[cfg(feature = "parallel")]
pub mod batch;
pub mod config;
pub mod pack;
pub mod unpack;

/// One fixed-width field of a serialized snapshot.
pub type Word = i32;

pub use config::{BlockSizeError, BlockSizes, max_packed_bits};
pub use pack::{PackError, PackStats, pack, pack_to_buffer};
pub use unpack::{DeltaPair, DeltaPairs, UnpackError, pairs, unpack, unpack_in_place};
