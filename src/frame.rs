// Self-describing container for one packed delta.
//
// The raw delta stream has no header and no terminator; a live transport
// carries the bit count and block sizes out of band. `Frame` bundles them so
// a delta can be stored in a file or sent over a byte channel on its own.
//
// Layout (little-endian):
//
//   magic        4 bytes   "SDLT"
//   version      1 byte    FRAME_VERSION
//   flags        1 byte    FrameFlags
//   offset block 1 byte
//   value block  1 byte
//   word count   4 bytes
//   bit count    8 bytes
//   [adler32]    4 bytes   if CHECKSUM: Adler-32 of the reconstructed words
//   payload      ceil(bit count / 8) bytes, LSB-first bit stream

use std::io::{self, Read, Write};

use bitflags::bitflags;
use log::debug;

use crate::bits::BitBuffer;
use crate::delta::config::{BlockSizeError, BlockSizes, max_packed_bits};
use crate::delta::{self, PackError, PackStats, UnpackError, Word};

pub const FRAME_MAGIC: [u8; 4] = *b"SDLT";
pub const FRAME_VERSION: u8 = 1;

/// Fixed header bytes before the optional checksum.
pub const HEADER_LEN: usize = 20;

bitflags! {
    /// Frame indicator flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FrameFlags: u8 {
        /// An Adler-32 of the reconstructed snapshot follows the header.
        const CHECKSUM = 1 << 0;
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid frame magic: {0:02X?}")]
    BadMagic([u8; 4]),
    #[error("unsupported frame version: {0}")]
    UnsupportedVersion(u8),
    #[error("invalid frame flag bits: {0:#04X}")]
    InvalidFlags(u8),
    #[error(transparent)]
    BlockSize(#[from] BlockSizeError),
    #[error("bit count {bits} exceeds the {max} bits {words} words can produce")]
    Oversized { bits: u64, max: u64, words: u32 },
    #[error(transparent)]
    Pack(#[from] PackError),
    #[error(transparent)]
    Unpack(#[from] UnpackError),
    #[error("frame holds {expected} words but baseline has {actual}")]
    WordCountMismatch { expected: u32, actual: usize },
    #[error("checksum mismatch: expected {expected:#010X}, got {actual:#010X}")]
    ChecksumMismatch { expected: u32, actual: u32 },
}

/// A packed delta plus everything needed to decode it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub sizes: BlockSizes,
    pub word_count: u32,
    /// Adler-32 of the words the delta reconstructs.
    pub checksum: Option<u32>,
    pub payload: BitBuffer,
}

impl Frame {
    /// Pack `current` against `baseline` into a new frame.
    pub fn pack(
        current: &[Word],
        baseline: &[Word],
        sizes: BlockSizes,
        checksum: bool,
    ) -> Result<(Self, PackStats), FrameError> {
        let (payload, stats) = delta::pack_to_buffer(current, baseline, sizes)?;
        let frame = Self {
            sizes,
            word_count: current.len() as u32,
            checksum: checksum.then(|| compute_adler32(current)),
            payload,
        };
        Ok((frame, stats))
    }

    /// Decode against `baseline`, verifying word count and checksum.
    pub fn unpack(&self, baseline: &[Word]) -> Result<Vec<Word>, FrameError> {
        if baseline.len() != self.word_count as usize {
            return Err(FrameError::WordCountMismatch {
                expected: self.word_count,
                actual: baseline.len(),
            });
        }
        let mut target = vec![0; baseline.len()];
        delta::unpack(
            &mut target,
            baseline,
            self.payload.bit_len(),
            self.payload.as_words(),
            self.sizes,
        )?;
        if let Some(expected) = self.checksum {
            let actual = compute_adler32(&target);
            if actual != expected {
                return Err(FrameError::ChecksumMismatch { expected, actual });
            }
        }
        Ok(target)
    }

    pub fn flags(&self) -> FrameFlags {
        let mut flags = FrameFlags::empty();
        flags.set(FrameFlags::CHECKSUM, self.checksum.is_some());
        flags
    }

    /// Total encoded size in bytes.
    pub fn encoded_len(&self) -> usize {
        let checksum_len = if self.checksum.is_some() { 4 } else { 0 };
        HEADER_LEN + checksum_len + self.payload.byte_len()
    }

    pub fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let mut header = [0u8; HEADER_LEN];
        header[0..4].copy_from_slice(&FRAME_MAGIC);
        header[4] = FRAME_VERSION;
        header[5] = self.flags().bits();
        header[6] = self.sizes.offset() as u8;
        header[7] = self.sizes.value() as u8;
        header[8..12].copy_from_slice(&self.word_count.to_le_bytes());
        header[12..20].copy_from_slice(&self.payload.bit_len().to_le_bytes());
        w.write_all(&header)?;

        if let Some(cksum) = self.checksum {
            w.write_all(&cksum.to_le_bytes())?;
        }
        w.write_all(&self.payload.to_le_bytes())
    }

    pub fn decode<R: Read>(r: &mut R) -> Result<Self, FrameError> {
        let mut header = [0u8; HEADER_LEN];
        r.read_exact(&mut header)?;

        let magic: [u8; 4] = [header[0], header[1], header[2], header[3]];
        if magic != FRAME_MAGIC {
            return Err(FrameError::BadMagic(magic));
        }
        if header[4] != FRAME_VERSION {
            return Err(FrameError::UnsupportedVersion(header[4]));
        }
        let flags = FrameFlags::from_bits(header[5]).ok_or(FrameError::InvalidFlags(header[5]))?;
        let sizes = BlockSizes::new(u32::from(header[6]), u32::from(header[7]))?;
        let word_count = u32::from_le_bytes([header[8], header[9], header[10], header[11]]);
        let mut bit_bytes = [0u8; 8];
        bit_bytes.copy_from_slice(&header[12..20]);
        let bit_count = u64::from_le_bytes(bit_bytes);

        let max = max_packed_bits(word_count as usize, sizes);
        if bit_count > max {
            return Err(FrameError::Oversized {
                bits: bit_count,
                max,
                words: word_count,
            });
        }

        let checksum = if flags.contains(FrameFlags::CHECKSUM) {
            let mut buf = [0u8; 4];
            r.read_exact(&mut buf)?;
            Some(u32::from_le_bytes(buf))
        } else {
            None
        };

        // Read incrementally so a forged header cannot force a huge allocation.
        let payload_len = bit_count.div_ceil(8);
        let mut payload = Vec::new();
        r.by_ref().take(payload_len).read_to_end(&mut payload)?;
        if (payload.len() as u64) < payload_len {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated frame payload").into());
        }
        debug!("frame: {word_count} words, {bit_count} bits, flags {flags:?}");

        Ok(Self {
            sizes,
            word_count,
            checksum,
            payload: BitBuffer::from_le_bytes(&payload, bit_count),
        })
    }
}

// ---------------------------------------------------------------------------
// Adler-32
// ---------------------------------------------------------------------------

/// Adler-32 over the little-endian bytes of `words`.
pub fn compute_adler32(words: &[Word]) -> u32 {
    let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
    #[cfg(feature = "adler32")]
    {
        let mut hasher = simd_adler32::Adler32::new();
        hasher.write(&bytes);
        hasher.finish()
    }
    #[cfg(not(feature = "adler32"))]
    {
        const MOD_ADLER: u32 = 65521;
        let mut a: u32 = 1;
        let mut b: u32 = 0;
        for &byte in &bytes {
            a = (a + u32::from(byte)) % MOD_ADLER;
            b = (b + a) % MOD_ADLER;
        }
        (b << 16) | a
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
