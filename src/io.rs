// File-level helpers for snapshot deltas.
//
// Snapshots on disk are raw little-endian `i32` words with no header.
// Deltas on disk are single `Frame`s.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use crate::delta::config::BlockSizes;
use crate::delta::{PackError, Word};
use crate::frame::{Frame, FrameError};

// ---------------------------------------------------------------------------
// Options / stats
// ---------------------------------------------------------------------------

/// Options for `pack_file`.
#[derive(Debug, Clone, Copy)]
pub struct PackOptions {
    pub sizes: BlockSizes,
    /// Store an Adler-32 of the current snapshot in the frame.
    pub checksum: bool,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            sizes: BlockSizes::DEFAULT,
            checksum: true,
        }
    }
}

/// Statistics returned by `pack_file()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackFileStats {
    /// Words per snapshot.
    pub words: usize,
    /// Words that differ from the baseline.
    pub changed: usize,
    /// Bits in the delta stream.
    pub bits: u64,
    /// Bytes written to the delta file, header included.
    pub delta_size: u64,
}

/// Statistics returned by `unpack_file()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnpackFileStats {
    pub words: usize,
    pub delta_size: u64,
    pub output_size: u64,
    /// Whether a stored checksum was verified.
    pub verified: bool,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("{path}: {len} bytes is not a whole number of 32-bit words")]
    Misaligned { path: String, len: usize },
    #[error("pack error: {0}")]
    Pack(#[from] PackError),
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
}

// ---------------------------------------------------------------------------
// Snapshot files
// ---------------------------------------------------------------------------

/// Decode raw little-endian words.
pub fn words_from_le_bytes(bytes: &[u8]) -> Option<Vec<Word>> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(4)
            .map(|c| Word::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
    )
}

/// Encode words as raw little-endian bytes.
pub fn words_to_le_bytes(words: &[Word]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

/// Read a snapshot file.
pub fn read_words(path: &Path) -> Result<Vec<Word>, IoError> {
    let bytes = std::fs::read(path)?;
    words_from_le_bytes(&bytes).ok_or_else(|| IoError::Misaligned {
        path: path.display().to_string(),
        len: bytes.len(),
    })
}

/// Write a snapshot file.
pub fn write_words(path: &Path, words: &[Word]) -> Result<(), IoError> {
    std::fs::write(path, words_to_le_bytes(words))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// pack_file / unpack_file
// ---------------------------------------------------------------------------

/// Pack `current_path` against `baseline_path`, writing a frame to `delta_path`.
pub fn pack_file(
    baseline_path: &Path,
    current_path: &Path,
    delta_path: &Path,
    opts: PackOptions,
) -> Result<PackFileStats, IoError> {
    let baseline = read_words(baseline_path)?;
    let current = read_words(current_path)?;
    let (frame, stats) = Frame::pack(&current, &baseline, opts.sizes, opts.checksum)?;

    let mut w = BufWriter::new(File::create(delta_path)?);
    frame.encode(&mut w)?;
    w.flush()?;

    Ok(PackFileStats {
        words: stats.words,
        changed: stats.changed,
        bits: stats.bits,
        delta_size: frame.encoded_len() as u64,
    })
}

/// Apply the frame in `delta_path` to `baseline_path`, writing the result.
pub fn unpack_file(
    baseline_path: &Path,
    delta_path: &Path,
    output_path: &Path,
) -> Result<UnpackFileStats, IoError> {
    let baseline = read_words(baseline_path)?;
    let delta_file = File::open(delta_path)?;
    let delta_size = delta_file.metadata()?.len();
    let frame = Frame::decode(&mut BufReader::new(delta_file))?;
    let target = frame.unpack(&baseline)?;
    write_words(output_path, &target)?;

    Ok(UnpackFileStats {
        words: target.len(),
        delta_size,
        output_size: target.len() as u64 * 4,
        verified: frame.checksum.is_some(),
    })
}

/// Read a frame file.
pub fn read_frame(path: &Path) -> Result<Frame, IoError> {
    let file = File::open(path)?;
    Ok(Frame::decode(&mut BufReader::new(file))?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
