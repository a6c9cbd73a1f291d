//! Chunk codec errors.

use chunkcodec_nbt::NbtError;
use thiserror::Error;

use crate::config::ConfigError;

/// Failures of the bit-packed index and nibble codecs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackError {
    #[error("packed data too short: need {needed} words, have {got}")]
    TruncatedInput { needed: usize, got: usize },

    #[error("invalid input length: {0}")]
    InvalidLength(usize),

    #[error("bit width {0} outside 1..=32")]
    InvalidBitWidth(u32),

    #[error("value {value} does not fit in {bit_width} bits")]
    ValueTooWide { value: u32, bit_width: u32 },
}

#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("malformed chunk tree: {0}")]
    MalformedTree(#[from] NbtError),

    #[error("section {index}: {source}")]
    Section {
        index: i8,
        #[source]
        source: PackError,
    },

    #[error("section {section}: palette index {index} out of range (palette has {palette_len} entries)")]
    IndexOutOfRange {
        section: i8,
        index: u32,
        palette_len: usize,
    },

    #[error("section {section}: palette is full")]
    PaletteFull { section: i8 },

    #[error("biomes: {0}")]
    Biomes(#[source] PackError),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("unsupported format version: {0}")]
    UnsupportedVersion(String),

    #[error("invalid data version table: {0}")]
    InvalidVersionTable(String),

    #[error("chunk I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
