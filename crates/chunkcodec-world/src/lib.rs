//! Chunk codec: palettes, packed block indices, biomes and version dispatch.

pub mod biome;
pub mod bitpack;
pub mod block;
pub mod chunk;
pub mod config;
pub mod error;
pub mod format;
pub mod palette;
pub mod section;
pub mod serializer;
pub mod storage;
pub mod version;

pub use block::BlockState;
pub use chunk::{BlockPos, ChunkData};
pub use config::{ChunkConfig, ConfigError};
pub use error::{ChunkError, PackError};
pub use format::{FormatResolver, FormatRules, ResolvedFormat};
pub use storage::{load_chunk, save_chunk, ChunkIo, NbtBytesIo, NbtFileIo};
pub use version::{DataVersionTable, GameVersion};
