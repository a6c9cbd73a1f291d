//! Boundary between chunk trees and whatever holds their bytes.
//!
//! Region files, sector allocation and compression live outside this crate.
//! A [`ChunkIo`] hands over one chunk's root compound and takes it back.

use std::path::PathBuf;

use bytes::{Bytes, BytesMut};
use chunkcodec_nbt::{read_nbt_be, write_nbt_be, NbtCompound, NbtRoot};
use tracing::debug;

use crate::chunk::ChunkData;
use crate::config::ChunkConfig;
use crate::error::ChunkError;
use crate::format::FormatResolver;
use crate::serializer::{read_chunk, write_chunk};
use crate::version::GameVersion;

/// Source and sink of a single chunk's root compound.
pub trait ChunkIo {
    fn read_root_compound(&mut self) -> Result<NbtCompound, ChunkError>;
    fn write_root_compound(&mut self, root: NbtCompound) -> Result<(), ChunkError>;
}

/// Uncompressed big-endian NBT held in memory.
#[derive(Debug, Clone, Default)]
pub struct NbtBytesIo {
    data: Bytes,
    root_name: String,
}

impl NbtBytesIo {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            root_name: String::new(),
        }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

impl ChunkIo for NbtBytesIo {
    fn read_root_compound(&mut self) -> Result<NbtCompound, ChunkError> {
        let mut buf = self.data.clone();
        let root = read_nbt_be(&mut buf)?;
        self.root_name = root.name;
        Ok(root.compound)
    }

    fn write_root_compound(&mut self, root: NbtCompound) -> Result<(), ChunkError> {
        let mut buf = BytesMut::new();
        write_nbt_be(&mut buf, &NbtRoot::new(self.root_name.clone(), root))?;
        self.data = buf.freeze();
        Ok(())
    }
}

/// Uncompressed big-endian NBT in a file on disk.
#[derive(Debug, Clone)]
pub struct NbtFileIo {
    path: PathBuf,
}

impl NbtFileIo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ChunkIo for NbtFileIo {
    fn read_root_compound(&mut self) -> Result<NbtCompound, ChunkError> {
        let data = std::fs::read(&self.path)?;
        NbtBytesIo::new(data).read_root_compound()
    }

    fn write_root_compound(&mut self, root: NbtCompound) -> Result<(), ChunkError> {
        let mut io = NbtBytesIo::default();
        io.write_root_compound(root)?;
        std::fs::write(&self.path, io.bytes())?;
        Ok(())
    }
}

pub fn load_chunk(
    io: &mut impl ChunkIo,
    resolver: &FormatResolver<'_>,
    config: &ChunkConfig,
) -> Result<ChunkData, ChunkError> {
    let root = io.read_root_compound()?;
    read_chunk(root, resolver, config)
}

/// Write `chunk` in the format of `version`.
pub fn save_chunk(
    io: &mut impl ChunkIo,
    chunk: &ChunkData,
    resolver: &FormatResolver<'_>,
    version: GameVersion,
) -> Result<(), ChunkError> {
    let target = resolver.resolve_version(version)?;
    let root = write_chunk(chunk, &target)?;
    debug!("Saving chunk {:?} as {version}", chunk.position());
    io.write_root_compound(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockState;

    fn config() -> ChunkConfig {
        ChunkConfig::default()
    }

    #[test]
    fn save_then_load_through_bytes() {
        let resolver = FormatResolver::builtin();
        let version = config().target_version().unwrap();
        let target = resolver.resolve_version(version).unwrap();
        let mut chunk = ChunkData::new(target.rules, std::sync::Arc::new(BlockState::new("stone")));
        chunk.set_position(-2, 5);
        chunk.set_block_at(8, 64, 8, BlockState::new("diamond_ore")).unwrap();
        chunk.set_biome_at(0, 0, 3);

        let mut io = NbtBytesIo::default();
        save_chunk(&mut io, &chunk, &resolver, version).unwrap();
        assert!(!io.bytes().is_empty());
        // TAG_Compound with an empty root name
        assert_eq!(&io.bytes()[..3], &[10, 0, 0]);

        let loaded = load_chunk(&mut io, &resolver, &config()).unwrap();
        assert_eq!(loaded.position(), Some((-2, 5)));
        assert_eq!(loaded.get_block_at(8, 64, 8).id(), "minecraft:diamond_ore");
        assert_eq!(loaded.highest_block_at(8, 8), Some(64));
    }

    #[test]
    fn root_name_is_preserved() {
        let mut buf = BytesMut::new();
        let mut level = NbtCompound::new();
        level.set("xPos", 1);
        level.set("zPos", 2);
        let mut root = NbtCompound::new();
        root.set("DataVersion", 2586);
        root.set("Level", level);
        write_nbt_be(&mut buf, &NbtRoot::new("chunk", root)).unwrap();

        let resolver = FormatResolver::builtin();
        let mut io = NbtBytesIo::new(buf.freeze());
        let chunk = load_chunk(&mut io, &resolver, &config()).unwrap();
        save_chunk(&mut io, &chunk, &resolver, GameVersion::release_1(16, 5)).unwrap();

        let mut bytes = io.into_bytes();
        let reread = read_nbt_be(&mut bytes).unwrap();
        assert_eq!(reread.name, "chunk");
        let level = reread.compound.get_compound("Level").unwrap();
        assert_eq!(level.get_int("xPos").unwrap(), 1);
    }

    #[test]
    fn garbage_bytes_are_a_malformed_tree() {
        let mut io = NbtBytesIo::new(vec![10u8, 0]);
        let err = load_chunk(&mut io, &FormatResolver::builtin(), &config()).unwrap_err();
        assert!(matches!(err, ChunkError::MalformedTree(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let mut io = NbtFileIo::new("/nonexistent/chunk.nbt");
        let err = load_chunk(&mut io, &FormatResolver::builtin(), &config()).unwrap_err();
        assert!(matches!(err, ChunkError::Io(_)));
    }

    #[test]
    fn file_roundtrip() {
        let path = std::env::temp_dir().join(format!("chunkcodec-{}.nbt", std::process::id()));
        let resolver = FormatResolver::builtin();
        let version = GameVersion::release_1(17, 1);
        let target = resolver.resolve_version(version).unwrap();
        let mut chunk = ChunkData::new(target.rules, std::sync::Arc::new(BlockState::new("stone")));
        chunk.set_block_at(0, -30, 0, BlockState::new("deepslate")).unwrap();

        let mut io = NbtFileIo::new(&path);
        save_chunk(&mut io, &chunk, &resolver, version).unwrap();
        let loaded = load_chunk(&mut io, &resolver, &config()).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.get_block_at(0, -30, 0).id(), "minecraft:deepslate");
        assert_eq!(loaded.section_range(), Some((-2, -2)));
    }
}
