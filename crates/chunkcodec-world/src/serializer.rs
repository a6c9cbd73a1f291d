//! Chunk tree reading and writing.
//!
//! A chunk tree looks like
//! `{DataVersion, Level: {xPos, zPos, Sections, Biomes, TileEntities, Entities}}`.
//! Sections come in two shapes: palette sections (`Palette` + packed
//! `BlockStates`) from 1.13 on, and numeric sections (`Blocks`, `Data`,
//! optional `Add`) before that.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chunkcodec_nbt::{NbtCompound, NbtList, NbtTag};
use tracing::{debug, trace, warn};

use crate::biome::{compress_biomes, expand_biomes, BiomeGrid};
use crate::bitpack::{self, SpanMode};
use crate::block::{shared_air, BlockState};
use crate::chunk::{BlockPos, ChunkData};
use crate::config::ChunkConfig;
use crate::error::{ChunkError, PackError};
use crate::format::{BiomeLayout, FormatResolver, FormatRules, ResolvedFormat};
use crate::palette::Palette;
use crate::section::{ChunkSection, BLOCKS_PER_SECTION};

const DATA_VERSION: &str = "DataVersion";
const LEVEL: &str = "Level";
const SECTIONS: &str = "Sections";
const BIOMES: &str = "Biomes";
const TILE_ENTITIES: &str = "TileEntities";
const ENTITIES: &str = "Entities";

const PALETTE: &str = "Palette";
const BLOCK_STATES: &str = "BlockStates";
const BLOCKS: &str = "Blocks";
const DATA: &str = "Data";
const ADD: &str = "Add";

/// Keys of a section entry that hold block data. Everything else in an
/// entry (lighting) is carried over on write.
const BLOCK_KEYS: [&str; 5] = [PALETTE, BLOCK_STATES, BLOCKS, DATA, ADD];

/// The compound holding the chunk's fields: `Level` if present, else the root.
pub(crate) fn level_of(root: &NbtCompound) -> &NbtCompound {
    root.try_get_compound(LEVEL).unwrap_or(root)
}

/// Decode a chunk tree. The tree is kept as the chunk's source so that
/// unmodelled keys survive a later [`write_chunk`].
pub fn read_chunk(
    root: NbtCompound,
    resolver: &FormatResolver<'_>,
    config: &ChunkConfig,
) -> Result<ChunkData, ChunkError> {
    let format = resolver.resolve(root.try_get_int(DATA_VERSION))?;
    let rules = format.rules;
    if rules.section_containers {
        return Err(ChunkError::UnsupportedVersion(format!(
            "{} stores per-section block and biome containers",
            format.version
        )));
    }
    debug!(
        "Reading chunk: data_version={:?} version={} numeric_ids={}",
        format.data_version, format.version, rules.numeric_block_ids
    );

    let mut chunk = ChunkData::new(rules, Arc::new(config.default_block_state()?));
    let level = level_of(&root);

    if let (Some(x), Some(z)) = (level.try_get_int("xPos"), level.try_get_int("zPos")) {
        chunk.set_position(x, z);
    }

    if let Some(sections) = level.try_get_list(SECTIONS) {
        for entry in sections.compounds() {
            let Some(y) = entry.try_get_byte("Y") else {
                debug!("Skipping section entry without Y");
                continue;
            };
            let decoded = if rules.numeric_block_ids {
                read_numeric_section(y, entry)
            } else {
                read_palette_section(y, entry, rules.span_mode())
            };
            match decoded {
                Ok(Some(section)) => {
                    chunk.sections.insert(y, section);
                }
                Ok(None) => trace!("Section {y} holds no block data"),
                Err(e) if config.skip_corrupt_sections && is_corrupt_data(&e) => {
                    warn!("Dropping corrupt section {y}: {e}");
                }
                Err(e) => return Err(e),
            }
        }
    }

    let biomes = match read_biomes(level, rules.biome_layout, config.default_biome) {
        Ok(grid) => grid,
        Err(e) if config.skip_corrupt_sections => {
            warn!("Ignoring corrupt biome data: {e}");
            BiomeGrid::filled(config.default_biome)
        }
        Err(e) => return Err(e),
    };
    chunk.set_biomes(biomes);

    if let Some(tiles) = level.try_get_list(TILE_ENTITIES) {
        for tile in tiles.compounds() {
            match (tile.try_get_int("x"), tile.try_get_int("y"), tile.try_get_int("z")) {
                (Some(x), Some(y), Some(z)) => {
                    chunk.set_tile_entity(BlockPos::new(x, y, z), tile.clone());
                }
                _ => warn!("Skipping tile entity without a position"),
            }
        }
    }
    if let Some(entities) = level.try_get_list(ENTITIES) {
        chunk.entities = entities.compounds().cloned().collect();
    }

    chunk.source = Some(root);
    Ok(chunk)
}

fn is_corrupt_data(err: &ChunkError) -> bool {
    matches!(
        err,
        ChunkError::Section { .. }
            | ChunkError::IndexOutOfRange { .. }
            | ChunkError::PaletteFull { .. }
            | ChunkError::MalformedTree(_)
    )
}

fn read_palette_section(
    y: i8,
    entry: &NbtCompound,
    mode: SpanMode,
) -> Result<Option<ChunkSection>, ChunkError> {
    let Some(entries) = entry.try_get_list(PALETTE) else {
        return Ok(None);
    };
    let mut palette = Palette::new();
    for state in entries.compounds() {
        if palette.is_full() {
            return Err(ChunkError::PaletteFull { section: y });
        }
        palette.push_raw(Arc::new(BlockState::from_palette_entry(state)?));
    }
    if palette.is_empty() {
        return Ok(None);
    }

    let words = entry.get_long_array(BLOCK_STATES)?;
    let indices = bitpack::unpack(words, palette.bit_width(), BLOCKS_PER_SECTION, mode)
        .map_err(|source| ChunkError::Section { index: y, source })?;

    let mut blocks = Box::new([0u16; BLOCKS_PER_SECTION]);
    for (slot, &index) in blocks.iter_mut().zip(&indices) {
        if index as usize >= palette.len() {
            return Err(ChunkError::IndexOutOfRange {
                section: y,
                index,
                palette_len: palette.len(),
            });
        }
        *slot = index as u16;
    }
    Ok(Some(ChunkSection::from_parts(palette, blocks)))
}

fn read_numeric_section(y: i8, entry: &NbtCompound) -> Result<Option<ChunkSection>, ChunkError> {
    let Some(ids) = entry.try_get_byte_array(BLOCKS) else {
        return Ok(None);
    };
    let section_err = |source| ChunkError::Section { index: y, source };
    if ids.len() != BLOCKS_PER_SECTION {
        return Err(section_err(PackError::InvalidLength(ids.len())));
    }
    let data = nibbles(entry.get_byte_array(DATA)?).map_err(section_err)?;
    let add = match entry.try_get_byte_array(ADD) {
        Some(add) => Some(nibbles(add).map_err(section_err)?),
        None => None,
    };

    let mut palette = Palette::new();
    palette.push_raw(shared_air());
    let mut seen: HashMap<(u16, u8), u16> = HashMap::new();
    seen.insert((0, 0), 0);

    let mut blocks = Box::new([0u16; BLOCKS_PER_SECTION]);
    for (i, slot) in blocks.iter_mut().enumerate() {
        let high = add.as_ref().map_or(0, |add| add[i] as u16);
        let id = (high << 8) | ids[i] as u8 as u16;
        let key = (id, data[i]);
        *slot = match seen.get(&key) {
            Some(&index) => index,
            None => {
                let index = palette
                    .get_or_add(BlockState::legacy(key.0, key.1))
                    .ok_or(ChunkError::PaletteFull { section: y })?;
                seen.insert(key, index);
                index
            }
        };
    }
    Ok(Some(ChunkSection::from_parts(palette, blocks)))
}

/// Unpack a 2048-byte nibble array to 4096 values.
fn nibbles(bytes: &[i8]) -> Result<Vec<u8>, PackError> {
    if bytes.len() != BLOCKS_PER_SECTION / 2 {
        return Err(PackError::InvalidLength(bytes.len()));
    }
    let bytes: Vec<u8> = bytes.iter().map(|&b| b as u8).collect();
    Ok(bitpack::extract_nibbles(&bytes))
}

fn read_biomes(
    level: &NbtCompound,
    layout: BiomeLayout,
    default_biome: i32,
) -> Result<BiomeGrid, ChunkError> {
    let ids: Vec<i32> = match level.try_get(BIOMES) {
        Some(NbtTag::IntArray(ids)) => ids.clone(),
        Some(NbtTag::ByteArray(ids)) => ids.iter().map(|&id| id as u8 as i32).collect(),
        Some(other) => {
            warn!("Ignoring Biomes of kind {}", other.kind());
            return Ok(BiomeGrid::filled(default_biome));
        }
        None => return Ok(BiomeGrid::filled(default_biome)),
    };
    if ids.is_empty() {
        return Ok(BiomeGrid::filled(default_biome));
    }
    let grid = match layout {
        BiomeLayout::Bytes2D | BiomeLayout::Ints2D => BiomeGrid::from_columns(&ids),
        BiomeLayout::Cells3D => expand_biomes(&ids),
    };
    grid.map_err(ChunkError::Biomes)
}

/// Encode a chunk for `target`.
///
/// The chunk's source tree, if any, is the starting point: section entries
/// keep their lighting arrays and unknown keys pass through untouched.
pub fn write_chunk(chunk: &ChunkData, target: &ResolvedFormat) -> Result<NbtCompound, ChunkError> {
    let rules = target.rules;
    if rules.section_containers {
        return Err(ChunkError::UnsupportedVersion(format!(
            "writing {} chunks is not supported",
            target.version
        )));
    }
    if rules.numeric_block_ids != chunk.numeric_block_ids() {
        return Err(ChunkError::UnsupportedOperation(format!(
            "cannot convert between numeric and namespaced block ids (writing {})",
            target.version
        )));
    }

    let (mut root, mut level) = split_source(chunk.source());
    match target.data_version {
        Some(dv) => root.set(DATA_VERSION, dv),
        None => root.remove(DATA_VERSION),
    };
    if let Some((x, z)) = chunk.position() {
        level.set("xPos", x);
        level.set("zPos", z);
    }

    let mut entries: BTreeMap<i8, NbtCompound> = BTreeMap::new();
    if let Some(old) = level.try_get_list(SECTIONS) {
        for entry in old.compounds() {
            if let Some(y) = entry.try_get_byte("Y") {
                let mut entry = entry.clone();
                for key in BLOCK_KEYS {
                    entry.remove(key);
                }
                entries.insert(y, entry);
            }
        }
    }
    let mut written = 0usize;
    for (y, section) in chunk.sections() {
        if section.is_empty() {
            continue;
        }
        let entry = entries.entry(y).or_default();
        entry.set("Y", y);
        if rules.numeric_block_ids {
            write_numeric_section(y, section, entry)?;
        } else {
            write_palette_section(y, section, rules.span_mode(), entry)?;
        }
        written += 1;
    }
    trace!("Wrote {written} of {} sections", chunk.sections.len());
    level.set(SECTIONS, NbtList::of_compounds(entries.into_values()));

    write_biomes(&chunk.biomes(), &rules, &mut level);

    let mut tiles: Vec<_> = chunk.tile_entities().collect();
    tiles.sort_by_key(|(pos, _)| **pos);
    let tiles = tiles.into_iter().map(|(pos, tag)| {
        let mut tag = tag.clone();
        tag.set("x", pos.x);
        tag.set("y", pos.y);
        tag.set("z", pos.z);
        tag
    });
    level.set(TILE_ENTITIES, NbtList::of_compounds(tiles));
    level.set(ENTITIES, NbtList::of_compounds(chunk.entities().iter().cloned()));

    root.set(LEVEL, level);
    Ok(root)
}

/// Split a source tree into its root and level compounds. A tree without a
/// `Level` wrapper is the level itself.
fn split_source(source: Option<&NbtCompound>) -> (NbtCompound, NbtCompound) {
    let Some(source) = source else {
        return (NbtCompound::new(), NbtCompound::new());
    };
    let mut root = source.clone();
    match root.remove(LEVEL) {
        Some(NbtTag::Compound(level)) => (root, level),
        Some(other) => {
            warn!("Replacing Level of kind {}", other.kind());
            (root, NbtCompound::new())
        }
        None => {
            let mut level = root;
            level.remove(DATA_VERSION);
            (NbtCompound::new(), level)
        }
    }
}

fn write_palette_section(
    y: i8,
    section: &ChunkSection,
    mode: SpanMode,
    entry: &mut NbtCompound,
) -> Result<(), ChunkError> {
    let palette = section.palette();
    let indices: Vec<u32> = section.blocks().iter().map(|&i| i as u32).collect();
    let words = bitpack::pack(&indices, palette.bit_width(), mode)
        .map_err(|source| ChunkError::Section { index: y, source })?;

    entry.set(
        PALETTE,
        NbtList::of_compounds(palette.iter().map(|state| state.to_palette_entry())),
    );
    entry.set(BLOCK_STATES, NbtTag::LongArray(words));
    Ok(())
}

fn write_numeric_section(
    y: i8,
    section: &ChunkSection,
    entry: &mut NbtCompound,
) -> Result<(), ChunkError> {
    let mut legacy = Vec::with_capacity(section.palette().len());
    for state in section.palette().iter() {
        let id = state.legacy_id().ok_or_else(|| {
            ChunkError::UnsupportedOperation(format!(
                "section {y}: {state} has no numeric block id"
            ))
        })?;
        legacy.push(id);
    }

    let mut ids = Vec::with_capacity(BLOCKS_PER_SECTION);
    let mut data = Vec::with_capacity(BLOCKS_PER_SECTION);
    let mut add = Vec::with_capacity(BLOCKS_PER_SECTION);
    for &index in section.blocks().iter() {
        let (id, meta) = legacy[index as usize];
        ids.push(id as u8 as i8);
        data.push(meta);
        add.push((id >> 8) as u8 & 0x0F);
    }

    let section_err = |source| ChunkError::Section { index: y, source };
    let data = bitpack::compress_nibbles(&data).map_err(section_err)?;
    entry.set(BLOCKS, NbtTag::ByteArray(ids));
    entry.set(DATA, NbtTag::ByteArray(to_signed(data)));
    if add.iter().any(|&high| high != 0) {
        let add = bitpack::compress_nibbles(&add).map_err(section_err)?;
        entry.set(ADD, NbtTag::ByteArray(to_signed(add)));
    }
    Ok(())
}

fn to_signed(bytes: Vec<u8>) -> Vec<i8> {
    bytes.into_iter().map(|b| b as i8).collect()
}

fn write_biomes(grid: &BiomeGrid, rules: &FormatRules, level: &mut NbtCompound) {
    let tag = match rules.biome_layout {
        BiomeLayout::Bytes2D => {
            NbtTag::ByteArray(grid.to_columns().into_iter().map(|id| id as u8 as i8).collect())
        }
        BiomeLayout::Ints2D => NbtTag::IntArray(grid.to_columns()),
        BiomeLayout::Cells3D => NbtTag::IntArray(compress_biomes(grid, rules.biome_layers())),
    };
    level.set(BIOMES, tag);
}
