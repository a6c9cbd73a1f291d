//! Chunk columns: sparse sections, biomes and block entities.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chunkcodec_nbt::NbtCompound;
use tracing::{trace, warn};

use crate::biome::BiomeGrid;
use crate::bitpack::{self, SpanMode};
use crate::block::{shared_air, BlockState};
use crate::error::{ChunkError, PackError};
use crate::format::FormatRules;
use crate::section::{ChunkSection, SECTION_SIZE};

/// Bits per entry of a 256-column heightmap.
const HEIGHTMAP_BITS: u32 = 9;
const COLUMNS: usize = 256;

/// Absolute block position, used to key block entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// A 16-wide column of sections keyed by their signed slice index.
///
/// Block coordinates passed to the accessors are taken modulo 16 on the x
/// and z axes, so both local and world coordinates work. `y` is absolute.
#[derive(Debug)]
pub struct ChunkData {
    pub(crate) sections: BTreeMap<i8, ChunkSection>,
    pub(crate) biomes: Mutex<BiomeGrid>,
    pub(crate) tile_entities: HashMap<BlockPos, NbtCompound>,
    pub(crate) entities: Vec<NbtCompound>,
    /// Tree the chunk was read from. Keys this crate does not model are
    /// written back from here.
    pub(crate) source: Option<NbtCompound>,
    pub(crate) position: Option<(i32, i32)>,
    rules: FormatRules,
    default_block: Arc<BlockState>,
}

impl ChunkData {
    /// An empty chunk following `rules`. Sections created on demand get
    /// `default_block` at palette index 1.
    pub fn new(rules: FormatRules, default_block: Arc<BlockState>) -> Self {
        Self {
            sections: BTreeMap::new(),
            biomes: Mutex::new(BiomeGrid::default()),
            tile_entities: HashMap::new(),
            entities: Vec::new(),
            source: None,
            position: None,
            rules,
            default_block,
        }
    }

    pub fn rules(&self) -> &FormatRules {
        &self.rules
    }

    /// Blocks are numeric ids. Such chunks can be read and written back but
    /// not edited.
    pub fn numeric_block_ids(&self) -> bool {
        self.rules.numeric_block_ids
    }

    pub fn default_block(&self) -> &Arc<BlockState> {
        &self.default_block
    }

    /// Chunk coordinates from `xPos`/`zPos`, if the chunk was read from a tree
    /// carrying them.
    pub fn position(&self) -> Option<(i32, i32)> {
        self.position
    }

    pub fn set_position(&mut self, x: i32, z: i32) {
        self.position = Some((x, z));
    }

    pub fn source(&self) -> Option<&NbtCompound> {
        self.source.as_ref()
    }

    pub fn get_block_at(&self, x: i32, y: i32, z: i32) -> Arc<BlockState> {
        let Some(index) = section_index(y) else {
            return shared_air();
        };
        match self.sections.get(&index) {
            Some(section) => {
                let (lx, ly, lz) = local(x, y, z);
                Arc::clone(section.get_block(lx, ly, lz))
            }
            None => shared_air(),
        }
    }

    /// Set a block, creating its section if needed. Positions outside the
    /// chunk's vertical bounds are ignored.
    pub fn set_block_at(
        &mut self,
        x: i32,
        y: i32,
        z: i32,
        state: impl Into<Arc<BlockState>>,
    ) -> Result<(), ChunkError> {
        let Some((index, section)) = self.writable_section(y)? else {
            return Ok(());
        };
        let (lx, ly, lz) = local(x, y, z);
        if !section.set_block(lx, ly, lz, state) {
            return Err(ChunkError::PaletteFull { section: index });
        }
        Ok(())
    }

    /// Set the chunk's default block.
    pub fn set_default_block_at(&mut self, x: i32, y: i32, z: i32) -> Result<(), ChunkError> {
        let default_block = Arc::clone(&self.default_block);
        let Some((index, section)) = self.writable_section(y)? else {
            return Ok(());
        };
        let (lx, ly, lz) = local(x, y, z);
        // Index 1 of a section created here is the default block.
        let fresh_default = section
            .palette()
            .get(1)
            .is_some_and(|s| Arc::ptr_eq(s, &default_block));
        if fresh_default && section.set_index(lx, ly, lz, 1) {
            return Ok(());
        }
        if !section.set_block(lx, ly, lz, default_block) {
            return Err(ChunkError::PaletteFull { section: index });
        }
        Ok(())
    }

    fn writable_section(&mut self, y: i32) -> Result<Option<(i8, &mut ChunkSection)>, ChunkError> {
        if self.rules.numeric_block_ids {
            warn!("Refusing to edit a chunk that uses numeric block ids");
            return Err(ChunkError::UnsupportedOperation(
                "chunks with numeric block ids are read-only".into(),
            ));
        }
        let (min_y, max_y) = self.rules.vertical_bounds();
        let index = match section_index(y) {
            Some(index) if (min_y..=max_y).contains(&y) => index,
            _ => {
                trace!("Ignoring block write at y={y} outside {min_y}..={max_y}");
                return Ok(None);
            }
        };
        let default_block = &self.default_block;
        let section = self
            .sections
            .entry(index)
            .or_insert_with(|| ChunkSection::new(Arc::clone(default_block)));
        Ok(Some((index, section)))
    }

    /// Highest y holding a non-air block in the column, or `None` if the
    /// column is empty.
    pub fn highest_block_at(&self, x: i32, z: i32) -> Option<i32> {
        let (lx, _, lz) = local(x, 0, z);
        self.sections.iter().rev().find_map(|(&index, section)| {
            section
                .highest_non_air(lx, lz)
                .map(|ly| index as i32 * SECTION_SIZE as i32 + ly as i32)
        })
    }

    /// Lowest and highest present slice indices.
    pub fn section_range(&self) -> Option<(i8, i8)> {
        let lowest = *self.sections.first_key_value()?.0;
        let highest = *self.sections.last_key_value()?.0;
        Some((lowest, highest))
    }

    pub fn sections(&self) -> impl Iterator<Item = (i8, &ChunkSection)> {
        self.sections.iter().map(|(&index, section)| (index, section))
    }

    pub fn section(&self, index: i8) -> Option<&ChunkSection> {
        self.sections.get(&index)
    }

    fn lock_biomes(&self) -> MutexGuard<'_, BiomeGrid> {
        // A poisoned lock still holds a valid grid.
        self.biomes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn biome_at(&self, x: i32, z: i32) -> i32 {
        let (lx, _, lz) = local(x, 0, z);
        self.lock_biomes().get(lx, lz)
    }

    pub fn set_biome_at(&self, x: i32, z: i32, id: i32) {
        let (lx, _, lz) = local(x, 0, z);
        self.lock_biomes().set(lx, lz, id);
    }

    /// Snapshot of the biome grid.
    pub fn biomes(&self) -> BiomeGrid {
        *self.lock_biomes()
    }

    pub fn set_biomes(&self, grid: BiomeGrid) {
        *self.lock_biomes() = grid;
    }

    pub fn tile_entity(&self, pos: BlockPos) -> Option<&NbtCompound> {
        self.tile_entities.get(&pos)
    }

    /// Store the block entity at `pos`, replacing and returning any previous one.
    pub fn set_tile_entity(&mut self, pos: BlockPos, tag: NbtCompound) -> Option<NbtCompound> {
        self.tile_entities.insert(pos, tag)
    }

    pub fn remove_tile_entity(&mut self, pos: BlockPos) -> Option<NbtCompound> {
        self.tile_entities.remove(&pos)
    }

    pub fn tile_entities(&self) -> impl Iterator<Item = (&BlockPos, &NbtCompound)> {
        self.tile_entities.iter()
    }

    pub fn entities(&self) -> &[NbtCompound] {
        &self.entities
    }

    pub fn add_entity(&mut self, tag: NbtCompound) {
        self.entities.push(tag);
    }

    /// Decode a heightmap kept in the source tree, such as `WORLD_SURFACE`.
    /// Returns 256 column heights in `z*16 + x` order.
    pub fn source_heightmap(&self, name: &str) -> Result<Option<Vec<u32>>, PackError> {
        let Some(words) = self
            .source
            .as_ref()
            .map(crate::serializer::level_of)
            .and_then(|level| level.try_get_compound("Heightmaps"))
            .and_then(|maps| maps.try_get_long_array(name))
        else {
            return Ok(None);
        };
        bitpack::unpack(words, HEIGHTMAP_BITS, COLUMNS, self.span_mode()).map(Some)
    }

    fn span_mode(&self) -> SpanMode {
        self.rules.span_mode()
    }
}

fn section_index(y: i32) -> Option<i8> {
    i8::try_from(y.div_euclid(SECTION_SIZE as i32)).ok()
}

fn local(x: i32, y: i32, z: i32) -> (usize, usize, usize) {
    (
        x.rem_euclid(16) as usize,
        y.rem_euclid(16) as usize,
        z.rem_euclid(16) as usize,
    )
}
