//! 16x16x16 chunk sections.

use std::sync::Arc;

use crate::block::BlockState;
use crate::palette::Palette;

pub const SECTION_SIZE: usize = 16;
pub const BLOCKS_PER_SECTION: usize = SECTION_SIZE * SECTION_SIZE * SECTION_SIZE;

/// Linear index in YZX order: `y*256 + z*16 + x`. Coordinates must be in `[0, 15]`.
#[inline]
pub fn block_index(x: usize, y: usize, z: usize) -> usize {
    debug_assert!(x < 16 && y < 16 && z < 16);
    (y * SECTION_SIZE + z) * SECTION_SIZE + x
}

/// A palette and 4096 indices into it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkSection {
    palette: Palette,
    blocks: Box<[u16; BLOCKS_PER_SECTION]>,
}

impl ChunkSection {
    /// A section of air with `default_block` registered at index 1.
    pub fn new(default_block: Arc<BlockState>) -> Self {
        Self {
            palette: Palette::with_default(default_block),
            blocks: Box::new([0; BLOCKS_PER_SECTION]),
        }
    }

    /// Build a section from decoded parts. Every index must be in range of
    /// the palette; the caller checks this.
    pub(crate) fn from_parts(palette: Palette, blocks: Box<[u16; BLOCKS_PER_SECTION]>) -> Self {
        debug_assert!(blocks.iter().all(|&i| (i as usize) < palette.len()));
        Self { palette, blocks }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn blocks(&self) -> &[u16; BLOCKS_PER_SECTION] {
        &self.blocks
    }

    pub fn get_block(&self, x: usize, y: usize, z: usize) -> &Arc<BlockState> {
        let index = self.blocks[block_index(x, y, z)];
        // Indices are validated on construction and written only through
        // `get_or_add`, so they always resolve.
        &self.palette.as_slice()[index as usize]
    }

    /// Set a block, registering `state` in the palette if needed. Returns
    /// `false` and leaves the block untouched if the palette is full.
    pub fn set_block(
        &mut self,
        x: usize,
        y: usize,
        z: usize,
        state: impl Into<Arc<BlockState>>,
    ) -> bool {
        let Some(index) = self.palette.get_or_add(state) else {
            return false;
        };
        self.blocks[block_index(x, y, z)] = index;
        true
    }

    /// Write a palette index directly. Returns `false` if the index is not
    /// in the palette.
    pub fn set_index(&mut self, x: usize, y: usize, z: usize, index: u16) -> bool {
        if index as usize >= self.palette.len() {
            return false;
        }
        self.blocks[block_index(x, y, z)] = index;
        true
    }

    /// Whether every block is index 0 and index 0 is plain air. Such sections
    /// are not written out.
    pub fn is_empty(&self) -> bool {
        self.palette.get(0).is_some_and(|s| s.is_empty_air()) && self.blocks.iter().all(|&i| i == 0)
    }

    /// Highest local y in the column holding a non-air block.
    pub fn highest_non_air(&self, x: usize, z: usize) -> Option<usize> {
        (0..SECTION_SIZE)
            .rev()
            .find(|&y| !self.get_block(x, y, z).is_air())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stone() -> Arc<BlockState> {
        Arc::new(BlockState::new("stone"))
    }

    #[test]
    fn fresh_section_is_air() {
        let section = ChunkSection::new(stone());
        assert!(section.get_block(0, 0, 0).is_empty_air());
        assert!(section.get_block(15, 15, 15).is_empty_air());
        assert!(section.is_empty());
    }

    #[test]
    fn set_get_roundtrip() {
        let mut section = ChunkSection::new(stone());
        section.set_block(5, 10, 3, BlockState::new("dirt"));
        assert_eq!(section.get_block(5, 10, 3).id(), "minecraft:dirt");
        assert!(section.get_block(0, 0, 0).is_empty_air());
        assert!(!section.is_empty());
    }

    #[test]
    fn yzx_ordering() {
        let mut section = ChunkSection::new(stone());
        section.set_block(1, 2, 3, BlockState::new("gold_block"));
        // y*256 + z*16 + x = 512 + 48 + 1
        let idx = section.blocks()[561];
        assert_eq!(section.palette().get(idx).unwrap().id(), "minecraft:gold_block");
    }

    #[test]
    fn palette_only_grows_on_miss() {
        let mut section = ChunkSection::new(stone());
        assert_eq!(section.palette().len(), 2);
        section.set_block(0, 0, 0, BlockState::new("stone"));
        assert_eq!(section.palette().len(), 2);
        section.set_block(0, 1, 0, BlockState::new("dirt"));
        section.set_block(0, 2, 0, BlockState::new("dirt"));
        assert_eq!(section.palette().len(), 3);
        // Overwriting the only dirt block does not shrink the palette.
        section.set_block(0, 1, 0, BlockState::air());
        section.set_block(0, 2, 0, BlockState::air());
        assert_eq!(section.palette().len(), 3);
    }

    #[test]
    fn set_index_checks_range() {
        let mut section = ChunkSection::new(stone());
        assert!(section.set_index(0, 0, 0, 1));
        assert_eq!(section.get_block(0, 0, 0).id(), "minecraft:stone");
        assert!(!section.set_index(0, 0, 0, 2));
    }

    #[test]
    fn highest_non_air_in_column() {
        let mut section = ChunkSection::new(stone());
        assert_eq!(section.highest_non_air(4, 4), None);
        section.set_block(4, 3, 4, BlockState::new("stone"));
        section.set_block(4, 9, 4, BlockState::new("cave_air"));
        assert_eq!(section.highest_non_air(4, 4), Some(3));
    }
}
