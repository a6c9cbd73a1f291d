//! Per-column biome grids and their on-disk layouts.
//!
//! In memory a chunk keeps one biome id per (x, z) column. From 1.15 the
//! format stores biomes in 4x4x4 cells instead, so writing reduces each 4x4
//! block of columns to its most common id and repeats that layer for the
//! whole height. Reading only looks at the topmost layer, so older cave
//! biomes underground do not leak into the surface grid.

use crate::error::PackError;

/// Plains, used when a chunk carries no biome data.
pub const DEFAULT_BIOME: i32 = 1;

/// Vertical 4x4 layers stored for a 256-block-tall chunk.
pub const CELL_LAYERS: usize = 64;

const COLUMNS: usize = 16;
const CELLS: usize = 4;
const CELL_WIDTH: usize = COLUMNS / CELLS;

/// One biome id per column, indexed by `(x, z)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BiomeGrid {
    ids: [[i32; COLUMNS]; COLUMNS],
}

impl BiomeGrid {
    pub fn filled(id: i32) -> Self {
        Self {
            ids: [[id; COLUMNS]; COLUMNS],
        }
    }

    pub fn get(&self, x: usize, z: usize) -> i32 {
        self.ids[x][z]
    }

    pub fn set(&mut self, x: usize, z: usize, id: i32) {
        self.ids[x][z] = id;
    }

    /// Flat 256-entry layout of the 2D eras, index `z*16 + x`.
    pub fn to_columns(&self) -> Vec<i32> {
        let mut out = Vec::with_capacity(COLUMNS * COLUMNS);
        for z in 0..COLUMNS {
            for x in 0..COLUMNS {
                out.push(self.ids[x][z]);
            }
        }
        out
    }

    pub fn from_columns(columns: &[i32]) -> Result<Self, PackError> {
        if columns.len() != COLUMNS * COLUMNS {
            return Err(PackError::InvalidLength(columns.len()));
        }
        let mut grid = Self::filled(DEFAULT_BIOME);
        for (i, &id) in columns.iter().enumerate() {
            grid.ids[i % COLUMNS][i / COLUMNS] = id;
        }
        Ok(grid)
    }
}

impl Default for BiomeGrid {
    fn default() -> Self {
        Self::filled(DEFAULT_BIOME)
    }
}

/// Most common id in the 4x4 block of columns at cell `(cell_x, cell_z)`.
/// Ties go to the id seen first, scanning x outer and z inner.
pub fn dominant_biome(grid: &BiomeGrid, cell_x: usize, cell_z: usize) -> i32 {
    // (id, count) in first-seen order
    let mut counts: Vec<(i32, u32)> = Vec::with_capacity(CELL_WIDTH * CELL_WIDTH);
    for x in 0..CELL_WIDTH {
        for z in 0..CELL_WIDTH {
            let id = grid.get(cell_x * CELL_WIDTH + x, cell_z * CELL_WIDTH + z);
            match counts.iter_mut().find(|(seen, _)| *seen == id) {
                Some((_, count)) => *count += 1,
                None => counts.push((id, 1)),
            }
        }
    }

    let mut best = counts[0];
    for &(id, count) in &counts[1..] {
        if count > best.1 {
            best = (id, count);
        }
    }
    best.0
}

/// Reduce the grid to `layers` identical 4x4 layers, index `y*16 + z*4 + x`.
pub fn compress_biomes(grid: &BiomeGrid, layers: usize) -> Vec<i32> {
    let mut layer = [0i32; CELLS * CELLS];
    for cell_x in 0..CELLS {
        for cell_z in 0..CELLS {
            layer[cell_z * CELLS + cell_x] = dominant_biome(grid, cell_x, cell_z);
        }
    }

    let mut out = Vec::with_capacity(layer.len() * layers);
    for _ in 0..layers {
        out.extend_from_slice(&layer);
    }
    out
}

/// Broadcast the topmost 4x4 layer of a cell array back onto the columns.
pub fn expand_biomes(cells: &[i32]) -> Result<BiomeGrid, PackError> {
    let layer_len = CELLS * CELLS;
    if cells.is_empty() || cells.len() % layer_len != 0 {
        return Err(PackError::InvalidLength(cells.len()));
    }
    let top = &cells[cells.len() - layer_len..];

    let mut grid = BiomeGrid::default();
    for cell_x in 0..CELLS {
        for cell_z in 0..CELLS {
            let id = top[cell_z * CELLS + cell_x];
            for x in 0..CELL_WIDTH {
                for z in 0..CELL_WIDTH {
                    grid.set(cell_x * CELL_WIDTH + x, cell_z * CELL_WIDTH + z, id);
                }
            }
        }
    }
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_grid_compresses_uniformly() {
        let grid = BiomeGrid::filled(7);
        let cells = compress_biomes(&grid, CELL_LAYERS);
        assert_eq!(cells.len(), 16 * CELL_LAYERS);
        assert!(cells.iter().all(|&id| id == 7));
    }

    #[test]
    fn tie_goes_to_first_seen() {
        let mut grid = BiomeGrid::filled(2);
        // Cell (0, 0): the first two x rows are id 1, the last two id 2.
        for x in 0..2 {
            for z in 0..4 {
                grid.set(x, z, 1);
            }
        }
        assert_eq!(dominant_biome(&grid, 0, 0), 1);

        // Swap the halves: now 2 is scanned first.
        let mut grid = BiomeGrid::filled(1);
        for x in 0..2 {
            for z in 0..4 {
                grid.set(x, z, 2);
            }
        }
        assert_eq!(dominant_biome(&grid, 0, 0), 2);
    }

    #[test]
    fn majority_wins() {
        let mut grid = BiomeGrid::filled(4);
        grid.set(0, 0, 9);
        grid.set(1, 1, 9);
        grid.set(2, 2, 9);
        assert_eq!(dominant_biome(&grid, 0, 0), 4);
    }

    #[test]
    fn compressed_layout_is_yzx() {
        let mut grid = BiomeGrid::filled(1);
        // Cell x=3, z=1 covers columns x 12..16, z 4..8.
        for x in 12..16 {
            for z in 4..8 {
                grid.set(x, z, 5);
            }
        }
        let cells = compress_biomes(&grid, 2);
        assert_eq!(cells[4 + 3], 5);
        assert_eq!(cells[16 + 4 + 3], 5);
        assert_eq!(cells.iter().filter(|&&id| id == 5).count(), 2);
    }

    #[test]
    fn expand_reads_top_layer_only() {
        let mut cells = vec![3i32; 16 * CELL_LAYERS];
        let top = cells.len() - 16;
        cells[top + 2 * 4 + 1] = 8; // cell x=1, z=2
        cells[0] = 99; // bottom layer noise
        let grid = expand_biomes(&cells).unwrap();
        assert_eq!(grid.get(4, 8), 8);
        assert_eq!(grid.get(7, 11), 8);
        assert_eq!(grid.get(0, 0), 3);
    }

    #[test]
    fn expand_compress_roundtrip_on_blocky_grid() {
        let mut grid = BiomeGrid::default();
        for x in 0..16 {
            for z in 0..16 {
                grid.set(x, z, ((x / 4) * 4 + z / 4) as i32);
            }
        }
        let cells = compress_biomes(&grid, CELL_LAYERS);
        assert_eq!(expand_biomes(&cells).unwrap(), grid);
    }

    #[test]
    fn expand_rejects_bad_length() {
        assert_eq!(expand_biomes(&[]), Err(PackError::InvalidLength(0)));
        assert_eq!(expand_biomes(&[1; 17]), Err(PackError::InvalidLength(17)));
    }

    #[test]
    fn column_layout_roundtrip() {
        let mut grid = BiomeGrid::default();
        grid.set(3, 0, 12);
        grid.set(0, 3, 21);
        let columns = grid.to_columns();
        assert_eq!(columns[3], 12);
        assert_eq!(columns[3 * 16], 21);
        assert_eq!(BiomeGrid::from_columns(&columns).unwrap(), grid);
        assert!(BiomeGrid::from_columns(&columns[..10]).is_err());
    }
}
