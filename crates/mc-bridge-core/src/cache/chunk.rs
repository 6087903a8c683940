//! Java block states of every loaded column, kept so block lookups and
//! virtual container restores never need the server.

use std::collections::HashMap;

use mc_bridge_proto::types::{BlockPos, ChunkPos};
use mc_bridge_world::storage::BlockStorage;

/// Java air.
pub const AIR: u32 = 0;

#[derive(Debug, Clone)]
pub struct ChunkColumn {
    /// Bottom section first, cells in Java y-z-x order.
    sections: Vec<BlockStorage>,
}

impl ChunkColumn {
    pub fn new(sections: Vec<BlockStorage>) -> Self {
        Self { sections }
    }

    pub fn sections(&self) -> &[BlockStorage] {
        &self.sections
    }
}

fn cell_index(pos: BlockPos) -> usize {
    (((pos.y & 15) << 8) | ((pos.z & 15) << 4) | (pos.x & 15)) as usize
}

#[derive(Debug)]
pub struct ChunkCache {
    columns: HashMap<ChunkPos, ChunkColumn>,
    min_y: i32,
    section_count: usize,
}

impl Default for ChunkCache {
    fn default() -> Self {
        Self::new(-64, 24)
    }
}

impl ChunkCache {
    pub fn new(min_y: i32, section_count: usize) -> Self {
        Self {
            columns: HashMap::new(),
            min_y,
            section_count,
        }
    }

    /// Dimension change: every cached column is dropped.
    pub fn set_dimension(&mut self, min_y: i32, section_count: usize) {
        self.columns.clear();
        self.min_y = min_y;
        self.section_count = section_count;
    }

    pub fn min_y(&self) -> i32 {
        self.min_y
    }

    pub fn section_count(&self) -> usize {
        self.section_count
    }

    pub fn insert(&mut self, pos: ChunkPos, column: ChunkColumn) {
        self.columns.insert(pos, column);
    }

    pub fn remove(&mut self, pos: ChunkPos) -> bool {
        self.columns.remove(&pos).is_some()
    }

    pub fn column(&self, pos: ChunkPos) -> Option<&ChunkColumn> {
        self.columns.get(&pos)
    }

    pub fn contains(&self, pos: ChunkPos) -> bool {
        self.columns.contains_key(&pos)
    }

    fn section_index(&self, y: i32) -> Option<usize> {
        let index = (y - self.min_y).div_euclid(16);
        usize::try_from(index).ok().filter(|i| *i < self.section_count)
    }

    /// Air outside loaded columns or the world height.
    pub fn get(&self, pos: BlockPos) -> u32 {
        let Some(section) = self.section_index(pos.y) else {
            return AIR;
        };
        self.columns
            .get(&pos.chunk())
            .and_then(|column| column.sections.get(section))
            .map_or(AIR, |storage| storage.get(cell_index(pos)))
    }

    /// Returns false when the column is not loaded.
    pub fn set(&mut self, pos: BlockPos, state: u32) -> bool {
        let Some(section) = self.section_index(pos.y) else {
            return false;
        };
        let Some(column) = self.columns.get_mut(&pos.chunk()) else {
            return false;
        };
        while column.sections.len() <= section {
            column.sections.push(BlockStorage::singleton(AIR));
        }
        column.sections[section].set(cell_index(pos), state);
        true
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn clear(&mut self) {
        self.columns.clear();
    }
}
