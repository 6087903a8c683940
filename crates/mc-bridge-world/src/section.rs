//! Bedrock sub-chunk and LevelChunk payload serialization.

use bytes::{BufMut, Bytes, BytesMut};

use crate::storage::BlockStorage;

/// Sub-chunk format carrying its own y index.
pub const SUB_CHUNK_VERSION: u8 = 9;

/// Storage header telling the client to reuse the previous section's biomes.
pub const COPY_LAST_BIOME: u8 = 0xFF;

/// Singleton biome storage holding id 0.
pub const EMPTY_BIOME_DATA: [u8; 2] = [0x01, 0x00];

/// Java packs cells y-z-x, Bedrock x-z-y.
pub fn index_yzx_to_xzy(yzx: usize) -> usize {
    (yzx >> 8) | (yzx & 0x0F0) | ((yzx & 0x00F) << 8)
}

pub fn xzy_index(x: usize, y: usize, z: usize) -> usize {
    (x << 8) | (z << 4) | y
}

/// Up to two block layers; the second holds water for waterlogged blocks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChunkSection {
    pub layers: Vec<BlockStorage>,
}

impl ChunkSection {
    pub fn new(air: u32) -> Self {
        Self {
            layers: vec![BlockStorage::singleton(air)],
        }
    }

    pub fn with_layers(layers: Vec<BlockStorage>) -> Self {
        Self { layers }
    }

    pub fn get(&self, layer: usize, index: usize) -> Option<u32> {
        self.layers.get(layer).map(|storage| storage.get(index))
    }

    /// Missing layers up to `layer` are created filled with `air`.
    pub fn set(&mut self, layer: usize, index: usize, value: u32, air: u32) {
        while self.layers.len() <= layer {
            self.layers.push(BlockStorage::singleton(air));
        }
        self.layers[layer].set(index, value);
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn write_network(&self, buf: &mut impl BufMut, y_index: i8) {
        buf.put_u8(SUB_CHUNK_VERSION);
        buf.put_u8(self.layers.len() as u8);
        buf.put_i8(y_index);
        for layer in &self.layers {
            layer.write_network(buf);
        }
    }
}

/// 4×4×4 Java biome cells spread over a 16×16×16 Bedrock storage.
pub fn expand_biomes(cells: &[u32; 64]) -> BlockStorage {
    if cells.iter().all(|c| *c == cells[0]) {
        return BlockStorage::singleton(cells[0]);
    }
    let mut storage = BlockStorage::new(cells[0]);
    for x in 0..16 {
        for z in 0..16 {
            for y in 0..16 {
                let cell = ((y >> 2) << 4) | ((z >> 2) << 2) | (x >> 2);
                storage.set(xzy_index(x, y, z), cells[cell]);
            }
        }
    }
    storage
}

/// A column ready for LevelChunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedColumn {
    pub sub_chunk_count: u32,
    pub payload: Bytes,
}

/// Sections from the bottom of the world up, biomes one per section of the
/// dimension's full height. Trailing sections without layers are not sent; a biome
/// storage equal to the one below is sent as [`COPY_LAST_BIOME`].
pub fn serialize_column(
    sections: &[ChunkSection],
    biomes: &[BlockStorage],
    bottom_y_index: i8,
) -> SerializedColumn {
    let sent = sections
        .iter()
        .rposition(|s| !s.is_empty())
        .map_or(0, |last| last + 1);

    let mut buf = BytesMut::new();
    for (offset, section) in sections[..sent].iter().enumerate() {
        section.write_network(&mut buf, bottom_y_index + offset as i8);
    }

    let mut previous: Option<&BlockStorage> = None;
    for biome in biomes {
        if previous == Some(biome) {
            buf.put_u8(COPY_LAST_BIOME);
        } else {
            biome.write_network(&mut buf);
        }
        previous = Some(biome);
    }

    // no border blocks
    buf.put_u8(0);

    SerializedColumn {
        sub_chunk_count: sent as u32,
        payload: buf.freeze(),
    }
}

/// Payload for a LevelChunk with no sub-chunks, used to clear a column.
pub fn empty_column_payload(biome_sections: usize) -> Bytes {
    let mut buf = BytesMut::with_capacity(biome_sections * EMPTY_BIOME_DATA.len() + 1);
    for _ in 0..biome_sections {
        buf.put_slice(&EMPTY_BIOME_DATA);
    }
    buf.put_u8(0);
    buf.freeze()
}
