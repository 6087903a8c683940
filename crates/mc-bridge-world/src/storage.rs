//! Palette + bit array storage for one layer of a sub-chunk.

use bytes::BufMut;
use mc_bridge_proto::codec::ProtoEncode;
use mc_bridge_proto::varint::VarInt;

use crate::bit_array::{BitArray, BitArrayVersion};
use crate::error::WorldError;

/// Cells in a 16×16×16 sub-chunk.
pub const SECTION_SIZE: usize = 4096;

/// Values are runtime ids (Bedrock) or state ids (Java); the storage does
/// not care which.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockStorage {
    palette: Vec<u32>,
    bits: BitArray,
}

impl BlockStorage {
    /// Every cell set to `fill`, starting at two bits per cell.
    pub fn new(fill: u32) -> Self {
        Self::with_version(fill, BitArrayVersion::V2)
    }

    pub fn with_version(fill: u32, version: BitArrayVersion) -> Self {
        Self {
            palette: vec![fill],
            bits: BitArray::new(version, SECTION_SIZE),
        }
    }

    /// A single value for the whole section; grows on the first differing set.
    pub fn singleton(value: u32) -> Self {
        Self::with_version(value, BitArrayVersion::V0)
    }

    pub fn from_parts(palette: Vec<u32>, bits: BitArray) -> Result<Self, WorldError> {
        let version = bits.version();
        let fits = !palette.is_empty()
            && (palette.len() - 1) as u64 <= version.max_entry_value() as u64
            && bits.size() == SECTION_SIZE;
        if !fits {
            return Err(WorldError::PaletteOverflow {
                palette: palette.len(),
                bits: version.bits(),
            });
        }
        Ok(Self { palette, bits })
    }

    /// Builds a storage from decoded cell values, choosing the narrowest width.
    pub fn from_values(values: &[u32]) -> Result<Self, WorldError> {
        if values.len() != SECTION_SIZE {
            return Err(WorldError::InvalidMapping(format!(
                "section of {} cells",
                values.len()
            )));
        }
        let mut palette: Vec<u32> = Vec::new();
        let mut indices = Vec::with_capacity(SECTION_SIZE);
        for value in values {
            let index = match palette.iter().position(|v| v == value) {
                Some(index) => index,
                None => {
                    palette.push(*value);
                    palette.len() - 1
                }
            };
            indices.push(index as u32);
        }
        let version = BitArrayVersion::for_palette_len(palette.len()).ok_or(
            WorldError::PaletteOverflow {
                palette: palette.len(),
                bits: 16,
            },
        )?;
        let mut bits = BitArray::new(version, SECTION_SIZE);
        if version != BitArrayVersion::V0 {
            for (cell, index) in indices.into_iter().enumerate() {
                bits.set(cell, index);
            }
        }
        Ok(Self { palette, bits })
    }

    pub fn palette(&self) -> &[u32] {
        &self.palette
    }

    pub fn bit_array(&self) -> &BitArray {
        &self.bits
    }

    pub fn version(&self) -> BitArrayVersion {
        self.bits.version()
    }

    pub fn get(&self, index: usize) -> u32 {
        self.palette[self.bits.get(index) as usize]
    }

    pub fn set(&mut self, index: usize, value: u32) {
        let id = self.id_for(value);
        self.bits.set(index, id);
    }

    /// Palette index for `value`, adding it (and widening) when new.
    /// Values already in the palette never reallocate.
    pub fn id_for(&mut self, value: u32) -> u32 {
        if let Some(index) = self.palette.iter().position(|v| *v == value) {
            return index as u32;
        }
        let index = self.palette.len() as u32;
        if index > self.version().max_entry_value() {
            match self.version().next() {
                Some(next) => self.bits = self.bits.widened(next),
                None => return self.compact_and_insert(value),
            }
        }
        self.palette.push(value);
        index
    }

    /// A full 16-bit palette: drop entries no cell uses, then retry.
    fn compact_and_insert(&mut self, value: u32) -> u32 {
        let values: Vec<u32> = (0..SECTION_SIZE).map(|i| self.get(i)).collect();
        let mut rebuilt = Self::with_version(values[0], BitArrayVersion::V16);
        for (cell, v) in values.into_iter().enumerate() {
            rebuilt.set(cell, v);
        }
        *self = rebuilt;
        assert!(
            self.palette.len() as u32 <= BitArrayVersion::V16.max_entry_value(),
            "section holds more distinct values than cells"
        );
        self.palette.push(value);
        self.palette.len() as u32 - 1
    }

    /// True when every cell holds the palette's first value.
    pub fn is_uniform(&self) -> bool {
        self.palette.len() == 1 || self.bits.words().iter().all(|w| *w == 0)
    }

    /// Same cells with every palette value passed through `f`.
    pub fn map_values(&self, mut f: impl FnMut(u32) -> u32) -> Self {
        Self {
            palette: self.palette.iter().map(|v| f(*v)).collect(),
            bits: self.bits.clone(),
        }
    }

    /// Runtime-id storage: header, words, palette size (not for singletons)
    /// and zigzag palette entries.
    pub fn write_network(&self, buf: &mut impl BufMut) {
        let version = self.version();
        buf.put_u8((version.bits() << 1) | 1);
        for word in self.bits.words() {
            buf.put_u32_le(*word);
        }
        if version == BitArrayVersion::V0 {
            VarInt(self.palette[0] as i32).proto_encode(buf);
            return;
        }
        VarInt(self.palette.len() as i32).proto_encode(buf);
        for value in &self.palette {
            VarInt(*value as i32).proto_encode(buf);
        }
    }
}
