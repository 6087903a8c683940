//! Java chunk column data: paletted containers per section.

use bytes::{Buf, BufMut};
use mc_bridge_nbt::read_nbt_java;

use crate::codec::{need, read_u8};
use crate::error::ProtoError;
use crate::java::{read_count, read_i16, read_i64};
use crate::varint::{get_java_varint, put_java_varint};

pub const BLOCKS_PER_SECTION: usize = 4096;
pub const BIOMES_PER_SECTION: usize = 64;

/// Widest entry a direct palette may use; global ids are non-negative `i32`s.
const MAX_DIRECT_BITS: u8 = 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Blocks,
    Biomes,
}

impl ContainerKind {
    fn size(self) -> usize {
        match self {
            Self::Blocks => BLOCKS_PER_SECTION,
            Self::Biomes => BIOMES_PER_SECTION,
        }
    }

    /// Bits per entry the server uses once it switches to the global palette.
    fn direct_bits(self) -> u8 {
        match self {
            Self::Blocks => 15,
            Self::Biomes => 7,
        }
    }

    fn indirect_bits(self, bits: u8) -> Option<u8> {
        match self {
            Self::Blocks if (1..=8).contains(&bits) => Some(bits.max(4)),
            Self::Biomes if (1..=3).contains(&bits) => Some(bits),
            _ => None,
        }
    }

    fn max_indirect_bits(self) -> u8 {
        match self {
            Self::Blocks => 8,
            Self::Biomes => 3,
        }
    }

    /// Direct palettes are wider than any indirect one but still fit an id.
    fn allows_direct(self, bits: u8) -> bool {
        bits > self.max_indirect_bits() && bits <= MAX_DIRECT_BITS
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Palette {
    Single(i32),
    Indirect(Vec<i32>),
    /// Entries are global ids.
    Direct,
}

/// One paletted container exactly as the server packed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PalettedContainer {
    pub bits: u8,
    pub palette: Palette,
    pub data: Vec<u64>,
}

impl PalettedContainer {
    pub fn single(value: i32) -> Self {
        Self {
            bits: 0,
            palette: Palette::Single(value),
            data: Vec::new(),
        }
    }

    /// Raw palette index of `index`. Entries never straddle two longs.
    fn raw(&self, index: usize) -> u64 {
        if self.bits == 0 || self.bits > MAX_DIRECT_BITS {
            return 0;
        }
        let per_long = 64 / self.bits as usize;
        let mask = (1u64 << self.bits) - 1;
        self.data
            .get(index / per_long)
            .map(|word| (word >> ((index % per_long) * self.bits as usize)) & mask)
            .unwrap_or(0)
    }

    pub fn get(&self, index: usize) -> i32 {
        match &self.palette {
            Palette::Single(value) => *value,
            Palette::Indirect(palette) => palette.get(self.raw(index) as usize).copied().unwrap_or(0),
            Palette::Direct => self.raw(index) as i32,
        }
    }

    /// Distinct values, for containers that have a palette.
    pub fn palette_values(&self) -> Option<&[i32]> {
        match &self.palette {
            Palette::Single(value) => Some(std::slice::from_ref(value)),
            Palette::Indirect(palette) => Some(palette),
            Palette::Direct => None,
        }
    }

    pub fn read(buf: &mut impl Buf, kind: ContainerKind) -> Result<Self, ProtoError> {
        let bits = read_u8(buf)?;
        let palette = if bits == 0 {
            Palette::Single(get_java_varint(buf)?)
        } else if kind.indirect_bits(bits).is_some() {
            let len = read_count(buf, 1 << bits)?;
            let mut palette = Vec::with_capacity(len);
            for _ in 0..len {
                palette.push(get_java_varint(buf)?);
            }
            Palette::Indirect(palette)
        } else if kind.allows_direct(bits) {
            Palette::Direct
        } else {
            return Err(ProtoError::InvalidData(format!("{bits} bits per entry in a {kind:?} container")));
        };

        let longs = read_count(buf, kind.size())?;
        if bits > 0 {
            let per_long = 64 / bits as usize;
            let expected = kind.size().div_ceil(per_long);
            if longs != expected {
                return Err(ProtoError::InvalidData(format!(
                    "{longs} longs for {bits} bits, expected {expected}"
                )));
            }
        }
        need(buf, longs * 8)?;
        let data = (0..longs).map(|_| buf.get_u64()).collect();
        Ok(Self { bits, palette, data })
    }

    pub fn write(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.bits);
        match &self.palette {
            Palette::Single(value) => put_java_varint(buf, *value),
            Palette::Indirect(palette) => {
                put_java_varint(buf, palette.len() as i32);
                for value in palette {
                    put_java_varint(buf, *value);
                }
            }
            Palette::Direct => {}
        }
        put_java_varint(buf, self.data.len() as i32);
        for word in &self.data {
            buf.put_u64(*word);
        }
    }

    /// Packs `values` the way a vanilla server would.
    pub fn from_values(values: &[i32], kind: ContainerKind) -> Self {
        let mut palette: Vec<i32> = Vec::new();
        for v in values {
            if !palette.contains(v) {
                palette.push(*v);
            }
        }
        if palette.len() <= 1 {
            return Self::single(palette.first().copied().unwrap_or(0));
        }
        let needed = (usize::BITS - (palette.len() - 1).leading_zeros()) as u8;
        let (bits, palette) = match kind.indirect_bits(needed) {
            Some(bits) => (bits, Palette::Indirect(palette)),
            None => (kind.direct_bits(), Palette::Direct),
        };
        let per_long = 64 / bits as usize;
        let mut data = vec![0u64; values.len().div_ceil(per_long)];
        for (i, v) in values.iter().enumerate() {
            let raw = match &palette {
                Palette::Indirect(p) => p.iter().position(|x| x == v).unwrap_or(0) as u64,
                _ => *v as u64,
            };
            data[i / per_long] |= raw << ((i % per_long) * bits as usize);
        }
        Self { bits, palette, data }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSection {
    pub block_count: i16,
    pub blocks: PalettedContainer,
    pub biomes: PalettedContainer,
}

impl ChunkSection {
    pub fn read(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            block_count: read_i16(buf)?,
            blocks: PalettedContainer::read(buf, ContainerKind::Blocks)?,
            biomes: PalettedContainer::read(buf, ContainerKind::Biomes)?,
        })
    }

    pub fn write(&self, buf: &mut impl BufMut) {
        buf.put_i16(self.block_count);
        self.blocks.write(buf);
        self.biomes.write(buf);
    }
}

/// Reads `count` sections from a chunk data blob.
pub fn read_sections(mut data: &[u8], count: usize) -> Result<Vec<ChunkSection>, ProtoError> {
    let mut sections = Vec::with_capacity(count);
    for _ in 0..count {
        sections.push(ChunkSection::read(&mut data)?);
    }
    Ok(sections)
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockEntityInfo {
    /// Section-relative x in the high nibble, z in the low nibble.
    pub packed_xz: u8,
    pub y: i16,
    pub type_id: i32,
}

impl BlockEntityInfo {
    pub fn x(&self) -> i32 {
        (self.packed_xz >> 4) as i32
    }

    pub fn z(&self) -> i32 {
        (self.packed_xz & 0x0F) as i32
    }
}

/// Body of the chunk data packet up to the light data, which is ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkData {
    pub x: i32,
    pub z: i32,
    pub data: Vec<u8>,
    pub block_entities: Vec<BlockEntityInfo>,
}

impl ChunkData {
    pub fn read(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        need(buf, 8)?;
        let x = buf.get_i32();
        let z = buf.get_i32();
        // heightmaps
        read_nbt_java(buf)?;
        let len = read_count(buf, 2 * 1024 * 1024)?;
        need(buf, len)?;
        let data = buf.copy_to_bytes(len).to_vec();
        let count = read_count(buf, 1 << 16)?;
        let mut block_entities = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            let packed_xz = read_u8(buf)?;
            let y = read_i16(buf)?;
            let type_id = get_java_varint(buf)?;
            read_nbt_java(buf)?;
            block_entities.push(BlockEntityInfo {
                packed_xz,
                y,
                type_id,
            });
        }
        buf.advance(buf.remaining());
        Ok(Self {
            x,
            z,
            data,
            block_entities,
        })
    }
}

/// One entry of the section blocks update packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionBlockChange {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub state: i32,
}

pub fn read_section_blocks(buf: &mut impl Buf) -> Result<Vec<SectionBlockChange>, ProtoError> {
    let section = read_i64(buf)?;
    let sx = (section >> 42) as i32;
    let sy = ((section << 44) >> 44) as i32;
    let sz = ((section << 22) >> 42) as i32;
    let count = read_count(buf, BLOCKS_PER_SECTION)?;
    let mut changes = Vec::with_capacity(count);
    for _ in 0..count {
        let entry = crate::varint::get_java_varlong(buf)?;
        changes.push(SectionBlockChange {
            x: (sx << 4) + ((entry >> 8) & 0xF) as i32,
            y: (sy << 4) + (entry & 0xF) as i32,
            z: (sz << 4) + ((entry >> 4) & 0xF) as i32,
            state: (entry >> 12) as i32,
        });
    }
    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn single_valued_section() {
        let section = ChunkSection {
            block_count: 0,
            blocks: PalettedContainer::single(0),
            biomes: PalettedContainer::single(3),
        };
        let mut buf = BytesMut::new();
        section.write(&mut buf);
        assert_eq!(&buf[..], &[0, 0, 0, 0, 0, 0, 3, 0]);
        let back = ChunkSection::read(&mut buf.freeze()).unwrap();
        assert_eq!(back.blocks.get(4095), 0);
        assert_eq!(back.biomes.get(10), 3);
    }

    #[test]
    fn indirect_blocks_use_at_least_four_bits() {
        let mut values = vec![1; BLOCKS_PER_SECTION];
        values[17] = 9;
        let container = PalettedContainer::from_values(&values, ContainerKind::Blocks);
        assert_eq!(container.bits, 4);
        assert_eq!(container.data.len(), 256);
        assert_eq!(container.get(17), 9);
        assert_eq!(container.get(16), 1);
    }

    #[test]
    fn non_power_of_two_bits_do_not_straddle() {
        // 5 bits: 12 entries per long, 4 bits of padding
        let values: Vec<i32> = (0..BLOCKS_PER_SECTION as i32).map(|i| i % 20).collect();
        let container = PalettedContainer::from_values(&values, ContainerKind::Blocks);
        assert_eq!(container.bits, 5);
        assert_eq!(container.data.len(), BLOCKS_PER_SECTION.div_ceil(12));
        for i in [0, 11, 12, 13, 4095] {
            assert_eq!(container.get(i), values[i]);
        }

        let mut buf = BytesMut::new();
        container.write(&mut buf);
        let back = PalettedContainer::read(&mut buf.freeze(), ContainerKind::Blocks).unwrap();
        assert_eq!(back, container);
    }

    #[test]
    fn direct_palette_holds_global_ids() {
        let values: Vec<i32> = (0..BLOCKS_PER_SECTION as i32).map(|i| i * 3).collect();
        let container = PalettedContainer::from_values(&values, ContainerKind::Blocks);
        assert_eq!(container.bits, 15);
        assert_eq!(container.palette, Palette::Direct);
        assert_eq!(container.get(1000), 3000);
        assert!(container.palette_values().is_none());
    }

    #[test]
    fn wrong_long_count_is_rejected() {
        let mut buf = BytesMut::new();
        buf.put_u8(4);
        put_java_varint(&mut buf, 1);
        put_java_varint(&mut buf, 0);
        put_java_varint(&mut buf, 1);
        buf.put_u64(0);
        assert!(PalettedContainer::read(&mut buf.freeze(), ContainerKind::Blocks).is_err());
    }

    fn container_with_bits(bits: u8, longs: usize) -> bytes::Bytes {
        let mut buf = BytesMut::new();
        buf.put_u8(bits);
        put_java_varint(&mut buf, longs as i32);
        for _ in 0..longs {
            buf.put_u64(u64::MAX);
        }
        buf.freeze()
    }

    #[test]
    fn oversized_entry_widths_are_rejected() {
        assert!(PalettedContainer::read(&mut container_with_bits(0xFF, 0), ContainerKind::Blocks).is_err());
        assert!(PalettedContainer::read(&mut container_with_bits(100, 0), ContainerKind::Blocks).is_err());
        assert!(PalettedContainer::read(&mut container_with_bits(64, BLOCKS_PER_SECTION), ContainerKind::Blocks).is_err());
        assert!(PalettedContainer::read(&mut container_with_bits(32, 2048), ContainerKind::Biomes).is_err());
    }

    #[test]
    fn widest_direct_palette_still_decodes() {
        let back = PalettedContainer::read(&mut container_with_bits(31, 32), ContainerKind::Biomes).unwrap();
        assert_eq!(back.palette, Palette::Direct);
        assert_eq!(back.get(63), i32::MAX);
    }

    #[test]
    fn hand_built_wide_container_reads_as_zero() {
        let container = PalettedContainer {
            bits: 64,
            palette: Palette::Direct,
            data: vec![u64::MAX; 4096],
        };
        assert_eq!(container.get(0), 0);
    }

    #[test]
    fn section_blocks_positions() {
        let mut buf = BytesMut::new();
        // section (1, -1, 2)
        let section: i64 = (1i64 << 42) | (2i64 << 20) | (-1i64 & 0xFFFFF);
        buf.put_i64(section);
        put_java_varint(&mut buf, 1);
        // state 5 at x=3, z=4, y=15
        crate::varint::put_java_varlong(&mut buf, (5 << 12) | (3 << 8) | (4 << 4) | 15);
        let changes = read_section_blocks(&mut buf.freeze()).unwrap();
        assert_eq!(
            changes,
            vec![SectionBlockChange {
                x: 19,
                y: -1,
                z: 36,
                state: 5
            }]
        );
    }
}
