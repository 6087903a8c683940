//! Chunk and block packets.

use bytes::{BufMut, Bytes};
use mc_bridge_nbt::{write_nbt_network, NbtCompound, NbtRoot, NbtTag};

use crate::bedrock::{id, BedrockPacket};
use crate::codec::ProtoEncode;
use crate::types::{BlockPos, ChunkPos};
use crate::varint::{put_var_u32, VarInt};

/// A full column. `payload` is produced by the world crate's serializer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelChunk {
    pub pos: ChunkPos,
    pub dimension: i32,
    pub sub_chunk_count: u32,
    pub payload: Bytes,
}

impl ProtoEncode for LevelChunk {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarInt(self.pos.x).proto_encode(buf);
        VarInt(self.pos.z).proto_encode(buf);
        VarInt(self.dimension).proto_encode(buf);
        put_var_u32(buf, self.sub_chunk_count);
        // blob cache not used
        buf.put_u8(0);
        put_var_u32(buf, self.payload.len() as u32);
        buf.put_slice(&self.payload);
    }
}

impl BedrockPacket for LevelChunk {
    const ID: u32 = id::LEVEL_CHUNK;
    const NAME: &'static str = "LevelChunk";
}

pub mod update_flags {
    pub const NEIGHBORS: u32 = 0b0001;
    pub const NETWORK: u32 = 0b0010;
    pub const NO_GRAPHICS: u32 = 0b0100;
    pub const PRIORITY: u32 = 0b1000;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateBlock {
    pub pos: BlockPos,
    pub runtime_id: u32,
    pub flags: u32,
    /// 0 for the block itself, 1 for the liquid layer.
    pub layer: u32,
}

impl UpdateBlock {
    pub fn new(pos: BlockPos, runtime_id: u32, layer: u32) -> Self {
        Self {
            pos,
            runtime_id,
            flags: update_flags::NEIGHBORS | update_flags::NETWORK,
            layer,
        }
    }
}

impl ProtoEncode for UpdateBlock {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        self.pos.proto_encode(buf);
        put_var_u32(buf, self.runtime_id);
        put_var_u32(buf, self.flags);
        put_var_u32(buf, self.layer);
    }
}

impl BedrockPacket for UpdateBlock {
    const ID: u32 = id::UPDATE_BLOCK;
    const NAME: &'static str = "UpdateBlock";
}

/// Block entity NBT for one position.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockActorData {
    pub pos: BlockPos,
    pub nbt: NbtRoot,
}

impl BlockActorData {
    /// One half of a double chest. Both halves point at each other.
    pub fn chest_half(pos: BlockPos, pair: BlockPos) -> Self {
        let mut tag = NbtCompound::new();
        tag.insert("id".into(), NbtTag::String("Chest".into()));
        tag.insert("x".into(), NbtTag::Int(pos.x));
        tag.insert("y".into(), NbtTag::Int(pos.y));
        tag.insert("z".into(), NbtTag::Int(pos.z));
        tag.insert("pairx".into(), NbtTag::Int(pair.x));
        tag.insert("pairz".into(), NbtTag::Int(pair.z));
        Self {
            pos,
            nbt: NbtRoot::new("", tag),
        }
    }
}

impl ProtoEncode for BlockActorData {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        self.pos.proto_encode(buf);
        write_nbt_network(buf, &self.nbt);
    }
}

impl BedrockPacket for BlockActorData {
    const ID: u32 = id::BLOCK_ACTOR_DATA;
    const NAME: &'static str = "BlockActorData";
}

/// Tells the client which area it should keep loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkChunkPublisherUpdate {
    pub pos: BlockPos,
    /// In blocks.
    pub radius: u32,
    pub saved_chunks: Vec<ChunkPos>,
}

impl ProtoEncode for NetworkChunkPublisherUpdate {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        // signed y here, unlike the usual block position
        VarInt(self.pos.x).proto_encode(buf);
        VarInt(self.pos.y).proto_encode(buf);
        VarInt(self.pos.z).proto_encode(buf);
        put_var_u32(buf, self.radius);
        buf.put_u32_le(self.saved_chunks.len() as u32);
        for chunk in &self.saved_chunks {
            VarInt(chunk.x).proto_encode(buf);
            VarInt(chunk.z).proto_encode(buf);
        }
    }
}

impl BedrockPacket for NetworkChunkPublisherUpdate {
    const ID: u32 = id::NETWORK_CHUNK_PUBLISHER_UPDATE;
    const NAME: &'static str = "NetworkChunkPublisherUpdate";
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn level_chunk_layout() {
        let mut buf = BytesMut::new();
        LevelChunk {
            pos: ChunkPos::new(-1, 2),
            dimension: 0,
            sub_chunk_count: 24,
            payload: Bytes::from_static(&[9, 9, 9]),
        }
        .proto_encode(&mut buf);
        assert_eq!(&buf[..], &[0x01, 0x04, 0x00, 24, 0x00, 3, 9, 9, 9]);
    }

    #[test]
    fn update_block_defaults_to_network_flags() {
        let mut buf = BytesMut::new();
        UpdateBlock::new(BlockPos::new(0, 1, 0), 300, 1).proto_encode(&mut buf);
        assert_eq!(&buf[..], &[0x00, 0x01, 0x00, 0xAC, 0x02, 0x03, 0x01]);
    }

    #[test]
    fn chest_halves_reference_each_other() {
        let data = BlockActorData::chest_half(BlockPos::new(4, 60, -2), BlockPos::new(5, 60, -2));
        assert_eq!(data.nbt.compound.get("pairx"), Some(&NbtTag::Int(5)));
        assert_eq!(data.nbt.compound.get("pairz"), Some(&NbtTag::Int(-2)));

        let mut buf = BytesMut::new();
        data.proto_encode(&mut buf);
        let mut nbt = &buf[3..];
        let back = mc_bridge_nbt::read_nbt_network(&mut nbt).unwrap();
        assert_eq!(back, data.nbt);
        // x 4, y 60 unsigned, z -2 zigzagged
        assert_eq!(&buf[..4], &[0x08, 0x3C, 0x03, 0x0A]);
    }

    #[test]
    fn publisher_update_uses_signed_y() {
        let mut buf = BytesMut::new();
        NetworkChunkPublisherUpdate {
            pos: BlockPos::new(0, -1, 0),
            radius: 64,
            saved_chunks: Vec::new(),
        }
        .proto_encode(&mut buf);
        assert_eq!(&buf[..], &[0x00, 0x01, 0x00, 0x40, 0, 0, 0, 0]);
    }
}
