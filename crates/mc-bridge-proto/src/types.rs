//! Value types shared by both protocols.

use std::fmt;
use std::str::FromStr;

use bytes::{Buf, BufMut};

use crate::codec::{need, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::varint::{get_var_u32, put_var_u32, VarInt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    pub fn chunk(self) -> ChunkPos {
        ChunkPos::new(self.x >> 4, self.z >> 4)
    }

    /// Java packs positions into one long: 26 bits x, 26 bits z, 12 bits y.
    pub fn from_java_packed(v: i64) -> Self {
        Self {
            x: (v >> 38) as i32,
            y: ((v << 52) >> 52) as i32,
            z: ((v << 26) >> 38) as i32,
        }
    }

    pub fn to_java_packed(self) -> i64 {
        ((self.x as i64 & 0x3FF_FFFF) << 38)
            | ((self.z as i64 & 0x3FF_FFFF) << 12)
            | (self.y as i64 & 0xFFF)
    }
}

/// Bedrock network form: zigzag x, unsigned y, zigzag z.
impl ProtoEncode for BlockPos {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarInt(self.x).proto_encode(buf);
        put_var_u32(buf, self.y as u32);
        VarInt(self.z).proto_encode(buf);
    }
}

impl ProtoDecode for BlockPos {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            x: VarInt::proto_decode(buf)?.0,
            y: get_var_u32(buf)? as i32,
            z: VarInt::proto_decode(buf)?.0,
        })
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl ProtoEncode for Vec3 {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_f32_le(self.x);
        buf.put_f32_le(self.y);
        buf.put_f32_le(self.z);
    }
}

impl ProtoDecode for Vec3 {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        need(buf, 12)?;
        Ok(Self::new(buf.get_f32_le(), buf.get_f32_le(), buf.get_f32_le()))
    }
}

/// 128-bit identifier; formats in the usual 8-4-4-4-12 hex layout.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Uuid(pub u128);

impl Uuid {
    pub fn most(self) -> u64 {
        (self.0 >> 64) as u64
    }

    pub fn least(self) -> u64 {
        self.0 as u64
    }

    pub fn from_halves(most: u64, least: u64) -> Self {
        Self(((most as u128) << 64) | least as u128)
    }

    /// Name-based v3 style identifier used for offline-mode players.
    /// It stays stable for a given name; it is not an MD5 digest.
    pub fn offline(name: &str) -> Self {
        let mut hash: u128 = 0x6c62_272e_07bb_0142_62b8_2175_6295_c58d;
        for byte in format!("OfflinePlayer:{name}").bytes() {
            hash ^= byte as u128;
            hash = hash.wrapping_mul(0x0000_0000_0100_0000_0000_0000_0000_013B);
        }
        // version 3, IETF variant
        hash = (hash & !(0xF000u128 << 64)) | (0x3000u128 << 64);
        hash = (hash & !(0xC000u128 << 48)) | (0x8000u128 << 48);
        Self(hash)
    }

    pub fn java_encode(self, buf: &mut impl BufMut) {
        buf.put_u128(self.0);
    }

    pub fn java_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        need(buf, 16)?;
        Ok(Self(buf.get_u128()))
    }
}

/// Bedrock writes each half little-endian, most significant half first.
impl ProtoEncode for Uuid {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u64_le(self.most());
        buf.put_u64_le(self.least());
    }
}

impl ProtoDecode for Uuid {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        need(buf, 16)?;
        let most = buf.get_u64_le();
        Ok(Self::from_halves(most, buf.get_u64_le()))
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
            (v >> 96) as u32,
            (v >> 80) as u16,
            (v >> 64) as u16,
            (v >> 48) as u16,
            v & 0xFFFF_FFFF_FFFF
        )
    }
}

impl fmt::Debug for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uuid({self})")
    }
}

impl FromStr for Uuid {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex: String = s.chars().filter(|c| *c != '-').collect();
        if hex.len() != 32 {
            return Err(ProtoError::InvalidData(format!("malformed UUID {s:?}")));
        }
        u128::from_str_radix(&hex, 16)
            .map(Uuid)
            .map_err(|_| ProtoError::InvalidData(format!("malformed UUID {s:?}")))
    }
}
