//! Java entity metadata entries.

use bytes::{Buf, BufMut};
use mc_bridge_nbt::{read_nbt_java, write_nbt_java, NbtTag};

use crate::codec::{read_bool, read_string, read_u8, write_string};
use crate::error::ProtoError;
use crate::java::slot::{read_slot, write_slot, JavaItem};
use crate::java::{read_component, read_f32, read_i64};
use crate::types::{BlockPos, Uuid};
use crate::varint::{get_java_varint, get_java_varlong, put_java_varint, put_java_varlong};

const END: u8 = 0xFF;

#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Byte(i8),
    VarInt(i32),
    VarLong(i64),
    Float(f32),
    String(String),
    Component(NbtTag),
    OptionalComponent(Option<NbtTag>),
    Slot(Option<JavaItem>),
    Boolean(bool),
    Rotations([f32; 3]),
    Position(BlockPos),
    OptionalPosition(Option<BlockPos>),
    Direction(i32),
    OptionalUuid(Option<Uuid>),
    BlockState(i32),
    /// 0 means absent.
    OptionalBlockState(i32),
    Nbt(Option<NbtTag>),
    VillagerData { kind: i32, profession: i32, level: i32 },
    /// Stored as id + 1; 0 means absent.
    OptionalVarInt(i32),
    Pose(i32),
    CatVariant(i32),
    WolfVariant(i32),
    FrogVariant(i32),
    OptionalGlobalPos(Option<(String, BlockPos)>),
    PaintingVariant(i32),
    SnifferState(i32),
    ArmadilloState(i32),
    Vector3([f32; 3]),
    Quaternion([f32; 4]),
}

impl MetaValue {
    pub fn as_byte(&self) -> Option<i8> {
        match self {
            Self::Byte(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::VarInt(v)
            | Self::Direction(v)
            | Self::BlockState(v)
            | Self::Pose(v)
            | Self::CatVariant(v)
            | Self::WolfVariant(v)
            | Self::FrogVariant(v)
            | Self::PaintingVariant(v) => Some(*v),
            Self::Byte(v) => Some(*v as i32),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    fn type_id(&self) -> i32 {
        match self {
            Self::Byte(_) => 0,
            Self::VarInt(_) => 1,
            Self::VarLong(_) => 2,
            Self::Float(_) => 3,
            Self::String(_) => 4,
            Self::Component(_) => 5,
            Self::OptionalComponent(_) => 6,
            Self::Slot(_) => 7,
            Self::Boolean(_) => 8,
            Self::Rotations(_) => 9,
            Self::Position(_) => 10,
            Self::OptionalPosition(_) => 11,
            Self::Direction(_) => 12,
            Self::OptionalUuid(_) => 13,
            Self::BlockState(_) => 14,
            Self::OptionalBlockState(_) => 15,
            Self::Nbt(_) => 16,
            Self::VillagerData { .. } => 19,
            Self::OptionalVarInt(_) => 20,
            Self::Pose(_) => 21,
            Self::CatVariant(_) => 22,
            Self::WolfVariant(_) => 23,
            Self::FrogVariant(_) => 24,
            Self::OptionalGlobalPos(_) => 25,
            Self::PaintingVariant(_) => 26,
            Self::SnifferState(_) => 27,
            Self::ArmadilloState(_) => 28,
            Self::Vector3(_) => 29,
            Self::Quaternion(_) => 30,
        }
    }

    fn read(buf: &mut impl Buf, type_id: i32) -> Result<Self, ProtoError> {
        Ok(match type_id {
            0 => Self::Byte(read_u8(buf)? as i8),
            1 => Self::VarInt(get_java_varint(buf)?),
            2 => Self::VarLong(get_java_varlong(buf)?),
            3 => Self::Float(read_f32(buf)?),
            4 => Self::String(read_string(buf)?),
            5 => Self::Component(read_component(buf)?),
            6 => Self::OptionalComponent(if read_bool(buf)? {
                Some(read_component(buf)?)
            } else {
                None
            }),
            7 => Self::Slot(read_slot(buf)?),
            8 => Self::Boolean(read_bool(buf)?),
            9 => Self::Rotations([read_f32(buf)?, read_f32(buf)?, read_f32(buf)?]),
            10 => Self::Position(BlockPos::from_java_packed(read_i64(buf)?)),
            11 => Self::OptionalPosition(if read_bool(buf)? {
                Some(BlockPos::from_java_packed(read_i64(buf)?))
            } else {
                None
            }),
            12 => Self::Direction(get_java_varint(buf)?),
            13 => Self::OptionalUuid(if read_bool(buf)? {
                Some(Uuid::java_decode(buf)?)
            } else {
                None
            }),
            14 => Self::BlockState(get_java_varint(buf)?),
            15 => Self::OptionalBlockState(get_java_varint(buf)?),
            16 => Self::Nbt(read_nbt_java(buf)?),
            17 | 18 => return Err(ProtoError::Unsupported(format!("particle metadata {type_id}"))),
            19 => Self::VillagerData {
                kind: get_java_varint(buf)?,
                profession: get_java_varint(buf)?,
                level: get_java_varint(buf)?,
            },
            20 => Self::OptionalVarInt(get_java_varint(buf)?),
            21 => Self::Pose(get_java_varint(buf)?),
            22 => Self::CatVariant(get_java_varint(buf)?),
            23 => Self::WolfVariant(get_java_varint(buf)?),
            24 => Self::FrogVariant(get_java_varint(buf)?),
            25 => Self::OptionalGlobalPos(if read_bool(buf)? {
                let dimension = read_string(buf)?;
                Some((dimension, BlockPos::from_java_packed(read_i64(buf)?)))
            } else {
                None
            }),
            26 => Self::PaintingVariant(get_java_varint(buf)?),
            27 => Self::SnifferState(get_java_varint(buf)?),
            28 => Self::ArmadilloState(get_java_varint(buf)?),
            29 => Self::Vector3([read_f32(buf)?, read_f32(buf)?, read_f32(buf)?]),
            30 => Self::Quaternion([read_f32(buf)?, read_f32(buf)?, read_f32(buf)?, read_f32(buf)?]),
            other => return Err(ProtoError::InvalidData(format!("metadata type {other}"))),
        })
    }

    fn write(&self, buf: &mut impl BufMut) {
        put_java_varint(buf, self.type_id());
        match self {
            Self::Byte(v) => buf.put_i8(*v),
            Self::VarInt(v)
            | Self::Direction(v)
            | Self::BlockState(v)
            | Self::OptionalBlockState(v)
            | Self::OptionalVarInt(v)
            | Self::Pose(v)
            | Self::CatVariant(v)
            | Self::WolfVariant(v)
            | Self::FrogVariant(v)
            | Self::PaintingVariant(v)
            | Self::SnifferState(v)
            | Self::ArmadilloState(v) => put_java_varint(buf, *v),
            Self::VarLong(v) => put_java_varlong(buf, *v),
            Self::Float(v) => buf.put_f32(*v),
            Self::String(v) => write_string(buf, v),
            Self::Component(tag) => write_nbt_java(buf, Some(tag)),
            Self::OptionalComponent(tag) => {
                buf.put_u8(tag.is_some() as u8);
                if let Some(tag) = tag {
                    write_nbt_java(buf, Some(tag));
                }
            }
            Self::Slot(item) => write_slot(buf, item.as_ref()),
            Self::Boolean(v) => buf.put_u8(*v as u8),
            Self::Rotations(v) | Self::Vector3(v) => v.iter().for_each(|f| buf.put_f32(*f)),
            Self::Quaternion(v) => v.iter().for_each(|f| buf.put_f32(*f)),
            Self::Position(pos) => buf.put_i64(pos.to_java_packed()),
            Self::OptionalPosition(pos) => {
                buf.put_u8(pos.is_some() as u8);
                if let Some(pos) = pos {
                    buf.put_i64(pos.to_java_packed());
                }
            }
            Self::OptionalUuid(uuid) => {
                buf.put_u8(uuid.is_some() as u8);
                if let Some(uuid) = uuid {
                    uuid.java_encode(buf);
                }
            }
            Self::Nbt(tag) => write_nbt_java(buf, tag.as_ref()),
            Self::VillagerData {
                kind,
                profession,
                level,
            } => {
                put_java_varint(buf, *kind);
                put_java_varint(buf, *profession);
                put_java_varint(buf, *level);
            }
            Self::OptionalGlobalPos(pos) => {
                buf.put_u8(pos.is_some() as u8);
                if let Some((dimension, pos)) = pos {
                    write_string(buf, dimension);
                    buf.put_i64(pos.to_java_packed());
                }
            }
        }
    }
}

/// Reads entries until the 0xFF terminator.
pub fn read_metadata(buf: &mut impl Buf) -> Result<Vec<(u8, MetaValue)>, ProtoError> {
    let mut entries = Vec::new();
    loop {
        let index = read_u8(buf)?;
        if index == END {
            return Ok(entries);
        }
        let type_id = get_java_varint(buf)?;
        entries.push((index, MetaValue::read(buf, type_id)?));
    }
}

pub fn write_metadata(buf: &mut impl BufMut, entries: &[(u8, MetaValue)]) {
    for (index, value) in entries {
        buf.put_u8(*index);
        value.write(buf);
    }
    buf.put_u8(END);
}
