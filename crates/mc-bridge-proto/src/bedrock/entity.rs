//! Entity metadata, links and equipment.

use bytes::{Buf, BufMut, BytesMut};

use crate::bedrock::inventory::ItemStack;
use crate::bedrock::{id, BedrockPacket, DYNAMIC_CONTAINER_SINCE};
use crate::codec::{need, read_u8, write_string, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::{BlockPos, Vec3};
use crate::varint::{get_var_u64, put_var_u32, put_var_u64, VarInt, VarLong};

#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Byte(i8),
    Short(i16),
    Int(i32),
    Float(f32),
    String(String),
    /// Already serialized network NBT.
    Nbt(Vec<u8>),
    Pos(BlockPos),
    Long(i64),
    Vec3(Vec3),
}

impl MetadataValue {
    fn type_id(&self) -> u32 {
        match self {
            Self::Byte(_) => 0,
            Self::Short(_) => 1,
            Self::Int(_) => 2,
            Self::Float(_) => 3,
            Self::String(_) => 4,
            Self::Nbt(_) => 5,
            Self::Pos(_) => 6,
            Self::Long(_) => 7,
            Self::Vec3(_) => 8,
        }
    }
}

impl ProtoEncode for MetadataValue {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        match self {
            Self::Byte(v) => buf.put_i8(*v),
            Self::Short(v) => buf.put_i16_le(*v),
            Self::Int(v) => VarInt(*v).proto_encode(buf),
            Self::Float(v) => buf.put_f32_le(*v),
            Self::String(v) => write_string(buf, v),
            Self::Nbt(v) => buf.put_slice(v),
            Self::Pos(p) => {
                VarInt(p.x).proto_encode(buf);
                VarInt(p.y).proto_encode(buf);
                VarInt(p.z).proto_encode(buf);
            }
            Self::Long(v) => VarLong(*v).proto_encode(buf),
            Self::Vec3(v) => v.proto_encode(buf),
        }
    }
}

/// Sparse metadata update for one entity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetEntityData {
    pub runtime_id: u64,
    pub entries: Vec<(u32, MetadataValue)>,
    pub tick: u64,
}

impl ProtoEncode for SetEntityData {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        put_var_u64(buf, self.runtime_id);
        put_var_u32(buf, self.entries.len() as u32);
        for (key, value) in &self.entries {
            put_var_u32(buf, *key);
            put_var_u32(buf, value.type_id());
            value.proto_encode(buf);
        }
        // no int or float properties
        put_var_u32(buf, 0);
        put_var_u32(buf, 0);
        put_var_u64(buf, self.tick);
    }
}

impl BedrockPacket for SetEntityData {
    const ID: u32 = id::SET_ENTITY_DATA;
    const NAME: &'static str = "SetEntityData";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityLinkKind {
    Remove,
    Rider,
    Passenger,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityLink {
    pub vehicle_unique_id: i64,
    pub rider_unique_id: i64,
    pub kind: EntityLinkKind,
    pub immediate: bool,
    pub rider_initiated: bool,
    pub angular_velocity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetEntityLink {
    pub link: EntityLink,
}

impl ProtoEncode for SetEntityLink {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        let link = &self.link;
        VarLong(link.vehicle_unique_id).proto_encode(buf);
        VarLong(link.rider_unique_id).proto_encode(buf);
        buf.put_u8(match link.kind {
            EntityLinkKind::Remove => 0,
            EntityLinkKind::Rider => 1,
            EntityLinkKind::Passenger => 2,
        });
        buf.put_u8(link.immediate as u8);
        buf.put_u8(link.rider_initiated as u8);
        buf.put_f32_le(link.angular_velocity);
    }
}

impl BedrockPacket for SetEntityLink {
    const ID: u32 = id::SET_ENTITY_LINK;
    const NAME: &'static str = "SetEntityLink";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveEntity {
    pub unique_id: i64,
}

impl ProtoEncode for RemoveEntity {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarLong(self.unique_id).proto_encode(buf);
    }
}

impl BedrockPacket for RemoveEntity {
    const ID: u32 = id::REMOVE_ENTITY;
    const NAME: &'static str = "RemoveEntity";
}

/// Held item. Sent by the server for other entities and by the client when
/// it changes hotbar slot.
#[derive(Debug, Clone, PartialEq)]
pub struct MobEquipment {
    pub runtime_id: u64,
    pub item: ItemStack,
    pub inventory_slot: u8,
    pub hotbar_slot: u8,
    pub container_id: u8,
}

impl ProtoEncode for MobEquipment {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        put_var_u64(buf, self.runtime_id);
        self.item.proto_encode(buf);
        buf.put_u8(self.inventory_slot);
        buf.put_u8(self.hotbar_slot);
        buf.put_u8(self.container_id);
    }
}

impl ProtoDecode for MobEquipment {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let runtime_id = get_var_u64(buf)?;
        let item = ItemStack::proto_decode(buf)?;
        need(buf, 3)?;
        Ok(Self {
            runtime_id,
            item,
            inventory_slot: buf.get_u8(),
            hotbar_slot: buf.get_u8(),
            container_id: read_u8(buf)?,
        })
    }
}

impl BedrockPacket for MobEquipment {
    const ID: u32 = id::MOB_EQUIPMENT;
    const NAME: &'static str = "MobEquipment";
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MobArmorEquipment {
    pub runtime_id: u64,
    pub helmet: ItemStack,
    pub chestplate: ItemStack,
    pub leggings: ItemStack,
    pub boots: ItemStack,
    /// Horse and wolf armor.
    pub body: ItemStack,
}

impl MobArmorEquipment {
    fn write(&self, buf: &mut impl BufMut, with_body: bool) {
        put_var_u64(buf, self.runtime_id);
        for item in [&self.helmet, &self.chestplate, &self.leggings, &self.boots] {
            item.proto_encode(buf);
        }
        if with_body {
            self.body.proto_encode(buf);
        }
    }
}

impl ProtoEncode for MobArmorEquipment {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        self.write(buf, true);
    }
}

impl BedrockPacket for MobArmorEquipment {
    const ID: u32 = id::MOB_ARMOR_EQUIPMENT;
    const NAME: &'static str = "MobArmorEquipment";

    fn encode_for(&self, buf: &mut BytesMut, protocol: u32) {
        self.write(buf, protocol >= DYNAMIC_CONTAINER_SINCE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_data_layout() {
        let mut buf = BytesMut::new();
        SetEntityData {
            runtime_id: 5,
            entries: vec![(0, MetadataValue::Long(1 << 14)), (4, MetadataValue::String("Rex".into()))],
            tick: 0,
        }
        .proto_encode(&mut buf);
        assert_eq!(buf[0], 5);
        assert_eq!(buf[1], 2);
        assert_eq!(&buf[2..4], &[0, 7]);
        // zigzag varlong of 16384
        assert_eq!(&buf[4..7], &[0x80, 0x80, 0x02]);
        assert_eq!(&buf[7..13], &[4, 4, 3, b'R', b'e', b'x']);
        assert_eq!(&buf[13..], &[0, 0, 0]);
    }

    #[test]
    fn link_kind_byte() {
        let mut buf = BytesMut::new();
        SetEntityLink {
            link: EntityLink {
                vehicle_unique_id: 1,
                rider_unique_id: 2,
                kind: EntityLinkKind::Passenger,
                immediate: false,
                rider_initiated: true,
                angular_velocity: 0.0,
            },
        }
        .proto_encode(&mut buf);
        assert_eq!(&buf[..5], &[2, 4, 2, 0, 1]);
    }

    #[test]
    fn body_armor_only_for_newer_clients() {
        let armor = MobArmorEquipment {
            runtime_id: 2,
            ..Default::default()
        };
        let mut new = BytesMut::new();
        armor.encode_for(&mut new, 729);
        let mut old = BytesMut::new();
        armor.encode_for(&mut old, 685);
        assert_eq!(&new[..], &[2, 0, 0, 0, 0, 0]);
        assert_eq!(&old[..], &[2, 0, 0, 0, 0]);
    }

    #[test]
    fn equipment_decodes_from_client() {
        let original = MobEquipment {
            runtime_id: 1,
            item: ItemStack::default(),
            inventory_slot: 3,
            hotbar_slot: 3,
            container_id: 0,
        };
        let mut buf = BytesMut::new();
        original.proto_encode(&mut buf);
        assert_eq!(MobEquipment::proto_decode(&mut buf.freeze()).unwrap(), original);
    }
}
