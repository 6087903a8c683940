//! Play state packets the bridge translates.

use bytes::{Buf, BufMut, Bytes};
use mc_bridge_nbt::NbtTag;

use crate::codec::{read_bool, read_string, read_u8, write_string};
use crate::error::ProtoError;
use crate::java::chunk::{read_section_blocks, ChunkData, SectionBlockChange};
use crate::java::metadata::{read_metadata, MetaValue};
use crate::java::slot::{read_slot, write_slot, JavaItem};
use crate::java::{
    read_component, read_count, read_f32, read_f64, read_i16, read_i32, read_i64, read_i8,
    split_id, JavaServerbound,
};
use crate::types::{BlockPos, Uuid};
use crate::varint::{get_java_varint, put_java_varint};

pub mod clientbound_id {
    pub const SPAWN_ENTITY: i32 = 0x01;
    pub const BLOCK_ACTION: i32 = 0x08;
    pub const BLOCK_UPDATE: i32 = 0x09;
    pub const CHUNK_BATCH_FINISHED: i32 = 0x0C;
    pub const CHUNK_BATCH_START: i32 = 0x0D;
    pub const CLOSE_CONTAINER: i32 = 0x12;
    pub const SET_CONTAINER_CONTENT: i32 = 0x13;
    pub const SET_CONTAINER_SLOT: i32 = 0x15;
    pub const DISCONNECT: i32 = 0x1D;
    pub const UNLOAD_CHUNK: i32 = 0x21;
    pub const OPEN_HORSE_SCREEN: i32 = 0x23;
    pub const KEEP_ALIVE: i32 = 0x26;
    pub const CHUNK_DATA: i32 = 0x27;
    pub const LOGIN: i32 = 0x2B;
    pub const OPEN_SCREEN: i32 = 0x33;
    pub const SYNC_PLAYER_POSITION: i32 = 0x40;
    pub const REMOVE_ENTITIES: i32 = 0x42;
    pub const SECTION_BLOCKS_UPDATE: i32 = 0x49;
    pub const SET_CENTER_CHUNK: i32 = 0x54;
    pub const SET_ENTITY_METADATA: i32 = 0x58;
    pub const SET_EQUIPMENT: i32 = 0x5B;
    pub const SET_PASSENGERS: i32 = 0x5F;
    pub const START_CONFIGURATION: i32 = 0x69;
    pub const SYSTEM_CHAT: i32 = 0x6C;
}

/// Equipment slot as sent in Set Equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EquipmentSlot {
    MainHand,
    OffHand,
    Boots,
    Leggings,
    Chestplate,
    Helmet,
    Body,
}

impl EquipmentSlot {
    fn from_id(id: u8) -> Result<Self, ProtoError> {
        Ok(match id {
            0 => Self::MainHand,
            1 => Self::OffHand,
            2 => Self::Boots,
            3 => Self::Leggings,
            4 => Self::Chestplate,
            5 => Self::Helmet,
            6 => Self::Body,
            other => return Err(ProtoError::InvalidData(format!("equipment slot {other}"))),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinGame {
    pub entity_id: i32,
    pub view_distance: i32,
    pub dimension_type: i32,
    pub dimension_name: String,
    pub game_mode: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpawnEntity {
    pub entity_id: i32,
    pub uuid: Uuid,
    pub entity_type: i32,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub data: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayClientbound {
    SpawnEntity(SpawnEntity),
    BlockAction {
        pos: BlockPos,
        action: u8,
        param: u8,
        block_type: i32,
    },
    BlockUpdate {
        pos: BlockPos,
        state: i32,
    },
    ChunkBatchStart,
    ChunkBatchFinished {
        size: i32,
    },
    CloseContainer {
        window_id: u8,
    },
    SetContainerContent {
        window_id: u8,
        state_id: i32,
        items: Vec<Option<JavaItem>>,
        carried: Option<JavaItem>,
    },
    SetContainerSlot {
        window_id: i8,
        state_id: i32,
        slot: i16,
        item: Option<JavaItem>,
    },
    Disconnect(NbtTag),
    UnloadChunk {
        x: i32,
        z: i32,
    },
    OpenHorseScreen {
        window_id: u8,
        /// Chest columns of three slots each.
        columns: i32,
        entity_id: i32,
    },
    KeepAlive(i64),
    ChunkData(ChunkData),
    Login(JoinGame),
    OpenScreen {
        window_id: i32,
        window_type: i32,
        title: NbtTag,
    },
    SyncPlayerPosition {
        x: f64,
        y: f64,
        z: f64,
        yaw: f32,
        pitch: f32,
        flags: i8,
        teleport_id: i32,
    },
    RemoveEntities(Vec<i32>),
    SectionBlocksUpdate(Vec<SectionBlockChange>),
    SetCenterChunk {
        x: i32,
        z: i32,
    },
    SetEntityMetadata {
        entity_id: i32,
        entries: Vec<(u8, MetaValue)>,
    },
    SetEquipment {
        entity_id: i32,
        equipment: Vec<(EquipmentSlot, Option<JavaItem>)>,
    },
    SetPassengers {
        vehicle: i32,
        passengers: Vec<i32>,
    },
    StartConfiguration,
    SystemChat {
        content: NbtTag,
        overlay: bool,
    },
    Other {
        id: i32,
    },
}

fn read_ids(buf: &mut impl Buf) -> Result<Vec<i32>, ProtoError> {
    let count = read_count(buf, 1 << 16)?;
    let mut ids = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        ids.push(get_java_varint(buf)?);
    }
    Ok(ids)
}

fn read_join_game(buf: &mut impl Buf) -> Result<JoinGame, ProtoError> {
    let entity_id = read_i32(buf)?;
    let _hardcore = read_bool(buf)?;
    let dimensions = read_count(buf, 1024)?;
    for _ in 0..dimensions {
        read_string(buf)?;
    }
    let _max_players = get_java_varint(buf)?;
    let view_distance = get_java_varint(buf)?;
    let _simulation_distance = get_java_varint(buf)?;
    let _reduced_debug = read_bool(buf)?;
    let _respawn_screen = read_bool(buf)?;
    let _limited_crafting = read_bool(buf)?;
    let dimension_type = get_java_varint(buf)?;
    let dimension_name = read_string(buf)?;
    let _hashed_seed = read_i64(buf)?;
    let game_mode = read_u8(buf)?;
    buf.advance(buf.remaining());
    Ok(JoinGame {
        entity_id,
        view_distance,
        dimension_type,
        dimension_name,
        game_mode,
    })
}

impl PlayClientbound {
    pub fn decode(raw: Bytes) -> Result<Self, ProtoError> {
        use clientbound_id as cid;

        let (id, mut body) = split_id(raw)?;
        let buf = &mut body;
        Ok(match id {
            cid::SPAWN_ENTITY => {
                let entity_id = get_java_varint(buf)?;
                let uuid = Uuid::java_decode(buf)?;
                let entity_type = get_java_varint(buf)?;
                let (x, y, z) = (read_f64(buf)?, read_f64(buf)?, read_f64(buf)?);
                // pitch, yaw, head yaw
                for _ in 0..3 {
                    read_u8(buf)?;
                }
                let data = get_java_varint(buf)?;
                buf.advance(buf.remaining());
                Self::SpawnEntity(SpawnEntity {
                    entity_id,
                    uuid,
                    entity_type,
                    x,
                    y,
                    z,
                    data,
                })
            }
            cid::BLOCK_ACTION => Self::BlockAction {
                pos: BlockPos::from_java_packed(read_i64(buf)?),
                action: read_u8(buf)?,
                param: read_u8(buf)?,
                block_type: get_java_varint(buf)?,
            },
            cid::BLOCK_UPDATE => Self::BlockUpdate {
                pos: BlockPos::from_java_packed(read_i64(buf)?),
                state: get_java_varint(buf)?,
            },
            cid::CHUNK_BATCH_START => Self::ChunkBatchStart,
            cid::CHUNK_BATCH_FINISHED => Self::ChunkBatchFinished {
                size: get_java_varint(buf)?,
            },
            cid::CLOSE_CONTAINER => Self::CloseContainer {
                window_id: read_u8(buf)?,
            },
            cid::SET_CONTAINER_CONTENT => {
                let window_id = read_u8(buf)?;
                let state_id = get_java_varint(buf)?;
                let count = read_count(buf, 256)?;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(read_slot(buf)?);
                }
                Self::SetContainerContent {
                    window_id,
                    state_id,
                    items,
                    carried: read_slot(buf)?,
                }
            }
            cid::SET_CONTAINER_SLOT => Self::SetContainerSlot {
                window_id: read_i8(buf)?,
                state_id: get_java_varint(buf)?,
                slot: read_i16(buf)?,
                item: read_slot(buf)?,
            },
            cid::DISCONNECT => Self::Disconnect(read_component(buf)?),
            cid::UNLOAD_CHUNK => {
                let z = read_i32(buf)?;
                let x = read_i32(buf)?;
                Self::UnloadChunk { x, z }
            }
            cid::OPEN_HORSE_SCREEN => Self::OpenHorseScreen {
                window_id: read_u8(buf)?,
                columns: get_java_varint(buf)?,
                entity_id: read_i32(buf)?,
            },
            cid::KEEP_ALIVE => Self::KeepAlive(read_i64(buf)?),
            cid::CHUNK_DATA => Self::ChunkData(ChunkData::read(buf)?),
            cid::LOGIN => Self::Login(read_join_game(buf)?),
            cid::OPEN_SCREEN => Self::OpenScreen {
                window_id: get_java_varint(buf)?,
                window_type: get_java_varint(buf)?,
                title: read_component(buf)?,
            },
            cid::SYNC_PLAYER_POSITION => Self::SyncPlayerPosition {
                x: read_f64(buf)?,
                y: read_f64(buf)?,
                z: read_f64(buf)?,
                yaw: read_f32(buf)?,
                pitch: read_f32(buf)?,
                flags: read_i8(buf)?,
                teleport_id: get_java_varint(buf)?,
            },
            cid::REMOVE_ENTITIES => Self::RemoveEntities(read_ids(buf)?),
            cid::SECTION_BLOCKS_UPDATE => Self::SectionBlocksUpdate(read_section_blocks(buf)?),
            cid::SET_CENTER_CHUNK => Self::SetCenterChunk {
                x: get_java_varint(buf)?,
                z: get_java_varint(buf)?,
            },
            cid::SET_ENTITY_METADATA => Self::SetEntityMetadata {
                entity_id: get_java_varint(buf)?,
                entries: read_metadata(buf)?,
            },
            cid::SET_EQUIPMENT => {
                let entity_id = get_java_varint(buf)?;
                let mut equipment = Vec::new();
                loop {
                    let raw = read_u8(buf)?;
                    let slot = EquipmentSlot::from_id(raw & 0x7F)?;
                    equipment.push((slot, read_slot(buf)?));
                    // top bit set means another entry follows
                    if raw & 0x80 == 0 {
                        break;
                    }
                }
                Self::SetEquipment {
                    entity_id,
                    equipment,
                }
            }
            cid::SET_PASSENGERS => Self::SetPassengers {
                vehicle: get_java_varint(buf)?,
                passengers: read_ids(buf)?,
            },
            cid::START_CONFIGURATION => Self::StartConfiguration,
            cid::SYSTEM_CHAT => Self::SystemChat {
                content: read_component(buf)?,
                overlay: read_bool(buf)?,
            },
            other => Self::Other { id: other },
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::SpawnEntity(_) => "SpawnEntity",
            Self::BlockAction { .. } => "BlockAction",
            Self::BlockUpdate { .. } => "BlockUpdate",
            Self::ChunkBatchStart => "ChunkBatchStart",
            Self::ChunkBatchFinished { .. } => "ChunkBatchFinished",
            Self::CloseContainer { .. } => "CloseContainer",
            Self::SetContainerContent { .. } => "SetContainerContent",
            Self::SetContainerSlot { .. } => "SetContainerSlot",
            Self::Disconnect(_) => "Disconnect",
            Self::UnloadChunk { .. } => "UnloadChunk",
            Self::OpenHorseScreen { .. } => "OpenHorseScreen",
            Self::KeepAlive(_) => "KeepAlive",
            Self::ChunkData(_) => "ChunkData",
            Self::Login(_) => "Login",
            Self::OpenScreen { .. } => "OpenScreen",
            Self::SyncPlayerPosition { .. } => "SyncPlayerPosition",
            Self::RemoveEntities(_) => "RemoveEntities",
            Self::SectionBlocksUpdate(_) => "SectionBlocksUpdate",
            Self::SetCenterChunk { .. } => "SetCenterChunk",
            Self::SetEntityMetadata { .. } => "SetEntityMetadata",
            Self::SetEquipment { .. } => "SetEquipment",
            Self::SetPassengers { .. } => "SetPassengers",
            Self::StartConfiguration => "StartConfiguration",
            Self::SystemChat { .. } => "SystemChat",
            Self::Other { .. } => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmTeleport(pub i32);

impl JavaServerbound for ConfirmTeleport {
    const ID: i32 = 0x00;

    fn write(&self, buf: &mut impl BufMut) {
        put_java_varint(buf, self.0);
    }
}

/// Unsigned command, without the leading slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatCommand(pub String);

impl JavaServerbound for ChatCommand {
    const ID: i32 = 0x04;

    fn write(&self, buf: &mut impl BufMut) {
        write_string(buf, &self.0);
    }
}

/// Unsigned chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub message: String,
    pub timestamp: i64,
    pub salt: i64,
}

impl JavaServerbound for ChatMessage {
    const ID: i32 = 0x06;

    fn write(&self, buf: &mut impl BufMut) {
        write_string(buf, &self.message);
        buf.put_i64(self.timestamp);
        buf.put_i64(self.salt);
        // no signature, no acknowledged messages
        buf.put_u8(0);
        put_java_varint(buf, 0);
        buf.put_slice(&[0, 0, 0]);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkBatchReceived {
    pub chunks_per_tick: f32,
}

impl JavaServerbound for ChunkBatchReceived {
    const ID: i32 = 0x08;

    fn write(&self, buf: &mut impl BufMut) {
        buf.put_f32(self.chunks_per_tick);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcknowledgeConfiguration;

impl JavaServerbound for AcknowledgeConfiguration {
    const ID: i32 = 0x0C;

    fn write(&self, _buf: &mut impl BufMut) {}
}

pub mod click_mode {
    pub const PICKUP: i32 = 0;
    pub const QUICK_MOVE: i32 = 1;
    pub const SWAP: i32 = 2;
    pub const THROW: i32 = 4;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClickContainer {
    pub window_id: u8,
    pub state_id: i32,
    pub slot: i16,
    pub button: i8,
    pub mode: i32,
    pub changed: Vec<(i16, Option<JavaItem>)>,
    pub carried: Option<JavaItem>,
}

impl JavaServerbound for ClickContainer {
    const ID: i32 = 0x0E;

    fn write(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.window_id);
        put_java_varint(buf, self.state_id);
        buf.put_i16(self.slot);
        buf.put_i8(self.button);
        put_java_varint(buf, self.mode);
        put_java_varint(buf, self.changed.len() as i32);
        for (slot, item) in &self.changed {
            buf.put_i16(*slot);
            write_slot(buf, item.as_ref());
        }
        write_slot(buf, self.carried.as_ref());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseContainer {
    pub window_id: u8,
}

impl JavaServerbound for CloseContainer {
    const ID: i32 = 0x0F;

    fn write(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.window_id);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayKeepAlive(pub i64);

impl JavaServerbound for PlayKeepAlive {
    const ID: i32 = 0x18;

    fn write(&self, buf: &mut impl BufMut) {
        buf.put_i64(self.0);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetHeldItem {
    pub slot: i16,
}

impl JavaServerbound for SetHeldItem {
    const ID: i32 = 0x2F;

    fn write(&self, buf: &mut impl BufMut) {
        buf.put_i16(self.slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::java::encode_serverbound;
    use crate::java::metadata::write_metadata;
    use bytes::BytesMut;
    use mc_bridge_nbt::write_nbt_java;

    fn packet(id: i32, body: impl FnOnce(&mut BytesMut)) -> Bytes {
        let mut buf = BytesMut::new();
        put_java_varint(&mut buf, id);
        body(&mut buf);
        buf.freeze()
    }

    #[test]
    fn block_update() {
        let pos = BlockPos::new(-5, 70, 12);
        let raw = packet(clientbound_id::BLOCK_UPDATE, |b| {
            b.put_i64(pos.to_java_packed());
            put_java_varint(b, 1);
        });
        assert_eq!(
            PlayClientbound::decode(raw).unwrap(),
            PlayClientbound::BlockUpdate { pos, state: 1 }
        );
    }

    #[test]
    fn unload_chunk_reads_z_first() {
        let raw = packet(clientbound_id::UNLOAD_CHUNK, |b| {
            b.put_i32(7);
            b.put_i32(-2);
        });
        assert_eq!(
            PlayClientbound::decode(raw).unwrap(),
            PlayClientbound::UnloadChunk { x: -2, z: 7 }
        );
    }

    #[test]
    fn equipment_continuation_bit() {
        let raw = packet(clientbound_id::SET_EQUIPMENT, |b| {
            put_java_varint(b, 4);
            b.put_u8(0x80 | 5);
            write_slot(b, Some(&JavaItem::new(900, 1)));
            b.put_u8(0);
            write_slot(b, None);
        });
        match PlayClientbound::decode(raw).unwrap() {
            PlayClientbound::SetEquipment {
                entity_id,
                equipment,
            } => {
                assert_eq!(entity_id, 4);
                assert_eq!(equipment.len(), 2);
                assert_eq!(equipment[0].0, EquipmentSlot::Helmet);
                assert_eq!(equipment[1], (EquipmentSlot::MainHand, None));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn metadata_and_chat() {
        let raw = packet(clientbound_id::SET_ENTITY_METADATA, |b| {
            put_java_varint(b, 12);
            write_metadata(b, &[(0, MetaValue::Byte(2))]);
        });
        assert_eq!(
            PlayClientbound::decode(raw).unwrap(),
            PlayClientbound::SetEntityMetadata {
                entity_id: 12,
                entries: vec![(0, MetaValue::Byte(2))]
            }
        );

        let raw = packet(clientbound_id::SYSTEM_CHAT, |b| {
            write_nbt_java(b, Some(&NbtTag::String("hi".into())));
            b.put_u8(1);
        });
        assert_eq!(
            PlayClientbound::decode(raw).unwrap(),
            PlayClientbound::SystemChat {
                content: NbtTag::String("hi".into()),
                overlay: true
            }
        );
    }

    #[test]
    fn chat_message_is_unsigned() {
        let raw = encode_serverbound(&ChatMessage {
            message: "hey".into(),
            timestamp: 1,
            salt: 2,
        });
        assert_eq!(raw[0], 0x06);
        assert_eq!(&raw[1..5], &[3, b'h', b'e', b'y']);
        assert_eq!(&raw[raw.len() - 5..], &[0, 0, 0, 0, 0]);
    }

    #[test]
    fn click_container_layout() {
        let raw = encode_serverbound(&ClickContainer {
            window_id: 2,
            state_id: 5,
            slot: 10,
            button: 0,
            mode: click_mode::PICKUP,
            changed: vec![(10, None)],
            carried: Some(JavaItem::new(1, 64)),
        });
        assert_eq!(&raw[..], &[0x0E, 2, 5, 0, 10, 0, 0, 1, 0, 10, 0, 64, 1, 0, 0]);
    }

    #[test]
    fn unknown_play_packets_are_kept() {
        let raw = packet(0x7F, |_| {});
        assert_eq!(
            PlayClientbound::decode(raw).unwrap(),
            PlayClientbound::Other { id: 0x7F }
        );
    }
}
