//! Bedrock packets the bridge sends or understands.
//!
//! Only the subset the translators need. Every sub-packet starts with a
//! VarUInt header whose low ten bits are the packet id.

pub mod entity;
pub mod inventory;
pub mod login;
pub mod text;
pub mod world;

use bytes::{Bytes, BytesMut};

use crate::codec::{ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::varint::{get_var_u32, put_var_u32};

pub use entity::{
    EntityLink, EntityLinkKind, MetadataValue, MobArmorEquipment, MobEquipment, RemoveEntity,
    SetEntityData, SetEntityLink,
};
pub use inventory::{
    container_slot, container_type, window_id, ContainerClose, ContainerOpen, FullContainerName, InventoryContent, InventorySlot, ItemStack,
    ItemStackRequest, ItemStackResponse, StackAction, StackRequest, StackRequestSlot,
    StackResponse, StackResponseContainer, StackResponseSlot,
};
pub use login::{Disconnect, Login, NetworkSettings, PlayStatus, RequestNetworkSettings};
pub use text::{CommandOrigin, CommandRequest, Text, TextKind};
pub use world::{BlockActorData, LevelChunk, NetworkChunkPublisherUpdate, UpdateBlock};

pub mod id {
    pub const LOGIN: u32 = 0x01;
    pub const PLAY_STATUS: u32 = 0x02;
    pub const DISCONNECT: u32 = 0x05;
    pub const TEXT: u32 = 0x09;
    pub const REMOVE_ENTITY: u32 = 0x0E;
    pub const UPDATE_BLOCK: u32 = 0x15;
    pub const MOB_EQUIPMENT: u32 = 0x1F;
    pub const MOB_ARMOR_EQUIPMENT: u32 = 0x20;
    pub const SET_ENTITY_DATA: u32 = 0x27;
    pub const SET_ENTITY_LINK: u32 = 0x29;
    pub const CONTAINER_OPEN: u32 = 0x2E;
    pub const CONTAINER_CLOSE: u32 = 0x2F;
    pub const INVENTORY_CONTENT: u32 = 0x31;
    pub const INVENTORY_SLOT: u32 = 0x32;
    pub const BLOCK_ACTOR_DATA: u32 = 0x38;
    pub const LEVEL_CHUNK: u32 = 0x3A;
    pub const COMMAND_REQUEST: u32 = 0x4D;
    pub const NETWORK_CHUNK_PUBLISHER_UPDATE: u32 = 0x79;
    pub const NETWORK_SETTINGS: u32 = 0x8F;
    pub const ITEM_STACK_REQUEST: u32 = 0x93;
    pub const ITEM_STACK_RESPONSE: u32 = 0x94;
    pub const REQUEST_NETWORK_SETTINGS: u32 = 0xC1;
}

/// Newest protocol the bridge speaks natively.
pub const CANONICAL_PROTOCOL: u32 = 729;

/// Supported protocols with their game versions, newest first.
pub const SUPPORTED_PROTOCOLS: &[(u32, &str)] = &[
    (729, "1.21.30"),
    (712, "1.21.20"),
    (685, "1.21.0"),
    (671, "1.20.80"),
    (662, "1.20.70"),
    (649, "1.20.60"),
];

pub fn is_supported_protocol(protocol: u32) -> bool {
    SUPPORTED_PROTOCOLS.iter().any(|(p, _)| *p == protocol)
}

pub fn game_version(protocol: u32) -> Option<&'static str> {
    SUPPORTED_PROTOCOLS
        .iter()
        .find(|(p, _)| *p == protocol)
        .map(|(_, v)| *v)
}

/// Protocols at or above this carry `FullContainerName` instead of a bare id.
pub const FULL_CONTAINER_NAME_SINCE: u32 = 729;
/// Filtered text fields and container types on close.
pub const FILTERED_TEXT_SINCE: u32 = 685;
/// Dynamic container ids, body armor slot and filtered disconnect text.
pub const DYNAMIC_CONTAINER_SINCE: u32 = 712;

pub trait BedrockPacket: ProtoEncode {
    const ID: u32;
    const NAME: &'static str;

    /// Layout for an older client. Defaults to the canonical layout.
    fn encode_for(&self, buf: &mut BytesMut, protocol: u32) {
        let _ = protocol;
        self.proto_encode(buf);
    }
}

/// Header + body for the given client protocol, ready for a batch.
pub fn encode_packet<P: BedrockPacket>(packet: &P, protocol: u32) -> Bytes {
    let mut buf = BytesMut::new();
    put_var_u32(&mut buf, P::ID & 0x3FF);
    packet.encode_for(&mut buf, protocol);
    buf.freeze()
}

/// Packets a client sends that the bridge decodes. Anything else is kept raw.
#[derive(Debug, Clone)]
pub enum Serverbound {
    RequestNetworkSettings(RequestNetworkSettings),
    Login(Login),
    Text(Text),
    CommandRequest(CommandRequest),
    ContainerClose(ContainerClose),
    ItemStackRequest(ItemStackRequest),
    MobEquipment(MobEquipment),
    Other { id: u32, body: Bytes },
}

impl Serverbound {
    pub fn decode(mut raw: Bytes, protocol: u32) -> Result<Self, ProtoError> {
        let id = get_var_u32(&mut raw)? & 0x3FF;
        let buf = &mut raw;
        Ok(match id {
            id::REQUEST_NETWORK_SETTINGS => {
                Self::RequestNetworkSettings(RequestNetworkSettings::proto_decode(buf)?)
            }
            id::LOGIN => Self::Login(Login::proto_decode(buf)?),
            id::TEXT => Self::Text(Text::proto_decode(buf)?),
            id::COMMAND_REQUEST => Self::CommandRequest(CommandRequest::proto_decode(buf)?),
            id::CONTAINER_CLOSE => Self::ContainerClose(ContainerClose::decode_for(buf, protocol)?),
            id::ITEM_STACK_REQUEST => {
                Self::ItemStackRequest(ItemStackRequest::decode_for(buf, protocol)?)
            }
            id::MOB_EQUIPMENT => Self::MobEquipment(MobEquipment::proto_decode(buf)?),
            _ => Self::Other { id, body: raw },
        })
    }

    pub fn id(&self) -> u32 {
        match self {
            Self::RequestNetworkSettings(_) => id::REQUEST_NETWORK_SETTINGS,
            Self::Login(_) => id::LOGIN,
            Self::Text(_) => id::TEXT,
            Self::CommandRequest(_) => id::COMMAND_REQUEST,
            Self::ContainerClose(_) => id::CONTAINER_CLOSE,
            Self::ItemStackRequest(_) => id::ITEM_STACK_REQUEST,
            Self::MobEquipment(_) => id::MOB_EQUIPMENT,
            Self::Other { id, .. } => *id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::RequestNetworkSettings(_) => "RequestNetworkSettings",
            Self::Login(_) => "Login",
            Self::Text(_) => "Text",
            Self::CommandRequest(_) => "CommandRequest",
            Self::ContainerClose(_) => "ContainerClose",
            Self::ItemStackRequest(_) => "ItemStackRequest",
            Self::MobEquipment(_) => "MobEquipment",
            Self::Other { .. } => "Other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_carries_id() {
        let raw = encode_packet(&PlayStatus::LoginSuccess, CANONICAL_PROTOCOL);
        assert_eq!(&raw[..], &[0x02, 0, 0, 0, 0]);
    }

    #[test]
    fn request_network_settings_is_decoded() {
        let raw = Bytes::from_static(&[0xC1, 0x01, 0x00, 0x00, 0x02, 0xD9]);
        match Serverbound::decode(raw, CANONICAL_PROTOCOL).unwrap() {
            Serverbound::RequestNetworkSettings(r) => assert_eq!(r.protocol, 729),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_ids_stay_raw() {
        let raw = Bytes::from_static(&[0x90, 0x01, 0xAA]);
        let packet = Serverbound::decode(raw, CANONICAL_PROTOCOL).unwrap();
        assert_eq!(packet.id(), 0x90);
        assert!(matches!(packet, Serverbound::Other { ref body, .. } if body[..] == [0xAA]));
    }

    #[test]
    fn protocol_table() {
        assert!(is_supported_protocol(CANONICAL_PROTOCOL));
        assert!(is_supported_protocol(649));
        assert!(!is_supported_protocol(630));
        assert_eq!(game_version(685), Some("1.21.0"));
    }
}
