//! Items, containers and the server-authoritative stack request flow.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use mc_bridge_nbt::{read_nbt_le, write_nbt_le, NbtRoot};

use crate::bedrock::{id, BedrockPacket, DYNAMIC_CONTAINER_SINCE, FILTERED_TEXT_SINCE, FULL_CONTAINER_NAME_SINCE};
use crate::codec::{need, read_bool, read_string, read_u8, write_string, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::BlockPos;
use crate::varint::{get_var_u32, put_var_u32, VarInt, VarLong};

/// Item as sent in inventory and equipment packets. `network_id == 0` is air.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemStack {
    pub network_id: i32,
    pub count: u16,
    pub damage: u32,
    pub stack_network_id: Option<i32>,
    pub block_runtime_id: i32,
    /// Little-endian NBT (display name, enchantments, damage).
    pub nbt: Option<NbtRoot>,
    pub can_place_on: Vec<String>,
    pub can_destroy: Vec<String>,
}

impl ItemStack {
    pub fn new(network_id: i32, count: u16) -> Self {
        Self {
            network_id,
            count,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.network_id == 0 || self.count == 0
    }

    fn write_extra(&self, buf: &mut impl BufMut) {
        match &self.nbt {
            Some(root) => {
                buf.put_i16_le(-1);
                buf.put_u8(1);
                write_nbt_le(buf, root);
            }
            None => buf.put_i16_le(0),
        }
        for list in [&self.can_place_on, &self.can_destroy] {
            buf.put_i32_le(list.len() as i32);
            for name in list {
                buf.put_u16_le(name.len() as u16);
                buf.put_slice(name.as_bytes());
            }
        }
    }

    fn read_extra(&mut self, mut extra: Bytes) -> Result<(), ProtoError> {
        need(&extra, 2)?;
        let marker = extra.get_i16_le();
        if marker == -1 {
            let version = read_u8(&mut extra)?;
            if version != 1 {
                return Err(ProtoError::InvalidData(format!("item nbt version {version}")));
            }
            self.nbt = Some(read_nbt_le(&mut extra)?);
        } else if marker > 0 {
            return Err(ProtoError::Unsupported(format!("item nbt marker {marker}")));
        }
        self.can_place_on = read_short_strings(&mut extra)?;
        self.can_destroy = read_short_strings(&mut extra)?;
        Ok(())
    }
}

fn read_short_strings(buf: &mut impl Buf) -> Result<Vec<String>, ProtoError> {
    need(buf, 4)?;
    let count = buf.get_i32_le();
    let count = usize::try_from(count)
        .map_err(|_| ProtoError::InvalidData(format!("negative list length {count}")))?;
    let mut out = Vec::with_capacity(count.min(64));
    for _ in 0..count {
        need(buf, 2)?;
        let len = buf.get_u16_le() as usize;
        need(buf, len)?;
        let raw = buf.copy_to_bytes(len);
        out.push(String::from_utf8(raw.to_vec()).map_err(|_| ProtoError::InvalidUtf8)?);
    }
    Ok(out)
}

impl ProtoEncode for ItemStack {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarInt(self.network_id).proto_encode(buf);
        if self.network_id == 0 {
            return;
        }
        buf.put_u16_le(self.count);
        put_var_u32(buf, self.damage);
        match self.stack_network_id {
            Some(net_id) => {
                buf.put_u8(1);
                VarInt(net_id).proto_encode(buf);
            }
            None => buf.put_u8(0),
        }
        VarInt(self.block_runtime_id).proto_encode(buf);

        let mut extra = BytesMut::new();
        self.write_extra(&mut extra);
        put_var_u32(buf, extra.len() as u32);
        buf.put_slice(&extra);
    }
}

impl ProtoDecode for ItemStack {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let network_id = VarInt::proto_decode(buf)?.0;
        if network_id == 0 {
            return Ok(Self::default());
        }
        need(buf, 2)?;
        let count = buf.get_u16_le();
        let damage = get_var_u32(buf)?;
        let stack_network_id = if read_bool(buf)? {
            Some(VarInt::proto_decode(buf)?.0)
        } else {
            None
        };
        let block_runtime_id = VarInt::proto_decode(buf)?.0;
        let len = get_var_u32(buf)? as usize;
        need(buf, len)?;
        let extra = buf.copy_to_bytes(len);

        let mut item = Self {
            network_id,
            count,
            damage,
            stack_network_id,
            block_runtime_id,
            ..Default::default()
        };
        item.read_extra(extra)?;
        Ok(item)
    }
}

/// Container identifier used by stack requests and inventory packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FullContainerName {
    pub id: u8,
    pub dynamic_id: Option<u32>,
}

impl FullContainerName {
    pub fn new(id: u8) -> Self {
        Self { id, dynamic_id: None }
    }

    pub fn write_for(&self, buf: &mut impl BufMut, protocol: u32) {
        buf.put_u8(self.id);
        if protocol >= FULL_CONTAINER_NAME_SINCE {
            match self.dynamic_id {
                Some(dynamic) => {
                    buf.put_u8(1);
                    buf.put_u32_le(dynamic);
                }
                None => buf.put_u8(0),
            }
        } else if protocol >= DYNAMIC_CONTAINER_SINCE {
            buf.put_u32_le(self.dynamic_id.unwrap_or_default());
        }
    }

    pub fn read_for(buf: &mut impl Buf, protocol: u32) -> Result<Self, ProtoError> {
        let id = read_u8(buf)?;
        let dynamic_id = if protocol >= FULL_CONTAINER_NAME_SINCE {
            if read_bool(buf)? {
                need(buf, 4)?;
                Some(buf.get_u32_le())
            } else {
                None
            }
        } else if protocol >= DYNAMIC_CONTAINER_SINCE {
            need(buf, 4)?;
            Some(buf.get_u32_le()).filter(|d| *d != 0)
        } else {
            None
        };
        Ok(Self { id, dynamic_id })
    }
}

/// Container slot groups referenced by [`FullContainerName::id`].
pub mod container_slot {
    pub const ANVIL_INPUT: u8 = 0;
    pub const ANVIL_MATERIAL: u8 = 1;
    pub const ARMOR: u8 = 6;
    pub const LEVEL_ENTITY: u8 = 7;
    pub const BEACON_PAYMENT: u8 = 8;
    pub const COMBINED_INVENTORY: u8 = 12;
    pub const ENCHANTING_INPUT: u8 = 22;
    pub const ENCHANTING_MATERIAL: u8 = 23;
    pub const FURNACE_FUEL: u8 = 24;
    pub const FURNACE_INGREDIENT: u8 = 25;
    pub const FURNACE_RESULT: u8 = 26;
    pub const HORSE_EQUIP: u8 = 27;
    pub const HOTBAR: u8 = 28;
    pub const INVENTORY: u8 = 29;
    pub const OFFHAND: u8 = 34;
    pub const LOOM_INPUT: u8 = 41;
    pub const LOOM_DYE: u8 = 42;
    pub const LOOM_MATERIAL: u8 = 43;
    pub const LOOM_RESULT: u8 = 44;
    pub const BLAST_FURNACE_INGREDIENT: u8 = 45;
    pub const SMOKER_INGREDIENT: u8 = 46;
    pub const STONECUTTER_INPUT: u8 = 53;
    pub const STONECUTTER_RESULT: u8 = 54;
    pub const BARREL: u8 = 58;
    pub const CURSOR: u8 = 59;
    pub const CREATED_OUTPUT: u8 = 60;
}

/// Window types for [`ContainerOpen`].
pub mod container_type {
    pub const INVENTORY: i8 = -1;
    pub const CONTAINER: i8 = 0;
    pub const WORKBENCH: i8 = 1;
    pub const FURNACE: i8 = 2;
    pub const ENCHANTMENT: i8 = 3;
    pub const BREWING_STAND: i8 = 4;
    pub const ANVIL: i8 = 5;
    pub const DISPENSER: i8 = 6;
    pub const DROPPER: i8 = 7;
    pub const HOPPER: i8 = 8;
    pub const HORSE: i8 = 12;
    pub const BEACON: i8 = 13;
    pub const LOOM: i8 = 24;
    pub const GRINDSTONE: i8 = 26;
    pub const BLAST_FURNACE: i8 = 27;
    pub const SMOKER: i8 = 28;
    pub const STONECUTTER: i8 = 29;
    pub const CARTOGRAPHY: i8 = 30;
    pub const SMITHING_TABLE: i8 = 33;
}

/// Window ids with a fixed meaning.
pub mod window_id {
    pub const INVENTORY: u8 = 0;
    pub const OFFHAND: u8 = 119;
    pub const ARMOR: u8 = 120;
    pub const UI: u8 = 124;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerOpen {
    pub window_id: u8,
    pub container_type: i8,
    pub pos: BlockPos,
    /// -1 unless the container belongs to an entity such as a horse.
    pub entity_unique_id: i64,
}

impl ProtoEncode for ContainerOpen {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.window_id);
        buf.put_i8(self.container_type);
        self.pos.proto_encode(buf);
        VarLong(self.entity_unique_id).proto_encode(buf);
    }
}

impl BedrockPacket for ContainerOpen {
    const ID: u32 = id::CONTAINER_OPEN;
    const NAME: &'static str = "ContainerOpen";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerClose {
    pub window_id: u8,
    pub container_type: i8,
    pub server_initiated: bool,
}

impl ContainerClose {
    fn write(&self, buf: &mut impl BufMut, protocol: u32) {
        buf.put_u8(self.window_id);
        if protocol >= FILTERED_TEXT_SINCE {
            buf.put_i8(self.container_type);
        }
        buf.put_u8(self.server_initiated as u8);
    }

    pub fn decode_for(buf: &mut impl Buf, protocol: u32) -> Result<Self, ProtoError> {
        let window_id = read_u8(buf)?;
        let container_type = if protocol >= FILTERED_TEXT_SINCE {
            read_u8(buf)? as i8
        } else {
            container_type::CONTAINER
        };
        Ok(Self {
            window_id,
            container_type,
            server_initiated: read_bool(buf)?,
        })
    }
}

impl ProtoEncode for ContainerClose {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        self.write(buf, crate::bedrock::CANONICAL_PROTOCOL);
    }
}

impl BedrockPacket for ContainerClose {
    const ID: u32 = id::CONTAINER_CLOSE;
    const NAME: &'static str = "ContainerClose";

    fn encode_for(&self, buf: &mut BytesMut, protocol: u32) {
        self.write(buf, protocol);
    }
}

/// Whole-window refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryContent {
    pub window_id: u32,
    pub items: Vec<ItemStack>,
    pub container: FullContainerName,
}

impl InventoryContent {
    fn write(&self, buf: &mut impl BufMut, protocol: u32) {
        put_var_u32(buf, self.window_id);
        put_var_u32(buf, self.items.len() as u32);
        for item in &self.items {
            item.proto_encode(buf);
        }
        write_container_suffix(buf, &self.container, protocol);
    }
}

fn write_container_suffix(buf: &mut impl BufMut, container: &FullContainerName, protocol: u32) {
    if protocol >= FULL_CONTAINER_NAME_SINCE {
        container.write_for(buf, protocol);
    } else if protocol >= DYNAMIC_CONTAINER_SINCE {
        put_var_u32(buf, container.dynamic_id.unwrap_or_default());
    }
}

impl ProtoEncode for InventoryContent {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        self.write(buf, crate::bedrock::CANONICAL_PROTOCOL);
    }
}

impl BedrockPacket for InventoryContent {
    const ID: u32 = id::INVENTORY_CONTENT;
    const NAME: &'static str = "InventoryContent";

    fn encode_for(&self, buf: &mut BytesMut, protocol: u32) {
        self.write(buf, protocol);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InventorySlot {
    pub window_id: u32,
    pub slot: u32,
    pub container: FullContainerName,
    pub item: ItemStack,
}

impl InventorySlot {
    fn write(&self, buf: &mut impl BufMut, protocol: u32) {
        put_var_u32(buf, self.window_id);
        put_var_u32(buf, self.slot);
        write_container_suffix(buf, &self.container, protocol);
        self.item.proto_encode(buf);
    }
}

impl ProtoEncode for InventorySlot {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        self.write(buf, crate::bedrock::CANONICAL_PROTOCOL);
    }
}

impl BedrockPacket for InventorySlot {
    const ID: u32 = id::INVENTORY_SLOT;
    const NAME: &'static str = "InventorySlot";

    fn encode_for(&self, buf: &mut BytesMut, protocol: u32) {
        self.write(buf, protocol);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackRequestSlot {
    pub container: FullContainerName,
    pub slot: u8,
    pub stack_network_id: i32,
}

impl StackRequestSlot {
    fn read_for(buf: &mut impl Buf, protocol: u32) -> Result<Self, ProtoError> {
        Ok(Self {
            container: FullContainerName::read_for(buf, protocol)?,
            slot: read_u8(buf)?,
            stack_network_id: VarInt::proto_decode(buf)?.0,
        })
    }

    fn write_for(&self, buf: &mut impl BufMut, protocol: u32) {
        self.container.write_for(buf, protocol);
        buf.put_u8(self.slot);
        VarInt(self.stack_network_id).proto_encode(buf);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackAction {
    Take {
        count: u8,
        source: StackRequestSlot,
        destination: StackRequestSlot,
    },
    Place {
        count: u8,
        source: StackRequestSlot,
        destination: StackRequestSlot,
    },
    Swap {
        source: StackRequestSlot,
        destination: StackRequestSlot,
    },
    Drop {
        count: u8,
        source: StackRequestSlot,
        randomly: bool,
    },
    Destroy {
        count: u8,
        source: StackRequestSlot,
    },
    Consume {
        count: u8,
        source: StackRequestSlot,
    },
}

impl StackAction {
    fn read_for(buf: &mut impl Buf, protocol: u32) -> Result<Self, ProtoError> {
        let kind = read_u8(buf)?;
        Ok(match kind {
            0 | 1 => {
                let count = read_u8(buf)?;
                let source = StackRequestSlot::read_for(buf, protocol)?;
                let destination = StackRequestSlot::read_for(buf, protocol)?;
                if kind == 0 {
                    Self::Take { count, source, destination }
                } else {
                    Self::Place { count, source, destination }
                }
            }
            2 => Self::Swap {
                source: StackRequestSlot::read_for(buf, protocol)?,
                destination: StackRequestSlot::read_for(buf, protocol)?,
            },
            3 => Self::Drop {
                count: read_u8(buf)?,
                source: StackRequestSlot::read_for(buf, protocol)?,
                randomly: read_bool(buf)?,
            },
            4 | 5 => {
                let count = read_u8(buf)?;
                let source = StackRequestSlot::read_for(buf, protocol)?;
                if kind == 4 {
                    Self::Destroy { count, source }
                } else {
                    Self::Consume { count, source }
                }
            }
            other => return Err(ProtoError::Unsupported(format!("stack action {other}"))),
        })
    }

    fn write_for(&self, buf: &mut impl BufMut, protocol: u32) {
        match self {
            Self::Take { count, source, destination } | Self::Place { count, source, destination } => {
                buf.put_u8(if matches!(self, Self::Take { .. }) { 0 } else { 1 });
                buf.put_u8(*count);
                source.write_for(buf, protocol);
                destination.write_for(buf, protocol);
            }
            Self::Swap { source, destination } => {
                buf.put_u8(2);
                source.write_for(buf, protocol);
                destination.write_for(buf, protocol);
            }
            Self::Drop { count, source, randomly } => {
                buf.put_u8(3);
                buf.put_u8(*count);
                source.write_for(buf, protocol);
                buf.put_u8(*randomly as u8);
            }
            Self::Destroy { count, source } | Self::Consume { count, source } => {
                buf.put_u8(if matches!(self, Self::Destroy { .. }) { 4 } else { 5 });
                buf.put_u8(*count);
                source.write_for(buf, protocol);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackRequest {
    pub request_id: i32,
    pub actions: Vec<StackAction>,
    pub filter_strings: Vec<String>,
    pub filter_cause: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemStackRequest {
    pub requests: Vec<StackRequest>,
}

impl ItemStackRequest {
    pub fn decode_for(buf: &mut impl Buf, protocol: u32) -> Result<Self, ProtoError> {
        let count = get_var_u32(buf)?;
        let mut requests = Vec::new();
        for _ in 0..count {
            let request_id = VarInt::proto_decode(buf)?.0;
            let action_count = get_var_u32(buf)?;
            let mut actions = Vec::new();
            for _ in 0..action_count {
                actions.push(StackAction::read_for(buf, protocol)?);
            }
            let filter_count = get_var_u32(buf)?;
            let mut filter_strings = Vec::new();
            for _ in 0..filter_count {
                filter_strings.push(read_string(buf)?);
            }
            need(buf, 4)?;
            let filter_cause = buf.get_i32_le();
            requests.push(StackRequest {
                request_id,
                actions,
                filter_strings,
                filter_cause,
            });
        }
        Ok(Self { requests })
    }

    pub fn encode_for(&self, buf: &mut impl BufMut, protocol: u32) {
        put_var_u32(buf, self.requests.len() as u32);
        for request in &self.requests {
            VarInt(request.request_id).proto_encode(buf);
            put_var_u32(buf, request.actions.len() as u32);
            for action in &request.actions {
                action.write_for(buf, protocol);
            }
            put_var_u32(buf, request.filter_strings.len() as u32);
            for s in &request.filter_strings {
                write_string(buf, s);
            }
            buf.put_i32_le(request.filter_cause);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StackResponseSlot {
    pub slot: u8,
    pub hotbar_slot: u8,
    pub count: u8,
    pub stack_network_id: i32,
    pub custom_name: String,
    pub filtered_custom_name: String,
    pub durability_correction: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackResponseContainer {
    pub container: FullContainerName,
    pub slots: Vec<StackResponseSlot>,
}

/// Status 0 is success; any other value rejects the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackResponse {
    pub status: u8,
    pub request_id: i32,
    pub containers: Vec<StackResponseContainer>,
}

impl StackResponse {
    pub fn rejected(request_id: i32) -> Self {
        Self {
            status: 1,
            request_id,
            containers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemStackResponse {
    pub responses: Vec<StackResponse>,
}

impl ItemStackResponse {
    fn write(&self, buf: &mut impl BufMut, protocol: u32) {
        put_var_u32(buf, self.responses.len() as u32);
        for response in &self.responses {
            buf.put_u8(response.status);
            VarInt(response.request_id).proto_encode(buf);
            if response.status != 0 {
                continue;
            }
            put_var_u32(buf, response.containers.len() as u32);
            for container in &response.containers {
                container.container.write_for(buf, protocol);
                put_var_u32(buf, container.slots.len() as u32);
                for slot in &container.slots {
                    buf.put_u8(slot.slot);
                    buf.put_u8(slot.hotbar_slot);
                    buf.put_u8(slot.count);
                    VarInt(slot.stack_network_id).proto_encode(buf);
                    write_string(buf, &slot.custom_name);
                    write_string(buf, &slot.filtered_custom_name);
                    VarInt(slot.durability_correction).proto_encode(buf);
                }
            }
        }
    }
}

impl ProtoEncode for ItemStackResponse {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        self.write(buf, crate::bedrock::CANONICAL_PROTOCOL);
    }
}

impl BedrockPacket for ItemStackResponse {
    const ID: u32 = id::ITEM_STACK_RESPONSE;
    const NAME: &'static str = "ItemStackResponse";

    fn encode_for(&self, buf: &mut BytesMut, protocol: u32) {
        self.write(buf, protocol);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_bridge_nbt::{NbtCompound, NbtTag};

    fn slot(container: u8, slot: u8) -> StackRequestSlot {
        StackRequestSlot {
            container: FullContainerName::new(container),
            slot,
            stack_network_id: 3,
        }
    }

    #[test]
    fn empty_item_is_one_byte() {
        let mut buf = BytesMut::new();
        ItemStack::default().proto_encode(&mut buf);
        assert_eq!(&buf[..], &[0]);
        assert!(ItemStack::proto_decode(&mut buf.freeze()).unwrap().is_empty());
    }

    #[test]
    fn item_with_nbt_and_adventure_lists() {
        let mut display = NbtCompound::new();
        display.insert("Name".into(), NbtTag::String("Excalibur".into()));
        let mut tag = NbtCompound::new();
        tag.insert("display".into(), NbtTag::Compound(display));

        let item = ItemStack {
            network_id: 316,
            count: 1,
            damage: 12,
            stack_network_id: Some(44),
            block_runtime_id: 0,
            nbt: Some(NbtRoot::new("", tag)),
            can_place_on: vec!["minecraft:stone".into()],
            can_destroy: Vec::new(),
        };
        let mut buf = BytesMut::new();
        item.proto_encode(&mut buf);
        assert_eq!(ItemStack::proto_decode(&mut buf.freeze()).unwrap(), item);
    }

    #[test]
    fn container_name_layout_per_protocol() {
        let name = FullContainerName {
            id: container_slot::HOTBAR,
            dynamic_id: Some(9),
        };
        let mut new = BytesMut::new();
        name.write_for(&mut new, 729);
        assert_eq!(&new[..], &[28, 1, 9, 0, 0, 0]);

        let mut mid = BytesMut::new();
        name.write_for(&mut mid, 712);
        assert_eq!(&mid[..], &[28, 9, 0, 0, 0]);

        let mut old = BytesMut::new();
        name.write_for(&mut old, 685);
        assert_eq!(&old[..], &[28]);

        assert_eq!(FullContainerName::read_for(&mut new.freeze(), 729).unwrap(), name);
        assert_eq!(FullContainerName::read_for(&mut mid.freeze(), 712).unwrap(), name);
    }

    #[test]
    fn container_close_type_is_gated() {
        let close = ContainerClose {
            window_id: 2,
            container_type: container_type::FURNACE,
            server_initiated: true,
        };
        let mut new = BytesMut::new();
        close.encode_for(&mut new, 729);
        assert_eq!(&new[..], &[2, 2, 1]);
        let mut old = BytesMut::new();
        close.encode_for(&mut old, 671);
        assert_eq!(&old[..], &[2, 1]);
        let back = ContainerClose::decode_for(&mut old.freeze(), 671).unwrap();
        assert_eq!(back.container_type, container_type::CONTAINER);
    }

    #[test]
    fn inventory_slot_suffix_depends_on_protocol() {
        let packet = InventorySlot {
            window_id: 0,
            slot: 4,
            container: FullContainerName::new(container_slot::INVENTORY),
            item: ItemStack::default(),
        };
        let mut new = BytesMut::new();
        packet.encode_for(&mut new, 729);
        assert_eq!(&new[..], &[0, 4, 29, 0, 0]);
        let mut mid = BytesMut::new();
        packet.encode_for(&mut mid, 712);
        assert_eq!(&mid[..], &[0, 4, 0, 0]);
        let mut old = BytesMut::new();
        packet.encode_for(&mut old, 662);
        assert_eq!(&old[..], &[0, 4, 0]);
    }

    #[test]
    fn stack_request_actions_decode() {
        for protocol in [729, 712, 671] {
            let request = ItemStackRequest {
                requests: vec![StackRequest {
                    request_id: -3,
                    actions: vec![
                        StackAction::Take {
                            count: 16,
                            source: slot(7, 0),
                            destination: slot(container_slot::CURSOR, 0),
                        },
                        StackAction::Drop {
                            count: 1,
                            source: slot(container_slot::HOTBAR, 2),
                            randomly: false,
                        },
                    ],
                    filter_strings: Vec::new(),
                    filter_cause: 0,
                }],
            };
            let mut buf = BytesMut::new();
            request.encode_for(&mut buf, protocol);
            assert_eq!(ItemStackRequest::decode_for(&mut buf.freeze(), protocol).unwrap(), request);
        }
    }

    #[test]
    fn unknown_stack_action_is_unsupported() {
        // one request, id 0, one action of type 9
        let mut raw: &[u8] = &[1, 0, 1, 9];
        assert!(matches!(
            ItemStackRequest::decode_for(&mut raw, 729),
            Err(ProtoError::Unsupported(_))
        ));
    }

    #[test]
    fn rejected_response_has_no_containers() {
        let mut buf = BytesMut::new();
        ItemStackResponse {
            responses: vec![StackResponse::rejected(-5)],
        }
        .proto_encode(&mut buf);
        assert_eq!(&buf[..], &[1, 1, 9]);
    }
}
