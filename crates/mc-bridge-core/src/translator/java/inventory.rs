//! Container windows opened, filled and closed by the server.

use std::sync::Arc;

use mc_bridge_proto::bedrock::{container_slot, container_type, BlockActorData, ContainerOpen};
use mc_bridge_proto::java::play::{CloseContainer, PlayClientbound};
use mc_bridge_proto::java::slot::JavaItem;
use mc_bridge_proto::types::BlockPos;
use tracing::{debug, warn};

use crate::context::JavaRegistry;
use crate::dispatch::{HandlerOptions, HandlerState};
use crate::error::BridgeError;
use crate::inventory::virtual_block::{self, FakeBlock};
use crate::inventory::{content_packets, slot_packet, BedrockSlot, ContainerKind};
use crate::item;
use crate::session::Session;
use crate::translator::close_container;

/// Java window id for "the cursor".
const CURSOR_WINDOW: i8 = -1;
/// Java window id addressing the player inventory whatever is open.
const PLAYER_WINDOW: i8 = -2;

pub(super) fn register(registry: &mut JavaRegistry) {
    registry.register("OpenScreen", HandlerOptions::tagged("inventory:open"), |s: &mut Session, packet: &PlayClientbound| {
        let PlayClientbound::OpenScreen { window_id, window_type, .. } = *packet else {
            return Ok(HandlerState::Continue);
        };
        let Ok(java_window) = u8::try_from(window_id) else {
            warn!(session = s.id(), window_id, "window id out of range");
            return Ok(HandlerState::Handled);
        };
        let Some(kind) = ContainerKind::from_java_menu(window_type) else {
            debug!(session = s.id(), menu = window_type, "unsupported menu, closing");
            s.send_upstream(&CloseContainer { window_id: java_window });
            return Ok(HandlerState::Handled);
        };
        open_screen(s, java_window, kind);
        Ok(HandlerState::Handled)
    });

    registry.register("OpenHorseScreen", HandlerOptions::tagged("inventory:horse"), |s: &mut Session, packet: &PlayClientbound| {
        let PlayClientbound::OpenHorseScreen { window_id, columns, entity_id } = *packet else {
            return Ok(HandlerState::Continue);
        };
        let (mount, runtime_id, position) = {
            let record = s.entity_cache().get(entity_id).ok_or(BridgeError::UnknownEntity(entity_id))?;
            let mount = record.definition.mount.ok_or(BridgeError::UnknownEntity(entity_id))?;
            (mount, record.runtime_id, record.position)
        };
        close_container(s, true);
        let chest_slots = (columns.max(0) * 3).min(u8::MAX as i32) as u8;
        let kind = ContainerKind::Horse { mount, chest_slots };
        let bedrock_window = s.inventory_mut().open_container(window_id, kind, Some(entity_id));
        s.send_downstream(&ContainerOpen {
            window_id: bedrock_window,
            container_type: container_type::HORSE,
            pos: BlockPos::new(
                position.x.floor() as i32,
                position.y.floor() as i32,
                position.z.floor() as i32,
            ),
            entity_unique_id: runtime_id as i64,
        });
        if let Some(open) = s.inventory_mut().open_mut() {
            open.shown = true;
        }
        Ok(HandlerState::Handled)
    });

    registry.register("SetContainerContent", HandlerOptions::tagged("inventory:content"), |s: &mut Session, packet: &PlayClientbound| {
        let PlayClientbound::SetContainerContent { window_id, state_id, items, carried } = packet else {
            return Ok(HandlerState::Continue);
        };
        let inventory = s.inventory_mut();
        inventory.state_id = *state_id;
        inventory.carried = carried.clone();
        if !inventory.set_contents(*window_id, items.clone()) {
            debug!(session = s.id(), window = window_id, "contents for a window that is not open");
            return Ok(HandlerState::Handled);
        }

        let context = Arc::clone(s.context());
        let mappings = Arc::clone(s.mappings());
        let convert = |java: &Option<JavaItem>| item::to_bedrock(&context.registries, &mappings, java.as_ref());
        let open_window = s.inventory().open().map_or(0, |o| o.bedrock_window);
        let packets = match s.inventory().window(*window_id) {
            Some((translator, _)) => content_packets(translator, open_window, items, convert),
            None => Vec::new(),
        };
        for packet in &packets {
            s.send_downstream(packet);
        }
        Ok(HandlerState::Handled)
    });

    registry.register("SetContainerSlot", HandlerOptions::tagged("inventory:slot"), |s: &mut Session, packet: &PlayClientbound| {
        let PlayClientbound::SetContainerSlot { window_id, state_id, slot, item } = packet else {
            return Ok(HandlerState::Continue);
        };
        s.inventory_mut().state_id = *state_id;
        let context = Arc::clone(s.context());
        let mappings = Arc::clone(s.mappings());
        let bedrock_item = item::to_bedrock(&context.registries, &mappings, item.as_ref());

        if *window_id == CURSOR_WINDOW && *slot == -1 {
            s.inventory_mut().carried = item.clone();
            let cursor = BedrockSlot::new(container_slot::CURSOR, 0);
            s.send_downstream(&slot_packet(cursor, 0, bedrock_item));
            return Ok(HandlerState::Handled);
        }
        let java_window = match *window_id {
            PLAYER_WINDOW => 0,
            w if w >= 0 => w as u8,
            other => {
                debug!(session = s.id(), window = other, "slot update for an unknown window");
                return Ok(HandlerState::Handled);
            }
        };
        let Ok(java_slot) = usize::try_from(*slot) else {
            return Ok(HandlerState::Handled);
        };
        if !s.inventory_mut().set_slot(java_window, java_slot, item.clone()) {
            debug!(session = s.id(), window = java_window, slot, "slot update for a window that is not open");
            return Ok(HandlerState::Handled);
        }

        let open_window = s.inventory().open().map_or(0, |o| o.bedrock_window);
        let target = s
            .inventory()
            .window(java_window)
            .and_then(|(translator, _)| translator.java_to_bedrock(java_slot))
            .ok_or(BridgeError::InvalidSlot {
                container: java_window,
                slot: java_slot.min(u8::MAX as usize) as u8,
            })?;
        s.send_downstream(&slot_packet(target, open_window, bedrock_item));
        Ok(HandlerState::Handled)
    });

    registry.register("CloseContainer", HandlerOptions::tagged("inventory:close"), |s: &mut Session, packet: &PlayClientbound| {
        let PlayClientbound::CloseContainer { window_id } = *packet else {
            return Ok(HandlerState::Continue);
        };
        if s.inventory().open().is_some_and(|o| o.java_window == window_id) {
            close_container(s, true);
        }
        Ok(HandlerState::Handled)
    });
}

/// Registers the window, places its fake block and opens it on the client.
fn open_screen(s: &mut Session, java_window: u8, kind: ContainerKind) {
    close_container(s, true);
    let bedrock_window = s.inventory_mut().open_container(java_window, kind, None);

    let (bedrock_type, block_name, paired) = match s.inventory().open() {
        Some(open) => (
            open.translator.bedrock_type(),
            open.translator.fake_block(),
            open.translator.paired(),
        ),
        None => return,
    };
    let pos = virtual_block::position(s.position(), s.chunk_cache().min_y());
    if let Some(name) = block_name {
        let context = Arc::clone(s.context());
        let mappings = Arc::clone(s.mappings());
        let mut positions = vec![pos];
        if paired {
            positions.push(virtual_block::pair_position(pos));
        }
        let mut placed = Vec::with_capacity(positions.len());
        for &at in &positions {
            let original = s.block_at(at);
            let state = context.registries.java_block_id(name).unwrap_or(original);
            for update in virtual_block::block_updates(&context.registries, &mappings, at, state) {
                s.send_downstream(&update);
            }
            placed.push(FakeBlock { pos: at, original });
        }
        if let [first, second] = positions[..] {
            s.send_downstream(&BlockActorData::chest_half(first, second));
            s.send_downstream(&BlockActorData::chest_half(second, first));
        }
        if let Some(open) = s.inventory_mut().open_mut() {
            open.fake_blocks = placed;
        }
    }

    s.send_downstream(&ContainerOpen {
        window_id: bedrock_window,
        container_type: bedrock_type,
        pos,
        entity_unique_id: -1,
    });
    if let Some(open) = s.inventory_mut().open_mut() {
        open.shown = true;
    }
}
