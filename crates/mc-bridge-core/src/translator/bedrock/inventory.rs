//! Inventory actions taken on the Bedrock client.

use std::sync::Arc;

use mc_bridge_proto::bedrock::{window_id, ContainerClose, ItemStackResponse, Serverbound, StackRequest, StackResponse};
use mc_bridge_proto::java::play::{CloseContainer, SetHeldItem};
use mc_bridge_proto::java::slot::JavaItem;
use mc_bridge_world::ProtocolMappings;
use tracing::debug;

use crate::context::BedrockRegistry;
use crate::dispatch::{HandlerOptions, HandlerState};
use crate::error::BridgeError;
use crate::inventory::{click, ContainerKind};
use crate::item;
use crate::session::Session;
use crate::translator::close_container;

const HOTBAR_SIZE: u8 = 9;

pub(super) fn register(registry: &mut BedrockRegistry) {
    registry.register("ContainerClose", HandlerOptions::tagged("inventory:close"), |s: &mut Session, packet: &Serverbound| {
        let Serverbound::ContainerClose(close) = packet else {
            return Ok(HandlerState::Continue);
        };
        let open_window = s
            .inventory()
            .open()
            .filter(|o| o.bedrock_window == close.window_id)
            .map(|o| o.java_window);
        match open_window {
            Some(java_window) => {
                s.send_upstream(&CloseContainer { window_id: java_window });
                close_container(s, false);
            }
            None => {
                // the player inventory has no server-side open/close
                s.send_downstream(&ContainerClose {
                    window_id: close.window_id,
                    container_type: close.container_type,
                    server_initiated: false,
                });
                if close.window_id == window_id::INVENTORY {
                    s.send_upstream(&CloseContainer { window_id: 0 });
                }
            }
        }
        Ok(HandlerState::Handled)
    });

    registry.register("ItemStackRequest", HandlerOptions::tagged("inventory:stack_request"), |s: &mut Session, packet: &Serverbound| {
        let Serverbound::ItemStackRequest(batch) = packet else {
            return Ok(HandlerState::Continue);
        };
        let mappings = Arc::clone(s.mappings());
        let responses = batch
            .requests
            .iter()
            .map(|request| translate_request(s, request, &mappings))
            .collect();
        s.send_downstream(&ItemStackResponse { responses });
        Ok(HandlerState::Handled)
    });

    registry.register("MobEquipment", HandlerOptions::tagged("inventory:held_item"), |s: &mut Session, packet: &Serverbound| {
        let Serverbound::MobEquipment(equipment) = packet else {
            return Ok(HandlerState::Continue);
        };
        if equipment.hotbar_slot >= HOTBAR_SIZE {
            return Err(BridgeError::InvalidSlot {
                container: equipment.container_id,
                slot: equipment.hotbar_slot,
            });
        }
        s.inventory_mut().held_slot = equipment.hotbar_slot;
        s.send_upstream(&SetHeldItem {
            slot: equipment.hotbar_slot as i16,
        });
        Ok(HandlerState::Handled)
    });
}

/// Replays one request as Java clicks, or rejects it untouched.
fn translate_request(s: &mut Session, request: &StackRequest, mappings: &ProtocolMappings) -> StackResponse {
    let inventory = s.inventory();
    let java_window = inventory.active_window();
    let kind = inventory.open().map_or(ContainerKind::Player, |o| o.kind);
    let translator = kind.translator();
    let Some(state) = inventory.window_state(java_window) else {
        return StackResponse::rejected(request.request_id);
    };
    let limit = |item: &JavaItem| item::stack_limit(mappings, item);
    let Some(plan) = click::plan(translator.as_ref(), &state, request, java_window, inventory.state_id, &limit) else {
        debug!(session = s.id(), request = request.request_id, "stack request rejected");
        return StackResponse::rejected(request.request_id);
    };

    for click in &plan.clicks {
        s.send_upstream(click);
    }
    let inventory = s.inventory_mut();
    let response = plan.response(request.request_id, translator.as_ref(), || inventory.next_stack_id());
    inventory.apply_window_state(java_window, plan.state);
    inventory.push_pending(request.request_id);
    response
}

#[cfg(test)]
mod tests {
    use bytes::{Buf, Bytes, BytesMut};
    use mc_bridge_nbt::{write_nbt_java, NbtTag};
    use mc_bridge_proto::bedrock::{
        container_slot, container_type, encode_packet, id, FullContainerName, ItemStack, ItemStackRequest, MobEquipment,
        StackAction, StackRequestSlot, CANONICAL_PROTOCOL,
    };
    use mc_bridge_proto::varint::{put_java_varint, put_var_u32};

    use super::*;
    use crate::test_support::{bedrock_ids, bedrock_packets, context, drain, java_ids, java_packet, java_packets, playing_session};

    const STONE_ITEM: i32 = 1;
    const HOTBAR_0: usize = 36;

    fn at(container: u8, slot: u8) -> StackRequestSlot {
        StackRequestSlot {
            container: FullContainerName::new(container),
            slot,
            stack_network_id: 0,
        }
    }

    fn stack_request(actions: Vec<StackAction>) -> Bytes {
        let batch = ItemStackRequest {
            requests: vec![StackRequest {
                request_id: -3,
                actions,
                filter_strings: Vec::new(),
                filter_cause: 0,
            }],
        };
        let mut buf = BytesMut::new();
        put_var_u32(&mut buf, id::ITEM_STACK_REQUEST);
        batch.encode_for(&mut buf, CANONICAL_PROTOCOL);
        buf.freeze()
    }

    fn take_from_hotbar(count: u8) -> Bytes {
        stack_request(vec![StackAction::Take {
            count,
            source: at(container_slot::HOTBAR, 0),
            destination: at(container_slot::CURSOR, 0),
        }])
    }

    fn close_packet(window: u8, kind: i8) -> Bytes {
        let close = ContainerClose {
            window_id: window,
            container_type: kind,
            server_initiated: false,
        };
        encode_packet(&close, CANONICAL_PROTOCOL)
    }

    #[test]
    fn stack_requests_become_clicks() {
        let (mut s, mut down, mut up, _) = playing_session(context());
        s.inventory_mut().set_slot(0, HOTBAR_0, Some(JavaItem::new(STONE_ITEM, 10)));

        s.handle_bedrock(take_from_hotbar(10));
        assert_eq!(java_ids(&drain(&mut up)), vec![0x0E]);
        let out = bedrock_packets(&drain(&mut down));
        assert_eq!(out.len(), 1);
        let (packet_id, body) = &out[0];
        assert_eq!(*packet_id, id::ITEM_STACK_RESPONSE);
        // one response, success
        assert_eq!(&body[..2], &[1, 0]);

        assert!(s.inventory().slot(0, HOTBAR_0).is_none());
        assert_eq!(s.inventory().carried.as_ref().map(|i| i.count), Some(10));
        assert_eq!(s.inventory().pending_len(), 1);
    }

    #[test]
    fn impossible_requests_are_rejected_without_clicks() {
        let (mut s, mut down, mut up, _) = playing_session(context());
        s.inventory_mut().set_slot(0, HOTBAR_0, Some(JavaItem::new(STONE_ITEM, 4)));

        s.handle_bedrock(take_from_hotbar(20));
        assert!(drain(&mut up).is_empty());
        let out = bedrock_packets(&drain(&mut down));
        assert_eq!(out[0].0, id::ITEM_STACK_RESPONSE);
        assert_eq!(out[0].1[1], 1);
        assert_eq!(s.inventory().slot(0, HOTBAR_0).map(|i| i.count), Some(4));
    }

    #[test]
    fn closing_a_container_closes_it_upstream() {
        let (mut s, mut down, mut up, _) = playing_session(context());
        s.handle_java(java_packet(0x33, |buf| {
            put_java_varint(buf, 2);
            put_java_varint(buf, 2);
            write_nbt_java(buf, Some(&NbtTag::String("Chest".into())));
        }));
        let bedrock_window = s.inventory().open().map(|o| o.bedrock_window).expect("open");
        drain(&mut down);

        s.handle_bedrock(close_packet(bedrock_window, container_type::CONTAINER));
        let sent = java_packets(&drain(&mut up));
        assert_eq!(sent.len(), 1);
        let (packet_id, mut body) = sent[0].clone();
        assert_eq!(packet_id, 0x0F);
        assert_eq!(body.get_u8(), 2);
        assert_eq!(
            bedrock_ids(&drain(&mut down)),
            vec![id::UPDATE_BLOCK, id::UPDATE_BLOCK, id::CONTAINER_CLOSE]
        );
        assert!(s.inventory().open().is_none());
    }

    #[test]
    fn closing_the_player_inventory_is_echoed() {
        let (mut s, mut down, mut up, _) = playing_session(context());
        s.handle_bedrock(close_packet(window_id::INVENTORY, container_type::INVENTORY));
        assert_eq!(bedrock_ids(&drain(&mut down)), vec![id::CONTAINER_CLOSE]);
        assert_eq!(java_ids(&drain(&mut up)), vec![0x0F]);
    }

    #[test]
    fn hotbar_selection_is_forwarded() {
        let (mut s, _, mut up, _) = playing_session(context());
        let select = |hotbar_slot: u8| {
            let equipment = MobEquipment {
                runtime_id: 1,
                item: ItemStack::default(),
                inventory_slot: hotbar_slot,
                hotbar_slot,
                container_id: window_id::INVENTORY,
            };
            encode_packet(&equipment, CANONICAL_PROTOCOL)
        };

        s.handle_bedrock(select(4));
        let sent = java_packets(&drain(&mut up));
        let (packet_id, mut body) = sent[0].clone();
        assert_eq!(packet_id, 0x2F);
        assert_eq!(body.get_i16(), 4);
        assert_eq!(s.inventory().held_slot, 4);

        s.handle_bedrock(select(12));
        assert!(drain(&mut up).is_empty());
        assert_eq!(s.inventory().held_slot, 4);
    }
}
