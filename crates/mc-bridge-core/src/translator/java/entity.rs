//! Entity lifecycle, metadata, equipment and riding.

use std::sync::Arc;

use mc_bridge_proto::bedrock::RemoveEntity;
use mc_bridge_proto::java::play::PlayClientbound;
use mc_bridge_proto::types::Vec3;
use tracing::debug;

use crate::context::JavaRegistry;
use crate::dispatch::{HandlerOptions, HandlerState};
use crate::entity::metadata;
use crate::error::BridgeError;
use crate::item;
use crate::session::Session;

pub(super) fn register(registry: &mut JavaRegistry) {
    registry.register("SpawnEntity", HandlerOptions::tagged("entity:spawn"), |s: &mut Session, packet: &PlayClientbound| {
        let PlayClientbound::SpawnEntity(spawn) = packet else {
            return Ok(HandlerState::Continue);
        };
        let session = s.id();
        let runtime_id = s.entity_cache_mut().spawn(spawn.entity_id, spawn.uuid, spawn.entity_type);
        if let Some(record) = s.entity_cache_mut().get_mut(spawn.entity_id) {
            record.position = Vec3::new(spawn.x as f32, spawn.y as f32, spawn.z as f32);
            debug!(
                session,
                entity = spawn.entity_id,
                runtime_id,
                identifier = record.definition.identifier,
                "entity spawned"
            );
        }
        Ok(HandlerState::Handled)
    });

    registry.register("SetEntityMetadata", HandlerOptions::tagged("entity:metadata"), |s: &mut Session, packet: &PlayClientbound| {
        let PlayClientbound::SetEntityMetadata { entity_id, entries } = packet else {
            return Ok(HandlerState::Continue);
        };
        let owners = s.entity_cache().runtime_ids_by_uuid();
        let record = s
            .entity_cache_mut()
            .get_mut(*entity_id)
            .ok_or(BridgeError::UnknownEntity(*entity_id))?;
        metadata::apply(record, entries, &|uuid| owners.get(&uuid).copied());
        if let Some(update) = record.take_update() {
            s.send_downstream(&update);
        }
        Ok(HandlerState::Handled)
    });

    registry.register("SetEquipment", HandlerOptions::tagged("entity:equipment"), |s: &mut Session, packet: &PlayClientbound| {
        let PlayClientbound::SetEquipment { entity_id, equipment } = packet else {
            return Ok(HandlerState::Continue);
        };
        let context = Arc::clone(s.context());
        let mappings = Arc::clone(s.mappings());
        let changes = equipment
            .iter()
            .map(|(slot, java)| (*slot, item::to_bedrock(&context.registries, &mappings, java.as_ref())))
            .collect();
        let record = s
            .entity_cache_mut()
            .get_mut(*entity_id)
            .ok_or(BridgeError::UnknownEntity(*entity_id))?;
        let update = record.apply_equipment(changes);
        for hand in &update.hands {
            s.send_downstream(hand);
        }
        if let Some(armor) = &update.armor {
            s.send_downstream(armor);
        }
        Ok(HandlerState::Handled)
    });

    registry.register("SetPassengers", HandlerOptions::tagged("entity:passengers"), |s: &mut Session, packet: &PlayClientbound| {
        let PlayClientbound::SetPassengers { vehicle, passengers } = packet else {
            return Ok(HandlerState::Continue);
        };
        let before = s
            .entity_cache()
            .get(*vehicle)
            .map(|record| record.vehicle.passengers.clone())
            .unwrap_or_default();
        let links = s.entity_cache_mut().set_passengers(*vehicle, passengers.clone())?;
        for link in &links {
            s.send_downstream(link);
        }
        // riding flags of everyone who got on or off
        for rider in before.iter().chain(passengers) {
            if let Some(update) = s.entity_cache_mut().take_update(*rider) {
                s.send_downstream(&update);
            }
        }
        Ok(HandlerState::Handled)
    });

    registry.register("RemoveEntities", HandlerOptions::tagged("entity:remove"), |s: &mut Session, packet: &PlayClientbound| {
        let PlayClientbound::RemoveEntities(ids) = packet else {
            return Ok(HandlerState::Continue);
        };
        for id in ids {
            if let Some(record) = s.entity_cache_mut().remove(*id) {
                s.send_downstream(&RemoveEntity {
                    unique_id: record.runtime_id as i64,
                });
            }
        }
        Ok(HandlerState::Handled)
    });
}
