//! Java entity id → entity record, with Bedrock runtime id allocation.

use std::collections::HashMap;

use mc_bridge_proto::bedrock::{EntityLink, EntityLinkKind, SetEntityData, SetEntityLink};
use mc_bridge_proto::types::Uuid;

use crate::entity::metadata::flag;
use crate::entity::types::{definition, PLAYER_TYPE};
use crate::entity::EntityRecord;
use crate::error::BridgeError;

/// The session's own player.
pub const PLAYER_RUNTIME_ID: u64 = 1;

#[derive(Debug)]
pub struct EntityCache {
    entities: HashMap<i32, EntityRecord>,
    by_uuid: HashMap<Uuid, i32>,
    next_runtime_id: u64,
}

impl Default for EntityCache {
    fn default() -> Self {
        Self {
            entities: HashMap::new(),
            by_uuid: HashMap::new(),
            next_runtime_id: PLAYER_RUNTIME_ID + 1,
        }
    }
}

impl EntityCache {
    /// Registers the local player under the fixed runtime id.
    pub fn set_player(&mut self, java_id: i32, uuid: Uuid) {
        self.remove_player();
        let record = EntityRecord::new(java_id, PLAYER_RUNTIME_ID, uuid, definition(PLAYER_TYPE));
        self.by_uuid.insert(uuid, java_id);
        self.entities.insert(java_id, record);
    }

    fn remove_player(&mut self) {
        let player = self
            .entities
            .values()
            .find(|e| e.runtime_id == PLAYER_RUNTIME_ID)
            .map(|e| e.java_id);
        if let Some(java_id) = player {
            self.remove(java_id);
        }
    }

    /// Creates the record, replacing any previous entity with the same id.
    /// Returns the Bedrock runtime id.
    pub fn spawn(&mut self, java_id: i32, uuid: Uuid, java_type: i32) -> u64 {
        self.remove(java_id);
        let runtime_id = self.next_runtime_id;
        self.next_runtime_id += 1;
        self.by_uuid.insert(uuid, java_id);
        self.entities
            .insert(java_id, EntityRecord::new(java_id, runtime_id, uuid, definition(java_type)));
        runtime_id
    }

    pub fn get(&self, java_id: i32) -> Option<&EntityRecord> {
        self.entities.get(&java_id)
    }

    pub fn get_mut(&mut self, java_id: i32) -> Option<&mut EntityRecord> {
        self.entities.get_mut(&java_id)
    }

    pub fn runtime_id(&self, java_id: i32) -> Option<u64> {
        self.entities.get(&java_id).map(|e| e.runtime_id)
    }

    pub fn by_uuid(&self, uuid: Uuid) -> Option<&EntityRecord> {
        self.by_uuid.get(&uuid).and_then(|id| self.entities.get(id))
    }

    /// Runtime id table for owner lookups, taken before a record is borrowed
    /// mutably.
    pub fn runtime_ids_by_uuid(&self) -> HashMap<Uuid, u64> {
        self.entities.values().map(|e| (e.uuid, e.runtime_id)).collect()
    }

    pub fn remove(&mut self, java_id: i32) -> Option<EntityRecord> {
        let record = self.entities.remove(&java_id)?;
        if self.by_uuid.get(&record.uuid) == Some(&java_id) {
            self.by_uuid.remove(&record.uuid);
        }
        if let Some(vehicle) = record.vehicle.riding.and_then(|v| self.entities.get_mut(&v)) {
            vehicle.vehicle.passengers.retain(|p| *p != java_id);
        }
        for passenger in &record.vehicle.passengers {
            if let Some(rider) = self.entities.get_mut(passenger) {
                rider.vehicle.riding = None;
                rider.set_flag(flag::RIDING, false);
            }
        }
        Some(record)
    }

    pub fn take_update(&mut self, java_id: i32) -> Option<SetEntityData> {
        self.entities.get_mut(&java_id)?.take_update()
    }

    /// Replaces the vehicle's passengers. Returns the links to send: removals
    /// for riders that left, then the driver and the other passengers.
    pub fn set_passengers(&mut self, vehicle: i32, passengers: Vec<i32>) -> Result<Vec<SetEntityLink>, BridgeError> {
        let old = {
            let record = self.entities.get(&vehicle).ok_or(BridgeError::UnknownEntity(vehicle))?;
            record.vehicle.passengers.clone()
        };
        let vehicle_rid = self.runtime_id(vehicle).unwrap_or_default() as i64;
        let mut links = Vec::new();

        for gone in old.iter().filter(|p| !passengers.contains(p)) {
            let Some(rider) = self.entities.get_mut(gone) else {
                continue;
            };
            rider.vehicle.riding = None;
            rider.set_flag(flag::RIDING, false);
            links.push(link(vehicle_rid, rider.runtime_id as i64, EntityLinkKind::Remove));
        }

        let mut kept = Vec::with_capacity(passengers.len());
        for java_id in passengers {
            let Some(rider) = self.entities.get_mut(&java_id) else {
                continue;
            };
            let kind = if kept.is_empty() {
                EntityLinkKind::Rider
            } else {
                EntityLinkKind::Passenger
            };
            rider.vehicle.riding = Some(vehicle);
            rider.set_flag(flag::RIDING, true);
            links.push(link(vehicle_rid, rider.runtime_id as i64, kind));
            kept.push(java_id);
        }

        if let Some(record) = self.entities.get_mut(&vehicle) {
            record.vehicle.passengers = kept;
        }
        Ok(links)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Dimension change; the local player survives.
    pub fn clear(&mut self) {
        let player = self
            .entities
            .values()
            .find(|e| e.runtime_id == PLAYER_RUNTIME_ID)
            .cloned();
        self.entities.clear();
        self.by_uuid.clear();
        if let Some(mut player) = player {
            player.vehicle = Default::default();
            self.by_uuid.insert(player.uuid, player.java_id);
            self.entities.insert(player.java_id, player);
        }
    }
}

fn link(vehicle: i64, rider: i64, kind: EntityLinkKind) -> SetEntityLink {
    SetEntityLink {
        link: EntityLink {
            vehicle_unique_id: vehicle,
            rider_unique_id: rider,
            kind,
            immediate: false,
            rider_initiated: false,
            angular_velocity: 0.0,
        },
    }
}
