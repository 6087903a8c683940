//! Flat entity records with optional capability components.

pub mod metadata;
pub mod types;

use std::collections::BTreeMap;

use mc_bridge_proto::bedrock::{
    window_id, ItemStack, MetadataValue, MobArmorEquipment, MobEquipment, SetEntityData,
};
use mc_bridge_proto::java::play::EquipmentSlot;
use mc_bridge_proto::types::{Uuid, Vec3};

use crate::entity::metadata::{flag, key};
use crate::entity::types::EntityDefinition;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Equipment {
    pub main_hand: ItemStack,
    pub off_hand: ItemStack,
    pub helmet: ItemStack,
    pub chestplate: ItemStack,
    pub leggings: ItemStack,
    pub boots: ItemStack,
    pub body: ItemStack,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Variant {
    pub variant: i32,
    pub markings: i32,
    /// Llama carpet dye color.
    pub carpet: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vehicle {
    /// Java ids, driver first.
    pub passengers: Vec<i32>,
    pub riding: Option<i32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tameable {
    pub owner: Option<Uuid>,
    pub tamed: bool,
    pub sitting: bool,
}

/// Bedrock packets produced by an equipment change.
#[derive(Debug, Default, PartialEq)]
pub struct EquipmentUpdate {
    pub hands: Vec<MobEquipment>,
    pub armor: Option<MobArmorEquipment>,
}

#[derive(Debug, Clone)]
pub struct EntityRecord {
    pub java_id: i32,
    pub runtime_id: u64,
    pub uuid: Uuid,
    pub definition: &'static EntityDefinition,
    pub position: Vec3,
    flags: u128,
    sent_flags: u128,
    dirty: BTreeMap<u32, MetadataValue>,
    pub equipment: Option<Equipment>,
    pub variant: Option<Variant>,
    pub vehicle: Vehicle,
    pub tameable: Option<Tameable>,
}

fn default_flags() -> u128 {
    1 << flag::HAS_GRAVITY
}

impl EntityRecord {
    pub fn new(java_id: i32, runtime_id: u64, uuid: Uuid, definition: &'static EntityDefinition) -> Self {
        let caps = definition.capabilities;
        Self {
            java_id,
            runtime_id,
            uuid,
            definition,
            position: Vec3::default(),
            flags: default_flags(),
            sent_flags: default_flags(),
            dirty: BTreeMap::new(),
            equipment: caps.equipment.then(Equipment::default),
            variant: caps.variant.then(Variant::default),
            vehicle: Vehicle::default(),
            tameable: caps.tameable.then(Tameable::default),
        }
    }

    pub fn flag(&self, bit: u32) -> bool {
        self.flags & (1 << bit) != 0
    }

    pub fn set_flag(&mut self, bit: u32, value: bool) {
        if value {
            self.flags |= 1 << bit;
        } else {
            self.flags &= !(1 << bit);
        }
    }

    pub fn set_data(&mut self, key: u32, value: MetadataValue) {
        self.dirty.insert(key, value);
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty() || self.flags != self.sent_flags
    }

    /// Everything changed since the last call, as one packet.
    pub fn take_update(&mut self) -> Option<SetEntityData> {
        if !self.is_dirty() {
            return None;
        }
        let mut entries: Vec<(u32, MetadataValue)> = std::mem::take(&mut self.dirty).into_iter().collect();
        let low = |f: u128| f as u64;
        let high = |f: u128| (f >> 64) as u64;
        if low(self.flags) != low(self.sent_flags) {
            entries.push((key::FLAGS, MetadataValue::Long(low(self.flags) as i64)));
        }
        if high(self.flags) != high(self.sent_flags) {
            entries.push((key::FLAGS_2, MetadataValue::Long(high(self.flags) as i64)));
        }
        self.sent_flags = self.flags;
        entries.sort_by_key(|(k, _)| *k);
        Some(SetEntityData {
            runtime_id: self.runtime_id,
            entries,
            tick: 0,
        })
    }

    /// Stores converted items and returns the packets that reflect them.
    /// Hand-only changes produce `MobEquipment`, anything else one
    /// `MobArmorEquipment` with the full armor set.
    pub fn apply_equipment(&mut self, changes: Vec<(EquipmentSlot, ItemStack)>) -> EquipmentUpdate {
        let runtime_id = self.runtime_id;
        let Some(equipment) = self.equipment.as_mut() else {
            return EquipmentUpdate::default();
        };
        let mut update = EquipmentUpdate::default();
        let mut armor_changed = false;
        for (slot, item) in changes {
            match slot {
                EquipmentSlot::MainHand => {
                    update.hands.push(hand_packet(runtime_id, &item, window_id::INVENTORY));
                    equipment.main_hand = item;
                }
                EquipmentSlot::OffHand => {
                    update.hands.push(hand_packet(runtime_id, &item, window_id::OFFHAND));
                    equipment.off_hand = item;
                }
                EquipmentSlot::Helmet => {
                    equipment.helmet = item;
                    armor_changed = true;
                }
                EquipmentSlot::Chestplate => {
                    equipment.chestplate = item;
                    armor_changed = true;
                }
                EquipmentSlot::Leggings => {
                    equipment.leggings = item;
                    armor_changed = true;
                }
                EquipmentSlot::Boots => {
                    equipment.boots = item;
                    armor_changed = true;
                }
                EquipmentSlot::Body => {
                    equipment.body = item;
                    armor_changed = true;
                }
            }
        }
        if armor_changed {
            update.armor = Some(MobArmorEquipment {
                runtime_id,
                helmet: equipment.helmet.clone(),
                chestplate: equipment.chestplate.clone(),
                leggings: equipment.leggings.clone(),
                boots: equipment.boots.clone(),
                body: equipment.body.clone(),
            });
        }
        update
    }
}

fn hand_packet(runtime_id: u64, item: &ItemStack, container_id: u8) -> MobEquipment {
    MobEquipment {
        runtime_id,
        item: item.clone(),
        inventory_slot: 0,
        hotbar_slot: 0,
        container_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::types::definition;

    #[test]
    fn components_follow_capabilities() {
        let arrow = EntityRecord::new(1, 2, Uuid(1), definition(4));
        assert!(arrow.equipment.is_none() && arrow.tameable.is_none());
        let wolf = EntityRecord::new(1, 2, Uuid(1), definition(122));
        assert!(wolf.equipment.is_some() && wolf.variant.is_some() && wolf.tameable.is_some());
    }

    #[test]
    fn unchanged_flags_are_not_resent() {
        let mut r = EntityRecord::new(1, 2, Uuid(1), definition(22));
        r.set_flag(flag::ON_FIRE, true);
        r.set_flag(flag::ON_FIRE, false);
        assert!(r.take_update().is_none());
        r.set_flag(flag::SNEAKING, true);
        let update = r.take_update().expect("flag changed");
        assert_eq!(
            update.entries,
            vec![(
                key::FLAGS,
                MetadataValue::Long(((1u64 << flag::HAS_GRAVITY) | (1 << flag::SNEAKING)) as i64)
            )]
        );
    }

    #[test]
    fn hand_changes_use_mob_equipment() {
        let mut r = EntityRecord::new(1, 5, Uuid(1), definition(124));
        let update = r.apply_equipment(vec![
            (EquipmentSlot::MainHand, ItemStack::new(300, 1)),
            (EquipmentSlot::OffHand, ItemStack::new(301, 1)),
        ]);
        assert!(update.armor.is_none());
        assert_eq!(update.hands.len(), 2);
        assert_eq!(update.hands[1].container_id, window_id::OFFHAND);
        assert_eq!(r.equipment.map(|e| e.main_hand.network_id), Some(300));
    }

    #[test]
    fn armor_changes_send_the_full_set() {
        let mut r = EntityRecord::new(1, 5, Uuid(1), definition(124));
        r.apply_equipment(vec![(EquipmentSlot::Helmet, ItemStack::new(10, 1))]);
        let update = r.apply_equipment(vec![(EquipmentSlot::Boots, ItemStack::new(11, 1))]);
        let armor = update.armor.expect("armor packet");
        assert_eq!(armor.helmet.network_id, 10);
        assert_eq!(armor.boots.network_id, 11);
        assert!(update.hands.is_empty());
    }

    #[test]
    fn equipment_is_ignored_without_the_component() {
        let mut r = EntityRecord::new(1, 5, Uuid(1), definition(58));
        let update = r.apply_equipment(vec![(EquipmentSlot::Helmet, ItemStack::new(10, 1))]);
        assert_eq!(update, EquipmentUpdate::default());
    }
}
