use mc_bridge_proto::bedrock::{container_slot as cs, container_type};

use crate::entity::types::Mount;
use crate::inventory::{
    storage_to_bedrock, storage_to_java, BedrockSlot, InventoryTranslator, CRAFTING_INPUT,
    PLAYER_WINDOW_SLOTS,
};

/// Slot 50 of the UI container holds crafting and other results.
const RESULT_SLOT: u8 = 50;

/// Containers whose own slots map one to one onto a fixed list.
fn fixed_to_bedrock(table: &[BedrockSlot], slot: usize) -> Option<BedrockSlot> {
    table.get(slot).copied()
}

fn fixed_to_java(table: &[BedrockSlot], slot: BedrockSlot) -> Option<usize> {
    table.iter().position(|s| *s == slot)
}

#[derive(Debug, Clone, Copy)]
pub struct PlayerTranslator;

impl InventoryTranslator for PlayerTranslator {
    fn size(&self) -> usize {
        9
    }

    fn total_slots(&self) -> usize {
        PLAYER_WINDOW_SLOTS
    }

    fn bedrock_type(&self) -> i8 {
        container_type::INVENTORY
    }

    fn container_to_bedrock(&self, slot: usize) -> Option<BedrockSlot> {
        match slot {
            0 => Some(BedrockSlot::new(cs::CREATED_OUTPUT, RESULT_SLOT)),
            1..=4 => Some(BedrockSlot::new(CRAFTING_INPUT, 27 + slot as u8)),
            5..=8 => Some(BedrockSlot::new(cs::ARMOR, slot as u8 - 5)),
            _ => None,
        }
    }

    fn container_to_java(&self, slot: BedrockSlot) -> Option<usize> {
        let s = slot.slot as usize;
        match slot.container {
            cs::CREATED_OUTPUT if slot.slot == RESULT_SLOT => Some(0),
            CRAFTING_INPUT if (28..32).contains(&s) => Some(s - 27),
            cs::ARMOR if s < 4 => Some(5 + s),
            cs::OFFHAND if s == 0 => Some(45),
            _ => None,
        }
    }

    fn java_to_bedrock(&self, slot: usize) -> Option<BedrockSlot> {
        match slot {
            0..=8 => self.container_to_bedrock(slot),
            9..=44 => storage_to_bedrock(slot - 9),
            45 => Some(BedrockSlot::new(cs::OFFHAND, 0)),
            _ => None,
        }
    }

    fn bedrock_to_java(&self, slot: BedrockSlot) -> Option<usize> {
        match storage_to_java(slot) {
            Some(storage) => Some(9 + storage),
            None => self.container_to_java(slot),
        }
    }
}

/// Chests, barrels and shulker-like menus of 1 to 6 rows.
#[derive(Debug, Clone, Copy)]
pub struct GenericTranslator {
    pub rows: u8,
}

impl InventoryTranslator for GenericTranslator {
    fn size(&self) -> usize {
        self.rows as usize * 9
    }

    fn bedrock_type(&self) -> i8 {
        container_type::CONTAINER
    }

    fn container_to_bedrock(&self, slot: usize) -> Option<BedrockSlot> {
        (slot < self.size()).then(|| BedrockSlot::new(cs::LEVEL_ENTITY, slot as u8))
    }

    fn container_to_java(&self, slot: BedrockSlot) -> Option<usize> {
        let s = slot.slot as usize;
        (slot.container == cs::LEVEL_ENTITY && s < self.size()).then_some(s)
    }

    fn fake_block(&self) -> Option<&'static str> {
        Some("minecraft:chest[facing=north,type=single,waterlogged=false]")
    }

    /// A single Bedrock chest only shows 27 slots.
    fn paired(&self) -> bool {
        self.rows > 3
    }
}

const STONECUTTER: [BedrockSlot; 2] = [
    BedrockSlot::new(cs::STONECUTTER_INPUT, 3),
    BedrockSlot::new(cs::STONECUTTER_RESULT, RESULT_SLOT),
];

#[derive(Debug, Clone, Copy)]
pub struct StonecutterTranslator;

impl InventoryTranslator for StonecutterTranslator {
    fn size(&self) -> usize {
        STONECUTTER.len()
    }

    fn bedrock_type(&self) -> i8 {
        container_type::STONECUTTER
    }

    fn container_to_bedrock(&self, slot: usize) -> Option<BedrockSlot> {
        fixed_to_bedrock(&STONECUTTER, slot)
    }

    fn container_to_java(&self, slot: BedrockSlot) -> Option<usize> {
        fixed_to_java(&STONECUTTER, slot)
    }

    fn fake_block(&self) -> Option<&'static str> {
        Some("minecraft:stonecutter[facing=north]")
    }
}

const ENCHANTING: [BedrockSlot; 2] = [
    BedrockSlot::new(cs::ENCHANTING_INPUT, 14),
    BedrockSlot::new(cs::ENCHANTING_MATERIAL, 15),
];

#[derive(Debug, Clone, Copy)]
pub struct EnchantingTranslator;

impl InventoryTranslator for EnchantingTranslator {
    fn size(&self) -> usize {
        ENCHANTING.len()
    }

    fn bedrock_type(&self) -> i8 {
        container_type::ENCHANTMENT
    }

    fn container_to_bedrock(&self, slot: usize) -> Option<BedrockSlot> {
        fixed_to_bedrock(&ENCHANTING, slot)
    }

    fn container_to_java(&self, slot: BedrockSlot) -> Option<usize> {
        fixed_to_java(&ENCHANTING, slot)
    }

    fn fake_block(&self) -> Option<&'static str> {
        Some("minecraft:enchanting_table")
    }
}

const BEACON: [BedrockSlot; 1] = [BedrockSlot::new(cs::BEACON_PAYMENT, 27)];

#[derive(Debug, Clone, Copy)]
pub struct BeaconTranslator;

impl InventoryTranslator for BeaconTranslator {
    fn size(&self) -> usize {
        BEACON.len()
    }

    fn bedrock_type(&self) -> i8 {
        container_type::BEACON
    }

    fn container_to_bedrock(&self, slot: usize) -> Option<BedrockSlot> {
        fixed_to_bedrock(&BEACON, slot)
    }

    fn container_to_java(&self, slot: BedrockSlot) -> Option<usize> {
        fixed_to_java(&BEACON, slot)
    }

    fn fake_block(&self) -> Option<&'static str> {
        Some("minecraft:beacon")
    }
}

const FURNACE: [BedrockSlot; 3] = [
    BedrockSlot::new(cs::FURNACE_INGREDIENT, 0),
    BedrockSlot::new(cs::FURNACE_FUEL, 1),
    BedrockSlot::new(cs::FURNACE_RESULT, 2),
];

#[derive(Debug, Clone, Copy)]
pub struct FurnaceTranslator;

impl InventoryTranslator for FurnaceTranslator {
    fn size(&self) -> usize {
        FURNACE.len()
    }

    fn bedrock_type(&self) -> i8 {
        container_type::FURNACE
    }

    fn container_to_bedrock(&self, slot: usize) -> Option<BedrockSlot> {
        fixed_to_bedrock(&FURNACE, slot)
    }

    fn container_to_java(&self, slot: BedrockSlot) -> Option<usize> {
        fixed_to_java(&FURNACE, slot)
    }

    fn fake_block(&self) -> Option<&'static str> {
        Some("minecraft:furnace[facing=north,lit=false]")
    }
}

const LOOM: [BedrockSlot; 4] = [
    BedrockSlot::new(cs::LOOM_INPUT, 9),
    BedrockSlot::new(cs::LOOM_DYE, 10),
    BedrockSlot::new(cs::LOOM_MATERIAL, 11),
    BedrockSlot::new(cs::LOOM_RESULT, RESULT_SLOT),
];

#[derive(Debug, Clone, Copy)]
pub struct LoomTranslator;

impl InventoryTranslator for LoomTranslator {
    fn size(&self) -> usize {
        LOOM.len()
    }

    fn bedrock_type(&self) -> i8 {
        container_type::LOOM
    }

    fn container_to_bedrock(&self, slot: usize) -> Option<BedrockSlot> {
        fixed_to_bedrock(&LOOM, slot)
    }

    fn container_to_java(&self, slot: BedrockSlot) -> Option<usize> {
        fixed_to_java(&LOOM, slot)
    }

    fn fake_block(&self) -> Option<&'static str> {
        Some("minecraft:loom[facing=north]")
    }
}

/// Java: saddle, body armor, then chest slots. Bedrock keeps saddle and armor
/// in the equipment container and the chest in the entity container.
#[derive(Debug, Clone, Copy)]
pub struct HorseTranslator {
    pub mount: Mount,
    pub chest_slots: u8,
}

const SADDLE: BedrockSlot = BedrockSlot::new(cs::HORSE_EQUIP, 0);
const BODY: BedrockSlot = BedrockSlot::new(cs::HORSE_EQUIP, 1);
const FIRST_CHEST_SLOT: u8 = 2;

impl InventoryTranslator for HorseTranslator {
    fn size(&self) -> usize {
        2 + self.chest_slots as usize
    }

    fn bedrock_type(&self) -> i8 {
        container_type::HORSE
    }

    fn container_to_bedrock(&self, slot: usize) -> Option<BedrockSlot> {
        match slot {
            0 => Some(SADDLE),
            // donkeys and mules have no body slot on Bedrock
            1 if self.mount == Mount::Chested => None,
            1 => Some(BODY),
            _ if slot < self.size() => {
                Some(BedrockSlot::new(cs::LEVEL_ENTITY, FIRST_CHEST_SLOT + (slot - 2) as u8))
            }
            _ => None,
        }
    }

    fn container_to_java(&self, slot: BedrockSlot) -> Option<usize> {
        if slot == SADDLE {
            return Some(0);
        }
        if slot == BODY {
            return (self.mount != Mount::Chested).then_some(1);
        }
        let chest = (slot.slot as usize).checked_sub(FIRST_CHEST_SLOT as usize)?;
        (slot.container == cs::LEVEL_ENTITY && chest < self.chest_slots as usize).then_some(2 + chest)
    }
}
