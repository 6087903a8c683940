//! Container slot layouts on both sides and the packets that keep the
//! Bedrock view in step with the Java window.

pub mod click;
pub mod translators;
pub mod virtual_block;

use std::collections::BTreeMap;
use std::fmt;

use mc_bridge_proto::bedrock::{
    container_slot, window_id, FullContainerName, InventoryContent, InventorySlot, ItemStack,
};

use crate::entity::types::Mount;

pub use translators::{
    BeaconTranslator, EnchantingTranslator, FurnaceTranslator, GenericTranslator, HorseTranslator,
    LoomTranslator, PlayerTranslator, StonecutterTranslator,
};

/// Main inventory slots below 27 plus the hotbar.
pub const PLAYER_STORAGE_SLOTS: usize = 36;

/// Java player window: crafting result, grid, armor, storage, hotbar, offhand.
pub const PLAYER_WINDOW_SLOTS: usize = 46;

/// Bedrock's player crafting grid lives in the UI container.
pub const CRAFTING_INPUT: u8 = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BedrockSlot {
    pub container: u8,
    pub slot: u8,
}

impl BedrockSlot {
    pub const fn new(container: u8, slot: u8) -> Self {
        Self { container, slot }
    }
}

/// Slot mapping for one container type. The container's own slots come
/// first in the Java window, followed by 27 storage slots and the hotbar.
pub trait InventoryTranslator: fmt::Debug + Send {
    /// Java slots owned by the container itself.
    fn size(&self) -> usize;

    fn total_slots(&self) -> usize {
        self.size() + PLAYER_STORAGE_SLOTS
    }

    fn bedrock_type(&self) -> i8;

    fn container_to_bedrock(&self, slot: usize) -> Option<BedrockSlot>;

    fn container_to_java(&self, slot: BedrockSlot) -> Option<usize>;

    /// Java block state name placed in the world while the container is open.
    fn fake_block(&self) -> Option<&'static str> {
        None
    }

    /// Whether the fake block needs a second half to show every slot.
    fn paired(&self) -> bool {
        false
    }

    /// `None` for slots outside the window or with no Bedrock counterpart.
    fn java_to_bedrock(&self, slot: usize) -> Option<BedrockSlot> {
        let size = self.size();
        if slot < size {
            return self.container_to_bedrock(slot);
        }
        storage_to_bedrock(slot - size)
    }

    fn bedrock_to_java(&self, slot: BedrockSlot) -> Option<usize> {
        match storage_to_java(slot) {
            Some(storage) => Some(self.size() + storage),
            None => self.container_to_java(slot),
        }
    }
}

/// Index 0..27 is main storage, 27..36 the hotbar.
pub(crate) fn storage_to_bedrock(index: usize) -> Option<BedrockSlot> {
    match index {
        0..=26 => Some(BedrockSlot::new(container_slot::INVENTORY, index as u8 + 9)),
        27..=35 => Some(BedrockSlot::new(container_slot::HOTBAR, (index - 27) as u8)),
        _ => None,
    }
}

pub(crate) fn storage_to_java(slot: BedrockSlot) -> Option<usize> {
    let s = slot.slot as usize;
    match slot.container {
        container_slot::INVENTORY | container_slot::COMBINED_INVENTORY if (9..36).contains(&s) => {
            Some(s - 9)
        }
        container_slot::HOTBAR | container_slot::COMBINED_INVENTORY if s < 9 => Some(27 + s),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Player,
    Generic { rows: u8 },
    Stonecutter,
    Enchanting,
    Beacon,
    Furnace,
    Loom,
    Horse { mount: Mount, chest_slots: u8 },
}

impl ContainerKind {
    /// Java menu type registry id, as sent in OpenScreen.
    pub fn from_java_menu(menu: i32) -> Option<Self> {
        Some(match menu {
            0..=5 => Self::Generic { rows: menu as u8 + 1 },
            9 => Self::Beacon,
            13 => Self::Enchanting,
            14 => Self::Furnace,
            18 => Self::Loom,
            24 => Self::Stonecutter,
            _ => return None,
        })
    }

    pub fn translator(self) -> Box<dyn InventoryTranslator> {
        match self {
            Self::Player => Box::new(PlayerTranslator),
            Self::Generic { rows } => Box::new(GenericTranslator { rows }),
            Self::Stonecutter => Box::new(StonecutterTranslator),
            Self::Enchanting => Box::new(EnchantingTranslator),
            Self::Beacon => Box::new(BeaconTranslator),
            Self::Furnace => Box::new(FurnaceTranslator),
            Self::Loom => Box::new(LoomTranslator),
            Self::Horse { mount, chest_slots } => Box::new(HorseTranslator { mount, chest_slots }),
        }
    }
}

/// Bedrock window a container's slots are addressed through.
pub fn window_for(container: u8, open_window: u8) -> u8 {
    match container {
        container_slot::INVENTORY | container_slot::HOTBAR | container_slot::COMBINED_INVENTORY => {
            window_id::INVENTORY
        }
        container_slot::ARMOR => window_id::ARMOR,
        container_slot::OFFHAND => window_id::OFFHAND,
        container_slot::LEVEL_ENTITY
        | container_slot::FURNACE_INGREDIENT
        | container_slot::FURNACE_FUEL
        | container_slot::FURNACE_RESULT
        | container_slot::HORSE_EQUIP
        | container_slot::BARREL => open_window,
        _ => window_id::UI,
    }
}

/// Full contents of a Java window as one InventoryContent per Bedrock window.
pub fn content_packets<T, F>(
    translator: &dyn InventoryTranslator,
    open_window: u8,
    items: &[T],
    mut convert: F,
) -> Vec<InventoryContent>
where
    F: FnMut(&T) -> ItemStack,
{
    let mut windows: BTreeMap<u8, (u8, Vec<ItemStack>)> = BTreeMap::new();
    for (java, item) in items.iter().enumerate() {
        let Some(target) = translator.java_to_bedrock(java) else {
            continue;
        };
        let window = window_for(target.container, open_window);
        let (_, slots) = windows.entry(window).or_insert_with(|| (target.container, Vec::new()));
        let index = target.slot as usize;
        if slots.len() <= index {
            slots.resize(index + 1, ItemStack::default());
        }
        slots[index] = convert(item);
    }
    windows
        .into_iter()
        .map(|(window, (container, items))| InventoryContent {
            window_id: window as u32,
            items,
            container: FullContainerName::new(container),
        })
        .collect()
}

pub fn slot_packet(target: BedrockSlot, open_window: u8, item: ItemStack) -> InventorySlot {
    InventorySlot {
        window_id: window_for(target.container, open_window) as u32,
        slot: target.slot as u32,
        container: FullContainerName::new(target.container),
        item,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_mapping_round_trips() {
        for index in 0..PLAYER_STORAGE_SLOTS {
            let slot = storage_to_bedrock(index).unwrap();
            assert_eq!(storage_to_java(slot), Some(index));
        }
        assert_eq!(storage_to_bedrock(36), None);
    }

    #[test]
    fn combined_inventory_is_accepted_inbound() {
        let hotbar = BedrockSlot::new(container_slot::COMBINED_INVENTORY, 2);
        let main = BedrockSlot::new(container_slot::COMBINED_INVENTORY, 20);
        assert_eq!(storage_to_java(hotbar), Some(29));
        assert_eq!(storage_to_java(main), Some(11));
        assert_eq!(storage_to_java(BedrockSlot::new(container_slot::INVENTORY, 3)), None);
    }

    #[test]
    fn menu_ids() {
        assert_eq!(ContainerKind::from_java_menu(2), Some(ContainerKind::Generic { rows: 3 }));
        assert_eq!(ContainerKind::from_java_menu(5), Some(ContainerKind::Generic { rows: 6 }));
        assert_eq!(ContainerKind::from_java_menu(24), Some(ContainerKind::Stonecutter));
        assert_eq!(ContainerKind::from_java_menu(7), None);
    }

    #[test]
    fn windows_by_container() {
        assert_eq!(window_for(container_slot::HOTBAR, 5), window_id::INVENTORY);
        assert_eq!(window_for(container_slot::LEVEL_ENTITY, 5), 5);
        assert_eq!(window_for(container_slot::STONECUTTER_INPUT, 5), window_id::UI);
        assert_eq!(window_for(container_slot::ARMOR, 5), window_id::ARMOR);
    }

    #[test]
    fn chest_content_splits_into_windows() {
        let translator = ContainerKind::Generic { rows: 3 }.translator();
        let mut items = vec![ItemStack::default(); translator.total_slots()];
        items[0] = ItemStack::new(10, 1);
        items[27] = ItemStack::new(11, 2);
        items[54] = ItemStack::new(12, 3);
        let packets = content_packets(translator.as_ref(), 4, &items, Clone::clone);
        let player = packets.iter().find(|p| p.window_id == 0).unwrap();
        let chest = packets.iter().find(|p| p.window_id == 4).unwrap();
        assert_eq!(chest.items.len(), 27);
        assert_eq!(chest.items[0].network_id, 10);
        assert_eq!(player.items.len(), 36);
        assert_eq!(player.items[9].network_id, 11);
        assert_eq!(player.items[0].network_id, 12);
    }
}
