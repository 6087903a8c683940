//! Java entity type table.
//!
//! Each entry names the Bedrock identifier, the ordered metadata segments
//! the Java type inherits and the components the record carries.

use crate::entity::metadata::Segment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub equipment: bool,
    pub variant: bool,
    pub tameable: bool,
}

const ITEM_LIKE: Capabilities = Capabilities {
    equipment: false,
    variant: false,
    tameable: false,
};

const LIVING: Capabilities = Capabilities {
    equipment: true,
    variant: false,
    tameable: false,
};

const VARIANT: Capabilities = Capabilities {
    equipment: true,
    variant: true,
    tameable: false,
};

const PET: Capabilities = Capabilities {
    equipment: true,
    variant: true,
    tameable: true,
};

/// Horse inventory shape, for the horse container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mount {
    /// Saddle and armor slots.
    Horse,
    /// Saddle slot plus an optional chest.
    Chested,
    /// Chest sized by strength, carpet in the body slot.
    Llama,
}

#[derive(Debug, PartialEq, Eq)]
pub struct EntityDefinition {
    pub java_type: i32,
    pub identifier: &'static str,
    pub layout: &'static [Segment],
    pub capabilities: Capabilities,
    pub mount: Option<Mount>,
}

use Segment::*;

const BASE: &[Segment] = &[Base];
const LIVING_LAYOUT: &[Segment] = &[Base, Living];
const MOB: &[Segment] = &[Base, Living, Mob];
const AGEABLE: &[Segment] = &[Base, Living, Mob, Ageable];
const HORSE: &[Segment] = &[Base, Living, Mob, Ageable, AbstractHorse, HorseVariant];
const PLAIN_HORSE: &[Segment] = &[Base, Living, Mob, Ageable, AbstractHorse];
const CHESTED: &[Segment] = &[Base, Living, Mob, Ageable, AbstractHorse, ChestedHorse];
const LLAMA: &[Segment] = &[Base, Living, Mob, Ageable, AbstractHorse, ChestedHorse, Llama];
const WOLF: &[Segment] = &[Base, Living, Mob, Ageable, Tameable, Wolf];
const CAT: &[Segment] = &[Base, Living, Mob, Ageable, Tameable, Cat];
const PARROT: &[Segment] = &[Base, Living, Mob, Ageable, Tameable, Parrot];
const SHEEP: &[Segment] = &[Base, Living, Mob, Ageable, Sheep];
const PIG: &[Segment] = &[Base, Living, Mob, Ageable, Pig];
const ZOMBIE: &[Segment] = &[Base, Living, Mob, Zombie];
const PLAYER: &[Segment] = &[Base, Living, Player];

const fn def(
    java_type: i32,
    identifier: &'static str,
    layout: &'static [Segment],
    capabilities: Capabilities,
    mount: Option<Mount>,
) -> EntityDefinition {
    EntityDefinition {
        java_type,
        identifier,
        layout,
        capabilities,
        mount,
    }
}

/// Sorted by Java type id.
pub static DEFINITIONS: &[EntityDefinition] = &[
    def(3, "minecraft:armor_stand", LIVING_LAYOUT, LIVING, None),
    def(4, "minecraft:arrow", BASE, ITEM_LIKE, None),
    def(15, "minecraft:cat", CAT, PET, None),
    def(19, "minecraft:chicken", AGEABLE, LIVING, None),
    def(22, "minecraft:cow", AGEABLE, LIVING, None),
    def(23, "minecraft:creeper", MOB, LIVING, None),
    def(25, "minecraft:donkey", CHESTED, LIVING, Some(Mount::Chested)),
    def(53, "minecraft:horse", HORSE, VARIANT, Some(Mount::Horse)),
    def(58, "minecraft:item", BASE, ITEM_LIKE, None),
    def(65, "minecraft:llama", LLAMA, VARIANT, Some(Mount::Llama)),
    def(69, "minecraft:minecart", BASE, ITEM_LIKE, None),
    def(71, "minecraft:mule", CHESTED, LIVING, Some(Mount::Chested)),
    def(75, "minecraft:parrot", PARROT, PET, None),
    def(77, "minecraft:pig", PIG, LIVING, None),
    def(87, "minecraft:sheep", SHEEP, VARIANT, None),
    def(91, "minecraft:skeleton", MOB, LIVING, None),
    def(92, "minecraft:skeleton_horse", PLAIN_HORSE, LIVING, Some(Mount::Horse)),
    def(108, "minecraft:llama", LLAMA, VARIANT, Some(Mount::Llama)),
    def(113, "minecraft:villager_v2", AGEABLE, LIVING, None),
    def(122, "minecraft:wolf", WOLF, PET, None),
    def(124, "minecraft:zombie", ZOMBIE, LIVING, None),
    def(125, "minecraft:zombie_horse", PLAIN_HORSE, LIVING, Some(Mount::Horse)),
    def(128, "minecraft:player", PLAYER, LIVING, None),
];

/// Types missing from the table only get the base segment.
pub static UNKNOWN: EntityDefinition = def(-1, "minecraft:unknown", BASE, ITEM_LIKE, None);

pub const PLAYER_TYPE: i32 = 128;

pub fn definition(java_type: i32) -> &'static EntityDefinition {
    DEFINITIONS
        .binary_search_by_key(&java_type, |d| d.java_type)
        .map_or(&UNKNOWN, |i| &DEFINITIONS[i])
}
