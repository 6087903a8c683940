//! Downgrades canonical Bedrock block and item descriptions for older
//! clients.
//!
//! [`CHAIN`] holds one step per protocol gap, newest first. Reaching an
//! older protocol walks every intermediate step in order; each step takes
//! an owned descriptor and returns the rewritten one, so shared tables are
//! never touched.

use crate::descriptor::BlockDescriptor;
use crate::error::WorldError;

/// Bedrock identifier + legacy data value of an item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemDescriptor {
    pub identifier: String,
    pub data: i16,
}

impl ItemDescriptor {
    pub fn new(identifier: impl Into<String>, data: i16) -> Self {
        Self {
            identifier: identifier.into(),
            data,
        }
    }
}

/// `from` → `to`, keeping the data value when `data` is `None`.
#[derive(Debug, Clone, Copy)]
pub struct ItemRemap {
    pub from: &'static str,
    pub to: &'static str,
    pub data: Option<i16>,
}

const fn remap(from: &'static str, to: &'static str, data: i16) -> ItemRemap {
    ItemRemap {
        from,
        to,
        data: Some(data),
    }
}

const fn rename(from: &'static str, to: &'static str) -> ItemRemap {
    ItemRemap {
        from,
        to,
        data: None,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConversionStep {
    pub from: u32,
    pub to: u32,
    pub block: fn(BlockDescriptor) -> BlockDescriptor,
    pub items: &'static [ItemRemap],
}

impl ConversionStep {
    pub fn remap_item(&self, item: ItemDescriptor) -> ItemDescriptor {
        match self.items.iter().find(|r| r.from == item.identifier) {
            Some(r) => ItemDescriptor {
                identifier: r.to.to_owned(),
                data: r.data.unwrap_or(item.data),
            },
            None => item,
        }
    }
}

pub const CHAIN: &[ConversionStep] = &[
    ConversionStep {
        from: 729,
        to: 712,
        block: block_729_712,
        items: ITEMS_729_712,
    },
    ConversionStep {
        from: 712,
        to: 685,
        block: block_712_685,
        items: ITEMS_712_685,
    },
    ConversionStep {
        from: 685,
        to: 671,
        block: block_685_671,
        items: ITEMS_685_671,
    },
    ConversionStep {
        from: 671,
        to: 662,
        block: block_671_662,
        items: ITEMS_671_662,
    },
    ConversionStep {
        from: 662,
        to: 649,
        block: block_662_649,
        items: ITEMS_662_649,
    },
];

/// Steps from the canonical protocol down to `target`, in application order.
pub fn steps_to(target: u32) -> Result<&'static [ConversionStep], WorldError> {
    if target == mc_bridge_proto::bedrock::CANONICAL_PROTOCOL {
        return Ok(&[]);
    }
    CHAIN
        .iter()
        .position(|step| step.to == target)
        .map(|last| &CHAIN[..=last])
        .ok_or(WorldError::UnsupportedProtocol(target))
}

/// Applies `steps` after checking each one starts where the previous ended.
pub fn apply_steps(
    mut block: BlockDescriptor,
    steps: &[&ConversionStep],
) -> Result<BlockDescriptor, WorldError> {
    let mut at = mc_bridge_proto::bedrock::CANONICAL_PROTOCOL;
    for step in steps {
        if step.from != at {
            return Err(WorldError::ChainOrder {
                expected: at,
                found: step.from,
            });
        }
        block = (step.block)(block);
        at = step.to;
    }
    Ok(block)
}

pub fn downgrade_block(block: &BlockDescriptor, target: u32) -> Result<BlockDescriptor, WorldError> {
    let steps: Vec<&ConversionStep> = steps_to(target)?.iter().collect();
    apply_steps(block.clone(), &steps)
}

pub fn downgrade_item(item: &ItemDescriptor, target: u32) -> Result<ItemDescriptor, WorldError> {
    Ok(steps_to(target)?
        .iter()
        .fold(item.clone(), |item, step| step.remap_item(item)))
}

fn strip_ns(name: &str) -> &str {
    name.strip_prefix("minecraft:").unwrap_or(name)
}

fn block_729_712(block: BlockDescriptor) -> BlockDescriptor {
    let name = block.name.clone();
    match name.as_str() {
        "minecraft:purpur_block" => block.with_state("chisel_type", "default"),
        "minecraft:purpur_pillar" => block
            .renamed("minecraft:purpur_block")
            .with_state("chisel_type", "lines"),
        "minecraft:sponge" => block.with_state("sponge_type", "dry"),
        "minecraft:wet_sponge" => block
            .renamed("minecraft:sponge")
            .with_state("sponge_type", "wet"),
        "minecraft:tnt" => block.with_state("allow_underwater_bit", false),
        "minecraft:underwater_tnt" => block
            .renamed("minecraft:tnt")
            .with_state("allow_underwater_bit", true),
        "minecraft:structure_void" => block.with_state("structure_void_type", "air"),
        name if name.ends_with("_wall") => {
            let wall_type = match strip_ns(name).trim_end_matches("_wall") {
                "end_stone_brick" => "end_brick",
                kind @ ("cobblestone" | "mossy_cobblestone" | "granite" | "diorite" | "andesite"
                | "sandstone" | "brick" | "stone_brick" | "mossy_stone_brick" | "nether_brick"
                | "prismarine" | "red_sandstone" | "red_nether_brick") => kind,
                _ => return block,
            };
            block
                .renamed("minecraft:cobblestone_wall")
                .with_state("wall_block_type", wall_type)
        }
        _ => block,
    }
}

fn stone_slab_type(kind: &str) -> Option<&'static str> {
    Some(match kind {
        "quartz" => "quartz",
        "petrified_oak" => "wood",
        "stone_brick" => "stone_brick",
        "brick" => "brick",
        "sandstone" => "sandstone",
        "nether_brick" => "nether_brick",
        "cobblestone" => "cobblestone",
        "smooth_stone" => "smooth_stone",
        _ => return None,
    })
}

fn stone_slab_type_2(kind: &str) -> Option<&'static str> {
    Some(match kind {
        "prismarine" => "prismarine_rough",
        "dark_prismarine" => "prismarine_dark",
        "smooth_sandstone" => "smooth_sandstone",
        "purpur" => "purpur",
        "red_nether_brick" => "red_nether_brick",
        "prismarine_brick" => "prismarine_brick",
        "mossy_cobblestone" => "mossy_cobblestone",
        "red_sandstone" => "red_sandstone",
        _ => return None,
    })
}

fn stone_slab_type_3(kind: &str) -> Option<&'static str> {
    Some(match kind {
        "smooth_red_sandstone" => "smooth_red_sandstone",
        "polished_granite" => "polished_granite",
        "granite" => "granite",
        "polished_diorite" => "polished_diorite",
        "andesite" => "andesite",
        "polished_andesite" => "polished_andesite",
        "diorite" => "diorite",
        "end_stone_brick" => "end_stone_brick",
        _ => return None,
    })
}

fn stone_slab_type_4(kind: &str) -> Option<&'static str> {
    Some(match kind {
        "smooth_quartz" => "smooth_quartz",
        "cut_sandstone" => "cut_sandstone",
        "cut_red_sandstone" => "cut_red_sandstone",
        "normal_stone" => "stone",
        "mossy_stone_brick" => "mossy_stone_brick",
        _ => return None,
    })
}

/// Slabs and double slabs folded into the numbered stone slab families.
fn fold_stone_slab(block: BlockDescriptor) -> Result<BlockDescriptor, BlockDescriptor> {
    let name = strip_ns(&block.name);
    let (kind, double) = match name.strip_suffix("_double_slab") {
        Some(kind) => (kind, true),
        None => match name.strip_suffix("_slab") {
            Some(kind) => (kind, false),
            None => return Err(block),
        },
    };
    // the first family only folds double slabs at this step
    if double {
        if let Some(value) = stone_slab_type(kind) {
            return Ok(block
                .renamed("minecraft:double_stone_block_slab")
                .with_state("stone_slab_type", value));
        }
    }
    let families: [(fn(&str) -> Option<&'static str>, &str, &str); 3] = [
        (stone_slab_type_2, "stone_block_slab2", "stone_slab_type_2"),
        (stone_slab_type_3, "stone_block_slab3", "stone_slab_type_3"),
        (stone_slab_type_4, "stone_block_slab4", "stone_slab_type_4"),
    ];
    for (lookup, family, key) in families {
        if let Some(value) = lookup(kind) {
            let name = if double {
                format!("minecraft:double_{family}")
            } else {
                format!("minecraft:{family}")
            };
            return Ok(block.renamed(&name).with_state(key, value));
        }
    }
    Err(block)
}

fn block_712_685(block: BlockDescriptor) -> BlockDescriptor {
    let block = match fold_stone_slab(block) {
        Ok(folded) => return folded,
        Err(block) => block,
    };
    let name = block.name.clone();
    let short = strip_ns(&name);
    match short {
        "prismarine" => block.with_state("prismarine_block_type", "default"),
        "dark_prismarine" => block
            .renamed("minecraft:prismarine")
            .with_state("prismarine_block_type", "dark"),
        "prismarine_bricks" => block
            .renamed("minecraft:prismarine")
            .with_state("prismarine_block_type", "bricks"),
        "infested_stone" | "infested_cobblestone" | "infested_stone_bricks"
        | "infested_mossy_stone_bricks" | "infested_cracked_stone_bricks"
        | "infested_chiseled_stone_bricks" => {
            let kind = match short {
                "infested_stone" => "stone",
                "infested_cobblestone" => "cobblestone",
                "infested_stone_bricks" => "stone_brick",
                "infested_mossy_stone_bricks" => "mossy_stone_brick",
                "infested_cracked_stone_bricks" => "cracked_stone_brick",
                _ => "chiseled_stone_brick",
            };
            block
                .renamed("minecraft:monster_egg")
                .with_state("monster_egg_stone_type", kind)
        }
        "stone_bricks" | "mossy_stone_bricks" | "cracked_stone_bricks"
        | "chiseled_stone_bricks" | "smooth_stone_bricks" => {
            let kind = match short {
                "mossy_stone_bricks" => "mossy",
                "cracked_stone_bricks" => "cracked",
                "chiseled_stone_bricks" => "chiseled",
                "smooth_stone_bricks" => "smooth",
                _ => "default",
            };
            block
                .renamed("minecraft:stonebrick")
                .with_state("stone_brick_type", kind)
        }
        "sandstone" | "cut_sandstone" | "chiseled_sandstone" | "smooth_sandstone"
        | "red_sandstone" | "cut_red_sandstone" | "chiseled_red_sandstone"
        | "smooth_red_sandstone" => {
            let family = if short.contains("red_") {
                "minecraft:red_sandstone"
            } else {
                "minecraft:sandstone"
            };
            let kind = if short.starts_with("cut_") {
                "cut"
            } else if short.starts_with("chiseled_") {
                "heiroglyphs"
            } else if short.starts_with("smooth_") {
                "smooth"
            } else {
                "default"
            };
            block.renamed(family).with_state("sand_stone_type", kind)
        }
        "quartz_block" | "chiseled_quartz_block" | "quartz_pillar" | "smooth_quartz" => {
            let kind = match short {
                "chiseled_quartz_block" => "chiseled",
                "quartz_pillar" => "lines",
                "smooth_quartz" => "smooth",
                _ => "default",
            };
            block
                .renamed("minecraft:quartz_block")
                .with_state("chisel_type", kind)
        }
        "sand" => block.with_state("sand_type", "normal"),
        "red_sand" => block.renamed("minecraft:sand").with_state("sand_type", "red"),
        "dirt" => block.with_state("dirt_type", "normal"),
        "coarse_dirt" => block
            .renamed("minecraft:dirt")
            .with_state("dirt_type", "coarse"),
        "anvil" | "chipped_anvil" | "damaged_anvil" | "deprecated_anvil" => {
            let damage = match short {
                "chipped_anvil" => "slightly_damaged",
                "damaged_anvil" => "broken",
                "deprecated_anvil" => "very_damaged",
                _ => "undamaged",
            };
            block.renamed("minecraft:anvil").with_state("damage", damage)
        }
        "dandelion" => block.renamed("minecraft:yellow_flower"),
        s if s.starts_with("light_block_") => match s["light_block_".len()..].parse::<i32>() {
            Ok(level) => block
                .renamed("minecraft:light_block")
                .with_state("block_light_level", level),
            Err(_) => block,
        },
        s if s.ends_with("_coral_wall_fan") => {
            let dead = s.starts_with("dead_");
            let color = s.trim_start_matches("dead_").trim_end_matches("_coral_wall_fan");
            let family = match color {
                "tube" | "brain" => "minecraft:coral_fan_hang",
                "bubble" | "fire" => "minecraft:coral_fan_hang2",
                "horn" => "minecraft:coral_fan_hang3",
                _ => return block,
            };
            let type_bit = color == "brain" || color == "fire";
            block
                .renamed(family)
                .with_state("coral_hang_type_bit", type_bit)
                .with_state("dead_bit", dead)
        }
        _ => block,
    }
}

fn coral_color(kind: &str) -> Option<&'static str> {
    Some(match kind {
        "tube" => "blue",
        "brain" => "pink",
        "bubble" => "purple",
        "fire" => "yellow",
        "horn" => "red",
        _ => return None,
    })
}

fn block_685_671(block: BlockDescriptor) -> BlockDescriptor {
    let name = block.name.clone();
    let short = strip_ns(&name);
    match short {
        "trial_spawner" | "vault" => block.without_state("ominous"),
        "sunflower" | "lilac" | "tall_grass" | "large_fern" | "rose_bush" | "peony" => {
            let kind = match short {
                "lilac" => "syringa",
                "tall_grass" => "grass",
                "large_fern" => "fern",
                "rose_bush" => "rose",
                "peony" => "paeonia",
                _ => "sunflower",
            };
            block
                .renamed("minecraft:double_plant")
                .with_state("double_plant_type", kind)
        }
        "short_grass" => block
            .renamed("minecraft:tallgrass")
            .with_state("tall_grass_type", "tall"),
        "fern" => block
            .renamed("minecraft:tallgrass")
            .with_state("tall_grass_type", "fern"),
        s if s.ends_with("_coral_block") => {
            let dead = s.starts_with("dead_");
            let kind = s.trim_start_matches("dead_").trim_end_matches("_coral_block");
            match coral_color(kind) {
                Some(color) => block
                    .renamed("minecraft:coral_block")
                    .with_state("coral_color", color)
                    .with_state("dead_bit", dead),
                None => block,
            }
        }
        s if s.ends_with("_slab") && !s.ends_with("_double_slab") => {
            match stone_slab_type(s.trim_end_matches("_slab")) {
                Some(kind) => block
                    .renamed("minecraft:stone_block_slab")
                    .with_state("stone_slab_type", kind),
                None => block,
            }
        }
        _ => block,
    }
}

fn block_671_662(block: BlockDescriptor) -> BlockDescriptor {
    let name = block.name.clone();
    let short = strip_ns(&name);
    match short {
        "bamboo_sapling" => block.with_state("sapling_type", "oak"),
        "heavy_core" => block.renamed("minecraft:conduit"),
        "oak_sapling" | "spruce_sapling" | "birch_sapling" | "jungle_sapling"
        | "acacia_sapling" | "dark_oak_sapling" => {
            let kind = short.trim_end_matches("_sapling").to_owned();
            block
                .renamed("minecraft:sapling")
                .with_state("sapling_type", kind.as_str())
        }
        "poppy" | "blue_orchid" | "allium" | "azure_bluet" | "red_tulip" | "orange_tulip"
        | "white_tulip" | "pink_tulip" | "oxeye_daisy" | "cornflower" | "lily_of_the_valley" => {
            let kind = match short {
                "blue_orchid" => "orchid",
                "azure_bluet" => "houstonia",
                "red_tulip" => "tulip_red",
                "orange_tulip" => "tulip_orange",
                "white_tulip" => "tulip_white",
                "pink_tulip" => "tulip_pink",
                "oxeye_daisy" => "oxeye",
                other => other,
            }
            .to_owned();
            block
                .renamed("minecraft:red_flower")
                .with_state("flower_type", kind.as_str())
        }
        s if s.ends_with("_coral_fan") && !s.ends_with("_wall_fan") => {
            let dead = s.starts_with("dead_");
            let kind = s.trim_start_matches("dead_").trim_end_matches("_coral_fan");
            match coral_color(kind) {
                Some(color) => block
                    .renamed(if dead {
                        "minecraft:coral_fan_dead"
                    } else {
                        "minecraft:coral_fan"
                    })
                    .with_state("coral_color", color),
                None => block,
            }
        }
        _ => block,
    }
}

const OLD_WOODS: [&str; 6] = ["oak", "spruce", "birch", "jungle", "acacia", "dark_oak"];

fn block_662_649(block: BlockDescriptor) -> BlockDescriptor {
    let name = block.name.clone();
    let short = strip_ns(&name);
    match short {
        "grass_block" => block.renamed("minecraft:grass"),
        "vault" => {
            let mut block = block.renamed("minecraft:trial_spawner");
            block.states.clear();
            block.with_state("trial_spawner_state", 0)
        }
        s if s.ends_with("_wood") => {
            let stripped = s.starts_with("stripped_");
            let kind = s.trim_start_matches("stripped_").trim_end_matches("_wood");
            if !OLD_WOODS.contains(&kind) {
                return block;
            }
            let kind = kind.to_owned();
            block
                .renamed("minecraft:wood")
                .with_state("wood_type", kind.as_str())
                .with_state("stripped_bit", stripped)
        }
        s if s.ends_with("_leaves") => {
            let kind = s.trim_end_matches("_leaves").to_owned();
            match kind.as_str() {
                "oak" | "spruce" | "birch" | "jungle" => block
                    .renamed("minecraft:leaves")
                    .with_state("old_leaf_type", kind.as_str()),
                "acacia" | "dark_oak" => block
                    .renamed("minecraft:leaves2")
                    .with_state("new_leaf_type", kind.as_str()),
                _ => block,
            }
        }
        s if s.ends_with("_slab") => {
            let double = s.ends_with("_double_slab");
            let kind = s.trim_end_matches("_slab").trim_end_matches("_double").to_owned();
            if !OLD_WOODS.contains(&kind.as_str()) {
                return block;
            }
            block
                .renamed(if double {
                    "minecraft:double_wooden_slab"
                } else {
                    "minecraft:wooden_slab"
                })
                .with_state("wood_type", kind.as_str())
        }
        _ => block,
    }
}

const ITEMS_729_712: &[ItemRemap] = &[
    remap("minecraft:underwater_tnt", "minecraft:tnt", 1),
    remap("minecraft:purpur_pillar", "minecraft:purpur_block", 1),
    remap("minecraft:wet_sponge", "minecraft:sponge", 1),
    remap("minecraft:mossy_cobblestone_wall", "minecraft:cobblestone_wall", 1),
    remap("minecraft:granite_wall", "minecraft:cobblestone_wall", 2),
    remap("minecraft:diorite_wall", "minecraft:cobblestone_wall", 3),
    remap("minecraft:andesite_wall", "minecraft:cobblestone_wall", 4),
    remap("minecraft:sandstone_wall", "minecraft:cobblestone_wall", 5),
    remap("minecraft:brick_wall", "minecraft:cobblestone_wall", 6),
    remap("minecraft:stone_brick_wall", "minecraft:cobblestone_wall", 7),
    remap("minecraft:mossy_stone_brick_wall", "minecraft:cobblestone_wall", 8),
    remap("minecraft:nether_brick_wall", "minecraft:cobblestone_wall", 9),
    remap("minecraft:end_stone_brick_wall", "minecraft:cobblestone_wall", 10),
    remap("minecraft:prismarine_wall", "minecraft:cobblestone_wall", 11),
    remap("minecraft:red_sandstone_wall", "minecraft:cobblestone_wall", 12),
    remap("minecraft:red_nether_brick_wall", "minecraft:cobblestone_wall", 13),
];

const ITEMS_712_685: &[ItemRemap] = &[
    remap("minecraft:coarse_dirt", "minecraft:dirt", 1),
    remap("minecraft:dandelion", "minecraft:yellow_flower", 0),
    remap("minecraft:red_sand", "minecraft:sand", 1),
    remap("minecraft:dark_prismarine", "minecraft:prismarine", 1),
    remap("minecraft:prismarine_bricks", "minecraft:prismarine", 2),
    remap("minecraft:chiseled_sandstone", "minecraft:sandstone", 1),
    remap("minecraft:cut_sandstone", "minecraft:sandstone", 2),
    remap("minecraft:smooth_sandstone", "minecraft:sandstone", 3),
    remap("minecraft:chiseled_quartz_block", "minecraft:quartz_block", 1),
    remap("minecraft:quartz_pillar", "minecraft:quartz_block", 2),
    remap("minecraft:smooth_quartz", "minecraft:quartz_block", 3),
    remap("minecraft:mossy_stone_bricks", "minecraft:stonebrick", 1),
    remap("minecraft:cracked_stone_bricks", "minecraft:stonebrick", 2),
    remap("minecraft:chiseled_stone_bricks", "minecraft:stonebrick", 3),
    remap("minecraft:chipped_anvil", "minecraft:anvil", 4),
    remap("minecraft:damaged_anvil", "minecraft:anvil", 8),
];

const ITEMS_685_671: &[ItemRemap] = &[
    rename("minecraft:music_disc_creator", "minecraft:music_disc_otherside"),
    rename("minecraft:music_disc_creator_music_box", "minecraft:music_disc_otherside"),
    rename("minecraft:music_disc_precipice", "minecraft:music_disc_otherside"),
    rename("minecraft:ominous_trial_key", "minecraft:trial_key"),
    rename("minecraft:ominous_bottle", "minecraft:glass_bottle"),
    remap("minecraft:tube_coral_block", "minecraft:coral_block", 0),
    remap("minecraft:brain_coral_block", "minecraft:coral_block", 1),
    remap("minecraft:bubble_coral_block", "minecraft:coral_block", 2),
    remap("minecraft:fire_coral_block", "minecraft:coral_block", 3),
    remap("minecraft:horn_coral_block", "minecraft:coral_block", 4),
    remap("minecraft:sunflower", "minecraft:double_plant", 0),
    remap("minecraft:lilac", "minecraft:double_plant", 1),
    remap("minecraft:tall_grass", "minecraft:double_plant", 2),
    remap("minecraft:large_fern", "minecraft:double_plant", 3),
    remap("minecraft:rose_bush", "minecraft:double_plant", 4),
    remap("minecraft:peony", "minecraft:double_plant", 5),
    remap("minecraft:smooth_stone_slab", "minecraft:stone_block_slab", 0),
    remap("minecraft:sandstone_slab", "minecraft:stone_block_slab", 1),
    remap("minecraft:cobblestone_slab", "minecraft:stone_block_slab", 3),
    remap("minecraft:brick_slab", "minecraft:stone_block_slab", 4),
    remap("minecraft:stone_brick_slab", "minecraft:stone_block_slab", 5),
    remap("minecraft:quartz_slab", "minecraft:stone_block_slab", 6),
    remap("minecraft:nether_brick_slab", "minecraft:stone_block_slab", 7),
    remap("minecraft:short_grass", "minecraft:tallgrass", 1),
    remap("minecraft:fern", "minecraft:tallgrass", 2),
];

const ITEMS_671_662: &[ItemRemap] = &[
    rename("minecraft:bolt_armor_trim_smithing_template", "minecraft:wayfinder_armor_trim_smithing_template"),
    rename("minecraft:breeze_rod", "minecraft:blaze_rod"),
    rename("minecraft:flow_armor_trim_smithing_template", "minecraft:spire_armor_trim_smithing_template"),
    rename("minecraft:flow_banner_pattern", "minecraft:globe_banner_pattern"),
    rename("minecraft:guster_banner_pattern", "minecraft:globe_banner_pattern"),
    rename("minecraft:flow_pottery_sherd", "minecraft:skull_pottery_sherd"),
    rename("minecraft:guster_pottery_sherd", "minecraft:shelter_pottery_sherd"),
    rename("minecraft:scrape_pottery_sherd", "minecraft:heartbreak_pottery_sherd"),
    rename("minecraft:heavy_core", "minecraft:conduit"),
    rename("minecraft:mace", "minecraft:netherite_axe"),
    remap("minecraft:poppy", "minecraft:red_flower", 0),
    remap("minecraft:blue_orchid", "minecraft:red_flower", 1),
    remap("minecraft:allium", "minecraft:red_flower", 2),
    remap("minecraft:azure_bluet", "minecraft:red_flower", 3),
    remap("minecraft:oak_sapling", "minecraft:sapling", 0),
    remap("minecraft:spruce_sapling", "minecraft:sapling", 1),
    remap("minecraft:birch_sapling", "minecraft:sapling", 2),
    remap("minecraft:jungle_sapling", "minecraft:sapling", 3),
    remap("minecraft:acacia_sapling", "minecraft:sapling", 4),
    remap("minecraft:dark_oak_sapling", "minecraft:sapling", 5),
];

const ITEMS_662_649: &[ItemRemap] = &[
    rename("minecraft:bogged_spawn_egg", "minecraft:creeper_spawn_egg"),
    rename("minecraft:grass_block", "minecraft:grass"),
    rename("minecraft:vault", "minecraft:trial_spawner"),
    rename("minecraft:wind_charge", "minecraft:snowball"),
    remap("minecraft:oak_wood", "minecraft:wood", 0),
    remap("minecraft:spruce_wood", "minecraft:wood", 1),
    remap("minecraft:birch_wood", "minecraft:wood", 2),
    remap("minecraft:jungle_wood", "minecraft:wood", 3),
    remap("minecraft:acacia_wood", "minecraft:wood", 4),
    remap("minecraft:dark_oak_wood", "minecraft:wood", 5),
    remap("minecraft:oak_slab", "minecraft:wooden_slab", 0),
    remap("minecraft:spruce_slab", "minecraft:wooden_slab", 1),
    remap("minecraft:birch_slab", "minecraft:wooden_slab", 2),
    remap("minecraft:oak_leaves", "minecraft:leaves", 0),
    remap("minecraft:spruce_leaves", "minecraft:leaves", 1),
    remap("minecraft:birch_leaves", "minecraft:leaves", 2),
    remap("minecraft:jungle_leaves", "minecraft:leaves", 3),
    remap("minecraft:acacia_leaves", "minecraft:leaves2", 0),
    remap("minecraft:dark_oak_leaves", "minecraft:leaves2", 1),
];
