//! Java → Bedrock block, item and biome registries.
//!
//! A [`Registries`] value is built once at startup and shared behind an
//! `Arc`. Vanilla tables are immutable after construction; one
//! [`ProtocolMappings`] exists per supported Bedrock protocol, derived from
//! the canonical table through the conversion chain. Runtime custom
//! blocks/items are appended under a single lock so concurrent
//! registrations never interleave.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Deserialize;
use tracing::{debug, info, trace};

use mc_bridge_proto::bedrock::SUPPORTED_PROTOCOLS;

use crate::conversion::{downgrade_block, downgrade_item, ItemDescriptor};
use crate::descriptor::{BlockDescriptor, StateValue};
use crate::error::WorldError;

const BLOCKS_JSON: &str = include_str!("../data/blocks.json");
const ITEMS_JSON: &str = include_str!("../data/items.json");
const ITEM_PALETTE_JSON: &str = include_str!("../data/item_palette.json");
const BIOMES_JSON: &str = include_str!("../data/biomes.json");

/// Item shown for Java items with no Bedrock counterpart.
pub const UNKNOWN_ITEM: &str = "minecraft:info_update";
/// Biome used when the Java biome is unknown.
pub const DEFAULT_BIOME: u32 = 1;

/// Vanilla Java blocks in registry order. State ids are implicit: each
/// block takes the cartesian product of its property values, the last
/// property varying fastest, starting where the previous block ended.
#[derive(Debug, Deserialize)]
struct BlockTable {
    palette: Vec<BlockDescriptor>,
    blocks: Vec<BlockEntry>,
}

#[derive(Debug, Deserialize)]
struct BlockEntry {
    name: String,
    #[serde(default)]
    properties: Vec<(String, Vec<String>)>,
    bedrock: BedrockRef,
    /// Always holds water, whatever its properties say.
    #[serde(default)]
    water_filled: bool,
}

/// Palette index for every state of a block, or one index shared by all.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BedrockRef {
    Shared(u32),
    PerState(Vec<u32>),
}

#[derive(Debug, Deserialize)]
struct ItemTable {
    items: Vec<ItemEntry>,
}

fn default_stack_size() -> u8 {
    64
}

#[derive(Debug, Deserialize)]
struct ItemEntry {
    java_id: u32,
    java_name: String,
    bedrock: String,
    #[serde(default)]
    data: i16,
    #[serde(default = "default_stack_size")]
    stack_size: u8,
    #[serde(default)]
    max_damage: u16,
    #[serde(default)]
    tool_type: Option<String>,
    #[serde(default)]
    tool_tier: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemPalette {
    items: HashMap<String, i32>,
}

#[derive(Debug, Deserialize)]
struct BiomeTable {
    biomes: HashMap<String, u32>,
}

/// Vanilla Java block states, indexed by global state id.
#[derive(Debug)]
struct JavaBlocks {
    names: Vec<String>,
    /// Index into `palette` per state.
    canonical: Vec<u32>,
    palette: Vec<BlockDescriptor>,
    waterlogged: Vec<bool>,
    by_name: HashMap<String, u32>,
}

impl JavaBlocks {
    fn from_table(table: BlockTable) -> Result<Self, WorldError> {
        let BlockTable { palette, blocks: entries } = table;
        let mut blocks = Self {
            names: Vec::new(),
            canonical: Vec::new(),
            palette,
            waterlogged: Vec::new(),
            by_name: HashMap::new(),
        };
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in entries {
            if !seen.insert(entry.name.clone()) {
                return Err(WorldError::InvalidMapping(format!(
                    "java block {} listed twice",
                    entry.name
                )));
            }
            blocks.push_block(entry)?;
        }
        if blocks.names.first().map(String::as_str) != Some("minecraft:air") {
            return Err(WorldError::InvalidMapping("state 0 must be air".into()));
        }
        Ok(blocks)
    }

    fn push_block(&mut self, entry: BlockEntry) -> Result<(), WorldError> {
        if let Some((key, _)) = entry.properties.iter().find(|(_, values)| values.is_empty()) {
            return Err(WorldError::InvalidMapping(format!(
                "{}: property {key} has no values",
                entry.name
            )));
        }
        let count: usize = entry.properties.iter().map(|(_, values)| values.len()).product();
        let bedrock = match entry.bedrock {
            BedrockRef::Shared(index) => vec![index; count],
            BedrockRef::PerState(indices) if indices.len() == count => indices,
            BedrockRef::PerState(indices) => {
                return Err(WorldError::InvalidMapping(format!(
                    "{}: {} bedrock states for {count} java states",
                    entry.name,
                    indices.len()
                )))
            }
        };
        if let Some(index) = bedrock.iter().find(|i| **i as usize >= self.palette.len()) {
            return Err(WorldError::InvalidMapping(format!(
                "{}: palette index {index} out of range",
                entry.name
            )));
        }
        let waterlogged_at = entry.properties.iter().position(|(key, _)| key == "waterlogged");

        let mut digits = vec![0usize; entry.properties.len()];
        for index in bedrock {
            let id = self.names.len() as u32;
            let name = state_name(&entry.name, &entry.properties, &digits);
            let wet = entry.water_filled
                || waterlogged_at.is_some_and(|at| entry.properties[at].1[digits[at]] == "true");
            self.by_name.insert(name.clone(), id);
            self.names.push(name);
            self.canonical.push(index);
            self.waterlogged.push(wet);
            advance(&mut digits, &entry.properties);
        }
        Ok(())
    }

    fn len(&self) -> u32 {
        self.canonical.len() as u32
    }

    fn canonical(&self, java_id: u32) -> Option<&BlockDescriptor> {
        let index = *self.canonical.get(java_id as usize)?;
        self.palette.get(index as usize)
    }
}

/// `minecraft:chest[facing=north,type=single,waterlogged=true]`
fn state_name(block: &str, properties: &[(String, Vec<String>)], digits: &[usize]) -> String {
    if properties.is_empty() {
        return block.to_owned();
    }
    let states: Vec<String> = properties
        .iter()
        .zip(digits)
        .map(|((key, values), digit)| format!("{key}={}", values[*digit]))
        .collect();
    format!("{block}[{}]", states.join(","))
}

/// Steps to the next state, the last property rolling over first.
fn advance(digits: &mut [usize], properties: &[(String, Vec<String>)]) {
    for (digit, (_, values)) in digits.iter_mut().zip(properties).rev() {
        *digit += 1;
        if *digit < values.len() {
            return;
        }
        *digit = 0;
    }
}

/// Java state id → Bedrock runtime id for one protocol.
#[derive(Debug, Clone)]
pub struct BlockMappings {
    protocol: u32,
    runtime_ids: Vec<u32>,
    waterlogged: Vec<bool>,
    air: u32,
    water: u32,
}

impl BlockMappings {
    pub fn protocol(&self) -> u32 {
        self.protocol
    }

    pub fn runtime_id(&self, java_id: u32) -> Option<u32> {
        self.runtime_ids.get(java_id as usize).copied()
    }

    /// Unknown states resolve to air.
    pub fn resolve(&self, java_id: u32) -> u32 {
        match self.runtime_id(java_id) {
            Some(id) => id,
            None => {
                trace!(java_id, protocol = self.protocol, "unknown block state");
                self.air
            }
        }
    }

    pub fn is_waterlogged(&self, java_id: u32) -> bool {
        self.waterlogged.get(java_id as usize).copied().unwrap_or(false)
    }

    pub fn air_id(&self) -> u32 {
        self.air
    }

    /// Still water, used for the second layer of waterlogged blocks.
    pub fn water_id(&self) -> u32 {
        self.water
    }

    pub fn len(&self) -> usize {
        self.runtime_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runtime_ids.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemMapping {
    pub java_id: u32,
    pub java_identifier: String,
    pub bedrock_identifier: String,
    pub bedrock_data: i16,
    pub network_id: i32,
    pub stack_size: u8,
    pub max_damage: u16,
    pub tool_type: Option<String>,
    pub tool_tier: Option<String>,
}

impl ItemMapping {
    pub fn is_damageable(&self) -> bool {
        self.max_damage > 0
    }
}

/// Java item id → Bedrock item for one protocol.
#[derive(Debug, Clone)]
pub struct ItemMappings {
    protocol: u32,
    by_java: Vec<Option<ItemMapping>>,
    by_bedrock: HashMap<(i32, i16), u32>,
    placeholder: ItemMapping,
}

impl ItemMappings {
    pub fn protocol(&self) -> u32 {
        self.protocol
    }

    pub fn get(&self, java_id: u32) -> Option<&ItemMapping> {
        self.by_java.get(java_id as usize).and_then(Option::as_ref)
    }

    /// Unknown items resolve to the placeholder item.
    pub fn resolve(&self, java_id: u32) -> &ItemMapping {
        match self.get(java_id) {
            Some(mapping) => mapping,
            None => {
                trace!(java_id, protocol = self.protocol, "unknown item");
                &self.placeholder
            }
        }
    }

    pub fn placeholder(&self) -> &ItemMapping {
        &self.placeholder
    }

    /// Reverse lookup; several Java items may share a Bedrock id, the lowest wins.
    pub fn java_id_for(&self, network_id: i32, data: i16) -> Option<u32> {
        self.by_bedrock.get(&(network_id, data)).copied()
    }
}

#[derive(Debug, Clone)]
pub struct ProtocolMappings {
    pub protocol: u32,
    pub blocks: BlockMappings,
    pub items: ItemMappings,
}

/// A non-vanilla item shown to Bedrock clients in place of a Java item with
/// the given custom model data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomItemDefinition {
    identifier: String,
    display_name: String,
    java_item: String,
    custom_model_data: i32,
    stack_size: u8,
}

fn validate_identifier(identifier: &str) -> Result<(), WorldError> {
    let Some((namespace, path)) = identifier.split_once(':') else {
        return Err(WorldError::InvalidCustom(format!("{identifier} has no namespace")));
    };
    if namespace == "minecraft" {
        return Err(WorldError::InvalidCustom(format!(
            "{identifier} uses the vanilla namespace"
        )));
    }
    let valid = |s: &str| {
        !s.is_empty()
            && s
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "_-./".contains(c))
    };
    if !valid(namespace) || !valid(path) {
        return Err(WorldError::InvalidCustom(format!("{identifier} is not a valid identifier")));
    }
    Ok(())
}

impl CustomItemDefinition {
    pub fn new(
        identifier: impl Into<String>,
        display_name: impl Into<String>,
        java_item: impl Into<String>,
        custom_model_data: i32,
        stack_size: u8,
    ) -> Result<Self, WorldError> {
        let identifier = identifier.into();
        validate_identifier(&identifier)?;
        if !(1..=64).contains(&stack_size) {
            return Err(WorldError::InvalidCustom(format!(
                "{identifier}: stack size {stack_size} outside 1..=64"
            )));
        }
        Ok(Self {
            identifier,
            display_name: display_name.into(),
            java_item: java_item.into(),
            custom_model_data,
            stack_size,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn java_item(&self) -> &str {
        &self.java_item
    }

    pub fn custom_model_data(&self) -> i32 {
        self.custom_model_data
    }

    pub fn stack_size(&self) -> u8 {
        self.stack_size
    }
}

/// A non-vanilla block. The Bedrock side gets `identifier` with `states`;
/// the Java side gets a synthetic state id above the vanilla range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomBlockDefinition {
    identifier: String,
    states: BTreeMap<String, StateValue>,
}

impl CustomBlockDefinition {
    pub fn new(
        identifier: impl Into<String>,
        states: BTreeMap<String, StateValue>,
    ) -> Result<Self, WorldError> {
        let identifier = identifier.into();
        validate_identifier(&identifier)?;
        if let Some(key) = states.keys().find(|k| k.is_empty()) {
            return Err(WorldError::InvalidCustom(format!(
                "{identifier}: empty state name {key:?}"
            )));
        }
        Ok(Self { identifier, states })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn descriptor(&self) -> BlockDescriptor {
        BlockDescriptor {
            name: self.identifier.clone(),
            states: self.states.clone(),
        }
    }
}

#[derive(Debug)]
struct CustomItem {
    definition: CustomItemDefinition,
    network_id: i32,
}

#[derive(Debug)]
struct CustomBlock {
    definition: CustomBlockDefinition,
    java_id: u32,
    /// Runtime id per protocol, same order as `Registries::protocols`.
    runtime_ids: Vec<(u32, u32)>,
}

#[derive(Debug, Default)]
struct CustomRegistry {
    items: Vec<CustomItem>,
    blocks: Vec<CustomBlock>,
}

/// Every table the bridge needs, for every supported protocol.
#[derive(Debug)]
pub struct Registries {
    java_blocks: JavaBlocks,
    java_items: HashMap<String, u32>,
    protocols: BTreeMap<u32, Arc<ProtocolMappings>>,
    biomes: HashMap<String, u32>,
    first_custom_item: i32,
    custom: Mutex<CustomRegistry>,
}

impl Registries {
    /// Loads the embedded tables.
    pub fn load() -> Result<Self, WorldError> {
        Self::from_json(BLOCKS_JSON, ITEMS_JSON, ITEM_PALETTE_JSON, BIOMES_JSON)
    }

    pub fn from_json(
        blocks: &str,
        items: &str,
        item_palette: &str,
        biomes: &str,
    ) -> Result<Self, WorldError> {
        let java_blocks = JavaBlocks::from_table(serde_json::from_str(blocks)?)?;
        let items: ItemTable = serde_json::from_str(items)?;
        let palette: ItemPalette = serde_json::from_str(item_palette)?;
        let biomes: BiomeTable = serde_json::from_str(biomes)?;

        if !palette.items.contains_key(UNKNOWN_ITEM) {
            return Err(WorldError::InvalidMapping(format!(
                "item palette lacks {UNKNOWN_ITEM}"
            )));
        }

        let mut protocols = BTreeMap::new();
        for (protocol, _) in SUPPORTED_PROTOCOLS {
            let blocks = build_blocks(&java_blocks, *protocol)?;
            let items = build_items(&items.items, &palette.items, *protocol)?;
            protocols.insert(
                *protocol,
                Arc::new(ProtocolMappings {
                    protocol: *protocol,
                    blocks,
                    items,
                }),
            );
        }

        let first_custom_item = palette.items.values().copied().max().unwrap_or(0) + 1;
        let java_items = items
            .items
            .iter()
            .map(|e| (e.java_name.clone(), e.java_id))
            .collect();

        info!(
            block_states = java_blocks.len(),
            bedrock_states = java_blocks.palette.len(),
            items = items.items.len(),
            protocols = protocols.len(),
            "loaded registries"
        );

        Ok(Self {
            java_blocks,
            java_items,
            protocols,
            biomes: biomes.biomes,
            first_custom_item,
            custom: Mutex::new(CustomRegistry::default()),
        })
    }

    pub fn mappings(&self, protocol: u32) -> Result<Arc<ProtocolMappings>, WorldError> {
        self.protocols
            .get(&protocol)
            .cloned()
            .ok_or(WorldError::UnsupportedProtocol(protocol))
    }

    pub fn protocols(&self) -> impl Iterator<Item = u32> + '_ {
        self.protocols.keys().copied()
    }

    /// Number of vanilla Java block states; custom states start here.
    pub fn java_block_count(&self) -> u32 {
        self.java_blocks.len()
    }

    pub fn java_block_id(&self, name: &str) -> Option<u32> {
        self.java_blocks.by_name.get(name).copied()
    }

    pub fn java_block_name(&self, java_id: u32) -> Option<&str> {
        self.java_blocks
            .names
            .get(java_id as usize)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }

    pub fn java_item_id(&self, name: &str) -> Option<u32> {
        self.java_items.get(name).copied()
    }

    /// Canonical Bedrock description of a vanilla Java state.
    pub fn canonical_block(&self, java_id: u32) -> Option<&BlockDescriptor> {
        self.java_blocks.canonical(java_id)
    }

    /// Vanilla lookups go through the immutable table; custom states take
    /// the registration lock. Anything unknown resolves to air.
    pub fn resolve_block(&self, mappings: &ProtocolMappings, java_id: u32) -> u32 {
        if java_id < self.java_blocks.len() {
            return mappings.blocks.resolve(java_id);
        }
        let custom = self.lock_custom();
        custom
            .blocks
            .iter()
            .find(|b| b.java_id == java_id)
            .and_then(|b| {
                b.runtime_ids
                    .iter()
                    .find(|(protocol, _)| *protocol == mappings.protocol)
                    .map(|(_, id)| *id)
            })
            .unwrap_or_else(|| mappings.blocks.air_id())
    }

    pub fn bedrock_biome(&self, java_name: &str) -> u32 {
        match self.biomes.get(java_name) {
            Some(id) => *id,
            None => {
                debug!(biome = java_name, "unknown biome");
                DEFAULT_BIOME
            }
        }
    }

    /// Bedrock biome ids indexed by the Java registry order sent during
    /// configuration.
    pub fn biome_table(&self, java_entries: &[String]) -> Vec<u32> {
        java_entries.iter().map(|name| self.bedrock_biome(name)).collect()
    }

    /// Registers a custom item, returning its Bedrock network id. The same
    /// definition registered again returns the same id for every protocol.
    pub fn register_custom_item(&self, definition: CustomItemDefinition) -> Result<i32, WorldError> {
        if self.java_item_id(definition.java_item()).is_none() {
            return Err(WorldError::InvalidCustom(format!(
                "{}: unknown java item {}",
                definition.identifier(),
                definition.java_item()
            )));
        }
        let mut custom = self.lock_custom();
        if let Some(existing) = custom
            .items
            .iter()
            .find(|i| i.definition.identifier == definition.identifier)
        {
            if existing.definition == definition {
                return Ok(existing.network_id);
            }
            return Err(WorldError::CustomConflict(definition.identifier));
        }
        if custom.items.iter().any(|i| {
            i.definition.java_item == definition.java_item
                && i.definition.custom_model_data == definition.custom_model_data
        }) {
            return Err(WorldError::CustomConflict(definition.identifier));
        }
        let network_id = self.first_custom_item + custom.items.len() as i32;
        info!(identifier = definition.identifier(), network_id, "registered custom item");
        custom.items.push(CustomItem {
            definition,
            network_id,
        });
        Ok(network_id)
    }

    /// Network id of the custom item replacing `java_item` with the given
    /// custom model data.
    pub fn custom_item_for(&self, java_item: &str, custom_model_data: i32) -> Option<i32> {
        self.lock_custom()
            .items
            .iter()
            .find(|i| {
                i.definition.java_item == java_item
                    && i.definition.custom_model_data == custom_model_data
            })
            .map(|i| i.network_id)
    }

    /// Registers a custom block, returning its synthetic Java state id.
    pub fn register_custom_block(&self, definition: CustomBlockDefinition) -> Result<u32, WorldError> {
        let mut custom = self.lock_custom();
        if let Some(existing) = custom
            .blocks
            .iter()
            .find(|b| b.definition.identifier == definition.identifier)
        {
            if existing.definition == definition {
                return Ok(existing.java_id);
            }
            return Err(WorldError::CustomConflict(definition.identifier));
        }
        let descriptor = definition.descriptor();
        let mut runtime_ids = Vec::with_capacity(self.protocols.len());
        for protocol in self.protocols.keys() {
            runtime_ids.push((*protocol, runtime_id_for(&descriptor, *protocol)?));
        }
        let java_id = self.java_blocks.len() + custom.blocks.len() as u32;
        info!(identifier = definition.identifier(), java_id, "registered custom block");
        custom.blocks.push(CustomBlock {
            definition,
            java_id,
            runtime_ids,
        });
        Ok(java_id)
    }

    fn lock_custom(&self) -> MutexGuard<'_, CustomRegistry> {
        // a panic while holding the lock cannot leave a half-written entry
        self.custom.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Runtime id a client on `protocol` uses for this canonical block.
pub fn runtime_id_for(block: &BlockDescriptor, protocol: u32) -> Result<u32, WorldError> {
    Ok(downgrade_block(block, protocol)?.network_hash())
}

fn build_blocks(java: &JavaBlocks, protocol: u32) -> Result<BlockMappings, WorldError> {
    let air = runtime_id_for(&BlockDescriptor::air(), protocol)?;
    let water = runtime_id_for(
        &BlockDescriptor::new("minecraft:water").with_state("liquid_depth", 0),
        protocol,
    )?;
    // each distinct descriptor is converted and hashed once
    let mut palette = Vec::with_capacity(java.palette.len());
    for block in &java.palette {
        palette.push(runtime_id_for(block, protocol)?);
    }
    let runtime_ids = java
        .canonical
        .iter()
        .map(|index| palette[*index as usize])
        .collect();
    Ok(BlockMappings {
        protocol,
        runtime_ids,
        waterlogged: java.waterlogged.clone(),
        air,
        water,
    })
}

fn build_items(
    entries: &[ItemEntry],
    palette: &HashMap<String, i32>,
    protocol: u32,
) -> Result<ItemMappings, WorldError> {
    let placeholder_id = palette.get(UNKNOWN_ITEM).copied().unwrap_or_default();
    let placeholder = ItemMapping {
        java_id: 0,
        java_identifier: String::new(),
        bedrock_identifier: UNKNOWN_ITEM.to_owned(),
        bedrock_data: 0,
        network_id: placeholder_id,
        stack_size: 64,
        max_damage: 0,
        tool_type: None,
        tool_tier: None,
    };
    let len = entries.iter().map(|e| e.java_id as usize + 1).max().unwrap_or(0);
    let mut by_java: Vec<Option<ItemMapping>> = vec![None; len];
    let mut by_bedrock = HashMap::new();
    for entry in entries {
        let item = downgrade_item(&ItemDescriptor::new(entry.bedrock.clone(), entry.data), protocol)?;
        let (identifier, data, network_id) = match palette.get(&item.identifier) {
            Some(id) => (item.identifier, item.data, *id),
            None => {
                debug!(item = %entry.java_name, protocol, "no bedrock item, using placeholder");
                (UNKNOWN_ITEM.to_owned(), 0, placeholder_id)
            }
        };
        by_bedrock.entry((network_id, data)).or_insert(entry.java_id);
        by_java[entry.java_id as usize] = Some(ItemMapping {
            java_id: entry.java_id,
            java_identifier: entry.java_name.clone(),
            bedrock_identifier: identifier,
            bedrock_data: data,
            network_id,
            stack_size: entry.stack_size,
            max_damage: entry.max_damage,
            tool_type: entry.tool_type.clone(),
            tool_tier: entry.tool_tier.clone(),
        });
    }
    Ok(ItemMappings {
        protocol,
        by_java,
        by_bedrock,
        placeholder,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn registries() -> Registries {
        Registries::load().unwrap()
    }

    #[test]
    fn embedded_tables_load_for_every_protocol() {
        let registries = registries();
        let protocols: Vec<u32> = registries.protocols().collect();
        assert_eq!(protocols.len(), SUPPORTED_PROTOCOLS.len());
        for protocol in protocols {
            let mappings = registries.mappings(protocol).unwrap();
            assert_eq!(mappings.blocks.len(), registries.java_block_count() as usize);
            assert_eq!(mappings.blocks.resolve(0), mappings.blocks.air_id());
        }
    }

    #[test]
    fn unknown_protocol_is_an_error() {
        assert!(matches!(
            registries().mappings(500),
            Err(WorldError::UnsupportedProtocol(500))
        ));
    }

    #[test]
    fn unknown_states_fall_back_to_air() {
        let registries = registries();
        let mappings = registries.mappings(729).unwrap();
        let air = mappings.blocks.air_id();
        // past the table, past every custom id
        assert_eq!(mappings.blocks.resolve(registries.java_block_count()), air);
        assert_eq!(mappings.blocks.resolve(u32::MAX), air);
        assert_eq!(registries.resolve_block(&mappings, u32::MAX), air);
    }

    #[test]
    fn unknown_items_fall_back_to_placeholder() {
        let registries = registries();
        let mappings = registries.mappings(729).unwrap();
        let missing = mappings.items.resolve(999_999);
        assert_eq!(missing.bedrock_identifier, UNKNOWN_ITEM);
        assert_eq!(missing.network_id, 248);
    }

    #[test]
    fn runtime_ids_are_descriptor_hashes() {
        let registries = registries();
        let mappings = registries.mappings(729).unwrap();
        let stone = registries.java_block_id("minecraft:stone").unwrap();
        assert_eq!(
            mappings.blocks.resolve(stone),
            BlockDescriptor::new("minecraft:stone").network_hash()
        );
    }

    #[test]
    fn older_protocols_see_converted_blocks() {
        let registries = registries();
        let coarse = registries.java_block_id("minecraft:coarse_dirt").unwrap();
        let new = registries.mappings(729).unwrap().blocks.resolve(coarse);
        let old = registries.mappings(685).unwrap().blocks.resolve(coarse);
        assert_ne!(new, old);
        assert_eq!(
            old,
            BlockDescriptor::new("minecraft:dirt")
                .with_state("dirt_type", "coarse")
                .network_hash()
        );
    }

    #[test]
    fn older_protocols_see_converted_items() {
        let registries = registries();
        let mace = registries.java_item_id("minecraft:mace").unwrap();
        let new = registries.mappings(729).unwrap();
        let old = registries.mappings(662).unwrap();
        assert_eq!(new.items.resolve(mace).bedrock_identifier, "minecraft:mace");
        assert_eq!(old.items.resolve(mace).bedrock_identifier, "minecraft:netherite_axe");
        assert_eq!(old.items.resolve(mace).max_damage, 500);
    }

    #[test]
    fn waterlogged_flags() {
        let registries = registries();
        let mappings = registries.mappings(729).unwrap();
        let wet = registries
            .java_block_id("minecraft:oak_slab[type=bottom,waterlogged=true]")
            .unwrap();
        let dry = registries
            .java_block_id("minecraft:oak_slab[type=bottom,waterlogged=false]")
            .unwrap();
        assert!(mappings.blocks.is_waterlogged(wet));
        assert!(!mappings.blocks.is_waterlogged(dry));
        assert_eq!(mappings.blocks.resolve(wet), mappings.blocks.resolve(dry));
    }

    #[test]
    fn biome_fallback() {
        let registries = registries();
        assert_eq!(registries.bedrock_biome("minecraft:cherry_grove"), 192);
        assert_eq!(registries.bedrock_biome("mod:glowing_marsh"), DEFAULT_BIOME);
        let table = registries.biome_table(&["minecraft:desert".into(), "minecraft:ocean".into()]);
        assert_eq!(table, vec![2, 0]);
    }

    #[test]
    fn state_ids_follow_vanilla_order() {
        let registries = registries();
        assert_eq!(registries.java_block_count(), 26_684);
        let expect = [
            (8, "minecraft:grass_block[snowy=true]"),
            (263, "minecraft:oak_leaves[distance=7,persistent=false,waterlogged=true]"),
            (2017, "minecraft:piston[extended=false,facing=north]"),
            (2954, "minecraft:chest[facing=north,type=single,waterlogged=true]"),
            (4277, "minecraft:crafting_table"),
            (26_683, "minecraft:heavy_core[waterlogged=false]"),
        ];
        for (id, name) in expect {
            assert_eq!(registries.java_block_name(id), Some(name));
            assert_eq!(registries.java_block_id(name), Some(id));
        }
    }

    #[test]
    fn sampled_states_map_to_real_blocks() {
        let registries = registries();
        let mappings = registries.mappings(729).unwrap();
        let air = mappings.blocks.air_id();
        let count = registries.java_block_count();
        let mut sampled = 0;
        for id in (0..count).step_by(97).chain([count - 1]) {
            let name = registries.java_block_name(id).unwrap();
            let block = registries.canonical_block(id).unwrap();
            if name.ends_with("air") {
                continue;
            }
            sampled += 1;
            assert_ne!(mappings.blocks.resolve(id), air, "{name} resolves to air");
            assert_ne!(block.name, "minecraft:air", "{name}");
        }
        assert!(sampled > 250);
    }

    #[test]
    fn properties_reach_bedrock_states() {
        let registries = registries();
        let canonical = |name: &str| {
            let id = registries.java_block_id(name).unwrap();
            registries.canonical_block(id).unwrap().clone()
        };
        assert_eq!(
            canonical("minecraft:oak_stairs[facing=west,half=top,shape=straight,waterlogged=false]"),
            BlockDescriptor::new("minecraft:oak_stairs")
                .with_state("upside_down_bit", true)
                .with_state("weirdo_direction", 1)
        );
        assert_eq!(
            canonical("minecraft:water[level=3]"),
            BlockDescriptor::new("minecraft:flowing_water").with_state("liquid_depth", 3)
        );
        assert_eq!(
            canonical("minecraft:furnace[facing=east,lit=true]"),
            BlockDescriptor::new("minecraft:lit_furnace")
                .with_state("minecraft:cardinal_direction", "east")
        );
        assert_eq!(canonical("minecraft:cave_air").name, "minecraft:air");
    }

    #[test]
    fn water_filled_blocks_are_waterlogged() {
        let registries = registries();
        let mappings = registries.mappings(729).unwrap();
        let kelp = registries.java_block_id("minecraft:kelp[age=0]").unwrap();
        let stone = registries.java_block_id("minecraft:stone").unwrap();
        assert!(mappings.blocks.is_waterlogged(kelp));
        assert!(!mappings.blocks.is_waterlogged(stone));
    }

    #[test]
    fn malformed_block_tables_are_rejected() {
        let tables = [
            // listed twice
            r#"{"palette":[{"name":"minecraft:air"}],"blocks":[
                {"name":"minecraft:air","bedrock":0},
                {"name":"minecraft:air","bedrock":0}]}"#,
            // two states, one bedrock entry
            r#"{"palette":[{"name":"minecraft:air"}],"blocks":[
                {"name":"minecraft:air","bedrock":0},
                {"name":"minecraft:tnt","properties":[["unstable",["true","false"]]],"bedrock":[0]}]}"#,
            // palette index out of range
            r#"{"palette":[{"name":"minecraft:air"}],"blocks":[
                {"name":"minecraft:air","bedrock":3}]}"#,
            // air is not first
            r#"{"palette":[{"name":"minecraft:stone"}],"blocks":[
                {"name":"minecraft:stone","bedrock":0}]}"#,
        ];
        for blocks in tables {
            let err = Registries::from_json(blocks, ITEMS_JSON, ITEM_PALETTE_JSON, BIOMES_JSON).unwrap_err();
            assert!(matches!(err, WorldError::InvalidMapping(_)), "{blocks}");
        }
    }

    #[test]
    fn state_names_roll_the_last_property_first() {
        let properties = vec![
            ("facing".to_owned(), vec!["north".to_owned(), "south".to_owned()]),
            ("lit".to_owned(), vec!["true".to_owned(), "false".to_owned()]),
        ];
        let mut digits = vec![0, 0];
        let mut names = Vec::new();
        for _ in 0..4 {
            names.push(state_name("minecraft:furnace", &properties, &digits));
            advance(&mut digits, &properties);
        }
        assert_eq!(
            names,
            [
                "minecraft:furnace[facing=north,lit=true]",
                "minecraft:furnace[facing=north,lit=false]",
                "minecraft:furnace[facing=south,lit=true]",
                "minecraft:furnace[facing=south,lit=false]",
            ]
        );
        assert_eq!(digits, [0, 0]);
    }

    #[test]
    fn custom_definitions_are_validated() {
        assert!(CustomItemDefinition::new("ruby", "Ruby", "minecraft:emerald", 1, 64).is_err());
        assert!(CustomItemDefinition::new("minecraft:ruby", "Ruby", "minecraft:emerald", 1, 64).is_err());
        assert!(CustomItemDefinition::new("gems:Ruby", "Ruby", "minecraft:emerald", 1, 64).is_err());
        assert!(CustomItemDefinition::new("gems:ruby", "Ruby", "minecraft:emerald", 1, 0).is_err());
        assert!(CustomItemDefinition::new("gems:ruby", "Ruby", "minecraft:emerald", 1, 64).is_ok());
    }

    #[test]
    fn custom_item_registration_is_idempotent() {
        let registries = registries();
        let ruby = CustomItemDefinition::new("gems:ruby", "Ruby", "minecraft:emerald", 1, 64).unwrap();
        let sapphire = CustomItemDefinition::new("gems:sapphire", "Sapphire", "minecraft:emerald", 2, 64).unwrap();
        let first = registries.register_custom_item(ruby.clone()).unwrap();
        let second = registries.register_custom_item(sapphire).unwrap();
        assert_eq!(second, first + 1);
        assert_eq!(registries.register_custom_item(ruby).unwrap(), first);
        assert_eq!(registries.custom_item_for("minecraft:emerald", 2), Some(second));

        // above every vanilla network id
        let vanilla_max = registries
            .mappings(729)
            .unwrap()
            .items
            .by_java
            .iter()
            .flatten()
            .map(|m| m.network_id)
            .max()
            .unwrap();
        assert!(first > vanilla_max);
    }

    #[test]
    fn custom_item_conflicts() {
        let registries = registries();
        let ruby = CustomItemDefinition::new("gems:ruby", "Ruby", "minecraft:emerald", 1, 64).unwrap();
        let renamed = CustomItemDefinition::new("gems:ruby", "Red Gem", "minecraft:emerald", 1, 64).unwrap();
        let same_model = CustomItemDefinition::new("gems:garnet", "Garnet", "minecraft:emerald", 1, 64).unwrap();
        registries.register_custom_item(ruby).unwrap();
        assert!(matches!(
            registries.register_custom_item(renamed),
            Err(WorldError::CustomConflict(_))
        ));
        assert!(matches!(
            registries.register_custom_item(same_model),
            Err(WorldError::CustomConflict(_))
        ));
        let unknown = CustomItemDefinition::new("gems:opal", "Opal", "minecraft:nope", 1, 64).unwrap();
        assert!(matches!(
            registries.register_custom_item(unknown),
            Err(WorldError::InvalidCustom(_))
        ));
    }

    #[test]
    fn custom_blocks_resolve_per_protocol() {
        let registries = registries();
        let mut states = BTreeMap::new();
        states.insert("gems:lit".to_owned(), StateValue::Bool(true));
        let lamp = CustomBlockDefinition::new("gems:lamp", states).unwrap();
        let java_id = registries.register_custom_block(lamp.clone()).unwrap();
        assert_eq!(java_id, registries.java_block_count());
        assert_eq!(registries.register_custom_block(lamp.clone()).unwrap(), java_id);

        for protocol in registries.protocols().collect::<Vec<_>>() {
            let mappings = registries.mappings(protocol).unwrap();
            assert_eq!(
                registries.resolve_block(&mappings, java_id),
                lamp.descriptor().network_hash()
            );
        }

        let other = CustomBlockDefinition::new("gems:lamp", BTreeMap::new()).unwrap();
        assert!(matches!(
            registries.register_custom_block(other),
            Err(WorldError::CustomConflict(_))
        ));
    }

    #[test]
    fn concurrent_registrations_get_distinct_ids() {
        let registries = Arc::new(registries());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registries = Arc::clone(&registries);
                thread::spawn(move || {
                    let def = CustomItemDefinition::new(
                        format!("gems:gem_{i}"),
                        "Gem",
                        "minecraft:emerald",
                        100 + i,
                        64,
                    )
                    .unwrap();
                    registries.register_custom_item(def).unwrap()
                })
            })
            .collect();
        let mut ids: Vec<i32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 8);
        assert_eq!(ids[7] - ids[0], 7);
    }
}
