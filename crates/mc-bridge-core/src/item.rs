//! Java item stacks to Bedrock item stacks.

use mc_bridge_nbt::{NbtCompound, NbtRoot, NbtTag};
use mc_bridge_proto::bedrock::ItemStack;
use mc_bridge_proto::java::slot::{ItemComponent, JavaItem};
use mc_bridge_proto::java::text::flatten;
use mc_bridge_world::{ProtocolMappings, Registries};

/// Empty slots become air. Enchantments are not carried over.
pub fn to_bedrock(registries: &Registries, mappings: &ProtocolMappings, item: Option<&JavaItem>) -> ItemStack {
    let Some(item) = item.filter(|i| i.count > 0) else {
        return ItemStack::default();
    };
    let mapping = mappings.items.resolve(item.item_id.max(0) as u32);
    let network_id = custom_model_data(item)
        .and_then(|cmd| registries.custom_item_for(&mapping.java_identifier, cmd))
        .unwrap_or(mapping.network_id);

    let mut tag = NbtCompound::new();
    if mapping.is_damageable() {
        if let Some(damage) = item.damage() {
            tag.insert("Damage".into(), NbtTag::Int(damage));
        }
    }
    if let Some(name) = item.custom_name() {
        let mut display = NbtCompound::new();
        display.insert("Name".into(), NbtTag::String(flatten(name)));
        tag.insert("display".into(), NbtTag::Compound(display));
    }

    ItemStack {
        network_id,
        count: item.count.clamp(0, u16::MAX as i32) as u16,
        damage: mapping.bedrock_data.max(0) as u32,
        nbt: (!tag.is_empty()).then(|| NbtRoot::new("", tag)),
        ..ItemStack::default()
    }
}

fn custom_model_data(item: &JavaItem) -> Option<i32> {
    item.components.iter().find_map(|c| match c {
        ItemComponent::CustomModelData(v) => Some(*v),
        _ => None,
    })
}

/// Largest stack the item may form, from its component or the mapping.
pub fn stack_limit(mappings: &ProtocolMappings, item: &JavaItem) -> i32 {
    item.components
        .iter()
        .find_map(|c| match c {
            ItemComponent::MaxStackSize(v) => Some(*v),
            _ => None,
        })
        .unwrap_or_else(|| mappings.items.resolve(item.item_id.max(0) as u32).stack_size as i32)
        .max(1)
}

/// Same item and components, so the stacks may merge.
pub fn same_item(a: &JavaItem, b: &JavaItem) -> bool {
    a.item_id == b.item_id && a.components == b.components && a.removed == b.removed
}
