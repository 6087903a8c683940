//! Java item slots with data components.

use bytes::{Buf, BufMut};
use mc_bridge_nbt::{read_nbt_java, write_nbt_java, NbtTag};

use crate::codec::read_bool;
use crate::error::ProtoError;
use crate::java::{read_component, read_count};
use crate::varint::{get_java_varint, put_java_varint};

#[derive(Debug, Clone, PartialEq)]
pub enum ItemComponent {
    CustomData(NbtTag),
    MaxStackSize(i32),
    MaxDamage(i32),
    Damage(i32),
    Unbreakable { show_in_tooltip: bool },
    CustomName(NbtTag),
    ItemName(NbtTag),
    Lore(Vec<NbtTag>),
    Rarity(i32),
    Enchantments { levels: Vec<(i32, i32)>, show_in_tooltip: bool },
    CustomModelData(i32),
    HideAdditionalTooltip,
    HideTooltip,
    RepairCost(i32),
    CreativeSlotLock,
    EnchantmentGlintOverride(bool),
    IntangibleProjectile(Option<NbtTag>),
}

impl ItemComponent {
    pub fn type_id(&self) -> i32 {
        match self {
            Self::CustomData(_) => 0,
            Self::MaxStackSize(_) => 1,
            Self::MaxDamage(_) => 2,
            Self::Damage(_) => 3,
            Self::Unbreakable { .. } => 4,
            Self::CustomName(_) => 5,
            Self::ItemName(_) => 6,
            Self::Lore(_) => 7,
            Self::Rarity(_) => 8,
            Self::Enchantments { .. } => 9,
            Self::CustomModelData(_) => 13,
            Self::HideAdditionalTooltip => 14,
            Self::HideTooltip => 15,
            Self::RepairCost(_) => 16,
            Self::CreativeSlotLock => 17,
            Self::EnchantmentGlintOverride(_) => 18,
            Self::IntangibleProjectile(_) => 19,
        }
    }

    fn read(buf: &mut impl Buf, type_id: i32) -> Result<Self, ProtoError> {
        Ok(match type_id {
            0 => Self::CustomData(read_component(buf)?),
            1 => Self::MaxStackSize(get_java_varint(buf)?),
            2 => Self::MaxDamage(get_java_varint(buf)?),
            3 => Self::Damage(get_java_varint(buf)?),
            4 => Self::Unbreakable {
                show_in_tooltip: read_bool(buf)?,
            },
            5 => Self::CustomName(read_component(buf)?),
            6 => Self::ItemName(read_component(buf)?),
            7 => {
                let count = read_count(buf, 256)?;
                let mut lines = Vec::with_capacity(count);
                for _ in 0..count {
                    lines.push(read_component(buf)?);
                }
                Self::Lore(lines)
            }
            8 => Self::Rarity(get_java_varint(buf)?),
            9 => {
                let count = read_count(buf, 256)?;
                let mut levels = Vec::with_capacity(count);
                for _ in 0..count {
                    levels.push((get_java_varint(buf)?, get_java_varint(buf)?));
                }
                Self::Enchantments {
                    levels,
                    show_in_tooltip: read_bool(buf)?,
                }
            }
            13 => Self::CustomModelData(get_java_varint(buf)?),
            14 => Self::HideAdditionalTooltip,
            15 => Self::HideTooltip,
            16 => Self::RepairCost(get_java_varint(buf)?),
            17 => Self::CreativeSlotLock,
            18 => Self::EnchantmentGlintOverride(read_bool(buf)?),
            19 => Self::IntangibleProjectile(read_nbt_java(buf)?),
            other => return Err(ProtoError::Unsupported(format!("item component {other}"))),
        })
    }

    fn write(&self, buf: &mut impl BufMut) {
        put_java_varint(buf, self.type_id());
        match self {
            Self::CustomData(tag) | Self::CustomName(tag) | Self::ItemName(tag) => {
                write_nbt_java(buf, Some(tag))
            }
            Self::MaxStackSize(v)
            | Self::MaxDamage(v)
            | Self::Damage(v)
            | Self::Rarity(v)
            | Self::CustomModelData(v)
            | Self::RepairCost(v) => put_java_varint(buf, *v),
            Self::Unbreakable { show_in_tooltip } => buf.put_u8(*show_in_tooltip as u8),
            Self::Lore(lines) => {
                put_java_varint(buf, lines.len() as i32);
                for line in lines {
                    write_nbt_java(buf, Some(line));
                }
            }
            Self::Enchantments {
                levels,
                show_in_tooltip,
            } => {
                put_java_varint(buf, levels.len() as i32);
                for (id, level) in levels {
                    put_java_varint(buf, *id);
                    put_java_varint(buf, *level);
                }
                buf.put_u8(*show_in_tooltip as u8);
            }
            Self::HideAdditionalTooltip | Self::HideTooltip | Self::CreativeSlotLock => {}
            Self::EnchantmentGlintOverride(v) => buf.put_u8(*v as u8),
            Self::IntangibleProjectile(tag) => write_nbt_java(buf, tag.as_ref()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct JavaItem {
    pub item_id: i32,
    pub count: i32,
    pub components: Vec<ItemComponent>,
    /// Prototype components removed from this stack.
    pub removed: Vec<i32>,
}

impl JavaItem {
    pub fn new(item_id: i32, count: i32) -> Self {
        Self {
            item_id,
            count,
            ..Default::default()
        }
    }

    pub fn damage(&self) -> Option<i32> {
        self.components.iter().find_map(|c| match c {
            ItemComponent::Damage(d) => Some(*d),
            _ => None,
        })
    }

    pub fn custom_name(&self) -> Option<&NbtTag> {
        self.components.iter().find_map(|c| match c {
            ItemComponent::CustomName(tag) => Some(tag),
            _ => None,
        })
    }

    pub fn enchantments(&self) -> &[(i32, i32)] {
        self.components
            .iter()
            .find_map(|c| match c {
                ItemComponent::Enchantments { levels, .. } => Some(levels.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }
}

/// `None` is an empty slot.
pub fn read_slot(buf: &mut impl Buf) -> Result<Option<JavaItem>, ProtoError> {
    let count = get_java_varint(buf)?;
    if count <= 0 {
        return Ok(None);
    }
    let item_id = get_java_varint(buf)?;
    let added = read_count(buf, 256)?;
    let removed = read_count(buf, 256)?;
    let mut item = JavaItem::new(item_id, count);
    for _ in 0..added {
        let type_id = get_java_varint(buf)?;
        item.components.push(ItemComponent::read(buf, type_id)?);
    }
    for _ in 0..removed {
        item.removed.push(get_java_varint(buf)?);
    }
    Ok(Some(item))
}

pub fn write_slot(buf: &mut impl BufMut, item: Option<&JavaItem>) {
    let Some(item) = item.filter(|i| i.count > 0) else {
        put_java_varint(buf, 0);
        return;
    };
    put_java_varint(buf, item.count);
    put_java_varint(buf, item.item_id);
    put_java_varint(buf, item.components.len() as i32);
    put_java_varint(buf, item.removed.len() as i32);
    for component in &item.components {
        component.write(buf);
    }
    for removed in &item.removed {
        put_java_varint(buf, *removed);
    }
}
