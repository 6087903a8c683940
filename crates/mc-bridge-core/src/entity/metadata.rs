//! Java metadata indices to Bedrock entity data.
//!
//! A Java index is resolved against the ordered segments of the entity's
//! layout: each segment owns a fixed run of indices, so the same local index
//! means the same field for every type that carries the segment.

use mc_bridge_proto::bedrock::MetadataValue;
use mc_bridge_proto::java::metadata::MetaValue;
use mc_bridge_proto::java::text::flatten;
use mc_bridge_proto::types::Uuid;
use tracing::debug;

use crate::entity::EntityRecord;

/// Bedrock entity data keys.
pub mod key {
    pub const FLAGS: u32 = 0;
    pub const HEALTH: u32 = 1;
    pub const VARIANT: u32 = 2;
    pub const COLOR: u32 = 3;
    pub const NAME: u32 = 4;
    pub const OWNER_EID: u32 = 5;
    pub const AIR_SUPPLY: u32 = 7;
    pub const SCALE: u32 = 38;
    pub const MARK_VARIANT: u32 = 43;
    pub const CONTAINER_STRENGTH_MODIFIER: u32 = 46;
    pub const NAMETAG_ALWAYS_SHOW: u32 = 81;
    pub const FLAGS_2: u32 = 92;
}

/// Bedrock entity flag bit positions. Bits 64 and up travel in `FLAGS_2`.
pub mod flag {
    pub const ON_FIRE: u32 = 0;
    pub const SNEAKING: u32 = 1;
    pub const RIDING: u32 = 2;
    pub const SPRINTING: u32 = 3;
    pub const USING_ITEM: u32 = 4;
    pub const INVISIBLE: u32 = 5;
    pub const SADDLED: u32 = 8;
    pub const BABY: u32 = 11;
    pub const CAN_SHOW_NAME: u32 = 14;
    pub const NO_AI: u32 = 16;
    pub const SILENT: u32 = 17;
    pub const RESTING: u32 = 23;
    pub const SITTING: u32 = 24;
    pub const ANGRY: u32 = 25;
    pub const INTERESTED: u32 = 26;
    pub const TAMED: u32 = 28;
    pub const SHEARED: u32 = 31;
    pub const GLIDING: u32 = 32;
    pub const CHESTED: u32 = 36;
    pub const STANDING: u32 = 39;
    pub const HAS_GRAVITY: u32 = 49;
    pub const SWIMMING: u32 = 57;
    pub const SLEEPING: u32 = 75;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Base,
    Living,
    Mob,
    Ageable,
    AbstractHorse,
    HorseVariant,
    ChestedHorse,
    Llama,
    Tameable,
    Wolf,
    Cat,
    Parrot,
    Sheep,
    Pig,
    Player,
    Zombie,
}

impl Segment {
    pub fn len(self) -> u8 {
        match self {
            Self::Base => 8,
            Self::Living => 7,
            Self::Mob
            | Self::Ageable
            | Self::AbstractHorse
            | Self::HorseVariant
            | Self::ChestedHorse
            | Self::Parrot
            | Self::Sheep => 1,
            Self::Tameable | Self::Pig => 2,
            Self::Llama | Self::Zombie => 3,
            Self::Wolf | Self::Cat => 4,
            Self::Player => 6,
        }
    }
}

/// Finds which segment of `layout` owns a Java index.
pub fn resolve(layout: &[Segment], index: u8) -> Option<(Segment, u8)> {
    let mut start = 0u8;
    for segment in layout {
        let end = start + segment.len();
        if index < end {
            return Some((*segment, index - start));
        }
        start = end;
    }
    None
}

const POSE_SLEEPING: i32 = 2;
const POSE_SWIMMING: i32 = 3;

const ADULT_SCALE: f32 = 1.0;
const BABY_SCALE: f32 = 0.55;

/// Applies Java metadata to the record. `owner_runtime_id` maps a tameable
/// owner's uuid to the Bedrock runtime id of that entity, if it is known.
pub fn apply(
    record: &mut EntityRecord,
    entries: &[(u8, MetaValue)],
    owner_runtime_id: &dyn Fn(Uuid) -> Option<u64>,
) {
    for (index, value) in entries {
        let Some((segment, local)) = resolve(record.definition.layout, *index) else {
            debug!(
                entity = record.java_id,
                index,
                identifier = record.definition.identifier,
                "metadata index outside the entity layout"
            );
            continue;
        };
        if apply_one(record, segment, local, value, owner_runtime_id).is_none() {
            debug!(
                entity = record.java_id,
                index,
                ?segment,
                "metadata value of unexpected type"
            );
        }
    }
}

fn bit(v: i32, mask: i32) -> bool {
    v & mask != 0
}

/// `None` when the value has the wrong type for the field.
fn apply_one(
    record: &mut EntityRecord,
    segment: Segment,
    local: u8,
    value: &MetaValue,
    owner_runtime_id: &dyn Fn(Uuid) -> Option<u64>,
) -> Option<()> {
    use Segment::*;
    match (segment, local) {
        (Base, 0) => {
            let v = value.as_int()?;
            record.set_flag(flag::ON_FIRE, bit(v, 0x01));
            record.set_flag(flag::SNEAKING, bit(v, 0x02));
            record.set_flag(flag::SPRINTING, bit(v, 0x08));
            record.set_flag(flag::INVISIBLE, bit(v, 0x20));
            record.set_flag(flag::GLIDING, bit(v, 0x80));
        }
        (Base, 1) => {
            let air = value.as_int()?;
            record.set_data(key::AIR_SUPPLY, MetadataValue::Short(air.clamp(0, i16::MAX as i32) as i16));
        }
        (Base, 2) => {
            let MetaValue::OptionalComponent(name) = value else {
                return None;
            };
            let name = name.as_ref().map(flatten).unwrap_or_default();
            record.set_data(key::NAME, MetadataValue::String(name));
        }
        (Base, 3) => {
            let visible = value.as_bool()?;
            record.set_flag(flag::CAN_SHOW_NAME, visible);
            record.set_data(key::NAMETAG_ALWAYS_SHOW, MetadataValue::Byte(visible as i8));
        }
        (Base, 4) => record.set_flag(flag::SILENT, value.as_bool()?),
        (Base, 5) => record.set_flag(flag::HAS_GRAVITY, !value.as_bool()?),
        (Base, 6) => {
            let pose = value.as_int()?;
            record.set_flag(flag::SLEEPING, pose == POSE_SLEEPING);
            record.set_flag(flag::SWIMMING, pose == POSE_SWIMMING);
        }
        (Living, 0) => record.set_flag(flag::USING_ITEM, bit(value.as_int()?, 0x01)),
        (Living, 1) => {
            let health = value.as_float()?;
            record.set_data(key::HEALTH, MetadataValue::Int(health.ceil() as i32));
        }
        (Mob, 0) => record.set_flag(flag::NO_AI, bit(value.as_int()?, 0x01)),
        (Ageable, 0) | (Zombie, 0) => {
            let baby = value.as_bool()?;
            record.set_flag(flag::BABY, baby);
            let scale = if baby { BABY_SCALE } else { ADULT_SCALE };
            record.set_data(key::SCALE, MetadataValue::Float(scale));
        }
        (AbstractHorse, 0) => {
            let v = value.as_int()?;
            record.set_flag(flag::TAMED, bit(v, 0x02));
            record.set_flag(flag::SADDLED, bit(v, 0x04));
            record.set_flag(flag::STANDING, bit(v, 0x20));
        }
        (HorseVariant, 0) => {
            let v = value.as_int()?;
            set_variant(record, v & 0xFF, Some((v >> 8) & 0xFF));
        }
        (ChestedHorse, 0) => record.set_flag(flag::CHESTED, value.as_bool()?),
        (Llama, 0) => {
            let strength = value.as_int()?;
            record.set_data(key::CONTAINER_STRENGTH_MODIFIER, MetadataValue::Int(strength));
        }
        (Llama, 1) => {
            let color = value.as_int()?;
            if let Some(variant) = record.variant.as_mut() {
                variant.carpet = (color >= 0).then_some(color as u8);
            }
        }
        (Llama, 2) | (Parrot, 0) | (Wolf, 3) | (Cat, 0) => {
            set_variant(record, value.as_int()?, None);
        }
        (Tameable, 0) => {
            let v = value.as_int()?;
            record.set_flag(flag::SITTING, bit(v, 0x01));
            record.set_flag(flag::TAMED, bit(v, 0x04));
            if let Some(tameable) = record.tameable.as_mut() {
                tameable.sitting = bit(v, 0x01);
                tameable.tamed = bit(v, 0x04);
            }
        }
        (Tameable, 1) => {
            let MetaValue::OptionalUuid(owner) = value else {
                return None;
            };
            if let Some(tameable) = record.tameable.as_mut() {
                tameable.owner = *owner;
            }
            let eid = owner.and_then(owner_runtime_id).map_or(0, |id| id as i64);
            record.set_data(key::OWNER_EID, MetadataValue::Long(eid));
        }
        (Wolf, 0) => record.set_flag(flag::INTERESTED, value.as_bool()?),
        (Wolf, 1) | (Cat, 3) => {
            let color = value.as_int()?;
            record.set_data(key::COLOR, MetadataValue::Byte(color as i8));
        }
        (Wolf, 2) => record.set_flag(flag::ANGRY, value.as_int()? > 0),
        (Cat, 1) => record.set_flag(flag::RESTING, value.as_bool()?),
        (Sheep, 0) => {
            let v = value.as_int()?;
            record.set_data(key::COLOR, MetadataValue::Byte((v & 0x0F) as i8));
            record.set_flag(flag::SHEARED, bit(v, 0x10));
        }
        (Pig, 0) => record.set_flag(flag::SADDLED, value.as_bool()?),
        // the remaining fields have no Bedrock counterpart
        _ => {}
    }
    Some(())
}

fn set_variant(record: &mut EntityRecord, variant: i32, markings: Option<i32>) {
    if let Some(component) = record.variant.as_mut() {
        component.variant = variant;
        if let Some(markings) = markings {
            component.markings = markings;
        }
    }
    record.set_data(key::VARIANT, MetadataValue::Int(variant));
    if let Some(markings) = markings {
        record.set_data(key::MARK_VARIANT, MetadataValue::Int(markings));
    }
}
