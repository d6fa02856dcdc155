//! Entity metadata rewriting between revisions.
//!
//! Rules are looked up per `(type, index)` walking the entity hierarchy from
//! the concrete type to the root; an index no level claims has no legacy
//! counterpart and is dropped. Synthesized entries are placed right after
//! the entry they came from, so survivors keep their relative order.

use mc_rewind_proto::{MetaValue, MetadataEntry};

use crate::entity::EntityType;
use crate::protocol::ProtocolPair;

/// Legacy value encodings an entry can be converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Byte,
    Short,
    Int,
    Float,
    String,
    Item,
    Rotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Keep,
    Drop,
    Map(u8, Kind),
    /// Base flags byte without the bits 1.8 does not know.
    Flags,
    /// 1.9 baby boolean to 1.8 age byte.
    BabyAge,
    /// 1.9 carried block state to 1.8 block id + data.
    CarriedBlock,
}

/// Rewrite `entries` in place for the legacy side of `pair`.
pub fn transform(pair: ProtocolPair, entity: EntityType, entries: &mut Vec<MetadataEntry>) {
    let rule: fn(EntityType, u8) -> Option<Action> = match pair {
        ProtocolPair::V1_9To1_8 => newer_rule,
        ProtocolPair::V1_8To1_7 => legacy_rule,
    };

    let source = std::mem::take(entries);
    for entry in source {
        let action = entity
            .lineage()
            .find_map(|t| rule(t, entry.index))
            .unwrap_or(Action::Drop);
        apply(action, entry, entries);
    }
}

fn apply(action: Action, entry: MetadataEntry, out: &mut Vec<MetadataEntry>) {
    match action {
        Action::Keep => out.push(entry),
        Action::Drop => {}
        Action::Map(index, kind) => {
            if let Some(value) = convert(&entry.value, kind) {
                out.push(MetadataEntry::new(index, value));
            }
        }
        Action::Flags => {
            if let Some(flags) = entry.value.as_i32() {
                out.push(MetadataEntry::new(0, MetaValue::Byte((flags & 0x3F) as i8)));
            }
        }
        Action::BabyAge => {
            if let Some(baby) = entry.value.as_i32() {
                let age = if baby != 0 { -1 } else { 0 };
                out.push(MetadataEntry::new(12, MetaValue::Byte(age)));
            }
        }
        Action::CarriedBlock => {
            let state = entry.value.as_i32().unwrap_or(0);
            out.push(MetadataEntry::new(16, MetaValue::Short((state >> 4) as i16)));
            out.push(MetadataEntry::new(17, MetaValue::Byte((state & 0xF) as i8)));
        }
    }
}

fn convert(value: &MetaValue, kind: Kind) -> Option<MetaValue> {
    Some(match kind {
        Kind::Byte => MetaValue::Byte(value.as_i32()?.clamp(i8::MIN as i32, i8::MAX as i32) as i8),
        Kind::Short => {
            MetaValue::Short(value.as_i32()?.clamp(i16::MIN as i32, i16::MAX as i32) as i16)
        }
        Kind::Int => MetaValue::Int(value.as_i32()?),
        Kind::Float => match *value {
            MetaValue::Float(v) => MetaValue::Float(v),
            ref other => MetaValue::Float(other.as_i32()? as f32),
        },
        Kind::String => match value {
            MetaValue::String(s) | MetaValue::Chat(s) => MetaValue::String(s.clone()),
            _ => return None,
        },
        Kind::Item => match value {
            MetaValue::Item(item) => MetaValue::Item(item.clone()),
            _ => return None,
        },
        Kind::Rotation => match value {
            MetaValue::Rotation(r) => MetaValue::Rotation(*r),
            _ => return None,
        },
    })
}

/// 1.9 index layout to 1.8.
fn newer_rule(t: EntityType, index: u8) -> Option<Action> {
    use Action::*;
    use EntityType as E;
    use Kind::*;

    Some(match (t, index) {
        (E::Entity, 0) => Flags,
        (E::Entity, 1) => Map(1, Short),
        (E::Entity, 2) => Map(2, String),
        (E::Entity, 3) => Map(3, Byte),
        (E::Entity, 4) => Map(4, Byte),

        (E::LivingEntity, 5) => Drop,
        (E::LivingEntity, 6) => Map(6, Float),
        (E::LivingEntity, 7) => Map(7, Int),
        (E::LivingEntity, 8) => Map(8, Byte),
        (E::LivingEntity, 9) => Map(9, Byte),
        (E::Insentient, 10) => Map(15, Byte),
        (E::Ageable, 11) => BabyAge,

        (E::Player, 10) => Map(17, Float),
        (E::Player, 11) => Map(18, Int),
        (E::Player, 12) => Map(10, Byte),
        (E::ArmorStand, 10) => Map(10, Byte),
        (E::ArmorStand, 11..=16) => Map(index, Rotation),

        (E::Slime, 11) => Map(16, Byte),
        (E::Creeper, 11) => Map(16, Byte),
        (E::Creeper, 12) => Map(17, Byte),
        (E::Enderman, 11) => CarriedBlock,
        (E::Enderman, 12) => Map(18, Byte),
        (E::Skeleton, 11) => Map(13, Byte),
        (E::Zombie, 11) => Map(12, Byte),
        (E::Zombie, 12) => Map(13, Byte),
        (E::Zombie, 13) => Map(14, Byte),
        (E::Ghast, 11) | (E::Blaze, 11) | (E::Spider, 11) | (E::Bat, 11) => Map(16, Byte),
        (E::IronGolem, 11) => Map(16, Byte),
        (E::Witch, 11) => Map(21, Byte),
        (E::Guardian, 11) => Map(16, Int),
        (E::Guardian, 12) => Map(17, Int),
        (E::Wither, 11..=13) => Map(index + 6, Int),
        (E::Wither, 14) => Map(20, Int),

        (E::Tameable, 12) => Map(16, Byte),
        (E::Wolf, 14) => Map(18, Float),
        (E::Wolf, 15) => Map(19, Byte),
        (E::Wolf, 16) => Map(20, Byte),
        (E::Ocelot, 14) => Map(18, Byte),
        (E::Pig, 12) | (E::Sheep, 12) => Map(16, Byte),
        (E::Rabbit, 12) => Map(18, Byte),
        (E::Villager, 12) => Map(16, Int),
        (E::Horse, 12) => Map(16, Int),
        (E::Horse, 13) => Map(19, Byte),
        (E::Horse, 14) => Map(20, Int),
        (E::Horse, 16) => Map(22, Int),

        (E::Item, 5) => Map(10, Item),
        (E::ItemFrame, 5) | (E::Firework, 5) => Map(8, Item),
        (E::ItemFrame, 6) => Map(9, Byte),
        (E::WitherSkull, 5) => Map(10, Byte),
        (E::Arrow, 5) => Map(16, Byte),
        (E::Minecart, 5) => Map(17, Int),
        (E::Minecart, 6) => Map(18, Int),
        (E::Minecart, 7) => Map(19, Float),
        (E::Minecart, 8) => Map(20, Int),
        (E::Minecart, 9) => Map(21, Int),
        (E::Minecart, 10) => Map(22, Byte),
        (E::Boat, 5) => Map(17, Int),
        (E::Boat, 6) => Map(18, Int),
        (E::Boat, 7) => Map(19, Float),
        _ => return None,
    })
}

/// 1.8 index layout to 1.7.
fn legacy_rule(t: EntityType, index: u8) -> Option<Action> {
    use Action::*;
    use EntityType as E;
    use Kind::*;

    Some(match (t, index) {
        (E::Entity, 0) => Keep,
        (E::Entity, 1) => Map(1, Short),
        // only living entities carry names in 1.7
        (E::Entity, 2..=4) => Drop,
        (E::Entity, _) => Keep,

        (E::LivingEntity, 2) => Map(10, String),
        (E::LivingEntity, 3) => Map(11, Byte),
        (E::LivingEntity, 6..=9) => Keep,
        (E::LivingEntity, 10) | (E::LivingEntity, 15) => Drop,
        (E::ArmorStand, 11..=16) => Drop,
        (E::Ageable, 12) => Map(12, Int),
        _ => return None,
    })
}
