//! Entity metadata values shared by every supported revision.

use crate::field::Revision;
use crate::item_stack::ItemStack;
use crate::types::BlockPos;

/// A metadata value. The variant set is the union of what 1.7, 1.8 and 1.9
/// can carry; [`MetaValue::type_id`] tells which ones a revision accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Byte(i8),
    Short(i16),
    Int(i32),
    VarInt(i32),
    Float(f32),
    String(String),
    Chat(String),
    Item(Option<ItemStack>),
    Boolean(bool),
    Rotation([f32; 3]),
    BlockPosition(BlockPos),
    OptBlockPosition(Option<BlockPos>),
    Direction(i32),
    OptUuid(Option<u128>),
    /// Combined block state, `0` meaning none.
    OptBlockState(i32),
}

impl MetaValue {
    /// Wire type id of this value in `revision`, or `None` if that revision
    /// cannot express it.
    pub fn type_id(&self, revision: Revision) -> Option<u8> {
        match revision {
            Revision::V1_9 => Some(match self {
                Self::Byte(_) => 0,
                Self::VarInt(_) => 1,
                Self::Float(_) => 2,
                Self::String(_) => 3,
                Self::Chat(_) => 4,
                Self::Item(_) => 5,
                Self::Boolean(_) => 6,
                Self::Rotation(_) => 7,
                Self::BlockPosition(_) => 8,
                Self::OptBlockPosition(_) => 9,
                Self::Direction(_) => 10,
                Self::OptUuid(_) => 11,
                Self::OptBlockState(_) => 12,
                Self::Short(_) | Self::Int(_) => return None,
            }),
            Revision::V1_8 | Revision::V1_7 => Some(match self {
                Self::Byte(_) => 0,
                Self::Short(_) => 1,
                Self::Int(_) => 2,
                Self::Float(_) => 3,
                Self::String(_) => 4,
                Self::Item(_) => 5,
                Self::BlockPosition(_) => 6,
                Self::Rotation(_) => 7,
                _ => return None,
            }),
        }
    }

    /// Numeric payload widened to `i32`, for rules that only care about the value.
    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            Self::Byte(v) => Some(v as i32),
            Self::Short(v) => Some(v as i32),
            Self::Int(v) | Self::VarInt(v) | Self::Direction(v) | Self::OptBlockState(v) => Some(v),
            Self::Float(v) => Some(v as i32),
            Self::Boolean(v) => Some(v as i32),
            _ => None,
        }
    }
}

/// One `(index, value)` metadata entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataEntry {
    pub index: u8,
    pub value: MetaValue,
}

impl MetadataEntry {
    pub fn new(index: u8, value: MetaValue) -> Self {
        Self { index, value }
    }
}

/// Insert or overwrite by index. An existing entry keeps its position.
pub fn upsert(entries: &mut Vec<MetadataEntry>, entry: MetadataEntry) {
    match entries.iter_mut().find(|e| e.index == entry.index) {
        Some(slot) => *slot = entry,
        None => entries.push(entry),
    }
}

/// Merge `update` into `entries`: a newer entry replaces any older one with
/// the same index and moves to the end.
pub fn merge(entries: &mut Vec<MetadataEntry>, update: &[MetadataEntry]) {
    for entry in update {
        entries.retain(|e| e.index != entry.index);
        entries.push(entry.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_ids_per_revision() {
        assert_eq!(MetaValue::VarInt(1).type_id(Revision::V1_9), Some(1));
        assert_eq!(MetaValue::VarInt(1).type_id(Revision::V1_8), None);
        assert_eq!(MetaValue::Short(1).type_id(Revision::V1_8), Some(1));
        assert_eq!(MetaValue::Short(1).type_id(Revision::V1_9), None);
        assert_eq!(MetaValue::Boolean(true).type_id(Revision::V1_7), None);
        assert_eq!(
            MetaValue::Rotation([0.0; 3]).type_id(Revision::V1_9),
            Some(7)
        );
    }

    #[test]
    fn upsert_overwrites_in_place() {
        let mut entries = vec![
            MetadataEntry::new(0, MetaValue::Byte(0)),
            MetadataEntry::new(6, MetaValue::Float(20.0)),
        ];
        upsert(&mut entries, MetadataEntry::new(0, MetaValue::Byte(2)));
        upsert(&mut entries, MetadataEntry::new(2, MetaValue::String("x".into())));
        let order: Vec<u8> = entries.iter().map(|e| e.index).collect();
        assert_eq!(order, [0, 6, 2]);
        assert_eq!(entries[0].value, MetaValue::Byte(2));
    }

    #[test]
    fn merge_moves_newer_to_end() {
        let mut entries = vec![
            MetadataEntry::new(0, MetaValue::Byte(0)),
            MetadataEntry::new(6, MetaValue::Float(20.0)),
        ];
        merge(&mut entries, &[MetadataEntry::new(0, MetaValue::Byte(32))]);
        let order: Vec<u8> = entries.iter().map(|e| e.index).collect();
        assert_eq!(order, [6, 0]);
        assert_eq!(entries[1].value, MetaValue::Byte(32));
    }
}
