//! Per-session entity tracking.
//!
//! Metadata may arrive before the packet that tells which type an entity
//! is. Until then it is buffered; resolving the type flushes the buffer
//! through the metadata rewriter as a single legacy packet.

pub mod replacement;
pub mod types;

pub use replacement::{EntityReplacement, ReplacementKind, ReplacementState};
pub use types::EntityType;

use std::collections::HashMap;

use mc_rewind_proto::metadata::upsert;
use mc_rewind_proto::packets::v1_8;
use mc_rewind_proto::{FieldValue, MetadataEntry, Packet};
use tracing::trace;

use crate::metadata;
use crate::protocol::ProtocolPair;
use crate::session::{SessionInfo, StoredObject};

#[derive(Debug, Clone)]
pub struct TrackedEntity {
    pub id: i32,
    pub entity_type: Option<EntityType>,
    /// Metadata received before the type was known.
    pub pending: Vec<MetadataEntry>,
    /// Fine-unit movement not yet sent to the client.
    pub offset: [i32; 3],
}

impl TrackedEntity {
    fn new(id: i32) -> Self {
        Self {
            id,
            entity_type: None,
            pending: Vec::new(),
            offset: [0; 3],
        }
    }
}

/// An id is either translated normally or backed by a stand-in.
#[derive(Debug, Clone)]
pub enum Tracked {
    Plain(TrackedEntity),
    Replaced(EntityReplacement),
}

pub struct EntityTracker {
    pair: ProtocolPair,
    entities: HashMap<i32, Tracked>,
    /// Riders per vehicle, bottom first.
    passengers: HashMap<i32, Vec<i32>>,
    player_id: Option<i32>,
}

impl StoredObject for EntityTracker {
    fn create(info: &SessionInfo) -> Self {
        Self::new(info.pair)
    }
}

impl EntityTracker {
    pub fn new(pair: ProtocolPair) -> Self {
        Self {
            pair,
            entities: HashMap::new(),
            passengers: HashMap::new(),
            player_id: None,
        }
    }

    /// Resolve an entity's type and flush what was buffered for it.
    ///
    /// Resolving an id twice, or an id backed by a replacement, does nothing.
    pub fn note_type(&mut self, id: i32, entity_type: EntityType, out: &mut Vec<Packet>) {
        let entry = self
            .entities
            .entry(id)
            .or_insert_with(|| Tracked::Plain(TrackedEntity::new(id)));
        let Tracked::Plain(entity) = entry else {
            return;
        };
        if entity.entity_type.is_some() {
            return;
        }
        entity.entity_type = Some(entity_type);

        if entity.pending.is_empty() {
            return;
        }
        let mut entries = std::mem::take(&mut entity.pending);
        metadata::transform(self.pair, entity_type, &mut entries);
        if entries.is_empty() {
            return;
        }
        trace!("Flushing {} buffered metadata entries for entity {id}", entries.len());
        out.push(metadata_packet(self.pair, id, entries));
    }

    /// Buffer metadata for an entity whose type is still unknown.
    pub fn buffer_metadata(&mut self, id: i32, entries: Vec<MetadataEntry>) {
        let entry = self
            .entities
            .entry(id)
            .or_insert_with(|| Tracked::Plain(TrackedEntity::new(id)));
        if let Tracked::Plain(entity) = entry {
            for e in entries {
                upsert(&mut entity.pending, e);
            }
        }
    }

    /// Forget an entity. A replacement backing it is despawned first.
    pub fn remove(&mut self, id: i32, out: &mut Vec<Packet>) {
        if let Some(Tracked::Replaced(mut replacement)) = self.entities.remove(&id) {
            replacement.despawn(out);
        }
        self.passengers.remove(&id);
    }

    pub fn entity_type(&self, id: i32) -> Option<EntityType> {
        match self.entities.get(&id)? {
            Tracked::Plain(entity) => entity.entity_type,
            Tracked::Replaced(replacement) => Some(replacement.kind().original()),
        }
    }

    pub fn get(&self, id: i32) -> Option<&Tracked> {
        self.entities.get(&id)
    }

    pub fn replacement(&self, id: i32) -> Option<&EntityReplacement> {
        match self.entities.get(&id)? {
            Tracked::Replaced(replacement) => Some(replacement),
            Tracked::Plain(_) => None,
        }
    }

    pub fn replacement_mut(&mut self, id: i32) -> Option<&mut EntityReplacement> {
        match self.entities.get_mut(&id)? {
            Tracked::Replaced(replacement) => Some(replacement),
            Tracked::Plain(_) => None,
        }
    }

    /// Back an id by a stand-in. Whatever was tracked for the id is dropped.
    pub fn add_replacement(&mut self, replacement: EntityReplacement) {
        self.entities
            .insert(replacement.id(), Tracked::Replaced(replacement));
    }

    pub fn player_id(&self) -> Option<i32> {
        self.player_id
    }

    pub fn set_player_id(&mut self, id: i32) {
        self.player_id = Some(id);
    }

    pub fn passengers(&self, vehicle: i32) -> &[i32] {
        self.passengers.get(&vehicle).map(Vec::as_slice).unwrap_or_default()
    }

    /// Replace a vehicle's riders, returning the previous ones.
    pub fn set_passengers(&mut self, vehicle: i32, passengers: Vec<i32>) -> Vec<i32> {
        if passengers.is_empty() {
            return self.passengers.remove(&vehicle).unwrap_or_default();
        }
        self.passengers.insert(vehicle, passengers).unwrap_or_default()
    }

    /// The vehicle `id` rides, if any.
    pub fn vehicle_of(&self, id: i32) -> Option<i32> {
        self.passengers
            .iter()
            .find(|(_, riders)| riders.contains(&id))
            .map(|(vehicle, _)| *vehicle)
    }

    /// Take the movement remainder carried for `id`.
    pub fn take_offset(&mut self, id: i32) -> [i32; 3] {
        match self.entities.get_mut(&id) {
            Some(Tracked::Plain(entity)) => std::mem::take(&mut entity.offset),
            _ => [0; 3],
        }
    }

    pub fn store_offset(&mut self, id: i32, offset: [i32; 3]) {
        if let Some(Tracked::Plain(entity)) = self.entities.get_mut(&id) {
            entity.offset = offset;
        }
    }

    /// Drop the remainder after an absolute position.
    pub fn reset_offset(&mut self, id: i32) {
        if let Some(Tracked::Plain(entity)) = self.entities.get_mut(&id) {
            entity.offset = [0; 3];
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// A legacy metadata packet for the client side of `pair`.
pub fn metadata_packet(pair: ProtocolPair, id: i32, entries: Vec<MetadataEntry>) -> Packet {
    let id_field = match pair {
        ProtocolPair::V1_9To1_8 => FieldValue::VarInt(id),
        ProtocolPair::V1_8To1_7 => FieldValue::Int(id),
    };
    Packet::clientbound(
        v1_8::clientbound::ENTITY_METADATA,
        pair.legacy(),
        vec![id_field, FieldValue::Metadata(entries)],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_rewind_proto::MetaValue;

    fn tracker() -> EntityTracker {
        EntityTracker::new(ProtocolPair::V1_9To1_8)
    }

    #[test]
    fn buffered_metadata_flushes_once_in_order() {
        let mut t = tracker();
        t.buffer_metadata(
            5,
            vec![
                MetadataEntry::new(6, MetaValue::Float(20.0)),
                MetadataEntry::new(0, MetaValue::Byte(0)),
            ],
        );
        // same index overwrites in place
        t.buffer_metadata(5, vec![MetadataEntry::new(6, MetaValue::Float(8.0))]);
        assert_eq!(t.entity_type(5), None);

        let mut out = Vec::new();
        t.note_type(5, EntityType::Cow, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, v1_8::clientbound::ENTITY_METADATA);
        assert_eq!(out[0].varint_at(0).unwrap(), 5);
        assert_eq!(
            out[0].metadata_at(1).unwrap(),
            &vec![
                MetadataEntry::new(6, MetaValue::Float(8.0)),
                MetadataEntry::new(0, MetaValue::Byte(0)),
            ]
        );

        t.note_type(5, EntityType::Pig, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(t.entity_type(5), Some(EntityType::Cow));
    }

    #[test]
    fn nothing_buffered_sends_nothing() {
        let mut t = tracker();
        let mut out = Vec::new();
        t.note_type(1, EntityType::Boat, &mut out);
        assert!(out.is_empty());
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn legacy_pair_uses_int_ids() {
        let mut t = EntityTracker::new(ProtocolPair::V1_8To1_7);
        t.buffer_metadata(2, vec![MetadataEntry::new(0, MetaValue::Byte(1))]);
        let mut out = Vec::new();
        t.note_type(2, EntityType::Zombie, &mut out);
        assert_eq!(out[0].int_at(0).unwrap(), 2);
        assert_eq!(out[0].revision, mc_rewind_proto::Revision::V1_7);
    }

    #[test]
    fn remove_despawns_replacement() {
        let mut t = tracker();
        let mut out = Vec::new();
        let r = EntityReplacement::spawn(ReplacementKind::Shulker, 9, [0.0; 3], 0.0, 0.0, &mut out);
        t.add_replacement(r);
        assert_eq!(t.entity_type(9), Some(EntityType::Shulker));
        assert!(t.replacement(9).is_some());

        // a replaced id ignores type resolution and buffering
        t.note_type(9, EntityType::Cow, &mut out);
        t.buffer_metadata(9, vec![MetadataEntry::new(0, MetaValue::Byte(1))]);
        assert_eq!(out.len(), 1);

        t.remove(9, &mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].id, v1_8::clientbound::DESTROY_ENTITIES);
        assert!(t.is_empty());

        t.remove(9, &mut out);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn offsets_are_carried_and_reset() {
        let mut t = tracker();
        t.note_type(4, EntityType::Cow, &mut Vec::new());
        assert_eq!(t.take_offset(4), [0; 3]);
        t.store_offset(4, [10, -3, 0]);
        assert_eq!(t.take_offset(4), [10, -3, 0]);
        assert_eq!(t.take_offset(4), [0; 3]);

        t.store_offset(4, [1, 1, 1]);
        t.reset_offset(4);
        assert_eq!(t.take_offset(4), [0; 3]);
    }

    #[test]
    fn passengers_follow_their_vehicle() {
        let mut t = tracker();
        assert!(t.set_passengers(10, vec![1, 2]).is_empty());
        assert_eq!(t.vehicle_of(2), Some(10));
        assert_eq!(t.set_passengers(10, vec![3]), vec![1, 2]);
        assert_eq!(t.vehicle_of(2), None);
        assert_eq!(t.passengers(10), &[3]);

        t.remove(10, &mut Vec::new());
        assert!(t.passengers(10).is_empty());
        assert_eq!(t.vehicle_of(3), None);
    }

    #[test]
    fn unknown_ids_carry_no_offset() {
        let mut t = tracker();
        t.store_offset(12, [5, 0, 5]);
        assert!(t.is_empty());
        assert_eq!(t.take_offset(12), [0; 3]);
    }

    #[test]
    fn player_id() {
        let mut t = tracker();
        assert_eq!(t.player_id(), None);
        t.set_player_id(42);
        assert_eq!(t.player_id(), Some(42));
    }
}
