//! Stand-ins for entities the legacy client has no model for.
//!
//! A replacement spawns a look-alike the client knows as soon as it is
//! built, then turns every later update of the real entity into packets for
//! the stand-in. Once despawned it stays silent.

use mc_rewind_proto::metadata::merge;
use mc_rewind_proto::packets::{v1_7, v1_8};
use mc_rewind_proto::{FieldValue, MetaValue, MetadataEntry, Packet, Revision};
use tracing::trace;

use crate::entity::EntityType;
use crate::metadata;
use crate::protocol::{to_angle, to_fixed, ProtocolPair};

/// Entities that are replaced rather than translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementKind {
    /// 1.9 shulker, shown to 1.8 as a magma cube.
    Shulker,
    /// 1.9 shulker bullet, shown to 1.8 as a wither skull.
    ShulkerBullet,
    /// 1.8 endermite, shown to 1.7 as a silverfish.
    Endermite,
}

impl ReplacementKind {
    pub fn pair(self) -> ProtocolPair {
        match self {
            Self::Shulker | Self::ShulkerBullet => ProtocolPair::V1_9To1_8,
            Self::Endermite => ProtocolPair::V1_8To1_7,
        }
    }

    /// The type the client is shown.
    pub fn stand_in(self) -> EntityType {
        match self {
            Self::Shulker => EntityType::MagmaCube,
            Self::ShulkerBullet => EntityType::WitherSkull,
            Self::Endermite => EntityType::Silverfish,
        }
    }

    /// The type the server spawned.
    pub fn original(self) -> EntityType {
        match self {
            Self::Shulker => EntityType::Shulker,
            Self::ShulkerBullet => EntityType::ShulkerBullet,
            Self::Endermite => EntityType::Endermite,
        }
    }

    fn revision(self) -> Revision {
        self.pair().legacy()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementState {
    Active,
    Despawned,
}

#[derive(Debug, Clone)]
pub struct EntityReplacement {
    kind: ReplacementKind,
    id: i32,
    position: [f64; 3],
    yaw: f32,
    pitch: f32,
    head_yaw: f32,
    metadata: Vec<MetadataEntry>,
    state: ReplacementState,
}

impl EntityReplacement {
    /// Build a replacement and spawn its stand-in.
    pub fn spawn(
        kind: ReplacementKind,
        id: i32,
        position: [f64; 3],
        yaw: f32,
        pitch: f32,
        out: &mut Vec<Packet>,
    ) -> Self {
        let replacement = Self {
            kind,
            id,
            position,
            yaw,
            pitch,
            head_yaw: yaw,
            metadata: Vec::new(),
            state: ReplacementState::Active,
        };
        out.push(replacement.spawn_packet());
        trace!("Spawned {:?} stand-in for entity {id}", kind);
        replacement
    }

    pub fn kind(&self) -> ReplacementKind {
        self.kind
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn position(&self) -> [f64; 3] {
        self.position
    }

    pub fn yaw_pitch(&self) -> (f32, f32) {
        (self.yaw, self.pitch)
    }

    pub fn head_yaw(&self) -> f32 {
        self.head_yaw
    }

    pub fn state(&self) -> ReplacementState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == ReplacementState::Active
    }

    /// Metadata received so far, in newer-revision form.
    pub fn metadata(&self) -> &[MetadataEntry] {
        &self.metadata
    }

    pub fn set_location(&mut self, x: f64, y: f64, z: f64, out: &mut Vec<Packet>) {
        if !self.is_active() {
            return;
        }
        self.position = [x, y, z];
        out.push(self.teleport_packet());
    }

    /// Move by a delta in blocks.
    pub fn rel_move(&mut self, dx: f64, dy: f64, dz: f64, out: &mut Vec<Packet>) {
        if !self.is_active() {
            return;
        }
        self.position[0] += dx;
        self.position[1] += dy;
        self.position[2] += dz;
        out.push(self.teleport_packet());
    }

    pub fn set_yaw_pitch(&mut self, yaw: f32, pitch: f32, out: &mut Vec<Packet>) {
        if !self.is_active() || (self.yaw == yaw && self.pitch == pitch) {
            return;
        }
        self.yaw = yaw;
        self.pitch = pitch;
        out.push(self.teleport_packet());
    }

    pub fn set_head_yaw(&mut self, head_yaw: f32, out: &mut Vec<Packet>) {
        if !self.is_active() || self.head_yaw == head_yaw {
            return;
        }
        self.head_yaw = head_yaw;
        out.push(Packet::clientbound(
            v1_8::clientbound::ENTITY_HEAD_LOOK,
            self.kind.revision(),
            vec![self.id_field(), FieldValue::Byte(to_angle(head_yaw))],
        ));
    }

    /// Merge newer-revision metadata and send the stand-in's view of it.
    pub fn update_metadata(&mut self, update: &[MetadataEntry], out: &mut Vec<Packet>) {
        if !self.is_active() {
            return;
        }
        merge(&mut self.metadata, update);
        let entries = self.legacy_metadata();
        out.push(Packet::clientbound(
            v1_8::clientbound::ENTITY_METADATA,
            self.kind.revision(),
            vec![self.id_field(), FieldValue::Metadata(entries)],
        ));
    }

    pub fn despawn(&mut self, out: &mut Vec<Packet>) {
        if !self.is_active() {
            return;
        }
        self.state = ReplacementState::Despawned;
        let ids = match self.kind.revision() {
            Revision::V1_7 => FieldValue::IntArray(vec![self.id]),
            _ => FieldValue::VarIntArray(vec![self.id]),
        };
        out.push(Packet::clientbound(
            v1_8::clientbound::DESTROY_ENTITIES,
            self.kind.revision(),
            vec![ids],
        ));
        trace!("Despawned stand-in for entity {}", self.id);
    }

    /// Snapshot with the stand-in's synthetic fields, rewritten to legacy form.
    fn legacy_metadata(&self) -> Vec<MetadataEntry> {
        let mut entries: Vec<MetadataEntry> = match self.kind {
            // shulker-only fields out, fixed slime size in
            ReplacementKind::Shulker => self
                .metadata
                .iter()
                .filter(|e| !matches!(e.index, 11..=13))
                .cloned()
                .chain(std::iter::once(MetadataEntry::new(11, MetaValue::VarInt(2))))
                .collect(),
            ReplacementKind::ShulkerBullet | ReplacementKind::Endermite => self.metadata.clone(),
        };
        metadata::transform(self.kind.pair(), self.kind.stand_in(), &mut entries);
        entries
    }

    fn id_field(&self) -> FieldValue {
        match self.kind.revision() {
            Revision::V1_7 => FieldValue::Int(self.id),
            _ => FieldValue::VarInt(self.id),
        }
    }

    fn fixed_position(&self) -> [FieldValue; 3] {
        self.position.map(|v| FieldValue::Int(to_fixed(v)))
    }

    fn spawn_packet(&self) -> Packet {
        let [x, y, z] = self.fixed_position();
        match self.kind {
            ReplacementKind::ShulkerBullet => Packet::clientbound(
                v1_8::clientbound::SPAWN_OBJECT,
                Revision::V1_8,
                vec![
                    FieldValue::VarInt(self.id),
                    FieldValue::Byte(66),
                    x,
                    y,
                    z,
                    FieldValue::Byte(to_angle(self.pitch)),
                    FieldValue::Byte(to_angle(self.yaw)),
                    FieldValue::Int(0),
                ],
            ),
            ReplacementKind::Shulker | ReplacementKind::Endermite => {
                let mut metadata = self.legacy_metadata();
                if metadata.is_empty() {
                    // the client rejects a mob spawn without metadata
                    metadata.push(MetadataEntry::new(0, MetaValue::Byte(0)));
                }
                let mob_type = self.kind.stand_in().mob_id().unwrap_or(0) as u8;
                Packet::clientbound(
                    v1_7::clientbound::SPAWN_MOB,
                    self.kind.revision(),
                    vec![
                        FieldValue::VarInt(self.id),
                        FieldValue::UByte(mob_type),
                        x,
                        y,
                        z,
                        FieldValue::Byte(to_angle(self.yaw)),
                        FieldValue::Byte(to_angle(self.pitch)),
                        FieldValue::Byte(to_angle(self.head_yaw)),
                        FieldValue::Short(0),
                        FieldValue::Short(0),
                        FieldValue::Short(0),
                        FieldValue::Metadata(metadata),
                    ],
                )
            }
        }
    }

    fn teleport_packet(&self) -> Packet {
        let [x, y, z] = self.fixed_position();
        let mut fields = vec![
            self.id_field(),
            x,
            y,
            z,
            FieldValue::Byte(to_angle(self.yaw)),
            FieldValue::Byte(to_angle(self.pitch)),
        ];
        if self.kind.revision() == Revision::V1_8 {
            // on ground
            fields.push(FieldValue::Bool(true));
        }
        Packet::clientbound(
            v1_8::clientbound::ENTITY_TELEPORT,
            self.kind.revision(),
            fields,
        )
    }
}
