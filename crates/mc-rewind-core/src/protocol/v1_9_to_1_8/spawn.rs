//! Spawn packets. 1.9 sends positions as doubles and prefixes most spawns
//! with a UUID that 1.8 does not know.

use mc_rewind_proto::packets::{v1_8, v1_9};
use mc_rewind_proto::{FieldValue, Packet, Revision};
use tracing::warn;

use super::{clientbound, PAIR};
use crate::entity::{EntityReplacement, EntityTracker, EntityType, ReplacementKind};
use crate::error::RewindError;
use crate::metadata;
use crate::pipeline::{PacketContext, PacketMapping, Pipeline};
use crate::protocol::{byte_to_ubyte, double_to_fixed, from_angle};

pub(super) fn register(pipeline: &mut Pipeline) {
    // VarInt id, Uuid, Byte type, Double x/y/z, Byte pitch, Byte yaw, Int data, Short velocity x3
    clientbound(
        pipeline,
        v1_9::clientbound::SPAWN_OBJECT,
        PacketMapping::new()
            .map_id(v1_8::clientbound::SPAWN_OBJECT)
            .remove(1)
            .convert(2, double_to_fixed)
            .convert(3, double_to_fixed)
            .convert(4, double_to_fixed)
            .handler(spawn_object),
    );

    // VarInt id, Double x/y/z, Short count
    clientbound(
        pipeline,
        v1_9::clientbound::SPAWN_EXPERIENCE_ORB,
        PacketMapping::new()
            .map_id(v1_8::clientbound::SPAWN_EXPERIENCE_ORB)
            .convert(1, double_to_fixed)
            .convert(2, double_to_fixed)
            .convert(3, double_to_fixed)
            .passthrough(4)
            .handler(|ctx| note_type(ctx, EntityType::ExperienceOrb)),
    );

    // VarInt id, Byte type, Double x/y/z
    clientbound(
        pipeline,
        v1_9::clientbound::SPAWN_GLOBAL_ENTITY,
        PacketMapping::new()
            .map_id(v1_8::clientbound::SPAWN_GLOBAL_ENTITY)
            .convert(2, double_to_fixed)
            .convert(3, double_to_fixed)
            .convert(4, double_to_fixed)
            .handler(|ctx| note_type(ctx, EntityType::Lightning)),
    );

    // VarInt id, Uuid, UByte type, Double x/y/z, Byte yaw/pitch/head, Short velocity x3, Metadata
    clientbound(
        pipeline,
        v1_9::clientbound::SPAWN_MOB,
        PacketMapping::new()
            .map_id(v1_8::clientbound::SPAWN_MOB)
            .remove(1)
            .convert(2, double_to_fixed)
            .convert(3, double_to_fixed)
            .convert(4, double_to_fixed)
            .handler(spawn_mob),
    );

    // VarInt id, Uuid, String title, Position, Byte direction
    clientbound(
        pipeline,
        v1_9::clientbound::SPAWN_PAINTING,
        PacketMapping::new()
            .map_id(v1_8::clientbound::SPAWN_PAINTING)
            .remove(1)
            .convert(3, byte_to_ubyte)
            .handler(|ctx| note_type(ctx, EntityType::Painting)),
    );

    // VarInt id, Uuid, Double x/y/z, Byte yaw/pitch, Metadata
    clientbound(
        pipeline,
        v1_9::clientbound::SPAWN_PLAYER,
        PacketMapping::new()
            .map_id(v1_8::clientbound::SPAWN_PLAYER)
            .convert(2, double_to_fixed)
            .convert(3, double_to_fixed)
            .convert(4, double_to_fixed)
            // held item
            .insert(7, FieldValue::Short(0))
            .handler(spawn_player),
    );
}

fn note_type(ctx: &mut PacketContext<'_>, entity_type: EntityType) -> Result<(), RewindError> {
    let id = ctx.packet.varint_at(0)?;
    ctx.session
        .get::<EntityTracker>()
        .note_type(id, entity_type, &mut ctx.outbox.after);
    Ok(())
}

fn fixed_position(packet: &Packet, first: usize) -> Result<[f64; 3], RewindError> {
    Ok([
        packet.int_at(first)? as f64 / 32.0,
        packet.int_at(first + 1)? as f64 / 32.0,
        packet.int_at(first + 2)? as f64 / 32.0,
    ])
}

fn spawn_object(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    let id = ctx.packet.varint_at(0)?;
    let type_id = ctx.packet.byte_at(1)? as i32;

    let Some(entity_type) = EntityType::from_object_id(type_id) else {
        warn!("Unknown object type {type_id} for entity {id}");
        ctx.cancel();
        return Ok(());
    };

    match entity_type {
        EntityType::AreaEffectCloud
        | EntityType::SpectralArrow
        | EntityType::TippedArrow
        | EntityType::DragonFireball => {
            warn!("Object type {type_id} ({entity_type:?}) has no 1.8 counterpart");
            ctx.cancel();
            return Ok(());
        }
        EntityType::ShulkerBullet => {
            let position = fixed_position(ctx.packet, 2)?;
            let pitch = from_angle(ctx.packet.byte_at(5)?);
            let yaw = from_angle(ctx.packet.byte_at(6)?);
            let replacement = EntityReplacement::spawn(
                ReplacementKind::ShulkerBullet,
                id,
                position,
                yaw,
                pitch,
                &mut ctx.outbox.after,
            );
            ctx.session.get::<EntityTracker>().add_replacement(replacement);
            ctx.cancel();
            return Ok(());
        }
        EntityType::Boat => {
            let yaw = ctx.packet.byte_at(6)?;
            ctx.packet.set(6, FieldValue::Byte(yaw.wrapping_sub(64)))?;
            let y = ctx.packet.int_at(3)?;
            ctx.packet.set(3, FieldValue::Int(y.saturating_add(10)))?;
        }
        _ => {}
    }

    let mut data = ctx.packet.int_at(7)?;
    if entity_type.is_or_has_parent(EntityType::Arrow) && data != 0 {
        // 1.9 arrows count the shooter id from one
        data -= 1;
        ctx.packet.set(7, FieldValue::Int(data))?;
    }

    // 1.8 only reads the velocity when data is positive
    if data <= 0 {
        let vz = ctx.packet.remove(10)?;
        let vy = ctx.packet.remove(9)?;
        let vx = ctx.packet.remove(8)?;
        ctx.emit_after(Packet::clientbound(
            v1_8::clientbound::ENTITY_VELOCITY,
            Revision::V1_8,
            vec![FieldValue::VarInt(id), vx, vy, vz],
        ));
    }

    ctx.session
        .get::<EntityTracker>()
        .note_type(id, entity_type, &mut ctx.outbox.after);
    Ok(())
}

fn spawn_mob(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    let id = ctx.packet.varint_at(0)?;
    let type_id = ctx.packet.ubyte_at(1)? as i32;

    let Some(entity_type) = EntityType::from_mob_id(type_id) else {
        warn!("Unknown mob type {type_id} for entity {id}");
        ctx.cancel();
        return Ok(());
    };

    if entity_type == EntityType::Shulker {
        let position = fixed_position(ctx.packet, 2)?;
        let yaw = from_angle(ctx.packet.byte_at(5)?);
        let pitch = from_angle(ctx.packet.byte_at(6)?);
        let head_yaw = from_angle(ctx.packet.byte_at(7)?);
        let metadata = std::mem::take(ctx.packet.metadata_at_mut(11)?);

        let out = &mut ctx.outbox.after;
        let mut replacement =
            EntityReplacement::spawn(ReplacementKind::Shulker, id, position, yaw, pitch, out);
        replacement.set_head_yaw(head_yaw, out);
        replacement.update_metadata(&metadata, out);
        ctx.session.get::<EntityTracker>().add_replacement(replacement);
        ctx.cancel();
        return Ok(());
    }

    ctx.session
        .get::<EntityTracker>()
        .note_type(id, entity_type, &mut ctx.outbox.after);
    metadata::transform(PAIR, entity_type, ctx.packet.metadata_at_mut(11)?);
    Ok(())
}

fn spawn_player(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    metadata::transform(PAIR, EntityType::Player, ctx.packet.metadata_at_mut(8)?);
    note_type(ctx, EntityType::Player)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{send, setup};
    use super::*;
    use crate::pipeline::Outcome;
    use mc_rewind_proto::{MetaValue, MetadataEntry};

    fn object(id: i32, type_id: i8, data: i32) -> Vec<FieldValue> {
        vec![
            FieldValue::VarInt(id),
            FieldValue::Uuid(0xABCD),
            FieldValue::Byte(type_id),
            FieldValue::Double(1.5),
            FieldValue::Double(64.0),
            FieldValue::Double(-2.0),
            FieldValue::Byte(0),
            FieldValue::Byte(0),
            FieldValue::Int(data),
            FieldValue::Short(100),
            FieldValue::Short(200),
            FieldValue::Short(300),
        ]
    }

    fn mob(id: i32, type_id: u8, metadata: Vec<MetadataEntry>) -> Vec<FieldValue> {
        vec![
            FieldValue::VarInt(id),
            FieldValue::Uuid(1),
            FieldValue::UByte(type_id),
            FieldValue::Double(10.0),
            FieldValue::Double(64.0),
            FieldValue::Double(10.0),
            FieldValue::Byte(64),
            FieldValue::Byte(0),
            FieldValue::Byte(64),
            FieldValue::Short(0),
            FieldValue::Short(0),
            FieldValue::Short(0),
            FieldValue::Metadata(metadata),
        ]
    }

    #[test]
    fn object_with_data_keeps_velocity() {
        let (p, mut s) = setup();
        // item frame, facing 2
        let out = send(&p, &mut s, v1_9::clientbound::SPAWN_OBJECT, object(1, 71, 2));
        match out {
            Outcome::Forward { packet, after, .. } => {
                assert_eq!(packet.id, v1_8::clientbound::SPAWN_OBJECT);
                assert_eq!(packet.fields.len(), 11);
                assert_eq!(packet.int_at(2).unwrap(), 48);
                assert_eq!(packet.int_at(3).unwrap(), 2048);
                assert_eq!(packet.int_at(4).unwrap(), -64);
                assert_eq!(packet.short_at(8).unwrap(), 100);
                assert!(after.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            s.get::<EntityTracker>().entity_type(1),
            Some(EntityType::ItemFrame)
        );
    }

    #[test]
    fn object_without_data_splits_velocity() {
        let (p, mut s) = setup();
        let packets = send(&p, &mut s, v1_9::clientbound::SPAWN_OBJECT, object(2, 2, 0))
            .into_packets();
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].fields.len(), 8);
        let velocity = &packets[1];
        assert_eq!(velocity.id, v1_8::clientbound::ENTITY_VELOCITY);
        assert_eq!(
            velocity.fields,
            vec![
                FieldValue::VarInt(2),
                FieldValue::Short(100),
                FieldValue::Short(200),
                FieldValue::Short(300),
            ]
        );
    }

    #[test]
    fn arrow_data_and_boat_fix() {
        let (p, mut s) = setup();
        let arrow = send(&p, &mut s, v1_9::clientbound::SPAWN_OBJECT, object(3, 60, 8));
        assert_eq!(arrow.into_packets()[0].int_at(7).unwrap(), 7);

        let boat = send(&p, &mut s, v1_9::clientbound::SPAWN_OBJECT, object(4, 1, 0));
        let boat = &boat.into_packets()[0];
        assert_eq!(boat.int_at(3).unwrap(), 2048 + 10);
        assert_eq!(boat.byte_at(6).unwrap(), -64);
    }

    #[test]
    fn far_out_boat_is_clamped() {
        let (p, mut s) = setup();
        let mut fields = object(7, 1, 0);
        fields[4] = FieldValue::Double(1e12);
        let boat = send(&p, &mut s, v1_9::clientbound::SPAWN_OBJECT, fields);
        assert_eq!(boat.into_packets()[0].int_at(3).unwrap(), i32::MAX);
    }

    #[test]
    fn unsupported_object_is_cancelled_and_untracked() {
        let (p, mut s) = setup();
        let out = send(&p, &mut s, v1_9::clientbound::SPAWN_OBJECT, object(5, 93, 0));
        assert_eq!(out, Outcome::Cancelled { emitted: Vec::new() });
        assert!(s.get::<EntityTracker>().get(5).is_none());

        let unknown = send(&p, &mut s, v1_9::clientbound::SPAWN_OBJECT, object(6, 4, 0));
        assert!(unknown.is_cancelled());

        // a later destroy forwards the id but leaves the tracker alone
        let destroy = send(
            &p,
            &mut s,
            v1_9::clientbound::DESTROY_ENTITIES,
            vec![FieldValue::VarIntArray(vec![5])],
        );
        assert_eq!(destroy.into_packets().len(), 1);
        assert!(s.get::<EntityTracker>().is_empty());
    }

    #[test]
    fn shulker_bullet_is_replaced() {
        let (p, mut s) = setup();
        let out = send(&p, &mut s, v1_9::clientbound::SPAWN_OBJECT, object(7, 67, 0));
        match out {
            Outcome::Cancelled { emitted } => {
                assert_eq!(emitted.len(), 1);
                assert_eq!(emitted[0].byte_at(1).unwrap(), 66);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(s.get::<EntityTracker>().replacement(7).is_some());
    }

    #[test]
    fn mob_metadata_is_rewritten() {
        let (p, mut s) = setup();
        let out = send(
            &p,
            &mut s,
            v1_9::clientbound::SPAWN_MOB,
            mob(
                8,
                50,
                vec![
                    MetadataEntry::new(0, MetaValue::Byte(0)),
                    MetadataEntry::new(11, MetaValue::VarInt(1)),
                    MetadataEntry::new(12, MetaValue::Boolean(true)),
                ],
            ),
        );
        let packet = &out.into_packets()[0];
        assert_eq!(packet.id, v1_8::clientbound::SPAWN_MOB);
        assert_eq!(packet.ubyte_at(1).unwrap(), 50);
        assert_eq!(packet.int_at(2).unwrap(), 320);
        assert_eq!(
            packet.metadata_at(11).unwrap(),
            &vec![
                MetadataEntry::new(0, MetaValue::Byte(0)),
                MetadataEntry::new(16, MetaValue::Byte(1)),
                MetadataEntry::new(17, MetaValue::Byte(1)),
            ]
        );
        assert_eq!(
            s.get::<EntityTracker>().entity_type(8),
            Some(EntityType::Creeper)
        );
    }

    #[test]
    fn shulker_becomes_magma_cube() {
        let (p, mut s) = setup();
        let out = send(
            &p,
            &mut s,
            v1_9::clientbound::SPAWN_MOB,
            mob(9, 69, vec![MetadataEntry::new(0, MetaValue::Byte(0))]),
        );
        let Outcome::Cancelled { emitted } = out else {
            panic!("shulker spawn must be cancelled");
        };
        let ids: Vec<i32> = emitted.iter().map(|p| p.id).collect();
        // spawn, then metadata; head yaw matches the body so no head look
        assert_eq!(
            ids,
            [v1_8::clientbound::SPAWN_MOB, v1_8::clientbound::ENTITY_METADATA]
        );
        assert_eq!(emitted[0].ubyte_at(1).unwrap(), 62);
        let r = s.get::<EntityTracker>().replacement(9).unwrap();
        assert_eq!(r.position(), [10.0, 64.0, 10.0]);
    }

    #[test]
    fn unknown_mob_is_cancelled() {
        let (p, mut s) = setup();
        let out = send(&p, &mut s, v1_9::clientbound::SPAWN_MOB, mob(10, 200, Vec::new()));
        assert!(out.is_cancelled());
    }

    #[test]
    fn player_gets_held_item_and_flushes_buffer() {
        let (p, mut s) = setup();
        s.get::<EntityTracker>()
            .buffer_metadata(11, vec![MetadataEntry::new(6, MetaValue::Float(20.0))]);
        let packets = send(
            &p,
            &mut s,
            v1_9::clientbound::SPAWN_PLAYER,
            vec![
                FieldValue::VarInt(11),
                FieldValue::Uuid(42),
                FieldValue::Double(0.0),
                FieldValue::Double(0.0),
                FieldValue::Double(0.0),
                FieldValue::Byte(0),
                FieldValue::Byte(0),
                FieldValue::Metadata(vec![MetadataEntry::new(10, MetaValue::Float(2.0))]),
            ],
        )
        .into_packets();
        assert_eq!(packets.len(), 2);
        let spawn = &packets[0];
        assert_eq!(spawn.uuid_at(1).unwrap(), 42);
        assert_eq!(spawn.short_at(7).unwrap(), 0);
        assert_eq!(
            spawn.metadata_at(8).unwrap(),
            &vec![MetadataEntry::new(17, MetaValue::Float(2.0))]
        );
        assert_eq!(packets[1].id, v1_8::clientbound::ENTITY_METADATA);
    }

    #[test]
    fn painting_direction_is_unsigned() {
        let (p, mut s) = setup();
        let packets = send(
            &p,
            &mut s,
            v1_9::clientbound::SPAWN_PAINTING,
            vec![
                FieldValue::VarInt(12),
                FieldValue::Uuid(0),
                FieldValue::String("Kebab".into()),
                FieldValue::Position(mc_rewind_proto::types::BlockPos::new(1, 2, 3)),
                FieldValue::Byte(2),
            ],
        )
        .into_packets();
        assert_eq!(packets[0].fields.len(), 4);
        assert_eq!(packets[0].ubyte_at(3).unwrap(), 2);
    }
}
