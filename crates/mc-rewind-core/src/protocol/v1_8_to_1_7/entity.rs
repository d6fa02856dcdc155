//! Entity spawns and updates for 1.7: int ids, no on-ground flags, and a
//! silverfish in place of the endermite.

use mc_rewind_proto::packets::{v1_7, v1_8};
use mc_rewind_proto::FieldValue;
use tracing::{debug, warn};

use super::{clientbound, PAIR};
use crate::entity::{EntityReplacement, EntityTracker, EntityType, ReplacementKind};
use crate::error::RewindError;
use crate::metadata;
use crate::pipeline::{PacketContext, PacketMapping, Pipeline};
use crate::protocol::{from_angle, varint_to_int};

/// 1.8 spawns armor stands as mob 30 or object 78; 1.7 has neither.
const ARMOR_STAND_MOB: i32 = 30;

/// Legacy positions and deltas are in 1/32 of a block.
const FIXED_UNITS_PER_BLOCK: f64 = 32.0;

pub(super) fn register(pipeline: &mut Pipeline) {
    // VarInt id, UByte type, Int x/y/z, Byte yaw/pitch/head, Short velocity x3, Metadata
    clientbound(
        pipeline,
        v1_8::clientbound::SPAWN_MOB,
        PacketMapping::new()
            .map_id(v1_7::clientbound::SPAWN_MOB)
            .handler(spawn_mob),
    );

    // VarInt id, Byte type, Int x/y/z, Byte pitch/yaw, Int data, [Short velocity x3]
    clientbound(
        pipeline,
        v1_8::clientbound::SPAWN_OBJECT,
        PacketMapping::new()
            .map_id(v1_7::clientbound::SPAWN_OBJECT)
            .handler(spawn_object),
    );

    // VarInt id, Uuid, Int x/y/z, Byte yaw/pitch, Short item, Metadata
    clientbound(
        pipeline,
        v1_8::clientbound::SPAWN_PLAYER,
        PacketMapping::new()
            .map_id(v1_7::clientbound::SPAWN_PLAYER)
            .handler(spawn_player),
    );

    // VarInt id, Metadata
    clientbound(
        pipeline,
        v1_8::clientbound::ENTITY_METADATA,
        PacketMapping::new()
            .map_id(v1_7::clientbound::ENTITY_METADATA)
            .convert(0, varint_to_int)
            .handler(entity_metadata),
    );

    // VarInt array of ids
    clientbound(
        pipeline,
        v1_8::clientbound::DESTROY_ENTITIES,
        PacketMapping::new()
            .map_id(v1_7::clientbound::DESTROY_ENTITIES)
            .handler(destroy),
    );

    // VarInt id, Int x/y/z, Byte yaw/pitch, Bool on ground
    clientbound(
        pipeline,
        v1_8::clientbound::ENTITY_TELEPORT,
        PacketMapping::new()
            .map_id(v1_7::clientbound::ENTITY_TELEPORT)
            .handler(teleport)
            .remove(6)
            .convert(0, varint_to_int),
    );

    // VarInt id, Byte dx/dy/dz, Bool on ground
    clientbound(
        pipeline,
        v1_8::clientbound::ENTITY_RELATIVE_MOVE,
        PacketMapping::new()
            .map_id(v1_7::clientbound::ENTITY_RELATIVE_MOVE)
            .handler(relative_move)
            .remove(4)
            .convert(0, varint_to_int),
    );

    // VarInt id, Byte dx/dy/dz, Byte yaw/pitch, Bool on ground
    clientbound(
        pipeline,
        v1_8::clientbound::ENTITY_LOOK_AND_RELATIVE_MOVE,
        PacketMapping::new()
            .map_id(v1_7::clientbound::ENTITY_LOOK_AND_RELATIVE_MOVE)
            .handler(relative_move_and_look)
            .remove(6)
            .convert(0, varint_to_int),
    );

    // VarInt id, Byte yaw/pitch, Bool on ground
    clientbound(
        pipeline,
        v1_8::clientbound::ENTITY_LOOK,
        PacketMapping::new()
            .map_id(v1_7::clientbound::ENTITY_LOOK)
            .handler(look)
            .remove(3)
            .convert(0, varint_to_int),
    );

    // VarInt id, Byte head yaw
    clientbound(
        pipeline,
        v1_8::clientbound::ENTITY_HEAD_LOOK,
        PacketMapping::new()
            .map_id(v1_7::clientbound::ENTITY_HEAD_LOOK)
            .handler(head_look)
            .convert(0, varint_to_int),
    );
}

fn fixed_position(ctx: &PacketContext<'_>, first: usize) -> Result<[f64; 3], RewindError> {
    Ok([
        ctx.packet.int_at(first)? as f64 / FIXED_UNITS_PER_BLOCK,
        ctx.packet.int_at(first + 1)? as f64 / FIXED_UNITS_PER_BLOCK,
        ctx.packet.int_at(first + 2)? as f64 / FIXED_UNITS_PER_BLOCK,
    ])
}

fn spawn_mob(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    let id = ctx.packet.varint_at(0)?;
    let type_id = ctx.packet.ubyte_at(1)? as i32;

    if type_id == ARMOR_STAND_MOB {
        debug!("Dropping armor stand {id}");
        ctx.cancel();
        return Ok(());
    }
    let entity_type = match EntityType::from_mob_id(type_id) {
        Some(EntityType::Guardian | EntityType::Rabbit) | None => {
            warn!("Unsupported mob type {type_id} for entity {id}");
            ctx.cancel();
            return Ok(());
        }
        Some(entity_type) => entity_type,
    };

    if entity_type == EntityType::Endermite {
        let position = fixed_position(ctx, 2)?;
        let yaw = from_angle(ctx.packet.byte_at(5)?);
        let pitch = from_angle(ctx.packet.byte_at(6)?);
        let head_yaw = from_angle(ctx.packet.byte_at(7)?);
        let metadata = std::mem::take(ctx.packet.metadata_at_mut(11)?);

        let out = &mut ctx.outbox.after;
        let mut replacement =
            EntityReplacement::spawn(ReplacementKind::Endermite, id, position, yaw, pitch, out);
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

fn spawn_object(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    let id = ctx.packet.varint_at(0)?;
    let type_id = ctx.packet.byte_at(1)? as i32;

    match EntityType::from_object_id(type_id) {
        Some(EntityType::ArmorStand) => {
            debug!("Dropping armor stand {id}");
            ctx.cancel();
        }
        Some(entity_type) => ctx
            .session
            .get::<EntityTracker>()
            .note_type(id, entity_type, &mut ctx.outbox.after),
        None => {
            warn!("Unknown object type {type_id} for entity {id}");
            ctx.cancel();
        }
    }
    Ok(())
}

fn spawn_player(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    let id = ctx.packet.varint_at(0)?;
    metadata::transform(PAIR, EntityType::Player, ctx.packet.metadata_at_mut(8)?);
    ctx.session
        .get::<EntityTracker>()
        .note_type(id, EntityType::Player, &mut ctx.outbox.after);
    Ok(())
}

fn entity_metadata(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    let id = ctx.packet.int_at(0)?;
    let tracker = ctx.session.get::<EntityTracker>();

    if let Some(replacement) = tracker.replacement_mut(id) {
        let entries = std::mem::take(ctx.packet.metadata_at_mut(1)?);
        replacement.update_metadata(&entries, &mut ctx.outbox.after);
        ctx.cancel();
        return Ok(());
    }

    let Some(entity_type) = tracker.entity_type(id) else {
        let entries = std::mem::take(ctx.packet.metadata_at_mut(1)?);
        tracker.buffer_metadata(id, entries);
        ctx.cancel();
        return Ok(());
    };
    let entries = ctx.packet.metadata_at_mut(1)?;
    metadata::transform(PAIR, entity_type, entries);
    if entries.is_empty() {
        ctx.cancel();
    }
    Ok(())
}

fn destroy(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    let ids = std::mem::take(ctx.packet.varint_array_at_mut(0)?);
    let tracker = ctx.session.get::<EntityTracker>();
    for &id in &ids {
        tracker.remove(id, &mut ctx.outbox.before);
    }
    ctx.packet.set(0, FieldValue::IntArray(ids))?;
    Ok(())
}

fn teleport(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    let id = ctx.packet.varint_at(0)?;
    let [x, y, z] = fixed_position(ctx, 1)?;
    let yaw = from_angle(ctx.packet.byte_at(4)?);
    let pitch = from_angle(ctx.packet.byte_at(5)?);

    let out = &mut ctx.outbox.after;
    if let Some(replacement) = ctx.session.get::<EntityTracker>().replacement_mut(id) {
        replacement.set_location(x, y, z, out);
        replacement.set_yaw_pitch(yaw, pitch, out);
        ctx.cancel();
    }
    Ok(())
}

/// Route a relative move to a replacement. Returns whether one handled it.
fn move_replacement(
    ctx: &mut PacketContext<'_>,
    id: i32,
    look: Option<(f32, f32)>,
) -> Result<bool, RewindError> {
    let delta = [
        ctx.packet.byte_at(1)?,
        ctx.packet.byte_at(2)?,
        ctx.packet.byte_at(3)?,
    ];
    let out = &mut ctx.outbox.after;
    let Some(replacement) = ctx.session.get::<EntityTracker>().replacement_mut(id) else {
        return Ok(false);
    };
    let [dx, dy, dz] = delta.map(|d| d as f64 / FIXED_UNITS_PER_BLOCK);
    replacement.rel_move(dx, dy, dz, out);
    if let Some((yaw, pitch)) = look {
        replacement.set_yaw_pitch(yaw, pitch, out);
    }
    Ok(true)
}

fn relative_move(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    let id = ctx.packet.varint_at(0)?;
    if move_replacement(ctx, id, None)? {
        ctx.cancel();
    }
    Ok(())
}

fn relative_move_and_look(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    let id = ctx.packet.varint_at(0)?;
    let look = (
        from_angle(ctx.packet.byte_at(4)?),
        from_angle(ctx.packet.byte_at(5)?),
    );
    if move_replacement(ctx, id, Some(look))? {
        ctx.cancel();
    }
    Ok(())
}

fn look(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    let id = ctx.packet.varint_at(0)?;
    let yaw = from_angle(ctx.packet.byte_at(1)?);
    let pitch = from_angle(ctx.packet.byte_at(2)?);

    let out = &mut ctx.outbox.after;
    if let Some(replacement) = ctx.session.get::<EntityTracker>().replacement_mut(id) {
        replacement.set_yaw_pitch(yaw, pitch, out);
        ctx.cancel();
    }
    Ok(())
}

fn head_look(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    let id = ctx.packet.varint_at(0)?;
    let head_yaw = from_angle(ctx.packet.byte_at(1)?);

    let out = &mut ctx.outbox.after;
    if let Some(replacement) = ctx.session.get::<EntityTracker>().replacement_mut(id) {
        replacement.set_head_yaw(head_yaw, out);
        ctx.cancel();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{send, setup};
    use super::*;
    use crate::pipeline::{Outcome, Pipeline};
    use crate::session::Session;
    use mc_rewind_proto::{MetaValue, MetadataEntry, Revision};

    fn mob(id: i32, type_id: u8, metadata: Vec<MetadataEntry>) -> Vec<FieldValue> {
        vec![
            FieldValue::VarInt(id),
            FieldValue::UByte(type_id),
            FieldValue::Int(320),
            FieldValue::Int(2048),
            FieldValue::Int(-320),
            FieldValue::Byte(64),
            FieldValue::Byte(0),
            FieldValue::Byte(32),
            FieldValue::Short(0),
            FieldValue::Short(0),
            FieldValue::Short(0),
            FieldValue::Metadata(metadata),
        ]
    }

    fn spawn_endermite(p: &Pipeline, s: &mut Session, id: i32) -> Outcome {
        send(
            p,
            s,
            v1_8::clientbound::SPAWN_MOB,
            mob(id, 67, vec![MetadataEntry::new(6, MetaValue::Float(8.0))]),
        )
    }

    #[test]
    fn endermite_becomes_silverfish() {
        let (p, mut s) = setup();
        let Outcome::Cancelled { emitted } = spawn_endermite(&p, &mut s, 4) else {
            panic!("endermite spawn must be replaced");
        };
        let ids: Vec<i32> = emitted.iter().map(|p| p.id).collect();
        assert_eq!(
            ids,
            [
                v1_7::clientbound::SPAWN_MOB,
                v1_7::clientbound::ENTITY_HEAD_LOOK,
                v1_7::clientbound::ENTITY_METADATA,
            ]
        );
        let spawn = &emitted[0];
        assert_eq!(spawn.revision, Revision::V1_7);
        assert_eq!(spawn.ubyte_at(1).unwrap(), 60);
        assert_eq!(spawn.int_at(3).unwrap(), 2048);
        assert_eq!(emitted[1].int_at(0).unwrap(), 4);

        let replacement = s.get::<EntityTracker>().replacement(4).map(|r| r.position());
        assert_eq!(replacement, Some([10.0, 64.0, -10.0]));
    }

    #[test]
    fn unsupported_mobs_are_dropped() {
        let (p, mut s) = setup();
        for type_id in [ARMOR_STAND_MOB as u8, 68, 101, 200] {
            let out = send(&p, &mut s, v1_8::clientbound::SPAWN_MOB, mob(9, type_id, Vec::new()));
            assert!(out.is_cancelled(), "mob type {type_id}");
        }
        assert!(s.get::<EntityTracker>().get(9).is_none());
    }

    #[test]
    fn mob_metadata_is_rewritten() {
        let (p, mut s) = setup();
        let out = send(
            &p,
            &mut s,
            v1_8::clientbound::SPAWN_MOB,
            mob(
                5,
                90,
                vec![
                    MetadataEntry::new(0, MetaValue::Byte(0)),
                    MetadataEntry::new(12, MetaValue::Byte(-1)),
                ],
            ),
        );
        let packet = &out.into_packets()[0];
        assert_eq!(
            packet.metadata_at(11).unwrap(),
            &vec![
                MetadataEntry::new(0, MetaValue::Byte(0)),
                MetadataEntry::new(12, MetaValue::Int(-1)),
            ]
        );
        assert_eq!(s.get::<EntityTracker>().entity_type(5), Some(EntityType::Pig));
    }

    #[test]
    fn armor_stand_objects_are_dropped() {
        let (p, mut s) = setup();
        let object = |type_id: i8| {
            vec![
                FieldValue::VarInt(11),
                FieldValue::Byte(type_id),
                FieldValue::Int(0),
                FieldValue::Int(0),
                FieldValue::Int(0),
                FieldValue::Byte(0),
                FieldValue::Byte(0),
                FieldValue::Int(0),
            ]
        };
        assert!(send(&p, &mut s, v1_8::clientbound::SPAWN_OBJECT, object(78)).is_cancelled());
        let boat = send(&p, &mut s, v1_8::clientbound::SPAWN_OBJECT, object(1));
        assert_eq!(boat.into_packets()[0].id, v1_7::clientbound::SPAWN_OBJECT);
        assert_eq!(s.get::<EntityTracker>().entity_type(11), Some(EntityType::Boat));
    }

    #[test]
    fn metadata_gets_int_id() {
        let (p, mut s) = setup();
        let update = || {
            vec![
                FieldValue::VarInt(12),
                FieldValue::Metadata(vec![MetadataEntry::new(6, MetaValue::Float(3.0))]),
            ]
        };
        let early = send(&p, &mut s, v1_8::clientbound::ENTITY_METADATA, update());
        assert!(early.is_cancelled());

        let spawned = send(&p, &mut s, v1_8::clientbound::SPAWN_MOB, mob(12, 54, Vec::new()));
        let packets = spawned.into_packets();
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[1].fields[0], FieldValue::Int(12));

        let late = send(&p, &mut s, v1_8::clientbound::ENTITY_METADATA, update());
        let packet = &late.into_packets()[0];
        assert_eq!(packet.fields[0], FieldValue::Int(12));
        assert_eq!(
            packet.metadata_at(1).unwrap(),
            &vec![MetadataEntry::new(6, MetaValue::Float(3.0))]
        );
    }

    #[test]
    fn endermite_updates_go_to_the_stand_in() {
        let (p, mut s) = setup();
        spawn_endermite(&p, &mut s, 4);

        let moved = send(
            &p,
            &mut s,
            v1_8::clientbound::ENTITY_RELATIVE_MOVE,
            vec![
                FieldValue::VarInt(4),
                FieldValue::Byte(32),
                FieldValue::Byte(0),
                FieldValue::Byte(0),
                FieldValue::Bool(true),
            ],
        );
        let Outcome::Cancelled { emitted } = moved else {
            panic!("replacement move must be cancelled");
        };
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].id, v1_7::clientbound::ENTITY_TELEPORT);
        assert_eq!(emitted[0].fields.len(), 6);
        assert_eq!(emitted[0].int_at(1).unwrap(), 11 * 32);

        let teleport = send(
            &p,
            &mut s,
            v1_8::clientbound::ENTITY_TELEPORT,
            vec![
                FieldValue::VarInt(4),
                FieldValue::Int(0),
                FieldValue::Int(64 * 32),
                FieldValue::Int(0),
                FieldValue::Byte(64),
                FieldValue::Byte(0),
                FieldValue::Bool(true),
            ],
        );
        assert!(teleport.is_cancelled());
        assert_eq!(
            s.get::<EntityTracker>().replacement(4).unwrap().position(),
            [0.0, 64.0, 0.0]
        );

        let destroy = send(
            &p,
            &mut s,
            v1_8::clientbound::DESTROY_ENTITIES,
            vec![FieldValue::VarIntArray(vec![4, 5])],
        );
        let packets = destroy.into_packets();
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].fields, vec![FieldValue::IntArray(vec![4])]);
        assert_eq!(packets[1].fields, vec![FieldValue::IntArray(vec![4, 5])]);
        assert!(s.get::<EntityTracker>().get(4).is_none());
    }

    #[test]
    fn plain_movement_loses_on_ground() {
        let (p, mut s) = setup();
        let moved = send(
            &p,
            &mut s,
            v1_8::clientbound::ENTITY_LOOK_AND_RELATIVE_MOVE,
            vec![
                FieldValue::VarInt(2),
                FieldValue::Byte(1),
                FieldValue::Byte(2),
                FieldValue::Byte(3),
                FieldValue::Byte(4),
                FieldValue::Byte(5),
                FieldValue::Bool(false),
            ],
        );
        assert_eq!(
            moved.into_packets()[0].fields,
            vec![
                FieldValue::Int(2),
                FieldValue::Byte(1),
                FieldValue::Byte(2),
                FieldValue::Byte(3),
                FieldValue::Byte(4),
                FieldValue::Byte(5),
            ]
        );

        let teleport = send(
            &p,
            &mut s,
            v1_8::clientbound::ENTITY_TELEPORT,
            vec![
                FieldValue::VarInt(2),
                FieldValue::Int(1),
                FieldValue::Int(2),
                FieldValue::Int(3),
                FieldValue::Byte(0),
                FieldValue::Byte(0),
                FieldValue::Bool(true),
            ],
        );
        let packet = &teleport.into_packets()[0];
        assert_eq!(packet.fields.len(), 6);
        assert_eq!(packet.fields[0], FieldValue::Int(2));

        let head = send(
            &p,
            &mut s,
            v1_8::clientbound::ENTITY_HEAD_LOOK,
            vec![FieldValue::VarInt(2), FieldValue::Byte(9)],
        );
        assert_eq!(
            head.into_packets()[0].fields,
            vec![FieldValue::Int(2), FieldValue::Byte(9)]
        );
    }
}
