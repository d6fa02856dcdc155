//! Entity updates: movement, metadata, attributes, equipment and effects.

use mc_rewind_proto::packets::{v1_8, v1_9};
use mc_rewind_proto::{FieldValue, Packet, Revision};

use super::{clientbound, PAIR};
use crate::cooldown::Cooldown;
use crate::entity::{EntityTracker, EntityType};
use crate::error::RewindError;
use crate::levitation::{Levitation, LEVITATION_EFFECT};
use crate::metadata;
use crate::movement::{self, LegacyMove, Split};
use crate::pipeline::{PacketContext, PacketMapping, Pipeline};
use crate::protocol::{double_to_fixed, from_angle};

/// Highest status and effect id 1.8 knows.
const LAST_LEGACY_ID: i8 = 23;

/// Attributes 1.8 understands. Anything else makes the client disconnect.
const LEGACY_ATTRIBUTES: &[&str] = &[
    "generic.maxHealth",
    "generic.followRange",
    "generic.knockbackResistance",
    "generic.movementSpeed",
    "generic.attackDamage",
    "horse.jumpStrength",
    "zombie.spawnReinforcements",
];

const ATTACK_SPEED: &str = "generic.attackSpeed";

/// 1.9 equipment slot of the off hand, which 1.8 lacks.
const OFF_HAND_SLOT: i32 = 1;

/// Newer relative moves are in 1/4096 of a block.
const FINE_UNITS_PER_BLOCK: f64 = 4096.0;

pub(super) fn register(pipeline: &mut Pipeline) {
    // Int id, Byte status
    clientbound(
        pipeline,
        v1_9::clientbound::ENTITY_STATUS,
        PacketMapping::new()
            .map_id(v1_8::clientbound::ENTITY_STATUS)
            .handler(|ctx| cancel_above_legacy(ctx, 1)),
    );

    // VarInt id, Short dx/dy/dz, Bool on ground
    clientbound(
        pipeline,
        v1_9::clientbound::ENTITY_POSITION,
        PacketMapping::new()
            .map_id(v1_8::clientbound::ENTITY_RELATIVE_MOVE)
            .handler(relative_move),
    );

    // VarInt id, Short dx/dy/dz, Byte yaw, Byte pitch, Bool on ground
    clientbound(
        pipeline,
        v1_9::clientbound::ENTITY_POSITION_AND_ROTATION,
        PacketMapping::new()
            .map_id(v1_8::clientbound::ENTITY_LOOK_AND_RELATIVE_MOVE)
            .handler(relative_move_and_look),
    );

    // VarInt id, Byte yaw, Byte pitch, Bool on ground
    clientbound(
        pipeline,
        v1_9::clientbound::ENTITY_ROTATION,
        PacketMapping::new()
            .map_id(v1_8::clientbound::ENTITY_LOOK)
            .handler(look),
    );

    // VarInt id, Byte head yaw
    clientbound(
        pipeline,
        v1_9::clientbound::ENTITY_HEAD_LOOK,
        PacketMapping::new()
            .map_id(v1_8::clientbound::ENTITY_HEAD_LOOK)
            .handler(head_look),
    );

    // VarInt id, Double x/y/z, Byte yaw, Byte pitch, Bool on ground
    clientbound(
        pipeline,
        v1_9::clientbound::ENTITY_TELEPORT,
        PacketMapping::new()
            .map_id(v1_8::clientbound::ENTITY_TELEPORT)
            .handler(teleport_replacement)
            .convert(1, double_to_fixed)
            .convert(2, double_to_fixed)
            .convert(3, double_to_fixed)
            .handler(teleport),
    );

    // VarInt array of ids
    clientbound(
        pipeline,
        v1_9::clientbound::DESTROY_ENTITIES,
        PacketMapping::new()
            .map_id(v1_8::clientbound::DESTROY_ENTITIES)
            .handler(destroy),
    );

    // VarInt id, Metadata
    clientbound(
        pipeline,
        v1_9::clientbound::ENTITY_METADATA,
        PacketMapping::new()
            .map_id(v1_8::clientbound::ENTITY_METADATA)
            .handler(entity_metadata),
    );

    // VarInt id, Properties
    clientbound(
        pipeline,
        v1_9::clientbound::ENTITY_PROPERTIES,
        PacketMapping::new()
            .map_id(v1_8::clientbound::ENTITY_PROPERTIES)
            .handler(properties),
    );

    // VarInt id, Byte effect, Byte amplifier, VarInt duration, Byte flags
    clientbound(
        pipeline,
        v1_9::clientbound::ENTITY_EFFECT,
        PacketMapping::new()
            .map_id(v1_8::clientbound::ENTITY_EFFECT)
            .handler(effect)
            .handler(|ctx| cancel_above_legacy(ctx, 1)),
    );

    // VarInt id, Byte effect
    clientbound(
        pipeline,
        v1_9::clientbound::REMOVE_ENTITY_EFFECT,
        PacketMapping::new()
            .map_id(v1_8::clientbound::REMOVE_ENTITY_EFFECT)
            .handler(remove_effect)
            .handler(|ctx| cancel_above_legacy(ctx, 1)),
    );

    // VarInt id, VarInt slot, Item
    clientbound(
        pipeline,
        v1_9::clientbound::ENTITY_EQUIPMENT,
        PacketMapping::new()
            .map_id(v1_8::clientbound::ENTITY_EQUIPMENT)
            .handler(equipment),
    );
}

fn is_viewer(ctx: &mut PacketContext<'_>, id: i32) -> bool {
    ctx.session.get::<EntityTracker>().player_id() == Some(id)
}

fn effect(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    let id = ctx.packet.varint_at(0)?;
    if ctx.packet.byte_at(1)? == LEVITATION_EFFECT && is_viewer(ctx, id) {
        let amplifier = ctx.packet.byte_at(2)?;
        ctx.session.get::<Levitation>().start(id, amplifier);
    }
    Ok(())
}

fn remove_effect(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    let id = ctx.packet.varint_at(0)?;
    if ctx.packet.byte_at(1)? == LEVITATION_EFFECT && is_viewer(ctx, id) {
        ctx.session.get::<Levitation>().stop();
    }
    Ok(())
}

/// 1.8 has main hand then four armor slots; the off hand sits between them in 1.9.
fn equipment(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    let slot = ctx.packet.varint_at(1)?;
    if slot == OFF_HAND_SLOT {
        ctx.cancel();
        return Ok(());
    }
    let slot = if slot > OFF_HAND_SLOT { slot - 1 } else { slot };
    ctx.packet.set(1, FieldValue::Short(slot as i16))?;
    Ok(())
}

fn cancel_above_legacy(ctx: &mut PacketContext<'_>, index: usize) -> Result<(), RewindError> {
    if ctx.packet.byte_at(index)? > LAST_LEGACY_ID {
        ctx.cancel();
    }
    Ok(())
}

fn is_boat(ctx: &mut PacketContext<'_>, id: i32) -> bool {
    ctx.session.get::<EntityTracker>().entity_type(id) == Some(EntityType::Boat)
}

/// 1.8 boats face a quarter turn further than 1.9 ones.
fn fix_boat_yaw(packet: &mut Packet, index: usize) -> Result<(), RewindError> {
    let yaw = packet.byte_at(index)?;
    packet.set(index, FieldValue::Byte(yaw.wrapping_sub(64)))?;
    Ok(())
}

fn fine_delta(packet: &Packet) -> Result<[i32; 3], RewindError> {
    Ok([
        packet.short_at(1)? as i32,
        packet.short_at(2)? as i32,
        packet.short_at(3)? as i32,
    ])
}

/// Split a delta into legacy moves, carrying the entity's previous remainder in.
fn legacy_moves(tracker: &mut EntityTracker, id: i32, delta: [i32; 3]) -> Vec<LegacyMove> {
    let carried = tracker.take_offset(id);
    let Split { moves, remainder } = movement::split(
        delta[0] + carried[0],
        delta[1] + carried[1],
        delta[2] + carried[2],
    );
    if remainder != [0; 3] {
        tracker.store_offset(id, remainder);
    }
    moves
}

fn set_move(packet: &mut Packet, m: LegacyMove) -> Result<(), RewindError> {
    packet.set(1, FieldValue::Byte(m.dx))?;
    packet.set(2, FieldValue::Byte(m.dy))?;
    packet.set(3, FieldValue::Byte(m.dz))?;
    Ok(())
}

/// Route a relative move to a replacement. Returns whether one handled it.
fn move_replacement(
    ctx: &mut PacketContext<'_>,
    id: i32,
    delta: [i32; 3],
    look: Option<(f32, f32)>,
) -> bool {
    let out = &mut ctx.outbox.after;
    let Some(replacement) = ctx.session.get::<EntityTracker>().replacement_mut(id) else {
        return false;
    };
    let [dx, dy, dz] = delta.map(|d| d as f64 / FINE_UNITS_PER_BLOCK);
    replacement.rel_move(dx, dy, dz, out);
    if let Some((yaw, pitch)) = look {
        replacement.set_yaw_pitch(yaw, pitch, out);
    }
    true
}

fn relative_move(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    let id = ctx.packet.varint_at(0)?;
    let delta = fine_delta(ctx.packet)?;
    if move_replacement(ctx, id, delta, None) {
        ctx.cancel();
        return Ok(());
    }

    let moves = legacy_moves(ctx.session.get::<EntityTracker>(), id, delta);
    set_move(ctx.packet, moves[0])?;
    let on_ground = ctx.packet.bool_at(4)?;
    for m in &moves[1..] {
        ctx.emit_after(Packet::clientbound(
            v1_8::clientbound::ENTITY_RELATIVE_MOVE,
            Revision::V1_8,
            vec![
                FieldValue::VarInt(id),
                FieldValue::Byte(m.dx),
                FieldValue::Byte(m.dy),
                FieldValue::Byte(m.dz),
                FieldValue::Bool(on_ground),
            ],
        ));
    }
    Ok(())
}

fn relative_move_and_look(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    let id = ctx.packet.varint_at(0)?;
    let delta = fine_delta(ctx.packet)?;
    let look = (
        from_angle(ctx.packet.byte_at(4)?),
        from_angle(ctx.packet.byte_at(5)?),
    );
    if move_replacement(ctx, id, delta, Some(look)) {
        ctx.cancel();
        return Ok(());
    }

    let moves = legacy_moves(ctx.session.get::<EntityTracker>(), id, delta);
    set_move(ctx.packet, moves[0])?;
    if is_boat(ctx, id) {
        fix_boat_yaw(ctx.packet, 4)?;
    }
    let yaw = ctx.packet.byte_at(4)?;
    let pitch = ctx.packet.byte_at(5)?;
    let on_ground = ctx.packet.bool_at(6)?;
    for m in &moves[1..] {
        ctx.emit_after(Packet::clientbound(
            v1_8::clientbound::ENTITY_LOOK_AND_RELATIVE_MOVE,
            Revision::V1_8,
            vec![
                FieldValue::VarInt(id),
                FieldValue::Byte(m.dx),
                FieldValue::Byte(m.dy),
                FieldValue::Byte(m.dz),
                FieldValue::Byte(yaw),
                FieldValue::Byte(pitch),
                FieldValue::Bool(on_ground),
            ],
        ));
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
        return Ok(());
    }
    if is_boat(ctx, id) {
        fix_boat_yaw(ctx.packet, 1)?;
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

fn teleport_replacement(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    let id = ctx.packet.varint_at(0)?;
    let x = ctx.packet.double_at(1)?;
    let y = ctx.packet.double_at(2)?;
    let z = ctx.packet.double_at(3)?;
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

fn teleport(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    let id = ctx.packet.varint_at(0)?;
    if is_boat(ctx, id) {
        fix_boat_yaw(ctx.packet, 4)?;
        let y = ctx.packet.int_at(2)?;
        ctx.packet.set(2, FieldValue::Int(y.saturating_add(10)))?;
    }
    ctx.session.get::<EntityTracker>().reset_offset(id);
    Ok(())
}

fn destroy(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    let tracker = ctx.session.get::<EntityTracker>();
    for &id in ctx.packet.varint_array_at(0)? {
        tracker.remove(id, &mut ctx.outbox.before);
    }
    Ok(())
}

fn entity_metadata(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    let id = ctx.packet.varint_at(0)?;
    let tracker = ctx.session.get::<EntityTracker>();

    if let Some(replacement) = tracker.replacement_mut(id) {
        let entries = std::mem::take(ctx.packet.metadata_at_mut(1)?);
        replacement.update_metadata(&entries, &mut ctx.outbox.after);
        ctx.cancel();
        return Ok(());
    }

    match tracker.entity_type(id) {
        Some(entity_type) => {
            let entries = ctx.packet.metadata_at_mut(1)?;
            metadata::transform(PAIR, entity_type, entries);
            if entries.is_empty() {
                ctx.cancel();
            }
        }
        None => {
            let entries = std::mem::take(ctx.packet.metadata_at_mut(1)?);
            tracker.buffer_metadata(id, entries);
            ctx.cancel();
        }
    }
    Ok(())
}

fn properties(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    let id = ctx.packet.varint_at(0)?;
    let viewer = is_viewer(ctx, id);

    let properties = ctx.packet.properties_at_mut(1)?;
    if viewer {
        if let Some(speed) = properties.iter().find(|p| p.key == ATTACK_SPEED) {
            ctx.session
                .get::<Cooldown>()
                .set_attack_speed(speed.value, &speed.modifiers);
        }
    }
    properties.retain(|p| LEGACY_ATTRIBUTES.contains(&p.key.as_str()));
    Ok(())
}
