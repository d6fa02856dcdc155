//! Riding. 1.8 chains riders with attach packets where 1.9 lists them.

use mc_rewind_proto::packets::{v1_8, v1_9};
use mc_rewind_proto::{FieldValue, Packet, Revision};
use tracing::debug;

use super::clientbound;
use crate::entity::{EntityTracker, EntityType};
use crate::error::RewindError;
use crate::pipeline::{PacketContext, PacketMapping, Pipeline};
use crate::protocol::{to_angle, to_fixed};

/// Vehicle id of a detached rider.
const NO_VEHICLE: i32 = -1;

pub(super) fn register(pipeline: &mut Pipeline) {
    // Int attached, Int holding
    clientbound(
        pipeline,
        v1_9::clientbound::ATTACH_ENTITY,
        PacketMapping::new()
            .map_id(v1_8::clientbound::ATTACH_ENTITY)
            // only leashes use this packet since 1.9
            .insert(2, FieldValue::Bool(true)),
    );

    // VarInt vehicle, VarInt array of passengers
    clientbound(
        pipeline,
        v1_9::clientbound::SET_PASSENGERS,
        PacketMapping::new().handler(set_passengers),
    );

    // Double x/y/z, Float yaw, Float pitch
    clientbound(
        pipeline,
        v1_9::clientbound::VEHICLE_MOVE,
        PacketMapping::new()
            .map_id(v1_8::clientbound::ENTITY_TELEPORT)
            .handler(vehicle_move),
    );
}

fn attach(rider: i32, vehicle: i32) -> Packet {
    Packet::clientbound(
        v1_8::clientbound::ATTACH_ENTITY,
        Revision::V1_8,
        vec![
            FieldValue::Int(rider),
            FieldValue::Int(vehicle),
            FieldValue::Bool(false),
        ],
    )
}

fn set_passengers(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    ctx.cancel();
    let vehicle = ctx.packet.varint_at(0)?;
    let passengers = ctx.packet.varint_array_at(1)?.clone();

    let previous = ctx
        .session
        .get::<EntityTracker>()
        .set_passengers(vehicle, passengers.clone());
    for rider in previous {
        ctx.emit_after(attach(rider, NO_VEHICLE));
    }
    // each rider sits on the one below it
    let mut below = vehicle;
    for rider in passengers {
        ctx.emit_after(attach(rider, below));
        below = rider;
    }
    Ok(())
}

fn vehicle_move(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    let tracker = ctx.session.get::<EntityTracker>();
    let Some(vehicle) = tracker.player_id().and_then(|id| tracker.vehicle_of(id)) else {
        debug!("Dropping vehicle move, the viewer rides nothing");
        ctx.cancel();
        return Ok(());
    };
    let boat = tracker.entity_type(vehicle) == Some(EntityType::Boat);

    let x = to_fixed(ctx.packet.double_at(0)?);
    let mut y = to_fixed(ctx.packet.double_at(1)?);
    let z = to_fixed(ctx.packet.double_at(2)?);
    let mut yaw = to_angle(ctx.packet.float_at(3)?);
    let pitch = to_angle(ctx.packet.float_at(4)?);
    if boat {
        yaw = yaw.wrapping_sub(64);
        y = y.saturating_add(10);
    }

    ctx.packet.fields = vec![
        FieldValue::VarInt(vehicle),
        FieldValue::Int(x),
        FieldValue::Int(y),
        FieldValue::Int(z),
        FieldValue::Byte(yaw),
        FieldValue::Byte(pitch),
        FieldValue::Bool(true),
    ];
    ctx.session.get::<EntityTracker>().reset_offset(vehicle);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{send, setup};
    use super::*;
    use crate::pipeline::Outcome;

    fn passengers(vehicle: i32, riders: Vec<i32>) -> Vec<FieldValue> {
        vec![FieldValue::VarInt(vehicle), FieldValue::VarIntArray(riders)]
    }

    fn vehicle_move_fields(y: f64) -> Vec<FieldValue> {
        vec![
            FieldValue::Double(1.0),
            FieldValue::Double(y),
            FieldValue::Double(-2.0),
            FieldValue::Float(90.0),
            FieldValue::Float(0.0),
        ]
    }

    #[test]
    fn attach_gains_leash_flag() {
        let (p, mut s) = setup();
        let out = send(
            &p,
            &mut s,
            v1_9::clientbound::ATTACH_ENTITY,
            vec![FieldValue::Int(4), FieldValue::Int(9)],
        );
        let packet = &out.into_packets()[0];
        assert_eq!(packet.id, v1_8::clientbound::ATTACH_ENTITY);
        assert_eq!(packet.int_at(1).unwrap(), 9);
        assert!(packet.bool_at(2).unwrap());
    }

    #[test]
    fn passengers_become_a_chain_of_attaches() {
        let (p, mut s) = setup();
        let out = send(&p, &mut s, v1_9::clientbound::SET_PASSENGERS, passengers(10, vec![1, 2]));
        let Outcome::Cancelled { emitted } = out else {
            panic!("passenger list must be replaced");
        };
        let pairs: Vec<(i32, i32)> = emitted
            .iter()
            .map(|p| (p.int_at(0).unwrap(), p.int_at(1).unwrap()))
            .collect();
        assert_eq!(pairs, [(1, 10), (2, 1)]);
        assert!(emitted.iter().all(|p| !p.bool_at(2).unwrap()));

        // new riders: the old ones are detached first
        let out = send(&p, &mut s, v1_9::clientbound::SET_PASSENGERS, passengers(10, vec![3]));
        let pairs: Vec<(i32, i32)> = out
            .into_packets()
            .iter()
            .map(|p| (p.int_at(0).unwrap(), p.int_at(1).unwrap()))
            .collect();
        assert_eq!(pairs, [(1, NO_VEHICLE), (2, NO_VEHICLE), (3, 10)]);
        assert_eq!(s.get::<EntityTracker>().vehicle_of(3), Some(10));
    }

    #[test]
    fn vehicle_move_teleports_the_viewers_vehicle() {
        let (p, mut s) = setup();
        let out = send(&p, &mut s, v1_9::clientbound::VEHICLE_MOVE, vehicle_move_fields(64.0));
        assert_eq!(out, Outcome::Cancelled { emitted: Vec::new() });

        s.get::<EntityTracker>().set_player_id(1);
        send(&p, &mut s, v1_9::clientbound::SET_PASSENGERS, passengers(20, vec![1]));
        let out = send(&p, &mut s, v1_9::clientbound::VEHICLE_MOVE, vehicle_move_fields(64.0));
        let packet = &out.into_packets()[0];
        assert_eq!(packet.id, v1_8::clientbound::ENTITY_TELEPORT);
        assert_eq!(packet.revision, Revision::V1_8);
        assert_eq!(packet.varint_at(0).unwrap(), 20);
        assert_eq!(packet.int_at(1).unwrap(), 32);
        assert_eq!(packet.int_at(2).unwrap(), 64 * 32);
        assert_eq!(packet.int_at(3).unwrap(), -64);
        assert_eq!(packet.byte_at(4).unwrap(), 64);
        assert!(packet.bool_at(6).unwrap());
    }

    #[test]
    fn boat_vehicle_is_turned_and_raised() {
        let (p, mut s) = setup();
        let tracker = s.get::<EntityTracker>();
        tracker.set_player_id(1);
        tracker.note_type(20, EntityType::Boat, &mut Vec::new());
        send(&p, &mut s, v1_9::clientbound::SET_PASSENGERS, passengers(20, vec![1]));

        let out = send(&p, &mut s, v1_9::clientbound::VEHICLE_MOVE, vehicle_move_fields(1.0));
        let packet = &out.into_packets()[0];
        assert_eq!(packet.int_at(2).unwrap(), 42);
        assert_eq!(packet.byte_at(4).unwrap(), 0);

        let out = send(&p, &mut s, v1_9::clientbound::VEHICLE_MOVE, vehicle_move_fields(1e12));
        assert_eq!(out.into_packets()[0].int_at(2).unwrap(), i32::MAX);
    }
}
