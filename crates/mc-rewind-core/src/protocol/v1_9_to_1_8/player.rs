//! The viewer's own player: login and swings.

use mc_rewind_proto::packets::{v1_8, v1_9};
use mc_rewind_proto::FieldValue;

use super::{clientbound, serverbound};
use crate::cooldown::Cooldown;
use crate::entity::EntityTracker;
use crate::error::RewindError;
use crate::pipeline::{PacketContext, PacketMapping, Pipeline};

/// Hand field of the newer animation packet.
const MAIN_HAND: i32 = 0;

pub(super) fn register(pipeline: &mut Pipeline) {
    // Int id, UByte gamemode, Byte dimension, UByte difficulty, UByte max players, String level type, Bool reduced debug
    clientbound(
        pipeline,
        v1_9::clientbound::JOIN_GAME,
        PacketMapping::new()
            .map_id(v1_8::clientbound::JOIN_GAME)
            .handler(join_game),
    );

    // empty in 1.8, VarInt hand in 1.9
    serverbound(
        pipeline,
        v1_8::serverbound::ANIMATION,
        PacketMapping::new()
            .map_id(v1_9::serverbound::ANIMATION)
            .insert(0, FieldValue::VarInt(MAIN_HAND))
            .handler(swing),
    );
}

fn join_game(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    let id = ctx.packet.int_at(0)?;
    ctx.session.get::<EntityTracker>().set_player_id(id);
    Ok(())
}

fn swing(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    let now = ctx.now;
    ctx.session.get::<Cooldown>().hit(now);
    Ok(())
}
