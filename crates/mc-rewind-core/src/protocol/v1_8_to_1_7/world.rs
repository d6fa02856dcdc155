//! Dimension tracking and chunk re-encoding.

use bytes::Bytes;
use mc_rewind_proto::packets::{v1_7, v1_8};
use mc_rewind_proto::FieldValue;
use tracing::warn;

use super::clientbound;
use crate::chunk::{self, ChunkColumn, ClientWorld};
use crate::entity::EntityTracker;
use crate::error::RewindError;
use crate::pipeline::{PacketContext, PacketMapping, Pipeline};

pub(super) fn register(pipeline: &mut Pipeline) {
    // Int id, UByte gamemode, Byte dimension, UByte difficulty, UByte max players, String level type, Bool reduced debug
    clientbound(
        pipeline,
        v1_8::clientbound::JOIN_GAME,
        PacketMapping::new()
            .map_id(v1_7::clientbound::JOIN_GAME)
            .remove(6)
            .handler(join_game),
    );

    // Int dimension, UByte difficulty, UByte gamemode, String level type
    clientbound(
        pipeline,
        v1_8::clientbound::RESPAWN,
        PacketMapping::new()
            .map_id(v1_7::clientbound::RESPAWN)
            .handler(respawn),
    );

    // Int x, Int z, Bool full, UShort mask, ByteArray data
    clientbound(
        pipeline,
        v1_8::clientbound::CHUNK_DATA,
        PacketMapping::new()
            .map_id(v1_7::clientbound::CHUNK_DATA)
            .handler(chunk_data),
    );

    // Bool sky light, VarInt count, (Int x, Int z, UShort mask) per column, RawBytes data
    clientbound(
        pipeline,
        v1_8::clientbound::MAP_CHUNK_BULK,
        PacketMapping::new()
            .map_id(v1_7::clientbound::MAP_CHUNK_BULK)
            .handler(map_chunk_bulk),
    );
}

fn join_game(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    let id = ctx.packet.int_at(0)?;
    let dimension = ctx.packet.byte_at(2)? as i32;
    ctx.session.get::<ClientWorld>().dimension = dimension;
    ctx.session.get::<EntityTracker>().set_player_id(id);
    Ok(())
}

fn respawn(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    let dimension = ctx.packet.int_at(0)?;
    ctx.session.get::<ClientWorld>().dimension = dimension;
    Ok(())
}

fn chunk_data(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    let full = ctx.packet.bool_at(2)?;
    let bitmask = ctx.packet.ushort_at(3)?;
    let sky_light = ctx.session.get::<ClientWorld>().has_sky_light();

    let data = ctx.packet.byte_array_at(4)?.clone();

    let column = match ChunkColumn::read_newer(bitmask, sky_light, full, &data) {
        Ok(column) => column,
        Err(e) => {
            let x = ctx.packet.int_at(0)?;
            let z = ctx.packet.int_at(1)?;
            warn!("Dropping chunk {x},{z} with mask {bitmask:#06x}: {e}");
            ctx.cancel();
            return Ok(());
        }
    };

    let payload = chunk::encode_legacy(&column, sky_light, full, ctx.tables);
    let compressed = chunk::compress(&payload, ctx.session.info().config.chunk_compression_level)?;

    ctx.packet.fields.truncate(4);
    ctx.packet.fields.extend([
        // add bitmask, unused
        FieldValue::UShort(0),
        FieldValue::Int(compressed.len() as i32),
        FieldValue::RawBytes(Bytes::from(compressed)),
    ]);
    Ok(())
}

fn map_chunk_bulk(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    let sky_light = ctx.packet.bool_at(0)?;
    let declared = ctx.packet.varint_at(1)?;
    // sky light flag, count, one trio per column, data
    let carried = ctx.packet.fields.len().saturating_sub(3) / 3;
    if usize::try_from(declared).ok() != Some(carried) || ctx.packet.fields.len() != 3 + carried * 3 {
        warn!("Dropping chunk bulk: {declared} columns declared, {carried} present");
        ctx.cancel();
        return Ok(());
    }
    let count = carried;

    let mut columns = Vec::with_capacity(count);
    for i in 0..count {
        let base = 2 + i * 3;
        let x = ctx.packet.int_at(base)?;
        let z = ctx.packet.int_at(base + 1)?;
        let mask = ctx.packet.ushort_at(base + 2)?;
        columns.push((x, z, mask));
    }
    let data = ctx.packet.raw_bytes_at(2 + count * 3)?.clone();

    let mut payload = Vec::new();
    let mut offset = 0;
    for &(x, z, mask) in &columns {
        let size = chunk::newer_column_size(mask.count_ones() as usize, sky_light, true);
        let Some(slice) = data.get(offset..offset + size) else {
            warn!("Dropping chunk bulk: column {x},{z} runs past the data");
            ctx.cancel();
            return Ok(());
        };
        offset += size;

        match ChunkColumn::read_newer(mask, sky_light, true, slice) {
            Ok(column) => payload.extend(chunk::encode_legacy(&column, sky_light, true, ctx.tables)),
            Err(e) => {
                warn!("Dropping chunk bulk: column {x},{z}: {e}");
                ctx.cancel();
                return Ok(());
            }
        }
    }

    let compressed = chunk::compress(&payload, ctx.session.info().config.chunk_compression_level)?;

    let mut fields = vec![
        FieldValue::Short(count as i16),
        FieldValue::Int(compressed.len() as i32),
        FieldValue::Bool(sky_light),
        FieldValue::RawBytes(Bytes::from(compressed)),
    ];
    for (x, z, mask) in columns {
        fields.extend([
            FieldValue::Int(x),
            FieldValue::Int(z),
            FieldValue::Short(mask as i16),
            FieldValue::Short(0),
        ]);
    }
    ctx.packet.fields = fields;
    Ok(())
}
