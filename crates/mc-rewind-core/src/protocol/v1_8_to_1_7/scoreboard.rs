//! Scoreboard packets, reshaped for 1.7's single sidebar and shorter names.

use mc_rewind_proto::codec::truncate_chars;
use mc_rewind_proto::packets::{v1_7, v1_8};
use mc_rewind_proto::{FieldValue, Packet};
use tracing::warn;

use super::clientbound;
use crate::error::RewindError;
use crate::pipeline::{PacketContext, PacketMapping, Pipeline};
use crate::scoreboard::{
    fit_score_name, score_team_packet, sidebar_packet, team_removal_packet, Scoreboard,
    FIRST_COLOR_SLOT, MAX_DISPLAY_NAME_LEN, MAX_NAME_LEN, SIDEBAR_SLOT,
};

// objective modes
const OBJECTIVE_CREATE: i8 = 0;
const OBJECTIVE_REMOVE: i8 = 1;
const OBJECTIVE_UPDATE: i8 = 2;

const SCORE_REMOVE: i32 = 1;

// team modes
const TEAM_CREATE: i8 = 0;
const TEAM_REMOVE: i8 = 1;
const TEAM_UPDATE: i8 = 2;
const TEAM_ADD_PLAYERS: i8 = 3;
const TEAM_REMOVE_PLAYERS: i8 = 4;

pub(super) fn register(pipeline: &mut Pipeline) {
    // String name, Byte mode, [String display name, String render type]
    clientbound(
        pipeline,
        v1_8::clientbound::SCOREBOARD_OBJECTIVE,
        PacketMapping::new()
            .map_id(v1_7::clientbound::SCOREBOARD_OBJECTIVE)
            .handler(objective),
    );

    // String holder, VarInt action, String objective, [VarInt value]
    clientbound(
        pipeline,
        v1_8::clientbound::UPDATE_SCORE,
        PacketMapping::new()
            .map_id(v1_7::clientbound::UPDATE_SCORE)
            .handler(score),
    );

    // Byte position, String objective
    clientbound(
        pipeline,
        v1_8::clientbound::DISPLAY_SCOREBOARD,
        PacketMapping::new()
            .map_id(v1_7::clientbound::DISPLAY_SCOREBOARD)
            .handler(display),
    );

    // String team, Byte mode, [display, prefix, suffix, Byte friendly fire,
    // String name tag visibility, Byte color], [StringArray players]
    clientbound(
        pipeline,
        v1_8::clientbound::TEAMS,
        PacketMapping::new()
            .map_id(v1_7::clientbound::TEAMS)
            .handler(teams),
    );
}

fn truncated(packet: &Packet, index: usize, max: usize) -> Result<String, RewindError> {
    Ok(truncate_chars(packet.string_at(index)?, max))
}

fn objective(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    let name = truncated(ctx.packet, 0, MAX_NAME_LEN)?;
    let mode = ctx.packet.byte_at(1)?;
    let viewer = ctx.session.username().to_owned();
    let scoreboard = ctx.session.get::<Scoreboard>();

    let mut sidebar = None;
    match mode {
        OBJECTIVE_CREATE => {
            if scoreboard.objective_exists(&name) {
                ctx.cancel();
                return Ok(());
            }
            scoreboard.add_objective(name.clone());
        }
        OBJECTIVE_REMOVE => {
            if !scoreboard.objective_exists(&name) {
                ctx.cancel();
                return Ok(());
            }
            let shown_by_color = scoreboard.has_color_sidebar(&viewer)
                && scoreboard.viewer_sidebar(&viewer) == Some(name.as_str());
            scoreboard.remove_objective(&name);
            if shown_by_color {
                sidebar = Some(sidebar_packet(scoreboard.viewer_sidebar(&viewer)));
            }
        }
        OBJECTIVE_UPDATE => {
            if !scoreboard.objective_exists(&name) {
                ctx.cancel();
                return Ok(());
            }
        }
        other => {
            warn!("Unknown scoreboard objective mode {other} for \"{name}\"");
            ctx.cancel();
            return Ok(());
        }
    }

    let display_name = if mode == OBJECTIVE_REMOVE {
        String::new()
    } else {
        truncated(ctx.packet, 2, MAX_DISPLAY_NAME_LEN)?
    };
    ctx.packet.fields = vec![
        FieldValue::String(name),
        FieldValue::String(display_name),
        FieldValue::Byte(mode),
    ];
    if let Some(packet) = sidebar {
        ctx.emit_before(packet);
    }
    Ok(())
}

fn score(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    let holder = ctx.packet.string_at(0)?.clone();
    let action = ctx.packet.integer_at(1)?;

    let scoreboard = ctx.session.get::<Scoreboard>();
    let holder = if action == SCORE_REMOVE {
        match scoreboard.remove_team_for_score(&holder) {
            Some(team) => {
                ctx.outbox.after.push(team_removal_packet(&team.name));
                team.name
            }
            None => fit_score_name(&holder),
        }
    } else {
        match scoreboard.team_for_score(&holder) {
            Some((team, created)) => {
                if created {
                    ctx.outbox.before.push(score_team_packet(&team));
                }
                team.name
            }
            None => fit_score_name(&holder),
        }
    };

    let mut fields = vec![FieldValue::String(holder), FieldValue::Byte(action as i8)];
    if action != SCORE_REMOVE {
        let objective = truncated(ctx.packet, 2, MAX_NAME_LEN)?;
        let value = ctx.packet.integer_at(3)?;
        fields.push(FieldValue::String(objective));
        fields.push(FieldValue::Int(value));
    }
    ctx.packet.fields = fields;
    Ok(())
}

fn display(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    let position = ctx.packet.byte_at(0)?;
    let name = truncated(ctx.packet, 1, MAX_NAME_LEN)?;
    let viewer = ctx.session.username().to_owned();
    let scoreboard = ctx.session.get::<Scoreboard>();

    let (shown, slot) = if position >= FIRST_COLOR_SLOT {
        let color = position - FIRST_COLOR_SLOT;
        scoreboard.set_color_dependent_sidebar(color, name.clone());
        (scoreboard.player_team_color(&viewer) == Some(color), SIDEBAR_SLOT)
    } else if position == SIDEBAR_SLOT {
        scoreboard.set_color_independent_sidebar(name.clone());
        (!scoreboard.has_color_sidebar(&viewer), SIDEBAR_SLOT)
    } else {
        (true, position)
    };

    if !shown {
        ctx.cancel();
        return Ok(());
    }
    ctx.packet.fields = vec![FieldValue::Byte(slot), FieldValue::String(name)];
    Ok(())
}

fn teams(ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
    let team = ctx.packet.string_at(0)?.clone();
    let mode = ctx.packet.byte_at(1)?;
    if !(TEAM_CREATE..=TEAM_REMOVE_PLAYERS).contains(&mode) {
        warn!("Unknown team mode {mode} for \"{team}\"");
        ctx.cancel();
        return Ok(());
    }

    let viewer = ctx.session.username().to_owned();
    let scoreboard = ctx.session.get::<Scoreboard>();
    let exists = scoreboard.team_exists(&team);
    if mode != TEAM_CREATE && !exists {
        ctx.cancel();
        return Ok(());
    }

    let mut before = Vec::new();
    let mut viewer_affected = false;
    let mut fields = vec![FieldValue::String(team.clone()), FieldValue::Byte(mode)];

    match mode {
        TEAM_CREATE => {
            if exists {
                viewer_affected |= scoreboard.is_player_in_team(&viewer, &team);
                scoreboard.remove_team(&team);
                before.push(team_removal_packet(&team));
            }
            scoreboard.add_team(team.clone());
        }
        TEAM_REMOVE => {
            viewer_affected |= scoreboard.is_player_in_team(&viewer, &team);
            scoreboard.remove_team(&team);
        }
        _ => {}
    }

    if mode == TEAM_CREATE || mode == TEAM_UPDATE {
        let display_name = truncated(ctx.packet, 2, MAX_DISPLAY_NAME_LEN)?;
        let prefix = truncated(ctx.packet, 3, MAX_NAME_LEN)?;
        let suffix = truncated(ctx.packet, 4, MAX_NAME_LEN)?;
        let friendly_fire = ctx.packet.byte_at(5)?;
        // 6 is name tag visibility, unknown to 1.7
        let color = ctx.packet.byte_at(7)?;

        if scoreboard.is_player_in_team(&viewer, &team) && scoreboard.team_color(&team) != Some(color) {
            viewer_affected = true;
        }
        scoreboard.set_team_color(&team, color);

        fields.extend([
            FieldValue::String(display_name),
            FieldValue::String(prefix),
            FieldValue::String(suffix),
            FieldValue::Byte(friendly_fire),
        ]);
    }

    if matches!(mode, TEAM_CREATE | TEAM_ADD_PLAYERS | TEAM_REMOVE_PLAYERS) {
        let index = if mode == TEAM_CREATE { 8 } else { 2 };
        let mut players = Vec::new();
        for player in ctx.packet.string_array_at(index)? {
            if mode == TEAM_REMOVE_PLAYERS {
                if !scoreboard.is_player_in_team(player, &team) {
                    continue;
                }
                scoreboard.remove_player_from_team(player, &team);
            } else {
                scoreboard.add_player_to_team(player, &team);
            }
            viewer_affected |= *player == viewer;
            players.push(player.clone());
        }
        fields.push(FieldValue::StringArray(players));
    }

    let sidebar = viewer_affected.then(|| sidebar_packet(scoreboard.viewer_sidebar(&viewer)));

    ctx.packet.fields = fields;
    ctx.outbox.before.extend(before);
    if let Some(packet) = sidebar {
        ctx.emit_after(packet);
    }
    Ok(())
}
