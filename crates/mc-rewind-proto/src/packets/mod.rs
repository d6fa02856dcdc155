//! Packet ids of the play state, per revision.
//!
//! Only packets the translation engine reads, rewrites or synthesizes are
//! listed; anything else passes through under its own id.

/// 1.9 (protocol 107).
pub mod v1_9 {
    pub mod clientbound {
        pub const SPAWN_OBJECT: i32 = 0x00;
        pub const SPAWN_EXPERIENCE_ORB: i32 = 0x01;
        pub const SPAWN_GLOBAL_ENTITY: i32 = 0x02;
        pub const SPAWN_MOB: i32 = 0x03;
        pub const SPAWN_PAINTING: i32 = 0x04;
        pub const SPAWN_PLAYER: i32 = 0x05;
        pub const BOSS_BAR: i32 = 0x0C;
        pub const CHAT_MESSAGE: i32 = 0x0F;
        pub const ENTITY_STATUS: i32 = 0x1B;
        pub const CHUNK_DATA: i32 = 0x20;
        pub const JOIN_GAME: i32 = 0x23;
        pub const ENTITY_POSITION: i32 = 0x25;
        pub const ENTITY_POSITION_AND_ROTATION: i32 = 0x26;
        pub const ENTITY_ROTATION: i32 = 0x27;
        pub const ENTITY_MOVEMENT: i32 = 0x28;
        pub const VEHICLE_MOVE: i32 = 0x29;
        pub const DESTROY_ENTITIES: i32 = 0x30;
        pub const REMOVE_ENTITY_EFFECT: i32 = 0x31;
        pub const RESPAWN: i32 = 0x33;
        pub const ENTITY_HEAD_LOOK: i32 = 0x34;
        pub const DISPLAY_SCOREBOARD: i32 = 0x38;
        pub const ENTITY_METADATA: i32 = 0x39;
        pub const ATTACH_ENTITY: i32 = 0x3A;
        pub const ENTITY_VELOCITY: i32 = 0x3B;
        pub const ENTITY_EQUIPMENT: i32 = 0x3C;
        pub const SCOREBOARD_OBJECTIVE: i32 = 0x3F;
        pub const SET_PASSENGERS: i32 = 0x40;
        pub const TEAMS: i32 = 0x41;
        pub const UPDATE_SCORE: i32 = 0x42;
        pub const TITLE: i32 = 0x45;
        pub const ENTITY_TELEPORT: i32 = 0x4A;
        pub const ENTITY_PROPERTIES: i32 = 0x4B;
        pub const ENTITY_EFFECT: i32 = 0x4C;
    }

    pub mod serverbound {
        pub const ANIMATION: i32 = 0x1A;
    }
}

/// 1.8.x (protocol 47).
pub mod v1_8 {
    pub mod clientbound {
        pub const JOIN_GAME: i32 = 0x01;
        pub const CHAT_MESSAGE: i32 = 0x02;
        pub const ENTITY_EQUIPMENT: i32 = 0x04;
        pub const RESPAWN: i32 = 0x07;
        pub const SPAWN_PLAYER: i32 = 0x0C;
        pub const SPAWN_OBJECT: i32 = 0x0E;
        pub const SPAWN_MOB: i32 = 0x0F;
        pub const SPAWN_PAINTING: i32 = 0x10;
        pub const SPAWN_EXPERIENCE_ORB: i32 = 0x11;
        pub const ENTITY_VELOCITY: i32 = 0x12;
        pub const DESTROY_ENTITIES: i32 = 0x13;
        pub const ENTITY_RELATIVE_MOVE: i32 = 0x15;
        pub const ENTITY_LOOK: i32 = 0x16;
        pub const ENTITY_LOOK_AND_RELATIVE_MOVE: i32 = 0x17;
        pub const ENTITY_TELEPORT: i32 = 0x18;
        pub const ENTITY_HEAD_LOOK: i32 = 0x19;
        pub const ENTITY_STATUS: i32 = 0x1A;
        pub const ATTACH_ENTITY: i32 = 0x1B;
        pub const ENTITY_METADATA: i32 = 0x1C;
        pub const ENTITY_EFFECT: i32 = 0x1D;
        pub const REMOVE_ENTITY_EFFECT: i32 = 0x1E;
        pub const ENTITY_PROPERTIES: i32 = 0x20;
        pub const CHUNK_DATA: i32 = 0x21;
        pub const MAP_CHUNK_BULK: i32 = 0x26;
        pub const SPAWN_GLOBAL_ENTITY: i32 = 0x2C;
        pub const SCOREBOARD_OBJECTIVE: i32 = 0x3B;
        pub const UPDATE_SCORE: i32 = 0x3C;
        pub const DISPLAY_SCOREBOARD: i32 = 0x3D;
        pub const TEAMS: i32 = 0x3E;
        pub const TITLE: i32 = 0x45;
    }

    pub mod serverbound {
        pub const ANIMATION: i32 = 0x0A;
    }
}

/// 1.7.6 - 1.7.10 (protocol 5). Ids match 1.8 for every packet both share.
pub mod v1_7 {
    pub mod clientbound {
        pub use crate::packets::v1_8::clientbound::{
            CHAT_MESSAGE, CHUNK_DATA, DESTROY_ENTITIES, DISPLAY_SCOREBOARD, ENTITY_HEAD_LOOK,
            ENTITY_LOOK, ENTITY_LOOK_AND_RELATIVE_MOVE, ENTITY_METADATA, ENTITY_RELATIVE_MOVE,
            ENTITY_TELEPORT, JOIN_GAME, MAP_CHUNK_BULK, RESPAWN, SCOREBOARD_OBJECTIVE,
            SPAWN_MOB, SPAWN_OBJECT, SPAWN_PLAYER, TEAMS, UPDATE_SCORE,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_ids_line_up() {
        assert_eq!(v1_7::clientbound::CHUNK_DATA, 0x21);
        assert_eq!(v1_7::clientbound::TEAMS, v1_8::clientbound::TEAMS);
        assert_ne!(v1_9::clientbound::TEAMS, v1_8::clientbound::TEAMS);
    }
}
