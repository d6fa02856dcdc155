//! Levitation for 1.8 clients, which lack the effect.
//!
//! While the viewer levitates, every tick pushes them upward with a velocity
//! scaled by the effect's amplifier.

use std::time::Instant;

use mc_rewind_proto::packets::v1_8;
use mc_rewind_proto::{FieldValue, Packet, Revision};

use crate::error::RewindError;
use crate::session::{SessionInfo, StoredObject};

/// Effect id of levitation in 1.9.
pub const LEVITATION_EFFECT: i8 = 25;

/// Upward velocity per amplifier level, in 1/8000 of a block per tick.
const VELOCITY_PER_LEVEL: i32 = 360;

#[derive(Debug, Default)]
pub struct Levitation {
    /// Viewer id and amplifier while active.
    active: Option<(i32, i8)>,
}

impl StoredObject for Levitation {
    fn create(_info: &SessionInfo) -> Self {
        Self::default()
    }

    fn tick(&mut self, _now: Instant, out: &mut Vec<Packet>) -> Result<(), RewindError> {
        let Some((player_id, amplifier)) = self.active else {
            return Ok(());
        };
        let velocity = (amplifier as i32 + 1) * VELOCITY_PER_LEVEL;
        out.push(Packet::clientbound(
            v1_8::clientbound::ENTITY_VELOCITY,
            Revision::V1_8,
            vec![
                FieldValue::VarInt(player_id),
                FieldValue::Short(0),
                FieldValue::Short(velocity.clamp(i16::MIN as i32, i16::MAX as i32) as i16),
                FieldValue::Short(0),
            ],
        ));
        Ok(())
    }
}

impl Levitation {
    pub fn start(&mut self, player_id: i32, amplifier: i8) {
        self.active = Some((player_id, amplifier));
    }

    pub fn stop(&mut self) {
        self.active = None;
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}
