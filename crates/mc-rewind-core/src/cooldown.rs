//! 1.9 attack cooldown shown to 1.8 clients.
//!
//! 1.8 has no cooldown bar, so the session tracks the viewer's attack speed
//! and last swing and draws the progress with whatever indicator the config
//! asks for.

use std::time::Instant;

use mc_rewind_proto::packets::{v1_8, v1_9};
use mc_rewind_proto::{AttributeModifier, FieldValue, Packet, Revision};
use tracing::trace;

use crate::config::CooldownIndicator;
use crate::error::RewindError;
use crate::session::{SessionInfo, StoredObject};

/// Attack speed of a bare hand.
pub const DEFAULT_ATTACK_SPEED: f64 = 4.0;

const SYMBOLS: usize = 10;

// title actions
const TITLE_SET: i32 = 0;
const TITLE_SUBTITLE: i32 = 1;
const TITLE_TIMES: i32 = 2;
const TITLE_HIDE: i32 = 3;

// boss bar actions
const BOSS_BAR_ADD: i32 = 0;
const BOSS_BAR_REMOVE: i32 = 1;
const BOSS_BAR_HEALTH: i32 = 2;

/// Chat position of the action bar.
const ACTION_BAR_POSITION: i8 = 2;

#[derive(Debug)]
pub struct Cooldown {
    attack_speed: f64,
    last_hit: Option<Instant>,
    indicator: CooldownIndicator,
    boss_bar: Option<u128>,
    shown: bool,
}

impl StoredObject for Cooldown {
    fn create(info: &SessionInfo) -> Self {
        Self::new(info.config.cooldown_indicator)
    }

    fn tick(&mut self, now: Instant, out: &mut Vec<Packet>) -> Result<(), RewindError> {
        if self.has_cooldown(now) {
            self.show(now, out);
            self.shown = true;
        } else if self.shown {
            self.hide(out);
            self.shown = false;
        }
        Ok(())
    }
}

impl Cooldown {
    pub fn new(indicator: CooldownIndicator) -> Self {
        Self {
            attack_speed: DEFAULT_ATTACK_SPEED,
            last_hit: None,
            indicator,
            boss_bar: None,
            shown: false,
        }
    }

    pub fn attack_speed(&self) -> f64 {
        self.attack_speed
    }

    pub fn indicator(&self) -> CooldownIndicator {
        self.indicator
    }

    /// Recompute the attack speed. Modifiers apply by operation: flat
    /// additions, then additions of a multiple of `base`, then multipliers.
    pub fn set_attack_speed(&mut self, base: f64, modifiers: &[AttributeModifier]) {
        let sum = |op: i8| modifiers.iter().filter(move |m| m.operation == op).map(|m| m.amount);

        let mut speed = base + sum(0).sum::<f64>();
        speed += sum(1).map(|v| base * v).sum::<f64>();
        for v in sum(2) {
            speed *= 1.0 + v;
        }
        trace!("Attack speed {} -> {speed}", self.attack_speed);
        self.attack_speed = speed;
    }

    pub fn hit(&mut self, now: Instant) {
        self.last_hit = Some(now);
    }

    fn progress(&self, now: Instant, max: f64) -> f64 {
        match self.last_hit {
            Some(hit) => {
                let elapsed = now.saturating_duration_since(hit).as_millis() as f64;
                (elapsed * self.attack_speed / 1000.0).clamp(0.0, max)
            }
            None => max,
        }
    }

    /// Whether the indicator should be visible.
    pub fn has_cooldown(&self, now: Instant) -> bool {
        let progress = self.progress(now, 1.5);
        progress > 0.1 && progress < 1.1
    }

    /// Recharge progress in `[0, 1]`.
    pub fn cooldown(&self, now: Instant) -> f64 {
        self.progress(now, 1.0)
    }

    fn show(&mut self, now: Instant, out: &mut Vec<Packet>) {
        let cooldown = self.cooldown(now);
        match self.indicator {
            CooldownIndicator::Disabled => {}
            CooldownIndicator::Title => {
                let bar = progress_bar(cooldown, '˙');
                out.push(title(vec![FieldValue::VarInt(TITLE_SET), chat("")]));
                out.push(title(vec![FieldValue::VarInt(TITLE_SUBTITLE), chat(&bar)]));
                out.push(title(vec![
                    FieldValue::VarInt(TITLE_TIMES),
                    FieldValue::Int(0),
                    FieldValue::Int(2),
                    FieldValue::Int(5),
                ]));
            }
            CooldownIndicator::ActionBar => out.push(action_bar(&progress_bar(cooldown, '■'))),
            CooldownIndicator::BossBar => {
                let health = FieldValue::Float(cooldown as f32);
                let packet = match self.boss_bar {
                    Some(uuid) => boss_bar(vec![
                        FieldValue::Uuid(uuid),
                        FieldValue::VarInt(BOSS_BAR_HEALTH),
                        health,
                    ]),
                    None => {
                        let uuid = rand::random::<u128>();
                        self.boss_bar = Some(uuid);
                        boss_bar(vec![
                            FieldValue::Uuid(uuid),
                            FieldValue::VarInt(BOSS_BAR_ADD),
                            chat(" "),
                            health,
                            FieldValue::VarInt(0),
                            FieldValue::VarInt(0),
                            FieldValue::UByte(0),
                        ])
                    }
                };
                out.push(packet);
            }
        }
    }

    fn hide(&mut self, out: &mut Vec<Packet>) {
        match self.indicator {
            CooldownIndicator::Disabled => {}
            CooldownIndicator::Title => out.push(title(vec![FieldValue::VarInt(TITLE_HIDE)])),
            CooldownIndicator::ActionBar => out.push(action_bar("§r")),
            CooldownIndicator::BossBar => {
                if let Some(uuid) = self.boss_bar.take() {
                    out.push(boss_bar(vec![
                        FieldValue::Uuid(uuid),
                        FieldValue::VarInt(BOSS_BAR_REMOVE),
                    ]));
                }
            }
        }
    }
}

/// `§8` recharged symbols followed by `§7` remaining ones.
fn progress_bar(cooldown: f64, symbol: char) -> String {
    let done = ((SYMBOLS as f64 * cooldown).floor() as usize).min(SYMBOLS);
    let mut bar = String::from("§8");
    bar.extend(std::iter::repeat(symbol).take(done));
    bar.push_str("§7");
    bar.extend(std::iter::repeat(symbol).take(SYMBOLS - done));
    bar
}

/// A plain-text chat component.
fn chat(text: &str) -> FieldValue {
    FieldValue::String(serde_json::Value::String(text.to_owned()).to_string())
}

fn title(fields: Vec<FieldValue>) -> Packet {
    Packet::clientbound(v1_8::clientbound::TITLE, Revision::V1_8, fields)
}

fn action_bar(text: &str) -> Packet {
    Packet::clientbound(
        v1_8::clientbound::CHAT_MESSAGE,
        Revision::V1_8,
        vec![chat(text), FieldValue::Byte(ACTION_BAR_POSITION)],
    )
}

/// A 1.9 boss bar packet, left for the embedder's boss bar emulation.
fn boss_bar(fields: Vec<FieldValue>) -> Packet {
    Packet::clientbound(v1_9::clientbound::BOSS_BAR, Revision::V1_9, fields)
}
