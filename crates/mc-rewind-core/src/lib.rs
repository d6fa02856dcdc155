//! Translation engine serving legacy Java Edition clients from newer servers.
//!
//! A [`Pipeline`] holds the packet mappings of every [`ProtocolPair`]. Each
//! connection owns a [`Session`] whose stored objects (entity tracker,
//! scoreboard, client world, cooldown, levitation) carry the state the mappings need.
//! The [`ticker`] drives the per-session objects that act on their own time.

pub mod chunk;
pub mod config;
pub mod cooldown;
pub mod entity;
pub mod error;
pub mod levitation;
pub mod metadata;
pub mod movement;
pub mod pipeline;
pub mod protocol;
pub mod scoreboard;
pub mod session;
pub mod tables;
pub mod ticker;

pub use config::{CooldownIndicator, RewindConfig};
pub use error::RewindError;
pub use pipeline::{Outcome, Pipeline};
pub use protocol::{build_pipeline, ProtocolPair};
pub use session::{Session, SessionId, SessionRegistry};
pub use tables::Tables;
pub use ticker::spawn_ticker;
