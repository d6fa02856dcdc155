//! Packet transformation pipeline.
//!
//! Every rewrite is registered as data: a [`PacketDescriptor`] names the
//! packet as it arrives, a [`PacketMapping`] lists the steps to run on its
//! fields. Steps run in order, each seeing the mutations of the previous
//! ones, and any of them may cancel the packet or queue synthetic packets
//! around it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use mc_rewind_proto::{Direction, FieldValue, Packet, ProtoError};
use tracing::trace;

use crate::error::RewindError;
use crate::protocol::ProtocolPair;
use crate::session::Session;
use crate::tables::Tables;

/// Identifies a packet as delivered to the pipeline: newer ids for
/// clientbound traffic, legacy ids for serverbound traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PacketDescriptor {
    pub pair: ProtocolPair,
    pub direction: Direction,
    pub id: i32,
}

impl PacketDescriptor {
    pub fn clientbound(pair: ProtocolPair, id: i32) -> Self {
        Self {
            pair,
            direction: Direction::Clientbound,
            id,
        }
    }

    pub fn serverbound(pair: ProtocolPair, id: i32) -> Self {
        Self {
            pair,
            direction: Direction::Serverbound,
            id,
        }
    }
}

pub type ConvertFn = fn(&FieldValue) -> Option<FieldValue>;
pub type HandlerFn = fn(&mut PacketContext<'_>) -> Result<(), RewindError>;

/// One step of a packet mapping.
#[derive(Clone)]
pub enum TransformStep {
    /// Keep the field as is. Fails if it is missing.
    Passthrough(usize),
    /// Replace a field by a converted value. `None` from `convert` is an error.
    Convert { index: usize, convert: ConvertFn },
    Insert { index: usize, value: FieldValue },
    Remove(usize),
    /// Arbitrary logic with access to the session.
    Handler(HandlerFn),
}

impl TransformStep {
    fn apply(&self, ctx: &mut PacketContext<'_>) -> Result<(), RewindError> {
        match self {
            Self::Passthrough(index) => {
                ctx.packet.field(*index)?;
            }
            Self::Convert { index, convert } => {
                let field = ctx.packet.field(*index)?;
                let converted = convert(field).ok_or_else(|| {
                    ProtoError::InvalidData(format!(
                        "field #{index}: cannot convert {}",
                        field.kind()
                    ))
                })?;
                ctx.packet.set(*index, converted)?;
            }
            Self::Insert { index, value } => ctx.packet.insert(*index, value.clone())?,
            Self::Remove(index) => {
                ctx.packet.remove(*index)?;
            }
            Self::Handler(handler) => handler(ctx)?,
        }
        Ok(())
    }
}

/// Output id and step list of a registered packet.
#[derive(Clone, Default)]
pub struct PacketMapping {
    pub target_id: Option<i32>,
    pub steps: Vec<TransformStep>,
}

impl PacketMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward under another id.
    pub fn map_id(mut self, id: i32) -> Self {
        self.target_id = Some(id);
        self
    }

    pub fn passthrough(mut self, index: usize) -> Self {
        self.steps.push(TransformStep::Passthrough(index));
        self
    }

    pub fn convert(mut self, index: usize, convert: ConvertFn) -> Self {
        self.steps.push(TransformStep::Convert { index, convert });
        self
    }

    pub fn insert(mut self, index: usize, value: FieldValue) -> Self {
        self.steps.push(TransformStep::Insert { index, value });
        self
    }

    pub fn remove(mut self, index: usize) -> Self {
        self.steps.push(TransformStep::Remove(index));
        self
    }

    pub fn handler(mut self, handler: HandlerFn) -> Self {
        self.steps.push(TransformStep::Handler(handler));
        self
    }
}

/// Synthetic packets queued around the packet being transformed.
#[derive(Debug, Default)]
pub struct Outbox {
    pub before: Vec<Packet>,
    pub after: Vec<Packet>,
}

/// What a step sees while it runs.
pub struct PacketContext<'a> {
    pub packet: &'a mut Packet,
    pub session: &'a mut Session,
    pub tables: &'a Tables,
    pub outbox: Outbox,
    pub now: Instant,
    cancelled: bool,
}

impl PacketContext<'_> {
    /// Drop the packet. Remaining steps are skipped; queued packets are still sent.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn emit_before(&mut self, packet: Packet) {
        self.outbox.before.push(packet);
    }

    pub fn emit_after(&mut self, packet: Packet) {
        self.outbox.after.push(packet);
    }
}

/// Result of processing one packet.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Forward {
        packet: Packet,
        before: Vec<Packet>,
        after: Vec<Packet>,
    },
    /// The packet was dropped; `emitted` still has to be sent.
    Cancelled { emitted: Vec<Packet> },
}

impl Outcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Everything to send, in wire order.
    pub fn into_packets(self) -> Vec<Packet> {
        match self {
            Self::Forward {
                packet,
                mut before,
                after,
            } => {
                before.push(packet);
                before.extend(after);
                before
            }
            Self::Cancelled { emitted } => emitted,
        }
    }
}

pub struct Pipeline {
    tables: Arc<Tables>,
    mappings: HashMap<PacketDescriptor, PacketMapping>,
}

impl Pipeline {
    pub fn new(tables: Arc<Tables>) -> Self {
        Self {
            tables,
            mappings: HashMap::new(),
        }
    }

    /// Register a mapping. A second registration for the same descriptor replaces the first.
    pub fn register(&mut self, descriptor: PacketDescriptor, mapping: PacketMapping) {
        if self.mappings.insert(descriptor, mapping).is_some() {
            trace!("Replaced mapping for {descriptor:?}");
        }
    }

    pub fn is_registered(&self, descriptor: &PacketDescriptor) -> bool {
        self.mappings.contains_key(descriptor)
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    pub fn process(&self, packet: Packet, session: &mut Session) -> Result<Outcome, RewindError> {
        self.process_at(packet, session, Instant::now())
    }

    /// Transform `packet` for the other side of the session's pair.
    ///
    /// Unregistered packets keep their id and fields and are only retagged
    /// with the output revision.
    pub fn process_at(
        &self,
        mut packet: Packet,
        session: &mut Session,
        now: Instant,
    ) -> Result<Outcome, RewindError> {
        let pair = session.pair();
        let descriptor = PacketDescriptor {
            pair,
            direction: packet.direction,
            id: packet.id,
        };
        let output_revision = match packet.direction {
            Direction::Clientbound => pair.legacy(),
            Direction::Serverbound => pair.newer(),
        };

        let Some(mapping) = self.mappings.get(&descriptor) else {
            packet.revision = output_revision;
            return Ok(Outcome::Forward {
                packet,
                before: Vec::new(),
                after: Vec::new(),
            });
        };

        let mut ctx = PacketContext {
            packet: &mut packet,
            session,
            tables: &self.tables,
            outbox: Outbox::default(),
            now,
            cancelled: false,
        };
        for step in &mapping.steps {
            step.apply(&mut ctx)?;
            if ctx.cancelled {
                break;
            }
        }
        let PacketContext {
            outbox, cancelled, ..
        } = ctx;

        if cancelled {
            trace!("Cancelled {descriptor:?}");
            let mut emitted = outbox.before;
            emitted.extend(outbox.after);
            return Ok(Outcome::Cancelled { emitted });
        }

        if let Some(id) = mapping.target_id {
            packet.id = id;
        }
        packet.revision = output_revision;
        Ok(Outcome::Forward {
            packet,
            before: outbox.before,
            after: outbox.after,
        })
    }
}
