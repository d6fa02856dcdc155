//! 1.8 server, 1.7 client.
//!
//! 1.7 shares most packet ids with 1.8, so mappings here rarely change the
//! id. They reshape fields instead: entity ids become plain ints, on-ground
//! flags disappear, chunks go back to split id/meta arrays.

mod entity;
mod scoreboard;
mod world;

use crate::pipeline::{PacketDescriptor, PacketMapping, Pipeline};
use crate::protocol::ProtocolPair;

const PAIR: ProtocolPair = ProtocolPair::V1_8To1_7;

pub fn register(pipeline: &mut Pipeline) {
    world::register(pipeline);
    scoreboard::register(pipeline);
    entity::register(pipeline);
}

fn clientbound(pipeline: &mut Pipeline, id: i32, mapping: PacketMapping) {
    pipeline.register(PacketDescriptor::clientbound(PAIR, id), mapping);
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use mc_rewind_proto::{FieldValue, Packet, Revision};

    use crate::config::RewindConfig;
    use crate::pipeline::{Outcome, Pipeline};
    use crate::session::Session;
    use crate::tables::Tables;

    use super::PAIR;

    pub fn setup() -> (Pipeline, Session) {
        let mut pipeline = Pipeline::new(Arc::new(Tables::new()));
        super::register(&mut pipeline);
        let session = Session::new(PAIR, "Steve", Arc::new(RewindConfig::default()));
        (pipeline, session)
    }

    pub fn send(pipeline: &Pipeline, session: &mut Session, id: i32, fields: Vec<FieldValue>) -> Outcome {
        let packet = Packet::clientbound(id, Revision::V1_8, fields);
        pipeline.process(packet, session).unwrap()
    }
}
