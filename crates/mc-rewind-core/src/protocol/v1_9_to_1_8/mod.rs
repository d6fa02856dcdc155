//! 1.9 server, 1.8 client.

mod entity;
mod player;
mod spawn;
mod vehicle;

use crate::pipeline::{PacketDescriptor, PacketMapping, Pipeline};
use crate::protocol::ProtocolPair;

const PAIR: ProtocolPair = ProtocolPair::V1_9To1_8;

pub fn register(pipeline: &mut Pipeline) {
    spawn::register(pipeline);
    entity::register(pipeline);
    player::register(pipeline);
    vehicle::register(pipeline);
}

fn clientbound(pipeline: &mut Pipeline, id: i32, mapping: PacketMapping) {
    pipeline.register(PacketDescriptor::clientbound(PAIR, id), mapping);
}

fn serverbound(pipeline: &mut Pipeline, id: i32, mapping: PacketMapping) {
    pipeline.register(PacketDescriptor::serverbound(PAIR, id), mapping);
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
        let packet = Packet::clientbound(id, Revision::V1_9, fields);
        pipeline.process(packet, session).unwrap()
    }
}
