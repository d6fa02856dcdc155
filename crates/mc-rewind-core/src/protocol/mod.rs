//! Protocol pairs and their packet registrations.

pub mod v1_8_to_1_7;
pub mod v1_9_to_1_8;

use std::sync::Arc;

use mc_rewind_proto::{FieldValue, Revision};

use crate::pipeline::Pipeline;
use crate::tables::Tables;

/// A newer revision translated down to a legacy one. A session serves exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolPair {
    V1_9To1_8,
    V1_8To1_7,
}

impl ProtocolPair {
    /// Revision the server speaks.
    pub fn newer(self) -> Revision {
        match self {
            Self::V1_9To1_8 => Revision::V1_9,
            Self::V1_8To1_7 => Revision::V1_8,
        }
    }

    /// Revision the client speaks.
    pub fn legacy(self) -> Revision {
        match self {
            Self::V1_9To1_8 => Revision::V1_8,
            Self::V1_8To1_7 => Revision::V1_7,
        }
    }
}

/// A pipeline with every pair registered.
pub fn build_pipeline(tables: Arc<Tables>) -> Pipeline {
    let mut pipeline = Pipeline::new(tables);
    v1_9_to_1_8::register(&mut pipeline);
    v1_8_to_1_7::register(&mut pipeline);
    pipeline
}

// ---------------------------------------------------------------------------
// Field conversions shared by the registrations
// ---------------------------------------------------------------------------

/// Blocks to 1/32 fixed point.
pub fn to_fixed(value: f64) -> i32 {
    (value * 32.0) as i32
}

/// Degrees to a 1/256 turn angle byte.
pub fn to_angle(degrees: f32) -> i8 {
    (degrees * 256.0 / 360.0) as i32 as i8
}

pub fn from_angle(angle: i8) -> f32 {
    angle as f32 * 360.0 / 256.0
}

pub(crate) fn double_to_fixed(value: &FieldValue) -> Option<FieldValue> {
    match value {
        FieldValue::Double(v) => Some(FieldValue::Int(to_fixed(*v))),
        _ => None,
    }
}

pub(crate) fn byte_to_ubyte(value: &FieldValue) -> Option<FieldValue> {
    match value {
        FieldValue::Byte(v) => Some(FieldValue::UByte(*v as u8)),
        _ => None,
    }
}

pub(crate) fn varint_to_int(value: &FieldValue) -> Option<FieldValue> {
    match value {
        FieldValue::VarInt(v) => Some(FieldValue::Int(*v)),
        _ => None,
    }
}
