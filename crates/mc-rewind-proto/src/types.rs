//! Base data types used by the Java Edition protocol.

use std::fmt;

use bytes::{Buf, BufMut};
use thiserror::Error;

use crate::codec::{ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum VarIntError {
    #[error("buffer too short")]
    BufferTooShort,
    #[error("VarInt is too long (more than {max_bytes} bytes)")]
    TooManyBytes { max_bytes: usize },
}

// ---------------------------------------------------------------------------
// VarInt (i32 as its two's complement bit pattern, LEB128)
// ---------------------------------------------------------------------------

/// Java Edition VarInt. Unlike the Bedrock flavour there is no ZigZag step:
/// negative values always take the full five bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarInt(pub i32);

impl VarInt {
    /// Maximum bytes a VarInt can occupy.
    pub const MAX_BYTES: usize = 5;

    /// Number of bytes this value occupies on the wire.
    pub fn written_len(&self) -> usize {
        let mut value = self.0 as u32;
        let mut len = 1;
        while value & !0x7F != 0 {
            value >>= 7;
            len += 1;
        }
        len
    }

    /// Encode into the provided buffer and return the number of bytes written.
    pub fn encode(&self, buf: &mut Vec<u8>) -> usize {
        let mut value = self.0 as u32;
        let mut written = 0;
        loop {
            written += 1;
            if value & !0x7F == 0 {
                buf.push(value as u8);
                return written;
            }
            buf.push((value & 0x7F | 0x80) as u8);
            value >>= 7;
        }
    }

    /// Decode from a byte slice. Returns the value and the number of bytes consumed.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize), VarIntError> {
        let mut result: u32 = 0;
        for (i, &byte) in buf.iter().enumerate() {
            if i >= Self::MAX_BYTES {
                return Err(VarIntError::TooManyBytes {
                    max_bytes: Self::MAX_BYTES,
                });
            }
            result |= ((byte & 0x7F) as u32) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok((VarInt(result as i32), i + 1));
            }
        }
        Err(VarIntError::BufferTooShort)
    }
}

impl ProtoEncode for VarInt {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        let mut value = self.0 as u32;
        loop {
            if value & !0x7F == 0 {
                buf.put_u8(value as u8);
                return;
            }
            buf.put_u8((value & 0x7F | 0x80) as u8);
            value >>= 7;
        }
    }
}

impl ProtoDecode for VarInt {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let mut result: u32 = 0;
        for i in 0..Self::MAX_BYTES {
            if !buf.has_remaining() {
                return Err(VarIntError::BufferTooShort.into());
            }
            let byte = buf.get_u8();
            result |= ((byte & 0x7F) as u32) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(VarInt(result as i32));
            }
        }
        Err(VarIntError::TooManyBytes {
            max_bytes: Self::MAX_BYTES,
        }
        .into())
    }
}

impl From<i32> for VarInt {
    fn from(v: i32) -> Self {
        VarInt(v)
    }
}

impl From<VarInt> for i32 {
    fn from(v: VarInt) -> Self {
        v.0
    }
}

impl fmt::Debug for VarInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VarInt({})", self.0)
    }
}

impl fmt::Display for VarInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// BlockPos
// ---------------------------------------------------------------------------

/// Integer block coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}
