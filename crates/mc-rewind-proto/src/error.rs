//! Protocol-level errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("buffer too short: need {needed} more bytes, have {remaining}")]
    BufferTooShort { needed: usize, remaining: usize },

    #[error("VarInt encoding error: {0}")]
    VarInt(#[from] crate::types::VarIntError),

    #[error("invalid UTF-8 string")]
    InvalidUtf8,

    #[error("string too long: {len} characters, limit is {max}")]
    StringTooLong { len: usize, max: usize },

    #[error("negative length: {0}")]
    NegativeLength(i32),

    #[error("decompression error: {0}")]
    DecompressError(String),

    #[error("compression error: {0}")]
    CompressError(String),

    #[error("packet has no field #{index}")]
    MissingField { index: usize },

    #[error("field #{index}: expected {expected}, found {found}")]
    FieldKind {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid data: {0}")]
    InvalidData(String),
}
