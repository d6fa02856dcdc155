//! Protocol encoding/decoding traits and helpers.

use bytes::{Buf, BufMut};

use crate::error::ProtoError;
use crate::types::VarInt;

/// Longest string the Java protocol allows, in UTF-16 code units.
pub const MAX_STRING_LEN: usize = 32767;

/// Encode a value onto a buffer.
pub trait ProtoEncode {
    fn proto_encode(&self, buf: &mut impl BufMut);
}

/// Decode a value from a buffer.
pub trait ProtoDecode: Sized {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError>;
}

/// Write a Java protocol string (VarInt byte length + UTF-8).
pub fn write_string(buf: &mut impl BufMut, s: &str) {
    VarInt(s.len() as i32).proto_encode(buf);
    buf.put_slice(s.as_bytes());
}

/// Read a Java protocol string, rejecting anything longer than `max` characters.
pub fn read_string(buf: &mut impl Buf, max: usize) -> Result<String, ProtoError> {
    let len = VarInt::proto_decode(buf)?.0;
    if len < 0 {
        return Err(ProtoError::NegativeLength(len));
    }
    let len = len as usize;
    // UTF-8 takes at most 4 bytes per code point
    if len > max * 4 {
        return Err(ProtoError::StringTooLong { len, max });
    }
    let data = take_bytes(buf, len)?;
    let s = String::from_utf8(data.to_vec()).map_err(|_| ProtoError::InvalidUtf8)?;
    let chars = s.encode_utf16().count();
    if chars > max {
        return Err(ProtoError::StringTooLong { len: chars, max });
    }
    Ok(s)
}

/// Copy `len` bytes out of the buffer, failing if fewer remain.
pub fn take_bytes(buf: &mut impl Buf, len: usize) -> Result<bytes::Bytes, ProtoError> {
    ensure_remaining(buf, len)?;
    Ok(buf.copy_to_bytes(len))
}

pub fn ensure_remaining(buf: &impl Buf, needed: usize) -> Result<(), ProtoError> {
    if buf.remaining() < needed {
        return Err(ProtoError::BufferTooShort {
            needed,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}

/// Truncate to at most `max` characters. Never splits a code point.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn string_roundtrip() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, "Hello, Notch!");
        let result = read_string(&mut buf.freeze(), MAX_STRING_LEN).unwrap();
        assert_eq!(result, "Hello, Notch!");
    }

    #[test]
    fn string_empty() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, "");
        assert_eq!(buf.len(), 1);
        let result = read_string(&mut buf.freeze(), 16).unwrap();
        assert_eq!(result, "");
    }

    #[test]
    fn string_unicode_counts_characters() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, "§aÄÖÜ");
        let result = read_string(&mut buf.freeze(), 5).unwrap();
        assert_eq!(result, "§aÄÖÜ");
    }

    #[test]
    fn string_over_limit() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, "seventeen_chars!!");
        assert!(matches!(
            read_string(&mut buf.freeze(), 16),
            Err(ProtoError::StringTooLong { len: 17, max: 16 })
        ));
    }

    #[test]
    fn string_buffer_too_short() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, "Hello");
        let truncated = buf.freeze().slice(..3);
        assert!(read_string(&mut truncated.clone(), 16).is_err());
    }

    #[test]
    fn truncate_keeps_prefix() {
        assert_eq!(truncate_chars("abcdefghijklmnopq", 16), "abcdefghijklmnop");
        assert_eq!(truncate_chars("short", 16), "short");
        assert_eq!(truncate_chars("§§§", 2), "§§");
    }
}
