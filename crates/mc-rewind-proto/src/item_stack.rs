//! Item stack type and its per-revision wire forms.
//!
//! 1.8 and 1.9 write the compound tag inline (a lone `TAG_End` byte when
//! absent). 1.7 writes it gzip-compressed behind a signed short length, with
//! `-1` meaning no tag.

use bytes::{Buf, BufMut, Bytes};

use crate::codec::{ensure_remaining, take_bytes};
use crate::compression::{compress, decompress, CompressionFormat, DEFAULT_LEVEL};
use crate::error::ProtoError;
use crate::field::Revision;

const TAG_END: u8 = 0;
const TAG_COMPOUND: u8 = 10;

/// A single item stack. A slot holding `None` is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemStack {
    pub id: i16,
    pub count: i8,
    pub damage: i16,
    /// Uncompressed compound tag, including its `TAG_Compound` header.
    pub tag: Option<Bytes>,
}

impl ItemStack {
    pub fn new(id: i16, count: i8, damage: i16) -> Self {
        Self {
            id,
            count,
            damage,
            tag: None,
        }
    }
}

/// Write an optional item stack in the layout of `revision`.
pub fn write_item(
    buf: &mut impl BufMut,
    item: Option<&ItemStack>,
    revision: Revision,
) -> Result<(), ProtoError> {
    let Some(item) = item else {
        buf.put_i16(-1);
        return Ok(());
    };
    buf.put_i16(item.id);
    buf.put_i8(item.count);
    buf.put_i16(item.damage);
    match (revision, &item.tag) {
        (Revision::V1_7, None) => buf.put_i16(-1),
        (Revision::V1_7, Some(tag)) => {
            let packed = compress(tag, CompressionFormat::Gzip, DEFAULT_LEVEL)?;
            let len = i16::try_from(packed.len())
                .map_err(|_| ProtoError::InvalidData(format!("tag of {} bytes", packed.len())))?;
            buf.put_i16(len);
            buf.put_slice(&packed);
        }
        (_, None) => buf.put_u8(TAG_END),
        (_, Some(tag)) => buf.put_slice(tag),
    }
    Ok(())
}

/// Read an optional item stack in the layout of `revision`.
pub fn read_item(buf: &mut Bytes, revision: Revision) -> Result<Option<ItemStack>, ProtoError> {
    ensure_remaining(buf, 2)?;
    let id = buf.get_i16();
    if id < 0 {
        return Ok(None);
    }
    ensure_remaining(buf, 3)?;
    let count = buf.get_i8();
    let damage = buf.get_i16();

    let tag = match revision {
        Revision::V1_7 => {
            ensure_remaining(buf, 2)?;
            let len = buf.get_i16();
            if len < 0 {
                None
            } else {
                let packed = take_bytes(buf, len as usize)?;
                Some(Bytes::from(decompress(&packed, CompressionFormat::Gzip)?))
            }
        }
        Revision::V1_8 | Revision::V1_9 => read_inline_tag(buf)?,
    };

    Ok(Some(ItemStack {
        id,
        count,
        damage,
        tag,
    }))
}

/// Walk an inline compound once and slice it out of the original buffer.
fn read_inline_tag(buf: &mut Bytes) -> Result<Option<Bytes>, ProtoError> {
    let start = buf.clone();
    ensure_remaining(buf, 1)?;
    match buf.get_u8() {
        TAG_END => Ok(None),
        TAG_COMPOUND => {
            skip_name(buf)?;
            skip_compound(buf)?;
            let used = start.len() - buf.len();
            Ok(Some(start.slice(..used)))
        }
        other => Err(ProtoError::InvalidData(format!(
            "item tag starts with NBT type {other}"
        ))),
    }
}

fn skip_name(buf: &mut impl Buf) -> Result<(), ProtoError> {
    ensure_remaining(buf, 2)?;
    let len = buf.get_u16() as usize;
    ensure_remaining(buf, len)?;
    buf.advance(len);
    Ok(())
}

fn skip_compound(buf: &mut impl Buf) -> Result<(), ProtoError> {
    loop {
        ensure_remaining(buf, 1)?;
        let tag_type = buf.get_u8();
        if tag_type == TAG_END {
            return Ok(());
        }
        skip_name(buf)?;
        skip_payload(buf, tag_type)?;
    }
}

/// Skip one big-endian NBT payload of the given type.
fn skip_payload(buf: &mut impl Buf, tag_type: u8) -> Result<(), ProtoError> {
    let fixed = match tag_type {
        1 => 1,
        2 => 2,
        3 | 5 => 4,
        4 | 6 => 8,
        7 => {
            ensure_remaining(buf, 4)?;
            buf.get_i32().max(0) as usize
        }
        8 => {
            ensure_remaining(buf, 2)?;
            buf.get_u16() as usize
        }
        9 => {
            ensure_remaining(buf, 5)?;
            let element = buf.get_u8();
            let count = buf.get_i32();
            for _ in 0..count.max(0) {
                skip_payload(buf, element)?;
            }
            0
        }
        10 => {
            skip_compound(buf)?;
            0
        }
        11 => {
            ensure_remaining(buf, 4)?;
            buf.get_i32().max(0) as usize * 4
        }
        other => {
            return Err(ProtoError::InvalidData(format!(
                "unknown NBT tag type {other}"
            )))
        }
    };
    ensure_remaining(buf, fixed)?;
    buf.advance(fixed);
    Ok(())
}
