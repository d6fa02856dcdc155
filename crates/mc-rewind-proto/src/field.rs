//! Decoded packets as ordered lists of logical field values.
//!
//! The transport layer decodes wire bytes into a [`Packet`] before handing it
//! to the translation engine and encodes the result afterwards, so every
//! rewrite works on typed values rather than raw bytes.

use bytes::Bytes;

use crate::error::ProtoError;
use crate::item_stack::ItemStack;
use crate::metadata::MetadataEntry;
use crate::types::BlockPos;

/// Which way a packet travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Server to client.
    Clientbound,
    /// Client to server.
    Serverbound,
}

/// Protocol revision a packet is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Revision {
    /// 1.7.6 - 1.7.10 (protocol 5).
    V1_7,
    /// 1.8.x (protocol 47).
    V1_8,
    /// 1.9 (protocol 107).
    V1_9,
}

impl Revision {
    pub fn protocol_version(self) -> i32 {
        match self {
            Self::V1_7 => 5,
            Self::V1_8 => 47,
            Self::V1_9 => 107,
        }
    }
}

/// One attribute modifier inside an entity property.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeModifier {
    pub uuid: u128,
    pub amount: f64,
    /// 0 = add, 1 = add multiplied base, 2 = multiply.
    pub operation: i8,
}

/// One attribute of the entity properties packet.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityProperty {
    pub key: String,
    pub value: f64,
    pub modifiers: Vec<AttributeModifier>,
}

/// A single logical field of a packet.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Byte(i8),
    UByte(u8),
    Short(i16),
    UShort(u16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    VarInt(i32),
    String(String),
    Uuid(u128),
    Position(BlockPos),
    /// Length-prefixed byte array.
    ByteArray(Bytes),
    /// All bytes remaining in the packet.
    RawBytes(Bytes),
    VarIntArray(Vec<i32>),
    IntArray(Vec<i32>),
    StringArray(Vec<String>),
    Metadata(Vec<MetadataEntry>),
    Item(Option<ItemStack>),
    Properties(Vec<EntityProperty>),
}

impl FieldValue {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Byte(_) => "byte",
            Self::UByte(_) => "ubyte",
            Self::Short(_) => "short",
            Self::UShort(_) => "ushort",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::VarInt(_) => "varint",
            Self::String(_) => "string",
            Self::Uuid(_) => "uuid",
            Self::Position(_) => "position",
            Self::ByteArray(_) => "byte array",
            Self::RawBytes(_) => "raw bytes",
            Self::VarIntArray(_) => "varint array",
            Self::IntArray(_) => "int array",
            Self::StringArray(_) => "string array",
            Self::Metadata(_) => "metadata",
            Self::Item(_) => "item",
            Self::Properties(_) => "properties",
        }
    }

    /// Any integral field widened to `i64`.
    pub fn as_integer(&self) -> Option<i64> {
        match *self {
            Self::Byte(v) => Some(v as i64),
            Self::UByte(v) => Some(v as i64),
            Self::Short(v) => Some(v as i64),
            Self::UShort(v) => Some(v as i64),
            Self::Int(v) | Self::VarInt(v) => Some(v as i64),
            Self::Long(v) => Some(v),
            _ => None,
        }
    }
}

/// A decoded packet.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    pub direction: Direction,
    pub id: i32,
    pub revision: Revision,
    pub fields: Vec<FieldValue>,
}

macro_rules! copy_accessor {
    ($name:ident, $variant:ident, $ty:ty, $kind:literal) => {
        pub fn $name(&self, index: usize) -> Result<$ty, ProtoError> {
            match self.field(index)? {
                FieldValue::$variant(v) => Ok(*v),
                other => Err(ProtoError::FieldKind {
                    index,
                    expected: $kind,
                    found: other.kind(),
                }),
            }
        }
    };
}

macro_rules! ref_accessor {
    ($name:ident, $name_mut:ident, $variant:ident, $ty:ty, $kind:literal) => {
        pub fn $name(&self, index: usize) -> Result<&$ty, ProtoError> {
            match self.field(index)? {
                FieldValue::$variant(v) => Ok(v),
                other => Err(ProtoError::FieldKind {
                    index,
                    expected: $kind,
                    found: other.kind(),
                }),
            }
        }

        pub fn $name_mut(&mut self, index: usize) -> Result<&mut $ty, ProtoError> {
            match self.field_mut(index)? {
                FieldValue::$variant(v) => Ok(v),
                other => Err(ProtoError::FieldKind {
                    index,
                    expected: $kind,
                    found: other.kind(),
                }),
            }
        }
    };
}

impl Packet {
    pub fn new(direction: Direction, id: i32, revision: Revision) -> Self {
        Self {
            direction,
            id,
            revision,
            fields: Vec::new(),
        }
    }

    /// Shorthand for a server-to-client packet.
    pub fn clientbound(id: i32, revision: Revision, fields: Vec<FieldValue>) -> Self {
        Self {
            direction: Direction::Clientbound,
            id,
            revision,
            fields,
        }
    }

    pub fn serverbound(id: i32, revision: Revision, fields: Vec<FieldValue>) -> Self {
        Self {
            direction: Direction::Serverbound,
            id,
            revision,
            fields,
        }
    }

    /// Append a field, builder style.
    pub fn with(mut self, value: FieldValue) -> Self {
        self.fields.push(value);
        self
    }

    pub fn field(&self, index: usize) -> Result<&FieldValue, ProtoError> {
        self.fields
            .get(index)
            .ok_or(ProtoError::MissingField { index })
    }

    pub fn field_mut(&mut self, index: usize) -> Result<&mut FieldValue, ProtoError> {
        self.fields
            .get_mut(index)
            .ok_or(ProtoError::MissingField { index })
    }

    /// Replace the field at `index`.
    pub fn set(&mut self, index: usize, value: FieldValue) -> Result<(), ProtoError> {
        *self.field_mut(index)? = value;
        Ok(())
    }

    /// Insert a field, shifting later ones. `index == len` appends.
    pub fn insert(&mut self, index: usize, value: FieldValue) -> Result<(), ProtoError> {
        if index > self.fields.len() {
            return Err(ProtoError::MissingField { index });
        }
        self.fields.insert(index, value);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<FieldValue, ProtoError> {
        if index >= self.fields.len() {
            return Err(ProtoError::MissingField { index });
        }
        Ok(self.fields.remove(index))
    }

    copy_accessor!(bool_at, Bool, bool, "bool");
    copy_accessor!(byte_at, Byte, i8, "byte");
    copy_accessor!(ubyte_at, UByte, u8, "ubyte");
    copy_accessor!(short_at, Short, i16, "short");
    copy_accessor!(ushort_at, UShort, u16, "ushort");
    copy_accessor!(int_at, Int, i32, "int");
    copy_accessor!(long_at, Long, i64, "long");
    copy_accessor!(float_at, Float, f32, "float");
    copy_accessor!(double_at, Double, f64, "double");
    copy_accessor!(varint_at, VarInt, i32, "varint");
    copy_accessor!(uuid_at, Uuid, u128, "uuid");
    copy_accessor!(position_at, Position, BlockPos, "position");

    ref_accessor!(string_at, string_at_mut, String, String, "string");
    ref_accessor!(byte_array_at, byte_array_at_mut, ByteArray, Bytes, "byte array");
    ref_accessor!(raw_bytes_at, raw_bytes_at_mut, RawBytes, Bytes, "raw bytes");
    ref_accessor!(varint_array_at, varint_array_at_mut, VarIntArray, Vec<i32>, "varint array");
    ref_accessor!(int_array_at, int_array_at_mut, IntArray, Vec<i32>, "int array");
    ref_accessor!(string_array_at, string_array_at_mut, StringArray, Vec<String>, "string array");
    ref_accessor!(metadata_at, metadata_at_mut, Metadata, Vec<MetadataEntry>, "metadata");
    ref_accessor!(item_at, item_at_mut, Item, Option<ItemStack>, "item");
    ref_accessor!(properties_at, properties_at_mut, Properties, Vec<EntityProperty>, "properties");

    /// Read any integral field as `i32`, whatever its width.
    pub fn integer_at(&self, index: usize) -> Result<i32, ProtoError> {
        let field = self.field(index)?;
        field
            .as_integer()
            .map(|v| v as i32)
            .ok_or(ProtoError::FieldKind {
                index,
                expected: "integer",
                found: field.kind(),
            })
    }
}
