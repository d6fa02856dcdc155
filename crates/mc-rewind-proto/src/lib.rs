//! Java Edition wire vocabulary shared by the translation layers.
//!
//! Packets reach the translation engine already decoded into ordered
//! [`FieldValue`]s; this crate defines those values, the entity metadata
//! model, the packet id tables of every revision, and the few codecs the
//! engine and its collaborators need directly (VarInt, strings, compressed
//! compound tags, zlib/gzip).

pub mod codec;
pub mod compression;
pub mod error;
pub mod field;
pub mod item_stack;
pub mod metadata;
pub mod packets;
pub mod types;

pub use error::ProtoError;
pub use field::{AttributeModifier, Direction, EntityProperty, FieldValue, Packet, Revision};
pub use item_stack::ItemStack;
pub use metadata::{MetaValue, MetadataEntry};
