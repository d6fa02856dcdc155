//! Chunk column re-encoding from the 1.8 layout to the 1.7 layout.
//!
//! 1.8 stores each block as a little-endian `id << 4 | meta` short. 1.7
//! splits the same data into a byte array of ids followed by a nibble array
//! of metas, and expects the whole payload zlib-compressed.

use bytes::Buf;
use mc_rewind_proto::codec::{ensure_remaining, take_bytes};
use mc_rewind_proto::compression::{self, CompressionFormat};
use mc_rewind_proto::ProtoError;

use crate::error::RewindError;
use crate::session::{SessionInfo, StoredObject};
use crate::tables::Tables;

/// Blocks per section (16x16x16).
pub const SECTION_BLOCKS: usize = 4096;
/// Bytes of one nibble array (light or meta) per section.
pub const NIBBLE_BYTES: usize = SECTION_BLOCKS / 2;
/// Sections per column.
pub const SECTION_COUNT: usize = 16;
pub const BIOME_BYTES: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub struct ChunkSection {
    /// `id << 4 | meta` per block, in YZX order.
    pub blocks: Vec<u16>,
    pub block_light: Vec<u8>,
    pub sky_light: Option<Vec<u8>>,
}

impl ChunkSection {
    /// An air section, fully lit.
    pub fn empty(sky_light: bool) -> Self {
        Self {
            blocks: vec![0; SECTION_BLOCKS],
            block_light: vec![0; NIBBLE_BYTES],
            sky_light: sky_light.then(|| vec![0xFF; NIBBLE_BYTES]),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChunkColumn {
    pub bitmask: u16,
    pub sections: [Option<ChunkSection>; SECTION_COUNT],
    pub biomes: Option<Vec<u8>>,
}

impl ChunkColumn {
    /// Parse the 1.8 column payload. Every section the bitmask names must be
    /// present in `data`; biomes are only read for full columns that carry them.
    pub fn read_newer(
        bitmask: u16,
        sky_light: bool,
        full: bool,
        data: &[u8],
    ) -> Result<Self, ProtoError> {
        let mut buf = data;
        let present: Vec<usize> = present_sections(bitmask).collect();
        let mut sections: [Option<ChunkSection>; SECTION_COUNT] = Default::default();

        ensure_remaining(&buf, present.len() * SECTION_BLOCKS * 2)?;
        for &y in &present {
            let blocks = (0..SECTION_BLOCKS).map(|_| buf.get_u16_le()).collect();
            sections[y] = Some(ChunkSection {
                blocks,
                block_light: Vec::new(),
                sky_light: None,
            });
        }

        for section in sections.iter_mut().flatten() {
            section.block_light = take_bytes(&mut buf, NIBBLE_BYTES)?.to_vec();
        }
        if sky_light {
            for section in sections.iter_mut().flatten() {
                section.sky_light = Some(take_bytes(&mut buf, NIBBLE_BYTES)?.to_vec());
            }
        }

        let biomes = if full && buf.remaining() >= BIOME_BYTES {
            Some(take_bytes(&mut buf, BIOME_BYTES)?.to_vec())
        } else {
            None
        };

        Ok(Self {
            bitmask,
            sections,
            biomes,
        })
    }

    pub fn section_count(&self) -> usize {
        self.bitmask.count_ones() as usize
    }
}

fn present_sections(bitmask: u16) -> impl Iterator<Item = usize> {
    (0..SECTION_COUNT).filter(move |y| bitmask & (1 << y) != 0)
}

/// Size of a 1.8 column payload inside a map chunk bulk packet.
pub fn newer_column_size(section_count: usize, sky_light: bool, biomes: bool) -> usize {
    let blocks = section_count * SECTION_BLOCKS * 2;
    let block_light = section_count * NIBBLE_BYTES;
    let sky = if sky_light { section_count * NIBBLE_BYTES } else { 0 };
    let biome = if biomes { BIOME_BYTES } else { 0 };
    blocks + block_light + sky + biome
}

/// Encode a column in the uncompressed 1.7 layout.
pub fn encode_legacy(column: &ChunkColumn, sky_light: bool, full: bool, tables: &Tables) -> Vec<u8> {
    let sections: Vec<&ChunkSection> = present_sections(column.bitmask)
        .filter_map(|y| column.sections[y].as_ref())
        .collect();

    let mut payload = Vec::with_capacity(newer_column_size(sections.len(), sky_light, full));
    let mut replaced = vec![0u16; SECTION_BLOCKS];

    // ids, then metas; both need the replaced block
    let mut metas = Vec::with_capacity(sections.len() * NIBBLE_BYTES);
    for section in &sections {
        for (slot, &block) in replaced.iter_mut().zip(&section.blocks) {
            *slot = tables.blocks.replace(block);
        }
        payload.extend(replaced.iter().map(|&b| (b >> 4) as u8));
        metas.extend(
            replaced
                .chunks_exact(2)
                .map(|pair| ((pair[1] & 0xF) << 4 | (pair[0] & 0xF)) as u8),
        );
    }
    payload.extend_from_slice(&metas);

    for section in &sections {
        payload.extend_from_slice(&section.block_light);
    }
    if sky_light {
        for section in &sections {
            match &section.sky_light {
                Some(light) => payload.extend_from_slice(light),
                None => payload.extend(std::iter::repeat(0u8).take(NIBBLE_BYTES)),
            }
        }
    }
    if full {
        if let Some(biomes) = &column.biomes {
            payload.extend_from_slice(biomes);
        }
    }
    payload
}

/// zlib-compress a legacy payload.
pub fn compress(payload: &[u8], level: u32) -> Result<Vec<u8>, RewindError> {
    compression::compress(payload, CompressionFormat::Zlib, level)
        .map_err(|e| RewindError::ChunkCompression(e.to_string()))
}

// ---------------------------------------------------------------------------
// Client dimension
// ---------------------------------------------------------------------------

/// Dimension the client is in. Only the overworld carries sky light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClientWorld {
    pub dimension: i32,
}

impl StoredObject for ClientWorld {
    fn create(_info: &SessionInfo) -> Self {
        Self::default()
    }
}

impl ClientWorld {
    pub fn has_sky_light(&self) -> bool {
        self.dimension == 0
    }
}
