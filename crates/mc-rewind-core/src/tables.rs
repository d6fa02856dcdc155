//! Lookup tables built once and shared by every session.

use std::collections::HashMap;

/// Blocks 1.8 added, mapped to the closest block a 1.7 client can draw.
///
/// Keys and values are `id << 4 | meta` composites. A rule for a bare id
/// matches every meta value of that block and keeps the meta.
#[derive(Debug, Clone, Default)]
pub struct BlockReplacements {
    exact: HashMap<u16, u16>,
    by_id: HashMap<u16, Replacement>,
}

#[derive(Debug, Clone, Copy)]
enum Replacement {
    /// Same meta, new id.
    Id(u16),
    /// Fixed id and meta.
    Block(u16, u8),
}

impl BlockReplacements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every variant of `id` by `to`, keeping the meta.
    pub fn id(&mut self, id: u16, to: u16) -> &mut Self {
        self.by_id.insert(id, Replacement::Id(to));
        self
    }

    /// Replace every variant of `id` by one fixed block.
    pub fn block(&mut self, id: u16, to_id: u16, to_meta: u8) -> &mut Self {
        self.by_id.insert(id, Replacement::Block(to_id, to_meta));
        self
    }

    /// Replace one exact `id:meta`.
    pub fn variant(&mut self, id: u16, meta: u8, to_id: u16, to_meta: u8) -> &mut Self {
        self.exact.insert(composite(id, meta), composite(to_id, to_meta));
        self
    }

    /// The legacy composite for `block`, which is returned as is when no rule applies.
    pub fn replace(&self, block: u16) -> u16 {
        if let Some(&to) = self.exact.get(&block) {
            return to;
        }
        match self.by_id.get(&(block >> 4)) {
            Some(Replacement::Id(to)) => composite(*to, (block & 0xF) as u8),
            Some(Replacement::Block(id, meta)) => composite(*id, *meta),
            None => block,
        }
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn composite(id: u16, meta: u8) -> u16 {
    id << 4 | (meta & 0xF) as u16
}

/// Immutable lookup tables handed to the pipeline.
#[derive(Debug, Clone)]
pub struct Tables {
    pub blocks: BlockReplacements,
}

impl Tables {
    pub fn new() -> Self {
        Self {
            blocks: legacy_blocks(),
        }
    }
}

impl Default for Tables {
    fn default() -> Self {
        Self::new()
    }
}

fn legacy_blocks() -> BlockReplacements {
    let mut blocks = BlockReplacements::new();
    blocks
        .block(165, 133, 0) // slime block -> emerald block
        .block(166, 0, 0) // barrier -> air
        .id(167, 96) // iron trapdoor -> trapdoor
        .block(168, 1, 0) // prismarine -> stone
        .block(169, 89, 0) // sea lantern -> glowstone
        .block(176, 0, 0) // standing banner
        .block(177, 0, 0) // wall banner
        .id(178, 151) // inverted daylight detector
        .id(179, 24) // red sandstone
        .id(180, 128) // red sandstone stairs
        .id(181, 43) // double red sandstone slab
        .id(182, 44); // red sandstone slab

    // spruce/birch/jungle/dark oak/acacia gates, fences and doors
    for id in 183..=187 {
        blocks.id(id, 107);
    }
    for id in 188..=192 {
        blocks.id(id, 85);
    }
    for id in 193..=197 {
        blocks.id(id, 64);
    }

    // granite, andesite, diorite and their polished forms
    for meta in 1..=6 {
        blocks.variant(1, meta, 1, 0);
    }
    blocks
        .variant(3, 1, 3, 0) // coarse dirt
        .variant(19, 1, 19, 0); // wet sponge
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untouched_blocks_pass() {
        let t = Tables::new();
        assert_eq!(t.blocks.replace(composite(2, 0)), composite(2, 0));
        assert_eq!(t.blocks.replace(composite(35, 14)), composite(35, 14));
        assert_eq!(t.blocks.replace(0), 0);
    }

    #[test]
    fn id_rules_keep_meta() {
        let t = Tables::new();
        assert_eq!(t.blocks.replace(composite(180, 3)), composite(128, 3));
        assert_eq!(t.blocks.replace(composite(195, 9)), composite(64, 9));
    }

    #[test]
    fn block_rules_reset_meta() {
        let t = Tables::new();
        assert_eq!(t.blocks.replace(composite(168, 2)), composite(1, 0));
        assert_eq!(t.blocks.replace(composite(166, 0)), 0);
    }

    #[test]
    fn exact_variants() {
        let t = Tables::new();
        assert_eq!(t.blocks.replace(composite(1, 5)), composite(1, 0));
        assert_eq!(t.blocks.replace(composite(3, 1)), composite(3, 0));
        // podzol is known to 1.7
        assert_eq!(t.blocks.replace(composite(3, 2)), composite(3, 2));
        assert!(!t.blocks.is_empty());
    }
}
