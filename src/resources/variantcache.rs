//! Memoized autotile resolution.
//!
//! Entries are keyed by cell plus a fingerprint of everything resolution reads:
//! the block's id, mode and state, the sheet size and, for neighbor-driven
//! modes, the eight surrounding blocks. A changed neighbor therefore produces a
//! new key rather than a stale hit, and the cache only needs clearing when it
//! grows too large or the world is replaced.

use std::hash::{Hash, Hasher};

use bevy_ecs::prelude::Resource;
use rustc_hash::{FxHashMap, FxHasher};

use crate::components::blockinstance::BlockInstance;
use crate::components::gridpos::GridPos;
use crate::components::variant::VariantDescriptor;
use crate::resources::worldgrid::LayerReader;
use crate::systems::autotile::resolve_variant;

const MAX_ENTRIES: usize = 1 << 16;

const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [(-1, -1), (0, -1), (1, -1), (-1, 0), (1, 0), (-1, 1), (0, 1), (1, 1)];

/// Cache of resolved descriptors, owned by the chunk renderer.
#[derive(Resource, Debug, Default)]
pub struct VariantCache {
    entries: FxHashMap<(GridPos, u64), VariantDescriptor>,
    pub hits: u64,
    pub misses: u64,
}

impl VariantCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve through the cache.
    pub fn resolve<L: LayerReader + ?Sized>(
        &mut self,
        pos: GridPos,
        block: &BlockInstance,
        layer: &L,
        sprite_size: (u32, u32),
    ) -> &VariantDescriptor {
        let key = (pos, fingerprint(pos, block, layer, sprite_size));
        if self.entries.contains_key(&key) {
            self.hits += 1;
        } else {
            self.misses += 1;
            if self.entries.len() >= MAX_ENTRIES {
                self.entries.clear();
            }
        }
        self.entries
            .entry(key)
            .or_insert_with(|| resolve_variant(pos, block, layer, sprite_size))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn fingerprint<L: LayerReader + ?Sized>(
    pos: GridPos,
    block: &BlockInstance,
    layer: &L,
    sprite_size: (u32, u32),
) -> u64 {
    let mut hasher = FxHasher::default();
    block.id.hash(&mut hasher);
    block.tile_mode.hash(&mut hasher);
    block.tile_set.hash(&mut hasher);
    block.multi_state.hash(&mut hasher);
    sprite_size.hash(&mut hasher);
    if block.tile_set && block.tile_mode.is_neighbor_dependent() {
        for (dx, dy) in NEIGHBOR_OFFSETS {
            match layer.block_at(pos.offset(dx, dy)) {
                Some(n) => {
                    n.id.hash(&mut hasher);
                    n.is_background.hash(&mut hasher);
                    n.tile_set.hash(&mut hasher);
                    n.category.hash(&mut hasher);
                }
                None => 0u8.hash(&mut hasher),
            }
        }
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::blockinstance::TileMode;
    use crate::resources::worldgrid::LayerMap;

    #[test]
    fn test_repeat_lookup_hits() {
        let dirt = BlockInstance::new("dirt", TileMode::All);
        let mut layer = LayerMap::default();
        layer.insert(GridPos::new(0, 0), dirt.clone());
        let mut cache = VariantCache::new();
        cache.resolve(GridPos::new(0, 0), &dirt, &layer, (176, 48));
        cache.resolve(GridPos::new(0, 0), &dirt, &layer, (176, 48));
        assert_eq!(cache.misses, 1);
        assert_eq!(cache.hits, 1);
    }

    #[test]
    fn test_neighbor_change_misses() {
        let dirt = BlockInstance::new("dirt", TileMode::All);
        let mut layer = LayerMap::default();
        layer.insert(GridPos::new(0, 0), dirt.clone());
        let mut cache = VariantCache::new();
        let before = cache.resolve(GridPos::new(0, 0), &dirt, &layer, (176, 48)).clone();
        layer.insert(GridPos::new(1, 0), dirt.clone());
        let after = cache.resolve(GridPos::new(0, 0), &dirt, &layer, (176, 48)).clone();
        assert_eq!(cache.misses, 2);
        assert!(after.neighbors.right);
        assert_ne!(before, after);
    }
}
