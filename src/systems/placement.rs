//! Single-cell editing operations.
//!
//! All edits go through an [`EditContext`], a bundle of mutable borrows of the
//! resources an edit touches. The [`Editor`](crate::editor::Editor) builds one
//! from its ECS world with a `SystemState`; tests can build one from locals.
//!
//! Every edit on the active layer marks the occupancy index stale and
//! invalidates the chunks under the affected sprite. Rejected edits (outside
//! the world, on a bedrock row, colliding with another sprite) return `false`
//! and change nothing.

use log::{debug, trace};

use crate::components::blockinstance::BlockInstance;
use crate::components::gridpos::GridPos;
use crate::components::layer::Layer;
use crate::resources::blockstore::AssetProvider;
use crate::resources::chunkstore::ChunkStore;
use crate::resources::occupancy::OccupancyIndex;
use crate::resources::spritebounds::{Footprint, SpriteBoundsCache};
use crate::resources::worldgrid::WorldGrid;

/// Mutable view over everything an edit needs.
pub struct EditContext<'a> {
    pub grid: &'a mut WorldGrid,
    pub index: &'a mut OccupancyIndex,
    pub chunks: &'a mut ChunkStore,
    pub bounds: &'a mut SpriteBoundsCache,
    pub assets: &'a dyn AssetProvider,
}

/// A block found under a cell, with where it is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct PickedBlock {
    pub layer: Layer,
    pub origin: GridPos,
    pub block: BlockInstance,
}

impl EditContext<'_> {
    pub fn footprint(&mut self, block: &BlockInstance) -> Footprint {
        self.bounds.footprint_of(block, self.assets)
    }

    /// Cells a sprite stored at `origin` covers.
    pub fn covered_cells(&mut self, origin: GridPos, block: &BlockInstance) -> Vec<GridPos> {
        self.footprint(block)
            .iter()
            .map(|&(dx, dy)| origin.offset(dx, dy))
            .collect()
    }

    /// Rebuild the occupancy index if an edit made it stale.
    pub fn refresh_index(&mut self) {
        self.index.ensure_fresh(self.grid, self.bounds, self.assets);
    }

    /// Origin of the active-layer sprite covering `cell`.
    pub fn origin_at(&mut self, cell: GridPos) -> Option<GridPos> {
        self.refresh_index();
        self.index.origin_of(cell)
    }

    /// Whether `block` at `origin` would overlap a sprite stored elsewhere.
    pub fn collides(&mut self, origin: GridPos, block: &BlockInstance) -> bool {
        self.refresh_index();
        self.covered_cells(origin, block)
            .into_iter()
            .any(|cell| matches!(self.index.origin_of(cell), Some(other) if other != origin))
    }

    /// Invalidate the chunks under a sprite stored at `origin`.
    pub fn invalidate_sprite(&mut self, origin: GridPos, block: &BlockInstance) {
        for cell in self.covered_cells(origin, block) {
            if self.grid.is_valid_position(cell) {
                self.chunks.invalidate(cell);
            }
        }
        self.chunks.invalidate(origin);
    }

    /// Place a copy of `block` with its origin at `cell` on the active layer.
    pub fn place_block(&mut self, cell: GridPos, block: &BlockInstance) -> bool {
        if !self.grid.is_editable(cell) {
            trace!("Rejected placement of {} at {}: not editable", block.id, cell);
            return false;
        }
        if self.collides(cell, block) {
            trace!("Rejected placement of {} at {}: collision", block.id, cell);
            return false;
        }
        let layer = self.grid.active_layer();
        self.grid.insert(layer, cell, block);
        self.index.mark_stale();
        self.invalidate_sprite(cell, block);
        true
    }

    /// Remove the whole sprite covering `cell` on the active layer.
    pub fn erase_at(&mut self, cell: GridPos) -> bool {
        self.erase_sprite_at(cell).is_some()
    }

    /// As [`erase_at`](Self::erase_at), returning the removed sprite's origin.
    pub fn erase_sprite_at(&mut self, cell: GridPos) -> Option<GridPos> {
        if !self.grid.is_editable(cell) {
            return None;
        }
        let origin = self.origin_at(cell)?;
        if self.grid.is_bedrock_row(origin.y) {
            return None;
        }
        let layer = self.grid.active_layer();
        let removed = self.grid.remove(layer, origin)?;
        self.index.mark_stale();
        self.invalidate_sprite(origin, &removed);
        Some(origin)
    }

    /// Step the state of the multi-state sprite covering `cell`.
    pub fn cycle_state_at(&mut self, cell: GridPos, forward: bool) -> bool {
        let Some(origin) = self.origin_at(cell) else {
            return false;
        };
        let layer = self.grid.active_layer();
        let changed = self
            .grid
            .get_mut(layer, origin)
            .is_some_and(|block| block.cycle_state(forward));
        if changed {
            self.chunks.invalidate(origin);
        }
        changed
    }

    /// The sprite covering `cell`, searching the active layer first.
    pub fn pick_block(&mut self, cell: GridPos) -> Option<PickedBlock> {
        if !self.grid.is_valid_position(cell) {
            return None;
        }
        let active = self.grid.active_layer();
        if let Some(origin) = self.origin_at(cell) {
            let block = self.grid.get(active, origin)?.clone();
            return Some(PickedBlock {
                layer: active,
                origin,
                block,
            });
        }
        let other = active.other();
        let candidates: Vec<(GridPos, BlockInstance)> = self
            .grid
            .layer(other)
            .iter()
            .map(|(pos, block)| (*pos, block.clone()))
            .collect();
        let mut hits: Vec<(GridPos, BlockInstance)> = candidates
            .into_iter()
            .filter(|(origin, block)| self.covered_cells(*origin, block).contains(&cell))
            .collect();
        hits.sort_by_key(|(origin, _)| (origin.y, origin.x));
        hits.into_iter().next().map(|(origin, block)| PickedBlock {
            layer: other,
            origin,
            block,
        })
    }

    /// Switch the layer edits apply to.
    pub fn set_active_layer(&mut self, layer: Layer) {
        if self.grid.active_layer() != layer {
            self.grid.set_active_layer(layer);
            self.index.mark_stale();
            debug!("Active layer is now {}", layer.key());
        }
    }
}
