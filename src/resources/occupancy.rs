//! Spatial occupancy index.
//!
//! Maps every cell covered by a sprite on the active layer to that sprite's
//! origin cell, so collision checks and "which sprite is under the pointer"
//! are single hash lookups.
//!
//! The index is derived data. Any world edit marks it stale and the next query
//! rebuilds it from scratch; it is never patched incrementally.

use bevy_ecs::prelude::Resource;
use log::debug;
use rustc_hash::FxHashMap;

use crate::components::gridpos::GridPos;
use crate::resources::blockstore::AssetProvider;
use crate::resources::spritebounds::SpriteBoundsCache;
use crate::resources::worldgrid::{LayerMap, WorldGrid};

/// Occupied cell to origin cell, for the active layer.
#[derive(Resource, Debug)]
pub struct OccupancyIndex {
    cells: FxHashMap<GridPos, GridPos>,
    stale: bool,
    rebuilds: u64,
}

impl Default for OccupancyIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl OccupancyIndex {
    /// A new index starts stale.
    pub fn new() -> Self {
        Self {
            cells: FxHashMap::default(),
            stale: true,
            rebuilds: 0,
        }
    }

    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// How many times the index was rebuilt.
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    /// Rebuild from the grid's active layer if stale.
    pub fn ensure_fresh(&mut self, grid: &WorldGrid, bounds: &mut SpriteBoundsCache, assets: &dyn AssetProvider) {
        if self.stale {
            self.cells = scan_layer(grid.layer(grid.active_layer()), bounds, assets);
            self.stale = false;
            self.rebuilds += 1;
            debug!("Occupancy index rebuilt: {} cells", self.cells.len());
        }
    }

    /// Whether any sprite covers `cell`. Only meaningful after
    /// [`ensure_fresh`](Self::ensure_fresh).
    pub fn contains(&self, cell: GridPos) -> bool {
        self.cells.contains_key(&cell)
    }

    /// Origin of the sprite covering `cell`, if any.
    pub fn origin_of(&self, cell: GridPos) -> Option<GridPos> {
        self.cells.get(&cell).copied()
    }

    /// All occupied cells.
    pub fn occupied_cells(&self) -> impl Iterator<Item = GridPos> + '_ {
        self.cells.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Expand every block of a layer through its footprint.
///
/// Where two sprites overlap, the cell keeps the first origin seen in row-major
/// origin order.
pub fn scan_layer(
    layer: &LayerMap,
    bounds: &mut SpriteBoundsCache,
    assets: &dyn AssetProvider,
) -> FxHashMap<GridPos, GridPos> {
    let mut origins: Vec<&GridPos> = layer.keys().collect();
    origins.sort_by_key(|p| (p.y, p.x));

    let mut cells = FxHashMap::default();
    cells.reserve(layer.len());
    for origin in origins {
        let Some(block) = layer.get(origin) else {
            continue;
        };
        for (dx, dy) in bounds.footprint_of(block, assets) {
            cells.entry(origin.offset(dx, dy)).or_insert(*origin);
        }
    }
    cells
}
