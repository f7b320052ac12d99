//! Copy and paste of rectangular selections.
//!
//! A copy stores the blocks of both layers whose origin lies inside the
//! selection, keyed relative to the selection's top-left cell. Pasting writes
//! them back relative to a target cell, skipping cells outside the world or
//! on bedrock rows.

use bevy_ecs::prelude::Resource;
use log::{debug, info};

use crate::components::blockinstance::BlockInstance;
use crate::components::gridpos::GridPos;
use crate::components::layer::Layer;
use crate::resources::blockstore::AssetProvider;
use crate::resources::spritebounds::{SpriteBoundsCache, grid_size};
use crate::resources::worldgrid::WorldGrid;
use crate::systems::placement::EditContext;

/// Copied blocks per layer, relative to the selection corner.
#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct Clipboard {
    width: i32,
    height: i32,
    layers: [Vec<(GridPos, BlockInstance)>; 2],
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(|l| l.is_empty())
    }

    pub fn len(&self) -> usize {
        self.layers.iter().map(|l| l.len()).sum()
    }

    /// Selection size in cells.
    pub fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    pub fn entries(&self, layer: Layer) -> &[(GridPos, BlockInstance)] {
        &self.layers[layer.index()]
    }

    /// Copy the `width` x `height` selection whose top-left cell is `corner`.
    /// Returns the number of blocks copied.
    pub fn copy_from(&mut self, grid: &WorldGrid, corner: GridPos, width: i32, height: i32) -> usize {
        self.width = width.max(0);
        self.height = height.max(0);
        for layer in Layer::ORDER {
            let mut entries: Vec<(GridPos, BlockInstance)> = grid
                .layer(layer)
                .iter()
                .filter(|(pos, _)| {
                    (corner.x..corner.x + self.width).contains(&pos.x) && (corner.y..corner.y + self.height).contains(&pos.y)
                })
                .map(|(pos, block)| (GridPos::new(pos.x - corner.x, pos.y - corner.y), block.clone()))
                .collect();
            entries.sort_by_key(|(rel, _)| (rel.y, rel.x));
            self.layers[layer.index()] = entries;
        }
        info!("Copied {} blocks from {}x{} selection at {}", self.len(), width, height, corner);
        self.len()
    }

    /// Write the clipboard with its top-left at `target`. Returns the number
    /// of blocks written.
    pub fn paste_into(&self, ctx: &mut EditContext, target: GridPos) -> usize {
        let mut written = 0;
        for layer in Layer::ORDER {
            for (rel, block) in self.entries(layer) {
                let pos = target.offset(rel.x, rel.y);
                if !ctx.grid.is_editable(pos) {
                    continue;
                }
                ctx.grid.insert(layer, pos, block);
                ctx.chunks.invalidate(pos);
                written += 1;
            }
        }
        if written > 0 {
            ctx.index.mark_stale();
        }
        debug!("Pasted {} blocks at {}", written, target);
        written
    }

    /// Mirror the selection left to right. Multi-cell sprites keep their
    /// covered columns inside the selection.
    pub fn flip_horizontal(&mut self, bounds: &mut SpriteBoundsCache, assets: &dyn AssetProvider) {
        let width = self.width;
        self.rewrite(bounds, assets, |rel, (gw, _)| GridPos::new(width - gw - rel.x, rel.y));
    }

    /// Mirror the selection top to bottom. Origins stay on the sprite's
    /// bottom row.
    pub fn flip_vertical(&mut self, bounds: &mut SpriteBoundsCache, assets: &dyn AssetProvider) {
        let height = self.height;
        self.rewrite(bounds, assets, |rel, (_, gh)| GridPos::new(rel.x, height + gh - 2 - rel.y));
    }

    fn rewrite<F>(&mut self, bounds: &mut SpriteBoundsCache, assets: &dyn AssetProvider, map: F)
    where
        F: Fn(GridPos, (i32, i32)) -> GridPos,
    {
        for entries in &mut self.layers {
            for (rel, block) in entries.iter_mut() {
                let size = grid_size(&bounds.footprint_of(block, assets));
                *rel = map(*rel, size);
            }
            entries.sort_by_key(|(rel, _)| (rel.y, rel.x));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::blockinstance::TileMode;
    use crate::resources::blockstore::BlockStore;

    fn sample_grid() -> WorldGrid {
        let mut grid = WorldGrid::new(20, 20, 2);
        grid.insert(Layer::Midground, GridPos::new(2, 3), &BlockInstance::new("dirt", TileMode::All));
        grid.insert(Layer::Background, GridPos::new(4, 3), &BlockInstance::new("stone", TileMode::All));
        grid.insert(Layer::Midground, GridPos::new(9, 9), &BlockInstance::new("dirt", TileMode::All));
        grid
    }

    #[test]
    fn test_copy_is_relative_to_corner() {
        let grid = sample_grid();
        let mut clip = Clipboard::new();
        assert_eq!(clip.copy_from(&grid, GridPos::new(2, 2), 3, 3), 2);
        assert_eq!(clip.entries(Layer::Midground)[0].0, GridPos::new(0, 1));
        assert_eq!(clip.entries(Layer::Background)[0].0, GridPos::new(2, 1));
    }

    #[test]
    fn test_flip_horizontal_single_cells() {
        let grid = sample_grid();
        let assets = BlockStore::with_default_blocks();
        let mut bounds = SpriteBoundsCache::new();
        let mut clip = Clipboard::new();
        clip.copy_from(&grid, GridPos::new(2, 2), 3, 3);
        clip.flip_horizontal(&mut bounds, &assets);
        assert_eq!(clip.entries(Layer::Midground)[0].0, GridPos::new(2, 1));
        assert_eq!(clip.entries(Layer::Background)[0].0, GridPos::new(0, 1));
    }

    #[test]
    fn test_flip_keeps_logs_inside_selection() {
        let mut grid = WorldGrid::new(20, 20, 0);
        grid.insert(Layer::Midground, GridPos::new(0, 0), &BlockInstance::new("wood", TileMode::Log));
        let assets = BlockStore::with_default_blocks();
        let mut bounds = SpriteBoundsCache::new();
        let mut clip = Clipboard::new();
        clip.copy_from(&grid, GridPos::new(0, 0), 4, 1);
        clip.flip_horizontal(&mut bounds, &assets);
        // Log covers columns 2 and 3 after the flip.
        assert_eq!(clip.entries(Layer::Midground)[0].0, GridPos::new(2, 0));
        clip.flip_vertical(&mut bounds, &assets);
        assert_eq!(clip.entries(Layer::Midground)[0].0, GridPos::new(2, 0));
    }
}
