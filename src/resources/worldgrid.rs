//! The editable world: two sparse layers of block instances.
//!
//! Each layer maps an origin cell to the [`BlockInstance`] stored there.
//! Cells covered by the rest of a multi-cell sprite are not keyed; they are
//! derived through the sprite's footprint (see
//! [`crate::resources::occupancy::OccupancyIndex`]).
//!
//! The bottom `bedrock_rows` rows are protected: edit operations refuse to
//! touch them and [`WorldGrid::place_bedrock`] fills them with bedrock.

use bevy_ecs::prelude::Resource;
use log::info;
use rustc_hash::FxHashMap;

use crate::components::blockinstance::BlockInstance;
use crate::components::gridpos::GridPos;
use crate::components::layer::Layer;

pub const DEFAULT_WORLD_WIDTH: i32 = 300;
pub const DEFAULT_WORLD_HEIGHT: i32 = 170;
pub const DEFAULT_BEDROCK_ROWS: i32 = 6;

/// Sparse mapping from origin cell to block.
pub type LayerMap = FxHashMap<GridPos, BlockInstance>;

/// Read access to one layer, used by neighbor lookups.
pub trait LayerReader {
    fn block_at(&self, pos: GridPos) -> Option<&BlockInstance>;

    fn id_at(&self, pos: GridPos) -> Option<&str> {
        self.block_at(pos).map(|b| b.id.as_str())
    }
}

impl LayerReader for LayerMap {
    fn block_at(&self, pos: GridPos) -> Option<&BlockInstance> {
        self.get(&pos)
    }
}

/// Both layers plus world dimensions.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct WorldGrid {
    layers: [LayerMap; 2],
    pub width: i32,
    pub height: i32,
    pub bedrock_rows: i32,
    active_layer: Layer,
}

impl Default for WorldGrid {
    fn default() -> Self {
        Self::new(DEFAULT_WORLD_WIDTH, DEFAULT_WORLD_HEIGHT, DEFAULT_BEDROCK_ROWS)
    }
}

impl WorldGrid {
    pub fn new(width: i32, height: i32, bedrock_rows: i32) -> Self {
        assert!(width > 0 && height > 0, "world must have a positive size");
        Self {
            layers: [LayerMap::default(), LayerMap::default()],
            width,
            height,
            bedrock_rows: bedrock_rows.clamp(0, height),
            active_layer: Layer::Midground,
        }
    }

    pub fn is_valid_position(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    /// Whether row `y` lies in the protected bottom band.
    pub fn is_bedrock_row(&self, y: i32) -> bool {
        y >= self.height - self.bedrock_rows
    }

    /// Inside the world and outside the bedrock band.
    pub fn is_editable(&self, pos: GridPos) -> bool {
        self.is_valid_position(pos) && !self.is_bedrock_row(pos.y)
    }

    /// First protected row; everything above it is usable.
    pub fn usable_height(&self) -> i32 {
        self.height - self.bedrock_rows
    }

    pub fn active_layer(&self) -> Layer {
        self.active_layer
    }

    pub fn set_active_layer(&mut self, layer: Layer) {
        self.active_layer = layer;
    }

    pub fn layer(&self, layer: Layer) -> &LayerMap {
        &self.layers[layer.index()]
    }

    pub fn layer_mut(&mut self, layer: Layer) -> &mut LayerMap {
        &mut self.layers[layer.index()]
    }

    pub fn get(&self, layer: Layer, pos: GridPos) -> Option<&BlockInstance> {
        self.layer(layer).get(&pos)
    }

    pub fn get_mut(&mut self, layer: Layer, pos: GridPos) -> Option<&mut BlockInstance> {
        self.layer_mut(layer).get_mut(&pos)
    }

    /// Store a copy of `block` at `pos`, returning what was there.
    pub fn insert(&mut self, layer: Layer, pos: GridPos, block: &BlockInstance) -> Option<BlockInstance> {
        self.layer_mut(layer).insert(pos, block.clone())
    }

    pub fn remove(&mut self, layer: Layer, pos: GridPos) -> Option<BlockInstance> {
        self.layer_mut(layer).remove(&pos)
    }

    /// Snapshot of both layers.
    pub fn layers(&self) -> [LayerMap; 2] {
        self.layers.clone()
    }

    /// Replace both layers wholesale.
    ///
    /// Callers must invalidate every chunk and the occupancy index afterwards;
    /// the editor does this through
    /// [`WorldReplacedEvent`](crate::events::worldreplaced::WorldReplacedEvent).
    pub fn set_layers(&mut self, layers: [LayerMap; 2]) {
        self.layers = layers;
    }

    /// Empty both layers.
    pub fn clear(&mut self) {
        for layer in &mut self.layers {
            layer.clear();
        }
    }

    /// Fill the protected rows of the midground with `bedrock`.
    pub fn place_bedrock(&mut self, bedrock: &BlockInstance) {
        let start = self.usable_height().max(0);
        let mut block = bedrock.clone();
        block.is_bedrock = true;
        for y in start..self.height {
            for x in 0..self.width {
                self.insert(Layer::Midground, GridPos::new(x, y), &block);
            }
        }
        info!("Placed {} bedrock in bottom {} rows", block.id, self.height - start);
    }

    /// Total number of keyed blocks in both layers.
    pub fn block_count(&self) -> usize {
        self.layers.iter().map(|l| l.len()).sum()
    }
}
