//! World save files.
//!
//! A world is stored as JSON: both layers keyed by their layer name, each a
//! map from `"x,y"` to the block stored at that origin, plus the world
//! dimensions.
//!
//! ```json
//! {
//!   "layers": {
//!     "BACKGROUND": { "3,10": { "id": "stone", ... } },
//!     "MIDGROUND": { "4,12": { "id": "dirt", ... } }
//!   },
//!   "world_width": 300,
//!   "world_height": 170,
//!   "bedrock_rows": 6
//! }
//! ```
//!
//! Maps are ordered so saving the same world twice gives the same bytes.

use std::collections::BTreeMap;
use std::error::Error;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::components::blockinstance::BlockInstance;
use crate::components::gridpos::GridPos;
use crate::components::layer::Layer;
use crate::resources::worldgrid::{
    DEFAULT_BEDROCK_ROWS, DEFAULT_WORLD_HEIGHT, DEFAULT_WORLD_WIDTH, LayerMap, WorldGrid,
};

fn default_width() -> i32 {
    DEFAULT_WORLD_WIDTH
}

fn default_height() -> i32 {
    DEFAULT_WORLD_HEIGHT
}

fn default_bedrock_rows() -> i32 {
    DEFAULT_BEDROCK_ROWS
}

/// Serialized form of a [`WorldGrid`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WorldFile {
    pub layers: BTreeMap<String, BTreeMap<String, BlockInstance>>,
    #[serde(default = "default_width")]
    pub world_width: i32,
    #[serde(default = "default_height")]
    pub world_height: i32,
    #[serde(default = "default_bedrock_rows")]
    pub bedrock_rows: i32,
}

impl WorldFile {
    /// Snapshot of `grid`.
    pub fn from_grid(grid: &WorldGrid) -> Self {
        let layers = Layer::ORDER
            .into_iter()
            .map(|layer| {
                let blocks = grid
                    .layer(layer)
                    .iter()
                    .map(|(pos, block)| (pos.to_key(), block.clone()))
                    .collect();
                (layer.key().to_string(), blocks)
            })
            .collect();
        Self {
            layers,
            world_width: grid.width,
            world_height: grid.height,
            bedrock_rows: grid.bedrock_rows,
        }
    }

    /// Decode both layers. Unknown layer names are skipped with a warning;
    /// a malformed cell key is an error.
    pub fn to_layers(&self) -> Result<[LayerMap; 2], Box<dyn Error>> {
        let mut layers = [LayerMap::default(), LayerMap::default()];
        for (name, blocks) in &self.layers {
            let Some(layer) = Layer::from_key(name) else {
                warn!("Skipping unknown layer '{}' ({} blocks)", name, blocks.len());
                continue;
            };
            let map = &mut layers[layer.index()];
            for (key, block) in blocks {
                let pos = GridPos::parse_key(key).ok_or_else(|| format!("invalid cell key '{}' in {}", key, name))?;
                map.insert(pos, block.clone());
            }
        }
        Ok(layers)
    }

    /// Build a fresh grid holding this world.
    pub fn into_grid(self) -> Result<WorldGrid, Box<dyn Error>> {
        if self.world_width <= 0 || self.world_height <= 0 {
            return Err(format!("invalid world size {}x{}", self.world_width, self.world_height).into());
        }
        let layers = self.to_layers()?;
        let mut grid = WorldGrid::new(self.world_width, self.world_height, self.bedrock_rows);
        grid.set_layers(layers);
        Ok(grid)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let world: WorldFile = serde_json::from_reader(reader)?;
        info!(
            "Loaded world {}x{} from {}",
            world.world_width,
            world.world_height,
            path.display()
        );
        Ok(world)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn Error>> {
        let path = path.as_ref();
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        let blocks: usize = self.layers.values().map(|l| l.len()).sum();
        info!("Saved {} blocks to {}", blocks, path.display());
        Ok(())
    }
}
