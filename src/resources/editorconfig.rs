//! Editor configuration resource.
//!
//! Settings loaded from an INI file. Every value has a safe default, and keys
//! missing from the file keep it.
//!
//! # Configuration File Format
//!
//! ```ini
//! [world]
//! width = 300
//! height = 170
//! bedrock_rows = 6
//!
//! [render]
//! tile_size = 16
//! zoom = 2.0
//! viewport_width = 1280
//! viewport_height = 720
//! show_grid = true
//! show_borders = false
//!
//! [chunks]
//! size = 24
//! border = 8
//! max_per_frame = 3
//!
//! [brush]
//! size = 1
//! shape = square
//!
//! [history]
//! undo_depth = 500
//! ```

use std::path::PathBuf;

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::{info, warn};

use crate::resources::chunkstore::{DEFAULT_CHUNK_BORDER, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CHUNKS_PER_FRAME};
use crate::resources::undo::DEFAULT_UNDO_DEPTH;
use crate::resources::viewport::{DEFAULT_TILE_SIZE, DEFAULT_ZOOM, MAX_ZOOM, MIN_ZOOM};
use crate::resources::worldgrid::{DEFAULT_BEDROCK_ROWS, DEFAULT_WORLD_HEIGHT, DEFAULT_WORLD_WIDTH};
use crate::systems::brush::BrushShape;

const DEFAULT_VIEWPORT_WIDTH: u32 = 1280;
const DEFAULT_VIEWPORT_HEIGHT: u32 = 720;
const DEFAULT_CONFIG_PATH: &str = "./tilecraft.ini";

/// Editor configuration resource.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct EditorConfig {
    pub world_width: i32,
    pub world_height: i32,
    /// Protected rows at the bottom of the world.
    pub bedrock_rows: i32,
    /// Cell size in pixels at zoom 1.
    pub tile_size: u32,
    pub zoom: f32,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub show_grid: bool,
    pub show_borders: bool,
    /// Chunk side in cells.
    pub chunk_size: i32,
    /// Extra cells rendered around each chunk.
    pub chunk_border: i32,
    /// Budgeted chunk rebuilds per frame.
    pub max_chunks_per_frame: usize,
    pub brush_size: u32,
    pub brush_shape: BrushShape,
    pub undo_depth: usize,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorConfig {
    /// Configuration with safe default values.
    pub fn new() -> Self {
        Self {
            world_width: DEFAULT_WORLD_WIDTH,
            world_height: DEFAULT_WORLD_HEIGHT,
            bedrock_rows: DEFAULT_BEDROCK_ROWS,
            tile_size: DEFAULT_TILE_SIZE,
            zoom: DEFAULT_ZOOM,
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            show_grid: true,
            show_borders: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_border: DEFAULT_CHUNK_BORDER,
            max_chunks_per_frame: DEFAULT_MAX_CHUNKS_PER_FRAME,
            brush_size: 1,
            brush_shape: BrushShape::Square,
            undo_depth: DEFAULT_UNDO_DEPTH,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing or out-of-range values keep their current values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;

        // [world] section
        if let Some(width) = positive_int(&config, "world", "width") {
            self.world_width = width;
        }
        if let Some(height) = positive_int(&config, "world", "height") {
            self.world_height = height;
        }
        if let Some(rows) = config.getint("world", "bedrock_rows").ok().flatten() {
            self.bedrock_rows = (rows.max(0) as i32).min(self.world_height);
        }

        // [render] section
        if let Some(size) = positive_int(&config, "render", "tile_size") {
            self.tile_size = size as u32;
        }
        if let Some(zoom) = config.getfloat("render", "zoom").ok().flatten() {
            self.zoom = (zoom as f32).clamp(MIN_ZOOM, MAX_ZOOM);
        }
        if let Some(width) = positive_int(&config, "render", "viewport_width") {
            self.viewport_width = width as u32;
        }
        if let Some(height) = positive_int(&config, "render", "viewport_height") {
            self.viewport_height = height as u32;
        }
        if let Some(grid) = config.getbool("render", "show_grid").ok().flatten() {
            self.show_grid = grid;
        }
        if let Some(borders) = config.getbool("render", "show_borders").ok().flatten() {
            self.show_borders = borders;
        }

        // [chunks] section
        if let Some(size) = positive_int(&config, "chunks", "size") {
            self.chunk_size = size;
        }
        if let Some(border) = config.getint("chunks", "border").ok().flatten() {
            self.chunk_border = border.max(0) as i32;
        }
        if let Some(max) = config.getuint("chunks", "max_per_frame").ok().flatten() {
            self.max_chunks_per_frame = max as usize;
        }

        // [brush] section
        if let Some(size) = positive_int(&config, "brush", "size") {
            self.brush_size = size as u32;
        }
        if let Some(shape) = config.get("brush", "shape") {
            match BrushShape::parse(&shape) {
                Some(shape) => self.brush_shape = shape,
                None => warn!("Unknown brush shape '{}', keeping {}", shape, self.brush_shape.as_str()),
            }
        }

        // [history] section
        if let Some(depth) = config.getuint("history", "undo_depth").ok().flatten() {
            self.undo_depth = depth as usize;
        }

        info!(
            "Loaded config: world {}x{} ({} bedrock rows), tile {}px x{}, chunks {}+{} ({} per frame)",
            self.world_width,
            self.world_height,
            self.bedrock_rows,
            self.tile_size,
            self.zoom,
            self.chunk_size,
            self.chunk_border,
            self.max_chunks_per_frame
        );

        Ok(())
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        config.set("world", "width", Some(self.world_width.to_string()));
        config.set("world", "height", Some(self.world_height.to_string()));
        config.set("world", "bedrock_rows", Some(self.bedrock_rows.to_string()));

        config.set("render", "tile_size", Some(self.tile_size.to_string()));
        config.set("render", "zoom", Some(self.zoom.to_string()));
        config.set("render", "viewport_width", Some(self.viewport_width.to_string()));
        config.set("render", "viewport_height", Some(self.viewport_height.to_string()));
        config.set("render", "show_grid", Some(self.show_grid.to_string()));
        config.set("render", "show_borders", Some(self.show_borders.to_string()));

        config.set("chunks", "size", Some(self.chunk_size.to_string()));
        config.set("chunks", "border", Some(self.chunk_border.to_string()));
        config.set("chunks", "max_per_frame", Some(self.max_chunks_per_frame.to_string()));

        config.set("brush", "size", Some(self.brush_size.to_string()));
        config.set("brush", "shape", Some(self.brush_shape.as_str().to_string()));

        config.set("history", "undo_depth", Some(self.undo_depth.to_string()));

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }
}

fn positive_int(config: &Ini, section: &str, key: &str) -> Option<i32> {
    match config.getint(section, key).ok().flatten() {
        Some(v) if v > 0 && v <= i32::MAX as i64 => Some(v as i32),
        Some(v) => {
            warn!("Ignoring [{}] {} = {}: must be positive", section, key, v);
            None
        }
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tilecraft-{}-{}.ini", name, std::process::id()))
    }

    #[test]
    fn test_defaults() {
        let config = EditorConfig::new();
        assert_eq!((config.world_width, config.world_height), (300, 170));
        assert_eq!(config.bedrock_rows, 6);
        assert_eq!(config.chunk_size, 24);
        assert_eq!(config.max_chunks_per_frame, 3);
        assert_eq!(config.undo_depth, 500);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let path = temp_path("partial");
        std::fs::write(&path, "[world]\nwidth = 64\n\n[brush]\nshape = circle\nsize = -3\n").unwrap();
        let mut config = EditorConfig::with_path(&path);
        config.load_from_file().unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(config.world_width, 64);
        assert_eq!(config.world_height, 170);
        assert_eq!(config.brush_shape, BrushShape::Circle);
        assert_eq!(config.brush_size, 1);
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_path("roundtrip");
        let mut config = EditorConfig::with_path(&path);
        config.chunk_border = 4;
        config.show_grid = false;
        config.save_to_file().unwrap();
        let mut loaded = EditorConfig::with_path(&path);
        loaded.load_from_file().unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let mut config = EditorConfig::with_path(temp_path("missing"));
        assert!(config.load_from_file().is_err());
    }
}
