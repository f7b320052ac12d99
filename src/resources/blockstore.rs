//! Block catalog and sprite storage.
//!
//! [`BlockStore`] is the editor's asset provider: it owns the block
//! definitions (tiling mode, connectable edges, placeholder color) and the
//! decoded sprite sheets keyed by block id. Rendering and occupancy code only
//! see it through the [`AssetProvider`] trait.
//!
//! Sprites are loaded from directories. The tiling mode of a loaded sprite is
//! inferred from where it sits in the folder tree:
//!
//! ```text
//! spritesSORTED/1state/...                  -> standard
//! spritesSORTED/2state/...                  -> 2state
//! spritesSORTED/4state/...                  -> 4state
//! spritesSORTED/connectables/blocks/...     -> all
//! spritesSORTED/connectables/logs/...       -> log
//! spritesSORTED/connectables/greenery/down  -> vine
//! spritesSORTED/connectables/greenery/up    -> vertical
//! ```
//!
//! Files outside that tree fall back to filename patterns.

use bevy_ecs::prelude::Resource;
use image::RgbaImage;
use log::{debug, info, warn};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::error::Error;
use std::path::{Path, PathBuf};

use crate::components::blockinstance::{BlockInstance, Category, MultiState, TileMode, TileableEdges};

/// Placeholder color used when a block has none.
pub const DEFAULT_BLOCK_COLOR: [u8; 3] = [128, 128, 128];
const CUSTOM_BLOCK_COLOR: [u8; 3] = [200, 200, 200];
const SPRITE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Read-only access to block metadata and sprite sheets.
pub trait AssetProvider {
    /// Sprite sheet for a block, if one was loaded.
    fn sprite(&self, block_id: &str) -> Option<&RgbaImage>;

    fn block_definition(&self, block_id: &str) -> Option<&BlockDefinition>;

    fn sprite_size(&self, block_id: &str) -> Option<(u32, u32)> {
        self.sprite(block_id).map(|s| s.dimensions())
    }

    /// Flat color drawn when the sprite is missing.
    fn placeholder_color(&self, block_id: &str) -> [u8; 3] {
        self.block_definition(block_id)
            .map(|d| d.color)
            .unwrap_or(DEFAULT_BLOCK_COLOR)
    }
}

/// Catalog entry describing a placeable block.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockDefinition {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub tile_mode: TileMode,
    pub tile_set: bool,
    pub tileable: TileableEdges,
    pub is_background: bool,
    pub color: [u8; 3],
    pub sprite_path: Option<PathBuf>,
}

impl BlockDefinition {
    pub fn new(id: impl Into<String>, category: Category, tile_mode: TileMode) -> Self {
        let id = id.into();
        Self {
            name: friendly_name(&id),
            id,
            category,
            tile_mode,
            tile_set: tile_mode != TileMode::Standard,
            tileable: tile_mode.default_tileable(),
            is_background: false,
            color: DEFAULT_BLOCK_COLOR,
            sprite_path: None,
        }
    }

    pub fn with_color(mut self, color: [u8; 3]) -> Self {
        self.color = color;
        self
    }

    pub fn with_tileable(mut self, tileable: TileableEdges) -> Self {
        self.tileable = tileable;
        self
    }

    /// A fresh instance ready to be placed.
    pub fn instance(&self) -> BlockInstance {
        BlockInstance {
            id: self.id.clone(),
            category: self.category,
            tile_mode: self.tile_mode,
            tile_set: self.tile_set,
            tileable: self.tileable,
            is_background: self.is_background,
            is_bedrock: false,
            multi_state: self.tile_mode.state_count().map(MultiState::new),
        }
    }
}

/// Asset provider resource: block definitions plus decoded sprites.
#[derive(Resource, Debug, Default)]
pub struct BlockStore {
    definitions: FxHashMap<String, BlockDefinition>,
    /// Insertion order, for stable listings.
    order: Vec<String>,
    sprites: FxHashMap<String, RgbaImage>,
}

impl BlockStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with the built-in block catalog.
    pub fn with_default_blocks() -> Self {
        let mut store = Self::new();
        let top_open = TileableEdges {
            top: false,
            ..TileableEdges::all()
        };
        let defaults = [
            BlockDefinition::new("dirt", Category::Terrain, TileMode::All).with_color([139, 69, 19]),
            BlockDefinition::new("grass", Category::Terrain, TileMode::All)
                .with_color([86, 125, 70])
                .with_tileable(top_open),
            BlockDefinition::new("stone", Category::Terrain, TileMode::All).with_color([128, 128, 128]),
            BlockDefinition::new("wood", Category::Terrain, TileMode::Log).with_color([139, 90, 43]),
            BlockDefinition::new("obsidian", Category::Terrain, TileMode::All).with_color([33, 11, 44]),
            BlockDefinition::new("vine", Category::Decorative, TileMode::Vine).with_color([0, 255, 0]),
            BlockDefinition::new("cactus", Category::Decorative, TileMode::Vertical).with_color([0, 200, 0]),
            BlockDefinition::new("flower_red", Category::Decorative, TileMode::Standard).with_color([255, 0, 0]),
            BlockDefinition::new("platform", Category::Interactive, TileMode::PlatformEnhanced)
                .with_color([222, 184, 135]),
            BlockDefinition::new("fence", Category::Interactive, TileMode::FenceEnhanced).with_color([160, 82, 45]),
        ];
        for def in defaults {
            store.insert_definition(def);
        }
        store
    }

    /// Add or replace a block definition.
    pub fn insert_definition(&mut self, definition: BlockDefinition) {
        if !self.definitions.contains_key(&definition.id) {
            self.order.push(definition.id.clone());
        }
        self.definitions.insert(definition.id.clone(), definition);
    }

    /// Attach a sprite sheet to a block id.
    pub fn insert_sprite(&mut self, block_id: impl Into<String>, sprite: RgbaImage) {
        self.sprites.insert(block_id.into(), sprite);
    }

    /// Definitions in insertion order.
    pub fn definitions(&self) -> impl Iterator<Item = &BlockDefinition> {
        self.order.iter().filter_map(|id| self.definitions.get(id))
    }

    pub fn blocks_in_category(&self, category: Category) -> Vec<&BlockDefinition> {
        self.definitions().filter(|d| d.category == category).collect()
    }

    /// Fresh instance of a catalog block.
    pub fn instance(&self, block_id: &str) -> Option<BlockInstance> {
        self.definitions.get(block_id).map(BlockDefinition::instance)
    }

    /// Block used to fill the protected bottom rows.
    pub fn bedrock_block(&self) -> BlockInstance {
        let base = self
            .definitions()
            .find(|d| d.id.contains("bedrock") || d.tile_mode == TileMode::BedrockPattern)
            .or_else(|| self.definitions.get("obsidian"));
        let mut block = match base {
            Some(def) => def.instance(),
            None => BlockInstance::new("obsidian", TileMode::BedrockPattern),
        };
        block.tile_mode = TileMode::BedrockPattern;
        block.tile_set = true;
        block.tileable = TileableEdges::all();
        block.is_bedrock = true;
        block
    }

    /// Recursively load every sprite under `dir` and register a custom block
    /// for each one that does not shadow a catalog block.
    ///
    /// Files that fail to decode are skipped with a warning. Returns how many
    /// sprites were loaded.
    pub fn load_sprite_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize, Box<dyn Error>> {
        let dir = dir.as_ref();
        let mut files = Vec::new();
        collect_sprite_files(dir, &mut files)?;
        files.sort();

        let mut loaded = 0;
        for path in files {
            match image::open(&path) {
                Ok(img) => {
                    let id = self.unique_sprite_id(&sprite_id_for(dir, &path));
                    self.register_sprite(&id, &path, img.into_rgba8());
                    loaded += 1;
                }
                Err(e) => warn!("Skipping sprite {}: {}", path.display(), e),
            }
        }
        info!("Loaded {} sprites from {}", loaded, dir.display());
        Ok(loaded)
    }

    fn register_sprite(&mut self, id: &str, path: &Path, sprite: RgbaImage) {
        debug!("Loaded sprite {} ({}x{}) from {}", id, sprite.width(), sprite.height(), path.display());
        self.sprites.insert(id.to_string(), sprite);
        match self.definitions.get_mut(id) {
            Some(def) => def.sprite_path = Some(path.to_path_buf()),
            None => {
                let mode = detect_tile_mode(path);
                let mut def = BlockDefinition::new(id, Category::Custom, mode).with_color(CUSTOM_BLOCK_COLOR);
                def.sprite_path = Some(path.to_path_buf());
                debug!("Block '{}' detected as '{}'", id, mode.as_str());
                self.insert_definition(def);
            }
        }
    }

    fn unique_sprite_id(&self, base: &str) -> String {
        let mut id = base.to_string();
        let mut counter = 1;
        while self.sprites.contains_key(&id) {
            id = format!("{}_{}", base, counter);
            counter += 1;
        }
        id
    }

    /// Number of loaded sprites per detected tiling mode.
    pub fn sprite_type_summary(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for def in self.definitions() {
            if self.sprites.contains_key(&def.id) {
                *counts.entry(def.tile_mode.as_str()).or_insert(0) += 1;
            }
        }
        counts
    }

    pub fn sprite_count(&self) -> usize {
        self.sprites.len()
    }
}

impl AssetProvider for BlockStore {
    fn sprite(&self, block_id: &str) -> Option<&RgbaImage> {
        self.sprites.get(block_id)
    }

    fn block_definition(&self, block_id: &str) -> Option<&BlockDefinition> {
        self.definitions.get(block_id)
    }
}

fn collect_sprite_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), Box<dyn Error>> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_sprite_files(&path, out)?;
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| SPRITE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        {
            out.push(path);
        }
    }
    Ok(())
}

/// Block id for a sprite file: `<parent>_<stem>` when nested below `root`,
/// lowercased with anything outside `[a-z0-9_]` replaced by `_`.
pub fn sprite_id_for(root: &Path, path: &Path) -> String {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("sprite");
    let parent = path
        .parent()
        .filter(|p| *p != root)
        .and_then(|p| p.file_name())
        .and_then(|p| p.to_str());
    let raw = match parent {
        Some(parent) => format!("{}_{}", parent, stem),
        None => stem.to_string(),
    };
    raw.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Infer a tiling mode from a sprite's location and file name.
pub fn detect_tile_mode(path: &Path) -> TileMode {
    let parts: Vec<&str> = path.iter().filter_map(|p| p.to_str()).collect();

    if let Some(i) = parts.iter().position(|p| *p == "spritesSORTED") {
        // Only directories count; the last component is the file itself.
        let dirs = &parts[i + 1..parts.len().saturating_sub(1).max(i + 1)];
        match dirs.first().copied() {
            Some("1state") => return TileMode::Standard,
            Some("2state") => return TileMode::TwoState,
            Some("4state") => return TileMode::FourState,
            Some("connectables") => {
                return match dirs.get(1).copied() {
                    Some("blocks") => TileMode::All,
                    Some("logs") => TileMode::Log,
                    Some("platforms") => TileMode::PlatformEnhanced,
                    Some("fences") => TileMode::FenceEnhanced,
                    Some("bedrockandwater") => TileMode::BedrockPattern,
                    Some("smallerblocks") => TileMode::SmallerBlocks,
                    Some("chain") => TileMode::Chain,
                    Some("bgs") => TileMode::BackgroundQuadrant,
                    Some("columns") => TileMode::Column,
                    Some("greenery") => match dirs.get(2).copied() {
                        Some("down") => TileMode::Vine,
                        Some("up") => TileMode::Vertical,
                        _ => TileMode::Standard,
                    },
                    _ => TileMode::Standard,
                };
            }
            _ => {}
        }
    }
    if parts.contains(&"worldbgs") {
        return TileMode::Standard;
    }

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_lowercase();
    let has = |patterns: &[&str]| patterns.iter().any(|p| name.contains(p));
    if has(&["vine", "ivy", "creeper", "hanging", "tendril"]) {
        TileMode::Vine
    } else if has(&["cactus", "bamboo", "reed"]) {
        TileMode::Vertical
    } else if has(&["platform", "ledge", "bridge"]) {
        TileMode::PlatformEnhanced
    } else if has(&["fence", "gate", "rail", "barrier"]) {
        TileMode::FenceEnhanced
    } else if has(&["dirt", "stone", "wood", "brick", "grass", "sand"]) {
        TileMode::All
    } else {
        TileMode::Standard
    }
}

/// Human-readable name from a block id: `tile_red_brick_2` -> `Red Brick`.
pub fn friendly_name(block_id: &str) -> String {
    let trimmed = ["custom_", "sprite_", "tile_"]
        .iter()
        .find_map(|p| block_id.strip_prefix(p))
        .unwrap_or(block_id);
    let words: Vec<String> = trimmed
        .split('_')
        .filter(|w| !w.is_empty() && !w.chars().all(|c| c.is_ascii_digit()))
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect();
    if words.is_empty() {
        block_id.to_string()
    } else {
        words.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_has_expected_modes() {
        let store = BlockStore::with_default_blocks();
        assert_eq!(store.block_definition("dirt").unwrap().tile_mode, TileMode::All);
        assert_eq!(store.block_definition("wood").unwrap().tile_mode, TileMode::Log);
        assert_eq!(store.block_definition("vine").unwrap().tile_mode, TileMode::Vine);
        assert!(!store.block_definition("grass").unwrap().tileable.top);
        assert!(!store.block_definition("flower_red").unwrap().tile_set);
        assert_eq!(store.blocks_in_category(Category::Interactive).len(), 2);
    }

    #[test]
    fn test_bedrock_falls_back_to_obsidian() {
        let store = BlockStore::with_default_blocks();
        let bedrock = store.bedrock_block();
        assert_eq!(bedrock.id, "obsidian");
        assert_eq!(bedrock.tile_mode, TileMode::BedrockPattern);
        assert!(bedrock.is_bedrock);
    }

    #[test]
    fn test_detect_sorted_folders() {
        let mode = |p: &str| detect_tile_mode(Path::new(p));
        assert_eq!(mode("art/spritesSORTED/2state/lever.png"), TileMode::TwoState);
        assert_eq!(mode("art/spritesSORTED/connectables/logs/oak.png"), TileMode::Log);
        assert_eq!(mode("art/spritesSORTED/connectables/greenery/down/moss.png"), TileMode::Vine);
        assert_eq!(mode("art/spritesSORTED/connectables/greenery/up/reeds.png"), TileMode::Vertical);
        assert_eq!(mode("art/spritesSORTED/connectables/bgs/cave.png"), TileMode::BackgroundQuadrant);
        assert_eq!(mode("art/spritesSORTED/connectables/dirt.png"), TileMode::Standard);
    }

    #[test]
    fn test_detect_filename_patterns() {
        let mode = |p: &str| detect_tile_mode(Path::new(p));
        assert_eq!(mode("misc/hanging_ivy.png"), TileMode::Vine);
        assert_eq!(mode("misc/bamboo.png"), TileMode::Vertical);
        assert_eq!(mode("misc/rope_bridge.png"), TileMode::PlatformEnhanced);
        assert_eq!(mode("misc/red_brick.png"), TileMode::All);
        assert_eq!(mode("worldbgs/dirt_wall.png"), TileMode::Standard);
        assert_eq!(mode("misc/torch.png"), TileMode::Standard);
    }

    #[test]
    fn test_sprite_id_includes_parent_folder() {
        let root = Path::new("assets");
        assert_eq!(sprite_id_for(root, Path::new("assets/logs/Oak Log.png")), "logs_oak_log");
        assert_eq!(sprite_id_for(root, Path::new("assets/torch.png")), "torch");
    }

    #[test]
    fn test_friendly_name() {
        assert_eq!(friendly_name("tile_red_brick_2"), "Red Brick");
        assert_eq!(friendly_name("flower_red"), "Flower Red");
        assert_eq!(friendly_name("42"), "42");
    }

    #[test]
    fn test_load_sprite_dir_registers_custom_blocks() {
        let root = std::env::temp_dir().join(format!("tilecraft_sprites_{}", std::process::id()));
        let logs = root.join("spritesSORTED").join("connectables").join("logs");
        std::fs::create_dir_all(&logs).unwrap();
        RgbaImage::new(128, 48).save(logs.join("oak.png")).unwrap();
        RgbaImage::new(16, 16).save(root.join("dirt.png")).unwrap();

        let mut store = BlockStore::with_default_blocks();
        let loaded = store.load_sprite_dir(&root).unwrap();
        std::fs::remove_dir_all(&root).ok();

        assert_eq!(loaded, 2);
        let oak = store.block_definition("logs_oak").unwrap();
        assert_eq!(oak.tile_mode, TileMode::Log);
        assert_eq!(oak.category, Category::Custom);
        // A sprite named after a catalog block attaches to it instead of
        // creating a new block.
        assert_eq!(store.block_definition("dirt").unwrap().category, Category::Terrain);
        assert_eq!(store.sprite_size("dirt"), Some((16, 16)));
        assert_eq!(store.sprite_type_summary().get("log"), Some(&1));
    }
}
