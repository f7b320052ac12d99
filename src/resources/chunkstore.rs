//! Chunk partitioning and dirty tracking.
//!
//! The world is cut into square chunks of `chunk_size` cells. Each chunk owns
//! a cached image of its cells plus a `border` margin on every side, so sprites
//! that bleed across a seam are drawn in full by both chunks. The image is a
//! pure cache: it can be dropped at any time and is rebuilt by
//! [`render_chunk`](crate::systems::chunkrender::render_chunk) when the chunk
//! is dirty, the render parameters changed or the cells under it changed.
//!
//! Chunks are created lazily on first reference and never removed.

use std::hash::{Hash, Hasher};

use bevy_ecs::prelude::Resource;
use image::RgbaImage;
use image::imageops::{self, FilterType};
use log::debug;
use rustc_hash::{FxHashMap, FxHashSet, FxHasher};

use crate::components::gridpos::GridPos;
use crate::components::layer::Layer;
use crate::resources::viewport::{RenderParams, Viewport};
use crate::resources::worldgrid::WorldGrid;

pub const DEFAULT_CHUNK_SIZE: i32 = 24;
pub const DEFAULT_CHUNK_BORDER: i32 = 8;
pub const DEFAULT_MAX_CHUNKS_PER_FRAME: usize = 3;

/// Chunk coordinates `(chunk_x, chunk_y)`.
pub type ChunkKey = (i32, i32);

/// Inclusive-exclusive rectangle of cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl CellRect {
    pub fn contains(&self, pos: GridPos) -> bool {
        pos.x >= self.x0 && pos.x < self.x1 && pos.y >= self.y0 && pos.y < self.y1
    }

    /// Intersection with the world rectangle.
    pub fn clamp_to(&self, width: i32, height: i32) -> CellRect {
        CellRect {
            x0: self.x0.max(0),
            y0: self.y0.max(0),
            x1: self.x1.min(width),
            y1: self.y1.min(height),
        }
    }
}

/// A cached, independently re-rendered square of the world.
#[derive(Debug)]
pub struct Chunk {
    pub chunk_x: i32,
    pub chunk_y: i32,
    pub size: i32,
    pub border: i32,
    pub dirty: bool,
    pub(crate) image: Option<RgbaImage>,
    pub content_hash: Option<u64>,
    pub last_zoom: Option<f32>,
    pub last_tile_size: Option<u32>,
    /// Image resized for the current zoom, rebuilt on demand.
    scaled: Option<(u32, RgbaImage)>,
    /// How many times the image was rebuilt.
    pub render_count: u64,
}

impl Chunk {
    pub fn new(chunk_x: i32, chunk_y: i32, size: i32, border: i32) -> Self {
        Self {
            chunk_x,
            chunk_y,
            size,
            border,
            dirty: true,
            image: None,
            content_hash: None,
            last_zoom: None,
            last_tile_size: None,
            scaled: None,
            render_count: 0,
        }
    }

    pub fn key(&self) -> ChunkKey {
        (self.chunk_x, self.chunk_y)
    }

    /// Cells owned by this chunk, without the border.
    pub fn owned_area(&self) -> CellRect {
        let x0 = self.chunk_x * self.size;
        let y0 = self.chunk_y * self.size;
        CellRect {
            x0,
            y0,
            x1: x0 + self.size,
            y1: y0 + self.size,
        }
    }

    /// Cells drawn into the cached image, border included.
    pub fn expanded_area(&self) -> CellRect {
        let owned = self.owned_area();
        CellRect {
            x0: owned.x0 - self.border,
            y0: owned.y0 - self.border,
            x1: owned.x1 + self.border,
            y1: owned.y1 + self.border,
        }
    }

    /// Side of the cached image, in cells.
    pub fn expanded_cells(&self) -> i32 {
        self.size + 2 * self.border
    }

    pub fn image(&self) -> Option<&RgbaImage> {
        self.image.as_ref()
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Dirty and forget the content hash, so the next render rebuilds even
    /// if nothing in the footprint changed.
    pub fn force_dirty(&mut self) {
        self.dirty = true;
        self.content_hash = None;
    }

    /// Drop every cached artifact.
    pub fn reset(&mut self) {
        self.dirty = true;
        self.content_hash = None;
        self.last_zoom = None;
        self.last_tile_size = None;
        self.image = None;
        self.scaled = None;
    }

    /// Hash of `(x, y, layer, id, state)` for every block in the expanded
    /// footprint, background layer first, columns outer.
    pub fn compute_hash(&self, grid: &WorldGrid) -> u64 {
        let area = self.expanded_area();
        let mut hasher = FxHasher::default();
        for layer in Layer::ORDER {
            let blocks = grid.layer(layer);
            for x in area.x0..area.x1 {
                for y in area.y0..area.y1 {
                    if let Some(block) = blocks.get(&GridPos::new(x, y)) {
                        (x, y, layer.index()).hash(&mut hasher);
                        block.id.hash(&mut hasher);
                        block.state().hash(&mut hasher);
                    }
                }
            }
        }
        hasher.finish()
    }

    /// Whether the cached image is unusable for `params` given the current
    /// content hash.
    pub fn is_stale(&self, current_hash: u64, params: RenderParams) -> bool {
        self.dirty
            || self.image.is_none()
            || self.last_zoom != Some(params.zoom)
            || self.last_tile_size != Some(params.base_tile_size)
            || self.content_hash != Some(current_hash)
    }

    pub fn needs_rerender(&self, grid: &WorldGrid, params: RenderParams) -> bool {
        self.is_stale(self.compute_hash(grid), params)
    }

    /// Install a freshly rendered image and mark the chunk clean.
    pub(crate) fn store_render(&mut self, image: RgbaImage, hash: u64, params: RenderParams) {
        self.image = Some(image);
        self.scaled = None;
        self.content_hash = Some(hash);
        self.last_zoom = Some(params.zoom);
        self.last_tile_size = Some(params.base_tile_size);
        self.dirty = false;
        self.render_count += 1;
    }

    /// Cached image at `tile_px` pixels per cell, resizing the base image
    /// once per zoom level.
    pub fn display_image(&mut self, tile_px: u32) -> Option<&RgbaImage> {
        let base = self.last_tile_size?;
        if tile_px == base {
            return self.image.as_ref();
        }
        let fresh = matches!(&self.scaled, Some((px, _)) if *px == tile_px);
        if !fresh {
            let image = self.image.as_ref()?;
            let side = self.expanded_cells() as u32 * tile_px;
            self.scaled = Some((tile_px, imageops::resize(image, side, side, FilterType::Nearest)));
        }
        self.scaled.as_ref().map(|(_, img)| img)
    }
}

/// All chunks plus the queue of chunks an edit wants redrawn right away.
#[derive(Resource, Debug)]
pub struct ChunkStore {
    chunks: FxHashMap<ChunkKey, Chunk>,
    pub chunk_size: i32,
    pub border: i32,
    pub max_chunks_per_frame: usize,
    immediate: FxHashSet<ChunkKey>,
}

impl Default for ChunkStore {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_BORDER, DEFAULT_MAX_CHUNKS_PER_FRAME)
    }
}

impl ChunkStore {
    pub fn new(chunk_size: i32, border: i32, max_chunks_per_frame: usize) -> Self {
        assert!(chunk_size > 0, "chunk size must be positive, got {chunk_size}");
        assert!(border >= 0, "chunk border must not be negative, got {border}");
        Self {
            chunks: FxHashMap::default(),
            chunk_size,
            border,
            max_chunks_per_frame,
            immediate: FxHashSet::default(),
        }
    }

    /// Chunk owning a cell.
    pub fn chunk_key(&self, pos: GridPos) -> ChunkKey {
        (pos.x.div_euclid(self.chunk_size), pos.y.div_euclid(self.chunk_size))
    }

    pub fn get_or_create(&mut self, key: ChunkKey) -> &mut Chunk {
        let (size, border) = (self.chunk_size, self.border);
        self.chunks
            .entry(key)
            .or_insert_with(|| Chunk::new(key.0, key.1, size, border))
    }

    pub fn get(&self, key: ChunkKey) -> Option<&Chunk> {
        self.chunks.get(&key)
    }

    pub fn get_mut(&mut self, key: ChunkKey) -> Option<&mut Chunk> {
        self.chunks.get_mut(&key)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// The chunk `key` and its eight neighbors.
    pub fn neighborhood(key: ChunkKey) -> impl Iterator<Item = ChunkKey> {
        (-1..=1).flat_map(move |dy| (-1..=1).map(move |dx| (key.0 + dx, key.1 + dy)))
    }

    /// Mark the chunk owning `pos` and its eight neighbors dirty.
    pub fn invalidate(&mut self, pos: GridPos) {
        let key = self.chunk_key(pos);
        for k in Self::neighborhood(key) {
            self.get_or_create(k).mark_dirty();
        }
    }

    /// Drop every cached image and hash.
    pub fn invalidate_all(&mut self) {
        for chunk in self.chunks.values_mut() {
            chunk.reset();
        }
        debug!("Invalidated all {} chunks", self.chunks.len());
    }

    /// Force the chunks around `pos` to rebuild on the next frame, outside the
    /// per-frame budget.
    pub fn mark_for_immediate_render(&mut self, pos: GridPos) {
        let key = self.chunk_key(pos);
        for k in Self::neighborhood(key) {
            self.get_or_create(k).force_dirty();
            self.immediate.insert(k);
        }
    }

    /// Force-invalidate specific chunks and queue them for immediate render.
    pub fn force_invalidate<I: IntoIterator<Item = ChunkKey>>(&mut self, keys: I) {
        for key in keys {
            self.get_or_create(key).force_dirty();
            self.immediate.insert(key);
        }
    }

    pub fn pending_immediate(&self) -> usize {
        self.immediate.len()
    }

    pub(crate) fn take_immediate(&mut self) -> FxHashSet<ChunkKey> {
        std::mem::take(&mut self.immediate)
    }

    /// Chunks intersecting the viewport (padded by two cells), clamped to the
    /// world, in row-major order. Creates the chunks if needed.
    pub fn visible_chunks(&mut self, view: &Viewport, world_width: i32, world_height: i32) -> Vec<ChunkKey> {
        let ts = view.effective_tile_size() as f32;
        let pad = 2.0 * ts;
        let start_x = (((view.camera_x - pad) / ts).floor() as i32).max(0);
        let start_y = (((view.camera_y - pad) / ts).floor() as i32).max(0);
        let end_x = (((view.camera_x + view.width as f32 + pad) / ts).ceil() as i32).min(world_width);
        let end_y = (((view.camera_y + view.height as f32 + pad) / ts).ceil() as i32).min(world_height);
        if start_x >= end_x || start_y >= end_y {
            return Vec::new();
        }

        let first = self.chunk_key(GridPos::new(start_x, start_y));
        let last = self.chunk_key(GridPos::new(end_x - 1, end_y - 1));
        let mut keys = Vec::with_capacity(((last.0 - first.0 + 1) * (last.1 - first.1 + 1)) as usize);
        for cy in first.1..=last.1 {
            for cx in first.0..=last.0 {
                self.get_or_create((cx, cy));
                keys.push((cx, cy));
            }
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_key_floors_negative_cells() {
        let store = ChunkStore::new(16, 2, 3);
        assert_eq!(store.chunk_key(GridPos::new(0, 0)), (0, 0));
        assert_eq!(store.chunk_key(GridPos::new(15, 16)), (0, 1));
        assert_eq!(store.chunk_key(GridPos::new(-1, -17)), (-1, -2));
    }

    #[test]
    #[should_panic]
    fn test_zero_chunk_size_is_rejected() {
        ChunkStore::new(0, 0, 1);
    }

    #[test]
    fn test_invalidate_marks_neighborhood() {
        let mut store = ChunkStore::new(8, 2, 3);
        store.invalidate(GridPos::new(20, 20));
        assert_eq!(store.len(), 9);
        for cy in 1..=3 {
            for cx in 1..=3 {
                assert!(store.get((cx, cy)).unwrap().dirty);
            }
        }
    }

    #[test]
    fn test_expanded_area_includes_border() {
        let chunk = Chunk::new(1, 0, 10, 3);
        assert_eq!(chunk.owned_area(), CellRect { x0: 10, y0: 0, x1: 20, y1: 10 });
        assert_eq!(chunk.expanded_area(), CellRect { x0: 7, y0: -3, x1: 23, y1: 13 });
        assert_eq!(chunk.expanded_cells(), 16);
    }

    #[test]
    fn test_hash_sees_blocks_in_border() {
        use crate::components::blockinstance::{BlockInstance, TileMode};
        let chunk = Chunk::new(0, 0, 4, 2);
        let mut grid = WorldGrid::new(20, 20, 0);
        let empty = chunk.compute_hash(&grid);
        grid.insert(Layer::Midground, GridPos::new(5, 1), &BlockInstance::new("dirt", TileMode::All));
        let with_border_block = chunk.compute_hash(&grid);
        assert_ne!(empty, with_border_block);
        grid.insert(Layer::Midground, GridPos::new(9, 1), &BlockInstance::new("dirt", TileMode::All));
        assert_eq!(chunk.compute_hash(&grid), with_border_block);
    }

    #[test]
    fn test_hash_tracks_state() {
        use crate::components::blockinstance::{BlockInstance, TileMode};
        let chunk = Chunk::new(0, 0, 4, 0);
        let mut grid = WorldGrid::new(20, 20, 0);
        let lever = BlockInstance::new("lever", TileMode::TwoState);
        grid.insert(Layer::Background, GridPos::new(1, 1), &lever);
        let before = chunk.compute_hash(&grid);
        grid.get_mut(Layer::Background, GridPos::new(1, 1)).unwrap().cycle_state(true);
        assert_ne!(chunk.compute_hash(&grid), before);
    }

    #[test]
    fn test_visible_chunks_clamped_to_world() {
        let mut store = ChunkStore::new(10, 0, 3);
        let mut view = Viewport::new(320, 160);
        view.zoom = 1.0;
        // 20 x 10 cells on screen plus 2 cells of padding: cells 0..22 x 0..12.
        let keys = store.visible_chunks(&view, 100, 100);
        assert_eq!(keys, vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);

        view.camera_x = -10_000.0;
        assert!(store.visible_chunks(&view, 100, 100).is_empty());
    }

    #[test]
    fn test_reset_drops_cached_state() {
        let mut chunk = Chunk::new(0, 0, 4, 0);
        let params = RenderParams {
            base_tile_size: 16,
            zoom: 1.0,
        };
        chunk.store_render(RgbaImage::new(64, 64), 7, params);
        assert!(!chunk.is_stale(7, params));
        assert!(chunk.is_stale(8, params));
        chunk.reset();
        assert!(chunk.image().is_none());
        assert!(chunk.is_stale(7, params));
    }
}
