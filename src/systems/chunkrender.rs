//! Chunk rebuild and compositing.
//!
//! Each frame [`render_visible_chunks`] rebuilds stale visible chunks:
//!
//! 1. Chunks queued by an edit (see
//!    [`ChunkStore::mark_for_immediate_render`]) are rebuilt first, without
//!    counting against the budget.
//! 2. The remaining stale chunks are rebuilt nearest-to-centre first, at most
//!    `max_chunks_per_frame` of them. The rest wait for a later frame.
//!
//! [`composite_visible_chunks`] then blits each chunk's owned area onto the
//! [`ScreenCanvas`]. Chunk images are drawn at the base tile size and resized
//! for the current zoom when composited.

use std::cmp::Reverse;

use bevy_ecs::prelude::*;
use image::Rgba;
use log::{debug, trace};
use rustc_hash::FxHashSet;

use crate::components::blockinstance::BlockInstance;
use crate::components::gridpos::GridPos;
use crate::components::layer::Layer;
use crate::resources::blockstore::{AssetProvider, BlockStore};
use crate::resources::canvas::{Canvas, ClipRect, RenderTarget, ScreenCanvas};
use crate::resources::chunkstore::{CellRect, Chunk, ChunkKey, ChunkStore};
use crate::resources::framestats::FrameStats;
use crate::resources::overlays::RenderOverlays;
use crate::resources::variantcache::VariantCache;
use crate::resources::viewport::{RenderParams, Viewport};
use crate::resources::worldgrid::WorldGrid;
use crate::systems::tiledraw::TilePainter;

/// Fill behind every rendered chunk and exported world.
pub const CLEAR_COLOR: Rgba<u8> = Rgba([17, 17, 17, 255]);
/// Screen area outside the world.
pub const BACKDROP_COLOR: Rgba<u8> = Rgba([40, 40, 40, 255]);
pub const GRID_COLOR: Rgba<u8> = Rgba([70, 70, 70, 255]);

/// Read-only inputs of a chunk rebuild.
pub struct ChunkScene<'a> {
    pub grid: &'a WorldGrid,
    pub assets: &'a dyn AssetProvider,
    pub overlays: RenderOverlays,
}

/// Grid lines for the cells of `area`, drawn with `area`'s top-left corner at
/// pixel `(0, 0)`. Lines are only drawn inside the world.
pub fn draw_grid_lines<T: RenderTarget + ?Sized>(
    target: &mut T,
    area: CellRect,
    world_width: i32,
    world_height: i32,
    tile_px: u32,
) {
    let ts = tile_px as i64;
    let (cols, rows) = ((area.x1 - area.x0) as i64, (area.y1 - area.y0) as i64);

    let y_start = (-(area.y0 as i64) * ts).max(0);
    let y_end = (rows * ts).min((world_height - area.y0) as i64 * ts);
    if y_end > y_start {
        for local_x in 0..=cols {
            let world_x = area.x0 as i64 + local_x;
            if (0..world_width as i64).contains(&world_x) {
                target.fill_rect(local_x * ts, y_start, 1, (y_end - y_start) as u32, GRID_COLOR);
            }
        }
    }

    let x_start = (-(area.x0 as i64) * ts).max(0);
    let x_end = (cols * ts).min((world_width - area.x0) as i64 * ts);
    if x_end > x_start {
        for local_y in 0..=rows {
            let world_y = area.y0 as i64 + local_y;
            if (0..world_height as i64).contains(&world_y) {
                target.fill_rect(x_start, local_y * ts, (x_end - x_start) as u32, 1, GRID_COLOR);
            }
        }
    }
}

/// Blocks of one layer whose origin lies in `area`, in paint order.
pub fn blocks_in_paint_order<'g>(grid: &'g WorldGrid, layer: Layer, area: CellRect) -> Vec<(GridPos, &'g BlockInstance)> {
    let mut blocks: Vec<_> = grid
        .layer(layer)
        .iter()
        .filter(|(pos, _)| area.contains(**pos))
        .map(|(pos, block)| (*pos, block))
        .collect();
    blocks.sort_by_key(|(pos, block)| (!block.is_background, !block.is_bedrock, Reverse(pos.y), pos.x));
    blocks
}

/// Paint both layers for the cells of `area`, with cell `origin` at pixel
/// `(0, 0)`. `area` must already be clamped to the world.
pub fn paint_blocks<T: RenderTarget + ?Sized>(
    target: &mut T,
    scene: &ChunkScene,
    cache: &mut VariantCache,
    area: CellRect,
    origin: GridPos,
    tile_px: u32,
) {
    let ts = tile_px as i64;
    for layer in Layer::ORDER {
        let painter = TilePainter {
            layer: scene.grid.layer(layer),
            assets: scene.assets,
            show_borders: scene.overlays.borders,
        };
        for (pos, block) in blocks_in_paint_order(scene.grid, layer, area) {
            let x = (pos.x - origin.x) as i64 * ts;
            let y = (pos.y - origin.y) as i64 * ts;
            painter.draw_block(target, cache, pos, block, x, y, tile_px);
        }
    }
}

/// Rebuild `chunk` if it is stale. Returns whether it was rebuilt.
pub fn render_chunk(chunk: &mut Chunk, scene: &ChunkScene, cache: &mut VariantCache, params: RenderParams) -> bool {
    let hash = chunk.compute_hash(scene.grid);
    if !chunk.is_stale(hash, params) {
        return false;
    }
    rebuild(chunk, scene, cache, params, hash);
    true
}

fn rebuild(chunk: &mut Chunk, scene: &ChunkScene, cache: &mut VariantCache, params: RenderParams, hash: u64) {
    let ts = params.base_tile_size;
    let side = chunk.expanded_cells() as u32 * ts;
    let mut canvas = Canvas::filled(side, side, CLEAR_COLOR);
    let area = chunk.expanded_area();
    let (w, h) = (scene.grid.width, scene.grid.height);

    if scene.overlays.grid {
        draw_grid_lines(&mut canvas, area, w, h, ts);
    }
    paint_blocks(&mut canvas, scene, cache, area.clamp_to(w, h), GridPos::new(area.x0, area.y0), ts);

    chunk.store_render(canvas.into_image(), hash, params);
    trace!("Rendered chunk {:?} (#{})", chunk.key(), chunk.render_count);
}

/// Rebuild the stale chunks among `visible`.
///
/// Returns `(immediate, budgeted)` rebuild counts.
pub fn render_pass(
    store: &mut ChunkStore,
    visible: &[ChunkKey],
    scene: &ChunkScene,
    cache: &mut VariantCache,
    params: RenderParams,
) -> (usize, usize) {
    let visible_set: FxHashSet<ChunkKey> = visible.iter().copied().collect();

    let mut queued: Vec<ChunkKey> = store.take_immediate().into_iter().collect();
    queued.sort_unstable();
    let mut immediate = 0;
    let mut handled = FxHashSet::default();
    for key in queued {
        // Off-screen chunks stay dirty and go through the budget once visible.
        if !visible_set.contains(&key) {
            continue;
        }
        handled.insert(key);
        if render_chunk(store.get_or_create(key), scene, cache, params) {
            immediate += 1;
        }
    }

    let budget = store.max_chunks_per_frame;
    if budget == 0 || visible.is_empty() {
        return (immediate, 0);
    }
    let n = visible.len() as f32;
    let cx = visible.iter().map(|k| k.0 as f32 + 0.5).sum::<f32>() / n;
    let cy = visible.iter().map(|k| k.1 as f32 + 0.5).sum::<f32>() / n;

    let mut stale: Vec<(f32, ChunkKey, u64)> = Vec::new();
    for key in visible.iter().filter(|key| !handled.contains(*key)) {
        let chunk = store.get_or_create(*key);
        let hash = chunk.compute_hash(scene.grid);
        if chunk.is_stale(hash, params) {
            let dx = key.0 as f32 + 0.5 - cx;
            let dy = key.1 as f32 + 0.5 - cy;
            stale.push((dx * dx + dy * dy, *key, hash));
        }
    }
    stale.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    let deferred = stale.len().saturating_sub(budget);
    let mut budgeted = 0;
    for (_, key, hash) in stale.into_iter().take(budget) {
        rebuild(store.get_or_create(key), scene, cache, params, hash);
        budgeted += 1;
    }
    if deferred > 0 {
        debug!("Chunk budget reached, {} chunks deferred", deferred);
    }
    (immediate, budgeted)
}

/// Blit the owned area of each visible chunk to `target`. Returns the number
/// of chunks drawn.
pub fn composite_chunks<T: RenderTarget + ?Sized>(
    target: &mut T,
    store: &mut ChunkStore,
    visible: &[ChunkKey],
    view: &Viewport,
) -> usize {
    let ets = view.effective_tile_size();
    let ts = ets as i64;
    let cam_x = view.camera_x.round() as i64;
    let cam_y = view.camera_y.round() as i64;
    let mut drawn = 0;
    for key in visible {
        let Some(chunk) = store.get_mut(*key) else {
            continue;
        };
        let owned = chunk.owned_area();
        let expanded = chunk.expanded_area();
        let side = (chunk.size as i64 * ts) as u32;
        let Some(image) = chunk.display_image(ets) else {
            continue;
        };
        target.set_clip(Some(ClipRect {
            x: owned.x0 as i64 * ts - cam_x,
            y: owned.y0 as i64 * ts - cam_y,
            w: side,
            h: side,
        }));
        target.blit(image, expanded.x0 as i64 * ts - cam_x, expanded.y0 as i64 * ts - cam_y);
        drawn += 1;
    }
    target.set_clip(None);
    drawn
}

/// Budgeted rebuild of the visible chunks.
pub fn render_visible_chunks(
    mut chunks: ResMut<ChunkStore>,
    mut cache: ResMut<VariantCache>,
    mut stats: ResMut<FrameStats>,
    grid: Res<WorldGrid>,
    blocks: Res<BlockStore>,
    view: Res<Viewport>,
    overlays: Res<RenderOverlays>,
) {
    let visible = chunks.visible_chunks(&view, grid.width, grid.height);
    let scene = ChunkScene {
        grid: &grid,
        assets: &*blocks,
        overlays: *overlays,
    };
    let (immediate, budgeted) = render_pass(&mut chunks, &visible, &scene, &mut cache, view.render_params());
    stats.record(visible.len(), immediate, budgeted);
}

/// Draw the cached chunk images onto the screen canvas.
pub fn composite_visible_chunks(
    mut chunks: ResMut<ChunkStore>,
    mut screen: ResMut<ScreenCanvas>,
    grid: Res<WorldGrid>,
    view: Res<Viewport>,
) {
    let visible = chunks.visible_chunks(&view, grid.width, grid.height);
    screen.0.clear(BACKDROP_COLOR);
    composite_chunks(&mut screen.0, &mut chunks, &visible, &view);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::blockinstance::TileMode;

    fn scene_with<'a>(grid: &'a WorldGrid, assets: &'a BlockStore, grid_lines: bool) -> ChunkScene<'a> {
        ChunkScene {
            grid,
            assets,
            overlays: RenderOverlays {
                grid: grid_lines,
                borders: false,
            },
        }
    }

    fn params() -> RenderParams {
        RenderParams {
            base_tile_size: 4,
            zoom: 1.0,
        }
    }

    #[test]
    fn test_second_render_is_noop() {
        let grid = WorldGrid::new(16, 16, 0);
        let assets = BlockStore::with_default_blocks();
        let scene = scene_with(&grid, &assets, false);
        let mut cache = VariantCache::new();
        let mut chunk = Chunk::new(0, 0, 8, 1);
        assert!(render_chunk(&mut chunk, &scene, &mut cache, params()));
        assert!(!chunk.dirty);
        assert!(!render_chunk(&mut chunk, &scene, &mut cache, params()));
        assert_eq!(chunk.render_count, 1);
        assert_eq!(chunk.image().map(|i| i.dimensions()), Some((40, 40)));
    }

    #[test]
    fn test_zoom_change_rebuilds() {
        let grid = WorldGrid::new(16, 16, 0);
        let assets = BlockStore::with_default_blocks();
        let scene = scene_with(&grid, &assets, false);
        let mut cache = VariantCache::new();
        let mut chunk = Chunk::new(0, 0, 8, 0);
        render_chunk(&mut chunk, &scene, &mut cache, params());
        let zoomed = RenderParams { zoom: 2.0, ..params() };
        assert!(render_chunk(&mut chunk, &scene, &mut cache, zoomed));
    }

    #[test]
    fn test_grid_lines_stop_at_world_edge() {
        let mut canvas = Canvas::new(40, 40);
        // Ten cells from -2 to 8 in a world 4 cells wide and tall.
        let area = CellRect { x0: -2, y0: -2, x1: 8, y1: 8 };
        draw_grid_lines(&mut canvas, area, 4, 4, 4);
        let img = canvas.image();
        // First line of the world at local cell 2.
        assert_eq!(*img.get_pixel(8, 9), GRID_COLOR);
        assert_eq!(img.get_pixel(4, 9)[3], 0);
        // Nothing past the world's bottom edge.
        assert_eq!(img.get_pixel(8, 30)[3], 0);
    }

    #[test]
    fn test_paint_order_background_first_then_descending_y() {
        let mut grid = WorldGrid::new(10, 10, 0);
        let dirt = BlockInstance::new("dirt", TileMode::All);
        grid.insert(Layer::Midground, GridPos::new(0, 2), &dirt);
        grid.insert(Layer::Midground, GridPos::new(0, 5), &dirt);
        grid.insert(Layer::Midground, GridPos::new(3, 1), &dirt.clone().with_background(true));
        let area = CellRect { x0: 0, y0: 0, x1: 10, y1: 10 };
        let order: Vec<GridPos> = blocks_in_paint_order(&grid, Layer::Midground, area)
            .into_iter()
            .map(|(p, _)| p)
            .collect();
        assert_eq!(order, vec![GridPos::new(3, 1), GridPos::new(0, 5), GridPos::new(0, 2)]);
    }

    #[test]
    fn test_budget_limits_rebuilds() {
        let grid = WorldGrid::new(64, 64, 0);
        let assets = BlockStore::with_default_blocks();
        let scene = scene_with(&grid, &assets, false);
        let mut cache = VariantCache::new();
        let mut store = ChunkStore::new(8, 0, 2);
        let visible: Vec<ChunkKey> = (0..3).flat_map(|y| (0..3).map(move |x| (x, y))).collect();
        for key in &visible {
            store.get_or_create(*key);
        }
        assert_eq!(render_pass(&mut store, &visible, &scene, &mut cache, params()), (0, 2));
        // Nearest the centre goes first.
        assert_eq!(store.get((1, 1)).map(|c| c.render_count), Some(1));
        let mut total = 2;
        while total < visible.len() {
            let (_, budgeted) = render_pass(&mut store, &visible, &scene, &mut cache, params());
            assert!(budgeted <= 2);
            total += budgeted;
        }
        assert_eq!(render_pass(&mut store, &visible, &scene, &mut cache, params()), (0, 0));
    }

    #[test]
    fn test_immediate_chunks_skip_budget() {
        let grid = WorldGrid::new(64, 64, 0);
        let assets = BlockStore::with_default_blocks();
        let scene = scene_with(&grid, &assets, false);
        let mut cache = VariantCache::new();
        let mut store = ChunkStore::new(8, 0, 1);
        let visible: Vec<ChunkKey> = (0..4).flat_map(|y| (0..4).map(move |x| (x, y))).collect();
        store.mark_for_immediate_render(GridPos::new(12, 12));
        let (immediate, budgeted) = render_pass(&mut store, &visible, &scene, &mut cache, params());
        assert_eq!(immediate, 9);
        assert_eq!(budgeted, 1);
        assert_eq!(store.pending_immediate(), 0);
    }
}
