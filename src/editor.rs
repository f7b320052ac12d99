//! The editor facade.
//!
//! [`Editor`] owns the ECS [`World`] holding every editor resource and the
//! frame [`Schedule`]. Front ends drive it through plain method calls:
//!
//! - Edits borrow the world's resources as an [`EditContext`] through a
//!   cached `SystemState`, then record an undo snapshot when something changed.
//! - Bulk replacements (load, undo/redo, clear, `set_layers`) trigger
//!   [`WorldReplacedEvent`] so every derived cache is dropped.
//! - [`Editor::frame`] runs one render pass: budgeted chunk rebuilds, then
//!   compositing onto the screen canvas.

use std::error::Error;
use std::path::Path;

use bevy_ecs::observer::Observer;
use bevy_ecs::prelude::*;
use bevy_ecs::system::SystemState;
use image::RgbaImage;
use log::{debug, info};

use crate::components::blockinstance::BlockInstance;
use crate::components::gridpos::GridPos;
use crate::components::layer::Layer;
use crate::events::overlay::{Overlay, ToggleOverlayEvent, toggle_overlay_observer};
use crate::events::worldreplaced::{WorldReplacedEvent, world_replaced_observer};
use crate::resources::blockstore::BlockStore;
use crate::resources::canvas::ScreenCanvas;
use crate::resources::chunkstore::{ChunkKey, ChunkStore};
use crate::resources::clipboard::Clipboard;
use crate::resources::editorconfig::EditorConfig;
use crate::resources::framestats::FrameStats;
use crate::resources::occupancy::OccupancyIndex;
use crate::resources::overlays::RenderOverlays;
use crate::resources::spritebounds::SpriteBoundsCache;
use crate::resources::undo::UndoHistory;
use crate::resources::variantcache::VariantCache;
use crate::resources::viewport::Viewport;
use crate::resources::worldfile::WorldFile;
use crate::resources::worldgrid::{LayerMap, WorldGrid};
use crate::systems::brush::{BrushOp, BrushShape, BrushState};
use crate::systems::chunkrender::{ChunkScene, composite_visible_chunks, render_visible_chunks};
use crate::systems::export::export_png;
use crate::systems::floodfill::flood_fill;
use crate::systems::placement::{EditContext, PickedBlock};

type EditParams = (
    ResMut<'static, WorldGrid>,
    ResMut<'static, OccupancyIndex>,
    ResMut<'static, ChunkStore>,
    ResMut<'static, SpriteBoundsCache>,
    ResMut<'static, BrushState>,
    ResMut<'static, Clipboard>,
    Res<'static, BlockStore>,
);

pub struct Editor {
    world: World,
    frame: Schedule,
    edit_state: SystemState<EditParams>,
}

impl Editor {
    /// Build an editor with a fresh world (bedrock only) sized by `config`.
    pub fn new(config: EditorConfig, blocks: BlockStore) -> Self {
        let mut world = World::new();

        let mut grid = WorldGrid::new(config.world_width, config.world_height, config.bedrock_rows);
        grid.place_bedrock(&blocks.bedrock_block());

        let mut viewport = Viewport::new(config.viewport_width, config.viewport_height);
        viewport.base_tile_size = config.tile_size;
        viewport.set_zoom(config.zoom);

        let mut history = UndoHistory::new(config.undo_depth);
        history.record(grid.layers(), "New world");

        world.insert_resource(ChunkStore::new(
            config.chunk_size,
            config.chunk_border,
            config.max_chunks_per_frame,
        ));
        world.insert_resource(RenderOverlays {
            grid: config.show_grid,
            borders: config.show_borders,
        });
        world.insert_resource(ScreenCanvas::new(config.viewport_width, config.viewport_height));
        world.insert_resource(BrushState::new(config.brush_size, config.brush_shape));
        world.insert_resource(grid);
        world.insert_resource(viewport);
        world.insert_resource(history);
        world.insert_resource(blocks);
        world.insert_resource(OccupancyIndex::new());
        world.insert_resource(SpriteBoundsCache::new());
        world.insert_resource(VariantCache::new());
        world.insert_resource(Clipboard::new());
        world.insert_resource(FrameStats::default());
        world.insert_resource(config);

        world.spawn(Observer::new(world_replaced_observer));
        world.spawn(Observer::new(toggle_overlay_observer));
        world.flush();

        let mut frame = Schedule::default();
        frame.add_systems((render_visible_chunks, composite_visible_chunks).chain());

        let edit_state = SystemState::<EditParams>::new(&mut world);
        Self {
            world,
            frame,
            edit_state,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn grid(&self) -> &WorldGrid {
        self.world.resource::<WorldGrid>()
    }

    pub fn blocks(&self) -> &BlockStore {
        self.world.resource::<BlockStore>()
    }

    pub fn config(&self) -> &EditorConfig {
        self.world.resource::<EditorConfig>()
    }

    pub fn viewport(&self) -> &Viewport {
        self.world.resource::<Viewport>()
    }

    pub fn history(&self) -> &UndoHistory {
        self.world.resource::<UndoHistory>()
    }

    pub fn clipboard(&self) -> &Clipboard {
        self.world.resource::<Clipboard>()
    }

    pub fn stats(&self) -> FrameStats {
        *self.world.resource::<FrameStats>()
    }

    /// The last composited frame.
    pub fn screen(&self) -> &RgbaImage {
        self.world.resource::<ScreenCanvas>().0.image()
    }

    fn with_edit<R>(&mut self, f: impl FnOnce(&mut EditContext, &mut BrushState, &mut Clipboard) -> R) -> R {
        let (mut grid, mut index, mut chunks, mut bounds, mut brush, mut clipboard, blocks) =
            self.edit_state.get_mut(&mut self.world);
        let mut ctx = EditContext {
            grid: &mut *grid,
            index: &mut *index,
            chunks: &mut *chunks,
            bounds: &mut *bounds,
            assets: &*blocks,
        };
        f(&mut ctx, &mut *brush, &mut *clipboard)
    }

    fn record(&mut self, description: impl Into<String>) {
        let layers = self.grid().layers();
        self.world.resource_mut::<UndoHistory>().record(layers, description);
    }

    fn replace_layers(&mut self, layers: [LayerMap; 2]) {
        self.world.resource_mut::<WorldGrid>().set_layers(layers);
        self.world.trigger(WorldReplacedEvent {});
    }

    /// Place `block` with its origin at `cell` on the active layer.
    pub fn place_block(&mut self, cell: GridPos, block: &BlockInstance) -> bool {
        let placed = self.with_edit(|ctx, _, _| ctx.place_block(cell, block));
        if placed {
            self.record(format!("Place {}", block.id));
        }
        placed
    }

    /// Erase the sprite covering `cell` on the active layer.
    pub fn erase_at(&mut self, cell: GridPos) -> bool {
        let erased = self.with_edit(|ctx, _, _| ctx.erase_at(cell));
        if erased {
            self.record("Erase");
        }
        erased
    }

    /// Flood fill from `cell`, matching whatever the active layer holds
    /// there. `None` erases the region.
    pub fn flood_fill(&mut self, cell: GridPos, replacement: Option<&BlockInstance>) -> usize {
        let changed = self.with_edit(|ctx, _, _| {
            let target = ctx.grid.get(ctx.grid.active_layer(), cell).cloned();
            flood_fill(ctx, cell, target.as_ref(), replacement)
        });
        if changed > 0 {
            self.record(match replacement {
                Some(block) => format!("Fill {}", block.id),
                None => "Fill erase".to_string(),
            });
        }
        changed
    }

    pub fn set_brush(&mut self, size: u32, shape: BrushShape) {
        let mut brush = self.world.resource_mut::<BrushState>();
        brush.set_size(size);
        brush.set_shape(shape);
    }

    pub fn begin_stroke(&mut self) {
        self.world.resource_mut::<BrushState>().begin_stroke();
    }

    /// Apply the brush at `cell`. Starts a stroke when none is active.
    pub fn stroke_sample(&mut self, cell: GridPos, op: BrushOp) -> usize {
        self.with_edit(|ctx, brush, _| brush.add_sample(ctx, cell, op))
    }

    /// Finish the stroke, recording one undo step for all of it.
    pub fn end_stroke(&mut self) -> usize {
        let edits = self.with_edit(|ctx, brush, _| brush.end_stroke(ctx));
        if edits > 0 {
            self.record("Brush stroke");
        }
        edits
    }

    pub fn cycle_state(&mut self, cell: GridPos, forward: bool) -> bool {
        let changed = self.with_edit(|ctx, _, _| ctx.cycle_state_at(cell, forward));
        if changed {
            self.record("Cycle state");
        }
        changed
    }

    pub fn pick_block(&mut self, cell: GridPos) -> Option<PickedBlock> {
        self.with_edit(|ctx, _, _| ctx.pick_block(cell))
    }

    pub fn set_active_layer(&mut self, layer: Layer) {
        self.with_edit(|ctx, _, _| ctx.set_active_layer(layer));
    }

    /// Snapshot of both layers.
    pub fn get_layers(&self) -> [LayerMap; 2] {
        self.grid().layers()
    }

    /// Replace both layers and drop every cache derived from them.
    pub fn set_layers(&mut self, layers: [LayerMap; 2]) {
        self.replace_layers(layers);
        self.record("Set layers");
    }

    pub fn undo(&mut self) -> bool {
        let Some(layers) = self.world.resource_mut::<UndoHistory>().undo() else {
            return false;
        };
        self.replace_layers(layers);
        debug!("Undo to '{}'", self.history().description().unwrap_or(""));
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(layers) = self.world.resource_mut::<UndoHistory>().redo() else {
            return false;
        };
        self.replace_layers(layers);
        debug!("Redo to '{}'", self.history().description().unwrap_or(""));
        true
    }

    /// Copy the `width` x `height` selection with top-left cell `corner`.
    pub fn copy_selection(&mut self, corner: GridPos, width: i32, height: i32) -> usize {
        self.with_edit(|ctx, _, clipboard| clipboard.copy_from(ctx.grid, corner, width, height))
    }

    pub fn paste(&mut self, target: GridPos) -> usize {
        let written = self.with_edit(|ctx, _, clipboard| clipboard.paste_into(ctx, target));
        if written > 0 {
            self.record("Paste");
        }
        written
    }

    pub fn flip_clipboard(&mut self, horizontal: bool) {
        self.with_edit(|ctx, _, clipboard| {
            if horizontal {
                clipboard.flip_horizontal(ctx.bounds, ctx.assets);
            } else {
                clipboard.flip_vertical(ctx.bounds, ctx.assets);
            }
        });
    }

    /// Remove every block, then refill the bedrock rows.
    pub fn clear_world(&mut self) {
        let bedrock = self.blocks().bedrock_block();
        {
            let mut grid = self.world.resource_mut::<WorldGrid>();
            grid.clear();
            grid.place_bedrock(&bedrock);
        }
        self.world.trigger(WorldReplacedEvent {});
        self.record("Clear world");
    }

    /// Replace the world with the one stored at `path`. Clears the history.
    pub fn load_world(&mut self, path: impl AsRef<Path>) -> Result<(), Box<dyn Error>> {
        let path = path.as_ref();
        let mut grid = WorldFile::load(path)?.into_grid()?;
        grid.set_active_layer(self.grid().active_layer());
        self.world.insert_resource(grid);
        self.world.trigger(WorldReplacedEvent {});
        self.world.resource_mut::<UndoHistory>().clear();
        self.record(format!("Loaded from {}", path.display()));
        info!("World now has {} blocks", self.grid().block_count());
        Ok(())
    }

    pub fn save_world(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn Error>> {
        WorldFile::from_grid(self.grid()).save(path)
    }

    /// Render the whole world to a PNG at the base tile size.
    pub fn export_png(&mut self, path: impl AsRef<Path>) -> Result<(u32, u32), Box<dyn Error>> {
        let tile_px = self.viewport().base_tile_size;
        self.world.resource_scope(|world, mut cache: Mut<VariantCache>| {
            let scene = ChunkScene {
                grid: world.resource::<WorldGrid>(),
                assets: world.resource::<BlockStore>(),
                overlays: *world.resource::<RenderOverlays>(),
            };
            export_png(path, &scene, &mut cache, tile_px)
        })
    }

    pub fn toggle_overlay(&mut self, overlay: Overlay) {
        self.world.trigger(ToggleOverlayEvent { overlay });
    }

    pub fn invalidate_all_chunks(&mut self) {
        self.world.resource_mut::<ChunkStore>().invalidate_all();
    }

    /// Chunks overlapping the viewport.
    pub fn visible_chunks(&mut self) -> Vec<ChunkKey> {
        let view = *self.viewport();
        let (w, h) = (self.grid().width, self.grid().height);
        self.world.resource_mut::<ChunkStore>().visible_chunks(&view, w, h)
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.world.resource_mut::<Viewport>().set_zoom(zoom);
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.world.resource_mut::<Viewport>().pan(dx, dy);
    }

    pub fn look_at(&mut self, cell: GridPos) {
        self.world.resource_mut::<Viewport>().look_at(cell);
    }

    /// Run one render pass and return its counters.
    pub fn frame(&mut self) -> FrameStats {
        self.frame.run(&mut self.world);
        self.world.clear_trackers();
        self.stats()
    }
}
