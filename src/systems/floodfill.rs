//! Batched flood fill.
//!
//! The fill runs in two steps. First a depth-first search collects the
//! 4-connected region of cells matching the seed: the same block id, or empty
//! when the seed is empty. The search stays inside the world and above the
//! bedrock rows.
//!
//! Then the region is rewritten in one batch:
//!
//! - Erasing removes the matched blocks.
//! - Replacing snaps every matched cell onto a single sprite grid anchored at
//!   the bottom-left of the usable area, keeps one placement per grid cell,
//!   skips placements that would overlap a remaining sprite and inserts the
//!   rest.
//!
//! Chunks are invalidated once, after the batch.

use arrayvec::ArrayVec;
use log::{debug, info};
use rustc_hash::FxHashSet;

use crate::components::blockinstance::BlockInstance;
use crate::components::gridpos::GridPos;
use crate::resources::worldgrid::{LayerMap, WorldGrid};
use crate::systems::placement::EditContext;

/// In-world, non-bedrock orthogonal neighbours of `pos`.
fn neighbors4(grid: &WorldGrid, pos: GridPos) -> ArrayVec<GridPos, 4> {
    [(1, 0), (-1, 0), (0, 1), (0, -1)]
        .into_iter()
        .map(|(dx, dy)| pos.offset(dx, dy))
        .filter(|p| grid.is_editable(*p))
        .collect()
}

fn matches_seed(layer: &LayerMap, pos: GridPos, target: Option<&BlockInstance>) -> bool {
    match (target, layer.get(&pos)) {
        (None, None) => true,
        (Some(t), Some(current)) => t.id == current.id,
        _ => false,
    }
}

/// Cells connected to `start` that match `target` on the active layer.
pub fn matching_region(grid: &WorldGrid, start: GridPos, target: Option<&BlockInstance>) -> FxHashSet<GridPos> {
    let layer = grid.layer(grid.active_layer());
    let mut region = FxHashSet::default();
    if !grid.is_editable(start) {
        return region;
    }
    let mut visited = FxHashSet::default();
    let mut stack = vec![start];
    while let Some(pos) = stack.pop() {
        if !visited.insert(pos) || !matches_seed(layer, pos, target) {
            continue;
        }
        region.insert(pos);
        stack.extend(neighbors4(grid, pos).into_iter().filter(|n| !visited.contains(n)));
    }
    region
}

/// Fill the region around `start` that matches `target` with `replacement`,
/// or erase it when `replacement` is `None`. Returns the number of blocks
/// placed or removed.
pub fn flood_fill(
    ctx: &mut EditContext,
    start: GridPos,
    target: Option<&BlockInstance>,
    replacement: Option<&BlockInstance>,
) -> usize {
    if !ctx.grid.is_editable(start) {
        return 0;
    }
    if matches!((target, replacement), (Some(t), Some(r)) if t.id == r.id) {
        return 0;
    }

    let region = matching_region(ctx.grid, start, target);
    debug!("Flood fill region at {}: {} cells", start, region.len());
    let layer = ctx.grid.active_layer();

    let changed = match replacement {
        None => {
            let mut removed = 0;
            for pos in &region {
                if ctx.grid.remove(layer, *pos).is_some() {
                    removed += 1;
                }
            }
            info!("Flood erase removed {} blocks", removed);
            removed
        }
        Some(block) => {
            if target.is_some() {
                for pos in &region {
                    ctx.grid.remove(layer, *pos);
                }
                ctx.index.mark_stale();
            }
            let placed = place_on_sprite_grid(ctx, &region, block);
            info!("Flood fill placed {} x {}", placed, block.id);
            placed
        }
    };

    ctx.index.mark_stale();
    ctx.chunks.invalidate_all();
    changed
}

fn place_on_sprite_grid(ctx: &mut EditContext, region: &FxHashSet<GridPos>, block: &BlockInstance) -> usize {
    let footprint = ctx.footprint(block);
    let min_x = footprint.iter().map(|c| c.0).min().unwrap_or(0);
    let max_x = footprint.iter().map(|c| c.0).max().unwrap_or(0);
    let min_y = footprint.iter().map(|c| c.1).min().unwrap_or(0);
    let max_y = footprint.iter().map(|c| c.1).max().unwrap_or(0);
    let (gw, gh) = (max_x - min_x + 1, max_y - min_y + 1);

    let grid_x0 = 0;
    let grid_y0 = ctx.grid.usable_height().div_euclid(gh) * gh;

    let mut origins: Vec<GridPos> = region
        .iter()
        .map(|p| {
            let gx = (p.x - grid_x0).div_euclid(gw) * gw + grid_x0;
            let gy = (p.y - grid_y0).div_euclid(gh) * gh + grid_y0;
            GridPos::new(gx - min_x, gy - min_y)
        })
        .filter(|o| ctx.grid.is_editable(*o))
        .collect::<FxHashSet<_>>()
        .into_iter()
        .collect();
    origins.sort_unstable_by_key(|o| (o.y, o.x));

    ctx.refresh_index();
    let free: Vec<GridPos> = origins
        .into_iter()
        .filter(|o| {
            footprint
                .iter()
                .all(|&(dx, dy)| !ctx.index.contains(o.offset(dx, dy)))
        })
        .collect();

    let layer = ctx.grid.active_layer();
    for origin in &free {
        ctx.grid.insert(layer, *origin, block);
    }
    free.len()
}
