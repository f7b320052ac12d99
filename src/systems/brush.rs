//! Brush strokes.
//!
//! A stroke turns pointer samples into grid edits:
//!
//! - Samples further than one cell apart are joined by a straight run of
//!   cells so fast motion leaves no gaps.
//! - Every sampled cell is expanded by the brush footprint (square or circle).
//! - Painting a multi-cell sprite puts its bottom row one row below the
//!   sampled cell and snaps its column to a multiple of the sprite width.
//!   A stroke never paints over a sprite it placed itself.
//! - Painting replaces whatever overlaps the new sprite. Erasing removes
//!   whole sprites through the occupancy index.
//!
//! Chunks touched by a sample are queued for immediate rendering. Ending the
//! stroke force-invalidates all of them once more.

use bevy_ecs::prelude::Resource;
use log::debug;
use rustc_hash::FxHashSet;

use crate::components::blockinstance::BlockInstance;
use crate::components::gridpos::GridPos;
use crate::resources::chunkstore::{ChunkKey, ChunkStore};
use crate::resources::spritebounds::grid_size;
use crate::systems::placement::EditContext;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BrushShape {
    #[default]
    Square,
    Circle,
}

impl BrushShape {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "square" => Some(BrushShape::Square),
            "circle" => Some(BrushShape::Circle),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BrushShape::Square => "square",
            BrushShape::Circle => "circle",
        }
    }
}

/// What a stroke does to the cells it covers.
#[derive(Clone, Copy, Debug)]
pub enum BrushOp<'a> {
    Paint(&'a BlockInstance),
    Erase,
}

#[derive(Debug, Default)]
struct Stroke {
    last: Option<GridPos>,
    /// Origins placed during this stroke; never painted over by it.
    placed: FxHashSet<GridPos>,
    /// Cells covered by those sprites.
    covered: FxHashSet<GridPos>,
    touched: FxHashSet<ChunkKey>,
    edits: usize,
}

/// Brush settings plus the stroke in progress.
#[derive(Resource, Debug)]
pub struct BrushState {
    size: u32,
    shape: BrushShape,
    offsets: Vec<(i32, i32)>,
    stroke: Option<Stroke>,
}

impl Default for BrushState {
    fn default() -> Self {
        Self::new(1, BrushShape::Square)
    }
}

/// Cell offsets covered by a brush of `size` (radius `size - 1`).
pub fn footprint_offsets(size: u32, shape: BrushShape) -> Vec<(i32, i32)> {
    let r = size.max(1) as i32 - 1;
    let mut offsets = Vec::with_capacity(((2 * r + 1) * (2 * r + 1)) as usize);
    for dy in -r..=r {
        for dx in -r..=r {
            if shape == BrushShape::Square || dx * dx + dy * dy <= r * r {
                offsets.push((dx, dy));
            }
        }
    }
    offsets
}

/// Cells on the straight run from `from` (exclusive) to `to` (inclusive).
pub fn interpolate(from: GridPos, to: GridPos) -> Vec<GridPos> {
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    let steps = dx.abs().max(dy.abs());
    if steps == 0 {
        return vec![to];
    }
    (1..=steps)
        .map(|i| {
            let t = i as f32 / steps as f32;
            GridPos::new(
                from.x + (dx as f32 * t).round() as i32,
                from.y + (dy as f32 * t).round() as i32,
            )
        })
        .collect()
}

/// Origin a multi-cell sprite of `grid` cells gets when painted at `cell`.
pub fn snap_origin(cell: GridPos, grid: (i32, i32)) -> GridPos {
    let (gw, gh) = grid;
    if gw <= 1 && gh <= 1 {
        return cell;
    }
    GridPos::new(cell.x.div_euclid(gw) * gw, cell.y + 1)
}

impl BrushState {
    pub fn new(size: u32, shape: BrushShape) -> Self {
        let size = size.max(1);
        Self {
            size,
            shape,
            offsets: footprint_offsets(size, shape),
            stroke: None,
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn shape(&self) -> BrushShape {
        self.shape
    }

    pub fn offsets(&self) -> &[(i32, i32)] {
        &self.offsets
    }

    pub fn set_size(&mut self, size: u32) {
        self.size = size.max(1);
        self.offsets = footprint_offsets(self.size, self.shape);
    }

    pub fn set_shape(&mut self, shape: BrushShape) {
        self.shape = shape;
        self.offsets = footprint_offsets(self.size, self.shape);
    }

    pub fn is_stroking(&self) -> bool {
        self.stroke.is_some()
    }

    pub fn begin_stroke(&mut self) {
        self.stroke = Some(Stroke::default());
    }

    /// Apply the brush at `center`, filling in cells skipped since the last
    /// sample. Starts a stroke if none is active. Returns the number of
    /// sprites placed or removed.
    pub fn add_sample(&mut self, ctx: &mut EditContext, center: GridPos, op: BrushOp) -> usize {
        let mut stroke = self.stroke.take().unwrap_or_default();
        let centers = match stroke.last {
            Some(last) if last == center => Vec::new(),
            Some(last) => interpolate(last, center),
            None => vec![center],
        };
        stroke.last = Some(center);

        let mut seen = FxHashSet::default();
        let cells: Vec<GridPos> = centers
            .iter()
            .flat_map(|c| self.offsets.iter().map(move |&(dx, dy)| c.offset(dx, dy)))
            .filter(|cell| seen.insert(*cell))
            .collect();

        let edits = match op {
            BrushOp::Paint(block) => paint_cells(ctx, &mut stroke, &cells, block),
            BrushOp::Erase => erase_cells(ctx, &mut stroke, &cells),
        };
        if edits > 0 {
            ctx.index.mark_stale();
        }
        stroke.edits += edits;
        self.stroke = Some(stroke);
        edits
    }

    /// Finish the stroke: mark the index stale and force every touched chunk
    /// to rebuild. Returns the stroke's total edit count.
    pub fn end_stroke(&mut self, ctx: &mut EditContext) -> usize {
        let Some(stroke) = self.stroke.take() else {
            return 0;
        };
        ctx.index.mark_stale();
        let mut keys: FxHashSet<ChunkKey> = FxHashSet::default();
        for key in &stroke.touched {
            keys.extend(ChunkStore::neighborhood(*key));
        }
        ctx.chunks.force_invalidate(keys);
        debug!(
            "Brush stroke finished: {} edits across {} chunks",
            stroke.edits,
            stroke.touched.len()
        );
        stroke.edits
    }
}

fn touch(ctx: &mut EditContext, stroke: &mut Stroke, cell: GridPos) {
    ctx.chunks.mark_for_immediate_render(cell);
    stroke.touched.insert(ctx.chunks.chunk_key(cell));
}

fn paint_cells(ctx: &mut EditContext, stroke: &mut Stroke, cells: &[GridPos], block: &BlockInstance) -> usize {
    let footprint = ctx.footprint(block);
    let grid = grid_size(&footprint);
    let layer = ctx.grid.active_layer();
    ctx.refresh_index();

    let mut edits = 0;
    let mut origins = FxHashSet::default();
    for &cell in cells {
        let origin = snap_origin(cell, grid);
        if !origins.insert(origin) || stroke.placed.contains(&origin) || !ctx.grid.is_editable(origin) {
            continue;
        }
        if footprint
            .iter()
            .any(|&(dx, dy)| stroke.covered.contains(&origin.offset(dx, dy)))
        {
            continue;
        }

        let mut overlapping: Vec<GridPos> = footprint
            .iter()
            .filter_map(|&(dx, dy)| ctx.index.origin_of(origin.offset(dx, dy)))
            .filter(|o| !stroke.placed.contains(o) && !ctx.grid.is_bedrock_row(o.y))
            .collect();
        overlapping.sort_unstable_by_key(|o| (o.y, o.x));
        overlapping.dedup();

        stroke.placed.insert(origin);
        stroke
            .covered
            .extend(footprint.iter().map(|&(dx, dy)| origin.offset(dx, dy)));
        if overlapping == [origin] && ctx.grid.get(layer, origin) == Some(block) {
            continue;
        }
        for old in overlapping {
            if ctx.grid.remove(layer, old).is_some() {
                touch(ctx, stroke, old);
            }
        }
        ctx.grid.insert(layer, origin, block);
        touch(ctx, stroke, origin);
        edits += 1;
    }
    edits
}

fn erase_cells(ctx: &mut EditContext, stroke: &mut Stroke, cells: &[GridPos]) -> usize {
    let layer = ctx.grid.active_layer();
    ctx.refresh_index();

    let mut edits = 0;
    for &cell in cells {
        if !ctx.grid.is_editable(cell) {
            continue;
        }
        let Some(origin) = ctx.index.origin_of(cell) else {
            continue;
        };
        if ctx.grid.is_bedrock_row(origin.y) {
            continue;
        }
        if ctx.grid.remove(layer, origin).is_some() {
            touch(ctx, stroke, origin);
            edits += 1;
        }
    }
    edits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_footprint() {
        assert_eq!(footprint_offsets(1, BrushShape::Square), vec![(0, 0)]);
        assert_eq!(footprint_offsets(2, BrushShape::Square).len(), 9);
        assert_eq!(footprint_offsets(3, BrushShape::Square).len(), 25);
    }

    #[test]
    fn test_circle_footprint() {
        let offsets = footprint_offsets(3, BrushShape::Circle);
        assert_eq!(offsets.len(), 13);
        assert!(offsets.contains(&(2, 0)));
        assert!(!offsets.contains(&(2, 1)));
    }

    #[test]
    fn test_interpolate_has_no_gaps() {
        let run = interpolate(GridPos::new(0, 0), GridPos::new(5, 2));
        assert_eq!(run.len(), 5);
        assert_eq!(run.last(), Some(&GridPos::new(5, 2)));
        let mut prev = GridPos::new(0, 0);
        for cell in run {
            assert!((cell.x - prev.x).abs() <= 1 && (cell.y - prev.y).abs() <= 1);
            prev = cell;
        }
    }

    #[test]
    fn test_interpolate_same_cell() {
        assert_eq!(interpolate(GridPos::new(3, 3), GridPos::new(3, 3)), vec![GridPos::new(3, 3)]);
    }

    #[test]
    fn test_snap_origin_single_cell_is_identity() {
        assert_eq!(snap_origin(GridPos::new(7, 9), (1, 1)), GridPos::new(7, 9));
    }

    #[test]
    fn test_snap_origin_bottom_aligned() {
        // 2x3 sprite: bottom row always one below the sample, column snapped.
        assert_eq!(snap_origin(GridPos::new(5, 3), (2, 3)), GridPos::new(4, 4));
        assert_eq!(snap_origin(GridPos::new(4, 4), (2, 3)), GridPos::new(4, 5));
        assert_eq!(snap_origin(GridPos::new(4, 5), (2, 3)), GridPos::new(4, 6));
        assert_eq!(snap_origin(GridPos::new(-1, 5), (2, 3)), GridPos::new(-2, 6));
    }

    #[test]
    fn test_shape_parse() {
        assert_eq!(BrushShape::parse("Circle"), Some(BrushShape::Circle));
        assert_eq!(BrushShape::parse("hex"), None);
    }
}
