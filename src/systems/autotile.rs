//! Autotile variant resolution.
//!
//! [`resolve_variant`] decides which slices of a block's sprite sheet to draw
//! at a given cell. Tile sheets are laid out in 8 pixel quadrants and 16 pixel
//! cells; each tiling mode reads a handful of neighbors from the same layer and
//! picks slices from fixed positions, with a parity shift (`x % 2`, `y % 2`)
//! so that runs of identical blocks do not look stamped.
//!
//! Resolution is pure: the same block, cell parity, neighbors and sheet size
//! always give the same descriptor. Any slice that would fall outside the
//! sheet degrades to whole-sprite rendering instead of failing.

use log::debug;
use smallvec::{SmallVec, smallvec};

use crate::components::blockinstance::{BlockInstance, Category, TileMode};
use crate::components::gridpos::GridPos;
use crate::components::variant::{
    CELL_PX, Neighbors, Piece, Span, SpriteRect, StackPart, VariantDescriptor, VariantKind,
};
use crate::resources::worldgrid::LayerReader;

/// Ids that count as solid ground for hanging vines.
const VINE_ANCHOR_HINTS: [&str; 7] = ["dirt", "stone", "wood", "brick", "cobblestone", "clay", "obsidian"];

/// Descriptor for `block` at `pos`, given its layer and sheet size.
pub fn resolve_variant<L: LayerReader + ?Sized>(
    pos: GridPos,
    block: &BlockInstance,
    layer: &L,
    sprite_size: (u32, u32),
) -> VariantDescriptor {
    let (w, h) = sprite_size;
    if !block.tile_set {
        return VariantDescriptor::standard(w, h);
    }
    let resolved = match block.tile_mode {
        TileMode::All => resolve_blob(pos, blob_neighbors(pos, &block.id, layer)),
        TileMode::Log => resolve_log(pos, vertical_neighbors(pos, &block.id, layer)),
        TileMode::Vertical => resolve_vertical(vertical_neighbors(pos, &block.id, layer)),
        TileMode::Vine => resolve_vine(pos, vine_neighbors(pos, &block.id, layer)),
        TileMode::TwoState | TileMode::FourState => resolve_state(block, w, h),
        TileMode::SmallerBlocks => resolve_smaller_blocks(smaller_block_neighbors(pos, &block.id, layer)),
        TileMode::PlatformEnhanced => resolve_platform(pos, horizontal_neighbors(pos, &block.id, layer)),
        TileMode::FenceEnhanced => resolve_fence(pos, horizontal_neighbors(pos, &block.id, layer), h),
        TileMode::BedrockPattern => resolve_bedrock(pos),
        TileMode::Standard | TileMode::Chain | TileMode::BackgroundQuadrant | TileMode::Column => {
            return VariantDescriptor::standard(w, h);
        }
    };
    match resolved {
        Some(desc) if desc.fits(w, h) => desc,
        other => {
            debug!(
                "{} at {}: {:?} slice outside {}x{} sheet, drawing whole sprite",
                block.id,
                pos,
                block.tile_mode,
                w,
                h
            );
            let neighbors = other.map(|d| d.neighbors).unwrap_or_default();
            VariantDescriptor::fallback(w, h, neighbors)
        }
    }
}

fn same<L: LayerReader + ?Sized>(layer: &L, pos: GridPos, id: &str) -> bool {
    layer.id_at(pos) == Some(id)
}

/// Same-id neighbors for blob terrain. A diagonal is only looked at when both
/// orthogonals next to it are set.
pub fn blob_neighbors<L: LayerReader + ?Sized>(pos: GridPos, id: &str, layer: &L) -> Neighbors {
    let left = same(layer, pos.offset(-1, 0), id);
    let right = same(layer, pos.offset(1, 0), id);
    let up = same(layer, pos.offset(0, -1), id);
    let down = same(layer, pos.offset(0, 1), id);
    Neighbors {
        left,
        right,
        up,
        down,
        up_left: up && left && same(layer, pos.offset(-1, -1), id),
        up_right: up && right && same(layer, pos.offset(1, -1), id),
        down_left: down && left && same(layer, pos.offset(-1, 1), id),
        down_right: down && right && same(layer, pos.offset(1, 1), id),
    }
}

fn vertical_neighbors<L: LayerReader + ?Sized>(pos: GridPos, id: &str, layer: &L) -> Neighbors {
    Neighbors {
        up: same(layer, pos.offset(0, -1), id),
        down: same(layer, pos.offset(0, 1), id),
        ..Neighbors::default()
    }
}

fn horizontal_neighbors<L: LayerReader + ?Sized>(pos: GridPos, id: &str, layer: &L) -> Neighbors {
    Neighbors {
        left: same(layer, pos.offset(-1, 0), id),
        right: same(layer, pos.offset(1, 0), id),
        ..Neighbors::default()
    }
}

/// Smaller blocks read their lower diagonals directly, without the
/// orthogonal gate used by blob terrain.
fn smaller_block_neighbors<L: LayerReader + ?Sized>(pos: GridPos, id: &str, layer: &L) -> Neighbors {
    Neighbors {
        left: same(layer, pos.offset(-1, 0), id),
        right: same(layer, pos.offset(1, 0), id),
        up: same(layer, pos.offset(0, -1), id),
        down: same(layer, pos.offset(0, 1), id),
        down_left: same(layer, pos.offset(-1, 1), id),
        down_right: same(layer, pos.offset(1, 1), id),
        ..Neighbors::default()
    }
}

/// Whether `neighbor` can hold up (or continue) a vine of type `vine_id`.
pub fn is_vine_anchor(neighbor: &BlockInstance, vine_id: &str) -> bool {
    neighbor.id == vine_id
        || (!neighbor.is_background && neighbor.tile_set)
        || matches!(neighbor.category, Category::Terrain | Category::Interactive)
        || {
            let id = neighbor.id.to_ascii_lowercase();
            VINE_ANCHOR_HINTS.iter().any(|hint| id.contains(hint))
        }
}

fn vine_neighbors<L: LayerReader + ?Sized>(pos: GridPos, id: &str, layer: &L) -> Neighbors {
    let solid = |p: GridPos| layer.block_at(p).is_some_and(|b| is_vine_anchor(b, id));
    Neighbors {
        up: solid(pos.offset(0, -1)),
        down: solid(pos.offset(0, 1)),
        ..Neighbors::default()
    }
}

fn descriptor(
    kind: VariantKind,
    neighbors: Neighbors,
    (width, height): (u32, u32),
    offset_y: i32,
    pieces: SmallVec<[Piece; 4]>,
) -> VariantDescriptor {
    VariantDescriptor {
        kind,
        neighbors,
        width,
        height,
        offset_x: 0,
        offset_y,
        pieces,
    }
}

/// Tall tiles are 24 pixels high and overhang the cell above by half a cell.
const LIP: i32 = -(CELL_PX as i32) / 2;

fn resolve_blob(pos: GridPos, n: Neighbors) -> Option<VariantDescriptor> {
    let dx = if pos.odd_column() { 16 } else { 0 };
    let odd_row = pos.odd_row();
    let dy1 = if odd_row { 16 } else { 0 };
    let dy2 = if odd_row { 24 } else { 0 };

    if n.surrounded() {
        // Interior tiles are drawn flat, without the top lip.
        let interior = Piece::at(SpriteRect::new(128 + dx, dy1, 16, 16), 0, 8);
        return Some(descriptor(VariantKind::BlobInterior, n, (16, 24), LIP, smallvec![interior]));
    }

    let top = |left: bool, corner: bool, base_x: u32, dest_x: u32| {
        if !left && !n.up {
            Piece::at(SpriteRect::new(base_x + dx, dy2, 8, 16), dest_x, 0)
        } else if !n.up {
            Piece::at(SpriteRect::new(base_x + 32 + dx, dy2, 8, 16), dest_x, 0)
        } else if !left {
            Piece::at(SpriteRect::new(base_x + 96 + dx, dy1, 8, 8), dest_x, 8)
        } else if !corner {
            Piece::at(SpriteRect::new(base_x + 64 + dx, 8 + dy2, 8, 8), dest_x, 8)
        } else {
            Piece::at(SpriteRect::new(base_x + 128 + dx, dy1, 8, 8), dest_x, 8)
        }
    };
    let bottom = |side: bool, corner: bool, base_x: u32, dest_x: u32| {
        let src = if !side && !n.down {
            SpriteRect::new(base_x + dx, 16 + dy2, 8, 8)
        } else if !n.down {
            SpriteRect::new(base_x + 32 + dx, 16 + dy2, 8, 8)
        } else if !side {
            SpriteRect::new(base_x + 96 + dx, 8 + dy1, 8, 8)
        } else if !corner {
            SpriteRect::new(base_x + 64 + dx, 16 + dy2, 8, 8)
        } else {
            SpriteRect::new(base_x + 128 + dx, 8 + dy1, 8, 8)
        };
        Piece::at(src, dest_x, 16)
    };

    let pieces = smallvec![
        top(n.left, n.up_left, 0, 0),
        top(n.right, n.up_right, 8, 8),
        bottom(n.left, n.down_left, 0, 0),
        bottom(n.right, n.down_right, 8, 8),
    ];
    Some(descriptor(VariantKind::Blob, n, (16, 24), LIP, pieces))
}

fn resolve_log(pos: GridPos, n: Neighbors) -> Option<VariantDescriptor> {
    let dx = if pos.odd_row() { 32 } else { 0 };
    let part = StackPart::from_flags(n.up, n.down);
    let src = match part {
        StackPart::Middle => SpriteRect::new(64 + dx, 0, 32, 16),
        StackPart::Bottom => SpriteRect::new(dx, 24, 32, 16),
        StackPart::Top => SpriteRect::new(dx, 0, 32, 24),
        StackPart::Single => SpriteRect::new(64 + dx, 16, 32, 24),
    };
    // Every part is stretched to two cells by one and a half.
    let piece = Piece::stretched(src, 0, 0, 32, 24);
    Some(descriptor(VariantKind::Log(part), n, (32, 24), LIP, smallvec![piece]))
}

fn resolve_vertical(n: Neighbors) -> Option<VariantDescriptor> {
    let part = StackPart::from_flags(n.up, n.down);
    let kind = VariantKind::Vertical(part);
    let desc = match part {
        StackPart::Single => descriptor(
            kind,
            n,
            (16, 24),
            LIP,
            smallvec![Piece::at(SpriteRect::new(0, 0, 16, 24), 0, 0)],
        ),
        StackPart::Middle => descriptor(
            kind,
            n,
            (16, 16),
            0,
            smallvec![Piece::at(SpriteRect::new(0, 24, 16, 16), 0, 0)],
        ),
        StackPart::Bottom => descriptor(
            kind,
            n,
            (16, 16),
            0,
            smallvec![
                Piece::at(SpriteRect::new(0, 24, 16, 8), 0, 0),
                Piece::at(SpriteRect::new(0, 16, 16, 8), 0, 8),
            ],
        ),
        StackPart::Top => descriptor(
            kind,
            n,
            (16, 16),
            0,
            smallvec![
                Piece::stretched(SpriteRect::new(0, 0, 16, 16), 0, 0, 16, 8),
                Piece::at(SpriteRect::new(0, 32, 16, 8), 0, 8),
            ],
        ),
    };
    Some(desc)
}

fn resolve_vine(pos: GridPos, n: Neighbors) -> Option<VariantDescriptor> {
    let alt = if (pos.x + pos.y).rem_euclid(2) == 1 { 8 } else { 0 };
    let part = StackPart::from_flags(n.up, n.down);
    let y = match part {
        StackPart::Middle => 16 + alt,
        StackPart::Bottom => 24 + alt,
        StackPart::Top | StackPart::Single => alt,
    };
    let piece = Piece::at(SpriteRect::new(0, y, 16, 16), 0, 0);
    Some(descriptor(VariantKind::Vine(part), n, (16, 16), 0, smallvec![piece]))
}

fn resolve_state(block: &BlockInstance, w: u32, h: u32) -> Option<VariantDescriptor> {
    let count = block
        .multi_state
        .map(|s| s.count)
        .or(block.tile_mode.state_count())
        .filter(|c| *c > 0)?;
    let state = block.state();
    if state >= count {
        return None;
    }
    let section = w / count as u32;
    let piece = Piece::at(SpriteRect::new(state as u32 * section, 0, section, h), 0, 0);
    Some(descriptor(
        VariantKind::State(state),
        Neighbors::default(),
        (section, h),
        CELL_PX as i32 - h as i32,
        smallvec![piece],
    ))
}

fn resolve_smaller_blocks(n: Neighbors) -> Option<VariantDescriptor> {
    // Top segments keep their natural height: 16 without a block above, 8 with.
    let top_h = if n.up { 8 } else { 16 };
    let top_left = if !n.left && !n.up {
        SpriteRect::new(0, 0, 8, 16)
    } else if !n.up {
        SpriteRect::new(16, 0, 8, 16)
    } else if !n.left {
        SpriteRect::new(48, 8, 8, 8)
    } else {
        SpriteRect::new(32, 8, 8, 8)
    };
    let top_right = if !n.right && !n.up {
        SpriteRect::new(8, 0, 8, 16)
    } else if !n.up {
        SpriteRect::new(24, 0, 8, 16)
    } else if !n.right {
        SpriteRect::new(56, 8, 8, 8)
    } else {
        SpriteRect::new(40, 8, 8, 8)
    };
    let bottom_left = if !n.left && !n.down {
        SpriteRect::new(0, 16, 8, 8)
    } else if !n.down {
        SpriteRect::new(16, 16, 8, 8)
    } else if n.left {
        SpriteRect::new(32, 16, 8, 8)
    } else if !n.down_left {
        SpriteRect::new(48, 16, 8, 8)
    } else {
        SpriteRect::new(32, 0, 8, 8)
    };
    let bottom_right = if !n.right && !n.down {
        SpriteRect::new(8, 16, 8, 8)
    } else if !n.down {
        SpriteRect::new(24, 16, 8, 8)
    } else if n.right {
        SpriteRect::new(40, 16, 8, 8)
    } else if !n.down_right {
        SpriteRect::new(56, 16, 8, 8)
    } else {
        SpriteRect::new(40, 0, 8, 8)
    };

    let height = top_h + 8;
    let pieces = smallvec![
        Piece::at(top_left, 0, 0),
        Piece::at(top_right, 8, 0),
        Piece::at(bottom_left, 0, top_h),
        Piece::at(bottom_right, 8, top_h),
    ];
    Some(descriptor(
        VariantKind::SmallerBlocks,
        n,
        (16, height),
        CELL_PX as i32 - height as i32,
        pieces,
    ))
}

fn resolve_platform(pos: GridPos, n: Neighbors) -> Option<VariantDescriptor> {
    let dx = if pos.odd_column() { 16 } else { 0 };
    let span = Span::from_flags(n.left, n.right);
    let x = match span {
        Span::Center => 32 + dx,
        Span::RightEnd => 64,
        Span::LeftEnd => 16,
        Span::Alone => 0,
    };
    let piece = Piece::at(SpriteRect::new(x, 0, 16, 16), 0, 0);
    Some(descriptor(VariantKind::Platform(span), n, (16, 16), 0, smallvec![piece]))
}

fn resolve_fence(pos: GridPos, n: Neighbors, sheet_h: u32) -> Option<VariantDescriptor> {
    let dx = if pos.odd_column() { 16 } else { 0 };
    let span = Span::from_flags(n.left, n.right);
    let x = match span {
        Span::Center => 48 + dx,
        Span::RightEnd => 16,
        Span::LeftEnd => 0,
        Span::Alone => 32,
    };
    let src = SpriteRect::new(x, 0, 16, sheet_h);
    let kind = VariantKind::Fence(span);
    if sheet_h > CELL_PX {
        // Tall fences rise above the cell by every extra cell they span.
        let extra_cells = sheet_h.div_ceil(CELL_PX) - 1;
        let offset_y = -((CELL_PX * extra_cells) as i32);
        Some(descriptor(kind, n, (16, sheet_h), offset_y, smallvec![Piece::at(src, 0, 0)]))
    } else {
        let piece = Piece::stretched(src, 0, 0, 16, 16);
        Some(descriptor(kind, n, (16, 16), 0, smallvec![piece]))
    }
}

fn resolve_bedrock(pos: GridPos) -> Option<VariantDescriptor> {
    let dx = if pos.odd_column() { 16 } else { 0 };
    let dy = if pos.odd_row() { 24 } else { 0 };
    let piece = Piece::at(SpriteRect::new(dx, dy, 16, 24), 0, 0);
    Some(descriptor(
        VariantKind::Bedrock,
        Neighbors::default(),
        (16, 24),
        LIP,
        smallvec![piece],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::blockinstance::MultiState;
    use crate::resources::worldgrid::LayerMap;

    fn layer_with(id: &str, mode: TileMode, cells: &[(i32, i32)]) -> LayerMap {
        let mut layer = LayerMap::default();
        for &(x, y) in cells {
            layer.insert(GridPos::new(x, y), BlockInstance::new(id, mode));
        }
        layer
    }

    fn dirt() -> BlockInstance {
        BlockInstance::new("dirt", TileMode::All)
    }

    #[test]
    fn test_diagonal_requires_both_orthogonals() {
        // left and up-left are dirt, up is empty.
        let layer = layer_with("dirt", TileMode::All, &[(4, 5), (4, 4), (5, 5)]);
        let n = blob_neighbors(GridPos::new(5, 5), "dirt", &layer);
        assert!(n.left);
        assert!(!n.up);
        assert!(!n.up_left);
    }

    #[test]
    fn test_diagonal_set_when_corner_filled() {
        let layer = layer_with("dirt", TileMode::All, &[(4, 5), (4, 4), (5, 4), (5, 5)]);
        let n = blob_neighbors(GridPos::new(5, 5), "dirt", &layer);
        assert!(n.up_left);
        assert!(!n.up_right);
    }

    #[test]
    fn test_isolated_blob_uses_outer_edges() {
        let layer = layer_with("dirt", TileMode::All, &[(2, 2)]);
        let d = resolve_variant(GridPos::new(2, 2), &dirt(), &layer, (176, 48));
        assert_eq!(d.kind, VariantKind::Blob);
        assert_eq!((d.width, d.height, d.offset_y), (16, 24, -8));
        assert_eq!(d.pieces[0].src, SpriteRect::new(0, 0, 8, 16));
        assert_eq!(d.pieces[1].src, SpriteRect::new(8, 0, 8, 16));
        assert_eq!(d.pieces[2].src, SpriteRect::new(0, 16, 8, 8));
        assert_eq!(d.pieces[3].src, SpriteRect::new(8, 16, 8, 8));
    }

    #[test]
    fn test_parity_shifts_blob_slices() {
        let layer = layer_with("dirt", TileMode::All, &[(3, 3)]);
        let d = resolve_variant(GridPos::new(3, 3), &dirt(), &layer, (176, 48));
        assert_eq!(d.pieces[0].src, SpriteRect::new(16, 24, 8, 16));
    }

    #[test]
    fn test_surrounded_blob_is_flat() {
        let mut cells = Vec::new();
        for x in 0..3 {
            for y in 0..3 {
                cells.push((x, y));
            }
        }
        let layer = layer_with("dirt", TileMode::All, &cells);
        let d = resolve_variant(GridPos::new(1, 1), &dirt(), &layer, (176, 48));
        assert_eq!(d.kind, VariantKind::BlobInterior);
        assert_eq!(d.pieces.len(), 1);
        assert_eq!(d.pieces[0].src, SpriteRect::new(144, 16, 16, 16));
        assert_eq!((d.pieces[0].dest_x, d.pieces[0].dest_y), (0, 8));
    }

    #[test]
    fn test_small_sheet_falls_back_to_whole_sprite() {
        let layer = layer_with("dirt", TileMode::All, &[(2, 2)]);
        let d = resolve_variant(GridPos::new(2, 2), &dirt(), &layer, (16, 16));
        assert_eq!(d.kind, VariantKind::Fallback);
        assert_eq!(d.pieces[0].src, SpriteRect::new(0, 0, 16, 16));
    }

    #[test]
    fn test_non_tileset_block_is_standard() {
        let mut block = dirt();
        block.tile_set = false;
        let layer = layer_with("dirt", TileMode::All, &[(2, 2)]);
        let d = resolve_variant(GridPos::new(2, 2), &block, &layer, (16, 16));
        assert_eq!(d.kind, VariantKind::Standard);
    }

    #[test]
    fn test_log_stack_parts() {
        let wood = BlockInstance::new("wood", TileMode::Log);
        let layer = layer_with("wood", TileMode::Log, &[(0, 0), (0, 1), (0, 2)]);
        let kind = |y| resolve_variant(GridPos::new(0, y), &wood, &layer, (128, 48)).kind;
        assert_eq!(kind(0), VariantKind::Log(StackPart::Top));
        assert_eq!(kind(1), VariantKind::Log(StackPart::Middle));
        assert_eq!(kind(2), VariantKind::Log(StackPart::Bottom));

        let middle = resolve_variant(GridPos::new(0, 1), &wood, &layer, (128, 48));
        assert_eq!(middle.pieces[0].src, SpriteRect::new(96, 0, 32, 16));
        assert_eq!((middle.pieces[0].dest_w, middle.pieces[0].dest_h), (32, 24));
    }

    #[test]
    fn test_vine_hangs_from_terrain() {
        let vine = BlockInstance::new("vine", TileMode::Vine);
        let mut layer = LayerMap::default();
        layer.insert(GridPos::new(0, 0), BlockInstance::new("mossy_brick", TileMode::Standard));
        layer.insert(GridPos::new(0, 1), vine.clone());
        let d = resolve_variant(GridPos::new(0, 1), &vine, &layer, (16, 48));
        assert_eq!(d.kind, VariantKind::Vine(StackPart::Bottom));
        // (0 + 1) is odd, so the alternate column of slices is used.
        assert_eq!(d.pieces[0].src, SpriteRect::new(0, 32, 16, 16));
    }

    #[test]
    fn test_vine_ignores_plain_decorations() {
        let vine = BlockInstance::new("vine", TileMode::Vine);
        let mut flower = BlockInstance::new("flower_red", TileMode::Standard);
        flower.category = Category::Decorative;
        assert!(!is_vine_anchor(&flower, "vine"));
        assert!(is_vine_anchor(&vine, "vine"));
    }

    #[test]
    fn test_vine_anchor_hint_ignores_case() {
        let mut brick = BlockInstance::new("Stone_Brick", TileMode::Standard);
        brick.category = Category::Decorative;
        assert!(is_vine_anchor(&brick, "vine"));
    }

    #[test]
    fn test_vertical_without_room_falls_back() {
        let cactus = BlockInstance::new("cactus", TileMode::Vertical);
        let layer = layer_with("cactus", TileMode::Vertical, &[(0, 0), (0, 1)]);
        // Bottom piece needs 32px of sheet; a 16x24 sheet cannot provide it.
        let d = resolve_variant(GridPos::new(0, 1), &cactus, &layer, (16, 24));
        assert_eq!(d.kind, VariantKind::Fallback);
        let d = resolve_variant(GridPos::new(0, 1), &cactus, &layer, (16, 40));
        assert_eq!(d.kind, VariantKind::Vertical(StackPart::Bottom));
    }

    #[test]
    fn test_state_selects_sheet_section() {
        let mut lever = BlockInstance::new("lever", TileMode::FourState);
        lever.multi_state = Some(MultiState { state: 2, count: 4 });
        let d = resolve_variant(GridPos::new(0, 0), &lever, &LayerMap::default(), (64, 32));
        assert_eq!(d.kind, VariantKind::State(2));
        assert_eq!(d.pieces[0].src, SpriteRect::new(32, 0, 16, 32));
        assert_eq!(d.offset_y, -16);
    }

    #[test]
    fn test_smaller_blocks_keep_segment_heights() {
        let block = BlockInstance::new("pebbles", TileMode::SmallerBlocks);
        let layer = layer_with("pebbles", TileMode::SmallerBlocks, &[(0, 0), (0, 1)]);
        let top = resolve_variant(GridPos::new(0, 0), &block, &layer, (64, 24));
        assert_eq!(top.height, 24);
        assert_eq!(top.offset_y, -8);
        let below = resolve_variant(GridPos::new(0, 1), &block, &layer, (64, 24));
        assert_eq!(below.height, 16);
        assert_eq!(below.pieces[0].src, SpriteRect::new(48, 8, 8, 8));
        assert_eq!(below.pieces[2].dest_y, 8);
    }

    #[test]
    fn test_platform_and_fence_spans() {
        let platform = BlockInstance::new("platform", TileMode::PlatformEnhanced);
        let layer = layer_with("platform", TileMode::PlatformEnhanced, &[(0, 0), (1, 0), (2, 0)]);
        let kind = |x| resolve_variant(GridPos::new(x, 0), &platform, &layer, (96, 16)).kind;
        assert_eq!(kind(0), VariantKind::Platform(Span::LeftEnd));
        assert_eq!(kind(1), VariantKind::Platform(Span::Center));
        assert_eq!(kind(2), VariantKind::Platform(Span::RightEnd));

        let fence = BlockInstance::new("fence", TileMode::FenceEnhanced);
        let layer = layer_with("fence", TileMode::FenceEnhanced, &[(0, 0)]);
        let d = resolve_variant(GridPos::new(0, 0), &fence, &layer, (80, 24));
        assert_eq!(d.kind, VariantKind::Fence(Span::Alone));
        assert_eq!(d.pieces[0].src, SpriteRect::new(32, 0, 16, 24));
        assert_eq!(d.offset_y, -16);
    }

    #[test]
    fn test_bedrock_checkerboard() {
        let bedrock = BlockInstance::new("obsidian", TileMode::BedrockPattern);
        let layer = LayerMap::default();
        let src = |x, y| resolve_variant(GridPos::new(x, y), &bedrock, &layer, (32, 48)).pieces[0].src;
        assert_eq!(src(0, 0), SpriteRect::new(0, 0, 16, 24));
        assert_eq!(src(1, 0), SpriteRect::new(16, 0, 16, 24));
        assert_eq!(src(1, 1), SpriteRect::new(16, 24, 16, 24));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let mut rng = fastrand::Rng::with_seed(42);
        let modes = [
            TileMode::All,
            TileMode::Log,
            TileMode::Vertical,
            TileMode::Vine,
            TileMode::SmallerBlocks,
            TileMode::PlatformEnhanced,
            TileMode::FenceEnhanced,
        ];
        for _ in 0..200 {
            let mode = modes[rng.usize(..modes.len())];
            let mut cells = Vec::new();
            for x in 0..3 {
                for y in 0..3 {
                    if rng.bool() {
                        cells.push((x, y));
                    }
                }
            }
            let layer = layer_with("block", mode, &cells);
            let block = BlockInstance::new("block", mode);
            let a = resolve_variant(GridPos::new(1, 1), &block, &layer, (176, 48));
            let b = resolve_variant(GridPos::new(1, 1), &block, &layer, (176, 48));
            assert_eq!(a, b);
            if mode == TileMode::All {
                let n = a.neighbors;
                assert!(!n.up_left || (n.up && n.left));
                assert!(!n.up_right || (n.up && n.right));
                assert!(!n.down_left || (n.down && n.left));
                assert!(!n.down_right || (n.down && n.right));
            }
        }
    }
}
