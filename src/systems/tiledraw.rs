//! Drawing a single block.
//!
//! A resolved [`VariantDescriptor`] is assembled into a composite at native
//! sprite scale, then blitted scaled to the target tile size. Blocks without a
//! sprite are drawn as a flat square in their catalog color.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use log::trace;

use crate::components::blockinstance::BlockInstance;
use crate::components::gridpos::GridPos;
use crate::components::variant::{CELL_PX, VariantDescriptor};
use crate::resources::blockstore::AssetProvider;
use crate::resources::canvas::RenderTarget;
use crate::resources::variantcache::VariantCache;
use crate::resources::worldgrid::LayerReader;

const BORDER_ALPHA: u8 = 120;
const BACKGROUND_BORDER_ALPHA: u8 = 80;

/// Everything needed to draw blocks from one layer.
pub struct TilePainter<'a, L: LayerReader + ?Sized> {
    pub layer: &'a L,
    pub assets: &'a dyn AssetProvider,
    pub show_borders: bool,
}

impl<L: LayerReader + ?Sized> TilePainter<'_, L> {
    /// Draw `block` stored at `pos` with the cell's top-left at
    /// `(screen_x, screen_y)` and `size` pixels per cell.
    pub fn draw_block<T: RenderTarget + ?Sized>(
        &self,
        target: &mut T,
        cache: &mut VariantCache,
        pos: GridPos,
        block: &BlockInstance,
        screen_x: i64,
        screen_y: i64,
        size: u32,
    ) {
        let Some(sprite) = self.assets.sprite(&block.id) else {
            trace!("No sprite for {}, drawing placeholder", block.id);
            let [r, g, b] = self.assets.placeholder_color(&block.id);
            target.fill_rect(screen_x, screen_y, size, size, Rgba([r, g, b, 255]));
            return;
        };

        let variant = cache.resolve(pos, block, self.layer, sprite.dimensions());
        draw_variant(target, sprite, variant, screen_x, screen_y, size);

        if self.show_borders {
            self.draw_borders(target, pos, block, screen_x, screen_y, size);
        }
    }

    /// Outline the sides of a block that do not join a same-id neighbor.
    fn draw_borders<T: RenderTarget + ?Sized>(
        &self,
        target: &mut T,
        pos: GridPos,
        block: &BlockInstance,
        x: i64,
        y: i64,
        size: u32,
    ) {
        if !block.tile_set {
            outline(target, x, y, size, Rgba([0, 0, 0, BORDER_ALPHA]), [true; 4]);
            return;
        }
        let edges = block.tileable;
        if !edges.any() {
            return;
        }
        let joined = |enabled: bool, dx: i32, dy: i32| {
            enabled && self.layer.id_at(pos.offset(dx, dy)) == Some(block.id.as_str())
        };
        let open = [
            !joined(edges.top, 0, -1),
            !joined(edges.right, 1, 0),
            !joined(edges.bottom, 0, 1),
            !joined(edges.left, -1, 0),
        ];
        let alpha = if block.is_background {
            BACKGROUND_BORDER_ALPHA
        } else {
            BORDER_ALPHA
        };
        outline(target, x, y, size, Rgba([0, 0, 0, alpha]), open);
    }
}

/// One pixel lines along the `[top, right, bottom, left]` sides flagged.
fn outline<T: RenderTarget + ?Sized>(target: &mut T, x: i64, y: i64, size: u32, color: Rgba<u8>, sides: [bool; 4]) {
    let far = size.saturating_sub(1) as i64;
    if sides[0] {
        target.fill_rect(x, y, size, 1, color);
    }
    if sides[1] {
        target.fill_rect(x + far, y, 1, size, color);
    }
    if sides[2] {
        target.fill_rect(x, y + far, size, 1, color);
    }
    if sides[3] {
        target.fill_rect(x, y, 1, size, color);
    }
}

/// Assemble a descriptor's pieces at native scale.
///
/// Pieces are assumed to lie inside the sheet; the resolver guarantees this.
pub fn compose_variant(sprite: &RgbaImage, variant: &VariantDescriptor) -> RgbaImage {
    let mut composite = RgbaImage::new(variant.width.max(1), variant.height.max(1));
    for piece in &variant.pieces {
        let src = piece.src;
        let slice = imageops::crop_imm(sprite, src.x, src.y, src.w, src.h).to_image();
        let slice = if (piece.dest_w, piece.dest_h) == (src.w, src.h) {
            slice
        } else {
            imageops::resize(&slice, piece.dest_w.max(1), piece.dest_h.max(1), FilterType::Nearest)
        };
        imageops::replace(&mut composite, &slice, piece.dest_x as i64, piece.dest_y as i64);
    }
    composite
}

/// Blit a resolved variant for a cell whose top-left is `(x, y)`.
pub fn draw_variant<T: RenderTarget + ?Sized>(
    target: &mut T,
    sprite: &RgbaImage,
    variant: &VariantDescriptor,
    x: i64,
    y: i64,
    size: u32,
) {
    let scale = |v: i64| v * size as i64 / CELL_PX as i64;
    let dest_x = x + scale(variant.offset_x as i64);
    let dest_y = y + scale(variant.offset_y as i64);
    let dest_w = scale(variant.width as i64).max(1) as u32;
    let dest_h = scale(variant.height as i64).max(1) as u32;

    let single = variant.pieces.len() == 1
        && variant.pieces[0].src.x == 0
        && variant.pieces[0].src.y == 0
        && (variant.pieces[0].src.w, variant.pieces[0].src.h) == sprite.dimensions();
    if single && (variant.pieces[0].dest_x, variant.pieces[0].dest_y) == (0, 0) {
        // Whole sheet drawn as-is; skip building a composite.
        target.blit_scaled(sprite, dest_x, dest_y, dest_w, dest_h);
        return;
    }
    let composite = compose_variant(sprite, variant);
    target.blit_scaled(&composite, dest_x, dest_y, dest_w, dest_h);
}
