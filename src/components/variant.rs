//! Variant descriptors produced by autotile resolution.
//!
//! A descriptor says which sub-rectangles of a sprite sheet to draw and where
//! to put them. All coordinates are sprite pixels at the native scale of 16
//! pixels per grid cell; the drawing code scales the finished composite to the
//! actual tile size.

use smallvec::SmallVec;

/// Native sprite pixels per grid cell.
pub const CELL_PX: u32 = 16;

/// Source rectangle inside a sprite sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpriteRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl SpriteRect {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Whether the rectangle lies inside a `width` x `height` sheet.
    pub fn fits(&self, width: u32, height: u32) -> bool {
        self.w > 0 && self.h > 0 && self.x + self.w <= width && self.y + self.h <= height
    }
}

/// One slice of a sprite sheet copied into the composite tile.
///
/// When the destination size differs from the source size the slice is
/// stretched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Piece {
    pub src: SpriteRect,
    pub dest_x: u32,
    pub dest_y: u32,
    pub dest_w: u32,
    pub dest_h: u32,
}

impl Piece {
    /// Copy `src` unscaled to `(dest_x, dest_y)`.
    pub const fn at(src: SpriteRect, dest_x: u32, dest_y: u32) -> Self {
        Self {
            src,
            dest_x,
            dest_y,
            dest_w: src.w,
            dest_h: src.h,
        }
    }

    /// Copy `src` stretched into a `dest_w` x `dest_h` slot.
    pub const fn stretched(src: SpriteRect, dest_x: u32, dest_y: u32, dest_w: u32, dest_h: u32) -> Self {
        Self {
            src,
            dest_x,
            dest_y,
            dest_w,
            dest_h,
        }
    }
}

/// Same-block neighbor flags around a cell.
///
/// For `all` mode the diagonals are only set when both adjacent orthogonals
/// are set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Neighbors {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub up_left: bool,
    pub up_right: bool,
    pub down_left: bool,
    pub down_right: bool,
}

impl Neighbors {
    pub fn surrounded(&self) -> bool {
        self.left
            && self.right
            && self.up
            && self.down
            && self.up_left
            && self.up_right
            && self.down_left
            && self.down_right
    }
}

/// Position of a tile inside a vertical run of same-block tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StackPart {
    Single,
    /// Topmost tile: a neighbor below, none above.
    Top,
    Middle,
    /// Lowest tile: a neighbor above, none below.
    Bottom,
}

impl StackPart {
    pub fn from_flags(up: bool, down: bool) -> Self {
        match (up, down) {
            (true, true) => StackPart::Middle,
            (true, false) => StackPart::Bottom,
            (false, true) => StackPart::Top,
            (false, false) => StackPart::Single,
        }
    }
}

/// Horizontal connectivity of platforms and fences.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Span {
    Alone,
    LeftEnd,
    Center,
    RightEnd,
}

impl Span {
    pub fn from_flags(left: bool, right: bool) -> Self {
        match (left, right) {
            (true, true) => Span::Center,
            (true, false) => Span::RightEnd,
            (false, true) => Span::LeftEnd,
            (false, false) => Span::Alone,
        }
    }
}

/// Which resolution produced a descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VariantKind {
    Standard,
    /// Whole-sprite rendering used after a slice fell outside the sheet.
    Fallback,
    /// Blob terrain assembled from four quadrants.
    Blob,
    /// Blob terrain fully surrounded; drawn flat without the top lip.
    BlobInterior,
    Log(StackPart),
    Vertical(StackPart),
    Vine(StackPart),
    Platform(Span),
    Fence(Span),
    Bedrock,
    State(u8),
    SmallerBlocks,
}

/// How to draw one block instance at one cell.
///
/// The composite is `width` x `height` sprite pixels. Its top-left corner is
/// placed at `(offset_x, offset_y)` sprite pixels relative to the top-left of
/// the cell; a negative `offset_y` lets tall tiles overhang the cell above.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VariantDescriptor {
    pub kind: VariantKind,
    pub neighbors: Neighbors,
    pub width: u32,
    pub height: u32,
    pub offset_x: i32,
    pub offset_y: i32,
    pub pieces: SmallVec<[Piece; 4]>,
}

impl VariantDescriptor {
    /// Whole-sprite rendering for a sheet of `width` x `height` pixels.
    ///
    /// Cell-sized and double-cell sheets fill one cell, 4x4 and 11x11 icons
    /// are centered, anything else keeps its size and sits on the cell's
    /// bottom-left corner.
    pub fn standard(width: u32, height: u32) -> Self {
        let full = SpriteRect::new(0, 0, width, height);
        let (piece, w, h, ox, oy) = match (width, height) {
            (16, 16) | (32, 32) => (Piece::stretched(full, 0, 0, CELL_PX, CELL_PX), CELL_PX, CELL_PX, 0, 0),
            // Offsets are sprite pixels and scale with the icon, so it stays centered at any zoom.
            (4, 4) => (Piece::at(full, 0, 0), 4, 4, 6, 6),
            (11, 11) => (Piece::at(full, 0, 0), 11, 11, 3, 3),
            _ => (Piece::at(full, 0, 0), width, height, 0, CELL_PX as i32 - height as i32),
        };
        let mut pieces = SmallVec::new();
        pieces.push(piece);
        Self {
            kind: VariantKind::Standard,
            neighbors: Neighbors::default(),
            width: w,
            height: h,
            offset_x: ox,
            offset_y: oy,
            pieces,
        }
    }

    /// Whole-sprite rendering flagged as a recovery from a bad slice.
    pub fn fallback(width: u32, height: u32, neighbors: Neighbors) -> Self {
        Self {
            kind: VariantKind::Fallback,
            neighbors,
            ..Self::standard(width, height)
        }
    }

    /// Whether every slice lies inside a `width` x `height` sheet.
    pub fn fits(&self, width: u32, height: u32) -> bool {
        !self.pieces.is_empty() && self.pieces.iter().all(|p| p.src.fits(width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_cell_sprite_fills_cell() {
        let d = VariantDescriptor::standard(32, 32);
        assert_eq!((d.width, d.height, d.offset_x, d.offset_y), (16, 16, 0, 0));
        assert_eq!(d.pieces[0].dest_w, 16);
    }

    #[test]
    fn test_standard_tall_sprite_is_bottom_anchored() {
        let d = VariantDescriptor::standard(16, 48);
        assert_eq!(d.offset_y, -32);
        assert_eq!(d.height, 48);
    }

    #[test]
    fn test_small_icons_are_centered() {
        assert_eq!(VariantDescriptor::standard(4, 4).offset_x, 6);
        assert_eq!(VariantDescriptor::standard(11, 11).offset_y, 3);
    }

    #[test]
    fn test_stack_part_from_flags() {
        assert_eq!(StackPart::from_flags(true, true), StackPart::Middle);
        assert_eq!(StackPart::from_flags(false, true), StackPart::Top);
        assert_eq!(StackPart::from_flags(true, false), StackPart::Bottom);
    }
}
