//! Sprite footprints.
//!
//! A footprint is the set of grid cells a sprite covers, as `(dx, dy)` offsets
//! from its origin cell. The origin is the bottom-left cell, so offsets grow
//! rightward in `dx` and upward (negative) in `dy`.
//!
//! Footprints only depend on the sprite's pixel size and tiling mode, so they
//! are cached forever by [`SpriteBoundsCache`] and never invalidated by world
//! edits.

use bevy_ecs::prelude::Resource;
use rustc_hash::FxHashMap;
use smallvec::{SmallVec, smallvec};

use crate::components::blockinstance::{BlockInstance, TileMode};
use crate::components::variant::CELL_PX;
use crate::resources::blockstore::AssetProvider;

/// Cell offsets covered by a sprite. Always contains `(0, 0)`.
pub type Footprint = SmallVec<[(i32, i32); 4]>;

/// Tiles needed to cover `px` pixels: whole cells plus one more when the
/// remainder covers more than half a cell.
pub fn tiles_with_coverage(px: u32) -> u32 {
    if px <= CELL_PX {
        return 1;
    }
    let whole = px / CELL_PX;
    let rest = px % CELL_PX;
    if rest * 2 > CELL_PX { whole + 1 } else { whole }
}

fn single() -> Footprint {
    smallvec![(0, 0)]
}

fn rectangle(tiles_wide: u32, tiles_tall: u32) -> Footprint {
    if tiles_wide <= 1 && tiles_tall <= 1 {
        return single();
    }
    let mut cells = Footprint::with_capacity((tiles_wide * tiles_tall) as usize);
    for ty in 0..tiles_tall as i32 {
        for tx in 0..tiles_wide as i32 {
            cells.push((tx, -ty));
        }
    }
    cells
}

/// Footprint of a `width` x `height` pixel sprite drawn with `mode`.
pub fn compute_bounds(width: u32, height: u32, mode: TileMode) -> Footprint {
    match mode {
        TileMode::Log => smallvec![(0, 0), (1, 0)],
        TileMode::All
        | TileMode::SmallerBlocks
        | TileMode::PlatformEnhanced
        | TileMode::FenceEnhanced
        | TileMode::BedrockPattern
        | TileMode::Vine
        | TileMode::Vertical => single(),
        TileMode::TwoState | TileMode::FourState => {
            let states = mode.state_count().unwrap_or(1) as u32;
            rectangle(tiles_with_coverage(width / states), tiles_with_coverage(height))
        }
        TileMode::Standard | TileMode::Chain | TileMode::BackgroundQuadrant | TileMode::Column => {
            if (width, height) == (16, 16) || (width, height) == (32, 32) {
                single()
            } else {
                rectangle(tiles_with_coverage(width), tiles_with_coverage(height))
            }
        }
    }
}

/// Width and height, in cells, of the rectangle enclosing a footprint.
pub fn grid_size(footprint: &[(i32, i32)]) -> (i32, i32) {
    let (mut min_x, mut max_x, mut min_y, mut max_y) = (0, 0, 0, 0);
    for &(dx, dy) in footprint {
        min_x = min_x.min(dx);
        max_x = max_x.max(dx);
        min_y = min_y.min(dy);
        max_y = max_y.max(dy);
    }
    (max_x - min_x + 1, max_y - min_y + 1)
}

/// Memoized footprints keyed by `(width, height, mode)`.
#[derive(Resource, Debug, Default)]
pub struct SpriteBoundsCache {
    cache: FxHashMap<(u32, u32, TileMode), Footprint>,
}

impl SpriteBoundsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bounds(&mut self, width: u32, height: u32, mode: TileMode) -> &Footprint {
        self.cache
            .entry((width, height, mode))
            .or_insert_with(|| compute_bounds(width, height, mode))
    }

    /// Footprint of a placed block. Logs are always two cells wide; any other
    /// block without a sprite covers only its origin.
    pub fn footprint_of(&mut self, block: &BlockInstance, assets: &dyn AssetProvider) -> Footprint {
        if block.tile_mode == TileMode::Log {
            return compute_bounds(0, 0, TileMode::Log);
        }
        match assets.sprite_size(&block.id) {
            Some((w, h)) => self.bounds(w, h, block.tile_mode).clone(),
            None => single(),
        }
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coverage_rounding() {
        assert_eq!(tiles_with_coverage(0), 1);
        assert_eq!(tiles_with_coverage(16), 1);
        assert_eq!(tiles_with_coverage(24), 1);
        assert_eq!(tiles_with_coverage(25), 2);
        assert_eq!(tiles_with_coverage(32), 2);
        assert_eq!(tiles_with_coverage(40), 2);
        assert_eq!(tiles_with_coverage(41), 3);
    }

    #[test]
    fn test_log_is_always_two_wide() {
        for (w, h) in [(0, 0), (16, 16), (128, 48), (7, 300)] {
            assert_eq!(compute_bounds(w, h, TileMode::Log).as_slice(), &[(0, 0), (1, 0)]);
        }
    }

    #[test]
    fn test_sheet_modes_cover_one_cell() {
        for mode in [
            TileMode::All,
            TileMode::SmallerBlocks,
            TileMode::PlatformEnhanced,
            TileMode::FenceEnhanced,
            TileMode::BedrockPattern,
            TileMode::Vine,
            TileMode::Vertical,
        ] {
            assert_eq!(compute_bounds(176, 64, mode).as_slice(), &[(0, 0)]);
        }
    }

    #[test]
    fn test_standard_double_cell_is_not_subdivided() {
        assert_eq!(compute_bounds(32, 32, TileMode::Standard).as_slice(), &[(0, 0)]);
        assert_eq!(compute_bounds(16, 16, TileMode::Standard).as_slice(), &[(0, 0)]);
    }

    #[test]
    fn test_standard_tall_sprite_extends_upward() {
        let cells = compute_bounds(32, 48, TileMode::Standard);
        assert_eq!(
            cells.as_slice(),
            &[(0, 0), (1, 0), (0, -1), (1, -1), (0, -2), (1, -2)]
        );
        assert_eq!(grid_size(&cells), (2, 3));
    }

    #[test]
    fn test_multi_state_divides_width() {
        // 64px wide, two states -> 32px per state -> 2 tiles wide.
        let cells = compute_bounds(64, 16, TileMode::TwoState);
        assert_eq!(cells.as_slice(), &[(0, 0), (1, 0)]);
        assert_eq!(compute_bounds(64, 16, TileMode::FourState).as_slice(), &[(0, 0)]);
    }

    #[test]
    fn test_every_footprint_contains_origin() {
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..500 {
            let w = rng.u32(0..200);
            let h = rng.u32(0..200);
            let mode = TileMode::ALL_MODES[rng.usize(..TileMode::ALL_MODES.len())];
            assert!(compute_bounds(w, h, mode).contains(&(0, 0)), "{w}x{h} {mode:?}");
        }
    }

    #[test]
    fn test_cache_reuses_entries() {
        let mut cache = SpriteBoundsCache::new();
        cache.bounds(32, 48, TileMode::Standard);
        cache.bounds(32, 48, TileMode::Standard);
        cache.bounds(32, 48, TileMode::Column);
        assert_eq!(cache.len(), 2);
    }
}
