//! Editor systems and the algorithms behind them.
//!
//! Submodules overview
//! - [`autotile`] – pick the sprite-sheet piece for a block from its neighbors
//! - [`brush`] – brush footprints and strokes
//! - [`chunkrender`] – budgeted chunk rebuilds and compositing
//! - [`export`] – whole-world PNG export
//! - [`floodfill`] – batched region fill and erase
//! - [`placement`] – single-cell edits through an [`placement::EditContext`]
//! - [`tiledraw`] – drawing one block, its variant and its borders

pub mod autotile;
pub mod brush;
pub mod chunkrender;
pub mod export;
pub mod floodfill;
pub mod placement;
pub mod tiledraw;
