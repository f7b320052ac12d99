//! ECS resources held by the editor world.
//!
//! Overview
//! - `blockstore` – block catalog and loaded sprite sheets
//! - `canvas` – pixel surfaces and the screen canvas
//! - `chunkstore` – chunk partitioning, cached images and dirty tracking
//! - `clipboard` – copied selections
//! - `editorconfig` – settings loaded from the INI file
//! - `framestats` – counters from the last render pass
//! - `occupancy` – which sprite covers each cell of the active layer
//! - `overlays` – grid and border overlay switches
//! - `spritebounds` – sprite footprints in cells
//! - `undo` – snapshot history
//! - `variantcache` – memoized autotile resolution
//! - `viewport` – camera, zoom and screen-to-cell mapping
//! - `worldfile` – JSON world files
//! - `worldgrid` – the two block layers and world dimensions
pub mod blockstore;
pub mod canvas;
pub mod chunkstore;
pub mod clipboard;
pub mod editorconfig;
pub mod framestats;
pub mod occupancy;
pub mod overlays;
pub mod spritebounds;
pub mod undo;
pub mod variantcache;
pub mod viewport;
pub mod worldfile;
pub mod worldgrid;
