//! Tilecraft library.
//!
//! Core of a chunked tile-world editor: a two-layer grid of blocks, sprite
//! footprints and occupancy, autotiling, budgeted chunk rendering, editing
//! tools, undo history and world files. All state lives in ECS resources; the
//! [`editor::Editor`] facade wires them together.

pub mod components;
pub mod editor;
pub mod events;
pub mod resources;
pub mod systems;
