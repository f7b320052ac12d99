//! Plain value types shared by resources and systems.
//!
//! Submodules overview:
//! - [`blockinstance`] – a placed block: id, tile mode, tileable edges and state
//! - [`gridpos`] – integer cell coordinates and their world-file keys
//! - [`layer`] – the background and midground layers
//! - [`variant`] – which piece of a sprite sheet to draw for a cell

pub mod blockinstance;
pub mod gridpos;
pub mod layer;
pub mod variant;
