//! Event and observer to toggle render overlays.
//!
//! Overlays are baked into the cached chunk images, so flipping one through
//! [`ToggleOverlayEvent`] also invalidates every chunk.
use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::info;

use crate::resources::chunkstore::ChunkStore;
use crate::resources::overlays::RenderOverlays;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    Grid,
    Borders,
}

/// Event used to switch one overlay on or off.
#[derive(Event, Debug, Clone, Copy)]
pub struct ToggleOverlayEvent {
    pub overlay: Overlay,
}

/// Observer that flips the requested overlay and invalidates all chunks.
pub fn toggle_overlay_observer(
    trigger: On<ToggleOverlayEvent>,
    mut overlays: ResMut<RenderOverlays>,
    mut chunks: ResMut<ChunkStore>,
) {
    let enabled = match trigger.event().overlay {
        Overlay::Grid => {
            overlays.grid = !overlays.grid;
            overlays.grid
        }
        Overlay::Borders => {
            overlays.borders = !overlays.borders;
            overlays.borders
        }
    };
    chunks.invalidate_all();
    info!("{:?} overlay {}", trigger.event().overlay, if enabled { "on" } else { "off" });
}
