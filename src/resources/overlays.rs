//! Optional overlays baked into chunk images.
//!
//! Toggle them with
//! [`ToggleOverlayEvent`](crate::events::overlay::ToggleOverlayEvent) so the
//! cached chunks are invalidated along with the flag.

use bevy_ecs::prelude::Resource;

/// Which overlays chunk rendering draws.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOverlays {
    /// Grid lines between cells.
    pub grid: bool,
    /// Outlines on block edges that do not connect to a same-id neighbor.
    pub borders: bool,
}

impl Default for RenderOverlays {
    fn default() -> Self {
        Self {
            grid: true,
            borders: false,
        }
    }
}
