//! Camera and zoom.
//!
//! The camera position is in screen pixels of the zoomed world, i.e. cell
//! `(x, y)` starts at `(x * effective_tile_size - camera_x, ...)` on screen.

use bevy_ecs::prelude::Resource;

use crate::components::gridpos::GridPos;

pub const DEFAULT_TILE_SIZE: u32 = 16;
pub const DEFAULT_ZOOM: f32 = 2.0;
pub const MIN_ZOOM: f32 = 0.25;
pub const MAX_ZOOM: f32 = 8.0;

/// Render parameters a cached chunk image depends on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderParams {
    pub base_tile_size: u32,
    pub zoom: f32,
}

/// Visible window onto the world.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub camera_x: f32,
    pub camera_y: f32,
    /// Screen width in pixels.
    pub width: u32,
    /// Screen height in pixels.
    pub height: u32,
    pub zoom: f32,
    /// Tile size in pixels at zoom 1.
    pub base_tile_size: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            camera_x: 0.0,
            camera_y: 0.0,
            width,
            height,
            zoom: DEFAULT_ZOOM,
            base_tile_size: DEFAULT_TILE_SIZE,
        }
    }

    /// On-screen size of one cell.
    pub fn effective_tile_size(&self) -> u32 {
        ((self.base_tile_size as f32 * self.zoom).round() as u32).max(1)
    }

    pub fn render_params(&self) -> RenderParams {
        RenderParams {
            base_tile_size: self.base_tile_size,
            zoom: self.zoom,
        }
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.camera_x += dx;
        self.camera_y += dy;
    }

    /// Move the camera so `cell` sits at the top-left of the screen.
    pub fn look_at(&mut self, cell: GridPos) {
        let ts = self.effective_tile_size() as f32;
        self.camera_x = cell.x as f32 * ts;
        self.camera_y = cell.y as f32 * ts;
    }

    /// Cell under a screen pixel.
    pub fn screen_to_cell(&self, screen_x: f32, screen_y: f32) -> GridPos {
        let ts = self.effective_tile_size() as f32;
        GridPos::new(
            ((screen_x + self.camera_x) / ts).floor() as i32,
            ((screen_y + self.camera_y) / ts).floor() as i32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_tile_size() {
        let mut view = Viewport::new(800, 600);
        assert_eq!(view.effective_tile_size(), 32);
        view.set_zoom(100.0);
        assert_eq!(view.zoom, MAX_ZOOM);
        assert_eq!(view.effective_tile_size(), 128);
    }

    #[test]
    fn test_screen_to_cell_uses_camera() {
        let mut view = Viewport::new(800, 600);
        view.look_at(GridPos::new(10, 4));
        assert_eq!(view.screen_to_cell(0.0, 0.0), GridPos::new(10, 4));
        assert_eq!(view.screen_to_cell(33.0, -1.0), GridPos::new(11, 3));
    }
}
