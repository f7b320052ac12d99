//! Whole-world PNG export.
//!
//! The export bypasses the chunk cache: the world is painted once into a
//! single surface the size of the world at the base tile size, using the same
//! paint order as chunk rendering.

use std::error::Error;
use std::path::Path;

use image::RgbaImage;
use log::info;

use crate::components::gridpos::GridPos;
use crate::resources::canvas::Canvas;
use crate::resources::chunkstore::CellRect;
use crate::resources::variantcache::VariantCache;
use crate::systems::chunkrender::{CLEAR_COLOR, ChunkScene, draw_grid_lines, paint_blocks};

/// Paint the whole world into a new image.
pub fn render_world_image(scene: &ChunkScene, cache: &mut VariantCache, tile_px: u32) -> RgbaImage {
    let (w, h) = (scene.grid.width, scene.grid.height);
    let mut canvas = Canvas::filled(w as u32 * tile_px, h as u32 * tile_px, CLEAR_COLOR);
    let area = CellRect {
        x0: 0,
        y0: 0,
        x1: w,
        y1: h,
    };
    if scene.overlays.grid {
        draw_grid_lines(&mut canvas, area, w, h, tile_px);
    }
    paint_blocks(&mut canvas, scene, cache, area, GridPos::new(0, 0), tile_px);
    canvas.into_image()
}

/// Render the world and write it as PNG. Returns the image size.
pub fn export_png(
    path: impl AsRef<Path>,
    scene: &ChunkScene,
    cache: &mut VariantCache,
    tile_px: u32,
) -> Result<(u32, u32), Box<dyn Error>> {
    let path = path.as_ref();
    let image = render_world_image(scene, cache, tile_px);
    image.save_with_format(path, image::ImageFormat::Png)?;
    info!(
        "Exported {}x{} world image to {}",
        image.width(),
        image.height(),
        path.display()
    );
    Ok(image.dimensions())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::blockinstance::{BlockInstance, TileMode};
    use crate::components::layer::Layer;
    use crate::resources::blockstore::BlockStore;
    use crate::resources::overlays::RenderOverlays;
    use crate::resources::worldgrid::WorldGrid;

    #[test]
    fn test_export_covers_whole_world() {
        let mut grid = WorldGrid::new(5, 4, 0);
        grid.insert(Layer::Midground, GridPos::new(4, 3), &BlockInstance::new("dirt", TileMode::All));
        let assets = BlockStore::with_default_blocks();
        let scene = ChunkScene {
            grid: &grid,
            assets: &assets,
            overlays: RenderOverlays {
                grid: false,
                borders: false,
            },
        };
        let image = render_world_image(&scene, &mut VariantCache::new(), 16);
        assert_eq!(image.dimensions(), (80, 64));
        assert_eq!(image.get_pixel(0, 0).0, CLEAR_COLOR.0);
        // No sprite loaded: the placeholder fills the bottom-right cell.
        assert_eq!(image.get_pixel(72, 56).0, [139, 69, 19, 255]);
    }

    #[test]
    fn test_export_writes_png() {
        let grid = WorldGrid::new(3, 3, 1);
        let assets = BlockStore::with_default_blocks();
        let scene = ChunkScene {
            grid: &grid,
            assets: &assets,
            overlays: RenderOverlays::default(),
        };
        let path = std::env::temp_dir().join(format!("tilecraft-export-{}.png", std::process::id()));
        let size = export_png(&path, &scene, &mut VariantCache::new(), 8).unwrap();
        let decoded = image::open(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(size, (24, 24));
        assert_eq!((decoded.width(), decoded.height()), (24, 24));
    }
}
