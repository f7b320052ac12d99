//! Software render target.
//!
//! [`Canvas`] wraps an [`RgbaImage`] and implements [`RenderTarget`], the only
//! drawing surface the tile and chunk renderers use. Blits alpha-blend, honor
//! an optional clip rectangle and silently drop anything outside the surface.

use bevy_ecs::prelude::Resource;
use image::imageops::{self, FilterType};
use image::{Pixel, Rgba, RgbaImage};

/// Axis-aligned clip rectangle in target pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClipRect {
    pub x: i64,
    pub y: i64,
    pub w: u32,
    pub h: u32,
}

/// A 2D pixel surface.
pub trait RenderTarget {
    fn size(&self) -> (u32, u32);

    /// Alpha-blend `src` with its top-left corner at `(x, y)`.
    fn blit(&mut self, src: &RgbaImage, x: i64, y: i64);

    /// Blit `src` resized to `w` x `h` with nearest-neighbor sampling.
    fn blit_scaled(&mut self, src: &RgbaImage, x: i64, y: i64, w: u32, h: u32) {
        if w == 0 || h == 0 {
            return;
        }
        if src.dimensions() == (w, h) {
            self.blit(src, x, y);
        } else {
            let scaled = imageops::resize(src, w, h, FilterType::Nearest);
            self.blit(&scaled, x, y);
        }
    }

    /// Blend a solid rectangle.
    fn fill_rect(&mut self, x: i64, y: i64, w: u32, h: u32, color: Rgba<u8>);

    /// Restrict drawing to `clip`, or lift the restriction with `None`.
    fn set_clip(&mut self, clip: Option<ClipRect>);

    /// Replace every pixel with `color`, ignoring the clip.
    fn clear(&mut self, color: Rgba<u8>);
}

/// [`RenderTarget`] backed by an in-memory image.
#[derive(Debug, Clone)]
pub struct Canvas {
    image: RgbaImage,
    clip: Option<ClipRect>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
            clip: None,
        }
    }

    pub fn filled(width: u32, height: u32, color: Rgba<u8>) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, color),
            clip: None,
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Visible region as `(x0, y0, x1, y1)`, exclusive on the far edges.
    fn bounds(&self) -> (i64, i64, i64, i64) {
        let (w, h) = self.image.dimensions();
        let (mut x0, mut y0, mut x1, mut y1) = (0, 0, w as i64, h as i64);
        if let Some(c) = self.clip {
            x0 = x0.max(c.x);
            y0 = y0.max(c.y);
            x1 = x1.min(c.x + c.w as i64);
            y1 = y1.min(c.y + c.h as i64);
        }
        (x0, y0, x1, y1)
    }
}

impl RenderTarget for Canvas {
    fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn blit(&mut self, src: &RgbaImage, x: i64, y: i64) {
        let (bx0, by0, bx1, by1) = self.bounds();
        let x0 = x.max(bx0);
        let y0 = y.max(by0);
        let x1 = (x + src.width() as i64).min(bx1);
        let y1 = (y + src.height() as i64).min(by1);
        for ty in y0..y1 {
            for tx in x0..x1 {
                let p = *src.get_pixel((tx - x) as u32, (ty - y) as u32);
                if p[3] == 0 {
                    continue;
                }
                let dst = self.image.get_pixel_mut(tx as u32, ty as u32);
                if p[3] == 255 {
                    *dst = p;
                } else {
                    dst.blend(&p);
                }
            }
        }
    }

    fn fill_rect(&mut self, x: i64, y: i64, w: u32, h: u32, color: Rgba<u8>) {
        let (bx0, by0, bx1, by1) = self.bounds();
        let x0 = x.max(bx0);
        let y0 = y.max(by0);
        let x1 = (x + w as i64).min(bx1);
        let y1 = (y + h as i64).min(by1);
        for ty in y0..y1 {
            for tx in x0..x1 {
                let dst = self.image.get_pixel_mut(tx as u32, ty as u32);
                if color[3] == 255 {
                    *dst = color;
                } else {
                    dst.blend(&color);
                }
            }
        }
    }

    fn set_clip(&mut self, clip: Option<ClipRect>) {
        self.clip = clip;
    }

    fn clear(&mut self, color: Rgba<u8>) {
        for p in self.image.pixels_mut() {
            *p = color;
        }
    }
}

/// Screen-sized canvas the visible chunks are composited onto every frame.
#[derive(Resource, Debug, Clone)]
pub struct ScreenCanvas(pub Canvas);

impl ScreenCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self(Canvas::new(width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    #[test]
    fn test_blit_clips_to_surface() {
        let mut canvas = Canvas::new(4, 4);
        let src = RgbaImage::from_pixel(3, 3, RED);
        canvas.blit(&src, -1, 2);
        assert_eq!(*canvas.image().get_pixel(0, 2), RED);
        assert_eq!(*canvas.image().get_pixel(1, 3), RED);
        assert_eq!(canvas.image().get_pixel(2, 2)[3], 0);
    }

    #[test]
    fn test_clip_rect_limits_fill() {
        let mut canvas = Canvas::new(8, 8);
        canvas.set_clip(Some(ClipRect { x: 2, y: 2, w: 2, h: 2 }));
        canvas.fill_rect(0, 0, 8, 8, RED);
        canvas.set_clip(None);
        let red = canvas.image().pixels().filter(|p| **p == RED).count();
        assert_eq!(red, 4);
    }

    #[test]
    fn test_transparent_pixels_are_skipped() {
        let mut canvas = Canvas::filled(2, 2, RED);
        canvas.blit(&RgbaImage::new(2, 2), 0, 0);
        assert!(canvas.image().pixels().all(|p| *p == RED));
    }

    #[test]
    fn test_blit_scaled_doubles() {
        let mut canvas = Canvas::new(4, 4);
        canvas.blit_scaled(&RgbaImage::from_pixel(1, 1, RED), 0, 0, 2, 2);
        assert_eq!(*canvas.image().get_pixel(1, 1), RED);
        assert_eq!(canvas.image().get_pixel(2, 2)[3], 0);
    }
}
