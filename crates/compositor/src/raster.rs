//! Pixel-level raster helpers shared by the zoom and text passes.

use image::{Rgba, RgbaImage};

/// An owned RGBA frame at some resolution.
pub type RasterFrame = RgbaImage;

/// A frame filled with one color.
pub fn solid(width: u32, height: u32, color: Rgba<u8>) -> RasterFrame {
    RgbaImage::from_pixel(width, height, color)
}

/// Source-over blend of `src` onto the pixel at `(x, y)`. Out-of-bounds
/// coordinates are ignored.
pub fn blend_px(frame: &mut RasterFrame, x: i64, y: i64, src: Rgba<u8>) {
    if x < 0 || y < 0 || x >= frame.width() as i64 || y >= frame.height() as i64 {
        return;
    }
    let dst = frame.get_pixel_mut(x as u32, y as u32);

    let src_a = src[3] as f32 / 255.0;
    if src_a <= 0.0 {
        return;
    }
    let dst_a = dst[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        return;
    }
    for c in 0..3 {
        let s = src[c] as f32 / 255.0;
        let d = dst[c] as f32 / 255.0;
        let out = (s * src_a + d * dst_a * (1.0 - src_a)) / out_a;
        dst[c] = (out * 255.0).round() as u8;
    }
    dst[3] = (out_a * 255.0).round() as u8;
}

/// Fill an axis-aligned rectangle with rounded corners. `radius` is
/// clamped to half the shorter side.
pub fn fill_rounded_rect(
    frame: &mut RasterFrame,
    left: i64,
    top: i64,
    width: i64,
    height: i64,
    radius: f64,
    color: Rgba<u8>,
) {
    if width <= 0 || height <= 0 {
        return;
    }
    let radius = radius.clamp(0.0, (width.min(height) as f64) / 2.0);

    for dy in 0..height {
        for dx in 0..width {
            // Distance test only matters inside the corner squares.
            let cx = if (dx as f64) < radius {
                radius - dx as f64 - 0.5
            } else if (dx as f64) >= width as f64 - radius {
                dx as f64 + 0.5 - (width as f64 - radius)
            } else {
                0.0
            };
            let cy = if (dy as f64) < radius {
                radius - dy as f64 - 0.5
            } else if (dy as f64) >= height as f64 - radius {
                dy as f64 + 0.5 - (height as f64 - radius)
            } else {
                0.0
            };
            if cx * cx + cy * cy > radius * radius {
                continue;
            }
            blend_px(frame, left + dx, top + dy, color);
        }
    }
}
