//! Text overlay rasterization via cosmic-text.
//!
//! Shaping and glyph rendering go through a process-wide `FontSystem`
//! and `SwashCache`; both are expensive to build, so they are created
//! once and shared behind mutexes.

use std::sync::{Mutex, OnceLock};

use cosmic_text::{Attrs, Buffer, Color, Family, FontSystem, Metrics, Shaping, SwashCache, Wrap};
use image::Rgba;
use zoomcut_common::error::{ZoomcutError, ZoomcutResult};
use zoomcut_effect_model::TextOverlay;

use crate::raster::{blend_px, fill_rounded_rect, RasterFrame};

/// Fraction of the frame width a text block may occupy before wrapping.
const WRAP_FRACTION: f32 = 0.8;

/// Line height multiplier.
const LINE_HEIGHT: f32 = 1.2;

/// Drop shadow offset in pixels. Always drawn, for legibility on bright
/// footage.
const SHADOW_OFFSET: i64 = 2;
const SHADOW_ALPHA: u8 = 160;

fn font_system() -> &'static Mutex<FontSystem> {
    static FONT_SYSTEM: OnceLock<Mutex<FontSystem>> = OnceLock::new();
    FONT_SYSTEM.get_or_init(|| Mutex::new(FontSystem::new()))
}

fn swash_cache() -> &'static Mutex<SwashCache> {
    static SWASH_CACHE: OnceLock<Mutex<SwashCache>> = OnceLock::new();
    SWASH_CACHE.get_or_init(|| Mutex::new(SwashCache::new()))
}

fn family_for(name: &str) -> Family<'_> {
    match name.to_lowercase().as_str() {
        "serif" => Family::Serif,
        "monospace" | "mono" => Family::Monospace,
        "cursive" => Family::Cursive,
        "fantasy" => Family::Fantasy,
        "sans-serif" | "sans" => Family::SansSerif,
        _ => Family::Name(name),
    }
}

/// Draw one overlay onto the frame. The text block wraps at 80% of the
/// frame width and is centered on the overlay's percentage anchor.
pub fn draw_overlay(frame: &mut RasterFrame, overlay: &TextOverlay) -> ZoomcutResult<()> {
    let (frame_w, frame_h) = (frame.width(), frame.height());
    if frame_w == 0 || frame_h == 0 || overlay.text.is_empty() {
        return Ok(());
    }

    let mut fonts = font_system()
        .lock()
        .map_err(|_| ZoomcutError::compose("font system lock poisoned"))?;
    let mut cache = swash_cache()
        .lock()
        .map_err(|_| ZoomcutError::compose("glyph cache lock poisoned"))?;

    let metrics = Metrics::new(overlay.font_size, overlay.font_size * LINE_HEIGHT);
    let mut buffer = Buffer::new(&mut fonts, metrics);
    let wrap_width = frame_w as f32 * WRAP_FRACTION;
    buffer.set_size(&mut fonts, Some(wrap_width), None);
    buffer.set_wrap(&mut fonts, Wrap::Word);
    buffer.set_text(
        &mut fonts,
        &overlay.text,
        Attrs::new().family(family_for(&overlay.font_family)),
        Shaping::Advanced,
    );
    buffer.shape_until_scroll(&mut fonts, false);

    // Measured bounds of the laid-out block.
    let mut text_w = 0.0f32;
    let mut text_h = 0.0f32;
    for run in buffer.layout_runs() {
        for glyph in run.glyphs.iter() {
            text_w = text_w.max(glyph.x + glyph.w);
        }
        text_h = text_h.max(run.line_y + metrics.line_height);
    }

    // Block top-left, centered on the anchor.
    let anchor_x = overlay.x / 100.0 * frame_w as f64;
    let anchor_y = overlay.y / 100.0 * frame_h as f64;
    let left = (anchor_x - text_w as f64 / 2.0).round() as i64;
    let top = (anchor_y - text_h as f64 / 2.0).round() as i64;

    if let Some((br, bg, bb)) = overlay.background_rgb() {
        let pad = overlay.padding.unwrap_or(8.0).max(0.0);
        let radius = overlay.corner_radius.unwrap_or(6.0).max(0.0);
        fill_rounded_rect(
            frame,
            left - pad as i64,
            top - pad as i64,
            text_w as i64 + 2 * pad as i64,
            text_h as i64 + 2 * pad as i64,
            radius,
            Rgba([br, bg, bb, 230]),
        );
    }

    let (r, g, b) = overlay.color_rgb();

    // Shadow pass, then the text itself.
    for (offset, color) in [
        (SHADOW_OFFSET, Color::rgba(0, 0, 0, SHADOW_ALPHA)),
        (0, Color::rgba(r, g, b, 255)),
    ] {
        let mut coverage: Vec<(i64, i64, u32, u32, Rgba<u8>)> = Vec::new();
        buffer.draw(&mut fonts, &mut cache, color, |x, y, w, h, c| {
            coverage.push((
                left + offset + x as i64,
                top + offset + y as i64,
                w,
                h,
                Rgba([c.r(), c.g(), c.b(), c.a()]),
            ));
        });
        for (px, py, w, h, c) in coverage {
            for dy in 0..h as i64 {
                for dx in 0..w as i64 {
                    blend_px(frame, px + dx, py + dy, c);
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::solid;

    fn overlay(text: &str) -> TextOverlay {
        TextOverlay {
            id: "text_1".to_string(),
            start_secs: 0.0,
            end_secs: 10.0,
            x: 50.0,
            y: 50.0,
            text: text.to_string(),
            font_size: 24.0,
            color: "#ffffff".to_string(),
            font_family: "sans-serif".to_string(),
            background: None,
            padding: None,
            corner_radius: None,
        }
    }

    #[test]
    fn test_empty_text_is_noop() {
        let mut frame = solid(64, 64, Rgba([10, 10, 10, 255]));
        let before = frame.clone();
        draw_overlay(&mut frame, &overlay("")).unwrap();
        assert_eq!(frame, before);
    }

    #[test]
    fn test_draw_does_not_error_on_small_frames() {
        let mut frame = solid(8, 8, Rgba([0, 0, 0, 255]));
        draw_overlay(&mut frame, &overlay("Hello world")).unwrap();
    }

    #[test]
    fn test_background_paints_around_anchor() {
        let mut frame = solid(100, 100, Rgba([0, 0, 0, 255]));
        let mut o = overlay("Hi");
        o.background = Some("#ff0000".to_string());
        o.padding = Some(10.0);
        o.corner_radius = Some(0.0);
        draw_overlay(&mut frame, &o).unwrap();
        // The padded box covers the anchor even if no font is available.
        let p = frame.get_pixel(50, 50);
        assert!(p[0] > 100, "anchor pixel not painted: {p:?}");
    }

    #[test]
    fn test_family_mapping() {
        assert!(matches!(family_for("Monospace"), Family::Monospace));
        assert!(matches!(family_for("serif"), Family::Serif));
        assert!(matches!(family_for("Inter"), Family::Name("Inter")));
    }
}
