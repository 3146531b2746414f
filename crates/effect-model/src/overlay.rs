//! Text overlay records.

use serde::{Deserialize, Serialize};

/// Default font size in pixels at source resolution.
pub const DEFAULT_FONT_SIZE: f32 = 48.0;

/// A time-bounded block of styled text anchored at a frame position.
///
/// Overlays carry no z-order field; insertion order in the timeline's
/// collection is the draw order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextOverlay {
    /// Unique identifier, immutable once created.
    pub id: String,

    /// Interval start in seconds. Invariant: `start_secs < end_secs`.
    pub start_secs: f64,

    /// Interval end in seconds.
    pub end_secs: f64,

    /// Anchor X as a percentage (0–100) of frame width.
    pub x: f64,

    /// Anchor Y as a percentage (0–100) of frame height.
    pub y: f64,

    /// Text content; newlines delimit lines.
    pub text: String,

    /// Font size in pixels at source resolution.
    pub font_size: f32,

    /// Text color as `#rrggbb`.
    pub color: String,

    /// Font family name.
    pub font_family: String,

    /// Optional background fill as `#rrggbb`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,

    /// Background padding in pixels. Only meaningful with `background`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding: Option<f64>,

    /// Background corner radius in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<f64>,
}

impl TextOverlay {
    /// Whether the overlay is visible at `time` (both ends inclusive).
    pub fn active_at(&self, time_secs: f64) -> bool {
        time_secs >= self.start_secs && time_secs <= self.end_secs
    }

    /// Interval length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }

    /// Parse the text color, falling back to white on malformed input.
    pub fn color_rgb(&self) -> (u8, u8, u8) {
        parse_hex_color(&self.color).unwrap_or((255, 255, 255))
    }

    /// Parse the background color, if set and well-formed.
    pub fn background_rgb(&self) -> Option<(u8, u8, u8)> {
        self.background.as_deref().and_then(parse_hex_color)
    }

    /// Copy with the pixel-unit style metrics multiplied by `factor`.
    ///
    /// Times, anchors, and colors are resolution-independent and pass
    /// through unchanged. Renderers working at a resolution other than
    /// the source's must scale the metrics, or the same overlay comes
    /// out a different size relative to the frame.
    pub fn scaled(&self, factor: f64) -> TextOverlay {
        let mut scaled = self.clone();
        scaled.font_size = (self.font_size as f64 * factor) as f32;
        scaled.padding = self.padding.map(|p| p * factor);
        scaled.corner_radius = self.corner_radius.map(|r| r * factor);
        scaled
    }
}

/// Parse a `#rrggbb` string. Returns `None` on anything else.
pub fn parse_hex_color(s: &str) -> Option<(u8, u8, u8)> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlay(start: f64, end: f64) -> TextOverlay {
        TextOverlay {
            id: "text_1".to_string(),
            start_secs: start,
            end_secs: end,
            x: 50.0,
            y: 80.0,
            text: "Hello".to_string(),
            font_size: DEFAULT_FONT_SIZE,
            color: "#ffffff".to_string(),
            font_family: "sans-serif".to_string(),
            background: None,
            padding: None,
            corner_radius: None,
        }
    }

    #[test]
    fn test_active_at_is_inclusive() {
        let o = overlay(1.0, 3.0);
        assert!(!o.active_at(0.999));
        assert!(o.active_at(1.0));
        assert!(o.active_at(2.0));
        assert!(o.active_at(3.0));
        assert!(!o.active_at(3.001));
    }

    #[test]
    fn test_hex_color_parsing() {
        assert_eq!(parse_hex_color("#ff8000"), Some((255, 128, 0)));
        assert_eq!(parse_hex_color("#000000"), Some((0, 0, 0)));
        assert_eq!(parse_hex_color("ff8000"), None);
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("#zzzzzz"), None);
    }

    #[test]
    fn test_malformed_color_falls_back_to_white() {
        let mut o = overlay(0.0, 1.0);
        o.color = "not-a-color".to_string();
        assert_eq!(o.color_rgb(), (255, 255, 255));
    }

    #[test]
    fn test_scaled_adjusts_pixel_metrics_only() {
        let mut o = overlay(1.0, 3.0);
        o.padding = Some(8.0);
        o.corner_radius = Some(6.0);
        let half = o.scaled(0.5);
        assert_eq!(half.font_size, DEFAULT_FONT_SIZE / 2.0);
        assert_eq!(half.padding, Some(4.0));
        assert_eq!(half.corner_radius, Some(3.0));
        // Everything resolution-independent is untouched.
        assert_eq!(half.x, o.x);
        assert_eq!(half.y, o.y);
        assert_eq!(half.start_secs, o.start_secs);
        assert_eq!(half.end_secs, o.end_secs);
        assert_eq!(half.color, o.color);
    }

    #[test]
    fn test_overlay_roundtrips_through_json() {
        let mut o = overlay(0.5, 4.5);
        o.background = Some("#202020".to_string());
        o.padding = Some(12.0);
        let json = serde_json::to_string(&o).unwrap();
        let back: TextOverlay = serde_json::from_str(&json).unwrap();
        assert_eq!(o, back);
    }
}
