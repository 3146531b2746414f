//! Import of recorded click streams as autozoom effects.
//!
//! Click recorders emit absolute pixel coordinates at whatever capture
//! resolution they ran at; conversion normalizes those to the percentage
//! space the rest of the model uses.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::zoom::{EffectSource, Transition, ZoomEffect, SCALE_MAX, SCALE_MIN};

/// Default effect length when a click record carries no duration.
pub const DEFAULT_CLICK_DURATION_SECS: f64 = 2.0;

/// Default magnification when a click record carries no zoom level.
pub const DEFAULT_CLICK_ZOOM: f64 = 2.0;

#[derive(Debug, Error)]
pub enum ClickImportError {
    #[error("malformed clicks JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid capture dimensions {width}x{height}")]
    InvalidDimensions { width: f64, height: f64 },

    #[error("click {index} has non-positive duration {duration}")]
    InvalidDuration { index: usize, duration: f64 },
}

/// One recorded click. Coordinates are absolute pixels in the capture
/// resolution given by the enclosing [`ClicksData`] (or the per-record
/// override, when present).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickData {
    /// Seconds from the start of the recording.
    pub time: f64,

    /// Pixel X in capture space.
    pub x: f64,

    /// Pixel Y in capture space.
    pub y: f64,

    /// How long the zoom should hold, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    /// Magnification to apply. Recorders write this camelCase.
    #[serde(
        default,
        alias = "zoomLevel",
        skip_serializing_if = "Option::is_none"
    )]
    pub zoom_level: Option<f64>,

    /// Per-record capture width override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,

    /// Per-record capture height override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Recorder wall-clock timestamp, milliseconds since epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,

    /// Recorder event kind tag (e.g. "click", "dblclick").
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "type")]
    pub kind: Option<String>,
}

/// A click-recorder export file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClicksData {
    pub clicks: Vec<ClickData>,

    /// Capture width in pixels.
    pub width: f64,

    /// Capture height in pixels.
    pub height: f64,

    /// Recording duration in seconds, when the recorder knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl ClicksData {
    /// Parse a clicks JSON document. Unknown fields are tolerated;
    /// missing required fields or malformed JSON fail the whole import
    /// (no partial effect list is ever produced).
    pub fn parse(json: &str) -> Result<ClicksData, ClickImportError> {
        let data: ClicksData = serde_json::from_str(json)?;
        if data.width <= 0.0 || data.height <= 0.0 {
            return Err(ClickImportError::InvalidDimensions {
                width: data.width,
                height: data.height,
            });
        }
        Ok(data)
    }

    /// Convert every click into an autozoom effect.
    ///
    /// With `normalize` set, the first click's time is treated as zero
    /// and all subsequent clicks shift accordingly (recorders that log
    /// absolute capture-session time need this).
    ///
    /// Any invalid record fails the whole conversion; callers never see
    /// a partial effect list.
    pub fn into_effects(self, normalize: bool) -> Result<Vec<ZoomEffect>, ClickImportError> {
        let base = if normalize {
            self.clicks.first().map(|c| c.time).unwrap_or(0.0)
        } else {
            0.0
        };

        let mut effects = Vec::with_capacity(self.clicks.len());
        for (i, click) in self.clicks.into_iter().enumerate() {
            let width = click.width.unwrap_or(self.width);
            let height = click.height.unwrap_or(self.height);
            if width <= 0.0 || height <= 0.0 {
                return Err(ClickImportError::InvalidDimensions { width, height });
            }
            if let Some(duration) = click.duration {
                if duration <= 0.0 {
                    return Err(ClickImportError::InvalidDuration { index: i, duration });
                }
            }

            let start = (click.time - base).max(0.0);
            let end = start + click.duration.unwrap_or(DEFAULT_CLICK_DURATION_SECS);
            let scale = click
                .zoom_level
                .unwrap_or(DEFAULT_CLICK_ZOOM)
                .clamp(SCALE_MIN, SCALE_MAX);

            effects.push(ZoomEffect {
                id: click
                    .id
                    .clone()
                    .unwrap_or_else(|| format!("autozoom_{i}")),
                start_secs: start,
                end_secs: end,
                x: (click.x / width * 100.0).clamp(0.0, 100.0),
                y: (click.y / height * 100.0).clamp(0.0, 100.0),
                scale,
                transition: Transition::Smooth,
                source: EffectSource::Autozoom,
                origin: Some(click),
            });
        }
        Ok(effects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_at_center_maps_to_50_50() {
        let json = r#"{
            "clicks": [{ "time": 5.0, "x": 640, "y": 360 }],
            "width": 1280,
            "height": 720
        }"#;
        let effects = ClicksData::parse(json).unwrap().into_effects(false).unwrap();
        assert_eq!(effects.len(), 1);
        let e = &effects[0];
        assert_eq!(e.start_secs, 5.0);
        assert_eq!(e.end_secs, 7.0);
        assert_eq!(e.x, 50.0);
        assert_eq!(e.y, 50.0);
        assert_eq!(e.scale, 2.0);
        assert_eq!(e.transition, Transition::Smooth);
        assert_eq!(e.source, EffectSource::Autozoom);
        assert!(e.origin.is_some());
    }

    #[test]
    fn test_explicit_duration_and_zoom_respected() {
        let json = r#"{
            "clicks": [{ "time": 1.0, "x": 0, "y": 720, "duration": 3.5, "zoomLevel": 3.0 }],
            "width": 1280,
            "height": 720
        }"#;
        let effects = ClicksData::parse(json).unwrap().into_effects(false).unwrap();
        let e = &effects[0];
        assert_eq!(e.end_secs, 4.5);
        assert_eq!(e.scale, 3.0);
        assert_eq!(e.x, 0.0);
        assert_eq!(e.y, 100.0);
    }

    #[test]
    fn test_zoom_level_clamped_into_range() {
        let json = r#"{
            "clicks": [{ "time": 0.0, "x": 100, "y": 100, "zoom_level": 9.0 }],
            "width": 200,
            "height": 200
        }"#;
        let effects = ClicksData::parse(json).unwrap().into_effects(false).unwrap();
        assert_eq!(effects[0].scale, SCALE_MAX);
    }

    #[test]
    fn test_normalize_shifts_to_first_click() {
        let json = r#"{
            "clicks": [
                { "time": 100.0, "x": 10, "y": 10 },
                { "time": 103.0, "x": 20, "y": 20 }
            ],
            "width": 100,
            "height": 100
        }"#;
        let effects = ClicksData::parse(json).unwrap().into_effects(true).unwrap();
        assert_eq!(effects[0].start_secs, 0.0);
        assert_eq!(effects[1].start_secs, 3.0);
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(ClicksData::parse("{ not json").is_err());
        // Missing required width/height.
        assert!(ClicksData::parse(r#"{ "clicks": [] }"#).is_err());
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let json = r#"{ "clicks": [], "width": 0, "height": 720 }"#;
        assert!(matches!(
            ClicksData::parse(json),
            Err(ClickImportError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_non_positive_duration_rejects_whole_import() {
        let json = r#"{
            "clicks": [
                { "time": 1.0, "x": 10, "y": 10 },
                { "time": 4.0, "x": 20, "y": 20, "duration": 0.0 }
            ],
            "width": 100,
            "height": 100
        }"#;
        let err = ClicksData::parse(json)
            .unwrap()
            .into_effects(false)
            .unwrap_err();
        assert!(matches!(err, ClickImportError::InvalidDuration { index: 1, .. }));
    }

    #[test]
    fn test_unknown_fields_tolerated() {
        let json = r#"{
            "clicks": [{ "time": 0.0, "x": 1, "y": 1, "button": "left" }],
            "width": 10,
            "height": 10,
            "recorder": "sak-1.2"
        }"#;
        assert!(ClicksData::parse(json).is_ok());
    }
}
