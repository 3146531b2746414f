//! Live preview state: a transform description instead of pixels.
//!
//! The preview never re-encodes video. It plays the raw footage and
//! asks the host view to apply a scale/translate transform around the
//! frame center, recomputed from the same interpolation the export
//! uses.

use serde::{Deserialize, Serialize};
use zoomcut_effect_model::{interpolate_zoom, EffectiveZoom, TextOverlay, ZoomEffect};

/// The transform a host view applies to the playing video element.
///
/// With origin at the frame center, translating by
/// `(50 - focal) * (scale - 1)` percent puts the focal point back in
/// the middle of the viewport after scaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreviewTransform {
    pub scale: f64,
    pub translate_x_pct: f64,
    pub translate_y_pct: f64,
}

impl PreviewTransform {
    pub const IDENTITY: PreviewTransform = PreviewTransform {
        scale: 1.0,
        translate_x_pct: 0.0,
        translate_y_pct: 0.0,
    };

    pub fn from_zoom(zoom: &EffectiveZoom) -> PreviewTransform {
        if zoom.is_neutral() {
            return PreviewTransform::IDENTITY;
        }
        PreviewTransform {
            scale: zoom.scale,
            translate_x_pct: (50.0 - zoom.x) * (zoom.scale - 1.0),
            translate_y_pct: (50.0 - zoom.y) * (zoom.scale - 1.0),
        }
    }

    /// CSS transform string for a browser-like host (origin center).
    pub fn css(&self) -> String {
        format!(
            "scale({}) translate({}%, {}%)",
            self.scale, self.translate_x_pct, self.translate_y_pct
        )
    }
}

/// Progress of an in-flight export, as the preview shows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportStatus {
    pub percent: u8,
    pub message: String,
}

/// One overlay ready to display, with its positioning resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveOverlay<'a> {
    pub overlay: &'a TextOverlay,
    /// Drop shadow is always on in the preview so text stays legible on
    /// bright footage, matching the export renderer.
    pub drop_shadow: bool,
}

/// Everything the host needs to render one preview frame.
#[derive(Debug)]
pub struct PreviewFrame<'a> {
    pub transform: PreviewTransform,
    pub overlays: Vec<ActiveOverlay<'a>>,
    /// While an export runs the preview is replaced by a blocking
    /// progress overlay; play requests are ignored upstream.
    pub export: Option<ExportStatus>,
}

/// Computes per-frame preview state from timeline snapshots.
#[derive(Debug, Default)]
pub struct PreviewCompositor;

impl PreviewCompositor {
    /// State for the frame at `time_secs`. `zooms` must be sorted by
    /// start time.
    pub fn frame_state<'a>(
        &self,
        time_secs: f64,
        zooms: &[ZoomEffect],
        overlays: &'a [TextOverlay],
        export: Option<ExportStatus>,
    ) -> PreviewFrame<'a> {
        let zoom = interpolate_zoom(time_secs, zooms);
        PreviewFrame {
            transform: PreviewTransform::from_zoom(&zoom),
            overlays: overlays
                .iter()
                .filter(|o| o.active_at(time_secs))
                .map(|overlay| ActiveOverlay {
                    overlay,
                    drop_shadow: true,
                })
                .collect(),
            export,
        }
    }
}
