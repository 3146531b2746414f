//! Headless frame composition: the export-side twin of the preview.

use async_trait::async_trait;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use zoomcut_common::error::ZoomcutResult;
use zoomcut_effect_model::{interpolate_zoom, TextOverlay, ZoomEffect};

use crate::raster::RasterFrame;
use crate::text::draw_overlay;

/// A seekable provider of raw frames at the source's native resolution.
///
/// Seeking is a suspending operation: real implementations wait on a
/// decoder. Frames come back at the native resolution, never the
/// display resolution, so export quality does not depend on the preview
/// window size.
#[async_trait]
pub trait VideoSource: Send {
    /// Native `(width, height)` in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Media duration in seconds.
    fn duration_secs(&self) -> f64;

    /// Decode the frame at `time_secs`.
    async fn seek_frame(&mut self, time_secs: f64) -> ZoomcutResult<RasterFrame>;
}

/// Apply the session's effect state at `time_secs` to a raw frame.
///
/// Pure with respect to its inputs: the same frame, time, and effect
/// lists always produce the same pixels. `zooms` must be sorted by
/// start time.
pub fn compose_frame(
    raw: &RasterFrame,
    time_secs: f64,
    zooms: &[ZoomEffect],
    overlays: &[TextOverlay],
) -> ZoomcutResult<RasterFrame> {
    let zoom = interpolate_zoom(time_secs, zooms);

    let mut frame = if zoom.is_neutral() {
        raw.clone()
    } else {
        crop_scale(raw, zoom.x, zoom.y, zoom.scale)
    };

    for overlay in overlays {
        if overlay.active_at(time_secs) {
            draw_overlay(&mut frame, overlay)?;
        }
    }

    Ok(frame)
}

/// Zoom by cropping a `(W/scale, H/scale)` rect centered on the focal
/// point and scaling it back up to the full frame. The rect is clamped
/// inside the frame, so focal points near an edge pin the crop to that
/// edge rather than sampling outside the image.
fn crop_scale(raw: &RasterFrame, x_pct: f64, y_pct: f64, scale: f64) -> RasterFrame {
    let (w, h) = (raw.width(), raw.height());
    let crop_w = ((w as f64 / scale).round() as u32).clamp(1, w);
    let crop_h = ((h as f64 / scale).round() as u32).clamp(1, h);

    let center_x = x_pct / 100.0 * w as f64;
    let center_y = y_pct / 100.0 * h as f64;
    let left = (center_x - crop_w as f64 / 2.0)
        .round()
        .clamp(0.0, (w - crop_w) as f64) as u32;
    let top = (center_y - crop_h as f64 / 2.0)
        .round()
        .clamp(0.0, (h - crop_h) as f64) as u32;

    let cropped = imageops::crop_imm(raw, left, top, crop_w, crop_h).to_image();
    imageops::resize(&cropped, w, h, FilterType::Triangle)
}

/// Seek-then-compose, the unit of work of the export frame loop.
///
/// Callers sample on an absolute grid (`t_i = i / fps`); nothing here
/// accumulates time across calls.
pub struct FrameCaptureService<S: VideoSource> {
    source: S,
}

impl<S: VideoSource> FrameCaptureService<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.source.dimensions()
    }

    pub fn duration_secs(&self) -> f64 {
        self.source.duration_secs()
    }

    pub async fn capture(
        &mut self,
        time_secs: f64,
        zooms: &[ZoomEffect],
        overlays: &[TextOverlay],
    ) -> ZoomcutResult<RasterFrame> {
        let raw = self.source.seek_frame(time_secs).await?;
        compose_frame(&raw, time_secs, zooms, overlays)
    }
}

/// Deterministic in-memory source for tests: a flat color per frame,
/// keyed off the requested time.
pub struct SyntheticSource {
    width: u32,
    height: u32,
    duration_secs: f64,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32, duration_secs: f64) -> Self {
        Self {
            width,
            height,
            duration_secs,
        }
    }
}

#[async_trait]
impl VideoSource for SyntheticSource {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    async fn seek_frame(&mut self, time_secs: f64) -> ZoomcutResult<RasterFrame> {
        let shade = ((time_secs * 40.0) as u32 % 256) as u8;
        Ok(RgbaImage::from_fn(self.width, self.height, |x, y| {
            Rgba([shade, (x % 256) as u8, (y % 256) as u8, 255])
        }))
    }
}
