//! Frame extraction from a video file via ffmpeg.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::RgbaImage;
use tokio::process::Command;
use zoomcut_common::error::{ZoomcutError, ZoomcutResult};
use zoomcut_compositor::{RasterFrame, VideoSource};

use crate::probe::{probe_duration_secs, probe_video_dimensions};

/// A [`VideoSource`] backed by single-frame ffmpeg rawvideo extraction.
///
/// Frames come out at the file's native resolution. Single-frame seeks
/// are slow compared to streaming decode; the streaming strategy does
/// not use this type, only the stills fallback and ad-hoc captures do.
pub struct FfmpegFrameSource {
    path: PathBuf,
    width: u32,
    height: u32,
    duration_secs: f64,
}

impl FfmpegFrameSource {
    /// Open a source, probing its geometry and duration.
    pub fn open(path: &Path) -> ZoomcutResult<FfmpegFrameSource> {
        if !path.exists() {
            return Err(ZoomcutError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let (width, height) = probe_video_dimensions(path).ok_or_else(|| {
            ZoomcutError::export(format!(
                "could not probe video dimensions of {}",
                path.display()
            ))
        })?;
        let duration_secs = probe_duration_secs(path).ok_or_else(|| {
            ZoomcutError::export(format!("could not probe duration of {}", path.display()))
        })?;
        Ok(FfmpegFrameSource {
            path: path.to_path_buf(),
            width,
            height,
            duration_secs,
        })
    }
}

#[async_trait]
impl VideoSource for FfmpegFrameSource {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    async fn seek_frame(&mut self, time_secs: f64) -> ZoomcutResult<RasterFrame> {
        let time = time_secs.clamp(0.0, self.duration_secs);
        let output = Command::new("ffmpeg")
            .args(["-hide_banner", "-loglevel", "error"])
            .args(["-ss", &format!("{time:.6}")])
            .arg("-i")
            .arg(&self.path)
            .args(["-frames:v", "1", "-f", "rawvideo", "-pix_fmt", "rgba", "-"])
            .output()
            .await
            .map_err(|e| ZoomcutError::export(format!("failed to start ffmpeg: {e}")))?;

        if !output.status.success() {
            return Err(ZoomcutError::export(format!(
                "ffmpeg frame extraction at {time:.3}s failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let expected = self.width as usize * self.height as usize * 4;
        if output.stdout.len() < expected {
            return Err(ZoomcutError::export(format!(
                "short frame read at {time:.3}s: got {} of {expected} bytes",
                output.stdout.len()
            )));
        }

        let mut raw = output.stdout;
        raw.truncate(expected);
        RgbaImage::from_raw(self.width, self.height, raw)
            .ok_or_else(|| ZoomcutError::export("frame buffer size mismatch"))
    }
}
