//! Fallback path: render every frame to a still image, then hand the
//! whole sequence to one ffmpeg invocation.
//!
//! Slower and disk-hungrier than the streaming path, but it only needs
//! an ffmpeg that can read image sequences — no rawvideo piping, no
//! pipe timing. The sequence lives in a temp dir that cleans itself up
//! on every exit path.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use zoomcut_common::clock::FrameGrid;
use zoomcut_common::error::{ZoomcutError, ZoomcutResult};
use zoomcut_compositor::{FrameCaptureService, VideoSource};
use zoomcut_effect_model::{TextOverlay, ZoomEffect};

use crate::probe::{command_exists, has_audio_stream};
use crate::progress::{CancelToken, ExportStage, ProgressReporter};
use crate::source::FfmpegFrameSource;
use crate::strategy::{EncodeStrategy, ExportContext};

/// Progress band boundaries: capture fills 5..=75, encode 75..=95.
const CAPTURE_PERCENT_END: u64 = 70;

/// How often the encode wait loop re-checks the cancel flag.
const CANCEL_POLL_MS: u64 = 120;

pub struct PngSequenceStrategy;

/// Render the session's frames into `dir` as a numbered PNG sequence.
///
/// The cancel flag is checked at every frame boundary; on cancellation
/// the frames already written stay in `dir` (callers hand in a temp dir
/// that cleans up on drop). Returns the number of frames written.
async fn capture_sequence<S: VideoSource>(
    source: S,
    grid: &FrameGrid,
    zooms: &[ZoomEffect],
    overlays: &[TextOverlay],
    dir: &Path,
    reporter: &ProgressReporter,
    cancel: &CancelToken,
) -> ZoomcutResult<u64> {
    let total_frames = grid.total_frames().max(1);
    let mut capture = FrameCaptureService::new(source);
    let mut written = 0u64;

    for (index, time_secs) in grid.iter() {
        cancel.check()?;

        let frame = capture.capture(time_secs, zooms, overlays).await?;
        let frame_path = dir.join(format!("frame_{index:06}.png"));
        frame
            .save(&frame_path)
            .map_err(|e| ZoomcutError::export(format!("failed to write frame: {e}")))?;
        written += 1;

        let percent = 5 + (index * CAPTURE_PERCENT_END / total_frames) as u8;
        reporter.report(
            ExportStage::Capturing,
            percent,
            format!("Capturing frame {}/{total_frames}", index + 1),
        );
        tokio::task::yield_now().await;
    }

    Ok(written)
}

#[async_trait]
impl EncodeStrategy for PngSequenceStrategy {
    fn name(&self) -> &'static str {
        "png-sequence"
    }

    fn probe(&self) -> bool {
        command_exists("ffmpeg") && command_exists("ffprobe")
    }

    async fn try_export(&self, ctx: &mut ExportContext) -> ZoomcutResult<Option<PathBuf>> {
        let spec = ctx.spec;
        let grid = FrameGrid::new(ctx.duration_secs, spec.fps);

        let workdir = tempfile::TempDir::with_prefix("zoomcut-frames-")
            .map_err(|e| ZoomcutError::export(format!("failed to create frame workspace: {e}")))?;

        let source = FfmpegFrameSource::open(&ctx.source_path)?;

        tracing::info!(
            total_frames = grid.total_frames(),
            workdir = %workdir.path().display(),
            "Capturing frame sequence"
        );

        capture_sequence(
            source,
            &grid,
            &ctx.zooms,
            &ctx.overlays,
            workdir.path(),
            &ctx.reporter,
            &ctx.cancel,
        )
        .await?;

        ctx.cancel.check()?;
        ctx.reporter
            .report(ExportStage::Encoding, 75, "Encoding frame sequence");

        let mux_audio = spec.include_audio && has_audio_stream(&ctx.source_path);
        let pattern = workdir.path().join("frame_%06d.png");

        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-y", "-hide_banner", "-loglevel", "error"])
            .args(["-framerate", &spec.fps.to_string()])
            .arg("-i")
            .arg(&pattern);
        if mux_audio {
            cmd.arg("-i").arg(&ctx.source_path);
            cmd.args(["-map", "0:v", "-map", "1:a:0"]);
            cmd.args(["-c:a", "aac", "-b:a", &format!("{}k", spec.audio_bitrate_kbps)]);
            cmd.arg("-shortest");
        }
        // Speed-biased preset: the capture pass already cost real time.
        cmd.args(["-c:v", "libx264", "-preset", "ultrafast"])
            .args(["-b:v", &format!("{}k", spec.video_bitrate_kbps)])
            .args(["-pix_fmt", "yuv420p", "-movflags", "+faststart"])
            .args(["-s", &format!("{}x{}", spec.width, spec.height)])
            .arg(&ctx.output_path)
            .stdin(std::process::Stdio::null())
            .stderr(std::process::Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| ZoomcutError::export(format!("failed to start ffmpeg: {e}")))?;

        // Drain stderr off to the side; a full pipe would stall ffmpeg.
        let stderr_pipe = child.stderr.take();
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(mut pipe) = stderr_pipe {
                use tokio::io::AsyncReadExt;
                let _ = pipe.read_to_end(&mut buf).await;
            }
            buf
        });

        // Poll rather than block on exit: cancellation must be able to
        // kill the encoder mid-run.
        let status = loop {
            if ctx.cancel.is_cancelled() {
                let _ = child.kill().await;
                if ctx.output_path.exists() {
                    let _ = std::fs::remove_file(&ctx.output_path);
                }
                return Err(ZoomcutError::Cancelled);
            }
            match child
                .try_wait()
                .map_err(|e| ZoomcutError::export(format!("failed to wait on ffmpeg: {e}")))?
            {
                Some(status) => break status,
                None => tokio::time::sleep(Duration::from_millis(CANCEL_POLL_MS)).await,
            }
        };

        if !status.success() {
            let stderr = stderr_task.await.unwrap_or_default();
            if ctx.output_path.exists() {
                let _ = std::fs::remove_file(&ctx.output_path);
            }
            return Err(ZoomcutError::export(format!(
                "sequence encode exited with {status}: {}",
                String::from_utf8_lossy(&stderr).trim()
            )));
        }

        ctx.reporter
            .report(ExportStage::Encoding, 95, "Sequence encoded");
        Ok(Some(ctx.output_path.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zoomcut_compositor::{RasterFrame, SyntheticSource};

    /// Wraps a source and trips the cancel flag after serving N frames,
    /// the way a user hitting Ctrl-C mid-capture would.
    struct CancellingSource {
        inner: SyntheticSource,
        cancel: CancelToken,
        cancel_after: u32,
        served: u32,
    }

    #[async_trait]
    impl VideoSource for CancellingSource {
        fn dimensions(&self) -> (u32, u32) {
            self.inner.dimensions()
        }

        fn duration_secs(&self) -> f64 {
            self.inner.duration_secs()
        }

        async fn seek_frame(&mut self, time_secs: f64) -> ZoomcutResult<RasterFrame> {
            self.served += 1;
            if self.served >= self.cancel_after {
                self.cancel.cancel();
            }
            self.inner.seek_frame(time_secs).await
        }
    }

    #[tokio::test]
    async fn test_zero_effect_sequence_matches_source() {
        let dir = tempfile::tempdir().unwrap();
        let grid = FrameGrid::new(0.2, 10);
        let reporter = ProgressReporter::new(None);
        let cancel = CancelToken::new();

        let written = capture_sequence(
            SyntheticSource::new(32, 24, 1.0),
            &grid,
            &[],
            &[],
            dir.path(),
            &reporter,
            &cancel,
        )
        .await
        .unwrap();
        assert_eq!(written, 2);

        // With no effects, the stills are the source frames, pixel for
        // pixel (PNG is lossless).
        let mut source = SyntheticSource::new(32, 24, 1.0);
        let expected = source.seek_frame(0.0).await.unwrap();
        let first = image::open(dir.path().join("frame_000000.png"))
            .unwrap()
            .to_rgba8();
        assert_eq!(expected, first);
    }

    #[tokio::test]
    async fn test_cancel_mid_capture_stops_the_loop() {
        let dir = tempfile::tempdir().unwrap();
        let grid = FrameGrid::new(1.0, 10);
        let reporter = ProgressReporter::new(None);
        let cancel = CancelToken::new();

        let source = CancellingSource {
            inner: SyntheticSource::new(16, 16, 1.0),
            cancel: cancel.clone(),
            cancel_after: 3,
            served: 0,
        };
        let err = capture_sequence(source, &grid, &[], &[], dir.path(), &reporter, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ZoomcutError::Cancelled));

        // The flag tripped while frame 3 was being served, so the check
        // at the top of iteration 4 is the first one that sees it.
        let frames = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(frames, 3);
    }
}
