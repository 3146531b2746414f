//! Fast path: stream raw frames through a pair of ffmpeg processes.
//!
//! A decoder process emits rawvideo RGBA at the target resolution and
//! frame rate; each frame is composed in-process and written straight
//! to an encoder process's stdin. No intermediate files, one pass over
//! the footage.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use async_trait::async_trait;
use image::RgbaImage;
use zoomcut_common::clock::FrameGrid;
use zoomcut_common::error::{ZoomcutError, ZoomcutResult};
use zoomcut_compositor::compose_frame;
use zoomcut_effect_model::TextOverlay;

use crate::pipeline::OutputSpec;
use crate::probe::{command_exists, ffmpeg_has_encoder, has_audio_stream, probe_video_dimensions};
use crate::progress::ExportStage;
use crate::strategy::{EncodeStrategy, ExportContext};

/// Frames between scheduler yields in the copy loop.
const YIELD_EVERY_FRAMES: u64 = 8;

pub struct FfmpegStreamStrategy;

fn decoder_args(source: &Path, spec: &OutputSpec, duration_secs: f64) -> Vec<String> {
    vec![
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-i".to_string(),
        source.display().to_string(),
        "-t".to_string(),
        format!("{duration_secs:.6}"),
        "-vf".to_string(),
        format!("scale={}:{}", spec.width, spec.height),
        "-r".to_string(),
        spec.fps.to_string(),
        "-f".to_string(),
        "rawvideo".to_string(),
        "-pix_fmt".to_string(),
        "rgba".to_string(),
        "-".to_string(),
    ]
}

fn encoder_args(
    source: &Path,
    output: &Path,
    spec: &OutputSpec,
    mux_audio: bool,
) -> Vec<String> {
    let mut args = vec![
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-f".to_string(),
        "rawvideo".to_string(),
        "-pix_fmt".to_string(),
        "rgba".to_string(),
        "-s".to_string(),
        format!("{}x{}", spec.width, spec.height),
        "-r".to_string(),
        spec.fps.to_string(),
        "-i".to_string(),
        "-".to_string(),
    ];

    if mux_audio {
        args.push("-i".to_string());
        args.push(source.display().to_string());
    }

    args.push("-map".to_string());
    args.push("0:v".to_string());
    if mux_audio {
        args.push("-map".to_string());
        args.push("1:a:0".to_string());
        args.push("-c:a".to_string());
        args.push("aac".to_string());
        args.push("-b:a".to_string());
        args.push(format!("{}k", spec.audio_bitrate_kbps));
        // Trim to the shorter stream so re-timed video never pads with
        // trailing audio.
        args.push("-shortest".to_string());
    }

    args.extend([
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        "fast".to_string(),
        "-b:v".to_string(),
        format!("{}k", spec.video_bitrate_kbps),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        output.display().to_string(),
    ]);

    args
}

/// Overlay style metrics are authored in source pixels, but frames
/// arrive here pre-scaled to the target resolution. Rescale the metrics
/// so text keeps its size relative to the frame.
fn overlays_for_target(
    overlays: &[TextOverlay],
    native_height: Option<u32>,
    target_height: u32,
) -> Vec<TextOverlay> {
    match native_height {
        Some(h) if h > 0 && h != target_height => {
            let factor = target_height as f64 / h as f64;
            overlays.iter().map(|o| o.scaled(factor)).collect()
        }
        _ => overlays.to_vec(),
    }
}

/// Kill both children and remove the partial output file.
fn abort(decoder: &mut Child, encoder: &mut Child, output: &Path) {
    let _ = decoder.kill();
    let _ = encoder.kill();
    let _ = decoder.wait();
    let _ = encoder.wait();
    if output.exists() {
        if let Err(e) = std::fs::remove_file(output) {
            tracing::warn!(path = %output.display(), error = %e, "failed to remove partial output");
        }
    }
}

#[async_trait]
impl EncodeStrategy for FfmpegStreamStrategy {
    fn name(&self) -> &'static str {
        "ffmpeg-stream"
    }

    fn probe(&self) -> bool {
        command_exists("ffmpeg") && command_exists("ffprobe") && ffmpeg_has_encoder("libx264")
    }

    async fn try_export(&self, ctx: &mut ExportContext) -> ZoomcutResult<Option<PathBuf>> {
        let spec = ctx.spec;
        let grid = FrameGrid::new(ctx.duration_secs, spec.fps);
        let total_frames = grid.total_frames().max(1);
        let frame_bytes = spec.width as usize * spec.height as usize * 4;
        let mux_audio = spec.include_audio && has_audio_stream(&ctx.source_path);
        let native_height = probe_video_dimensions(&ctx.source_path).map(|(_, h)| h);
        let overlays = overlays_for_target(&ctx.overlays, native_height, spec.height);

        tracing::info!(
            total_frames,
            width = spec.width,
            height = spec.height,
            fps = spec.fps,
            mux_audio,
            "Starting frame stream"
        );

        let mut decoder = Command::new("ffmpeg")
            .args(decoder_args(&ctx.source_path, &spec, ctx.duration_secs))
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ZoomcutError::export(format!("failed to start decoder: {e}")))?;

        let mut encoder = Command::new("ffmpeg")
            .args(encoder_args(&ctx.source_path, &ctx.output_path, &spec, mux_audio))
            .stdin(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                let _ = decoder.kill();
                let _ = decoder.wait();
                ZoomcutError::export(format!("failed to start encoder: {e}"))
            })?;

        let mut decoder_out = decoder
            .stdout
            .take()
            .ok_or_else(|| ZoomcutError::export("failed to capture decoder stdout"))?;
        let mut encoder_in = encoder
            .stdin
            .take()
            .ok_or_else(|| ZoomcutError::export("failed to capture encoder stdin"))?;

        let mut raw = vec![0u8; frame_bytes];
        let mut frames_written = 0u64;

        for (index, time_secs) in grid.iter() {
            if ctx.cancel.is_cancelled() {
                drop(encoder_in);
                abort(&mut decoder, &mut encoder, &ctx.output_path);
                return Err(ZoomcutError::Cancelled);
            }

            match decoder_out.read_exact(&mut raw) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    // Source ran out slightly before the grid; the
                    // frames written so far cover the real footage.
                    tracing::debug!(index, "decoder stream ended early");
                    break;
                }
                Err(e) => {
                    drop(encoder_in);
                    abort(&mut decoder, &mut encoder, &ctx.output_path);
                    return Err(ZoomcutError::export(format!("decoder read failed: {e}")));
                }
            }

            let frame = RgbaImage::from_raw(spec.width, spec.height, std::mem::replace(&mut raw, vec![0u8; frame_bytes]))
                .ok_or_else(|| ZoomcutError::export("frame buffer size mismatch"))?;
            let composed = compose_frame(&frame, time_secs, &ctx.zooms, &overlays)?;

            if let Err(e) = encoder_in.write_all(composed.as_raw()) {
                drop(encoder_in);
                abort(&mut decoder, &mut encoder, &ctx.output_path);
                return Err(ZoomcutError::export(format!("encoder write failed: {e}")));
            }

            frames_written += 1;
            let percent = 5 + (index * 85 / total_frames) as u8;
            ctx.reporter.report(
                ExportStage::Processing,
                percent,
                format!("Processing frame {}/{total_frames}", index + 1),
            );

            if index % YIELD_EVERY_FRAMES == 0 {
                tokio::task::yield_now().await;
            }
        }

        drop(encoder_in);
        let _ = decoder.wait();

        ctx.reporter
            .report(ExportStage::Encoding, 92, "Finalizing encode");

        let encoder_output = encoder
            .wait_with_output()
            .map_err(|e| ZoomcutError::export(format!("failed to wait on encoder: {e}")))?;

        if ctx.cancel.is_cancelled() {
            if ctx.output_path.exists() {
                let _ = std::fs::remove_file(&ctx.output_path);
            }
            return Err(ZoomcutError::Cancelled);
        }

        if !encoder_output.status.success() {
            if ctx.output_path.exists() {
                let _ = std::fs::remove_file(&ctx.output_path);
            }
            return Err(ZoomcutError::export(format!(
                "encoder exited with {}: {}",
                encoder_output.status,
                String::from_utf8_lossy(&encoder_output.stderr).trim()
            )));
        }

        tracing::info!(frames_written, "Frame stream finished");
        Ok(Some(ctx.output_path.clone()))
    }
}
