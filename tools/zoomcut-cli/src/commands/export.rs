//! Export a video with the session's effects applied.

use std::io::Write;
use std::path::PathBuf;

use zoomcut_common::config::{AppConfig, ExportDefaults};
use zoomcut_export::{
    export_video, timestamped_output, CancelToken, ExportProgress, ExportSettings, Quality,
};
use zoomcut_timeline::Session;

/// Resolve export settings: flags win, then config defaults.
///
/// `--no-audio` only forces audio off; when it is absent the config
/// default applies.
fn effective_settings(
    defaults: &ExportDefaults,
    quality: Option<&str>,
    fps: Option<u32>,
    no_audio: bool,
) -> anyhow::Result<ExportSettings> {
    let quality: Quality = quality
        .unwrap_or(&defaults.quality)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid quality: {e}"))?;
    Ok(ExportSettings {
        quality,
        fps: fps.unwrap_or(defaults.fps),
        include_audio: !no_audio && defaults.include_audio,
    })
}

#[allow(clippy::too_many_arguments)]
pub async fn run(
    video: PathBuf,
    session_path: Option<PathBuf>,
    quality: Option<String>,
    fps: Option<u32>,
    no_audio: bool,
    output: Option<PathBuf>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    println!("Exporting: {}", video.display());

    let session = match &session_path {
        Some(path) => {
            Session::load(path).map_err(|e| anyhow::anyhow!("Failed to load session: {e}"))?
        }
        None => Session::default(),
    };

    let duration_secs = zoomcut_export::probe::probe_duration_secs(&video)
        .or(if session.duration_secs > 0.0 {
            Some(session.duration_secs)
        } else {
            None
        })
        .ok_or_else(|| anyhow::anyhow!("Could not determine video duration"))?;

    let settings = effective_settings(&config.export, quality.as_deref(), fps, no_audio)?;

    // Without -o the file lands in the configured exports directory.
    let output = match output {
        Some(path) => path,
        None => {
            std::fs::create_dir_all(&config.exports_dir)?;
            timestamped_output(&video, &config.exports_dir, chrono::Local::now())
        }
    };

    // The export lock owns the effect collections for the whole run;
    // the guard releases it on every exit path.
    let mut controller = session
        .into_controller(duration_secs)
        .map_err(|e| anyhow::anyhow!("Invalid session: {e}"))?;
    let guard = controller
        .begin_export()
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    let zooms = guard.sorted_zooms();
    let overlays = guard.overlays();

    println!("  Duration: {duration_secs:.2}s at {} fps", settings.fps);
    println!("  Quality: {} ({} effects)", settings.quality.label(), zooms.len());

    let cancel = CancelToken::new();
    let ctrlc_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nCancelling export...");
            ctrlc_token.cancel();
        }
    });

    let progress = Box::new(|p: ExportProgress| {
        print!("\r  [{:>3}%] {:<40}", p.percent, p.message);
        let _ = std::io::stdout().flush();
    });

    match export_video(
        &video,
        Some(output),
        &zooms,
        &overlays,
        duration_secs,
        &settings,
        Some(progress),
        cancel,
    )
    .await
    {
        Ok(result) => {
            println!("\nExport complete: {}", result.video.display());
            println!("Metadata: {}", result.metadata.display());
            Ok(())
        }
        Err(e) if e.is_cancelled() => {
            println!("\nExport cancelled; no file was written.");
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!("Export failed: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config_defaults() {
        let defaults = ExportDefaults {
            fps: 24,
            quality: "720p".to_string(),
            include_audio: true,
        };

        let s = effective_settings(&defaults, Some("1440p"), Some(60), false).unwrap();
        assert_eq!(s.quality, Quality::P1440);
        assert_eq!(s.fps, 60);
        assert!(s.include_audio);

        let s = effective_settings(&defaults, None, None, true).unwrap();
        assert_eq!(s.quality, Quality::P720);
        assert_eq!(s.fps, 24);
        assert!(!s.include_audio);
    }

    #[test]
    fn test_bad_config_quality_is_reported() {
        let defaults = ExportDefaults {
            fps: 30,
            quality: "potato".to_string(),
            include_audio: true,
        };
        assert!(effective_settings(&defaults, None, None, false).is_err());
    }
}
