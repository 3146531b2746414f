//! Export orchestration: settings, strategy selection, and the
//! metadata sidecar.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use zoomcut_common::error::{ZoomcutError, ZoomcutResult};
use zoomcut_effect_model::{sort_effects, TextOverlay, ZoomEffect};

use crate::progress::{CancelToken, ExportStage, ProgressCallback, ProgressReporter};
use crate::stills::PngSequenceStrategy;
use crate::strategy::{EncodeStrategy, ExportContext};
use crate::stream::FfmpegStreamStrategy;

/// Output resolution classes with their fixed bitrate pairings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Quality {
    #[serde(rename = "720p")]
    P720,
    #[default]
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "1440p")]
    P1440,
    #[serde(rename = "2160p")]
    P2160,
}

impl Quality {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Quality::P720 => (1280, 720),
            Quality::P1080 => (1920, 1080),
            Quality::P1440 => (2560, 1440),
            Quality::P2160 => (3840, 2160),
        }
    }

    pub fn video_bitrate_kbps(&self) -> u32 {
        match self {
            Quality::P720 => 4000,
            Quality::P1080 => 8000,
            Quality::P1440 => 12000,
            Quality::P2160 => 20000,
        }
    }

    pub fn audio_bitrate_kbps(&self) -> u32 {
        match self {
            Quality::P720 => 128,
            Quality::P1080 => 192,
            Quality::P1440 => 256,
            Quality::P2160 => 320,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Quality::P720 => "720p",
            Quality::P1080 => "1080p",
            Quality::P1440 => "1440p",
            Quality::P2160 => "2160p",
        }
    }
}

impl std::str::FromStr for Quality {
    type Err = ZoomcutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "720" | "720p" => Ok(Quality::P720),
            "1080" | "1080p" => Ok(Quality::P1080),
            "1440" | "1440p" => Ok(Quality::P1440),
            "2160" | "2160p" | "4k" => Ok(Quality::P2160),
            other => Err(ZoomcutError::export(format!(
                "unknown quality '{other}' (expected 720p, 1080p, 1440p, or 2160p)"
            ))),
        }
    }
}

/// User-facing export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSettings {
    #[serde(default)]
    pub quality: Quality,

    #[serde(default = "default_fps")]
    pub fps: u32,

    #[serde(default = "default_include_audio")]
    pub include_audio: bool,
}

fn default_fps() -> u32 {
    30
}

fn default_include_audio() -> bool {
    true
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            quality: Quality::default(),
            fps: default_fps(),
            include_audio: default_include_audio(),
        }
    }
}

/// Settings resolved to concrete encode parameters.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OutputSpec {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub video_bitrate_kbps: u32,
    pub audio_bitrate_kbps: u32,
    pub include_audio: bool,
}

impl OutputSpec {
    pub fn from_settings(settings: &ExportSettings) -> OutputSpec {
        let (width, height) = settings.quality.dimensions();
        OutputSpec {
            width,
            height,
            fps: settings.fps.max(1),
            video_bitrate_kbps: settings.quality.video_bitrate_kbps(),
            audio_bitrate_kbps: settings.quality.audio_bitrate_kbps(),
            include_audio: settings.include_audio,
        }
    }
}

/// `<stem>_zoomcut_<timestamp>.mp4` next to the given directory.
pub fn timestamped_output(source: &Path, dir: &Path, now: DateTime<Local>) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "export".to_string());
    dir.join(format!(
        "{stem}_zoomcut_{}.mp4",
        now.format("%Y-%m-%dT%H-%M-%S")
    ))
}

/// The finished export: video plus its metadata sidecar.
#[derive(Debug, Clone)]
pub struct ExportOutput {
    pub video: PathBuf,
    pub metadata: PathBuf,
}

/// The built-in strategy order: raw-frame streaming first, still-image
/// sequence as the fallback.
pub fn default_strategies() -> Vec<Box<dyn EncodeStrategy>> {
    vec![
        Box::new(FfmpegStreamStrategy),
        Box::new(PngSequenceStrategy),
    ]
}

/// Export a session to a video file.
///
/// The caller must hold the timeline export lock for the duration of
/// this call; its guard releases the lock on every exit path.
#[allow(clippy::too_many_arguments)]
pub async fn export_video(
    source_path: &Path,
    output_path: Option<PathBuf>,
    zooms: &[ZoomEffect],
    overlays: &[TextOverlay],
    duration_secs: f64,
    settings: &ExportSettings,
    progress: Option<ProgressCallback>,
    cancel: CancelToken,
) -> ZoomcutResult<ExportOutput> {
    export_with_strategies(
        source_path,
        output_path,
        zooms,
        overlays,
        duration_secs,
        settings,
        progress,
        cancel,
        &default_strategies(),
    )
    .await
}

/// Like [`export_video`] but with an explicit strategy list.
#[allow(clippy::too_many_arguments)]
pub async fn export_with_strategies(
    source_path: &Path,
    output_path: Option<PathBuf>,
    zooms: &[ZoomEffect],
    overlays: &[TextOverlay],
    duration_secs: f64,
    settings: &ExportSettings,
    progress: Option<ProgressCallback>,
    cancel: CancelToken,
    strategies: &[Box<dyn EncodeStrategy>],
) -> ZoomcutResult<ExportOutput> {
    let started = std::time::Instant::now();

    if !source_path.exists() {
        return Err(ZoomcutError::FileNotFound {
            path: source_path.to_path_buf(),
        });
    }
    if duration_secs <= 0.0 {
        return Err(ZoomcutError::export("export duration resolved to zero seconds"));
    }

    let output_path = match output_path {
        Some(path) => path,
        None => {
            let dir = source_path.parent().unwrap_or(Path::new("."));
            timestamped_output(source_path, dir, Local::now())
        }
    };
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    tracing::info!(
        source = %source_path.display(),
        output = %output_path.display(),
        duration_secs,
        fps = settings.fps,
        quality = settings.quality.label(),
        "Starting export"
    );

    let reporter = ProgressReporter::new(progress);
    reporter.report(ExportStage::Initializing, 0, "Preparing export");

    let mut ctx = ExportContext {
        source_path: source_path.to_path_buf(),
        output_path: output_path.clone(),
        zooms: sort_effects(zooms),
        overlays: overlays.to_vec(),
        duration_secs,
        spec: OutputSpec::from_settings(settings),
        reporter,
        cancel,
    };

    for strategy in strategies {
        if ctx.cancel.is_cancelled() {
            ctx.reporter
                .report(ExportStage::Cancelled, 0, "Export cancelled");
            return Err(ZoomcutError::Cancelled);
        }

        if !strategy.probe() {
            // Unavailable providers are skipped silently; only total
            // exhaustion is an error.
            tracing::debug!(strategy = strategy.name(), "strategy probe failed, skipping");
            continue;
        }

        tracing::info!(strategy = strategy.name(), "Trying encode strategy");
        match strategy.try_export(&mut ctx).await {
            Ok(Some(video)) => {
                let metadata = write_metadata_sidecar(&video, &ctx, settings)?;
                ctx.reporter
                    .report(ExportStage::Complete, 100, "Export complete");
                tracing::info!(
                    strategy = strategy.name(),
                    video = %video.display(),
                    elapsed_secs = started.elapsed().as_secs_f64(),
                    "Export finished"
                );
                return Ok(ExportOutput { video, metadata });
            }
            Ok(None) => {
                tracing::warn!(strategy = strategy.name(), "strategy declined the job");
            }
            Err(ZoomcutError::Cancelled) => {
                ctx.reporter
                    .report(ExportStage::Cancelled, 0, "Export cancelled");
                tracing::info!(strategy = strategy.name(), "Export cancelled");
                return Err(ZoomcutError::Cancelled);
            }
            Err(e) => {
                tracing::warn!(
                    strategy = strategy.name(),
                    error = %e,
                    "strategy failed, falling through"
                );
            }
        }
    }

    ctx.reporter
        .report(ExportStage::Error, 0, "No encode strategy available");
    Err(ZoomcutError::capability(
        "no encode strategy could complete the export (is ffmpeg installed?)",
    ))
}

/// Write the companion metadata JSON describing what was applied.
fn write_metadata_sidecar(
    video: &Path,
    ctx: &ExportContext,
    settings: &ExportSettings,
) -> ZoomcutResult<PathBuf> {
    let metadata_path = video.with_extension("metadata.json");
    let metadata = serde_json::json!({
        "source": ctx.source_path,
        "output": video,
        "exported_at": Local::now().to_rfc3339(),
        "settings": {
            "quality": settings.quality.label(),
            "fps": ctx.spec.fps,
            "width": ctx.spec.width,
            "height": ctx.spec.height,
            "include_audio": ctx.spec.include_audio,
        },
        "duration_secs": ctx.duration_secs,
        "zooms": ctx.zooms,
        "overlays": ctx.overlays,
    });
    std::fs::write(&metadata_path, serde_json::to_string_pretty(&metadata)?)?;
    tracing::info!(path = %metadata_path.display(), "Wrote export metadata");
    Ok(metadata_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    struct UnavailableStrategy;

    #[async_trait]
    impl EncodeStrategy for UnavailableStrategy {
        fn name(&self) -> &'static str {
            "unavailable"
        }
        fn probe(&self) -> bool {
            false
        }
        async fn try_export(&self, _ctx: &mut ExportContext) -> ZoomcutResult<Option<PathBuf>> {
            panic!("must never run: probe fails");
        }
    }

    struct FailingStrategy;

    #[async_trait]
    impl EncodeStrategy for FailingStrategy {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn probe(&self) -> bool {
            true
        }
        async fn try_export(&self, _ctx: &mut ExportContext) -> ZoomcutResult<Option<PathBuf>> {
            Err(ZoomcutError::export("encoder exploded"))
        }
    }

    struct SucceedingStrategy {
        ran: Arc<AtomicBool>,
    }

    #[async_trait]
    impl EncodeStrategy for SucceedingStrategy {
        fn name(&self) -> &'static str {
            "succeeding"
        }
        fn probe(&self) -> bool {
            true
        }
        async fn try_export(&self, ctx: &mut ExportContext) -> ZoomcutResult<Option<PathBuf>> {
            ctx.cancel.check()?;
            ctx.reporter
                .report(ExportStage::Encoding, 50, "mock encoding");
            std::fs::write(&ctx.output_path, b"mock video")?;
            self.ran.store(true, Ordering::SeqCst);
            Ok(Some(ctx.output_path.clone()))
        }
    }

    /// Checks cancellation before emitting any frame, like the real
    /// strategies do.
    struct CancelAwareStrategy;

    #[async_trait]
    impl EncodeStrategy for CancelAwareStrategy {
        fn name(&self) -> &'static str {
            "cancel-aware"
        }
        fn probe(&self) -> bool {
            true
        }
        async fn try_export(&self, ctx: &mut ExportContext) -> ZoomcutResult<Option<PathBuf>> {
            ctx.cancel.check()?;
            std::fs::write(&ctx.output_path, b"should not happen")?;
            Ok(Some(ctx.output_path.clone()))
        }
    }

    fn temp_source() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("clip.mp4");
        std::fs::write(&source, b"fake media").unwrap();
        (dir, source)
    }

    #[tokio::test]
    async fn test_probe_failure_falls_through_to_next_strategy() {
        let (dir, source) = temp_source();
        let ran = Arc::new(AtomicBool::new(false));
        let strategies: Vec<Box<dyn EncodeStrategy>> = vec![
            Box::new(UnavailableStrategy),
            Box::new(FailingStrategy),
            Box::new(SucceedingStrategy { ran: ran.clone() }),
        ];

        let stages: Arc<Mutex<Vec<ExportStage>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = stages.clone();
        let out = export_with_strategies(
            &source,
            Some(dir.path().join("out.mp4")),
            &[],
            &[],
            2.0,
            &ExportSettings::default(),
            Some(Box::new(move |p| sink.lock().unwrap().push(p.stage))),
            CancelToken::new(),
            &strategies,
        )
        .await
        .unwrap();

        assert!(ran.load(Ordering::SeqCst));
        assert!(out.video.exists());
        assert!(out.metadata.exists());
        assert_eq!(
            *stages.lock().unwrap().last().unwrap(),
            ExportStage::Complete
        );
    }

    #[tokio::test]
    async fn test_cancel_before_first_frame_leaves_no_file() {
        let (dir, source) = temp_source();
        let output = dir.path().join("out.mp4");
        let cancel = CancelToken::new();
        cancel.cancel();

        let strategies: Vec<Box<dyn EncodeStrategy>> = vec![Box::new(CancelAwareStrategy)];
        let err = export_with_strategies(
            &source,
            Some(output.clone()),
            &[],
            &[],
            2.0,
            &ExportSettings::default(),
            None,
            cancel,
            &strategies,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ZoomcutError::Cancelled));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_exhaustion_is_a_capability_error() {
        let (dir, source) = temp_source();
        let strategies: Vec<Box<dyn EncodeStrategy>> =
            vec![Box::new(UnavailableStrategy), Box::new(FailingStrategy)];
        let err = export_with_strategies(
            &source,
            Some(dir.path().join("out.mp4")),
            &[],
            &[],
            2.0,
            &ExportSettings::default(),
            None,
            CancelToken::new(),
            &strategies,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ZoomcutError::Capability { .. }));
    }

    #[tokio::test]
    async fn test_missing_source_fails_fast() {
        let err = export_video(
            Path::new("/nonexistent/clip.mp4"),
            None,
            &[],
            &[],
            2.0,
            &ExportSettings::default(),
            None,
            CancelToken::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ZoomcutError::FileNotFound { .. }));
    }

    #[test]
    fn test_quality_table() {
        assert_eq!(Quality::P720.dimensions(), (1280, 720));
        assert_eq!(Quality::P720.video_bitrate_kbps(), 4000);
        assert_eq!(Quality::P1080.video_bitrate_kbps(), 8000);
        assert_eq!(Quality::P1440.audio_bitrate_kbps(), 256);
        assert_eq!(Quality::P2160.video_bitrate_kbps(), 20000);
    }

    #[test]
    fn test_quality_parsing() {
        assert_eq!("1080p".parse::<Quality>().unwrap(), Quality::P1080);
        assert_eq!("4K".parse::<Quality>().unwrap(), Quality::P2160);
        assert!("480p".parse::<Quality>().is_err());
    }

    #[test]
    fn test_timestamped_output_name() {
        let now = DateTime::parse_from_rfc3339("2026-03-01T14:30:05+00:00")
            .unwrap()
            .with_timezone(&Local);
        let path = timestamped_output(Path::new("/videos/demo.mp4"), Path::new("/tmp"), now);
        let name = path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("demo_zoomcut_"));
        assert!(name.ends_with(".mp4"));
    }
}
