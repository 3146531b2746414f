//! The encode-strategy seam.

use std::path::PathBuf;

use async_trait::async_trait;
use zoomcut_common::error::ZoomcutResult;
use zoomcut_effect_model::{TextOverlay, ZoomEffect};

use crate::pipeline::OutputSpec;
use crate::progress::{CancelToken, ProgressReporter};

/// Everything a strategy needs to run one export attempt.
pub struct ExportContext {
    /// Source video file.
    pub source_path: PathBuf,

    /// Where the finished file must land.
    pub output_path: PathBuf,

    /// Start-time-sorted zoom effects.
    pub zooms: Vec<ZoomEffect>,

    pub overlays: Vec<TextOverlay>,

    /// Export duration in seconds.
    pub duration_secs: f64,

    /// Resolved output parameters (resolution, fps, bitrates, audio).
    pub spec: OutputSpec,

    pub reporter: ProgressReporter,

    pub cancel: CancelToken,
}

/// An ordered capability provider for encoding.
///
/// Strategies are tried in list order. `probe` failing, or `try_export`
/// returning `Ok(None)` or a non-cancellation error, means "try the
/// next one"; only [`ZoomcutError::Cancelled`] aborts the whole run.
/// Adding an encoder is appending to the list, nothing else changes.
///
/// [`ZoomcutError::Cancelled`]: zoomcut_common::error::ZoomcutError::Cancelled
#[async_trait]
pub trait EncodeStrategy: Send + Sync {
    /// Short identifier for logs and progress messages.
    fn name(&self) -> &'static str;

    /// Whether this strategy can run on this system at all.
    fn probe(&self) -> bool;

    /// Attempt the export. `Ok(Some(path))` is the finished file.
    async fn try_export(&self, ctx: &mut ExportContext) -> ZoomcutResult<Option<PathBuf>>;
}
