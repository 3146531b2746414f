//! Export state machine, progress reporting, and cancellation.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use zoomcut_common::error::{ZoomcutError, ZoomcutResult};

/// Stages of an export. Terminal stages are `Complete`, `Error`, and
/// `Cancelled`; the latter two are reachable from any non-terminal
/// stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Idle,
    Initializing,
    Capturing,
    Processing,
    Encoding,
    Complete,
    Error,
    Cancelled,
}

impl ExportStage {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExportStage::Complete | ExportStage::Error | ExportStage::Cancelled
        )
    }

    /// Human-readable label for progress lines.
    pub fn label(&self) -> &'static str {
        match self {
            ExportStage::Idle => "idle",
            ExportStage::Initializing => "initializing",
            ExportStage::Capturing => "capturing",
            ExportStage::Processing => "processing",
            ExportStage::Encoding => "encoding",
            ExportStage::Complete => "complete",
            ExportStage::Error => "error",
            ExportStage::Cancelled => "cancelled",
        }
    }
}

/// One progress report.
#[derive(Debug, Clone)]
pub struct ExportProgress {
    pub stage: ExportStage,

    /// Overall progress [0, 100]. Non-decreasing for the lifetime of a
    /// run, except when the run ends in `Error` or `Cancelled`.
    pub percent: u8,

    pub message: String,
}

/// Progress callback for export runs.
pub type ProgressCallback = Box<dyn Fn(ExportProgress) + Send + Sync>;

/// Cooperative cancellation flag, cheap to clone across tasks.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Error out of the current operation if cancellation was requested.
    pub fn check(&self) -> ZoomcutResult<()> {
        if self.is_cancelled() {
            Err(ZoomcutError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Delivers progress reports and enforces the monotonic-percent
/// invariant: a stale lower percentage from a strategy never moves the
/// bar backwards.
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    last_percent: AtomicU8,
}

impl ProgressReporter {
    pub fn new(callback: Option<ProgressCallback>) -> Self {
        Self {
            callback,
            last_percent: AtomicU8::new(0),
        }
    }

    pub fn report(&self, stage: ExportStage, percent: u8, message: impl Into<String>) {
        let percent = percent.min(100);
        let percent = if stage.is_terminal() && stage != ExportStage::Complete {
            // Error/Cancelled freeze the bar where it was.
            self.last_percent.load(Ordering::SeqCst)
        } else {
            self.last_percent.fetch_max(percent, Ordering::SeqCst).max(percent)
        };
        if let Some(cb) = &self.callback {
            cb(ExportProgress {
                stage,
                percent,
                message: message.into(),
            });
        }
    }

    pub fn last_percent(&self) -> u8 {
        self.last_percent.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_stage_terminality() {
        assert!(!ExportStage::Idle.is_terminal());
        assert!(!ExportStage::Encoding.is_terminal());
        assert!(ExportStage::Complete.is_terminal());
        assert!(ExportStage::Error.is_terminal());
        assert!(ExportStage::Cancelled.is_terminal());
    }

    #[test]
    fn test_cancel_token_shared_across_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(token.check().is_ok());
        clone.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(ZoomcutError::Cancelled)));
    }

    #[test]
    fn test_percent_is_monotonic() {
        let seen: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let reporter = ProgressReporter::new(Some(Box::new(move |p| {
            sink.lock().unwrap().push(p.percent);
        })));

        reporter.report(ExportStage::Capturing, 10, "a");
        reporter.report(ExportStage::Capturing, 40, "b");
        // A strategy restart reporting a lower value must not regress.
        reporter.report(ExportStage::Processing, 5, "c");
        reporter.report(ExportStage::Encoding, 90, "d");

        assert_eq!(*seen.lock().unwrap(), vec![10, 40, 40, 90]);
    }

    #[test]
    fn test_cancelled_freezes_percent() {
        let seen: Arc<Mutex<Vec<(ExportStage, u8)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let reporter = ProgressReporter::new(Some(Box::new(move |p| {
            sink.lock().unwrap().push((p.stage, p.percent));
        })));

        reporter.report(ExportStage::Capturing, 33, "a");
        reporter.report(ExportStage::Cancelled, 0, "stop");

        let seen = seen.lock().unwrap();
        assert_eq!(seen[1], (ExportStage::Cancelled, 33));
    }

    #[test]
    fn test_percent_clamped_to_100() {
        let reporter = ProgressReporter::new(None);
        reporter.report(ExportStage::Encoding, 250, "overflow");
        assert_eq!(reporter.last_percent(), 100);
    }
}
