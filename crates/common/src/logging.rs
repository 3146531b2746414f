//! Logging and tracing initialization.

use std::fs::File;
use std::sync::Mutex;

use crate::config::LoggingConfig;

/// Initialize the tracing subscriber with the given configuration.
///
/// With `file` set, output goes to that path (created or truncated at
/// startup, ANSI disabled). An unopenable log file falls back to the
/// console sink with a note on stderr rather than failing startup.
pub fn init_logging(config: &LoggingConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let file_sink = config.file.as_ref().and_then(|path| match File::create(path) {
        Ok(file) => Some(Mutex::new(file)),
        Err(e) => {
            eprintln!("warning: could not open log file {}: {e}", path.display());
            None
        }
    });

    match (config.json, file_sink) {
        (true, Some(sink)) => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(env_filter)
                .json()
                .with_writer(sink)
                .finish();
            tracing::subscriber::set_global_default(subscriber).ok();
        }
        (true, None) => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(env_filter)
                .json()
                .finish();
            tracing::subscriber::set_global_default(subscriber).ok();
        }
        (false, Some(sink)) => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(env_filter)
                .with_target(true)
                .with_ansi(false)
                .with_writer(sink)
                .finish();
            tracing::subscriber::set_global_default(subscriber).ok();
        }
        (false, None) => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(env_filter)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber).ok();
        }
    }
}

/// Initialize logging with defaults (useful for tests and quick scripts).
pub fn init_default_logging() {
    init_logging(&LoggingConfig::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_sink_creates_the_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zoomcut.log");
        init_logging(&LoggingConfig {
            level: "info".to_string(),
            json: false,
            file: Some(path.clone()),
        });
        assert!(path.exists());
    }

    #[test]
    fn test_unopenable_log_file_does_not_panic() {
        init_logging(&LoggingConfig {
            level: "info".to_string(),
            json: false,
            file: Some("/nonexistent-dir/zoomcut.log".into()),
        });
    }
}
