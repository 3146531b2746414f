//! ZoomCut Common Utilities
//!
//! Shared infrastructure for all ZoomCut crates:
//! - Error types and result aliases
//! - Playback clock and frame-grid timing utilities
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
