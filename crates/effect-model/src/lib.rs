//! ZoomCut Effect Model
//!
//! Defines the core data contracts for a ZoomCut session:
//! - **Zoom effects:** Time-bounded instructions to magnify the frame
//!   around a focal point
//! - **Text overlays:** Time-bounded styled text at a frame position
//! - **Interpolation:** The single canonical function mapping a playback
//!   time plus an effect list to an effective zoom transform
//! - **Click import:** Conversion of recorded click streams into autozoom
//!   effects
//!
//! This crate is pure data and pure computation — no I/O, no platform
//! dependencies. Preview and export both consume the same interpolation
//! function, which is what guarantees they render identically.

pub mod clicks;
pub mod overlay;
pub mod zoom;

pub use clicks::*;
pub use overlay::*;
pub use zoom::*;
