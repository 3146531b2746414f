//! ZoomCut Export
//!
//! Renders a session (source video + zoom effects + text overlays) to a
//! final MP4. Encoding goes through an ordered list of
//! [`EncodeStrategy`] capability providers: the first strategy whose
//! probe succeeds gets the job, and a failed attempt falls through to
//! the next. Cancellation is cooperative — a [`CancelToken`] checked at
//! every frame boundary — and never leaves a partial output file
//! behind.

pub mod pipeline;
pub mod probe;
pub mod progress;
pub mod source;
pub mod stills;
pub mod strategy;
pub mod stream;

pub use pipeline::*;
pub use progress::*;
pub use strategy::*;
