//! ZoomCut Timeline
//!
//! The [`TimelineController`] is the exclusive owner of a session's
//! mutable state: the zoom effect and text overlay collections, the
//! playhead, the selection, and the export lock. Everything else in the
//! system reads snapshots and mutates through the controller's narrow
//! operations — nothing replaces the collections wholesale.

pub mod controller;
pub mod drag;
pub mod session;

pub use controller::*;
pub use drag::*;
pub use session::*;
