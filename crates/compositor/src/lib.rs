//! ZoomCut Compositor
//!
//! Turns a raw video frame plus the session's effect state at one point
//! in time into the frame the viewer actually sees. Two consumers share
//! the same math:
//!
//! - the live preview, which only needs a transform description
//!   ([`preview`]), and
//! - the export pipeline, which needs real pixels ([`frame`]).
//!
//! Both call the same `interpolate_zoom`, which is what keeps preview
//! and export in agreement.

pub mod frame;
pub mod preview;
pub mod raster;
pub mod text;

pub use frame::*;
pub use preview::*;
pub use raster::RasterFrame;
