//! Pointer-driven timeline editing: pixel→time mapping and drag clamping.

use serde::{Deserialize, Serialize};

/// Minimum effect length a drag may leave behind, in seconds.
pub const MIN_GAP_SECS: f64 = 0.1;

/// The horizontal geometry of a rendered timeline strip, used to map
/// pointer positions to session time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeAxis {
    /// Left edge of the strip in view pixels.
    pub left_px: f64,
    /// Width of the strip in view pixels.
    pub width_px: f64,
}

impl TimeAxis {
    /// Map a pointer X position to a session time, clamped into
    /// `[0, duration]`. Positions outside the strip clamp to the ends.
    pub fn time_at(&self, pointer_x: f64, duration_secs: f64) -> f64 {
        if self.width_px <= 0.0 {
            return 0.0;
        }
        let fraction = (pointer_x - self.left_px) / self.width_px;
        (fraction * duration_secs).clamp(0.0, duration_secs.max(0.0))
    }
}

/// Which part of an effect a drag grabbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    /// Shift both bounds; duration is preserved.
    Move,
    /// Move the start edge; clamped to `end - MIN_GAP_SECS`.
    ResizeStart,
    /// Move the end edge; clamped to `start + MIN_GAP_SECS`.
    ResizeEnd,
}

/// An in-flight drag on a zoom effect.
#[derive(Debug, Clone)]
pub struct DragState {
    pub effect_id: String,
    pub mode: DragMode,
    /// For `Move`: pointer time minus effect start at grab, so the
    /// effect doesn't jump to put its start under the cursor.
    pub grab_offset_secs: f64,
}

/// Apply a drag update to an interval, returning the new bounds.
///
/// `duration` bounds the whole session. Overlap with neighbouring
/// effects is allowed; only the session bounds and the minimum length
/// are enforced.
pub fn apply_drag(
    mode: DragMode,
    start: f64,
    end: f64,
    pointer_time: f64,
    grab_offset: f64,
    duration: f64,
) -> (f64, f64) {
    match mode {
        DragMode::Move => {
            let len = end - start;
            let new_start = (pointer_time - grab_offset).clamp(0.0, (duration - len).max(0.0));
            (new_start, new_start + len)
        }
        DragMode::ResizeStart => {
            // min-then-max so an effect shorter than the gap can't
            // produce an inverted clamp range.
            let new_start = pointer_time.min(end - MIN_GAP_SECS).max(0.0);
            (new_start, end)
        }
        DragMode::ResizeEnd => {
            let new_end = pointer_time.max(start + MIN_GAP_SECS).min(duration);
            (start, new_end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_axis_maps_and_clamps() {
        let axis = TimeAxis {
            left_px: 100.0,
            width_px: 500.0,
        };
        assert_eq!(axis.time_at(100.0, 10.0), 0.0);
        assert_eq!(axis.time_at(600.0, 10.0), 10.0);
        assert!((axis.time_at(350.0, 10.0) - 5.0).abs() < 1e-12);
        // Outside the strip clamps, never extrapolates.
        assert_eq!(axis.time_at(0.0, 10.0), 0.0);
        assert_eq!(axis.time_at(1000.0, 10.0), 10.0);
    }

    #[test]
    fn test_zero_width_axis_is_safe() {
        let axis = TimeAxis {
            left_px: 0.0,
            width_px: 0.0,
        };
        assert_eq!(axis.time_at(50.0, 10.0), 0.0);
    }

    #[test]
    fn test_move_preserves_duration_at_session_edges() {
        // 2s effect dragged past the left edge.
        let (s, e) = apply_drag(DragMode::Move, 3.0, 5.0, -4.0, 0.0, 10.0);
        assert_eq!((s, e), (0.0, 2.0));
        // And past the right edge.
        let (s, e) = apply_drag(DragMode::Move, 3.0, 5.0, 20.0, 0.0, 10.0);
        assert_eq!((s, e), (8.0, 10.0));
    }

    #[test]
    fn test_move_respects_grab_offset() {
        // Grabbed 0.5s into the effect; pointer at 6.0 puts start at 5.5.
        let (s, e) = apply_drag(DragMode::Move, 3.0, 5.0, 6.0, 0.5, 10.0);
        assert_eq!((s, e), (5.5, 7.5));
    }

    #[test]
    fn test_resize_start_cannot_cross_end() {
        let (s, e) = apply_drag(DragMode::ResizeStart, 3.0, 5.0, 4.99, 0.0, 10.0);
        assert!((s - 4.9).abs() < 1e-12);
        assert_eq!(e, 5.0);
    }

    #[test]
    fn test_resize_end_cannot_cross_start() {
        let (s, e) = apply_drag(DragMode::ResizeEnd, 3.0, 5.0, 2.0, 0.0, 10.0);
        assert_eq!(s, 3.0);
        assert!((e - 3.1).abs() < 1e-12);
    }

    #[test]
    fn test_resize_end_clamps_to_session_duration() {
        let (_, e) = apply_drag(DragMode::ResizeEnd, 3.0, 5.0, 99.0, 0.0, 10.0);
        assert_eq!(e, 10.0);
    }
}
