//! Zoom effect records and the canonical interpolation algorithm.
//!
//! Focal coordinates are percentages (`0.0`–`100.0`) of frame
//! width/height so effects survive resolution changes between preview
//! and export.

use serde::{Deserialize, Serialize};

use crate::clicks::ClickData;

/// Minimum magnification (no zoom).
pub const SCALE_MIN: f64 = 1.0;

/// Maximum magnification.
pub const SCALE_MAX: f64 = 5.0;

/// Length of the eased transition at each end of a smooth effect, in
/// seconds. Capped at half the effect's own duration so the midpoint of
/// every effect always reaches the full target state.
pub const TRANSITION_WINDOW_SECS: f64 = 0.4;

/// How a zoom effect enters and leaves its interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    /// Eased in/out at the interval boundaries.
    #[default]
    Smooth,
    /// Hard cut at both boundaries.
    Instant,
}

/// Where a zoom effect came from. Informational only — interpolation
/// treats both kinds identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EffectSource {
    #[default]
    Manual,
    Autozoom,
}

/// A time-bounded instruction to magnify the frame around a focal point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoomEffect {
    /// Unique identifier, immutable once created.
    pub id: String,

    /// Interval start in seconds. Invariant: `start_secs < end_secs`.
    pub start_secs: f64,

    /// Interval end in seconds.
    pub end_secs: f64,

    /// Focal point X as a percentage (0–100) of frame width.
    pub x: f64,

    /// Focal point Y as a percentage (0–100) of frame height.
    pub y: f64,

    /// Magnification factor in `[1.0, 5.0]`.
    pub scale: f64,

    /// Boundary behavior.
    #[serde(default)]
    pub transition: Transition,

    /// Provenance of the effect.
    #[serde(default)]
    pub source: EffectSource,

    /// Back-reference to the click record this effect was derived from.
    /// Audit/debug only; never mutated after creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<ClickData>,
}

impl ZoomEffect {
    /// Interval length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }

    /// Whether `time` falls inside this effect's interval (both ends
    /// inclusive).
    pub fn contains(&self, time_secs: f64) -> bool {
        time_secs >= self.start_secs && time_secs <= self.end_secs
    }

    /// Effective transition window for this effect: the configured
    /// constant, but never more than half the interval.
    pub fn transition_window_secs(&self) -> f64 {
        TRANSITION_WINDOW_SECS.min(self.duration_secs() / 2.0)
    }

    /// The raw target state, ignoring transitions.
    pub fn target(&self) -> EffectiveZoom {
        EffectiveZoom {
            x: self.x,
            y: self.y,
            scale: self.scale,
        }
    }
}

/// The zoom state in force at a single point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectiveZoom {
    /// Focal point X, percentage of frame width.
    pub x: f64,
    /// Focal point Y, percentage of frame height.
    pub y: f64,
    /// Magnification factor.
    pub scale: f64,
}

impl EffectiveZoom {
    /// Centered, unzoomed.
    pub const NEUTRAL: EffectiveZoom = EffectiveZoom {
        x: 50.0,
        y: 50.0,
        scale: 1.0,
    };

    /// Whether this state renders the frame unchanged.
    pub fn is_neutral(&self) -> bool {
        self.scale <= 1.0 && self.x == 50.0 && self.y == 50.0
    }

    /// Linearly interpolate between two states.
    pub fn lerp(a: &EffectiveZoom, b: &EffectiveZoom, t: f64) -> EffectiveZoom {
        let t = t.clamp(0.0, 1.0);
        EffectiveZoom {
            x: a.x + (b.x - a.x) * t,
            y: a.y + (b.y - a.y) * t,
            scale: a.scale + (b.scale - a.scale) * t,
        }
    }
}

impl Default for EffectiveZoom {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Sort effects by start time (stable). Interpolation and export both
/// require this ordering; ties keep insertion order.
pub fn sort_effects(effects: &[ZoomEffect]) -> Vec<ZoomEffect> {
    let mut sorted = effects.to_vec();
    sorted.sort_by(|a, b| a.start_secs.total_cmp(&b.start_secs));
    sorted
}

/// Symmetric cubic ease-in-out: zero velocity at both ends.
pub fn ease_in_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// The canonical interpolation algorithm. Pure and deterministic; the
/// live preview and the export frame loop call this with the same
/// arguments and must get the same answer.
///
/// `sorted` must be ordered by `start_secs` (see [`sort_effects`]).
/// When intervals overlap, the first match in sorted order wins — kept
/// intentionally, matching long-standing behavior.
pub fn interpolate_zoom(time_secs: f64, sorted: &[ZoomEffect]) -> EffectiveZoom {
    let (Some(first), Some(last)) = (sorted.first(), sorted.last()) else {
        return EffectiveZoom::NEUTRAL;
    };

    if time_secs < first.start_secs || time_secs > last.end_secs {
        return EffectiveZoom::NEUTRAL;
    }

    for effect in sorted {
        if !effect.contains(time_secs) {
            continue;
        }

        let target = effect.target();
        if effect.transition == Transition::Instant {
            return target;
        }

        let window = effect.transition_window_secs();
        if window <= 0.0 {
            return target;
        }

        // Ease in across the leading window.
        if time_secs < effect.start_secs + window {
            let t = (time_secs - effect.start_secs) / window;
            return EffectiveZoom::lerp(&EffectiveZoom::NEUTRAL, &target, ease_in_out_cubic(t));
        }

        // Ease out across the trailing window.
        if time_secs > effect.end_secs - window {
            let t = (effect.end_secs - time_secs) / window;
            return EffectiveZoom::lerp(&EffectiveZoom::NEUTRAL, &target, ease_in_out_cubic(t));
        }

        // Fully inside the interval: hold the target state.
        return target;
    }

    // Between two effects (inside the overall span but in no interval).
    EffectiveZoom::NEUTRAL
}
