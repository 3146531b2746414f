//! Playback clock and frame-grid timing utilities.
//!
//! The editor keeps a single time cursor for the whole session; preview
//! rendering and export sampling both key off it. Export never advances
//! time incrementally — it samples an absolute frame grid so rounding
//! error cannot compound across thousands of frames.

use serde::{Deserialize, Serialize};

/// The session time cursor: current position, duration, and play state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackClock {
    /// Current position in seconds, always within `[0, duration]`.
    position_secs: f64,

    /// Media duration in seconds.
    duration_secs: f64,

    /// Whether interactive playback is running.
    playing: bool,
}

impl PlaybackClock {
    /// Create a clock for media of the given duration.
    pub fn new(duration_secs: f64) -> Self {
        Self {
            position_secs: 0.0,
            duration_secs: duration_secs.max(0.0),
            playing: false,
        }
    }

    /// Current position in seconds.
    pub fn position_secs(&self) -> f64 {
        self.position_secs
    }

    /// Media duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    /// Whether playback is running.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Seek to an absolute position, clamped into `[0, duration]`.
    pub fn seek(&mut self, secs: f64) {
        self.position_secs = secs.clamp(0.0, self.duration_secs);
    }

    /// Replace the duration (e.g. after media metadata loads), re-clamping
    /// the position.
    pub fn set_duration(&mut self, secs: f64) {
        self.duration_secs = secs.max(0.0);
        self.position_secs = self.position_secs.clamp(0.0, self.duration_secs);
    }

    /// Advance by an elapsed wall-clock delta while playing. Stops at the
    /// end of the media.
    pub fn tick(&mut self, delta_secs: f64) {
        if !self.playing {
            return;
        }
        self.position_secs = (self.position_secs + delta_secs).min(self.duration_secs);
        if self.position_secs >= self.duration_secs {
            self.playing = false;
        }
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Toggle play/pause, returning the new state.
    pub fn toggle(&mut self) -> bool {
        self.playing = !self.playing;
        self.playing
    }

    /// Convert an elapsed nanosecond value to seconds.
    pub fn ns_to_secs(ns: u64) -> f64 {
        ns as f64 / 1_000_000_000.0
    }

    /// Convert seconds to nanoseconds.
    pub fn secs_to_ns(secs: f64) -> u64 {
        (secs * 1_000_000_000.0) as u64
    }
}

/// A fixed-rate sampling grid over a duration.
///
/// Frame `i` is sampled at `i / fps`, not "previous time plus one frame
/// interval" — the absolute form cannot drift.
#[derive(Debug, Clone, Copy)]
pub struct FrameGrid {
    fps: u32,
    total_frames: u64,
}

impl FrameGrid {
    /// Grid covering `duration_secs` at `fps` frames per second.
    pub fn new(duration_secs: f64, fps: u32) -> Self {
        let fps = fps.max(1);
        Self {
            fps,
            total_frames: (duration_secs.max(0.0) * fps as f64).ceil() as u64,
        }
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// The sample time of frame `index`.
    pub fn time_at(&self, index: u64) -> f64 {
        index as f64 / self.fps as f64
    }

    /// Iterate `(index, time_secs)` across the whole grid.
    pub fn iter(&self) -> impl Iterator<Item = (u64, f64)> + '_ {
        (0..self.total_frames).map(move |i| (i, self.time_at(i)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seek_clamps_to_duration() {
        let mut clock = PlaybackClock::new(10.0);
        clock.seek(25.0);
        assert_eq!(clock.position_secs(), 10.0);
        clock.seek(-5.0);
        assert_eq!(clock.position_secs(), 0.0);
    }

    #[test]
    fn test_tick_stops_at_end() {
        let mut clock = PlaybackClock::new(1.0);
        clock.play();
        clock.tick(0.6);
        assert!(clock.is_playing());
        clock.tick(0.6);
        assert_eq!(clock.position_secs(), 1.0);
        assert!(!clock.is_playing());
    }

    #[test]
    fn test_tick_ignored_while_paused() {
        let mut clock = PlaybackClock::new(10.0);
        clock.tick(1.0);
        assert_eq!(clock.position_secs(), 0.0);
    }

    #[test]
    fn test_frame_grid_absolute_times() {
        let grid = FrameGrid::new(1.0, 30);
        assert_eq!(grid.total_frames(), 30);
        assert!((grid.time_at(15) - 0.5).abs() < 1e-12);
        // No drift: frame 29 is exactly 29/30, not 29 accumulated steps.
        assert!((grid.time_at(29) - 29.0 / 30.0).abs() < 1e-12);
    }

    #[test]
    fn test_frame_grid_rounds_partial_frame_up() {
        let grid = FrameGrid::new(1.01, 30);
        assert_eq!(grid.total_frames(), 31);
    }

    #[test]
    fn test_ns_conversions() {
        assert!((PlaybackClock::ns_to_secs(1_500_000_000) - 1.5).abs() < 1e-9);
        assert_eq!(PlaybackClock::secs_to_ns(2.0), 2_000_000_000);
    }
}
