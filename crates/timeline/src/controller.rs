//! The session controller.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zoomcut_common::clock::PlaybackClock;
use zoomcut_common::error::ZoomcutError;
use zoomcut_effect_model::{
    sort_effects, ClicksData, TextOverlay, Transition, ZoomEffect, SCALE_MAX, SCALE_MIN,
};

use crate::drag::{apply_drag, DragMode, DragState};

/// Default length of an effect added at the playhead, in seconds.
pub const DEFAULT_EFFECT_SECS: f64 = 5.0;

/// Default magnification for a freshly added effect.
pub const DEFAULT_EFFECT_SCALE: f64 = 1.5;

#[derive(Debug, Error)]
pub enum TimelineError {
    /// Every mutating operation fails with this while an export runs.
    #[error("an export is in progress; the timeline is locked")]
    ExportInProgress,

    #[error("effect interval is empty (end must be after start)")]
    EmptyInterval,

    #[error("no effect or overlay with id {0}")]
    UnknownId(String),

    #[error("no drag in progress")]
    NoDrag,
}

impl From<TimelineError> for ZoomcutError {
    fn from(e: TimelineError) -> Self {
        ZoomcutError::timeline(e.to_string())
    }
}

/// Field-wise update for a zoom effect. `None` fields are untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoomPatch {
    pub start_secs: Option<f64>,
    pub end_secs: Option<f64>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub scale: Option<f64>,
    pub transition: Option<Transition>,
}

/// Field-wise update for a text overlay.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverlayPatch {
    pub start_secs: Option<f64>,
    pub end_secs: Option<f64>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub text: Option<String>,
    pub font_size: Option<f32>,
    pub color: Option<String>,
    pub background: Option<Option<String>>,
}

/// Keyboard-driven editor commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorCommand {
    DeleteSelected,
    ClearSelection,
    TogglePlayback,
}

/// Exclusive owner of a session's mutable state.
#[derive(Debug)]
pub struct TimelineController {
    zooms: Vec<ZoomEffect>,
    overlays: Vec<TextOverlay>,
    clock: PlaybackClock,
    selected: Option<String>,
    exporting: bool,
    next_id: u64,
}

impl TimelineController {
    pub fn new(duration_secs: f64) -> Self {
        Self {
            zooms: Vec::new(),
            overlays: Vec::new(),
            clock: PlaybackClock::new(duration_secs),
            selected: None,
            exporting: false,
            next_id: 1,
        }
    }

    // ---- read access ----

    pub fn zooms(&self) -> &[ZoomEffect] {
        &self.zooms
    }

    pub fn overlays(&self) -> &[TextOverlay] {
        &self.overlays
    }

    /// Start-time-ordered snapshot for interpolation and export.
    pub fn sorted_zooms(&self) -> Vec<ZoomEffect> {
        sort_effects(&self.zooms)
    }

    pub fn duration_secs(&self) -> f64 {
        self.clock.duration_secs()
    }

    pub fn position_secs(&self) -> f64 {
        self.clock.position_secs()
    }

    pub fn is_playing(&self) -> bool {
        self.clock.is_playing()
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_zoom(&self) -> Option<&ZoomEffect> {
        let id = self.selected.as_deref()?;
        self.zooms.iter().find(|z| z.id == id)
    }

    // ---- playhead ----

    pub fn seek(&mut self, secs: f64) {
        self.clock.seek(secs);
    }

    pub fn tick(&mut self, delta_secs: f64) {
        self.clock.tick(delta_secs);
    }

    /// Toggle playback. Ignored while an export holds the lock; returns
    /// the (possibly unchanged) playing state.
    pub fn toggle_playback(&mut self) -> bool {
        if self.exporting {
            return false;
        }
        self.clock.toggle()
    }

    pub fn set_duration(&mut self, secs: f64) {
        self.clock.set_duration(secs);
    }

    // ---- zoom effects ----

    /// Add a default effect at the playhead, select it, and return its id.
    pub fn add_zoom_at_playhead(&mut self) -> Result<String, TimelineError> {
        let start = self.clock.position_secs();
        let end = (start + DEFAULT_EFFECT_SECS).min(self.clock.duration_secs());
        let id = self.fresh_id("zoom");
        self.add_zoom(ZoomEffect {
            id: id.clone(),
            start_secs: start,
            end_secs: end,
            x: 50.0,
            y: 50.0,
            scale: DEFAULT_EFFECT_SCALE,
            transition: Transition::Smooth,
            source: zoomcut_effect_model::EffectSource::Manual,
            origin: None,
        })?;
        self.selected = Some(id.clone());
        Ok(id)
    }

    /// Add an effect, clamping its fields into the session's bounds.
    pub fn add_zoom(&mut self, mut effect: ZoomEffect) -> Result<(), TimelineError> {
        self.ensure_unlocked()?;
        self.clamp_interval(&mut effect.start_secs, &mut effect.end_secs)?;
        effect.x = effect.x.clamp(0.0, 100.0);
        effect.y = effect.y.clamp(0.0, 100.0);
        effect.scale = effect.scale.clamp(SCALE_MIN, SCALE_MAX);
        tracing::debug!(id = %effect.id, start = effect.start_secs, end = effect.end_secs, "adding zoom effect");
        self.zooms.push(effect);
        Ok(())
    }

    pub fn update_zoom(&mut self, id: &str, patch: ZoomPatch) -> Result<(), TimelineError> {
        self.ensure_unlocked()?;
        let duration = self.clock.duration_secs();
        let effect = self
            .zooms
            .iter_mut()
            .find(|z| z.id == id)
            .ok_or_else(|| TimelineError::UnknownId(id.to_string()))?;

        let mut start = patch.start_secs.unwrap_or(effect.start_secs);
        let mut end = patch.end_secs.unwrap_or(effect.end_secs);
        start = start.clamp(0.0, duration);
        end = end.clamp(0.0, duration);
        if end <= start {
            return Err(TimelineError::EmptyInterval);
        }
        effect.start_secs = start;
        effect.end_secs = end;

        if let Some(x) = patch.x {
            effect.x = x.clamp(0.0, 100.0);
        }
        if let Some(y) = patch.y {
            effect.y = y.clamp(0.0, 100.0);
        }
        if let Some(scale) = patch.scale {
            effect.scale = scale.clamp(SCALE_MIN, SCALE_MAX);
        }
        if let Some(transition) = patch.transition {
            effect.transition = transition;
        }
        Ok(())
    }

    pub fn delete_zoom(&mut self, id: &str) -> Result<(), TimelineError> {
        self.ensure_unlocked()?;
        let before = self.zooms.len();
        self.zooms.retain(|z| z.id != id);
        if self.zooms.len() == before {
            return Err(TimelineError::UnknownId(id.to_string()));
        }
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        Ok(())
    }

    pub fn clear_zooms(&mut self) -> Result<(), TimelineError> {
        self.ensure_unlocked()?;
        self.zooms.clear();
        self.selected = None;
        Ok(())
    }

    /// Bulk-append imported click effects. Returns how many were added.
    ///
    /// All-or-nothing: the whole batch is validated and clamped before
    /// any effect is stored, so a bad record never leaves a partial
    /// import behind.
    pub fn import_clicks(
        &mut self,
        data: ClicksData,
        normalize: bool,
    ) -> Result<usize, ZoomcutError> {
        self.ensure_unlocked()?;
        let mut effects = data
            .into_effects(normalize)
            .map_err(|e| ZoomcutError::model(e.to_string()))?;
        for effect in &mut effects {
            self.clamp_interval(&mut effect.start_secs, &mut effect.end_secs)?;
            effect.x = effect.x.clamp(0.0, 100.0);
            effect.y = effect.y.clamp(0.0, 100.0);
            effect.scale = effect.scale.clamp(SCALE_MIN, SCALE_MAX);
        }
        let count = effects.len();
        self.zooms.extend(effects);
        tracing::info!(count, "imported click effects");
        Ok(count)
    }

    // ---- overlays ----

    pub fn add_overlay(&mut self, mut overlay: TextOverlay) -> Result<(), TimelineError> {
        self.ensure_unlocked()?;
        self.clamp_interval(&mut overlay.start_secs, &mut overlay.end_secs)?;
        overlay.x = overlay.x.clamp(0.0, 100.0);
        overlay.y = overlay.y.clamp(0.0, 100.0);
        self.overlays.push(overlay);
        Ok(())
    }

    pub fn update_overlay(&mut self, id: &str, patch: OverlayPatch) -> Result<(), TimelineError> {
        self.ensure_unlocked()?;
        let duration = self.clock.duration_secs();
        let overlay = self
            .overlays
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| TimelineError::UnknownId(id.to_string()))?;

        let mut start = patch.start_secs.unwrap_or(overlay.start_secs);
        let mut end = patch.end_secs.unwrap_or(overlay.end_secs);
        start = start.clamp(0.0, duration);
        end = end.clamp(0.0, duration);
        if end <= start {
            return Err(TimelineError::EmptyInterval);
        }
        overlay.start_secs = start;
        overlay.end_secs = end;

        if let Some(x) = patch.x {
            overlay.x = x.clamp(0.0, 100.0);
        }
        if let Some(y) = patch.y {
            overlay.y = y.clamp(0.0, 100.0);
        }
        if let Some(text) = patch.text {
            overlay.text = text;
        }
        if let Some(size) = patch.font_size {
            overlay.font_size = size;
        }
        if let Some(color) = patch.color {
            overlay.color = color;
        }
        if let Some(background) = patch.background {
            overlay.background = background;
        }
        Ok(())
    }

    pub fn delete_overlay(&mut self, id: &str) -> Result<(), TimelineError> {
        self.ensure_unlocked()?;
        let before = self.overlays.len();
        self.overlays.retain(|o| o.id != id);
        if self.overlays.len() == before {
            return Err(TimelineError::UnknownId(id.to_string()));
        }
        Ok(())
    }

    // ---- selection ----

    pub fn select(&mut self, id: &str) -> Result<(), TimelineError> {
        if !self.zooms.iter().any(|z| z.id == id) {
            return Err(TimelineError::UnknownId(id.to_string()));
        }
        self.selected = Some(id.to_string());
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    // ---- drag editing ----

    /// Begin dragging an effect. `pointer_time` is where on the strip
    /// the grab happened; for `Move` the grab offset keeps the effect
    /// from snapping its start under the cursor.
    pub fn begin_drag(
        &mut self,
        id: &str,
        mode: DragMode,
        pointer_time: f64,
    ) -> Result<DragState, TimelineError> {
        self.ensure_unlocked()?;
        let effect = self
            .zooms
            .iter()
            .find(|z| z.id == id)
            .ok_or_else(|| TimelineError::UnknownId(id.to_string()))?;
        let grab_offset_secs = match mode {
            DragMode::Move => pointer_time - effect.start_secs,
            _ => 0.0,
        };
        Ok(DragState {
            effect_id: id.to_string(),
            mode,
            grab_offset_secs,
        })
    }

    /// Apply a drag update for the given in-flight drag.
    pub fn drag_to(&mut self, drag: &DragState, pointer_time: f64) -> Result<(), TimelineError> {
        self.ensure_unlocked()?;
        let duration = self.clock.duration_secs();
        let effect = self
            .zooms
            .iter_mut()
            .find(|z| z.id == drag.effect_id)
            .ok_or_else(|| TimelineError::UnknownId(drag.effect_id.clone()))?;
        let (start, end) = apply_drag(
            drag.mode,
            effect.start_secs,
            effect.end_secs,
            pointer_time,
            drag.grab_offset_secs,
            duration,
        );
        effect.start_secs = start;
        effect.end_secs = end;
        Ok(())
    }

    // ---- commands ----

    pub fn handle_command(&mut self, command: EditorCommand) -> Result<(), TimelineError> {
        match command {
            EditorCommand::DeleteSelected => {
                if let Some(id) = self.selected.clone() {
                    self.delete_zoom(&id)?;
                }
                Ok(())
            }
            EditorCommand::ClearSelection => {
                self.clear_selection();
                Ok(())
            }
            EditorCommand::TogglePlayback => {
                self.toggle_playback();
                Ok(())
            }
        }
    }

    // ---- export lock ----

    /// Take the export lock: playback pauses and every mutating
    /// operation fails until the returned guard drops.
    pub fn begin_export(&mut self) -> Result<ExportGuard<'_>, TimelineError> {
        if self.exporting {
            return Err(TimelineError::ExportInProgress);
        }
        self.clock.pause();
        self.exporting = true;
        tracing::debug!("timeline locked for export");
        Ok(ExportGuard { controller: self })
    }

    fn ensure_unlocked(&self) -> Result<(), TimelineError> {
        if self.exporting {
            Err(TimelineError::ExportInProgress)
        } else {
            Ok(())
        }
    }

    fn clamp_interval(&self, start: &mut f64, end: &mut f64) -> Result<(), TimelineError> {
        let duration = self.clock.duration_secs();
        *start = start.clamp(0.0, duration);
        *end = end.clamp(0.0, duration);
        if *end <= *start {
            return Err(TimelineError::EmptyInterval);
        }
        Ok(())
    }

    fn fresh_id(&mut self, prefix: &str) -> String {
        let id = format!("{prefix}_{}", self.next_id);
        self.next_id += 1;
        id
    }
}

/// RAII export lock: releasing happens on drop, so the timeline unlocks
/// even when the export errors or is cancelled.
pub struct ExportGuard<'a> {
    controller: &'a mut TimelineController,
}

impl ExportGuard<'_> {
    /// Start-time-ordered effect snapshot for the export frame loop.
    pub fn sorted_zooms(&self) -> Vec<ZoomEffect> {
        self.controller.sorted_zooms()
    }

    pub fn overlays(&self) -> Vec<TextOverlay> {
        self.controller.overlays.clone()
    }

    pub fn duration_secs(&self) -> f64 {
        self.controller.duration_secs()
    }
}

impl Drop for ExportGuard<'_> {
    fn drop(&mut self) {
        self.controller.exporting = false;
        tracing::debug!("timeline export lock released");
    }
}
