//! Session file round-tripping.
//!
//! A session file is a plain serialization of the in-memory timeline
//! state (duration, effects, overlays). It is a hand-off artifact
//! between `import` and `export`, not a versioned project store.

use std::path::Path;

use serde::{Deserialize, Serialize};
use zoomcut_common::error::{ZoomcutError, ZoomcutResult};
use zoomcut_effect_model::{TextOverlay, ZoomEffect};

use crate::controller::TimelineController;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    /// Media duration in seconds. Zero means "unknown until probed".
    #[serde(default)]
    pub duration_secs: f64,

    #[serde(default)]
    pub zooms: Vec<ZoomEffect>,

    #[serde(default)]
    pub overlays: Vec<TextOverlay>,
}

impl Session {
    pub fn load(path: &Path) -> ZoomcutResult<Session> {
        if !path.exists() {
            return Err(ZoomcutError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let session: Session = serde_json::from_str(&content)?;
        Ok(session)
    }

    pub fn save(&self, path: &Path) -> ZoomcutResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Snapshot a controller's state.
    pub fn from_controller(controller: &TimelineController) -> Session {
        Session {
            duration_secs: controller.duration_secs(),
            zooms: controller.zooms().to_vec(),
            overlays: controller.overlays().to_vec(),
        }
    }

    /// Build a controller holding this session's state. Intervals are
    /// re-validated on the way in; a session edited by hand can't smuggle
    /// in an empty interval.
    pub fn into_controller(self, duration_secs: f64) -> ZoomcutResult<TimelineController> {
        let duration = if duration_secs > 0.0 {
            duration_secs
        } else {
            self.duration_secs
        };
        let mut controller = TimelineController::new(duration);
        for zoom in self.zooms {
            controller
                .add_zoom(zoom)
                .map_err(|e| ZoomcutError::timeline(e.to_string()))?;
        }
        for overlay in self.overlays {
            controller
                .add_overlay(overlay)
                .map_err(|e| ZoomcutError::timeline(e.to_string()))?;
        }
        Ok(controller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zoomcut_effect_model::{EffectSource, Transition};

    fn sample_session() -> Session {
        Session {
            duration_secs: 12.0,
            zooms: vec![ZoomEffect {
                id: "zoom_1".to_string(),
                start_secs: 1.0,
                end_secs: 4.0,
                x: 30.0,
                y: 70.0,
                scale: 2.5,
                transition: Transition::Smooth,
                source: EffectSource::Manual,
                origin: None,
            }],
            overlays: vec![],
        }
    }

    #[test]
    fn test_roundtrip_through_file() {
        let dir = std::env::temp_dir().join("zoomcut-session-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("session.json");

        let session = sample_session();
        session.save(&path).unwrap();
        let loaded = Session::load(&path).unwrap();
        assert_eq!(loaded.duration_secs, 12.0);
        assert_eq!(loaded.zooms.len(), 1);
        assert_eq!(loaded.zooms[0].id, "zoom_1");

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_file_is_a_clear_error() {
        let err = Session::load(Path::new("/nonexistent/session.json")).unwrap_err();
        assert!(matches!(err, ZoomcutError::FileNotFound { .. }));
    }

    #[test]
    fn test_into_controller_revalidates() {
        let mut session = sample_session();
        session.zooms[0].end_secs = session.zooms[0].start_secs;
        assert!(session.into_controller(12.0).is_err());
    }

    #[test]
    fn test_probed_duration_overrides_session() {
        let session = sample_session();
        let controller = session.into_controller(30.0).unwrap();
        assert_eq!(controller.duration_secs(), 30.0);
    }
}
