//! Convert a click recording into a session file.

use std::path::PathBuf;

use zoomcut_effect_model::ClicksData;
use zoomcut_timeline::Session;

pub fn run(clicks: PathBuf, normalize: bool, output: PathBuf) -> anyhow::Result<()> {
    println!("Importing clicks from: {}", clicks.display());

    let content = std::fs::read_to_string(&clicks)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", clicks.display()))?;
    let data = ClicksData::parse(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse clicks file: {e}"))?;

    let recorded_duration = data.duration;
    let effects = data
        .into_effects(normalize)
        .map_err(|e| anyhow::anyhow!("Failed to convert clicks: {e}"))?;

    // Session duration: what the recorder reported, or far enough to
    // cover the last effect.
    let duration_secs = recorded_duration.unwrap_or_else(|| {
        effects
            .iter()
            .map(|e| e.end_secs)
            .fold(0.0f64, f64::max)
    });

    let session = Session {
        duration_secs,
        zooms: effects,
        overlays: Vec::new(),
    };
    session
        .save(&output)
        .map_err(|e| anyhow::anyhow!("Failed to write session: {e}"))?;

    println!("  Effects: {}", session.zooms.len());
    println!("  Duration: {:.2}s", session.duration_secs);
    println!("Session written: {}", output.display());
    Ok(())
}
