//! Show session information.

use std::path::PathBuf;

use zoomcut_timeline::Session;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let session =
        Session::load(&path).map_err(|e| anyhow::anyhow!("Failed to load session: {e}"))?;

    println!("Session: {}", path.display());
    println!("  Duration: {:.2}s", session.duration_secs);
    println!("  Zoom effects: {}", session.zooms.len());
    println!("  Text overlays: {}", session.overlays.len());

    if !session.zooms.is_empty() {
        println!();
        println!("  Zooms:");
        for zoom in &session.zooms {
            println!(
                "    {} {:.2}s-{:.2}s {:.1}x at ({:.0}%, {:.0}%) [{:?}]",
                zoom.id,
                zoom.start_secs,
                zoom.end_secs,
                zoom.scale,
                zoom.x,
                zoom.y,
                zoom.transition,
            );
        }
    }

    if !session.overlays.is_empty() {
        println!();
        println!("  Overlays:");
        for overlay in &session.overlays {
            let text = overlay.text.lines().next().unwrap_or("");
            println!(
                "    {} {:.2}s-{:.2}s \"{}\"",
                overlay.id, overlay.start_secs, overlay.end_secs, text
            );
        }
    }

    Ok(())
}
