//! Check system capabilities.

use zoomcut_export::probe::{command_exists, ffmpeg_has_encoder};
use zoomcut_export::{default_strategies, EncodeStrategy};

pub fn run() -> anyhow::Result<()> {
    println!("ZoomCut System Check");
    println!("{}", "=".repeat(50));

    let ffmpeg = command_exists("ffmpeg");
    let ffprobe = command_exists("ffprobe");
    println!(
        "[{}] ffmpeg in PATH",
        if ffmpeg { "OK" } else { "MISSING" }
    );
    println!(
        "[{}] ffprobe in PATH",
        if ffprobe { "OK" } else { "MISSING" }
    );

    if ffmpeg {
        let x264 = ffmpeg_has_encoder("libx264");
        println!(
            "[{}] libx264 encoder",
            if x264 { "OK" } else { "MISSING" }
        );
    }

    println!();
    println!("Encode strategies (tried in order):");
    let strategies = default_strategies();
    let mut any_available = false;
    for strategy in &strategies {
        let available = strategy.probe();
        any_available |= available;
        println!(
            "  [{}] {}",
            if available { "OK" } else { "--" },
            strategy.name()
        );
    }

    println!();
    if any_available {
        println!("At least one encode strategy is available. ZoomCut is ready.");
    } else {
        println!("No encode strategy is available. Install ffmpeg to export.");
    }

    Ok(())
}
