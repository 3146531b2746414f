//! Capability probing via ffmpeg/ffprobe.

use std::path::Path;
use std::process::Command;

pub fn command_exists(binary: &str) -> bool {
    Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Whether the local ffmpeg build lists the given encoder.
pub fn ffmpeg_has_encoder(encoder: &str) -> bool {
    let Ok(output) = Command::new("ffmpeg")
        .args(["-hide_banner", "-encoders"])
        .output()
    else {
        return false;
    };
    if !output.status.success() {
        return false;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .any(|line| line.split_whitespace().nth(1) == Some(encoder))
}

fn ffprobe_entry(path: &Path, stream: &str, entries: &str) -> Option<String> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            stream,
            "-show_entries",
            entries,
            "-of",
            "csv=p=0:s=x",
        ])
        .arg(path)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }
    let raw = String::from_utf8(output.stdout).ok()?;
    let line = raw.lines().next()?.trim();
    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}

/// Native `(width, height)` of the first video stream.
pub fn probe_video_dimensions(path: &Path) -> Option<(u32, u32)> {
    let line = ffprobe_entry(path, "v:0", "stream=width,height")?;
    let (w, h) = line.split_once('x')?;
    let width = w.parse::<u32>().ok()?;
    let height = h.parse::<u32>().ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    Some((width, height))
}

/// Container duration in seconds.
pub fn probe_duration_secs(path: &Path) -> Option<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "csv=p=0",
        ])
        .arg(path)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let raw = String::from_utf8(output.stdout).ok()?;
    let secs = raw.lines().next()?.trim().parse::<f64>().ok()?;
    if secs.is_finite() && secs > 0.0 {
        Some(secs)
    } else {
        None
    }
}

/// Whether the file carries at least one audio stream.
pub fn has_audio_stream(path: &Path) -> bool {
    ffprobe_entry(path, "a:0", "stream=codec_type").is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_exists_for_shell_builtins() {
        assert!(command_exists("sh"));
        assert!(!command_exists("definitely-not-a-real-binary-zoomcut"));
    }

    #[test]
    fn test_probe_missing_file_is_none() {
        assert_eq!(
            probe_video_dimensions(Path::new("/nonexistent/clip.mp4")),
            None
        );
        assert_eq!(probe_duration_secs(Path::new("/nonexistent/clip.mp4")), None);
        assert!(!has_audio_stream(Path::new("/nonexistent/clip.mp4")));
    }
}
