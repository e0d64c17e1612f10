use std::path::Path;
use std::process::Command;

use crate::error::{SlidereelError, SlidereelResult};

/// Return `true` when `ffprobe` can be invoked from `PATH`.
pub fn is_ffprobe_on_path() -> bool {
    Command::new("ffprobe")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Probe a media file's duration in milliseconds via the system `ffprobe`.
///
/// Only the audio input is ever probed; image durations are caller-specified.
pub fn probe_duration_ms(path: &Path) -> SlidereelResult<u64> {
    let output = Command::new("ffprobe")
        .args(["-v", "error", "-show_entries", "format=duration", "-of", "json"])
        .arg(path)
        .output()
        .map_err(|e| {
            SlidereelError::probe(format!(
                "failed to spawn ffprobe (is it installed and on PATH?): {e}"
            ))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SlidereelError::probe(format!(
            "ffprobe exited with status {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    duration_ms_from_json(&output.stdout, path)
}

fn duration_ms_from_json(stdout: &[u8], path: &Path) -> SlidereelResult<u64> {
    let value: serde_json::Value = serde_json::from_slice(stdout)
        .map_err(|e| SlidereelError::probe(format!("ffprobe output was not valid JSON: {e}")))?;

    let seconds = value
        .get("format")
        .and_then(|f| f.get("duration"))
        .and_then(|d| d.as_str())
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| {
            SlidereelError::probe(format!(
                "ffprobe reported no duration for '{}'",
                path.display()
            ))
        })?;

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(SlidereelError::probe(format!(
            "ffprobe reported an unusable duration ({seconds}) for '{}'",
            path.display()
        )));
    }

    Ok((seconds * 1000.0).round() as u64)
}
