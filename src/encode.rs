use std::path::Path;
use std::process::Command;

use crate::error::{SlidereelError, SlidereelResult};

/// Captured diagnostics from a completed ffmpeg invocation.
#[derive(Clone, Debug)]
pub struct FfmpegRun {
    pub stderr_log: String,
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> SlidereelResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Run the system `ffmpeg` with an assembled argument list.
///
/// Non-zero exit surfaces the captured stderr verbatim; the invocation is
/// never retried (the argument list is deterministic, so a second run would
/// fail the same way).
pub fn run_ffmpeg(args: &[String], workdir: &Path) -> SlidereelResult<FfmpegRun> {
    if !is_ffmpeg_on_path() {
        return Err(SlidereelError::process(
            "ffmpeg is required for slideshow encoding, but was not found on PATH",
        ));
    }

    let output = Command::new("ffmpeg")
        .args(args)
        .current_dir(workdir)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::piped())
        .output()
        .map_err(|e| {
            SlidereelError::process(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

    let stderr_log = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        return Err(SlidereelError::process(format!(
            "ffmpeg exited with status {}: {}",
            output.status,
            stderr_log.trim()
        )));
    }

    Ok(FfmpegRun { stderr_log })
}
