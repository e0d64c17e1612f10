use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    canvas,
    command::{AssembledCommand, AudioTrack, OutputLayout, assemble_command},
    encode,
    error::{SlidereelError, SlidereelResult},
    filtergraph::{FilterGraph, compile_filter_graph},
    looping::{LoopPlan, compute_timeline},
    options::{ManifestImage, SlideshowOptions},
    probe,
};

/// What a finished run hands back to the caller.
#[derive(Clone, Debug)]
pub struct SlideshowOutput {
    pub out_path: PathBuf,
    /// Captured ffmpeg stderr, kept as the diagnostics channel.
    pub ffmpeg_log: String,
    /// Human-readable rendering of the executed command.
    pub command: String,
}

/// A dry-run: everything computed, nothing executed.
#[derive(Clone, Debug)]
pub struct SlideshowPlan {
    pub plan: LoopPlan,
    pub graph: FilterGraph,
    pub command: AssembledCommand,
}

/// Build a slideshow video from `images` (plus optional `audio`) at
/// `out_path`.
///
/// Stages: validate, resolve options, normalize images onto a common canvas
/// in a scratch directory, probe the audio duration, compute the loop plan,
/// compile the filter graph, assemble and run ffmpeg.
pub fn create_slideshow(
    images: &[ManifestImage],
    audio: Option<&Path>,
    options: &SlideshowOptions,
    out_path: &Path,
) -> SlidereelResult<SlideshowOutput> {
    validate_input(images, audio, options)?;

    let resolved = options.resolve();
    resolved.policy.validate()?;

    let scratch = tempfile::Builder::new()
        .prefix("slidereel-")
        .tempdir()
        .context("failed to create scratch directory")?;
    tracing::debug!(dir = %scratch.path().display(), "created scratch directory");

    let sources: Vec<PathBuf> = images.iter().map(|image| image.path.clone()).collect();
    let prepared = canvas::prepare_images(&sources, &resolved.image.resize, scratch.path())?;
    let prepared_refs: Vec<&Path> = prepared.iter().map(PathBuf::as_path).collect();
    let base = resolved.base_timeline(images, &prepared_refs);

    // ffmpeg runs with the scratch directory as its working directory, so
    // caller-relative paths must be pinned down first.
    let out_path = absolutize(out_path)?;
    let audio = audio.map(absolutize).transpose()?;

    let audio_duration_ms = match &audio {
        Some(path) => probe::probe_duration_ms(path)?,
        None => 0,
    };

    let plan = compute_timeline(&base, audio_duration_ms, &resolved.policy)?;
    tracing::info!(
        segments = plan.timeline.len(),
        total_ms = plan.timeline.total_duration_ms(),
        audio_loops = plan.audio_loop_count,
        "computed loop plan"
    );

    let graph = compile_filter_graph(&plan.timeline)?;

    let layout = OutputLayout {
        out_path: out_path.clone(),
        concat_list_path: scratch.path().join("concat.txt"),
    };
    let audio_track = audio.map(|path| AudioTrack {
        path,
        loop_count: plan.audio_loop_count,
    });
    let assembled = assemble_command(
        &plan.timeline,
        audio_track.as_ref(),
        &graph,
        &resolved.encoder,
        &layout,
    )?;

    if let Some(script) = &assembled.concat_script {
        std::fs::write(&layout.concat_list_path, script).with_context(|| {
            format!(
                "failed to write concat script '{}'",
                layout.concat_list_path.display()
            )
        })?;
    }

    encode::ensure_parent_dir(&out_path)?;
    let run = encode::run_ffmpeg(&assembled.args, scratch.path())?;
    tracing::debug!(command = %assembled.rendered, "ffmpeg finished");

    Ok(SlideshowOutput {
        out_path,
        ffmpeg_log: run.stderr_log,
        command: assembled.rendered,
    })
}

/// Compute the loop plan, filter graph and command without touching ffmpeg.
///
/// Segments reference the raw input files (no canvas normalization happens),
/// so the rendered command is a faithful preview, not the executed artifact.
pub fn plan_slideshow(
    images: &[ManifestImage],
    audio: Option<&Path>,
    options: &SlideshowOptions,
    out_path: &Path,
) -> SlidereelResult<SlideshowPlan> {
    validate_input(images, audio, options)?;

    let resolved = options.resolve();
    resolved.policy.validate()?;

    let raw_refs: Vec<&Path> = images.iter().map(|image| image.path.as_path()).collect();
    let base = resolved.base_timeline(images, &raw_refs);

    let audio_duration_ms = match audio {
        Some(path) => probe::probe_duration_ms(path)?,
        None => 0,
    };

    let plan = compute_timeline(&base, audio_duration_ms, &resolved.policy)?;
    let graph = compile_filter_graph(&plan.timeline)?;
    let layout = OutputLayout {
        out_path: out_path.to_path_buf(),
        concat_list_path: PathBuf::from("concat.txt"),
    };
    let audio_track = audio.map(|path| AudioTrack {
        path: path.to_path_buf(),
        loop_count: plan.audio_loop_count,
    });
    let command = assemble_command(
        &plan.timeline,
        audio_track.as_ref(),
        &graph,
        &resolved.encoder,
        &layout,
    )?;

    Ok(SlideshowPlan {
        plan,
        graph,
        command,
    })
}

fn absolutize(path: &Path) -> SlidereelResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;
    Ok(cwd.join(path))
}

fn validate_input(
    images: &[ManifestImage],
    audio: Option<&Path>,
    options: &SlideshowOptions,
) -> SlidereelResult<()> {
    if images.is_empty() {
        return Err(SlidereelError::validation("no images provided"));
    }

    for image in images {
        if !image.path.is_file() {
            return Err(SlidereelError::validation(format!(
                "image file not found: '{}'",
                image.path.display()
            )));
        }
    }

    if let Some(last) = images.last() {
        let has_transition = last.transition.is_some_and(|t| !t.is_none());
        let has_transition_duration = last.transition_duration_ms.is_some_and(|ms| ms != 0);
        if has_transition || has_transition_duration {
            return Err(SlidereelError::validation(
                "last image cannot have a transition; there is nothing to transition to \
                 (for looping seams, set the loop transition option instead)",
            ));
        }
    }

    if let Some(audio) = audio
        && !audio.is_file()
    {
        return Err(SlidereelError::validation(format!(
            "audio file not found: '{}'",
            audio.display()
        )));
    }

    if let Some(resize) = &options.image.resize {
        if let Some(width) = resize.width
            && !width.is_multiple_of(2)
        {
            return Err(SlidereelError::validation(format!(
                "image width must be divisible by two: {width}"
            )));
        }
        if let Some(height) = resize.height
            && !height.is_multiple_of(2)
        {
            return Err(SlidereelError::validation(format!(
                "image height must be divisible by two: {height}"
            )));
        }
    }

    Ok(())
}
