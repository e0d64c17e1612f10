use std::path::PathBuf;

use crate::{
    error::{SlidereelError, SlidereelResult},
    filtergraph::{FilterGraph, FilterNode},
    model::Timeline,
};

/// Fully-resolved output/codec settings.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EncoderSettings {
    /// Container format; decides the output file extension.
    pub container: String,
    pub fps: Option<u32>,
    pub pixel_format: String,
    pub video_codec: String,
    /// Only consulted when `video_codec` is libx264.
    pub x264_preset: String,
    pub video_bitrate: Option<String>,
    pub audio_codec: Option<String>,
    pub audio_bitrate: Option<String>,
    pub stream_copy_audio: bool,
    /// Replaces the default codec/bitrate/pixel-format block when set; the
    /// input list, filter graph, mappings and duration clamp always survive.
    pub custom_output_args: Option<String>,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            container: "mp4".into(),
            fps: None,
            pixel_format: "yuv420p".into(),
            video_codec: "libx264".into(),
            x264_preset: "superfast".into(),
            video_bitrate: None,
            audio_codec: None,
            audio_bitrate: None,
            stream_copy_audio: false,
            custom_output_args: None,
        }
    }
}

/// Audio input plus how many times it plays.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AudioTrack {
    pub path: PathBuf,
    pub loop_count: u32,
}

/// Where the assembled command reads and writes on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputLayout {
    pub out_path: PathBuf,
    /// Location the concat demuxer script will occupy when the sentinel graph
    /// is in play; the orchestrator materializes it.
    pub concat_list_path: PathBuf,
}

/// The ordered ffmpeg argument list plus its diagnostic rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssembledCommand {
    pub args: Vec<String>,
    pub rendered: String,
    /// Contents for the concat demuxer script; `Some` exactly when the graph
    /// was the [`FilterGraph::ConcatOnly`] sentinel.
    pub concat_script: Option<String>,
}

/// Combine the expanded timeline, audio repeat count and compiled graph into
/// the ffmpeg invocation. Pure: filesystem writes stay with the caller.
pub fn assemble_command(
    timeline: &Timeline,
    audio: Option<&AudioTrack>,
    graph: &FilterGraph,
    encoder: &EncoderSettings,
    layout: &OutputLayout,
) -> SlidereelResult<AssembledCommand> {
    timeline.validate()?;
    if let Some(audio) = audio
        && audio.loop_count == 0
    {
        return Err(SlidereelError::validation("audio loop_count must be >= 1"));
    }

    let segments = timeline.segments();
    let mut args: Vec<String> = vec!["-y".into(), "-loglevel".into(), "error".into()];
    let mut concat_script = None;

    match graph {
        FilterGraph::ConcatOnly => {
            concat_script = Some(concat_demuxer_script(timeline));
            push(&mut args, ["-f", "concat", "-safe", "0", "-i"]);
            args.push(layout.concat_list_path.display().to_string());
        }
        FilterGraph::Chain { .. } => {
            for (i, segment) in segments.iter().enumerate() {
                // Each image must stay decodable across its own display time
                // plus the crossfade overlap on both sides.
                let decode_ms = segment.duration_ms
                    + segment.transition_duration_ms
                    + if i > 0 {
                        segments[i - 1].transition_duration_ms
                    } else {
                        0
                    };
                push(&mut args, ["-loop", "1", "-t"]);
                args.push(format_seconds(decode_ms));
                args.push("-i".into());
                args.push(segment.source.display().to_string());
            }
        }
    }

    if let Some(audio) = audio {
        args.push("-stream_loop".into());
        args.push((audio.loop_count - 1).to_string());
        args.push("-i".into());
        args.push(audio.path.display().to_string());
    }

    if let FilterGraph::Chain { nodes, output } = graph {
        args.push("-filter_complex".into());
        args.push(render_graph(nodes));
        args.push("-map".into());
        args.push(format!("[{output}]"));
        if audio.is_some() {
            args.push("-map".into());
            args.push(format!("{}:a", segments.len()));
        }
    }

    match &encoder.custom_output_args {
        Some(custom) => args.extend(split_command_string(custom)),
        None => {
            if let Some(fps) = encoder.fps {
                args.push("-r".into());
                args.push(fps.to_string());
            }
            push(&mut args, ["-pix_fmt"]);
            args.push(encoder.pixel_format.clone());
            args.push("-c:v".into());
            args.push(encoder.video_codec.clone());
            if encoder.video_codec == "libx264" {
                args.push("-preset".into());
                args.push(encoder.x264_preset.clone());
            }
            if let Some(bitrate) = &encoder.video_bitrate {
                args.push("-b:v".into());
                args.push(bitrate.clone());
            }
            if audio.is_some() {
                if encoder.stream_copy_audio {
                    push(&mut args, ["-c:a", "copy"]);
                } else {
                    if let Some(codec) = &encoder.audio_codec {
                        args.push("-c:a".into());
                        args.push(codec.clone());
                    }
                    if let Some(bitrate) = &encoder.audio_bitrate {
                        args.push("-b:a".into());
                        args.push(bitrate.clone());
                    }
                }
            }
        }
    }

    // Looped audio may run long; the image timeline is the master clock.
    args.push("-t".into());
    args.push(format_seconds(timeline.total_duration_ms()));
    args.push(layout.out_path.display().to_string());

    let rendered = render_command(&args);
    Ok(AssembledCommand {
        args,
        rendered,
        concat_script,
    })
}

fn push(args: &mut Vec<String>, items: impl IntoIterator<Item = &'static str>) {
    args.extend(items.into_iter().map(String::from));
}

fn render_graph(nodes: &[FilterNode]) -> String {
    let rendered: Vec<String> = nodes
        .iter()
        .map(|node| match node {
            FilterNode::NormalizeTimebase { input, output } => {
                format!("[{input}]settb=AVTB[{output}]")
            }
            FilterNode::Crossfade {
                transition,
                duration_ms,
                offset_ms,
                inputs,
                output,
            } => format!(
                "[{}][{}]xfade=transition={}:duration={}:offset={}[{}]",
                inputs[0],
                inputs[1],
                transition.name(),
                format_seconds(*duration_ms),
                format_seconds(*offset_ms),
                output
            ),
            FilterNode::Concat {
                count,
                inputs,
                output,
            } => format!(
                "[{}][{}]concat=n={}:v=1:a=0[{}]",
                inputs[0], inputs[1], count, output
            ),
        })
        .collect();
    rendered.join(";")
}

fn concat_demuxer_script(timeline: &Timeline) -> String {
    let mut script = String::new();
    for segment in timeline.segments() {
        script.push_str(&format!(
            "file '{}'\nduration {}\n",
            segment.source.display(),
            format_seconds_padded(segment.duration_ms)
        ));
    }
    script
}

/// Milliseconds as ffmpeg-friendly decimal seconds, trailing zeros trimmed.
pub(crate) fn format_seconds(ms: u64) -> String {
    let text = format!("{:.3}", ms as f64 / 1000.0);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text.is_empty() {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// Seconds with at least two fraction digits, as the concat demuxer script
/// convention expects.
fn format_seconds_padded(ms: u64) -> String {
    if ms % 10 == 0 {
        format!("{:.2}", ms as f64 / 1000.0)
    } else {
        format!("{:.3}", ms as f64 / 1000.0)
    }
}

/// Split a user-supplied argument string on whitespace, honoring single and
/// double quotes. Quotes group, then drop; no shell is involved downstream.
fn split_command_string(input: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for ch in input.chars() {
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                } else {
                    current.push(ch);
                }
            }
            None => match ch {
                '\'' | '"' => quote = Some(ch),
                c if c.is_whitespace() => {
                    if !current.is_empty() {
                        out.push(std::mem::take(&mut current));
                    }
                }
                c => current.push(c),
            },
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn render_command(args: &[String]) -> String {
    let mut rendered = String::from("ffmpeg");
    for arg in args {
        rendered.push(' ');
        if arg.contains(char::is_whitespace) {
            rendered.push('"');
            rendered.push_str(arg);
            rendered.push('"');
        } else {
            rendered.push_str(arg);
        }
    }
    rendered
}
