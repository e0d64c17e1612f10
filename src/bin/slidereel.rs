use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use slidereel::{FilterGraph, ManifestImage, SlideshowOptions};

#[derive(Parser, Debug)]
#[command(name = "slidereel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the slideshow video (requires `ffmpeg`/`ffprobe` on PATH).
    Render(RenderArgs),
    /// Print the loop plan and the ffmpeg command without running it.
    Plan(PlanArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input manifest JSON (images, optional audio, options).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output video path.
    #[arg(long)]
    out: PathBuf,

    /// Print the executed ffmpeg command.
    #[arg(long)]
    show_command: bool,

    /// Print the captured ffmpeg log.
    #[arg(long)]
    show_log: bool,
}

#[derive(Parser, Debug)]
struct PlanArgs {
    /// Input manifest JSON (images, optional audio, options).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output video path the previewed command would write.
    #[arg(long, default_value = "slideshow.mp4")]
    out: PathBuf,
}

#[derive(Debug, serde::Deserialize)]
struct Manifest {
    images: Vec<ManifestImage>,
    #[serde(default)]
    audio: Option<PathBuf>,
    #[serde(default)]
    options: SlideshowOptions,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Plan(args) => cmd_plan(args),
    }
}

fn read_manifest(path: &Path) -> anyhow::Result<Manifest> {
    let f = File::open(path).with_context(|| format!("open manifest '{}'", path.display()))?;
    let r = BufReader::new(f);
    let manifest: Manifest = serde_json::from_reader(r).with_context(|| "parse manifest JSON")?;
    Ok(manifest)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let manifest = read_manifest(&args.in_path)?;

    let output = slidereel::create_slideshow(
        &manifest.images,
        manifest.audio.as_deref(),
        &manifest.options,
        &args.out,
    )?;

    if args.show_command {
        println!("{}", output.command);
    }
    if args.show_log {
        println!("{}", output.ffmpeg_log);
    }

    eprintln!("wrote {}", output.out_path.display());
    Ok(())
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    let manifest = read_manifest(&args.in_path)?;

    let planned = slidereel::plan_slideshow(
        &manifest.images,
        manifest.audio.as_deref(),
        &manifest.options,
        &args.out,
    )?;

    let timeline = &planned.plan.timeline;
    println!("segments:        {}", timeline.len());
    println!(
        "total duration:  {:.3}s",
        timeline.total_duration_ms() as f64 / 1000.0
    );
    println!("audio loops:     {}", planned.plan.audio_loop_count);
    match &planned.graph {
        FilterGraph::ConcatOnly => println!("filter graph:    none (concat demuxer)"),
        FilterGraph::Chain { nodes, output } => {
            println!("filter graph:    {} nodes -> [{output}]", nodes.len())
        }
    }
    println!("command:         {}", planned.command.rendered);
    Ok(())
}
