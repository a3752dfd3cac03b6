use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "quill", version)]
struct Cli {
    /// Log debug output (per-scene statistics, ffmpeg invocations).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render an MP4 video (requires `ffmpeg` with libx264 on PATH).
    Render(RenderArgs),
    /// Render the frame shown at one instant as a PNG.
    Frame(FrameArgs),
    /// Print the scene timeline as JSON.
    Timeline(TimelineArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Project manifest JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Replace an existing output file.
    #[arg(long)]
    overwrite: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Project manifest JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Time in seconds from the start of the video.
    #[arg(long)]
    time: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct TimelineArgs {
    /// Project manifest JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Timeline(args) => cmd_timeline(args),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn load_project(path: &PathBuf) -> anyhow::Result<quill::Project> {
    quill::Project::from_path(path)
        .with_context(|| format!("load project '{}'", path.display()))
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let project = load_project(&args.in_path)?;
    let tracer = Arc::new(project.config().trace.tracer());

    let mut last_percent = -1i64;
    let mut progress = |p: quill::ExportProgress| {
        let whole = p.percent.floor() as i64;
        if whole != last_percent {
            last_percent = whole;
            eprint!("\rrendering: {whole:>3}% (frame {})", p.frame);
            let _ = std::io::stderr().flush();
        }
    };

    let outcome = project
        .export_mp4(
            tracer,
            &args.out,
            args.overwrite,
            quill::AbortHandle::new(),
            &mut progress,
        )
        .context("render video")?;
    eprintln!();

    match outcome {
        quill::ExportOutcome::Completed(report) => {
            for d in &report.degraded {
                eprintln!("degraded {}: {:?}", d.scene, d.degradation);
            }
            eprintln!(
                "wrote {} ({} frames, {:.2}s)",
                args.out.display(),
                report.frames,
                report.duration_secs
            );
        }
        quill::ExportOutcome::Aborted { frames } => {
            anyhow::bail!("export aborted after {frames} frames");
        }
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    anyhow::ensure!(
        args.time.is_finite() && args.time >= 0.0,
        "--time must be a finite, non-negative number of seconds"
    );
    let project = load_project(&args.in_path)?;
    let tracer = Arc::new(project.config().trace.tracer());
    let frame = project
        .render_still(tracer, args.time)
        .context("render frame")?;
    let bg = project.config().output.background.to_rgba();
    quill::project::save_frame_png(&frame, bg, &args.out)
        .with_context(|| format!("write '{}'", args.out.display()))?;
    Ok(())
}

fn cmd_timeline(args: TimelineArgs) -> anyhow::Result<()> {
    let project = load_project(&args.in_path)?;
    let narration = project.load_narration().context("decode narration")?;
    let timeline = project.timeline(&narration)?;
    let json = serde_json::to_string_pretty(&timeline).context("serialize timeline")?;
    println!("{json}");
    Ok(())
}
