use std::io::Write as _;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "captioncast", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Render an MP4 video (requires `ffmpeg` and `ffprobe` on PATH).
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input render job JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output time in seconds.
    #[arg(long, default_value_t = 0.0)]
    time: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input render job JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Refuse to replace an existing output file.
    #[arg(long, default_value_t = false)]
    no_overwrite: bool,

    /// Suppress progress output.
    #[arg(long, short, default_value_t = false)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let job = captioncast::RenderJob::from_path(&args.in_path)?;
    let (res, rgba) = captioncast::render_job_still(&job, args.time)?;

    captioncast::encode::ffmpeg::ensure_parent_dir(&args.out)?;
    image::save_buffer_with_format(
        &args.out,
        &rgba,
        res.width,
        res.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    if args.no_overwrite && args.out.exists() {
        anyhow::bail!("output '{}' already exists", args.out.display());
    }
    let job = captioncast::RenderJob::from_path(&args.in_path)?;

    let quiet = args.quiet;
    let hooks = captioncast::RenderHooks {
        progress: Some(Box::new(move |f: f64| {
            if !quiet {
                eprint!("\r{:5.1}%", f * 100.0);
                let _ = std::io::stderr().flush();
            }
        })),
        diagnostics: Some(Box::new(move |line: &str| {
            if !quiet {
                eprintln!("\r{line}");
            }
        })),
        cancel: None,
    };
    let out = captioncast::render_job(&job, hooks)?;
    if !quiet {
        eprintln!();
    }

    captioncast::encode::ffmpeg::ensure_parent_dir(&args.out)?;
    std::fs::write(&args.out, &out.bytes)
        .with_context(|| format!("write mp4 '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({} frames, {} bytes, {} seek stalls)",
        args.out.display(),
        out.stats.frames_encoded,
        out.stats.output_bytes,
        out.stats.seek_stalls
    );
    Ok(())
}
