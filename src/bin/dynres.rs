use std::path::PathBuf;

use anyhow::Context as _;
use clap::{ArgAction, Parser};

#[derive(Parser, Debug)]
#[command(name = "dynres", version, about = "Render webm videos whose resolution changes over time")]
struct Cli {
    /// Source video (.mp4 or .webm).
    #[arg(conflicts_with = "transparent")]
    input: Option<PathBuf>,

    /// Encode sequentially instead of on a worker pool.
    #[arg(short, long)]
    slow: bool,

    /// Generate a transparent clip: DURATION [FPS] [WIDTH] [HEIGHT] [LOOP].
    #[arg(
        short,
        long,
        num_args = 1..=5,
        value_name = "V",
        allow_negative_numbers = true
    )]
    transparent: Option<Vec<f64>>,

    /// Keyframe instruction document.
    #[arg(short, long, default_value = dynres::DEFAULT_INSTRUCTIONS_PATH)]
    instructions: PathBuf,

    /// Output path (default: `<input>_resized.webm`, or `out_resized.webm` in transparent mode).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Worker count for the encode pool (default: available parallelism).
    #[arg(long, conflicts_with = "slow")]
    threads: Option<usize>,

    /// Staging directory for intermediate frames (must be missing, empty, or left by dynres).
    #[arg(long)]
    staging_dir: Option<PathBuf>,

    /// More logging (-v for debug, -vv for trace).
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long)]
    quiet: bool,
}

enum Job {
    Video(PathBuf),
    Transparent(dynres::TransparentOpts),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let job = match (&cli.input, &cli.transparent) {
        (Some(input), _) => {
            dynres::validate_input_path(input)?;
            Job::Video(input.clone())
        }
        (None, Some(values)) => Job::Transparent(dynres::TransparentOpts::from_values(values)?),
        (None, None) => return Err(dynres::DynresError::invalid_input("no input given").into()),
    };

    let instructions = dynres::Instructions::from_path(&cli.instructions)?;

    let tools = dynres::FfmpegTools::new();
    tools.ensure_available()?;

    let cancel = dynres::CancellationToken::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || {
            tracing::warn!("interrupt received, stopping after the current step");
            cancel.cancel();
        })
        .context("install interrupt handler")?;
    }

    let opts = dynres::RunOpts {
        encode: if cli.slow {
            dynres::EncodeMode::Sequential
        } else {
            dynres::EncodeMode::Parallel {
                threads: cli.threads,
            }
        },
        staging_root: cli
            .staging_dir
            .unwrap_or_else(dynres::Staging::default_root),
        output: cli.output,
        cancel,
    };

    let report = match &job {
        Job::Video(input) => dynres::render_video(&tools, input, &instructions, &opts)?,
        Job::Transparent(clip) => dynres::render_transparent(&tools, clip, &instructions, &opts)?,
    };

    eprintln!(
        "wrote {} ({} frames, {} segments encoded)",
        report.output.display(),
        report.frames_total,
        report.segments_encoded
    );
    Ok(())
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        tracing::Level::WARN
    } else {
        match cli.verbose {
            0 => tracing::Level::INFO,
            1 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
