use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Args, Parser, Subcommand};
use frame_manager::core::{level_from_verbosity, PoseEpoch, DEFAULT_MAX_PER_SEQUENCE};
use frame_manager::{
    run_batch, run_plan, run_single, BatchRun, IngestError, IngestSummary, InputSource,
    SensorSource, SingleRun,
};
use log::{error, info};

/// Reorganize geotagged JPEG captures into per-acquisition, per-sequence archives.
#[derive(Debug, Parser)]
#[command(name = "frame-manager", version, about)]
struct Cli {
    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only warnings and errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ingest one capture folder.
    Ingest(IngestArgs),
    /// Discover acquisition folders and write a batch manifest.
    Plan(PlanArgs),
    /// Process every folder listed in a batch manifest.
    Batch(BatchArgs),
}

#[derive(Debug, Args)]
struct CommonArgs {
    /// Maximum number of frames per sequence.
    #[arg(long, default_value_t = DEFAULT_MAX_PER_SEQUENCE.get())]
    max_per_seq: usize,

    /// Directory receiving the acquisition folders.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Time origin of the pose CSV seconds column (gps or unix).
    #[arg(long, default_value_t = PoseEpoch::Gps)]
    pose_epoch: PoseEpoch,
}

#[derive(Debug, Args)]
struct IngestArgs {
    /// Folder containing the images.
    input_dir: PathBuf,

    /// Acquisition region/owner tag.
    #[arg(long)]
    region: String,

    /// Sensor label; `auto` uses the camera model of the first image.
    #[arg(long, default_value = "auto")]
    sensor: SensorSource,

    /// Pose CSV path, or `auto` to search the input folder.
    #[arg(long)]
    pose_csv: Option<InputSource>,

    /// Point-cloud file or folder, or `auto` to search the input folder.
    #[arg(long)]
    point_clouds: Option<InputSource>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Debug, Args)]
struct PlanArgs {
    /// Folder whose sub-folders are acquisitions.
    root: PathBuf,

    /// Where to write the manifest.
    #[arg(long, default_value = "frame_manager_batch.json")]
    manifest: PathBuf,
}

#[derive(Debug, Args)]
struct BatchArgs {
    /// Manifest written by `plan` with regions filled in.
    manifest: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(not(feature = "tracing"))]
fn init_logging(verbose: u8, quiet: bool) {
    if let Err(err) = frame_manager::core::init_with_level(level_from_verbosity(verbose, quiet)) {
        eprintln!("logger already initialized: {err}");
    }
}

#[cfg(feature = "tracing")]
fn init_logging(verbose: u8, quiet: bool) {
    let _ = tracing_log::LogTracer::init();
    log::set_max_level(level_from_verbosity(verbose, quiet));
    frame_manager::core::init_tracing(false);
}

fn run(command: Command) -> Result<(), IngestError> {
    match command {
        Command::Ingest(args) => {
            let summary = run_single(&SingleRun {
                input_dir: args.input_dir,
                region: args.region,
                sensor: args.sensor,
                max_per_seq: args.common.max_per_seq,
                output_dir: args.common.output_dir,
                pose_csv: args.pose_csv.unwrap_or_default(),
                pose_epoch: args.common.pose_epoch,
                point_clouds: args.point_clouds.unwrap_or_default(),
            })?;
            report(&summary);
        }
        Command::Plan(args) => {
            run_plan(&args.root, &args.manifest)?;
        }
        Command::Batch(args) => {
            let summary = run_batch(&BatchRun {
                manifest: args.manifest,
                max_per_seq: args.common.max_per_seq,
                output_dir: args.common.output_dir,
                pose_epoch: args.common.pose_epoch,
            })?;
            report(&summary);
        }
    }
    Ok(())
}

fn report(summary: &IngestSummary) {
    info!(
        "Done. {} files copied into {} acquisition folder(s).",
        summary.frames_copied, summary.acquisitions
    );
    if summary.point_clouds_copied > 0 {
        info!("Copied {} point cloud file(s).", summary.point_clouds_copied);
    }
}
