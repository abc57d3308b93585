//! Run orchestration: single-folder ingest, batch planning and batch runs.

use std::fs;
use std::ops::AddAssign;
use std::path::{Path, PathBuf};

use frame_manager_core::{
    assign_sequences, build_records, date_from_folder_name, group_by_acquisition, ConfigError,
    FusedRecord, ImageEntry, MetadataDecoder, PoseEpoch, PoseLookup,
};
use frame_manager_io::{
    camera_model, collect_image_entries, collect_point_clouds, copy_point_clouds, find_first_image,
    find_pose_csv, load_pose_csv, plan_batch, scan_point_clouds, BatchManifest, ExifDecoder,
    FrameIoError, ManifestEntry,
};
use log::{debug, info, warn};

use crate::config::{IngestConfig, InputSource, SensorSource};
use crate::emit::{AggregateEmitter, EmittedAggregates};
use crate::render::{AcquisitionContext, OutputRenderer};

/// Errors that stop a run.
#[derive(thiserror::Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] FrameIoError),
    #[error("input folder not found: {}", .0.display())]
    InputNotFound(PathBuf),
    #[error(
        "output dir {} must be outside the input folder {} to avoid re-ingesting outputs",
        output.display(),
        input.display()
    )]
    OutputInsideInput { input: PathBuf, output: PathBuf },
    #[error("{name}: {source}")]
    Entry {
        name: String,
        #[source]
        source: ConfigError,
    },
}

/// Running totals of a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub frames_copied: usize,
    pub point_clouds_copied: usize,
    pub acquisitions: usize,
}

impl AddAssign for IngestSummary {
    fn add_assign(&mut self, other: Self) {
        self.frames_copied += other.frames_copied;
        self.point_clouds_copied += other.point_clouds_copied;
        self.acquisitions += other.acquisitions;
    }
}

/// Arguments of a single-folder run.
#[derive(Clone, Debug)]
pub struct SingleRun {
    pub input_dir: PathBuf,
    pub region: String,
    pub sensor: SensorSource,
    pub max_per_seq: usize,
    pub output_dir: PathBuf,
    pub pose_csv: InputSource,
    pub pose_epoch: PoseEpoch,
    pub point_clouds: InputSource,
}

/// Arguments of a manifest-driven batch run.
#[derive(Clone, Debug)]
pub struct BatchRun {
    pub manifest: PathBuf,
    pub max_per_seq: usize,
    pub output_dir: PathBuf,
    pub pose_epoch: PoseEpoch,
}

/// Assign, render and emit one acquisition.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "info", skip_all, fields(acquisition = %acquisition_id))
)]
pub fn process_acquisition(
    acquisition_id: String,
    records: Vec<FusedRecord>,
    config: &IngestConfig,
) -> Result<(AcquisitionContext, EmittedAggregates), FrameIoError> {
    let frames = assign_sequences(records, config.max_per_seq);
    let mut ctx = AcquisitionContext::new(&config.output_dir, acquisition_id);
    ctx.prepare()?;

    OutputRenderer::new(&config.sensor_id).render_all(&mut ctx, &frames)?;

    let emitter = AggregateEmitter::new(&config.sensor_id);
    let mut emitted = EmittedAggregates::default();
    emitter.emit_descriptors(&ctx, &frames, &mut emitted)?;
    emitter.emit_sequences(&ctx, &mut emitted)?;
    Ok((ctx, emitted))
}

/// Group fused records into acquisitions and process each in first-seen
/// order, copying `point_clouds` into every acquisition.
pub fn ingest_records(
    records: Vec<FusedRecord>,
    config: &IngestConfig,
    point_clouds: &[PathBuf],
) -> Result<IngestSummary, IngestError> {
    let mut summary = IngestSummary::default();
    for group in group_by_acquisition(records, &config.region) {
        let (ctx, emitted) = process_acquisition(group.acquisition_id, group.records, config)?;
        debug!(
            "{}: {} trajectories, {} tracks, intrinsics: {}, coordinate systems: {}",
            ctx.acquisition_id(),
            emitted.trajectories,
            emitted.tracks,
            emitted.intrinsics,
            emitted.coordinate_systems
        );
        summary.frames_copied += ctx.frames_copied();
        summary.point_clouds_copied +=
            copy_point_clouds(ctx.root(), ctx.acquisition_id(), point_clouds)?;
        summary.acquisitions += 1;
    }
    Ok(summary)
}

/// Scan `folder`, fuse its images and ingest them.
fn ingest_folder(
    folder: &Path,
    poses: &PoseLookup,
    config: &IngestConfig,
    point_clouds: &[PathBuf],
    decoder: &dyn MetadataDecoder,
) -> Result<IngestSummary, IngestError> {
    info!("Loading images and building records...");
    let entries: Vec<ImageEntry> = collect_image_entries(folder);
    if entries.is_empty() {
        info!("No JPEG images found in {}.", folder.display());
        return Ok(IngestSummary::default());
    }
    let records = build_records(&entries, poses, decoder, config.folder_date.as_deref());
    ingest_records(records, config, point_clouds)
}

fn absolute(path: &Path) -> PathBuf {
    fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Reject an output directory at or below the input folder.
pub fn ensure_output_outside(input: &Path, output: &Path) -> Result<(), IngestError> {
    let (input, output) = (absolute(input), absolute(output));
    if output.starts_with(&input) {
        return Err(IngestError::OutputInsideInput { input, output });
    }
    Ok(())
}

fn folder_name(path: &Path) -> String {
    absolute(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Ingest one capture folder.
///
/// Configuration, pose CSV and point-cloud problems are reported before any
/// file is written.
#[cfg_attr(feature = "tracing", tracing::instrument(level = "info", skip_all))]
pub fn run_single(run: &SingleRun) -> Result<IngestSummary, IngestError> {
    run_single_with(run, &ExifDecoder)
}

/// [`run_single`] with a caller-supplied metadata decoder.
pub fn run_single_with(
    run: &SingleRun,
    decoder: &dyn MetadataDecoder,
) -> Result<IngestSummary, IngestError> {
    if !run.input_dir.is_dir() {
        return Err(IngestError::InputNotFound(run.input_dir.clone()));
    }
    ensure_output_outside(&run.input_dir, &run.output_dir)?;

    let pose_path = match &run.pose_csv {
        InputSource::Disabled => None,
        InputSource::Auto => {
            let found = find_pose_csv(&run.input_dir);
            if found.is_none() {
                info!("No pose CSV found in {}.", run.input_dir.display());
            }
            found
        }
        InputSource::Path(path) => Some(path.clone()),
    };
    let poses = match &pose_path {
        Some(path) => load_pose_csv(path, run.pose_epoch)?,
        None => PoseLookup::new(),
    };

    let point_clouds = match &run.point_clouds {
        InputSource::Disabled => Vec::new(),
        InputSource::Auto => scan_point_clouds(&run.input_dir),
        InputSource::Path(path) => collect_point_clouds(path)?,
    };

    let metadata_sensor = find_first_image(&run.input_dir).and_then(|image| camera_model(&image));
    let sensor_id = run.sensor.resolve(metadata_sensor)?;
    let config = IngestConfig::new(
        &run.region,
        sensor_id.as_str(),
        run.max_per_seq,
        run.output_dir.clone(),
    )?
    .with_folder_date(date_from_folder_name(&folder_name(&run.input_dir)));
    info!("Sensor set to '{}'. Scanning for images and metadata...", config.sensor_id);

    ingest_folder(&run.input_dir, &poses, &config, &point_clouds, decoder)
}

/// Discover acquisition folders under `root` and write an editable manifest.
pub fn run_plan(root: &Path, manifest_path: &Path) -> Result<BatchManifest, IngestError> {
    if !root.is_dir() {
        return Err(IngestError::InputNotFound(root.to_path_buf()));
    }
    let manifest = plan_batch(root);
    if manifest.acquisitions.is_empty() {
        info!("No JPEG images found under {}.", root.display());
    }
    manifest.write_json(manifest_path)?;
    info!(
        "Wrote {} with {} acquisition(s); fill in each region, then run `batch`.",
        manifest_path.display(),
        manifest.acquisitions.len()
    );
    Ok(manifest)
}

/// A manifest entry whose settings and explicit paths have been checked.
struct PlannedEntry<'a> {
    entry: &'a ManifestEntry,
    config: IngestConfig,
    point_clouds: Vec<PathBuf>,
}

fn plan_entry<'a>(
    entry: &'a ManifestEntry,
    run: &BatchRun,
) -> Result<PlannedEntry<'a>, IngestError> {
    let named = |source: ConfigError| IngestError::Entry {
        name: entry.name.clone(),
        source,
    };
    if !entry.folder.is_dir() {
        return Err(IngestError::InputNotFound(entry.folder.clone()));
    }
    let sensor = entry
        .sensor_id
        .as_deref()
        .map(|s| SensorSource::Named(s.to_owned()))
        .unwrap_or_default()
        .resolve(None)
        .map_err(named)?;
    let config = IngestConfig::new(
        &entry.region,
        sensor.as_str(),
        run.max_per_seq,
        run.output_dir.clone(),
    )
    .map_err(named)?
    .with_folder_date(entry.folder_date.clone());
    ensure_output_outside(&entry.folder, &run.output_dir)?;

    let mut point_clouds = Vec::new();
    for path in &entry.point_clouds {
        point_clouds.extend(collect_point_clouds(path)?);
    }
    Ok(PlannedEntry {
        entry,
        config,
        point_clouds,
    })
}

/// Process every manifest entry.
///
/// All entries are validated first, including their folders and point-cloud
/// paths. A pose CSV that fails to load only drops the pose data of its entry.
#[cfg_attr(feature = "tracing", tracing::instrument(level = "info", skip_all))]
pub fn run_batch(run: &BatchRun) -> Result<IngestSummary, IngestError> {
    run_batch_with(run, &ExifDecoder)
}

/// [`run_batch`] with a caller-supplied metadata decoder.
pub fn run_batch_with(
    run: &BatchRun,
    decoder: &dyn MetadataDecoder,
) -> Result<IngestSummary, IngestError> {
    let manifest = BatchManifest::load_json(&run.manifest)?;
    let plans = manifest
        .acquisitions
        .iter()
        .map(|entry| plan_entry(entry, run))
        .collect::<Result<Vec<_>, _>>()?;

    let mut summary = IngestSummary::default();
    for plan in &plans {
        let entry = plan.entry;
        info!("Processing {}...", entry.name);
        let poses = match &entry.pose_csv {
            Some(path) => load_pose_csv(path, run.pose_epoch).unwrap_or_else(|err| {
                warn!("Failed to read pose CSV {}: {err}", path.display());
                PoseLookup::new()
            }),
            None => PoseLookup::new(),
        };
        summary += ingest_folder(
            &entry.folder,
            &poses,
            &plan.config,
            &plan.point_clouds,
            decoder,
        )?;
    }
    Ok(summary)
}
