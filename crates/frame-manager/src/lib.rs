//! High-level facade crate for the `frame-manager-*` workspace.
//!
//! This crate provides:
//! - re-exports of the core pipeline (`frame_manager::core`) and the
//!   filesystem collaborators (`frame_manager::io`)
//! - the per-acquisition renderer and aggregate emitter
//! - end-to-end runs: single folder, batch planning and batch processing
//!
//! ## Quickstart
//!
//! ```no_run
//! use frame_manager::{run_single, InputSource, SensorSource, SingleRun};
//! use frame_manager::core::PoseEpoch;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let summary = run_single(&SingleRun {
//!     input_dir: "raw/flight_20240501".into(),
//!     region: "Nyon".into(),
//!     sensor: SensorSource::FromMetadata,
//!     max_per_seq: 2000,
//!     output_dir: "archive".into(),
//!     pose_csv: InputSource::Auto,
//!     pose_epoch: PoseEpoch::Gps,
//!     point_clouds: InputSource::Disabled,
//! })?;
//! println!("{} frames copied", summary.frames_copied);
//! # Ok(())
//! # }
//! ```
//!
//! ## Output layout
//!
//! ```text
//! {acquisition_id}/01_images/{sequence_id}/{naming_key}{ext}
//! {acquisition_id}/02_poses/coordinate_systems.json
//! {acquisition_id}/02_poses/{sequence_id}_trajectory.csv
//! {acquisition_id}/02_poses/{sequence_id}_trajectory.geojson
//! {acquisition_id}/03_calibration/intrinsics.json
//! {acquisition_id}/04_annotations/{sequence_id}/{naming_key}.json
//! {acquisition_id}/06_point_clouds/{acquisition_id}_{name}
//! ```

pub use frame_manager_core as core;
pub use frame_manager_io as io;

mod config;
mod emit;
mod ingest;
mod render;

pub use config::{IngestConfig, InputSource, SensorSource};
pub use emit::{AggregateEmitter, EmittedAggregates};
pub use ingest::{
    ensure_output_outside, ingest_records, process_acquisition, run_batch, run_batch_with,
    run_plan, run_single, run_single_with, BatchRun, IngestError, IngestSummary, SingleRun,
};
pub use render::{
    AcquisitionContext, OutputRenderer, SequenceRows, ANNOTATIONS_DIR, CALIBRATION_DIR,
    IMAGES_DIR, POSES_DIR,
};
