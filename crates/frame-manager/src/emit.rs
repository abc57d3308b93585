//! Per-acquisition descriptors and per-sequence trajectory aggregates.

use frame_manager_core::{
    build_coordinate_systems, build_geojson_track, build_intrinsics, to_pruned_value,
    AssignedFrame, Token,
};
use frame_manager_io::{write_json, write_trajectory_csv, FrameIoError};
use log::debug;

use crate::render::{AcquisitionContext, CALIBRATION_DIR, POSES_DIR};

/// What an emitter wrote for one acquisition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmittedAggregates {
    pub coordinate_systems: bool,
    pub intrinsics: bool,
    pub trajectories: usize,
    pub tracks: usize,
}

#[derive(Clone, Copy, Debug)]
pub struct AggregateEmitter<'a> {
    sensor_id: &'a Token,
}

impl<'a> AggregateEmitter<'a> {
    pub fn new(sensor_id: &'a Token) -> Self {
        Self { sensor_id }
    }

    /// Coordinate-system and intrinsics descriptors, from the first frame in
    /// assignment order that qualifies for each.
    pub fn emit_descriptors(
        &self,
        ctx: &AcquisitionContext,
        frames: &[AssignedFrame],
        emitted: &mut EmittedAggregates,
    ) -> Result<(), FrameIoError> {
        let records = || frames.iter().map(|frame| &frame.record);

        if let Some(systems) = build_coordinate_systems(records()) {
            write_json(
                &ctx.dir(POSES_DIR).join("coordinate_systems.json"),
                &systems,
            )?;
            emitted.coordinate_systems = true;
        }
        if let Some(intrinsics) = build_intrinsics(records(), self.sensor_id) {
            write_json(
                &ctx.dir(CALIBRATION_DIR).join("intrinsics.json"),
                &to_pruned_value(&intrinsics)?,
            )?;
            emitted.intrinsics = true;
        }
        Ok(())
    }

    /// Trajectory CSV for every sequence with pose data, plus a GeoJSON track
    /// when at least two rows are positioned.
    pub fn emit_sequences(
        &self,
        ctx: &AcquisitionContext,
        emitted: &mut EmittedAggregates,
    ) -> Result<(), FrameIoError> {
        let poses_dir = ctx.dir(POSES_DIR);
        for sequence in ctx.sequences() {
            if !sequence.has_pose_data {
                debug!("{}: no pose data, no trajectory", sequence.sequence_id);
                continue;
            }
            write_trajectory_csv(
                &poses_dir.join(format!("{}_trajectory.csv", sequence.sequence_id)),
                &sequence.rows,
            )?;
            emitted.trajectories += 1;

            if let Some(track) = build_geojson_track(
                &sequence.rows,
                ctx.acquisition_id(),
                &sequence.sequence_id,
                self.sensor_id,
            ) {
                write_json(
                    &poses_dir.join(format!("{}_trajectory.geojson", sequence.sequence_id)),
                    &track,
                )?;
                emitted.tracks += 1;
            }
        }
        Ok(())
    }
}
