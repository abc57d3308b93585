//! Per-frame rendering: image copy, annotation JSON, trajectory row.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use frame_manager_core::{naming_key, AnnotationPayload, AssignedFrame, Token, TrajectoryRow};
use frame_manager_io::{copy_preserving, ensure_dir, write_json, FrameIoError};
use log::info;

pub const IMAGES_DIR: &str = "01_images";
pub const POSES_DIR: &str = "02_poses";
pub const CALIBRATION_DIR: &str = "03_calibration";
pub const ANNOTATIONS_DIR: &str = "04_annotations";

/// Trajectory rows collected for one sequence.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SequenceRows {
    pub sequence_id: String,
    pub rows: Vec<TrajectoryRow>,
    /// Some row carries timing, position or attitude.
    pub has_pose_data: bool,
}

/// Mutable state of one acquisition while it is rendered and emitted.
#[derive(Debug)]
pub struct AcquisitionContext {
    acquisition_id: String,
    root: PathBuf,
    created_sequences: HashSet<String>,
    sequences: Vec<SequenceRows>,
    current_count: usize,
    frames_copied: usize,
}

impl AcquisitionContext {
    pub fn new(output_dir: &Path, acquisition_id: String) -> Self {
        Self {
            root: output_dir.join(&acquisition_id),
            acquisition_id,
            created_sequences: HashSet::new(),
            sequences: Vec::new(),
            current_count: 0,
            frames_copied: 0,
        }
    }

    pub fn acquisition_id(&self) -> &str {
        &self.acquisition_id
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Sequences in assignment order.
    pub fn sequences(&self) -> &[SequenceRows] {
        &self.sequences
    }

    pub fn frames_copied(&self) -> usize {
        self.frames_copied
    }

    /// Create the acquisition's top-level directories.
    pub fn prepare(&self) -> Result<(), FrameIoError> {
        for name in [IMAGES_DIR, CALIBRATION_DIR, ANNOTATIONS_DIR, POSES_DIR] {
            ensure_dir(&self.dir(name))?;
        }
        Ok(())
    }

    /// Per-sequence image and annotation directories, created on first use.
    fn sequence_dirs(&mut self, sequence_id: &str) -> Result<(PathBuf, PathBuf), FrameIoError> {
        let images = self.dir(IMAGES_DIR).join(sequence_id);
        let annotations = self.dir(ANNOTATIONS_DIR).join(sequence_id);
        if !self.created_sequences.contains(sequence_id) {
            ensure_dir(&images)?;
            ensure_dir(&annotations)?;
            self.created_sequences.insert(sequence_id.to_owned());
        }
        Ok((images, annotations))
    }

    /// Open a new sequence bucket when `sequence_id` changes, logging the one
    /// that just finished.
    fn enter_sequence(&mut self, sequence_id: &str) {
        let same = self
            .sequences
            .last()
            .is_some_and(|seq| seq.sequence_id == sequence_id);
        if same {
            return;
        }
        self.log_sequence_done();
        self.current_count = 0;
        self.sequences.push(SequenceRows {
            sequence_id: sequence_id.to_owned(),
            ..SequenceRows::default()
        });
    }

    fn log_sequence_done(&self) {
        if let Some(last) = self.sequences.last() {
            info!(
                "Sequence {} done ({} images).",
                last.sequence_id, self.current_count
            );
        }
    }

    fn push_row(&mut self, row: TrajectoryRow) {
        if let Some(seq) = self.sequences.last_mut() {
            seq.has_pose_data |= row.has_pose_data();
            seq.rows.push(row);
        }
        self.current_count += 1;
    }
}

/// Writes the per-frame outputs of an acquisition.
#[derive(Clone, Copy, Debug)]
pub struct OutputRenderer<'a> {
    sensor_id: &'a Token,
}

impl<'a> OutputRenderer<'a> {
    pub fn new(sensor_id: &'a Token) -> Self {
        Self { sensor_id }
    }

    /// Render one frame. Frames must arrive in assignment order.
    pub fn render_frame(
        &self,
        ctx: &mut AcquisitionContext,
        frame: &AssignedFrame,
    ) -> Result<(), FrameIoError> {
        let sequence_id = frame.slot.sequence_id.as_str();
        ctx.enter_sequence(sequence_id);
        let (image_dir, annotation_dir) = ctx.sequence_dirs(sequence_id)?;

        let key = naming_key(ctx.acquisition_id(), &frame.slot, self.sensor_id);
        let image_name = format!("{key}{}", frame.record.ext);
        if copy_preserving(&frame.record.src, &image_dir.join(&image_name))? {
            ctx.frames_copied += 1;
        }

        let annotation = AnnotationPayload::new(frame, ctx.acquisition_id(), self.sensor_id);
        write_json(&annotation_dir.join(format!("{key}.json")), &annotation.to_value()?)?;

        ctx.push_row(TrajectoryRow::new(
            &frame.record,
            frame.slot.frame_index,
            image_name,
        ));
        Ok(())
    }

    /// Render every frame and log the closing progress line.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            level = "info",
            skip_all,
            fields(acquisition = ctx.acquisition_id(), frames = frames.len())
        )
    )]
    pub fn render_all(
        &self,
        ctx: &mut AcquisitionContext,
        frames: &[AssignedFrame],
    ) -> Result<(), FrameIoError> {
        for frame in frames {
            self.render_frame(ctx, frame)?;
        }
        ctx.log_sequence_done();
        Ok(())
    }
}
