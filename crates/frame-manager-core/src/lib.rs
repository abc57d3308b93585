//! Core types and pipeline stages of the frame manager.
//!
//! This crate is purely in-memory. It fuses decoded image metadata with pose
//! records, groups the result into acquisitions, assigns sequences and frame
//! ids, and builds the payloads that the I/O layer writes. It does *not*
//! touch the filesystem; metadata decoding is behind [`MetadataDecoder`].

mod error;
mod fuse;
mod group;
mod logger;
mod metadata;
mod payload;
mod prune;
mod record;
mod sequence;
mod time;
mod token;

pub use error::ConfigError;
pub use fuse::{apply_pose_overrides, build_records, choose_acquisition_date, fuse_record};
pub use group::{acquisition_id, group_by_acquisition, AcquisitionGroup};
pub use metadata::{
    CameraInfo, DecodedMetadata, DerivedMetadata, GpsInfo, MetadataDecoder, NoMetadata,
};
pub use payload::{
    build_coordinate_systems, build_geojson_track, build_intrinsics, AnnotationPayload,
    CaptureInfo, CoordinateSystems, GeoFeature, Geometry, IntrinsicsDescriptor, PoseAnnotation,
    PositionReference, TrackCollection, TrackProperties, TrajectoryRow, TRAJECTORY_HEADER,
};
pub use prune::{prune_value, to_pruned_value};
pub use record::{FusedRecord, ImageEntry, PoseLookup, PoseRecord};
pub use sequence::{
    assign_sequences, compare_records, naming_key, AssignedFrame, SequenceSlot,
    DEFAULT_MAX_PER_SEQUENCE,
};
pub use time::{
    clean_text, date_code_from_system_time, date_code_of_timestamp, format_utc,
    is_valid_date_code, normalize_datetime, parse_date_code, seconds_to_utc, PoseEpoch,
};
pub use token::{date_from_folder_name, normalize_header_name, normalize_image_key, Token};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, level_from_verbosity};
