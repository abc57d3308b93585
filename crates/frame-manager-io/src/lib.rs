//! Filesystem side of the frame manager.
//!
//! Everything that reads the capture folder or writes the archive lives
//! here: image scanning, pose CSV loading, EXIF decoding, point clouds,
//! acquisition discovery, the batch manifest, and the JSON/CSV writers.

mod discover;
mod error;
mod exif_decoder;
mod manifest;
mod point_cloud;
mod pose_csv;
mod scan;
mod write;

pub use discover::{find_acquisition_folders, AcquisitionCandidate};
pub use error::FrameIoError;
pub use exif_decoder::{camera_model, ExifDecoder};
pub use manifest::{plan_batch, BatchManifest, ManifestEntry};
pub use point_cloud::{
    collect_point_clouds, copy_point_clouds, point_cloud_file_name, scan_point_clouds,
    POINT_CLOUD_DIR,
};
pub use pose_csv::{
    csv_has_pose_headers, find_pose_csv, load_pose_csv, parse_float, sniff_delimiter, ColumnMap,
    PoseField, POSE_FIELD_ALIASES,
};
pub use scan::{collect_image_entries, find_first_image};
pub use write::{copy_preserving, ensure_dir, same_file, write_json, write_trajectory_csv};
