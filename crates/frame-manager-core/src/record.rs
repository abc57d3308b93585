use std::collections::HashMap;
use std::path::PathBuf;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::metadata::DerivedMetadata;

/// One discovered image file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageEntry {
    pub path: PathBuf,
    pub mtime: SystemTime,
}

/// External pose data for one image, as read from a pose CSV.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseRecord {
    /// File name exactly as written in the pose file.
    pub file_name: String,
    pub gps_seconds: Option<f64>,
    /// ISO-8601 UTC timestamp derived from `gps_seconds`.
    pub timestamp: Option<String>,
    pub gps_latitude: Option<f64>,
    pub gps_longitude: Option<f64>,
    pub gps_altitude_m: Option<f64>,
    pub heading_deg: Option<f64>,
    pub pitch_deg: Option<f64>,
    pub roll_deg: Option<f64>,
}

/// Pose records keyed by [`normalize_image_key`](crate::normalize_image_key).
pub type PoseLookup = HashMap<String, PoseRecord>;

/// An image with its embedded metadata merged with its pose record.
#[derive(Clone, Debug, PartialEq)]
pub struct FusedRecord {
    pub src: PathBuf,
    /// Lower-cased extension including the dot, or empty.
    pub ext: String,
    pub original_name: String,
    /// `YYYYMMDD`.
    pub acquisition_date: String,
    pub derived: DerivedMetadata,
    pub mtime: SystemTime,
    pub pose: Option<PoseRecord>,
}

impl FusedRecord {
    /// Epoch seconds of the attached pose, the primary sort key.
    pub fn pose_seconds(&self) -> Option<f64> {
        self.pose.as_ref()?.gps_seconds
    }
}
