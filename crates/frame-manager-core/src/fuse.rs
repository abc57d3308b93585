//! Merge embedded metadata with external pose records.
//!
//! Precedence: pose values replace embedded GPS values field by field, and a
//! parseable pose timestamp decides the acquisition date.

use std::path::Path;

use log::debug;

use crate::metadata::{DecodedMetadata, DerivedMetadata, GpsInfo, MetadataDecoder};
use crate::record::{FusedRecord, ImageEntry, PoseLookup, PoseRecord};
use crate::time::{date_code_from_system_time, date_code_of_timestamp, is_valid_date_code};
use crate::token::normalize_image_key;

/// Overlay pose values onto the embedded GPS sub-tree.
///
/// Heading/pitch/roll stay on the pose record; only the positional fields and
/// the timestamp are merged here.
pub fn apply_pose_overrides(derived: DerivedMetadata, pose: Option<&PoseRecord>) -> DerivedMetadata {
    let Some(pose) = pose else {
        return derived;
    };
    let mut derived = derived;
    let mut gps = derived.gps.take().unwrap_or_default();
    if let Some(lat) = pose.gps_latitude {
        gps.latitude_deg = Some(lat);
    }
    if let Some(lon) = pose.gps_longitude {
        gps.longitude_deg = Some(lon);
    }
    if let Some(alt) = pose.gps_altitude_m {
        gps.altitude_m = Some(alt);
    }
    if let Some(timestamp) = &pose.timestamp {
        gps.timestamp_utc = Some(timestamp.clone());
    }
    derived.gps = Some(gps).filter(|gps: &GpsInfo| !gps.is_empty());
    derived
}

/// Pick the acquisition date, letting a valid pose timestamp win.
///
/// A pose timestamp whose calendar part does not parse is ignored.
pub fn choose_acquisition_date(default_date: String, pose: Option<&PoseRecord>) -> String {
    pose.and_then(|pose| pose.timestamp.as_deref())
        .and_then(date_code_of_timestamp)
        .unwrap_or(default_date)
}

/// Fuse one image entry with its decoded metadata and optional pose.
///
/// Date resolution before the pose override: folder date, then the decoder's
/// candidate, then the file modification day in UTC.
pub fn fuse_record(
    entry: &ImageEntry,
    decoded: DecodedMetadata,
    folder_date: Option<&str>,
    pose: Option<&PoseRecord>,
) -> FusedRecord {
    let base_date = folder_date
        .filter(|date| is_valid_date_code(date))
        .map(str::to_owned)
        .or_else(|| decoded.date_candidate.filter(|date| is_valid_date_code(date)))
        .unwrap_or_else(|| date_code_from_system_time(entry.mtime));

    let derived = apply_pose_overrides(decoded.derived.pruned(), pose);
    let acquisition_date = choose_acquisition_date(base_date, pose);

    FusedRecord {
        src: entry.path.clone(),
        ext: extension_of(&entry.path),
        original_name: file_name_of(&entry.path),
        acquisition_date,
        derived,
        mtime: entry.mtime,
        pose: pose.cloned(),
    }
}

/// Decode and fuse every entry, in input order.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "info", skip_all, fields(images = entries.len()))
)]
pub fn build_records(
    entries: &[ImageEntry],
    poses: &PoseLookup,
    decoder: &dyn MetadataDecoder,
    folder_date: Option<&str>,
) -> Vec<FusedRecord> {
    entries
        .iter()
        .map(|entry| {
            let key = normalize_image_key(&file_name_of(&entry.path));
            let pose = poses.get(&key);
            if pose.is_none() && !poses.is_empty() {
                debug!("no pose row for {}", entry.path.display());
            }
            let decoded = decoder.decode(&entry.path);
            fuse_record(entry, decoded, folder_date, pose)
        })
        .collect()
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
