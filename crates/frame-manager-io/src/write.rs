//! Archive writers: directories, file copies, JSON and trajectory tables.

use std::fs::{self, File, FileTimes};
use std::path::Path;

use csv::WriterBuilder;
use frame_manager_core::{TrajectoryRow, TRAJECTORY_HEADER};
use log::debug;
use serde::Serialize;

use crate::error::FrameIoError;

/// Create `path` and its parents. Existing directories are fine.
pub fn ensure_dir(path: &Path) -> Result<(), FrameIoError> {
    fs::create_dir_all(path).map_err(FrameIoError::io(path))
}

fn ensure_parent(path: &Path) -> Result<(), FrameIoError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

/// Whether `a` and `b` name the same file.
pub fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => match (std::path::absolute(a), std::path::absolute(b)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        },
    }
}

/// Copy `src` to `dst`, carrying access and modification times over.
///
/// Returns `false` without touching anything when both paths name the same
/// file. Timestamp preservation is best effort.
pub fn copy_preserving(src: &Path, dst: &Path) -> Result<bool, FrameIoError> {
    if same_file(src, dst) {
        debug!("skipping self-copy of {}", src.display());
        return Ok(false);
    }
    ensure_parent(dst)?;
    fs::copy(src, dst).map_err(FrameIoError::io(dst))?;

    if let Err(err) = copy_times(src, dst) {
        debug!("could not preserve times on {}: {err}", dst.display());
    }
    Ok(true)
}

fn copy_times(src: &Path, dst: &Path) -> std::io::Result<()> {
    let meta = fs::metadata(src)?;
    let mut times = FileTimes::new().set_modified(meta.modified()?);
    if let Ok(accessed) = meta.accessed() {
        times = times.set_accessed(accessed);
    }
    File::options().write(true).open(dst)?.set_times(times)
}

/// Write `payload` as 2-space indented UTF-8 JSON.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, payload: &T) -> Result<(), FrameIoError> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(payload)?;
    fs::write(path, json).map_err(FrameIoError::io(path))
}

/// Write a trajectory table with the fixed header; missing values are empty.
pub fn write_trajectory_csv(path: &Path, rows: &[TrajectoryRow]) -> Result<(), FrameIoError> {
    ensure_parent(path)?;
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(FrameIoError::csv(path))?;
    writer
        .write_record(TRAJECTORY_HEADER)
        .map_err(FrameIoError::csv(path))?;
    for row in rows {
        writer.serialize(row).map_err(FrameIoError::csv(path))?;
    }
    writer.flush().map_err(FrameIoError::io(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    #[test]
    fn copy_keeps_modification_time() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.jpg");
        fs::write(&src, b"pixels").unwrap();
        let mtime = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        File::options()
            .write(true)
            .open(&src)
            .unwrap()
            .set_modified(mtime)
            .unwrap();

        let dst = dir.path().join("nested/dst.jpg");
        assert!(copy_preserving(&src, &dst).unwrap());
        assert_eq!(fs::read(&dst).unwrap(), b"pixels");
        assert_eq!(fs::metadata(&dst).unwrap().modified().unwrap(), mtime);
    }

    #[test]
    fn self_copy_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.las");
        fs::write(&src, b"points").unwrap();
        let alias = dir.path().join(".").join("a.las");
        assert!(!copy_preserving(&src, &alias).unwrap());
        assert_eq!(fs::read(&src).unwrap(), b"points");
    }

    #[test]
    fn json_is_pretty_and_keeps_unicode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/a.json");
        write_json(&path, &serde_json::json!({ "name": "Genève" })).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "{\n  \"name\": \"Genève\"\n}"
        );
    }

    #[test]
    fn trajectory_csv_has_fixed_header_and_blank_missing_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("S001_trajectory.csv");
        let rows = [TrajectoryRow {
            frame_index: 1,
            image_name: "a_S001_cam_000001.jpg".into(),
            timestamp: Some("2024-05-01T10:00:00Z".into()),
            gps_latitude: Some(46.5),
            gps_longitude: Some(6.25),
            gps_altitude_m: None,
            heading_deg: None,
            pitch_deg: None,
            roll_deg: Some(-1.5),
        }];
        write_trajectory_csv(&path, &rows).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines[0],
            "frame_index,image_name,timestamp,gps_latitude,gps_longitude,gps_altitude_m,heading_deg,pitch_deg,roll_deg"
        );
        assert_eq!(
            lines[1],
            "1,a_S001_cam_000001.jpg,2024-05-01T10:00:00Z,46.5,6.25,,,,-1.5"
        );
    }
}
