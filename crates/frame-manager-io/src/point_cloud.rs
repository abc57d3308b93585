//! LiDAR point-cloud (`.las`/`.laz`) discovery and copying.

use std::path::{Path, PathBuf};

use log::info;

use crate::error::FrameIoError;
use crate::scan::{files_with_extension, POINT_CLOUD_EXTENSIONS};
use crate::write::{copy_preserving, ensure_dir};

/// Output sub-directory for point clouds.
pub const POINT_CLOUD_DIR: &str = "06_point_clouds";

/// Point-cloud files under `folder`, sorted.
pub fn scan_point_clouds(folder: &Path) -> Vec<PathBuf> {
    files_with_extension(folder, &POINT_CLOUD_EXTENSIONS)
        .into_iter()
        .map(|path| std::path::absolute(&path).unwrap_or(path))
        .collect()
}

/// Resolve an explicit point-cloud argument.
///
/// A file is used as is; a directory must hold at least one point cloud.
pub fn collect_point_clouds(path: &Path) -> Result<Vec<PathBuf>, FrameIoError> {
    if path.is_dir() {
        let files = scan_point_clouds(path);
        if files.is_empty() {
            return Err(FrameIoError::NoPointClouds(path.to_path_buf()));
        }
        Ok(files)
    } else if path.is_file() {
        Ok(vec![std::path::absolute(path).map_err(FrameIoError::io(path))?])
    } else {
        Err(FrameIoError::PointCloudNotFound(path.to_path_buf()))
    }
}

/// Destination name inside an acquisition: prefixed with the acquisition id
/// unless it already is (case-insensitive).
pub fn point_cloud_file_name(acquisition_id: &str, original: &str) -> String {
    let prefix = format!("{acquisition_id}_").to_lowercase();
    if original.to_lowercase().starts_with(&prefix) {
        original.to_owned()
    } else {
        format!("{acquisition_id}_{original}")
    }
}

/// Copy `files` into `{acquisition_root}/06_point_clouds`; returns how many
/// were copied.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "info", skip(files), fields(files = files.len()))
)]
pub fn copy_point_clouds(
    acquisition_root: &Path,
    acquisition_id: &str,
    files: &[PathBuf],
) -> Result<usize, FrameIoError> {
    if files.is_empty() {
        return Ok(0);
    }
    info!("Copying point clouds for {acquisition_id}...");
    let target_dir = acquisition_root.join(POINT_CLOUD_DIR);
    ensure_dir(&target_dir)?;
    let mut copied = 0;
    for src in files {
        let Some(name) = src.file_name() else {
            continue;
        };
        let dest = target_dir.join(point_cloud_file_name(acquisition_id, &name.to_string_lossy()));
        if copy_preserving(src, &dest)? {
            copied += 1;
        }
    }
    info!("Point cloud copy complete for {acquisition_id} ({copied} files).");
    Ok(copied)
}
