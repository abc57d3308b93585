//! Batch manifest: the editable plan consumed by batch runs.
//!
//! `plan_batch` fills in everything that can be discovered; the user sets
//! `region` (and optionally overrides `sensor_id`) before running the batch.

use std::fs;
use std::path::{Path, PathBuf};

use frame_manager_core::date_from_folder_name;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::discover::{find_acquisition_folders, AcquisitionCandidate};
use crate::error::FrameIoError;
use crate::exif_decoder::camera_model;
use crate::point_cloud::scan_point_clouds;
use crate::pose_csv::find_pose_csv;

/// One acquisition folder to process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub folder: PathBuf,
    pub name: String,
    /// Left empty by `plan`; must be filled before `batch`.
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub sensor_id: Option<String>,
    #[serde(default)]
    pub folder_date: Option<String>,
    #[serde(default)]
    pub pose_csv: Option<PathBuf>,
    #[serde(default)]
    pub point_clouds: Vec<PathBuf>,
}

impl ManifestEntry {
    /// Discover the collaborators of one candidate folder.
    pub fn from_candidate(candidate: &AcquisitionCandidate) -> Self {
        Self {
            folder: candidate.folder.clone(),
            name: candidate.name.clone(),
            region: String::new(),
            sensor_id: camera_model(&candidate.sample_image),
            folder_date: date_from_folder_name(&candidate.name),
            pose_csv: find_pose_csv(&candidate.folder),
            point_clouds: scan_point_clouds(&candidate.folder),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchManifest {
    pub root: PathBuf,
    pub acquisitions: Vec<ManifestEntry>,
}

impl BatchManifest {
    /// Load a manifest, rejecting one that lists nothing.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, FrameIoError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(FrameIoError::io(path))?;
        let manifest: Self = serde_json::from_str(&raw).map_err(|err| FrameIoError::Manifest {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        if manifest.acquisitions.is_empty() {
            return Err(FrameIoError::Manifest {
                path: path.to_path_buf(),
                reason: "no acquisitions listed".to_owned(),
            });
        }
        Ok(manifest)
    }

    /// Write this manifest to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), FrameIoError> {
        crate::write::write_json(path.as_ref(), self)
    }
}

/// Build a manifest for every acquisition folder under `root`.
#[cfg_attr(feature = "tracing", tracing::instrument(level = "info"))]
pub fn plan_batch(root: &Path) -> BatchManifest {
    let acquisitions: Vec<ManifestEntry> = find_acquisition_folders(root)
        .iter()
        .map(ManifestEntry::from_candidate)
        .collect();
    for entry in &acquisitions {
        if entry.sensor_id.is_none() {
            warn!("{}: no camera model found, set sensor_id by hand", entry.name);
        }
    }
    info!("planned {} acquisition folders under {}", acquisitions.len(), root.display());
    BatchManifest {
        root: root.to_path_buf(),
        acquisitions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_fills_discoverable_fields() {
        let dir = tempfile::tempdir().unwrap();
        let acq = dir.path().join("flight_20240501");
        fs::create_dir_all(acq.join("lidar")).unwrap();
        fs::write(acq.join("IMG_1.jpg"), b"x").unwrap();
        fs::write(acq.join("lidar/cloud.LAZ"), b"x").unwrap();
        fs::write(acq.join("poses.csv"), "file_name,lat,lon\nIMG_1.jpg,1,2\n").unwrap();

        let manifest = plan_batch(dir.path());
        assert_eq!(manifest.acquisitions.len(), 1);
        let entry = &manifest.acquisitions[0];
        assert_eq!(entry.name, "flight_20240501");
        assert_eq!(entry.folder_date.as_deref(), Some("20240501"));
        assert!(entry.pose_csv.as_ref().unwrap().ends_with("poses.csv"));
        assert_eq!(entry.point_clouds.len(), 1);
        assert!(entry.region.is_empty());
        assert_eq!(entry.sensor_id, None);
    }

    #[test]
    fn manifest_survives_disk_and_rejects_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.json");
        let manifest = BatchManifest {
            root: dir.path().to_path_buf(),
            acquisitions: vec![ManifestEntry {
                folder: dir.path().join("a"),
                name: "a".into(),
                region: "Nyon".into(),
                sensor_id: Some("Cam".into()),
                folder_date: None,
                pose_csv: None,
                point_clouds: Vec::new(),
            }],
        };
        manifest.write_json(&path).unwrap();
        assert_eq!(BatchManifest::load_json(&path).unwrap(), manifest);

        fs::write(&path, r#"{"root": ".", "acquisitions": []}"#).unwrap();
        assert!(matches!(
            BatchManifest::load_json(&path),
            Err(FrameIoError::Manifest { .. })
        ));
    }
}
