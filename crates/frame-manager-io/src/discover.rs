//! Acquisition-folder discovery for batch runs.

use std::fs;
use std::path::{Path, PathBuf};

use log::warn;

use crate::scan::find_first_image;

/// A folder that holds at least one JPEG.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcquisitionCandidate {
    pub folder: PathBuf,
    pub name: String,
    pub sample_image: PathBuf,
}

impl AcquisitionCandidate {
    fn probe(folder: PathBuf) -> Option<Self> {
        let sample_image = find_first_image(&folder)?;
        let name = folder
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| folder.to_string_lossy().into_owned());
        Some(Self {
            folder,
            name,
            sample_image,
        })
    }
}

/// Immediate sub-directories of `root` that contain images, by name.
///
/// When none qualifies, `root` itself is the only candidate (if it holds
/// images).
pub fn find_acquisition_folders(root: &Path) -> Vec<AcquisitionCandidate> {
    let mut subdirs: Vec<PathBuf> = match fs::read_dir(root) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect(),
        Err(err) => {
            warn!("cannot list {}: {err}", root.display());
            return Vec::new();
        }
    };
    subdirs.sort();

    let candidates: Vec<_> = subdirs
        .into_iter()
        .filter_map(AcquisitionCandidate::probe)
        .collect();
    if !candidates.is_empty() {
        return candidates;
    }
    let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
    AcquisitionCandidate::probe(root).into_iter().collect()
}
