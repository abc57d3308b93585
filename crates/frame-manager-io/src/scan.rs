//! Recursive discovery of image and point-cloud files.

use std::path::{Path, PathBuf};

use frame_manager_core::ImageEntry;
use log::debug;
use walkdir::WalkDir;

pub(crate) const IMAGE_EXTENSIONS: [&str; 2] = ["jpg", "jpeg"];
pub(crate) const POINT_CLOUD_EXTENSIONS: [&str; 2] = ["las", "laz"];

/// Case-insensitive extension check.
pub(crate) fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|want| ext.eq_ignore_ascii_case(want)))
}

/// Every regular file under `folder` with one of `extensions`, sorted by path.
pub(crate) fn files_with_extension(folder: &Path, extensions: &[&str]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(folder)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!("skipping unreadable entry: {err}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && has_extension(entry.path(), extensions))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

/// Collect JPEG files with their modification time.
///
/// Files whose metadata cannot be read are skipped.
#[cfg_attr(feature = "tracing", tracing::instrument(level = "debug"))]
pub fn collect_image_entries(folder: &Path) -> Vec<ImageEntry> {
    files_with_extension(folder, &IMAGE_EXTENSIONS)
        .into_iter()
        .filter_map(|path| match path.metadata().and_then(|meta| meta.modified()) {
            Ok(mtime) => Some(ImageEntry { path, mtime }),
            Err(err) => {
                debug!("skipping {}: {err}", path.display());
                None
            }
        })
        .collect()
}

/// First JPEG under `folder`.
///
/// Each directory's own files are tried, by name, before its sub-directories.
pub fn find_first_image(folder: &Path) -> Option<PathBuf> {
    WalkDir::new(folder)
        .sort_by(|a, b| {
            b.file_type()
                .is_file()
                .cmp(&a.file_type().is_file())
                .then_with(|| a.file_name().cmp(b.file_name()))
        })
        .into_iter()
        .filter_map(Result::ok)
        .find(|entry| entry.file_type().is_file() && has_extension(entry.path(), &IMAGE_EXTENSIONS))
        .map(|entry| entry.into_path())
}
