use std::io;
use std::path::{Path, PathBuf};

/// Errors raised while reading inputs or writing the archive.
#[derive(thiserror::Error, Debug)]
pub enum FrameIoError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("{}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("pose CSV {} is missing headers", .0.display())]
    MissingHeaders(PathBuf),
    #[error("pose CSV {} is missing a file_name column", .0.display())]
    MissingFileNameColumn(PathBuf),
    #[error("point cloud path not found: {}", .0.display())]
    PointCloudNotFound(PathBuf),
    #[error("no point cloud files (.las/.laz) found in {}", .0.display())]
    NoPointClouds(PathBuf),
    #[error("manifest {}: {reason}", path.display())]
    Manifest { path: PathBuf, reason: String },
}

impl FrameIoError {
    pub(crate) fn io(path: &Path) -> impl FnOnce(io::Error) -> FrameIoError + '_ {
        move |source| FrameIoError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn csv(path: &Path) -> impl FnOnce(csv::Error) -> FrameIoError + '_ {
        move |source| FrameIoError::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}
