//! Pose/trajectory CSV loading.
//!
//! Pose files come from many exporters, so the delimiter is sniffed from the
//! header line and columns are resolved through an alias table. Header names
//! are compared lower-cased with everything outside `[a-z0-9]` removed, so
//! `Latitude[deg]` and `latitude_deg` both resolve.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use csv::{ReaderBuilder, StringRecord};
use frame_manager_core::{
    normalize_header_name, normalize_image_key, seconds_to_utc, PoseEpoch, PoseLookup, PoseRecord,
};
use log::{debug, info};
use regex::Regex;
use walkdir::WalkDir;

use crate::error::FrameIoError;
use crate::scan::has_extension;

const CANDIDATE_DELIMITERS: [u8; 3] = [b',', b'\t', b';'];

static TRAJECTORY_OUTPUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^s\d{3}_trajectory\.csv$").expect("static regex"));

/// Canonical pose columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PoseField {
    FileName,
    GpsSeconds,
    Latitude,
    Longitude,
    Altitude,
    Roll,
    Pitch,
    Heading,
}

/// Accepted spellings per column, most specific first.
pub const POSE_FIELD_ALIASES: [(PoseField, &[&str]); 8] = [
    (
        PoseField::FileName,
        &["file_name", "filename", "image_name", "imagename"],
    ),
    (
        PoseField::GpsSeconds,
        &["gps_seconds[s]", "gps_seconds", "gps_time", "gpstime"],
    ),
    (PoseField::Latitude, &["latitude[deg]", "latitude", "lat"]),
    (
        PoseField::Longitude,
        &["longitude[deg]", "longitude", "lon", "lng"],
    ),
    (
        PoseField::Altitude,
        &[
            "altitude_ellipsoidal[m]",
            "altitude_ellipsoidal",
            "altitude",
            "altitude_m",
            "alt",
        ],
    ),
    (PoseField::Roll, &["roll[deg]", "roll"]),
    (PoseField::Pitch, &["pitch[deg]", "pitch"]),
    (
        PoseField::Heading,
        &["heading[deg]", "heading", "yaw", "azimuth"],
    ),
];

/// Column index per resolved field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnMap(HashMap<PoseField, usize>);

impl ColumnMap {
    /// Resolve header names against [`POSE_FIELD_ALIASES`]. The first alias
    /// present wins.
    pub fn resolve<'a, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let normalized: HashMap<String, usize> = headers
            .into_iter()
            .enumerate()
            .filter(|(_, name)| !name.is_empty())
            .map(|(idx, name)| (normalize_header_name(name), idx))
            .collect();
        let mut columns = HashMap::new();
        for (field, aliases) in POSE_FIELD_ALIASES {
            if let Some(idx) = aliases
                .iter()
                .find_map(|alias| normalized.get(&normalize_header_name(alias)))
            {
                columns.insert(field, *idx);
            }
        }
        Self(columns)
    }

    pub fn get(&self, field: PoseField) -> Option<usize> {
        self.0.get(&field).copied()
    }

    pub fn has_file_name(&self) -> bool {
        self.0.contains_key(&PoseField::FileName)
    }

    fn float(&self, row: &StringRecord, field: PoseField) -> Option<f64> {
        parse_float(row.get(self.get(field)?)?)
    }
}

/// Parse a number, accepting a decimal comma. Blank or non-finite values are `None`.
pub fn parse_float(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Pick the delimiter from the header line.
///
/// The most frequent candidate wins. Without any candidate in the header the
/// sample decides: tab if it contains one, comma otherwise.
pub fn sniff_delimiter(sample: &str) -> u8 {
    let header = sample.lines().next().unwrap_or_default();
    let best = CANDIDATE_DELIMITERS
        .iter()
        .map(|&delim| (delim, header.bytes().filter(|&b| b == delim).count()))
        .filter(|&(_, count)| count > 0)
        .fold(None, |best: Option<(u8, usize)>, candidate| match best {
            Some(current) if current.1 >= candidate.1 => Some(current),
            _ => Some(candidate),
        });
    match best {
        Some((delim, _)) => delim,
        None if sample.contains('\t') => b'\t',
        None => b',',
    }
}

fn read_text(path: &Path) -> Result<String, FrameIoError> {
    let raw = fs::read(path).map_err(FrameIoError::io(path))?;
    let text = String::from_utf8_lossy(&raw);
    Ok(text.strip_prefix('\u{feff}').unwrap_or(&*text).to_owned())
}

fn reader_for(text: &str) -> csv::Reader<&[u8]> {
    ReaderBuilder::new()
        .delimiter(sniff_delimiter(text))
        .flexible(true)
        .has_headers(true)
        .from_reader(text.as_bytes())
}

/// Load a pose CSV keyed by normalized image name.
///
/// Rows with a blank file name are skipped; a later row for the same image
/// replaces an earlier one.
#[cfg_attr(feature = "tracing", tracing::instrument(level = "info", skip(epoch)))]
pub fn load_pose_csv(path: &Path, epoch: PoseEpoch) -> Result<PoseLookup, FrameIoError> {
    let text = read_text(path)?;
    let mut reader = reader_for(&text);
    let headers = reader.headers().map_err(FrameIoError::csv(path))?.clone();
    if headers.iter().all(|name| name.trim().is_empty()) {
        return Err(FrameIoError::MissingHeaders(path.to_path_buf()));
    }
    let columns = ColumnMap::resolve(headers.iter());
    let Some(name_idx) = columns.get(PoseField::FileName) else {
        return Err(FrameIoError::MissingFileNameColumn(path.to_path_buf()));
    };

    let mut poses = PoseLookup::new();
    for row in reader.records() {
        let row = row.map_err(FrameIoError::csv(path))?;
        let file_name = row.get(name_idx).unwrap_or_default().trim();
        if file_name.is_empty() {
            continue;
        }
        let gps_seconds = columns.float(&row, PoseField::GpsSeconds);
        let pose = PoseRecord {
            file_name: file_name.to_owned(),
            gps_seconds,
            timestamp: gps_seconds.and_then(|seconds| seconds_to_utc(seconds, epoch)),
            gps_latitude: columns.float(&row, PoseField::Latitude),
            gps_longitude: columns.float(&row, PoseField::Longitude),
            gps_altitude_m: columns.float(&row, PoseField::Altitude),
            heading_deg: columns.float(&row, PoseField::Heading),
            pitch_deg: columns.float(&row, PoseField::Pitch),
            roll_deg: columns.float(&row, PoseField::Roll),
        };
        poses.insert(normalize_image_key(file_name), pose);
    }
    info!("loaded {} pose rows from {}", poses.len(), path.display());
    Ok(poses)
}

/// Whether the header of `path` resolves a file-name column.
///
/// Unreadable files are not pose files.
pub fn csv_has_pose_headers(path: &Path) -> bool {
    let Ok(text) = read_text(path) else {
        return false;
    };
    let mut reader = reader_for(&text);
    match reader.headers() {
        Ok(headers) => ColumnMap::resolve(headers.iter()).has_file_name(),
        Err(_) => false,
    }
}

/// Locate the shallowest pose CSV under `folder`.
///
/// Trajectory tables written by this tool (`S001_trajectory.csv`, ...) are
/// ignored. Candidates are tried by depth, then by lower-cased path.
pub fn find_pose_csv(folder: &Path) -> Option<PathBuf> {
    let mut candidates: Vec<(usize, String, PathBuf)> = WalkDir::new(folder)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && has_extension(entry.path(), &["csv"]))
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy().to_lowercase();
            !TRAJECTORY_OUTPUT.is_match(&name)
        })
        .map(|entry| {
            let sort_key = entry.path().to_string_lossy().to_lowercase();
            (entry.depth(), sort_key, entry.into_path())
        })
        .collect();
    candidates.sort();
    let found = candidates
        .into_iter()
        .map(|(_, _, path)| path)
        .find(|path| csv_has_pose_headers(path))?;
    debug!("auto-located pose CSV {}", found.display());
    Some(std::path::absolute(&found).unwrap_or(found))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn aliases_resolve_first_match() {
        let columns = ColumnMap::resolve(["Image Name", "Lat", "Latitude[deg]", "Yaw"]);
        assert_eq!(columns.get(PoseField::FileName), Some(0));
        assert_eq!(columns.get(PoseField::Latitude), Some(2));
        assert_eq!(columns.get(PoseField::Heading), Some(3));
        assert_eq!(columns.get(PoseField::Longitude), None);
    }

    #[test]
    fn sniffing_prefers_the_header_delimiter() {
        assert_eq!(sniff_delimiter("a;b;c\n1,5;2;3"), b';');
        assert_eq!(sniff_delimiter("a\tb\n1\t2"), b'\t');
        assert_eq!(sniff_delimiter("a,b\n"), b',');
        assert_eq!(sniff_delimiter("single\nx\ty"), b'\t');
        assert_eq!(sniff_delimiter("single\n"), b',');
    }

    #[test]
    fn floats_accept_decimal_comma() {
        assert_relative_eq!(parse_float(" 46,5 ").unwrap(), 46.5);
        assert_relative_eq!(parse_float("-6.25").unwrap(), -6.25);
        assert_eq!(parse_float(""), None);
        assert_eq!(parse_float("abc"), None);
        assert_eq!(parse_float("nan"), None);
    }

    #[test]
    fn trajectory_outputs_are_recognized() {
        assert!(TRAJECTORY_OUTPUT.is_match("s001_trajectory.csv"));
        assert!(!TRAJECTORY_OUTPUT.is_match("poses.csv"));
        assert!(!TRAJECTORY_OUTPUT.is_match("s01_trajectory.csv"));
    }
}
