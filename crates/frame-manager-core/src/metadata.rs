//! Derived embedded-metadata tree and the decoder seam that produces it.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// GPS facts recovered for one image.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GpsInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude_deg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude_deg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude_m: Option<f64>,
    /// `above_sea_level` or `below_sea_level`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_utc: Option<String>,
}

impl GpsInfo {
    pub fn is_empty(&self) -> bool {
        self.latitude_deg.is_none()
            && self.longitude_deg.is_none()
            && self.altitude_m.is_none()
            && self.altitude_ref.is_none()
            && self.timestamp_utc.is_none()
    }

    /// Both horizontal coordinates are known.
    pub fn has_position(&self) -> bool {
        self.latitude_deg.is_some() && self.longitude_deg.is_some()
    }
}

/// Camera hardware facts.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub software: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focal_length_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focal_length_35mm: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f_number: Option<f64>,
}

impl CameraInfo {
    pub fn is_empty(&self) -> bool {
        self.make.is_none()
            && self.model.is_none()
            && self.serial_number.is_none()
            && self.software.is_none()
            && self.focal_length_mm.is_none()
            && self.focal_length_35mm.is_none()
            && self.f_number.is_none()
    }
}

/// Metadata derived from the embedded tags of one image.
///
/// Sub-trees are `None` when nothing was recovered for them; use
/// [`DerivedMetadata::pruned`] after mutating to keep that invariant.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime_original: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps: Option<GpsInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<CameraInfo>,
}

impl DerivedMetadata {
    /// Collapse empty sub-trees to `None`.
    pub fn pruned(mut self) -> Self {
        self.gps = self.gps.filter(|gps| !gps.is_empty());
        self.camera = self.camera.filter(|camera| !camera.is_empty());
        self
    }

    pub fn gps_timestamp(&self) -> Option<&str> {
        self.gps.as_ref()?.timestamp_utc.as_deref()
    }
}

/// Decoder output for one image.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecodedMetadata {
    /// `YYYYMMDD` implied by the embedded tags, if any.
    pub date_candidate: Option<String>,
    pub derived: DerivedMetadata,
}

/// Source of embedded metadata for an image file.
///
/// Implementations never fail: anything unreadable degrades to
/// `DecodedMetadata::default()`.
pub trait MetadataDecoder {
    fn decode(&self, path: &Path) -> DecodedMetadata;
}

/// Decoder that recovers nothing. Useful when only pose files carry positions.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoMetadata;

impl MetadataDecoder for NoMetadata {
    fn decode(&self, _path: &Path) -> DecodedMetadata {
        DecodedMetadata::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_subtrees_collapse() {
        let meta = DerivedMetadata {
            datetime_original: None,
            gps: Some(GpsInfo::default()),
            camera: Some(CameraInfo {
                model: Some("X100".into()),
                ..CameraInfo::default()
            }),
        }
        .pruned();
        assert!(meta.gps.is_none());
        assert_eq!(meta.camera.unwrap().model.as_deref(), Some("X100"));
    }
}
