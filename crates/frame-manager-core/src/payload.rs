//! JSON and CSV payloads emitted per frame, per sequence and per acquisition.
//!
//! Every struct here keeps absent values as `None`; JSON payloads go through
//! [`to_pruned_value`] before they reach disk.

use serde::Serialize;
use serde_json::Value;

use crate::metadata::GpsInfo;
use crate::prune::to_pruned_value;
use crate::record::FusedRecord;
use crate::sequence::AssignedFrame;
use crate::token::Token;

/// Column order of the trajectory CSV.
pub const TRAJECTORY_HEADER: [&str; 9] = [
    "frame_index",
    "image_name",
    "timestamp",
    "gps_latitude",
    "gps_longitude",
    "gps_altitude_m",
    "heading_deg",
    "pitch_deg",
    "roll_deg",
];

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CaptureInfo {
    pub datetime_original: Option<String>,
    pub gps_timestamp_utc: Option<String>,
}

/// Pose values as they appear in an annotation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PoseAnnotation {
    pub source: &'static str,
    pub timestamp: Option<String>,
    pub gps_seconds: Option<f64>,
    pub gps_latitude: Option<f64>,
    pub gps_longitude: Option<f64>,
    pub gps_altitude_m: Option<f64>,
    pub heading_deg: Option<f64>,
    pub pitch_deg: Option<f64>,
    pub roll_deg: Option<f64>,
}

/// Per-frame annotation written next to each renamed image.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnnotationPayload {
    pub previous_name: String,
    pub acquisition_id: String,
    pub sequence_id: String,
    pub sensor_id: String,
    pub frame_index: usize,
    pub capture: CaptureInfo,
    pub gps: Option<GpsInfo>,
    pub pose: Option<PoseAnnotation>,
}

impl AnnotationPayload {
    pub fn new(frame: &AssignedFrame, acquisition_id: &str, sensor_id: &Token) -> Self {
        let record = &frame.record;
        let derived = &record.derived;
        Self {
            previous_name: record.original_name.clone(),
            acquisition_id: acquisition_id.to_owned(),
            sequence_id: frame.slot.sequence_id.clone(),
            sensor_id: sensor_id.to_string(),
            frame_index: frame.slot.frame_index,
            capture: CaptureInfo {
                datetime_original: derived.datetime_original.clone(),
                gps_timestamp_utc: derived.gps_timestamp().map(str::to_owned),
            },
            gps: derived.gps.clone(),
            pose: record.pose.as_ref().map(|pose| PoseAnnotation {
                source: "csv",
                timestamp: pose.timestamp.clone(),
                gps_seconds: pose.gps_seconds,
                gps_latitude: pose.gps_latitude,
                gps_longitude: pose.gps_longitude,
                gps_altitude_m: pose.gps_altitude_m,
                heading_deg: pose.heading_deg,
                pitch_deg: pose.pitch_deg,
                roll_deg: pose.roll_deg,
            }),
        }
    }

    /// Pruned JSON tree ready to be written.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        to_pruned_value(self)
    }
}

/// One line of a sequence trajectory table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrajectoryRow {
    pub frame_index: usize,
    pub image_name: String,
    pub timestamp: Option<String>,
    pub gps_latitude: Option<f64>,
    pub gps_longitude: Option<f64>,
    pub gps_altitude_m: Option<f64>,
    pub heading_deg: Option<f64>,
    pub pitch_deg: Option<f64>,
    pub roll_deg: Option<f64>,
}

impl TrajectoryRow {
    /// Build the row for `record`, renamed to `image_name`.
    ///
    /// Timestamp precedence: pose, then GPS, then original datetime. Position
    /// comes from the merged GPS sub-tree; attitude only from the pose.
    pub fn new(record: &FusedRecord, frame_index: usize, image_name: String) -> Self {
        let derived = &record.derived;
        let gps = derived.gps.as_ref();
        let pose = record.pose.as_ref();
        let timestamp = pose
            .and_then(|pose| pose.timestamp.clone())
            .filter(|ts| !ts.is_empty())
            .or_else(|| derived.gps_timestamp().filter(|ts| !ts.is_empty()).map(str::to_owned))
            .or_else(|| derived.datetime_original.clone());
        Self {
            frame_index,
            image_name,
            timestamp,
            gps_latitude: gps.and_then(|gps| gps.latitude_deg),
            gps_longitude: gps.and_then(|gps| gps.longitude_deg),
            gps_altitude_m: gps.and_then(|gps| gps.altitude_m),
            heading_deg: pose.and_then(|pose| pose.heading_deg),
            pitch_deg: pose.and_then(|pose| pose.pitch_deg),
            roll_deg: pose.and_then(|pose| pose.roll_deg),
        }
    }

    /// Any timing, position or attitude value is present.
    pub fn has_pose_data(&self) -> bool {
        self.timestamp.as_deref().is_some_and(|ts| !ts.is_empty())
            || self.gps_latitude.is_some()
            || self.gps_longitude.is_some()
            || self.gps_altitude_m.is_some()
            || self.heading_deg.is_some()
            || self.pitch_deg.is_some()
            || self.roll_deg.is_some()
    }
}

/// Camera facts for one acquisition.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IntrinsicsDescriptor {
    pub sensor_id: String,
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub serial_number: Option<String>,
    pub software: Option<String>,
    pub focal_length_mm: Option<f64>,
    pub focal_length_35mm: Option<u32>,
    pub f_number: Option<f64>,
}

impl IntrinsicsDescriptor {
    fn has_camera_facts(&self) -> bool {
        self.camera_make.is_some()
            || self.camera_model.is_some()
            || self.serial_number.is_some()
            || self.software.is_some()
            || self.focal_length_mm.is_some()
            || self.focal_length_35mm.is_some()
            || self.f_number.is_some()
    }
}

/// Intrinsics from the first record carrying camera facts.
pub fn build_intrinsics<'a, I>(records: I, sensor_id: &Token) -> Option<IntrinsicsDescriptor>
where
    I: IntoIterator<Item = &'a FusedRecord>,
{
    records.into_iter().find_map(|record| {
        let camera = record.derived.camera.as_ref()?;
        let descriptor = IntrinsicsDescriptor {
            sensor_id: sensor_id.to_string(),
            camera_make: camera.make.clone(),
            camera_model: camera.model.clone(),
            serial_number: camera.serial_number.clone(),
            software: camera.software.clone(),
            focal_length_mm: camera.focal_length_mm,
            focal_length_35mm: camera.focal_length_35mm,
            f_number: camera.f_number,
        };
        descriptor.has_camera_facts().then_some(descriptor)
    })
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PositionReference {
    pub reference: &'static str,
    pub epsg: u32,
    pub units: &'static str,
    pub altitude_units: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude_reference: Option<String>,
}

/// Reference frame of the positions written for one acquisition.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CoordinateSystems {
    pub position: PositionReference,
    pub source: &'static str,
}

/// Descriptor from the first record whose GPS has latitude and longitude.
pub fn build_coordinate_systems<'a, I>(records: I) -> Option<CoordinateSystems>
where
    I: IntoIterator<Item = &'a FusedRecord>,
{
    let gps = records
        .into_iter()
        .filter_map(|record| record.derived.gps.as_ref())
        .find(|gps| gps.has_position())?;
    Some(CoordinateSystems {
        position: PositionReference {
            reference: "WGS84",
            epsg: 4326,
            units: "degrees",
            altitude_units: "meters",
            altitude_reference: gps.altitude_ref.clone().filter(|r| !r.is_empty()),
        },
        source: "EXIF GPS",
    })
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrackProperties {
    pub acquisition_id: String,
    pub sequence_id: String,
    pub sensor_id: String,
    pub point_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude_units: Option<&'static str>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Geometry {
    LineString { coordinates: Vec<Vec<f64>> },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum GeoFeature {
    Feature {
        properties: TrackProperties,
        geometry: Geometry,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum TrackCollection {
    FeatureCollection { features: Vec<GeoFeature> },
}

/// GeoJSON line through the rows that carry latitude and longitude.
///
/// Needs at least two such rows. Altitude becomes the third coordinate only
/// when every position has one.
pub fn build_geojson_track(
    rows: &[TrajectoryRow],
    acquisition_id: &str,
    sequence_id: &str,
    sensor_id: &Token,
) -> Option<TrackCollection> {
    let positions: Vec<(f64, f64, Option<f64>)> = rows
        .iter()
        .filter_map(|row| Some((row.gps_longitude?, row.gps_latitude?, row.gps_altitude_m)))
        .collect();
    if positions.len() < 2 {
        return None;
    }
    let with_altitude = positions.iter().all(|(_, _, alt)| alt.is_some());
    let coordinates: Vec<Vec<f64>> = positions
        .iter()
        .map(|&(lon, lat, alt)| match alt {
            Some(alt) if with_altitude => vec![lon, lat, alt],
            _ => vec![lon, lat],
        })
        .collect();
    let properties = TrackProperties {
        acquisition_id: acquisition_id.to_owned(),
        sequence_id: sequence_id.to_owned(),
        sensor_id: sensor_id.to_string(),
        point_count: coordinates.len(),
        altitude_units: with_altitude.then_some("meters"),
    };
    Some(TrackCollection::FeatureCollection {
        features: vec![GeoFeature::Feature {
            properties,
            geometry: Geometry::LineString { coordinates },
        }],
    })
}
