//! Embedded EXIF decoding through `kamadak-exif`.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{Duration, NaiveDate};
use exif::{Context, Exif, In, Rational, Reader, Tag, Value};
use frame_manager_core::{
    clean_text, date_code_of_timestamp, format_utc, normalize_datetime, parse_date_code,
    CameraInfo, DecodedMetadata, DerivedMetadata, GpsInfo, MetadataDecoder,
};
use log::debug;

/// Camera serial number tag (DNG `CameraSerialNumber`), looked up in the Exif
/// IFD and then in IFD0 when `BodySerialNumber` is absent.
const CAMERA_SERIAL_NUMBER: u16 = 0xC62F;

/// Decoder for JPEG files carrying EXIF/GPS tags.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExifDecoder;

impl MetadataDecoder for ExifDecoder {
    fn decode(&self, path: &Path) -> DecodedMetadata {
        match read_exif(path) {
            Some(exif) => decode_exif(&exif),
            None => DecodedMetadata::default(),
        }
    }
}

/// Camera model of `path`, used as the default sensor id.
pub fn camera_model(path: &Path) -> Option<String> {
    let exif = read_exif(path)?;
    text_field(&exif, Tag::Model)
}

fn read_exif(path: &Path) -> Option<Exif> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            debug!("cannot open {}: {err}", path.display());
            return None;
        }
    };
    let mut reader = BufReader::new(file);
    match Reader::new().read_from_container(&mut reader) {
        Ok(exif) => Some(exif),
        Err(err) => {
            debug!("no EXIF in {}: {err}", path.display());
            None
        }
    }
}

fn decode_exif(exif: &Exif) -> DecodedMetadata {
    let gps_date = text_field(exif, Tag::GPSDateStamp).and_then(|text| parse_date_code(&text));
    let datetime_original = [Tag::DateTimeOriginal, Tag::DateTimeDigitized, Tag::DateTime]
        .into_iter()
        .find_map(|tag| text_field(exif, tag))
        .and_then(|text| normalize_datetime(&text));

    let gps = GpsInfo {
        latitude_deg: coordinate(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef),
        longitude_deg: coordinate(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef),
        altitude_m: rational_field(exif, Tag::GPSAltitude, 0),
        altitude_ref: uint_field(exif, Tag::GPSAltitudeRef).and_then(|code| match code {
            0 => Some("above_sea_level".to_owned()),
            1 => Some("below_sea_level".to_owned()),
            _ => None,
        }),
        timestamp_utc: gps_date.as_deref().and_then(|date| gps_timestamp(exif, date)),
    };

    let camera = CameraInfo {
        make: text_field(exif, Tag::Make),
        model: text_field(exif, Tag::Model),
        serial_number: serial_number(exif),
        software: text_field(exif, Tag::Software),
        focal_length_mm: rational_field(exif, Tag::FocalLength, 0),
        focal_length_35mm: uint_field(exif, Tag::FocalLengthIn35mmFilm),
        f_number: rational_field(exif, Tag::FNumber, 0),
    };

    let date_candidate = gps_date.or_else(|| {
        datetime_original
            .as_deref()
            .and_then(date_code_of_timestamp)
    });

    DecodedMetadata {
        date_candidate,
        derived: DerivedMetadata {
            datetime_original,
            gps: Some(gps),
            camera: Some(camera),
        }
        .pruned(),
    }
}

fn text_field(exif: &Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let raw = match &field.value {
        Value::Ascii(parts) => parts.first()?.as_slice(),
        Value::Undefined(bytes, _) | Value::Byte(bytes) => bytes.as_slice(),
        _ => return None,
    };
    clean_text(&String::from_utf8_lossy(raw))
}

fn serial_number(exif: &Exif) -> Option<String> {
    [
        Tag::BodySerialNumber,
        Tag(Context::Exif, CAMERA_SERIAL_NUMBER),
        Tag(Context::Tiff, CAMERA_SERIAL_NUMBER),
    ]
    .into_iter()
    .find_map(|tag| text_field(exif, tag))
}

fn uint_field(exif: &Exif, tag: Tag) -> Option<u32> {
    exif.get_field(tag, In::PRIMARY)?.value.get_uint(0)
}

fn rational_to_f64(value: &Rational) -> Option<f64> {
    (value.denom != 0).then(|| value.to_f64())
}

fn rational_field(exif: &Exif, tag: Tag, index: usize) -> Option<f64> {
    match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::Rational(values) => rational_to_f64(values.get(index)?),
        other => other.get_uint(index).map(f64::from),
    }
}

/// Degrees/minutes/seconds plus hemisphere into signed degrees.
fn coordinate(exif: &Exif, value_tag: Tag, ref_tag: Tag) -> Option<f64> {
    let hemisphere = text_field(exif, ref_tag)?;
    let degrees = rational_field(exif, value_tag, 0)?;
    let minutes = rational_field(exif, value_tag, 1)?;
    let seconds = rational_field(exif, value_tag, 2)?;
    let magnitude = dms_to_degrees(degrees, minutes, seconds);
    Some(if matches!(hemisphere.to_ascii_uppercase().as_str(), "S" | "W") {
        -magnitude
    } else {
        magnitude
    })
}

pub(crate) fn dms_to_degrees(degrees: f64, minutes: f64, seconds: f64) -> f64 {
    degrees + minutes / 60.0 + seconds / 3600.0
}

fn gps_timestamp(exif: &Exif, date_code: &str) -> Option<String> {
    let hours = rational_field(exif, Tag::GPSTimeStamp, 0)?;
    let minutes = rational_field(exif, Tag::GPSTimeStamp, 1)?;
    let seconds = rational_field(exif, Tag::GPSTimeStamp, 2)?;
    utc_from_date_and_time(date_code, hours, minutes, seconds)
}

/// `YYYYMMDD` plus fractional h/m/s into an ISO-8601 UTC timestamp.
pub(crate) fn utc_from_date_and_time(
    date_code: &str,
    hours: f64,
    minutes: f64,
    seconds: f64,
) -> Option<String> {
    let midnight = NaiveDate::parse_from_str(date_code, "%Y%m%d")
        .ok()?
        .and_hms_opt(0, 0, 0)?
        .and_utc();
    let offset_micros = ((hours * 3600.0 + minutes * 60.0 + seconds) * 1e6).round();
    if !offset_micros.is_finite() {
        return None;
    }
    let instant = midnight.checked_add_signed(Duration::microseconds(offset_micros as i64))?;
    Some(format_utc(instant))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn dms_converts_to_decimal_degrees() {
        assert_relative_eq!(dms_to_degrees(46.0, 22.0, 48.0), 46.38, epsilon = 1e-12);
    }

    #[test]
    fn gps_time_is_added_to_the_date_stamp() {
        assert_eq!(
            utc_from_date_and_time("20240501", 10.0, 5.0, 30.25).as_deref(),
            Some("2024-05-01T10:05:30.250000Z")
        );
        assert_eq!(
            utc_from_date_and_time("20240501", 23.0, 59.0, 60.0).as_deref(),
            Some("2024-05-02T00:00:00Z")
        );
        assert_eq!(utc_from_date_and_time("2024", 1.0, 0.0, 0.0), None);
    }

    /// Little-endian TIFF with a single ASCII entry in IFD0.
    fn tiff_with_ascii(tag: u16, text: &str) -> Vec<u8> {
        let mut value = text.as_bytes().to_vec();
        value.push(0);
        let mut raw = b"II".to_vec();
        raw.extend_from_slice(&42u16.to_le_bytes());
        raw.extend_from_slice(&8u32.to_le_bytes());
        raw.extend_from_slice(&1u16.to_le_bytes());
        raw.extend_from_slice(&tag.to_le_bytes());
        raw.extend_from_slice(&2u16.to_le_bytes());
        raw.extend_from_slice(&(value.len() as u32).to_le_bytes());
        raw.extend_from_slice(&26u32.to_le_bytes());
        raw.extend_from_slice(&0u32.to_le_bytes());
        raw.extend_from_slice(&value);
        raw
    }

    #[test]
    fn serial_number_falls_back_to_ifd0() {
        let exif = Reader::new()
            .read_raw(tiff_with_ascii(CAMERA_SERIAL_NUMBER, "SN-4711"))
            .unwrap();
        assert_eq!(serial_number(&exif).as_deref(), Some("SN-4711"));

        let decoded = decode_exif(&exif);
        let camera = decoded.derived.camera.unwrap();
        assert_eq!(camera.serial_number.as_deref(), Some("SN-4711"));

        let unrelated = Reader::new()
            .read_raw(tiff_with_ascii(0x010F, "DJI"))
            .unwrap();
        assert_eq!(serial_number(&unrelated), None);
        assert_eq!(text_field(&unrelated, Tag::Make).as_deref(), Some("DJI"));
    }

    #[test]
    fn non_image_decodes_to_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.jpg");
        std::fs::write(&path, b"not a jpeg").unwrap();
        assert_eq!(ExifDecoder.decode(&path), DecodedMetadata::default());
        assert_eq!(camera_model(&path), None);
        assert_eq!(
            ExifDecoder.decode(&dir.path().join("missing.jpg")),
            DecodedMetadata::default()
        );
    }
}
