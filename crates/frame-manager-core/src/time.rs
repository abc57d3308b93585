//! Date/time helpers: epoch conversion, `YYYYMMDD` codes and EXIF datetimes.

use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 1980-01-06T00:00:00Z in Unix seconds.
const GPS_EPOCH_UNIX_SECONDS: i64 = 315_964_800;
const DATE_CODE_FORMAT: &str = "%Y%m%d";
const DATE_FORMATS: [&str; 3] = ["%Y:%m:%d", "%Y-%m-%d", "%Y%m%d"];
const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y:%m:%d %H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Time origin of the numeric seconds column in pose files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoseEpoch {
    /// GPS time, origin 1980-01-06T00:00:00Z. Leap seconds are not applied.
    #[default]
    Gps,
    /// Unix time, origin 1970-01-01T00:00:00Z.
    Unix,
}

impl PoseEpoch {
    pub fn origin(self) -> DateTime<Utc> {
        match self {
            PoseEpoch::Gps => DateTime::UNIX_EPOCH + Duration::seconds(GPS_EPOCH_UNIX_SECONDS),
            PoseEpoch::Unix => DateTime::UNIX_EPOCH,
        }
    }
}

impl FromStr for PoseEpoch {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gps" => Ok(PoseEpoch::Gps),
            "unix" => Ok(PoseEpoch::Unix),
            other => Err(ConfigError::UnknownEpoch(other.to_string())),
        }
    }
}

impl fmt::Display for PoseEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoseEpoch::Gps => f.write_str("gps"),
            PoseEpoch::Unix => f.write_str("unix"),
        }
    }
}

/// Format a UTC instant as ISO-8601 with a `Z` suffix.
///
/// Microseconds are printed only when non-zero.
pub fn format_utc(instant: DateTime<Utc>) -> String {
    if instant.timestamp_subsec_micros() == 0 {
        instant.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    } else {
        instant.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
    }
}

/// Convert epoch seconds into an ISO-8601 UTC timestamp.
///
/// Returns `None` for non-finite or out-of-range inputs.
pub fn seconds_to_utc(seconds: f64, epoch: PoseEpoch) -> Option<String> {
    if !seconds.is_finite() {
        return None;
    }
    let micros = (seconds * 1e6).round();
    if micros.abs() > i64::MAX as f64 {
        return None;
    }
    let instant = epoch
        .origin()
        .checked_add_signed(Duration::microseconds(micros as i64))?;
    Some(format_utc(instant))
}

pub fn is_valid_date_code(candidate: &str) -> bool {
    candidate.len() == 8
        && candidate.bytes().all(|b| b.is_ascii_digit())
        && NaiveDate::parse_from_str(candidate, DATE_CODE_FORMAT).is_ok()
}

/// Parse a calendar date (`YYYY:MM:DD`, `YYYY-MM-DD` or `YYYYMMDD`) into `YYYYMMDD`.
pub fn parse_date_code(text: &str) -> Option<String> {
    let text = clean_text(text)?;
    DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(&text, fmt)
            .ok()
            .map(|date| date.format(DATE_CODE_FORMAT).to_string())
    })
}

/// Date code of the calendar part of a timestamp (text before `T`, then before a space).
pub fn date_code_of_timestamp(timestamp: &str) -> Option<String> {
    let date_part = timestamp.split('T').next()?.split(' ').next()?;
    parse_date_code(date_part)
}

/// `YYYYMMDD` of a filesystem time, in UTC.
pub fn date_code_from_system_time(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format(DATE_CODE_FORMAT)
        .to_string()
}

/// Normalize an embedded datetime string to ISO-8601 when it parses.
///
/// Offset-aware values keep their offset (`+00:00` becomes `Z`); EXIF-style
/// `YYYY:MM:DD HH:MM:SS` becomes a naive ISO datetime. Anything else is
/// returned cleaned but otherwise untouched.
pub fn normalize_datetime(text: &str) -> Option<String> {
    let text = clean_text(text)?;

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&text) {
        let iso = if parsed.offset().local_minus_utc() == 0 {
            format_utc(parsed.with_timezone(&Utc))
        } else {
            parsed.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, false)
        };
        return Some(iso);
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(&text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(format_naive(parsed));
    }

    let spaced = text.replace('T', " ");
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(&spaced, fmt) {
            return Some(format_naive(parsed));
        }
    }
    Some(spaced)
}

fn format_naive(value: NaiveDateTime) -> String {
    if value.and_utc().timestamp_subsec_micros() == 0 {
        value.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        value.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

/// Drop control characters and surrounding whitespace; `None` when nothing is left.
pub fn clean_text(text: &str) -> Option<String> {
    let cleaned: String = text.chars().filter(|c| !c.is_control()).collect();
    let trimmed = cleaned.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration as StdDuration, UNIX_EPOCH};

    #[test]
    fn gps_and_unix_epochs_differ_by_origin() {
        assert_eq!(
            seconds_to_utc(0.0, PoseEpoch::Gps).as_deref(),
            Some("1980-01-06T00:00:00Z")
        );
        assert_eq!(
            seconds_to_utc(86_400.5, PoseEpoch::Unix).as_deref(),
            Some("1970-01-02T00:00:00.500000Z")
        );
        assert_eq!(seconds_to_utc(f64::NAN, PoseEpoch::Gps), None);
    }

    #[test]
    fn gps_week_seconds_land_on_expected_day() {
        // 2300 GPS weeks after the origin.
        let seconds = 2300.0 * 7.0 * 86_400.0 + 3_600.0;
        assert_eq!(
            seconds_to_utc(seconds, PoseEpoch::Gps).as_deref(),
            Some("2024-02-04T01:00:00Z")
        );
    }

    #[test]
    fn date_codes_accept_three_layouts() {
        assert_eq!(parse_date_code("2024:05:01").as_deref(), Some("20240501"));
        assert_eq!(parse_date_code("2024-05-01").as_deref(), Some("20240501"));
        assert_eq!(parse_date_code("20240501").as_deref(), Some("20240501"));
        assert_eq!(parse_date_code("2024-13-01"), None);
        assert_eq!(parse_date_code("   "), None);
    }

    #[test]
    fn timestamp_date_portion_is_extracted() {
        assert_eq!(
            date_code_of_timestamp("2024-05-01T10:00:00Z").as_deref(),
            Some("20240501")
        );
        assert_eq!(
            date_code_of_timestamp("2024:05:01 10:00:00").as_deref(),
            Some("20240501")
        );
        assert_eq!(date_code_of_timestamp("garbage"), None);
    }

    #[test]
    fn mtime_is_formatted_in_utc() {
        let t = UNIX_EPOCH + StdDuration::from_secs(1_714_557_600);
        assert_eq!(date_code_from_system_time(t), "20240501");
    }

    #[test]
    fn exif_datetimes_become_iso() {
        assert_eq!(
            normalize_datetime("2024:05:01 10:20:30\0").as_deref(),
            Some("2024-05-01T10:20:30")
        );
        assert_eq!(
            normalize_datetime("2024-05-01T10:20:30+00:00").as_deref(),
            Some("2024-05-01T10:20:30Z")
        );
        assert_eq!(
            normalize_datetime("2024-05-01T10:20:30+02:00").as_deref(),
            Some("2024-05-01T10:20:30+02:00")
        );
        assert_eq!(
            normalize_datetime("sometime").as_deref(),
            Some("sometime")
        );
        assert_eq!(normalize_datetime(""), None);
    }
}
