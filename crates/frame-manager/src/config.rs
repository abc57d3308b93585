//! Run configuration and the CLI-facing source selectors.

use std::convert::Infallible;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;

use frame_manager_core::{is_valid_date_code, ConfigError, Token};

fn is_auto(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("auto")
}

/// Validated settings shared by every acquisition of one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngestConfig {
    pub region: Token,
    pub sensor_id: Token,
    pub max_per_seq: NonZeroUsize,
    pub output_dir: PathBuf,
    /// `YYYYMMDD` taken from the input folder name, if any.
    pub folder_date: Option<String>,
}

impl IngestConfig {
    pub fn new(
        region: &str,
        sensor_id: &str,
        max_per_seq: usize,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            region: Token::parse(region, "Region")?,
            sensor_id: Token::parse(sensor_id, "Sensor ID")?,
            max_per_seq: NonZeroUsize::new(max_per_seq).ok_or(ConfigError::ZeroSequenceCapacity)?,
            output_dir: output_dir.into(),
            folder_date: None,
        })
    }

    /// Attach a folder date; anything that is not a real `YYYYMMDD` is dropped.
    pub fn with_folder_date(mut self, folder_date: Option<String>) -> Self {
        self.folder_date = folder_date.filter(|date| is_valid_date_code(date));
        self
    }
}

/// Where the sensor id comes from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SensorSource {
    /// Camera model of the first image.
    #[default]
    FromMetadata,
    Named(String),
}

impl SensorSource {
    pub fn resolve(&self, metadata_default: Option<String>) -> Result<Token, ConfigError> {
        let raw = match self {
            SensorSource::Named(name) => name.clone(),
            SensorSource::FromMetadata => metadata_default.ok_or(ConfigError::MissingSensorId)?,
        };
        Token::parse(&raw, "Sensor ID")
    }
}

impl FromStr for SensorSource {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if is_auto(s) || s.trim().is_empty() {
            Ok(SensorSource::FromMetadata)
        } else {
            Ok(SensorSource::Named(s.to_owned()))
        }
    }
}

/// An optional input that may be given explicitly or searched for.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum InputSource {
    #[default]
    Disabled,
    /// Search the input folder.
    Auto,
    Path(PathBuf),
}

impl FromStr for InputSource {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if is_auto(s) {
            InputSource::Auto
        } else if s.trim().is_empty() {
            InputSource::Disabled
        } else {
            InputSource::Path(PathBuf::from(s))
        })
    }
}
