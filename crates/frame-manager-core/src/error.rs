/// Configuration errors. All of them are reported before any file is touched.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max-per-seq must be greater than zero")]
    ZeroSequenceCapacity,
    #[error("{label} cannot be empty")]
    EmptyToken { label: &'static str },
    #[error("sensor id missing and no default sensor found in metadata")]
    MissingSensorId,
    #[error("pose epoch must be 'gps' or 'unix' (got '{0}')")]
    UnknownEpoch(String),
}
